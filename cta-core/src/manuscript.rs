//! # Modelo de Dados do Manuscrito
//!
//! Representa o resultado da camada de ingestão: cada seção (cabeçalho do
//! documento) contém as linhas transliteradas (`cuneiform_data`) e as linhas de
//! tradução (`translation_data`), ambas indexadas pelo identificador da linha.
//!
//! ## Formato JSON
//!
//! ```json
//! {
//!   "obv. i": {
//!     "cuneiform_data": {
//!       "A obv. i 1": [{"text": "lu-", "type": "syllabic"}, {"text": "GAL", "type": "ideogram"}],
//!       "note 1": "linha danificada"
//!     },
//!     "translation_data": {"A obv. i 1": "o rei"}
//!   }
//! }
//! ```
//!
//! A ordem das seções e das linhas é significativa (a exportação ORACC percorre
//! o documento na ordem original), por isso os objetos JSON são lidos para
//! [`OrderedMap`] e nunca para um `HashMap`.

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Identificador de linha (ex: `"A obv. i 12"` ou `"note 3"`).
pub type LineId = String;

/// Substring que marca uma linha de anotação em vez de transliteração.
pub const NOTE_SENTINEL: &str = "note";

/// Verifica se o identificador pertence a uma linha de nota.
pub fn is_note(line_id: &str) -> bool {
    line_id.contains(NOTE_SENTINEL)
}

/// Classificação tipográfica de um trecho formatado do documento de origem.
///
/// Aceita tanto os nomes snake_case quanto os rótulos legados da ingestão
/// (`"post/determinative"`, `"ideo/logographic"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// Texto silábico (itálico).
    Syllabic,
    /// Sigla do manuscrito (sobrescrito com `:`), ignorada pelas análises.
    #[serde(alias = "manuscript designation")]
    ManuscriptDesignation,
    /// Determinativo ou pós-determinativo (versalete sobrescrito).
    #[serde(alias = "post/determinative")]
    PostOrDeterminative,
    /// Número de sinal (versalete subscrito).
    #[serde(alias = "sign number")]
    SignNumber,
    /// Logograma (versalete).
    #[serde(alias = "ideo/logographic")]
    Ideogram,
    /// Valor de sinal em maiúsculas.
    SignValue,
    Other,
}

/// Um trecho de texto com sua classificação. Imutável depois da ingestão.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: TokenKind,
}

impl Token {
    pub fn new(text: impl Into<String>, kind: TokenKind) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }
}

/// Conteúdo de uma linha transliterada: lista de tokens, ou texto cru no caso de notas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LineContent {
    Tokens(Vec<Token>),
    Note(String),
}

impl LineContent {
    /// Tokens da linha, se ela não for uma nota.
    pub fn tokens(&self) -> Option<&[Token]> {
        match self {
            LineContent::Tokens(tokens) => Some(tokens),
            LineContent::Note(_) => None,
        }
    }

    /// Texto simples da linha (concatenação dos tokens, ou a própria nota).
    pub fn plain_text(&self) -> String {
        match self {
            LineContent::Tokens(tokens) => tokens.iter().map(|t| t.text.as_str()).collect(),
            LineContent::Note(text) => text.clone(),
        }
    }
}

/// Mapa que preserva a ordem de inserção, serializado como objeto JSON.
///
/// Uma chave repetida substitui o valor anterior mantendo a posição original,
/// como acontece com um `dict` lido de JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedMap<V> {
    entries: Vec<(String, V)>,
    /// Chave → posição em `entries`.
    index: HashMap<String, usize>,
}

impl<V> OrderedMap<V> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        match self.index.get(&key) {
            Some(&position) => self.entries[position].1 = value,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.index.get(key).map(|&position| &self.entries[position].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &V)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for OrderedMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = OrderedMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct OrderedMapVisitor<V>(PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedMapVisitor<V> {
    type Value = OrderedMap<V>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("um objeto JSON")
    }

    fn visit_map<A>(self, mut map: A) -> Result<OrderedMap<V>, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut entries = OrderedMap::with_capacity(map.size_hint().unwrap_or(0));
        while let Some(key) = map.next_key::<String>()? {
            let value = map.next_value::<V>()?;
            entries.insert(key, value);
        }
        Ok(entries)
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(OrderedMapVisitor(PhantomData))
    }
}

/// Uma seção do documento (uma tabela sob um cabeçalho).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    #[serde(default)]
    pub cuneiform_data: OrderedMap<LineContent>,
    #[serde(default)]
    pub translation_data: OrderedMap<String>,
}

impl Section {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adiciona uma linha transliterada (builder).
    pub fn with_line(mut self, line_id: impl Into<String>, tokens: Vec<Token>) -> Self {
        self.cuneiform_data.insert(line_id, LineContent::Tokens(tokens));
        self
    }

    /// Adiciona uma nota (builder).
    pub fn with_note(mut self, line_id: impl Into<String>, text: impl Into<String>) -> Self {
        self.cuneiform_data.insert(line_id, LineContent::Note(text.into()));
        self
    }

    /// Adiciona uma linha de tradução (builder).
    pub fn with_translation(mut self, line_id: impl Into<String>, text: impl Into<String>) -> Self {
        self.translation_data.insert(line_id, text.into());
        self
    }
}

/// O manuscrito inteiro: cabeçalho da seção → seção, na ordem do documento.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manuscript {
    pub sections: OrderedMap<Section>,
}

impl Manuscript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adiciona uma seção (builder).
    pub fn with_section(mut self, heading: impl Into<String>, section: Section) -> Self {
        self.sections.insert(heading, section);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Linhas transliteradas analisáveis: exclui notas, na ordem do documento.
    pub fn tokenized_lines(&self) -> impl Iterator<Item = (&LineId, &[Token])> {
        self.sections.iter().flat_map(|(_, section)| {
            section
                .cuneiform_data
                .iter()
                .filter(|(line_id, _)| !is_note(line_id))
                .filter_map(|(line_id, content)| content.tokens().map(|tokens| (line_id, tokens)))
        })
    }
}
