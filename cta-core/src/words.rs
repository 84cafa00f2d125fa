//! # Etiquetador e Extrator de Palavras
//!
//! A análise de palavras acontece em dois passos sobre a linha normalizada no
//! modo `Word`:
//!
//! 1. **Etiquetagem** ([`tag_line`]): a linha vira uma sequência de unidades
//!    `tag:texto`, onde a tag é o delimitador aberto no momento
//!    ([`WordTag`]). Um hífen encerra a unidade e fica no fim do texto,
//!    sinalizando que a palavra continua.
//! 2. **Extração** ([`extract_words`]): unidades ligadas por hífen são
//!    concatenadas em uma palavra, acumulando as tags tocadas. Ao fechar, a
//!    palavra recebe um [`WordState`].
//!
//! ## Classificação
//!
//! | Tags tocadas                                   | Estado                     |
//! |------------------------------------------------|----------------------------|
//! | apenas neutras                                 | `Preserved`                |
//! | alguma parcial (`⸢`)                           | `PartiallyReconstructed`   |
//! | reconstrução/adição/parênteses + alguma neutra | `PartiallyReconstructed`   |
//! | reconstrução/adição/parênteses, sem neutra     | `Reconstructed`            |
//!
//! A regra da penúltima linha (trecho misto conta como parcial) vem do
//! comportamento herdado e pode simplificar demais estados de preservação
//! realmente mistos.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

use crate::config::DoubleReadingPolicy;
use crate::manuscript::Manuscript;
use crate::normalizer::{normalize_for_words, DETERMINATIVE_MARK};

/// Marcas de lacuna removidas antes da etiquetagem (as entre colchetes primeiro).
const GAP_MARKERS: &[&str] = &["[...]", "[…]", "...", "…"];

/// Palavras que nunca são contadas.
const PLACEHOLDERS: &[&str] = &["", "x", "(x)"];

/// Delimitador aberto quando uma unidade foi lida.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WordTag {
    /// Nenhum delimitador aberto.
    Neutral,
    /// `[...]`
    Reconstructed,
    /// `⸢...⸣`
    Partial,
    /// `<...>`
    Angle,
    /// `(...)`
    Paren,
}

impl WordTag {
    /// Tag aberta pelo caractere, se ele for um delimitador de abertura.
    pub fn opened_by(c: char) -> Option<Self> {
        match c {
            '[' => Some(WordTag::Reconstructed),
            '⸢' => Some(WordTag::Partial),
            '<' => Some(WordTag::Angle),
            '(' => Some(WordTag::Paren),
            _ => None,
        }
    }

    /// Representação textual (ex: `"["`, `"neutral"`)
    pub fn label(&self) -> &'static str {
        match self {
            WordTag::Neutral => "neutral",
            WordTag::Reconstructed => "[",
            WordTag::Partial => "⸢",
            WordTag::Angle => "<",
            WordTag::Paren => "(",
        }
    }
}

fn is_closer(c: char) -> bool {
    matches!(c, ']' | '⸣' | '>' | ')')
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '/' | '*' | '.' | '?' | '!' | '+')
}

fn is_hyphen_only(text: &str) -> bool {
    text.chars().all(|c| c == '-')
}

/// Uma unidade etiquetada: trecho de texto lido sob uma tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedUnit {
    pub tag: WordTag,
    pub text: String,
}

impl TaggedUnit {
    /// A próxima unidade continua esta palavra.
    pub fn continues(&self) -> bool {
        self.text.ends_with('-')
    }

    /// Esta unidade continua a palavra anterior (hífen levado através de uma quebra).
    pub fn carries_over(&self) -> bool {
        self.text.starts_with('-')
    }
}

impl std::fmt::Display for TaggedUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.tag.label(), self.text)
    }
}

/// Fecha o texto pendente como unidade (se não for vazio nem só hífens)
fn flush_unit(units: &mut Vec<TaggedUnit>, pending: &mut String, tag: WordTag) {
    if !pending.is_empty() && !is_hyphen_only(pending) {
        units.push(TaggedUnit {
            tag,
            text: pending.clone(),
        });
    }
    pending.clear();
}

/// Passo 1: divide a linha em unidades etiquetadas.
pub fn tag_line(line_text: &str) -> Vec<TaggedUnit> {
    let text = GAP_MARKERS
        .iter()
        .fold(line_text.to_string(), |text, marker| text.replace(marker, ""));

    let mut units = Vec::new();
    let mut tag = WordTag::Neutral;
    let mut pending = String::new();

    for grapheme in text.graphemes(true) {
        let Some(ch) = grapheme.chars().next() else {
            continue;
        };

        if let Some(opened) = WordTag::opened_by(ch) {
            // Um hífen solto atravessa a abertura e marca continuação
            if !is_hyphen_only(&pending) {
                flush_unit(&mut units, &mut pending, tag);
            }
            tag = opened;
        } else if is_closer(ch) {
            flush_unit(&mut units, &mut pending, tag);
            tag = WordTag::Neutral;
        } else if ch == ' ' {
            flush_unit(&mut units, &mut pending, tag);
        } else if ch == '-' {
            pending.push('-');
            if !is_hyphen_only(&pending) {
                flush_unit(&mut units, &mut pending, tag);
            }
        } else if is_word_char(ch) {
            pending.push_str(grapheme);
        }
    }
    flush_unit(&mut units, &mut pending, tag);

    units
}

/// Estado de preservação de uma palavra completa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WordState {
    Preserved,
    PartiallyReconstructed,
    Reconstructed,
}

impl WordState {
    /// Classifica pelo conjunto de tags tocadas; `None` se nenhuma tag foi tocada.
    pub fn classify(tags: &[WordTag]) -> Option<Self> {
        if tags.is_empty() {
            return None;
        }
        let neutral = tags.contains(&WordTag::Neutral);
        let partial = tags.contains(&WordTag::Partial);
        let restored = tags
            .iter()
            .any(|t| matches!(t, WordTag::Reconstructed | WordTag::Angle | WordTag::Paren));

        Some(match (partial, restored, neutral) {
            (true, _, _) => WordState::PartiallyReconstructed,
            (false, true, true) => WordState::PartiallyReconstructed,
            (false, true, false) => WordState::Reconstructed,
            (false, false, _) => WordState::Preserved,
        })
    }
}

/// Contagens de palavras por estado (de uma linha ou do manuscrito).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordTally {
    pub reconstructed: BTreeMap<String, usize>,
    pub partially_reconstructed: BTreeMap<String, usize>,
    pub preserved: BTreeMap<String, usize>,
}

impl WordTally {
    fn bucket_mut(&mut self, state: WordState) -> &mut BTreeMap<String, usize> {
        match state {
            WordState::Reconstructed => &mut self.reconstructed,
            WordState::PartiallyReconstructed => &mut self.partially_reconstructed,
            WordState::Preserved => &mut self.preserved,
        }
    }

    pub fn record(&mut self, word: String, state: WordState) {
        *self.bucket_mut(state).entry(word).or_insert(0) += 1;
    }

    /// Soma as contagens de outra contagem.
    pub fn merge(mut self, other: WordTally) -> Self {
        for (state, bucket) in [
            (WordState::Reconstructed, other.reconstructed),
            (WordState::PartiallyReconstructed, other.partially_reconstructed),
            (WordState::Preserved, other.preserved),
        ] {
            let target = self.bucket_mut(state);
            for (word, count) in bucket {
                *target.entry(word).or_insert(0) += count;
            }
        }
        self
    }

    /// Remove os marcadores de lacuna de todos os estados.
    fn discard_placeholders(&mut self) {
        for bucket in [
            &mut self.reconstructed,
            &mut self.partially_reconstructed,
            &mut self.preserved,
        ] {
            bucket.retain(|word, _| !PLACEHOLDERS.contains(&word.as_str()));
        }
    }
}

/// Palavra em construção durante a extração.
#[derive(Default)]
struct RunningWord {
    text: String,
    tags: Vec<WordTag>,
}

impl RunningWord {
    fn extend(&mut self, unit: &TaggedUnit) {
        let text = if self.text.ends_with('-') {
            unit.text.trim_start_matches('-')
        } else {
            unit.text.as_str()
        };
        self.text.push_str(text);
        self.tags.push(unit.tag);
    }

    fn close(self, tally: &mut WordTally) {
        let Some(state) = WordState::classify(&self.tags) else {
            return;
        };
        let word = self.text.trim_matches('-').to_string();
        tally.record(word, state);
    }
}

/// Passo 2: junta as unidades em palavras e conta cada palavra pelo seu estado.
pub fn extract_words(units: &[TaggedUnit], policy: DoubleReadingPolicy) -> WordTally {
    let mut tally = WordTally::default();
    let mut running: Option<RunningWord> = None;
    let mut previous_continues = false;

    for unit in units {
        let Some(text) = policy.resolve(&unit.text) else {
            // A unidade descartada encerra a palavra: os vizinhos não se juntam
            if let Some(word) = running.take() {
                word.close(&mut tally);
            }
            previous_continues = false;
            continue;
        };
        let unit = TaggedUnit {
            tag: unit.tag,
            text,
        };

        let joins = previous_continues || unit.carries_over();
        match running.as_mut() {
            Some(word) if joins => word.extend(&unit),
            _ => {
                if let Some(word) = running.take() {
                    word.close(&mut tally);
                }
                let mut word = RunningWord::default();
                word.extend(&unit);
                running = Some(word);
            }
        }
        previous_continues = unit.continues();
    }

    if let Some(word) = running {
        word.close(&mut tally);
    }
    tally.discard_placeholders();
    tally
}

/// Contagem de palavras de uma linha normalizada no modo `Word`.
pub fn words_in_line(line_text: &str, policy: DoubleReadingPolicy) -> WordTally {
    extract_words(&tag_line(line_text), policy)
}

/// Uma forma e quantas vezes ela ocorre.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordFrequency {
    pub form: String,
    pub count: usize,
}

/// Resultado da análise de palavras do manuscrito.
///
/// Cada lista é ordenada por contagem decrescente (empates pela forma).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordAnalysis {
    pub reconstructed: Vec<WordFrequency>,
    pub partially_reconstructed: Vec<WordFrequency>,
    pub preserved: Vec<WordFrequency>,
    /// União dos três estados com as contagens somadas.
    pub combined: Vec<WordFrequency>,
}

fn by_count_desc(bucket: BTreeMap<String, usize>) -> Vec<WordFrequency> {
    let mut words: Vec<WordFrequency> = bucket
        .into_iter()
        .map(|(form, count)| WordFrequency { form, count })
        .collect();
    // sort estável: o BTreeMap já deixou as formas em ordem para os empates
    words.sort_by(|a, b| b.count.cmp(&a.count));
    words
}

impl From<WordTally> for WordAnalysis {
    fn from(tally: WordTally) -> Self {
        let mut combined = BTreeMap::new();
        for bucket in [&tally.reconstructed, &tally.partially_reconstructed, &tally.preserved] {
            for (word, count) in bucket {
                *combined.entry(word.clone()).or_insert(0) += count;
            }
        }
        WordAnalysis {
            reconstructed: by_count_desc(tally.reconstructed),
            partially_reconstructed: by_count_desc(tally.partially_reconstructed),
            preserved: by_count_desc(tally.preserved),
            combined: by_count_desc(combined),
        }
    }
}

/// Análise de palavras do manuscrito inteiro (notas excluídas).
pub fn analyse_words(manuscript: &Manuscript, policy: DoubleReadingPolicy) -> WordAnalysis {
    let tally = manuscript
        .tokenized_lines()
        .map(|(_, tokens)| words_in_line(&normalize_for_words(tokens), policy))
        .fold(WordTally::default(), WordTally::merge);

    let analysis = WordAnalysis::from(tally);
    debug!(forms = analysis.combined.len(), "análise de palavras concluída");
    analysis
}

/// Linha da tabela de apresentação: uma por forma distinta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordRow {
    pub form: String,
    pub reconstructed: usize,
    pub partially_reconstructed: usize,
    pub preserved: usize,
    pub total: usize,
}

/// Chave de ordenação: sem diferenciar maiúsculas e ignorando o determinativo inicial.
fn presentation_key(form: &str) -> String {
    form.trim_start_matches(DETERMINATIVE_MARK).to_lowercase()
}

/// Junta os três estados em uma tabela ordenada alfabeticamente.
pub fn word_table(analysis: &WordAnalysis) -> Vec<WordRow> {
    fn row_for(form: &str) -> WordRow {
        WordRow {
            form: form.to_string(),
            reconstructed: 0,
            partially_reconstructed: 0,
            preserved: 0,
            total: 0,
        }
    }

    let mut rows: BTreeMap<&str, WordRow> = BTreeMap::new();
    for (bucket, state) in [
        (&analysis.reconstructed, WordState::Reconstructed),
        (&analysis.partially_reconstructed, WordState::PartiallyReconstructed),
        (&analysis.preserved, WordState::Preserved),
    ] {
        for entry in bucket {
            let row = rows
                .entry(&entry.form)
                .or_insert_with(|| row_for(&entry.form));
            match state {
                WordState::Reconstructed => row.reconstructed += entry.count,
                WordState::PartiallyReconstructed => row.partially_reconstructed += entry.count,
                WordState::Preserved => row.preserved += entry.count,
            }
            row.total += entry.count;
        }
    }

    let mut table: Vec<WordRow> = rows.into_values().collect();
    table.sort_by_cached_key(|row| (presentation_key(&row.form), row.form.clone()));
    table
}
