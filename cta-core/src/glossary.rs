//! # Extrator de Formas Atestadas (Glossário)
//!
//! Recupera as formas citáveis em dicionário, com a decoração de
//! reconstrução, e todas as linhas em que cada uma aparece.
//!
//! ## Algoritmo
//!
//! 1. A linha (modo `Word`) é dividida nos espaços; pedaços formados só por
//!    ruído (pontuação, colchetes, `x`, reticências) são descartados.
//! 2. Cada pedaço é redividido nas fronteiras internas de palavra
//!    ([`split_chunk`]). Um colchete no meio de uma palavra hifenizada
//!    (`ana-[DI]-a`) não é fronteira.
//! 3. Uma passada entre pedaços ([`carry_brackets`]) leva adiante um `[`/`⸢`
//!    deixado aberto, para que uma reconstrução que atravessa o espaço entre
//!    palavras continue registrada como um trecho entre colchetes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

use crate::config::DoubleReadingPolicy;
use crate::manuscript::{LineId, Manuscript, OrderedMap};
use crate::normalizer::normalize_for_words;

/// Caracteres que sozinhos não formam uma palavra.
const NOISE: &[char] = &[
    ' ', '.', '-', '[', ']', '⸢', '⸣', '<', '>', '(', ')', '*', '?', '!', 'x', '…',
];

/// Decoração ignorada no início da forma ao ordenar o glossário.
const LEADING_DECORATION: &[char] = &['[', ']', '⸢', '⸣', '<', '>', '(', ')', '*'];

fn is_form_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '-' | '.' | '/' | '?' | '!' | '+' | '*')
}

fn is_opener(c: char) -> bool {
    matches!(c, '[' | '⸢' | '<' | '(')
}

fn is_closer(c: char) -> bool {
    matches!(c, ']' | '⸣' | '>' | ')')
}

fn is_bracket(c: char) -> bool {
    is_opener(c) || is_closer(c)
}

fn joins(c: char) -> bool {
    c == '-' || c == '.'
}

/// Um pedaço "vale" como forma se tiver ao menos um caractere fora do ruído.
pub fn evaluates(chunk: &str) -> bool {
    chunk.chars().any(|c| !NOISE.contains(&c))
}

fn flush_form(forms: &mut Vec<String>, current: &mut String) {
    if evaluates(current) {
        forms.push(current.clone());
    }
    current.clear();
}

/// Divide um pedaço (sem espaços) nas fronteiras internas de palavra.
///
/// Um caractere que não é de palavra é fronteira, exceto quando:
/// - é uma abertura no começo da forma, depois de hífen/ponto, ou seguida de hífen;
/// - o próximo caractere (ou o seguinte, pulando um colchete) é hífen ou ponto;
/// - é um fechamento de colchete aberto no meio da palavra: entra na forma e
///   então a forma termina.
pub fn split_chunk(chunk: &str) -> Vec<String> {
    let chars: Vec<(char, &str)> = chunk
        .graphemes(true)
        .filter_map(|g| g.chars().next().map(|c| (c, g)))
        .collect();

    let mut forms = Vec::new();
    let mut current = String::new();
    let mut over_break = false;

    for (i, &(ch, grapheme)) in chars.iter().enumerate() {
        if is_form_char(ch) {
            current.push_str(grapheme);
            continue;
        }

        let next = chars.get(i + 1).map(|(c, _)| *c);
        let after = chars.get(i + 2).map(|(c, _)| *c);
        let lookahead_joins = next.is_some_and(joins)
            || (next.is_some_and(is_bracket) && after.is_some_and(joins));

        if is_opener(ch) {
            let after_hyphen = current.ends_with(['-', '.']);
            if after_hyphen {
                over_break = true;
            }
            if !(current.is_empty() || after_hyphen || next == Some('-') || lookahead_joins) {
                flush_form(&mut forms, &mut current);
            }
            current.push_str(grapheme);
        } else if is_closer(ch) {
            current.push_str(grapheme);
            if lookahead_joins {
                continue;
            }
            if over_break {
                over_break = false;
                flush_form(&mut forms, &mut current);
            } else if next.is_some_and(char::is_alphanumeric) {
                flush_form(&mut forms, &mut current);
            }
        } else if lookahead_joins {
            current.push_str(grapheme);
        } else {
            flush_form(&mut forms, &mut current);
        }
    }
    flush_form(&mut forms, &mut current);

    forms
}

/// Colchetes de reconstrução e parciais deixados abertos no fim de uma forma.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct OpenBrackets {
    reconstruction: bool,
    partial: bool,
}

impl OpenBrackets {
    fn after(form: &str) -> Self {
        form.chars().fold(OpenBrackets::default(), |mut open, c| {
            match c {
                '[' => open.reconstruction = true,
                ']' => open.reconstruction = false,
                '⸢' => open.partial = true,
                '⸣' => open.partial = false,
                _ => {}
            }
            open
        })
    }
}

/// Leva adiante os colchetes abertos entre formas consecutivas.
///
/// A forma que fica aberta recebe o fechamento; a seguinte recebe a abertura
/// até que o fechamento correspondente apareça.
pub fn carry_brackets(forms: Vec<String>) -> Vec<String> {
    let mut open = OpenBrackets::default();
    forms
        .into_iter()
        .map(|unit| {
            let mut form = String::new();
            if open.reconstruction && !unit.starts_with('[') {
                form.push('[');
            }
            if open.partial && !unit.trim_start_matches('[').starts_with('⸢') {
                form.push('⸢');
            }
            form.push_str(&unit);

            open = OpenBrackets::after(&form);
            if open.partial {
                form.push('⸣');
            }
            if open.reconstruction {
                form.push(']');
            }
            form
        })
        .collect()
}

/// Formas atestadas de uma linha normalizada no modo `Word`, na ordem da linha.
///
/// Pedaços de ruído com colchetes (`[...`, `x]`) não viram formas, mas passam
/// pela passada de [`carry_brackets`] para não perder a abertura ou o fechamento.
pub fn attested_forms_in_line(line_text: &str) -> Vec<String> {
    let mut units: Vec<(String, bool)> = Vec::new();
    for chunk in line_text.split(' ') {
        if evaluates(chunk) {
            units.extend(split_chunk(chunk).into_iter().map(|form| (form, true)));
        } else if chunk.contains(is_bracket) {
            units.push((chunk.to_string(), false));
        }
    }

    let (forms, kept): (Vec<String>, Vec<bool>) = units.into_iter().unzip();
    carry_brackets(forms)
        .into_iter()
        .zip(kept)
        .filter_map(|(form, keep)| keep.then_some(form))
        .collect()
}

/// Uma forma e as linhas (com repetição) em que ela ocorre.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestedForm {
    pub form: String,
    pub lines: Vec<LineId>,
}

fn glossary_key(form: &str) -> String {
    form.trim_start_matches(LEADING_DECORATION).to_lowercase()
}

/// Todas as formas atestadas do manuscrito, em ordem alfabética.
///
/// Com `policy` definida, leituras duplas são resolvidas antes do registro.
pub fn extract_attested_forms(
    manuscript: &Manuscript,
    policy: Option<DoubleReadingPolicy>,
) -> Vec<AttestedForm> {
    let mut index: HashMap<String, Vec<LineId>> = HashMap::new();

    for (line_id, tokens) in manuscript.tokenized_lines() {
        for form in attested_forms_in_line(&normalize_for_words(tokens)) {
            let form = match policy {
                Some(policy) => match policy.resolve(&form) {
                    Some(resolved) => resolved,
                    None => continue,
                },
                None => form,
            };
            index.entry(form).or_default().push(line_id.clone());
        }
    }

    let mut forms: Vec<AttestedForm> = index
        .into_iter()
        .map(|(form, lines)| AttestedForm { form, lines })
        .collect();
    forms.sort_by_cached_key(|entry| (glossary_key(&entry.form), entry.form.clone()));
    forms
}

/// Verbete do glossário. Os três primeiros campos são preenchidos depois pelos especialistas.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlossaryEntry {
    #[serde(rename = "CDA form")]
    pub cda_form: String,
    #[serde(rename = "CDA meaning")]
    pub cda_meaning: String,
    #[serde(rename = "used meaning")]
    pub used_meaning: String,
    /// Identificadores das linhas, separados por quebra de linha.
    pub attestation: String,
}

/// Glossário: forma → verbete, na ordem alfabética das formas.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Glossary {
    pub entries: OrderedMap<GlossaryEntry>,
}

impl Glossary {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Vec<AttestedForm>> for Glossary {
    fn from(forms: Vec<AttestedForm>) -> Self {
        let entries = forms
            .into_iter()
            .map(|attested| {
                let entry = GlossaryEntry {
                    attestation: attested.lines.join("\n"),
                    ..GlossaryEntry::default()
                };
                (attested.form, entry)
            })
            .collect();
        Glossary { entries }
    }
}

/// Glossário do manuscrito inteiro (notas excluídas).
pub fn build_glossary(manuscript: &Manuscript, policy: Option<DoubleReadingPolicy>) -> Glossary {
    let glossary = Glossary::from(extract_attested_forms(manuscript, policy));
    debug!(forms = glossary.len(), "glossário concluído");
    glossary
}
