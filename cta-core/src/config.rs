//! # Opções de Análise
//!
//! Estruturas simples, desserializáveis e com `Default`, que o chamador
//! (servidor web, testes, scripts) passa para as análises.

use serde::{Deserialize, Serialize};

/// Como resolver sinais com duas leituras alternativas (`ša/šá`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoubleReadingPolicy {
    /// Usa a primeira leitura.
    First,
    /// Usa a segunda leitura; a unidade é descartada se ela não existir.
    Second,
    /// Descarta a unidade inteira.
    Drop,
}

impl Default for DoubleReadingPolicy {
    fn default() -> Self {
        DoubleReadingPolicy::First
    }
}

impl DoubleReadingPolicy {
    /// Resolve as leituras duplas de uma unidade, sinal por sinal.
    ///
    /// Retorna `None` quando a unidade deve ser descartada.
    pub fn resolve(&self, text: &str) -> Option<String> {
        if !text.contains('/') {
            return Some(text.to_string());
        }
        let index = match self {
            DoubleReadingPolicy::First => 0,
            DoubleReadingPolicy::Second => 1,
            DoubleReadingPolicy::Drop => return None,
        };
        let mut signs = Vec::new();
        for sign in text.split('-') {
            if sign.contains('/') {
                signs.push(select_reading(sign, index)?);
            } else {
                signs.push(sign.to_string());
            }
        }
        Some(signs.join("-"))
    }
}

fn is_opener(c: char) -> bool {
    matches!(c, '[' | '⸢' | '<' | '(')
}

fn is_closer(c: char) -> bool {
    matches!(c, ']' | '⸣' | '>' | ')')
}

/// Escolhe uma leitura de `ša/šá`, mantendo os colchetes do sinal em volta dela.
///
/// `[ša/šá]` vira `[ša]`: as aberturas vão antes da leitura e os fechamentos depois.
fn select_reading(sign: &str, index: usize) -> Option<String> {
    let openers: String = sign.chars().filter(|&c| is_opener(c)).collect();
    let closers: String = sign.chars().filter(|&c| is_closer(c)).collect();
    let bare: String = sign
        .chars()
        .filter(|&c| !is_opener(c) && !is_closer(c))
        .collect();
    let reading = bare.split('/').nth(index).filter(|r| !r.is_empty())?;
    Some(format!("{openers}{reading}{closers}"))
}

/// Opções das análises de palavras e do glossário.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Política aplicada pela análise de palavras.
    pub word_double_readings: DoubleReadingPolicy,
    /// Política aplicada ao glossário; `None` mantém as formas como escritas.
    pub glossary_double_readings: Option<DoubleReadingPolicy>,
}

/// Opções da exportação ORACC.
///
/// `rec_vers`, `cols` e `lines` dizem quais campos existem nos cabeçalhos de
/// seção e nos identificadores de linha; devem ser os mesmos para
/// `parse_section` e `parse_line_id` de um mesmo documento.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OraccOptions {
    pub rec_vers: bool,
    pub cols: bool,
    pub lines: bool,
    pub text_id: String,
    pub title: String,
    pub project: String,
    pub language: String,
}

impl Default for OraccOptions {
    fn default() -> Self {
        Self {
            rec_vers: true,
            cols: true,
            lines: true,
            text_id: "X000001".to_string(),
            title: "Composition".to_string(),
            project: "cta".to_string(),
            language: "akk".to_string(),
        }
    }
}
