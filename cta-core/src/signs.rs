//! # Tokenizador de Sinais
//!
//! Percorre uma linha normalizada no modo `Sign` e conta cada sinal no estado
//! em que ele aparece. A máquina de estados tem duas variáveis independentes:
//!
//! - **Preservação** ([`Preservation`]): `[`/`]` alternam entre preservado e
//!   reconstruído; `⸢`/`⸣` entre preservado e parcialmente preservado. As
//!   aberturas só valem a partir do estado preservado.
//! - **Delimitação** ([`Enclosure`]): `(` abre parênteses, `<` abre adição
//!   editorial e um segundo `<` vira rasura (`<<`); `)` e `>` sempre fecham.
//!
//! Letras, dígitos e `!?+/` acumulam no sinal pendente. Qualquer delimitador
//! (`espaço . - [ ] ⸢ ⸣ < > * ( )`) descarrega o sinal pendente: com
//! delimitação ativa o sinal vai para o contador da delimitação, senão para o
//! contador do estado de preservação.
//!
//! Caracteres desconhecidos viram [`SyntaxErrorRecord`] e a leitura continua:
//! os documentos de origem têm inconsistências de transcrição conhecidas.
//!
//! ## Exemplo
//!
//! ```rust
//! use cta_core::signs::scan_signs;
//!
//! let analysis = scan_signs("lu-[ga]-al", "A 1");
//! assert_eq!(analysis.signs["ga"].reconstructed, 1);
//! assert_eq!(analysis.signs["lu"].preserved, 1);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use unicode_segmentation::UnicodeSegmentation;

use crate::error::SyntaxErrorRecord;
use crate::manuscript::Manuscript;
use crate::normalizer::normalize_for_signs;

/// Caracteres que terminam um sinal.
pub const SIGN_DELIMITERS: &[char] = &[' ', '.', '-', '[', ']', '⸢', '⸣', '<', '>', '*', '(', ')'];

/// Marcas de lacuna removidas antes da leitura.
const GAP_MARKERS: &[&str] = &["...", "…", "(x)"];

/// Sinal ilegível, nunca contado.
const PLACEHOLDER: &str = "x";

/// Estado de preservação do trecho atual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preservation {
    #[default]
    Preserved,
    Partial,
    Reconstructed,
}

/// Delimitação editorial do trecho atual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Enclosure {
    #[default]
    None,
    Paren,
    Angle,
    DoubleAngle,
}

/// Contador em que uma ocorrência de sinal é registrada.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Preserved,
    Partial,
    Reconstructed,
    InAngle,
    InParen,
    InDoubleAngle,
}

impl Bucket {
    /// A delimitação tem precedência sobre a preservação.
    pub fn for_state(preservation: Preservation, enclosure: Enclosure) -> Self {
        match enclosure {
            Enclosure::Paren => Bucket::InParen,
            Enclosure::Angle => Bucket::InAngle,
            Enclosure::DoubleAngle => Bucket::InDoubleAngle,
            Enclosure::None => match preservation {
                Preservation::Preserved => Bucket::Preserved,
                Preservation::Partial => Bucket::Partial,
                Preservation::Reconstructed => Bucket::Reconstructed,
            },
        }
    }
}

/// Contagens de um sinal por estado. Cada ocorrência incrementa exatamente um campo.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignCount {
    pub preserved: usize,
    pub partial: usize,
    pub reconstructed: usize,
    pub in_angle: usize,
    pub in_paren: usize,
    pub in_double_angle: usize,
}

impl SignCount {
    pub fn record(&mut self, bucket: Bucket) {
        let counter = match bucket {
            Bucket::Preserved => &mut self.preserved,
            Bucket::Partial => &mut self.partial,
            Bucket::Reconstructed => &mut self.reconstructed,
            Bucket::InAngle => &mut self.in_angle,
            Bucket::InParen => &mut self.in_paren,
            Bucket::InDoubleAngle => &mut self.in_double_angle,
        };
        *counter += 1;
    }

    pub fn merge(&mut self, other: &SignCount) {
        self.preserved += other.preserved;
        self.partial += other.partial;
        self.reconstructed += other.reconstructed;
        self.in_angle += other.in_angle;
        self.in_paren += other.in_paren;
        self.in_double_angle += other.in_double_angle;
    }

    /// Total de ocorrências em todos os estados.
    pub fn total(&self) -> usize {
        self.preserved
            + self.partial
            + self.reconstructed
            + self.in_angle
            + self.in_paren
            + self.in_double_angle
    }
}

/// Resultado da análise de sinais (de uma linha ou do manuscrito inteiro).
///
/// O mapa é ordenado pela string do sinal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignAnalysis {
    pub signs: BTreeMap<String, SignCount>,
    pub errors: Vec<SyntaxErrorRecord>,
}

impl SignAnalysis {
    /// Soma as contagens e concatena os erros (na ordem das linhas).
    pub fn merge(mut self, other: SignAnalysis) -> Self {
        for (sign, count) in other.signs {
            self.signs.entry(sign).or_default().merge(&count);
        }
        self.errors.extend(other.errors);
        self
    }
}

/// Máquina de estados de uma linha.
struct SignScanner<'a> {
    line_id: &'a str,
    preservation: Preservation,
    enclosure: Enclosure,
    pending: String,
    analysis: SignAnalysis,
}

impl<'a> SignScanner<'a> {
    fn new(line_id: &'a str) -> Self {
        Self {
            line_id,
            preservation: Preservation::default(),
            enclosure: Enclosure::default(),
            pending: String::new(),
            analysis: SignAnalysis::default(),
        }
    }

    fn step(&mut self, grapheme: &str) {
        let Some(ch) = grapheme.chars().next() else {
            return;
        };

        if SIGN_DELIMITERS.contains(&ch) {
            self.flush();
        }

        match ch {
            ' ' | '.' | '-' | '*' => {}
            '[' => {
                if self.preservation == Preservation::Preserved {
                    self.preservation = Preservation::Reconstructed;
                }
            }
            ']' => {
                if self.preservation == Preservation::Reconstructed {
                    self.preservation = Preservation::Preserved;
                }
            }
            '⸢' => {
                if self.preservation == Preservation::Preserved {
                    self.preservation = Preservation::Partial;
                }
            }
            '⸣' => {
                if self.preservation == Preservation::Partial {
                    self.preservation = Preservation::Preserved;
                }
            }
            '(' => self.enclosure = Enclosure::Paren,
            ')' => self.enclosure = Enclosure::None,
            '<' => {
                self.enclosure = match self.enclosure {
                    Enclosure::Angle => Enclosure::DoubleAngle,
                    _ => Enclosure::Angle,
                }
            }
            '>' => self.enclosure = Enclosure::None,
            c if is_sign_char(c) => self.pending.push_str(grapheme),
            c => {
                warn!(line_id = self.line_id, "caractere não reconhecido {c:?}");
                self.analysis.errors.push(SyntaxErrorRecord {
                    character: c,
                    line_id: self.line_id.to_string(),
                });
            }
        }
    }

    /// Registra o sinal pendente (se houver) no contador do estado atual.
    fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let sign = std::mem::take(&mut self.pending);
        if sign == PLACEHOLDER {
            return;
        }
        let bucket = Bucket::for_state(self.preservation, self.enclosure);
        self.analysis.signs.entry(sign).or_default().record(bucket);
    }

    fn finish(mut self) -> SignAnalysis {
        self.flush();
        self.analysis
    }
}

fn is_sign_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '!' | '?' | '+' | '/')
}

/// Remove as marcas de lacuna (reticências e `(x)`), que não são sinais.
fn strip_gaps(line_text: &str) -> String {
    GAP_MARKERS
        .iter()
        .fold(line_text.to_string(), |text, marker| text.replace(marker, ""))
}

/// Conta os sinais de uma linha normalizada no modo `Sign`.
pub fn scan_signs(line_text: &str, line_id: &str) -> SignAnalysis {
    let text = strip_gaps(line_text);
    let mut scanner = SignScanner::new(line_id);
    for grapheme in text.graphemes(true) {
        scanner.step(grapheme);
    }
    scanner.finish()
}

/// Análise de sinais do manuscrito inteiro (notas excluídas).
pub fn analyse_signs(manuscript: &Manuscript) -> SignAnalysis {
    let analysis = manuscript
        .tokenized_lines()
        .map(|(line_id, tokens)| scan_signs(&normalize_for_signs(tokens), line_id))
        .fold(SignAnalysis::default(), SignAnalysis::merge);

    debug!(
        signs = analysis.signs.len(),
        syntax_errors = analysis.errors.len(),
        "análise de sinais concluída"
    );
    analysis
}

/// Estatísticas de comprimento das linhas totalmente preservadas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineLengthStats {
    /// Número de linhas consideradas.
    pub lines: usize,
    pub mean: f64,
    pub median: f64,
    pub shortest: usize,
    pub longest: usize,
    /// Número de sinais de cada linha, na ordem do documento.
    pub lengths: Vec<usize>,
}

/// Sinais de uma linha sem lacunas; `None` se a linha tiver reticências.
pub fn signs_in_preserved_line(line_text: &str) -> Option<Vec<&str>> {
    if line_text.contains("...") || line_text.contains('…') {
        return None;
    }
    Some(
        line_text
            .split(SIGN_DELIMITERS)
            .filter(|s| !s.is_empty())
            .collect(),
    )
}

/// Comprimento (em sinais) das linhas sem lacunas; `None` se não houver nenhuma.
pub fn line_length_stats(manuscript: &Manuscript) -> Option<LineLengthStats> {
    let lengths: Vec<usize> = manuscript
        .tokenized_lines()
        .filter_map(|(_, tokens)| {
            signs_in_preserved_line(&normalize_for_signs(tokens)).map(|signs| signs.len())
        })
        .filter(|len| *len > 0)
        .collect();

    if lengths.is_empty() {
        debug!("nenhuma linha preservada neste manuscrito");
        return None;
    }

    let mut sorted = lengths.clone();
    sorted.sort_unstable();
    let n = sorted.len();
    let median = if n % 2 == 1 {
        sorted[n / 2] as f64
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) as f64 / 2.0
    };

    Some(LineLengthStats {
        lines: n,
        mean: lengths.iter().sum::<usize>() as f64 / n as f64,
        median,
        shortest: sorted[0],
        longest: sorted[n - 1],
        lengths,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manuscript::{Section, Token, TokenKind};

    fn only(count: SignCount, bucket: Bucket) -> bool {
        let mut expected = SignCount::default();
        expected.record(bucket);
        count == expected
    }

    #[test]
    fn test_single_preserved_sign() {
        let analysis = scan_signs("lu", "A 1");
        assert_eq!(analysis.signs.len(), 1);
        assert!(only(analysis.signs["lu"], Bucket::Preserved));
        assert!(analysis.errors.is_empty());
    }

    #[test]
    fn test_preservation_states() {
        let analysis = scan_signs("a-[na] ⸢šar⸣-ri", "A 1");
        assert!(only(analysis.signs["a"], Bucket::Preserved));
        assert!(only(analysis.signs["na"], Bucket::Reconstructed));
        assert!(only(analysis.signs["šar"], Bucket::Partial));
        assert!(only(analysis.signs["ri"], Bucket::Preserved));
    }

    #[test]
    fn test_enclosures_take_precedence() {
        let analysis = scan_signs("[a <ma> (ta) <<ši>> ku]", "A 1");
        assert!(only(analysis.signs["a"], Bucket::Reconstructed));
        assert!(only(analysis.signs["ma"], Bucket::InAngle));
        assert!(only(analysis.signs["ta"], Bucket::InParen));
        assert!(only(analysis.signs["ši"], Bucket::InDoubleAngle));
        assert!(only(analysis.signs["ku"], Bucket::Reconstructed));
    }

    #[test]
    fn test_gaps_and_placeholders_removed() {
        let analysis = scan_signs("x [lugal] x ... (x) …", "A 2");
        assert_eq!(analysis.signs.len(), 1);
        assert!(only(analysis.signs["lugal"], Bucket::Reconstructed));
    }

    #[test]
    fn test_placeholder_only_when_bare() {
        let analysis = scan_signs("ux-x", "A 1");
        assert!(only(analysis.signs["ux"], Bucket::Preserved));
        assert_eq!(analysis.signs.len(), 1);
    }

    #[test]
    fn test_unknown_character_reported_and_scanning_continues() {
        let analysis = scan_signs("a:na", "A 7");
        assert_eq!(
            analysis.errors,
            vec![SyntaxErrorRecord {
                character: ':',
                line_id: "A 7".into()
            }]
        );
        assert!(analysis.signs.contains_key("ana"));
    }

    #[test]
    fn test_unmatched_bracket_is_not_a_syntax_error() {
        let analysis = scan_signs("a] na)", "A 1");
        assert!(analysis.errors.is_empty());
        assert!(only(analysis.signs["a"], Bucket::Preserved));
        assert!(only(analysis.signs["na"], Bucket::Preserved));
    }

    #[test]
    fn test_determinative_marks_delimit() {
        let analysis = scan_signs("*d*utu", "A 1");
        assert!(only(analysis.signs["d"], Bucket::Preserved));
        assert!(only(analysis.signs["utu"], Bucket::Preserved));
    }

    #[test]
    fn test_decomposed_diacritic_stays_in_sign() {
        // "s" + caron combinante
        let analysis = scan_signs("s\u{30C}a", "A 1");
        assert!(analysis.errors.is_empty());
        assert_eq!(analysis.signs.len(), 1);
    }

    #[test]
    fn test_analyse_signs_merges_lines() {
        let manuscript = Manuscript::new().with_section(
            "obv. i",
            Section::new()
                .with_line("A obv. i 1", vec![Token::new("lu-ga-al", TokenKind::Syllabic)])
                .with_line("A obv. i 2", vec![Token::new("x [lu] x", TokenKind::Syllabic)])
                .with_note("note 1", "lu lu lu"),
        );
        let analysis = analyse_signs(&manuscript);
        assert_eq!(analysis.signs["lu"].preserved, 1);
        assert_eq!(analysis.signs["lu"].reconstructed, 1);
        assert_eq!(analysis.signs["lu"].total(), 2);
        let signs: Vec<&String> = analysis.signs.keys().collect();
        assert_eq!(signs, ["al", "ga", "lu"]);
    }

    #[test]
    fn test_line_length_stats() {
        let manuscript = Manuscript::new().with_section(
            "i",
            Section::new()
                .with_line("A i 1", vec![Token::new("a-na šar-ri", TokenKind::Syllabic)])
                .with_line("A i 2", vec![Token::new("[a]-na", TokenKind::Syllabic)])
                .with_line("A i 3", vec![Token::new("... ri", TokenKind::Syllabic)]),
        );
        let stats = line_length_stats(&manuscript).unwrap();
        assert_eq!(stats.lengths, vec![4, 2]);
        assert_eq!(stats.median, 3.0);
        assert_eq!(stats.shortest, 2);
        assert_eq!(stats.longest, 4);
    }

    #[test]
    fn test_line_length_stats_without_preserved_lines() {
        assert!(line_length_stats(&Manuscript::new()).is_none());
    }
}
