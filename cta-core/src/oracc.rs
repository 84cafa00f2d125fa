//! # Exportação ORACC (ATF)
//!
//! Monta um documento ATF a partir do manuscrito. Para cada linha transliterada:
//!
//! ```text
//! tokens ──► normalize_line(Oracc) ──► validate_brackets ──► reflow_partial
//!                  │ SIGN error               │ PARSE error          │
//!                  ▼                          ▼                      ▼
//!              mapa de erros  ◄───────────────┘        "N. texto" + "#lem: X; X"
//! ```
//!
//! Depois do bloco transliterado vem o bloco de tradução, com rótulos
//! `@(r 2 5)` obtidos dos identificadores de linha.
//!
//! Os diagnósticos por linha seguem "última escrita vence", na ordem
//! LABEL → PARSE → SIGN: um erro de número de sinal tem precedência.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::OraccOptions;
use crate::designation::{parse_line_id, parse_section, Side};
use crate::error::{CoreError, NestingProblem};
use crate::manuscript::{is_note, LineContent, Manuscript, OrderedMap};
use crate::normalizer::{normalize_line, NormalizeMode};

/// Marcadores privados que substituem `<<` e `>>` durante a validação.
const ERASURE_OPEN: char = '\u{E000}';
const ERASURE_CLOSE: char = '\u{E001}';

struct BracketPair {
    open: char,
    close: char,
    shown_open: &'static str,
    shown_close: &'static str,
}

const BRACKET_PAIRS: [BracketPair; 5] = [
    BracketPair { open: '[', close: ']', shown_open: "[", shown_close: "]" },
    BracketPair { open: '⸢', close: '⸣', shown_open: "⸢", shown_close: "⸣" },
    BracketPair { open: '(', close: ')', shown_open: "(", shown_close: ")" },
    BracketPair { open: '<', close: '>', shown_open: "<", shown_close: ">" },
    BracketPair { open: ERASURE_OPEN, close: ERASURE_CLOSE, shown_open: "<<", shown_close: ">>" },
];

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static EMPTY_PARENS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(\s*\)").unwrap());

/// Verifica o aninhamento dos cinco tipos de colchete, cada um independente.
///
/// Abrir um tipo já aberto, ou fechar um tipo que não está aberto, é violação.
/// Colchetes que continuam abertos no fim da linha não são.
pub fn validate_brackets(text: &str) -> Vec<CoreError> {
    let marked = text
        .replace("<<", &ERASURE_OPEN.to_string())
        .replace(">>", &ERASURE_CLOSE.to_string());

    let mut open = [false; BRACKET_PAIRS.len()];
    let mut violations = Vec::new();

    for c in marked.chars() {
        for (i, pair) in BRACKET_PAIRS.iter().enumerate() {
            let (bracket, problem) = if c == pair.open {
                let was_open = std::mem::replace(&mut open[i], true);
                (pair.shown_open, was_open.then_some(NestingProblem::AlreadyOpen))
            } else if c == pair.close {
                let was_open = std::mem::replace(&mut open[i], false);
                (pair.shown_close, (!was_open).then_some(NestingProblem::NotOpen))
            } else {
                continue;
            };
            if let Some(problem) = problem {
                violations.push(CoreError::BracketNesting {
                    bracket: bracket.to_string(),
                    problem,
                });
            }
        }
    }

    violations
}

/// Reescreve os trechos parcialmente preservados na convenção ATF.
///
/// Dentro de `⸢…⸣`: espaço vira `"# "`, hífen vira `"#-"` e uma `{` logo
/// depois de um espaço recebe `#`. A abertura é removida e o fechamento vira `#`.
pub fn reflow_partial(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut in_partial = false;
    let mut previous = None;

    for c in text.chars() {
        match c {
            '⸢' => in_partial = true,
            '⸣' => {
                in_partial = false;
                out.push('#');
            }
            ' ' if in_partial => out.push_str("# "),
            '-' if in_partial => out.push_str("#-"),
            '{' if in_partial && previous == Some(' ') => out.push_str("#{"),
            _ => out.push(c),
        }
        previous = Some(c);
    }

    out
}

/// Linha `#lem:` com um `X` por elemento separado por espaço.
pub fn lemmatization_stub(line_text: &str) -> String {
    let placeholders: Vec<&str> = line_text.split_whitespace().map(|_| "X").collect();
    format!("#lem: {}", placeholders.join("; ")).trim_end().to_string()
}

/// Texto de tradução com espaços repetidos e parênteses vazios removidos.
pub fn collapse_translation(text: &str) -> String {
    let without_parens = EMPTY_PARENS.replace_all(text, "");
    WHITESPACE.replace_all(&without_parens, " ").trim().to_string()
}

/// Documento ATF e diagnósticos por linha (ou por cabeçalho de seção).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OraccExport {
    pub document: String,
    pub errors: OrderedMap<String>,
}

fn label_error(designation: &str, err: &CoreError) -> (String, String) {
    warn!(designation, "{err}");
    (
        format!("# {err}: {designation}"),
        format!("LABEL error: {err}"),
    )
}

/// Estado do percurso: face e coluna correntes, para emitir cabeçalhos só nas mudanças.
#[derive(Default)]
struct Surface {
    side: Option<Side>,
    column: Option<String>,
}

/// Exporta o manuscrito no formato ATF.
pub fn export_oracc(manuscript: &Manuscript, options: &OraccOptions) -> OraccExport {
    let mut lines = vec![
        format!("&{} = {}", options.text_id, options.title),
        format!("#project: {}", options.project),
        format!("#atf: lang {}", options.language),
        "#atf: use unicode".to_string(),
        "@tablet".to_string(),
    ];
    let mut errors = OrderedMap::new();
    let mut surface = Surface::default();

    for (heading, section) in manuscript.sections.iter() {
        match parse_section(heading, options) {
            Ok(label) => {
                if label.side.is_some() && label.side != surface.side {
                    if let Some(side) = label.side {
                        lines.push(side.header().to_string());
                    }
                    surface.side = label.side;
                    // Cada face recomeça a numeração de colunas
                    surface.column = None;
                }
                if label.column.is_some() && label.column != surface.column {
                    if let Some(column) = &label.column {
                        lines.push(format!("@column {column}"));
                    }
                    surface.column = label.column;
                }
            }
            Err(err) => {
                let (comment, message) = label_error(heading, &err);
                lines.push(comment);
                errors.insert(heading.clone(), message);
            }
        }

        let mut counter = 0usize;
        for (line_id, content) in section.cuneiform_data.iter() {
            let tokens = match content {
                LineContent::Tokens(tokens) if !is_note(line_id) => tokens,
                _ => {
                    lines.push(format!("$ {}", content.plain_text().trim()));
                    continue;
                }
            };
            counter += 1;

            let mut number = counter.to_string();
            if options.lines {
                match parse_line_id(line_id, options) {
                    Ok(label) => number = label.line.unwrap_or(number),
                    Err(err) => {
                        let (_, message) = label_error(line_id, &err);
                        errors.insert(line_id.clone(), message);
                    }
                }
            }

            let normalized = normalize_line(tokens, NormalizeMode::Oracc);

            let violations = validate_brackets(&normalized.text);
            if !violations.is_empty() {
                let detail = join_errors(&violations);
                warn!(line_id = %line_id, "{detail}");
                errors.insert(line_id.clone(), format!("PARSE error: {detail}"));
            }
            if !normalized.sign_errors.is_empty() {
                errors.insert(
                    line_id.clone(),
                    format!("SIGN error: {}", join_errors(&normalized.sign_errors)),
                );
            }

            let reflowed = reflow_partial(normalized.text.trim());
            lines.push(format!("{number}. {reflowed}"));
            lines.push(lemmatization_stub(&reflowed));
        }
    }

    lines.push(String::new());
    lines.push("@translation labeled en project".to_string());

    for (_, section) in manuscript.sections.iter() {
        for (line_id, text) in section.translation_data.iter() {
            let text = collapse_translation(text);
            if is_note(line_id) {
                lines.push(format!("$ {text}"));
                continue;
            }
            match parse_line_id(line_id, options) {
                Ok(label) => match label.label() {
                    Some(label) => lines.push(format!("{label} {text}")),
                    None => lines.push(text),
                },
                Err(err) => {
                    let (comment, message) = label_error(line_id, &err);
                    lines.push(comment);
                    lines.push(text);
                    if errors.get(line_id).is_none() {
                        errors.insert(line_id.clone(), message);
                    }
                }
            }
        }
    }

    debug!(lines = lines.len(), errors = errors.len(), "exportação ORACC concluída");

    OraccExport {
        document: lines.join("\n"),
        errors,
    }
}

fn join_errors(errors: &[CoreError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manuscript::{Section, Token, TokenKind};

    fn syllabic(text: &str) -> Vec<Token> {
        vec![Token::new(text, TokenKind::Syllabic)]
    }

    #[test]
    fn test_validate_brackets() {
        assert!(validate_brackets("a-[na] ⸢šar⸣ <ru> (x) <<du>>").is_empty());
        assert!(validate_brackets("[a-na").is_empty());

        let violations = validate_brackets("a-na]");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].to_string(), "closing bracket without opening: ']'");

        let violations = validate_brackets("[a [na]");
        assert_eq!(violations[0].to_string(), "opening bracket while already open: '['");
    }

    #[test]
    fn test_erasure_is_not_nested_angle() {
        assert!(validate_brackets("<<a>> <b>").is_empty());
        let violations = validate_brackets("a>>");
        assert_eq!(violations[0].to_string(), "closing bracket without opening: '>>'");
    }

    #[test]
    fn test_reflow_partial() {
        assert_eq!(reflow_partial("⸢a-na⸣ šar"), "a#-na# šar");
        assert_eq!(reflow_partial("⸢a⸣-na"), "a#-na");
        assert_eq!(reflow_partial("⸢a {d}utu⸣"), "a# #{d}utu#");
        assert_eq!(reflow_partial("a {d}utu"), "a {d}utu");
    }

    #[test]
    fn test_lemmatization_stub() {
        assert_eq!(lemmatization_stub("a-na {d}utu be-li"), "#lem: X; X; X");
        assert_eq!(lemmatization_stub(""), "#lem:");
    }

    #[test]
    fn test_collapse_translation() {
        assert_eq!(collapse_translation("  to   the ( ) king  "), "to the king");
    }

    #[test]
    fn test_export_document() {
        let manuscript = Manuscript::new()
            .with_section(
                "obv. i",
                Section::new()
                    .with_line("A obv. i 1", vec![
                        Token::new("A:", TokenKind::ManuscriptDesignation),
                        Token::new("a-na ", TokenKind::Syllabic),
                        Token::new("d", TokenKind::PostOrDeterminative),
                        Token::new("utu", TokenKind::Syllabic),
                    ])
                    .with_note("note 1", "broken")
                    .with_line("A obv. i 2", syllabic("⸢šar-ru⸣"))
                    .with_translation("A obv. i 1", "to  Šamaš"),
            )
            .with_section(
                "rev. i",
                Section::new().with_line("A rev. i 1", syllabic("[lugal]")),
            );

        let export = export_oracc(&manuscript, &OraccOptions::default());
        let expected = [
            "&X000001 = Composition",
            "#project: cta",
            "#atf: lang akk",
            "#atf: use unicode",
            "@tablet",
            "@obverse",
            "@column 1",
            "1. a-na {d}utu",
            "#lem: X; X",
            "$ broken",
            "2. šar#-ru#",
            "#lem: X",
            "@reverse",
            "@column 1",
            "1. [lugal]",
            "#lem: X",
            "",
            "@translation labeled en project",
            "@(r 1 1) to Šamaš",
        ]
        .join("\n");
        assert_eq!(export.document, expected);
        assert!(export.errors.is_empty());
    }

    #[test]
    fn test_export_errors_last_write_wins() {
        let manuscript = Manuscript::new().with_section(
            "obv. i",
            Section::new()
                .with_line("A obv. i 1", syllabic("a-na]"))
                .with_line("A obv. i 2", vec![
                    Token::new("du]", TokenKind::Syllabic),
                    Token::new("3a", TokenKind::SignNumber),
                ]),
        );
        let export = export_oracc(&manuscript, &OraccOptions::default());
        assert!(export.errors.get("A obv. i 1").unwrap().starts_with("PARSE error: "));
        assert!(export.errors.get("A obv. i 2").unwrap().starts_with("SIGN error: "));
        assert!(export.document.contains("2. du]3a"));
    }

    #[test]
    fn test_export_bad_designations() {
        let manuscript = Manuscript::new().with_section(
            "tablet",
            Section::new()
                .with_line("A 1", syllabic("a-na"))
                .with_translation("A 1", "to"),
        );
        let export = export_oracc(&manuscript, &OraccOptions::default());
        assert!(export.document.contains("# Error in parsing line designation: tablet"));
        assert!(export.document.contains("1. a-na"));
        assert!(export.document.ends_with("# Error in parsing line designation: A 1\nto"));
        assert_eq!(
            export.errors.get("tablet").map(String::as_str),
            Some("LABEL error: Error in parsing line designation")
        );
        assert!(export.errors.get("A 1").is_some());
    }

    #[test]
    fn test_line_numbers_without_line_field() {
        let options = OraccOptions {
            rec_vers: false,
            cols: false,
            lines: false,
            ..OraccOptions::default()
        };
        let manuscript = Manuscript::new().with_section(
            "anything",
            Section::new()
                .with_line("A", syllabic("a"))
                .with_line("B", syllabic("b"))
                .with_translation("A", "one"),
        );
        let export = export_oracc(&manuscript, &options);
        assert!(export.document.contains("1. a\n#lem: X\n2. b\n#lem: X"));
        assert!(export.document.ends_with("@translation labeled en project\none"));
    }

    #[test]
    fn test_empty_manuscript() {
        let export = export_oracc(&Manuscript::new(), &OraccOptions::default());
        assert!(export.errors.is_empty());
        assert!(export.document.starts_with("&X000001 = Composition"));
        assert!(export.document.ends_with("@tablet\n\n@translation labeled en project"));
    }
}
