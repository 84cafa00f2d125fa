//! # Manuscritos de Demonstração
//!
//! Dois testemunhos curtos das primeiras linhas de uma composição acádia,
//! no formato produzido pela camada de ingestão. Cobrem os casos que as
//! análises precisam tratar:
//!
//! - colchetes de reconstrução, parciais (`⸢⸣`), adições (`<>`) e rasuras (`<<>>`)
//! - determinativos, logogramas e números de sinal
//! - lacunas (`x`, `...`, `(x)`), notas e linhas de tradução
//! - leitura dupla (`ša/šá`)

use crate::manuscript::{Manuscript, Section, Token, TokenKind};

fn syllabic(text: &str) -> Token {
    Token::new(text, TokenKind::Syllabic)
}

fn siglum(text: &str) -> Token {
    Token::new(text, TokenKind::ManuscriptDesignation)
}

fn determinative(text: &str) -> Token {
    Token::new(text, TokenKind::PostOrDeterminative)
}

fn ideogram(text: &str) -> Token {
    Token::new(text, TokenKind::Ideogram)
}

fn sign_number(text: &str) -> Token {
    Token::new(text, TokenKind::SignNumber)
}

/// Testemunho A: duas seções (anverso e reverso), com notas e traduções.
pub fn demo_manuscript() -> Manuscript {
    Manuscript::new()
        .with_section(
            "obv. i",
            Section::new()
                .with_line("A obv. i 1", vec![
                    siglum("A:"),
                    syllabic("e-nu-ma e-liš la na-bu-ú šá-ma-mu"),
                ])
                .with_line("A obv. i 2", vec![
                    syllabic("šap-liš am-ma-tum šu-ma la zak-rat"),
                ])
                .with_line("A obv. i 3", vec![
                    ideogram("zu.ab"),
                    syllabic("-ma reš-tu-ú za-ru-šu-un"),
                ])
                .with_note("note 1", "line 3 is written over an erasure")
                .with_line("A obv. i 4", vec![
                    syllabic("mu-um-mu [ti-amat] mu-⸢al⸣-li-da-at [...]"),
                ])
                .with_translation("A obv. i 1", "When on high the heaven had not been named,")
                .with_translation("A obv. i 2", "firm ground below had not been called by name,")
                .with_translation("A obv. i 3", "( ) primeval Apsû, their begetter,")
                .with_translation("A obv. i 4", "and Mummu-Tiamat, she who bore them all,"),
        )
        .with_section(
            "rev. i",
            Section::new()
                .with_line("A rev. i 1", vec![
                    determinative("d"),
                    ideogram("utu"),
                    syllabic(" be-lí ⸢ra-bu⸣-ú <<x>>"),
                ])
                .with_line("A rev. i 2", vec![
                    syllabic("a-na [é.gal] <i>-ru-ub ša"),
                    sign_number("2"),
                    syllabic(" x x (x)"),
                ])
                .with_line("A rev. i 3", vec![
                    syllabic("ša/šá-ri-im ⸢i-na⸣ [ma-ti-šu]"),
                ])
                .with_translation("A rev. i 1", "Šamaš, the great lord,")
                .with_translation("A rev. i 2", "entered the palace ...")
                .with_translation("A rev. i 3", "of the king in his land."),
        )
}

/// Testemunho B: variante curta de A, útil para a comparação de sinais.
pub fn demo_variant() -> Manuscript {
    Manuscript::new().with_section(
        "obv. i",
        Section::new()
            .with_line("B obv. i 1", vec![
                siglum("B:"),
                syllabic("e-nu-ma e-liš la na-bu-u"),
                sign_number("2"),
                syllabic(" ša-ma-mu"),
            ])
            .with_line("B obv. i 2", vec![
                syllabic("[šap-liš] am-ma-tu šu-ma ⸢la⸣ zak-ra-at"),
            ])
            .with_line("B obv. i 3", vec![
                syllabic("x x x [...]"),
            ])
            .with_translation("B obv. i 1", "When on high the heaven had not been named,"),
    )
}

/// Manuscritos de demonstração para a interface web: (nome, manuscrito).
pub fn demo_manuscripts() -> Vec<(&'static str, Manuscript)> {
    vec![("A", demo_manuscript()), ("B", demo_variant())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OraccOptions;
    use crate::designation::{parse_line_id, parse_section};
    use crate::manuscript::is_note;

    #[test]
    fn test_demo_designations_parse() {
        let options = OraccOptions::default();
        for (name, manuscript) in demo_manuscripts() {
            for (heading, section) in manuscript.sections.iter() {
                assert!(parse_section(heading, &options).is_ok(), "{name}: {heading}");
                for line_id in section.cuneiform_data.keys().filter(|id| !is_note(id)) {
                    assert!(parse_line_id(line_id, &options).is_ok(), "{name}: {line_id}");
                }
            }
        }
    }

    #[test]
    fn test_demo_has_notes_and_lines() {
        let manuscript = demo_manuscript();
        assert_eq!(manuscript.sections.len(), 2);
        assert_eq!(manuscript.tokenized_lines().count(), 7);
    }
}
