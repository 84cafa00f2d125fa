//! # Designações de Seção e de Linha
//!
//! Decompõe cabeçalhos de seção (`"obv. ii"`) e identificadores de linha
//! (`"A obv. ii 12"`) nos campos que a exportação ORACC precisa.
//!
//! Quais campos existem é informado pelo chamador através de
//! [`OraccOptions`] (`rec_vers`, `cols`, `lines`):
//!
//! ```text
//! cabeçalho:  [<lado>] [<coluna>]
//! linha:      <manuscrito> [<lado>] [<coluna>] [<linha>]
//! ```
//!
//! Uma designação com número de campos diferente do esperado falha com
//! [`CoreError::LineDesignation`].

use serde::{Deserialize, Serialize};

use crate::config::OraccOptions;
use crate::error::{CoreError, Result};

/// Converte um numeral romano (notação subtrativa, sem diferenciar caixa) para arábico.
pub fn roman_to_arabic(token: &str) -> Result<u32> {
    let not_roman = || CoreError::NotRoman {
        token: token.to_string(),
    };

    let values = token
        .chars()
        .map(|c| match c.to_ascii_uppercase() {
            'I' => Some(1),
            'V' => Some(5),
            'X' => Some(10),
            'L' => Some(50),
            'C' => Some(100),
            'D' => Some(500),
            'M' => Some(1000),
            _ => None,
        })
        .collect::<Option<Vec<u32>>>()
        .filter(|values| !values.is_empty())
        .ok_or_else(not_roman)?;

    let total: i64 = values
        .iter()
        .enumerate()
        .map(|(i, &value)| match values.get(i + 1) {
            Some(&next) if value < next => -i64::from(value),
            _ => i64::from(value),
        })
        .sum();
    u32::try_from(total).map_err(|_| not_roman())
}

/// Número da coluna: algarismos arábicos ou romanos.
///
/// Um token que não é nenhum dos dois volta inalterado.
pub fn column_number(token: &str) -> String {
    if token.chars().all(|c| c.is_ascii_digit()) && !token.is_empty() {
        return token.to_string();
    }
    roman_to_arabic(token)
        .map(|n| n.to_string())
        .unwrap_or_else(|_| token.to_string())
}

/// Face da tábua.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Recto,
    Verso,
}

impl Side {
    /// Reconhece `obv.`/`r.`/`recto` e `rev.`/`v.`/`verso`.
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.to_lowercase();
        if token.starts_with("obv") {
            Some(Side::Recto)
        } else if token.starts_with("rev") {
            Some(Side::Verso)
        } else if token.starts_with('r') {
            Some(Side::Recto)
        } else if token.starts_with('v') {
            Some(Side::Verso)
        } else {
            None
        }
    }

    /// Inicial usada nos rótulos de tradução.
    pub fn initial(&self) -> char {
        match self {
            Side::Recto => 'r',
            Side::Verso => 'v',
        }
    }

    /// Cabeçalho ATF da face.
    pub fn header(&self) -> &'static str {
        match self {
            Side::Recto => "@obverse",
            Side::Verso => "@reverse",
        }
    }
}

/// Campos de um cabeçalho de seção.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionLabel {
    pub side: Option<Side>,
    pub column: Option<String>,
}

/// Campos de um identificador de linha (o manuscrito é descartado).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineLabel {
    pub side: Option<Side>,
    pub column: Option<String>,
    pub line: Option<String>,
}

impl LineLabel {
    /// Rótulo de tradução (`"@(r 2 5)"`), ou `None` se nenhum campo existir.
    pub fn label(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(side) = self.side {
            parts.push(side.initial().to_string());
        }
        parts.extend(self.column.iter().cloned());
        parts.extend(self.line.iter().cloned());

        if parts.is_empty() {
            None
        } else {
            Some(format!("@({})", parts.join(" ")))
        }
    }
}

fn designation_error(designation: &str) -> CoreError {
    CoreError::LineDesignation {
        designation: designation.to_string(),
    }
}

/// Lê os campos `[lado] [coluna]` da sequência, conforme as opções.
fn side_and_column<'a>(
    fields: &mut impl Iterator<Item = &'a str>,
    options: &OraccOptions,
    designation: &str,
) -> Result<(Option<Side>, Option<String>)> {
    let side = match options.rec_vers {
        true => {
            let token = fields.next().ok_or_else(|| designation_error(designation))?;
            Some(Side::parse(token).ok_or_else(|| designation_error(designation))?)
        }
        false => None,
    };
    let column = match options.cols {
        true => Some(column_number(
            fields.next().ok_or_else(|| designation_error(designation))?,
        )),
        false => None,
    };
    Ok((side, column))
}

/// Decompõe um cabeçalho de seção.
///
/// Sem `rec_vers` nem `cols`, qualquer cabeçalho resulta no rótulo vazio.
pub fn parse_section(heading: &str, options: &OraccOptions) -> Result<SectionLabel> {
    let expected = options.rec_vers as usize + options.cols as usize;
    if expected == 0 {
        return Ok(SectionLabel::default());
    }

    let fields: Vec<&str> = heading.split_whitespace().collect();
    if fields.len() != expected {
        return Err(designation_error(heading));
    }

    let (side, column) = side_and_column(&mut fields.into_iter(), options, heading)?;
    Ok(SectionLabel { side, column })
}

/// Decompõe um identificador de linha.
pub fn parse_line_id(line_id: &str, options: &OraccOptions) -> Result<LineLabel> {
    let expected = 1 + options.rec_vers as usize + options.cols as usize + options.lines as usize;
    let fields: Vec<&str> = line_id.split_whitespace().collect();
    if fields.len() != expected {
        return Err(designation_error(line_id));
    }

    let mut fields = fields.into_iter().skip(1);
    let (side, column) = side_and_column(&mut fields, options, line_id)?;
    let line = match options.lines {
        true => fields.next().map(str::to_string),
        false => None,
    };
    Ok(LineLabel { side, column, line })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(rec_vers: bool, cols: bool, lines: bool) -> OraccOptions {
        OraccOptions {
            rec_vers,
            cols,
            lines,
            ..OraccOptions::default()
        }
    }

    #[test]
    fn test_roman_numerals() {
        assert_eq!(roman_to_arabic("III").unwrap(), 3);
        assert_eq!(roman_to_arabic("IV").unwrap(), 4);
        assert_eq!(roman_to_arabic("ix").unwrap(), 9);
        assert_eq!(roman_to_arabic("XIV").unwrap(), 14);
        assert_eq!(roman_to_arabic("MCMXC").unwrap(), 1990);
    }

    #[test]
    fn test_non_roman_token_unchanged() {
        let err = roman_to_arabic("col").unwrap_err();
        assert_eq!(err, CoreError::NotRoman { token: "col".into() });
        assert_eq!(column_number("col"), "col");
        assert_eq!(column_number("ii"), "2");
        assert_eq!(column_number("3"), "3");
    }

    #[test]
    fn test_sides() {
        assert_eq!(Side::parse("obv."), Some(Side::Recto));
        assert_eq!(Side::parse("rev."), Some(Side::Verso));
        assert_eq!(Side::parse("r."), Some(Side::Recto));
        assert_eq!(Side::parse("v"), Some(Side::Verso));
        assert_eq!(Side::parse("edge"), None);
    }

    #[test]
    fn test_parse_section() {
        let label = parse_section("rev. iii", &OraccOptions::default()).unwrap();
        assert_eq!(label.side, Some(Side::Verso));
        assert_eq!(label.column.as_deref(), Some("3"));

        let label = parse_section("ii", &options(false, true, true)).unwrap();
        assert_eq!(label, SectionLabel { side: None, column: Some("2".into()) });

        assert_eq!(parse_section("anything", &options(false, false, true)).unwrap(), SectionLabel::default());
    }

    #[test]
    fn test_parse_section_wrong_field_count() {
        let err = parse_section("obv.", &OraccOptions::default()).unwrap_err();
        assert_eq!(err.to_string(), "Error in parsing line designation");
    }

    #[test]
    fn test_parse_line_id() {
        let label = parse_line_id("A obv. ii 5", &OraccOptions::default()).unwrap();
        assert_eq!(label.label().as_deref(), Some("@(r 2 5)"));

        let label = parse_line_id("B 7'", &options(false, false, true)).unwrap();
        assert_eq!(label.label().as_deref(), Some("@(7')"));

        let label = parse_line_id("B", &options(false, false, false)).unwrap();
        assert_eq!(label.label(), None);
    }

    #[test]
    fn test_parse_line_id_failures() {
        assert!(parse_line_id("A obv. 5", &OraccOptions::default()).is_err());
        assert!(parse_line_id("A edge i 5", &OraccOptions::default()).is_err());
    }
}
