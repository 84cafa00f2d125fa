//! # Erros e Diagnósticos
//!
//! Nenhuma análise pública aborta: os problemas encontrados são coletados e
//! devolvidos junto com o resultado. [`CoreError`] é o motivo nomeado de uma
//! falha local (uma linha, um token, uma designação); os relatórios de cada
//! análise transformam esses motivos em mensagens.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::manuscript::LineId;

pub type Result<T> = std::result::Result<T, CoreError>;

/// Falha local de normalização, validação ou decomposição de rótulos.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Número de sinal com caracteres fora de `0-9` e `x`.
    #[error("sign number '{text}' contains characters other than 0-9 and x")]
    SignNumber { text: String },

    /// Violação de aninhamento de colchetes.
    #[error("{problem} '{bracket}'")]
    BracketNesting {
        bracket: String,
        problem: NestingProblem,
    },

    /// A designação não tem os campos esperados para as opções informadas.
    #[error("Error in parsing line designation")]
    LineDesignation { designation: String },

    /// O token não é um numeral romano.
    #[error("'{token}' is not a Roman numeral")]
    NotRoman { token: String },
}

/// Tipo de violação detectada pelo validador de colchetes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NestingProblem {
    /// Abertura enquanto o mesmo tipo já está aberto.
    AlreadyOpen,
    /// Fechamento sem abertura correspondente.
    NotOpen,
}

impl std::fmt::Display for NestingProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NestingProblem::AlreadyOpen => write!(f, "opening bracket while already open:"),
            NestingProblem::NotOpen => write!(f, "closing bracket without opening:"),
        }
    }
}

/// Caractere não reconhecido pelo tokenizador de sinais.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxErrorRecord {
    #[serde(rename = "char")]
    pub character: char,
    pub line_id: LineId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_designation_message() {
        let err = CoreError::LineDesignation {
            designation: "A 1".into(),
        };
        assert_eq!(err.to_string(), "Error in parsing line designation");
    }

    #[test]
    fn test_bracket_message() {
        let err = CoreError::BracketNesting {
            bracket: "]".into(),
            problem: NestingProblem::NotOpen,
        };
        assert_eq!(err.to_string(), "closing bracket without opening: ']'");
    }
}
