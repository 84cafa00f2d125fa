//! # Normalizador de Linhas
//!
//! Converte a lista de tokens classificados de uma linha em uma única string
//! anotada, de acordo com a finalidade da análise:
//!
//! | Modo    | Determinativo      | Logograma     | Número de sinal        |
//! |---------|--------------------|---------------|------------------------|
//! | `Sign`  | `*texto*`          | inalterado    | inalterado             |
//! | `Word`  | `*TEXTO*`          | MAIÚSCULAS    | inalterado             |
//! | `Oracc` | `{texto}`          | inalterado    | dígitos subscritos     |
//!
//! Tokens de sigla do manuscrito são sempre ignorados.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{CoreError, Result};
use crate::manuscript::{Token, TokenKind};

/// Delimitador usado em volta dos determinativos nos modos `Sign` e `Word`.
pub const DETERMINATIVE_MARK: char = '*';

/// Finalidade da normalização.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizeMode {
    Sign,
    Word,
    Oracc,
}

/// Uma linha normalizada e os erros de número de sinal encontrados (apenas no modo `Oracc`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedLine {
    pub text: String,
    pub sign_errors: Vec<CoreError>,
}

/// Normaliza uma linha para o modo pedido. Função pura de (tokens, modo).
pub fn normalize_line(tokens: &[Token], mode: NormalizeMode) -> NormalizedLine {
    let mut line = NormalizedLine::default();

    for token in tokens {
        match (mode, token.kind) {
            (_, TokenKind::ManuscriptDesignation) => continue,
            (NormalizeMode::Sign, TokenKind::PostOrDeterminative) => {
                line.text.push(DETERMINATIVE_MARK);
                line.text.push_str(&token.text);
                line.text.push(DETERMINATIVE_MARK);
            }
            (NormalizeMode::Word, TokenKind::PostOrDeterminative) => {
                line.text.push(DETERMINATIVE_MARK);
                line.text.push_str(&token.text.to_uppercase());
                line.text.push(DETERMINATIVE_MARK);
            }
            (NormalizeMode::Word, TokenKind::Ideogram) => {
                line.text.push_str(&token.text.to_uppercase());
            }
            (NormalizeMode::Oracc, TokenKind::PostOrDeterminative) => {
                line.text.push('{');
                line.text.push_str(&token.text.to_lowercase());
                line.text.push('}');
            }
            (NormalizeMode::Oracc, TokenKind::SignNumber) => {
                match subscript_sign_number(&token.text) {
                    Ok(subscript) => line.text.push_str(&subscript),
                    Err(err) => {
                        warn!("{err}");
                        // Mantém o texto cru para que a linha continue legível
                        line.text.push_str(&token.text);
                        line.sign_errors.push(err);
                    }
                }
            }
            _ => line.text.push_str(&token.text),
        }
    }

    line
}

/// Texto da linha para o tokenizador de sinais.
pub fn normalize_for_signs(tokens: &[Token]) -> String {
    normalize_line(tokens, NormalizeMode::Sign).text
}

/// Texto da linha para a análise de palavras e o glossário.
pub fn normalize_for_words(tokens: &[Token]) -> String {
    normalize_line(tokens, NormalizeMode::Word).text
}

/// Converte um número de sinal (`"2"`, `"12"`, `"x"`) para dígitos subscritos.
pub fn subscript_sign_number(text: &str) -> Result<String> {
    text.chars()
        .map(|c| match c {
            '0'..='9' => char::from_u32('\u{2080}' as u32 + (c as u32 - '0' as u32)),
            'x' => Some('ₓ'),
            _ => None,
        })
        .collect::<Option<String>>()
        .ok_or_else(|| CoreError::SignNumber {
            text: text.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line() -> Vec<Token> {
        vec![
            Token::new("A:", TokenKind::ManuscriptDesignation),
            Token::new("d", TokenKind::PostOrDeterminative),
            Token::new("utu", TokenKind::Ideogram),
            Token::new(" a-na", TokenKind::Syllabic),
            Token::new("12", TokenKind::SignNumber),
        ]
    }

    #[test]
    fn test_sign_mode() {
        assert_eq!(normalize_for_signs(&line()), "*d*utu a-na12");
    }

    #[test]
    fn test_word_mode() {
        assert_eq!(normalize_for_words(&line()), "*D*UTU a-na12");
    }

    #[test]
    fn test_oracc_mode() {
        let normalized = normalize_line(&line(), NormalizeMode::Oracc);
        assert_eq!(normalized.text, "{d}utu a-na₁₂");
        assert!(normalized.sign_errors.is_empty());
    }

    #[test]
    fn test_oracc_sign_number_error() {
        let tokens = vec![
            Token::new("du", TokenKind::Syllabic),
            Token::new("3a", TokenKind::SignNumber),
        ];
        let normalized = normalize_line(&tokens, NormalizeMode::Oracc);
        assert_eq!(normalized.text, "du3a");
        assert_eq!(
            normalized.sign_errors,
            vec![CoreError::SignNumber { text: "3a".into() }]
        );
    }

    #[test]
    fn test_subscript_x() {
        assert_eq!(subscript_sign_number("x").unwrap(), "ₓ");
        assert_eq!(subscript_sign_number("10").unwrap(), "₁₀");
    }
}
