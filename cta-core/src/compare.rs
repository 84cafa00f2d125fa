//! Comparação do uso de sinais entre dois manuscritos.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::signs::SignCount;

/// Qual manuscrito ordena o ranking de sinais compartilhados.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankBy {
    First,
    Second,
}

/// Sinais exclusivos de cada manuscrito e sinais compartilhados (com as duas contagens).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignOverlap {
    pub unique_a: BTreeMap<String, SignCount>,
    pub unique_b: BTreeMap<String, SignCount>,
    pub overlap: BTreeMap<String, (SignCount, SignCount)>,
}

impl SignOverlap {
    /// Os `n` sinais compartilhados mais usados no manuscrito escolhido.
    ///
    /// Empates são desfeitos pela ordem alfabética do sinal.
    pub fn top_overlap(&self, by: RankBy, n: usize) -> Vec<(&str, usize)> {
        let mut ranked: Vec<(&str, usize)> = self
            .overlap
            .iter()
            .map(|(sign, (a, b))| {
                let total = match by {
                    RankBy::First => a.total(),
                    RankBy::Second => b.total(),
                };
                (sign.as_str(), total)
            })
            .collect();
        ranked.sort_by(|x, y| y.1.cmp(&x.1).then_with(|| x.0.cmp(y.0)));
        ranked.truncate(n);
        ranked
    }
}

/// Compara os mapas de sinais de dois manuscritos.
pub fn compare_sign_usage(
    signs_a: &BTreeMap<String, SignCount>,
    signs_b: &BTreeMap<String, SignCount>,
) -> SignOverlap {
    let mut result = SignOverlap::default();

    for (sign, count) in signs_a {
        match signs_b.get(sign) {
            Some(other) => {
                result.overlap.insert(sign.clone(), (*count, *other));
            }
            None => {
                result.unique_a.insert(sign.clone(), *count);
            }
        }
    }
    for (sign, count) in signs_b {
        if !result.overlap.contains_key(sign) {
            result.unique_b.insert(sign.clone(), *count);
        }
    }

    debug!(
        unique_a = result.unique_a.len(),
        unique_b = result.unique_b.len(),
        overlap = result.overlap.len(),
        "comparação de sinais concluída"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signs::scan_signs;

    #[test]
    fn test_compare_sign_usage() {
        let a = scan_signs("a-na a-na šar-ru", "A 1").signs;
        let b = scan_signs("a-na [a] lugal", "B 1").signs;
        let result = compare_sign_usage(&a, &b);

        assert_eq!(result.unique_a.keys().collect::<Vec<_>>(), ["ru", "šar"]);
        assert_eq!(result.unique_b.keys().collect::<Vec<_>>(), ["lugal"]);
        assert_eq!(result.overlap.keys().collect::<Vec<_>>(), ["a", "na"]);

        let (in_a, in_b) = result.overlap["a"];
        assert_eq!(in_a.preserved, 2);
        assert_eq!((in_b.preserved, in_b.reconstructed), (1, 1));
    }

    #[test]
    fn test_top_overlap() {
        let a = scan_signs("a-na a-na na", "A 1").signs;
        let b = scan_signs("a a a na", "B 1").signs;
        let result = compare_sign_usage(&a, &b);

        assert_eq!(result.top_overlap(RankBy::First, 10), [("na", 3), ("a", 2)]);
        assert_eq!(result.top_overlap(RankBy::Second, 1), [("a", 3)]);
    }

    #[test]
    fn test_compare_empty() {
        let result = compare_sign_usage(&BTreeMap::new(), &BTreeMap::new());
        assert_eq!(result, SignOverlap::default());
        assert!(result.top_overlap(RankBy::First, 5).is_empty());
    }
}
