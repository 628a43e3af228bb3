use std::collections::BTreeMap;

use pl5_db::models::{DigitStats, DrawRecord, DIGITS, POSITIONS};

/// Fenêtre courte par défaut (nombre de tirages).
pub const DEFAULT_SHORT_WINDOW: usize = 30;

/// Clés produites par l'extracteur. Toute configuration de poids chargée est
/// réconciliée contre cette liste.
pub const FEATURE_KEYS: [&str; 5] = [
    "freq_short",
    "freq_full",
    "retard_short",
    "retard_full",
    "trend",
];

/// Caractéristiques par position et par chiffre, recalculées à chaque passe.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureFrame {
    /// Fenêtre courte effective (clampée à l'historique disponible).
    pub short_window: usize,
    /// Taille de l'historique complet.
    pub full_window: usize,
    /// `positions[p][d]` : nom de caractéristique → valeur pour le chiffre d
    /// en position p.
    pub positions: Vec<Vec<BTreeMap<String, f64>>>,
}

/// Fréquence d'apparition du chiffre en position `pos` sur les `window`
/// tirages les plus récents. `draws[0]` = le plus récent.
pub fn frequency_in_window(draws: &[DrawRecord], pos: usize, digit: u8, window: usize) -> f64 {
    let w = window.min(draws.len());
    if w == 0 {
        return 0.0;
    }
    let count = draws[..w].iter().filter(|d| d.digits[pos] == digit).count();
    count as f64 / w as f64
}

/// Retard brut : nombre de tirages depuis la dernière apparition dans la
/// fenêtre. 0 si présent au tirage le plus récent, `window` effectif si
/// jamais vu.
pub fn omission(draws: &[DrawRecord], pos: usize, digit: u8, window: usize) -> usize {
    let w = window.min(draws.len());
    for (i, draw) in draws[..w].iter().enumerate() {
        if draw.digits[pos] == digit {
            return i;
        }
    }
    w
}

/// Extrait en une passe les caractéristiques sur la fenêtre courte et sur
/// l'historique complet. Pure : mêmes tirages ⇒ même résultat.
pub fn extract(draws: &[DrawRecord], short_window: usize) -> FeatureFrame {
    let eff_short = short_window.min(draws.len());
    let full = draws.len();

    let positions = (0..POSITIONS)
        .map(|pos| {
            (0..DIGITS as u8)
                .map(|digit| {
                    let freq_short = frequency_in_window(draws, pos, digit, eff_short);
                    let freq_full = frequency_in_window(draws, pos, digit, full);
                    let gap_short = omission(draws, pos, digit, eff_short);
                    let gap_full = omission(draws, pos, digit, full);

                    // Retards normalisés par la fenêtre effective pour rester
                    // sur la même échelle que les fréquences.
                    let retard_short = if eff_short > 0 {
                        gap_short as f64 / eff_short as f64
                    } else {
                        0.0
                    };
                    let retard_full = if full > 0 {
                        gap_full as f64 / full as f64
                    } else {
                        0.0
                    };

                    BTreeMap::from([
                        ("freq_short".to_string(), freq_short),
                        ("freq_full".to_string(), freq_full),
                        ("retard_short".to_string(), retard_short),
                        ("retard_full".to_string(), retard_full),
                        ("trend".to_string(), freq_short - freq_full),
                    ])
                })
                .collect()
        })
        .collect();

    FeatureFrame {
        short_window: eff_short,
        full_window: full,
        positions,
    }
}

/// Table fréquence/retard bruts par position, pour l'affichage et le rapport.
pub fn position_stats(draws: &[DrawRecord], window: usize) -> Vec<Vec<DigitStats>> {
    let w = window.min(draws.len());
    (0..POSITIONS)
        .map(|pos| {
            (0..DIGITS as u8)
                .map(|digit| {
                    let count = draws[..w].iter().filter(|d| d.digits[pos] == digit).count();
                    DigitStats {
                        digit,
                        frequency: count as u32,
                        gap: omission(draws, pos, digit, w) as u32,
                    }
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::make_test_records;

    fn recent(records: &[DrawRecord]) -> Vec<DrawRecord> {
        records.iter().rev().cloned().collect()
    }

    #[test]
    fn test_omission_most_recent_is_zero() {
        let draws = recent(&make_test_records(20));
        let digit = draws[0].digits[2];
        assert_eq!(omission(&draws, 2, digit, 20), 0);
    }

    #[test]
    fn test_omission_never_seen_equals_window() {
        // Tous les tirages portent le chiffre 1 en position 0 : le 9 n'apparaît jamais.
        let draws: Vec<DrawRecord> = (0..15)
            .map(|i| DrawRecord {
                period: 100 + i,
                date: "2025-01-01".into(),
                digits: [1, 1, 1, 1, 1],
            })
            .collect();
        assert_eq!(omission(&draws, 0, 9, 15), 15);
        assert_eq!(omission(&draws, 0, 9, 10), 10);
    }

    #[test]
    fn test_omission_clamps_to_history() {
        let draws: Vec<DrawRecord> = (0..6)
            .map(|i| DrawRecord {
                period: 100 + i,
                date: "2025-01-01".into(),
                digits: [1, 1, 1, 1, 1],
            })
            .collect();
        // Fenêtre demandée plus large que l'historique : retard = taille effective.
        assert_eq!(omission(&draws, 0, 9, 50), 6);
    }

    #[test]
    fn test_frequency_counts() {
        let draws: Vec<DrawRecord> = vec![
            DrawRecord { period: 3, date: "2025-01-03".into(), digits: [7, 0, 0, 0, 0] },
            DrawRecord { period: 2, date: "2025-01-02".into(), digits: [7, 0, 0, 0, 0] },
            DrawRecord { period: 1, date: "2025-01-01".into(), digits: [4, 0, 0, 0, 0] },
        ];
        assert!((frequency_in_window(&draws, 0, 7, 3) - 2.0 / 3.0).abs() < 1e-12);
        assert!((frequency_in_window(&draws, 0, 7, 2) - 1.0).abs() < 1e-12);
        assert_eq!(frequency_in_window(&draws, 0, 9, 3), 0.0);
    }

    #[test]
    fn test_extract_window_clamped() {
        let draws = recent(&make_test_records(12));
        let frame = extract(&draws, 30);
        assert_eq!(frame.short_window, 12);
        assert_eq!(frame.full_window, 12);
    }

    #[test]
    fn test_extract_keys_match_known_set() {
        let draws = recent(&make_test_records(25));
        let frame = extract(&draws, 10);
        assert_eq!(frame.positions.len(), POSITIONS);
        for per_digit in &frame.positions {
            assert_eq!(per_digit.len(), DIGITS);
            for features in per_digit {
                let keys: Vec<&str> = features.keys().map(|k| k.as_str()).collect();
                let mut expected = FEATURE_KEYS.to_vec();
                expected.sort_unstable();
                assert_eq!(keys, expected);
            }
        }
    }

    #[test]
    fn test_extract_deterministic() {
        let draws = recent(&make_test_records(40));
        assert_eq!(extract(&draws, 20), extract(&draws, 20));
    }

    #[test]
    fn test_extract_no_nan() {
        let draws = recent(&make_test_records(40));
        let frame = extract(&draws, 20);
        for per_digit in &frame.positions {
            for features in per_digit {
                for (key, value) in features {
                    assert!(value.is_finite(), "valeur non finie pour {}", key);
                }
            }
        }
    }

    #[test]
    fn test_position_stats_shape() {
        let draws = recent(&make_test_records(30));
        let stats = position_stats(&draws, 30);
        assert_eq!(stats.len(), POSITIONS);
        for per_pos in &stats {
            assert_eq!(per_pos.len(), DIGITS);
            let total: u32 = per_pos.iter().map(|s| s.frequency).sum();
            assert_eq!(total, 30);
        }
    }
}
