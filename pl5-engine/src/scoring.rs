use std::collections::BTreeSet;

use pl5_db::models::POSITIONS;

use crate::features::FeatureFrame;
use crate::weights::{WeightConfig, UNKNOWN_KEY_WEIGHT};

/// Nombre de candidats retenus par position en aval (duplex).
pub const DEFAULT_TOP_N: usize = 5;
/// Candidats par position combinés en mises simples.
pub const DEFAULT_SPREAD: usize = 2;
/// Nombre de mises simples recommandées.
pub const DEFAULT_BETS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub position: usize,
    pub digit: u8,
    pub score: f64,
}

/// Mise simple : un chiffre par position, score = somme des scores de position.
#[derive(Debug, Clone, PartialEq)]
pub struct Combination {
    pub digits: [u8; POSITIONS],
    pub score: f64,
}

/// Score pondéré par position et par chiffre :
/// score = Σ valeur_caractéristique × poids(clé).
/// Le signe n'est pas figé : un poids négatif inverse le sens d'une
/// caractéristique, c'est le tuner qui décide.
/// Classement décroissant, égalités départagées par chiffre croissant.
pub fn score_positions(frame: &FeatureFrame, config: &WeightConfig) -> Vec<Vec<ScoredCandidate>> {
    let mut unknown: BTreeSet<String> = BTreeSet::new();

    let ranked = frame
        .positions
        .iter()
        .enumerate()
        .map(|(position, per_digit)| {
            let mut scored: Vec<ScoredCandidate> = per_digit
                .iter()
                .enumerate()
                .map(|(digit, features)| {
                    let score = features
                        .iter()
                        .map(|(key, value)| {
                            let weight = match config.weights.get(key) {
                                Some(w) => *w,
                                None => {
                                    unknown.insert(key.clone());
                                    UNKNOWN_KEY_WEIGHT
                                }
                            };
                            value * weight
                        })
                        .sum();
                    ScoredCandidate {
                        position,
                        digit: digit as u8,
                        score,
                    }
                })
                .collect();

            scored.sort_by(|a, b| {
                b.score
                    .partial_cmp(&a.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.digit.cmp(&b.digit))
            });
            scored
        })
        .collect();

    for key in unknown {
        eprintln!(
            "Poids inconnu pour la caractéristique '{}', {} appliqué",
            key, UNKNOWN_KEY_WEIGHT
        );
    }

    ranked
}

/// Tronque le classement complet aux `top_n` premiers chiffres par position.
pub fn top_digits(ranked: &[Vec<ScoredCandidate>], top_n: usize) -> Vec<Vec<u8>> {
    ranked
        .iter()
        .map(|candidates| candidates.iter().take(top_n).map(|c| c.digit).collect())
        .collect()
}

/// Énumère le produit cartésien des `spread` meilleurs chiffres par position
/// et garde les `count` meilleures mises. Score = somme des scores de
/// position (l'indépendance entre positions est une simplification assumée).
/// Égalités départagées par ordre lexicographique croissant des chiffres.
pub fn best_combinations(
    ranked: &[Vec<ScoredCandidate>],
    spread: usize,
    count: usize,
) -> Vec<Combination> {
    if ranked.len() != POSITIONS || spread == 0 {
        return Vec::new();
    }
    let pools: Vec<&[ScoredCandidate]> = ranked
        .iter()
        .map(|candidates| &candidates[..spread.min(candidates.len())])
        .collect();
    if pools.iter().any(|p| p.is_empty()) {
        return Vec::new();
    }

    let total: usize = pools.iter().map(|p| p.len()).product();
    let mut combos = Vec::with_capacity(total);
    for mut index in 0..total {
        let mut digits = [0u8; POSITIONS];
        let mut score = 0.0;
        for (pos, pool) in pools.iter().enumerate() {
            let candidate = &pool[index % pool.len()];
            index /= pool.len();
            digits[pos] = candidate.digit;
            score += candidate.score;
        }
        combos.push(Combination { digits, score });
    }

    combos.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.digits.cmp(&b.digits))
    });
    combos.truncate(count);
    combos
}
