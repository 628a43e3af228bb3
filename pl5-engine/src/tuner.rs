use std::fmt;

use pl5_db::ledger::Ledger;

use crate::backtest::{evaluate_weights, resolve};
use crate::predictions::PredictionLog;
use crate::weights::WeightConfig;

/// Pas d'ajustement : ±5 % du poids courant par passe.
pub const TUNE_STEP: f64 = 0.05;
/// Magnitude de référence minimale du pas, pour qu'un poids proche de zéro
/// puisse encore bouger et changer de signe.
pub const STEP_FLOOR: f64 = 0.2;
/// Borne des poids après ajustement.
pub const WEIGHT_CLAMP: f64 = 8.0;
/// Prédictions résolues minimales avant d'ajuster quoi que ce soit.
pub const MIN_RESOLVED: usize = 5;
/// Fenêtre d'évaluation rejouée (nombre de tirages).
pub const EVAL_WINDOW: usize = 30;

#[derive(Debug, Clone, PartialEq)]
pub enum TuneOutcome {
    /// Pas assez de prédictions résolues : issue normale, pas une erreur.
    ColdStart { resolved: usize },
    /// Nouvelle configuration retenue (taux rejoué avant → après).
    Adjusted { before: f64, after: f64 },
    /// Aucun pas n'a amélioré le taux : configuration entrante conservée.
    Kept { rate: f64 },
}

impl fmt::Display for TuneOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TuneOutcome::ColdStart { resolved } => write!(
                f,
                "démarrage à froid ({} prédiction(s) résolue(s), seuil {})",
                resolved, MIN_RESOLVED
            ),
            TuneOutcome::Adjusted { before, after } => {
                write!(f, "poids ajustés (taux {:.4} → {:.4})", before, after)
            }
            TuneOutcome::Kept { rate } => write!(f, "poids conservés (taux {:.4})", rate),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TuneReport {
    pub config: WeightConfig,
    pub outcome: TuneOutcome,
}

/// Ajustement adaptatif des poids par montée de coordonnées sans gradient :
/// pour chaque clé (ordre déterministe), on essaie ±TUNE_STEP et on ne garde
/// un pas que s'il améliore strictement le taux rejoué. Garde finale de
/// non-régression : la configuration entrante est conservée si la nouvelle
/// fait pire sur la fenêtre d'évaluation.
pub fn tune(
    ledger: &Ledger,
    log: &PredictionLog,
    config: &WeightConfig,
    short_window: usize,
    top_n: usize,
    updated_at: &str,
) -> TuneReport {
    let resolved = resolve(log, ledger).len();
    if resolved < MIN_RESOLVED {
        return TuneReport {
            config: config.clone(),
            outcome: TuneOutcome::ColdStart { resolved },
        };
    }

    let baseline = evaluate_weights(ledger, config, EVAL_WINDOW, short_window, top_n);

    let mut candidate = config.clone();
    let mut best_rate = baseline;
    let keys: Vec<String> = candidate.weights.keys().cloned().collect();

    for key in keys {
        let current = candidate.weights[&key];
        let step = TUNE_STEP * current.abs().max(STEP_FLOOR);
        for proposal in [current + step, current - step] {
            let mut trial = candidate.clone();
            trial
                .weights
                .insert(key.clone(), proposal.clamp(-WEIGHT_CLAMP, WEIGHT_CLAMP));
            let rate = evaluate_weights(ledger, &trial, EVAL_WINDOW, short_window, top_n);
            if rate > best_rate {
                best_rate = rate;
                candidate = trial;
            }
        }
    }

    if candidate.weights == config.weights {
        return TuneReport {
            config: config.clone(),
            outcome: TuneOutcome::Kept { rate: baseline },
        };
    }

    let after = evaluate_weights(ledger, &candidate, EVAL_WINDOW, short_window, top_n);
    if after < baseline {
        return TuneReport {
            config: config.clone(),
            outcome: TuneOutcome::Kept { rate: baseline },
        };
    }

    candidate.updated_at = updated_at.to_string();
    candidate.iterations = config.iterations + 1;
    candidate.hit_rate = after;
    TuneReport {
        config: candidate,
        outcome: TuneOutcome::Adjusted {
            before: baseline,
            after,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::extract;
    use crate::predictions::PredictionRecord;
    use crate::scoring::{score_positions, top_digits, DEFAULT_TOP_N};
    use pl5_db::models::{DrawRecord, POSITIONS};

    const STAMP: &str = "2025-06-01 12:00:00";

    /// Biais injecté : le chiffre 7 sort en position 1 dans 40 % des tirages,
    /// les autres positions restent des cycles arithmétiques.
    fn make_biased_records(n: usize) -> Vec<DrawRecord> {
        const OTHERS: [u8; 9] = [0, 1, 2, 3, 4, 5, 6, 8, 9];
        (0..n)
            .map(|i| {
                let mut digits = [0u8; POSITIONS];
                digits[0] = if i % 5 < 2 { 7 } else { OTHERS[(i * 7) % 9] };
                for (p, d) in digits.iter_mut().enumerate().skip(1) {
                    *d = ((i * (2 * p + 3) + 7 * p) % 10) as u8;
                }
                DrawRecord {
                    period: 25_000 + i as u32 + 1,
                    date: format!("2025-01-{:02}", i % 28 + 1),
                    digits,
                }
            })
            .collect()
    }

    /// Journal de prédictions résolues générées sans fuite du futur.
    fn resolved_log(ledger: &Ledger, config: &WeightConfig, from: usize) -> PredictionLog {
        let mut log = PredictionLog::default();
        for t in from..ledger.len() {
            let history: Vec<DrawRecord> =
                ledger.records()[..t].iter().rev().cloned().collect();
            let frame = extract(&history, 30);
            let ranked = score_positions(&frame, config);
            log.upsert(PredictionRecord {
                target_period: ledger.records()[t].period,
                generated_at: STAMP.into(),
                top_digits: top_digits(&ranked, DEFAULT_TOP_N),
                bets: vec![],
            });
        }
        log
    }

    #[test]
    fn test_cold_start_returns_config_unchanged() {
        let ledger = Ledger::from_records(crate::make_test_records(50)).unwrap();
        let config = WeightConfig::neutral();
        let report = tune(&ledger, &PredictionLog::default(), &config, 30, DEFAULT_TOP_N, STAMP);
        assert_eq!(report.outcome, TuneOutcome::ColdStart { resolved: 0 });
        assert_eq!(report.config, config);
    }

    #[test]
    fn test_below_threshold_is_cold_start() {
        let ledger = Ledger::from_records(crate::make_test_records(50)).unwrap();
        let config = WeightConfig::neutral();
        let log = resolved_log(&ledger, &config, 47); // 3 résolues < MIN_RESOLVED
        let report = tune(&ledger, &log, &config, 30, DEFAULT_TOP_N, STAMP);
        assert_eq!(report.outcome, TuneOutcome::ColdStart { resolved: 3 });
        assert_eq!(report.config, config);
    }

    #[test]
    fn test_non_regression_invariant() {
        let ledger = Ledger::from_records(make_biased_records(60)).unwrap();
        let config = WeightConfig::neutral();
        let log = resolved_log(&ledger, &config, 50);

        let before = evaluate_weights(&ledger, &config, EVAL_WINDOW, 30, DEFAULT_TOP_N);
        let report = tune(&ledger, &log, &config, 30, DEFAULT_TOP_N, STAMP);
        let after = evaluate_weights(&ledger, &report.config, EVAL_WINDOW, 30, DEFAULT_TOP_N);
        assert!(after >= before, "régression : {} < {}", after, before);
    }

    #[test]
    fn test_tune_deterministic() {
        let ledger = Ledger::from_records(make_biased_records(60)).unwrap();
        let config = WeightConfig::neutral();
        let log = resolved_log(&ledger, &config, 50);

        let a = tune(&ledger, &log, &config, 30, DEFAULT_TOP_N, STAMP);
        let b = tune(&ledger, &log, &config, 30, DEFAULT_TOP_N, STAMP);
        assert_eq!(a.config.weights, b.config.weights);
        assert_eq!(a.outcome, b.outcome);
    }

    #[test]
    fn test_weights_stay_finite_and_bounded() {
        let ledger = Ledger::from_records(make_biased_records(60)).unwrap();
        let mut config = WeightConfig::neutral();
        let log = resolved_log(&ledger, &config, 50);
        for _ in 0..5 {
            config = tune(&ledger, &log, &config, 30, DEFAULT_TOP_N, STAMP).config;
        }
        for (key, w) in &config.weights {
            assert!(w.is_finite(), "poids non fini pour {}", key);
            assert!(w.abs() <= WEIGHT_CLAMP, "poids hors borne pour {}", key);
        }
    }

    #[test]
    fn test_injected_bias_end_to_end() {
        // Historique de 60 tirages où le 7 sort en position 1 à 40 %.
        let ledger = Ledger::from_records(make_biased_records(60)).unwrap();
        let mut config = WeightConfig::neutral();
        let log = resolved_log(&ledger, &config, 50);

        for _ in 0..6 {
            config = tune(&ledger, &log, &config, 30, DEFAULT_TOP_N, STAMP).config;
        }

        let frame = extract(&ledger.recent_first(), 30);
        let ranked = score_positions(&frame, &config);
        let score_of = |digit: u8| {
            ranked[0]
                .iter()
                .find(|c| c.digit == digit)
                .map(|c| c.score)
                .unwrap()
        };
        // Le chiffre biaisé doit dominer un chiffre à distribution uniforme.
        assert!(
            score_of(7) > score_of(4),
            "score(7)={} devrait être > score(4)={}",
            score_of(7),
            score_of(4)
        );
    }
}
