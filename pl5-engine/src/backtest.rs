use pl5_db::ledger::Ledger;
use pl5_db::models::{DrawRecord, POSITIONS};

use crate::features::extract;
use crate::predictions::{PredictionLog, PredictionRecord};
use crate::scoring::{score_positions, top_digits};
use crate::weights::WeightConfig;

/// Gain du rang direct (les 5 positions exactes), en yuans.
pub const DIRECT_PRIZE: u64 = 100_000;
/// Historique minimal avant un tirage rejoué pour que le test compte.
pub const MIN_HISTORY: usize = 10;

/// Résultat du croisement d'une prédiction avec le tirage révélé.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub target_period: u32,
    pub revealed: [u8; POSITIONS],
    pub position_hits: [bool; POSITIONS],
    pub hit_count: usize,
    pub bets_played: usize,
    pub exact_bets: usize,
    pub gain: u64,
}

fn resolve_one(record: &PredictionRecord, draw: &DrawRecord) -> BacktestResult {
    let mut position_hits = [false; POSITIONS];
    for (pos, hit) in position_hits.iter_mut().enumerate() {
        *hit = record
            .top_digits
            .get(pos)
            .map_or(false, |digits| digits.contains(&draw.digits[pos]));
    }
    let hit_count = position_hits.iter().filter(|&&h| h).count();
    let exact_bets = record.bets.iter().filter(|bet| **bet == draw.digits).count();

    BacktestResult {
        target_period: record.target_period,
        revealed: draw.digits,
        position_hits,
        hit_count,
        bets_played: record.bets.len(),
        exact_bets,
        gain: DIRECT_PRIZE * exact_bets as u64,
    }
}

/// Croise chaque prédiction résoluble (période cible présente dans
/// l'historique) avec le tirage révélé. Les prédictions encore ouvertes sont
/// ignorées.
pub fn resolve(log: &PredictionLog, ledger: &Ledger) -> Vec<BacktestResult> {
    log.records
        .iter()
        .filter_map(|record| ledger.find(record.target_period).map(|draw| resolve_one(record, draw)))
        .collect()
}

/// Taux de réussite agrégé par position sur un ensemble de résultats.
pub fn hit_rate(results: &[BacktestResult]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    let hits: usize = results.iter().map(|r| r.hit_count).sum();
    hits as f64 / (results.len() * POSITIONS) as f64
}

/// Rejoue le modèle pondéré sur les `eval_window` derniers tirages, sans
/// fuite du futur : chaque tirage testé n'est prédit qu'à partir des tirages
/// strictement antérieurs. Retourne le taux de réussite par position.
pub fn evaluate_weights(
    ledger: &Ledger,
    config: &WeightConfig,
    eval_window: usize,
    short_window: usize,
    top_n: usize,
) -> f64 {
    let records = ledger.records();
    let n = records.len();
    let start = n.saturating_sub(eval_window).max(MIN_HISTORY);

    let mut hits = 0usize;
    let mut tested = 0usize;

    for t in start..n {
        let history: Vec<DrawRecord> = records[..t].iter().rev().cloned().collect();
        let frame = extract(&history, short_window);
        let ranked = score_positions(&frame, config);
        let top = top_digits(&ranked, top_n);

        for pos in 0..POSITIONS {
            if top[pos].contains(&records[t].digits[pos]) {
                hits += 1;
            }
        }
        tested += POSITIONS;
    }

    if tested == 0 {
        0.0
    } else {
        hits as f64 / tested as f64
    }
}
