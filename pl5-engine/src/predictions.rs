use std::path::Path;

use serde::{Deserialize, Serialize};

use pl5_db::models::POSITIONS;

use crate::error::{write_atomic, EngineError};

/// Nombre maximal de prédictions conservées dans le journal.
pub const MAX_RECORDS: usize = 100;

/// Prédiction émise pour une période future; résolue dès que le tirage
/// correspondant apparaît dans l'historique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub target_period: u32,
    pub generated_at: String,
    /// Chiffres classés par position (duplex), meilleurs en tête.
    pub top_digits: Vec<Vec<u8>>,
    /// Mises simples jouées.
    pub bets: Vec<[u8; POSITIONS]>,
}

/// Journal persisté des prédictions, trié par période cible croissante.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionLog {
    pub records: Vec<PredictionRecord>,
}

impl PredictionLog {
    /// Insère ou remplace la prédiction visant la même période cible :
    /// relancer la passe le même jour régénère la prédiction.
    pub fn upsert(&mut self, record: PredictionRecord) {
        self.records.retain(|r| r.target_period != record.target_period);
        self.records.push(record);
        self.records.sort_by_key(|r| r.target_period);
    }

    /// Borne le journal aux `MAX_RECORDS` cibles les plus récentes.
    pub fn prune(&mut self) {
        if self.records.len() > MAX_RECORDS {
            let excess = self.records.len() - MAX_RECORDS;
            self.records.drain(..excess);
        }
    }
}

/// Charge le journal; un fichier absent donne un journal vide.
pub fn load(path: &Path) -> Result<PredictionLog, EngineError> {
    if !path.exists() {
        return Ok(PredictionLog::default());
    }
    let json = std::fs::read_to_string(path).map_err(|e| EngineError::persistence(path, e))?;
    serde_json::from_str(&json).map_err(|e| EngineError::persistence(path, e))
}

/// Remplacement atomique du journal.
pub fn save(path: &Path, log: &PredictionLog) -> Result<(), EngineError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| EngineError::persistence(parent, e))?;
        }
    }
    let json = serde_json::to_string_pretty(log).map_err(|e| EngineError::persistence(path, e))?;
    write_atomic(path, &json)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(target: u32) -> PredictionRecord {
        PredictionRecord {
            target_period: target,
            generated_at: "2025-06-01 12:00:00".into(),
            top_digits: vec![vec![7, 3, 2, 8, 1]; POSITIONS],
            bets: vec![[7, 3, 2, 8, 1]],
        }
    }

    #[test]
    fn test_upsert_replaces_same_target() {
        let mut log = PredictionLog::default();
        log.upsert(record(25001));
        let mut updated = record(25001);
        updated.bets = vec![[0, 0, 0, 0, 0]];
        log.upsert(updated.clone());
        assert_eq!(log.records.len(), 1);
        assert_eq!(log.records[0], updated);
    }

    #[test]
    fn test_upsert_keeps_sorted() {
        let mut log = PredictionLog::default();
        log.upsert(record(25003));
        log.upsert(record(25001));
        log.upsert(record(25002));
        let targets: Vec<u32> = log.records.iter().map(|r| r.target_period).collect();
        assert_eq!(targets, vec![25001, 25002, 25003]);
    }

    #[test]
    fn test_prune_keeps_most_recent() {
        let mut log = PredictionLog::default();
        for t in 0..(MAX_RECORDS as u32 + 10) {
            log.upsert(record(25000 + t));
        }
        log.prune();
        assert_eq!(log.records.len(), MAX_RECORDS);
        assert_eq!(log.records[0].target_period, 25010);
    }

    #[test]
    fn test_missing_file_is_empty_log() {
        let dir = tempfile::tempdir().unwrap();
        let log = load(&dir.path().join("absent.json")).unwrap();
        assert!(log.records.is_empty());
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("predictions.json");
        let mut log = PredictionLog::default();
        log.upsert(record(25001));
        log.upsert(record(25002));
        save(&path, &log).unwrap();
        assert_eq!(load(&path).unwrap(), log);
    }
}
