use std::path::Path;

use thiserror::Error;

use crate::models::{validate_digits, DrawRecord, POSITIONS};

#[derive(Debug, Error)]
pub enum LedgerError {
    /// Historique absent, illisible ou vide : la passe s'arrête avant toute écriture.
    #[error("Données indisponibles : {0}")]
    DataUnavailable(String),
    /// L'historique lui-même viole le schéma (période en double).
    #[error("Schéma invalide : {0}")]
    SchemaViolation(String),
}

/// Historique des tirages, trié par période strictement croissante.
/// Alimenté par le collecteur externe; le moteur ne fait que le lire.
#[derive(Debug, Clone)]
pub struct Ledger {
    records: Vec<DrawRecord>,
}

impl Ledger {
    /// Trie par période et vérifie l'unicité des périodes.
    pub fn from_records(mut records: Vec<DrawRecord>) -> Result<Self, LedgerError> {
        records.sort_by_key(|r| r.period);
        for pair in records.windows(2) {
            if pair[0].period == pair[1].period {
                return Err(LedgerError::SchemaViolation(format!(
                    "période en double : {}",
                    pair[0].period
                )));
            }
        }
        Ok(Self { records })
    }

    pub fn records(&self) -> &[DrawRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn last(&self) -> Option<&DrawRecord> {
        self.records.last()
    }

    pub fn find(&self, period: u32) -> Option<&DrawRecord> {
        self.records
            .binary_search_by_key(&period, |r| r.period)
            .ok()
            .map(|i| &self.records[i])
    }

    /// Tirages clonés du plus récent au plus ancien (convention des modules d'analyse).
    pub fn recent_first(&self) -> Vec<DrawRecord> {
        self.records.iter().rev().cloned().collect()
    }
}

#[derive(Debug)]
pub struct LoadResult {
    pub ledger: Ledger,
    pub total_rows: u32,
    pub skipped: u32,
}

fn parse_record(record: &csv::StringRecord) -> anyhow::Result<DrawRecord> {
    let get = |idx: usize| -> anyhow::Result<String> {
        record
            .get(idx)
            .map(|s| s.trim().to_string())
            .ok_or_else(|| anyhow::anyhow!("champ manquant à l'index {}", idx))
    };

    let get_u8 = |idx: usize| -> anyhow::Result<u8> {
        let s = get(idx)?;
        s.parse::<u8>()
            .map_err(|_| anyhow::anyhow!("impossible de parser '{}' (index {})", s, idx))
    };

    let period: u32 = {
        let s = get(0)?;
        s.parse()
            .map_err(|_| anyhow::anyhow!("période invalide : '{}'", s))?
    };
    let date = get(1)?;

    let digits: [u8; POSITIONS] = [get_u8(2)?, get_u8(3)?, get_u8(4)?, get_u8(5)?, get_u8(6)?];
    validate_digits(&digits)?;

    Ok(DrawRecord { period, date, digits })
}

/// Charge l'historique CSV (`period,date,d1,d2,d3,d4,d5`, une ligne d'en-tête).
/// Les lignes malformées sont ignorées avec un avertissement; un fichier
/// absent, vide ou sans aucune ligne valide est fatal.
pub fn load_ledger(path: &Path) -> Result<LoadResult, LedgerError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| {
            LedgerError::DataUnavailable(format!("impossible d'ouvrir {} : {}", path.display(), e))
        })?;

    let mut records = Vec::new();
    let mut total_rows = 0u32;
    let mut skipped = 0u32;

    for record_result in reader.records() {
        total_rows += 1;
        match record_result {
            Ok(record) => match parse_record(&record) {
                Ok(draw) => records.push(draw),
                Err(e) => {
                    eprintln!("Ligne {} ignorée : {}", total_rows + 1, e);
                    skipped += 1;
                }
            },
            Err(e) => {
                eprintln!("Ligne {} illisible : {}", total_rows + 1, e);
                skipped += 1;
            }
        }
    }

    if records.is_empty() {
        return Err(LedgerError::DataUnavailable(format!(
            "aucun tirage valide dans {}",
            path.display()
        )));
    }

    let ledger = Ledger::from_records(records)?;
    Ok(LoadResult {
        ledger,
        total_rows,
        skipped,
    })
}
