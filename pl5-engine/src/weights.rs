use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{write_atomic, EngineError};
use crate::features::FEATURE_KEYS;

/// Poids neutre des caractéristiques de type fréquence (et tendance).
pub const DEFAULT_FREQ_WEIGHT: f64 = 1.0;
/// Poids neutre des caractéristiques de type retard.
pub const DEFAULT_RETARD_WEIGHT: f64 = 0.5;
/// Poids appliqué à une clé inconnue rencontrée au scoring.
pub const UNKNOWN_KEY_WEIGHT: f64 = 1.0;

/// Configuration de poids persistée, source de vérité unique du scoring.
/// Mutée uniquement par le tuner, lue partout ailleurs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightConfig {
    pub weights: BTreeMap<String, f64>,
    pub updated_at: String,
    pub iterations: u32,
    pub hit_rate: f64,
}

impl WeightConfig {
    /// Configuration de démarrage à froid : toutes les clés connues à leur
    /// poids neutre documenté.
    pub fn neutral() -> Self {
        let weights = FEATURE_KEYS
            .iter()
            .map(|&key| (key.to_string(), default_weight_for(key)))
            .collect();
        Self {
            weights,
            updated_at: String::new(),
            iterations: 0,
            hit_rate: 0.0,
        }
    }

    pub fn weight_or_default(&self, key: &str) -> f64 {
        self.weights.get(key).copied().unwrap_or(UNKNOWN_KEY_WEIGHT)
    }
}

pub fn default_weight_for(key: &str) -> f64 {
    if key.starts_with("retard") {
        DEFAULT_RETARD_WEIGHT
    } else {
        DEFAULT_FREQ_WEIGHT
    }
}

/// Charge la configuration. Fichier absent = démarrage à froid (poids
/// neutres). Un fichier illisible ou des poids non finis sont fatals : le
/// fichier n'appartient qu'à ce moteur, une corruption doit remonter.
pub fn load(path: &Path) -> Result<WeightConfig, EngineError> {
    if !path.exists() {
        return Ok(WeightConfig::neutral());
    }
    let json =
        std::fs::read_to_string(path).map_err(|e| EngineError::persistence(path, e))?;
    let mut config: WeightConfig =
        serde_json::from_str(&json).map_err(|e| EngineError::persistence(path, e))?;

    if config.weights.values().any(|w| !w.is_finite()) {
        return Err(EngineError::persistence(path, "poids non finis"));
    }

    // Réconciliation : toute clé connue absente du fichier reprend son poids neutre.
    for key in FEATURE_KEYS {
        config
            .weights
            .entry(key.to_string())
            .or_insert_with(|| default_weight_for(key));
    }

    Ok(config)
}

/// Remplacement atomique du fichier de poids.
pub fn save(path: &Path, config: &WeightConfig) -> Result<(), EngineError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| EngineError::persistence(parent, e))?;
        }
    }
    let json =
        serde_json::to_string_pretty(config).map_err(|e| EngineError::persistence(path, e))?;
    write_atomic(path, &json)
}
