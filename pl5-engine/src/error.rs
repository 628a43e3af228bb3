use std::fmt;
use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Lecture ou écriture d'un fichier possédé par le moteur
    /// (poids, journal de prédictions, rapports).
    #[error("Échec de persistance de {path} : {detail}")]
    PersistenceFailure { path: String, detail: String },
}

impl EngineError {
    pub(crate) fn persistence(path: &Path, detail: impl fmt::Display) -> Self {
        EngineError::PersistenceFailure {
            path: path.display().to_string(),
            detail: detail.to_string(),
        }
    }
}

/// Remplacement atomique : écriture dans un fichier temporaire du même
/// répertoire puis renommage. Une interruption laisse l'ancien fichier intact.
pub(crate) fn write_atomic(path: &Path, content: &str) -> Result<(), EngineError> {
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, content).map_err(|e| EngineError::persistence(&tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| EngineError::persistence(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_atomic_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("poids.json");
        write_atomic(&path, "premier").unwrap();
        write_atomic(&path, "second").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
        assert!(!path.with_extension("tmp").exists());
    }
}
