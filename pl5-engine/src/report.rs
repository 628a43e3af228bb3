use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use pl5_db::models::POSITIONS;

use crate::backtest::BacktestResult;
use crate::error::{write_atomic, EngineError};
use crate::scoring::{Combination, ScoredCandidate};
use crate::tuner::TuneOutcome;
use crate::weights::WeightConfig;

/// Alias stable du dernier rapport d'analyse.
pub const LATEST_ANALYSIS: &str = "latest_pl5_analysis.txt";
/// Fichier de calcul des gains, à historique borné.
pub const LATEST_CALCULATION: &str = "latest_pl5_calculation.txt";
/// Entrées conservées dans le fichier de calcul.
pub const MAX_CALCULATION_ENTRIES: usize = 10;

fn separator() -> String {
    "=".repeat(80)
}

pub struct AnalysisContext<'a> {
    pub generated_at: &'a str,
    pub cutoff_period: u32,
    pub target_period: u32,
    pub requested_window: usize,
    pub short_window: usize,
    pub full_window: usize,
    pub ranked: &'a [Vec<ScoredCandidate>],
    pub top_n: usize,
    pub combinations: &'a [Combination],
    pub weights: &'a WeightConfig,
    pub resolved: usize,
    pub hit_rate: f64,
    pub outcome: &'a TuneOutcome,
}

/// Rend le rapport d'analyse. Déterministe : mêmes entrées ⇒ mêmes octets,
/// l'horodatage est une entrée comme une autre.
pub fn render_analysis(ctx: &AnalysisContext) -> String {
    let mut out = String::new();
    let sep = separator();

    let _ = writeln!(out, "{}", sep);
    let _ = writeln!(out, "RAPPORT D'ANALYSE PL5");
    let _ = writeln!(out, "{}", sep);
    let _ = writeln!(out, "Généré le                     : {}", ctx.generated_at);
    let _ = writeln!(
        out,
        "Analyse basée sur les données : jusqu'à la période {}",
        ctx.cutoff_period
    );
    let _ = writeln!(
        out,
        "Cible de la prédiction        : période {}",
        ctx.target_period
    );
    let _ = writeln!(
        out,
        "Fenêtre courte                : {}/{} tirages (historique : {})",
        ctx.short_window, ctx.requested_window, ctx.full_window
    );

    let _ = writeln!(out, "\n-- Classement par position (top {}) --", ctx.top_n);
    for (pos, candidates) in ctx.ranked.iter().enumerate() {
        let line = candidates
            .iter()
            .take(ctx.top_n)
            .map(|c| format!("{} ({:.4})", c.digit, c.score))
            .collect::<Vec<_>>()
            .join(" | ");
        let _ = writeln!(out, "Position {} : {}", pos + 1, line);
    }

    let _ = writeln!(out, "\n-- Recommandation duplex --");
    for (pos, candidates) in ctx.ranked.iter().enumerate() {
        let digits = candidates
            .iter()
            .take(ctx.top_n)
            .map(|c| c.digit.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(out, "Position {} : [{}]", pos + 1, digits);
    }

    let _ = writeln!(out, "\n-- Mises simples --");
    for (i, combo) in ctx.combinations.iter().enumerate() {
        let digits = combo
            .digits
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(out, "Mise {} : [{}]  (score {:.4})", i + 1, digits, combo.score);
    }

    let _ = writeln!(out, "\n-- Backtest --");
    let _ = writeln!(out, "Prédictions résolues          : {}", ctx.resolved);
    let _ = writeln!(out, "Taux de réussite par position : {:.4}", ctx.hit_rate);
    let _ = writeln!(out, "Ajustement                    : {}", ctx.outcome);

    let _ = writeln!(out, "\n-- Poids du modèle --");
    let width = ctx
        .weights
        .weights
        .keys()
        .map(|k| k.len())
        .max()
        .unwrap_or(0);
    for (key, weight) in &ctx.weights.weights {
        let _ = writeln!(out, "{:width$} : {:.4}", key, weight, width = width);
    }
    let _ = writeln!(
        out,
        "(itérations : {}, mis à jour : {})",
        ctx.weights.iterations,
        if ctx.weights.updated_at.is_empty() {
            "jamais"
        } else {
            &ctx.weights.updated_at
        }
    );
    let _ = writeln!(out, "{}", sep);

    out
}

/// Entrée du fichier de calcul : gains d'une période évaluée.
pub fn render_calculation_entry(evaluated_at: &str, result: &BacktestResult) -> String {
    let mut out = String::new();
    let winning: String = result.revealed.iter().map(|d| d.to_string()).collect();
    let marks = result
        .position_hits
        .iter()
        .map(|&h| if h { "O" } else { "X" })
        .collect::<Vec<_>>()
        .join(" ");

    let _ = writeln!(out, "Évaluation du      : {}", evaluated_at);
    let _ = writeln!(out, "Période évaluée    : {}", result.target_period);
    let _ = writeln!(out, "Numéro gagnant     : {}", winning);
    let _ = writeln!(out, "Mises jouées       : {}", result.bets_played);
    let _ = writeln!(out, "Mises gagnantes    : {}", result.exact_bets);
    let _ = writeln!(out, "Gain total         : {} yuans", result.gain);
    let _ = writeln!(
        out,
        "Positions trouvées : {} ({}/{})",
        marks, result.hit_count, POSITIONS
    );

    out
}

/// Écrit le rapport horodaté puis l'alias stable, tous deux atomiquement.
/// La rétention des rapports horodatés est un souci externe.
pub fn write_analysis(
    dir: &Path,
    stamp: &str,
    content: &str,
) -> Result<(PathBuf, PathBuf), EngineError> {
    std::fs::create_dir_all(dir).map_err(|e| EngineError::persistence(dir, e))?;
    let dated = dir.join(format!("pl5_analysis_{}.txt", stamp));
    write_atomic(&dated, content)?;
    let latest = dir.join(LATEST_ANALYSIS);
    write_atomic(&latest, content)?;
    Ok((dated, latest))
}

/// Insère une entrée en tête du fichier de calcul en bornant l'historique
/// aux entrées les plus récentes.
pub fn append_calculation(path: &Path, entry: &str) -> Result<(), EngineError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| EngineError::persistence(parent, e))?;
        }
    }
    let existing = std::fs::read_to_string(path).unwrap_or_default();
    let sep = format!("\n{}\n", separator());

    let mut sections: Vec<String> = vec![entry.trim_end().to_string()];
    sections.extend(
        existing
            .split(&sep)
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.trim_end().to_string()),
    );
    sections.truncate(MAX_CALCULATION_ENTRIES);

    write_atomic(path, &sections.join(&sep))
}
