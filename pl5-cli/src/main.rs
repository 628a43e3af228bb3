mod display;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use pl5_db::ledger::{load_ledger, Ledger, LoadResult};
use pl5_engine::backtest::{hit_rate, resolve};
use pl5_engine::features::{extract, position_stats, DEFAULT_SHORT_WINDOW};
use pl5_engine::predictions::{self, PredictionRecord};
use pl5_engine::report::{
    append_calculation, render_analysis, render_calculation_entry, write_analysis,
    AnalysisContext, LATEST_CALCULATION,
};
use pl5_engine::scoring::{
    best_combinations, score_positions, top_digits, DEFAULT_BETS, DEFAULT_SPREAD, DEFAULT_TOP_N,
};
use pl5_engine::tuner::{tune, TuneOutcome};
use pl5_engine::weights;

#[derive(Parser)]
#[command(name = "pl5", about = "Analyse pondérée et backtest adaptatif des tirages pl5")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Exécuter la passe complète : chargement, scoring, backtest, ajustement, rapports
    Run {
        /// Fichier CSV de l'historique des tirages
        #[arg(long, default_value = "data/pl5.csv")]
        ledger: PathBuf,

        /// Fichier des poids du modèle
        #[arg(long, default_value = "data/pl5_weights.json")]
        weights: PathBuf,

        /// Journal des prédictions
        #[arg(long, default_value = "data/pl5_predictions.json")]
        predictions: PathBuf,

        /// Répertoire des rapports
        #[arg(long, default_value = "reports")]
        reports: PathBuf,

        /// Fenêtre courte d'analyse (nombre de tirages)
        #[arg(short, long, default_value_t = DEFAULT_SHORT_WINDOW)]
        window: usize,

        /// Candidats retenus par position
        #[arg(short, long, default_value_t = DEFAULT_TOP_N)]
        top: usize,

        /// Nombre de mises simples recommandées
        #[arg(short, long, default_value_t = DEFAULT_BETS)]
        bets: usize,

        /// Candidats par position combinés en mises
        #[arg(long, default_value_t = DEFAULT_SPREAD)]
        spread: usize,
    },

    /// Afficher les statistiques fréquence/retard par position
    Stats {
        #[arg(long, default_value = "data/pl5.csv")]
        ledger: PathBuf,

        /// Fenêtre d'analyse (nombre de tirages)
        #[arg(short, long, default_value_t = DEFAULT_SHORT_WINDOW)]
        window: usize,
    },

    /// Scorer les candidats sans rien persister
    Predict {
        #[arg(long, default_value = "data/pl5.csv")]
        ledger: PathBuf,

        #[arg(long, default_value = "data/pl5_weights.json")]
        weights: PathBuf,

        #[arg(short, long, default_value_t = DEFAULT_SHORT_WINDOW)]
        window: usize,

        #[arg(short, long, default_value_t = DEFAULT_TOP_N)]
        top: usize,

        #[arg(short, long, default_value_t = DEFAULT_BETS)]
        bets: usize,

        #[arg(long, default_value_t = DEFAULT_SPREAD)]
        spread: usize,
    },

    /// Croiser les prédictions passées avec les tirages révélés
    Backtest {
        #[arg(long, default_value = "data/pl5.csv")]
        ledger: PathBuf,

        #[arg(long, default_value = "data/pl5_predictions.json")]
        predictions: PathBuf,
    },

    /// Afficher la configuration de poids courante
    Weights {
        #[arg(long, default_value = "data/pl5_weights.json")]
        weights: PathBuf,
    },

    /// Lister les derniers tirages
    History {
        #[arg(long, default_value = "data/pl5.csv")]
        ledger: PathBuf,

        /// Nombre de tirages à afficher
        #[arg(short, long, default_value = "10")]
        last: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            ledger,
            weights,
            predictions,
            reports,
            window,
            top,
            bets,
            spread,
        } => cmd_run(&ledger, &weights, &predictions, &reports, window, top, bets, spread),
        Command::Stats { ledger, window } => cmd_stats(&ledger, window),
        Command::Predict {
            ledger,
            weights,
            window,
            top,
            bets,
            spread,
        } => cmd_predict(&ledger, &weights, window, top, bets, spread),
        Command::Backtest {
            ledger,
            predictions,
        } => cmd_backtest(&ledger, &predictions),
        Command::Weights { weights } => cmd_weights(&weights),
        Command::History { ledger, last } => cmd_history(&ledger, last),
    }
}

fn load_with_warnings(path: &PathBuf) -> Result<Ledger> {
    let LoadResult {
        ledger,
        total_rows,
        skipped,
    } = load_ledger(path)?;
    if skipped > 0 {
        eprintln!(
            "Attention : {} ligne(s) ignorée(s) sur {} dans {}",
            skipped,
            total_rows,
            path.display()
        );
    }
    Ok(ledger)
}

#[allow(clippy::too_many_arguments)]
fn cmd_run(
    ledger_path: &PathBuf,
    weights_path: &PathBuf,
    predictions_path: &PathBuf,
    reports_dir: &PathBuf,
    window: usize,
    top: usize,
    bets: usize,
    spread: usize,
) -> Result<()> {
    let started = Local::now();
    let stamp_human = started.format("%Y-%m-%d %H:%M:%S").to_string();
    let stamp_file = started.format("%Y%m%d_%H%M%S").to_string();

    let pb = ProgressBar::new(6);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("=> "),
    );

    pb.set_message("chargement de l'historique");
    let ledger = load_with_warnings(ledger_path)?;
    pb.inc(1);

    pb.set_message("chargement des poids et du journal");
    let config = weights::load(weights_path)?;
    let mut log = predictions::load(predictions_path)?;
    pb.inc(1);

    pb.set_message("extraction des caractéristiques");
    let recent = ledger.recent_first();
    let frame = extract(&recent, window);
    pb.inc(1);

    // Scoring avec les poids chargés : la configuration ajustée ci-dessous ne
    // sert qu'à la passe suivante.
    pb.set_message("scoring");
    let ranked = score_positions(&frame, &config);
    let top_sets = top_digits(&ranked, top);
    let combos = best_combinations(&ranked, spread, bets);
    pb.inc(1);

    pb.set_message("backtest et ajustement");
    let results = resolve(&log, &ledger);
    let rate = hit_rate(&results);
    let tune_report = tune(&ledger, &log, &config, window, top, &stamp_human);
    if matches!(tune_report.outcome, TuneOutcome::Adjusted { .. }) {
        weights::save(weights_path, &tune_report.config)?;
    }
    pb.inc(1);

    pb.set_message("écriture des rapports");
    let cutoff = ledger.last().context("historique vide")?.period;
    let target = cutoff + 1;
    log.upsert(PredictionRecord {
        target_period: target,
        generated_at: stamp_human.clone(),
        top_digits: top_sets,
        bets: combos.iter().map(|c| c.digits).collect(),
    });
    log.prune();
    predictions::save(predictions_path, &log)?;

    let ctx = AnalysisContext {
        generated_at: &stamp_human,
        cutoff_period: cutoff,
        target_period: target,
        requested_window: window,
        short_window: frame.short_window,
        full_window: frame.full_window,
        ranked: &ranked,
        top_n: top,
        combinations: &combos,
        weights: &config,
        resolved: results.len(),
        hit_rate: rate,
        outcome: &tune_report.outcome,
    };
    let content = render_analysis(&ctx);
    let (dated, latest) = write_analysis(reports_dir, &stamp_file, &content)?;

    if let Some(last_result) = results.last() {
        let entry = render_calculation_entry(&stamp_human, last_result);
        append_calculation(&reports_dir.join(LATEST_CALCULATION), &entry)?;
    }
    pb.inc(1);
    pb.finish_with_message("passe terminée");

    println!();
    display::display_scores(&ranked, top);
    display::display_combinations(&combos);
    display::display_backtest(&results, rate);
    println!("\nAjustement : {}", tune_report.outcome);
    println!("Rapport écrit : {}", dated.display());
    println!("Alias à jour  : {}", latest.display());

    Ok(())
}

fn cmd_stats(ledger_path: &PathBuf, window: usize) -> Result<()> {
    let ledger = load_with_warnings(ledger_path)?;
    let recent = ledger.recent_first();
    let effective = window.min(recent.len());
    let stats = position_stats(&recent, effective);
    display::display_stats(&stats, effective);
    Ok(())
}

fn cmd_predict(
    ledger_path: &PathBuf,
    weights_path: &PathBuf,
    window: usize,
    top: usize,
    bets: usize,
    spread: usize,
) -> Result<()> {
    let ledger = load_with_warnings(ledger_path)?;
    let config = weights::load(weights_path)?;

    let recent = ledger.recent_first();
    let frame = extract(&recent, window);
    let ranked = score_positions(&frame, &config);
    let combos = best_combinations(&ranked, spread, bets);

    display::display_scores(&ranked, top);
    display::display_combinations(&combos);
    Ok(())
}

fn cmd_backtest(ledger_path: &PathBuf, predictions_path: &PathBuf) -> Result<()> {
    let ledger = load_with_warnings(ledger_path)?;
    let log = predictions::load(predictions_path)?;
    let results = resolve(&log, &ledger);
    display::display_backtest(&results, hit_rate(&results));
    Ok(())
}

fn cmd_weights(weights_path: &PathBuf) -> Result<()> {
    let config = weights::load(weights_path)?;
    display::display_weights(&config);
    Ok(())
}

fn cmd_history(ledger_path: &PathBuf, last: usize) -> Result<()> {
    let ledger = load_with_warnings(ledger_path)?;
    let recent: Vec<_> = ledger.recent_first().into_iter().take(last).collect();
    display::display_draws(&recent);
    Ok(())
}
