use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};

use pl5_db::models::{DigitStats, DrawRecord, POSITIONS};
use pl5_engine::backtest::BacktestResult;
use pl5_engine::scoring::{Combination, ScoredCandidate};
use pl5_engine::weights::WeightConfig;

pub fn display_draws(draws: &[DrawRecord]) {
    if draws.is_empty() {
        println!("Aucun tirage à afficher.");
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Période", "Date", "Numéro"]);

    for draw in draws {
        let digits = draw
            .digits
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        table.add_row(vec![&draw.period.to_string(), &draw.date, &digits]);
    }

    println!("{table}");
}

pub fn display_stats(stats: &[Vec<DigitStats>], window: usize) {
    println!("\n📊 Statistiques sur les {} derniers tirages\n", window);

    for (pos, per_digit) in stats.iter().enumerate() {
        println!("── Position {} ──", pos + 1);
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["Chiffre", "Fréquence", "Retard"]);

        let mut sorted = per_digit.to_vec();
        sorted.sort_by(|a, b| b.frequency.cmp(&a.frequency).then(a.digit.cmp(&b.digit)));

        for stat in &sorted {
            table.add_row(vec![
                &stat.digit.to_string(),
                &stat.frequency.to_string(),
                &stat.gap.to_string(),
            ]);
        }
        println!("{table}");
    }
}

pub fn display_scores(ranked: &[Vec<ScoredCandidate>], top_n: usize) {
    println!("\n🎯 Classement pondéré par position (top {})\n", top_n);

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Position", "Candidats (score)"]);

    for (pos, candidates) in ranked.iter().enumerate() {
        let line = candidates
            .iter()
            .take(top_n)
            .map(|c| format!("{} ({:.4})", c.digit, c.score))
            .collect::<Vec<_>>()
            .join("  ");
        table.add_row(vec![&format!("{}", pos + 1), &line]);
    }

    println!("{table}");
}

pub fn display_combinations(combinations: &[Combination]) {
    println!("\n🎲 Mises simples recommandées\n");

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["#", "Numéro", "Score"]);

    for (i, combo) in combinations.iter().enumerate() {
        let digits = combo
            .digits
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        table.add_row(vec![
            &format!("{}", i + 1),
            &digits,
            &format!("{:.4}", combo.score),
        ]);
    }

    println!("{table}");
}

pub fn display_backtest(results: &[BacktestResult], rate: f64) {
    if results.is_empty() {
        println!("\nAucune prédiction résolue pour le moment.");
        return;
    }

    println!("\n🔁 Backtest des prédictions résolues\n");

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Période", "Numéro gagnant", "Positions", "Trouvées", "Gain"]);

    for result in results {
        let revealed = result
            .revealed
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        let marks = result
            .position_hits
            .iter()
            .map(|&h| if h { "O" } else { "X" })
            .collect::<Vec<_>>()
            .join(" ");
        table.add_row(vec![
            &result.target_period.to_string(),
            &revealed,
            &marks,
            &format!("{}/{}", result.hit_count, POSITIONS),
            &format!("{} yuans", result.gain),
        ]);
    }

    println!("{table}");
    println!("Taux de réussite par position : {:.4}", rate);
}

pub fn display_weights(config: &WeightConfig) {
    println!("\n⚖️  Poids du modèle\n");

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Caractéristique", "Poids"]);

    for (key, weight) in &config.weights {
        table.add_row(vec![key, &format!("{:.4}", weight)]);
    }

    println!("{table}");
    println!(
        "Itérations : {} | Dernier taux : {:.4} | Mis à jour : {}",
        config.iterations,
        config.hit_rate,
        if config.updated_at.is_empty() {
            "jamais"
        } else {
            &config.updated_at
        }
    );
}
