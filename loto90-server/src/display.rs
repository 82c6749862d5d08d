//! Rendu terminal des commandes CLI.

use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};

use loto90_db::models::Draw;
use loto90_engine::brain::Brain;
use loto90_engine::predict::Prediction;

pub fn display_prediction(prediction: &Prediction) {
    println!("── Prédiction ({} tirages analysés) ──", prediction.context.draws_analyzed);
    if prediction.main.numbers.is_empty() {
        println!("Historique vide : aucune sélection possible.");
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Volet", "Numéros", "Somme", "Confiance"]);

    table.add_row(vec![
        "Gagnants".to_string(),
        join_numbers(&prediction.main.numbers),
        prediction.main.sum.to_string(),
        format!("{:.0} %", prediction.main.confidence),
    ]);
    if let Some(machine) = &prediction.machine {
        table.add_row(vec![
            "Machine".to_string(),
            join_numbers(&machine.numbers),
            machine.sum.to_string(),
            format!("{:.0} %", machine.confidence),
        ]);
    }
    if let Some(hybrid) = &prediction.hybrid {
        table.add_row(vec![
            format!("Hybride ({})", hybrid.method),
            join_numbers(&hybrid.numbers),
            hybrid.sum.to_string(),
            format!("{:.0} %", hybrid.confidence),
        ]);
    }
    println!("{table}");

    if !prediction.alternatives.is_empty() {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_header(vec!["Alternative", "Numéros"]);
        for alt in &prediction.alternatives {
            table.add_row(vec![alt.label.clone(), join_numbers(&alt.numbers)]);
        }
        println!("{table}");
    }

    for alert in &prediction.alerts {
        println!("⚠ {} : {}", alert.kind, alert.message);
    }
}

pub fn display_brain(brain: &Brain, stream: &str) {
    println!("── Cerveau « {stream} » (v{}) ──", brain.version);
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Stratégie", "Poids"]);
    for (key, weight) in brain.weights.to_map() {
        table.add_row(vec![key, format!("{weight:.3}")]);
    }
    println!("{table}");
    println!(
        "Tirages appris : {} | Numéros exacts : {} | Précision : {:.1} %",
        brain.stats.global.total_draws,
        brain.stats.global.total_hits,
        brain.stats.global.global_accuracy * 100.0
    );
    if let Some(tuned) = brain.last_tuned {
        println!("Dernier ajustement : {tuned}");
    }
}

pub fn display_history(draws: &[Draw]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Date", "Type", "Gagnants", "Machine"]);

    for draw in draws {
        let mut winning = draw.winning;
        winning.sort_unstable();
        let machine = draw
            .machine
            .map(|mut m| {
                m.sort_unstable();
                join_numbers(&m)
            })
            .unwrap_or_else(|| "—".to_string());
        table.add_row(vec![
            draw.date.format("%Y-%m-%d").to_string(),
            draw.draw_type_id.to_string(),
            join_numbers(&winning),
            machine,
        ]);
    }
    println!("{table}");
}

fn join_numbers(numbers: &[u8]) -> String {
    numbers
        .iter()
        .map(|n| format!("{n:2}"))
        .collect::<Vec<_>>()
        .join(" - ")
}
