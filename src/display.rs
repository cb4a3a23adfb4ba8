use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};

use crate::strategy::Strategy;

/// One row per player with action probabilities.
pub fn joint_strategy_table(joint: &[Strategy]) -> Table {
    let max_actions = joint.iter().map(Vec::len).max().unwrap_or(0);
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    let mut header = vec![Cell::new("Player")];
    header.extend((0..max_actions).map(|a| Cell::new(format!("a{a}"))));
    table.set_header(header);

    for (player, strat) in joint.iter().enumerate() {
        let mut row = vec![Cell::new(player + 1)];
        row.extend(strat.iter().map(|p| Cell::new(format!("{p:.4}"))));
        row.extend((strat.len()..max_actions).map(|_| Cell::new("")));
        table.add_row(row);
    }
    table
}

pub fn nash_label(is_nash: bool) -> String {
    if is_nash {
        "Nash equilibrium".green().bold().to_string()
    } else {
        "not verified".yellow().to_string()
    }
}

/// Print a run result.
pub fn print_outcome(title: &str, is_nash: bool, joint: &[Strategy], iterations: usize) {
    println!();
    println!(
        "  {}  |  {}  |  {} iterations",
        title.bold(),
        nash_label(is_nash),
        iterations
    );
    println!("{}", joint_strategy_table(joint));
}

/// Summary of repeated runs of one experiment.
pub fn summary_table(rows: &[(usize, bool, usize, String)]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Run", "Nash", "Iterations", "Final point"]);
    for (run, nash, iterations, point) in rows {
        table.add_row(vec![
            Cell::new(run + 1),
            Cell::new(if *nash { "yes" } else { "no" }),
            Cell::new(iterations),
            Cell::new(point),
        ]);
    }
    table
}
