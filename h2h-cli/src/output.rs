/// Output formatting: terminal matrix and JSON.
use std::collections::BTreeMap;

use h2h_core::{win_rate, MatchupBoard, MatchupRecord};
use serde::Serialize;

use crate::bail;

#[derive(Serialize)]
struct JsonPlayer {
    rank: usize,
    name: String,
    score: f64,
    avatar: Option<String>,
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    category: &'a str,
    goal: &'a str,
    races_loaded: usize,
    progress: f64,
    players: Vec<JsonPlayer>,
    matchups: BTreeMap<&'a str, BTreeMap<&'a str, MatchupRecord>>,
}

/// Text for one cell of the matrix, read as "row vs column".
///
/// `X` marks a player against themselves. Records without wins or losses show
/// as `0 - 0`; otherwise the record gets a `+`/`-` marker when the win rate is
/// above/below even.
pub fn format_cell(record: Option<&MatchupRecord>) -> String {
    let Some(rec) = record else { return "X".to_string() };
    if rec.wins == 0 && rec.losses == 0 {
        return "0 - 0".to_string();
    }
    let rate = win_rate(rec);
    let marker = if rate > 0.5 {
        "+"
    } else if rate < 0.5 {
        "-"
    } else {
        " "
    };
    format!("{} - {}{marker}", rec.wins, rec.losses)
}

/// One-line summary of what is loaded, e.g. "Skyward Sword - 12 recorded races loaded."
pub fn summary_line(display_name: &str, races: usize, progress: Option<f64>) -> String {
    let plural = if races == 1 { "" } else { "s" };
    match progress {
        Some(p) => format!("{display_name} - {races} recorded race{plural} loaded so far (~{p}%)..."),
        None => format!("{display_name} - {races} recorded race{plural} loaded."),
    }
}

/// Print the ranked head-to-head matrix. Columns are numbered by rank.
pub fn print_table(board: &MatchupBoard) {
    let scores = board.current_scores();
    let table = board.current_table();

    // Wide enough for the "Left vs Top" header.
    let name_width = scores.iter().map(|(name, _)| name.len()).max().unwrap_or(11).max(11);

    let cells: Vec<Vec<String>> = scores
        .iter()
        .map(|(row, _)| {
            scores
                .iter()
                .map(|(col, _)| format_cell(table.get(row).and_then(|r| r.get(col))))
                .collect()
        })
        .collect();
    let cell_width = cells
        .iter()
        .flatten()
        .map(String::len)
        .max()
        .unwrap_or(1)
        .max(scores.len().to_string().len());

    let mut header = format!(" # | {:<name_width$} |  Score |", "Left vs Top");
    for i in 1..=scores.len() {
        header.push_str(&format!(" {:>cell_width$} |", i));
    }
    println!("{header}");
    println!("{}", "-".repeat(header.len()));

    for (i, ((name, score), row)) in scores.iter().zip(&cells).enumerate() {
        let mut line = format!("{:>2} | {:<name_width$} | {:>6.2} |", i + 1, name, score);
        for cell in row {
            line.push_str(&format!(" {:>cell_width$} |", cell));
        }
        println!("{line}");
    }
}

/// Print races per goal, marking goals the category lists as official.
pub fn print_goals(counts: &[(String, usize)], official: &[String]) {
    let width = counts.iter().map(|(g, _)| g.len()).max().unwrap_or(4).max(4);
    println!("  {:<width$} | Races", "Goal");
    println!("--{}-|------", "-".repeat(width));
    for (goal, n) in counts {
        let mark = if official.contains(goal) { "*" } else { " " };
        println!("{mark} {:<width$} | {:>5}", goal, n);
    }
    println!("\n* = official goal");
}

/// Print ranking and full matchup table as JSON.
pub fn print_json(board: &MatchupBoard, category: &str) {
    let players = board
        .current_scores()
        .iter()
        .enumerate()
        .map(|(i, (name, score))| JsonPlayer {
            rank: i + 1,
            name: name.clone(),
            score: *score,
            avatar: board.player(name).and_then(|p| p.profile.avatar.clone()),
        })
        .collect();

    let matchups = board
        .current_table()
        .iter()
        .map(|(player, row)| {
            let row: BTreeMap<&str, MatchupRecord> =
                row.iter().map(|(opp, rec)| (opp.as_str(), *rec)).collect();
            (player.as_str(), row)
        })
        .collect();

    let output = JsonOutput {
        category,
        goal: board.active_goal(),
        races_loaded: board.race_count(),
        progress: board.load_progress(),
        players,
        matchups,
    };

    let json = serde_json::to_string_pretty(&output)
        .unwrap_or_else(|e| bail(format!("Failed to serialize output: {e}")));
    println!("{json}");
}
