//! Table output formatting for CLI commands.

use comfy_table::{presets, Attribute, Cell, ContentArrangement, Table};

use crate::domain::models::{Backtest, Idea};

fn base_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn format_idea_table(ideas: &[Idea]) -> String {
    let mut table = base_table();
    table.set_header(vec![
        Cell::new("ID").add_attribute(Attribute::Bold),
        Cell::new("Description").add_attribute(Attribute::Bold),
        Cell::new("Tests").add_attribute(Attribute::Bold),
        Cell::new("Avg Score").add_attribute(Attribute::Bold),
        Cell::new("Total Score").add_attribute(Attribute::Bold),
    ]);

    for idea in ideas {
        let avg = idea
            .average_score()
            .map_or_else(|| "-".to_string(), |avg| format!("{avg:.4}"));
        table.add_row(vec![
            idea.id.clone(),
            truncate(&idea.description, 60),
            idea.test_count.to_string(),
            avg,
            format!("{:.4}", idea.total_score),
        ]);
    }

    table.to_string()
}

pub fn format_backtest_table(backtests: &[Backtest]) -> String {
    let mut table = base_table();
    table.set_header(vec![
        Cell::new("Backtest").add_attribute(Attribute::Bold),
        Cell::new("Sharpe").add_attribute(Attribute::Bold),
        Cell::new("CAGR").add_attribute(Attribute::Bold),
        Cell::new("Max DD").add_attribute(Attribute::Bold),
        Cell::new("Win Rate").add_attribute(Attribute::Bold),
        Cell::new("Trades").add_attribute(Attribute::Bold),
        Cell::new("Profit Factor").add_attribute(Attribute::Bold),
        Cell::new("Created").add_attribute(Attribute::Bold),
    ]);

    for backtest in backtests {
        let m = &backtest.metrics;
        table.add_row(vec![
            backtest.id.to_string(),
            format!("{:.3}", m.sharpe),
            format!("{:.3}", m.cagr),
            format!("{:.3}", m.max_drawdown),
            format!("{:.3}", m.win_rate),
            m.total_trades.to_string(),
            format!("{:.3}", m.profit_factor),
            backtest.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ]);
    }

    table.to_string()
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{head}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_keeps_short_strings() {
        assert_eq!(truncate("short", 60), "short");
    }

    #[test]
    fn test_truncate_shortens_long_strings() {
        let long = "x".repeat(100);
        let out = truncate(&long, 10);
        assert!(out.chars().count() <= 10);
        assert!(out.ends_with('…'));
    }
}
