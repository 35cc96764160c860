use crate::enrich::Direction;
use crate::schema::{OutputViews, Schema1Row, Schema2Row};
use crate::storage_utils::{DisplayMode, OutputConfig};
use anyhow::Result;
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ContentArrangement, Table,
    modifiers::UTF8_ROUND_CORNERS, presets::UTF8_BORDERS_ONLY,
};

fn header(titles: &[&str]) -> Vec<Cell> {
    titles
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let cell = Cell::new(t).add_attribute(Attribute::Bold);
            // first column is the date, the rest line up as numbers
            if i == 0 { cell } else { cell.set_alignment(CellAlignment::Right) }
        })
        .collect()
}

fn new_table(titles: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_BORDERS_ONLY)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header(titles));
    table
}

fn direction_cell(direction: Option<Direction>) -> Cell {
    let (text, color) = match direction {
        Some(Direction::Up) => ("Up", Color::Green),
        Some(Direction::Down) => ("Down", Color::Red),
        Some(Direction::Same) => ("Same", Color::Grey),
        None => ("-", Color::DarkGrey),
    };
    Cell::new(text).fg(color).set_alignment(CellAlignment::Right)
}

fn number_cell(value: Option<f64>) -> Cell {
    let text = value.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "-".to_string());
    Cell::new(text).set_alignment(CellAlignment::Right)
}

fn flag_cell(flag: &str) -> Cell {
    let cell = Cell::new(if flag.is_empty() { "-" } else { flag }).set_alignment(CellAlignment::Right);
    if flag == "true" { cell.fg(Color::Cyan) } else { cell.fg(Color::DarkGrey) }
}

pub fn schema1_table(rows: &[Schema1Row], limit: usize) -> Table {
    let mut table = new_table(&["Date", "Price", "Direction", "Change", "Day", "High", "Low"]);
    for r in rows.iter().take(limit) {
        table.add_row(vec![
            Cell::new(&r.date).fg(Color::DarkGrey),
            number_cell(Some(r.price)),
            direction_cell(r.direction),
            number_cell(r.change),
            Cell::new(&r.day_of_week).set_alignment(CellAlignment::Right),
            flag_cell(&r.high_since_start),
            flag_cell(&r.low_since_start),
        ]);
    }
    table
}

pub fn schema2_table(rows: &[Schema2Row], limit: usize) -> Table {
    let mut table = new_table(&["Date", "Price", "Daily Avg", "Daily Var", "Volatility"]);
    for r in rows.iter().take(limit) {
        let alert = if r.volatility_alert == "true" {
            Cell::new("ALERT").fg(Color::Red).add_attribute(Attribute::Bold)
        } else {
            Cell::new("-").fg(Color::DarkGrey)
        };
        table.add_row(vec![
            Cell::new(&r.date).fg(Color::DarkGrey),
            number_cell(Some(r.price)),
            number_cell(Some(r.daily_average)),
            number_cell(r.daily_variance),
            alert.set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

/// Prints both views to stdout, as tables or as the raw JSON records.
pub fn run(views: &OutputViews, config: &OutputConfig) -> Result<()> {
    if views.schema1.is_empty() {
        println!("No data found.");
        return Ok(());
    }

    match config.display {
        DisplayMode::Json => {
            println!("{}", serde_json::to_string(&views.schema1)?);
            println!("{}", serde_json::to_string(&views.schema2)?);
        }
        DisplayMode::Table => {
            let shown = views.schema1.len().min(config.table_rows);
            let title = format!("(Showing {} of {} days)", shown, views.schema1.len());
            println!("\n{}\n{}", title, schema1_table(&views.schema1, config.table_rows));
            println!("\n{}", schema2_table(&views.schema2, config.table_rows));
        }
    }

    Ok(())
}
