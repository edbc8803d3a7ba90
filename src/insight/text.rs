use super::format::Highlight;
use super::table::{Alignment, TableModel};
use std::fmt::Write as _;

/// Plain-text rendering for terminals.
///
/// Alert cells carry a trailing `▲`, favorable cells a `▼`, and flagged rows
/// start with `!`.
pub fn render_text(table: &TableModel) -> String {
    let header: Vec<String> = table.columns.iter().map(|c| c.label.clone()).collect();
    let body: Vec<(bool, Vec<String>)> = (0..table.visible_row_count())
        .map(|r| {
            let cells = table
                .render_row(r)
                .into_iter()
                .map(|cell| match cell.highlight {
                    Highlight::None => cell.text,
                    Highlight::Alert => format!("{} ▲", cell.text),
                    Highlight::Favorable => format!("{} ▼", cell.text),
                })
                .collect();
            (table.row_flagged(r), cells)
        })
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for (_, cells) in &body {
        for (w, cell) in widths.iter_mut().zip(cells) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, table, &widths, ' ', &header);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_line(&mut out, table, &widths, ' ', &rule);
    for (flagged, cells) in &body {
        push_line(&mut out, table, &widths, if *flagged { '!' } else { ' ' }, cells);
    }

    if table.truncated {
        let _ = writeln!(
            out,
            "Showing {} of {} rows",
            table.visible_row_count(),
            table.total_row_count
        );
    }
    out
}

fn push_line(out: &mut String, table: &TableModel, widths: &[usize], marker: char, cells: &[String]) {
    out.push(marker);
    for ((cell, width), column) in cells.iter().zip(widths).zip(&table.columns) {
        out.push(' ');
        let pad = width.saturating_sub(cell.chars().count());
        match column.alignment {
            Alignment::Left => {
                out.push_str(cell);
                out.push_str(&" ".repeat(pad));
            }
            Alignment::Right => {
                out.push_str(&" ".repeat(pad));
                out.push_str(cell);
            }
        }
        out.push_str(" |");
    }
    out.push('\n');
}
