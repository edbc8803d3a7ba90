use super::theme;
use crate::insight::{Alignment, TableModel};
use egui::{Align, Layout, RichText};

/// Paints `table` as a striped grid. Flagged rows get a red tint.
pub fn show_table(ui: &mut egui::Ui, id_salt: impl std::hash::Hash, table: &TableModel) {
    // Grid row 0 is the header.
    let flagged: Vec<bool> = std::iter::once(false)
        .chain((0..table.visible_row_count()).map(|r| table.row_flagged(r)))
        .collect();

    egui::ScrollArea::horizontal()
        .id_salt(("table_scroll", &id_salt))
        .show(ui, |ui| {
            egui::Grid::new(("insight_table", &id_salt))
                .striped(true)
                .num_columns(table.columns.len())
                .spacing([theme::SPACING_MEDIUM, 4.0])
                .with_row_color(move |row, _style| {
                    flagged
                        .get(row)
                        .copied()
                        .unwrap_or(false)
                        .then_some(theme::FLAGGED_ROW_TINT)
                })
                .show(ui, |ui| {
                    for column in &table.columns {
                        aligned(ui, column.alignment, RichText::new(&column.label).strong());
                    }
                    ui.end_row();

                    for row in 0..table.visible_row_count() {
                        for (cell, column) in table.render_row(row).iter().zip(&table.columns) {
                            aligned(ui, column.alignment, theme::cell_text(cell));
                        }
                        ui.end_row();
                    }
                });
        });

    if table.truncated {
        ui.add_space(4.0);
        ui.label(
            RichText::new(format!(
                "Showing {} of {} rows",
                table.visible_row_count(),
                table.total_row_count
            ))
            .weak()
            .small(),
        );
    }
}

fn aligned(ui: &mut egui::Ui, alignment: Alignment, text: RichText) {
    match alignment {
        Alignment::Left => {
            ui.label(text);
        }
        Alignment::Right => {
            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                ui.label(text);
            });
        }
    }
}
