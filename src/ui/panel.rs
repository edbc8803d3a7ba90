use super::{table_view, theme};
use crate::staging::{ResourceStatus, ResourceView};
use egui::RichText;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanelAction {
    /// Re-fetch, bypassing the backend cache.
    Refresh,
    /// Retry after a failed first load.
    Retry,
}

/// Paints one resource card and returns the button the user clicked, if any.
pub fn show_resource_panel(ui: &mut egui::Ui, title: &str, view: &ResourceView) -> Option<PanelAction> {
    let mut action = None;

    theme::card_frame(ui).show(ui, |ui| {
        ui.set_width(ui.available_width());
        ui.horizontal(|ui| {
            ui.heading(title);
            if view.is_refreshing {
                ui.spinner();
                ui.label(RichText::new("Refreshing...").weak().small());
            }
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let enabled = !view.status.is_in_flight() && view.status != ResourceStatus::Idle;
                if ui
                    .add_enabled(enabled, egui::Button::new("Refresh"))
                    .clicked()
                {
                    action = Some(PanelAction::Refresh);
                }
            });
        });
        ui.add_space(theme::SPACING_SMALL);

        match view.status {
            ResourceStatus::Idle => {
                ui.label(RichText::new("Not loaded yet.").weak());
            }
            ResourceStatus::Loading => {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Loading...");
                });
            }
            ResourceStatus::Error => {
                let message = view.error.as_deref().unwrap_or("Unknown error");
                ui.colored_label(theme::ALERT_COLOR, message);
                if ui.button("Retry").clicked() {
                    action = Some(PanelAction::Retry);
                }
            }
            ResourceStatus::Ready | ResourceStatus::Refreshing => {
                if view.is_stale_warning()
                    && let Some(error) = &view.error
                {
                    ui.colored_label(
                        theme::WARNING_COLOR,
                        format!("Showing cached data. Refresh failed: {error}"),
                    );
                    ui.add_space(4.0);
                }
                if let Some(summary) = &view.summary {
                    ui.label(RichText::new(summary).italics());
                    ui.add_space(4.0);
                }
                match &view.table {
                    Some(table) => table_view::show_table(ui, view.key.to_string(), table),
                    None => {
                        ui.label(RichText::new("No data available.").weak());
                    }
                }
                if let Some(cached_at) = view.cached_at {
                    ui.label(
                        RichText::new(format!(
                            "Cached {}",
                            cached_at.format("%Y-%m-%d %H:%M UTC")
                        ))
                        .weak()
                        .small(),
                    );
                }
            }
        }
    });

    action
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::staging::{FetchTicket, FetchedPayload, ResourceKey, ResourceKind, StagingController};
    use chrono::{Duration, Utc};
    use serde_json::json;

    fn paint(view: &ResourceView) -> Option<PanelAction> {
        let ctx = egui::Context::default();
        let mut action = None;
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                action = show_resource_panel(ui, "Large Losses", view);
            });
        });
        action
    }

    #[test]
    fn test_panel_paints_every_status() {
        let key = ResourceKey::new(ResourceKind::LargeLosses, "C-1");
        let now = Utc::now();
        let mut ctl = StagingController::new();

        assert_eq!(paint(&ctl.view(&key)), None);

        ctl.request(&key, false, now);
        assert_eq!(paint(&ctl.view(&key)), None);

        let ticket = FetchTicket {
            key: key.clone(),
            generation: 1,
        };
        ctl.on_success(
            &ticket,
            FetchedPayload::new(
                vec![json!({"paid_amount": 400000})],
                now,
                now + Duration::hours(1),
            ),
        );
        assert_eq!(paint(&ctl.view(&key)), None);

        ctl.request(&key, true, now);
        let refresh = FetchTicket {
            key: key.clone(),
            generation: 2,
        };
        ctl.on_failure(&refresh, "timed out");
        let view = ctl.view(&key);
        assert!(view.is_stale_warning());
        assert_eq!(paint(&view), None);
    }
}
