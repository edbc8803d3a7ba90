use anyhow::Result;
use case_insights::api::BackendClient;
use case_insights::config::AppSettings;
use case_insights::staging::{ResourceKey, ResourceKind, StagingDriver};
use case_insights::ui::{self, PanelAction, theme};
use eframe::egui;
use std::sync::Arc;

pub struct CaseDashboardApp {
    driver: StagingDriver<BackendClient>,
    case_input: String,
    active_case: Option<String>,
    backend_url: String,
}

impl CaseDashboardApp {
    fn new(
        cc: &eframe::CreationContext<'_>,
        client: BackendClient,
        settings: &AppSettings,
        case: Option<String>,
    ) -> Self {
        theme::apply_dashboard_theme(&cc.egui_ctx);
        let driver = StagingDriver::with_limits(Arc::new(client), settings.policy_limits())
            .with_repaint_context(cc.egui_ctx.clone());

        let mut app = Self {
            driver,
            case_input: case.clone().unwrap_or_default(),
            active_case: None,
            backend_url: settings.backend_url.clone(),
        };
        if let Some(case) = case {
            app.open_case(case);
        }
        app
    }

    fn open_case(&mut self, case: String) {
        let case = case.trim().to_owned();
        if case.is_empty() {
            return;
        }
        log::info!("Opening case {case}");
        for kind in ResourceKind::ALL {
            self.driver.request(&ResourceKey::new(kind, case.as_str()), false);
        }
        self.active_case = Some(case);
    }

    fn render_top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("case_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("Case");
                let response = ui.text_edit_singleline(&mut self.case_input);
                let submitted =
                    response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                if ui.button("Load").clicked() || submitted {
                    self.open_case(self.case_input.clone());
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(egui::RichText::new(&self.backend_url).weak().small());
                });
            });
        });
    }

    fn render_panels(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(case) = self.active_case.clone() else {
                ui.centered_and_justified(|ui| {
                    ui.label(egui::RichText::new("Enter a case id to load its analytics.").weak());
                });
                return;
            };

            egui::ScrollArea::vertical().show(ui, |ui| {
                for kind in ResourceKind::ALL {
                    let key = ResourceKey::new(kind, case.as_str());
                    let view = self.driver.view(&key);
                    match ui::show_resource_panel(ui, kind.title(), &view) {
                        Some(PanelAction::Refresh) => {
                            self.driver.refresh(&key);
                        }
                        Some(PanelAction::Retry) => {
                            self.driver.request(&key, false);
                        }
                        None => {}
                    }
                    ui.add_space(theme::SPACING_MEDIUM);
                }
            });
        });
    }
}

impl eframe::App for CaseDashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.driver.poll();
        self.render_top_bar(ctx);
        self.render_panels(ctx);
    }
}

pub fn run(settings: AppSettings, case: Option<String>) -> Result<()> {
    let client = BackendClient::from_settings(&settings)?;
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 800.0])
            .with_title("Case Insights"),
        ..Default::default()
    };

    eframe::run_native(
        "case-insights",
        options,
        Box::new(move |cc| {
            Ok(Box::new(CaseDashboardApp::new(
                cc, client, &settings, case,
            )))
        }),
    )
    .map_err(|e| anyhow::anyhow!("Dashboard failed: {e}"))
}
