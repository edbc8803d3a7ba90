//! egui painting of tables and resource panels.

pub mod panel;
pub mod table_view;
pub mod theme;

pub use panel::{PanelAction, show_resource_panel};
pub use table_view::show_table;
