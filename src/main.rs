mod app;
mod config;
mod data;
mod error;
mod picking;
mod state;
mod survey;
mod ui;

use std::path::PathBuf;

use app::RustyPickerApp;
use config::ViewerConfig;
use eframe::egui;
use state::AppState;

fn main() -> eframe::Result {
    env_logger::init();

    let config = ViewerConfig::load_or_default(&ViewerConfig::path());
    let start_dir = std::env::args_os().nth(1).map(PathBuf::from);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(config.window_size)
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Rusty Picker – First Break Picker",
        options,
        Box::new(move |_cc| {
            let mut state = AppState::new(config);
            if let Some(dir) = start_dir {
                state.open_directory(&dir);
            }
            Ok(Box::new(RustyPickerApp::new(state)))
        }),
    )
}
