use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::config::PlotLayout;
use crate::picking::mapping::{DelayUnit, TimeUnit};
use crate::picking::pick::PickIndexMode;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – data options, file list, picks
// ---------------------------------------------------------------------------

/// Render the left panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    data_options(ui, state);
    ui.separator();
    file_list(ui, state);
    ui.separator();
    pick_table(ui, state);
}

fn data_options(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Data");

    ui.horizontal(|ui: &mut Ui| {
        let dir = state
            .survey
            .as_ref()
            .map(|s| s.dir.display().to_string())
            .unwrap_or_else(|| "No directory".into());
        ui.label(dir);
        if ui.button("Import…").clicked() {
            import_directory_dialog(state);
        }
    });

    let mut display_changed = false;
    let display = &mut state.config.display;

    egui::Grid::new("data_options")
        .num_columns(2)
        .show(ui, |ui: &mut Ui| {
            display_changed |= ui.checkbox(&mut display.normalize, "Normalize").changed();
            display_changed |= ui
                .add(
                    egui::DragValue::new(&mut display.perc)
                        .prefix("perc ")
                        .range(0.01..=1.0)
                        .speed(0.01),
                )
                .changed();
            ui.end_row();

            display_changed |= ui.checkbox(&mut display.demean, "Remove mean").changed();
            display_changed |= ui.checkbox(&mut display.fill, "Fill").changed();
            ui.end_row();

            let mut enforce = state.config.sampling_rate_override.is_some();
            if ui.checkbox(&mut enforce, "Sampling rate (Hz)").changed() {
                state.config.sampling_rate_override = enforce.then(|| {
                    state
                        .session
                        .gather()
                        .map_or(1000.0, |g| g.sampling_rate)
                });
            }
            match state.config.sampling_rate_override.as_mut() {
                Some(rate) => {
                    ui.add(egui::DragValue::new(rate).range(1.0..=1.0e7));
                }
                None => {
                    let rate = state.session.gather().map_or(0.0, |g| g.sampling_rate);
                    ui.label(format!("{rate}"));
                }
            }
            ui.end_row();

            let delay = &mut state.config.delay;
            ui.checkbox(&mut delay.enabled, "Delay");
            ui.horizontal(|ui: &mut Ui| {
                ui.add(egui::DragValue::new(&mut delay.value).speed(0.1));
                egui::ComboBox::from_id_salt("delay_unit")
                    .selected_text(delay.unit.to_string())
                    .show_ui(ui, |ui: &mut Ui| {
                        for unit in DelayUnit::ALL {
                            ui.selectable_value(&mut delay.unit, unit, unit.to_string());
                        }
                    });
            });
            ui.end_row();
        });

    if display_changed {
        state.apply_display();
    }

    ui.horizontal(|ui: &mut Ui| {
        if ui.button("Apply").clicked() {
            state.reload();
        }
        if ui.button("Save settings").clicked() {
            state.save_config();
        }
    });
}

fn file_list(ui: &mut Ui, state: &mut AppState) {
    let Some(survey) = &state.survey else {
        ui.heading("Files");
        ui.label("No directory imported.");
        return;
    };
    ui.heading(format!("Files ({})", survey.len()));

    let mut chosen = None;
    ScrollArea::vertical()
        .id_salt("files")
        .max_height(200.0)
        .auto_shrink([false, true])
        .show(ui, |ui: &mut Ui| {
            for (i, name) in survey.files.iter().enumerate() {
                if ui
                    .selectable_label(survey.current == Some(i), name)
                    .clicked()
                {
                    chosen = Some(i);
                }
            }
        });

    if let Some(i) = chosen {
        state.open_file(i);
    }
}

fn pick_table(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui: &mut Ui| {
        ui.heading("Picks");
        if ui.small_button("Clear").clicked() {
            state.clear_picks();
        }
    });

    let reports = state.session.reports();
    if reports.is_empty() {
        ui.label("Left click: pick · Middle click: remove · Right click: print");
        return;
    }

    TableBuilder::new(ui)
        .striped(true)
        .column(Column::auto().at_least(60.0))
        .column(Column::auto().at_least(60.0))
        .column(Column::remainder())
        .header(20.0, |mut header| {
            header.col(|ui| {
                ui.strong("Receiver");
            });
            header.col(|ui| {
                ui.strong("Index");
            });
            header.col(|ui| {
                ui.strong("Time (s)");
            });
        })
        .body(|mut body| {
            for report in &reports {
                body.row(18.0, |mut row| {
                    row.col(|ui| {
                        ui.label(report.receiver.to_string());
                    });
                    row.col(|ui| {
                        ui.label(report.index.to_string());
                    });
                    row.col(|ui| {
                        ui.label(format!("{:.4}", report.time));
                    });
                });
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Import directory…").clicked() {
                import_directory_dialog(state);
                ui.close_menu();
            }
            if ui.button("Import all picks…").clicked() {
                import_picks_dialog(state);
                ui.close_menu();
            }
            ui.separator();
            if ui.button("Export current picks…").clicked() {
                export_current_dialog(state);
                ui.close_menu();
            }
            if ui.button("Export all picks…").clicked() {
                export_all_dialog(state);
                ui.close_menu();
            }
            if ui.button("Save screenshot…").clicked() {
                state.screenshot_requested = true;
                ui.close_menu();
            }
            ui.separator();
            if ui.button("Exit").clicked() {
                ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
            }
        });

        ui.menu_button("View", |ui: &mut Ui| {
            ui.radio_value(&mut state.config.layout, PlotLayout::Gather, "Gather");
            ui.radio_value(&mut state.config.layout, PlotLayout::Traces, "Traces");
            ui.separator();
            if ui.checkbox(&mut state.config.display.fill, "Fill").changed() {
                state.apply_display();
            }
            ui.separator();
            ui.label("Time axis");
            ui.radio_value(&mut state.config.time_unit, TimeUnit::Seconds, "Seconds");
            ui.radio_value(&mut state.config.time_unit, TimeUnit::Samples, "Samples");
            ui.separator();
            ui.label("Pick index");
            for mode in [PickIndexMode::Nearest, PickIndexMode::Interpolated] {
                if ui
                    .radio(state.config.pick_index_mode == mode, mode.to_string())
                    .clicked()
                {
                    state.set_index_mode(mode);
                }
            }
            ui.checkbox(&mut state.config.snap_to_sample, "Snap picks to samples");
        });

        ui.menu_button("Help", |ui: &mut Ui| {
            if ui.button("About").clicked() {
                state.show_about = true;
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(gather) = state.session.gather() {
            let file = state.survey.as_ref().and_then(|s| s.current_file());
            ui.label(format!(
                "{}: {} receivers × {} samples @ {} Hz, {} picks",
                file.unwrap_or(gather.label.as_str()),
                gather.receiver_count(),
                gather.sample_count(),
                gather.sampling_rate,
                state.session.picks().len()
            ));
        }

        if let Some(report) = &state.last_report {
            ui.separator();
            ui.monospace(report);
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

/// The About window.
pub fn about_window(ctx: &egui::Context, state: &mut AppState) {
    egui::Window::new("About")
        .open(&mut state.show_about)
        .resizable(false)
        .collapsible(false)
        .show(ctx, |ui: &mut Ui| {
            ui.strong(format!("Rusty Picker {}", env!("CARGO_PKG_VERSION")));
            ui.label("A picker for first break arrival times.");
        });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn import_directory_dialog(state: &mut AppState) {
    let dir = rfd::FileDialog::new()
        .set_title("Open data directory")
        .pick_folder();

    if let Some(dir) = dir {
        state.open_directory(&dir);
    }
}

fn import_picks_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Import all picks")
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        state.import_all_picks(&path);
    }
}

fn export_current_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export current picks")
        .add_filter("CSV", &["csv"])
        .set_file_name("picks.csv")
        .save_file();

    if let Some(path) = file {
        state.export_current_picks(&path);
    }
}

fn export_all_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export all picks")
        .add_filter("JSON", &["json"])
        .set_file_name("picks.json")
        .save_file();

    if let Some(path) = file {
        state.export_all_picks(&path);
    }
}
