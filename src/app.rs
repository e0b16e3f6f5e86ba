use std::path::Path;

use anyhow::{Context, Result};
use eframe::egui;

use crate::state::AppState;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct RustyPickerApp {
    pub state: AppState,
}

impl RustyPickerApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for RustyPickerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Keyboard: browse the file list ----
        if !ctx.wants_keyboard_input() {
            let (down, up) = ctx.input(|i| {
                (
                    i.key_pressed(egui::Key::ArrowDown),
                    i.key_pressed(egui::Key::ArrowUp),
                )
            });
            if down {
                self.state.next_file();
            } else if up {
                self.state.previous_file();
            }
        }

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: data options, files, picks ----
        egui::SidePanel::left("data_panel")
            .default_width(300.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: gather plot ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::gather_plot(ui, &mut self.state);
        });

        panels::about_window(ctx, &mut self.state);

        self.handle_screenshot(ctx);
    }
}

impl RustyPickerApp {
    /// Request a viewport grab when asked, and save it once it arrives.
    fn handle_screenshot(&mut self, ctx: &egui::Context) {
        if self.state.screenshot_requested {
            self.state.screenshot_requested = false;
            ctx.send_viewport_cmd(egui::ViewportCommand::Screenshot(Default::default()));
        }

        let shot = ctx.input(|i| {
            i.events.iter().rev().find_map(|e| match e {
                egui::Event::Screenshot { image, .. } => Some(image.clone()),
                _ => None,
            })
        });
        let Some(image) = shot else {
            return;
        };

        let path = rfd::FileDialog::new()
            .set_title("Save screenshot")
            .add_filter("PNG", &["png"])
            .set_file_name("gather.png")
            .save_file();
        if let Some(path) = path {
            match save_png(&image, &path) {
                Ok(()) => log::info!("Saved screenshot to {}", path.display()),
                Err(e) => {
                    log::error!("Screenshot failed: {e:#}");
                    self.state.status_message = Some(format!("Error: {e:#}"));
                }
            }
        }
    }
}

/// Write an egui image as PNG.
pub fn save_png(image: &egui::ColorImage, path: &Path) -> Result<()> {
    let [w, h] = image.size;
    let bytes: Vec<u8> = image
        .pixels
        .iter()
        .flat_map(|p| p.to_srgba_unmultiplied())
        .collect();
    let buffer = image::RgbaImage::from_raw(w as u32, h as u32, bytes)
        .context("screenshot buffer has the wrong size")?;
    buffer
        .save(path)
        .with_context(|| format!("writing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shot.png");
        let image = egui::ColorImage::new([4, 3], egui::Color32::RED);
        save_png(&image, &path).unwrap();

        let back = image::open(&path).unwrap().to_rgba8();
        assert_eq!(back.dimensions(), (4, 3));
        assert_eq!(back.get_pixel(0, 0).0, [255, 0, 0, 255]);
    }
}
