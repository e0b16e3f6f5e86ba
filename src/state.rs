use std::path::Path;

use anyhow::Result;

use crate::config::ViewerConfig;
use crate::data::loader::load_file;
use crate::picking::mapping::CoordinateMapper;
use crate::picking::pick::PickIndexMode;
use crate::picking::session::{ClickEvent, PickSession};
use crate::survey::{PickFile, Survey, export_picks_csv};
use crate::ui::plot::PlotScene;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Viewer settings edited from the side panel.
    pub config: ViewerConfig,

    /// Directory of gathers (None until the user imports one).
    pub survey: Option<Survey>,

    /// Gather on screen and its picks.
    pub session: PickSession<PlotScene>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Last line printed by a report click.
    pub last_report: Option<String>,

    /// Ask the app to grab the viewport on the next frame.
    pub screenshot_requested: bool,

    /// Whether the About window is open.
    pub show_about: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ViewerConfig::default())
    }
}

impl AppState {
    pub fn new(config: ViewerConfig) -> Self {
        let scene = PlotScene::new(config.display);
        let session = PickSession::new(scene, config.pick_index_mode);
        Self {
            config,
            survey: None,
            session,
            status_message: None,
            last_report: None,
            screenshot_requested: false,
            show_about: false,
        }
    }

    /// Coordinate mapper for the gather on screen.
    pub fn mapper(&self) -> Option<CoordinateMapper> {
        self.session.gather().map(|g| {
            CoordinateMapper::new(
                g,
                self.config.time_unit,
                &self.config.delay,
                self.config.snap_to_sample,
            )
        })
    }

    // -- Survey navigation --

    /// Scan a directory and open its first gather.
    pub fn open_directory(&mut self, dir: &Path) {
        match Survey::open(dir) {
            Ok(survey) => {
                self.session.take_picks();
                self.survey = Some(survey);
                self.status_message = None;
                self.open_file(0);
            }
            Err(e) => self.fail("Import failed", e),
        }
    }

    /// Load file `index` of the survey, keeping the picks of the file left.
    pub fn open_file(&mut self, index: usize) {
        if let Err(e) = self.try_open_file(index) {
            self.fail("Failed to load gather", e);
        }
    }

    fn try_open_file(&mut self, index: usize) -> Result<()> {
        let Some(survey) = &self.survey else {
            return Ok(());
        };
        let Some(path) = survey.path_of(index) else {
            return Ok(());
        };

        let gather = load_file(&path, self.config.sampling_rate_override)?;
        gather.validate()?;

        self.stash_picks();
        let Some(survey) = self.survey.as_mut() else {
            return Ok(());
        };
        let saved = survey.picks_of(index);
        survey.current = Some(index);
        self.session.take_picks();
        self.session.load_with_picks(gather, saved)?;
        self.status_message = None;
        Ok(())
    }

    pub fn next_file(&mut self) {
        if let Some(i) = self.survey.as_ref().and_then(Survey::next_index) {
            self.open_file(i);
        }
    }

    pub fn previous_file(&mut self) {
        if let Some(i) = self.survey.as_ref().and_then(Survey::previous_index) {
            self.open_file(i);
        }
    }

    /// Re-read the current file (e.g. after the sampling rate changed).
    pub fn reload(&mut self) {
        match self.survey.as_ref().and_then(|s| s.current) {
            Some(i) => self.open_file(i),
            None => self.status_message = Some("Error: no gather chosen yet.".into()),
        }
    }

    /// Copy the session's picks into the survey slot of the current file.
    fn stash_picks(&mut self) {
        if self.session.gather().is_none() {
            return;
        }
        if let Some(survey) = self.survey.as_mut() {
            if let Some(i) = survey.current {
                survey.store_picks(i, self.session.picks().clone());
            }
        }
    }

    // -- Display --

    /// Push the display options to the scene and redraw.
    pub fn apply_display(&mut self) {
        self.session.renderer_mut().set_display(self.config.display);
        self.session.redraw();
    }

    pub fn set_index_mode(&mut self, mode: PickIndexMode) {
        self.config.pick_index_mode = mode;
        self.session.set_index_mode(mode);
    }

    // -- Picking --

    /// Apply a click; report clicks print their line to stdout.
    pub fn handle_click(&mut self, event: ClickEvent) {
        if let Some(report) = self.session.dispatch(event) {
            println!("{report}");
            log::info!("Pick report {report}");
            self.last_report = Some(report.to_string());
        }
    }

    pub fn clear_picks(&mut self) {
        self.session.clear_picks();
    }

    // -- Export / import --

    pub fn export_current_picks(&mut self, path: &Path) {
        let Some(gather) = self.session.gather() else {
            self.status_message = Some("Error: no pick to export.".into());
            return;
        };
        if self.session.picks().is_empty() {
            self.status_message = Some("Error: no pick to export.".into());
            return;
        }
        let axis = gather.time_axis();
        let mode = self.session.index_mode();
        if let Err(e) = export_picks_csv(path, self.session.picks(), &axis, mode) {
            self.fail("Export failed", e);
        }
    }

    pub fn export_all_picks(&mut self, path: &Path) {
        self.stash_picks();
        let Some(survey) = self.survey.as_ref().filter(|s| s.has_picks()) else {
            self.status_message = Some("Error: no pick to export.".into());
            return;
        };
        match survey.to_pick_file().save(path) {
            Ok(()) => log::info!("Exported all picks to {}", path.display()),
            Err(e) => self.fail("Export failed", e),
        }
    }

    pub fn import_all_picks(&mut self, path: &Path) {
        if self.survey.is_none() {
            self.status_message = Some("Error: no data imported.".into());
            return;
        }
        let result = PickFile::load(path).and_then(|file| {
            let survey = self.survey.as_mut().ok_or_else(|| anyhow::anyhow!("no data imported"))?;
            survey.import(file)?;
            Ok(())
        });
        match result {
            Ok(()) => {
                log::info!("Imported picks from {}", path.display());
                if let Some(i) = self.survey.as_ref().and_then(|s| s.current) {
                    self.session.take_picks();
                    self.open_file(i);
                }
            }
            Err(e) => self.fail("Import failed", e),
        }
    }

    // -- Settings --

    pub fn save_config(&mut self) {
        if let Err(e) = self.config.save(&ViewerConfig::path()) {
            self.fail("Saving settings failed", e);
        }
    }

    fn fail(&mut self, what: &str, e: anyhow::Error) {
        log::error!("{what}: {e:#}");
        self.status_message = Some(format!("Error: {e:#}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::picking::session::ClickKind;
    use std::fs;

    fn write_shot(dir: &Path, name: &str, receivers: usize) {
        let rows: Vec<String> = (0..receivers)
            .map(|_| {
                let data: Vec<String> = (0..100).map(|k| (k as f64 * 0.1).sin().to_string()).collect();
                format!(r#"{{"data": [{}], "sampling_rate": 100.0}}"#, data.join(","))
            })
            .collect();
        fs::write(dir.join(name), format!("[{}]", rows.join(","))).unwrap();
    }

    fn click(kind: ClickKind, receiver: usize, time: f64) -> ClickEvent {
        ClickEvent {
            kind,
            receiver,
            time,
        }
    }

    #[test]
    fn opening_a_directory_loads_the_first_gather() {
        let dir = tempfile::tempdir().unwrap();
        write_shot(dir.path(), "a.json", 3);
        write_shot(dir.path(), "b.json", 4);

        let mut state = AppState::default();
        state.open_directory(dir.path());
        assert_eq!(state.status_message, None);
        assert_eq!(state.session.gather().unwrap().label, "a.json");
        assert!(state.mapper().is_some());
    }

    #[test]
    fn picks_survive_file_switching() {
        let dir = tempfile::tempdir().unwrap();
        write_shot(dir.path(), "a.json", 3);
        write_shot(dir.path(), "b.json", 4);

        let mut state = AppState::default();
        state.open_directory(dir.path());
        state.handle_click(click(ClickKind::Primary, 1, 0.42));
        state.next_file();
        assert_eq!(state.session.gather().unwrap().label, "b.json");
        assert!(state.session.picks().is_empty());

        state.previous_file();
        assert_eq!(state.session.picks().get(1), Some(0.42));
        state.handle_click(click(ClickKind::Tertiary, 1, 0.0));
        assert_eq!(state.last_report.as_deref(), Some("(1, 42, 0.42)"));
    }

    #[test]
    fn bad_file_keeps_current_gather() {
        let dir = tempfile::tempdir().unwrap();
        write_shot(dir.path(), "a.json", 3);
        fs::write(dir.path().join("b.json"), "[]").unwrap();

        let mut state = AppState::default();
        state.open_directory(dir.path());
        state.handle_click(click(ClickKind::Primary, 0, 0.1));
        state.next_file();
        assert!(state.status_message.as_deref().unwrap().contains("invalid input"));
        assert_eq!(state.session.gather().unwrap().label, "a.json");
        assert_eq!(state.session.picks().get(0), Some(0.1));
    }

    #[test]
    fn export_and_import_all_picks() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        fs::create_dir(&data).unwrap();
        write_shot(&data, "a.json", 3);
        let picks_path = dir.path().join("picks.json");

        let mut state = AppState::default();
        state.open_directory(&data);
        state.handle_click(click(ClickKind::Primary, 2, 0.3));
        state.export_all_picks(&picks_path);
        assert!(picks_path.exists());

        let mut fresh = AppState::default();
        fresh.open_directory(&data);
        fresh.import_all_picks(&picks_path);
        assert_eq!(fresh.status_message, None);
        assert_eq!(fresh.session.picks().get(2), Some(0.3));
    }

    #[test]
    fn non_finite_gather_is_refused_with_clipping_on() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("shot.csv"),
            "sampling_rate,data\n100,1.0;2.0;NaN;3.0\n100,0.5;0.1;0.2;0.3\n",
        )
        .unwrap();

        let mut config = ViewerConfig::default();
        config.display.normalize = true;
        config.display.perc = 0.9;
        let mut state = AppState::new(config);
        state.open_directory(dir.path());
        assert!(state.status_message.as_deref().unwrap().contains("not finite"));
        assert!(state.session.gather().is_none());
    }

    #[test]
    fn importing_picks_while_no_gather_is_shown_keeps_status_clean() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        fs::create_dir(&data).unwrap();
        fs::write(data.join("a.json"), "[]").unwrap();
        let picks_path = dir.path().join("picks.json");
        PickFile {
            files: vec!["a.json".into()],
            picks: vec![Some([(0, 0.1)].into_iter().collect())],
        }
        .save(&picks_path)
        .unwrap();

        let mut state = AppState::default();
        state.open_directory(&data);
        assert!(state.status_message.is_some());
        state.status_message = None;

        state.import_all_picks(&picks_path);
        assert_eq!(state.status_message, None);
        assert_eq!(state.survey.as_ref().unwrap().picks_of(0).get(0), Some(0.1));
    }

    #[test]
    fn exporting_without_picks_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = AppState::default();
        state.export_current_picks(&dir.path().join("p.csv"));
        assert!(state.status_message.is_some());
    }
}
