use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::loader::list_gather_files;
use crate::data::model::TimeAxis;
use crate::error::PickerError;
use crate::picking::pick::{PickIndexMode, PickSet, SampleIndex};

// ---------------------------------------------------------------------------
// Survey – a directory of gathers, one PickSet per file
// ---------------------------------------------------------------------------

/// The directory being picked: its gather files and the picks made on each.
#[derive(Debug, Clone)]
pub struct Survey {
    pub dir: PathBuf,
    pub files: Vec<String>,
    /// Position in `files` of the gather on screen.
    pub current: Option<usize>,
    /// Picks per file; `None` until the file has been opened.
    picks: Vec<Option<PickSet>>,
}

impl Survey {
    /// Scan `dir` for gather files.
    pub fn open(dir: &Path) -> Result<Self> {
        let survey = Self::with_files(dir.to_path_buf(), list_gather_files(dir)?);
        if survey.is_empty() {
            return Err(PickerError::EmptySurvey(dir.display().to_string()).into());
        }
        log::info!("Found {} gather files in {}", survey.len(), dir.display());
        Ok(survey)
    }

    pub fn with_files(dir: PathBuf, files: Vec<String>) -> Self {
        let picks = vec![None; files.len()];
        Self {
            dir,
            files,
            current: None,
            picks,
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn path_of(&self, index: usize) -> Option<PathBuf> {
        self.files.get(index).map(|f| self.dir.join(f))
    }

    pub fn current_file(&self) -> Option<&str> {
        self.current.and_then(|i| self.files.get(i)).map(String::as_str)
    }

    /// Index after the current one, if any (no wrap-around).
    pub fn next_index(&self) -> Option<usize> {
        self.current
            .map(|i| i + 1)
            .filter(|&i| i < self.files.len())
    }

    /// Index before the current one, if any.
    pub fn previous_index(&self) -> Option<usize> {
        self.current.and_then(|i| i.checked_sub(1))
    }

    /// Saved picks of file `index` (empty if never picked).
    pub fn picks_of(&self, index: usize) -> PickSet {
        self.picks
            .get(index)
            .and_then(|p| p.clone())
            .unwrap_or_default()
    }

    /// Store the picks of file `index`.
    pub fn store_picks(&mut self, index: usize, picks: PickSet) {
        if let Some(slot) = self.picks.get_mut(index) {
            *slot = Some(picks);
        }
    }

    /// Whether any file holds at least one pick.
    pub fn has_picks(&self) -> bool {
        self.picks.iter().flatten().any(|p| !p.is_empty())
    }

    // -- Export / import --

    /// Snapshot of every file's picks for saving.
    pub fn to_pick_file(&self) -> PickFile {
        PickFile {
            files: self.files.clone(),
            picks: self.picks.clone(),
        }
    }

    /// Replace all picks with an imported file; the file count must match.
    pub fn import(&mut self, file: PickFile) -> std::result::Result<(), PickerError> {
        if file.picks.len() != self.files.len() {
            return Err(PickerError::PickMismatch {
                expected: self.files.len(),
                found: file.picks.len(),
            });
        }
        if file.files != self.files {
            log::warn!("Imported picks were saved for differently named files");
        }
        self.picks = file.picks;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Pick files
// ---------------------------------------------------------------------------

/// Every pick of a survey, as written by "Export all picks".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickFile {
    pub files: Vec<String>,
    pub picks: Vec<Option<PickSet>>,
}

impl PickFile {
    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self).context("serializing picks")?;
        std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text =
            std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&text).context("parsing pick file")
    }
}

/// Write one gather's picks as CSV: `receiver,index,time`.
pub fn export_picks_csv(
    path: &Path,
    picks: &PickSet,
    axis: &TimeAxis,
    mode: PickIndexMode,
) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV")?;
    writer
        .write_record(["receiver", "index", "time"])
        .context("writing CSV header")?;
    for (receiver, time) in picks.iter() {
        let index = SampleIndex::from_time(axis, time, mode);
        writer
            .write_record([receiver.to_string(), index.to_string(), time.to_string()])
            .context("writing CSV row")?;
    }
    writer.flush().context("flushing CSV")?;
    log::info!("Exported {} picks to {}", picks.len(), path.display());
    Ok(())
}
