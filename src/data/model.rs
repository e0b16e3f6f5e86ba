use crate::error::{PickerError, Result};

// ---------------------------------------------------------------------------
// Trace – one receiver's recording
// ---------------------------------------------------------------------------

/// A single receiver's amplitude-vs-time recording.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    /// Amplitudes, one per sample.
    pub samples: Vec<f64>,
    /// Station / channel name if the source file carries one.
    pub station: Option<String>,
}

impl Trace {
    pub fn new(samples: Vec<f64>) -> Self {
        Self {
            samples,
            station: None,
        }
    }

    pub fn with_station(mut self, station: Option<String>) -> Self {
        self.station = station;
        self
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }
}

// ---------------------------------------------------------------------------
// TimeAxis – uniform sampling shared by every trace of a gather
// ---------------------------------------------------------------------------

/// Uniformly sampled time axis: sample `i` sits at `start + i * dt`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeAxis {
    /// Time of the first sample, in seconds.
    pub start: f64,
    /// Sampling interval, in seconds.
    pub dt: f64,
    /// Number of samples.
    pub len: usize,
}

impl TimeAxis {
    /// Time of sample `index`.
    pub fn time_of(&self, index: f64) -> f64 {
        self.start + index * self.dt
    }

    /// Fractional sample position of `time` (unclamped).
    pub fn position_of(&self, time: f64) -> f64 {
        (time - self.start) / self.dt
    }

    /// Index of the last sample.
    pub fn last_index(&self) -> usize {
        self.len.saturating_sub(1)
    }

    /// Time of the last sample.
    pub fn end(&self) -> f64 {
        self.time_of(self.last_index() as f64)
    }

    /// Clamp a time into `[start, end]`.
    pub fn clamp(&self, time: f64) -> f64 {
        time.clamp(self.start, self.end())
    }

    /// Sample index nearest to `time`, clamped to the axis.
    pub fn nearest_index(&self, time: f64) -> usize {
        let pos = self.position_of(time).round();
        if pos <= 0.0 || !pos.is_finite() {
            0
        } else {
            (pos as usize).min(self.last_index())
        }
    }
}

// ---------------------------------------------------------------------------
// Gather – every trace recorded for one shot
// ---------------------------------------------------------------------------

/// A collection of traces from multiple receivers for one shot.
///
/// The receiver index of a trace is its position in `traces`. A gather is
/// read-only once loaded into a pick session.
#[derive(Debug, Clone, PartialEq)]
pub struct Gather {
    pub traces: Vec<Trace>,
    /// Sampling rate in Hz.
    pub sampling_rate: f64,
    /// Time of sample 0, in seconds.
    pub start_time: f64,
    /// Where the gather came from (file name), shown in the UI.
    pub label: String,
}

impl Gather {
    pub fn new(traces: Vec<Trace>, sampling_rate: f64) -> Self {
        Self {
            traces,
            sampling_rate,
            start_time: 0.0,
            label: String::new(),
        }
    }

    pub fn with_start_time(mut self, start_time: f64) -> Self {
        self.start_time = start_time;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Number of receivers.
    pub fn receiver_count(&self) -> usize {
        self.traces.len()
    }

    /// Number of samples per trace (length of the first trace).
    pub fn sample_count(&self) -> usize {
        self.traces.first().map_or(0, Trace::len)
    }

    /// Time axis shared by all traces.
    pub fn time_axis(&self) -> TimeAxis {
        TimeAxis {
            start: self.start_time,
            dt: 1.0 / self.sampling_rate,
            len: self.sample_count(),
        }
    }

    /// Check that the gather can be rendered and picked.
    pub fn validate(&self) -> Result<()> {
        if self.traces.is_empty() {
            return Err(PickerError::InvalidInput("gather has no traces".into()));
        }
        let npts = self.sample_count();
        if npts == 0 {
            return Err(PickerError::InvalidInput("traces have no samples".into()));
        }
        if let Some((k, tr)) = self
            .traces
            .iter()
            .enumerate()
            .find(|(_, tr)| tr.len() != npts)
        {
            return Err(PickerError::InvalidInput(format!(
                "trace {k} has {} samples, expected {npts}",
                tr.len()
            )));
        }
        if !(self.sampling_rate.is_finite() && self.sampling_rate > 0.0) {
            return Err(PickerError::InvalidInput(format!(
                "sampling rate must be positive, got {}",
                self.sampling_rate
            )));
        }
        if !self.start_time.is_finite() {
            return Err(PickerError::InvalidInput("start time is not finite".into()));
        }
        for (k, tr) in self.traces.iter().enumerate() {
            if let Some(i) = tr.samples.iter().position(|v| !v.is_finite()) {
                return Err(PickerError::InvalidInput(format!(
                    "trace {k}, sample {i} is not finite ({})",
                    tr.samples[i]
                )));
            }
        }
        Ok(())
    }
}
