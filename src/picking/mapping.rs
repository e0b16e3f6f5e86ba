use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::model::{Gather, TimeAxis};

// ---------------------------------------------------------------------------
// Display units
// ---------------------------------------------------------------------------

/// Unit of the vertical (time) axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    #[default]
    Samples,
    Seconds,
}

impl TimeUnit {
    pub fn axis_label(&self) -> &'static str {
        match self {
            TimeUnit::Samples => "Time (samples)",
            TimeUnit::Seconds => "Time (s)",
        }
    }
}

/// Unit the display delay is typed in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelayUnit {
    #[default]
    Samples,
    S,
    Ms,
    Us,
}

impl DelayUnit {
    pub const ALL: [DelayUnit; 4] = [
        DelayUnit::Samples,
        DelayUnit::S,
        DelayUnit::Ms,
        DelayUnit::Us,
    ];
}

impl fmt::Display for DelayUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DelayUnit::Samples => "samples",
            DelayUnit::S => "s",
            DelayUnit::Ms => "ms",
            DelayUnit::Us => "us",
        };
        write!(f, "{s}")
    }
}

/// Shift of the displayed time origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Delay {
    pub enabled: bool,
    pub value: f64,
    pub unit: DelayUnit,
}

impl Delay {
    /// Delay expressed in samples at `sampling_rate` (Hz).
    pub fn in_samples(&self, sampling_rate: f64) -> f64 {
        if !self.enabled {
            return 0.0;
        }
        match self.unit {
            DelayUnit::Samples => self.value,
            DelayUnit::S => self.value * sampling_rate,
            DelayUnit::Ms => self.value * sampling_rate * 1e-3,
            DelayUnit::Us => self.value * sampling_rate * 1e-6,
        }
    }
}

// ---------------------------------------------------------------------------
// CoordinateMapper – plot space ↔ (receiver, gather time)
// ---------------------------------------------------------------------------

/// Converts between plot coordinates and (receiver index, gather time).
///
/// Receiver `r` is centred on `x = r`. The vertical axis shows the display
/// time negated so that time grows downwards. The display time counts from
/// the first sample, shifted by the delay, in samples or seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    axis: TimeAxis,
    receivers: usize,
    unit: TimeUnit,
    delay_samples: f64,
    snap_to_sample: bool,
}

impl CoordinateMapper {
    pub fn new(gather: &Gather, unit: TimeUnit, delay: &Delay, snap_to_sample: bool) -> Self {
        Self {
            axis: gather.time_axis(),
            receivers: gather.receiver_count(),
            unit,
            delay_samples: delay.in_samples(gather.sampling_rate),
            snap_to_sample,
        }
    }

    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    /// Display value (samples or seconds) of a fractional sample position.
    pub fn display_from_position(&self, position: f64) -> f64 {
        let shifted = position - self.delay_samples;
        match self.unit {
            TimeUnit::Samples => shifted,
            TimeUnit::Seconds => shifted * self.axis.dt,
        }
    }

    /// Plot `y` of a fractional sample position.
    pub fn y_from_position(&self, position: f64) -> f64 {
        -self.display_from_position(position)
    }

    /// Plot `y` of a gather time.
    pub fn y_from_time(&self, time: f64) -> f64 {
        self.y_from_position(self.axis.position_of(time))
    }

    /// Nearest receiver to plot `x`, clamped to the gather.
    pub fn receiver_from_x(&self, x: f64) -> usize {
        let r = x.round();
        if r <= 0.0 || !r.is_finite() {
            0
        } else {
            (r as usize).min(self.receivers.saturating_sub(1))
        }
    }

    /// Gather time at plot `y`, clamped to the axis (optionally snapped).
    pub fn time_from_y(&self, y: f64) -> f64 {
        let display = -y;
        let shifted = match self.unit {
            TimeUnit::Samples => display,
            TimeUnit::Seconds => display / self.axis.dt,
        };
        let last = self.axis.last_index() as f64;
        let mut position = (shifted + self.delay_samples).clamp(0.0, last);
        if !position.is_finite() {
            position = 0.0;
        }
        if self.snap_to_sample {
            position = position.round();
        }
        self.axis.time_of(position)
    }

    /// Map a plot point to (receiver index, gather time).
    pub fn pick_from_plot(&self, x: f64, y: f64) -> (usize, f64) {
        (self.receiver_from_x(x), self.time_from_y(y))
    }

    /// Visible `y` range of the whole trace length, `(top, bottom)`.
    pub fn y_span(&self) -> (f64, f64) {
        let top = self.y_from_position(self.delay_samples.max(0.0));
        let bottom = self.y_from_position(self.axis.last_index() as f64);
        (top, bottom)
    }

    /// Format the display value under plot `y` for axis labels.
    pub fn format_y(&self, y: f64) -> String {
        match self.unit {
            TimeUnit::Samples => format!("{:.0}", -y),
            TimeUnit::Seconds => format_seconds(-y),
        }
    }
}

/// Human-readable time with an SI prefix (`1.25 s`, `42.00 ms`, ...).
pub fn format_seconds(t: f64) -> String {
    let a = t.abs();
    if a == 0.0 || !a.is_finite() {
        format!("{t:.2} s")
    } else if a >= 1.0 {
        format!("{t:.2} s")
    } else if a >= 1e-3 {
        format!("{:.2} ms", t * 1e3)
    } else if a >= 1e-6 {
        format!("{:.2} us", t * 1e6)
    } else {
        format!("{:.2} ns", t * 1e9)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Trace;

    fn gather() -> Gather {
        Gather::new(vec![Trace::new(vec![0.0; 100]); 3], 100.0)
    }

    #[test]
    fn samples_unit_round_trips_sample_positions() {
        let m = CoordinateMapper::new(&gather(), TimeUnit::Samples, &Delay::default(), false);
        assert!((m.y_from_time(0.42) + 42.0).abs() < 1e-9);
        assert!((m.time_from_y(-42.0) - 0.42).abs() < 1e-12);
    }

    #[test]
    fn seconds_unit_scales_by_dt() {
        let m = CoordinateMapper::new(&gather(), TimeUnit::Seconds, &Delay::default(), false);
        assert!((m.y_from_time(0.42) + 0.42).abs() < 1e-12);
        assert!((m.time_from_y(-0.42) - 0.42).abs() < 1e-12);
    }

    #[test]
    fn out_of_range_clicks_are_clamped() {
        let m = CoordinateMapper::new(&gather(), TimeUnit::Samples, &Delay::default(), false);
        assert_eq!(m.pick_from_plot(-4.0, 10.0), (0, 0.0));
        let (r, t) = m.pick_from_plot(17.3, -1e6);
        assert_eq!(r, 2);
        assert!((t - 0.99).abs() < 1e-12);
    }

    #[test]
    fn receiver_is_nearest_trace() {
        let m = CoordinateMapper::new(&gather(), TimeUnit::Samples, &Delay::default(), false);
        assert_eq!(m.receiver_from_x(0.49), 0);
        assert_eq!(m.receiver_from_x(0.51), 1);
        assert_eq!(m.receiver_from_x(1.7), 2);
    }

    #[test]
    fn repeated_clicks_are_idempotent() {
        let m = CoordinateMapper::new(&gather(), TimeUnit::Seconds, &Delay::default(), true);
        let first = m.pick_from_plot(1.2, -0.4234);
        let second = m.pick_from_plot(1.2, -0.4234);
        assert_eq!(first, second);
        assert!((first.1 - 0.42).abs() < 1e-12);
    }

    #[test]
    fn delay_shifts_display_origin() {
        let delay = Delay {
            enabled: true,
            value: 100.0,
            unit: DelayUnit::Ms,
        };
        assert!((delay.in_samples(100.0) - 10.0).abs() < 1e-9);
        let m = CoordinateMapper::new(&gather(), TimeUnit::Samples, &delay, false);
        // sample 42 is displayed 32 samples after the delayed origin
        assert!((m.y_from_time(0.42) + 32.0).abs() < 1e-9);
        assert!((m.time_from_y(-32.0) - 0.42).abs() < 1e-12);
    }

    #[test]
    fn disabled_delay_is_ignored() {
        let delay = Delay {
            enabled: false,
            value: 5.0,
            unit: DelayUnit::Samples,
        };
        assert_eq!(delay.in_samples(1000.0), 0.0);
    }

    #[test]
    fn seconds_are_formatted_with_prefix() {
        assert_eq!(format_seconds(1.5), "1.50 s");
        assert_eq!(format_seconds(0.042), "42.00 ms");
        assert_eq!(format_seconds(0.000_25), "250.00 us");
    }
}
