use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::model::TimeAxis;

// ---------------------------------------------------------------------------
// PickSet – receiver index → pick time
// ---------------------------------------------------------------------------

/// Sparse mapping from receiver index to first-break time (seconds, on the
/// gather time axis). A receiver holds at most one pick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PickSet {
    picks: BTreeMap<usize, f64>,
}

impl PickSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or overwrite the pick of `receiver`. Returns the previous time.
    pub fn set(&mut self, receiver: usize, time: f64) -> Option<f64> {
        self.picks.insert(receiver, time)
    }

    /// Remove the pick of `receiver`; absent picks are ignored.
    pub fn remove(&mut self, receiver: usize) -> Option<f64> {
        self.picks.remove(&receiver)
    }

    pub fn get(&self, receiver: usize) -> Option<f64> {
        self.picks.get(&receiver).copied()
    }

    pub fn len(&self) -> usize {
        self.picks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.picks.is_empty()
    }

    /// Picks in receiver order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.picks.iter().map(|(&r, &t)| (r, t))
    }

    /// Drop picks of receivers at or beyond `receiver_count`.
    pub fn retain_receivers(&mut self, receiver_count: usize) {
        self.picks.retain(|&r, _| r < receiver_count);
    }
}

impl FromIterator<(usize, f64)> for PickSet {
    fn from_iter<I: IntoIterator<Item = (usize, f64)>>(iter: I) -> Self {
        Self {
            picks: iter.into_iter().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Sample index of a pick
// ---------------------------------------------------------------------------

/// How a pick time is turned into a sample index for reports and exports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickIndexMode {
    /// Nearest sample (integer).
    #[default]
    Nearest,
    /// Fractional sample position.
    Interpolated,
}

impl fmt::Display for PickIndexMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PickIndexMode::Nearest => write!(f, "Nearest sample"),
            PickIndexMode::Interpolated => write!(f, "Interpolated"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleIndex {
    Nearest(usize),
    Interpolated(f64),
}

impl SampleIndex {
    pub fn from_time(axis: &TimeAxis, time: f64, mode: PickIndexMode) -> Self {
        match mode {
            PickIndexMode::Nearest => SampleIndex::Nearest(axis.nearest_index(time)),
            PickIndexMode::Interpolated => SampleIndex::Interpolated(
                axis.position_of(time).clamp(0.0, axis.last_index() as f64),
            ),
        }
    }
}

impl fmt::Display for SampleIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleIndex::Nearest(i) => write!(f, "{i}"),
            SampleIndex::Interpolated(v) => write!(f, "{v:.3}"),
        }
    }
}

// ---------------------------------------------------------------------------
// PickReport – the line printed on a right click
// ---------------------------------------------------------------------------

/// One reported pick, printed as `(receiver_index, pick_index, pick_time)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickReport {
    pub receiver: usize,
    pub index: SampleIndex,
    pub time: f64,
}

impl fmt::Display for PickReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.receiver, self.index, self.time)
    }
}
