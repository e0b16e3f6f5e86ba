use super::model::Gather;

// ---------------------------------------------------------------------------
// Display options: how amplitudes are conditioned before plotting
// ---------------------------------------------------------------------------

/// Amplitude conditioning applied to a gather before drawing it.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DisplayOptions {
    /// Remove the mean of every trace.
    pub demean: bool,
    /// Scale all traces by the same (global) maximum instead of their own.
    pub normalize: bool,
    /// Percentile of |amplitude| used as the clip level, in `(0, 1]`.
    /// Only used when `normalize` is on.
    pub perc: f64,
    /// Paint the positive lobes.
    pub fill: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            demean: true,
            normalize: false,
            perc: 1.0,
            fill: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Wiggle geometry
// ---------------------------------------------------------------------------

/// Plot-ready geometry of one trace, in (receiver, sample position) space.
///
/// `x` is the receiver index plus the scaled amplitude, `y` is the
/// fractional sample position. Converting `y` to a displayed time is left to
/// the coordinate mapper so the geometry survives unit/delay changes.
#[derive(Debug, Clone, PartialEq)]
pub struct WiggleTrace {
    pub receiver: usize,
    pub line: Vec<[f64; 2]>,
    /// Convex pieces (triangles / trapezoids) of the positive lobes.
    pub fill: Vec<Vec<[f64; 2]>>,
}

/// Condition every trace and build its wiggle geometry.
pub fn wiggle_traces(gather: &Gather, options: &DisplayOptions) -> Vec<WiggleTrace> {
    let scaled = scaled_amplitudes(gather, options);
    scaled
        .iter()
        .enumerate()
        .map(|(r, amps)| {
            let base = r as f64;
            let line = amps
                .iter()
                .enumerate()
                .map(|(k, &a)| [base + a, k as f64])
                .collect();
            let fill = if options.fill {
                positive_lobes(base, amps)
            } else {
                Vec::new()
            };
            WiggleTrace {
                receiver: r,
                line,
                fill,
            }
        })
        .collect()
}

/// Amplitudes after demean / clip / normalisation, each in `[-1, 1]`.
pub fn scaled_amplitudes(gather: &Gather, options: &DisplayOptions) -> Vec<Vec<f64>> {
    let mut traces: Vec<Vec<f64>> = gather
        .traces
        .iter()
        .map(|tr| {
            if options.demean {
                demean(&tr.samples)
            } else {
                tr.samples.clone()
            }
        })
        .collect();

    if options.normalize && options.perc < 1.0 {
        let all: Vec<f64> = traces.iter().flatten().map(|v| v.abs()).collect();
        let clip = percentile(&all, options.perc);
        if clip.is_finite() {
            for tr in &mut traces {
                for v in tr.iter_mut().filter(|v| v.is_finite()) {
                    *v = v.clamp(-clip, clip);
                }
            }
        }
    }

    let global_max = max_abs(traces.iter().flatten().copied());
    for tr in &mut traces {
        let ymax = if options.normalize {
            global_max
        } else {
            max_abs(tr.iter().copied())
        };
        if ymax > 0.0 {
            for v in tr.iter_mut() {
                *v /= ymax;
            }
        }
    }
    traces
}

/// Subtract the mean (constant detrend).
pub fn demean(samples: &[f64]) -> Vec<f64> {
    if samples.is_empty() {
        return Vec::new();
    }
    let mean = samples.iter().sum::<f64>() / samples.len() as f64;
    samples.iter().map(|v| v - mean).collect()
}

/// Percentile with linear interpolation between closest ranks, `q` in `[0, 1]`.
/// Non-finite values are ignored.
pub fn percentile(values: &[f64], q: f64) -> f64 {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return 0.0;
    }
    sorted.sort_by(f64::total_cmp);
    let rank = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

fn max_abs(values: impl Iterator<Item = f64>) -> f64 {
    values.map(f64::abs).filter(|v| v.is_finite()).fold(0.0, f64::max)
}

/// Split the positive lobes of a trace into convex pieces.
///
/// egui only fills convex polygons, so each sample interval contributes a
/// trapezoid (both ends positive) or a triangle (one end crosses zero).
fn positive_lobes(base: f64, amps: &[f64]) -> Vec<Vec<[f64; 2]>> {
    let mut pieces = Vec::new();
    for (k, pair) in amps.windows(2).enumerate() {
        let (a0, a1) = (pair[0], pair[1]);
        let (s0, s1) = (k as f64, k as f64 + 1.0);
        match (a0 > 0.0, a1 > 0.0) {
            (true, true) => pieces.push(vec![
                [base, s0],
                [base + a0, s0],
                [base + a1, s1],
                [base, s1],
            ]),
            (true, false) => {
                let sc = s0 + a0 / (a0 - a1);
                pieces.push(vec![[base, s0], [base + a0, s0], [base, sc]]);
            }
            (false, true) => {
                let sc = s0 + a0 / (a0 - a1);
                pieces.push(vec![[base, sc], [base + a1, s1], [base, s1]]);
            }
            (false, false) => {}
        }
    }
    pieces
}
