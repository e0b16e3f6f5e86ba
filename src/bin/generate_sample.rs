use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Float64Builder, ListBuilder, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

const SAMPLING_RATE: f64 = 1000.0;
const SAMPLES: usize = 500;
const RECEIVERS: usize = 24;
const RECEIVER_SPACING_M: f64 = 5.0;
const VELOCITY_M_S: f64 = 1500.0;
const PEAK_FREQUENCY_HZ: f64 = 60.0;

/// Ricker wavelet evaluated `t` seconds after its centre.
fn ricker(t: f64, f: f64) -> f64 {
    let a = (std::f64::consts::PI * f * t).powi(2);
    (1.0 - 2.0 * a) * (-a).exp()
}

/// One trace: a wavelet arriving at `arrival` seconds, decaying with
/// `offset`, on top of Gaussian noise.
fn generate_trace(arrival: f64, offset: f64, noise_level: f64, rng: &mut SimpleRng) -> Vec<f64> {
    let amplitude = 1.0 / (1.0 + offset / 20.0);
    // centre the wavelet so its first lobe starts at the arrival
    let centre = arrival + 1.0 / PEAK_FREQUENCY_HZ;
    (0..SAMPLES)
        .map(|k| {
            let t = k as f64 / SAMPLING_RATE;
            amplitude * ricker(t - centre, PEAK_FREQUENCY_HZ) + rng.gauss(0.0, noise_level)
        })
        .collect()
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn write_shot(path: &Path, source_x: f64, rng: &mut SimpleRng) -> Result<()> {
    let mut data_builder = ListBuilder::new(Float64Builder::new());
    let mut stations = Vec::with_capacity(RECEIVERS);

    for r in 0..RECEIVERS {
        let receiver_x = r as f64 * RECEIVER_SPACING_M;
        let offset = (receiver_x - source_x).abs();
        let arrival = 0.02 + offset / VELOCITY_M_S;
        let trace = generate_trace(arrival, offset, 0.02, rng);

        let values = data_builder.values();
        for v in trace {
            values.append_value(v);
        }
        data_builder.append(true);
        stations.push(format!("R{:02}", r + 1));
    }

    let data_array = data_builder.finish();
    let rate_array = Float64Array::from(vec![SAMPLING_RATE; RECEIVERS]);
    let start_array = Float64Array::from(vec![0.0; RECEIVERS]);
    let station_array =
        StringArray::from(stations.iter().map(|s| s.as_str()).collect::<Vec<_>>());

    let schema = Arc::new(Schema::new(vec![
        Field::new(
            "data",
            DataType::List(Arc::new(Field::new("item", DataType::Float64, true))),
            false,
        ),
        Field::new("sampling_rate", DataType::Float64, false),
        Field::new("start_time", DataType::Float64, false),
        Field::new("station", DataType::Utf8, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(data_array),
            Arc::new(rate_array),
            Arc::new(start_array),
            Arc::new(station_array),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let out_dir = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sample_gathers"));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut rng = SimpleRng::new(42);
    let spread = (RECEIVERS - 1) as f64 * RECEIVER_SPACING_M;
    let sources = [-RECEIVER_SPACING_M, spread / 2.0, spread + RECEIVER_SPACING_M];

    for (i, &source_x) in sources.iter().enumerate() {
        let path = out_dir.join(format!("shot_{:03}.parquet", i + 1));
        write_shot(&path, source_x, &mut rng)?;
        println!("Wrote {RECEIVERS} traces ({SAMPLES} samples each) to {}", path.display());
    }
    Ok(())
}
