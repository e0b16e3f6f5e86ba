use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, AsArray, Float32Array, Float64Array, Int32Array, Int64Array, LargeListArray,
    ListArray, StringArray,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;

use super::model::{Gather, Trace};

/// File extensions the loader understands (lower case).
pub const SUPPORTED_EXTENSIONS: [&str; 4] = ["parquet", "pq", "json", "csv"];

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Whether `name` has an extension the loader can read.
pub fn is_supported(name: &str) -> bool {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    SUPPORTED_EXTENSIONS.contains(&ext.as_str())
}

/// Sorted names of the gather files directly inside `dir`.
pub fn list_gather_files(dir: &Path) -> Result<Vec<String>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("listing directory {}", dir.display()))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.context("reading directory entry")?;
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_supported(&name) {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

/// Load a gather from a file.  Dispatch by extension.
///
/// Every format stores one row per trace, in receiver order:
/// * `data`          – the trace amplitudes
/// * `sampling_rate` – Hz; must agree across rows
/// * `start_time`    – optional, seconds of the first sample
/// * `station`       – optional receiver name
///
/// `sampling_rate` overrides the file's rate (and makes the column optional).
/// The gather is returned as read: validation happens when it is loaded
/// into a pick session.
pub fn load_file(path: &Path, sampling_rate: Option<f64>) -> Result<Gather> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let rows = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path)?,
        "json" => load_json(path)?,
        "csv" => load_csv(path)?,
        other => bail!("Unsupported file extension: .{other}"),
    };

    let label = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    assemble(rows, sampling_rate).map(|g| g.with_label(label))
}

// ---------------------------------------------------------------------------
// Row → Gather
// ---------------------------------------------------------------------------

/// One trace row as stored on disk, whatever the format.
#[derive(Debug, Clone, Deserialize)]
struct TraceRow {
    #[serde(alias = "samples")]
    data: Vec<f64>,
    sampling_rate: Option<f64>,
    start_time: Option<f64>,
    station: Option<String>,
}

fn assemble(rows: Vec<TraceRow>, sampling_rate: Option<f64>) -> Result<Gather> {
    let file_rate = rows.iter().find_map(|r| r.sampling_rate);
    if let Some(rate) = file_rate {
        if let Some((i, other)) = rows
            .iter()
            .enumerate()
            .find_map(|(i, r)| r.sampling_rate.filter(|&s| s != rate).map(|s| (i, s)))
        {
            bail!("Row {i}: sampling rate {other} differs from {rate}");
        }
    }

    let rate = match (sampling_rate, file_rate) {
        (Some(forced), _) => forced,
        (None, Some(rate)) => rate,
        (None, None) if rows.is_empty() => f64::NAN,
        (None, None) => bail!("No 'sampling_rate' in file and none given"),
    };
    let start_time = rows.iter().find_map(|r| r.start_time).unwrap_or(0.0);

    let traces = rows
        .into_iter()
        .map(|r| Trace::new(r.data).with_station(r.station))
        .collect();

    Ok(Gather::new(traces, rate).with_start_time(start_time))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "data": [0.0, 0.01, ...], "sampling_rate": 1000.0, "station": "R01" },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<Vec<TraceRow>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    serde_json::from_str(&text).context("parsing JSON gather")
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout:  header row with column names.
/// The `data` column holds semicolon-separated floats: `"0.0;0.01;-0.02"`.
fn load_csv(path: &Path) -> Result<Vec<TraceRow>> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let column = |name: &str| headers.iter().position(|h| h == name);
    let data_idx = column("data").context("CSV missing 'data' column")?;
    let rate_idx = column("sampling_rate");
    let start_idx = column("start_time");
    let station_idx = column("station");

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let field = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .map(str::trim)
                .filter(|s| !s.is_empty())
        };

        let data = parse_semicolon_floats(field(Some(data_idx)).unwrap_or(""), row_no)?;
        let sampling_rate = field(rate_idx)
            .map(|s| s.parse::<f64>())
            .transpose()
            .with_context(|| format!("CSV row {row_no}: bad sampling_rate"))?;
        let start_time = field(start_idx)
            .map(|s| s.parse::<f64>())
            .transpose()
            .with_context(|| format!("CSV row {row_no}: bad start_time"))?;

        rows.push(TraceRow {
            data,
            sampling_rate,
            start_time,
            station: field(station_idx).map(str::to_string),
        });
    }
    Ok(rows)
}

fn parse_semicolon_floats(s: &str, row: usize) -> Result<Vec<f64>> {
    if s.is_empty() {
        return Ok(Vec::new());
    }
    s.split(';')
        .enumerate()
        .map(|(j, tok)| {
            tok.trim()
                .parse::<f64>()
                .with_context(|| format!("Row {row}, data[{j}]: '{tok}' is not a number"))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file containing one trace per row.
///
/// Expected schema:
/// - `data`: List<Float64|Float32> or LargeList – trace amplitudes
/// - `sampling_rate`: Float64/Float32/Int64/Int32 (optional)
/// - `start_time`: Float64/Float32/Int64/Int32 (optional)
/// - `station`: Utf8 (optional)
fn load_parquet(path: &Path) -> Result<Vec<TraceRow>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let data_idx = schema
            .index_of("data")
            .map_err(|_| anyhow::anyhow!("Parquet file missing 'data' column"))?;
        let optional = |name: &str| schema.index_of(name).ok().map(|i| batch.column(i));
        let rate_col = optional("sampling_rate");
        let start_col = optional("start_time");
        let station_col = optional("station");
        let data_col = batch.column(data_idx);

        for row in 0..batch.num_rows() {
            let data = extract_f64_list(data_col, row)
                .with_context(|| format!("Row {row}: failed to read 'data'"))?;
            let sampling_rate = match rate_col {
                Some(col) => extract_scalar(col, row)
                    .with_context(|| format!("Row {row}: failed to read 'sampling_rate'"))?,
                None => None,
            };
            let start_time = match start_col {
                Some(col) => extract_scalar(col, row)
                    .with_context(|| format!("Row {row}: failed to read 'start_time'"))?,
                None => None,
            };
            let station = station_col.and_then(|col| extract_string(col, row));

            rows.push(TraceRow {
                data,
                sampling_rate,
                start_time,
                station,
            });
        }
    }

    Ok(rows)
}

// -- Parquet / Arrow helpers --

/// Extract a `Vec<f64>` from a List or LargeList column at the given row.
fn extract_f64_list(col: &Arc<dyn Array>, row: usize) -> Result<Vec<f64>> {
    if col.is_null(row) {
        bail!("null value in list column");
    }

    let values_array = match col.data_type() {
        DataType::List(_) => {
            let list_arr = col
                .as_any()
                .downcast_ref::<ListArray>()
                .context("expected ListArray")?;
            list_arr.value(row)
        }
        DataType::LargeList(_) => {
            let list_arr = col
                .as_any()
                .downcast_ref::<LargeListArray>()
                .context("expected LargeListArray")?;
            list_arr.value(row)
        }
        other => bail!("Expected List or LargeList column, got {other:?}"),
    };

    if let Some(f64_arr) = values_array.as_any().downcast_ref::<Float64Array>() {
        Ok(f64_arr.iter().map(|v| v.unwrap_or(0.0)).collect())
    } else if let Some(f32_arr) = values_array.as_any().downcast_ref::<Float32Array>() {
        Ok(f32_arr.iter().map(|v| v.unwrap_or(0.0) as f64).collect())
    } else {
        bail!(
            "List inner type is {:?}, expected Float64 or Float32",
            values_array.data_type()
        )
    }
}

/// Extract a numeric cell as `f64`; nulls give `None`.
fn extract_scalar(col: &Arc<dyn Array>, row: usize) -> Result<Option<f64>> {
    if col.is_null(row) {
        return Ok(None);
    }
    let any = col.as_any();
    let value = match col.data_type() {
        DataType::Float64 => any.downcast_ref::<Float64Array>().map(|a| a.value(row)),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .map(|a| a.value(row) as f64),
        DataType::Int64 => any.downcast_ref::<Int64Array>().map(|a| a.value(row) as f64),
        DataType::Int32 => any.downcast_ref::<Int32Array>().map(|a| a.value(row) as f64),
        other => bail!("Expected a numeric column, got {other:?}"),
    };
    value.map(Some).context("unexpected array layout")
}

/// Extract a string cell; nulls and non-string columns give `None`.
fn extract_string(col: &Arc<dyn Array>, row: usize) -> Option<String> {
    if col.is_null(row) {
        return None;
    }
    match col.data_type() {
        DataType::Utf8 => col
            .as_any()
            .downcast_ref::<StringArray>()
            .map(|s| s.value(row).to_string()),
        DataType::LargeUtf8 => Some(col.as_string::<i64>().value(row).to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn json_records_become_traces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shot_001.json");
        fs::write(
            &path,
            r#"[
                {"data": [0.0, 1.0, 0.5], "sampling_rate": 500.0, "station": "R01"},
                {"samples": [0.0, -1.0, 0.25], "sampling_rate": 500.0}
            ]"#,
        )
        .unwrap();

        let gather = load_file(&path, None).unwrap();
        assert_eq!(gather.receiver_count(), 2);
        assert_eq!(gather.sample_count(), 3);
        assert_eq!(gather.sampling_rate, 500.0);
        assert_eq!(gather.label, "shot_001.json");
        assert_eq!(gather.traces[0].station.as_deref(), Some("R01"));
        assert_eq!(gather.traces[1].samples, vec![0.0, -1.0, 0.25]);
    }

    #[test]
    fn csv_rows_become_traces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shot.CSV");
        fs::write(
            &path,
            "station,sampling_rate,start_time,data\n\
             R01,1000,0.5,0.0;1.0;2.0\n\
             R02,1000,,3.0;4.0;5.0\n",
        )
        .unwrap();

        let gather = load_file(&path, None).unwrap();
        assert_eq!(gather.receiver_count(), 2);
        assert_eq!(gather.start_time, 0.5);
        assert_eq!(gather.traces[1].samples, vec![3.0, 4.0, 5.0]);
        assert_eq!(gather.traces[1].station.as_deref(), Some("R02"));
    }

    #[test]
    fn override_replaces_missing_sampling_rate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shot.csv");
        fs::write(&path, "data\n1;2;3\n").unwrap();

        assert!(load_file(&path, None).is_err());
        let gather = load_file(&path, Some(250.0)).unwrap();
        assert_eq!(gather.sampling_rate, 250.0);
    }

    #[test]
    fn inconsistent_sampling_rates_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shot.json");
        fs::write(
            &path,
            r#"[{"data": [0.0], "sampling_rate": 100.0}, {"data": [0.0], "sampling_rate": 200.0}]"#,
        )
        .unwrap();
        let err = load_file(&path, None).unwrap_err();
        assert!(format!("{err:#}").contains("differs"));
    }

    #[test]
    fn ragged_file_loads_but_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shot.json");
        fs::write(
            &path,
            r#"[{"data": [0.0, 1.0], "sampling_rate": 100.0}, {"data": [0.0], "sampling_rate": 100.0}]"#,
        )
        .unwrap();
        let gather = load_file(&path, None).unwrap();
        assert!(gather.validate().is_err());
    }

    #[test]
    fn non_finite_csv_amplitudes_fail_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shot.csv");
        fs::write(
            &path,
            "sampling_rate,data\n100,1.0;2.0;NaN;3.0\n100,0.5;inf;0.2;0.3\n",
        )
        .unwrap();

        let gather = load_file(&path, None).unwrap();
        assert!(gather.traces[0].samples[2].is_nan());
        assert!(gather.traces[1].samples[1].is_infinite());
        let err = gather.validate().unwrap_err();
        assert!(err.to_string().contains("trace 0, sample 2"));
    }

    #[test]
    fn unsupported_extension_is_an_error() {
        let err = load_file(Path::new("shot.segy"), None).unwrap_err();
        assert!(err.to_string().contains(".segy"));
    }

    #[test]
    fn directory_listing_is_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.json", "a.parquet", "notes.txt", "c.CSV"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        fs::create_dir(dir.path().join("d.json")).unwrap();

        let names = list_gather_files(dir.path()).unwrap();
        assert_eq!(names, vec!["a.parquet", "b.json", "c.CSV"]);
    }
}
