use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use arrow::array::{Array, ArrayRef, AsArray, Date32Array, Float64Array};
use arrow::datatypes::DataType;
use arrow::temporal_conversions::date32_to_datetime;
use chrono::NaiveDate;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::model::{IndexCatalog, Observation, Series};
use super::time::parse_timestamp;
use super::DataError;

/// Sentinels that index providers (NOAA CPC/PSL and friends) use for "missing".
pub const DEFAULT_MISSING_SENTINELS: &[f64] = &[-99.99, -999.0, -999.9, -9999.0];

/// Relative tolerance for sentinel matches on values read as text or f64.
const SENTINEL_TOLERANCE: f64 = 1e-9;

/// Relative tolerance for values widened from narrower float columns.
fn sentinel_tolerance(source: &DataType) -> f64 {
    match source {
        DataType::Float16 => 1e-3,
        DataType::Float32 => 1e-6,
        _ => SENTINEL_TOLERANCE,
    }
}

/// Extensions picked up when scanning a dataset directory.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "tsv", "dat", "csv", "parquet", "pq"];

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Settings that shape how raw cells become observations.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOptions {
    pub missing_sentinels: Vec<f64>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            missing_sentinels: DEFAULT_MISSING_SENTINELS.to_vec(),
        }
    }
}

impl LoadOptions {
    fn is_sentinel(&self, v: f64, tolerance: f64) -> bool {
        self.missing_sentinels
            .iter()
            .any(|s| (v - s).abs() <= tolerance * s.abs().max(1.0))
    }

    /// Interpret a numeric value, mapping non-finite values and sentinels to missing.
    ///
    /// `tolerance` is relative to the sentinel; an f32 `-99.99` widens to
    /// `-99.98999786…` and must still match.
    fn clean(&self, v: f64, tolerance: f64) -> Option<f64> {
        (v.is_finite() && !self.is_sentinel(v, tolerance)).then_some(v)
    }

    /// Interpret a raw text cell as a value.
    pub fn parse_value(&self, cell: &str) -> Option<f64> {
        let cell = cell.trim().trim_matches('"');
        match cell.to_ascii_lowercase().as_str() {
            "" | "-" | "na" | "nan" | "null" | "none" => None,
            _ => cell
                .parse::<f64>()
                .ok()
                .and_then(|v| self.clean(v, SENTINEL_TOLERANCE)),
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Result of scanning a dataset directory.
#[derive(Debug, Default)]
pub struct DirectoryLoad {
    pub catalog: IndexCatalog,
    /// Files that could not be loaded. They do not stop the scan.
    pub failures: Vec<(PathBuf, DataError)>,
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

pub fn is_supported(path: &Path) -> bool {
    SUPPORTED_EXTENSIONS.contains(&extension_of(path).as_str())
}

/// Load a single index file.  Dispatch by extension.
///
/// Supported formats:
/// * `.txt` / `.tsv` / `.dat` – tab-separated `time<TAB>NAME` (the usual case)
/// * `.csv`                   – the same layout, comma-separated
/// * `.parquet` / `.pq`       – a `time` column plus one numeric value column
pub fn load_file(path: &Path, options: &LoadOptions) -> Result<Series, DataError> {
    match extension_of(path).as_str() {
        "txt" | "tsv" | "dat" => load_delimited(path, b'\t', options),
        "csv" => load_delimited(path, b',', options),
        "parquet" | "pq" => load_parquet(path, options),
        other => Err(DataError::UnsupportedExtension(other.to_string())),
    }
}

/// Load every supported file under `dir` into a catalog.
///
/// Files are visited in sorted path order, so when two files carry the same
/// series name the later one wins.
pub fn load_directory(dir: &Path, options: &LoadOptions) -> Result<DirectoryLoad, DataError> {
    let entries = std::fs::read_dir(dir).map_err(|e| io_error(dir, e))?;

    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| io_error(dir, e))?;
        let path = entry.path();
        if path.is_file() && is_supported(&path) {
            paths.push(path);
        }
    }
    paths.sort();

    let mut out = DirectoryLoad::default();
    for path in paths {
        match load_file(&path, options) {
            Ok(series) => {
                if series.is_empty() {
                    log::warn!("{} has no rows with a valid timestamp", path.display());
                }
                log::debug!(
                    "{}: {} observations ({} present) for {}",
                    path.display(),
                    series.len(),
                    series.present_count(),
                    series.name
                );
                if let Some(previous) = out.catalog.insert(series, &path) {
                    log::warn!(
                        "{} redefines a series already loaded from {}",
                        path.display(),
                        previous.display()
                    );
                }
            }
            Err(e) => {
                log::warn!("Skipping {}: {e}", path.display());
                out.failures.push((path, e));
            }
        }
    }

    log::info!(
        "Loaded {} series from {} ({} failed)",
        out.catalog.len(),
        dir.display(),
        out.failures.len()
    );
    Ok(out)
}

fn io_error(path: &Path, source: std::io::Error) -> DataError {
    if source.kind() == std::io::ErrorKind::NotFound {
        DataError::NotFound(path.to_path_buf())
    } else {
        DataError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

// ---------------------------------------------------------------------------
// Delimited text loader
// ---------------------------------------------------------------------------

fn load_delimited(path: &Path, delimiter: u8, options: &LoadOptions) -> Result<Series, DataError> {
    let file = File::open(path).map_err(|e| io_error(path, e))?;
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("series");
    parse_delimited(file, delimiter, &path.display().to_string(), stem, options)
}

/// Parse a delimited `time<delim>value` table.
///
/// Layout:
/// ```text
/// time        NIN34
/// 1982-01-01  0.12
/// 1982-02-01  -0.31
/// ```
/// The series name is the second header cell, or the first one when the file
/// has a single column. A single column holding whitespace (`time NINO3`) is
/// split on whitespace instead. Rows whose timestamp does not parse are dropped.
pub fn parse_delimited<R: Read>(
    reader: R,
    delimiter: u8,
    origin: &str,
    fallback_name: &str,
    options: &LoadOptions,
) -> Result<Series, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let csv_error = |source| DataError::Csv {
        path: origin.to_string(),
        source,
    };

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(|h| h.trim_matches('"').to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(DataError::MissingHeader {
            path: origin.to_string(),
        });
    }

    let whitespace_split = headers.len() == 1 && headers[0].split_whitespace().count() > 1;
    let name = if whitespace_split {
        headers[0].split_whitespace().last().unwrap_or_default().to_string()
    } else if headers.len() > 1 {
        headers[1].clone()
    } else {
        headers[0].clone()
    };
    let name = if name.is_empty() {
        fallback_name.to_string()
    } else {
        name
    };

    let mut rows = Vec::new();
    let mut dropped = 0usize;
    for result in reader.records() {
        let record = result.map_err(csv_error)?;
        let (time_cell, value_cell) = if whitespace_split {
            let mut parts = record.get(0).unwrap_or("").split_whitespace();
            (parts.next().unwrap_or(""), parts.next().unwrap_or(""))
        } else {
            (record.get(0).unwrap_or(""), record.get(1).unwrap_or(""))
        };

        match parse_timestamp(time_cell) {
            Some(time) => rows.push(Observation::new(time, options.parse_value(value_cell))),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        log::debug!("{origin}: dropped {dropped} rows with malformed timestamps");
    }

    Ok(Series::from_unsorted(name, rows))
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

fn is_numeric(dt: &DataType) -> bool {
    matches!(
        dt,
        DataType::Float16
            | DataType::Float32
            | DataType::Float64
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

/// Load a Parquet file holding one index.
///
/// Expected schema:
/// - `time`: Date32, Date64, Timestamp or Utf8 (falls back to the first column)
/// - first other numeric column: the values, its field name is the series name
fn load_parquet(path: &Path, options: &LoadOptions) -> Result<Series, DataError> {
    let origin = path.display().to_string();
    let parquet_error = |source| DataError::Parquet {
        path: origin.clone(),
        source,
    };

    let file = File::open(path).map_err(|e| io_error(path, e))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file).map_err(parquet_error)?;

    let schema = builder.schema().clone();
    let fields = schema.fields();
    let time_idx = fields
        .iter()
        .position(|f| f.name().eq_ignore_ascii_case("time"))
        .unwrap_or(0);
    let value_idx = fields
        .iter()
        .enumerate()
        .position(|(i, f)| i != time_idx && is_numeric(f.data_type()))
        .ok_or_else(|| DataError::Schema {
            path: origin.clone(),
            reason: "no numeric value column".to_string(),
        })?;
    let name = fields[value_idx].name().clone();
    let tolerance = sentinel_tolerance(fields[value_idx].data_type());

    let reader = builder.build().map_err(parquet_error)?;

    let mut rows = Vec::new();
    let mut dropped = 0usize;
    for batch in reader {
        let batch = batch.map_err(|source| DataError::Arrow {
            path: origin.clone(),
            source,
        })?;
        let times = extract_dates(batch.column(time_idx), &origin)?;
        let values = extract_values(batch.column(value_idx), &origin)?;

        for (time, value) in times.into_iter().zip(values) {
            match time {
                Some(time) => {
                    let value = value.and_then(|v| options.clean(v, tolerance));
                    rows.push(Observation::new(time, value));
                }
                None => dropped += 1,
            }
        }
    }

    if dropped > 0 {
        log::debug!("{origin}: dropped {dropped} rows with malformed timestamps");
    }

    Ok(Series::from_unsorted(name, rows))
}

// -- Arrow helpers --

fn extract_dates(col: &ArrayRef, origin: &str) -> Result<Vec<Option<NaiveDate>>, DataError> {
    if let Some(strings) = col.as_string_opt::<i32>() {
        return Ok(strings.iter().map(|s| s.and_then(parse_timestamp)).collect());
    }
    if let Some(strings) = col.as_string_opt::<i64>() {
        return Ok(strings.iter().map(|s| s.and_then(parse_timestamp)).collect());
    }

    let dates = arrow::compute::cast(col.as_ref(), &DataType::Date32).map_err(|source| {
        DataError::Arrow {
            path: origin.to_string(),
            source,
        }
    })?;
    let dates = dates
        .as_any()
        .downcast_ref::<Date32Array>()
        .ok_or_else(|| DataError::Schema {
            path: origin.to_string(),
            reason: format!("time column of type {:?} is not a date", col.data_type()),
        })?;

    Ok(dates
        .iter()
        .map(|d| d.and_then(date32_to_datetime).map(|dt| dt.date()))
        .collect())
}

fn extract_values(col: &ArrayRef, origin: &str) -> Result<Vec<Option<f64>>, DataError> {
    let values = arrow::compute::cast(col.as_ref(), &DataType::Float64).map_err(|source| {
        DataError::Arrow {
            path: origin.to_string(),
            source,
        }
    })?;
    let values = values
        .as_any()
        .downcast_ref::<Float64Array>()
        .ok_or_else(|| DataError::Schema {
            path: origin.to_string(),
            reason: "value column is not numeric".to_string(),
        })?;
    Ok(values.iter().collect())
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;

    use arrow::array::{Float32Array, StringArray, TimestampMillisecondArray};
    use arrow::datatypes::{Field, Schema, TimeUnit};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use tempfile::TempDir;

    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn write(dir: &TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn name_comes_from_second_header_cell() {
        let text = "time\tNINO3\n1982-02-01\t-0.5\n1982-01-01\t0.25\n";
        let s = parse_delimited(text.as_bytes(), b'\t', "t", "fallback", &LoadOptions::default())
            .unwrap();
        assert_eq!(s.name, "NINO3");
        assert_eq!(
            s.observations(),
            &[
                Observation::new(ymd(1982, 1, 1), Some(0.25)),
                Observation::new(ymd(1982, 2, 1), Some(-0.5)),
            ]
        );
    }

    #[test]
    fn drops_malformed_timestamps_and_flags_missing() {
        let text = "time\tNAO\n\
                    1990-01-01\t1.5\n\
                    not-a-date\t2.0\n\
                    \t3.0\n\
                    1990-02-01\t-99.99\n\
                    1990-03-01\t\n\
                    1990-04-01\tNaN\n\
                    1990-05-01\n\
                    1990-06-01\tabc\n";
        let s = parse_delimited(text.as_bytes(), b'\t', "t", "x", &LoadOptions::default()).unwrap();
        assert_eq!(s.len(), 6);
        assert_eq!(s.present_count(), 1);
        assert_eq!(s.observations()[0].value, Some(1.5));
    }

    #[test]
    fn custom_sentinels_replace_defaults() {
        let opts = LoadOptions {
            missing_sentinels: vec![-1.0],
        };
        let text = "time,AO\n2000-01,-1\n2000-02,-99.99\n";
        let s = parse_delimited(text.as_bytes(), b',', "t", "x", &opts).unwrap();
        assert_eq!(s.observations()[0].value, None);
        assert_eq!(s.observations()[1].value, Some(-99.99));
    }

    #[test]
    fn single_column_headers() {
        let text = "time MJO\n2001-01-01 0.7\n2001-01-02 -0.2\n";
        let s = parse_delimited(text.as_bytes(), b'\t', "t", "x", &LoadOptions::default()).unwrap();
        assert_eq!(s.name, "MJO");
        assert_eq!(s.present_count(), 2);

        let text = "PDO\n2001-01-01\n";
        let s = parse_delimited(text.as_bytes(), b'\t', "t", "x", &LoadOptions::default()).unwrap();
        assert_eq!(s.name, "PDO");
        assert_eq!(s.present_count(), 0);
    }

    #[test]
    fn blank_name_uses_fallback_and_empty_input_fails() {
        let text = "time\t\n2001-01-01\t1\n";
        let s = parse_delimited(text.as_bytes(), b'\t', "t", "stem", &LoadOptions::default())
            .unwrap();
        assert_eq!(s.name, "stem");

        let err = parse_delimited("".as_bytes(), b'\t', "t", "stem", &LoadOptions::default())
            .unwrap_err();
        assert!(matches!(err, DataError::MissingHeader { .. }));
    }

    #[test]
    fn load_file_dispatches_by_extension() {
        let dir = TempDir::new().unwrap();
        let tsv = write(&dir, "nino3.txt", "time\tNINO3\n2000-01-01\t1.0\n");
        let csv = write(&dir, "nao.CSV", "time,NAO\n2000-01-01,2.0\n");
        let other = write(&dir, "notes.md", "# nothing\n");

        let opts = LoadOptions::default();
        assert_eq!(load_file(&tsv, &opts).unwrap().name, "NINO3");
        assert_eq!(load_file(&csv, &opts).unwrap().name, "NAO");
        assert!(matches!(
            load_file(&other, &opts),
            Err(DataError::UnsupportedExtension(ext)) if ext == "md"
        ));
        let missing = load_file(&dir.path().join("gone.txt"), &opts).unwrap_err();
        assert!(missing.is_not_found());
    }

    #[test]
    fn directory_scan_collects_failures() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a_nino3.txt", "time\tNINO3\n2000-01-01\t1.0\n");
        write(&dir, "b_nino4.txt", "time\tNINO4\n2000-01-01\t-1.0\n");
        write(&dir, "c_empty.txt", "");
        write(&dir, "readme.md", "ignored");

        let load = load_directory(dir.path(), &LoadOptions::default()).unwrap();
        assert_eq!(load.catalog.names().collect::<Vec<_>>(), vec!["NINO3", "NINO4"]);
        assert_eq!(load.failures.len(), 1);
        assert!(load.failures[0].0.ends_with("c_empty.txt"));
    }

    #[test]
    fn later_file_wins_on_duplicate_names() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.txt", "time\tSOI\n2000-01-01\t1.0\n");
        let b = write(&dir, "b.txt", "time\tSOI\n2000-01-01\t2.0\n");

        let load = load_directory(dir.path(), &LoadOptions::default()).unwrap();
        assert_eq!(load.catalog.len(), 1);
        assert_eq!(load.catalog.source_of("SOI"), Some(b.as_path()));
        assert_eq!(load.catalog.get("SOI").unwrap().observations()[0].value, Some(2.0));
    }

    #[test]
    fn missing_directory_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = load_directory(&dir.path().join("nope"), &LoadOptions::default()).unwrap_err();
        assert!(err.is_not_found());
    }

    fn write_parquet(path: &Path, columns: Vec<(Field, ArrayRef)>) {
        let (fields, arrays): (Vec<Field>, Vec<ArrayRef>) = columns.into_iter().unzip();
        let schema = Arc::new(Schema::new(fields));
        let batch = RecordBatch::try_new(schema.clone(), arrays).unwrap();
        let mut writer = ArrowWriter::try_new(File::create(path).unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
    }

    fn array_ref(array: impl Array + 'static) -> ArrayRef {
        Arc::new(array)
    }

    fn days_since_epoch(d: NaiveDate) -> i32 {
        d.signed_duration_since(ymd(1970, 1, 1)).num_days() as i32
    }

    #[test]
    fn parquet_with_string_times() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("amo.parquet");
        write_parquet(
            &path,
            vec![
                (
                    Field::new("time", DataType::Utf8, true),
                    array_ref(StringArray::from(vec![
                        Some("2000-02-01"),
                        Some("bogus"),
                        Some("2000-01-01"),
                        None,
                    ])),
                ),
                (
                    Field::new("AMO", DataType::Float32, true),
                    array_ref(Float32Array::from(vec![Some(0.5), Some(1.0), None, Some(2.0)])),
                ),
            ],
        );

        let s = load_file(&path, &LoadOptions::default()).unwrap();
        assert_eq!(s.name, "AMO");
        assert_eq!(
            s.observations(),
            &[
                Observation::new(ymd(2000, 1, 1), None),
                Observation::new(ymd(2000, 2, 1), Some(0.5)),
            ]
        );
    }

    #[test]
    fn parquet_f32_sentinels_are_missing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nao.parquet");
        write_parquet(
            &path,
            vec![
                (
                    Field::new("time", DataType::Utf8, false),
                    array_ref(StringArray::from(vec!["2010-01-01", "2010-02-01", "2010-03-01"])),
                ),
                (
                    Field::new("NAO", DataType::Float32, true),
                    array_ref(Float32Array::from(vec![0.5, -99.99, -999.9])),
                ),
            ],
        );

        let s = load_file(&path, &LoadOptions::default()).unwrap();
        let values: Vec<_> = s.observations().iter().map(|o| o.value).collect();
        assert_eq!(values, vec![Some(0.5), None, None]);
    }

    #[test]
    fn parquet_with_date32_times() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("oni.parquet");
        let dates = [ymd(1998, 1, 1), ymd(1997, 12, 1), ymd(1998, 2, 1)];
        write_parquet(
            &path,
            vec![
                (
                    Field::new("time", DataType::Date32, false),
                    array_ref(Date32Array::from(
                        dates.iter().copied().map(days_since_epoch).collect::<Vec<_>>(),
                    )),
                ),
                (
                    Field::new("ONI", DataType::Float64, true),
                    array_ref(Float64Array::from(vec![Some(2.2), Some(2.4), Some(-99.99)])),
                ),
            ],
        );

        let s = load_file(&path, &LoadOptions::default()).unwrap();
        assert_eq!(s.name, "ONI");
        assert_eq!(
            s.observations(),
            &[
                Observation::new(ymd(1997, 12, 1), Some(2.4)),
                Observation::new(ymd(1998, 1, 1), Some(2.2)),
                Observation::new(ymd(1998, 2, 1), None),
            ]
        );
    }

    #[test]
    fn parquet_with_millisecond_timestamps() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mjo.parquet");
        let millis: Vec<i64> = [ymd(2023, 1, 1), ymd(2023, 1, 2)]
            .iter()
            .map(|d| d.and_hms_opt(12, 0, 0).unwrap().and_utc().timestamp_millis())
            .collect();
        write_parquet(
            &path,
            vec![
                (
                    Field::new("MJO", DataType::Float64, true),
                    array_ref(Float64Array::from(vec![0.8, 1.1])),
                ),
                (
                    Field::new("time", DataType::Timestamp(TimeUnit::Millisecond, None), false),
                    array_ref(TimestampMillisecondArray::from(millis)),
                ),
            ],
        );

        let s = load_file(&path, &LoadOptions::default()).unwrap();
        assert_eq!(s.name, "MJO");
        assert_eq!(
            s.observations(),
            &[
                Observation::new(ymd(2023, 1, 1), Some(0.8)),
                Observation::new(ymd(2023, 1, 2), Some(1.1)),
            ]
        );
    }
}
