use std::fmt;
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::loader::{parse_delimited, LoadOptions};
use super::model::Series;
use super::DataError;

/// Text formats offered for download.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Tsv,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 2] = [ExportFormat::Csv, ExportFormat::Tsv];

    pub fn delimiter(self) -> u8 {
        match self {
            ExportFormat::Csv => b',',
            ExportFormat::Tsv => b'\t',
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Tsv => "tsv",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ExportFormat::Csv => "CSV",
            ExportFormat::Tsv => "TSV",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn csv_error(origin: &str) -> impl Fn(csv::Error) -> DataError + '_ {
    move |source| DataError::Csv {
        path: origin.to_string(),
        source,
    }
}

/// Write `series` as `time<delim>NAME` rows.
///
/// Dates are written as `YYYY-MM-DD`; values use the shortest representation
/// that parses back to the same `f64`; missing values are empty cells.
pub fn write_series<W: Write>(
    writer: W,
    series: &Series,
    format: ExportFormat,
) -> Result<(), DataError> {
    let origin = "export";
    let mut w = csv::WriterBuilder::new()
        .delimiter(format.delimiter())
        .from_writer(writer);

    w.write_record(["time", series.name.as_str()])
        .map_err(csv_error(origin))?;
    for obs in series.observations() {
        let time = obs.time.format("%Y-%m-%d").to_string();
        let value = obs.value.map(|v| v.to_string()).unwrap_or_default();
        w.write_record([time.as_str(), value.as_str()])
            .map_err(csv_error(origin))?;
    }
    w.flush().map_err(|source| DataError::Io {
        path: origin.to_string(),
        source,
    })
}

/// Write `series` to a file at `path`.
pub fn export_to_path(path: &Path, series: &Series, format: ExportFormat) -> Result<(), DataError> {
    let file = std::fs::File::create(path).map_err(|source| DataError::Io {
        path: path.display().to_string(),
        source,
    })?;
    write_series(std::io::BufWriter::new(file), series, format)?;
    log::info!(
        "Exported {} ({} rows) as {format} to {}",
        series.name,
        series.len(),
        path.display()
    );
    Ok(())
}

/// Parse a previously exported series.
#[cfg_attr(not(test), allow(dead_code))]
pub fn read_export<R: Read>(
    reader: R,
    format: ExportFormat,
    options: &LoadOptions,
) -> Result<Series, DataError> {
    parse_delimited(reader, format.delimiter(), "export", "series", options)
}
