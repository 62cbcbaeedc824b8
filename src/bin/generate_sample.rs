use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Date32Array, Float64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Datelike, Months, NaiveDate};
use clap::Parser;
use parquet::arrow::ArrowWriter;

/// Write a synthetic teleconnection dataset (one file per index).
#[derive(Debug, Parser)]
#[command(name = "generate_sample")]
struct Args {
    /// Output directory
    #[arg(default_value = "dataset")]
    out_dir: PathBuf,

    /// Write the ONI series as Parquet instead of tab-separated text
    #[arg(long)]
    parquet: bool,

    /// PRNG seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
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

/// First-order autoregressive process with a forcing term.
fn ar1(rng: &mut SimpleRng, n: usize, phi: f64, noise: f64, forcing: impl Fn(usize) -> f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(n);
    let mut prev = 0.0;
    for t in 0..n {
        prev = phi * prev + forcing(t) + rng.gauss(0.0, noise);
        out.push(prev);
    }
    out
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Tab-separated `time<TAB>NAME`; `None` is written as the -99.99 sentinel.
fn write_tsv(dir: &Path, file: &str, name: &str, rows: &[(NaiveDate, Option<f64>)]) -> Result<()> {
    let path = dir.join(file);
    let mut w = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(&path)
        .with_context(|| format!("creating {}", path.display()))?;
    w.write_record(["time", name])?;
    for (time, value) in rows {
        let value = value.map(round2).unwrap_or(-99.99);
        w.write_record([time.format("%Y-%m-%d").to_string(), format!("{value:.2}")])?;
    }
    w.flush()?;
    println!("Wrote {} rows of {name} to {}", rows.len(), path.display());
    Ok(())
}

fn write_parquet(dir: &Path, file: &str, name: &str, rows: &[(NaiveDate, Option<f64>)]) -> Result<()> {
    let path = dir.join(file);
    let days: Vec<i32> = rows
        .iter()
        .map(|(t, _)| t.num_days_from_ce() - 719_163)
        .collect();
    let values: Vec<Option<f64>> = rows.iter().map(|(_, v)| v.map(round2)).collect();

    let schema = Arc::new(Schema::new(vec![
        Field::new("time", DataType::Date32, false),
        Field::new(name, DataType::Float64, true),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Date32Array::from(days)),
            Arc::new(Float64Array::from(values)),
        ],
    )
    .context("building record batch")?;

    let out = std::fs::File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(out, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    println!("Wrote {} rows of {name} to {}", rows.len(), path.display());
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut rng = SimpleRng::new(args.seed);
    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating {}", args.out_dir.display()))?;

    // Monthly axis: Jan 1980 → Dec 2024
    let start = NaiveDate::from_ymd_opt(1980, 1, 1).context("start date")?;
    let months: Vec<NaiveDate> = (0..45 * 12)
        .filter_map(|i| start.checked_add_months(Months::new(i)))
        .collect();
    let n = months.len();

    // Shared ENSO driver with a ~4 year quasi-period.
    let enso = ar1(&mut rng, n, 0.9, 0.3, |t| {
        0.06 * (2.0 * std::f64::consts::PI * t as f64 / 48.0).sin()
    });

    let mut monthly: Vec<(&str, &str, Vec<f64>)> = Vec::new();
    for (file, name, scale, noise) in [
        ("nino12.txt", "NINO12", 1.3, 0.35),
        ("nino3.txt", "NINO3", 1.1, 0.2),
        ("nino34.txt", "NIN34", 1.0, 0.15),
        ("nino4.txt", "NINO4", 0.7, 0.15),
    ] {
        let values = enso.iter().map(|e| scale * e + rng.gauss(0.0, noise)).collect();
        monthly.push((file, name, values));
    }
    monthly.push(("soi.txt", "SOI", enso.iter().map(|e| -1.2 * e + rng.gauss(0.0, 0.5)).collect()));
    monthly.push(("nao.txt", "NAO", ar1(&mut rng, n, 0.2, 0.9, |_| 0.0)));
    monthly.push(("ao.txt", "AO", ar1(&mut rng, n, 0.3, 0.9, |_| 0.0)));
    let pdo_forcing: Vec<f64> = enso.iter().map(|e| 0.25 * e).collect();
    monthly.push(("pdo.txt", "PDO", ar1(&mut rng, n, 0.8, 0.4, |t| pdo_forcing[t])));
    monthly.push((
        "amo.txt",
        "AMO",
        ar1(&mut rng, n, 0.6, 0.06, |t| {
            0.08 * (2.0 * std::f64::consts::PI * t as f64 / (65.0 * 12.0)).sin()
        }),
    ));

    for (file, name, values) in &monthly {
        // The two most recent months are still provisional.
        let rows: Vec<(NaiveDate, Option<f64>)> = months
            .iter()
            .zip(values)
            .enumerate()
            .map(|(i, (t, v))| (*t, (i + 2 < n).then_some(*v)))
            .collect();
        write_tsv(&args.out_dir, file, name, &rows)?;
    }

    // ONI: 3-month running mean of Niño 3.4.
    let nin34 = &monthly
        .iter()
        .find(|(_, name, _)| *name == "NIN34")
        .context("NIN34 series")?
        .2;
    let oni: Vec<(NaiveDate, Option<f64>)> = (1..n - 1)
        .map(|i| (months[i], Some((nin34[i - 1] + nin34[i] + nin34[i + 1]) / 3.0)))
        .collect();
    if args.parquet {
        write_parquet(&args.out_dir, "oni.parquet", "ONI", &oni)?;
    } else {
        write_tsv(&args.out_dir, "oni.txt", "ONI", &oni)?;
    }

    // MJO amplitude: daily over the last two years.
    let day0 = NaiveDate::from_ymd_opt(2023, 1, 1).context("MJO start date")?;
    let days: Vec<NaiveDate> = day0.iter_days().take_while(|d| d.year() < 2025).collect();
    let mjo_raw = ar1(&mut rng, days.len(), 0.95, 0.25, |t| {
        0.05 * (2.0 * std::f64::consts::PI * t as f64 / 45.0).cos()
    });
    let mjo: Vec<(NaiveDate, Option<f64>)> = days
        .iter()
        .zip(mjo_raw)
        .map(|(d, v)| (*d, Some(v.abs())))
        .collect();
    write_tsv(&args.out_dir, "mjo.txt", "MJO", &mjo)?;

    Ok(())
}
