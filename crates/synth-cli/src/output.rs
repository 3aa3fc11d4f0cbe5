//! Result files and run summaries.

use crate::driver::{RunReport, StationError, StationStatus};
use crate::OutputFormat;
use anyhow::{Context, Result};
use lib_dsp::moment::SourceTimeFunction;
use lib_formats::neu::write_neu;
use lib_formats::sac::encode_sac;
use lib_formats::ParseError;
use lib_types::fault::{Quantity, StaticOffset, ThreeComponent};
use lib_types::timeseries::TimeSeries;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Write one station's three traces as `<run>.<sta>.<vel|disp>.<e|n|u>`.
///
/// All three records are encoded before any file is touched, and files
/// already written are removed again if a later one fails.
pub fn write_waveforms(
    dir: &Path,
    run_name: &str,
    quantity: Quantity,
    station: &str,
    traces: &ThreeComponent<TimeSeries>,
) -> Result<Vec<PathBuf>, StationError> {
    let encoded: Vec<(PathBuf, Vec<u8>)> = traces
        .iter()
        .map(|(component, trace)| {
            let name = format!(
                "{}.{}.{}.{}",
                run_name,
                station,
                quantity.tag(),
                component.output_suffix()
            );
            (dir.join(name), encode_sac(trace))
        })
        .collect();

    let mut written = Vec::with_capacity(encoded.len());
    for (path, bytes) in encoded {
        if let Err(err) = std::fs::write(&path, bytes) {
            for done in &written {
                let _ = std::fs::remove_file(done);
            }
            return Err(StationError::Output {
                path,
                source: ParseError::Io(err),
            });
        }
        written.push(path);
    }

    tracing::debug!("Wrote {} traces for {}", written.len(), station);
    Ok(written)
}

/// Write a station's static offset as `<sta>.static.neu`.
pub fn write_static(dir: &Path, station: &str, offset: &StaticOffset) -> Result<PathBuf, StationError> {
    let path = dir.join(format!("{}.static.neu", station));
    write_neu(&path, offset).map_err(|source| StationError::Output {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// Append the run log to `logs/waveforms.<Mon-DD-HHMM>.log` in one write.
pub fn append_run_log(log_dir: &Path, lines: &[String]) -> Result<PathBuf> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory {:?}", log_dir))?;

    let stamp = chrono::Local::now().format("%b-%d-%H%M");
    let path = log_dir.join(format!("waveforms.{}.log", stamp));

    let mut body = String::with_capacity(lines.iter().map(|l| l.len() + 1).sum());
    for line in lines {
        body.push_str(line);
        body.push('\n');
    }

    let mut f = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open run log {:?}", path))?;
    f.write_all(body.as_bytes())
        .with_context(|| format!("Failed to write run log {:?}", path))?;

    tracing::info!("Wrote {} log lines to {:?}", lines.len(), path);
    Ok(path)
}

/// Write a moment-rate function as a two-column table in the requested format.
pub fn write_source_time_function(path: &Path, stf: &SourceTimeFunction, format: OutputFormat) -> Result<()> {
    let mut f = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {:?}", path))?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "times": stf.times.to_vec(),
                "moment_rate": stf.rate.to_vec(),
            });
            writeln!(f, "{}", serde_json::to_string_pretty(&json)?)?;
        }
        OutputFormat::Csv => {
            writeln!(f, "time_s,moment_rate_nm_per_s")?;
            for (t, r) in stf.times.iter().zip(stf.rate.iter()) {
                writeln!(f, "{},{}", t, r)?;
            }
        }
        OutputFormat::Text => {
            for (t, r) in stf.times.iter().zip(stf.rate.iter()) {
                writeln!(f, "{:.6}\t{:.6e}", t, r)?;
            }
        }
    }

    tracing::info!("Wrote source time function to {:?}", path);
    Ok(())
}

/// Print a run summary to stdout.
pub fn print_report(report: &RunReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        OutputFormat::Csv => {
            println!("index,station,status,detail");
            for s in &report.stations {
                match &s.status {
                    StationStatus::Written { files, .. } => {
                        println!("{},{},written,{}", s.index, s.station, files.len());
                    }
                    StationStatus::Failed { kind, .. } => {
                        println!("{},{},failed,{}", s.index, s.station, kind);
                    }
                }
            }
        }
        OutputFormat::Text => {
            println!("\n=== {} ({}) ===\n", report.name, report.mode);
            println!("Subfaults: {}", report.subfaults);
            println!("Stations:  {} written, {} failed", report.written(), report.failed());

            for s in &report.stations {
                if let StationStatus::Failed { message, .. } = &s.status {
                    println!("  {} [{}]: {}", s.station, s.index, message);
                }
            }

            if let Some(log) = &report.log_file {
                println!("\nRun log: {}", log.display());
            }
            println!();
        }
    }
    Ok(())
}
