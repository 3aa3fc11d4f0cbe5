//! slipsynth: forward synthesis of waveforms and static offsets from
//! finite-fault rupture models.
//!
//! This is the main entry point for the slipsynth tool.

mod config;
mod driver;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lib_dsp::moment::{
    add_source_time_functions, moment_magnitude, rigidity, seismic_moment, subfault_rigidity,
    triangle_source_time_function, SourceTimeFunction,
};
use lib_dsp::rake::rake_degrees;
use lib_formats::{read_rupture, read_velocity_model};
use lib_types::structure::VelocityModel;
use lib_types::units::Kilometers;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "slipsynth")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

#[derive(Subcommand)]
enum Commands {
    /// Synthesize three-component waveforms at every station
    Waveforms {
        /// Path to the run configuration file
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Synthesize static offsets at every station
    Statics {
        /// Path to the run configuration file
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Parse a rupture file and summarize it
    InspectRupture {
        /// Path to the rupture file
        file: PathBuf,
    },

    /// Rigidity of a layered model at a depth
    Rigidity {
        /// Path to the velocity model file
        #[arg(short, long)]
        model: PathBuf,

        /// Depth in km
        #[arg(short, long)]
        depth: f64,
    },

    /// Scalar moment, magnitude and moment-rate function of a rupture
    Moment {
        /// Path to the rupture file
        #[arg(short, long)]
        rupture: PathBuf,

        /// Velocity model for subfaults without a rigidity column
        #[arg(short, long)]
        model: Option<PathBuf>,

        /// Write the summed moment-rate function here, in `--format`
        #[arg(long)]
        stf_out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match cli.command {
        Commands::Waveforms { config } => {
            run_synthesis(&config, cli.format, driver::run_waveforms)?;
        }
        Commands::Statics { config } => {
            run_synthesis(&config, cli.format, driver::run_statics)?;
        }
        Commands::InspectRupture { file } => {
            inspect_rupture(&file, cli.format)?;
        }
        Commands::Rigidity { model, depth } => {
            print_rigidity(&model, depth, cli.format)?;
        }
        Commands::Moment { rupture, model, stf_out } => {
            print_moment(&rupture, model.as_deref(), stf_out.as_deref(), cli.format)?;
        }
    }

    Ok(())
}

fn run_synthesis(
    config_path: &Path,
    format: OutputFormat,
    run: impl FnOnce(&config::SynthesisConfig) -> Result<driver::RunReport>,
) -> Result<()> {
    tracing::info!("Loading configuration from {:?}", config_path);
    let config = config::load_config(config_path)?;

    let report = run(&config)?;
    output::print_report(&report, format)?;

    tracing::info!(
        "{} complete: {} stations written, {} failed",
        report.mode,
        report.written(),
        report.failed()
    );
    Ok(())
}

fn inspect_rupture(file: &Path, format: OutputFormat) -> Result<()> {
    tracing::info!("Parsing rupture file: {:?}", file);
    let rupture = read_rupture(file).with_context(|| format!("Failed to read {:?}", file))?;

    let totals = rupture.aggregate_by_id();
    let max_slip = rupture.subfaults.iter().map(|sf| sf.slip().0).fold(0.0, f64::max);
    let last_onset = rupture.subfaults.iter().map(|sf| sf.rupture_time.0).fold(0.0, f64::max);
    let with_rigidity = rupture.subfaults.iter().filter(|sf| sf.rigidity.is_some()).count();
    let (min_rake, max_rake) = rupture
        .subfaults
        .iter()
        .filter(|sf| sf.slip().0 > 0.0)
        .map(|sf| rake_degrees(sf.strike_slip, sf.dip_slip).0)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), r| (lo.min(r), hi.max(r)));

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "rows": rupture.len(),
                "subfaults": totals.len(),
                "time_windows": rupture.len() / totals.len().max(1),
                "max_slip_m": max_slip,
                "last_onset_s": last_onset,
                "rows_with_rigidity": with_rigidity,
                "rake_range_deg": [min_rake, max_rake],
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Text | OutputFormat::Csv => {
            println!("Rupture: {}", file.display());
            println!("  Rows:          {}", rupture.len());
            println!("  Subfaults:     {}", totals.len());
            println!("  Time windows:  {}", rupture.len() / totals.len().max(1));
            println!("  Max slip:      {:.3} m", max_slip);
            println!("  Last onset:    {:.2} s", last_onset);
            println!("  Rigidity col:  {} rows", with_rigidity);
            if min_rake <= max_rake {
                println!("  Rake:          {:.1}° to {:.1}°", min_rake, max_rake);
            }
        }
    }

    Ok(())
}

fn load_model(path: &Path) -> Result<VelocityModel> {
    read_velocity_model(path).with_context(|| format!("Failed to read velocity model {:?}", path))
}

fn print_rigidity(model_path: &Path, depth: f64, format: OutputFormat) -> Result<()> {
    let model = load_model(model_path)?;
    let mu = rigidity(&model, Kilometers(depth));

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({ "depth_km": depth, "rigidity_pa": mu.0 });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Text | OutputFormat::Csv => {
            println!("Rigidity at {} km: {:.4e} Pa ({:.2} GPa)", depth, mu.0, mu.as_gpa());
        }
    }
    Ok(())
}

fn print_moment(
    rupture_path: &Path,
    model_path: Option<&Path>,
    stf_out: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let rupture = read_rupture(rupture_path)
        .with_context(|| format!("Failed to read {:?}", rupture_path))?;
    let model = model_path.map(load_model).transpose()?;

    let m0 = seismic_moment(&rupture, model.as_ref())?;
    let mw = moment_magnitude(m0);

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({ "moment_nm": m0.0, "mw": mw });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Text | OutputFormat::Csv => {
            println!("M0 = {:.4e} N·m", m0.0);
            println!("Mw = {:.2}", mw);
        }
    }

    if let Some(path) = stf_out {
        let stf = rupture_source_time_function(&rupture, model.as_ref())?;
        if let Some((t, peak)) = stf.peak() {
            tracing::info!("Peak moment rate {:.4e} N·m/s at {:.2} s", peak, t.0);
        }
        output::write_source_time_function(path, &stf, format)?;
    }

    Ok(())
}

/// Sum of every slipping row's triangular moment-rate function, each lasting
/// its rise time from its rupture onset.
fn rupture_source_time_function(
    rupture: &lib_types::fault::RuptureModel,
    model: Option<&VelocityModel>,
) -> Result<SourceTimeFunction> {
    let mut total: Option<SourceTimeFunction> = None;
    for sf in rupture.subfaults.iter().filter(|sf| sf.slip().0 > 0.0) {
        let mu = subfault_rigidity(sf, model)?;
        let stf = triangle_source_time_function(mu, sf.area(), sf.rise_time, sf.rupture_time, sf.slip())?;
        total = Some(match total {
            Some(acc) => add_source_time_functions(&acc, &stf)?,
            None => stf,
        });
    }
    total.context("Rupture has no slipping subfaults")
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_formats::parse_rupture;

    #[test]
    fn test_stf_spans_rise_time_column() {
        let rupture = parse_rupture(
            "1 0 0 10 0 30 0.5 8.0 1.0 0.0 1000 1000 2.0 3.0e10\n\
             2 0 0 10 0 30 0.5 8.0 0.0 0.0 1000 1000 9.0 3.0e10\n",
        )
        .unwrap();

        let stf = rupture_source_time_function(&rupture, None).unwrap();

        assert_eq!(stf.times[0], 2.0);
        assert!((stf.times[stf.len() - 1] - 10.0).abs() < 1e-12);
        let (t, _) = stf.peak().unwrap();
        assert!((t.0 - 6.0).abs() < 0.01);

        let expected = 3.0e10 * 1.0e6 * 1.0;
        assert!((stf.total_moment().0 - expected).abs() / expected < 1e-3);
    }

    #[test]
    fn test_stf_needs_slip() {
        let rupture = parse_rupture("1 0 0 10 0 30 0.5 8.0 0.0 0.0 1000 1000 0.0 3.0e10\n").unwrap();
        assert!(rupture_source_time_function(&rupture, None).is_err());
    }
}
