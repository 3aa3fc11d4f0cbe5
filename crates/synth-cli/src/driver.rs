//! Per-station synthesis.
//!
//! Each station owns its accumulator and folds every subfault of the rupture
//! into it in catalog order. Stations share nothing mutable and run in
//! parallel; any failure abandons the whole station without writing it.

use crate::config::SynthesisConfig;
use crate::output;
use anyhow::{Context, Result};
use lib_dsp::alignment::delay_and_align;
use lib_dsp::rake::{is_zero_slip, rotate_slip};
use lib_dsp::resample::{resample, ResampleConfig};
use lib_dsp::superposition::{combine, PadPolicy};
use lib_dsp::{DspError, FftEngine};
use lib_formats::greens::{GreensFunctionLibrary, GreensFunctionSource, UnitResponses};
use lib_formats::{read_rupture, read_stations, ParseError};
use lib_types::fault::{AggregatedSlip, Quantity, RuptureModel, StaticOffset, Station, Subfault, ThreeComponent};
use lib_types::timeseries::TimeSeries;
use lib_types::units::{Degrees, Seconds};
use rayon::prelude::*;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Why a station was abandoned.
#[derive(Debug, Error)]
pub enum StationError {
    /// A unit response the station needs is not in the store.
    #[error("missing Green's function {}", path.display())]
    MissingGreensFunction { path: PathBuf },

    /// Two empty series met in a superposition, or nothing was accumulated.
    #[error("nothing to combine: both operands are empty")]
    EmptyOperand,

    /// Series with different sample intervals met in a superposition.
    #[error("sample interval mismatch: {}s vs {}s", left.0, right.0)]
    ShapeMismatch { left: Seconds, right: Seconds },

    /// A Green's function file could not be read or decoded.
    #[error("input error: {0}")]
    Input(#[source] ParseError),

    /// Resampling or another signal operation failed.
    #[error("signal error: {0}")]
    Signal(#[source] DspError),

    /// Writing the station's results failed.
    #[error("failed to write {}: {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
}

impl From<ParseError> for StationError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::MissingGreensFunction { path } => Self::MissingGreensFunction { path },
            other => Self::Input(other),
        }
    }
}

impl From<DspError> for StationError {
    fn from(err: DspError) -> Self {
        match err {
            DspError::EmptyOperands => Self::EmptyOperand,
            DspError::ShapeMismatch { left, right } => Self::ShapeMismatch { left, right },
            other => Self::Signal(other),
        }
    }
}

/// What the waveform driver needs from the run configuration.
#[derive(Clone, Debug)]
pub struct WaveformSettings {
    pub quantity: Quantity,

    /// Output interval; native Green's function interval when `None`.
    pub target_dt: Option<Seconds>,

    /// Rake-frame rotation applied to every subfault's slip.
    pub rotation: Option<Degrees>,

    pub padding: PadPolicy,
    pub resample: ResampleConfig,
}

impl Default for WaveformSettings {
    fn default() -> Self {
        Self {
            quantity: Quantity::default(),
            target_dt: None,
            rotation: None,
            padding: PadPolicy::default(),
            resample: ResampleConfig::default(),
        }
    }
}

impl WaveformSettings {
    pub fn from_config(config: &SynthesisConfig) -> Self {
        Self {
            quantity: config.quantity,
            target_dt: config.target_dt(),
            rotation: config.rotation(),
            padding: config.pad_policy(),
            resample: config.resample_config(),
        }
    }
}

/// Synthesized traces of one station plus its run-log lines.
#[derive(Clone, Debug)]
pub struct StationOutput {
    pub traces: ThreeComponent<TimeSeries>,

    /// One line per subfault: applied slip or a zero-slip notice.
    pub log: Vec<String>,

    pub applied: usize,
    pub skipped: usize,
}

/// Dynamic synthesis against a Green's function source.
pub struct WaveformDriver<'a, G: GreensFunctionSource> {
    greens: &'a G,
    settings: WaveformSettings,
}

impl<'a, G: GreensFunctionSource> WaveformDriver<'a, G> {
    pub fn new(greens: &'a G, settings: WaveformSettings) -> Self {
        Self { greens, settings }
    }

    pub fn settings(&self) -> &WaveformSettings {
        &self.settings
    }

    /// Fold every subfault of `rupture` into three traces for `station`.
    pub fn synthesize_station(
        &self,
        station: &Station,
        rupture: &RuptureModel,
    ) -> Result<StationOutput, StationError> {
        let mut log = Vec::with_capacity(rupture.len());
        let mut engine = FftEngine::new();
        let (mut applied, mut skipped) = (0usize, 0usize);

        let empty = ThreeComponent::from_fn(|_| TimeSeries::empty(Seconds::ZERO));
        let total = rupture
            .subfaults
            .iter()
            .enumerate()
            .try_fold(empty, |acc, (k, subfault)| {
                if k % 100 == 0 {
                    tracing::debug!(
                        "{}: working on subfault {} of {}",
                        station.code,
                        k,
                        rupture.len()
                    );
                }
                let (acc, used) = self.fold_subfault(acc, station, subfault, &mut engine, &mut log)?;
                if used {
                    applied += 1;
                } else {
                    skipped += 1;
                }
                Ok::<_, StationError>(acc)
            })?;

        if total.east.is_empty() {
            return Err(StationError::EmptyOperand);
        }

        let traces = ThreeComponent::from_fn(|component| {
            let mut trace = total.get(component).clone();
            trace.stats.station = station.code.clone();
            trace.stats.component = component.output_suffix().to_string();
            trace
        });

        Ok(StationOutput {
            traces,
            log,
            applied,
            skipped,
        })
    }

    /// One step of the accumulation. Returns the new accumulator and whether
    /// the subfault contributed.
    fn fold_subfault(
        &self,
        acc: ThreeComponent<TimeSeries>,
        station: &Station,
        subfault: &Subfault,
        engine: &mut FftEngine,
        log: &mut Vec<String>,
    ) -> Result<(ThreeComponent<TimeSeries>, bool), StationError> {
        let (mut ss, mut ds) = (subfault.strike_slip, subfault.dip_slip);
        if let Some(beta) = self.settings.rotation {
            (ss, ds) = rotate_slip(ss, ds, beta);
        }

        let mut responses = self.greens.unit_responses(station, subfault)?;

        if let Some(target) = self.settings.target_dt {
            let config = &self.settings.resample;
            responses = responses.try_map(|series| resample(&series, target, config, engine))?;
        }

        responses.for_each_mut(|series| delay_and_align(series, subfault.rupture_time));

        let tag = subfault.tag();
        if is_zero_slip(ss, ds) {
            log.push(format!("No slip on subfault {}, ignoring it...", tag));
            return Ok((acc, false));
        }
        log.push(format!("{}, SS={:?}, DS={:?}", tag, ss.0, ds.0));

        let pad = &self.settings.padding;
        let UnitResponses { strike_slip, dip_slip } = responses;
        let subfault_total =
            strike_slip.try_zip_with(dip_slip, |s, d| combine(&s, &d, ss.0, ds.0, pad))?;
        let acc = acc.try_zip_with(subfault_total, |a, t| combine(&a, &t, 1.0, 1.0, pad))?;

        Ok((acc, true))
    }
}

/// Static synthesis against a Green's function source.
pub struct StaticDriver<'a, G: GreensFunctionSource> {
    greens: &'a G,
}

impl<'a, G: GreensFunctionSource> StaticDriver<'a, G> {
    pub fn new(greens: &'a G) -> Self {
        Self { greens }
    }

    /// `Σ ds·DS + ss·SS` over the per-id slip totals.
    pub fn synthesize_station(
        &self,
        station: &Station,
        totals: &[AggregatedSlip],
    ) -> Result<StaticOffset, StationError> {
        totals.iter().try_fold(StaticOffset::default(), |acc, slip| {
            let unit = self.greens.static_offsets(station, slip.id)?;
            Ok(acc
                .add_scaled(&unit.dip_slip, slip.dip_slip.0)
                .add_scaled(&unit.strike_slip, slip.strike_slip.0))
        })
    }
}

/// Outcome of one station in a run.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StationStatus {
    Written {
        files: Vec<PathBuf>,
        applied: usize,
        skipped: usize,
    },
    Failed {
        kind: &'static str,
        message: String,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct StationReport {
    pub index: usize,
    pub station: String,
    #[serde(flatten)]
    pub status: StationStatus,
}

/// Summary of a whole run.
#[derive(Clone, Debug, Serialize)]
pub struct RunReport {
    pub name: String,
    pub mode: &'static str,
    pub subfaults: usize,
    pub stations: Vec<StationReport>,
    pub log_file: Option<PathBuf>,
}

impl RunReport {
    pub fn written(&self) -> usize {
        self.stations
            .iter()
            .filter(|s| matches!(s.status, StationStatus::Written { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.stations.len() - self.written()
    }
}

impl StationError {
    /// Short name of the failure class for reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingGreensFunction { .. } => "missing_greens_function",
            Self::EmptyOperand => "empty_operand",
            Self::ShapeMismatch { .. } => "shape_mismatch",
            Self::Input(_) => "input",
            Self::Signal(_) => "signal",
            Self::Output { .. } => "output",
        }
    }
}

fn build_pool(workers: Option<usize>) -> Result<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(workers.unwrap_or(0))
        .build()
        .context("Failed to create rayon thread pool")
}

fn load_inputs(config: &SynthesisConfig) -> Result<(RuptureModel, Vec<Station>)> {
    let rupture_path = config.rupture_path();
    let rupture = read_rupture(&rupture_path)
        .with_context(|| format!("Failed to read rupture model {:?}", rupture_path))?;
    let stations_path = config.stations_path();
    let stations = read_stations(&stations_path)
        .with_context(|| format!("Failed to read station list {:?}", stations_path))?;
    Ok((rupture, stations))
}

fn failed(index: usize, station: &Station, err: StationError) -> StationReport {
    tracing::error!("Station {} abandoned: {}", station.code, err);
    StationReport {
        index,
        station: station.code.clone(),
        status: StationStatus::Failed {
            kind: err.kind(),
            message: err.to_string(),
        },
    }
}

/// Dynamic run over the project's Green's function store.
pub fn run_waveforms(config: &SynthesisConfig) -> Result<RunReport> {
    let library = GreensFunctionLibrary::new(
        &config.project_dir,
        &config.model_name,
        config.greens,
        config.quantity,
    );
    run_waveforms_with(config, &library)
}

/// Dynamic run against any Green's function source.
pub fn run_waveforms_with<G: GreensFunctionSource>(config: &SynthesisConfig, greens: &G) -> Result<RunReport> {
    let (rupture, stations) = load_inputs(config)?;
    let driver = WaveformDriver::new(greens, WaveformSettings::from_config(config));
    let out_dir = config.output_dir();
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create output directory {:?}", out_dir))?;

    if config.start_station >= stations.len() {
        tracing::warn!(
            "start_station {} is past the last of {} stations; nothing to do",
            config.start_station,
            stations.len()
        );
    }

    tracing::info!(
        "Solving for dynamic problem: {} subfault rows, {} stations",
        rupture.len(),
        stations.len()
    );

    let pool = build_pool(config.workers)?;
    let total = stations.len();
    let results: Vec<(StationReport, Vec<String>)> = pool.install(|| {
        stations
            .par_iter()
            .enumerate()
            .skip(config.start_station)
            .map(|(index, station)| {
                tracing::info!("Working on station {} ({}/{})", station.code, index + 1, total);
                let outcome = driver.synthesize_station(station, &rupture).and_then(|synth| {
                    let files = output::write_waveforms(
                        &out_dir,
                        &config.run_name,
                        config.quantity,
                        &station.code,
                        &synth.traces,
                    )?;
                    Ok((files, synth))
                });
                match outcome {
                    Ok((files, synth)) => (
                        StationReport {
                            index,
                            station: station.code.clone(),
                            status: StationStatus::Written {
                                files,
                                applied: synth.applied,
                                skipped: synth.skipped,
                            },
                        },
                        synth.log,
                    ),
                    Err(err) => (failed(index, station, err), Vec::new()),
                }
            })
            .collect()
    });

    let (reports, logs): (Vec<_>, Vec<_>) = results.into_iter().unzip();
    let lines: Vec<String> = logs.into_iter().flatten().collect();
    let log_file = output::append_run_log(&config.log_dir(), &lines)?;

    Ok(RunReport {
        name: config.name.clone(),
        mode: "waveforms",
        subfaults: rupture.len(),
        stations: reports,
        log_file: Some(log_file),
    })
}

/// Static run over the project's Green's function store.
pub fn run_statics(config: &SynthesisConfig) -> Result<RunReport> {
    let library = GreensFunctionLibrary::new(
        &config.project_dir,
        &config.model_name,
        config.greens,
        config.quantity,
    );
    run_statics_with(config, &library)
}

/// Static run against any Green's function source.
pub fn run_statics_with<G: GreensFunctionSource>(config: &SynthesisConfig, greens: &G) -> Result<RunReport> {
    let (rupture, stations) = load_inputs(config)?;
    let totals = rupture.aggregate_by_id();
    let driver = StaticDriver::new(greens);
    let out_dir = config.output_dir();
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create output directory {:?}", out_dir))?;

    tracing::info!(
        "Solving for static problem: {} unique subfaults, {} stations",
        totals.len(),
        stations.len()
    );

    let pool = build_pool(config.workers)?;
    let total = stations.len();
    let reports: Vec<StationReport> = pool.install(|| {
        stations
            .par_iter()
            .enumerate()
            .skip(config.start_station)
            .map(|(index, station)| {
                tracing::info!("Working on station {} ({}/{})", station.code, index + 1, total);
                let outcome = driver
                    .synthesize_station(station, &totals)
                    .and_then(|offset| output::write_static(&out_dir, &station.code, &offset));
                match outcome {
                    Ok(file) => StationReport {
                        index,
                        station: station.code.clone(),
                        status: StationStatus::Written {
                            files: vec![file],
                            applied: totals.len(),
                            skipped: 0,
                        },
                    },
                    Err(err) => failed(index, station, err),
                }
            })
            .collect()
    });

    Ok(RunReport {
        name: config.name.clone(),
        mode: "statics",
        subfaults: totals.len(),
        stations: reports,
        log_file: None,
    })
}
