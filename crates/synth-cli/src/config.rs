//! Run configuration loading and validation.

use anyhow::{Context, Result};
use lib_dsp::resample::ResampleConfig;
use lib_dsp::superposition::PadPolicy;
use lib_dsp::window::WindowType;
use lib_formats::greens::GreensKind;
use lib_types::fault::Quantity;
use lib_types::units::{Degrees, Hertz, Seconds};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level synthesis configuration.
///
/// Relative `rupture` and `stations` paths are looked up in the project's
/// `forward_models/` and `data/station_info/` directories.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Run name/description.
    pub name: String,

    /// Project root holding `GFs/`, `forward_models/`, `output/` and `logs/`.
    pub project_dir: PathBuf,

    /// Rupture model file.
    pub rupture: PathBuf,

    /// Station list file.
    pub stations: PathBuf,

    /// Velocity model name used in Green's function directory names.
    pub model_name: String,

    /// Prefix of output waveform files.
    pub run_name: String,

    /// Velocity or displacement Green's functions and outputs.
    #[serde(default)]
    pub quantity: Quantity,

    /// Output sample rate in Hz; native Green's function rate when unset.
    #[serde(default)]
    pub resample_rate: Option<f64>,

    /// Rotate (strike-slip, dip-slip) by this angle before use.
    #[serde(default)]
    pub rotation_deg: Option<f64>,

    /// Index of the first station to process (resume a partial run).
    #[serde(default)]
    pub start_station: usize,

    /// Onshore or tsunami Green's functions.
    #[serde(default)]
    pub greens: GreensKind,

    /// Tail padding of superposed traces.
    #[serde(default)]
    pub padding: PaddingConfig,

    /// Anti-alias roll-off used when decimating.
    #[serde(default)]
    pub resample_window: ResampleWindow,

    /// Station worker threads; all cores when unset.
    #[serde(default)]
    pub workers: Option<usize>,
}

/// Tail padding windows, in samples.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct PaddingConfig {
    /// Samples averaged to pad the running total (strike-slip side of a pair).
    #[serde(default = "default_lead_tail_window")]
    pub lead_tail_window: usize,

    /// Samples averaged to pad the added trace (dip-slip side of a pair).
    #[serde(default = "default_trail_tail_window")]
    pub trail_tail_window: usize,
}

fn default_lead_tail_window() -> usize { 60 }
fn default_trail_tail_window() -> usize { 20 }

impl Default for PaddingConfig {
    fn default() -> Self {
        Self {
            lead_tail_window: default_lead_tail_window(),
            trail_tail_window: default_trail_tail_window(),
        }
    }
}

impl From<PaddingConfig> for PadPolicy {
    fn from(padding: PaddingConfig) -> Self {
        PadPolicy {
            lead_tail_window: padding.lead_tail_window,
            trail_tail_window: padding.trail_tail_window,
        }
    }
}

/// Decimation window selection.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResampleWindow {
    Rectangular,
    #[default]
    Hann,
    Hamming,
    Blackman,
    Kaiser { beta: f64 },
}

impl From<ResampleWindow> for WindowType {
    fn from(window: ResampleWindow) -> Self {
        match window {
            ResampleWindow::Rectangular => WindowType::Rectangular,
            ResampleWindow::Hann => WindowType::Hann,
            ResampleWindow::Hamming => WindowType::Hamming,
            ResampleWindow::Blackman => WindowType::Blackman,
            ResampleWindow::Kaiser { beta } => WindowType::Kaiser { beta },
        }
    }
}

impl SynthesisConfig {
    pub fn rupture_path(&self) -> PathBuf {
        resolve(&self.project_dir.join("forward_models"), &self.rupture)
    }

    pub fn stations_path(&self) -> PathBuf {
        resolve(&self.project_dir.join("data").join("station_info"), &self.stations)
    }

    /// Where synthesized waveforms and static offsets are written.
    pub fn output_dir(&self) -> PathBuf {
        self.project_dir.join("output").join("forward_models")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.project_dir.join("logs")
    }

    /// Output interval, if resampling was requested.
    pub fn target_dt(&self) -> Option<Seconds> {
        self.resample_rate.map(|rate| Hertz(rate).to_period())
    }

    pub fn rotation(&self) -> Option<Degrees> {
        self.rotation_deg.map(Degrees)
    }

    pub fn pad_policy(&self) -> PadPolicy {
        self.padding.into()
    }

    pub fn resample_config(&self) -> ResampleConfig {
        ResampleConfig {
            window: self.resample_window.into(),
            ..ResampleConfig::default()
        }
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Load configuration from a file.
pub fn load_config(path: &Path) -> Result<SynthesisConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: SynthesisConfig = if path.extension().map_or(false, |e| e == "json") {
        serde_json::from_str(&content)
            .with_context(|| "Failed to parse config as JSON")?
    } else {
        toml::from_str(&content)
            .with_context(|| "Failed to parse config as TOML")?
    };

    validate_config(&config)?;

    Ok(config)
}

/// Validate configuration.
pub fn validate_config(config: &SynthesisConfig) -> Result<()> {
    let rupture = config.rupture_path();
    if !rupture.exists() {
        anyhow::bail!("Rupture file not found: {:?}", rupture);
    }

    let stations = config.stations_path();
    if !stations.exists() {
        anyhow::bail!("Station file not found: {:?}", stations);
    }

    if config.run_name.trim().is_empty() {
        anyhow::bail!("run_name must not be empty");
    }

    if config.model_name.trim().is_empty() {
        anyhow::bail!("model_name must not be empty");
    }

    if let Some(rate) = config.resample_rate {
        if !(rate > 0.0 && rate.is_finite()) {
            anyhow::bail!("resample_rate must be a positive number of Hz (got {})", rate);
        }
    }

    if config.padding.lead_tail_window == 0 || config.padding.trail_tail_window == 0 {
        anyhow::bail!(
            "Tail padding windows must be at least one sample (got lead={}, trail={})",
            config.padding.lead_tail_window,
            config.padding.trail_tail_window
        );
    }

    if config.workers == Some(0) {
        anyhow::bail!("workers must be at least 1");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("forward_models")).unwrap();
        std::fs::create_dir_all(dir.path().join("data/station_info")).unwrap();
        std::fs::write(dir.path().join("forward_models/maule.rupt"), "").unwrap();
        std::fs::write(dir.path().join("data/station_info/gps.sta"), "").unwrap();
        dir
    }

    fn minimal_toml(project_dir: &Path) -> String {
        format!(
            r#"
name = "maule forward"
project_dir = "{}"
rupture = "maule.rupt"
stations = "gps.sta"
model_name = "maule"
run_name = "run01"
"#,
            project_dir.display()
        )
    }

    #[test]
    fn test_defaults() {
        let dir = project();
        let config: SynthesisConfig = toml::from_str(&minimal_toml(dir.path())).unwrap();

        assert_eq!(config.quantity, Quantity::Velocity);
        assert_eq!(config.greens, GreensKind::Onshore);
        assert_eq!(config.start_station, 0);
        assert!(config.resample_rate.is_none());
        assert!(config.rotation().is_none());
        assert_eq!(config.pad_policy(), PadPolicy::default());
        assert_eq!(config.resample_config().window, WindowType::Hann);
        assert_eq!(config.rupture_path(), dir.path().join("forward_models/maule.rupt"));
        assert_eq!(config.output_dir(), dir.path().join("output/forward_models"));
        validate_config(&config).unwrap();
    }

    #[test]
    fn test_full_toml() {
        let dir = project();
        let content = format!(
            "{}quantity = \"displacement\"\nresample_rate = 2.0\nrotation_deg = 15.0\n\
             start_station = 3\ngreens = \"tsunami\"\nworkers = 4\n\
             resample_window = {{ kaiser = {{ beta = 6.0 }} }}\n\
             [padding]\nlead_tail_window = 10\n",
            minimal_toml(dir.path())
        );
        let config: SynthesisConfig = toml::from_str(&content).unwrap();

        assert_eq!(config.quantity, Quantity::Displacement);
        assert_eq!(config.greens, GreensKind::Tsunami);
        assert_eq!(config.target_dt(), Some(Seconds(0.5)));
        assert_eq!(config.rotation(), Some(Degrees(15.0)));
        assert_eq!(config.padding.lead_tail_window, 10);
        assert_eq!(config.padding.trail_tail_window, 20);
        assert_eq!(config.resample_config().window, WindowType::Kaiser { beta: 6.0 });
    }

    #[test]
    fn test_load_json() {
        let dir = project();
        let path = dir.path().join("run.json");
        let json = serde_json::json!({
            "name": "json run",
            "project_dir": dir.path(),
            "rupture": "maule.rupt",
            "stations": "gps.sta",
            "model_name": "maule",
            "run_name": "run02",
            "resample_window": "blackman",
        });
        std::fs::write(&path, json.to_string()).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.run_name, "run02");
        assert_eq!(config.resample_config().window, WindowType::Blackman);
    }

    #[test]
    fn test_validation_failures() {
        let dir = project();
        let base: SynthesisConfig = toml::from_str(&minimal_toml(dir.path())).unwrap();

        let mut missing = base.clone();
        missing.rupture = PathBuf::from("nope.rupt");
        assert!(validate_config(&missing).is_err());

        let mut bad_rate = base.clone();
        bad_rate.resample_rate = Some(0.0);
        assert!(validate_config(&bad_rate).is_err());

        let mut bad_padding = base.clone();
        bad_padding.padding.trail_tail_window = 0;
        assert!(validate_config(&bad_padding).is_err());

        let mut no_workers = base;
        no_workers.workers = Some(0);
        assert!(validate_config(&no_workers).is_err());
    }
}
