use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::ConfigError;
use crate::selection::{parse_selection, Selection};

/// Config file read when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "configs.cfg";

/// Number of functions in the CEC2013 niching benchmark.
pub const PROBLEM_COUNT: u32 = 20;

/// Largest count TOML can represent.
pub const MAX_COUNT: u64 = i64::MAX as u64;

/// Lineage experiment: load, override and print the run configuration.
#[derive(Debug, Parser)]
#[command(name = "lineage", version)]
#[command(about = "Load, override and print the configuration of a lineage experiment")]
pub struct Cli {
    /// Path to TOML configuration file [default: configs.cfg]
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write the resolved configuration to the config file and exit
    #[arg(long)]
    pub gen: bool,

    /// Print the resolved configuration and exit
    #[arg(long)]
    pub write: bool,

    /// RNG seed (negative lets the runner pick one)
    #[arg(long, value_name = "SEED", allow_negative_numbers = true)]
    pub seed: Option<i64>,

    /// Directory the experiment writes its data into
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<String>,

    /// Population size
    #[arg(long, value_name = "N")]
    pub pop_size: Option<usize>,

    /// Number of generations to run
    #[arg(long, value_name = "N")]
    pub generations: Option<u64>,

    /// Per-gene mutation probability
    #[arg(long, value_name = "PROB")]
    pub mut_rate: Option<f64>,

    /// Selection scheme: tournament, lexicase, sharing, roulette, random
    #[arg(long, value_name = "SCHEME")]
    pub selection: Option<String>,

    /// CEC2013 benchmark function (1-20)
    #[arg(long, value_name = "ID")]
    pub problem: Option<u32>,

    /// Override any setting, e.g. --set evolution.mut_std=0.5 (repeatable)
    #[arg(long = "set", value_name = "SECTION.KEY=VALUE")]
    pub sets: Vec<String>,
}

/// Whether [`LineageConfig::read`] found a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStatus {
    Loaded,
    Missing,
}

/// Full experiment configuration, one table per section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LineageConfig {
    pub general: GeneralConfig,
    pub evolution: EvolutionConfig,
    pub landscape: LandscapeConfig,
    pub systematics: SystematicsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneralConfig {
    pub seed: i64,
    pub output_dir: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            seed: -1,
            output_dir: "./data".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EvolutionConfig {
    pub pop_size: usize,
    pub generations: u64,
    pub mut_rate: f64,
    pub mut_std: f64,
    pub selection: Selection,
    pub tournament_size: usize,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            pop_size: 1000,
            generations: 1000,
            mut_rate: 0.05,
            mut_std: 1.0,
            selection: Selection::Tournament,
            tournament_size: 7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LandscapeConfig {
    pub problem: u32,
}

impl Default for LandscapeConfig {
    fn default() -> Self {
        Self { problem: 1 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SystematicsConfig {
    pub track_phylogeny: bool,
    pub prune_extinct: bool,
    pub record_interval: u64,
}

impl Default for SystematicsConfig {
    fn default() -> Self {
        Self {
            track_phylogeny: true,
            prune_extinct: true,
            record_interval: 100,
        }
    }
}

impl Default for LineageConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            evolution: EvolutionConfig::default(),
            landscape: LandscapeConfig::default(),
            systematics: SystematicsConfig::default(),
        }
    }
}

impl LineageConfig {
    /// Merge the TOML file at `path` over the current values.
    ///
    /// A missing file leaves the configuration untouched. Keys absent from
    /// the file keep their current values; unknown keys and mistyped values
    /// are rejected. Ranges are checked later, once overrides are applied.
    pub fn read(&mut self, path: &Path) -> Result<ReadStatus, ConfigError> {
        let contents = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "config file not found, keeping current settings");
                return Ok(ReadStatus::Missing);
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let overlay: toml::Value = toml::from_str(&contents)?;
        let mut tree = toml::Value::try_from(&*self)?;
        deep_merge(&mut tree, overlay);
        *self = tree.try_into()?;
        info!(path = %path.display(), "config file loaded");
        Ok(ReadStatus::Loaded)
    }

    /// Render every section as TOML, in schema order.
    pub fn write<W: Write + ?Sized>(&self, out: &mut W) -> Result<(), ConfigError> {
        let sections = [
            ("general", "Seed and output location.", toml::to_string(&self.general)?),
            ("evolution", "Population and variation.", toml::to_string(&self.evolution)?),
            ("landscape", "Fitness landscape under study.", toml::to_string(&self.landscape)?),
            ("systematics", "Phylogeny tracking.", toml::to_string(&self.systematics)?),
        ];

        for (i, (name, about, body)) in sections.iter().enumerate() {
            if i > 0 {
                writeln!(out).map_err(ConfigError::Write)?;
            }
            write!(out, "# {}\n[{}]\n{}", about, name, body).map_err(ConfigError::Write)?;
        }
        Ok(())
    }

    pub fn write_file(&self, path: &Path) -> Result<(), ConfigError> {
        let mut rendered = Vec::new();
        self.write(&mut rendered)?;
        fs::write(path, rendered).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "config file written");
        Ok(())
    }

    /// Set one `SECTION.KEY` from its command-line text.
    ///
    /// `raw` is read as a TOML value when it parses as one, otherwise as a
    /// bare string, so `tournament` and `"tournament"` are equivalent.
    /// String settings keep `raw` verbatim unless it is a quoted string.
    pub fn set(&mut self, key: &str, raw: &str) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownSetting(key.to_string());
        let (section, name) = key.split_once('.').ok_or_else(unknown)?;

        let mut tree = toml::Value::try_from(&*self)?;
        let slot = tree
            .get_mut(section)
            .and_then(|s| s.get_mut(name))
            .ok_or_else(unknown)?;
        let value = parse_value(raw);
        *slot = if slot.is_str() && !value.is_str() {
            toml::Value::String(raw.to_string())
        } else {
            value
        };

        *self = tree
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::InvalidOverride {
                key: key.to_string(),
                reason: e.to_string().trim().to_string(),
            })?;
        debug!(key, value = raw, "setting overridden");
        Ok(())
    }

    /// Apply CLI overrides: typed flags first, then each `--set` in order.
    pub fn apply_overrides(&mut self, cli: &Cli) -> Result<(), ConfigError> {
        if let Some(v) = cli.seed {
            self.general.seed = v;
        }
        if let Some(ref d) = cli.output_dir {
            self.general.output_dir = d.clone();
        }
        if let Some(v) = cli.pop_size {
            self.evolution.pop_size = v;
        }
        if let Some(v) = cli.generations {
            self.evolution.generations = v;
        }
        if let Some(v) = cli.mut_rate {
            self.evolution.mut_rate = v;
        }
        if let Some(ref s) = cli.selection {
            self.evolution.selection = parse_selection(s)?;
        }
        if let Some(v) = cli.problem {
            self.landscape.problem = v;
        }

        for entry in &cli.sets {
            let (key, raw) = entry
                .split_once('=')
                .ok_or_else(|| ConfigError::InvalidOverride {
                    key: entry.clone(),
                    reason: "expected SECTION.KEY=VALUE".to_string(),
                })?;
            self.set(key.trim(), raw.trim())?;
        }

        self.validate()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.general.output_dir.trim().is_empty() {
            return Err(invalid("general.output_dir", "must not be empty"));
        }

        let evo = &self.evolution;
        check_count("evolution.pop_size", evo.pop_size as u64)?;
        check_count("evolution.generations", evo.generations)?;
        if !(0.0..=1.0).contains(&evo.mut_rate) {
            return Err(invalid(
                "evolution.mut_rate",
                format!("must be within [0, 1], got {}", evo.mut_rate),
            ));
        }
        if !evo.mut_std.is_finite() || evo.mut_std < 0.0 {
            return Err(invalid(
                "evolution.mut_std",
                format!("must be a finite non-negative number, got {}", evo.mut_std),
            ));
        }
        if evo.selection.uses_tournament_size()
            && (evo.tournament_size == 0 || evo.tournament_size > evo.pop_size)
        {
            return Err(invalid(
                "evolution.tournament_size",
                format!(
                    "must be within 1..={} for {} selection, got {}",
                    evo.pop_size, evo.selection, evo.tournament_size
                ),
            ));
        }

        if !(1..=PROBLEM_COUNT).contains(&self.landscape.problem) {
            return Err(invalid(
                "landscape.problem",
                format!(
                    "must be within 1..={}, got {}",
                    PROBLEM_COUNT, self.landscape.problem
                ),
            ));
        }

        check_count("systematics.record_interval", self.systematics.record_interval)
    }
}

fn invalid(key: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn check_count(key: &str, value: u64) -> Result<(), ConfigError> {
    if value == 0 || value > MAX_COUNT {
        return Err(invalid(
            key,
            format!("must be within 1..={}, got {}", MAX_COUNT, value),
        ));
    }
    Ok(())
}

fn parse_value(raw: &str) -> toml::Value {
    toml::from_str::<toml::Table>(&format!("value = {}", raw))
        .ok()
        .and_then(|mut t| t.remove("value"))
        .unwrap_or_else(|| toml::Value::String(raw.to_string()))
}

// Tables merge key by key; anything else is replaced by the overlay.
fn deep_merge(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(slot) => deep_merge(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}
