use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::args::{ArgManager, ArgumentList, ConfigFlow};
use crate::config::LineageConfig;
use crate::error::BootstrapError;
use crate::runner::Runnable;

pub const BANNER_RULE: &str = "==============================";
pub const BANNER_TITLE: &str = "|    How am I configured?    |";

/// Why the bootstrap ended before printing the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    Help,
    Version,
    ConfigWritten,
    ConfigGenerated(PathBuf),
    InvalidConfig,
    UnknownArguments,
}

impl StopReason {
    /// Every stop is a clean exit.
    pub fn exit_code(&self) -> i32 {
        0
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Help => write!(f, "help requested"),
            StopReason::Version => write!(f, "version requested"),
            StopReason::ConfigWritten => write!(f, "configuration printed"),
            StopReason::ConfigGenerated(path) => {
                write!(f, "configuration written to {}", path.display())
            }
            StopReason::InvalidConfig => write!(f, "configuration rejected"),
            StopReason::UnknownArguments => write!(f, "unknown arguments"),
        }
    }
}

#[derive(Debug)]
pub enum Outcome {
    /// The configuration was printed (and run, when a runner was given).
    Completed(LineageConfig),
    Stopped(StopReason),
}

impl Outcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Completed(_) => 0,
            Outcome::Stopped(reason) => reason.exit_code(),
        }
    }
}

/// Startup sequence: load the config file, process arguments, print the
/// resolved configuration and hand it to an optional runner.
#[derive(Debug, Clone)]
pub struct Bootstrap {
    config_path: PathBuf,
}

impl Bootstrap {
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn run<W, E>(
        &self,
        args: &ArgumentList,
        out: &mut W,
        err: &mut E,
        runner: Option<&mut dyn Runnable>,
    ) -> Result<Outcome, BootstrapError>
    where
        W: Write + ?Sized,
        E: Write + ?Sized,
    {
        let manager = ArgManager::new(args);
        let config_path = manager.config_path().unwrap_or(self.config_path.as_path());

        let mut config = LineageConfig::default();
        if let Err(e) = config.read(config_path) {
            // Help, version and unknown arguments stop before the config is used.
            if !manager.stops_early() {
                return Err(e.into());
            }
            warn!(path = %config_path.display(), error = %e, "ignoring unreadable config file");
        }

        if let ConfigFlow::Stop(reason) =
            manager.process_config_options(&mut config, out, err, config_path)?
        {
            info!(%reason, "stopping before run");
            return Ok(Outcome::Stopped(reason));
        }
        if !manager.test_unknown(err)? {
            info!(reason = %StopReason::UnknownArguments, "stopping before run");
            return Ok(Outcome::Stopped(StopReason::UnknownArguments));
        }

        print_configuration(&config, out)?;

        if let Some(runner) = runner {
            info!("starting experiment run");
            runner.run(&config).map_err(BootstrapError::Run)?;
            info!("experiment run finished");
        }

        Ok(Outcome::Completed(config))
    }
}

/// Print `config` between the configuration banners.
///
/// Nothing reaches `out` if the configuration cannot be rendered.
pub fn print_configuration<W: Write + ?Sized>(
    config: &LineageConfig,
    out: &mut W,
) -> Result<(), BootstrapError> {
    let mut dump = Vec::new();
    config.write(&mut dump)?;

    writeln!(out, "{}", BANNER_RULE)?;
    writeln!(out, "{}", BANNER_TITLE)?;
    writeln!(out, "{}", BANNER_RULE)?;
    out.write_all(&dump)?;
    writeln!(out, "{}\n", BANNER_RULE)?;
    out.flush()?;
    Ok(())
}
