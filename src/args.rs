//! Command-line capture and the two argument-processing passes of the
//! bootstrap: config options first, unknown-argument check second.

use clap::error::ErrorKind;
use clap::Parser;
use std::ffi::{OsStr, OsString};
use std::io::{self, Write};
use std::path::Path;
use tracing::debug;

use crate::bootstrap::StopReason;
use crate::config::{Cli, LineageConfig};
use crate::error::BootstrapError;

/// Raw process arguments, program name first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentList {
    tokens: Vec<OsString>,
}

impl ArgumentList {
    pub fn capture() -> Self {
        Self::from_tokens(std::env::args_os())
    }

    pub fn from_tokens<I, T>(tokens: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    pub fn tokens(&self) -> &[OsString] {
        &self.tokens
    }

    pub fn program(&self) -> Option<&OsStr> {
        self.tokens.first().map(OsString::as_os_str)
    }
}

/// Result of [`ArgManager::process_config_options`].
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigFlow {
    Continue,
    Stop(StopReason),
}

/// Parses an [`ArgumentList`] once and answers the bootstrap's questions
/// about it.
///
/// Parse failures other than help and version requests are held back until
/// [`test_unknown`](Self::test_unknown), so config options are processed
/// before unknown arguments are reported.
#[derive(Debug)]
pub struct ArgManager {
    parsed: Result<Cli, clap::Error>,
}

impl ArgManager {
    pub fn new(args: &ArgumentList) -> Self {
        let parsed = Cli::try_parse_from(args.tokens().iter().cloned());
        if let Err(ref e) = parsed {
            debug!(kind = ?e.kind(), "argument parsing did not produce options");
        }
        Self { parsed }
    }

    /// Whether parsing already settled on a stop: help, version or an
    /// unrecognized argument.
    pub fn stops_early(&self) -> bool {
        self.parsed.is_err()
    }

    /// Config file named by `--config`, if any.
    ///
    /// `None` when parsing failed; the bootstrap stops before using the
    /// config in that case.
    pub fn config_path(&self) -> Option<&Path> {
        self.parsed.as_ref().ok().and_then(|cli| cli.config.as_deref())
    }

    /// Handle help, version, `--gen` and `--write` requests and apply
    /// overrides to `config`.
    ///
    /// Overrides are applied before the config is written or dumped.
    pub fn process_config_options<W, E>(
        &self,
        config: &mut LineageConfig,
        out: &mut W,
        err: &mut E,
        config_path: &Path,
    ) -> Result<ConfigFlow, BootstrapError>
    where
        W: Write + ?Sized,
        E: Write + ?Sized,
    {
        let cli = match &self.parsed {
            Ok(cli) => cli,
            Err(e) => {
                return match e.kind() {
                    ErrorKind::DisplayHelp | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                        write!(out, "{}", e.render())?;
                        Ok(ConfigFlow::Stop(StopReason::Help))
                    }
                    ErrorKind::DisplayVersion => {
                        write!(out, "{}", e.render())?;
                        Ok(ConfigFlow::Stop(StopReason::Version))
                    }
                    _ => Ok(ConfigFlow::Continue),
                };
            }
        };

        if let Err(e) = config.apply_overrides(cli) {
            writeln!(err, "error: {}", e)?;
            return Ok(ConfigFlow::Stop(StopReason::InvalidConfig));
        }

        if cli.gen {
            writeln!(out, "Generating new config file: {}", config_path.display())?;
            config.write_file(config_path)?;
            return Ok(ConfigFlow::Stop(StopReason::ConfigGenerated(
                config_path.to_path_buf(),
            )));
        }

        if cli.write {
            config.write(out)?;
            return Ok(ConfigFlow::Stop(StopReason::ConfigWritten));
        }

        Ok(ConfigFlow::Continue)
    }

    /// `true` when every argument was recognized; otherwise the parser's
    /// message goes to `err`.
    pub fn test_unknown<E: Write + ?Sized>(&self, err: &mut E) -> io::Result<bool> {
        match &self.parsed {
            Ok(_) => Ok(true),
            Err(e) => {
                write!(err, "{}", e.render())?;
                Ok(false)
            }
        }
    }
}
