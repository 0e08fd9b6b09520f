//! Startup path of a lineage evolution experiment.
//!
//! ```text
//! Bootstrap::run
//!  ├─ LineageConfig::read        configs.cfg (or --config)
//!  ├─ ArgManager::process_config_options
//!  │    help / version / --gen / --write stop here, overrides apply
//!  ├─ ArgManager::test_unknown   unknown arguments stop here
//!  ├─ print_configuration        banner + LineageConfig::write
//!  └─ Runnable::run              when a runner is supplied
//! ```

pub mod args;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod runner;
pub mod selection;

pub use args::{ArgManager, ArgumentList, ConfigFlow};
pub use bootstrap::{print_configuration, Bootstrap, Outcome, StopReason};
pub use config::{Cli, LineageConfig, ReadStatus, DEFAULT_CONFIG_FILE};
pub use error::{BootstrapError, ConfigError};
pub use runner::Runnable;
pub use selection::Selection;
