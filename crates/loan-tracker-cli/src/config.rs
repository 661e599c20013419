//! CLI configuration: optional `loans.toml`, overridden by `LOANS__*`
//! environment variables, overridden in turn by command-line flags.

use serde::Deserialize;

use crate::OutputFormat;

/// Settings that may be fixed per working directory or environment.
#[derive(Debug, Clone, Deserialize)]
pub struct CliConfig {
    /// Output format used when `--output` is not given.
    #[serde(default)]
    pub output: Option<OutputFormat>,
    /// Loan book file used when `--ledger` is not given.
    #[serde(default)]
    pub ledger: Option<String>,
    /// Tracing filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_log_filter() -> String {
    "loans=info,loan_tracker_core=info".to_string()
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            output: None,
            ledger: None,
            log_filter: default_log_filter(),
        }
    }
}

impl CliConfig {
    /// Loads configuration from an explicit file, or `loans.*` in the
    /// working directory when present.
    ///
    /// # Errors
    ///
    /// Returns an error if a named file is missing or any source is malformed.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let file = match path {
            Some(p) => config::File::with_name(p).required(true),
            None => config::File::with_name("loans").required(false),
        };

        config::Config::builder()
            .add_source(file)
            .add_source(config::Environment::with_prefix("LOANS").separator("__"))
            .build()?
            .try_deserialize()
    }
}
