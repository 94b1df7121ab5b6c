//! CLI configuration

use std::path::PathBuf;

use clap::{Args, Parser};

/// Log output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "warn")]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

/// Offers CLI configuration
#[derive(Debug, Parser)]
#[command(
    name = "offers",
    about = "Evaluate an order against an offer catalog",
    long_about = None
)]
pub struct CliConfig {
    /// YAML fixture holding the offer catalog and the order
    #[arg(
        short,
        long,
        env = "OFFERS_FIXTURE",
        default_value = "fixtures/spring_sale.yml"
    )]
    pub fixture: PathBuf,

    /// Offer code to apply instead of processing automatic offers
    #[arg(short, long, env = "OFFER_CODE")]
    pub code: Option<String>,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,
}

impl CliConfig {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn flags_override_defaults() -> TestResult {
        let config = CliConfig::try_parse_from([
            "offers",
            "--fixture",
            "orders/big.yml",
            "--code",
            "SPRING10",
            "--log-format",
            "json",
        ])?;

        assert_eq!(config.fixture, PathBuf::from("orders/big.yml"));
        assert_eq!(config.code.as_deref(), Some("SPRING10"));
        assert_eq!(config.logging.log_format, LogFormat::Json);

        Ok(())
    }
}
