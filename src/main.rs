//! Offers CLI
//!
//! Loads a fixture, evaluates its order against the offer catalog and prints the result.

use std::{io, process::ExitCode, sync::Arc};

use thiserror::Error;
use tracing::{error, info};

use offers::{
    config::CliConfig,
    fixtures::{FixtureError, FixtureSet},
    observability,
    report::{self, ReportError},
    service::{OfferProcessingService, OffersService, OffersServiceError},
};

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Fixture(#[from] FixtureError),

    #[error(transparent)]
    Service(#[from] OffersServiceError),

    #[error(transparent)]
    Report(#[from] ReportError),
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load configuration from .env and CLI arguments
    let config = match CliConfig::load() {
        Ok(config) => config,
        Err(error) => {
            // Help and version requests are reported as errors too
            if !error.use_stderr() {
                _ = error.print();

                return ExitCode::SUCCESS;
            }

            #[expect(
                clippy::print_stderr,
                reason = "logging not initialized yet, must use eprintln for config errors"
            )]
            {
                eprintln!("Configuration error: {error}");
            }

            return ExitCode::FAILURE;
        }
    };

    if let Err(error) = observability::init_subscriber(&config.logging) {
        #[expect(
            clippy::print_stderr,
            reason = "logging failed to initialize, must use eprintln to report it"
        )]
        {
            eprintln!("Logging error: {error}");
        }

        return ExitCode::FAILURE;
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!(%error, "offers run failed");

            ExitCode::FAILURE
        }
    }
}

async fn run(config: CliConfig) -> Result<(), CliError> {
    info!(fixture = %config.fixture.display(), "loading fixture");

    let (repository, order) = FixtureSet::load(&config.fixture)?.into_parts().await;
    let service = OfferProcessingService::new(Arc::new(repository));

    let mut out = io::stdout().lock();

    match config.code.as_deref() {
        Some(code) => {
            let outcome = service.apply_offer_code(order, code).await?;

            report::write_code_outcome(&mut out, &outcome)?;
        }
        None => {
            let summary = service.process_order_offers(order).await?;

            report::write_summary(&mut out, &summary)?;
        }
    }

    Ok(())
}
