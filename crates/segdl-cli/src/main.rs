use segdl_core::logging;

mod cli;

use crate::cli::CliCommand;

#[tokio::main]
async fn main() {
    // Initialize logging as early as possible; stderr if the state dir is unusable.
    if let Err(e) = logging::init_logging() {
        match logging::init_logging_stderr() {
            Ok(()) => tracing::warn!("file logging unavailable: {:#}", e),
            Err(stderr_err) => eprintln!("segdl: logging disabled: {:#}; {:#}", e, stderr_err),
        }
    }

    if let Err(err) = CliCommand::run_from_args().await {
        eprintln!("segdl error: {:#}", err);
        std::process::exit(1);
    }
}
