use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use bobbind::{StructuredHealthReporter, SystemConfigLoader, bootstrap_with};

fn main() -> ExitCode {
    let host = match bootstrap_with(
        &SystemConfigLoader::new(),
        Arc::new(StructuredHealthReporter::new()),
    ) {
        Ok(host) => host,
        Err(error) => {
            // Telemetry may not be installed yet, so report directly.
            eprintln!("bobbind: {error}");
            return ExitCode::FAILURE;
        }
    };

    match host.serve(io::stdin().lock(), io::stdout()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("bobbind: {error}");
            ExitCode::FAILURE
        }
    }
}
