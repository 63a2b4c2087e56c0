use opsdesk_core::config::{AppConfig, LoadOptions};
use opsdesk_store::{DemoDataset, Stores};

use crate::commands::CommandResult;

/// Loads the demo dataset into a fresh in-memory store and verifies the
/// contract. The backend is mocked, so this is a deterministic check of
/// the fixtures rather than a durable write.
pub fn run() -> CommandResult {
    if let Err(error) = AppConfig::load(LoadOptions::default()) {
        return CommandResult::failure(
            "seed",
            "config_validation",
            format!("configuration issue: {error}"),
            2,
        );
    }

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "seed",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let result = runtime.block_on(async {
        let stores = Stores::default();
        let summary = DemoDataset::load(&stores)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;

        let checks = DemoDataset::verify(&stores)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

        let failed: Vec<&str> =
            checks.iter().filter(|check| !check.ok).map(|check| check.label).collect();
        if failed.is_empty() {
            Ok((summary, checks.len()))
        } else {
            Err((
                "seed_verification",
                format!("seed verification failed for checks: {}", failed.join(", ")),
                6u8,
            ))
        }
    });

    match result {
        Ok((summary, check_count)) => CommandResult::success(
            "seed",
            format!(
                "demo dataset loaded: {} users, {} categories, {} workflow records; {check_count} verification checks passed",
                summary.users, summary.categories, summary.workflow_records
            ),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}
