use crate::commands::{self, CommandResult};
use salescope_db::DemoLedgerDataset;

pub fn run() -> CommandResult {
    commands::execute("seed", |engine| async move {
        let seeded = DemoLedgerDataset::load(engine.pool())
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;

        let verification = DemoLedgerDataset::verify(engine.pool())
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;
        engine.close().await;

        if !verification.all_present {
            let failed_checks = verification
                .checks
                .iter()
                .filter_map(|(check, passed)| (!passed).then_some(*check))
                .collect::<Vec<_>>();
            let message = if failed_checks.is_empty() {
                "some seed data failed to load".to_string()
            } else {
                format!("seed verification failed for checks: {}", failed_checks.join(", "))
            };
            return Err(("seed_verification", message, 6u8));
        }

        Ok(CommandResult::success_with_data(
            "seed",
            "demo ledger loaded and verified",
            serde_json::json!({
                "customers": seeded.customers,
                "items": seeded.items,
            }),
        ))
    })
}
