use cartwheel_db::{CatalogSeed, VerificationResult};

use crate::commands::{with_migrated_pool, CommandResult};

pub fn run() -> CommandResult {
    let result = with_migrated_pool("seed", |pool| async move {
        let seeded = CatalogSeed::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;

        let verification = CatalogSeed::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

        if !verification.all_present {
            return Err(("seed_verification", verification_failure_message(&verification), 6u8));
        }

        Ok(seeded.items_seeded)
    });

    match result {
        Ok(items) => CommandResult::success(
            "seed",
            format!("demo catalog loaded ({} items): {}", items.len(), items.join(", ")),
        ),
        Err(failure) => failure,
    }
}

pub fn clean() -> CommandResult {
    let result = with_migrated_pool("seed", |pool| async move {
        CatalogSeed::clean(&pool).await.map_err(|error| ("seed_clean", error.to_string(), 5u8))
    });

    match result {
        Ok(removed) => CommandResult::success("seed", format!("removed {removed} seeded items")),
        Err(failure) => failure,
    }
}

fn verification_failure_message(verification: &VerificationResult) -> String {
    let failed_checks = verification
        .checks
        .iter()
        .filter_map(|(check, passed)| (!passed).then_some(*check))
        .collect::<Vec<_>>();

    if failed_checks.is_empty() {
        "some seed data failed to load".to_string()
    } else {
        format!("seed verification failed for checks: {}", failed_checks.join(", "))
    }
}
