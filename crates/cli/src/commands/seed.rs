use crate::commands::{prepare, CommandResult};
use storeagent_db::repositories::SqlProductRepository;
use storeagent_db::{connect_with_settings, migrations, DemoCatalog, SeedResult};

pub fn run() -> CommandResult {
    let (config, runtime) = match prepare("seed") {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let repo = SqlProductRepository::new(pool.clone());
        let seeded = DemoCatalog::seed_if_empty(&repo)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 6u8));

        pool.close().await;
        seeded
    });

    match result {
        Ok(seeded) => {
            let message = seed_message(&seeded);
            let data = serde_json::to_value(&seeded).unwrap_or_default();
            CommandResult::success_with_data("seed", message, data)
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

fn seed_message(seeded: &SeedResult) -> String {
    if seeded.skipped {
        "catalog already populated; demo products skipped".to_string()
    } else {
        format!("inserted {} demo products", seeded.inserted)
    }
}

#[cfg(test)]
mod tests {
    use storeagent_db::SeedResult;

    use super::seed_message;

    #[test]
    fn message_reports_inserted_count() {
        let message = seed_message(&SeedResult { inserted: 3, skipped: false });
        assert_eq!(message, "inserted 3 demo products");
    }

    #[test]
    fn message_reports_skip() {
        let message = seed_message(&SeedResult { inserted: 0, skipped: true });
        assert!(message.contains("skipped"));
    }
}
