use std::str::FromStr;

use rust_decimal::Decimal;
use sqlx::Executor;

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

/// Items the seed fixture must leave in the catalog.
const SEED_ITEMS: &[SeedItemContract] = &[
    SeedItemContract { id: 1, name: "Book", price: "9.99", label: "item-book" },
    SeedItemContract { id: 2, name: "Notebook", price: "4.50", label: "item-notebook" },
    SeedItemContract { id: 3, name: "Fountain Pen", price: "24.00", label: "item-fountain-pen" },
    SeedItemContract { id: 4, name: "Sticker", price: "0", label: "item-sticker" },
];

/// Demo catalog used by local runs and the browser client.
pub struct CatalogSeed;

impl CatalogSeed {
    pub const SQL: &str = include_str!("../../../config/fixtures/catalog_seed.sql");

    /// Loads the fixture. Rows with fixed ids are skipped when already present.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;
        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        Ok(SeedResult { items_seeded: SEED_ITEMS.iter().map(|item| item.name).collect() })
    }

    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::with_capacity(SEED_ITEMS.len());

        for item in SEED_ITEMS {
            let stored: Option<(String, String)> =
                sqlx::query_as("SELECT name, price FROM items WHERE id = ?1")
                    .bind(item.id)
                    .fetch_optional(pool)
                    .await?;

            let matches = match stored {
                Some((name, price)) => name == item.name && same_price(&price, item.price),
                None => false,
            };
            checks.push((item.label, matches));
        }

        let all_present = checks.iter().all(|(_, present)| *present);
        Ok(VerificationResult { all_present, checks })
    }

    /// Removes the seeded rows that no cart or order references.
    pub async fn clean(pool: &DbPool) -> Result<u64, RepositoryError> {
        let ids = SEED_ITEMS.iter().map(|item| item.id.to_string()).collect::<Vec<_>>().join(",");
        let deleted = sqlx::query(&format!(
            "DELETE FROM items WHERE id IN ({ids})
               AND id NOT IN (SELECT item_id FROM cart_items)
               AND id NOT IN (SELECT item_id FROM order_items)"
        ))
        .execute(pool)
        .await?;
        Ok(deleted.rows_affected())
    }
}

fn same_price(stored: &str, expected: &str) -> bool {
    match (Decimal::from_str(stored), Decimal::from_str(expected)) {
        (Ok(stored), Ok(expected)) => stored == expected,
        _ => false,
    }
}

#[derive(Debug, Clone, Copy)]
struct SeedItemContract {
    id: i64,
    name: &'static str,
    price: &'static str,
    label: &'static str,
}

#[derive(Debug)]
pub struct SeedResult {
    pub items_seeded: Vec<&'static str>,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}
