//! The inventory ledger.
//!
//! Stock is only ever moved with conditional, relative updates. Nothing in here reads a stock level and writes back a
//! computed value.
use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::db_types::{CatalogItem, Variant, VariantId};

const CATALOG_ITEM_QUERY: &str = r#"
    SELECT
        variants.id AS variant_id,
        variants.product_id AS product_id,
        products.title AS product_title,
        products.active AS product_active,
        variants.sku AS sku,
        variants.color AS color,
        variants.storage AS storage,
        variants.price AS price,
        variants.stock AS stock,
        variants.active AS active
    FROM variants JOIN products ON variants.product_id = products.id
    WHERE variants.id = $1
"#;

/// Fetches the variant and its owning product. Returns `None` if either does not exist.
pub async fn fetch_catalog_item(
    variant_id: VariantId,
    conn: &mut SqliteConnection,
) -> Result<Option<CatalogItem>, sqlx::Error> {
    let item = sqlx::query_as(CATALOG_ITEM_QUERY).bind(variant_id.value()).fetch_optional(conn).await?;
    Ok(item)
}

pub async fn fetch_variant(variant_id: VariantId, conn: &mut SqliteConnection) -> Result<Option<Variant>, sqlx::Error> {
    let variant =
        sqlx::query_as("SELECT * FROM variants WHERE id = $1").bind(variant_id.value()).fetch_optional(conn).await?;
    Ok(variant)
}

/// Removes `quantity` units from the variant's stock, but only if the variant is active and has at least that many
/// units available. Returns `false` if the decrement was refused.
pub async fn try_decrement_stock(
    variant_id: VariantId,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE variants SET stock = stock - $1, updated_at = CURRENT_TIMESTAMP
        WHERE id = $2 AND active = 1 AND stock >= $1
        "#,
    )
    .bind(quantity)
    .bind(variant_id.value())
    .execute(conn)
    .await?;
    let ok = result.rows_affected() == 1;
    trace!("🗃️ Decrement of {variant_id} by {quantity}: {}", if ok { "applied" } else { "refused" });
    Ok(ok)
}

/// Puts `quantity` units back onto the variant's stock. The variant's active flag is ignored, since restored stock
/// belongs to the variant whether or not it is currently on sale.
pub async fn restore_stock(variant_id: VariantId, quantity: i64, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    let result = sqlx::query(
        "UPDATE variants SET stock = stock + $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2",
    )
    .bind(quantity)
    .bind(variant_id.value())
    .execute(conn)
    .await?;
    if result.rows_affected() == 0 {
        debug!("🗃️ Could not restore {quantity} units to {variant_id}. The variant no longer exists.");
    }
    Ok(())
}

/// Counts active variants whose stock is at or below `threshold`.
pub async fn count_low_stock(threshold: i64, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM variants WHERE active = 1 AND stock <= $1")
        .bind(threshold)
        .fetch_one(conn)
        .await?;
    Ok(count)
}
