//! Catalog seeding and inspection for tests. Catalog management is not part of the engine, so these go straight to
//! the tables.
use shop_common::Pesewas;

use crate::{
    db_types::{OrderId, ProductId, VariantId},
    SqliteDatabase,
};

pub async fn seed_product(db: &SqliteDatabase, title: &str) -> ProductId {
    let result = sqlx::query("INSERT INTO products (title) VALUES ($1)")
        .bind(title)
        .execute(db.pool())
        .await
        .expect("Error seeding product");
    ProductId(result.last_insert_rowid())
}

pub async fn seed_variant(
    db: &SqliteDatabase,
    product_id: ProductId,
    color: Option<&str>,
    storage: Option<&str>,
    price: Pesewas,
    stock: i64,
) -> VariantId {
    let result = sqlx::query(
        "INSERT INTO variants (product_id, color, storage, price, stock) VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(product_id.value())
    .bind(color)
    .bind(storage)
    .bind(price.value())
    .bind(stock)
    .execute(db.pool())
    .await
    .expect("Error seeding variant");
    VariantId(result.last_insert_rowid())
}

/// Seeds a product with a single variant and returns the variant.
pub async fn seed_item(db: &SqliteDatabase, title: &str, price: Pesewas, stock: i64) -> VariantId {
    let product = seed_product(db, title).await;
    seed_variant(db, product, Some("Black"), Some("128GB"), price, stock).await
}

pub async fn stock_of(db: &SqliteDatabase, variant_id: VariantId) -> i64 {
    sqlx::query_scalar("SELECT stock FROM variants WHERE id = $1")
        .bind(variant_id.value())
        .fetch_one(db.pool())
        .await
        .expect("Error reading stock")
}

pub async fn set_stock(db: &SqliteDatabase, variant_id: VariantId, stock: i64) {
    sqlx::query("UPDATE variants SET stock = $1 WHERE id = $2")
        .bind(stock)
        .bind(variant_id.value())
        .execute(db.pool())
        .await
        .expect("Error setting stock");
}

pub async fn deactivate_variant(db: &SqliteDatabase, variant_id: VariantId) {
    sqlx::query("UPDATE variants SET active = 0 WHERE id = $1")
        .bind(variant_id.value())
        .execute(db.pool())
        .await
        .expect("Error deactivating variant");
}

/// Pretends the order was last touched `minutes` ago.
pub async fn age_order(db: &SqliteDatabase, order_id: OrderId, minutes: i64) {
    sqlx::query("UPDATE orders SET updated_at = datetime('now', $1) WHERE id = $2")
        .bind(format!("-{minutes} minutes"))
        .bind(order_id.value())
        .execute(db.pool())
        .await
        .expect("Error ageing order");
}
