use sqlx::SqliteConnection;

use shop_common::Pesewas;

pub async fn fetch_delivery_fee(conn: &mut SqliteConnection) -> Result<Option<Pesewas>, sqlx::Error> {
    let fee: Option<i64> =
        sqlx::query_scalar("SELECT delivery_fee FROM settings WHERE id = 1").fetch_optional(conn).await?;
    Ok(fee.map(Pesewas::from))
}

pub async fn upsert_delivery_fee(fee: Pesewas, conn: &mut SqliteConnection) -> Result<Pesewas, sqlx::Error> {
    let fee: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO settings (id, delivery_fee) VALUES (1, $1)
        ON CONFLICT (id) DO UPDATE SET delivery_fee = excluded.delivery_fee, updated_at = CURRENT_TIMESTAMP
        RETURNING delivery_fee
        "#,
    )
    .bind(fee.value())
    .fetch_one(conn)
    .await?;
    Ok(Pesewas::from(fee))
}
