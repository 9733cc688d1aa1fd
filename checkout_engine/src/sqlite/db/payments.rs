use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{NewPayment, OrderId, Payment, PaymentStatus};

/// Inserts a new payment in `Initiated` status. This is not atomic; the caller is expected to link the payment to its
/// order in the same transaction.
pub async fn insert_payment(payment: NewPayment, conn: &mut SqliteConnection) -> Result<Payment, sqlx::Error> {
    let payment: Payment = sqlx::query_as(
        r#"
        INSERT INTO payments (order_id, customer_id, provider, reference, status, amount, raw_payload)
        VALUES ($1, $2, $3, $4, 'Initiated', $5, $6)
        RETURNING *
        "#,
    )
    .bind(payment.order_id.value())
    .bind(payment.customer_id)
    .bind(payment.provider)
    .bind(payment.reference)
    .bind(payment.amount.value())
    .bind(payment.raw_payload)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ {payment} inserted");
    Ok(payment)
}

pub async fn fetch_payment_by_reference(
    reference: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    let payment =
        sqlx::query_as("SELECT * FROM payments WHERE reference = $1").bind(reference).fetch_optional(conn).await?;
    Ok(payment)
}

pub async fn fetch_payment_for_order(
    order_id: OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    let payment = sqlx::query_as("SELECT * FROM payments WHERE order_id = $1 ORDER BY id DESC LIMIT 1")
        .bind(order_id.value())
        .fetch_optional(conn)
        .await?;
    Ok(payment)
}

/// Writes a terminal status to the payment, but only if it is still `Initiated`.
///
/// This is the single point of linearisation for settlement. Exactly one caller gets `Some` back for a given
/// reference; everyone else gets `None`.
pub async fn try_settle_payment(
    reference: &str,
    status: PaymentStatus,
    raw_payload: Option<String>,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    let payment = sqlx::query_as(
        r#"
        UPDATE payments SET status = $1, raw_payload = COALESCE($2, raw_payload), updated_at = CURRENT_TIMESTAMP
        WHERE reference = $3 AND status = 'Initiated'
        RETURNING *
        "#,
    )
    .bind(status.to_string())
    .bind(raw_payload)
    .bind(reference)
    .fetch_optional(conn)
    .await?;
    Ok(payment)
}

/// Payments, newest first.
pub async fn fetch_payments(
    customer_id: Option<&str>,
    limit: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Payment>, sqlx::Error> {
    let payments = match customer_id {
        Some(cid) => {
            sqlx::query_as("SELECT * FROM payments WHERE customer_id = $1 ORDER BY id DESC LIMIT $2")
                .bind(cid)
                .bind(limit)
                .fetch_all(conn)
                .await?
        },
        None => {
            sqlx::query_as("SELECT * FROM payments ORDER BY id DESC LIMIT $1").bind(limit).fetch_all(conn).await?
        },
    };
    Ok(payments)
}

pub async fn count_payments(conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM payments").fetch_one(conn).await?;
    Ok(count)
}
