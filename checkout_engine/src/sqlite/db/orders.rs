use chrono::Duration;
use log::{debug, trace};
use shop_common::Pesewas;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    checkout_api::order_objects::{OrderKpis, OrderQueryFilter},
    db_types::{NewOrder, Order, OrderId, OrderItem, OrderStatusType, TrackingNote},
    sqlite::db::catalog,
};

/// The format `CURRENT_TIMESTAMP` writes, so that bound timestamps compare correctly as text.
const SQLITE_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Inserts a new order and its line-item snapshot using the given connection. This is not atomic. You can embed this
/// call inside a transaction if you need to ensure atomicity, and pass `&mut *tx` as the connection argument.
///
/// The order is created in `Pending` status with `stock_reserved` set, so the caller must already have taken the stock.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, sqlx::Error> {
    let subtotal = order.subtotal();
    let total = order.total();
    let inserted: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                customer_id,
                status,
                subtotal,
                delivery_fee,
                total,
                customer_phone,
                stock_reserved
            ) VALUES ($1, 'Pending', $2, $3, $4, $5, 1)
            RETURNING *;
        "#,
    )
    .bind(&order.customer_id)
    .bind(subtotal.value())
    .bind(order.delivery_fee.value())
    .bind(total.value())
    .bind(&order.customer_phone)
    .fetch_one(&mut *conn)
    .await?;
    for item in order.items {
        sqlx::query(
            r#"
            INSERT INTO order_items (order_id, product_id, variant_id, title, variant_label, quantity, unit_price)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(inserted.id.value())
        .bind(item.product_id.value())
        .bind(item.variant_id.value())
        .bind(item.title)
        .bind(item.variant_label)
        .bind(item.quantity)
        .bind(item.unit_price.value())
        .execute(&mut *conn)
        .await?;
    }
    debug!("🗃️ Order {} inserted for {} with total {}", inserted.id, inserted.customer_id, inserted.total);
    Ok(inserted)
}

pub async fn fetch_order(id: OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id.value()).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_items(id: OrderId, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    let items = sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id ASC")
        .bind(id.value())
        .fetch_all(conn)
        .await?;
    Ok(items)
}

/// Marks the order's reservation as released and puts every reserved unit back on its variant.
///
/// The release is guarded by the `stock_reserved` flag: only the caller that flips it from set to clear restores
/// stock. Returns `false` (and changes nothing) if the reservation had already been released.
pub async fn release_reservation(id: OrderId, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let released: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE orders SET stock_reserved = 0, updated_at = CURRENT_TIMESTAMP
        WHERE id = $1 AND stock_reserved = 1
        RETURNING id
        "#,
    )
    .bind(id.value())
    .fetch_optional(&mut *conn)
    .await?;
    if released.is_none() {
        debug!("🗃️ Stock for order {id} has already been released. Nothing to restore.");
        return Ok(false);
    }
    let items = fetch_order_items(id, &mut *conn).await?;
    for item in items {
        catalog::restore_stock(item.variant_id, item.quantity, &mut *conn).await?;
        trace!("🗃️ Restored {} units of {} for order {id}", item.quantity, item.variant_id);
    }
    debug!("🗃️ Reserved stock for order {id} has been restored");
    Ok(true)
}

/// Moves the order from `from` to `to`, but only if it is currently in `from`. Returns `None` if the order does not
/// exist or is in some other status.
pub async fn transition_status(
    id: OrderId,
    from: OrderStatusType,
    to: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        "UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 AND status = $3 RETURNING *",
    )
    .bind(to.to_string())
    .bind(id.value())
    .bind(from.to_string())
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

/// Links the payment to the order. Returns `None` if the order does not exist or already has a payment.
pub async fn link_payment(
    id: OrderId,
    payment_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        r#"
        UPDATE orders SET payment_id = $1, updated_at = CURRENT_TIMESTAMP
        WHERE id = $2 AND payment_id IS NULL
        RETURNING *
        "#,
    )
    .bind(payment_id)
    .bind(id.value())
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

/// Appends a tracking note. Returns `None` if the order does not exist.
pub async fn insert_tracking_note(
    id: OrderId,
    note: &str,
    label: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Option<TrackingNote>, sqlx::Error> {
    let note = sqlx::query_as(
        r#"
        INSERT INTO tracking_notes (order_id, note, label)
        SELECT $1, $2, $3 WHERE EXISTS (SELECT 1 FROM orders WHERE id = $1)
        RETURNING *
        "#,
    )
    .bind(id.value())
    .bind(note)
    .bind(label)
    .fetch_optional(conn)
    .await?;
    Ok(note)
}

pub async fn fetch_tracking_notes(id: OrderId, conn: &mut SqliteConnection) -> Result<Vec<TrackingNote>, sqlx::Error> {
    let notes = sqlx::query_as("SELECT * FROM tracking_notes WHERE order_id = $1 ORDER BY id ASC")
        .bind(id.value())
        .fetch_all(conn)
        .await?;
    Ok(notes)
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`
///
/// Resulting orders are ordered newest first.
pub async fn search_orders(query: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM orders ");
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(cid) = query.customer_id {
        where_clause.push("customer_id = ");
        where_clause.push_bind_unseparated(cid);
    }
    if let Some(statuses) = query.status.filter(|s| !s.is_empty()) {
        let status_clause = statuses.iter().map(|s| format!("'{s}'")).collect::<Vec<_>>().join(",");
        where_clause.push(format!("status IN ({status_clause})"));
    }
    if let Some(since) = query.since {
        where_clause.push("created_at >= ");
        where_clause.push_bind_unseparated(since.format(SQLITE_DATETIME_FORMAT).to_string());
    }
    if let Some(until) = query.until {
        where_clause.push("created_at <= ");
        where_clause.push_bind_unseparated(until.format(SQLITE_DATETIME_FORMAT).to_string());
    }
    builder.push(" ORDER BY id DESC");
    if let Some(limit) = query.limit {
        builder.push(" LIMIT ");
        builder.push_bind(limit);
    }
    trace!("🗃️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("🗃️ Result of search_orders: {} orders", orders.len());
    Ok(orders)
}

/// Pending orders whose last update is older than `older_than`, oldest first.
pub async fn fetch_stale_pending_orders(
    older_than: Duration,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    let modifier = format!("-{} seconds", older_than.num_seconds());
    let orders = sqlx::query_as(
        "SELECT * FROM orders WHERE status = 'Pending' AND updated_at < datetime('now', $1) ORDER BY id ASC",
    )
    .bind(modifier)
    .fetch_all(conn)
    .await?;
    Ok(orders)
}

/// Sales and order counts. Sales are summed over paid and fulfilled orders only.
pub async fn fetch_order_kpis(conn: &mut SqliteConnection) -> Result<OrderKpis, sqlx::Error> {
    let (total_sales, total_orders, pending_orders, paid_orders, failed_orders): (i64, i64, i64, i64, i64) =
        sqlx::query_as(
            r#"
        SELECT
            COALESCE(SUM(CASE WHEN status IN ('Paid', 'Fulfilled') THEN total ELSE 0 END), 0),
            COUNT(*),
            COALESCE(SUM(CASE WHEN status = 'Pending' THEN 1 ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN status IN ('Paid', 'Fulfilled') THEN 1 ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN status = 'Failed' THEN 1 ELSE 0 END), 0)
        FROM orders
        "#,
        )
        .fetch_one(conn)
        .await?;
    Ok(OrderKpis {
        total_sales: Pesewas::from(total_sales),
        total_orders,
        pending_orders,
        paid_orders,
        failed_orders,
        ..Default::default()
    })
}
