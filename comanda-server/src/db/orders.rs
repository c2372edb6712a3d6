//! Order transaction processor
//!
//! Orders are created, not merged: the header, every line, and one ledger
//! entry commit as a single transaction. If any line fails to insert (e.g.
//! its menu item is gone and the foreign key rejects it), the whole order
//! rolls back and nothing is observable.

use rust_decimal::Decimal;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use shared::error::{AppError, ErrorCode};
use shared::models::{CreateOrder, ORDERS_KIND, Operation, Order, OrderLine, OrderLineInput, OrderStatus};

use super::store::{parse_decimal, parse_uuid};
use super::{BoxError, ledger};
use crate::error::{ServiceError, ServiceResult};
use crate::live::LiveHub;

/// Computed financial totals for an order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub service_charge: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
}

/// Pricing formula. The order of operations is a fixed business rule:
/// discount off the subtotal, service charge on the discounted base, tax
/// on the discounted and serviced base. Reordering changes the total.
pub fn compute_totals(
    lines: &[OrderLineInput],
    discount_pct: Decimal,
    service_charge_pct: Decimal,
    tax_pct: Decimal,
) -> OrderTotals {
    let subtotal: Decimal = lines
        .iter()
        .map(|l| l.price * Decimal::from(l.quantity))
        .sum();

    let discount_amount = subtotal * discount_pct / Decimal::ONE_HUNDRED;
    let service_charge = (subtotal - discount_amount) * service_charge_pct / Decimal::ONE_HUNDRED;
    let tax_amount =
        (subtotal - discount_amount + service_charge) * tax_pct / Decimal::ONE_HUNDRED;
    let total_amount = subtotal - discount_amount + service_charge + tax_amount;

    OrderTotals {
        subtotal,
        discount_amount,
        service_charge,
        tax_amount,
        total_amount,
    }
}

/// Create an order atomically: header + lines + one ledger entry.
///
/// Fires one `order-created` event after commit, carrying the order with
/// its lines attached.
pub async fn create_order(
    pool: &SqlitePool,
    hub: &LiveHub,
    tenant_id: Uuid,
    actor_id: &str,
    req: &CreateOrder,
    now: i64,
) -> ServiceResult<Order> {
    if req.lines.is_empty() {
        return Err(AppError::new(ErrorCode::OrderEmpty).into());
    }
    for line in &req.lines {
        if line.quantity <= 0 {
            return Err(AppError::validation("Line quantity must be positive").into());
        }
        if line.price < Decimal::ZERO {
            return Err(AppError::validation("Line price must not be negative").into());
        }
    }

    let totals = compute_totals(
        &req.lines,
        req.discount_percentage,
        req.service_charge_percentage,
        req.tax_percentage,
    );
    let id = Uuid::new_v4();

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO orders (
            id, tenant_id, table_id, actor_id, customer_name, customer_phone,
            status, subtotal, discount_percentage, service_charge_percentage,
            tax_percentage, total_amount, created_at, updated_at
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)
        "#,
    )
    .bind(id.to_string())
    .bind(tenant_id.to_string())
    .bind(req.table_id.map(|t| t.to_string()))
    .bind(actor_id)
    .bind(&req.customer_name)
    .bind(&req.customer_phone)
    .bind(OrderStatus::Pending.as_str())
    .bind(totals.subtotal.to_string())
    .bind(req.discount_percentage.to_string())
    .bind(req.service_charge_percentage.to_string())
    .bind(req.tax_percentage.to_string())
    .bind(totals.total_amount.to_string())
    .bind(now)
    .execute(&mut *tx)
    .await?;

    for line in &req.lines {
        let modifiers = serde_json::to_string(&line.modifiers).map_err(|e| Box::new(e) as BoxError)?;
        sqlx::query(
            r#"
            INSERT INTO order_lines (tenant_id, order_id, menu_item_id, name, price, quantity, modifiers)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(tenant_id.to_string())
        .bind(id.to_string())
        .bind(line.menu_item_id.to_string())
        .bind(&line.name)
        .bind(line.price.to_string())
        .bind(line.quantity)
        .bind(modifiers)
        .execute(&mut *tx)
        .await?;
    }

    ledger::append(&mut tx, tenant_id, ORDERS_KIND, id, Operation::Insert, actor_id, now).await?;

    tx.commit().await?;

    let order = get_order(pool, tenant_id, id)
        .await?
        .ok_or_else(|| ServiceError::Db("order vanished after commit".into()))?;

    if let Ok(payload) = serde_json::to_value(&order) {
        hub.publish(tenant_id, "order-created", payload);
    }

    Ok(order)
}

/// Complete a pending order, recording how it was paid
pub async fn settle_order(
    pool: &SqlitePool,
    hub: &LiveHub,
    tenant_id: Uuid,
    actor_id: &str,
    id: Uuid,
    payment_method: &str,
    amount_paid: Decimal,
    now: i64,
) -> ServiceResult<Order> {
    transition_order(
        pool,
        hub,
        tenant_id,
        actor_id,
        id,
        OrderStatus::Completed,
        Some((payment_method, amount_paid)),
        now,
    )
    .await
}

/// Cancel a pending order (terminal)
pub async fn cancel_order(
    pool: &SqlitePool,
    hub: &LiveHub,
    tenant_id: Uuid,
    actor_id: &str,
    id: Uuid,
    now: i64,
) -> ServiceResult<Order> {
    transition_order(
        pool,
        hub,
        tenant_id,
        actor_id,
        id,
        OrderStatus::Cancelled,
        None,
        now,
    )
    .await
}

/// Guarded lifecycle transition: only pending orders move. The guard is in
/// the statement itself, so a concurrent settle and cancel cannot both win.
async fn transition_order(
    pool: &SqlitePool,
    hub: &LiveHub,
    tenant_id: Uuid,
    actor_id: &str,
    id: Uuid,
    to: OrderStatus,
    payment: Option<(&str, Decimal)>,
    now: i64,
) -> ServiceResult<Order> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        UPDATE orders
        SET status = ?1,
            payment_method = COALESCE(?2, payment_method),
            amount_paid = COALESCE(?3, amount_paid),
            updated_at = ?4
        WHERE tenant_id = ?5 AND id = ?6 AND status = 'pending'
        "#,
    )
    .bind(to.as_str())
    .bind(payment.map(|(m, _)| m.to_string()))
    .bind(payment.map(|(_, a)| a.to_string()))
    .bind(now)
    .bind(tenant_id.to_string())
    .bind(id.to_string())
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        drop(tx);
        return match get_order(pool, tenant_id, id).await? {
            Some(_) => Err(AppError::new(ErrorCode::OrderNotPending).into()),
            None => Err(AppError::new(ErrorCode::OrderNotFound).into()),
        };
    }

    ledger::append(&mut tx, tenant_id, ORDERS_KIND, id, Operation::Update, actor_id, now).await?;

    tx.commit().await?;

    let order = get_order(pool, tenant_id, id)
        .await?
        .ok_or_else(|| ServiceError::Db("order vanished after commit".into()))?;

    if let Ok(payload) = serde_json::to_value(&order) {
        hub.publish(tenant_id, "order-updated", payload);
    }

    Ok(order)
}

/// Fetch one order with its lines attached
pub async fn get_order(
    pool: &SqlitePool,
    tenant_id: Uuid,
    id: Uuid,
) -> Result<Option<Order>, BoxError> {
    let row = sqlx::query("SELECT * FROM orders WHERE tenant_id = ?1 AND id = ?2")
        .bind(tenant_id.to_string())
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let mut order = order_from_row(&row)?;
    order.lines = fetch_lines(pool, tenant_id, id).await?;
    Ok(Some(order))
}

/// List a tenant's orders, newest first, optionally filtered by status
pub async fn list_orders(
    pool: &SqlitePool,
    tenant_id: Uuid,
    status: Option<OrderStatus>,
) -> Result<Vec<Order>, BoxError> {
    let rows = match status {
        Some(s) => {
            sqlx::query(
                "SELECT * FROM orders WHERE tenant_id = ?1 AND status = ?2 ORDER BY created_at DESC",
            )
            .bind(tenant_id.to_string())
            .bind(s.as_str())
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query("SELECT * FROM orders WHERE tenant_id = ?1 ORDER BY created_at DESC")
                .bind(tenant_id.to_string())
                .fetch_all(pool)
                .await?
        }
    };

    let mut orders = Vec::with_capacity(rows.len());
    for row in &rows {
        let mut order = order_from_row(row)?;
        order.lines = fetch_lines(pool, tenant_id, order.id).await?;
        orders.push(order);
    }
    Ok(orders)
}

async fn fetch_lines(
    pool: &SqlitePool,
    tenant_id: Uuid,
    order_id: Uuid,
) -> Result<Vec<OrderLine>, BoxError> {
    let rows: Vec<(i64, String, String, String, String, i64, String)> = sqlx::query_as(
        r#"
        SELECT id, order_id, menu_item_id, name, price, quantity, modifiers
        FROM order_lines
        WHERE tenant_id = ?1 AND order_id = ?2
        ORDER BY id
        "#,
    )
    .bind(tenant_id.to_string())
    .bind(order_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|(id, order_id, menu_item_id, name, price, quantity, modifiers)| {
            Ok(OrderLine {
                id,
                order_id: parse_uuid(&order_id)?,
                menu_item_id: parse_uuid(&menu_item_id)?,
                name,
                price: parse_decimal(&price)?,
                quantity,
                modifiers: serde_json::from_str(&modifiers)?,
            })
        })
        .collect()
}

fn order_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Order, BoxError> {
    let status: String = row.try_get("status")?;
    let table_id: Option<String> = row.try_get("table_id")?;
    let amount_paid: Option<String> = row.try_get("amount_paid")?;

    Ok(Order {
        id: parse_uuid(row.try_get("id")?)?,
        tenant_id: parse_uuid(row.try_get("tenant_id")?)?,
        table_id: table_id.as_deref().map(parse_uuid).transpose()?,
        actor_id: row.try_get("actor_id")?,
        customer_name: row.try_get("customer_name")?,
        customer_phone: row.try_get("customer_phone")?,
        status: OrderStatus::parse(&status)
            .ok_or_else(|| AppError::internal(format!("bad order status: {status}")))?,
        subtotal: parse_decimal(row.try_get("subtotal")?)?,
        discount_percentage: parse_decimal(row.try_get("discount_percentage")?)?,
        service_charge_percentage: parse_decimal(row.try_get("service_charge_percentage")?)?,
        tax_percentage: parse_decimal(row.try_get("tax_percentage")?)?,
        total_amount: parse_decimal(row.try_get("total_amount")?)?,
        payment_method: row.try_get("payment_method")?,
        amount_paid: amount_paid.as_deref().map(parse_decimal).transpose()?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        lines: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn line(price: &str, quantity: i64) -> OrderLineInput {
        OrderLineInput {
            menu_item_id: Uuid::new_v4(),
            name: "item".into(),
            price: Decimal::from_str(price).unwrap(),
            quantity,
            modifiers: vec![],
        }
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn pricing_is_exact_fixed_point() {
        let lines = [line("10.00", 2), line("5.00", 1)];
        let totals = compute_totals(&lines, dec("10"), dec("5"), dec("8"));

        assert_eq!(totals.subtotal, dec("25.00"));
        assert_eq!(totals.discount_amount, dec("2.50"));
        assert_eq!(totals.service_charge, dec("1.125"));
        assert_eq!(totals.tax_amount, dec("1.89"));
        assert_eq!(totals.total_amount, dec("25.515"));
    }

    #[test]
    fn pricing_with_zero_percentages() {
        let lines = [line("3.50", 4)];
        let totals = compute_totals(&lines, Decimal::ZERO, Decimal::ZERO, Decimal::ZERO);

        assert_eq!(totals.subtotal, dec("14.00"));
        assert_eq!(totals.discount_amount, Decimal::ZERO);
        assert_eq!(totals.total_amount, dec("14.00"));
    }

    #[test]
    fn discount_applies_before_service_charge_and_tax() {
        // 100 - 50% = 50; +10% service = 55; +10% tax = 60.5.
        // Applying tax before the discount would give a different total.
        let lines = [line("100.00", 1)];
        let totals = compute_totals(&lines, dec("50"), dec("10"), dec("10"));

        assert_eq!(totals.discount_amount, dec("50.00"));
        assert_eq!(totals.service_charge, dec("5.000"));
        assert_eq!(totals.tax_amount, dec("5.5000"));
        assert_eq!(totals.total_amount, dec("60.5000"));
    }
}
