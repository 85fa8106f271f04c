//! Reference-data CRUD surface (§1 "external collaborator", supplemented
//! feature 4).
//!
//! Minimal typed upsert/list operations over [`Order`], [`Stockyard`], and
//! [`Rake`] — just enough for the job runner to have something to snapshot
//! from and the commit executor to flip. No CSV-upload/template machinery;
//! that stayed with the original stub, out of core scope.

use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::{AnyPool, Row};
use uuid::Uuid;

use crate::domain::{Order, OrderStatus, Rake, RakeStatus, Stockyard};

pub async fn upsert_stockyard(pool: &AnyPool, stockyard: &Stockyard) -> anyhow::Result<()> {
    sqlx::query(
        r#"
INSERT INTO stockyards (id, code, name, location, latitude, longitude, capacity_tonnes)
VALUES (?, ?, ?, ?, ?, ?, ?)
ON CONFLICT(code) DO UPDATE SET
  name = excluded.name,
  location = excluded.location,
  latitude = excluded.latitude,
  longitude = excluded.longitude,
  capacity_tonnes = excluded.capacity_tonnes;
"#,
    )
    .bind(stockyard.id.to_string())
    .bind(&stockyard.code)
    .bind(&stockyard.name)
    .bind(&stockyard.location)
    .bind(stockyard.latitude)
    .bind(stockyard.longitude)
    .bind(stockyard.capacity_tonnes)
    .execute(pool)
    .await?;

    for (product_code, quantity_tonnes) in &stockyard.current_inventory {
        sqlx::query(
            r#"
INSERT INTO stockyard_inventory (stockyard_id, product_code, quantity_tonnes)
VALUES (?, ?, ?)
ON CONFLICT(stockyard_id, product_code) DO UPDATE SET quantity_tonnes = excluded.quantity_tonnes;
"#,
        )
        .bind(stockyard.id.to_string())
        .bind(product_code)
        .bind(quantity_tonnes)
        .execute(pool)
        .await?;
    }

    Ok(())
}

pub async fn list_stockyards(pool: &AnyPool) -> anyhow::Result<Vec<Stockyard>> {
    let rows = sqlx::query(r#"SELECT * FROM stockyards ORDER BY code;"#).fetch_all(pool).await?;

    let mut out = Vec::with_capacity(rows.len());
    for r in &rows {
        let id_str: String = r.get("id");
        let inventory_rows = sqlx::query(r#"SELECT product_code, quantity_tonnes FROM stockyard_inventory WHERE stockyard_id = ?;"#)
            .bind(&id_str)
            .fetch_all(pool)
            .await?;

        let mut current_inventory = std::collections::HashMap::new();
        for ir in &inventory_rows {
            current_inventory.insert(ir.get::<String, _>("product_code"), ir.get::<f64, _>("quantity_tonnes"));
        }

        out.push(Stockyard {
            id: Uuid::parse_str(&id_str).context("invalid stockyard id")?,
            code: r.get("code"),
            name: r.get("name"),
            location: r.get("location"),
            latitude: r.get("latitude"),
            longitude: r.get("longitude"),
            capacity_tonnes: r.get("capacity_tonnes"),
            current_inventory,
        });
    }

    Ok(out)
}

pub async fn upsert_rake(pool: &AnyPool, rake: &Rake) -> anyhow::Result<()> {
    sqlx::query(
        r#"
INSERT INTO rakes (id, rake_number, wagon_type_code, num_wagons, total_capacity_tonnes, status, current_location)
VALUES (?, ?, ?, ?, ?, ?, ?)
ON CONFLICT(id) DO UPDATE SET
  wagon_type_code = excluded.wagon_type_code,
  num_wagons = excluded.num_wagons,
  total_capacity_tonnes = excluded.total_capacity_tonnes,
  status = excluded.status,
  current_location = excluded.current_location;
"#,
    )
    .bind(rake.id.to_string())
    .bind(&rake.rake_number)
    .bind(&rake.wagon_type_code)
    .bind(rake.num_wagons)
    .bind(rake.total_capacity_tonnes)
    .bind(rake.status.as_str())
    .bind(&rake.current_location)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn list_rakes(pool: &AnyPool) -> anyhow::Result<Vec<Rake>> {
    let rows = sqlx::query(r#"SELECT * FROM rakes ORDER BY rake_number;"#).fetch_all(pool).await?;

    rows.iter()
        .map(|r| {
            let status = RakeStatus::parse(&r.get::<String, _>("status")).context("invalid rake status")?;
            Ok(Rake {
                id: Uuid::parse_str(&r.get::<String, _>("id")).context("invalid rake id")?,
                rake_number: r.get("rake_number"),
                wagon_type_code: r.get("wagon_type_code"),
                num_wagons: r.get("num_wagons"),
                total_capacity_tonnes: r.get("total_capacity_tonnes"),
                status,
                current_location: r.get("current_location"),
            })
        })
        .collect()
}

pub async fn create_order(pool: &AnyPool, order: &Order) -> anyhow::Result<()> {
    sqlx::query(
        r#"
INSERT INTO orders
  (id, order_number, product_code, quantity_tonnes, source_stockyard_id, destination,
   destination_latitude, destination_longitude, priority, due_date, sla_hours, status)
VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?);
"#,
    )
    .bind(order.id.to_string())
    .bind(&order.order_number)
    .bind(&order.product_code)
    .bind(order.quantity_tonnes)
    .bind(order.source_stockyard_id.map(|id| id.to_string()))
    .bind(&order.destination)
    .bind(order.destination_latitude)
    .bind(order.destination_longitude)
    .bind(order.priority)
    .bind(order.due_date.to_rfc3339())
    .bind(order.sla_hours)
    .bind(order.status.as_str())
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn list_orders(pool: &AnyPool, status: Option<OrderStatus>) -> anyhow::Result<Vec<Order>> {
    let rows = match status {
        Some(s) => {
            sqlx::query(r#"SELECT * FROM orders WHERE status = ? ORDER BY due_date;"#)
                .bind(s.as_str())
                .fetch_all(pool)
                .await?
        }
        None => sqlx::query(r#"SELECT * FROM orders ORDER BY due_date;"#).fetch_all(pool).await?,
    };

    rows.iter().map(row_to_order).collect()
}

pub async fn cancel_order(pool: &AnyPool, order_id: &Uuid, now: DateTime<Utc>) -> anyhow::Result<bool> {
    let _ = now; // orders carry no updated_at column; kept for call-site symmetry with jobs::cancel_job
    let res = sqlx::query(r#"UPDATE orders SET status = 'cancelled' WHERE id = ? AND status = 'pending';"#)
        .bind(order_id.to_string())
        .execute(pool)
        .await?;

    Ok(res.rows_affected() == 1)
}

fn row_to_order(r: &sqlx::any::AnyRow) -> anyhow::Result<Order> {
    let source_stockyard_id: Option<String> = r.get("source_stockyard_id");
    let status = OrderStatus::parse(&r.get::<String, _>("status")).context("invalid order status")?;

    Ok(Order {
        id: Uuid::parse_str(&r.get::<String, _>("id")).context("invalid order id")?,
        order_number: r.get("order_number"),
        product_code: r.get("product_code"),
        quantity_tonnes: r.get("quantity_tonnes"),
        source_stockyard_id: source_stockyard_id.map(|s| Uuid::parse_str(&s)).transpose().context("invalid source stockyard id")?,
        destination: r.get("destination"),
        destination_latitude: r.get("destination_latitude"),
        destination_longitude: r.get("destination_longitude"),
        priority: r.get("priority"),
        due_date: DateTime::parse_from_rfc3339(&r.get::<String, _>("due_date"))?.with_timezone(&Utc),
        sla_hours: r.get("sla_hours"),
        status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::any::AnyPoolOptions;
    use std::collections::HashMap;

    async fn pool() -> AnyPool {
        sqlx::any::install_default_drivers();
        let db_name = Uuid::new_v4().to_string();
        let conn = format!("sqlite:file:{db_name}?mode=memory&cache=shared");
        let pool = AnyPoolOptions::new().max_connections(5).connect(&conn).await.unwrap();
        crate::db::schema::migrate(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn stockyard_roundtrips_with_inventory() {
        let pool = pool().await;
        let mut current_inventory = HashMap::new();
        current_inventory.insert("COAL".to_string(), 5000.0);

        let sy = Stockyard {
            id: Uuid::new_v4(),
            code: "SY01".to_string(),
            name: "Central Yard".to_string(),
            location: "Bhilai".to_string(),
            latitude: Some(21.2),
            longitude: Some(81.4),
            capacity_tonnes: 10000.0,
            current_inventory,
        };

        upsert_stockyard(&pool, &sy).await.unwrap();
        let fetched = list_stockyards(&pool).await.unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].current_inventory.get("COAL"), Some(&5000.0));
    }

    #[tokio::test]
    async fn upsert_rake_is_idempotent_on_id() {
        let pool = pool().await;
        let rake = Rake {
            id: Uuid::new_v4(),
            rake_number: "RK001".to_string(),
            wagon_type_code: "BOXN".to_string(),
            num_wagons: 58,
            total_capacity_tonnes: 3480.0,
            status: RakeStatus::Available,
            current_location: None,
        };

        upsert_rake(&pool, &rake).await.unwrap();
        upsert_rake(&pool, &rake).await.unwrap();

        let all = list_rakes(&pool).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn cancel_order_flips_pending_to_cancelled() {
        let pool = pool().await;
        let order = Order {
            id: Uuid::new_v4(),
            order_number: "ORD001".to_string(),
            product_code: "COAL".to_string(),
            quantity_tonnes: 1000.0,
            source_stockyard_id: None,
            destination: "Dest1".to_string(),
            destination_latitude: None,
            destination_longitude: None,
            priority: 1,
            due_date: Utc::now(),
            sla_hours: 48.0,
            status: OrderStatus::Pending,
        };

        create_order(&pool, &order).await.unwrap();
        let cancelled = cancel_order(&pool, &order.id, Utc::now()).await.unwrap();
        assert!(cancelled);

        let pending = list_orders(&pool, Some(OrderStatus::Pending)).await.unwrap();
        assert!(pending.is_empty());
    }
}
