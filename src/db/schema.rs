use sqlx::AnyPool;

pub async fn migrate(pool: &AnyPool) -> anyhow::Result<()> {
    // Orders: the demand side of a planning run (§3, §6 "core depends only on").
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS orders (
  id TEXT PRIMARY KEY,
  order_number TEXT NOT NULL,
  product_code TEXT NOT NULL,
  quantity_tonnes DOUBLE PRECISION NOT NULL,
  source_stockyard_id TEXT,
  destination TEXT NOT NULL,
  destination_latitude DOUBLE PRECISION,
  destination_longitude DOUBLE PRECISION,
  priority INTEGER NOT NULL,
  due_date TEXT NOT NULL,
  sla_hours DOUBLE PRECISION NOT NULL,
  status TEXT NOT NULL
);
"#,
    )
    .execute(pool)
    .await?;

    // Stockyards and their per-product inventory snapshot.
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS stockyards (
  id TEXT PRIMARY KEY,
  code TEXT NOT NULL UNIQUE,
  name TEXT NOT NULL,
  location TEXT NOT NULL,
  latitude DOUBLE PRECISION,
  longitude DOUBLE PRECISION,
  capacity_tonnes DOUBLE PRECISION NOT NULL
);
"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS stockyard_inventory (
  stockyard_id TEXT NOT NULL,
  product_code TEXT NOT NULL,
  quantity_tonnes DOUBLE PRECISION NOT NULL,
  PRIMARY KEY (stockyard_id, product_code)
);
"#,
    )
    .execute(pool)
    .await?;

    // Rakes: the supply side.
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS rakes (
  id TEXT PRIMARY KEY,
  rake_number TEXT NOT NULL,
  wagon_type_code TEXT NOT NULL,
  num_wagons INTEGER NOT NULL,
  total_capacity_tonnes DOUBLE PRECISION NOT NULL,
  status TEXT NOT NULL,
  current_location TEXT
);
"#,
    )
    .execute(pool)
    .await?;

    // Planning jobs (§4.8 state machine) and their resulting plans (§4.9).
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS planning_jobs (
  id TEXT PRIMARY KEY,
  scenario_name TEXT NOT NULL,
  notes TEXT,
  config_json TEXT NOT NULL,
  status TEXT NOT NULL,
  progress INTEGER NOT NULL,
  logs TEXT NOT NULL,
  started_at TEXT,
  completed_at TEXT,
  created_at TEXT NOT NULL,
  updated_at TEXT NOT NULL
);
"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS plans (
  id TEXT PRIMARY KEY,
  job_id TEXT NOT NULL,
  scenario_name TEXT NOT NULL,
  total_cost DOUBLE PRECISION NOT NULL,
  freight_cost DOUBLE PRECISION NOT NULL,
  demurrage_cost DOUBLE PRECISION NOT NULL,
  idle_cost DOUBLE PRECISION NOT NULL,
  utilization_pct DOUBLE PRECISION NOT NULL,
  orders_fulfilled INTEGER NOT NULL,
  total_orders INTEGER NOT NULL,
  algorithm TEXT NOT NULL,
  committed INTEGER NOT NULL,
  committed_at TEXT,
  created_at TEXT NOT NULL
);
"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS plan_rakes (
  id TEXT PRIMARY KEY,
  plan_id TEXT NOT NULL,
  rake_number TEXT NOT NULL,
  origin_stockyard_id TEXT,
  destinations_json TEXT NOT NULL,
  total_weight DOUBLE PRECISION NOT NULL,
  utilization_pct DOUBLE PRECISION NOT NULL,
  freight_cost DOUBLE PRECISION NOT NULL
);
"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS plan_rake_orders (
  id TEXT PRIMARY KEY,
  plan_rake_id TEXT NOT NULL,
  order_id TEXT NOT NULL,
  order_number TEXT NOT NULL,
  product_code TEXT NOT NULL,
  quantity_tonnes DOUBLE PRECISION NOT NULL,
  destination TEXT NOT NULL,
  freight_cost DOUBLE PRECISION NOT NULL
);
"#,
    )
    .execute(pool)
    .await?;

    // Reference tables carried over from the original schema (§6: "created
    // so the schema is complete"). No core read/write path touches these —
    // they exist for a future reference-data surface, not for the planner.
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS products (
  code TEXT PRIMARY KEY,
  name TEXT NOT NULL,
  density DOUBLE PRECISION
);
"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS wagon_types (
  code TEXT PRIMARY KEY,
  name TEXT NOT NULL,
  capacity_tonnes DOUBLE PRECISION NOT NULL
);
"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS loading_points (
  id TEXT PRIMARY KEY,
  name TEXT NOT NULL,
  stockyard_id TEXT
);
"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS settings (
  key TEXT PRIMARY KEY,
  value TEXT NOT NULL
);
"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS product_wagon_compatibility (
  product_code TEXT NOT NULL,
  wagon_type_code TEXT NOT NULL,
  PRIMARY KEY (product_code, wagon_type_code)
);
"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(r#"CREATE INDEX IF NOT EXISTS idx_orders_status ON orders(status);"#)
        .execute(pool)
        .await?;

    sqlx::query(r#"CREATE INDEX IF NOT EXISTS idx_planning_jobs_status ON planning_jobs(status);"#)
        .execute(pool)
        .await?;

    sqlx::query(r#"CREATE INDEX IF NOT EXISTS idx_plans_job ON plans(job_id);"#)
        .execute(pool)
        .await?;

    sqlx::query(r#"CREATE INDEX IF NOT EXISTS idx_plan_rakes_plan ON plan_rakes(plan_id);"#)
        .execute(pool)
        .await?;

    sqlx::query(r#"CREATE INDEX IF NOT EXISTS idx_plan_rake_orders_rake ON plan_rake_orders(plan_rake_id);"#)
        .execute(pool)
        .await?;

    Ok(())
}
