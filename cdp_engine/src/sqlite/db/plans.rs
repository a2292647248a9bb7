use sqlx::{sqlite::SqliteRow, FromRow, Row, SqliteConnection};

use crate::{
    db_types::{AiLevel, BillingCycle, Plan},
    sqlite::SqliteDatabaseError,
};

impl FromRow<'_, SqliteRow> for Plan {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        let billing_cycle: String = row.try_get("billing_cycle")?;
        let billing_cycle =
            billing_cycle.parse::<BillingCycle>().map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        let ai_level: String = row.try_get("ai_level")?;
        let ai_level = ai_level.parse::<AiLevel>().map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        Ok(Plan {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            price: row.try_get("price")?,
            billing_cycle,
            description: row.try_get("description")?,
            credits: row.try_get("credits")?,
            ai_level,
            is_pack: row.try_get("is_pack")?,
            display_order: row.try_get("display_order")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

pub async fn fetch_plans(packs_only: bool, conn: &mut SqliteConnection) -> Result<Vec<Plan>, SqliteDatabaseError> {
    let sql = if packs_only {
        "SELECT * FROM plans WHERE is_pack = TRUE ORDER BY display_order ASC"
    } else {
        "SELECT * FROM plans ORDER BY display_order ASC"
    };
    let plans = sqlx::query_as(sql).fetch_all(conn).await?;
    Ok(plans)
}

pub async fn fetch_free_plan(conn: &mut SqliteConnection) -> Result<Option<Plan>, SqliteDatabaseError> {
    let plan = sqlx::query_as("SELECT * FROM plans WHERE price = 0 ORDER BY display_order ASC LIMIT 1")
        .fetch_optional(conn)
        .await?;
    Ok(plan)
}

/// Adds or replaces a plan. Plans are read-only to the gateway's clients, so this is only used for seeding.
pub async fn upsert_plan(plan: &Plan, conn: &mut SqliteConnection) -> Result<(), SqliteDatabaseError> {
    sqlx::query(
        r#"
            INSERT INTO plans (id, name, price, billing_cycle, description, credits, ai_level, is_pack, display_order)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                price = excluded.price,
                billing_cycle = excluded.billing_cycle,
                description = excluded.description,
                credits = excluded.credits,
                ai_level = excluded.ai_level,
                is_pack = excluded.is_pack,
                display_order = excluded.display_order;
        "#,
    )
    .bind(&plan.id)
    .bind(&plan.name)
    .bind(plan.price)
    .bind(plan.billing_cycle.as_str())
    .bind(&plan.description)
    .bind(plan.credits)
    .bind(plan.ai_level.as_str())
    .bind(plan.is_pack)
    .bind(plan.display_order)
    .execute(conn)
    .await?;
    Ok(())
}
