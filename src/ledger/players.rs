use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

use crate::models::{Player, PlayerUpsert};

pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Player>, sqlx::Error> {
    sqlx::query_as::<_, Player>("SELECT * FROM players WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Batch fetch, never a loop of single-row queries.
pub async fn get_by_ids(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<Player>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    sqlx::query_as::<_, Player>("SELECT * FROM players WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(pool)
        .await
}

#[derive(Debug, Default, Clone)]
pub struct PlayerSearch {
    pub search: Option<String>,
    pub team: Option<String>,
    pub position: Option<String>,
    pub has_buy_orders: Option<bool>,
    pub has_sell_orders: Option<bool>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

/// Backs `GET /api/players`. Sorting/filtering happen in SQL so the handler
/// issues exactly one query regardless of page size.
pub async fn search(pool: &PgPool, params: &PlayerSearch) -> Result<Vec<Player>, sqlx::Error> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT p.* FROM players p WHERE 1 = 1");

    if let Some(search) = &params.search {
        qb.push(" AND p.name ILIKE ");
        qb.push_bind(format!("%{}%", search));
    }
    if let Some(team) = &params.team {
        qb.push(" AND p.team = ");
        qb.push_bind(team.clone());
    }
    if let Some(position) = &params.position {
        qb.push(" AND p.position = ");
        qb.push_bind(position.clone());
    }
    if params.has_buy_orders == Some(true) {
        qb.push(" AND EXISTS (SELECT 1 FROM orders o WHERE o.player_id = p.id AND o.side = 'buy' AND o.status IN ('open','partial'))");
    }
    if params.has_sell_orders == Some(true) {
        qb.push(" AND EXISTS (SELECT 1 FROM orders o WHERE o.player_id = p.id AND o.side = 'sell' AND o.status IN ('open','partial'))");
    }

    let order_column = match params.sort_by.as_deref() {
        Some("volume") => "p.volume_24h",
        Some("change") => "p.price_change_24h",
        _ => "p.last_trade_price",
    };
    let direction = if params.sort_order.as_deref() == Some("asc") { "ASC" } else { "DESC" };
    qb.push(format!(" ORDER BY {} {} NULLS LAST", order_column, direction));
    qb.push(" LIMIT ");
    qb.push_bind(params.limit);
    qb.push(" OFFSET ");
    qb.push_bind(params.offset);

    qb.build_query_as::<Player>().fetch_all(pool).await
}

pub async fn upsert(pool: &PgPool, external_id: &str, payload: &PlayerUpsert) -> Result<Player, sqlx::Error> {
    sqlx::query_as::<_, Player>(
        r#"
        INSERT INTO players (id, external_id, name, team, position, is_active, is_eligible_for_accrual, last_trade_price, volume_24h, price_change_24h)
        VALUES ($1, $2, $3, $4, $5, $6, true, NULL, 0, 0)
        ON CONFLICT (external_id) DO UPDATE SET
            name = EXCLUDED.name,
            team = EXCLUDED.team,
            position = EXCLUDED.position,
            is_active = EXCLUDED.is_active
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(external_id)
    .bind(&payload.name)
    .bind(&payload.team)
    .bind(&payload.position)
    .bind(payload.is_active)
    .fetch_one(pool)
    .await
}

pub async fn list_accrual_eligible(pool: &PgPool) -> Result<Vec<Player>, sqlx::Error> {
    sqlx::query_as::<_, Player>("SELECT * FROM players WHERE is_eligible_for_accrual = true AND is_active = true")
        .fetch_all(pool)
        .await
}

pub async fn list_active(pool: &PgPool) -> Result<Vec<Player>, sqlx::Error> {
    sqlx::query_as::<_, Player>("SELECT * FROM players WHERE is_active = true")
        .fetch_all(pool)
        .await
}

/// Applied on every executed trade: sets the last-trade price
/// and accumulates rolling 24h volume.
pub async fn record_trade_price_tx(
    tx: &mut Transaction<'_, Postgres>,
    player_id: Uuid,
    price: Decimal,
    quantity: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE players SET last_trade_price = $2, volume_24h = volume_24h + $3 WHERE id = $1",
    )
    .bind(player_id)
    .bind(price)
    .bind(Decimal::from(quantity))
    .execute(&mut **tx)
    .await?;
    Ok(())
}
