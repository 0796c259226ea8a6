//! Item queries — Redis implementation.
//!
//! Items live in a hash per item plus a sorted set ordered by creation time
//! and a set per status. Every mutation publishes its delta on the change
//! feed after the write succeeds.

use chrono::Utc;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};

use crate::changes::{self, ItemDelta};
use crate::client::{DbError, DbResult, RedisPool};

/// A task-list item as stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemRow {
    pub id: String,
    pub text: String,
    pub status: String,
    pub created: String,
}

fn item_key(id: &str) -> String {
    format!("taskstream:item:{}", id)
}

fn status_key(status: &str) -> String {
    format!("taskstream:items:status:{}", status)
}

const CREATED_INDEX: &str = "taskstream:items:by_created";

/// Create a new item with status `active`.
pub async fn create_item(pool: &RedisPool, id: &str, text: &str) -> DbResult<ItemRow> {
    let now = Utc::now();
    let row = ItemRow {
        id: id.to_string(),
        text: text.to_string(),
        status: "active".to_string(),
        created: now.to_rfc3339(),
    };
    save_item(pool, &row, now.timestamp_millis()).await?;

    changes::publish_delta(pool, &ItemDelta::insert(row.clone())).await?;
    Ok(row)
}

async fn save_item(pool: &RedisPool, row: &ItemRow, score: i64) -> DbResult<()> {
    let mut conn = pool.clone();
    let key = item_key(&row.id);
    let json = serde_json::to_string(row)?;
    conn.hset::<_, _, _, ()>(&key, "data", &json).await?;
    conn.hset::<_, _, _, ()>(&key, "status", &row.status).await?;

    // Creation-time ordering
    conn.zadd::<_, _, _, ()>(CREATED_INDEX, &row.id, score).await?;

    // Status index
    conn.sadd::<_, _, ()>(status_key(&row.status), &row.id).await?;

    Ok(())
}

/// Get an item by ID.
pub async fn get_item(pool: &RedisPool, id: &str) -> DbResult<ItemRow> {
    let mut conn = pool.clone();
    let json: Option<String> = conn.hget(item_key(id), "data").await?;
    match json {
        Some(j) => Ok(serde_json::from_str(&j)?),
        None => Err(DbError::NotFound(format!("Item not found: {}", id))),
    }
}

/// Set an item's status. Returns the updated row.
pub async fn update_item_status(pool: &RedisPool, id: &str, status: &str) -> DbResult<ItemRow> {
    let old = get_item(pool, id).await?;
    let mut new = old.clone();
    new.status = status.to_string();

    let mut conn = pool.clone();
    let key = item_key(id);
    let json = serde_json::to_string(&new)?;
    conn.hset::<_, _, _, ()>(&key, "data", &json).await?;
    conn.hset::<_, _, _, ()>(&key, "status", &new.status).await?;
    conn.srem::<_, _, ()>(status_key(&old.status), id).await?;
    conn.sadd::<_, _, ()>(status_key(&new.status), id).await?;

    changes::publish_delta(pool, &ItemDelta::update(old, new.clone())).await?;
    Ok(new)
}

/// Delete an item.
pub async fn delete_item(pool: &RedisPool, id: &str) -> DbResult<()> {
    let old = get_item(pool, id).await?;
    remove_item(pool, &old).await?;

    changes::publish_delta(pool, &ItemDelta::delete(old)).await?;
    Ok(())
}

/// Delete all completed items. Returns the number deleted.
pub async fn clear_completed(pool: &RedisPool) -> DbResult<u64> {
    let mut conn = pool.clone();
    let ids: Vec<String> = conn.smembers(status_key("complete")).await?;

    let mut deleted = 0;
    for id in ids {
        // The item may have been toggled or deleted since the scan
        let old = match get_item(pool, &id).await {
            Ok(row) if row.status == "complete" => row,
            Ok(_) => continue,
            Err(DbError::NotFound(_)) => continue,
            Err(e) => return Err(e),
        };
        remove_item(pool, &old).await?;
        changes::publish_delta(pool, &ItemDelta::delete(old)).await?;
        deleted += 1;
    }
    Ok(deleted)
}

async fn remove_item(pool: &RedisPool, row: &ItemRow) -> DbResult<()> {
    let mut conn = pool.clone();
    conn.del::<_, ()>(item_key(&row.id)).await?;
    conn.zrem::<_, _, ()>(CREATED_INDEX, &row.id).await?;
    conn.srem::<_, _, ()>(status_key(&row.status), &row.id).await?;
    Ok(())
}

/// List items ordered by creation time, optionally restricted to one status.
pub async fn list_items(pool: &RedisPool, status: Option<&str>) -> DbResult<Vec<ItemRow>> {
    let mut conn = pool.clone();
    let ids: Vec<String> = conn.zrange(CREATED_INDEX, 0, -1).await?;

    let mut items = Vec::new();
    for id in ids {
        let mut c = pool.clone();
        let json: Option<String> = c.hget(item_key(&id), "data").await?;
        if let Some(j) = json {
            if let Ok(row) = serde_json::from_str::<ItemRow>(&j) {
                if status.is_none_or(|s| row.status == s) {
                    items.push(row);
                }
            }
        }
    }
    Ok(items)
}
