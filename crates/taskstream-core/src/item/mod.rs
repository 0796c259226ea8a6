//! Item management.

pub mod model;

use crate::error::{TaskError, TaskResult};
use model::{Item, ItemStatus};
use taskstream_db::items as queries;
use taskstream_db::{DbError, ItemFilter, RedisPool};
use uuid::Uuid;

/// Create a new item. New items start out active.
pub async fn create_item(pool: &RedisPool, text: &str) -> TaskResult<Item> {
    let text = text.trim();
    if text.is_empty() {
        return Err(TaskError::validation("item text cannot be empty"));
    }

    let id = Uuid::new_v4().to_string();
    let row = queries::create_item(pool, &id, text).await?;
    Ok(Item::from_row(row))
}

/// Flip an item between active and complete.
pub async fn toggle_item(pool: &RedisPool, id: &str) -> TaskResult<Item> {
    let row = queries::get_item(pool, id).await.map_err(not_found(id))?;
    let next = ItemStatus::from_str(&row.status).toggled();

    let row = queries::update_item_status(pool, id, next.as_str())
        .await
        .map_err(not_found(id))?;
    Ok(Item::from_row(row))
}

/// Delete an item.
pub async fn delete_item(pool: &RedisPool, id: &str) -> TaskResult<()> {
    queries::delete_item(pool, id).await.map_err(not_found(id))?;
    Ok(())
}

/// Delete all completed items. Returns the number deleted.
pub async fn clear_completed(pool: &RedisPool) -> TaskResult<u64> {
    Ok(queries::clear_completed(pool).await?)
}

/// List items for one view, ordered by creation time.
pub async fn list_items(pool: &RedisPool, filter: ItemFilter) -> TaskResult<Vec<Item>> {
    let rows = queries::list_items(pool, filter.status()).await?;
    Ok(rows.into_iter().map(Item::from_row).collect())
}

fn not_found(id: &str) -> impl FnOnce(DbError) -> TaskError + '_ {
    move |e| match e {
        DbError::NotFound(_) => TaskError::ItemNotFound(id.to_string()),
        other => TaskError::Database(other),
    }
}
