//! Item change feed over Redis Pub/Sub.
//!
//! Every mutation in `queries::items` publishes the raw before/after delta
//! on a single channel. A [`RedisChangeSource`] subscribes to that channel
//! for one filtered view and translates each delta into the event the view
//! should see (an item toggled off a filtered view becomes a delete there).

use futures::stream::{BoxStream, StreamExt};
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::client::{DbError, DbResult, RedisPool};
use crate::queries::items::ItemRow;

/// Pub/Sub channel carrying raw item deltas.
pub const CHANGES_CHANNEL: &str = "taskstream:changes";

/// One of the three filtered views of the item collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemFilter {
    All,
    Active,
    Completed,
}

impl ItemFilter {
    /// All views, in the order their feeds are started.
    pub const VIEWS: [ItemFilter; 3] = [Self::All, Self::Active, Self::Completed];

    /// Parse a view name from a URL path segment.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "all" => Some(Self::All),
            "active" => Some(Self::Active),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }

    /// Status value this view selects on, if any.
    pub fn status(&self) -> Option<&'static str> {
        match self {
            Self::All => None,
            Self::Active => Some("active"),
            Self::Completed => Some("complete"),
        }
    }

    /// Whether an item belongs to this view.
    pub fn matches(&self, item: &ItemRow) -> bool {
        match self.status() {
            None => true,
            Some(status) => item.status == status,
        }
    }
}

/// Raw change record published by mutations: `old` is the pre-change item
/// (None for inserts), `new` the post-change item (None for deletes).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDelta {
    pub old: Option<ItemRow>,
    pub new: Option<ItemRow>,
}

impl ItemDelta {
    pub fn insert(item: ItemRow) -> Self {
        Self { old: None, new: Some(item) }
    }

    pub fn update(old: ItemRow, new: ItemRow) -> Self {
        Self { old: Some(old), new: Some(new) }
    }

    pub fn delete(item: ItemRow) -> Self {
        Self { old: Some(item), new: None }
    }
}

/// Per-view change notification pushed to WebSocket clients.
///
/// Immutable once produced; the hub and every connection read it concurrently.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeEvent {
    /// An item entered the view.
    Insert { item: ItemRow },
    /// An item already in the view changed.
    Update { item: ItemRow },
    /// An item left the view (deleted, or toggled off a filtered view).
    Delete { id: String },
}

impl ChangeEvent {
    /// Translate a raw delta into the event one view observes, if any.
    pub fn from_delta(delta: ItemDelta, filter: ItemFilter) -> Option<Self> {
        let old_matched = delta.old.as_ref().is_some_and(|i| filter.matches(i));
        let new_matches = delta.new.as_ref().is_some_and(|i| filter.matches(i));

        match (old_matched, new_matches) {
            (false, true) => delta.new.map(|item| Self::Insert { item }),
            (true, true) => delta.new.map(|item| Self::Update { item }),
            (true, false) => delta.old.map(|item| Self::Delete { id: item.id }),
            (false, false) => None,
        }
    }
}

/// Publish a delta on the changes channel. Called once per successful write.
pub(crate) async fn publish_delta(pool: &RedisPool, delta: &ItemDelta) -> DbResult<()> {
    let mut conn = pool.clone();
    let json = serde_json::to_string(delta)?;
    conn.publish::<_, _, ()>(CHANGES_CHANNEL, json).await?;
    Ok(())
}

/// Unbounded, ordered sequence of one view's change events.
pub type ChangeStream = BoxStream<'static, Result<ChangeEvent, DbError>>;

/// Subscription primitive over the item collection.
///
/// Implementations yield change events for one view in publication order.
/// The stream ends (or errors) when the underlying connection is lost; the
/// caller is expected to resubscribe.
#[async_trait::async_trait]
pub trait ChangeSource: Send + Sync + 'static {
    async fn subscribe(&self) -> DbResult<ChangeStream>;
}

/// Change source backed by Redis Pub/Sub.
pub struct RedisChangeSource {
    client: redis::Client,
    filter: ItemFilter,
}

impl RedisChangeSource {
    /// Create a source for one view. Does not connect until `subscribe`.
    pub fn connect(redis_url: &str, filter: ItemFilter) -> DbResult<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self { client, filter })
    }
}

#[async_trait::async_trait]
impl ChangeSource for RedisChangeSource {
    async fn subscribe(&self) -> DbResult<ChangeStream> {
        let mut pubsub = self.client.get_async_pubsub().await?;
        pubsub.subscribe(CHANGES_CHANNEL).await?;

        let filter = self.filter;
        let stream = pubsub
            .into_on_message()
            .filter_map(move |msg| {
                let event = decode_delta(&msg)
                    .and_then(|delta| ChangeEvent::from_delta(delta, filter))
                    .map(Ok);
                futures::future::ready(event)
            })
            .boxed();

        Ok(stream)
    }
}

/// Decode a Pub/Sub payload, skipping malformed messages.
fn decode_delta(msg: &redis::Msg) -> Option<ItemDelta> {
    let payload: String = match msg.get_payload() {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "unreadable change feed payload");
            return None;
        }
    };
    match serde_json::from_str(&payload) {
        Ok(delta) => Some(delta),
        Err(e) => {
            warn!(error = %e, "malformed change feed payload");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, status: &str) -> ItemRow {
        ItemRow {
            id: id.to_string(),
            text: "buy milk".to_string(),
            status: status.to_string(),
            created: "2026-01-01T00:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn insert_reaches_matching_views_only() {
        let delta = ItemDelta::insert(item("a", "active"));

        assert_eq!(
            ChangeEvent::from_delta(delta.clone(), ItemFilter::All),
            Some(ChangeEvent::Insert { item: item("a", "active") })
        );
        assert_eq!(
            ChangeEvent::from_delta(delta.clone(), ItemFilter::Active),
            Some(ChangeEvent::Insert { item: item("a", "active") })
        );
        assert_eq!(ChangeEvent::from_delta(delta, ItemFilter::Completed), None);
    }

    #[test]
    fn toggle_is_delete_on_old_view_and_insert_on_new() {
        let delta = ItemDelta::update(item("a", "active"), item("a", "complete"));

        assert_eq!(
            ChangeEvent::from_delta(delta.clone(), ItemFilter::Active),
            Some(ChangeEvent::Delete { id: "a".to_string() })
        );
        assert_eq!(
            ChangeEvent::from_delta(delta.clone(), ItemFilter::Completed),
            Some(ChangeEvent::Insert { item: item("a", "complete") })
        );
        assert_eq!(
            ChangeEvent::from_delta(delta, ItemFilter::All),
            Some(ChangeEvent::Update { item: item("a", "complete") })
        );
    }

    #[test]
    fn delete_only_notifies_views_that_held_the_item() {
        let delta = ItemDelta::delete(item("a", "complete"));

        assert_eq!(ChangeEvent::from_delta(delta.clone(), ItemFilter::Active), None);
        assert_eq!(
            ChangeEvent::from_delta(delta.clone(), ItemFilter::Completed),
            Some(ChangeEvent::Delete { id: "a".to_string() })
        );
        assert_eq!(
            ChangeEvent::from_delta(delta, ItemFilter::All),
            Some(ChangeEvent::Delete { id: "a".to_string() })
        );
    }

    #[test]
    fn filter_parse_round_trips() {
        for view in ItemFilter::VIEWS {
            assert_eq!(ItemFilter::parse(view.as_str()), Some(view));
        }
        assert_eq!(ItemFilter::parse("archived"), None);
    }
}
