//! Remote store interface
//!
//! The controller only depends on these traits. `SupabaseClient` is the
//! production implementation; tests substitute in-memory fakes.

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};

use crate::error::StoreResult;
use crate::models::{NewUpdate, UpdateRecord};

/// Sort direction for a select
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// A read against one table
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Query {
    /// Equality filters as (column, value)
    pub filters: Vec<(String, String)>,
    /// Column and direction to order by
    pub order: Option<(String, Direction)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Newest first by `created_at`
    pub fn newest_first() -> Self {
        Self::new().order_by("created_at", Direction::Descending)
    }

    /// Add an equality filter
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((column.into(), value.into()));
        self
    }

    /// Set the ordering
    pub fn order_by(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.order = Some((column.into(), direction));
        self
    }
}

/// Read/write access to the remote table
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Whether the handle has the configuration it needs
    fn is_usable(&self) -> bool {
        true
    }

    /// Insert a single row
    async fn insert(&self, table: &str, update: &NewUpdate) -> StoreResult<()>;

    /// Read rows matching the query
    async fn select(&self, table: &str, query: &Query) -> StoreResult<Vec<UpdateRecord>>;
}

/// Which row operations a subscription listens for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeEventMask {
    All,
    Insert,
    Update,
    Delete,
}

impl ChangeEventMask {
    /// Name used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeEventMask::All => "*",
            ChangeEventMask::Insert => "INSERT",
            ChangeEventMask::Update => "UPDATE",
            ChangeEventMask::Delete => "DELETE",
        }
    }
}

/// What to subscribe to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeFilter {
    pub event: ChangeEventMask,
    pub schema: String,
    pub table: String,
}

impl ChangeFilter {
    /// Every insert, update and delete on `schema.table`
    pub fn all(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            event: ChangeEventMask::All,
            schema: schema.into(),
            table: table.into(),
        }
    }

    /// Channel topic for this filter
    pub fn topic(&self) -> String {
        format!("realtime:{}:{}", self.schema, self.table)
    }
}

/// A change notification
///
/// The kind is informational only; consumers must not depend on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeNotification {
    pub kind: Option<String>,
    pub table: Option<String>,
}

/// Connection status of a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// Not connected, not trying
    Disconnected,
    /// Attempting to connect
    Connecting,
    /// Joined and listening
    Subscribed,
}

/// Events emitted by a subscription
#[derive(Debug, Clone)]
pub enum FeedEvent {
    /// Connection status changed
    StatusChanged(ConnectionStatus),
    /// Something changed in the table
    Change(ChangeNotification),
    /// Error occurred
    Error(String),
}

/// Commands sent to a subscription task
#[derive(Debug, Clone)]
pub enum FeedCommand {
    /// Leave the channel and stop the task
    Shutdown,
}

/// Handle to a standing subscription
pub struct Subscription {
    /// Receive events from the subscription task
    pub event_rx: mpsc::Receiver<FeedEvent>,
    /// Send commands to the subscription task
    pub command_tx: mpsc::Sender<FeedCommand>,
    /// Watch connection status
    pub status_rx: watch::Receiver<ConnectionStatus>,
}

impl Subscription {
    pub fn new(
        event_rx: mpsc::Receiver<FeedEvent>,
        command_tx: mpsc::Sender<FeedCommand>,
        status_rx: watch::Receiver<ConnectionStatus>,
    ) -> Self {
        Self {
            event_rx,
            command_tx,
            status_rx,
        }
    }

    /// A subscription that never yields anything
    pub fn inert() -> Self {
        let (_event_tx, event_rx) = mpsc::channel(1);
        let (command_tx, _command_rx) = mpsc::channel(1);
        let (_status_tx, status_rx) = watch::channel(ConnectionStatus::Disconnected);
        Self::new(event_rx, command_tx, status_rx)
    }

    /// Wait for the next event, `None` once the task has stopped
    pub async fn recv(&mut self) -> Option<FeedEvent> {
        self.event_rx.recv().await
    }

    /// Current connection status
    pub fn status(&self) -> ConnectionStatus {
        *self.status_rx.borrow()
    }

    /// Ask the subscription task to stop
    pub async fn shutdown(&self) {
        let _ = self.command_tx.send(FeedCommand::Shutdown).await;
    }
}

/// Source of change notifications
pub trait ChangeFeed: Send + Sync {
    /// Open a standing subscription
    fn subscribe(&self, filter: ChangeFilter) -> Subscription;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_builder() {
        let query = Query::newest_first().eq("site", "HQ");
        assert_eq!(query.filters, vec![("site".to_string(), "HQ".to_string())]);
        assert_eq!(
            query.order,
            Some(("created_at".to_string(), Direction::Descending))
        );
    }

    #[test]
    fn test_change_filter_topic() {
        let filter = ChangeFilter::all("public", "daily_updates");
        assert_eq!(filter.topic(), "realtime:public:daily_updates");
        assert_eq!(filter.event.as_str(), "*");
    }

    #[tokio::test]
    async fn test_inert_subscription_closes() {
        let mut subscription = Subscription::inert();
        assert_eq!(subscription.status(), ConnectionStatus::Disconnected);
        assert!(subscription.recv().await.is_none());
    }
}
