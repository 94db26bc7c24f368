//! Sync-and-render controller
//!
//! Keeps the view consistent with the remote table:
//!
//! 1. `load` reads every row newest first and renders it
//! 2. `subscribe` opens one standing change subscription
//! 3. `on_remote_change` re-runs `load` once per notification
//! 4. `submit` validates the form and inserts one row
//!
//! Every render replaces the whole list. A submission never touches the
//! view directly; the change notification it causes drives the refresh.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::error::StoreError;
use crate::form::{self, Alert, UpdateForm, ValidationError};
use crate::models::UpdateRecord;
use crate::render::{render_rows, UpdatesView};
use crate::store::{ChangeFeed, ChangeFilter, FeedEvent, Query, RemoteStore, Subscription};

/// Lifecycle of the rendered list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// Nothing fetched yet
    Uninitialized,
    /// First fetch in flight
    Loading,
    /// At least one snapshot rendered
    Rendered,
}

/// Result of a form submission
#[derive(Debug)]
pub enum SubmitOutcome {
    /// Validation failed; the user was alerted and nothing was sent
    Rejected(ValidationError),
    /// Row inserted and form cleared
    Inserted,
    /// Insert failed; the form keeps its input
    Failed(StoreError),
}

/// Controller over a store handle and an optional view
///
/// Without a view, loads still run but nothing is displayed.
pub struct Controller<S: ?Sized, V> {
    store: Arc<S>,
    view: Option<V>,
    table: String,
    state: ControllerState,
}

impl<S, V> Controller<S, V>
where
    S: RemoteStore + ?Sized,
    V: UpdatesView,
{
    /// Create a controller for `table`
    pub fn new(store: Arc<S>, view: Option<V>, table: impl Into<String>) -> Self {
        Self {
            store,
            view,
            table: table.into(),
            state: ControllerState::Uninitialized,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// The view, if one is attached
    pub fn view(&self) -> Option<&V> {
        self.view.as_ref()
    }

    /// Table this controller reads and writes
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Shared store handle
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Fetch every row newest first and render it
    ///
    /// Returns `true` if a snapshot was rendered. Failures are logged and
    /// leave the current view untouched.
    pub async fn load(&mut self) -> bool {
        if !self.store.is_usable() {
            debug!("Store not usable, skipping load of {}", self.table);
            return false;
        }

        if self.state == ControllerState::Uninitialized {
            self.state = ControllerState::Loading;
        }

        match self.store.select(&self.table, &Query::newest_first()).await {
            Ok(records) => {
                debug!("Loaded {} updates", records.len());
                self.render(&records);
                true
            }
            Err(e) => {
                error!("Error fetching updates: {}", e);
                if self.state == ControllerState::Loading {
                    self.state = ControllerState::Uninitialized;
                }
                false
            }
        }
    }

    /// Replace the visible list with `records`, in order
    pub fn render(&mut self, records: &[UpdateRecord]) {
        if let Some(view) = self.view.as_mut() {
            view.replace_rows(render_rows(records));
        }
        self.state = ControllerState::Rendered;
    }

    /// Validate the form and insert one row
    ///
    /// Validation failures alert the user and send nothing. Insert failures
    /// are logged only and keep the form populated for a retry.
    pub async fn submit(
        &self,
        form: &mut dyn UpdateForm,
        alert: &mut dyn Alert,
    ) -> SubmitOutcome {
        let update = match form::validate(form) {
            Ok(update) => update,
            Err(e) => {
                alert.alert(&e.to_string());
                return SubmitOutcome::Rejected(e);
            }
        };

        match self.store.insert(&self.table, &update).await {
            Ok(()) => {
                info!("Posted update for {}", update.user_name);
                form.reset();
                SubmitOutcome::Inserted
            }
            Err(e) => {
                error!("Error inserting update: {}", e);
                SubmitOutcome::Failed(e)
            }
        }
    }

    /// Open the standing subscription for this controller's table
    ///
    /// Returns an inert subscription when the store is not usable.
    pub fn subscribe<F>(&self, feed: &F, schema: &str) -> Subscription
    where
        F: ChangeFeed + ?Sized,
    {
        if !self.store.is_usable() {
            return Subscription::inert();
        }
        feed.subscribe(ChangeFilter::all(schema, self.table.clone()))
    }

    /// Handle one change notification: re-read and re-render
    pub async fn on_remote_change(&mut self) -> bool {
        self.load().await
    }

    /// Dispatch a subscription event
    ///
    /// Returns `true` if the event caused a re-render.
    pub async fn handle_event(&mut self, event: FeedEvent) -> bool {
        match event {
            FeedEvent::Change(_) => self.on_remote_change().await,
            FeedEvent::StatusChanged(status) => {
                debug!("Subscription status: {:?}", status);
                false
            }
            FeedEvent::Error(message) => {
                warn!("Subscription error: {}", message);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreResult;
    use crate::form::FormFields;
    use crate::models::NewUpdate;
    use crate::render::ListView;
    use crate::store::{ChangeNotification, ConnectionStatus, Direction};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::{mpsc, watch};

    #[derive(Default)]
    struct FakeStore {
        rows: Mutex<Vec<UpdateRecord>>,
        inserts: Mutex<Vec<NewUpdate>>,
        queries: Mutex<Vec<Query>>,
        select_calls: AtomicUsize,
        fail_select: AtomicBool,
        fail_insert: AtomicBool,
        unusable: bool,
    }

    impl FakeStore {
        fn with_rows(rows: Vec<UpdateRecord>) -> Arc<Self> {
            Arc::new(Self {
                rows: Mutex::new(rows),
                ..Self::default()
            })
        }

        fn set_rows(&self, rows: Vec<UpdateRecord>) {
            *self.rows.lock().unwrap() = rows;
        }

        fn selects(&self) -> usize {
            self.select_calls.load(Ordering::SeqCst)
        }

        fn inserted(&self) -> Vec<NewUpdate> {
            self.inserts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RemoteStore for FakeStore {
        fn is_usable(&self) -> bool {
            !self.unusable
        }

        async fn insert(&self, _table: &str, update: &NewUpdate) -> StoreResult<()> {
            if self.fail_insert.load(Ordering::SeqCst) {
                return Err(StoreError::Api {
                    status: 503,
                    message: "unavailable".to_string(),
                    code: None,
                });
            }
            self.inserts.lock().unwrap().push(update.clone());
            Ok(())
        }

        async fn select(&self, _table: &str, query: &Query) -> StoreResult<Vec<UpdateRecord>> {
            self.select_calls.fetch_add(1, Ordering::SeqCst);
            self.queries.lock().unwrap().push(query.clone());
            if self.fail_select.load(Ordering::SeqCst) {
                return Err(StoreError::Realtime("connection reset".to_string()));
            }
            Ok(self.rows.lock().unwrap().clone())
        }
    }

    #[derive(Default)]
    struct FakeFeed {
        filters: Mutex<Vec<ChangeFilter>>,
        sender: Mutex<Option<mpsc::Sender<FeedEvent>>>,
    }

    impl FakeFeed {
        async fn notify(&self) {
            let sender = self.sender.lock().unwrap().clone();
            if let Some(tx) = sender {
                tx.send(FeedEvent::Change(ChangeNotification {
                    kind: Some("INSERT".to_string()),
                    table: Some("daily_updates".to_string()),
                }))
                .await
                .unwrap();
            }
        }
    }

    impl ChangeFeed for FakeFeed {
        fn subscribe(&self, filter: ChangeFilter) -> Subscription {
            self.filters.lock().unwrap().push(filter);
            let (event_tx, event_rx) = mpsc::channel(16);
            let (command_tx, _command_rx) = mpsc::channel(1);
            let (_status_tx, status_rx) = watch::channel(ConnectionStatus::Subscribed);
            *self.sender.lock().unwrap() = Some(event_tx);
            Subscription::new(event_rx, command_tx, status_rx)
        }
    }

    #[derive(Default)]
    struct RecordingAlert {
        messages: Vec<String>,
    }

    impl Alert for RecordingAlert {
        fn alert(&mut self, message: &str) {
            self.messages.push(message.to_string());
        }
    }

    fn record(hour: u32, user: &str, site: Option<&str>, text: &str) -> UpdateRecord {
        UpdateRecord {
            id: Some(serde_json::json!(hour)),
            created_at: Some(Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap()),
            user_name: Some(user.to_string()),
            site: site.map(str::to_string),
            text: Some(text.to_string()),
        }
    }

    fn controller(store: &Arc<FakeStore>) -> Controller<FakeStore, ListView> {
        Controller::new(store.clone(), Some(ListView::new()), "daily_updates")
    }

    fn names(controller: &Controller<FakeStore, ListView>) -> Vec<String> {
        controller
            .view()
            .unwrap()
            .rows()
            .iter()
            .map(|r| r.user_name.clone())
            .collect()
    }

    #[tokio::test]
    async fn test_snapshot_renders_newest_first_with_site_labels() {
        let store = FakeStore::with_rows(vec![
            record(10, "Bo", Some("HQ"), "Shipped v2"),
            record(9, "Ann", None, "Started review"),
        ]);
        let mut controller = controller(&store);

        assert!(controller.load().await);

        let lines = controller.view().unwrap().lines();
        let t2 = crate::render::format_timestamp(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap());
        let t1 = crate::render::format_timestamp(Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap());
        assert_eq!(
            lines,
            vec![
                format!("{} – Bo [HQ]: Shipped v2", t2),
                format!("{} – Ann: Started review", t1),
            ]
        );
    }

    #[tokio::test]
    async fn test_load_requests_created_at_descending() {
        let store = FakeStore::with_rows(Vec::new());
        let mut controller = controller(&store);
        controller.load().await;

        let queries = store.queries.lock().unwrap().clone();
        assert_eq!(
            queries[0].order,
            Some(("created_at".to_string(), Direction::Descending))
        );
        assert!(queries[0].filters.is_empty());
    }

    #[tokio::test]
    async fn test_state_transitions() {
        let store = FakeStore::with_rows(vec![record(9, "Ann", None, "a")]);
        let mut controller = controller(&store);
        assert_eq!(controller.state(), ControllerState::Uninitialized);

        controller.load().await;
        assert_eq!(controller.state(), ControllerState::Rendered);

        controller.on_remote_change().await;
        assert_eq!(controller.state(), ControllerState::Rendered);
    }

    #[tokio::test]
    async fn test_first_load_failure_leaves_empty_list() {
        let store = FakeStore::with_rows(vec![record(9, "Ann", None, "a")]);
        store.fail_select.store(true, Ordering::SeqCst);
        let mut controller = controller(&store);

        assert!(!controller.load().await);
        assert!(controller.view().unwrap().is_empty());
        assert_eq!(controller.view().unwrap().render_count(), 0);
        assert_eq!(controller.state(), ControllerState::Uninitialized);
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_last_rendered_list() {
        let store = FakeStore::with_rows(vec![record(9, "Ann", None, "a")]);
        let mut controller = controller(&store);
        controller.load().await;

        store.fail_select.store(true, Ordering::SeqCst);
        store.set_rows(Vec::new());
        assert!(!controller.on_remote_change().await);

        assert_eq!(names(&controller), vec!["Ann"]);
        assert_eq!(controller.state(), ControllerState::Rendered);
    }

    #[tokio::test]
    async fn test_unusable_store_skips_load() {
        let store = Arc::new(FakeStore {
            unusable: true,
            ..FakeStore::default()
        });
        let mut controller = controller(&store);

        assert!(!controller.load().await);
        assert_eq!(store.selects(), 0);
        assert_eq!(controller.state(), ControllerState::Uninitialized);
    }

    #[tokio::test]
    async fn test_missing_view_is_a_noop() {
        let store = FakeStore::with_rows(vec![record(9, "Ann", None, "a")]);
        let mut controller: Controller<FakeStore, ListView> =
            Controller::new(store.clone(), None, "daily_updates");

        assert!(controller.load().await);
        assert!(controller.view().is_none());
        assert_eq!(store.selects(), 1);
    }

    #[tokio::test]
    async fn test_render_is_idempotent() {
        let store = FakeStore::with_rows(Vec::new());
        let mut controller = controller(&store);
        let records = vec![
            record(11, "Cy", None, "c"),
            record(10, "Bo", Some("HQ"), "b"),
            record(9, "Ann", None, "a"),
        ];

        controller.render(&records);
        let first = controller.view().unwrap().rows().to_vec();
        controller.render(&records);
        let second = controller.view().unwrap().rows().to_vec();

        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
        assert_eq!(names(&controller), vec!["Cy", "Bo", "Ann"]);
    }

    #[tokio::test]
    async fn test_submit_rejects_missing_fields() {
        let store = FakeStore::with_rows(Vec::new());
        let controller = controller(&store);

        let cases = [
            FormFields::new("", "HQ", "Shipped"),
            FormFields::new("Bo", "HQ", "  "),
            FormFields::new("  ", "", ""),
        ];

        for original in cases {
            let mut form = original.clone();
            let mut alert = RecordingAlert::default();

            let outcome = controller.submit(&mut form, &mut alert).await;

            assert!(matches!(
                outcome,
                SubmitOutcome::Rejected(ValidationError::MissingFields)
            ));
            assert_eq!(alert.messages, vec![form::MISSING_FIELDS_MESSAGE.to_string()]);
            assert_eq!(form, original);
        }
        assert!(store.inserted().is_empty());
    }

    #[tokio::test]
    async fn test_submit_blank_site_is_absent() {
        let store = FakeStore::with_rows(Vec::new());
        let controller = controller(&store);
        let mut form = FormFields::new("Ann", "   ", "Started review");

        let outcome = controller
            .submit(&mut form, &mut RecordingAlert::default())
            .await;

        assert!(matches!(outcome, SubmitOutcome::Inserted));
        assert_eq!(
            store.inserted(),
            vec![NewUpdate {
                user_name: "Ann".to_string(),
                site: None,
                text: "Started review".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_submit_trims_site_and_keeps_internal_whitespace() {
        let store = FakeStore::with_rows(Vec::new());
        let controller = controller(&store);
        let mut form = FormFields::new(" Bo ", "  North  Yard ", " Shipped v2 ");

        controller
            .submit(&mut form, &mut RecordingAlert::default())
            .await;

        let inserted = store.inserted();
        assert_eq!(inserted.len(), 1);
        assert_eq!(inserted[0].site.as_deref(), Some("North  Yard"));
        assert_eq!(inserted[0].user_name, "Bo");
        assert_eq!(inserted[0].text, "Shipped v2");
    }

    #[tokio::test]
    async fn test_submit_success_clears_form_without_touching_view() {
        let store = FakeStore::with_rows(vec![record(9, "Ann", None, "a")]);
        let mut controller = controller(&store);
        controller.load().await;
        let renders = controller.view().unwrap().render_count();

        let mut form = FormFields::new("Bo", "HQ", "Shipped v2");
        let mut alert = RecordingAlert::default();
        let outcome = controller.submit(&mut form, &mut alert).await;

        assert!(matches!(outcome, SubmitOutcome::Inserted));
        assert!(form.is_empty());
        assert!(alert.messages.is_empty());
        assert_eq!(controller.view().unwrap().render_count(), renders);
        assert_eq!(names(&controller), vec!["Ann"]);
        assert_eq!(store.selects(), 1);
    }

    #[tokio::test]
    async fn test_submit_failure_keeps_form_and_does_not_alert() {
        let store = FakeStore::with_rows(Vec::new());
        store.fail_insert.store(true, Ordering::SeqCst);
        let controller = controller(&store);

        let original = FormFields::new("Bo", "HQ", "Shipped v2");
        let mut form = original.clone();
        let mut alert = RecordingAlert::default();
        let outcome = controller.submit(&mut form, &mut alert).await;

        assert!(matches!(outcome, SubmitOutcome::Failed(_)));
        assert_eq!(form, original);
        assert!(alert.messages.is_empty());
    }

    #[tokio::test]
    async fn test_notification_triggers_one_reload_and_replaces_view() {
        let store = FakeStore::with_rows(vec![
            record(9, "Ann", None, "a"),
            record(8, "Old", None, "stale"),
        ]);
        let feed = FakeFeed::default();
        let mut controller = controller(&store);
        controller.load().await;
        let mut subscription = controller.subscribe(&feed, "public");

        store.set_rows(vec![
            record(10, "Bo", Some("HQ"), "b"),
            record(9, "Ann", None, "a"),
        ]);
        feed.notify().await;

        let event = subscription.recv().await.unwrap();
        let before = store.selects();
        assert!(controller.handle_event(event).await);

        assert_eq!(store.selects(), before + 1);
        assert_eq!(names(&controller), vec!["Bo", "Ann"]);
    }

    #[tokio::test]
    async fn test_each_notification_reloads_once() {
        let store = FakeStore::with_rows(vec![record(9, "Ann", None, "a")]);
        let feed = FakeFeed::default();
        let mut controller = controller(&store);
        let mut subscription = controller.subscribe(&feed, "public");

        for _ in 0..3 {
            feed.notify().await;
        }
        for _ in 0..3 {
            let event = subscription.recv().await.unwrap();
            controller.handle_event(event).await;
        }

        assert_eq!(store.selects(), 3);
        assert_eq!(controller.view().unwrap().render_count(), 3);
    }

    #[tokio::test]
    async fn test_status_and_error_events_do_not_reload() {
        let store = FakeStore::with_rows(Vec::new());
        let mut controller = controller(&store);

        assert!(
            !controller
                .handle_event(FeedEvent::StatusChanged(ConnectionStatus::Subscribed))
                .await
        );
        assert!(
            !controller
                .handle_event(FeedEvent::Error("boom".to_string()))
                .await
        );
        assert_eq!(store.selects(), 0);
    }

    #[tokio::test]
    async fn test_subscribe_scopes_to_schema_and_table() {
        let store = FakeStore::with_rows(Vec::new());
        let feed = FakeFeed::default();
        let controller = controller(&store);

        let subscription = controller.subscribe(&feed, "public");

        assert_eq!(subscription.status(), ConnectionStatus::Subscribed);
        assert_eq!(
            feed.filters.lock().unwrap().clone(),
            vec![ChangeFilter::all("public", "daily_updates")]
        );
    }

    #[tokio::test]
    async fn test_subscribe_skipped_for_unusable_store() {
        let store = Arc::new(FakeStore {
            unusable: true,
            ..FakeStore::default()
        });
        let feed = FakeFeed::default();
        let controller = controller(&store);

        let mut subscription = controller.subscribe(&feed, "public");

        assert!(feed.filters.lock().unwrap().is_empty());
        assert!(subscription.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_submit_then_notification_shows_new_row() {
        let store = FakeStore::with_rows(vec![record(9, "Ann", None, "Started review")]);
        let feed = FakeFeed::default();
        let mut controller = controller(&store);
        controller.load().await;
        let mut subscription = controller.subscribe(&feed, "public");

        let mut form = FormFields::new("Bo", "HQ", "Shipped v2");
        controller
            .submit(&mut form, &mut RecordingAlert::default())
            .await;
        assert_eq!(names(&controller), vec!["Ann"]);

        // The server applies the insert and notifies
        store.set_rows(vec![
            record(10, "Bo", Some("HQ"), "Shipped v2"),
            record(9, "Ann", None, "Started review"),
        ]);
        feed.notify().await;
        let event = subscription.recv().await.unwrap();
        controller.handle_event(event).await;

        assert_eq!(names(&controller), vec!["Bo", "Ann"]);
        assert!(controller.view().unwrap().lines()[0].contains("Bo [HQ]: Shipped v2"));
    }
}
