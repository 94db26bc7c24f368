//! Application state and logic

use std::time::{Duration, Instant};

use tagup_core::store::ConnectionStatus;
use tagup_core::{
    Alert, Controller, FeedEvent, FormFields, ListView, RenderedRow, SubmitOutcome,
    SupabaseClient,
};
use unicode_width::UnicodeWidthStr;

/// How long status messages stay visible
const STATUS_TIMEOUT: Duration = Duration::from_secs(3);

/// Which form field has focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    Site,
    Text,
}

impl FormField {
    /// Move to the next field (wrapping)
    pub fn next(self) -> Self {
        match self {
            FormField::Name => FormField::Site,
            FormField::Site => FormField::Text,
            FormField::Text => FormField::Name,
        }
    }

    /// Move to the previous field (wrapping)
    pub fn prev(self) -> Self {
        match self {
            FormField::Name => FormField::Text,
            FormField::Site => FormField::Name,
            FormField::Text => FormField::Site,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FormField::Name => "Name",
            FormField::Site => "Site",
            FormField::Text => "Update",
        }
    }
}

/// Realtime status indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RealtimeIndicator {
    /// Joined and listening
    Live,
    /// Connecting or reconnecting
    Connecting,
    /// Disconnected, will retry
    Offline,
    /// Realtime not configured or turned off
    Disabled,
    /// Last event was an error
    Error,
}

impl RealtimeIndicator {
    pub fn from_status(status: ConnectionStatus) -> Self {
        match status {
            ConnectionStatus::Subscribed => RealtimeIndicator::Live,
            ConnectionStatus::Connecting => RealtimeIndicator::Connecting,
            ConnectionStatus::Disconnected => RealtimeIndicator::Offline,
        }
    }
}

/// Modal alert shown over the UI until a key is pressed
#[derive(Debug, Default)]
pub struct ModalAlert {
    pub message: Option<String>,
}

impl Alert for ModalAlert {
    fn alert(&mut self, message: &str) {
        self.message = Some(message.to_string());
    }
}

/// Application state
pub struct App {
    /// Whether the app should exit
    pub should_quit: bool,
    /// Sync-and-render controller (owns the rendered list)
    pub controller: Controller<SupabaseClient, ListView>,
    /// Form being edited
    pub form: FormFields,
    /// Focused form field
    pub focus: FormField,
    /// Cursor position (in chars) within the focused field
    pub cursor: usize,
    /// Author restored into the form after a reset
    pub default_author: Option<String>,
    /// Selected row in the list (for scrolling)
    pub selected: usize,
    /// Validation alert
    pub alert: ModalAlert,
    /// Status message to display temporarily
    pub status_message: Option<String>,
    /// When the status message was set (for auto-dismiss)
    pub status_message_time: Option<Instant>,
    /// Whether help overlay is visible
    pub show_help: bool,
    /// Realtime status indicator
    pub realtime: RealtimeIndicator,
    /// Whether an insert is in flight
    pub is_posting: bool,
}

impl App {
    pub fn new(
        controller: Controller<SupabaseClient, ListView>,
        default_author: Option<String>,
    ) -> Self {
        let mut form = FormFields::default();
        let focus = match default_author.as_deref() {
            Some(author) => {
                form.user_name = author.to_string();
                FormField::Text
            }
            None => FormField::Name,
        };

        let mut app = Self {
            should_quit: false,
            controller,
            form,
            focus,
            cursor: 0,
            default_author,
            selected: 0,
            alert: ModalAlert::default(),
            status_message: None,
            status_message_time: None,
            show_help: false,
            realtime: RealtimeIndicator::Disabled,
            is_posting: false,
        };
        app.cursor = app.field_len();
        app
    }

    /// Rows currently shown
    pub fn rows(&self) -> &[RenderedRow] {
        self.controller
            .view()
            .map(ListView::rows)
            .unwrap_or_default()
    }

    /// Set a status message (will auto-dismiss after 3 seconds)
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
        self.status_message_time = Some(Instant::now());
    }

    /// Check and clear expired status message
    pub fn check_status_timeout(&mut self) {
        if let Some(time) = self.status_message_time {
            if time.elapsed() > STATUS_TIMEOUT {
                self.status_message = None;
                self.status_message_time = None;
            }
        }
    }

    pub fn has_alert(&self) -> bool {
        self.alert.message.is_some()
    }

    pub fn dismiss_alert(&mut self) {
        self.alert.message = None;
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Initial load
    pub async fn load(&mut self) {
        self.controller.load().await;
        self.clamp_selection();
    }

    /// Handle an event from the change subscription
    pub async fn handle_feed_event(&mut self, event: FeedEvent) {
        match &event {
            FeedEvent::StatusChanged(status) => {
                self.realtime = RealtimeIndicator::from_status(*status);
            }
            FeedEvent::Error(_) => {
                self.realtime = RealtimeIndicator::Error;
            }
            FeedEvent::Change(_) => {}
        }

        if self.controller.handle_event(event).await {
            self.clamp_selection();
        }
    }

    /// Submit the form
    pub async fn submit(&mut self) {
        self.is_posting = true;
        let outcome = self.controller.submit(&mut self.form, &mut self.alert).await;
        self.is_posting = false;

        if let SubmitOutcome::Inserted = outcome {
            if let Some(author) = &self.default_author {
                self.form.user_name = author.clone();
            }
            self.set_status("Update posted");
        }
        self.cursor = self.field_len();
    }

    /// Manual reload
    pub async fn reload(&mut self) {
        if self.controller.load().await {
            self.set_status("Reloaded");
        }
        self.clamp_selection();
    }

    /// Scroll the list up
    pub fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Scroll the list down
    pub fn move_down(&mut self) {
        if self.selected < self.rows().len().saturating_sub(1) {
            self.selected += 1;
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.rows().len();
        self.selected = if len == 0 { 0 } else { self.selected.min(len - 1) };
    }

    /// Move focus to the next field
    pub fn next_field(&mut self) {
        self.focus = self.focus.next();
        self.cursor = self.field_len();
    }

    /// Move focus to the previous field
    pub fn prev_field(&mut self) {
        self.focus = self.focus.prev();
        self.cursor = self.field_len();
    }

    /// Value of the given field
    pub fn field(&self, field: FormField) -> &str {
        match field {
            FormField::Name => &self.form.user_name,
            FormField::Site => &self.form.site,
            FormField::Text => &self.form.text,
        }
    }

    fn field_mut(&mut self) -> &mut String {
        match self.focus {
            FormField::Name => &mut self.form.user_name,
            FormField::Site => &mut self.form.site,
            FormField::Text => &mut self.form.text,
        }
    }

    fn field_len(&self) -> usize {
        self.field(self.focus).chars().count()
    }

    /// Insert character at cursor position
    pub fn insert_char(&mut self, c: char) {
        let cursor = self.cursor;
        let field = self.field_mut();
        let idx = byte_index(field, cursor);
        field.insert(idx, c);
        self.cursor += 1;
    }

    /// Delete character before cursor
    pub fn delete_char(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let cursor = self.cursor;
        let field = self.field_mut();
        let idx = byte_index(field, cursor);
        field.remove(idx);
    }

    /// Terminal columns taken by the focused field up to the cursor
    pub fn cursor_column(&self) -> usize {
        let field = self.field(self.focus);
        field[..byte_index(field, self.cursor)].width()
    }

    /// Move cursor left
    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Move cursor right
    pub fn cursor_right(&mut self) {
        if self.cursor < self.field_len() {
            self.cursor += 1;
        }
    }
}

/// Byte offset of the `char_idx`-th character
fn byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}
