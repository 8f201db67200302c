//! Application state and logic

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::Instant;

use msgview_core::{
    Activation, ContainerId, ControlAction, ControlFace, MessageRecord, Page, PresentationState,
    Widget,
};

use crate::clipboard::{spawn_copy, ClipboardBackend, CopyOutcome, CopyPath, CopyReport, CopyRequest};
use crate::components::max_scroll;
use crate::config::ViewerConfig;
use crate::feedback::CopyConfirmations;

/// Application state
pub struct App {
    /// Containers and their widgets
    pub page: Page,
    /// Selected container
    pub selected: Option<ContainerId>,
    /// Control of the selected container that Enter activates
    pub focus: ControlAction,
    pub config: ViewerConfig,
    /// File name or `stdin`
    pub source_name: String,
    /// Live mode (poll the input for appended records)
    pub live_mode: bool,
    /// Show help overlay
    pub show_help: bool,
    /// Blocking alert; must be dismissed before anything else
    pub alert: Option<String>,
    /// Status message
    pub status_message: Option<String>,
    pub confirmations: CopyConfirmations,
    /// Width of the message list in columns, as last drawn
    pub list_width: u16,
    clipboard: Arc<dyn ClipboardBackend>,
    copy_tx: Sender<CopyReport>,
    copy_rx: Receiver<CopyReport>,
    copies_in_flight: usize,
}

impl App {
    /// Create a new app over an already built page
    pub fn new(
        page: Page,
        source_name: impl Into<String>,
        config: ViewerConfig,
        clipboard: Arc<dyn ClipboardBackend>,
    ) -> Self {
        let (copy_tx, copy_rx) = mpsc::channel();
        let selected = page.containers().first().map(|c| c.id);
        let live_mode = config.live;

        Self {
            page,
            selected,
            focus: ControlAction::Toggle,
            config,
            source_name: source_name.into(),
            live_mode,
            show_help: false,
            alert: None,
            status_message: None,
            confirmations: CopyConfirmations::new(),
            list_width: 80,
            clipboard,
            copy_tx,
            copy_rx,
            copies_in_flight: 0,
        }
    }

    /// Index of the selected container in page order
    pub fn selected_index(&self) -> Option<usize> {
        self.selected.and_then(|id| self.page.index_of(id))
    }

    /// Widget of the selected container, if it has one
    pub fn selected_widget(&self) -> Option<&Widget> {
        self.selected.and_then(|id| self.page.widget(id))
    }

    fn select_index(&mut self, index: usize) {
        if let Some(container) = self.page.containers().get(index) {
            self.selected = Some(container.id);
        }
    }

    /// Move selection up
    pub fn select_prev(&mut self) {
        match self.selected_index() {
            Some(i) if i > 0 => self.select_index(i - 1),
            Some(_) => {}
            None => self.select_first(),
        }
    }

    /// Move selection down
    pub fn select_next(&mut self) {
        match self.selected_index() {
            Some(i) => self.select_index(i + 1),
            None => self.select_first(),
        }
    }

    /// Go to first container
    pub fn select_first(&mut self) {
        self.select_index(0);
    }

    /// Go to last container
    pub fn select_last(&mut self) {
        self.select_index(self.page.len().saturating_sub(1));
    }

    /// Page up
    pub fn page_up(&mut self, page_size: usize) {
        let current = self.selected_index().unwrap_or(0);
        self.select_index(current.saturating_sub(page_size));
    }

    /// Page down
    pub fn page_down(&mut self, page_size: usize) {
        let current = self.selected_index().unwrap_or(0);
        let last = self.page.len().saturating_sub(1);
        self.select_index((current + page_size).min(last));
    }

    /// Move focus to the other control
    pub fn focus_next(&mut self) {
        self.focus = match self.focus {
            ControlAction::Toggle => ControlAction::Copy,
            ControlAction::Copy => ControlAction::Toggle,
        };
    }

    /// Two controls per container, so previous and next coincide
    pub fn focus_prev(&mut self) {
        self.focus_next();
    }

    /// Activate the focused control of the selected container
    pub fn activate_focused(&mut self) {
        self.activate(self.focus);
    }

    /// Expand or collapse the selected container
    pub fn toggle_selected(&mut self) {
        self.activate(ControlAction::Toggle);
    }

    /// Copy the selected container's expanded text
    pub fn copy_selected(&mut self) {
        self.activate(ControlAction::Copy);
    }

    /// Dispatch through the page's handler table, the same way a click would
    fn activate(&mut self, action: ControlAction) {
        let Some(widget) = self.selected_widget() else {
            self.status_message = Some("No payload to act on".to_string());
            return;
        };
        let control = match action {
            ControlAction::Toggle => widget.toggle.id,
            ControlAction::Copy => widget.copy.id,
        };

        match self.page.activate(control) {
            Some(Activation::Toggled { container, state }) => {
                tracing::debug!(container = container.0, ?state, "toggled");
            }
            Some(Activation::CopyRequested { container, text }) => {
                self.start_copy(container, text);
            }
            None => {
                tracing::warn!(control = control.0, "control has no handler");
            }
        }
    }

    /// Hand a copy to a worker thread; the result arrives via `poll_copy_reports`
    fn start_copy(&mut self, container: ContainerId, text: String) {
        let restore = self
            .confirmations
            .resting_face(&self.page, container)
            .unwrap_or(ControlFace::COPY);
        tracing::debug!(container = container.0, chars = text.chars().count(), "copy requested");

        spawn_copy(
            Arc::clone(&self.clipboard),
            CopyRequest {
                container,
                text,
                restore,
            },
            self.copy_tx.clone(),
        );
        self.copies_in_flight += 1;
    }

    /// Apply every finished copy. Returns how many were applied.
    pub fn poll_copy_reports(&mut self, now: Instant) -> usize {
        let mut applied = 0;
        while let Ok(report) = self.copy_rx.try_recv() {
            self.apply_copy_report(report, now);
            applied += 1;
        }
        applied
    }

    /// Update the copy control and status for one finished copy
    pub fn apply_copy_report(&mut self, report: CopyReport, now: Instant) {
        self.copies_in_flight = self.copies_in_flight.saturating_sub(1);
        let container = report.container;

        match report.outcome {
            CopyOutcome::Copied(path) => {
                self.confirmations
                    .confirm(&mut self.page, container, path, report.restore, now);
                let via = match path {
                    CopyPath::Primary => "clipboard",
                    CopyPath::Fallback => "clipboard helper",
                };
                tracing::info!(container = container.0, chars = report.chars, via, "copied");
                self.status_message = Some(format!("Copied {} chars", report.chars));
            }
            CopyOutcome::PrimaryFailed(e) => {
                tracing::error!(container = container.0, error = %e, "copy failed");
            }
            CopyOutcome::Failed(e) => {
                tracing::error!(container = container.0, error = %e, "copy failed on every path");
                self.alert = Some(format!("Copy failed: {}", e));
            }
        }
    }

    /// Number of copies still running
    pub fn copies_in_flight(&self) -> usize {
        self.copies_in_flight
    }

    /// Revert due confirmations. Returns whether anything changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.confirmations.tick(&mut self.page, now) > 0
    }

    /// Add newly arrived records and set up their containers
    pub fn append_records(&mut self, records: Vec<MessageRecord>) -> usize {
        if records.is_empty() {
            return 0;
        }
        let count = records.len();
        self.page.append(records);
        let report = self.page.initialize_all();
        if self.selected.is_none() {
            self.select_first();
        }

        tracing::info!(count, initialized = report.initialized, "appended records");
        self.status_message = Some(format!("{} new message(s)", count));
        count
    }

    /// Expand every container
    pub fn expand_all(&mut self) {
        let changed = self.page.set_all(PresentationState::Expanded);
        self.status_message = Some(format!("Expanded {} message(s)", changed));
    }

    /// Collapse every container
    pub fn collapse_all(&mut self) {
        let changed = self.page.set_all(PresentationState::Collapsed);
        self.status_message = Some(format!("Collapsed {} message(s)", changed));
    }

    /// Scroll the selected expanded payload up
    pub fn scroll_up(&mut self) {
        self.scroll_selected(-1);
    }

    /// Scroll the selected expanded payload down
    pub fn scroll_down(&mut self) {
        self.scroll_selected(1);
    }

    fn scroll_selected(&mut self, delta: i32) {
        let Some(id) = self.selected else {
            return;
        };
        let Some(widget) = self.page.widget(id) else {
            return;
        };
        let max = max_scroll(widget, self.list_width, self.page.expanded_rows());
        self.page.scroll(id, delta, max);
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    /// Toggle live mode
    pub fn toggle_live_mode(&mut self) {
        self.live_mode = !self.live_mode;
        if self.live_mode {
            self.status_message = Some("Live mode ON".to_string());
        } else {
            self.status_message = Some("Live mode OFF".to_string());
        }
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Get display title for the app
    pub fn title(&self) -> String {
        format!("msgview: {}", self.source_name)
    }

    /// Get status line info
    pub fn status_info(&self) -> String {
        let position = self.selected_index().map_or(0, |i| i + 1);
        let mut parts = vec![format!("Message {}/{}", position, self.page.len())];

        if let Some(widget) = self.selected_widget() {
            parts.push(widget.classification.label().to_string());
        }

        if self.live_mode {
            parts.push("LIVE".to_string());
        }

        if self.copies_in_flight > 0 {
            parts.push("copying…".to_string());
        }

        parts.join(" | ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::ClipboardError;
    use std::sync::Mutex;
    use std::time::Duration;

    use crate::feedback::CONFIRMATION_DELAY;

    #[derive(Clone, Copy)]
    enum Mode {
        Ok,
        Unavailable,
        Rejected,
        Broken,
    }

    struct FakeClipboard {
        mode: Mode,
        writes: Mutex<Vec<String>>,
    }

    impl ClipboardBackend for FakeClipboard {
        fn write_primary(&self, text: &str) -> Result<(), ClipboardError> {
            match self.mode {
                Mode::Ok => {
                    self.writes.lock().unwrap().push(text.to_string());
                    Ok(())
                }
                Mode::Rejected => Err(ClipboardError::Rejected("denied".to_string())),
                Mode::Unavailable | Mode::Broken => {
                    Err(ClipboardError::Unavailable("no display".to_string()))
                }
            }
        }

        fn write_fallback(&self, text: &str) -> Result<(), ClipboardError> {
            match self.mode {
                Mode::Broken => Err(ClipboardError::NoHelper("xclip".to_string())),
                _ => {
                    self.writes.lock().unwrap().push(text.to_string());
                    Ok(())
                }
            }
        }
    }

    fn app_with(values: &[&str], mode: Mode) -> (App, Arc<FakeClipboard>) {
        let records = values
            .iter()
            .enumerate()
            .map(|(i, v)| MessageRecord::plain(i as i64, *v))
            .collect();
        let mut page = Page::from_records(records, 20);
        page.initialize_all();
        let fake = Arc::new(FakeClipboard {
            mode,
            writes: Mutex::new(Vec::new()),
        });
        let app = App::new(page, "test.jsonl", ViewerConfig::default(), fake.clone());
        (app, fake)
    }

    /// Wait for the copy worker and apply its report
    fn finish_copies(app: &mut App, now: Instant) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while app.copies_in_flight() > 0 && Instant::now() < deadline {
            if app.poll_copy_reports(now) == 0 {
                std::thread::sleep(Duration::from_millis(5));
            }
        }
        assert_eq!(app.copies_in_flight(), 0, "copy worker did not report");
    }

    fn copy_face(app: &App) -> ControlFace {
        app.selected_widget().unwrap().copy.face
    }

    #[test]
    fn test_starts_on_first_container() {
        let (app, _) = app_with(&["a", "b"], Mode::Ok);
        assert_eq!(app.selected_index(), Some(0));
        assert_eq!(app.status_info(), "Message 1/2 | (Text)");
    }

    #[test]
    fn test_navigation_clamps() {
        let (mut app, _) = app_with(&["a", "b", "c"], Mode::Ok);
        app.select_prev();
        assert_eq!(app.selected_index(), Some(0));
        app.select_last();
        app.select_next();
        assert_eq!(app.selected_index(), Some(2));
        app.page_up(10);
        assert_eq!(app.selected_index(), Some(0));
        app.page_down(10);
        assert_eq!(app.selected_index(), Some(2));
    }

    #[test]
    fn test_toggle_through_focused_control() {
        let (mut app, _) = app_with(&[r#"{"a":1}"#], Mode::Ok);
        app.activate_focused();
        assert_eq!(app.selected_widget().unwrap().state, PresentationState::Expanded);
        assert_eq!(app.selected_widget().unwrap().toggle.face, ControlFace::COLLAPSE);
        app.toggle_selected();
        assert_eq!(app.selected_widget().unwrap().state, PresentationState::Collapsed);
    }

    #[test]
    fn test_copy_shows_confirmation_then_reverts() {
        let (mut app, fake) = app_with(&[r#"{"b":1,"a":2}"#], Mode::Ok);
        app.focus_next();
        assert_eq!(app.focus, ControlAction::Copy);
        app.activate_focused();

        let now = Instant::now();
        finish_copies(&mut app, now);
        assert_eq!(
            *fake.writes.lock().unwrap(),
            vec!["{\n  \"b\": 1,\n  \"a\": 2\n}".to_string()]
        );
        assert_eq!(copy_face(&app), ControlFace::COPIED);
        assert_eq!(app.status_message.as_deref(), Some("Copied 22 chars"));

        assert!(!app.tick(now + Duration::from_millis(1999)));
        assert!(app.tick(now + CONFIRMATION_DELAY));
        assert_eq!(copy_face(&app), ControlFace::COPY);
        // Copying never changes the presentation
        assert_eq!(app.selected_widget().unwrap().state, PresentationState::Collapsed);
    }

    #[test]
    fn test_copy_twice_restores_original_face() {
        let (mut app, _) = app_with(&["hello"], Mode::Ok);
        let first = Instant::now();
        app.copy_selected();
        finish_copies(&mut app, first);

        let second = first + Duration::from_millis(1000);
        app.copy_selected();
        finish_copies(&mut app, second);
        assert_eq!(copy_face(&app), ControlFace::COPIED);

        app.tick(second + CONFIRMATION_DELAY);
        assert_eq!(copy_face(&app), ControlFace::COPY);
    }

    #[test]
    fn test_fallback_copy_swaps_icon_only() {
        let (mut app, fake) = app_with(&["hello"], Mode::Unavailable);
        app.copy_selected();
        finish_copies(&mut app, Instant::now());
        assert_eq!(fake.writes.lock().unwrap().len(), 1);
        let face = copy_face(&app);
        assert_eq!(face.icon, ControlFace::COPIED.icon);
        assert_eq!(face.label, ControlFace::COPY.label);
        assert!(app.alert.is_none());
    }

    #[test]
    fn test_rejected_copy_is_logged_only() {
        let (mut app, fake) = app_with(&["hello"], Mode::Rejected);
        app.copy_selected();
        finish_copies(&mut app, Instant::now());
        assert!(fake.writes.lock().unwrap().is_empty());
        assert_eq!(copy_face(&app), ControlFace::COPY);
        assert!(app.alert.is_none());
    }

    #[test]
    fn test_total_failure_raises_alert() {
        let (mut app, _) = app_with(&["hello"], Mode::Broken);
        app.copy_selected();
        finish_copies(&mut app, Instant::now());
        assert_eq!(copy_face(&app), ControlFace::COPY);
        assert!(app.alert.as_deref().unwrap().starts_with("Copy failed"));
        app.dismiss_alert();
        assert!(app.alert.is_none());
    }

    #[test]
    fn test_append_records_initializes_new_containers() {
        let (mut app, _) = app_with(&["a"], Mode::Ok);
        let before = app.page.handler_count();
        assert_eq!(app.append_records(vec![MessageRecord::plain(5, "[1]")]), 1);
        assert_eq!(app.page.handler_count(), before + 2);
        assert!(app.page.containers().iter().all(|c| c.initialized));
        assert_eq!(app.append_records(Vec::new()), 0);
    }

    #[test]
    fn test_append_keeps_selection() {
        let (mut app, _) = app_with(&["a", "b"], Mode::Ok);
        let selected = app.selected;
        app.append_records(vec![MessageRecord::plain(9, "c")]);
        assert_eq!(app.selected, selected);
    }

    #[test]
    fn test_expand_and_collapse_all() {
        let long = "line\n".repeat(30);
        let (mut app, _) = app_with(&[long.as_str(), "b"], Mode::Ok);
        app.select_last();
        app.expand_all();
        assert!(app
            .page
            .containers()
            .iter()
            .all(|c| c.widget.as_ref().unwrap().state == PresentationState::Expanded));
        app.scroll_down();
        assert_eq!(app.selected_widget().unwrap().scroll, 1);
        app.collapse_all();
        assert_eq!(app.selected_widget().unwrap().scroll, 0);
    }

    #[test]
    fn test_scroll_stops_at_content_end() {
        let long = (0..30).map(|i| format!("line {}", i)).collect::<Vec<_>>().join("\n");
        let (mut app, _) = app_with(&[long.as_str()], Mode::Ok);
        app.toggle_selected();

        for _ in 0..100 {
            app.scroll_down();
        }
        // 30 lines in a 20-row body
        assert_eq!(app.selected_widget().unwrap().scroll, 10);
        app.scroll_up();
        assert_eq!(app.selected_widget().unwrap().scroll, 9);

        // Short payloads never scroll
        let (mut app, _) = app_with(&["short"], Mode::Ok);
        app.toggle_selected();
        app.scroll_down();
        assert_eq!(app.selected_widget().unwrap().scroll, 0);
    }

    #[test]
    fn test_missing_body_has_nothing_to_act_on() {
        let mut page = Page::from_records(
            vec![MessageRecord {
                offset: 1,
                ..MessageRecord::default()
            }],
            20,
        );
        page.initialize_all();
        let fake = Arc::new(FakeClipboard {
            mode: Mode::Ok,
            writes: Mutex::new(Vec::new()),
        });
        let mut app = App::new(page, "stdin", ViewerConfig::default(), fake);
        app.copy_selected();
        assert_eq!(app.copies_in_flight(), 0);
        assert_eq!(app.status_message.as_deref(), Some("No payload to act on"));
    }
}
