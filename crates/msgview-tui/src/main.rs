//! msgview - terminal viewer for consumed Kafka messages
//!
//! Each message is drawn as a container with a collapsible payload, a
//! classification label, and a copy control.

mod cli;

use std::fs::{self, File};
use std::io::{self, stdout};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use msgview_core::{filter_records, load_records, read_records, MessageRecord, Page, RecordFilter, RecordTail};
use msgview_ui::{
    clipboard::SystemClipboard,
    components::{render_alert, render_footer, render_header, render_help_overlay, render_message_list},
    event::{handle_event, AppAction},
    snapshot::buffer_to_ansi,
    App,
};

/// How often live mode checks the input for appended records
const LIVE_POLL_INTERVAL: Duration = Duration::from_millis(200);

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    let filter = cli.record_filter();
    let config = cli.viewer_config();

    // Load records; live mode keeps a tail on the file
    let (source_name, records, tail) = load_input(&cli)?;
    let records = filter_records(records, &filter);
    tracing::info!(source = %source_name, count = records.len(), "showing records");

    let mut page = Page::from_records(records, config.expanded_rows);
    page.initialize_all();

    let clipboard = Arc::new(SystemClipboard::from_config(&config));
    let mut app = App::new(page, source_name, config, clipboard);

    // Screenshot mode: render one frame and exit
    if cli.screenshot {
        return run_screenshot(&mut app, cli.width, cli.height);
    }

    run_tui(app, tail, &filter)
}

/// Install the log subscriber.
///
/// The TUI owns the terminal, so interactive runs log to a file; screenshot
/// runs log to stderr. If the log file cannot be opened, logging is off.
fn init_tracing(cli: &Cli) {
    let filter = EnvFilter::try_from_env("MSGVIEW_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if cli.screenshot {
        builder.with_writer(io::stderr).init();
        return;
    }

    let Some(path) = cli.log_file.clone().or_else(default_log_path) else {
        return;
    };
    match open_log_file(&path) {
        Ok(file) => builder.with_ansi(false).with_writer(Mutex::new(file)).init(),
        Err(e) => eprintln!("msgview: logging disabled, cannot open {}: {}", path.display(), e),
    }
}

/// `<state or cache dir>/msgview/msgview.log`
fn default_log_path() -> Option<PathBuf> {
    dirs::state_dir()
        .or_else(dirs::cache_dir)
        .map(|dir| dir.join("msgview").join("msgview.log"))
}

fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    File::options().create(true).append(true).open(path)
}

/// Read the initial records. Returns the source name, the records, and a
/// tail on the file when live mode is on.
fn load_input(cli: &Cli) -> Result<(String, Vec<MessageRecord>, Option<RecordTail>)> {
    let Some(path) = cli.input_path() else {
        if cli.live {
            tracing::warn!("live mode needs a file; reading stdin once");
        }
        let records = read_records(io::stdin().lock()).context("Failed to read stdin")?;
        return Ok(("stdin".to_string(), records, None));
    };

    let name = path.display().to_string();
    if cli.live {
        let (tail, records) = RecordTail::open(path)
            .with_context(|| format!("Failed to open {}", name))?;
        Ok((name, records, Some(tail)))
    } else {
        let records = load_records(path).with_context(|| format!("Failed to read {}", name))?;
        Ok((name, records, None))
    }
}

/// Run the TUI application
fn run_tui(mut app: App, mut tail: Option<RecordTail>, filter: &RecordFilter) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &mut app, &mut tail, filter);

    // Cleanup
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn event_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    tail: &mut Option<RecordTail>,
    filter: &RecordFilter,
) -> Result<()> {
    let mut last_poll = Instant::now();

    loop {
        // Draw
        terminal.draw(|frame| ui(frame, app))?;
        app.list_width = terminal.size()?.width;

        // Wake up for live polling and for pending confirmation reverts
        let mut timeout = if app.live_mode {
            Duration::from_millis(100)
        } else {
            Duration::from_millis(250)
        };
        if let Some(deadline) = app.confirmations.next_deadline() {
            timeout = timeout.min(deadline.saturating_duration_since(Instant::now()));
        }

        if event::poll(timeout)? {
            let event = event::read()?;
            let action = handle_event(event, app.alert.is_some());

            match action {
                AppAction::Quit => break,
                AppAction::SelectPrev => app.select_prev(),
                AppAction::SelectNext => app.select_next(),
                AppAction::SelectFirst => app.select_first(),
                AppAction::SelectLast => app.select_last(),
                AppAction::PageUp => app.page_up(10),
                AppAction::PageDown => app.page_down(10),
                AppAction::FocusNext => app.focus_next(),
                AppAction::FocusPrev => app.focus_prev(),
                AppAction::Activate => app.activate_focused(),
                AppAction::Toggle => app.toggle_selected(),
                AppAction::Copy => app.copy_selected(),
                AppAction::ScrollUp => app.scroll_up(),
                AppAction::ScrollDown => app.scroll_down(),
                AppAction::ExpandAll => app.expand_all(),
                AppAction::CollapseAll => app.collapse_all(),
                AppAction::ToggleLiveMode => app.toggle_live_mode(),
                AppAction::ToggleHelp => app.toggle_help(),
                AppAction::DismissAlert => app.dismiss_alert(),
                AppAction::Redraw => {
                    terminal.clear()?;
                }
                AppAction::None => {}
            }
        }

        let now = Instant::now();
        app.poll_copy_reports(now);
        app.tick(now);

        // Live mode: pick up appended records
        if app.live_mode && last_poll.elapsed() >= LIVE_POLL_INTERVAL {
            last_poll = Instant::now();
            if let Some(tail) = tail.as_mut() {
                match tail.poll() {
                    Ok(records) => {
                        let records: Vec<MessageRecord> =
                            records.into_iter().filter(|r| filter.matches(r)).collect();
                        app.append_records(records);
                    }
                    Err(e) => {
                        tracing::error!(path = %tail.path().display(), error = %e, "live poll failed");
                        app.status_message = Some(format!("Poll error: {}", e));
                    }
                }
            }
        }
    }

    Ok(())
}

/// Run screenshot mode: render one frame and output to stdout
fn run_screenshot(app: &mut App, width: u16, height: u16) -> Result<()> {
    use ratatui::backend::TestBackend;
    use std::io::Write;

    tracing::info!(width, height, "rendering screenshot");
    app.list_width = width;

    let mut terminal = Terminal::new(TestBackend::new(width, height))?;
    terminal.draw(|frame| ui(frame, app))?;

    let mut out = stdout().lock();
    out.write_all(buffer_to_ansi(terminal.backend().buffer()).as_bytes())?;
    out.flush()?;
    Ok(())
}

/// Render the UI
fn ui(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),  // Header
            Constraint::Min(0),     // Messages
            Constraint::Length(2),  // Footer
        ])
        .split(area);

    render_header(frame, chunks[0], app);
    render_message_list(frame, chunks[1], app);
    render_footer(frame, chunks[2], app);

    // Overlays
    if app.show_help {
        render_help_overlay(frame);
    }

    if let Some(message) = &app.alert {
        render_alert(frame, message);
    }
}
