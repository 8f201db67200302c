//! CLI argument parsing

use std::path::PathBuf;

use clap::Parser;
use msgview_core::{RecordFilter, DEFAULT_PER_PARTITION};
use msgview_ui::ViewerConfig;

/// Terminal viewer for consumed Kafka messages
#[derive(Parser, Debug)]
#[command(name = "msgview")]
#[command(version)]
#[command(about = "Browse consumed messages with collapsible, copyable JSON payloads")]
pub struct Cli {
    /// Message dump to view
    ///
    /// JSON lines with topic/partition/offset/key/value fields, a
    /// console-consumer dump, or plain text (one message per line).
    /// Use "-" or omit to read stdin.
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Start in live mode (watch FILE for appended records)
    #[arg(short, long)]
    pub live: bool,

    /// Show only records from this partition
    #[arg(short, long)]
    pub partition: Option<i32>,

    /// Newest records kept per partition (1-1000; anything else uses the default)
    #[arg(short = 'n', long, default_value_t = DEFAULT_PER_PARTITION)]
    pub limit: usize,

    /// Keep every record (no per-partition limit)
    #[arg(long, conflicts_with = "limit")]
    pub all: bool,

    /// Height cap for expanded messages, in rows
    #[arg(long, env = "MSGVIEW_EXPANDED_ROWS", default_value_t = msgview_core::DEFAULT_EXPANDED_ROWS,
          value_parser = clap::value_parser!(u16).range(1..))]
    pub expanded_rows: u16,

    /// Clipboard helper used when the system clipboard is unavailable
    /// (e.g. "xclip -selection clipboard")
    #[arg(long, env = "MSGVIEW_COPY_COMMAND")]
    pub copy_command: Option<String>,

    /// Never use the system clipboard; always go through the helper
    #[arg(long)]
    pub no_system_clipboard: bool,

    /// Diagnostic log file
    #[arg(long, env = "MSGVIEW_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Screenshot mode: render one frame and exit
    #[arg(long)]
    pub screenshot: bool,

    /// Screenshot width (default: 120)
    #[arg(long, default_value = "120")]
    pub width: u16,

    /// Screenshot height (default: 40)
    #[arg(long, default_value = "40")]
    pub height: u16,
}

impl Cli {
    /// Input file, or `None` for stdin
    pub fn input_path(&self) -> Option<&PathBuf> {
        self.file.as_ref().filter(|p| p.as_os_str() != "-")
    }

    /// Record filter from the partition and limit options
    pub fn record_filter(&self) -> RecordFilter {
        let mut filter = RecordFilter::new();
        if let Some(partition) = self.partition {
            filter = filter.with_partition(partition);
        }
        if !self.all {
            filter = filter.with_limit(self.limit);
        }
        filter
    }

    /// Settings handed to the UI
    pub fn viewer_config(&self) -> ViewerConfig {
        ViewerConfig {
            expanded_rows: self.expanded_rows,
            copy_command: self.copy_command.clone(),
            system_clipboard: !self.no_system_clipboard,
            live: self.live,
        }
    }
}
