//! Viewer configuration

use msgview_core::DEFAULT_EXPANDED_ROWS;

/// Settings the UI needs, resolved from the command line and environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerConfig {
    /// Height cap for expanded payloads, in rows
    pub expanded_rows: u16,
    /// Command line of the fallback clipboard helper
    pub copy_command: Option<String>,
    /// Try the platform clipboard before the helper
    pub system_clipboard: bool,
    /// Poll the input for appended records
    pub live: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            expanded_rows: DEFAULT_EXPANDED_ROWS,
            copy_command: None,
            system_clipboard: true,
            live: false,
        }
    }
}
