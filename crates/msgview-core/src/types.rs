//! Core type definitions for message data

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A single consumed message, as read from a dump file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MessageRecord {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    /// RFC 3339 string or epoch milliseconds, as found in the dump
    pub timestamp: Option<String>,
    pub key: Option<String>,
    pub headers: Vec<(String, String)>,
    /// Raw payload. `None` means the container has no body to show.
    pub value: Option<String>,
}

impl MessageRecord {
    /// Record for a plain payload with no Kafka metadata
    pub fn plain(offset: i64, value: impl Into<String>) -> Self {
        Self {
            offset,
            value: Some(value.into()),
            ..Self::default()
        }
    }

    /// Format the timestamp for display (`YYYY-MM-DD HH:MM:SS`, UTC)
    pub fn format_time(&self) -> String {
        let Some(raw) = self.timestamp.as_deref() else {
            return String::new();
        };

        if let Ok(millis) = raw.parse::<i64>() {
            if let Some(time) = Utc.timestamp_millis_opt(millis).single() {
                return time.format("%Y-%m-%d %H:%M:%S").to_string();
            }
        }

        match DateTime::parse_from_rfc3339(raw) {
            Ok(time) => time.with_timezone(&Utc).format("%Y-%m-%d %H:%M:%S").to_string(),
            Err(_) => raw.to_string(),
        }
    }

    /// Short location tag, e.g. `orders p2@1041`
    pub fn location(&self) -> String {
        if self.topic.is_empty() {
            format!("p{}@{}", self.partition, self.offset)
        } else {
            format!("{} p{}@{}", self.topic, self.partition, self.offset)
        }
    }

    /// Headers joined as `k: v, k: v`
    pub fn headers_display(&self) -> String {
        self.headers
            .iter()
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Detected kind of a payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Parsed as a JSON object or array
    Json,
    /// Did not look like JSON
    Text,
    /// Looked like JSON (matching outer brackets) but failed to parse
    TextInvalidJson,
}

impl Classification {
    /// Label shown next to the payload
    pub fn label(&self) -> &'static str {
        match self {
            Classification::Json => "(JSON)",
            Classification::Text => "(Text)",
            Classification::TextInvalidJson => "(Text - Non-JSON)",
        }
    }
}

/// The two renderings of a payload, computed once at initialization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedText {
    /// Shown while collapsed
    pub compact: String,
    /// Shown while expanded, and the text that gets copied
    pub expanded: String,
}

impl DerivedText {
    /// Both renderings are the same text
    pub fn verbatim(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            compact: text.clone(),
            expanded: text,
        }
    }
}

/// Identity of a container on a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerId(pub u64);

/// Identity of a wired control. A fresh id is minted every time controls are wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControlId(pub u64);

/// What activating a control does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlAction {
    Toggle,
    Copy,
}
