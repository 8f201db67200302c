//! Message dump parsing
//!
//! Three line formats are understood and may be mixed in one file:
//! - JSONL records: `{"topic":..,"partition":..,"offset":..,"key":..,"value":..}`
//! - consumer dump blocks: `Offset=N, Key=K, Headers=H,` followed by `Message=...`
//! - anything else: one plain payload per line

use std::borrow::Cow;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::types::MessageRecord;

/// Errors while reading a message dump
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read input: {0}")]
    Read(#[from] std::io::Error),
}

/// Fields that mark a JSON object as a record rather than a payload
const RECORD_FIELDS: [&str; 4] = ["topic", "partition", "offset", "value"];

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawRecord {
    topic: Option<String>,
    partition: Option<i32>,
    offset: Option<i64>,
    timestamp: Option<Value>,
    key: Option<Value>,
    headers: Option<Value>,
    value: Option<Value>,
}

/// Parse a single dump line. Blank lines yield `None`.
pub fn parse_line(raw: &str, line_number: i64) -> Option<MessageRecord> {
    if raw.trim().is_empty() {
        return None;
    }

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(raw) {
        if RECORD_FIELDS.iter().any(|f| map.contains_key(*f)) {
            if let Ok(parsed) = serde_json::from_value::<RawRecord>(Value::Object(map)) {
                return Some(parsed.into_record(line_number));
            }
        }
    }

    Some(MessageRecord::plain(line_number, raw))
}

impl RawRecord {
    fn into_record(self, line_number: i64) -> MessageRecord {
        MessageRecord {
            topic: self.topic.unwrap_or_default(),
            partition: self.partition.unwrap_or(0),
            offset: self.offset.unwrap_or(line_number),
            timestamp: self.timestamp.and_then(scalar_text),
            key: self.key.and_then(value_text),
            headers: self.headers.map(header_pairs).unwrap_or_default(),
            value: self.value.and_then(value_text),
        }
    }
}

/// Strings as-is, other values as compact JSON, null as nothing
fn value_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Headers as `{"k":"v"}`, `[{"key":"k","value":"v"}]` or `[["k","v"]]`
fn header_pairs(value: Value) -> Vec<(String, String)> {
    match value {
        Value::Object(map) => map
            .into_iter()
            .map(|(k, v)| (k, value_text(v).unwrap_or_default()))
            .collect(),
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(mut obj) => {
                    let key = obj.remove("key").and_then(value_text)?;
                    let value = obj.remove("value").and_then(value_text).unwrap_or_default();
                    Some((key, value))
                }
                Value::Array(pair) if pair.len() == 2 => {
                    let mut pair = pair.into_iter();
                    let key = pair.next().and_then(value_text)?;
                    let value = pair.next().and_then(value_text).unwrap_or_default();
                    Some((key, value))
                }
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Header line of a consumer dump block
#[derive(Debug, PartialEq, Eq)]
struct DumpHeader {
    offset: i64,
    key: Option<String>,
    headers: Vec<(String, String)>,
}

fn parse_dump_header(line: &str) -> Option<DumpHeader> {
    let rest = line.strip_prefix("Offset=")?;
    let (offset, rest) = rest.split_once(", Key=")?;
    let (key, headers) = rest.split_once(", Headers=")?;
    let offset = offset.trim().parse().ok()?;

    let headers = headers
        .trim_end()
        .strip_suffix(',')
        .unwrap_or(headers)
        .split(", ")
        .filter_map(|pair| {
            let (k, v) = pair.split_once(": ")?;
            Some((k.to_string(), v.trim_end_matches(',').to_string()))
        })
        .collect();

    Some(DumpHeader {
        offset,
        key: (!key.is_empty()).then(|| key.to_string()),
        headers,
    })
}

/// Parse dump text. `first_line` is the line number of the first line.
pub fn parse_text(text: &str, first_line: i64) -> Vec<MessageRecord> {
    let lines: Vec<&str> = text.lines().collect();
    let mut records = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line_number = first_line + i as i64;

        if let Some(header) = parse_dump_header(lines[i]) {
            if let Some(first) = lines.get(i + 1).and_then(|l| l.strip_prefix("Message=")) {
                let mut body = vec![first];
                let mut j = i + 2;
                // A block ends at a blank line followed by another block or EOF
                while j < lines.len() {
                    let ends_block = lines[j].is_empty()
                        && lines
                            .get(j + 1)
                            .map_or(true, |next| parse_dump_header(next).is_some());
                    if ends_block {
                        break;
                    }
                    body.push(lines[j]);
                    j += 1;
                }

                let joined = body.join("\n");
                let value = joined.strip_suffix(' ').unwrap_or(&joined).to_string();
                records.push(MessageRecord {
                    offset: header.offset,
                    key: header.key,
                    headers: header.headers,
                    value: Some(value),
                    ..MessageRecord::default()
                });
                i = j + 1;
                continue;
            }
        }

        if let Some(record) = parse_line(lines[i], line_number) {
            records.push(record);
        }
        i += 1;
    }

    records
}

/// Load all records from a dump file
pub fn load_records(path: &Path) -> Result<Vec<MessageRecord>, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let records = parse_text(&text, 1);
    tracing::info!(path = %path.display(), count = records.len(), "loaded records");
    Ok(records)
}

/// Load all records from a reader (e.g. stdin)
pub fn read_records<R: Read>(mut reader: R) -> Result<Vec<MessageRecord>, LoadError> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    Ok(parse_text(&text, 1))
}

/// Follows a growing dump file and yields records from appended lines.
///
/// Only complete lines are parsed; a trailing partial line waits for its newline.
/// Bytes are decoded once a line is complete, so a character split across two
/// writes arrives intact. A dump block at the end of the read waits until a blank
/// line closes it, or until a poll finds nothing new and the block has its
/// `Message=` line.
#[derive(Debug)]
pub struct RecordTail {
    path: PathBuf,
    position: u64,
    next_line: i64,
    pending: Vec<u8>,
}

impl RecordTail {
    /// Start following `path`, returning the records already in it
    pub fn open(path: &Path) -> Result<(Self, Vec<MessageRecord>), LoadError> {
        let mut tail = Self {
            path: path.to_path_buf(),
            position: 0,
            next_line: 1,
            pending: Vec::new(),
        };
        let records = tail.poll()?;
        tracing::info!(path = %path.display(), count = records.len(), "following records");
        Ok((tail, records))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read whatever was appended since the last poll
    pub fn poll(&mut self) -> Result<Vec<MessageRecord>, LoadError> {
        let io_err = |source| LoadError::Io {
            path: self.path.clone(),
            source,
        };

        let mut file = File::open(&self.path).map_err(io_err)?;
        let len = file.metadata().map_err(io_err)?.len();

        if len < self.position {
            tracing::warn!(path = %self.path.display(), "file shrank, reading from the start");
            self.position = 0;
            self.next_line = 1;
            self.pending.clear();
        }

        let grew = len > self.position;
        if grew {
            file.seek(SeekFrom::Start(self.position)).map_err(io_err)?;
            let mut bytes = Vec::new();
            file.read_to_end(&mut bytes).map_err(io_err)?;
            self.position += bytes.len() as u64;
            self.pending.extend_from_slice(&bytes);
        }

        let records = self.take_complete(!grew);
        if !records.is_empty() {
            tracing::debug!(count = records.len(), "read appended records");
        }
        Ok(records)
    }

    /// Parse the complete lines in `pending`, leaving an unfinished block behind
    fn take_complete(&mut self, at_rest: bool) -> Vec<MessageRecord> {
        let Some(cut) = self.pending.iter().rposition(|&b| b == b'\n') else {
            return Vec::new();
        };
        let mut complete: Vec<u8> = self.pending.drain(..=cut).collect();
        if let Some(start) = open_block_start(&complete, at_rest) {
            let held = complete.split_off(start);
            self.pending.splice(0..0, held);
        }
        if complete.is_empty() {
            return Vec::new();
        }

        let text = String::from_utf8_lossy(&complete);
        let records = parse_text(&text, self.next_line);
        self.next_line += text.lines().count() as i64;
        records
    }
}

/// Byte offset of a dump block that more lines may still extend.
///
/// The last header in `bytes` is open when nothing follows it, or when its
/// `Message=` body has no blank line after it yet. With `at_rest` only a bare
/// header counts as open.
fn open_block_start(bytes: &[u8], at_rest: bool) -> Option<usize> {
    let mut offset = 0;
    let lines: Vec<(usize, Cow<'_, str>)> = bytes
        .split_inclusive(|&b| b == b'\n')
        .map(|raw| {
            let start = offset;
            offset += raw.len();
            let line = raw.strip_suffix(b"\n").unwrap_or(raw);
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            (start, String::from_utf8_lossy(line))
        })
        .collect();

    let header = lines
        .iter()
        .rposition(|(_, line)| parse_dump_header(line).is_some())?;
    let open = match lines.get(header + 1) {
        None => true,
        Some((_, next)) => {
            !at_rest
                && next.starts_with("Message=")
                && !lines[header + 2..].iter().any(|(_, line)| line.is_empty())
        }
    };
    open.then_some(lines[header].0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;

    #[test]
    fn test_parse_json_record() {
        let raw = r#"{"topic":"orders","partition":2,"offset":41,"timestamp":1700000000000,"key":"k1","headers":{"trace":"abc"},"value":"{\"id\":7}"}"#;
        let record = parse_line(raw, 1).unwrap();
        assert_eq!(record.topic, "orders");
        assert_eq!(record.partition, 2);
        assert_eq!(record.offset, 41);
        assert_eq!(record.timestamp.as_deref(), Some("1700000000000"));
        assert_eq!(record.key.as_deref(), Some("k1"));
        assert_eq!(record.headers, vec![("trace".to_string(), "abc".to_string())]);
        assert_eq!(record.value.as_deref(), Some(r#"{"id":7}"#));
    }

    #[test]
    fn test_parse_record_with_json_value() {
        let raw = r#"{"offset":3,"value":{"b":1,"a":[1, 2]}}"#;
        let record = parse_line(raw, 9).unwrap();
        assert_eq!(record.offset, 3);
        assert_eq!(record.value.as_deref(), Some(r#"{"b":1,"a":[1,2]}"#));
    }

    #[test]
    fn test_parse_record_without_value() {
        let record = parse_line(r#"{"topic":"t","offset":1}"#, 1).unwrap();
        assert_eq!(record.value, None);
        let record = parse_line(r#"{"topic":"t","offset":1,"value":null}"#, 1).unwrap();
        assert_eq!(record.value, None);
    }

    #[test]
    fn test_parse_header_arrays() {
        let raw = r#"{"value":"x","headers":[{"key":"a","value":"1"},["b","2"],7]}"#;
        let record = parse_line(raw, 1).unwrap();
        assert_eq!(
            record.headers,
            vec![("a".to_string(), "1".to_string()), ("b".to_string(), "2".to_string())]
        );
    }

    #[test]
    fn test_plain_lines_keep_raw_text() {
        let record = parse_line("  hello world  ", 4).unwrap();
        assert_eq!(record.offset, 4);
        assert_eq!(record.value.as_deref(), Some("  hello world  "));

        // A JSON payload without record fields is a payload, not a record
        let record = parse_line(r#"{"b":1,"a":2}"#, 5).unwrap();
        assert_eq!(record.value.as_deref(), Some(r#"{"b":1,"a":2}"#));

        assert!(parse_line("   ", 6).is_none());
    }

    #[test]
    fn test_parse_consumer_dump_blocks() {
        let text = "Offset=10, Key=user-1, Headers=trace: abc, source: web, ,\nMessage={\"a\":1} \n\nOffset=11, Key=, Headers=,\nMessage=line one\n\nline three \n\n";
        let records = parse_text(text, 1);
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].offset, 10);
        assert_eq!(records[0].key.as_deref(), Some("user-1"));
        assert_eq!(
            records[0].headers,
            vec![
                ("trace".to_string(), "abc".to_string()),
                ("source".to_string(), "web".to_string())
            ]
        );
        assert_eq!(records[0].value.as_deref(), Some(r#"{"a":1}"#));

        assert_eq!(records[1].offset, 11);
        assert_eq!(records[1].key, None);
        assert!(records[1].headers.is_empty());
        assert_eq!(records[1].value.as_deref(), Some("line one\n\nline three"));
    }

    #[test]
    fn test_mixed_formats() {
        let text = "plain\n{\"offset\":7,\"value\":\"v\"}\n\nOffset=3, Key=k, Headers=,\nMessage=m \n";
        let records = parse_text(text, 1);
        let offsets: Vec<i64> = records.iter().map(|r| r.offset).collect();
        assert_eq!(offsets, vec![1, 7, 3]);
    }

    #[test]
    fn test_load_records_missing_file() {
        let err = load_records(Path::new("/nonexistent/dump.jsonl")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/dump.jsonl"));
    }

    #[test]
    fn test_read_records_from_reader() {
        let records = read_records("a\nb\n".as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_tail_reads_appended_lines() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("dump.jsonl");
        fs::write(&path, "first\nsecond\npart").unwrap();

        let (mut tail, records) = RecordTail::open(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert!(tail.poll().unwrap().is_empty());

        let mut file = fs::OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"ial\nfourth\n").unwrap();

        let records = tail.poll().unwrap();
        let values: Vec<_> = records.iter().map(|r| r.value.clone().unwrap()).collect();
        assert_eq!(values, vec!["partial", "fourth"]);
        assert_eq!(records[0].offset, 3);
        assert_eq!(records[1].offset, 4);
    }

    #[test]
    fn test_tail_keeps_characters_split_across_writes() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("dump.txt");
        fs::write(&path, b"h\xC3").unwrap();

        let (mut tail, records) = RecordTail::open(&path).unwrap();
        assert!(records.is_empty());

        let mut file = fs::OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"\xA9llo\n").unwrap();

        let records = tail.poll().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].value.as_deref(), Some("h\u{e9}llo"));
    }

    #[test]
    fn test_tail_waits_for_dump_block_body() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("dump.txt");
        fs::write(&path, "Offset=5, Key=k, Headers=,\n").unwrap();

        let (mut tail, records) = RecordTail::open(&path).unwrap();
        assert!(records.is_empty());
        // A bare header is never flushed on its own
        assert!(tail.poll().unwrap().is_empty());

        let mut file = fs::OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"Message={\"a\":1} \n\n").unwrap();

        let records = tail.poll().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].offset, 5);
        assert_eq!(records[0].key.as_deref(), Some("k"));
        assert_eq!(records[0].value.as_deref(), Some(r#"{"a":1}"#));
    }

    #[test]
    fn test_tail_joins_body_lines_across_polls() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("dump.txt");
        fs::write(&path, "plain\nOffset=8, Key=, Headers=,\nMessage=line one\n").unwrap();

        let (mut tail, records) = RecordTail::open(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].value.as_deref(), Some("plain"));

        let mut file = fs::OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"line two \n\nOffset=9, Key=, Headers=,\nMessage=next \n\n")
            .unwrap();

        let records = tail.poll().unwrap();
        let values: Vec<_> = records.iter().map(|r| r.value.clone().unwrap()).collect();
        assert_eq!(values, vec!["line one\nline two", "next"]);
        assert_eq!(records[0].offset, 8);
        assert_eq!(records[1].offset, 9);
    }

    #[test]
    fn test_tail_flushes_finished_block_when_idle() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("dump.txt");
        fs::write(&path, "Offset=3, Key=k, Headers=,\nMessage=m \n").unwrap();

        let (mut tail, records) = RecordTail::open(&path).unwrap();
        assert!(records.is_empty());

        let records = tail.poll().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].offset, 3);
        assert_eq!(records[0].value.as_deref(), Some("m"));
        assert!(tail.poll().unwrap().is_empty());
    }

    #[test]
    fn test_tail_restarts_after_truncation() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("dump.jsonl");
        fs::write(&path, "one\ntwo\nthree\n").unwrap();

        let (mut tail, _) = RecordTail::open(&path).unwrap();
        fs::write(&path, "new\n").unwrap();

        let records = tail.poll().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].offset, 1);
        assert_eq!(records[0].value.as_deref(), Some("new"));
    }
}
