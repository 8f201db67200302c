//! Clipboard access
//!
//! The platform clipboard (arboard) is tried first. Only when it cannot be
//! opened at all does a copy go through an external helper process such as
//! `wl-copy` or `xclip`. A rejected platform write is reported, not retried.

use std::env;
use std::io::{self, Write};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;

use msgview_core::{ContainerId, ControlFace};
use thiserror::Error;

use crate::config::ViewerConfig;

/// Helpers tried in order when none is configured
const HELPER_CANDIDATES: &[(&str, &[&str])] = &[
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
    ("pbcopy", &[]),
    ("clip.exe", &[]),
];

/// Clipboard errors
#[derive(Error, Debug)]
pub enum ClipboardError {
    #[error("system clipboard unavailable: {0}")]
    Unavailable(String),

    #[error("clipboard rejected the write: {0}")]
    Rejected(String),

    #[error("no clipboard helper found (tried {0})")]
    NoHelper(String),

    #[error("failed to start clipboard helper {program}: {source}")]
    HelperSpawn { program: String, source: io::Error },

    #[error("failed to write to clipboard helper {program}: {source}")]
    HelperIo { program: String, source: io::Error },

    #[error("clipboard helper {program} exited with {status}")]
    HelperExit { program: String, status: String },

    #[error("failed to start copy worker: {0}")]
    Worker(io::Error),
}

/// Something that can put text on a clipboard
pub trait ClipboardBackend: Send + Sync {
    /// Write through the platform clipboard.
    ///
    /// Must return `ClipboardError::Unavailable` when there is no platform
    /// clipboard, so the caller knows to use the fallback.
    fn write_primary(&self, text: &str) -> Result<(), ClipboardError>;

    /// Write through the fallback path
    fn write_fallback(&self, text: &str) -> Result<(), ClipboardError>;
}

/// Which path a successful copy took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyPath {
    Primary,
    Fallback,
}

/// Result of one copy action
#[derive(Debug)]
pub enum CopyOutcome {
    Copied(CopyPath),
    /// The platform clipboard exists but refused the write
    PrimaryFailed(ClipboardError),
    /// No path worked
    Failed(ClipboardError),
}

/// Copy `text`, falling back only when the platform clipboard is unavailable
pub fn copy_text(backend: &dyn ClipboardBackend, text: &str) -> CopyOutcome {
    match backend.write_primary(text) {
        Ok(()) => CopyOutcome::Copied(CopyPath::Primary),
        Err(ClipboardError::Unavailable(reason)) => {
            tracing::debug!(%reason, "platform clipboard unavailable, using fallback");
            match backend.write_fallback(text) {
                Ok(()) => CopyOutcome::Copied(CopyPath::Fallback),
                Err(e) => CopyOutcome::Failed(e),
            }
        }
        Err(e) => CopyOutcome::PrimaryFailed(e),
    }
}

/// A copy request handed to a worker thread
#[derive(Debug, Clone)]
pub struct CopyRequest {
    pub container: ContainerId,
    pub text: String,
    /// Face the copy control should return to after the confirmation
    pub restore: ControlFace,
}

/// A finished copy, sent back to the event loop
#[derive(Debug)]
pub struct CopyReport {
    pub container: ContainerId,
    pub restore: ControlFace,
    pub chars: usize,
    pub outcome: CopyOutcome,
}

/// Run a copy on its own thread and report back through `tx`
pub fn spawn_copy(backend: Arc<dyn ClipboardBackend>, request: CopyRequest, tx: Sender<CopyReport>) {
    let container = request.container;
    let restore = request.restore;
    let chars = request.text.chars().count();
    let failure_tx = tx.clone();

    let spawned = thread::Builder::new()
        .name("msgview-copy".to_string())
        .spawn(move || {
            let outcome = copy_text(backend.as_ref(), &request.text);
            // The receiver is gone only when the app is shutting down
            let _ = tx.send(CopyReport {
                container,
                restore,
                chars,
                outcome,
            });
        });

    if let Err(e) = spawned {
        let _ = failure_tx.send(CopyReport {
            container,
            restore,
            chars,
            outcome: CopyOutcome::Failed(ClipboardError::Worker(e)),
        });
    }
}

/// External clipboard helper command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelperCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl HelperCommand {
    /// Split a command line on whitespace
    pub fn parse(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }

    /// First known helper found on `PATH`
    pub fn detect() -> Option<Self> {
        let path = env::var_os("PATH")?;
        let dirs: Vec<_> = env::split_paths(&path).collect();
        HELPER_CANDIDATES
            .iter()
            .find(|(program, _)| dirs.iter().any(|dir| dir.join(program).is_file()))
            .map(|(program, args)| Self {
                program: program.to_string(),
                args: args.iter().map(|a| a.to_string()).collect(),
            })
    }

    /// Feed `text` to the helper's stdin and wait for it to exit
    pub fn run(&self, text: &str) -> Result<(), ClipboardError> {
        let child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| ClipboardError::HelperSpawn {
                program: self.program.clone(),
                source,
            })?;
        let mut process = HelperProcess::new(child, &self.program);

        let io_err = |source| ClipboardError::HelperIo {
            program: self.program.clone(),
            source,
        };

        {
            let mut stdin = process
                .child
                .stdin
                .take()
                .ok_or_else(|| io_err(io::Error::other("stdin was not captured")))?;
            stdin.write_all(text.as_bytes()).map_err(io_err)?;
        }

        let status = process.child.wait().map_err(io_err)?;
        if !status.success() {
            return Err(ClipboardError::HelperExit {
                program: self.program.clone(),
                status: status.to_string(),
            });
        }
        Ok(())
    }
}

/// A running helper process. Dropping it kills the process if it is still
/// running and always reaps it.
struct HelperProcess {
    child: Child,
    program: String,
}

impl HelperProcess {
    fn new(child: Child, program: &str) -> Self {
        Self {
            child,
            program: program.to_string(),
        }
    }
}

impl Drop for HelperProcess {
    fn drop(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            tracing::debug!(program = %self.program, "killing clipboard helper");
            let _ = self.child.kill();
        }
        let _ = self.child.wait();
    }
}

/// Platform clipboard with an external helper as fallback
#[derive(Debug, Clone)]
pub struct SystemClipboard {
    /// Skip arboard entirely
    platform: bool,
    helper: Option<HelperCommand>,
}

impl SystemClipboard {
    pub fn new(platform: bool, helper: Option<HelperCommand>) -> Self {
        Self { platform, helper }
    }

    /// Build from config; detects a helper on `PATH` when none is configured
    pub fn from_config(config: &ViewerConfig) -> Self {
        let helper = config
            .copy_command
            .as_deref()
            .and_then(HelperCommand::parse)
            .or_else(HelperCommand::detect);
        tracing::debug!(
            platform = config.system_clipboard,
            helper = helper.as_ref().map(|h| h.program.as_str()),
            "clipboard configured"
        );
        Self::new(config.system_clipboard, helper)
    }
}

impl ClipboardBackend for SystemClipboard {
    fn write_primary(&self, text: &str) -> Result<(), ClipboardError> {
        if !self.platform {
            return Err(ClipboardError::Unavailable("disabled".to_string()));
        }
        let mut clipboard = arboard::Clipboard::new()
            .map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
        clipboard
            .set_text(text)
            .map_err(|e| ClipboardError::Rejected(e.to_string()))
    }

    fn write_fallback(&self, text: &str) -> Result<(), ClipboardError> {
        match &self.helper {
            Some(helper) => helper.run(text),
            None => Err(ClipboardError::NoHelper(
                HELPER_CANDIDATES
                    .iter()
                    .map(|(p, _)| *p)
                    .collect::<Vec<_>>()
                    .join(", "),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    /// Records writes; each path can be made to fail
    struct FakeClipboard {
        primary: Result<(), fn() -> ClipboardError>,
        fallback: Result<(), fn() -> ClipboardError>,
        writes: Mutex<Vec<(CopyPath, String)>>,
    }

    impl FakeClipboard {
        fn new(
            primary: Result<(), fn() -> ClipboardError>,
            fallback: Result<(), fn() -> ClipboardError>,
        ) -> Self {
            Self {
                primary,
                fallback,
                writes: Mutex::new(Vec::new()),
            }
        }
    }

    impl ClipboardBackend for FakeClipboard {
        fn write_primary(&self, text: &str) -> Result<(), ClipboardError> {
            self.primary.map_err(|e| e())?;
            self.writes.lock().unwrap().push((CopyPath::Primary, text.to_string()));
            Ok(())
        }

        fn write_fallback(&self, text: &str) -> Result<(), ClipboardError> {
            self.fallback.map_err(|e| e())?;
            self.writes.lock().unwrap().push((CopyPath::Fallback, text.to_string()));
            Ok(())
        }
    }

    fn unavailable() -> ClipboardError {
        ClipboardError::Unavailable("no display".to_string())
    }

    fn rejected() -> ClipboardError {
        ClipboardError::Rejected("denied".to_string())
    }

    fn no_helper() -> ClipboardError {
        ClipboardError::NoHelper("xclip".to_string())
    }

    #[test]
    fn test_primary_path() {
        let fake = FakeClipboard::new(Ok(()), Ok(()));
        let outcome = copy_text(&fake, "{\n  \"a\": 1\n}");
        assert!(matches!(outcome, CopyOutcome::Copied(CopyPath::Primary)));
        assert_eq!(
            *fake.writes.lock().unwrap(),
            vec![(CopyPath::Primary, "{\n  \"a\": 1\n}".to_string())]
        );
    }

    #[test]
    fn test_rejected_primary_does_not_fall_back() {
        let fake = FakeClipboard::new(Err(rejected), Ok(()));
        let outcome = copy_text(&fake, "x");
        assert!(matches!(outcome, CopyOutcome::PrimaryFailed(ClipboardError::Rejected(_))));
        assert!(fake.writes.lock().unwrap().is_empty());
    }

    #[test]
    fn test_unavailable_primary_uses_fallback() {
        let fake = FakeClipboard::new(Err(unavailable), Ok(()));
        let outcome = copy_text(&fake, "x");
        assert!(matches!(outcome, CopyOutcome::Copied(CopyPath::Fallback)));
        assert_eq!(*fake.writes.lock().unwrap(), vec![(CopyPath::Fallback, "x".to_string())]);
    }

    #[test]
    fn test_total_failure() {
        let fake = FakeClipboard::new(Err(unavailable), Err(no_helper));
        let outcome = copy_text(&fake, "x");
        assert!(matches!(outcome, CopyOutcome::Failed(ClipboardError::NoHelper(_))));
    }

    #[test]
    fn test_spawn_copy_reports_back() {
        let fake: Arc<dyn ClipboardBackend> = Arc::new(FakeClipboard::new(Ok(()), Ok(())));
        let (tx, rx) = mpsc::channel();
        spawn_copy(
            fake,
            CopyRequest {
                container: ContainerId(3),
                text: "héllo".to_string(),
                restore: ControlFace::COPY,
            },
            tx,
        );
        let report = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(report.container, ContainerId(3));
        assert_eq!(report.chars, 5);
        assert_eq!(report.restore, ControlFace::COPY);
        assert!(matches!(report.outcome, CopyOutcome::Copied(CopyPath::Primary)));
    }

    #[test]
    fn test_parse_helper_command() {
        let helper = HelperCommand::parse("xclip -selection clipboard").unwrap();
        assert_eq!(helper.program, "xclip");
        assert_eq!(helper.args, vec!["-selection", "clipboard"]);
        assert!(HelperCommand::parse("   ").is_none());
    }

    #[test]
    fn test_disabled_platform_is_unavailable() {
        let clipboard = SystemClipboard::new(false, None);
        assert!(matches!(
            clipboard.write_primary("x"),
            Err(ClipboardError::Unavailable(_))
        ));
        assert!(matches!(
            clipboard.write_fallback("x"),
            Err(ClipboardError::NoHelper(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_helper_receives_text() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("clip.txt");
        let helper = HelperCommand {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), format!("cat > '{}'", out.display())],
        };
        let clipboard = SystemClipboard::new(false, Some(helper));

        let outcome = copy_text(&clipboard, "{\n  \"b\": 1\n}");
        assert!(matches!(outcome, CopyOutcome::Copied(CopyPath::Fallback)));
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "{\n  \"b\": 1\n}");
    }

    #[cfg(unix)]
    #[test]
    fn test_helper_failure_exit_status() {
        let helper = HelperCommand::parse("sh -c false").unwrap();
        let err = helper.run("x").unwrap_err();
        assert!(matches!(err, ClipboardError::HelperExit { .. }));
    }

    #[test]
    fn test_helper_missing_program() {
        let helper = HelperCommand::parse("definitely-not-a-clipboard-helper-xyz").unwrap();
        let err = helper.run("x").unwrap_err();
        assert!(matches!(err, ClipboardError::HelperSpawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_helper_process_is_killed_on_drop() {
        let child = Command::new("sleep")
            .arg("30")
            .stdin(Stdio::null())
            .spawn()
            .unwrap();
        let started = Instant::now();
        drop(HelperProcess::new(child, "sleep"));
        assert!(started.elapsed() < Duration::from_secs(10));
    }
}
