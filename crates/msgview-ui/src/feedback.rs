//! Temporary "Copied!" confirmation on copy controls

use std::collections::HashMap;
use std::time::{Duration, Instant};

use msgview_core::{ContainerId, ControlFace, Page};

use crate::clipboard::CopyPath;

/// How long a copy control shows its confirmation
pub const CONFIRMATION_DELAY: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, Copy)]
struct PendingRevert {
    at: Instant,
    restore: ControlFace,
}

/// Scheduled reverts of copy controls, one per container.
///
/// Scheduling again for the same container replaces the deadline; the face
/// to restore is whatever the control showed before its first confirmation.
#[derive(Debug, Default)]
pub struct CopyConfirmations {
    pending: HashMap<ContainerId, PendingRevert>,
}

impl CopyConfirmations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Face the copy control returns to once any confirmation is over
    pub fn resting_face(&self, page: &Page, id: ContainerId) -> Option<ControlFace> {
        match self.pending.get(&id) {
            Some(pending) => Some(pending.restore),
            None => page.widget(id).map(|w| w.copy.face),
        }
    }

    /// Show the confirmation on `id`'s copy control until `now + CONFIRMATION_DELAY`
    pub fn confirm(
        &mut self,
        page: &mut Page,
        id: ContainerId,
        path: CopyPath,
        restore: ControlFace,
        now: Instant,
    ) -> bool {
        let Some(widget) = page.widget_mut(id) else {
            return false;
        };
        widget.copy.face = match path {
            CopyPath::Primary => ControlFace::COPIED,
            CopyPath::Fallback => ControlFace::icon_only_confirmation(restore),
        };
        self.pending.insert(
            id,
            PendingRevert {
                at: now + CONFIRMATION_DELAY,
                restore,
            },
        );
        true
    }

    /// Revert every confirmation whose deadline has passed. Returns how many.
    pub fn tick(&mut self, page: &mut Page, now: Instant) -> usize {
        let due: Vec<ContainerId> = self
            .pending
            .iter()
            .filter(|(_, p)| now >= p.at)
            .map(|(id, _)| *id)
            .collect();

        for id in &due {
            if let Some(pending) = self.pending.remove(id) {
                if let Some(widget) = page.widget_mut(*id) {
                    widget.copy.face = pending.restore;
                }
            }
        }
        due.len()
    }

    pub fn is_pending(&self, id: ContainerId) -> bool {
        self.pending.contains_key(&id)
    }

    /// Earliest scheduled revert
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|p| p.at).min()
    }
}
