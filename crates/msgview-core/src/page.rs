//! Page of message containers and the widget attached to each
//!
//! A page owns its containers and a handler table keyed by control identity.
//! Each control id maps to exactly one `(container, action)` pair, and wiring
//! a container's controls always retires the previous ids first, so handlers
//! cannot pile up no matter how often setup runs.

use std::collections::HashMap;

use thiserror::Error;

use crate::classify::classify_raw;
use crate::filter::record_order;
use crate::presentation::{render, ControlFace, Presentation, PresentationState, DEFAULT_EXPANDED_ROWS};
use crate::types::{Classification, ContainerId, ControlAction, ControlId, DerivedText, MessageRecord};

/// Errors from setting up a single container
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SetupError {
    #[error("unknown container {0:?}")]
    UnknownContainer(ContainerId),

    #[error("container {0:?} has no payload body")]
    MissingBody(ContainerId),

    #[error("container {0:?} has no widget to wire")]
    NotInitialized(ContainerId),
}

/// A wired control
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Control {
    pub id: ControlId,
    pub face: ControlFace,
}

/// Widget state attached to an initialized container
#[derive(Debug, Clone)]
pub struct Widget {
    pub classification: Classification,
    pub derived: DerivedText,
    pub state: PresentationState,
    /// Vertical scroll of an expanded payload
    pub scroll: u16,
    pub toggle: Control,
    pub copy: Control,
}

impl Widget {
    /// Current presentation
    pub fn presentation(&self, expanded_rows: u16) -> Presentation<'_> {
        render(self.state, &self.derived, expanded_rows)
    }

    fn enter(&mut self, state: PresentationState) {
        self.state = state;
        self.toggle.face = render(state, &self.derived, DEFAULT_EXPANDED_ROWS).toggle;
        if state == PresentationState::Collapsed {
            self.scroll = 0;
        }
    }
}

/// One message record plus its widget
#[derive(Debug, Clone)]
pub struct Container {
    pub id: ContainerId,
    pub record: MessageRecord,
    /// Set once the widget is attached; never cleared
    pub initialized: bool,
    pub widget: Option<Widget>,
}

impl Container {
    /// Raw payload, if the container has a body
    pub fn raw_text(&self) -> Option<&str> {
        self.record.value.as_deref()
    }
}

/// Result of a user activating a control
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    Toggled {
        container: ContainerId,
        state: PresentationState,
    },
    CopyRequested {
        container: ContainerId,
        text: String,
    },
}

/// Summary of one `initialize_all` pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InitReport {
    /// Containers set up during this pass
    pub initialized: usize,
    /// Containers that were already set up
    pub already_initialized: usize,
    /// Containers that could not be set up
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Handler {
    container: ContainerId,
    action: ControlAction,
}

/// A page (root) of message containers
#[derive(Debug, Clone)]
pub struct Page {
    containers: Vec<Container>,
    handlers: HashMap<ControlId, Handler>,
    next_container_id: u64,
    next_control_id: u64,
    expanded_rows: u16,
}

impl Default for Page {
    fn default() -> Self {
        Self::new(DEFAULT_EXPANDED_ROWS)
    }
}

impl Page {
    /// Create an empty page
    pub fn new(expanded_rows: u16) -> Self {
        Self {
            containers: Vec::new(),
            handlers: HashMap::new(),
            next_container_id: 1,
            next_control_id: 1,
            expanded_rows,
        }
    }

    /// Create a page holding `records`; nothing is initialized yet
    pub fn from_records(records: Vec<MessageRecord>, expanded_rows: u16) -> Self {
        let mut page = Self::new(expanded_rows);
        page.append(records);
        page
    }

    /// Height cap for expanded payloads
    pub fn expanded_rows(&self) -> u16 {
        self.expanded_rows
    }

    /// Add containers for new records, keeping page order. Returns their ids.
    pub fn append(&mut self, records: Vec<MessageRecord>) -> Vec<ContainerId> {
        let mut ids = Vec::with_capacity(records.len());
        for record in records {
            let id = ContainerId(self.next_container_id);
            self.next_container_id += 1;
            self.containers.push(Container {
                id,
                record,
                initialized: false,
                widget: None,
            });
            ids.push(id);
        }
        self.containers
            .sort_by(|a, b| record_order(&a.record, &b.record));
        ids
    }

    /// Attach the widget to every container that does not have one yet.
    ///
    /// Safe to call repeatedly: initialized containers are left alone.
    pub fn initialize_all(&mut self) -> InitReport {
        let mut report = InitReport::default();
        let pending: Vec<ContainerId> = self
            .containers
            .iter()
            .filter(|c| {
                if c.initialized {
                    report.already_initialized += 1;
                }
                !c.initialized
            })
            .map(|c| c.id)
            .collect();

        for id in pending {
            match self.setup_container(id) {
                Ok(()) => report.initialized += 1,
                Err(e) => {
                    tracing::warn!(container = id.0, error = %e, "skipping container");
                    report.skipped += 1;
                }
            }
        }

        tracing::debug!(
            initialized = report.initialized,
            already = report.already_initialized,
            skipped = report.skipped,
            "initialized containers"
        );
        report
    }

    /// Classify, render collapsed, and wire one container.
    ///
    /// Running it again on an initialized container rebuilds the widget and
    /// replaces its controls; the old control ids stop resolving.
    pub fn setup_container(&mut self, id: ContainerId) -> Result<(), SetupError> {
        let idx = self.index_of(id).ok_or(SetupError::UnknownContainer(id))?;
        let raw = self.containers[idx]
            .raw_text()
            .ok_or(SetupError::MissingBody(id))?;
        let (classification, derived) = classify_raw(raw);

        if let Some(old) = self.containers[idx].widget.take() {
            self.retire(&old);
        }

        let state = PresentationState::Collapsed;
        let toggle_face = render(state, &derived, self.expanded_rows).toggle;
        let toggle = Control {
            id: self.bind(id, ControlAction::Toggle),
            face: toggle_face,
        };
        let copy = Control {
            id: self.bind(id, ControlAction::Copy),
            face: ControlFace::COPY,
        };

        let container = &mut self.containers[idx];
        container.widget = Some(Widget {
            classification,
            derived,
            state,
            scroll: 0,
            toggle,
            copy,
        });
        container.initialized = true;

        tracing::debug!(
            container = id.0,
            kind = classification.label(),
            "attached widget"
        );
        Ok(())
    }

    /// Replace a container's controls with fresh ones, keeping their faces
    pub fn wire_controls(&mut self, id: ContainerId) -> Result<(), SetupError> {
        let idx = self.index_of(id).ok_or(SetupError::UnknownContainer(id))?;
        let (old_toggle, old_copy) = match &self.containers[idx].widget {
            Some(widget) => (widget.toggle.id, widget.copy.id),
            None => return Err(SetupError::NotInitialized(id)),
        };
        self.handlers.remove(&old_toggle);
        self.handlers.remove(&old_copy);

        let toggle_id = self.bind(id, ControlAction::Toggle);
        let copy_id = self.bind(id, ControlAction::Copy);
        if let Some(widget) = self.containers[idx].widget.as_mut() {
            widget.toggle.id = toggle_id;
            widget.copy.id = copy_id;
        }
        Ok(())
    }

    /// Run the handler bound to `control`, if any
    pub fn activate(&mut self, control: ControlId) -> Option<Activation> {
        let handler = *self.handlers.get(&control)?;
        let widget = self.widget_mut(handler.container)?;

        match handler.action {
            ControlAction::Toggle => {
                let next = widget.state.toggled();
                widget.enter(next);
                Some(Activation::Toggled {
                    container: handler.container,
                    state: next,
                })
            }
            ControlAction::Copy => Some(Activation::CopyRequested {
                container: handler.container,
                text: widget.derived.expanded.clone(),
            }),
        }
    }

    /// Force a container into `state`. Returns whether it changed.
    pub fn set_state(&mut self, id: ContainerId, state: PresentationState) -> bool {
        match self.widget_mut(id) {
            Some(widget) if widget.state != state => {
                widget.enter(state);
                true
            }
            _ => false,
        }
    }

    /// Force every initialized container into `state`. Returns how many changed.
    pub fn set_all(&mut self, state: PresentationState) -> usize {
        let ids: Vec<ContainerId> = self.containers.iter().map(|c| c.id).collect();
        ids.into_iter().filter(|&id| self.set_state(id, state)).count()
    }

    /// Scroll an expanded payload by `delta` rows, keeping the offset within `0..=max`
    pub fn scroll(&mut self, id: ContainerId, delta: i32, max: u16) {
        if let Some(widget) = self.widget_mut(id) {
            if widget.state == PresentationState::Expanded {
                let target = i64::from(widget.scroll) + i64::from(delta);
                widget.scroll = target.clamp(0, i64::from(max)) as u16;
            }
        }
    }

    /// Number of live handler bindings
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Container and action a control id resolves to
    pub fn handler(&self, control: ControlId) -> Option<(ContainerId, ControlAction)> {
        self.handlers.get(&control).map(|h| (h.container, h.action))
    }

    pub fn containers(&self) -> &[Container] {
        &self.containers
    }

    pub fn len(&self) -> usize {
        self.containers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    pub fn index_of(&self, id: ContainerId) -> Option<usize> {
        self.containers.iter().position(|c| c.id == id)
    }

    pub fn container(&self, id: ContainerId) -> Option<&Container> {
        self.containers.iter().find(|c| c.id == id)
    }

    pub fn widget(&self, id: ContainerId) -> Option<&Widget> {
        self.container(id)?.widget.as_ref()
    }

    pub fn widget_mut(&mut self, id: ContainerId) -> Option<&mut Widget> {
        self.containers
            .iter_mut()
            .find(|c| c.id == id)?
            .widget
            .as_mut()
    }

    fn bind(&mut self, container: ContainerId, action: ControlAction) -> ControlId {
        let id = ControlId(self.next_control_id);
        self.next_control_id += 1;
        self.handlers.insert(id, Handler { container, action });
        id
    }

    fn retire(&mut self, widget: &Widget) {
        self.handlers.remove(&widget.toggle.id);
        self.handlers.remove(&widget.copy.id);
    }
}
