use crate::core::WindowId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Created,
    Shown,
    TitleChanged,
}

/// One window lifecycle observation from the event source.
#[derive(Debug, Clone, Copy)]
pub struct WindowEvent {
    pub window: WindowId,
    pub kind: EventKind,
}

impl WindowEvent {
    pub fn new(window: WindowId, kind: EventKind) -> Self {
        Self { window, kind }
    }
}
