use thiserror::Error;
use tokio::sync::mpsc;

use crate::core::{Rect, WindowId};
use crate::event::WindowEvent;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("window {0:#x} is gone")]
    WindowGone(WindowId),
    #[error("not supported on this platform")]
    Unsupported,
    #[error("{0}")]
    Backend(String),
}

/// Snapshot of a window's attributes. Process and class may be unavailable
/// even while the window itself is alive.
#[derive(Debug, Clone)]
pub struct WindowAttributes {
    pub title: String,
    pub process: Option<String>,
    pub class_name: Option<String>,
    pub frame: Rect,
    pub is_visible: bool,
    pub is_minimized: bool,
}

/// Trait for querying windows and monitors from the system.
/// This abstraction allows mocking in tests.
pub trait WindowSystem: Send + Sync + 'static {
    /// Identities of all current top-level windows.
    fn list_windows(&self) -> Result<Vec<WindowId>, PlatformError>;
    /// Attributes of one window. `Err` means the window is gone.
    fn window_attributes(&self, window: WindowId) -> Result<WindowAttributes, PlatformError>;
    /// Monitor rectangles in virtual-screen coordinates, primary first.
    fn monitors(&self) -> Result<Vec<Rect>, PlatformError>;
}

/// Trait for manipulating windows (side effects).
/// This abstraction allows mocking in tests.
pub trait WindowManipulator: Send + Sync + 'static {
    fn move_window(&self, window: WindowId, x: i32, y: i32) -> Result<(), PlatformError>;
    fn resize_window(&self, window: WindowId, width: i32, height: i32)
        -> Result<(), PlatformError>;
    fn maximize(&self, window: WindowId) -> Result<(), PlatformError>;
    fn minimize(&self, window: WindowId) -> Result<(), PlatformError>;
}

/// Trait for the virtual desktop primitives.
pub trait DesktopManager: Send + Sync + 'static {
    fn desktop_count(&self) -> Result<usize, PlatformError>;
    /// Move a window to a 1-indexed desktop.
    fn move_to_desktop(&self, window: WindowId, desktop: usize) -> Result<(), PlatformError>;
}

/// Trait for the OS event subscription. Implementations deliver events on
/// `tx` from their own thread until the receiver is dropped.
pub trait EventSource {
    fn start(&self, tx: mpsc::Sender<WindowEvent>) -> Result<(), PlatformError>;
}

#[cfg(test)]
pub mod mock {
    use std::collections::{HashMap, HashSet};

    use parking_lot::Mutex;

    use super::*;

    pub fn create_test_attributes(
        title: &str,
        process: Option<&str>,
        class: Option<&str>,
        frame: Rect,
    ) -> WindowAttributes {
        WindowAttributes {
            title: title.to_string(),
            process: process.map(|s| s.to_string()),
            class_name: class.map(|s| s.to_string()),
            frame,
            is_visible: true,
            is_minimized: false,
        }
    }

    #[derive(Default)]
    struct MockSystemState {
        windows: HashMap<WindowId, WindowAttributes>,
        monitors: Vec<Rect>,
        fail_enumeration: bool,
    }

    #[derive(Default)]
    pub struct MockWindowSystem {
        state: Mutex<MockSystemState>,
    }

    impl MockWindowSystem {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_monitors(self, monitors: Vec<Rect>) -> Self {
            self.state.lock().monitors = monitors;
            self
        }

        pub fn with_window(self, window: WindowId, attrs: WindowAttributes) -> Self {
            self.state.lock().windows.insert(window, attrs);
            self
        }

        pub fn add_window(&self, window: WindowId, attrs: WindowAttributes) {
            self.state.lock().windows.insert(window, attrs);
        }

        pub fn remove_window(&self, window: WindowId) {
            self.state.lock().windows.remove(&window);
        }

        pub fn set_title(&self, window: WindowId, title: &str) {
            if let Some(attrs) = self.state.lock().windows.get_mut(&window) {
                attrs.title = title.to_string();
            }
        }

        pub fn set_minimized(&self, window: WindowId, minimized: bool) {
            if let Some(attrs) = self.state.lock().windows.get_mut(&window) {
                attrs.is_minimized = minimized;
            }
        }

        pub fn set_fail_enumeration(&self, fail: bool) {
            self.state.lock().fail_enumeration = fail;
        }
    }

    impl WindowSystem for MockWindowSystem {
        fn list_windows(&self) -> Result<Vec<WindowId>, PlatformError> {
            let state = self.state.lock();
            if state.fail_enumeration {
                return Err(PlatformError::Backend("enumeration failed".to_string()));
            }
            Ok(state.windows.keys().copied().collect())
        }

        fn window_attributes(&self, window: WindowId) -> Result<WindowAttributes, PlatformError> {
            self.state
                .lock()
                .windows
                .get(&window)
                .cloned()
                .ok_or(PlatformError::WindowGone(window))
        }

        fn monitors(&self) -> Result<Vec<Rect>, PlatformError> {
            Ok(self.state.lock().monitors.clone())
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Mutation {
        Move { window: WindowId, x: i32, y: i32 },
        Resize { window: WindowId, width: i32, height: i32 },
        Maximize(WindowId),
        Minimize(WindowId),
    }

    #[derive(Default)]
    pub struct MockManipulator {
        calls: Mutex<Vec<Mutation>>,
        failing: Mutex<HashSet<WindowId>>,
    }

    impl MockManipulator {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make every mutation of `window` fail, as if it closed.
        pub fn fail_for(&self, window: WindowId) {
            self.failing.lock().insert(window);
        }

        pub fn calls(&self) -> Vec<Mutation> {
            self.calls.lock().clone()
        }

        fn record(&self, window: WindowId, mutation: Mutation) -> Result<(), PlatformError> {
            if self.failing.lock().contains(&window) {
                return Err(PlatformError::WindowGone(window));
            }
            self.calls.lock().push(mutation);
            Ok(())
        }
    }

    impl WindowManipulator for MockManipulator {
        fn move_window(&self, window: WindowId, x: i32, y: i32) -> Result<(), PlatformError> {
            self.record(window, Mutation::Move { window, x, y })
        }

        fn resize_window(
            &self,
            window: WindowId,
            width: i32,
            height: i32,
        ) -> Result<(), PlatformError> {
            self.record(window, Mutation::Resize { window, width, height })
        }

        fn maximize(&self, window: WindowId) -> Result<(), PlatformError> {
            self.record(window, Mutation::Maximize(window))
        }

        fn minimize(&self, window: WindowId) -> Result<(), PlatformError> {
            self.record(window, Mutation::Minimize(window))
        }
    }

    pub struct MockDesktops {
        /// `None` simulates an enumeration failure.
        count: Option<usize>,
        moves: Mutex<Vec<(WindowId, usize)>>,
    }

    impl MockDesktops {
        pub fn new(count: Option<usize>) -> Self {
            Self {
                count,
                moves: Mutex::new(Vec::new()),
            }
        }

        pub fn moves(&self) -> Vec<(WindowId, usize)> {
            self.moves.lock().clone()
        }
    }

    impl DesktopManager for MockDesktops {
        fn desktop_count(&self) -> Result<usize, PlatformError> {
            self.count
                .ok_or(PlatformError::Backend("desktop query failed".to_string()))
        }

        fn move_to_desktop(&self, window: WindowId, desktop: usize) -> Result<(), PlatformError> {
            self.moves.lock().push((window, desktop));
            Ok(())
        }
    }
}
