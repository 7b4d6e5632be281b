//! Native Win32 backend: WinEvent hook event source plus user32/GDI window
//! and monitor primitives.

use std::path::Path;
use std::sync::OnceLock;
use std::thread;

use tokio::sync::mpsc;

use windows::Win32::Foundation::{BOOL, CloseHandle, HWND, LPARAM, MAX_PATH, RECT, TRUE};
use windows::Win32::Graphics::Gdi::{
    EnumDisplayMonitors, GetMonitorInfoW, HDC, HMONITOR, MONITORINFO, MONITORINFOF_PRIMARY,
};
use windows::Win32::System::Threading::{
    OpenProcess, QueryFullProcessImageNameW, PROCESS_NAME_WIN32,
    PROCESS_QUERY_LIMITED_INFORMATION,
};
use windows::Win32::UI::Accessibility::{SetWinEventHook, HWINEVENTHOOK};
use windows::Win32::UI::WindowsAndMessaging::{
    DispatchMessageW, EnumWindows, GetClassNameW, GetMessageW, GetWindow, GetWindowRect,
    GetWindowTextW, GetWindowThreadProcessId, IsIconic, IsWindow, IsWindowVisible, SetWindowPos,
    ShowWindow, TranslateMessage, EVENT_OBJECT_CREATE, EVENT_OBJECT_NAMECHANGE, EVENT_OBJECT_SHOW,
    GW_OWNER, MSG, OBJID_WINDOW, SWP_NOACTIVATE, SWP_NOMOVE, SWP_NOSIZE, SWP_NOZORDER,
    SW_MAXIMIZE, SW_MINIMIZE, WINEVENT_OUTOFCONTEXT, WINEVENT_SKIPOWNPROCESS,
};
use windows::core::PWSTR;

use crate::core::{Rect, WindowId};
use crate::event::{EventKind, WindowEvent};
use crate::platform::{
    DesktopManager, EventSource, PlatformError, WindowAttributes, WindowManipulator, WindowSystem,
};

fn hwnd_of(window: WindowId) -> HWND {
    HWND(window as usize as *mut std::ffi::c_void)
}

fn id_of(hwnd: HWND) -> WindowId {
    hwnd.0 as usize as u64
}

#[derive(Default)]
pub struct Win32WindowSystem;

impl Win32WindowSystem {
    pub fn new() -> Self {
        Self
    }
}

unsafe extern "system" fn enum_windows_proc(hwnd: HWND, lparam: LPARAM) -> BOOL {
    let windows = &mut *(lparam.0 as *mut Vec<WindowId>);
    // Owned windows (dialogs, tooltips) are managed by their owner.
    let unowned = GetWindow(hwnd, GW_OWNER).map(|h| h.0.is_null()).unwrap_or(true);
    if IsWindowVisible(hwnd).as_bool() && unowned {
        windows.push(id_of(hwnd));
    }
    TRUE
}

unsafe extern "system" fn enum_monitors_proc(
    hmonitor: HMONITOR,
    _hdc: HDC,
    _clip: *mut RECT,
    lparam: LPARAM,
) -> BOOL {
    let monitors = &mut *(lparam.0 as *mut Vec<(bool, Rect)>);
    let mut info = MONITORINFO {
        cbSize: std::mem::size_of::<MONITORINFO>() as u32,
        ..Default::default()
    };
    if GetMonitorInfoW(hmonitor, &mut info).as_bool() {
        let rc = info.rcMonitor;
        monitors.push((
            info.dwFlags & MONITORINFOF_PRIMARY != 0,
            Rect::new(rc.left, rc.top, rc.right - rc.left, rc.bottom - rc.top),
        ));
    }
    TRUE
}

fn process_name(hwnd: HWND) -> Option<String> {
    let mut pid = 0u32;
    unsafe {
        GetWindowThreadProcessId(hwnd, Some(&mut pid));
    }
    if pid == 0 {
        return None;
    }

    let handle =
        unsafe { OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, BOOL::from(false), pid) }.ok()?;
    let mut buf = [0u16; MAX_PATH as usize];
    let mut len = buf.len() as u32;
    let result = unsafe {
        QueryFullProcessImageNameW(handle, PROCESS_NAME_WIN32, PWSTR(buf.as_mut_ptr()), &mut len)
    };
    unsafe {
        let _ = CloseHandle(handle);
    }
    result.ok()?;

    let path = String::from_utf16_lossy(&buf[..len as usize]);
    Path::new(&path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
}

impl WindowSystem for Win32WindowSystem {
    fn list_windows(&self) -> Result<Vec<WindowId>, PlatformError> {
        let mut windows: Vec<WindowId> = Vec::new();
        unsafe {
            EnumWindows(
                Some(enum_windows_proc),
                LPARAM(&mut windows as *mut _ as isize),
            )
        }
        .map_err(|e| PlatformError::Backend(e.to_string()))?;
        Ok(windows)
    }

    fn window_attributes(&self, window: WindowId) -> Result<WindowAttributes, PlatformError> {
        let hwnd = hwnd_of(window);
        unsafe {
            if !IsWindow(Some(hwnd)).as_bool() {
                return Err(PlatformError::WindowGone(window));
            }

            let mut title_buf = [0u16; 512];
            let title_len = GetWindowTextW(hwnd, &mut title_buf) as usize;
            let title = String::from_utf16_lossy(&title_buf[..title_len]);

            let mut class_buf = [0u16; 256];
            let class_len = GetClassNameW(hwnd, &mut class_buf) as usize;
            let class_name = if class_len > 0 {
                Some(String::from_utf16_lossy(&class_buf[..class_len]))
            } else {
                None
            };

            let mut rect = RECT::default();
            GetWindowRect(hwnd, &mut rect).map_err(|_| PlatformError::WindowGone(window))?;

            Ok(WindowAttributes {
                title,
                process: process_name(hwnd),
                class_name,
                frame: Rect::new(
                    rect.left,
                    rect.top,
                    rect.right - rect.left,
                    rect.bottom - rect.top,
                ),
                is_visible: IsWindowVisible(hwnd).as_bool(),
                is_minimized: IsIconic(hwnd).as_bool(),
            })
        }
    }

    fn monitors(&self) -> Result<Vec<Rect>, PlatformError> {
        let mut found: Vec<(bool, Rect)> = Vec::new();
        let ok = unsafe {
            EnumDisplayMonitors(
                None,
                None,
                Some(enum_monitors_proc),
                LPARAM(&mut found as *mut _ as isize),
            )
        };
        if !ok.as_bool() || found.is_empty() {
            return Err(PlatformError::Backend(
                "monitor enumeration failed".to_string(),
            ));
        }
        // Primary monitor first, keeping enumeration order otherwise.
        found.sort_by_key(|(primary, _)| !*primary);
        Ok(found.into_iter().map(|(_, rect)| rect).collect())
    }
}

#[derive(Default)]
pub struct Win32Manipulator;

impl Win32Manipulator {
    pub fn new() -> Self {
        Self
    }

    fn ensure_alive(&self, window: WindowId) -> Result<HWND, PlatformError> {
        let hwnd = hwnd_of(window);
        if unsafe { IsWindow(Some(hwnd)) }.as_bool() {
            Ok(hwnd)
        } else {
            Err(PlatformError::WindowGone(window))
        }
    }
}

impl WindowManipulator for Win32Manipulator {
    fn move_window(&self, window: WindowId, x: i32, y: i32) -> Result<(), PlatformError> {
        let hwnd = self.ensure_alive(window)?;
        unsafe {
            SetWindowPos(
                hwnd,
                None,
                x,
                y,
                0,
                0,
                SWP_NOSIZE | SWP_NOZORDER | SWP_NOACTIVATE,
            )
        }
        .map_err(|_| PlatformError::WindowGone(window))
    }

    fn resize_window(
        &self,
        window: WindowId,
        width: i32,
        height: i32,
    ) -> Result<(), PlatformError> {
        let hwnd = self.ensure_alive(window)?;
        unsafe {
            SetWindowPos(
                hwnd,
                None,
                0,
                0,
                width,
                height,
                SWP_NOMOVE | SWP_NOZORDER | SWP_NOACTIVATE,
            )
        }
        .map_err(|_| PlatformError::WindowGone(window))
    }

    fn maximize(&self, window: WindowId) -> Result<(), PlatformError> {
        let hwnd = self.ensure_alive(window)?;
        unsafe {
            let _ = ShowWindow(hwnd, SW_MAXIMIZE);
        }
        Ok(())
    }

    fn minimize(&self, window: WindowId) -> Result<(), PlatformError> {
        let hwnd = self.ensure_alive(window)?;
        unsafe {
            let _ = ShowWindow(hwnd, SW_MINIMIZE);
        }
        Ok(())
    }
}

/// Windows has no public API for enumerating virtual desktops or moving
/// windows between them; the engine treats Unsupported as a logged,
/// non-fatal environment condition.
#[derive(Default)]
pub struct Win32Desktops;

impl Win32Desktops {
    pub fn new() -> Self {
        Self
    }
}

impl DesktopManager for Win32Desktops {
    fn desktop_count(&self) -> Result<usize, PlatformError> {
        Err(PlatformError::Unsupported)
    }

    fn move_to_desktop(&self, _window: WindowId, _desktop: usize) -> Result<(), PlatformError> {
        Err(PlatformError::Unsupported)
    }
}

static EVENT_TX: OnceLock<mpsc::Sender<WindowEvent>> = OnceLock::new();

unsafe extern "system" fn win_event_proc(
    _hook: HWINEVENTHOOK,
    event: u32,
    hwnd: HWND,
    id_object: i32,
    _id_child: i32,
    _id_thread: u32,
    _time: u32,
) {
    // Only top-level window objects; child object events reuse the same hook.
    if id_object != OBJID_WINDOW.0 || hwnd.0.is_null() {
        return;
    }

    let kind = match event {
        EVENT_OBJECT_CREATE => EventKind::Created,
        EVENT_OBJECT_SHOW => EventKind::Shown,
        EVENT_OBJECT_NAMECHANGE => EventKind::TitleChanged,
        _ => return,
    };

    if let Some(tx) = EVENT_TX.get() {
        // Dropping events under pressure is fine: a lost Created event is
        // recovered by the next title change or a rescan.
        if tx.try_send(WindowEvent::new(id_of(hwnd), kind)).is_err() {
            tracing::warn!("event channel full, dropping {:?} for {:#x}", kind, id_of(hwnd));
        }
    }
}

/// Out-of-context WinEvent hook pumping its own message loop on a dedicated
/// thread.
#[derive(Default)]
pub struct WinEventSource;

impl WinEventSource {
    pub fn new() -> Self {
        Self
    }
}

impl EventSource for WinEventSource {
    fn start(&self, tx: mpsc::Sender<WindowEvent>) -> Result<(), PlatformError> {
        EVENT_TX
            .set(tx)
            .map_err(|_| PlatformError::Backend("event source already started".to_string()))?;

        thread::Builder::new()
            .name("win-event-hook".to_string())
            .spawn(|| unsafe {
                // The range covers CREATE (0x8000) through NAMECHANGE
                // (0x800C); everything else is filtered in the callback.
                let hook = SetWinEventHook(
                    EVENT_OBJECT_CREATE,
                    EVENT_OBJECT_NAMECHANGE,
                    None,
                    Some(win_event_proc),
                    0,
                    0,
                    WINEVENT_OUTOFCONTEXT | WINEVENT_SKIPOWNPROCESS,
                );
                if hook.is_invalid() {
                    tracing::error!("SetWinEventHook failed, no window events will arrive");
                    return;
                }
                tracing::info!("WinEvent hook installed");

                let mut msg = MSG::default();
                while GetMessageW(&mut msg, None, 0, 0).as_bool() {
                    let _ = TranslateMessage(&msg);
                    DispatchMessageW(&msg);
                }
            })
            .map_err(|e| PlatformError::Backend(e.to_string()))?;

        Ok(())
    }
}
