// Copyright 2025 Eric Jingryd (tidynest@proton.me)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Win32 implementation of the native hotkey capability
//!
//! A hidden message-only window and its message pump live on a dedicated
//! "hotkey-bridge" thread for the lifetime of the bridge. RegisterHotKey,
//! UnregisterHotKey and WM_HOTKEY delivery are all affine to the thread that
//! registers, so register/unregister requests from the owning manager are
//! marshalled onto the pump thread through a command channel and a posted
//! WM_APP wake-up; the caller blocks on the boolean reply.
//!
//! Teardown order matters: the pump exits, the press sender is dropped (the
//! event stream ends), and only then is the window destroyed.

use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::{self, JoinHandle};

use thiserror::Error;
use tracing::{debug, info, warn};
use windows::core::{w, PCWSTR};
use windows::Win32::Foundation::{HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    RegisterHotKey, UnregisterHotKey, HOT_KEY_MODIFIERS, MOD_NOREPEAT,
};
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW, GetMessageW, PostMessageW,
    RegisterClassW, TranslateMessage, HWND_MESSAGE, MSG, WINDOW_EX_STYLE, WINDOW_STYLE, WM_APP,
    WM_HOTKEY, WNDCLASSW,
};

use super::{KeyPress, NativeHotkeys};
use crate::core::types::KeyCombination;

const WINDOW_CLASS: PCWSTR = w!("GlobalHotkeyManagerBridge");

/// Posted to wake the pump when a command is queued.
const WM_APP_COMMAND: u32 = WM_APP + 1;
/// Posted once, at drop, to end the pump.
const WM_APP_SHUTDOWN: u32 = WM_APP + 2;

/// Errors that can occur while bringing the bridge up.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("failed to spawn hotkey bridge thread: {0}")]
    ThreadSpawn(String),

    #[error("failed to create message-only window: {0}")]
    WindowCreation(String),

    #[error("hotkey bridge thread ended before initialisation")]
    Disconnected,
}

enum Command {
    Register { id: i32, modifiers: u32, vk: u32 },
    Unregister { id: i32 },
}

/// The one concrete [`NativeHotkeys`] implementation on Windows.
pub struct WindowsHotkeys {
    // HWND is not Send; carried as the raw pointer value and rebuilt per call
    hwnd: isize,
    command_tx: Sender<Command>,
    reply_rx: Receiver<bool>,
    presses: Option<Receiver<KeyPress>>,
    thread: Option<JoinHandle<()>>,
}

impl WindowsHotkeys {
    /// Creates the listening window on its own thread and waits for it to
    /// come up. On any construction failure the thread is joined before the
    /// error is returned; nothing native outlives this call.
    pub fn new() -> Result<Self, BridgeError> {
        let (command_tx, command_rx) = channel();
        let (reply_tx, reply_rx) = channel();
        let (press_tx, press_rx) = channel();
        let (init_tx, init_rx) = channel();

        let thread = thread::Builder::new()
            .name("hotkey-bridge".to_string())
            .spawn(move || pump(command_rx, reply_tx, press_tx, init_tx))
            .map_err(|e| BridgeError::ThreadSpawn(e.to_string()))?;

        match init_rx.recv() {
            Ok(Ok(hwnd)) => {
                info!("hotkey bridge window created");
                Ok(Self {
                    hwnd,
                    command_tx,
                    reply_rx,
                    presses: Some(press_rx),
                    thread: Some(thread),
                })
            }
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => {
                let _ = thread.join();
                Err(BridgeError::Disconnected)
            }
        }
    }

    /// Runs one command on the pump thread and returns its boolean result.
    /// A dead bridge reports failure rather than panicking; the registry
    /// degrades the affected action to unbound.
    fn run(&self, command: Command) -> bool {
        if self.command_tx.send(command).is_err() {
            warn!("hotkey bridge is gone; command dropped");
            return false;
        }
        if !self.post(WM_APP_COMMAND) {
            warn!("could not wake hotkey bridge; command dropped");
            return false;
        }
        match self.reply_rx.recv() {
            Ok(ok) => ok,
            Err(_) => {
                warn!("hotkey bridge disconnected while awaiting reply");
                false
            }
        }
    }

    fn post(&self, message: u32) -> bool {
        let hwnd = HWND(self.hwnd as *mut std::ffi::c_void);
        // SAFETY: PostMessageW is an OS API; the window may already be gone,
        // which surfaces as Err and is handled by the caller.
        unsafe { PostMessageW(Some(hwnd), message, WPARAM(0), LPARAM(0)).is_ok() }
    }
}

impl NativeHotkeys for WindowsHotkeys {
    fn register_hotkey(&mut self, id: i32, combination: &KeyCombination) -> bool {
        let Some(key) = combination.key else {
            return false;
        };
        self.run(Command::Register {
            id,
            modifiers: combination.modifiers.bits(),
            vk: key.vk(),
        })
    }

    fn unregister_hotkey(&mut self, id: i32) -> bool {
        self.run(Command::Unregister { id })
    }

    fn take_presses(&mut self) -> Option<Receiver<KeyPress>> {
        self.presses.take()
    }
}

impl Drop for WindowsHotkeys {
    fn drop(&mut self) {
        if self.post(WM_APP_SHUTDOWN) {
            if let Some(thread) = self.thread.take() {
                let _ = thread.join();
            }
        } else if self.thread.take().is_some() {
            // Window already unreachable; the pump cannot be woken, so the
            // thread is detached instead of joined to avoid hanging drop.
            warn!("hotkey bridge unreachable at shutdown; detaching pump thread");
        }
    }
}

/// Message pump. Owns the window from creation to destruction.
fn pump(
    commands: Receiver<Command>,
    replies: Sender<bool>,
    presses: Sender<KeyPress>,
    init: Sender<Result<isize, BridgeError>>,
) {
    let hwnd = match create_message_window() {
        Ok(hwnd) => hwnd,
        Err(e) => {
            let _ = init.send(Err(e));
            return;
        }
    };
    if init.send(Ok(hwnd.0 as isize)).is_err() {
        // Constructor vanished; tear the window down again.
        unsafe {
            let _ = DestroyWindow(hwnd);
        }
        return;
    }

    let mut msg = MSG::default();
    loop {
        // SAFETY: msg outlives the call; GetMessageW blocks until a message
        // for this thread arrives.
        let status = unsafe { GetMessageW(&mut msg, None, 0, 0) };
        if status.0 <= 0 {
            break;
        }

        match msg.message {
            WM_HOTKEY => match KeyPress::decode(msg.lParam.0) {
                Some(press) => {
                    if presses.send(press).is_err() {
                        debug!("press receiver dropped; notification discarded");
                    }
                }
                None => debug!(payload = msg.lParam.0, "unrecognised hotkey payload"),
            },
            WM_APP_COMMAND => {
                while let Ok(command) = commands.try_recv() {
                    let ok = run_command(hwnd, command);
                    if replies.send(ok).is_err() {
                        break;
                    }
                }
            }
            WM_APP_SHUTDOWN => break,
            _ => unsafe {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            },
        }
    }

    // The stream must end strictly before the window is destroyed.
    drop(presses);
    // SAFETY: the window was created on this thread and is destroyed on it.
    unsafe {
        let _ = DestroyWindow(hwnd);
    }
    info!("hotkey bridge stopped");
}

fn run_command(hwnd: HWND, command: Command) -> bool {
    match command {
        Command::Register { id, modifiers, vk } => {
            // MOD_NOREPEAT keeps a held combination from firing repeatedly
            let mods = HOT_KEY_MODIFIERS(modifiers | MOD_NOREPEAT.0);
            // SAFETY: RegisterHotKey is an OS API; hwnd belongs to this thread.
            match unsafe { RegisterHotKey(Some(hwnd), id, mods, vk) } {
                Ok(()) => true,
                Err(e) => {
                    warn!(id, error = %e, "RegisterHotKey refused");
                    false
                }
            }
        }
        Command::Unregister { id } => {
            // SAFETY: UnregisterHotKey is an OS API; hwnd belongs to this thread.
            match unsafe { UnregisterHotKey(Some(hwnd), id) } {
                Ok(()) => true,
                Err(e) => {
                    warn!(id, error = %e, "UnregisterHotKey refused");
                    false
                }
            }
        }
    }
}

fn create_message_window() -> Result<HWND, BridgeError> {
    // SAFETY: standard window-class registration and creation. The class may
    // already be registered by an earlier bridge in this process, in which
    // case RegisterClassW returns 0 and CreateWindowExW still succeeds.
    unsafe {
        let instance =
            GetModuleHandleW(None).map_err(|e| BridgeError::WindowCreation(e.to_string()))?;

        let class = WNDCLASSW {
            lpfnWndProc: Some(bridge_wndproc),
            hInstance: instance.into(),
            lpszClassName: WINDOW_CLASS,
            ..Default::default()
        };
        let _ = RegisterClassW(&class);

        CreateWindowExW(
            WINDOW_EX_STYLE::default(),
            WINDOW_CLASS,
            w!("global-hotkey-manager"),
            WINDOW_STYLE::default(),
            0,
            0,
            0,
            0,
            // Message-only window: invisible, no z-order, just a queue
            Some(HWND_MESSAGE),
            None,
            Some(instance.into()),
            None,
        )
        .map_err(|e| BridgeError::WindowCreation(e.to_string()))
    }
}

unsafe extern "system" fn bridge_wndproc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    // All interesting messages are posted and intercepted in the pump loop
    unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) }
}
