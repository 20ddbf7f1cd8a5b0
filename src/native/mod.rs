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

//! Native hotkey integration behind a capability interface
//!
//! The registry depends only on the `NativeHotkeys` trait; exactly one
//! concrete platform implementation exists per target OS (`windows.rs`).
//! Registration failures are reported through the boolean return, never as
//! panics across the boundary, so a combination claimed by another process
//! degrades to an unbound entry instead of aborting startup.
//!
//! Press notifications arrive as a channel of decoded [`KeyPress`] values in
//! the order the OS reports them. The channel is handed out exactly once and
//! closes strictly before the underlying listening resource is destroyed.

#[cfg(test)]
pub(crate) mod testing;
#[cfg(windows)]
pub mod windows;

use std::sync::mpsc::Receiver;

use crate::core::types::{Key, KeyCombination, Modifiers};

/// First identifier handed out for application hotkey registrations.
pub const APP_ID_FIRST: i32 = 1;

/// Last identifier in the application sub-range. The range above it
/// (0xC000..=0xFFFF) is reserved for shared libraries and is never
/// allocated here.
pub const APP_ID_LAST: i32 = 0xBFFF;

/// A decoded global key press.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct KeyPress {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyPress {
    /// Decodes the payload word of a native hotkey notification: modifiers
    /// in the low word, virtual-key code in the high word. Notifications
    /// carrying a key outside the supported set yield `None` and are
    /// dropped by the bridge.
    pub fn decode(payload: isize) -> Option<KeyPress> {
        let raw = payload as usize as u64;
        let modifiers = Modifiers::from_bits_truncate((raw & 0xFFFF) as u32);
        let vk = ((raw >> 16) & 0xFFFF) as u32;
        Key::from_vk(vk).map(|key| KeyPress { key, modifiers })
    }

    /// The combination this press matches in the registry.
    pub fn combination(&self) -> KeyCombination {
        KeyCombination::new(self.modifiers, self.key)
    }
}

/// OS-level hotkey capability.
///
/// Implementations own the native listening resource for their platform and
/// release every live registration together with that resource on drop.
pub trait NativeHotkeys {
    /// Registers `combination` under `id`. Returns `true` on success. The
    /// combination must be bound; an unbound combination is refused.
    fn register_hotkey(&mut self, id: i32, combination: &KeyCombination) -> bool;

    /// Releases the registration behind `id`. Returns `true` on success.
    fn unregister_hotkey(&mut self, id: i32) -> bool;

    /// Hands out the press-event stream. Yields `Some` exactly once; the
    /// stream ends when the bridge shuts down.
    fn take_presses(&mut self) -> Option<Receiver<KeyPress>>;
}
