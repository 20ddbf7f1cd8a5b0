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

//! Global Hotkey Manager
//!
//! A system-wide hotkey manager core: registers global key combinations with
//! the operating system so the owning application reacts to them without
//! input focus, dispatches matched presses to application logic, resolves
//! registration conflicts, and persists the user's key mapping across
//! restarts.
//!
//! # Features
//!
//! - **Conflict-aware registration:** at most one action per key combination,
//!   enforced before the OS is ever asked
//! - **Degrade, never crash:** a refused registration leaves that one action
//!   unbound and notifies an observer; startup always completes
//! - **Forward-compatible persistence:** mappings from older or newer
//!   versions merge cleanly; new actions pick up defaults without stealing
//!   the user's combinations, and stale actions drop out individually
//! - **Atomic writes:** the mapping file is never half-written, and every
//!   overwrite is preceded by a timestamped backup
//!
//! # Architecture
//!
//! - **`core`:** business logic (types, registry, merge policy, parsing)
//! - **`config`:** mapping persistence (store contract + JSON file store)
//! - **`native`:** the OS boundary (capability trait, payload decoding, the
//!   Win32 message-window bridge)
//! - **`manager`:** consumer-facing orchestration
//!
//! # Examples
//!
//! ## Reconciling a persisted mapping
//!
//! ```
//! use global_hotkey_manager::core::{merge_with_defaults, Action};
//!
//! // First run: nothing persisted, every action gets its default
//! let merged = merge_with_defaults(&[]);
//! assert_eq!(merged.len(), Action::ALL.len());
//! ```
//!
//! ## Parsing a key combination
//!
//! ```
//! use global_hotkey_manager::core::parser::parse_combination;
//!
//! let combo = parse_combination("Alt+Win+Space")?;
//! assert!(combo.is_bound());
//! # Ok::<(), global_hotkey_manager::core::parser::ParseError>(())
//! ```

pub mod config;
pub mod core;
pub mod manager;
pub mod native;

// Re-export commonly used types for convenience
pub use config::{FileMappingStore, MappingStore, StoreError};
pub use core::{Action, HotkeyBinding, Key, KeyCombination, Modifiers};
pub use manager::HotkeyManager;
