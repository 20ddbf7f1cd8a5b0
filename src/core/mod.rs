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

//! src/core/mod.rs
//!
//! Core business logic module
//!
//! This module contains the fundamental data structures and algorithms for
//! hotkey management, including:
//! - Type definitions for actions, keys and key combinations
//! - The hotkey registry with its uniqueness invariants
//! - The default-merge policy applied to persisted mappings
//! - Key-combination string parsing
//!
//! Everything here is isolated from UI and I/O concerns; the only boundary
//! is the `NativeHotkeys` capability the registry drives, which tests
//! replace with a fake.

pub mod merge;
pub mod parser;
pub mod registry;
pub mod types;

pub use merge::{merge, merge_with_defaults, standard_defaults};
pub use registry::{HotkeyError, HotkeyRegistry, LogObserver, RegistrationObserver};
pub use types::*;

#[cfg(test)]
mod tests;
