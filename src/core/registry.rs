//! Hotkey registry with conflict-aware native registration
//!
//! Maps each [`Action`] to at most one [`HotkeyBinding`] and enforces that
//! bound key combinations are pairwise distinct. All OS calls go through the
//! [`NativeHotkeys`] capability owned by the registry; a refused registration
//! degrades the action to unbound and notifies the observer rather than
//! failing startup.
//!
//! The registry assumes a single logical owner. `&mut self` on every mutating
//! operation makes the single-writer requirement a compile-time property.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::{debug, warn};

use crate::core::types::{Action, HotkeyBinding, KeyCombination, RegisterOutcome};
use crate::native::{NativeHotkeys, APP_ID_FIRST, APP_ID_LAST};

/// Errors surfaced by registry operations.
///
/// Registration failures are absorbed into [`RegisterOutcome::DegradedToUnbound`]
/// and observer notifications; none of these abort the owning process.
#[derive(Debug, Error)]
pub enum HotkeyError {
    /// The system refused the registration, typically because another
    /// process already claimed the combination.
    #[error("the system refused to register {combination} for {action}")]
    RegistrationFailed {
        action: Action,
        combination: KeyCombination,
    },
    /// The system could not release a registration (stale id, already gone).
    #[error("the system could not release {combination} registered for {action}")]
    UnregistrationFailed {
        action: Action,
        combination: KeyCombination,
    },
    /// Every identifier in the application range is in use.
    #[error("no free hotkey identifiers remain in the application range")]
    IdRangeExhausted,
}

/// Presentation collaborator, notified of failures so the application can
/// message the user. The registry itself never renders UI.
pub trait RegistrationObserver {
    fn on_registration_failed(&self, _action: Action, _attempted: KeyCombination) {}
    fn on_unregistration_failed(&self, _action: Action, _attempted: KeyCombination) {}
}

/// Observer that routes failure notifications to the log backend. Useful
/// for headless consumers that have no message-box layer.
pub struct LogObserver;

impl RegistrationObserver for LogObserver {
    fn on_registration_failed(&self, action: Action, attempted: KeyCombination) {
        warn!(%action, combination = %attempted, "hotkey registration failed; action left unbound");
    }

    fn on_unregistration_failed(&self, action: Action, attempted: KeyCombination) {
        warn!(%action, combination = %attempted, "hotkey unregistration failed");
    }
}

/// Allocates native hotkey identifiers from the application sub-range
/// (`APP_ID_FIRST..=APP_ID_LAST`), recycling released identifiers before
/// minting new ones. The shared-library sub-range above is never touched.
#[derive(Debug)]
struct IdAllocator {
    next: i32,
    free: Vec<i32>,
}

impl IdAllocator {
    fn new() -> Self {
        Self {
            next: APP_ID_FIRST,
            free: Vec::new(),
        }
    }

    fn allocate(&mut self) -> Option<i32> {
        if let Some(id) = self.free.pop() {
            return Some(id);
        }
        if self.next > APP_ID_LAST {
            return None;
        }
        let id = self.next;
        self.next += 1;
        Some(id)
    }

    fn release(&mut self, id: i32) {
        self.free.push(id);
    }
}

/// Central mapping of actions to registered key combinations.
///
/// Keys are stored in a `BTreeMap` so every snapshot comes out in the
/// canonical action order without extra sorting.
pub struct HotkeyRegistry<N: NativeHotkeys> {
    native: N,
    bindings: BTreeMap<Action, HotkeyBinding>,
    observer: Box<dyn RegistrationObserver>,
    ids: IdAllocator,
    enabled: bool,
    disposed: bool,
}

impl<N: NativeHotkeys> HotkeyRegistry<N> {
    pub fn new(native: N, observer: Box<dyn RegistrationObserver>) -> Self {
        Self {
            native,
            bindings: BTreeMap::new(),
            observer,
            ids: IdAllocator::new(),
            enabled: true,
            disposed: false,
        }
    }

    /// Registers `combination` for `action`.
    ///
    /// An unbound combination is recorded without touching the OS. A bound
    /// combination that duplicates another action's binding, exhausts the
    /// identifier range, or is refused by the OS degrades to an unbound
    /// entry under the same action key, with the observer notified; the
    /// action stays visible in the mapping so the user can rebind it.
    ///
    /// Re-registering an action releases its previous registration first.
    pub fn register(&mut self, action: Action, combination: KeyCombination) -> RegisterOutcome {
        self.remove_entry(action);

        if !combination.is_bound() {
            self.insert_unbound(action);
            return RegisterOutcome::Unbound;
        }

        if self.combination_in_use(&combination) {
            warn!(%action, %combination, "combination already bound to another action");
            self.observer.on_registration_failed(action, combination);
            self.insert_unbound(action);
            return RegisterOutcome::DegradedToUnbound;
        }

        match self.try_native_register(action, combination) {
            Ok(id) => {
                debug!(%action, %combination, id, "hotkey registered");
                self.bindings.insert(
                    action,
                    HotkeyBinding {
                        action,
                        combination,
                        native_id: Some(id),
                    },
                );
                RegisterOutcome::Bound
            }
            Err(err) => {
                warn!(error = %err, "degrading to unbound");
                self.observer.on_registration_failed(action, combination);
                self.insert_unbound(action);
                RegisterOutcome::DegradedToUnbound
            }
        }
    }

    /// Removes the binding whose combination matches `combination` exactly.
    ///
    /// The local record is removed even when the OS refuses the release, so
    /// the registry never advertises a registration it may no longer hold;
    /// the refusal is still surfaced to the caller and the observer. A
    /// combination that matches nothing is a no-op, not an error.
    pub fn unregister(&mut self, combination: &KeyCombination) -> Result<(), HotkeyError> {
        let Some(action) = self
            .bindings
            .values()
            .find(|b| b.combination == *combination)
            .map(|b| b.action)
        else {
            return Ok(());
        };

        let Some(binding) = self.bindings.remove(&action) else {
            return Ok(());
        };

        if let Some(id) = binding.native_id {
            self.ids.release(id);
            if !self.native.unregister_hotkey(id) {
                self.observer
                    .on_unregistration_failed(action, binding.combination);
                return Err(HotkeyError::UnregistrationFailed {
                    action,
                    combination: binding.combination,
                });
            }
        }

        Ok(())
    }

    /// Replaces the whole mapping: every currently bound entry is
    /// unregistered, then each entry of `entries` is registered in order.
    ///
    /// This is a bulk replace, not a diff: entries identical across old and
    /// new maps still pay the unregister+register round trip.
    pub fn update(&mut self, entries: &[(Action, KeyCombination)]) {
        let current: Vec<Action> = self.bindings.keys().copied().collect();
        for action in current {
            self.remove_entry(action);
        }
        for (action, combination) in entries {
            self.register(*action, *combination);
        }
    }

    /// Defensive copy of the current bindings, in canonical action order.
    pub fn snapshot(&self) -> Vec<HotkeyBinding> {
        self.bindings.values().cloned().collect()
    }

    /// The current mapping as persistable pairs, in canonical action order.
    pub fn mapping(&self) -> Vec<(Action, KeyCombination)> {
        self.bindings
            .values()
            .map(|b| (b.action, b.combination))
            .collect()
    }

    /// Resolves a pressed combination to its action.
    ///
    /// Returns `None` while dispatch is disabled; OS registrations remain
    /// active in that state, so matching presses are still intercepted but
    /// not forwarded.
    pub fn dispatch(&self, combination: &KeyCombination) -> Option<Action> {
        if !self.enabled {
            return None;
        }
        self.bindings
            .values()
            .find(|b| b.is_bound() && b.combination == *combination)
            .map(|b| b.action)
    }

    /// Gates `dispatch` only; registrations stay active with the OS.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Number of entries currently registered with the OS.
    pub fn bound_count(&self) -> usize {
        self.bindings.values().filter(|b| b.is_bound()).count()
    }

    /// Total number of actions in the mapping, bound or not.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Releases every bound native registration and clears the mapping.
    /// Idempotent; also invoked from `Drop` so registrations are released
    /// on every exit path. A leaked registration would block its
    /// combination system-wide until process exit.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        let actions: Vec<Action> = self.bindings.keys().copied().collect();
        for action in actions {
            self.remove_entry(action);
        }
        debug!("hotkey registry disposed");
    }

    fn insert_unbound(&mut self, action: Action) {
        self.bindings.insert(
            action,
            HotkeyBinding {
                action,
                combination: KeyCombination::unbound(),
                native_id: None,
            },
        );
    }

    fn combination_in_use(&self, combination: &KeyCombination) -> bool {
        self.bindings.values().any(|b| b.combination == *combination)
    }

    fn try_native_register(
        &mut self,
        action: Action,
        combination: KeyCombination,
    ) -> Result<i32, HotkeyError> {
        let id = self.ids.allocate().ok_or(HotkeyError::IdRangeExhausted)?;
        if self.native.register_hotkey(id, &combination) {
            Ok(id)
        } else {
            self.ids.release(id);
            Err(HotkeyError::RegistrationFailed {
                action,
                combination,
            })
        }
    }

    /// Removes `action`'s entry, releasing its native registration if bound.
    fn remove_entry(&mut self, action: Action) {
        let Some(binding) = self.bindings.remove(&action) else {
            return;
        };
        if let Some(id) = binding.native_id {
            self.ids.release(id);
            if !self.native.unregister_hotkey(id) {
                warn!(%action, combination = %binding.combination, "native unregistration failed");
                self.observer
                    .on_unregistration_failed(action, binding.combination);
            }
        }
    }
}

impl<N: NativeHotkeys> Drop for HotkeyRegistry<N> {
    fn drop(&mut self) {
        self.dispose();
    }
}
