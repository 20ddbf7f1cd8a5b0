//! Manager tying the registry, merge policy, store and press stream together
//!
//! This is the surface the owning application talks to: initialise at
//! startup, `recv_action` in its event loop, `update` when the user edits
//! bindings, enable/disable around modal UI, and drop (or `dispose`) at
//! shutdown.
//!
//! Startup sequence: load the persisted mapping (absent or corrupt loads as
//! empty), reconcile it against the known actions, register the result, and
//! write the reconciled mapping back if reconciliation changed it.

use std::sync::mpsc::{Receiver, TryRecvError};

use tracing::{info, warn};

use crate::config::{MappingStore, StoreError};
use crate::core::merge::merge_with_defaults;
use crate::core::registry::{HotkeyRegistry, RegistrationObserver};
use crate::core::types::{Action, HotkeyBinding, KeyCombination};
use crate::native::{KeyPress, NativeHotkeys};

pub struct HotkeyManager<N: NativeHotkeys> {
    registry: HotkeyRegistry<N>,
    store: Box<dyn MappingStore>,
    presses: Option<Receiver<KeyPress>>,
}

impl<N: NativeHotkeys> HotkeyManager<N> {
    /// Takes ownership of the bridge and its press stream. No OS
    /// registrations happen until [`initialise`](Self::initialise).
    pub fn new(
        mut native: N,
        store: Box<dyn MappingStore>,
        observer: Box<dyn RegistrationObserver>,
    ) -> Self {
        let presses = native.take_presses();
        Self {
            registry: HotkeyRegistry::new(native, observer),
            store,
            presses,
        }
    }

    /// Loads, reconciles and registers the mapping.
    ///
    /// The reconciled mapping (not the post-registration state) is written
    /// back when it differs from what was loaded, so a combination the OS
    /// refused this session keeps its place on disk and is retried next
    /// start. Registration refusals themselves never fail initialisation;
    /// the affected actions come up unbound.
    pub fn initialise(&mut self) -> Result<(), StoreError> {
        let persisted = self.store.load()?.unwrap_or_default();
        let merged = merge_with_defaults(&persisted);

        self.registry.update(&merged);

        if merged != persisted {
            self.store.save(&merged)?;
        }

        info!(
            bound = self.registry.bound_count(),
            total = merged.len(),
            "hotkey mapping initialised"
        );
        Ok(())
    }

    /// Persists the current registry state.
    pub fn save(&self) -> Result<(), StoreError> {
        self.store.save(&self.registry.mapping())
    }

    /// Bulk-replaces the mapping and persists the new entries.
    ///
    /// A persistence failure is returned for reporting but does not undo
    /// anything: the in-memory registry remains authoritative for the
    /// running session.
    pub fn update(&mut self, entries: &[(Action, KeyCombination)]) -> Result<(), StoreError> {
        self.registry.update(entries);
        if let Err(e) = self.store.save(entries) {
            warn!(error = %e, "mapping not persisted; in-memory bindings stay active");
            return Err(e);
        }
        Ok(())
    }

    /// Defensive copy of the current bindings.
    pub fn snapshot(&self) -> Vec<HotkeyBinding> {
        self.registry.snapshot()
    }

    /// Gates dispatch only; OS registrations stay active while disabled.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.registry.set_enabled(enabled);
    }

    pub fn is_enabled(&self) -> bool {
        self.registry.is_enabled()
    }

    /// Blocks until a press matches a bound action. Returns `None` once the
    /// bridge has shut down. Presses that match nothing, and presses
    /// arriving while dispatch is disabled, are consumed and dropped.
    pub fn recv_action(&self) -> Option<Action> {
        let presses = self.presses.as_ref()?;
        loop {
            let press = presses.recv().ok()?;
            if let Some(action) = self.registry.dispatch(&press.combination()) {
                return Some(action);
            }
        }
    }

    /// Non-blocking variant of [`recv_action`](Self::recv_action): drains
    /// pending presses and returns the first match, or `None` when the
    /// queue is exhausted.
    pub fn try_recv_action(&self) -> Option<Action> {
        let presses = self.presses.as_ref()?;
        loop {
            match presses.try_recv() {
                Ok(press) => {
                    if let Some(action) = self.registry.dispatch(&press.combination()) {
                        return Some(action);
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return None,
            }
        }
    }

    /// Releases every OS registration. Also runs on drop.
    pub fn dispose(&mut self) {
        self.registry.dispose();
    }
}
