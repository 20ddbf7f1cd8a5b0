//! Recording fake of the native hotkey capability
//!
//! Exercises the registry and manager exactly the way the real bridge does,
//! without touching the OS: registrations are recorded in a shared log,
//! refusals are scripted per combination, and presses are injected through
//! the same channel the platform bridge would feed.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::mpsc::{channel, Receiver, Sender};

use super::{KeyPress, NativeHotkeys};
use crate::core::types::KeyCombination;

/// Call log shared between a test and the registry-owned fake.
#[derive(Default)]
pub struct NativeLog {
    pub registered: Vec<(i32, KeyCombination)>,
    pub unregistered: Vec<i32>,
    /// Combinations the fake OS refuses, as if claimed by another process.
    pub reject_register: HashSet<KeyCombination>,
    /// When set, every unregistration is refused, as if the id were stale.
    pub reject_unregister: bool,
}

pub struct FakeNative {
    log: Rc<RefCell<NativeLog>>,
    press_tx: Sender<KeyPress>,
    presses: Option<Receiver<KeyPress>>,
}

impl FakeNative {
    pub fn new() -> (Self, Rc<RefCell<NativeLog>>) {
        let log = Rc::new(RefCell::new(NativeLog::default()));
        let (press_tx, press_rx) = channel();
        (
            Self {
                log: Rc::clone(&log),
                press_tx,
                presses: Some(press_rx),
            },
            log,
        )
    }

    /// Sender used to inject synthetic presses into the stream.
    pub fn press_sender(&self) -> Sender<KeyPress> {
        self.press_tx.clone()
    }
}

impl NativeHotkeys for FakeNative {
    fn register_hotkey(&mut self, id: i32, combination: &KeyCombination) -> bool {
        let mut log = self.log.borrow_mut();
        if !combination.is_bound() || log.reject_register.contains(combination) {
            return false;
        }
        log.registered.push((id, *combination));
        true
    }

    fn unregister_hotkey(&mut self, id: i32) -> bool {
        let mut log = self.log.borrow_mut();
        log.unregistered.push(id);
        !log.reject_unregister
    }

    fn take_presses(&mut self) -> Option<Receiver<KeyPress>> {
        self.presses.take()
    }
}
