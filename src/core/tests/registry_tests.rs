use std::cell::RefCell;
use std::rc::Rc;

use crate::core::registry::{HotkeyRegistry, RegistrationObserver};
use crate::core::types::{Action, Key, KeyCombination, Modifiers, RegisterOutcome};
use crate::native::testing::{FakeNative, NativeLog};

/// Observer recording every notification.
#[derive(Default)]
struct RecordingObserver {
    registration_failures: Rc<RefCell<Vec<(Action, KeyCombination)>>>,
    unregistration_failures: Rc<RefCell<Vec<(Action, KeyCombination)>>>,
}

impl RegistrationObserver for RecordingObserver {
    fn on_registration_failed(&self, action: Action, attempted: KeyCombination) {
        self.registration_failures
            .borrow_mut()
            .push((action, attempted));
    }

    fn on_unregistration_failed(&self, action: Action, attempted: KeyCombination) {
        self.unregistration_failures
            .borrow_mut()
            .push((action, attempted));
    }
}

fn registry() -> (
    HotkeyRegistry<FakeNative>,
    Rc<RefCell<NativeLog>>,
    Rc<RefCell<Vec<(Action, KeyCombination)>>>,
) {
    let (native, log) = FakeNative::new();
    let observer = RecordingObserver::default();
    let failures = Rc::clone(&observer.registration_failures);
    (
        HotkeyRegistry::new(native, Box::new(observer)),
        log,
        failures,
    )
}

fn combo(key: Key) -> KeyCombination {
    KeyCombination::new(Modifiers::ALT | Modifiers::WIN, key)
}

#[test]
fn test_register_bound_combination() {
    let (mut registry, log, _) = registry();

    let outcome = registry.register(Action::PlayPause, combo(Key::Space));
    assert_eq!(outcome, RegisterOutcome::Bound);
    assert_eq!(registry.bound_count(), 1);
    assert_eq!(log.borrow().registered.len(), 1);
    assert_eq!(log.borrow().registered[0].1, combo(Key::Space));
}

#[test]
fn test_register_unbound_skips_the_os() {
    let (mut registry, log, _) = registry();

    let outcome = registry.register(Action::Stop, KeyCombination::unbound());
    assert_eq!(outcome, RegisterOutcome::Unbound);
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.bound_count(), 0);
    assert!(log.borrow().registered.is_empty());
}

#[test]
fn test_duplicate_combination_is_never_silently_shared() {
    let (mut registry, log, failures) = registry();

    assert_eq!(
        registry.register(Action::PlayPause, combo(Key::Space)),
        RegisterOutcome::Bound
    );
    // Second action requesting the same combination must not end up bound
    assert_eq!(
        registry.register(Action::Stop, combo(Key::Space)),
        RegisterOutcome::DegradedToUnbound
    );

    assert_eq!(registry.len(), 2);
    assert_eq!(registry.bound_count(), 1);
    assert_eq!(failures.borrow().as_slice(), &[(Action::Stop, combo(Key::Space))]);
    // The OS never saw the second request
    assert_eq!(log.borrow().registered.len(), 1);

    // Invariant: all bound combinations pairwise distinct
    let snapshot = registry.snapshot();
    for a in &snapshot {
        for b in &snapshot {
            if a.action != b.action && a.is_bound() && b.is_bound() {
                assert_ne!(a.combination, b.combination);
            }
        }
    }
}

#[test]
fn test_os_refusal_degrades_to_unbound() {
    let (mut registry, log, failures) = registry();
    log.borrow_mut().reject_register.insert(combo(Key::Space));

    let outcome = registry.register(Action::PlayPause, combo(Key::Space));
    assert_eq!(outcome, RegisterOutcome::DegradedToUnbound);

    // The action is recorded, unbound, and the collaborator was told
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.bound_count(), 0);
    let snapshot = registry.snapshot();
    assert_eq!(snapshot[0].combination, KeyCombination::unbound());
    assert_eq!(snapshot[0].native_id, None);
    assert_eq!(failures.borrow().len(), 1);
}

#[test]
fn test_reregistering_an_action_releases_the_old_combination() {
    let (mut registry, log, _) = registry();

    registry.register(Action::PlayPause, combo(Key::Space));
    registry.register(Action::PlayPause, combo(Key::P));

    assert_eq!(registry.len(), 1);
    assert_eq!(log.borrow().unregistered.len(), 1);
    // The freed combination can be claimed by another action
    assert_eq!(
        registry.register(Action::Stop, combo(Key::Space)),
        RegisterOutcome::Bound
    );
}

#[test]
fn test_unregister_removes_exact_match_only() {
    let (mut registry, log, _) = registry();

    registry.register(Action::PlayPause, combo(Key::Space));
    registry.register(Action::Stop, combo(Key::S));

    registry.unregister(&combo(Key::Space)).unwrap();
    assert_eq!(registry.len(), 1);
    assert_eq!(log.borrow().unregistered.len(), 1);

    // No match: a no-op, not an error
    registry.unregister(&combo(Key::F7)).unwrap();
    assert_eq!(registry.len(), 1);
    assert_eq!(log.borrow().unregistered.len(), 1);
}

#[test]
fn test_unregister_failure_still_removes_local_record() {
    let (native, log) = FakeNative::new();
    let observer = RecordingObserver::default();
    let unreg_failures = Rc::clone(&observer.unregistration_failures);
    let mut registry = HotkeyRegistry::new(native, Box::new(observer));

    registry.register(Action::PlayPause, combo(Key::Space));
    log.borrow_mut().reject_unregister = true;

    let result = registry.unregister(&combo(Key::Space));
    assert!(result.is_err());
    // Local record gone regardless, so no stale registration is advertised
    assert_eq!(registry.len(), 0);
    assert_eq!(unreg_failures.borrow().len(), 1);
}

#[test]
fn test_update_is_a_bulk_replace_in_given_order() {
    let (mut registry, log, _) = registry();

    registry.register(Action::PlayPause, combo(Key::Space));
    registry.register(Action::Stop, combo(Key::S));

    let entries = vec![
        (Action::VolumeUp, combo(Key::Up)),
        (Action::PlayPause, combo(Key::Space)),
    ];
    registry.update(&entries);

    // Both previous entries paid the unregister cost, even the unchanged one
    assert_eq!(log.borrow().unregistered.len(), 2);
    assert_eq!(registry.len(), 2);
    assert_eq!(registry.bound_count(), 2);

    // Registration order followed the given order
    let registered = &log.borrow().registered;
    assert_eq!(registered[registered.len() - 2].1, combo(Key::Up));
    assert_eq!(registered[registered.len() - 1].1, combo(Key::Space));
}

#[test]
fn test_snapshot_is_a_defensive_copy_in_canonical_order() {
    let (mut registry, _, _) = registry();

    registry.register(Action::ShowUi, combo(Key::H));
    registry.register(Action::PlayPause, combo(Key::Space));

    let snapshot = registry.snapshot();
    assert_eq!(snapshot[0].action, Action::PlayPause);
    assert_eq!(snapshot[1].action, Action::ShowUi);

    // Mutating the copy must not touch the registry
    let mut copy = snapshot.clone();
    copy[0].combination = KeyCombination::unbound();
    assert_eq!(registry.snapshot(), snapshot);
}

#[test]
fn test_dispatch_gated_by_enabled_flag() {
    let (mut registry, _, _) = registry();
    registry.register(Action::PlayPause, combo(Key::Space));

    assert_eq!(registry.dispatch(&combo(Key::Space)), Some(Action::PlayPause));
    assert_eq!(registry.dispatch(&combo(Key::F7)), None);

    registry.set_enabled(false);
    assert_eq!(registry.dispatch(&combo(Key::Space)), None);

    registry.set_enabled(true);
    assert_eq!(registry.dispatch(&combo(Key::Space)), Some(Action::PlayPause));
}

#[test]
fn test_native_ids_are_distinct_and_in_the_application_range() {
    let (mut registry, log, _) = registry();

    for (action, key) in [
        (Action::PlayPause, Key::Space),
        (Action::Stop, Key::S),
        (Action::NextTrack, Key::Right),
    ] {
        registry.register(action, combo(key));
    }

    let ids: Vec<i32> = log.borrow().registered.iter().map(|(id, _)| *id).collect();
    for id in &ids {
        assert!(
            (crate::native::APP_ID_FIRST..=crate::native::APP_ID_LAST).contains(id)
        );
    }
    let mut deduped = ids.clone();
    deduped.sort_unstable();
    deduped.dedup();
    assert_eq!(deduped.len(), ids.len(), "ids must be pairwise distinct");
}

#[test]
fn test_released_ids_are_recycled() {
    let (mut registry, log, _) = registry();

    registry.register(Action::PlayPause, combo(Key::Space));
    let first_id = log.borrow().registered[0].0;

    registry.unregister(&combo(Key::Space)).unwrap();
    registry.register(Action::Stop, combo(Key::S));

    let second_id = log.borrow().registered[1].0;
    assert_eq!(first_id, second_id);
}

#[test]
fn test_dispose_unregisters_every_bound_entry_exactly_once() {
    let (mut registry, log, _) = registry();

    registry.register(Action::PlayPause, combo(Key::Space));
    registry.register(Action::Stop, combo(Key::S));
    registry.register(Action::ShowUi, KeyCombination::unbound());

    let bound = registry.bound_count();
    registry.dispose();
    assert_eq!(log.borrow().unregistered.len(), bound);

    // Idempotent: a second dispose (or the drop that follows) adds nothing
    registry.dispose();
    drop(registry);
    assert_eq!(log.borrow().unregistered.len(), bound);
}

#[test]
fn test_drop_releases_registrations() {
    let (native, log) = FakeNative::new();
    {
        let mut registry = HotkeyRegistry::new(native, Box::new(RecordingObserver::default()));
        registry.register(Action::PlayPause, combo(Key::Space));
    }
    assert_eq!(log.borrow().unregistered.len(), 1);
}
