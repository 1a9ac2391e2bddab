use std::cell::RefCell;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;

use chart_time_scale::ChartError;
use chart_time_scale::core::{Delegate, Listener, OwnerToken};

type Log = Rc<RefCell<Vec<(&'static str, u32)>>>;

fn failing_listener(_: &u32) {
    panic!("listener failure")
}

fn recorder(log: &Log, name: &'static str) -> Listener<u32> {
    let log = Rc::clone(log);
    Rc::new(move |value: &u32| log.borrow_mut().push((name, *value)))
}

#[test]
fn fire_reaches_every_listener_in_subscription_order() {
    let delegate = Delegate::new();
    let log = Log::default();
    for name in ["first", "second", "third"] {
        delegate.subscribe(recorder(&log, name), None).expect("subscribe");
    }

    delegate.fire(&42);

    assert_eq!(
        *log.borrow(),
        vec![("first", 42), ("second", 42), ("third", 42)]
    );
}

#[test]
fn unsubscribe_all_removes_only_the_owners_listeners() {
    let delegate = Delegate::new();
    let log = Log::default();
    let chart_a = OwnerToken::new();
    let chart_b = OwnerToken::new();
    delegate
        .subscribe(recorder(&log, "a1"), Some(&chart_a))
        .expect("subscribe");
    delegate
        .subscribe(recorder(&log, "b"), Some(&chart_b))
        .expect("subscribe");
    delegate
        .subscribe(recorder(&log, "a2"), Some(&chart_a))
        .expect("subscribe");
    delegate.subscribe(recorder(&log, "free"), None).expect("subscribe");

    assert_eq!(delegate.unsubscribe_all(&chart_a), 2);
    delegate.fire(&1);

    assert_eq!(*log.borrow(), vec![("b", 1), ("free", 1)]);
}

#[test]
fn same_listener_for_same_owner_is_registered_once() {
    let delegate = Delegate::new();
    let log = Log::default();
    let owner = OwnerToken::new();
    let listener = recorder(&log, "dup");

    let first = delegate
        .subscribe(Rc::clone(&listener), Some(&owner))
        .expect("subscribe");
    let second = delegate
        .subscribe(Rc::clone(&listener), Some(&owner))
        .expect("subscribe");
    assert_eq!(first, second);

    delegate.subscribe(Rc::clone(&listener), None).expect("subscribe");
    assert_eq!(delegate.listener_count(), 2);

    assert_eq!(delegate.unsubscribe(&listener), 2);
    assert!(!delegate.has_listeners());
}

#[test]
fn listener_added_during_fire_waits_for_the_next_pass() {
    let delegate = Rc::new(Delegate::<u32>::new());
    let log = Log::default();
    let late = recorder(&log, "late");
    let weak = Rc::downgrade(&delegate);
    let subscribing_log = Rc::clone(&log);
    let subscriber: Listener<u32> = Rc::new(move |value: &u32| {
        subscribing_log.borrow_mut().push(("early", *value));
        if let Some(delegate) = weak.upgrade() {
            delegate
                .subscribe(Rc::clone(&late), None)
                .expect("subscribe during fire");
        }
    });
    delegate.subscribe(subscriber, None).expect("subscribe");

    delegate.fire(&1);
    assert_eq!(*log.borrow(), vec![("early", 1)]);

    delegate.fire(&2);
    assert_eq!(
        *log.borrow(),
        vec![("early", 1), ("early", 2), ("late", 2)]
    );
}

#[test]
fn listener_removed_during_fire_is_skipped() {
    let delegate = Rc::new(Delegate::<u32>::new());
    let log = Log::default();
    let victim = recorder(&log, "victim");
    let weak = Rc::downgrade(&delegate);
    let victim_handle = Rc::clone(&victim);
    let remover: Listener<u32> = Rc::new(move |_: &u32| {
        if let Some(delegate) = weak.upgrade() {
            delegate.unsubscribe(&victim_handle);
        }
    });
    delegate.subscribe(remover, None).expect("subscribe");
    delegate.subscribe(victim, None).expect("subscribe");

    delegate.fire(&7);

    assert!(log.borrow().is_empty());
    assert_eq!(delegate.listener_count(), 1);
}

#[test]
fn single_shot_listener_fires_once() {
    let delegate = Delegate::new();
    let log = Log::default();
    delegate
        .subscribe_once(recorder(&log, "once"), None)
        .expect("subscribe");

    delegate.fire(&1);
    delegate.fire(&2);

    assert_eq!(*log.borrow(), vec![("once", 1)]);
    assert!(!delegate.has_listeners());
}

#[test]
fn destroy_is_idempotent_and_refuses_new_subscriptions() {
    let delegate = Delegate::new();
    let log = Log::default();
    delegate.subscribe(recorder(&log, "gone"), None).expect("subscribe");

    delegate.destroy();
    delegate.destroy();
    delegate.fire(&9);

    assert!(delegate.is_destroyed());
    assert!(log.borrow().is_empty());
    assert_eq!(
        delegate.subscribe(recorder(&log, "late"), None),
        Err(ChartError::UseAfterDestroy)
    );
}

#[test]
fn panicking_listener_aborts_the_pass_but_keeps_registrations() {
    let delegate = Delegate::new();
    let log = Log::default();
    delegate.subscribe(recorder(&log, "before"), None).expect("subscribe");
    delegate
        .subscribe(Rc::new(failing_listener), None)
        .expect("subscribe");
    delegate.subscribe(recorder(&log, "after"), None).expect("subscribe");

    let result = catch_unwind(AssertUnwindSafe(|| delegate.fire(&5)));

    assert!(result.is_err());
    assert_eq!(*log.borrow(), vec![("before", 5)]);
    assert_eq!(delegate.listener_count(), 3);
}
