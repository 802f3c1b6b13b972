//! End-to-end notification behavior through the public service API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use cascade_core::{Error, Path, Route, Scope, Service, SubscriptionId, Value};

fn leaf(route: &str, id: u32) -> Path {
    Route::new(route).unwrap().bind(Scope::Leaf, id).unwrap()
}

#[test]
fn write_bubbles_once_per_matching_prefix_level() {
    let service = Service::new();
    let seen_yy = Arc::new(Mutex::new(Vec::new()));
    let seen_zz = Arc::new(Mutex::new(Vec::new()));

    let log = |seen: &Arc<Mutex<Vec<String>>>| {
        let seen = Arc::clone(seen);
        move |path: &Path| {
            seen.lock().unwrap().push(path.to_string());
            Ok(())
        }
    };
    let first = service.subscribe_fn("xx/yy", log(&seen_yy)).unwrap();
    service.subscribe_fn("xx/yy/zz", log(&seen_zz)).unwrap();
    assert_eq!(first, SubscriptionId(1));

    service.write(&leaf("xx/yy/zz", 987), 789).unwrap();

    // Both levels fired exactly once and observed the full written path.
    assert_eq!(*seen_yy.lock().unwrap(), vec!["leaf/987/xx/yy/zz"]);
    assert_eq!(*seen_zz.lock().unwrap(), vec!["leaf/987/xx/yy/zz"]);

    // A sibling under xx/yy reaches only the shorter subscription.
    service.write(&leaf("xx/yy/aa", 987), 1).unwrap();
    assert_eq!(seen_yy.lock().unwrap().len(), 2);
    assert_eq!(seen_zz.lock().unwrap().len(), 1);
}

#[test]
fn panicking_subscriber_is_evicted_for_good() {
    let service = Service::new();
    let healthy_calls = Arc::new(AtomicUsize::new(0));
    let panicking_calls = Arc::new(AtomicUsize::new(0));

    {
        let calls = Arc::clone(&healthy_calls);
        service
            .subscribe_fn("xx/yy", move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .unwrap();
    }
    {
        let calls = Arc::clone(&panicking_calls);
        service
            .subscribe_fn("xx/yy/zz", move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                panic!("subscriber gone wrong");
            })
            .unwrap();
    }

    for _ in 0..3 {
        service.write(&leaf("xx/yy/zz", 987), 789).unwrap();
    }

    // The healthy subscription saw all three writes; the panicking one was
    // invoked exactly once, then never again.
    assert_eq!(healthy_calls.load(Ordering::SeqCst), 3);
    assert_eq!(panicking_calls.load(Ordering::SeqCst), 1);
    assert_eq!(service.subscription_count(), 1);
}

#[test]
fn erroring_subscriber_is_evicted_like_a_panicking_one() {
    let service = Service::new();
    let calls = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&calls);
    service
        .subscribe_fn("xx", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Err("refusing to cooperate".into())
        })
        .unwrap();

    for _ in 0..3 {
        service.write(&leaf("xx/yy", 1), 1).unwrap();
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(service.subscription_count(), 0);
}

#[test]
fn unsubscribe_is_idempotent_and_stops_delivery() {
    let service = Service::new();
    let calls = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&calls);
    let id = service
        .subscribe_fn("xx", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .unwrap();

    service.write(&leaf("xx/yy", 1), 1).unwrap();
    service.unsubscribe(id);
    service.unsubscribe(id);
    service.unsubscribe(SubscriptionId(12345));
    service.write(&leaf("xx/yy", 1), 2).unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn close_gates_writes_but_not_storage() {
    let service = Service::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    service
        .subscribe_fn("xx", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .unwrap();

    assert!(service.close().is_ok());
    assert!(matches!(service.close(), Err(Error::PublisherClosed)));

    let path = leaf("xx/yy", 1);
    let err = service.write(&path, 7).unwrap_err();
    assert!(matches!(err, Error::PublisherClosed));
    // Nothing was delivered, but the value landed in storage.
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(service.get(&path).unwrap(), Value::Int(7));
}

#[test]
fn subscription_ids_are_never_reused() {
    let service = Service::new();
    let a = service.subscribe_fn("xx", |_| Ok(())).unwrap();
    service.unsubscribe(a);
    let b = service.subscribe_fn("xx", |_| Ok(())).unwrap();
    assert!(b > a);
}

#[test]
fn invalid_subscription_prefix_is_rejected_up_front() {
    let service = Service::new();
    assert!(matches!(
        service.subscribe_fn("", |_| Ok(())),
        Err(Error::Path(_))
    ));
    assert!(matches!(
        service.subscribe_fn("xx//yy", |_| Ok(())),
        Err(Error::Path(_))
    ));
    assert_eq!(service.subscription_count(), 0);
}
