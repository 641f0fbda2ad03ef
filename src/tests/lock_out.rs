#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use chrono::TimeDelta;

    use crate::backend::{MemoryBackend, StorageBackend};
    use crate::cache::{ExpiringStore, StoreOptions, WriteOutcome};
    use crate::helpers::time::{Clock, ManualClock};
    use crate::tests::common::{build_store, error_sink, manual_clock, t0, CountingBackend};
    use crate::ttl::TtlSpec;

    fn expired_store(clock: &ManualClock, backend: Rc<dyn StorageBackend>) -> ExpiringStore<String> {
        let store = build_store(
            "banner",
            Some("hello".to_string()),
            backend,
            clock,
            StoreOptions::default().with_expires("10s"),
        );
        clock.advance(TimeDelta::seconds(11));
        assert_eq!(store.get(), None);
        store
    }

    #[test]
    fn plain_write_on_expired_value_is_dropped() {
        let clock = manual_clock();
        let backend: Rc<dyn StorageBackend> = Rc::new(MemoryBackend::new());
        let store = expired_store(&clock, Rc::clone(&backend));

        assert_eq!(store.set(Some("again".into())), WriteOutcome::LockedOut);
        assert_eq!(store.set(None), WriteOutcome::LockedOut);

        assert_eq!(store.get(), None);
        assert!(store.is_expired());
        assert_eq!(backend.get_item("banner").unwrap(), None);
    }

    #[test]
    fn write_that_discovers_expiry_is_discarded() {
        let clock = manual_clock();
        let backend: Rc<dyn StorageBackend> = Rc::new(MemoryBackend::new());
        let store = build_store::<String>(
            "banner",
            None,
            Rc::clone(&backend),
            &clock,
            StoreOptions::default().with_expires("10s"),
        );

        clock.advance(TimeDelta::seconds(11));
        assert_eq!(store.set(Some("late".into())), WriteOutcome::Expired);
        assert_eq!(store.get(), None);
        assert_eq!(backend.get_item("banner").unwrap(), None);
    }

    #[test]
    fn write_with_new_ttl_revives() {
        let clock = manual_clock();
        let backend: Rc<dyn StorageBackend> = Rc::new(MemoryBackend::new());
        let store = expired_store(&clock, Rc::clone(&backend));
        let now = clock.now();

        let outcome = store.set_with_ttl(Some("welcome back".into()), Some(TtlSpec::from("1m")));

        assert_eq!(outcome, WriteOutcome::Accepted);
        assert!(!store.is_expired());
        assert_eq!(store.get().as_deref(), Some("welcome back"));
        assert_eq!(store.expires_at(), Some(now + TimeDelta::minutes(1)));
        assert_eq!(backend.get_item("banner").unwrap().as_deref(), Some("\"welcome back\""));
    }

    #[test]
    fn write_with_current_ttl_also_revives() {
        let clock = manual_clock();
        let store = expired_store(&clock, Rc::new(MemoryBackend::new()));
        let now = clock.now();

        assert_eq!(store.set_with_ttl(Some("again".into()), None), WriteOutcome::Accepted);
        assert_eq!(store.ttl(), TtlSpec::from("10s"));
        assert_eq!(store.expires_at(), Some(now + TimeDelta::seconds(10)));
    }

    #[test]
    fn refreshing_expiry_unlocks_plain_writes() {
        let clock = manual_clock();
        let store = expired_store(&clock, Rc::new(MemoryBackend::new()));

        assert!(store.refresh_expiry());
        assert!(!store.is_expired());
        assert_eq!(store.get(), None);

        assert_eq!(store.set(Some("fresh".into())), WriteOutcome::Accepted);
        assert_eq!(store.get().as_deref(), Some("fresh"));
    }

    #[test]
    fn invalid_ttl_does_not_revive() {
        let clock = manual_clock();
        let (errors, on_error) = error_sink();
        let store = build_store(
            "banner",
            Some("hello".to_string()),
            Rc::new(MemoryBackend::new()),
            &clock,
            StoreOptions::default().with_expires("10s").with_on_error(on_error),
        );
        clock.advance(TimeDelta::seconds(11));
        assert_eq!(store.get(), None);

        let outcome = store.set_with_ttl(Some("nope".into()), Some(TtlSpec::from("10x")));

        assert_eq!(outcome, WriteOutcome::LockedOut);
        assert!(store.is_expired());
        assert_eq!(store.ttl(), TtlSpec::from("10s"));
        assert_eq!(*errors.borrow(), vec!["invalid_ttl"]);
    }

    #[test]
    fn switching_to_never_makes_value_permanent() {
        let clock = manual_clock();
        let store = expired_store(&clock, Rc::new(MemoryBackend::new()));

        assert_eq!(store.set_with_ttl(Some("forever".into()), Some(TtlSpec::Never)), WriteOutcome::Accepted);
        clock.advance(TimeDelta::days(10_000));

        assert_eq!(store.expires_at(), None);
        assert_eq!(store.get().as_deref(), Some("forever"));
    }

    #[test]
    fn re_establishing_an_elapsed_instant_stays_expired() {
        let clock = manual_clock();
        let backend = Rc::new(CountingBackend::default());
        let store = build_store(
            "promo",
            Some("spring".to_string()),
            backend.clone(),
            &clock,
            StoreOptions::default().with_expires(TtlSpec::Until(t0() + TimeDelta::seconds(1))),
        );
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        store.subscribe(move |value: Option<&String>| sink.borrow_mut().push(value.cloned()));

        clock.advance(TimeDelta::seconds(2));
        assert_eq!(store.get(), None);
        assert!(store.is_expired());

        assert!(store.refresh_expiry());
        assert!(store.is_expired());
        assert_eq!(store.get(), None);

        let past = TtlSpec::Until(t0() + TimeDelta::milliseconds(1500));
        assert!(store.update_expiry(Some(past)));
        assert!(store.is_expired());
        assert_eq!(store.get(), None);
        assert_eq!(store.set(Some("summer".into())), WriteOutcome::LockedOut);

        assert_eq!(*seen.borrow(), vec![None]);
        assert_eq!(backend.removes.get(), 1);
    }
}
