#![no_main]
use std::{
    collections::HashMap,
    rc::{
        Rc,
        Weak,
    },
};

use fuzz_lib::CacheOperation;
use libfuzzer_sys::fuzz_target;
use weakcache::{
    CacheError,
    LiveView,
    WeakValueCache,
};

fuzz_target!(|operations: Vec<CacheOperation>| {
    let mut cache = WeakValueCache::<u8, u8>::new();
    // Strong owners held outside the cache. A key is live exactly when it has
    // an owner here.
    let mut owners: HashMap<u8, Rc<u8>> = HashMap::new();

    for operation in operations {
        assert!(
            cache.tracked_len() >= owners.len(),
            "Live key missing from cache: {owners:?} {cache:#?}",
        );

        match operation {
            CacheOperation::Insert(k, v) => {
                let tracked = cache.tracked_len();
                let value = Rc::new(v);
                match cache.insert(k, &value) {
                    Ok(()) => {
                        assert!(
                            !owners.contains_key(&k),
                            "Insert accepted a live key: {k} {cache:#?}",
                        );
                        assert_eq!(cache.tracked_len(), tracked + 1);
                        owners.insert(k, value);
                    }
                    Err(error) => {
                        assert_eq!(error, CacheError::DuplicateKey);
                        assert_eq!(
                            cache.tracked_len(),
                            tracked,
                            "Rejected insert changed the cache: {k} {cache:#?}",
                        );
                    }
                }
            }
            CacheOperation::InsertReleased(k) => {
                let tracked = cache.tracked_len();
                assert_eq!(cache.insert_weak(k, Weak::new()), Err(CacheError::NullValue));
                assert_eq!(cache.tracked_len(), tracked);
            }
            CacheOperation::Release(k) => {
                owners.remove(&k);
            }
            CacheOperation::TryGet(k) => {
                let found = cache.try_get(&k);
                match (owners.get(&k), found) {
                    (Some(owner), Some(found)) => assert!(
                        Rc::ptr_eq(owner, &found),
                        "TryGet returned another value for key: {k} {cache:#?}",
                    ),
                    (None, None) => {}
                    (owner, found) => {
                        panic!("TryGet mismatch for key {k}: {owner:?} != {found:?} {cache:#?}")
                    }
                }
            }
            CacheOperation::Get(k) => match cache.get(&k) {
                Ok(found) => assert!(
                    owners.get(&k).is_some_and(|owner| Rc::ptr_eq(owner, &found)),
                    "Get returned a value for a released key: {k} {cache:#?}",
                ),
                Err(error) => {
                    assert_eq!(error, CacheError::KeyNotFound);
                    assert!(!owners.contains_key(&k));
                }
            },
            CacheOperation::ContainsKey(k) => {
                let contains_key = cache.contains_key(&k);
                assert_eq!(
                    contains_key,
                    owners.contains_key(&k),
                    "ContainsKey mismatch for {k}: {cache:#?}",
                );
                assert_eq!(
                    contains_key,
                    cache.try_get(&k).is_some(),
                    "ContainsKey disagrees with TryGet for {k}: {cache:#?}",
                );
            }
            CacheOperation::Remove(k) => {
                cache.remove(&k);
                owners.remove(&k);
                assert!(!cache.contains_key(&k));
                assert!(cache.entries().all(|(key, _)| key != k));
            }
            CacheOperation::Count => {
                assert_eq!(cache.count(), owners.len(), "Count mismatch: {cache:#?}");
                assert_eq!(cache.tracked_len(), owners.len());
                assert_eq!(cache.keys().len(), owners.len());
                assert_eq!(cache.values().len(), owners.len());
            }
            CacheOperation::Enumerate => {
                let mut count = 0;
                for (k, v) in cache.entries() {
                    let owner = owners.get(&k);
                    assert!(
                        owner.is_some_and(|owner| Rc::ptr_eq(owner, &v)),
                        "Enumeration yielded a released key: {k}",
                    );
                    count += 1;
                }
                assert_eq!(count, owners.len());
                assert_eq!(
                    cache.tracked_len(),
                    owners.len(),
                    "Completed enumeration left released records: {cache:#?}",
                );
            }
            CacheOperation::AbandonEnumeration => {
                let tracked = cache.tracked_len();
                let first = cache.entries().next();
                if first.is_some() {
                    assert!(cache.tracked_len() <= tracked);
                } else {
                    assert_eq!(cache.tracked_len(), 0);
                }
            }
            CacheOperation::GetOrInsertWith(k, v) => {
                let before = owners.get(&k).cloned();
                let value = cache.get_or_insert_with(k, |ik| {
                    assert_eq!(k, *ik, "Key mismatch in get_or_insert_with: {ik} != {k}");
                    Rc::new(v)
                });
                match before {
                    Some(owner) => assert!(Rc::ptr_eq(&owner, &value)),
                    None => assert_eq!(*value, v),
                }
                owners.insert(k, value);
                assert!(cache.contains_key(&k));
            }
            CacheOperation::Clear => {
                cache.clear();
                owners.clear();
                assert_eq!(cache.tracked_len(), 0);
                assert!(cache.is_empty());
            }
        }
    }

    let statistics = cache.statistics();
    assert!((0.0..=1.0).contains(&statistics.hit_rate()));
    assert_eq!(cache.count(), owners.len());
});
