use std::{
    hash::Hash,
    iter::FusedIterator,
};

use crate::{
    Cache,
    WeakRef,
};

/// Iterator over the live `(key, value)` pairs of a [`Cache`].
///
/// Created by [`Cache::entries()`]. Every record is resolved when the
/// iterator reaches it, so a value released before that point is skipped and
/// a value released after being yielded does not affect what was already
/// produced.
///
/// Released records are remembered rather than removed mid-pass. When the
/// iterator is drained (the first call to `next()` returning `None`), they
/// are purged in a second pass. An iterator dropped before that purges
/// nothing.
pub struct Entries<'c, Key, Ref> {
    cache: &'c mut Cache<Key, Ref>,
    next: usize,
    released: Vec<usize>,
    drained: bool,
}

impl<'c, Key, Ref> Entries<'c, Key, Ref> {
    pub(crate) fn new(cache: &'c mut Cache<Key, Ref>) -> Self {
        Self {
            cache,
            next: 0,
            released: Vec::new(),
            drained: false,
        }
    }
}

impl<Key: Hash + Eq + Clone, Ref: WeakRef> Iterator for Entries<'_, Key, Ref> {
    type Item = (Key, Ref::Strong);

    fn next(&mut self) -> Option<Self::Item> {
        if self.drained {
            return None;
        }

        while let Some((key, weak)) = self.cache.slots.get_index(self.next) {
            let index = self.next;
            self.next += 1;
            match weak.upgrade() {
                Some(value) => return Some((key.clone(), value)),
                None => self.released.push(index),
            }
        }

        self.drained = true;
        self.cache.purge_indices(&self.released);
        self.released.clear();
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.drained {
            (0, Some(0))
        } else {
            (0, Some(self.cache.slots.len().saturating_sub(self.next)))
        }
    }
}

impl<Key: Hash + Eq + Clone, Ref: WeakRef> FusedIterator for Entries<'_, Key, Ref> {}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use ntest::timeout;

    use crate::WeakValueCache;

    #[test]
    fn test_release_mid_enumeration() {
        let mut cache = WeakValueCache::<&str, u32>::new();
        let a = Rc::new(1);
        let b = Rc::new(2);
        let c = Rc::new(3);
        cache.insert("a", &a).unwrap();
        cache.insert("b", &b).unwrap();
        cache.insert("c", &c).unwrap();

        let mut entries = cache.entries();
        // Nothing has been purged yet, so records are in insertion order.
        let (key, value) = entries.next().unwrap();
        assert_eq!((key, *value), ("a", 1));

        drop(b);
        let (key, value) = entries.next().unwrap();
        assert_eq!((key, *value), ("c", 3));
        assert_eq!(entries.cache.tracked_len(), 3);

        assert!(entries.next().is_none());
        assert_eq!(entries.cache.tracked_len(), 2);
        assert!(entries.next().is_none());

        assert!(cache.contains_key(&"a"));
        assert!(cache.contains_key(&"c"));
        assert!(!cache.contains_key(&"b"));
    }

    #[test]
    fn test_release_after_yield_keeps_produced_value() {
        let mut cache = WeakValueCache::<u8, String>::new();
        let value = Rc::new("first".to_string());
        cache.insert(0, &value).unwrap();

        let mut entries = cache.entries();
        let (_, yielded) = entries.next().unwrap();
        drop(value);
        assert_eq!(*yielded, "first");
        assert!(entries.next().is_none());

        // The yielded handle still owns the value.
        assert_eq!(cache.count(), 1);
        drop(yielded);
        assert_eq!(cache.count(), 0);
    }

    #[test]
    fn test_partial_enumeration_does_not_purge() {
        let mut cache = WeakValueCache::<u8, u8>::new();
        let live = Rc::new(0);
        cache.insert(0, &live).unwrap();
        let dead = Rc::new(1);
        cache.insert(1, &dead).unwrap();
        drop(dead);

        let first = cache.entries().next();
        assert!(first.is_some());
        assert_eq!(cache.tracked_len(), 2);

        assert_eq!(cache.entries().count(), 1);
        assert_eq!(cache.tracked_len(), 1);
    }

    #[test]
    #[timeout(5000)]
    fn test_deferred_purge_of_many_released() {
        let mut cache = WeakValueCache::<u32, u32>::new();
        let mut kept = Vec::new();
        for i in 0..1000 {
            let value = Rc::new(i);
            cache.insert(i, &value).unwrap();
            if i % 3 == 0 {
                kept.push(value);
            }
        }

        let mut keys: Vec<_> = cache.entries().map(|(key, _)| key).collect();
        keys.sort_unstable();
        let expected: Vec<_> = kept.iter().map(|value| **value).collect();
        assert_eq!(keys, expected);
        assert_eq!(cache.tracked_len(), kept.len());

        for value in &kept {
            assert!(Rc::ptr_eq(&cache.try_get(&**value).unwrap(), value));
        }
    }

    #[test]
    fn test_size_hint() {
        let mut cache = WeakValueCache::<u8, u8>::new();
        let values: Vec<_> = (0..4u8).map(Rc::new).collect();
        for value in &values {
            cache.insert(**value, value).unwrap();
        }

        let mut entries = cache.entries();
        assert_eq!(entries.size_hint(), (0, Some(4)));
        entries.next();
        assert_eq!(entries.size_hint(), (0, Some(3)));
        entries.by_ref().for_each(drop);
        assert_eq!(entries.size_hint(), (0, Some(0)));
    }

    #[test]
    fn test_enumeration_is_restartable() {
        let mut cache = WeakValueCache::<u8, u8>::new();
        let values: Vec<_> = (0..3u8).map(Rc::new).collect();
        for value in &values {
            cache.insert(**value, value).unwrap();
        }

        assert_eq!(cache.entries().count(), 3);
        assert_eq!(cache.entries().count(), 3);
        assert_eq!((&mut cache).into_iter().count(), 3);
    }
}
