#![doc = include_str!("../../README.md")]
#![deny(missing_docs)]
#![cfg_attr(all(doc, ENABLE_DOC_AUTO_CFG), feature(doc_auto_cfg))]

mod error;
mod iter;
#[cfg(feature = "statistics")]
mod statistics;
mod view;
mod weak;

use std::hash::Hash;

use indexmap::IndexMap;
use log::{
    debug,
    trace,
};

pub use error::{
    CacheError,
    Result,
};
pub use iter::Entries;
#[cfg(feature = "statistics")]
pub use statistics::Statistics;
pub use view::{
    Keys,
    LiveView,
    Values,
};
pub use weak::WeakRef;

#[cfg(not(feature = "ahash"))]
type RandomState = std::hash::RandomState;
#[cfg(feature = "ahash")]
type RandomState = ahash::RandomState;

/// A single-threaded weak-value cache over [`std::rc::Rc`] values.
///
/// # Examples
///
/// ```rust
/// use std::rc::Rc;
///
/// use weakcache::WeakValueCache;
///
/// let mut cache = WeakValueCache::<u64, String>::new();
/// let record = Rc::new("record #1".to_string());
/// cache.insert(1, &record).unwrap();
///
/// assert_eq!(cache.try_get(&1), Some(Rc::clone(&record)));
///
/// drop(record);
/// assert_eq!(cache.try_get(&1), None);
/// assert_eq!(cache.count(), 0);
/// ```
pub type WeakValueCache<Key, Value> = Cache<Key, std::rc::Weak<Value>>;

/// A weak-value cache over [`std::sync::Arc`] values.
///
/// The cache itself is not synchronized; share it between threads behind a
/// lock. Values may be released from any thread at any time.
///
/// # Examples
///
/// ```rust
/// use std::sync::{
///     Arc,
///     Mutex,
/// };
///
/// use weakcache::SyncWeakValueCache;
///
/// let cache = Mutex::new(SyncWeakValueCache::<u64, Vec<u8>>::new());
/// let page = Arc::new(vec![0u8; 16]);
/// cache.lock().unwrap().insert(7, &page).unwrap();
///
/// std::thread::spawn(move || drop(page)).join().unwrap();
/// assert!(!cache.lock().unwrap().contains_key(&7));
/// ```
pub type SyncWeakValueCache<Key, Value> = Cache<Key, std::sync::Weak<Value>>;

/// A map from keys to values it does not keep alive.
///
/// Each record pairs a key with a [`WeakRef`] to a value owned somewhere
/// else. Once the last strong owner of a value drops it, the record is
/// *dead*: it is still stored, but no longer observable through any lookup,
/// count, enumeration or view. Dead records are *purged* the next time the
/// cache observes them; there is no background sweeping.
///
/// | operation                             | dead record handling                 |
/// |---------------------------------------|--------------------------------------|
/// | [`try_get`](Self::try_get), [`get`](Self::get), [`contains_key`](Self::contains_key) | purged immediately |
/// | [`count`](Self::count), [`purge`](Self::purge) | every dead record purged    |
/// | [`entries`](Self::entries) and views   | purged once the iterator is drained |
/// | [`insert`](Self::insert)               | still conflicts, never purged        |
/// | [`remove`](Self::remove)               | removed like a live record           |
///
/// Most code should use the [`WeakValueCache`] or [`SyncWeakValueCache`]
/// aliases rather than naming `Cache` directly.
///
/// # Type Parameters
///
/// * `Key` - The type of keys stored in the cache. Must implement [`Hash`] +
///   [`Eq`].
/// * `Ref` - The weak reference stored per key. Must implement [`WeakRef`].
///
/// # Ordering
///
/// Iteration follows the backing map's native order, which is unspecified:
/// purging a record moves the last record into its slot.
pub struct Cache<Key, Ref> {
    slots: IndexMap<Key, Ref, RandomState>,
    #[cfg(feature = "statistics")]
    statistics: Statistics,
}

impl<Key, Ref> std::fmt::Debug for Cache<Key, Ref>
where
    Key: std::fmt::Debug,
    Ref: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut debug = f.debug_struct("Cache");
        debug.field("slots", &self.slots);
        #[cfg(feature = "statistics")]
        debug.field("statistics", &self.statistics);
        debug.finish()
    }
}

impl<Key: Clone, Ref: Clone> Clone for Cache<Key, Ref> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
            #[cfg(feature = "statistics")]
            statistics: self.statistics,
        }
    }
}

impl<Key: Hash + Eq, Ref: WeakRef> Default for Cache<Key, Ref> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Key: Hash + Eq, Ref: WeakRef> Cache<Key, Ref> {
    /// Creates a new, empty cache.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates a new, empty cache with room for at least `capacity` records
    /// before reallocating.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use weakcache::WeakValueCache;
    ///
    /// let mut cache = WeakValueCache::<u32, u32>::with_capacity(128);
    /// assert!(cache.is_empty());
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: IndexMap::with_capacity_and_hasher(capacity, RandomState::default()),
            #[cfg(feature = "statistics")]
            statistics: Statistics::default(),
        }
    }

    /// Returns the value stored under `key` if it is still alive.
    ///
    /// A record whose value has been released is purged as a side effect and
    /// reported as missing. Liveness and retrieval are a single
    /// [`upgrade()`](WeakRef::upgrade), so a record is never seen as alive and
    /// then fails to produce its value.
    ///
    /// # Arguments
    ///
    /// * `key` - The key to look up in the cache
    ///
    /// # Returns
    ///
    /// * `Some(Strong)` - A new strong handle if the value is still alive
    /// * `None` - If the key is not found or its value has been released
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::rc::Rc;
    ///
    /// use weakcache::WeakValueCache;
    ///
    /// let mut cache = WeakValueCache::<&str, i32>::new();
    /// let value = Rc::new(10);
    /// cache.insert("a", &value).unwrap();
    ///
    /// assert_eq!(cache.try_get(&"a").as_deref(), Some(&10));
    /// assert_eq!(cache.try_get(&"b"), None);
    ///
    /// drop(value);
    /// assert_eq!(cache.tracked_len(), 1);
    /// assert_eq!(cache.try_get(&"a"), None);
    /// assert_eq!(cache.tracked_len(), 0); // purged by the lookup
    /// ```
    pub fn try_get(&mut self, key: &Key) -> Option<Ref::Strong> {
        let Some(index) = self.slots.get_index_of(key) else {
            self.record_lookup(false);
            return None;
        };

        let value = self.slots[index].upgrade();
        if value.is_none() {
            self.purge_index(index);
        }
        self.record_lookup(value.is_some());
        value
    }

    /// Returns the value stored under `key`, failing with
    /// [`CacheError::KeyNotFound`] if there is none or it has been released.
    ///
    /// Released records are purged exactly as with
    /// [`try_get()`](Self::try_get).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::rc::Rc;
    ///
    /// use weakcache::{
    ///     CacheError,
    ///     WeakValueCache,
    /// };
    ///
    /// let mut cache = WeakValueCache::<u8, String>::new();
    /// let value = Rc::new("one".to_string());
    /// cache.insert(1, &value).unwrap();
    ///
    /// assert_eq!(cache.get(&1), Ok(value));
    /// assert_eq!(cache.get(&2), Err(CacheError::KeyNotFound));
    /// ```
    pub fn get(&mut self, key: &Key) -> Result<Ref::Strong> {
        self.try_get(key).ok_or(CacheError::KeyNotFound)
    }

    /// Returns `true` if a live value is stored under `key`.
    ///
    /// Like [`try_get()`](Self::try_get), a record whose value has been
    /// released is purged as a side effect.
    pub fn contains_key(&mut self, key: &Key) -> bool {
        let Some(index) = self.slots.get_index_of(key) else {
            self.record_lookup(false);
            return false;
        };

        let alive = self.slots[index].is_alive();
        if !alive {
            self.purge_index(index);
        }
        self.record_lookup(alive);
        alive
    }

    /// Stores a weak reference to `value` under `key`.
    ///
    /// Fails with [`CacheError::DuplicateKey`] if any record already exists
    /// for `key`, **including** one whose value has been released but not yet
    /// purged. Inserting never overwrites and never purges.
    ///
    /// # Arguments
    ///
    /// * `key` - The key to store the record under
    /// * `value` - A strong handle to the value. Only a weak reference to it is
    ///   kept.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the record was stored
    /// * `Err(CacheError::DuplicateKey)` - If a record for `key` exists
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::rc::Rc;
    ///
    /// use weakcache::{
    ///     CacheError,
    ///     WeakValueCache,
    /// };
    ///
    /// let mut cache = WeakValueCache::<&str, i32>::new();
    /// let one = Rc::new(1);
    /// let two = Rc::new(2);
    ///
    /// assert_eq!(cache.insert("x", &one), Ok(()));
    /// assert_eq!(cache.insert("x", &two), Err(CacheError::DuplicateKey));
    /// assert!(cache.remove(&"x"));
    /// assert_eq!(cache.insert("x", &two), Ok(()));
    /// assert_eq!(cache.try_get(&"x").as_deref(), Some(&2));
    /// ```
    pub fn insert(&mut self, key: Key, value: &Ref::Strong) -> Result<()> {
        self.insert_weak(key, Ref::downgrade(value))
    }

    /// Stores an existing weak reference under `key`.
    ///
    /// Fails with [`CacheError::NullValue`] if `value` no longer resolves, and
    /// with [`CacheError::DuplicateKey`] if any record already exists for
    /// `key`. The cache is left unchanged on failure.
    ///
    /// # Arguments
    ///
    /// * `key` - The key to store the record under
    /// * `value` - The weak reference to store
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the record was stored
    /// * `Err(CacheError::NullValue)` - If `value` no longer resolves, whether
    ///   or not `key` is present
    /// * `Err(CacheError::DuplicateKey)` - If a record for `key` exists
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::rc::{
    ///     Rc,
    ///     Weak,
    /// };
    ///
    /// use weakcache::{
    ///     CacheError,
    ///     WeakValueCache,
    /// };
    ///
    /// let mut cache = WeakValueCache::<u8, u8>::new();
    /// assert_eq!(cache.insert_weak(1, Weak::new()), Err(CacheError::NullValue));
    /// assert_eq!(cache.tracked_len(), 0);
    ///
    /// let value = Rc::new(5);
    /// assert_eq!(cache.insert_weak(1, Rc::downgrade(&value)), Ok(()));
    /// ```
    pub fn insert_weak(&mut self, key: Key, value: Ref) -> Result<()> {
        if !value.is_alive() {
            debug!("rejected insert: value has already been released");
            return Err(CacheError::NullValue);
        }

        match self.slots.entry(key) {
            indexmap::map::Entry::Occupied(_) => {
                debug!("rejected insert: key is already present");
                Err(CacheError::DuplicateKey)
            }
            indexmap::map::Entry::Vacant(v) => {
                v.insert(value);
                Ok(())
            }
        }
    }

    /// Assignment-style alias for [`insert()`](Self::insert).
    ///
    /// This is **not** an upsert: assigning to a key that already has a
    /// record fails with [`CacheError::DuplicateKey`]. Remove the key first to
    /// replace its value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::rc::Rc;
    ///
    /// use weakcache::{
    ///     CacheError,
    ///     WeakValueCache,
    /// };
    ///
    /// let mut cache = WeakValueCache::<u8, &str>::new();
    /// let a = Rc::new("a");
    /// let b = Rc::new("b");
    /// cache.set(1, &a).unwrap();
    /// assert_eq!(cache.set(1, &b), Err(CacheError::DuplicateKey));
    /// assert_eq!(cache.get(&1), Ok(a));
    /// ```
    pub fn set(&mut self, key: Key, value: &Ref::Strong) -> Result<()> {
        self.insert(key, value)
    }

    /// Returns the live value for `key`, or stores and returns the value built
    /// by `or_insert`.
    ///
    /// A record whose value has been released is replaced by the new value.
    /// The returned strong handle is the only thing keeping a freshly built
    /// value alive.
    ///
    /// # Arguments
    ///
    /// * `key` - The key to look up, and to store the new record under if
    ///   needed
    /// * `or_insert` - Builds the value from the key. Called at most once, and
    ///   only if no live value is stored under `key`.
    ///
    /// # Returns
    ///
    /// A strong handle to the live value for `key`, existing or new.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::rc::Rc;
    ///
    /// use weakcache::WeakValueCache;
    ///
    /// let mut cache = WeakValueCache::<u64, String>::new();
    ///
    /// let first = cache.get_or_insert_with(3, |id| format!("record {id}").into());
    /// let second = cache.get_or_insert_with(3, |_| unreachable!());
    /// assert!(Rc::ptr_eq(&first, &second));
    ///
    /// drop((first, second));
    /// let rebuilt = cache.get_or_insert_with(3, |id| format!("record {id} again").into());
    /// assert_eq!(*rebuilt, "record 3 again");
    /// ```
    pub fn get_or_insert_with(
        &mut self,
        key: Key,
        or_insert: impl FnOnce(&Key) -> Ref::Strong,
    ) -> Ref::Strong {
        match self.slots.entry(key) {
            indexmap::map::Entry::Occupied(mut o) => match o.get().upgrade() {
                Some(value) => value,
                None => {
                    let value = or_insert(o.key());
                    *o.get_mut() = Ref::downgrade(&value);
                    trace!("replaced a released entry");
                    #[cfg(feature = "statistics")]
                    self.statistics.record_purged(1);
                    value
                }
            },
            indexmap::map::Entry::Vacant(v) => {
                let value = or_insert(v.key());
                v.insert(Ref::downgrade(&value));
                value
            }
        }
    }

    /// Removes the record for `key`, alive or not.
    ///
    /// # Arguments
    ///
    /// * `key` - The key of the record to remove
    ///
    /// # Returns
    ///
    /// * `true` - If a record was present, even one whose value was released
    /// * `false` - If the key was not found
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::rc::Rc;
    ///
    /// use weakcache::WeakValueCache;
    ///
    /// let mut cache = WeakValueCache::<u8, u8>::new();
    /// let value = Rc::new(1);
    /// cache.insert(1, &value).unwrap();
    ///
    /// assert!(cache.remove(&1));
    /// assert!(!cache.remove(&1));
    /// assert_eq!(Rc::strong_count(&value), 1);
    /// ```
    pub fn remove(&mut self, key: &Key) -> bool {
        self.slots.swap_remove(key).is_some()
    }

    /// Returns the number of records whose value is still alive.
    ///
    /// This is **not** free of side effects: it makes a full pass over the
    /// cache and purges every released record it finds, so it never reports
    /// more entries than a following enumeration would yield.
    ///
    /// # Returns
    ///
    /// The number of live records, which is also the number of records left
    /// in the cache after the call.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::rc::Rc;
    ///
    /// use weakcache::WeakValueCache;
    ///
    /// let mut cache = WeakValueCache::<u8, u8>::new();
    /// let kept = Rc::new(1);
    /// let released = Rc::new(2);
    /// cache.insert(1, &kept).unwrap();
    /// cache.insert(2, &released).unwrap();
    ///
    /// drop(released);
    /// assert_eq!(cache.tracked_len(), 2);
    /// assert_eq!(cache.count(), 1);
    /// assert_eq!(cache.tracked_len(), 1);
    /// ```
    pub fn count(&mut self) -> usize {
        self.purge();
        self.slots.len()
    }

    /// Returns `true` if no live value is stored. Purges like
    /// [`count()`](Self::count).
    pub fn is_empty(&mut self) -> bool {
        self.count() == 0
    }

    /// Removes every record whose value has been released and returns how
    /// many were removed.
    pub fn purge(&mut self) -> usize {
        let before = self.slots.len();
        self.slots.retain(|_, value| value.is_alive());

        let purged = before - self.slots.len();
        if purged > 0 {
            trace!("purged {purged} released entries in a full pass");
            self.record_purged(purged);
        }
        purged
    }

    /// Returns the number of records held, including released ones that
    /// have not been purged yet.
    ///
    /// Unlike [`count()`](Self::count) this never purges, which makes it
    /// useful to observe when purging happens.
    pub fn tracked_len(&self) -> usize {
        self.slots.len()
    }

    /// Removes every record.
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Shrinks the internal storage to fit the current number of records.
    pub fn shrink_to_fit(&mut self) {
        self.slots.shrink_to_fit();
    }

    /// Returns an iterator over the live `(key, value)` pairs.
    ///
    /// Each record is checked when the iterator reaches it: values released
    /// before that point are skipped. Released records are not removed during
    /// the pass; they are purged together once the iterator has been drained.
    /// Dropping the iterator early leaves them in place.
    ///
    /// Every call starts a new pass over the current contents.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::rc::Rc;
    ///
    /// use weakcache::WeakValueCache;
    ///
    /// let mut cache = WeakValueCache::<char, u32>::new();
    /// let a = Rc::new(1);
    /// let b = Rc::new(2);
    /// let c = Rc::new(3);
    /// cache.insert('a', &a).unwrap();
    /// cache.insert('b', &b).unwrap();
    /// cache.insert('c', &c).unwrap();
    ///
    /// drop(b);
    /// let mut seen: Vec<_> = cache.entries().map(|(key, value)| (key, *value)).collect();
    /// seen.sort();
    /// assert_eq!(seen, [('a', 1), ('c', 3)]);
    /// assert_eq!(cache.tracked_len(), 2);
    /// ```
    pub fn entries(&mut self) -> Entries<'_, Key, Ref> {
        Entries::new(self)
    }

    /// Returns a live, read-only view of the cache's keys.
    pub fn keys(&mut self) -> Keys<'_, Key, Ref> {
        Keys::new(self)
    }

    /// Returns a live, read-only view of the cache's values.
    pub fn values(&mut self) -> Values<'_, Key, Ref> {
        Values::new(self)
    }

    /// Returns the counters collected so far.
    #[cfg(feature = "statistics")]
    pub fn statistics(&self) -> Statistics {
        self.statistics
    }

    /// Resets every counter to zero.
    #[cfg(feature = "statistics")]
    pub fn reset_statistics(&mut self) {
        self.statistics = Statistics::default();
    }

    fn purge_index(&mut self, index: usize) {
        self.slots.swap_remove_index(index);
        trace!("purged a released entry on lookup");
        self.record_purged(1);
    }

    /// Purges the records at `indices`, which must be sorted ascending and
    /// still point at the records they were collected from.
    pub(crate) fn purge_indices(&mut self, indices: &[usize]) {
        // Descending, so each swap-remove only moves a record from a higher
        // index than any still pending.
        for &index in indices.iter().rev() {
            debug_assert!(
                self.slots
                    .get_index(index)
                    .is_some_and(|(_, value)| !value.is_alive()),
                "deferred purge index {index} no longer points at a released entry"
            );
            self.slots.swap_remove_index(index);
        }

        if !indices.is_empty() {
            trace!("purged {} released entries after enumeration", indices.len());
            self.record_purged(indices.len());
        }
    }

    #[inline]
    fn record_lookup(&mut self, _hit: bool) {
        #[cfg(feature = "statistics")]
        self.statistics.record_lookup(_hit);
    }

    #[inline]
    fn record_purged(&mut self, _count: usize) {
        #[cfg(feature = "statistics")]
        self.statistics.record_purged(_count);
    }
}

impl<'c, Key: Hash + Eq + Clone, Ref: WeakRef> IntoIterator for &'c mut Cache<Key, Ref> {
    type IntoIter = Entries<'c, Key, Ref>;
    type Item = (Key, Ref::Strong);

    fn into_iter(self) -> Self::IntoIter {
        Entries::new(self)
    }
}
