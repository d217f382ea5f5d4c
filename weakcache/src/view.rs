use std::hash::Hash;

use crate::{
    Cache,
    CacheError,
    Entries,
    Result,
    WeakRef,
};

/// A read-only projection of a [`Cache`] that always reflects its live
/// contents.
///
/// Views have no storage of their own: every query reads through to the
/// cache, and may purge released records exactly like the cache operation it
/// forwards to. Mutations are rejected with [`CacheError::Unsupported`].
///
/// Membership is an inherent method on each view: [`Keys::contains()`]
/// hashes the key, [`Values::contains()`] requires `PartialEq` values.
pub trait LiveView {
    /// The element type the view projects.
    type Item;

    /// Returns the number of live elements. Same as [`Cache::count()`].
    fn len(&mut self) -> usize;

    /// Returns `true` if the view has no live elements.
    fn is_empty(&mut self) -> bool {
        self.len() == 0
    }

    /// Always `true`.
    fn is_read_only(&self) -> bool {
        true
    }

    /// Always fails with [`CacheError::Unsupported`].
    fn add(&mut self, _item: Self::Item) -> Result<()> {
        Err(CacheError::Unsupported("add"))
    }

    /// Always fails with [`CacheError::Unsupported`].
    fn remove(&mut self, _item: &Self::Item) -> Result<bool> {
        Err(CacheError::Unsupported("remove"))
    }

    /// Always fails with [`CacheError::Unsupported`].
    fn clear(&mut self) -> Result<()> {
        Err(CacheError::Unsupported("clear"))
    }
}

fn key_of<Key, Value>((key, _): (Key, Value)) -> Key {
    key
}

fn value_of<Key, Value>((_, value): (Key, Value)) -> Value {
    value
}

/// A live view of the keys of a [`Cache`], created by [`Cache::keys()`].
///
/// # Examples
///
/// ```rust
/// use std::rc::Rc;
///
/// use weakcache::{
///     CacheError,
///     LiveView,
///     WeakValueCache,
/// };
///
/// let mut cache = WeakValueCache::<u8, &str>::new();
/// let one = Rc::new("one");
/// let two = Rc::new("two");
/// cache.insert(1, &one).unwrap();
/// cache.insert(2, &two).unwrap();
/// drop(two);
///
/// let mut keys = cache.keys();
/// assert_eq!(keys.len(), 1);
/// assert!(keys.contains(&1));
/// assert!(!keys.contains(&2));
/// assert_eq!(keys.add(3), Err(CacheError::Unsupported("add")));
/// assert_eq!(keys.iter().collect::<Vec<_>>(), [1]);
/// ```
pub struct Keys<'c, Key, Ref> {
    cache: &'c mut Cache<Key, Ref>,
}

impl<'c, Key: Hash + Eq, Ref: WeakRef> Keys<'c, Key, Ref> {
    pub(crate) fn new(cache: &'c mut Cache<Key, Ref>) -> Self {
        Self { cache }
    }

    /// Returns an iterator over the live keys. See [`Cache::entries()`] for
    /// when released records are skipped and purged.
    pub fn iter(&mut self) -> impl Iterator<Item = Key> + '_
    where
        Key: Clone,
    {
        self.cache.entries().map(key_of)
    }

    /// Returns `true` if `key` has a live value. Same as
    /// [`Cache::contains_key()`].
    pub fn contains(&mut self, key: &Key) -> bool {
        self.cache.contains_key(key)
    }
}

impl<Key: Hash + Eq, Ref: WeakRef> LiveView for Keys<'_, Key, Ref> {
    type Item = Key;

    fn len(&mut self) -> usize {
        self.cache.count()
    }
}

impl<'c, Key: Hash + Eq + Clone, Ref: WeakRef> IntoIterator for Keys<'c, Key, Ref> {
    type IntoIter = std::iter::Map<Entries<'c, Key, Ref>, fn((Key, Ref::Strong)) -> Key>;
    type Item = Key;

    fn into_iter(self) -> Self::IntoIter {
        Entries::new(self.cache).map(key_of as fn(_) -> _)
    }
}

/// A live view of the values of a [`Cache`], created by [`Cache::values()`].
///
/// Values are yielded as strong handles. Membership compares by value
/// equality, scanning the live entries.
///
/// # Examples
///
/// ```rust
/// use std::rc::Rc;
///
/// use weakcache::{
///     LiveView,
///     WeakValueCache,
/// };
///
/// let mut cache = WeakValueCache::<u8, String>::new();
/// let value = Rc::new("page".to_string());
/// cache.insert(1, &value).unwrap();
///
/// let mut values = cache.values();
/// assert!(values.contains(&Rc::new("page".to_string())));
/// assert!(values.clear().is_err());
/// assert_eq!(values.len(), 1);
/// ```
pub struct Values<'c, Key, Ref> {
    cache: &'c mut Cache<Key, Ref>,
}

impl<'c, Key: Hash + Eq, Ref: WeakRef> Values<'c, Key, Ref> {
    pub(crate) fn new(cache: &'c mut Cache<Key, Ref>) -> Self {
        Self { cache }
    }

    /// Returns an iterator over the live values. See [`Cache::entries()`] for
    /// when released records are skipped and purged.
    pub fn iter(&mut self) -> impl Iterator<Item = Ref::Strong> + '_
    where
        Key: Clone,
    {
        self.cache.entries().map(value_of)
    }

    /// Returns `true` if a live value equal to `value` is stored under any
    /// key.
    ///
    /// This scans the live entries. A scan that finds no match drains the
    /// enumeration and so purges released records.
    pub fn contains(&mut self, value: &Ref::Strong) -> bool
    where
        Key: Clone,
        Ref::Strong: PartialEq,
    {
        self.cache.entries().any(|(_, live)| &live == value)
    }
}

impl<Key: Hash + Eq, Ref: WeakRef> LiveView for Values<'_, Key, Ref> {
    type Item = Ref::Strong;

    fn len(&mut self) -> usize {
        self.cache.count()
    }
}

impl<'c, Key: Hash + Eq + Clone, Ref: WeakRef> IntoIterator for Values<'c, Key, Ref> {
    type IntoIter = std::iter::Map<Entries<'c, Key, Ref>, fn((Key, Ref::Strong)) -> Ref::Strong>;
    type Item = Ref::Strong;

    fn into_iter(self) -> Self::IntoIter {
        Entries::new(self.cache).map(value_of as fn(_) -> _)
    }
}
