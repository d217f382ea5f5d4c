use std::{
    rc::Rc,
    sync::Arc,
};

/// A reference that observes a value without keeping it alive.
///
/// The cache stores one `WeakRef` per key and relies on it for two things:
/// telling whether the value still has a strong owner somewhere else, and
/// producing a strong handle to it. Both are resolved through a single
/// observation in [`upgrade()`](Self::upgrade), so a value can never be
/// reported alive and then fail to materialize.
///
/// Implementations are provided for [`std::rc::Weak`] and
/// [`std::sync::Weak`]. Other handle types (for example a generation-checked
/// index into an arena owned elsewhere) can implement this trait to be cached
/// as well.
///
/// # Examples
///
/// ```rust
/// use std::rc::{
///     Rc,
///     Weak,
/// };
///
/// use weakcache::WeakRef;
///
/// let strong = Rc::new(7);
/// let weak = <Weak<i32> as WeakRef>::downgrade(&strong);
/// assert!(weak.is_alive());
/// assert_eq!(weak.upgrade().as_deref(), Some(&7));
///
/// drop(strong);
/// assert!(!weak.is_alive());
/// assert_eq!(weak.upgrade(), None);
/// ```
pub trait WeakRef {
    /// The owning handle this reference was created from and resolves to.
    type Strong;

    /// Creates a weak reference observing `strong`.
    fn downgrade(strong: &Self::Strong) -> Self;

    /// Resolves the reference, returning a new strong handle if the value is
    /// still owned elsewhere.
    fn upgrade(&self) -> Option<Self::Strong>;

    /// Returns `true` if the referenced value still has a strong owner.
    ///
    /// The answer is only a snapshot. Use [`upgrade()`](Self::upgrade) when
    /// the value itself is needed.
    fn is_alive(&self) -> bool {
        self.upgrade().is_some()
    }
}

impl<T> WeakRef for std::rc::Weak<T> {
    type Strong = Rc<T>;

    fn downgrade(strong: &Rc<T>) -> Self {
        Rc::downgrade(strong)
    }

    fn upgrade(&self) -> Option<Rc<T>> {
        std::rc::Weak::upgrade(self)
    }

    fn is_alive(&self) -> bool {
        self.strong_count() > 0
    }
}

impl<T> WeakRef for std::sync::Weak<T> {
    type Strong = Arc<T>;

    fn downgrade(strong: &Arc<T>) -> Self {
        Arc::downgrade(strong)
    }

    fn upgrade(&self) -> Option<Arc<T>> {
        std::sync::Weak::upgrade(self)
    }

    fn is_alive(&self) -> bool {
        self.strong_count() > 0
    }
}
