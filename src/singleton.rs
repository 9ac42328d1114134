use std::any::type_name;
use std::fmt::{Debug, Formatter};
use std::ops::Deref;
use std::sync::OnceLock;

/// A process-wide value, created lazily exactly once on first access.
///
/// Concurrent first accesses from different threads are serialized: only one of them runs the
/// initializer, the others wait for it and then observe the same instance. Once initialized, access
/// is lock-free.
///
/// # Example
///
/// ```
/// use mediatr::Singleton;
///
/// static GREETING: Singleton<String> = Singleton::new(|| "hello".to_string());
///
/// assert_eq!(GREETING.get(), "hello");
/// assert!(std::ptr::eq(GREETING.get(), GREETING.get()));
/// ```
pub struct Singleton<T> {
    cell: OnceLock<T>,
    init: fn() -> T,
}

impl<T> Singleton<T> {
    /// Creates an uninitialized singleton which will be built with `init` on first access.
    pub const fn new(init: fn() -> T) -> Self {
        Self {
            cell: OnceLock::new(),
            init,
        }
    }

    /// Returns the shared instance, creating it if this is the first access.
    pub fn get(&self) -> &T {
        self.cell.get_or_init(|| {
            log::debug!("Creating singleton {}", type_name::<T>());
            (self.init)()
        })
    }

    /// Whether the instance has already been created.
    pub fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl<T> Deref for Singleton<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.get()
    }
}

impl<T: Debug> Debug for Singleton<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.cell.get() {
            Some(value) => f.debug_tuple("Singleton").field(value).finish(),
            None => f.write_str("Singleton(<uninitialized>)"),
        }
    }
}
