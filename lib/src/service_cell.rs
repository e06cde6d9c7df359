//! Single-registration cell for process-wide service objects.
//!
//! Used to publish the active runtime shim to the C surface. Works with trait
//! objects (`ServiceCell<dyn Shim>`), which is why it wraps `spin::Once`
//! instead of an `AtomicPtr`.

use spin::Once;

pub struct ServiceCell<T: ?Sized + 'static> {
    slot: Once<&'static T>,
    name: &'static str,
}

impl<T: ?Sized + 'static> ServiceCell<T> {
    /// Create an empty cell. `name` appears in diagnostics.
    #[inline]
    pub const fn new(name: &'static str) -> Self {
        Self {
            slot: Once::new(),
            name,
        }
    }

    /// Register the service. Returns `false` if one was already registered;
    /// the first registration wins.
    pub fn register(&self, service: &'static T) -> bool {
        let mut fresh = false;
        self.slot.call_once(|| {
            fresh = true;
            service
        });
        fresh
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.slot.is_completed()
    }

    /// Get the service. Panics if nothing was registered.
    #[inline]
    pub fn get(&self) -> &'static T {
        match self.slot.get() {
            Some(service) => *service,
            None => panic!("{} not initialized", self.name),
        }
    }

    #[inline]
    pub fn try_get(&self) -> Option<&'static T> {
        self.slot.get().copied()
    }
}
