//! Address-indexed remote objects
//!
//! Remote objects never own each other: relations are looked up by address
//! through [`RemoteContext::get_object`], because the memory behind an
//! address can be reused by a different logical object between frames.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroU64;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::context::RemoteContext;

/// Location in the target process; `0` means "no object"
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Address(u64);

impl Address {
    pub const NULL: Address = Address(0);

    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// `None` when the address is the null sentinel
    pub fn get(self) -> Option<NonZeroU64> {
        NonZeroU64::new(self.0)
    }

    pub fn is_null(self) -> bool {
        self.0 == 0
    }

    pub fn raw(self) -> u64 {
        self.0
    }

    pub fn offset(self, by: u64) -> Address {
        Address(self.0.wrapping_add(by))
    }
}

impl From<u64> for Address {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl From<Address> for u64 {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:X}", self.0)
    }
}

impl fmt::UpperHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::UpperHex::fmt(&self.0, f)
    }
}

/// A typed view over memory at an address
pub trait RemoteObject: Sized + Send + Sync {
    /// Bind a wrapper to `address`. Must not read memory when the address is null.
    fn from_address(ctx: &RemoteContext, address: Address) -> Self;

    fn address(&self) -> Address;

    fn context(&self) -> &RemoteContext;

    fn is_null(&self) -> bool {
        self.address().is_null()
    }

    /// Wrap another address with the same context
    fn get_object<T: RemoteObject>(&self, address: impl Into<Address>) -> T {
        self.context().get_object(address)
    }

    /// Reinterpret this object's address as another type
    fn as_object<T: RemoteObject>(&self) -> T {
        self.get_object(self.address())
    }
}

type RegistryKey = (TypeId, Address);

/// Weak, address-keyed registry of live object state
///
/// Lets the object factory hand out the same instance for an address while
/// anything still holds it, without keeping dead objects alive.
#[derive(Default)]
pub struct ObjectRegistry {
    entries: Mutex<RegistryEntries>,
}

struct RegistryEntries {
    map: HashMap<RegistryKey, Weak<dyn Any + Send + Sync>>,
    next_purge: usize,
}

impl Default for RegistryEntries {
    fn default() -> Self {
        Self {
            map: HashMap::new(),
            next_purge: Self::MIN_PURGE,
        }
    }
}

impl RegistryEntries {
    const MIN_PURGE: usize = 1024;

    fn purge_if_needed(&mut self) {
        if self.map.len() < self.next_purge {
            return;
        }
        self.map.retain(|_, weak| weak.strong_count() > 0);
        self.next_purge = (self.map.len() * 2).max(Self::MIN_PURGE);
    }
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the live state registered for `address`, or register a new one
    pub fn get_or_insert<I, F>(&self, address: Address, make: F) -> Arc<I>
    where
        I: Any + Send + Sync,
        F: FnOnce() -> Arc<I>,
    {
        let key = (TypeId::of::<I>(), address);
        let mut entries = self.entries.lock();

        if let Some(existing) = entries.map.get(&key).and_then(Weak::upgrade) {
            if let Ok(state) = existing.downcast::<I>() {
                return state;
            }
        }

        let state = make();
        let erased: Arc<dyn Any + Send + Sync> = state.clone();
        entries.purge_if_needed();
        entries.map.insert(key, Arc::downgrade(&erased));
        state
    }

    /// Number of registered entries whose object is still alive
    pub fn live_count(&self) -> usize {
        self.entries
            .lock()
            .map
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }
}

impl fmt::Debug for ObjectRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectRegistry")
            .field("live", &self.live_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_sentinel() {
        assert!(Address::NULL.is_null());
        assert!(Address::NULL.get().is_none());
        assert_eq!(Address::new(0x10).get().map(NonZeroU64::get), Some(0x10));
        assert_eq!(Address::new(0x10).offset(8), Address::new(0x18));
        assert_eq!(Address::new(0xABC).to_string(), "0xABC");
    }

    #[test]
    fn test_registry_reuses_live_state() {
        let registry = ObjectRegistry::new();
        let first = registry.get_or_insert(Address::new(0x1000), || Arc::new(1u32));
        let second = registry.get_or_insert(Address::new(0x1000), || Arc::new(2u32));

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*second, 1);
    }

    #[test]
    fn test_registry_forgets_dropped_state() {
        let registry = ObjectRegistry::new();
        drop(registry.get_or_insert(Address::new(0x1000), || Arc::new(1u32)));

        let again = registry.get_or_insert(Address::new(0x1000), || Arc::new(2u32));
        assert_eq!(*again, 2);
        assert_eq!(registry.live_count(), 1);
    }

    #[test]
    fn test_registry_keys_by_type() {
        let registry = ObjectRegistry::new();
        let number = registry.get_or_insert(Address::new(0x1000), || Arc::new(1u32));
        let text = registry.get_or_insert(Address::new(0x1000), || Arc::new("x".to_string()));

        assert_eq!(*number, 1);
        assert_eq!(text.as_str(), "x");
        assert_eq!(registry.live_count(), 2);
    }
}
