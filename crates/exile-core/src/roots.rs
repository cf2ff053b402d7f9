//! Named UI roots
//!
//! The host declares which well-known panels live at which address, and
//! path descriptions use those names instead of discovering them at runtime.

use crate::object::Address;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiRoots {
    entries: Vec<(String, Address)>,
}

impl UiRoots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare (or re-point) a named root
    pub fn insert(&mut self, name: impl Into<String>, address: impl Into<Address>) {
        let name = name.into();
        let address = address.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = address,
            None => self.entries.push((name, address)),
        }
    }

    pub fn with(mut self, name: impl Into<String>, address: impl Into<Address>) -> Self {
        self.insert(name, address);
        self
    }

    /// First name declared for `address`
    pub fn name_of(&self, address: Address) -> Option<&str> {
        if address.is_null() {
            return None;
        }
        self.entries
            .iter()
            .find(|(_, a)| *a == address)
            .map(|(name, _)| name.as_str())
    }

    pub fn address_of(&self, name: &str) -> Option<Address> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, address)| *address)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Address)> {
        self.entries.iter().map(|(name, address)| (name.as_str(), *address))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>, A: Into<Address>> FromIterator<(S, A)> for UiRoots {
    fn from_iter<I: IntoIterator<Item = (S, A)>>(iter: I) -> Self {
        let mut roots = UiRoots::new();
        for (name, address) in iter {
            roots.insert(name, address);
        }
        roots
    }
}
