use std::any::Any;

/// An ordered key/value side table of opaque client annotations.
///
/// Values are dropped when they are replaced, deleted, or when the owning object is destroyed.
#[derive(Default)]
pub struct UserData {
    entries: Vec<(String, Box<dyn Any + Send>)>,
}

impl std::fmt::Debug for UserData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(key, _)| key))
            .finish()
    }
}

impl UserData {
    /// Set the value of `key`, replacing (and dropping) any existing value.
    pub fn set(&mut self, key: &str, value: Box<dyn Any + Send>) {
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| k == key) {
            entry.1 = value;
        } else {
            self.entries.push((key.to_string(), value));
        }
    }

    /// Returns the value of `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&(dyn Any + Send)> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value.as_ref())
    }

    /// Returns the value of `key` if it has type `T`.
    #[must_use]
    pub fn get_as<T: Any>(&self, key: &str) -> Option<&T> {
        self.get(key).and_then(|value| value.downcast_ref::<T>())
    }

    /// Returns the mutable value of `key` if it has type `T`.
    pub fn get_as_mut<T: Any>(&mut self, key: &str) -> Option<&mut T> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .and_then(|(_, value)| value.downcast_mut::<T>())
    }

    /// Remove the value of `key`, returning it.
    pub fn remove(&mut self, key: &str) -> Option<Box<dyn Any + Send>> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    /// Iterate over the keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }
}
