//! Name-keyed constructor registry.

use std::collections::HashMap;

/// Constructor stored under a type key. Receives the instance name.
pub type Constructor<T> = Box<dyn Fn(&str) -> Box<T> + Send + Sync>;

/// A registry mapping type keys (e.g. `"uart"`) to constructors.
///
/// Registering a key twice replaces the earlier constructor. Creating an
/// instance for an unknown key is not a failure, it simply yields `None`.
///
/// # Example
///
/// ```rust
/// use stimkit_core::factory::Factory;
///
/// trait Named { fn name(&self) -> String; }
/// struct Plain(String);
/// impl Named for Plain { fn name(&self) -> String { self.0.clone() } }
///
/// let mut factory: Factory<dyn Named> = Factory::new();
/// factory.register("plain", |name| Box::new(Plain(name.to_string())));
///
/// assert_eq!(factory.create("plain", "p0").unwrap().name(), "p0");
/// assert!(factory.create("fancy", "f0").is_none());
/// ```
pub struct Factory<T: ?Sized> {
    constructors: HashMap<String, Constructor<T>>,
}

impl<T: ?Sized> Factory<T> {
    /// Creates an empty factory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// Stores `ctor` under `key`, replacing any earlier registration.
    ///
    /// Returns true if a previous constructor was replaced.
    pub fn register<F>(&mut self, key: impl Into<String>, ctor: F) -> bool
    where
        F: Fn(&str) -> Box<T> + Send + Sync + 'static,
    {
        self.constructors.insert(key.into(), Box::new(ctor)).is_some()
    }

    /// Builds an instance named `name` with the constructor stored under `key`.
    #[must_use]
    pub fn create(&self, key: &str, name: &str) -> Option<Box<T>> {
        self.constructors.get(key).map(|ctor| ctor(name))
    }

    /// Returns true if `key` has a constructor.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.constructors.contains_key(key)
    }

    /// Registered keys, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}

impl<T: ?Sized> Default for Factory<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> std::fmt::Debug for Factory<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Factory").field("keys", &self.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Widget {
        fn describe(&self) -> String;
    }

    struct Knob {
        name: String,
        generation: u32,
    }

    impl Widget for Knob {
        fn describe(&self) -> String {
            format!("{}@{}", self.name, self.generation)
        }
    }

    #[test]
    fn test_create_passes_name() {
        let mut factory: Factory<dyn Widget> = Factory::new();
        factory.register("knob", |name| {
            Box::new(Knob {
                name: name.to_string(),
                generation: 1,
            })
        });

        let widget = factory.create("knob", "uart0_agent").unwrap();
        assert_eq!(widget.describe(), "uart0_agent@1");
    }

    #[test]
    fn test_last_registration_wins() {
        let mut factory: Factory<dyn Widget> = Factory::new();
        let replaced = factory.register("knob", |name| {
            Box::new(Knob {
                name: name.to_string(),
                generation: 1,
            })
        });
        assert!(!replaced);

        let replaced = factory.register("knob", |name| {
            Box::new(Knob {
                name: name.to_string(),
                generation: 2,
            })
        });
        assert!(replaced);

        assert_eq!(factory.len(), 1);
        assert_eq!(factory.create("knob", "k").unwrap().describe(), "k@2");
    }

    #[test]
    fn test_unknown_key_is_absent() {
        let factory: Factory<dyn Widget> = Factory::new();
        assert!(factory.create("nope", "bogus").is_none());
        assert!(!factory.contains("nope"));
        assert!(factory.is_empty());
    }

    #[test]
    fn test_keys_sorted() {
        let mut factory: Factory<dyn Widget> = Factory::default();
        for key in ["timer", "axi_dma", "uart"] {
            factory.register(key, |name| {
                Box::new(Knob {
                    name: name.to_string(),
                    generation: 0,
                })
            });
        }
        assert_eq!(factory.keys(), vec!["axi_dma", "timer", "uart"]);
    }
}
