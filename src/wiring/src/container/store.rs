use std::collections::HashMap;

use parking_lot::RwLock;

use crate::container::Instance;

/// Objects shared by abstraction name for the lifetime of an injector.
#[derive(Debug, Default)]
pub struct SharedInstanceStore {
    instances: RwLock<HashMap<String, Instance>>,
}

impl SharedInstanceStore {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn get(&self, abstraction: &str) -> Option<Instance> {
        self.instances.read().get(abstraction).cloned()
    }

    pub fn contains(&self, abstraction: &str) -> bool {
        self.instances.read().contains_key(abstraction)
    }

    pub fn insert(&self, abstraction: impl Into<String>, instance: Instance) -> Option<Instance> {
        self.instances.write().insert(abstraction.into(), instance)
    }

    /// Stores `instance` unless another one was stored first, and returns
    /// the stored one.
    pub fn get_or_insert(&self, abstraction: &str, instance: Instance) -> Instance {
        let mut instances = self.instances.write();
        match instances.get(abstraction) {
            Some(existing) => existing.clone(),
            None => {
                instances.insert(abstraction.to_owned(), instance.clone());
                instance
            }
        }
    }

    pub fn remove(&self, abstraction: &str) -> Option<Instance> {
        self.instances.write().remove(abstraction)
    }

    pub fn len(&self) -> usize {
        self.instances.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
