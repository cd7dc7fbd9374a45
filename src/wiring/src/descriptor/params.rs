use std::any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::container::error::InjectorError;
use crate::container::{Instance, Managed};
use crate::descriptor::Interface;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamKey {
    Name(String),
    Index(usize),
}

impl From<&str> for ParamKey {
    fn from(name: &str) -> Self {
        Self::Name(name.to_owned())
    }
}

impl From<String> for ParamKey {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<usize> for ParamKey {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// Explicitly supplied arguments, keyed by parameter name or position.
///
/// ```rust
/// # use wiring::descriptor::Params;
/// let params = Params::new().with("host", "smtp.example.org").with(1usize, 2525u16);
/// let overridden = params.merge(&Params::new().with(1usize, 25u16));
/// assert_eq!(*overridden.get(1usize).unwrap().downcast::<u16>().unwrap(), 25);
/// assert!(overridden.get("host").is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Params {
    values: HashMap<ParamKey, Instance>,
}

impl Params {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with<T: Managed>(self, key: impl Into<ParamKey>, value: T) -> Self {
        self.with_instance(key, Instance::new(value))
    }

    pub fn with_instance(mut self, key: impl Into<ParamKey>, instance: Instance) -> Self {
        self.insert(key, instance);
        self
    }

    pub fn insert(&mut self, key: impl Into<ParamKey>, instance: Instance) -> Option<Instance> {
        self.values.insert(key.into(), instance)
    }

    pub fn get(&self, key: impl Into<ParamKey>) -> Option<&Instance> {
        self.values.get(&key.into())
    }

    /// Returns a copy of `self` overlaid with `other`, whose values win.
    pub fn merge(&self, other: &Params) -> Params {
        let mut values = self.values.clone();
        values.extend(other.values.iter().map(|(k, v)| (k.clone(), v.clone())));
        Params { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Resolved arguments for one constructor or function call, in parameter
/// order.
#[derive(Debug, Clone)]
pub struct Arguments {
    consumer: String,
    values: Vec<(String, Instance)>,
}

impl Arguments {
    pub fn new(consumer: impl Into<String>) -> Self {
        Self {
            consumer: consumer.into(),
            values: Vec::new(),
        }
    }

    pub fn with_capacity(consumer: impl Into<String>, capacity: usize) -> Self {
        Self {
            consumer: consumer.into(),
            values: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, parameter: impl Into<String>, instance: Instance) {
        self.values.push((parameter.into(), instance));
    }

    pub fn consumer(&self) -> &str {
        &self.consumer
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn instance(&self, position: usize) -> Result<Instance, InjectorError> {
        self.values
            .get(position)
            .map(|(_, instance)| instance.clone())
            .ok_or_else(|| self.mismatch(position, "an argument"))
    }

    pub fn object<T: Managed>(&self, position: usize) -> Result<Arc<T>, InjectorError> {
        self.instance(position)?
            .downcast::<T>()
            .ok_or_else(|| self.mismatch(position, any::type_name::<T>()))
    }

    pub fn interface<T>(&self, position: usize) -> Result<Arc<T>, InjectorError>
    where
        T: Interface + ?Sized,
    {
        self.instance(position)?
            .cast::<T>()
            .ok_or_else(|| self.mismatch(position, T::NAME))
    }

    pub fn value<T: Managed + Clone>(&self, position: usize) -> Result<T, InjectorError> {
        self.object::<T>(position).map(|value| T::clone(&value))
    }

    fn mismatch(&self, position: usize, expected: &'static str) -> InjectorError {
        let parameter = self
            .values
            .get(position)
            .map(|(name, _)| name.clone())
            .unwrap_or_else(|| format!("#{position}"));
        InjectorError::ArgumentMismatch {
            consumer: self.consumer.clone(),
            parameter,
            expected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_lookup_by_name_and_index_succeeds() {
        let params = Params::new()
            .with("host", String::from("localhost"))
            .with(0usize, 8080u16);

        assert_eq!(params.len(), 2);
        assert!(params.get("host").unwrap().is::<String>());
        assert!(params.get(0usize).unwrap().is::<u16>());
        assert!(params.get("port").is_none());
        assert!(params.get(1usize).is_none());
    }

    #[test]
    fn params_merge_prefers_other() {
        let outer = Params::new().with("host", "a").with("port", 1u16);
        let inner = Params::new().with("port", 2u16);
        let merged = outer.merge(&inner);

        assert_eq!(*merged.get("port").unwrap().downcast::<u16>().unwrap(), 2);
        assert_eq!(*merged.get("host").unwrap().downcast::<&str>().unwrap(), "a");
        assert_eq!(*outer.get("port").unwrap().downcast::<u16>().unwrap(), 1);
    }

    #[test]
    fn arguments_typed_access_succeeds() {
        let mut args = Arguments::new("Server");
        args.push("host", Instance::new(String::from("localhost")));
        args.push("port", Instance::new(8080u16));

        assert_eq!(args.consumer(), "Server");
        assert_eq!(args.value::<String>(0).unwrap(), "localhost");
        assert_eq!(*args.object::<u16>(1).unwrap(), 8080);
    }

    #[test]
    fn arguments_typed_access_fails_on_mismatch() {
        let mut args = Arguments::new("Server");
        args.push("port", Instance::new(8080u16));

        assert!(matches!(
            args.value::<u32>(0),
            Err(InjectorError::ArgumentMismatch { ref parameter, .. }) if parameter == "port"
        ));
        assert!(matches!(
            args.instance(3),
            Err(InjectorError::ArgumentMismatch { ref parameter, .. }) if parameter == "#3"
        ));
    }
}
