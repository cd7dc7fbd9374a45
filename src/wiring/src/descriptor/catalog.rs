use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::container::error::InjectorError;
use crate::container::{Instance, Managed};
use crate::descriptor::{Arguments, Constructible, Interface, Parameter};

/// The registry of constructible types and their parameter descriptors.
#[cfg_attr(test, mockall::automock)]
pub trait Catalog: Send + Sync {
    fn lookup(&self, name: &str) -> Option<Arc<TypeEntry>>;

    fn register(&self, entry: TypeEntry);
}

type Constructor = dyn Fn(&Arguments) -> Result<Instance, InjectorError> + Send + Sync;

/// Everything the assembler needs to know to build one named type.
#[derive(Clone)]
pub struct TypeEntry {
    name: String,
    parameters: Vec<Parameter>,
    constructor: Option<Arc<Constructor>>,
}

impl TypeEntry {
    pub fn of<T: Constructible>() -> Self {
        Self::new(T::NAME, T::parameters(), T::construct)
    }

    /// Creates an entry for a type built by `constructor` from arguments
    /// resolved against `parameters`.
    pub fn new<F, T, E>(name: impl Into<String>, parameters: Vec<Parameter>, constructor: F) -> Self
    where
        F: Fn(&Arguments) -> Result<Result<T, E>, InjectorError> + Send + Sync + 'static,
        T: Managed,
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        let name = name.into();
        let constructor = {
            let name = name.clone();
            move |args: &Arguments| -> Result<Instance, InjectorError> {
                match constructor(args)? {
                    Ok(object) => Ok(Instance::new(object)),
                    Err(err) => Err(InjectorError::construction(name.as_str(), err)),
                }
            }
        };
        Self {
            name,
            parameters,
            constructor: Some(Arc::new(constructor)),
        }
    }

    /// Creates an entry for a name that exists but can't be instantiated,
    /// such as an interface.
    pub fn abstraction(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            constructor: None,
        }
    }

    pub fn interface<T: Interface + ?Sized>() -> Self {
        Self::abstraction(T::NAME)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn is_instantiable(&self) -> bool {
        self.constructor.is_some()
    }

    /// Invokes the constructor with resolved arguments.
    ///
    /// # Errors
    ///
    /// Returns [`InjectorError::UninstantiableAbstraction`] for abstractions
    /// and any error raised by the constructor.
    pub fn construct(&self, args: &Arguments) -> Result<Instance, InjectorError> {
        match &self.constructor {
            Some(constructor) => constructor(args),
            None => Err(InjectorError::UninstantiableAbstraction {
                name: self.name.clone(),
            }),
        }
    }
}

impl Debug for TypeEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("TypeEntry")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("instantiable", &self.is_instantiable())
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct TypeCatalog {
    entries: RwLock<HashMap<String, Arc<TypeEntry>>>,
}

impl TypeCatalog {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Catalog for TypeCatalog {
    fn lookup(&self, name: &str) -> Option<Arc<TypeEntry>> {
        self.entries.read().get(name).cloned()
    }

    fn register(&self, entry: TypeEntry) {
        tracing::trace!(name = entry.name(), "registering constructible type");
        self.entries
            .write()
            .insert(entry.name.clone(), Arc::new(entry));
    }
}
