mod contextual;

use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::container::error::InjectorError;
use crate::container::{Injector, Instance, Managed};
use crate::descriptor::Params;

pub use contextual::{ContextualBinder, SCOPE_SEPARATOR};

/// Looks up the binding an abstraction resolves to.
///
/// The assembler picks a [`Binder`] when nothing is being constructed and a
/// [`ContextualBinder`] scoped to the current consumer otherwise.
pub trait Resolver {
    fn resolve_binding(&self, abstraction: &str) -> Result<Option<Resolution>, InjectorError>;
}

/// A binding found by a [`Resolver`], tagged with whether it came from a
/// contextual override.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub binding: Binding,
    pub contextual: bool,
}

#[derive(Debug, Clone)]
pub struct Binding {
    abstraction: String,
    scope: Option<String>,
    concrete: Concrete,
    shared: bool,
}

impl Binding {
    pub fn new(abstraction: impl Into<String>, concrete: impl Into<Concrete>, shared: bool) -> Self {
        Self {
            abstraction: abstraction.into(),
            scope: None,
            concrete: concrete.into(),
            shared,
        }
    }

    /// Creates a binding which applies only while `scope` is being
    /// constructed, keyed as `abstraction@scope`.
    pub fn scoped(
        abstraction: &str,
        scope: &str,
        concrete: impl Into<Concrete>,
        shared: bool,
    ) -> Self {
        Self {
            abstraction: format!("{abstraction}{SCOPE_SEPARATOR}{scope}"),
            scope: Some(scope.to_owned()),
            concrete: concrete.into(),
            shared,
        }
    }

    pub fn abstraction(&self) -> &str {
        &self.abstraction
    }

    /// Returns the abstraction without the scope of a contextual binding.
    pub fn name(&self) -> &str {
        self.scope
            .as_deref()
            .and_then(|scope| self.abstraction.strip_suffix(scope))
            .and_then(|name| name.strip_suffix(SCOPE_SEPARATOR))
            .unwrap_or(&self.abstraction)
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    pub fn concrete(&self) -> &Concrete {
        &self.concrete
    }

    pub fn is_shared(&self) -> bool {
        self.shared
    }

    /// Returns the abstraction name this binding forwards to, if any.
    fn alias(&self) -> Option<&str> {
        match &self.concrete {
            Concrete::Type(name) if name != self.name() => Some(name),
            _ => None,
        }
    }
}

/// What an abstraction is bound to.
#[derive(Debug, Clone)]
pub enum Concrete {
    /// A constructible type name or another abstraction.
    Type(String),
    /// A closure invoked on every request.
    Factory(Factory),
    /// A ready-made object returned as is.
    Value(Instance),
}

impl Concrete {
    pub fn factory<F, T, E>(factory: F) -> Self
    where
        F: Fn(&Injector, &Params) -> Result<Result<T, E>, InjectorError>,
        F: Send + Sync + 'static,
        T: Managed,
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        Self::Factory(Factory::new(factory))
    }

    pub fn value<T: Managed>(value: T) -> Self {
        Self::Value(Instance::new(value))
    }
}

impl From<&str> for Concrete {
    fn from(name: &str) -> Self {
        Self::Type(name.to_owned())
    }
}

impl From<String> for Concrete {
    fn from(name: String) -> Self {
        Self::Type(name)
    }
}

impl From<Instance> for Concrete {
    fn from(instance: Instance) -> Self {
        Self::Value(instance)
    }
}

impl From<Factory> for Concrete {
    fn from(factory: Factory) -> Self {
        Self::Factory(factory)
    }
}

type FactoryFn = dyn Fn(&Injector, &Params) -> Result<Instance, InjectorError> + Send + Sync;

#[derive(Clone)]
pub struct Factory {
    inner: Arc<FactoryFn>,
}

impl Factory {
    /// Wraps a closure returning `Ok(Err(_))` when the object itself fails to
    /// build and `Err(_)` when one of its dependencies can't be resolved.
    pub fn new<F, T, E>(factory: F) -> Self
    where
        F: Fn(&Injector, &Params) -> Result<Result<T, E>, InjectorError>,
        F: Send + Sync + 'static,
        T: Managed,
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        let inner = move |injector: &Injector, params: &Params| -> Result<Instance, InjectorError> {
            match factory(injector, params)? {
                Ok(object) => Ok(Instance::new(object)),
                Err(err) => Err(InjectorError::construction(std::any::type_name::<T>(), err)),
            }
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    pub fn invoke(&self, injector: &Injector, params: &Params) -> Result<Instance, InjectorError> {
        (self.inner)(injector, params)
    }
}

impl Debug for Factory {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Factory").finish_non_exhaustive()
    }
}

/// Stores abstraction-to-concrete bindings, including contextual ones under
/// their composite `abstraction@scope` keys.
#[derive(Debug, Default)]
pub struct Binder {
    bindings: RwLock<HashMap<String, Binding>>,
}

impl Binder {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn bind(&self, abstraction: impl Into<String>, concrete: impl Into<Concrete>, shared: bool) {
        self.insert(Binding::new(abstraction, concrete, shared));
    }

    pub fn unbind(&self, abstraction: &str) {
        if self.bindings.write().remove(abstraction).is_some() {
            tracing::debug!(abstraction, "removed binding");
        }
    }

    pub fn knows(&self, abstraction: &str) -> bool {
        self.bindings.read().contains_key(abstraction)
    }

    pub fn get(&self, abstraction: &str) -> Option<Binding> {
        self.bindings.read().get(abstraction).cloned()
    }

    /// Follows alias bindings from `abstraction` until reaching one whose
    /// concrete value is not another bound abstraction.
    ///
    /// # Errors
    ///
    /// Returns [`InjectorError::CyclicBinding`] if the chain revisits an
    /// abstraction.
    pub fn resolve(&self, abstraction: &str) -> Result<Option<Binding>, InjectorError> {
        let Some(binding) = self.get(abstraction) else {
            return Ok(None);
        };
        chase_aliases(binding, |name| self.get(name).map(|b| (b, false))).map(|res| Some(res.0))
    }

    pub fn bindings(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.bindings.read().keys().cloned().collect();
        keys.sort_unstable();
        keys
    }

    pub(crate) fn insert(&self, binding: Binding) -> Option<Binding> {
        tracing::debug!(
            abstraction = %binding.abstraction,
            scope = binding.scope.as_deref(),
            shared = binding.shared,
            "registering binding"
        );
        let key = binding.abstraction.clone();
        self.bindings.write().insert(key, binding)
    }
}

impl Resolver for Binder {
    fn resolve_binding(&self, abstraction: &str) -> Result<Option<Resolution>, InjectorError> {
        self.resolve(abstraction).map(|binding| {
            binding.map(|binding| Resolution {
                binding,
                contextual: false,
            })
        })
    }
}

/// Walks the alias chain starting at `binding`, looking each hop up with
/// `lookup`. The returned flag is set when any hop was found through a
/// contextual key.
fn chase_aliases<L>(binding: Binding, lookup: L) -> Result<(Binding, bool), InjectorError>
where
    L: Fn(&str) -> Option<(Binding, bool)>,
{
    let mut visited = HashSet::from([binding.abstraction.clone()]);
    let mut chain = vec![binding.abstraction.clone()];
    let mut current = binding;
    let mut contextual = false;

    while let Some(next) = current.alias().and_then(|name| lookup(name)) {
        let (next, scoped) = next;
        chain.push(next.abstraction.clone());
        if !visited.insert(next.abstraction.clone()) {
            return Err(InjectorError::CyclicBinding { chain });
        }
        contextual |= scoped;
        current = next;
    }
    Ok((current, contextual))
}
