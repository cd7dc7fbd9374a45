use std::any;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::container::assembler::{Assembler, Wrapped};
use crate::container::binder::{Binder, Concrete, ContextualBinder};
use crate::container::error::InjectorError;
use crate::container::store::SharedInstanceStore;
use crate::container::{Instance, Managed};
use crate::descriptor::{Catalog, Constructible, Function, Interface, Params, TypeCatalog, TypeEntry};
use crate::module::Module;

struct InjectorCore {
    binder: Binder,
    store: SharedInstanceStore,
    catalog: Box<dyn Catalog>,
    assembler: Assembler,
}

/// A handle to a dependency injection container.
///
/// Cloning an [`Injector`] is cheap and every clone refers to the same
/// bindings, shared instances and catalog.
///
/// ```rust
/// # use std::convert::Infallible;
/// # use wiring::container::Injector;
/// # use wiring::container::binder::Concrete;
/// # use wiring::descriptor::{Params, TypeEntry};
/// struct Clock {
///     offset: i64,
/// }
///
/// let injector = Injector::new();
/// injector.register_entry(TypeEntry::new("Clock", Vec::new(), |_| {
///     Ok(Ok::<_, Infallible>(Clock { offset: 0 }))
/// }));
/// injector.singleton("clock", "Clock");
///
/// let first = injector.make("clock", Params::new()).unwrap();
/// let second = injector.make("clock", Params::new()).unwrap();
/// assert!(first.ptr_eq(&second));
/// assert!(injector.has("clock"));
/// ```
#[derive(Clone)]
pub struct Injector {
    core: Arc<InjectorCore>,
}

impl Injector {
    pub fn new() -> Self {
        Self::with_catalog(Box::new(TypeCatalog::new()))
    }

    pub fn with_catalog(catalog: Box<dyn Catalog>) -> Self {
        let core = InjectorCore {
            binder: Binder::new(),
            store: SharedInstanceStore::new(),
            catalog,
            assembler: Assembler::new(),
        };
        Self {
            core: Arc::new(core),
        }
    }

    /// Creates an injector configured by `module`.
    ///
    /// # Errors
    ///
    /// Returns the error reported by the module, which is
    /// [`InjectorError::Modules`] for a [`Configuration`](crate::module::Configuration).
    pub fn init<M: Module>(module: M) -> Result<Self, InjectorError> {
        let injector = Self::new();
        injector.install(module)?;
        Ok(injector)
    }

    /// Binds `abstraction` to `concrete` and evicts its shared instance, so
    /// the next request observes the new binding.
    pub fn bind(
        &self,
        abstraction: impl Into<String>,
        concrete: impl Into<Concrete>,
        shared: bool,
    ) -> &Self {
        let abstraction = abstraction.into();
        self.core.binder.bind(abstraction.clone(), concrete, shared);
        if self.core.store.remove(&abstraction).is_some() {
            tracing::debug!(abstraction, "evicted shared instance on rebind");
        }
        self
    }

    pub fn singleton(&self, abstraction: impl Into<String>, concrete: impl Into<Concrete>) -> &Self {
        self.bind(abstraction, concrete, true)
    }

    pub fn bind_all<I, A, C>(&self, bindings: I) -> &Self
    where
        I: IntoIterator<Item = (A, C, bool)>,
        A: Into<String>,
        C: Into<Concrete>,
    {
        for (abstraction, concrete, shared) in bindings {
            self.bind(abstraction, concrete, shared);
        }
        self
    }

    /// Removes the binding of `abstraction`, keeping any shared instance.
    pub fn unbind(&self, abstraction: &str) -> &Self {
        self.core.binder.unbind(abstraction);
        self
    }

    /// Removes both the binding and the shared instance of `abstraction`.
    #[allow(clippy::should_implement_trait)]
    pub fn drop(&self, abstraction: &str) -> &Self {
        self.core.binder.unbind(abstraction);
        if self.core.store.remove(abstraction).is_some() {
            tracing::debug!(abstraction, "dropped shared instance");
        }
        self
    }

    pub fn get(&self, abstraction: &str) -> Option<Instance> {
        self.core.store.get(abstraction)
    }

    pub fn has(&self, abstraction: &str) -> bool {
        self.core.store.contains(abstraction)
    }

    /// Stores `instance` as the shared instance of `abstraction` and removes
    /// its binding, so the instance is returned by every later request.
    pub fn set(&self, abstraction: impl Into<String>, instance: Instance) -> &Self {
        let abstraction = abstraction.into();
        tracing::debug!(abstraction, r#type = instance.type_name(), "setting shared instance");
        self.core.binder.unbind(&abstraction);
        self.core.store.insert(abstraction, instance);
        self
    }

    pub fn del(&self, abstraction: &str) -> Option<Instance> {
        self.core.store.remove(abstraction)
    }

    /// Returns a binder whose bindings apply only while `scope` is being
    /// constructed.
    pub fn when<'a>(&'a self, scope: &'a str) -> ContextualBinder<'a> {
        ContextualBinder::new(&self.core.binder, scope)
    }

    pub fn make(&self, abstraction: &str, params: Params) -> Result<Instance, InjectorError> {
        self.core
            .assembler
            .make(self, abstraction, &params)
            .inspect_err(|err| tracing::debug!(abstraction, error = %err, "failed to make"))
    }

    pub fn make_as<T: Managed>(&self, abstraction: &str, params: Params) -> Result<Arc<T>, InjectorError> {
        self.make(abstraction, params)?
            .downcast::<T>()
            .ok_or_else(|| InjectorError::TypeMismatch {
                name: abstraction.to_owned(),
                expected: any::type_name::<T>(),
            })
    }

    pub fn make_interface<T>(&self, abstraction: &str, params: Params) -> Result<Arc<T>, InjectorError>
    where
        T: Interface + ?Sized,
    {
        self.make(abstraction, params)?
            .cast::<T>()
            .ok_or_else(|| InjectorError::TypeMismatch {
                name: abstraction.to_owned(),
                expected: T::NAME,
            })
    }

    /// Returns a closure making `abstraction` with `outer` overlaid by the
    /// arguments of each call.
    pub fn factory(
        &self,
        abstraction: impl Into<String>,
        outer: Params,
    ) -> impl Fn(Params) -> Result<Instance, InjectorError> + Send + Sync + 'static {
        let injector = self.clone();
        let abstraction = abstraction.into();
        move |inner: Params| injector.make(&abstraction, outer.merge(&inner))
    }

    pub fn call(&self, function: Function, params: Params) -> Result<Instance, InjectorError> {
        self.wrap(function, params)?.call(Params::new())
    }

    pub fn wrap(&self, function: Function, params: Params) -> Result<Wrapped, InjectorError> {
        self.core.assembler.wrap(self, function, params)
    }

    pub fn register<T: Constructible>(&self) -> &Self {
        self.register_entry(TypeEntry::of::<T>())
    }

    pub fn register_interface<T: Interface + ?Sized>(&self) -> &Self {
        self.register_entry(TypeEntry::interface::<T>())
    }

    pub fn register_entry(&self, entry: TypeEntry) -> &Self {
        self.core.catalog.register(entry);
        self
    }

    /// Applies the bindings of `module`.
    ///
    /// # Errors
    ///
    /// Returns [`InjectorError::Module`] if the module fails to configure the
    /// injector.
    pub fn install<M: Module>(&self, module: M) -> Result<(), InjectorError> {
        module.setup(self)
    }

    pub fn binder(&self) -> &Binder {
        &self.core.binder
    }

    pub fn store(&self) -> &SharedInstanceStore {
        &self.core.store
    }

    pub fn catalog(&self) -> &dyn Catalog {
        self.core.catalog.as_ref()
    }

    pub fn assembler(&self) -> &Assembler {
        &self.core.assembler
    }
}

impl Default for Injector {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Injector {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Injector")
            .field("bindings", &self.core.binder.bindings())
            .field("shared", &self.core.store.len())
            .finish_non_exhaustive()
    }
}
