use std::error::Error;
use std::sync::Arc;

use crate::container::error::InjectorError;
use crate::container::Injector;

/// A unit of binding configuration.
///
/// ```rust
/// # use std::error::Error;
/// # use wiring::container::Injector;
/// # use wiring::container::binder::Concrete;
/// # use wiring::module::Module;
/// struct DatabaseModule {
///     url: &'static str,
/// }
///
/// impl Module for DatabaseModule {
///     fn configure(&self, injector: &Injector) -> Result<(), Box<dyn Error + Send + Sync>> {
///         if self.url.is_empty() {
///             return Err("database url is empty".into());
///         }
///         injector.bind("$url", Concrete::value(self.url), false);
///         Ok(())
///     }
/// }
///
/// let injector = Injector::init(DatabaseModule { url: "postgres://localhost" }).unwrap();
/// assert!(injector.binder().knows("$url"));
/// assert!(Injector::init(DatabaseModule { url: "" }).is_err());
/// ```
pub trait Module: 'static {
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    fn setup(&self, injector: &Injector) -> Result<(), InjectorError> {
        self.configure(injector)
            .map_err(|source| InjectorError::Module {
                module: self.name(),
                source: Arc::from(source),
            })
    }

    fn configure(&self, injector: &Injector) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// Modules applied in order. Every module is applied even if an earlier one
/// fails, and all failures are reported together.
#[derive(Default)]
pub struct Configuration {
    modules: Vec<Box<dyn Module>>,
}

impl Configuration {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with<M: Module>(mut self, module: M) -> Self {
        self.modules.push(Box::new(module));
        self
    }

    pub fn compose(mut self, mut other: Configuration) -> Self {
        self.modules.append(&mut other.modules);
        self
    }
}

impl Module for Configuration {
    fn setup(&self, injector: &Injector) -> Result<(), InjectorError> {
        let mut errors = Vec::new();
        for module in &self.modules {
            match module.setup(injector) {
                Ok(()) => {}
                Err(InjectorError::Modules { errors: inner }) => errors.extend(inner),
                Err(err) => errors.push(err),
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            tracing::debug!(failed = errors.len(), "modules failed to configure the injector");
            Err(InjectorError::Modules { errors })
        }
    }

    fn configure(&self, injector: &Injector) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.setup(injector).map_err(Into::into)
    }
}
