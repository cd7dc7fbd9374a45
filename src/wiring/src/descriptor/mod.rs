//! Descriptions of what the injector can construct and call.
//!
//! The assembler never inspects Rust types directly. Everything it needs to
//! know about a constructor or a function, namely the names, kinds and
//! defaults of its parameters, comes from the descriptors in this module,
//! which are either written by hand or generated by the
//! [`component`](crate::component) macro.

mod catalog;
mod function;
mod params;

use std::error::Error;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::container::error::InjectorError;
use crate::container::{Instance, Managed};

pub use catalog::{Catalog, TypeCatalog, TypeEntry};
pub use function::Function;
pub use params::{Arguments, ParamKey, Params};

#[cfg(test)]
pub use catalog::MockCatalog;

/// The prefix of bindings which provide scalar parameters by name.
pub const SCALAR_PREFIX: char = '$';

/// Returns the abstraction name holding the scalar parameter `parameter`,
/// e.g. `$timeout` for `timeout`.
pub fn scalar_name(parameter: &str) -> String {
    format!("{SCALAR_PREFIX}{parameter}")
}

/// How a parameter is resolved when no explicit argument is supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamKind {
    /// Resolved by constructing the named abstraction.
    Object(String),
    /// Resolved through the `$name` binding of the parameter.
    Scalar,
}

#[derive(Clone)]
pub struct DefaultValue {
    produce: Arc<dyn Fn() -> Instance + Send + Sync>,
}

impl DefaultValue {
    pub fn new<F, T>(produce: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
        T: Managed,
    {
        Self {
            produce: Arc::new(move || Instance::new(produce())),
        }
    }

    pub fn produce(&self) -> Instance {
        (self.produce)()
    }
}

impl Debug for DefaultValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("DefaultValue").finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct Parameter {
    name: String,
    kind: ParamKind,
    default: Option<DefaultValue>,
}

impl Parameter {
    pub fn object(name: impl Into<String>, abstraction: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::Object(abstraction.into()),
            default: None,
        }
    }

    pub fn scalar(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::Scalar,
            default: None,
        }
    }

    pub fn with_default<F, T>(mut self, produce: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
        T: Managed,
    {
        self.default = Some(DefaultValue::new(produce));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &ParamKind {
        &self.kind
    }

    pub fn default(&self) -> Option<&DefaultValue> {
        self.default.as_ref()
    }
}

/// A type the injector can build from its parameter descriptors.
///
/// Usually the [`component`](crate::component) macro implements this trait
/// from an `#[inject]` constructor. A hand-written implementation looks like:
///
/// ```rust
/// # use std::convert::Infallible;
/// # use std::sync::Arc;
/// # use wiring::container::error::InjectorError;
/// # use wiring::descriptor::{Arguments, Constructible, Parameter};
/// struct Clock;
///
/// struct Scheduler {
///     clock: Arc<Clock>,
///     workers: usize,
/// }
///
/// impl Constructible for Scheduler {
///     const NAME: &'static str = "Scheduler";
///
///     type Error = Infallible;
///
///     fn parameters() -> Vec<Parameter> {
///         vec![
///             Parameter::object("clock", "Clock"),
///             Parameter::scalar("workers").with_default(|| 4usize),
///         ]
///     }
///
///     fn construct(args: &Arguments) -> Result<Result<Self, Self::Error>, InjectorError> {
///         Ok(Ok(Self {
///             clock: args.object(0)?,
///             workers: args.value(1)?,
///         }))
///     }
/// }
/// ```
pub trait Constructible: Managed + Sized {
    /// The name this type is registered and requested under.
    const NAME: &'static str;

    /// The error occurred in object construction after all arguments are
    /// resolved.
    type Error: Into<Box<dyn Error + Send + Sync>>;

    fn parameters() -> Vec<Parameter>;

    /// Builds the object from resolved arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if an argument has an unexpected type.
    ///
    /// Returns an inner error [`Constructible::Error`] wrapped in the outer
    /// [`Ok`] if the object construction fails.
    fn construct(args: &Arguments) -> Result<Result<Self, Self::Error>, InjectorError>;
}

/// A trait object type which instances can be viewed as. Implemented by the
/// [`interface!`](crate::interface) macro.
pub trait Interface: 'static {
    const NAME: &'static str;

    fn cast(instance: &Instance) -> Option<Arc<Self>>;
}

/// Declares a trait as an abstraction and lists the types implementing it.
///
/// ```rust
/// # use std::sync::Arc;
/// # use wiring::container::Instance;
/// # use wiring::interface;
/// trait Transport: Send + Sync {
///     fn send(&self) -> &'static str;
/// }
///
/// struct Smtp;
///
/// impl Transport for Smtp {
///     fn send(&self) -> &'static str {
///         "smtp"
///     }
/// }
///
/// interface!(Transport = [Smtp]);
///
/// let instance = Instance::new(Smtp);
/// assert_eq!(instance.cast::<dyn Transport>().unwrap().send(), "smtp");
/// ```
#[macro_export]
macro_rules! interface {
    ($name:ident = [$($implementation:ty),* $(,)?]) => {
        impl $crate::descriptor::Interface for dyn $name {
            const NAME: &'static str = stringify!($name);

            fn cast(
                instance: &$crate::container::Instance,
            ) -> ::std::option::Option<::std::sync::Arc<Self>> {
                $(
                    if let ::std::option::Option::Some(object) =
                        instance.downcast::<$implementation>()
                    {
                        let object: ::std::sync::Arc<Self> = object;
                        return ::std::option::Option::Some(object);
                    }
                )*
                instance
                    .downcast::<::std::sync::Arc<Self>>()
                    .map(|object| ::std::sync::Arc::clone(&*object))
            }
        }
    };
}
