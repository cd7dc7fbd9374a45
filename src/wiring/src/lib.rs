#![allow(clippy::new_without_default)]

pub mod container;
pub mod descriptor;
pub mod module;
mod util;

pub use wiring_derive::component;

pub mod prelude {
    pub use crate::component;
    pub use crate::container::assembler::Wrapped;
    pub use crate::container::binder::{Concrete, ContextualBinder};
    pub use crate::container::error::InjectorError;
    pub use crate::container::{Injector, Instance};
    pub use crate::descriptor::{
        Arguments, Constructible, Function, Interface, Parameter, Params, TypeEntry,
    };
    pub use crate::interface;
    pub use crate::module::{Configuration, Module};
}
