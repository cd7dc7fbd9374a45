pub mod assembler;
pub mod binder;
pub mod error;
pub mod store;

mod injector;

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::descriptor::Interface;
use crate::util::any::{AsAny, DowncastArc};

pub use injector::Injector;

pub trait Managed: AsAny {}

impl<T> Managed for T where T: AsAny {}

/// A type-erased handle to an object produced by an [`Injector`].
///
/// Cloning an [`Instance`] never clones the underlying object, so two handles
/// obtained from the same shared binding are [`Instance::ptr_eq`].
#[derive(Clone)]
pub struct Instance {
    object: Arc<dyn Managed>,
}

impl Instance {
    pub fn new<T: Managed>(object: T) -> Self {
        Self {
            object: Arc::new(object),
        }
    }

    pub fn from_arc<T: Managed>(object: Arc<T>) -> Self {
        Self { object }
    }

    /// Returns the object as `Arc<T>`.
    ///
    /// An instance built from an `Arc<T>` value with [`Instance::new`] is
    /// flattened, so both `Instance::new(Arc::new(x))` and
    /// `Instance::from_arc(Arc::new(x))` downcast to `Arc<T>`.
    pub fn downcast<T: Managed>(&self) -> Option<Arc<T>> {
        let object = Arc::clone(&self.object);
        match object.downcast_arc::<T>() {
            Ok(object) => Some(object),
            Err(object) => object
                .downcast_arc::<Arc<T>>()
                .ok()
                .map(|object| Arc::clone(&*object)),
        }
    }

    /// Returns the object as a trait object declared with
    /// [`interface!`](crate::interface).
    pub fn cast<T>(&self) -> Option<Arc<T>>
    where
        T: Interface + ?Sized,
    {
        T::cast(self)
    }

    pub fn is<T: Managed>(&self) -> bool {
        self.object.is::<T>() || self.object.is::<Arc<T>>()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.object, &other.object)
    }

    pub fn type_name(&self) -> &'static str {
        (*self.object).type_name()
    }
}

impl Debug for Instance {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Instance")
            .field("type", &self.type_name())
            .finish_non_exhaustive()
    }
}
