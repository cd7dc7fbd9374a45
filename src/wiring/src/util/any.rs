use std::any::{self, Any};
use std::sync::Arc;

pub trait AsAny: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;

    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;

    fn type_name(&self) -> &'static str;
}

impl<T: Any + Send + Sync> AsAny for T {
    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline]
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    #[inline]
    fn type_name(&self) -> &'static str {
        any::type_name::<T>()
    }
}

pub trait DowncastArc: Sized {
    fn is<T: Any>(&self) -> bool;

    fn downcast_arc<T: Any + Send + Sync>(self) -> Result<Arc<T>, Self>;
}

impl<S> DowncastArc for Arc<S>
where
    S: AsAny + ?Sized,
{
    #[inline]
    fn is<T: Any>(&self) -> bool {
        (**self).as_any().is::<T>()
    }

    fn downcast_arc<T: Any + Send + Sync>(self) -> Result<Arc<T>, Self> {
        if self.is::<T>() {
            let res = self
                .into_any_arc()
                .downcast::<T>()
                .unwrap_or_else(|_| std::unreachable!("`self` should be `Arc<T>`"));
            Ok(res)
        } else {
            Err(self)
        }
    }
}
