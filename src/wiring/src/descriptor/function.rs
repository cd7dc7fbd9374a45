use std::error::Error;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::container::error::InjectorError;
use crate::container::{Instance, Managed};
use crate::descriptor::{Arguments, Parameter};

type Body = dyn Fn(Option<&Instance>, &Arguments) -> Result<Instance, InjectorError> + Send + Sync;

#[derive(Clone)]
enum Receiver {
    None,
    Unbound { type_name: &'static str },
    Bound(Instance),
}

/// A callable whose parameters the injector resolves, either a free function
/// or a method which needs a receiver before it can be called.
///
/// ```rust
/// # use std::convert::Infallible;
/// # use wiring::container::Instance;
/// # use wiring::descriptor::{Function, Parameter};
/// struct Greeter {
///     greeting: &'static str,
/// }
///
/// let greet = Function::method(
///     "Greeter::greet",
///     vec![Parameter::scalar("name")],
///     |greeter: &Greeter, args| {
///         let name: String = args.value(0)?;
///         Ok(Ok::<_, Infallible>(format!("{}, {name}!", greeter.greeting)))
///     },
/// );
/// assert!(!greet.is_callable());
///
/// let greet = greet.bind_receiver(Instance::new(Greeter { greeting: "Hello" }));
/// assert!(greet.is_callable());
/// ```
#[derive(Clone)]
pub struct Function {
    name: String,
    parameters: Vec<Parameter>,
    receiver: Receiver,
    body: Arc<Body>,
}

impl Function {
    pub fn new<F, T, E>(name: impl Into<String>, parameters: Vec<Parameter>, body: F) -> Self
    where
        F: Fn(&Arguments) -> Result<Result<T, E>, InjectorError> + Send + Sync + 'static,
        T: Managed,
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        let name = name.into();
        let body = {
            let name = name.clone();
            move |_: Option<&Instance>, args: &Arguments| finish(&name, body(args))
        };
        Self {
            name,
            parameters,
            receiver: Receiver::None,
            body: Arc::new(body),
        }
    }

    /// Creates a method of `R`. The method can only be called after a
    /// receiver is attached with [`Function::bind_receiver`].
    pub fn method<R, F, T, E>(name: impl Into<String>, parameters: Vec<Parameter>, body: F) -> Self
    where
        R: Managed,
        F: Fn(&R, &Arguments) -> Result<Result<T, E>, InjectorError> + Send + Sync + 'static,
        T: Managed,
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        let name = name.into();
        let body = {
            let name = name.clone();
            move |receiver: Option<&Instance>, args: &Arguments| -> Result<Instance, InjectorError> {
                let receiver = receiver
                    .and_then(Instance::downcast::<R>)
                    .ok_or_else(|| InjectorError::MissingReceiver {
                        function: name.clone(),
                    })?;
                finish(&name, body(&receiver, args))
            }
        };
        Self {
            name,
            parameters,
            receiver: Receiver::Unbound {
                type_name: std::any::type_name::<R>(),
            },
            body: Arc::new(body),
        }
    }

    pub fn bind_receiver(mut self, receiver: Instance) -> Self {
        if !matches!(self.receiver, Receiver::None) {
            self.receiver = Receiver::Bound(receiver);
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Returns false for methods without a receiver.
    pub fn is_callable(&self) -> bool {
        !matches!(self.receiver, Receiver::Unbound { .. })
    }

    pub fn invoke(&self, args: &Arguments) -> Result<Instance, InjectorError> {
        match &self.receiver {
            Receiver::None => (self.body)(None, args),
            Receiver::Bound(receiver) => (self.body)(Some(receiver), args),
            Receiver::Unbound { .. } => Err(InjectorError::MissingReceiver {
                function: self.name.clone(),
            }),
        }
    }
}

fn finish<T, E>(name: &str, res: Result<Result<T, E>, InjectorError>) -> Result<Instance, InjectorError>
where
    T: Managed,
    E: Into<Box<dyn Error + Send + Sync>>,
{
    match res? {
        Ok(output) => Ok(Instance::new(output)),
        Err(err) => Err(InjectorError::construction(name, err)),
    }
}

impl Debug for Function {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let receiver = match &self.receiver {
            Receiver::None => "none",
            Receiver::Unbound { type_name } => type_name,
            Receiver::Bound(instance) => instance.type_name(),
        };
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("receiver", &receiver)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use super::*;

    struct Counter {
        step: u32,
    }

    fn add_function() -> Function {
        Function::new(
            "add",
            vec![Parameter::scalar("a"), Parameter::scalar("b")],
            |args| {
                let a: u32 = args.value(0)?;
                let b: u32 = args.value(1)?;
                Ok(Ok::<_, Infallible>(a + b))
            },
        )
    }

    fn step_method() -> Function {
        Function::method(
            "Counter::step",
            vec![Parameter::scalar("from")],
            |counter: &Counter, args| {
                let from: u32 = args.value(0)?;
                Ok(Ok::<_, Infallible>(from + counter.step))
            },
        )
    }

    #[test]
    fn function_invoke_succeeds() {
        let add = add_function();
        let mut args = Arguments::new("add");
        args.push("a", Instance::new(1u32));
        args.push("b", Instance::new(2u32));

        assert!(add.is_callable());
        assert_eq!(*add.invoke(&args).unwrap().downcast::<u32>().unwrap(), 3);
    }

    #[test]
    fn method_invoke_fails_without_receiver() {
        let step = step_method();
        let mut args = Arguments::new("Counter::step");
        args.push("from", Instance::new(1u32));

        assert!(!step.is_callable());
        assert!(matches!(
            step.invoke(&args),
            Err(InjectorError::MissingReceiver { ref function }) if function == "Counter::step"
        ));
    }

    #[test]
    fn method_invoke_succeeds_with_receiver() {
        let step = step_method().bind_receiver(Instance::new(Counter { step: 5 }));
        let mut args = Arguments::new("Counter::step");
        args.push("from", Instance::new(1u32));

        assert_eq!(*step.invoke(&args).unwrap().downcast::<u32>().unwrap(), 6);
    }

    #[test]
    fn method_invoke_fails_with_wrong_receiver() {
        let step = step_method().bind_receiver(Instance::new(0u8));
        let mut args = Arguments::new("Counter::step");
        args.push("from", Instance::new(1u32));

        assert!(matches!(
            step.invoke(&args),
            Err(InjectorError::MissingReceiver { .. })
        ));
    }

    #[test]
    fn free_function_ignores_receiver() {
        let add = add_function().bind_receiver(Instance::new(Counter { step: 1 }));
        assert!(format!("{add:?}").contains("receiver: \"none\""));
    }
}
