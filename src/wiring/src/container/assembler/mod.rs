//! The resolution algorithm behind [`Injector::make`] and [`Injector::wrap`].

mod stack;

use std::fmt::{Debug, Formatter, Result as FmtResult};

use crate::container::binder::{Concrete, ContextualBinder, Resolution, Resolver};
use crate::container::error::InjectorError;
use crate::container::{Injector, Instance};
use crate::descriptor::{self, Arguments, DefaultValue, Function, ParamKind, Parameter, Params};

pub use stack::{ConstructionStack, StackGuard};

#[derive(Debug, Default)]
pub struct Assembler {
    stack: ConstructionStack,
}

impl Assembler {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn stack(&self) -> &ConstructionStack {
        &self.stack
    }

    /// Resolves `abstraction` to an instance, constructing it and all of its
    /// dependencies when needed.
    ///
    /// Bindings are looked up in the context of the consumer on top of the
    /// construction stack, if any. Only global shared bindings go through the
    /// shared instance store, keyed by `abstraction` as requested.
    pub fn make(
        &self,
        injector: &Injector,
        abstraction: &str,
        params: &Params,
    ) -> Result<Instance, InjectorError> {
        let Some(Resolution {
            binding,
            contextual,
        }) = self.resolve_binding(injector, abstraction)?
        else {
            if let Some(instance) = injector.store().get(abstraction) {
                return Ok(instance);
            }
            return self.construct(injector, abstraction, params);
        };

        let shared = binding.is_shared() && !contextual;
        if shared {
            if let Some(instance) = injector.store().get(abstraction) {
                return Ok(instance);
            }
        }

        let instance = match binding.concrete() {
            Concrete::Value(value) => return Ok(value.clone()),
            Concrete::Factory(factory) => factory.invoke(injector, params)?,
            Concrete::Type(name) if name == binding.name() => {
                self.construct(injector, name, params)?
            }
            Concrete::Type(name) => self.make(injector, name, params)?,
        };

        if shared {
            return Ok(injector.store().get_or_insert(abstraction, instance));
        }
        Ok(instance)
    }

    /// Returns a callable which resolves the parameters of `function` when
    /// called, with `params` as explicit arguments.
    ///
    /// # Errors
    ///
    /// Returns [`InjectorError::MissingReceiver`] if `function` is a method
    /// without a receiver.
    pub fn wrap(
        &self,
        injector: &Injector,
        function: Function,
        params: Params,
    ) -> Result<Wrapped, InjectorError> {
        if !function.is_callable() {
            tracing::debug!(function = function.name(), "refusing to wrap a method without receiver");
            return Err(InjectorError::MissingReceiver {
                function: function.name().to_owned(),
            });
        }
        Ok(Wrapped {
            injector: injector.clone(),
            function,
            params,
        })
    }

    fn invoke(
        &self,
        injector: &Injector,
        function: &Function,
        params: &Params,
    ) -> Result<Instance, InjectorError> {
        tracing::trace!(function = function.name(), "calling function");
        let _guard = self.stack.enter(function.name());
        let args = self.resolve_parameters(injector, function.name(), function.parameters(), params)?;
        function.invoke(&args)
    }

    fn construct(
        &self,
        injector: &Injector,
        name: &str,
        params: &Params,
    ) -> Result<Instance, InjectorError> {
        let entry = injector
            .catalog()
            .lookup(name)
            .ok_or_else(|| InjectorError::UnknownType {
                name: name.to_owned(),
            })?;
        if !entry.is_instantiable() {
            return Err(InjectorError::UninstantiableAbstraction {
                name: name.to_owned(),
            });
        }
        if self.stack.contains(name) {
            let mut path = self.stack.path();
            path.push(name.to_owned());
            tracing::debug!(name, ?path, "detected cyclic dependency");
            return Err(InjectorError::CyclicDependency {
                name: name.to_owned(),
                path,
            });
        }

        tracing::trace!(name, depth = self.stack.depth(), "constructing object");
        let _guard = self.stack.enter(name);
        let args = self.resolve_parameters(injector, name, entry.parameters(), params)?;
        entry.construct(&args)
    }

    fn resolve_parameters(
        &self,
        injector: &Injector,
        consumer: &str,
        parameters: &[Parameter],
        params: &Params,
    ) -> Result<Arguments, InjectorError> {
        let mut args = Arguments::with_capacity(consumer, parameters.len());
        for (position, parameter) in parameters.iter().enumerate() {
            let explicit = params
                .get(parameter.name())
                .or_else(|| params.get(position));
            let instance = match explicit {
                Some(instance) => instance.clone(),
                None => self.resolve_parameter(injector, consumer, parameter)?,
            };
            args.push(parameter.name(), instance);
        }
        Ok(args)
    }

    fn resolve_parameter(
        &self,
        injector: &Injector,
        consumer: &str,
        parameter: &Parameter,
    ) -> Result<Instance, InjectorError> {
        match parameter.kind() {
            ParamKind::Object(abstraction) => {
                match self.make(injector, abstraction, &Params::new()) {
                    Ok(instance) => Ok(instance),
                    Err(err) => match parameter.default() {
                        Some(default) => {
                            tracing::debug!(
                                consumer,
                                parameter = parameter.name(),
                                error = %err,
                                "falling back to default value"
                            );
                            Ok(default.produce())
                        }
                        None => Err(Self::unresolvable(consumer, parameter, abstraction, err)),
                    },
                }
            }
            ParamKind::Scalar => self.resolve_scalar(injector, consumer, parameter),
        }
    }

    fn resolve_scalar(
        &self,
        injector: &Injector,
        consumer: &str,
        parameter: &Parameter,
    ) -> Result<Instance, InjectorError> {
        let key = descriptor::scalar_name(parameter.name());
        match self.resolve_binding(injector, &key)? {
            Some(Resolution { binding, .. }) => match binding.concrete() {
                Concrete::Value(value) => Ok(value.clone()),
                Concrete::Factory(factory) => factory.invoke(injector, &Params::new()),
                Concrete::Type(name) if self.names_abstraction(injector, name) => {
                    self.make(injector, name, &Params::new())
                }
                Concrete::Type(name) => Ok(Instance::new(name.clone())),
            },
            None => parameter
                .default()
                .map(DefaultValue::produce)
                .ok_or_else(|| InjectorError::UnresolvableParameter {
                    consumer: consumer.to_owned(),
                    parameter: parameter.name().to_owned(),
                }),
        }
    }

    /// Replaces a failure to find or instantiate the parameter's own
    /// abstraction with one naming the consumer and the parameter. Failures
    /// from deeper in the graph are passed on unchanged.
    fn unresolvable(
        consumer: &str,
        parameter: &Parameter,
        abstraction: &str,
        err: InjectorError,
    ) -> InjectorError {
        match err {
            InjectorError::UnknownType { ref name }
            | InjectorError::UninstantiableAbstraction { ref name }
                if name == abstraction =>
            {
                InjectorError::UnresolvableParameter {
                    consumer: consumer.to_owned(),
                    parameter: parameter.name().to_owned(),
                }
            }
            err => err,
        }
    }

    /// Whether a scalar bound to `name` refers to another abstraction rather
    /// than being a plain string.
    fn names_abstraction(&self, injector: &Injector, name: &str) -> bool {
        let bound = match self.stack.top() {
            Some(scope) => ContextualBinder::new(injector.binder(), &scope).knows(name),
            None => injector.binder().knows(name),
        };
        bound || injector.store().contains(name) || injector.catalog().lookup(name).is_some()
    }

    fn resolve_binding(
        &self,
        injector: &Injector,
        abstraction: &str,
    ) -> Result<Option<Resolution>, InjectorError> {
        match self.stack.top() {
            Some(scope) => ContextualBinder::new(injector.binder(), &scope).resolve_binding(abstraction),
            None => injector.binder().resolve_binding(abstraction),
        }
    }
}

/// A function bound to an injector and a set of explicit arguments, as
/// returned by [`Injector::wrap`].
#[derive(Clone)]
pub struct Wrapped {
    injector: Injector,
    function: Function,
    params: Params,
}

impl Wrapped {
    pub fn function(&self) -> &Function {
        &self.function
    }

    /// Calls the function. Arguments in `params` override the ones given
    /// when wrapping.
    pub fn call(&self, params: Params) -> Result<Instance, InjectorError> {
        let params = self.params.merge(&params);
        self.injector
            .assembler()
            .invoke(&self.injector, &self.function, &params)
    }
}

impl Debug for Wrapped {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Wrapped")
            .field("function", &self.function)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::sync::Arc;

    use crate::descriptor::{MockCatalog, TypeEntry};

    use super::*;

    struct Engine {
        power: u32,
    }

    struct Car {
        engine: Arc<Engine>,
        seats: u8,
    }

    fn engine_entry() -> TypeEntry {
        TypeEntry::new("Engine", vec![Parameter::scalar("power")], |args| {
            Ok(Ok::<_, Infallible>(Engine {
                power: args.value(0)?,
            }))
        })
    }

    fn car_entry() -> TypeEntry {
        TypeEntry::new(
            "Car",
            vec![
                Parameter::object("engine", "Engine"),
                Parameter::scalar("seats").with_default(|| 4u8),
            ],
            |args| {
                Ok(Ok::<_, Infallible>(Car {
                    engine: args.object(0)?,
                    seats: args.value(1)?,
                }))
            },
        )
    }

    fn mock_injector(entries: Vec<TypeEntry>) -> Injector {
        let entries: Vec<_> = entries.into_iter().map(Arc::new).collect();
        let mut catalog = MockCatalog::new();
        catalog.expect_lookup().returning(move |name| {
            entries.iter().find(|entry| entry.name() == name).cloned()
        });
        Injector::with_catalog(Box::new(catalog))
    }

    #[test]
    fn assembler_make_resolves_scalar_and_default_parameters() {
        let injector = mock_injector(vec![engine_entry(), car_entry()]);
        injector.bind("$power", Concrete::value(150u32), false);

        let car = injector.make("Car", Params::new()).unwrap();
        let car = car.downcast::<Car>().unwrap();
        assert_eq!(car.engine.power, 150);
        assert_eq!(car.seats, 4);
        assert_eq!(injector.assembler().stack().depth(), 0);
    }

    #[test]
    fn assembler_make_prefers_explicit_params() {
        let injector = mock_injector(vec![engine_entry(), car_entry()]);
        injector.bind("$power", Concrete::value(150u32), false);

        let engine = Engine { power: 90 };
        let car = injector
            .make("Car", Params::new().with("engine", engine).with(1usize, 2u8))
            .unwrap();
        let car = car.downcast::<Car>().unwrap();
        assert_eq!(car.engine.power, 90);
        assert_eq!(car.seats, 2);
    }

    #[test]
    fn assembler_make_fails_when_scalar_is_unbound() {
        let injector = mock_injector(vec![engine_entry(), car_entry()]);

        let err = injector.make("Car", Params::new()).unwrap_err();
        assert!(matches!(
            err,
            InjectorError::UnresolvableParameter { ref consumer, ref parameter }
                if consumer == "Engine" && parameter == "power"
        ));
        assert_eq!(injector.assembler().stack().depth(), 0);
    }

    #[test]
    fn assembler_make_fails_for_unknown_and_abstract_types() {
        let injector = mock_injector(vec![TypeEntry::abstraction("Vehicle")]);

        assert!(matches!(
            injector.make("Boat", Params::new()),
            Err(InjectorError::UnknownType { ref name }) if name == "Boat"
        ));
        assert!(matches!(
            injector.make("Vehicle", Params::new()),
            Err(InjectorError::UninstantiableAbstraction { ref name }) if name == "Vehicle"
        ));
    }

    #[test]
    fn assembler_make_fails_on_cyclic_dependency() {
        let chicken = TypeEntry::new("Chicken", vec![Parameter::object("egg", "Egg")], |args| {
            Ok(Ok::<_, Infallible>(args.instance(0)?.type_name()))
        });
        let egg = TypeEntry::new("Egg", vec![Parameter::object("chicken", "Chicken")], |args| {
            Ok(Ok::<_, Infallible>(args.instance(0)?.type_name()))
        });
        let injector = mock_injector(vec![chicken, egg]);

        let err = injector.make("Chicken", Params::new()).unwrap_err();
        assert!(matches!(
            err,
            InjectorError::CyclicDependency { ref path, .. } if path == &["Chicken", "Egg", "Chicken"]
        ));
        assert_eq!(injector.assembler().stack().depth(), 0);
    }

    #[test]
    fn assembler_make_resolves_scalar_in_consumer_context() {
        let injector = mock_injector(vec![engine_entry()]);
        injector.bind("$power", Concrete::value(100u32), false);
        injector.when("Engine").bind("$power", Concrete::value(300u32), false);

        let engine = injector.make("Engine", Params::new()).unwrap();
        assert_eq!(engine.downcast::<Engine>().unwrap().power, 300);
    }

    #[test]
    fn assembler_make_invokes_factory_for_scalar() {
        let injector = mock_injector(vec![engine_entry()]);
        injector.bind(
            "$power",
            Concrete::factory(|_, _| Ok(Ok::<_, Infallible>(42u32))),
            false,
        );

        let engine = injector.make("Engine", Params::new()).unwrap();
        assert_eq!(engine.downcast::<Engine>().unwrap().power, 42);
    }

    #[test]
    fn assembler_wrap_resolves_function_parameters() {
        let injector = mock_injector(vec![engine_entry()]);
        injector.bind("$power", Concrete::value(120u32), false);
        let describe = Function::new(
            "describe",
            vec![
                Parameter::object("engine", "Engine"),
                Parameter::scalar("unit"),
            ],
            |args| {
                let engine: Arc<Engine> = args.object(0)?;
                let unit: &'static str = args.value(1)?;
                Ok(Ok::<_, Infallible>(format!("{}{unit}", engine.power)))
            },
        );

        let wrapped = injector
            .wrap(describe, Params::new().with("unit", "hp"))
            .unwrap();
        let first = wrapped.call(Params::new()).unwrap();
        let second = wrapped.call(Params::new().with("unit", "kW")).unwrap();
        assert_eq!(*first.downcast::<String>().unwrap(), "120hp");
        assert_eq!(*second.downcast::<String>().unwrap(), "120kW");
        assert_eq!(injector.assembler().stack().depth(), 0);
    }

    #[test]
    fn assembler_wrap_fails_without_receiver() {
        let injector = mock_injector(Vec::new());
        let method = Function::method("Engine::start", Vec::new(), |_: &Engine, _| {
            Ok(Ok::<_, Infallible>(()))
        });

        assert!(matches!(
            injector.wrap(method, Params::new()),
            Err(InjectorError::MissingReceiver { ref function }) if function == "Engine::start"
        ));
    }

    #[test]
    fn assembler_make_caches_shared_alias_under_requested_name() {
        let injector = mock_injector(vec![engine_entry()]);
        injector
            .bind("$power", Concrete::value(80u32), false)
            .bind("Motor", "PrimaryEngine", false)
            .bind("PrimaryEngine", "Engine", true);

        let motor = injector.make("Motor", Params::new()).unwrap();
        assert!(injector.has("Motor"));
        assert!(!injector.has("PrimaryEngine"));
        assert!(injector.make("Motor", Params::new()).unwrap().ptr_eq(&motor));

        let primary = injector.make("PrimaryEngine", Params::new()).unwrap();
        assert!(!primary.ptr_eq(&motor));

        injector.drop("Motor");
        assert!(!injector.has("Motor"));
        injector.bind("Motor", "PrimaryEngine", false);
        let rebuilt = injector.make("Motor", Params::new()).unwrap();
        assert!(!rebuilt.ptr_eq(&motor));
    }

    #[test]
    fn assembler_make_uses_unknown_scalar_name_as_string() {
        let host = TypeEntry::new("Mailer", vec![Parameter::scalar("host")], |args| {
            Ok(Ok::<_, Infallible>(args.value::<String>(0)?))
        });
        let injector = mock_injector(vec![engine_entry(), host]);
        injector.bind("$host", "smtp.example.org", false);

        let mailer = injector.make("Mailer", Params::new()).unwrap();
        assert_eq!(*mailer.downcast::<String>().unwrap(), "smtp.example.org");
    }

    #[test]
    fn assembler_make_routes_scalar_naming_abstraction_through_make() {
        let injector = mock_injector(vec![engine_entry()]);
        injector
            .bind("$power", "rated_power", false)
            .bind("rated_power", Concrete::value(250u32), false);

        let engine = injector.make("Engine", Params::new()).unwrap();
        assert_eq!(engine.downcast::<Engine>().unwrap().power, 250);
    }

    #[test]
    fn assembler_make_names_consumer_of_missing_object_parameter() {
        let injector = mock_injector(vec![car_entry()]);

        let err = injector.make("Car", Params::new()).unwrap_err();
        assert!(matches!(
            err,
            InjectorError::UnresolvableParameter { ref consumer, ref parameter }
                if consumer == "Car" && parameter == "engine"
        ));
    }

    #[test]
    fn assembler_make_keeps_failure_from_deeper_dependency() {
        let injector = mock_injector(vec![car_entry()]);
        injector.bind("Engine", "TurboEngine", false);

        let err = injector.make("Car", Params::new()).unwrap_err();
        assert!(matches!(
            err,
            InjectorError::UnknownType { ref name } if name == "TurboEngine"
        ));
    }

    #[test]
    fn assembler_make_never_consults_catalog_for_values() {
        let mut catalog = MockCatalog::new();
        catalog.expect_lookup().never();
        let injector = Injector::with_catalog(Box::new(catalog));
        injector.bind("Engine", Concrete::value(7u32), true);

        let value = injector.make("Engine", Params::new()).unwrap();
        assert_eq!(*value.downcast::<u32>().unwrap(), 7);
    }
}
