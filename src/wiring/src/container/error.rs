use std::error::Error;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::Arc;

use snafu::prelude::*;

#[derive(Debug, Clone, Snafu)]
#[snafu(visibility(pub(crate)))]
#[non_exhaustive]
pub enum InjectorError {
    #[snafu(display("could not find a constructible type named {name}"))]
    #[non_exhaustive]
    UnknownType { name: String },
    #[snafu(display("could not instantiate {name} which is an abstraction without constructor"))]
    #[non_exhaustive]
    UninstantiableAbstraction { name: String },
    #[snafu(display("could not resolve parameter {parameter} of {consumer}"))]
    #[non_exhaustive]
    UnresolvableParameter { consumer: String, parameter: String },
    #[snafu(display("could not wrap instance method {function} without a receiver"))]
    #[non_exhaustive]
    MissingReceiver { function: String },
    #[snafu(display("could not resolve the binding chain {} which loops back on itself", chain.join(" -> ")))]
    #[non_exhaustive]
    CyclicBinding { chain: Vec<String> },
    #[snafu(display("could not construct {name} which depends on itself through {}", path.join(" -> ")))]
    #[non_exhaustive]
    CyclicDependency { name: String, path: Vec<String> },
    #[snafu(display("could not use {name} as {expected}"))]
    #[non_exhaustive]
    TypeMismatch { name: String, expected: &'static str },
    #[snafu(display("could not pass argument {parameter} of {consumer} as {expected}"))]
    #[non_exhaustive]
    ArgumentMismatch {
        consumer: String,
        parameter: String,
        expected: &'static str,
    },
    #[snafu(display("could not construct {name}"))]
    #[non_exhaustive]
    Construction {
        name: String,
        source: Arc<dyn Error + Send + Sync>,
    },
    #[snafu(display("module {module} fails to configure the injector"))]
    #[non_exhaustive]
    Module {
        module: &'static str,
        source: Arc<dyn Error + Send + Sync>,
    },
    #[snafu(display("aggregated module errors:\n{}", AggregatedDisplayer::new(errors)))]
    Modules { errors: Vec<InjectorError> },
}

impl InjectorError {
    pub fn construction<E>(name: impl Into<String>, err: E) -> Self
    where
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        Self::Construction {
            name: name.into(),
            source: Arc::from(err.into()),
        }
    }
}

struct AggregatedDisplayer<'a> {
    errors: &'a [InjectorError],
}

impl<'a> AggregatedDisplayer<'a> {
    fn new(errors: &'a [InjectorError]) -> Self {
        Self { errors }
    }
}

impl Display for AggregatedDisplayer<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        for (i, error) in self.errors.iter().enumerate() {
            writeln!(f, "{:4}: {}", i + 1, error)?;
        }
        Ok(())
    }
}
