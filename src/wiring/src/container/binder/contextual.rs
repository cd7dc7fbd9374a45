use crate::container::binder::{chase_aliases, Binder, Binding, Concrete, Resolution, Resolver};
use crate::container::error::InjectorError;

pub const SCOPE_SEPARATOR: char = '@';

/// A view over a [`Binder`] whose operations apply only while `scope` is
/// being constructed.
///
/// ```rust
/// # use wiring::container::binder::{Binder, ContextualBinder};
/// let binder = Binder::new();
/// ContextualBinder::new(&binder, "ReportMailer").bind("Transport", "SmtpTransport", false);
/// assert!(binder.knows("Transport@ReportMailer"));
/// assert!(!binder.knows("Transport"));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ContextualBinder<'a> {
    binder: &'a Binder,
    scope: &'a str,
}

impl<'a> ContextualBinder<'a> {
    pub fn new(binder: &'a Binder, scope: &'a str) -> Self {
        Self { binder, scope }
    }

    pub fn scope(&self) -> &str {
        self.scope
    }

    pub fn bind(&self, abstraction: &str, concrete: impl Into<Concrete>, shared: bool) -> &Self {
        self.binder
            .insert(Binding::scoped(abstraction, self.scope, concrete, shared));
        self
    }

    pub fn unbind(&self, abstraction: &str) -> &Self {
        self.binder.unbind(&self.scoped(abstraction));
        self
    }

    pub fn knows(&self, abstraction: &str) -> bool {
        self.binder.knows(&self.scoped(abstraction)) || self.binder.knows(abstraction)
    }

    /// Resolves `abstraction`, preferring the scoped binding over the global
    /// one at every hop of the alias chain.
    ///
    /// # Errors
    ///
    /// Returns [`InjectorError::CyclicBinding`] if the chain revisits an
    /// abstraction.
    pub fn resolve(&self, abstraction: &str) -> Result<Option<Resolution>, InjectorError> {
        let Some((binding, contextual)) = self.lookup(abstraction) else {
            return Ok(None);
        };
        let (binding, chased) = chase_aliases(binding, |name| self.lookup(name))?;
        Ok(Some(Resolution {
            binding,
            contextual: contextual || chased,
        }))
    }

    fn lookup(&self, abstraction: &str) -> Option<(Binding, bool)> {
        if let Some(binding) = self.binder.get(&self.scoped(abstraction)) {
            Some((binding, true))
        } else {
            self.binder.get(abstraction).map(|binding| (binding, false))
        }
    }

    fn scoped(&self, abstraction: &str) -> String {
        format!("{abstraction}{SCOPE_SEPARATOR}{}", self.scope)
    }
}

impl Resolver for ContextualBinder<'_> {
    fn resolve_binding(&self, abstraction: &str) -> Result<Option<Resolution>, InjectorError> {
        self.resolve(abstraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contextual_binder_prefers_scoped_binding() {
        let binder = Binder::new();
        binder.bind("Transport", "SendmailTransport", true);
        let contextual = ContextualBinder::new(&binder, "ReportMailer");
        contextual.bind("Transport", "SmtpTransport", false);

        let res = contextual.resolve("Transport").unwrap().unwrap();
        assert!(res.contextual);
        assert!(matches!(res.binding.concrete(), Concrete::Type(name) if name == "SmtpTransport"));

        let res = ContextualBinder::new(&binder, "AlertMailer")
            .resolve("Transport")
            .unwrap()
            .unwrap();
        assert!(!res.contextual);
        assert!(matches!(res.binding.concrete(), Concrete::Type(name) if name == "SendmailTransport"));
    }

    #[test]
    fn contextual_binder_falls_back_to_global_binding() {
        let binder = Binder::new();
        binder.bind("Transport", "SendmailTransport", false);
        let contextual = ContextualBinder::new(&binder, "ReportMailer");

        assert!(contextual.knows("Transport"));
        assert!(!contextual.knows("Queue"));
        assert!(contextual.resolve("Queue").unwrap().is_none());

        let res = contextual.resolve("Transport").unwrap().unwrap();
        assert!(!res.contextual);
    }

    #[test]
    fn contextual_binder_unbind_only_removes_scoped_binding() {
        let binder = Binder::new();
        binder.bind("Transport", "SendmailTransport", false);
        let contextual = ContextualBinder::new(&binder, "ReportMailer");
        contextual.bind("Transport", "SmtpTransport", false).unbind("Transport");

        assert!(binder.knows("Transport"));
        assert!(!binder.knows("Transport@ReportMailer"));
    }

    #[test]
    fn contextual_binder_marks_chain_through_scoped_alias_as_contextual() {
        let binder = Binder::new();
        binder.bind("Transport", "DefaultTransport", false);
        binder.bind("DefaultTransport", "SendmailTransport", true);
        ContextualBinder::new(&binder, "ReportMailer").bind(
            "DefaultTransport",
            "SmtpTransport",
            false,
        );

        let res = ContextualBinder::new(&binder, "ReportMailer")
            .resolve("Transport")
            .unwrap()
            .unwrap();
        assert!(res.contextual);
        assert!(matches!(res.binding.concrete(), Concrete::Type(name) if name == "SmtpTransport"));
    }

    #[test]
    fn contextual_binder_resolve_fails_on_cycle() {
        let binder = Binder::new();
        binder.bind("A", "B", false);
        ContextualBinder::new(&binder, "Consumer").bind("B", "A", false);

        let res = ContextualBinder::new(&binder, "Consumer").resolve("A");
        assert!(matches!(res, Err(InjectorError::CyclicBinding { .. })));
        assert!(binder.resolve("A").unwrap().is_some());
    }
}
