//! The target plugin registry.
//!
//! Each target's transformer + emitter + runtime triple registers under a
//! short name. The registry is a value the driver owns; there is no
//! process-wide state and no cross-plugin state.

use crate::backend::{c::CBackend, ruby::RubyBackend, ts::TypeScriptBackend, Backend, TargetInfo};

#[derive(Default)]
pub struct Registry {
    backends: Vec<Box<dyn Backend>>,
}

impl Registry {
    pub fn new() -> Registry {
        Registry::default()
    }

    /// A registry holding every built-in target.
    pub fn with_builtin_targets() -> Registry {
        let mut registry = Registry::new();
        registry.add(Box::new(CBackend::new()));
        registry.add(Box::new(RubyBackend::new()));
        registry.add(Box::new(TypeScriptBackend::new()));
        registry
    }

    /// Register a target. A later registration under the same name replaces
    /// the earlier one.
    pub fn add(&mut self, backend: Box<dyn Backend>) {
        let name = backend.info().name;
        self.backends.retain(|b| b.info().name != name);
        self.backends.push(backend);
    }

    pub fn find(&self, name: &str) -> Option<&dyn Backend> {
        self.backends
            .iter()
            .find(|b| b.info().name == name)
            .map(|b| b.as_ref())
    }

    pub fn list(&self) -> Vec<&TargetInfo> {
        self.backends.iter().map(|b| b.info()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_targets_are_registered() {
        let registry = Registry::with_builtin_targets();
        assert!(registry.find("c").is_some());
        assert!(registry.find("ruby").is_some());
        assert!(registry.find("typescript").is_some());
        assert!(registry.find("cobol").is_none());
        assert_eq!(registry.list().len(), 3);
    }

    #[test]
    fn test_re_registration_replaces() {
        let mut registry = Registry::with_builtin_targets();
        registry.add(Box::new(RubyBackend::new()));
        assert_eq!(registry.list().len(), 3);
    }
}
