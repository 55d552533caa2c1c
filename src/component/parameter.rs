// ============================================================
// Layer 5 — Parameter Descriptor
// ============================================================
// A named, documented placeholder for one constructor input. The
// resolver fills it in; reading it before that is an error.

use crate::component::interface::Source;
use crate::component::value::Component;
use crate::domain::error::{NmtError, Result};

#[derive(Debug)]
pub struct ParameterDescriptor {
    name:          String,
    documentation: String,
    source:        Source,
    value:         Option<Component>,
}

impl ParameterDescriptor {
    pub fn new(name: impl Into<String>, documentation: impl Into<String>, source: Source) -> Self {
        Self {
            name:          name.into(),
            documentation: documentation.into(),
            source,
            value:         None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn documentation(&self) -> &str {
        &self.documentation
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn is_assigned(&self) -> bool {
        self.value.is_some()
    }

    pub fn assign(&mut self, value: Component) {
        self.value = Some(value);
    }

    pub fn value(&self) -> Result<&Component> {
        self.value
            .as_ref()
            .ok_or_else(|| NmtError::uninitialized(format!("parameter '{}'", self.name)))
    }

    /// Move the value out. The descriptor is unassigned afterwards.
    pub fn take(&mut self) -> Result<Component> {
        self.value
            .take()
            .ok_or_else(|| NmtError::uninitialized(format!("parameter '{}'", self.name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_read_before_assign() {
        let p = ParameterDescriptor::new("batch_size", "samples per batch", Source::Local { default: None });
        assert!(!p.is_assigned());
        assert!(matches!(p.value(), Err(NmtError::UninitializedState { .. })));
    }

    #[test]
    fn test_assign_then_take() {
        let mut p = ParameterDescriptor::new("batch_size", "samples per batch", Source::Local { default: None });
        p.assign(Component::Value(json!(32)));
        assert!(matches!(p.value().unwrap(), Component::Value(v) if v == &json!(32)));

        assert!(p.take().is_ok());
        assert!(p.take().is_err());
        assert_eq!(p.documentation(), "samples per batch");
    }
}
