//! Intent to capability routing.

use std::collections::HashMap;

use crate::{CapabilityRegistry, DispatchError, Intent};

/// Which capabilities serve each intent.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteTable {
    routes: HashMap<Intent, Vec<String>>,
    fallback: Vec<String>,
}

impl Default for RouteTable {
    fn default() -> Self {
        let table: [(Intent, &[&str]); 8] = [
            (Intent::Research, &["research"]),
            (Intent::Strategy, &["research", "strategy"]),
            (Intent::RiskAssessment, &["portfolio", "risk"]),
            (Intent::Portfolio, &["portfolio"]),
            (Intent::Monitoring, &["monitoring"]),
            (Intent::Education, &["education"]),
            (Intent::Trade, &["research", "risk"]),
            (Intent::Rebalance, &["portfolio", "strategy", "risk"]),
        ];

        Self {
            routes: table
                .into_iter()
                .map(|(intent, names)| (intent, names.iter().map(|n| n.to_string()).collect()))
                .collect(),
            fallback: vec!["research".to_string()],
        }
    }
}

impl RouteTable {
    /// Default table with configured overrides.
    ///
    /// # Arguments
    /// * `overrides` - Intent name to capability names; replaces the default
    ///   route for that intent
    /// * `fallback` - Used when an intent has no usable route; `None` keeps
    ///   the default
    pub fn with_overrides(
        overrides: &HashMap<String, Vec<String>>,
        fallback: Option<Vec<String>>,
    ) -> Result<Self, DispatchError> {
        let mut table = Self::default();
        for (name, capabilities) in overrides {
            let intent: Intent = name.parse()?;
            table.routes.insert(intent, capabilities.clone());
        }
        if let Some(fallback) = fallback {
            table.fallback = fallback;
        }
        Ok(table)
    }

    /// Configured route for an intent, before registry filtering.
    pub fn route(&self, intent: Intent) -> &[String] {
        self.routes.get(&intent).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn fallback(&self) -> &[String] {
        &self.fallback
    }

    /// Capabilities to invoke for an intent.
    ///
    /// Names missing from the registry are dropped. When nothing remains the
    /// fallback list is used, filtered the same way.
    pub fn resolve(&self, intent: Intent, registry: &CapabilityRegistry) -> Vec<String> {
        let registered = |names: &[String]| -> Vec<String> {
            names
                .iter()
                .filter(|n| registry.contains(n))
                .cloned()
                .collect()
        };

        let names = registered(self.route(intent));
        if names.is_empty() {
            registered(&self.fallback)
        } else {
            names
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use advisor_core::error::CapabilityError;
    use advisor_core::traits::{Capability, CapabilityInput};
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::Arc;

    struct Named(&'static str);

    #[async_trait]
    impl Capability for Named {
        fn name(&self) -> &str {
            self.0
        }

        async fn invoke(&self, _input: &CapabilityInput) -> Result<Value, CapabilityError> {
            Ok(Value::Null)
        }
    }

    fn registry(names: &[&'static str]) -> CapabilityRegistry {
        names
            .iter()
            .fold(CapabilityRegistry::new(), |r, n| r.with(Arc::new(Named(*n))))
    }

    #[test]
    fn test_resolve_filters_unregistered() {
        let table = RouteTable::default();
        let registry = registry(&["research", "risk"]);

        assert_eq!(table.resolve(Intent::Rebalance, &registry), vec!["risk"]);
        assert_eq!(table.resolve(Intent::Trade, &registry), vec!["research", "risk"]);
    }

    #[test]
    fn test_unroutable_intent_uses_fallback() {
        let table = RouteTable::default();
        let registry = registry(&["research"]);

        assert_eq!(table.resolve(Intent::General, &registry), vec!["research"]);
        assert_eq!(table.resolve(Intent::Education, &registry), vec!["research"]);
        assert!(table.resolve(Intent::General, &CapabilityRegistry::new()).is_empty());
    }

    #[test]
    fn test_overrides() {
        let overrides = HashMap::from([("trade".to_string(), vec!["risk".to_string()])]);
        let table = RouteTable::with_overrides(&overrides, Some(vec!["education".to_string()])).unwrap();

        assert_eq!(table.route(Intent::Trade), ["risk".to_string()]);
        assert_eq!(table.fallback(), ["education".to_string()]);

        let bad = HashMap::from([("weather".to_string(), vec![])]);
        assert!(RouteTable::with_overrides(&bad, None).is_err());
    }
}
