//! Topic → backend lookup.
//!
//! # Responsibilities
//! - Store the backend base address for every routed topic
//! - Build the absolute outbound URL for a job
//! - Return an explicit NO_ROUTE rather than a silent default

use std::collections::HashMap;

use crate::error::GatewayError;

/// Immutable routing table.
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    entries: HashMap<String, String>,
}

impl RoutingTable {
    /// Build from `(topic, address)` pairs. Trailing slashes on addresses
    /// are dropped so concatenation with a path never doubles them.
    pub fn new<I, T, A>(entries: I) -> Self
    where
        I: IntoIterator<Item = (T, A)>,
        T: Into<String>,
        A: Into<String>,
    {
        let entries = entries
            .into_iter()
            .map(|(topic, address)| {
                let address: String = address.into();
                (topic.into(), address.trim_end_matches('/').to_string())
            })
            .collect();
        Self { entries }
    }

    pub fn backend(&self, topic: &str) -> Option<&str> {
        self.entries.get(topic).map(String::as_str)
    }

    /// Absolute URL for `path` on the topic's backend.
    pub fn resolve(&self, topic: &str, path: &str) -> Result<String, GatewayError> {
        let base = self
            .backend(topic)
            .ok_or_else(|| GatewayError::NoRoute(topic.to_string()))?;
        Ok(format!("{}{}", base, path))
    }

    pub fn contains(&self, topic: &str) -> bool {
        self.entries.contains_key(topic)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
