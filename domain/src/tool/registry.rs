//! Tool registry: the per-session snapshot of discovered tools

use super::entities::ToolDescriptor;
use crate::core::error::DomainError;
use std::collections::HashMap;

/// Immutable catalog of the tools a session discovered.
///
/// Built once from the tool server's listing. Iteration follows discovery
/// order so that display and the tool list handed to the reasoning engine
/// are stable across turns. There are no mutation methods: refreshing the
/// catalog means initializing a new session.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<ToolDescriptor>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Build a registry from descriptors in discovery order.
    ///
    /// Fails if two descriptors share a name or a name is empty.
    pub fn from_descriptors(
        descriptors: impl IntoIterator<Item = ToolDescriptor>,
    ) -> Result<Self, DomainError> {
        let mut tools = Vec::new();
        let mut index = HashMap::new();

        for descriptor in descriptors {
            if descriptor.name.trim().is_empty() {
                return Err(DomainError::EmptyToolName);
            }
            if index.contains_key(&descriptor.name) {
                return Err(DomainError::DuplicateTool(descriptor.name));
            }
            index.insert(descriptor.name.clone(), tools.len());
            tools.push(descriptor);
        }

        Ok(Self { tools, index })
    }

    /// Look up a descriptor by name.
    pub fn describe(&self, name: &str) -> Option<&ToolDescriptor> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    /// All descriptors in discovery order.
    pub fn all(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.iter().map(|t| t.name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
