//! Tool registry for resolving tool calls

use crate::{Result, Tool, ToolError};
use analyst_llm::ToolDefinition;
use std::collections::HashMap;
use std::sync::Arc;

/// Immutable set of tools, fixed once built
///
/// Tools keep their registration order so the definitions sent to the model
/// are stable between requests.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    order: Vec<Arc<dyn Tool>>,
    by_name: HashMap<String, Arc<dyn Tool>>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

impl ToolRegistry {
    /// Start building a registry
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::default()
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.by_name.get(name).cloned()
    }

    /// Check whether a tool is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// All registered tools in registration order
    pub fn list_tools(&self) -> &[Arc<dyn Tool>] {
        &self.order
    }

    /// Registered tool names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.order.iter().map(|t| t.name()).collect()
    }

    /// Definitions to advertise to the language model
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.order.iter().map(|t| t.definition()).collect()
    }

    /// Get the number of registered tools
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Builder collecting tools before the registry is frozen
#[derive(Default)]
pub struct ToolRegistryBuilder {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistryBuilder {
    /// Add a tool
    pub fn register(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    /// Freeze the registry, rejecting duplicate names
    pub fn build(self) -> Result<ToolRegistry> {
        let mut by_name = HashMap::with_capacity(self.tools.len());
        for tool in &self.tools {
            if by_name
                .insert(tool.name().to_string(), Arc::clone(tool))
                .is_some()
            {
                return Err(ToolError::DuplicateName(tool.name().to_string()));
            }
        }
        tracing::debug!(tools = self.tools.len(), "Tool registry built");
        Ok(ToolRegistry {
            order: self.tools,
            by_name,
        })
    }
}
