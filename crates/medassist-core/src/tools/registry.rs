use std::collections::HashMap;

use thiserror::Error;

use crate::tools::ToolDescriptor;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("tool with name '{0}' already registered")]
    DuplicateTool(String),

    #[error("invalid tool: {0}")]
    InvalidTool(String),
}

/// Fixed, ordered set of tool descriptors.
///
/// The registry is built once and never mutated afterwards. It feeds both the
/// backend's tool declaration and the dispatcher's name validation.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    descriptors: Vec<ToolDescriptor>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new(
        descriptors: impl IntoIterator<Item = ToolDescriptor>,
    ) -> Result<Self, RegistryError> {
        let mut registry = Self::default();

        for descriptor in descriptors {
            let name = descriptor.name.trim();

            if name.is_empty() {
                return Err(RegistryError::InvalidTool(
                    "tool name cannot be empty".to_string(),
                ));
            }
            if name.len() != descriptor.name.len() {
                return Err(RegistryError::InvalidTool(format!(
                    "tool name '{}' has surrounding whitespace",
                    descriptor.name
                )));
            }
            if registry.index.contains_key(name) {
                return Err(RegistryError::DuplicateTool(name.to_string()));
            }

            registry
                .index
                .insert(descriptor.name.clone(), registry.descriptors.len());
            registry.descriptors.push(descriptor);
        }

        Ok(registry)
    }

    /// Descriptors in declaration order.
    pub fn describe(&self) -> &[ToolDescriptor] {
        &self.descriptors
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.index.get(name).map(|&position| &self.descriptors[position])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.descriptors
            .iter()
            .map(|descriptor| descriptor.name.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
