use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use medassist_core::{
    RegistryError, Tool, ToolArguments, ToolError, ToolExecutor, ToolRegistry,
};
use serde_json::Value;

use crate::tools::{CheckVitalsTool, ScheduleAppointmentTool, SearchMedicalDatabaseTool};

/// Names of the tools registered by [`BuiltinToolExecutor::new`], in declaration order.
pub const BUILTIN_TOOL_NAMES: [&str; 3] = [
    "checkVitals",
    "searchMedicalDatabase",
    "scheduleAppointment",
];

/// Executes tools registered by name.
pub struct BuiltinToolExecutor {
    tools: HashMap<String, Arc<dyn Tool>>,
    order: Vec<String>,
}

impl BuiltinToolExecutor {
    /// Creates an executor with all built-in tools registered
    pub fn new() -> Self {
        let mut executor = Self::empty();
        executor.register_builtin_tools();
        executor
    }

    /// Creates an executor with no tools registered
    pub fn empty() -> Self {
        Self {
            tools: HashMap::new(),
            order: Vec::new(),
        }
    }

    fn register_builtin_tools(&mut self) {
        let builtins: [Arc<dyn Tool>; 3] = [
            Arc::new(CheckVitalsTool::new()),
            Arc::new(SearchMedicalDatabaseTool::new()),
            Arc::new(ScheduleAppointmentTool::new()),
        ];
        for tool in builtins {
            let name = tool.name().to_string();
            self.order.push(name.clone());
            self.tools.insert(name, tool);
        }
    }

    /// Registers a custom tool
    pub fn register_tool<T: Tool + 'static>(&mut self, tool: T) -> Result<(), RegistryError> {
        self.register_arc(Arc::new(tool))
    }

    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) -> Result<(), RegistryError> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(RegistryError::DuplicateTool(name));
        }
        self.order.push(name.clone());
        self.tools.insert(name, tool);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn tool_names(&self) -> &[String] {
        &self.order
    }

    /// Builds the registry describing every registered tool, in registration order.
    pub fn registry(&self) -> Result<ToolRegistry, RegistryError> {
        ToolRegistry::new(
            self.order
                .iter()
                .filter_map(|name| self.tools.get(name))
                .map(|tool| tool.descriptor()),
        )
    }
}

impl Default for BuiltinToolExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolExecutor for BuiltinToolExecutor {
    async fn execute(&self, name: &str, arguments: &ToolArguments) -> Result<Value, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        log::debug!("Executing tool {}", name);
        tool.execute(arguments).await
    }
}
