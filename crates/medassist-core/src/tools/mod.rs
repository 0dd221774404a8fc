pub mod executor;
pub mod registry;
pub mod types;

pub use executor::{Result, Tool, ToolError, ToolExecutor};
pub use registry::{RegistryError, ToolRegistry};
pub use types::{ToolArguments, ToolCallRequest, ToolCallResult, ToolDescriptor, ToolOutcome};
