//! Built-in front-desk tools.
//!
//! Every tool implements [`medassist_core::Tool`] and is registered in
//! [`BuiltinToolExecutor`], which also produces the matching `ToolRegistry`.

mod executor;
pub mod tools;

pub use executor::{BuiltinToolExecutor, BUILTIN_TOOL_NAMES};

pub use tools::{CheckVitalsTool, ScheduleAppointmentTool, SearchMedicalDatabaseTool};
