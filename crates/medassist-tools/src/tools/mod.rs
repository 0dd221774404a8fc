mod check_vitals;
mod schedule_appointment;
mod search_medical_database;

pub use check_vitals::CheckVitalsTool;
pub use schedule_appointment::{ScheduleAppointmentTool, DEPARTMENTS};
pub use search_medical_database::SearchMedicalDatabaseTool;

use medassist_core::{ToolArguments, ToolError};
use serde::de::DeserializeOwned;

/// Deserializes a tool's argument map into its typed argument struct.
pub(crate) fn parse_args<T: DeserializeOwned>(arguments: &ToolArguments) -> Result<T, ToolError> {
    serde_json::from_value(serde_json::Value::Object(arguments.clone()))
        .map_err(|e| ToolError::InvalidArguments(e.to_string()))
}
