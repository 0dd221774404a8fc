use async_trait::async_trait;
use chrono::{Days, Local, NaiveDate};
use medassist_core::{Tool, ToolArguments, ToolError};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::parse_args;

/// Departments that accept bookings.
pub const DEPARTMENTS: &[&str] = &[
    "cardiology",
    "dermatology",
    "general practice",
    "neurology",
    "orthopedics",
    "pediatrics",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Books an appointment and returns a confirmation ticket.
pub struct ScheduleAppointmentTool;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleAppointmentArgs {
    pub department: String,
    #[serde(default)]
    pub preferred_date: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl ScheduleAppointmentTool {
    pub fn new() -> Self {
        Self
    }

    fn normalize_department(department: &str) -> Result<&'static str, ToolError> {
        let wanted = department.trim().to_lowercase();
        DEPARTMENTS
            .iter()
            .copied()
            .find(|known| *known == wanted)
            .ok_or_else(|| {
                ToolError::InvalidArguments(format!(
                    "unknown department '{}'; available: {}",
                    department.trim(),
                    DEPARTMENTS.join(", ")
                ))
            })
    }

    fn resolve_date(preferred: Option<&str>, today: NaiveDate) -> Result<NaiveDate, ToolError> {
        match preferred.map(str::trim).filter(|date| !date.is_empty()) {
            Some(raw) => {
                let date = NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| {
                    ToolError::InvalidArguments(format!(
                        "preferredDate '{raw}' is not a YYYY-MM-DD date"
                    ))
                })?;
                if date < today {
                    return Err(ToolError::InvalidArguments(format!(
                        "preferredDate {raw} is in the past"
                    )));
                }
                Ok(date)
            }
            None => today
                .checked_add_days(Days::new(1))
                .ok_or_else(|| ToolError::Execution("no bookable date available".to_string())),
        }
    }

    fn ticket() -> String {
        let id = Uuid::new_v4().simple().to_string().to_uppercase();
        format!("APT-{}", &id[..6])
    }
}

impl Default for ScheduleAppointmentTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for ScheduleAppointmentTool {
    fn name(&self) -> &str {
        "scheduleAppointment"
    }

    fn description(&self) -> &str {
        "Book an appointment with a hospital department. Returns a confirmation ticket the patient should keep."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "department": {
                    "type": "string",
                    "description": format!("Department to book, one of: {}", DEPARTMENTS.join(", "))
                },
                "preferredDate": {
                    "type": "string",
                    "description": "Preferred date as YYYY-MM-DD; defaults to tomorrow"
                },
                "reason": {
                    "type": "string",
                    "description": "Short reason for the visit"
                }
            },
            "required": ["department"]
        })
    }

    async fn execute(&self, arguments: &ToolArguments) -> Result<Value, ToolError> {
        let args: ScheduleAppointmentArgs = parse_args(arguments)?;
        let department = Self::normalize_department(&args.department)?;
        let date = Self::resolve_date(args.preferred_date.as_deref(), Local::now().date_naive())?;
        let ticket = Self::ticket();

        log::info!("Booked {} appointment {} on {}", department, ticket, date);

        let mut confirmation = json!({
            "status": "confirmed",
            "ticket": ticket,
            "department": department,
            "date": date.format(DATE_FORMAT).to_string(),
        });
        if let Some(reason) = args.reason.filter(|reason| !reason.trim().is_empty()) {
            confirmation["reason"] = Value::String(reason);
        }
        Ok(confirmation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(value: Value) -> ToolArguments {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    fn day(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, DATE_FORMAT).unwrap()
    }

    #[tokio::test]
    async fn books_known_department() {
        let tool = ScheduleAppointmentTool::new();

        let value = tool
            .execute(&args(json!({
                "department": " Cardiology ",
                "preferredDate": "2999-03-14",
                "reason": "palpitations"
            })))
            .await
            .unwrap();

        assert_eq!(value["status"], json!("confirmed"));
        assert_eq!(value["department"], json!("cardiology"));
        assert_eq!(value["date"], json!("2999-03-14"));
        assert_eq!(value["reason"], json!("palpitations"));

        let ticket = value["ticket"].as_str().unwrap();
        assert!(ticket.starts_with("APT-"));
        assert_eq!(ticket.len(), 10);
    }

    #[tokio::test]
    async fn unknown_department_is_rejected() {
        let tool = ScheduleAppointmentTool::new();

        let result = tool
            .execute(&args(json!({"department": "astrology"})))
            .await;

        assert!(matches!(result, Err(ToolError::InvalidArguments(message)) if message.contains("cardiology")));
    }

    #[tokio::test]
    async fn department_is_required() {
        let tool = ScheduleAppointmentTool::new();
        let result = tool.execute(&ToolArguments::new()).await;
        assert!(matches!(result, Err(ToolError::InvalidArguments(_))));
    }

    #[test]
    fn date_defaults_to_tomorrow() {
        let today = day("2030-01-31");
        assert_eq!(
            ScheduleAppointmentTool::resolve_date(None, today).unwrap(),
            day("2030-02-01")
        );
        assert_eq!(
            ScheduleAppointmentTool::resolve_date(Some("  "), today).unwrap(),
            day("2030-02-01")
        );
    }

    #[test]
    fn malformed_or_past_dates_are_rejected() {
        let today = day("2030-01-31");
        assert!(ScheduleAppointmentTool::resolve_date(Some("31/01/2030"), today).is_err());
        assert!(ScheduleAppointmentTool::resolve_date(Some("2030-01-30"), today).is_err());
        assert_eq!(
            ScheduleAppointmentTool::resolve_date(Some("2030-01-31"), today).unwrap(),
            today
        );
    }

    #[test]
    fn tickets_are_unique() {
        assert_ne!(
            ScheduleAppointmentTool::ticket(),
            ScheduleAppointmentTool::ticket()
        );
    }
}
