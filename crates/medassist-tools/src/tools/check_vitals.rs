use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use medassist_core::{Tool, ToolArguments, ToolError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use serde_json::{json, Value};

/// Simulated bedside monitor reading the patient's current vitals.
pub struct CheckVitalsTool {
    rng: Mutex<StdRng>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalsReading {
    pub heart_rate: u32,
    pub blood_pressure: BloodPressure,
    pub temperature: f64,
    pub oxygen_saturation: u32,
    pub recorded_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BloodPressure {
    pub systolic: u32,
    pub diastolic: u32,
}

impl CheckVitalsTool {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic readings for tests and demos.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn read(&self) -> VitalsReading {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);

        VitalsReading {
            heart_rate: rng.gen_range(60..=100),
            blood_pressure: BloodPressure {
                systolic: rng.gen_range(105..=135),
                diastolic: rng.gen_range(65..=88),
            },
            temperature: f64::from(rng.gen_range(361u32..=374)) / 10.0,
            oxygen_saturation: rng.gen_range(95..=100),
            recorded_at: Utc::now().to_rfc3339(),
        }
    }
}

impl Default for CheckVitalsTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for CheckVitalsTool {
    fn name(&self) -> &str {
        "checkVitals"
    }

    fn description(&self) -> &str {
        "Read the patient's current vital signs: heart rate (BPM), blood pressure (mmHg), body temperature (°C) and oxygen saturation (%)."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, _arguments: &ToolArguments) -> Result<Value, ToolError> {
        let reading = self.read();
        log::debug!(
            "checkVitals: heart rate {} BPM, SpO2 {}%",
            reading.heart_rate,
            reading.oxygen_saturation
        );
        serde_json::to_value(reading).map_err(|e| ToolError::Execution(e.to_string()))
    }
}
