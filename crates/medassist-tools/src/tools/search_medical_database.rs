use async_trait::async_trait;
use medassist_core::{Tool, ToolArguments, ToolError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::parse_args;

const DEFAULT_LIMIT: usize = 3;
const MAX_LIMIT: usize = 10;

struct Article {
    id: &'static str,
    title: &'static str,
    summary: &'static str,
    keywords: &'static [&'static str],
}

const ARTICLES: &[Article] = &[
    Article {
        id: "MED-001",
        title: "Resting heart rate",
        summary: "A normal resting heart rate for adults ranges from 60 to 100 beats per minute.",
        keywords: &["heart", "pulse", "bpm", "tachycardia", "bradycardia"],
    },
    Article {
        id: "MED-002",
        title: "Understanding blood pressure",
        summary: "Blood pressure below 120/80 mmHg is considered normal; readings of 130/80 or higher indicate hypertension.",
        keywords: &["blood pressure", "hypertension", "systolic", "diastolic"],
    },
    Article {
        id: "MED-003",
        title: "Fever in adults",
        summary: "A body temperature above 38 °C is a fever. Rest and fluids help; seek care if it lasts more than three days.",
        keywords: &["fever", "temperature", "chills"],
    },
    Article {
        id: "MED-004",
        title: "Oxygen saturation",
        summary: "Healthy oxygen saturation is 95% or higher. Levels below 92% warrant medical attention.",
        keywords: &["oxygen", "spo2", "saturation", "breathing"],
    },
    Article {
        id: "MED-005",
        title: "Seasonal allergies",
        summary: "Antihistamines relieve sneezing and itchy eyes caused by pollen allergies.",
        keywords: &["allergy", "allergies", "pollen", "antihistamine", "sneezing"],
    },
    Article {
        id: "MED-006",
        title: "Skin rashes",
        summary: "Most rashes are harmless and clear up on their own; a dermatologist can assess persistent ones.",
        keywords: &["rash", "skin", "eczema", "dermatitis"],
    },
    Article {
        id: "MED-007",
        title: "Migraine",
        summary: "Migraines cause throbbing headaches, often with light sensitivity. A neurologist can help with frequent attacks.",
        keywords: &["migraine", "headache", "neurology"],
    },
];

/// Searches a built-in library of patient-facing medical articles.
pub struct SearchMedicalDatabaseTool;

#[derive(Debug, Clone, Deserialize)]
pub struct SearchMedicalDatabaseArgs {
    pub query: String,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleSummary {
    pub id: String,
    pub title: String,
    pub summary: String,
}

impl SearchMedicalDatabaseTool {
    pub fn new() -> Self {
        Self
    }

    /// Articles matching any term of `query`, best matches first.
    pub fn search(query: &str, limit: usize) -> Vec<ArticleSummary> {
        let terms: Vec<String> = query
            .split_whitespace()
            .map(|term| {
                term.trim_matches(|c: char| !c.is_alphanumeric())
                    .to_lowercase()
            })
            .filter(|term| term.len() >= 3)
            .collect();

        let mut scored: Vec<(usize, &Article)> = ARTICLES
            .iter()
            .filter_map(|article| {
                let haystack = format!(
                    "{} {} {}",
                    article.title,
                    article.summary,
                    article.keywords.join(" ")
                )
                .to_lowercase();
                let score = terms
                    .iter()
                    .filter(|term| haystack.contains(term.as_str()))
                    .count();
                (score > 0).then_some((score, article))
            })
            .collect();

        // Stable sort keeps table order among equal scores
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        scored
            .into_iter()
            .take(limit)
            .map(|(_, article)| ArticleSummary {
                id: article.id.to_string(),
                title: article.title.to_string(),
                summary: article.summary.to_string(),
            })
            .collect()
    }
}

impl Default for SearchMedicalDatabaseTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for SearchMedicalDatabaseTool {
    fn name(&self) -> &str {
        "searchMedicalDatabase"
    }

    fn description(&self) -> &str {
        "Search the medical reference database for articles about symptoms, conditions and vital sign ranges."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Symptoms, condition or topic to look up"
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of articles to return (default 3, at most 10)"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, arguments: &ToolArguments) -> Result<Value, ToolError> {
        let args: SearchMedicalDatabaseArgs = parse_args(arguments)?;
        let query = args.query.trim();
        if query.is_empty() {
            return Err(ToolError::InvalidArguments(
                "query cannot be empty".to_string(),
            ));
        }

        let limit = args.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let results = Self::search(query, limit);
        log::debug!(
            "searchMedicalDatabase: {} results for {:?}",
            results.len(),
            query
        );

        Ok(json!({
            "query": query,
            "results": results,
        }))
    }
}
