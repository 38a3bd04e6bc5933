use serde::Deserialize;
use serde_json::{Value, json};

use crate::api::{ApiClient, ApiError};
use crate::models::{CandidateDetail, JobDetail};

/// The generation endpoints are structurally identical (context in, text
/// out), so they share one request type and one call path instead of a call
/// site per route.
#[derive(Debug)]
pub enum Generation<'a> {
    JobDescription { prompt: &'a str },
    Outreach { job: &'a JobDetail, candidate: &'a CandidateDetail },
    Summary { job: &'a JobDetail, candidate: &'a CandidateDetail },
}

impl Generation<'_> {
    pub fn path(&self) -> &'static str {
        match self {
            Generation::JobDescription { .. } => "/ai/generate-jd",
            Generation::Outreach { .. } => "/ai/generate-outreach",
            Generation::Summary { .. } => "/ai/generate-summary",
        }
    }

    pub fn body(&self) -> Value {
        match self {
            Generation::JobDescription { prompt } => json!({ "prompt": prompt }),
            Generation::Outreach { job, candidate } | Generation::Summary { job, candidate } => {
                json!({ "job": job, "candidate": candidate })
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeneratedText {
    #[serde(default)]
    text: String,
}

pub fn generate(client: &ApiClient, request: &Generation) -> Result<String, ApiError> {
    let response: GeneratedText = client.post_json(request.path(), &request.body())?;
    Ok(response.text)
}

#[derive(Debug, Deserialize)]
pub struct AiScore {
    pub score: f64,
    #[serde(default)]
    pub explanation: Option<String>,
}

impl AiScore {
    /// Match scores are 0-100 by contract; clamp whatever the model said.
    pub fn clamped(&self) -> f64 {
        self.score.clamp(0.0, 100.0)
    }
}

pub fn score_candidate(
    client: &ApiClient,
    job_description: &str,
    candidate_text: &str,
) -> Result<AiScore, ApiError> {
    client.post_json(
        "/ai/score-candidate",
        &json!({
            "jobDescription": job_description,
            "candidateText": candidate_text,
        }),
    )
}
