use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Pipeline stage of a candidate on a job's board. The five stages are
/// parallel columns with fixed display positions, not ranks; any stage may
/// move to any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineStatus {
    Sourced,
    Contacted,
    Interviewing,
    Shortlisted,
    Rejected,
}

pub const STAGE_COUNT: usize = 5;

impl PipelineStatus {
    pub const ALL: [PipelineStatus; STAGE_COUNT] = [
        PipelineStatus::Sourced,
        PipelineStatus::Contacted,
        PipelineStatus::Interviewing,
        PipelineStatus::Shortlisted,
        PipelineStatus::Rejected,
    ];

    /// Fixed column position on the board.
    pub fn index(self) -> usize {
        match self {
            PipelineStatus::Sourced => 0,
            PipelineStatus::Contacted => 1,
            PipelineStatus::Interviewing => 2,
            PipelineStatus::Shortlisted => 3,
            PipelineStatus::Rejected => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PipelineStatus::Sourced => "Sourced",
            PipelineStatus::Contacted => "Contacted",
            PipelineStatus::Interviewing => "Interviewing",
            PipelineStatus::Shortlisted => "Shortlisted",
            PipelineStatus::Rejected => "Rejected",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PipelineStatus::Sourced => "SOURCED",
            PipelineStatus::Contacted => "CONTACTED",
            PipelineStatus::Interviewing => "INTERVIEWING",
            PipelineStatus::Shortlisted => "SHORTLISTED",
            PipelineStatus::Rejected => "REJECTED",
        }
    }

    /// Lenient parse for server data: a missing or unrecognized status lands
    /// the candidate in `Sourced`.
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_uppercase()).as_deref() {
            Some("SOURCED") => PipelineStatus::Sourced,
            Some("CONTACTED") => PipelineStatus::Contacted,
            Some("INTERVIEWING") => PipelineStatus::Interviewing,
            Some("SHORTLISTED") => PipelineStatus::Shortlisted,
            Some("REJECTED") => PipelineStatus::Rejected,
            _ => PipelineStatus::Sourced,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub email: String,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

impl User {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.email)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub candidate_count: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDetail {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub seniority: Option<String>,
    #[serde(default)]
    pub salary_range: Option<String>,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub candidates: Vec<JobCandidate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub match_score: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
}

impl Candidate {
    /// The API is inconsistent about the name field across endpoints.
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or("(unnamed)")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateDetail {
    pub id: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub linkedin: Option<String>,
    #[serde(default)]
    pub github: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub experience: Vec<Experience>,
    #[serde(default)]
    pub raw_text: Option<String>,
}

impl CandidateDetail {
    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or("(unnamed)")
    }
}

/// Association record linking a Candidate to a Job. Owns the pipeline
/// placement: `id` is the link identifier, `status` the current stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobCandidate {
    pub id: String,
    #[serde(default)]
    pub candidate_id: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub match_score: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl JobCandidate {
    /// Some deployments return the candidate id only as the link id.
    pub fn candidate_id(&self) -> &str {
        self.candidate_id.as_deref().unwrap_or(&self.id)
    }

    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or("(unnamed)")
    }
}

/// Client-side candidate search: case-insensitive substring over name,
/// email, location and skills. Empty query matches everything.
pub fn filter_candidates<'a>(candidates: &'a [Candidate], query: &str) -> Vec<&'a Candidate> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return candidates.iter().collect();
    }

    candidates
        .iter()
        .filter(|candidate| {
            let skills = candidate.skills.join(" ").to_lowercase();
            candidate.display_name().to_lowercase().contains(&query)
                || candidate
                    .email
                    .as_deref()
                    .is_some_and(|e| e.to_lowercase().contains(&query))
                || candidate
                    .location
                    .as_deref()
                    .is_some_and(|l| l.to_lowercase().contains(&query))
                || skills.contains(&query)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: &str, email: &str, location: &str, skills: &[&str]) -> Candidate {
        Candidate {
            id: name.to_lowercase(),
            full_name: Some(name.to_string()),
            name: None,
            email: Some(email.to_string()),
            location: Some(location.to_string()),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            created_at: None,
            match_score: None,
            status: None,
        }
    }

    #[test]
    fn test_status_round_trip() {
        for status in PipelineStatus::ALL {
            assert_eq!(PipelineStatus::from_raw(Some(status.as_str())), status);
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }

    #[test]
    fn test_status_defaults_to_sourced() {
        assert_eq!(PipelineStatus::from_raw(None), PipelineStatus::Sourced);
        assert_eq!(PipelineStatus::from_raw(Some("")), PipelineStatus::Sourced);
        assert_eq!(
            PipelineStatus::from_raw(Some("ARCHIVED")),
            PipelineStatus::Sourced
        );
        assert_eq!(
            PipelineStatus::from_raw(Some("shortlisted")),
            PipelineStatus::Shortlisted
        );
    }

    #[test]
    fn test_status_positions_are_stable() {
        for (expected, status) in PipelineStatus::ALL.into_iter().enumerate() {
            assert_eq!(status.index(), expected);
        }
    }

    #[test]
    fn test_job_candidate_falls_back_to_link_id() {
        let jc: JobCandidate = serde_json::from_str(r#"{"id":"link-1"}"#).unwrap();
        assert_eq!(jc.candidate_id(), "link-1");

        let jc: JobCandidate =
            serde_json::from_str(r#"{"id":"link-1","candidateId":"cand-9"}"#).unwrap();
        assert_eq!(jc.candidate_id(), "cand-9");
    }

    #[test]
    fn test_filter_candidates_empty_query_returns_all() {
        let candidates = vec![
            candidate("Ada Lovelace", "ada@example.com", "London", &["Rust"]),
            candidate("Grace Hopper", "grace@example.com", "Arlington", &["COBOL"]),
        ];
        assert_eq!(filter_candidates(&candidates, "").len(), 2);
        assert_eq!(filter_candidates(&candidates, "   ").len(), 2);
    }

    #[test]
    fn test_filter_candidates_matches_each_field() {
        let candidates = vec![
            candidate("Ada Lovelace", "ada@example.com", "London", &["Rust", "C++"]),
            candidate("Grace Hopper", "grace@navy.mil", "Arlington", &["COBOL"]),
        ];

        let by_name = filter_candidates(&candidates, "lovelace");
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].display_name(), "Ada Lovelace");

        assert_eq!(filter_candidates(&candidates, "navy.mil").len(), 1);
        assert_eq!(filter_candidates(&candidates, "arling").len(), 1);
        assert_eq!(filter_candidates(&candidates, "rust").len(), 1);
        assert_eq!(filter_candidates(&candidates, "fortran").len(), 0);
    }
}
