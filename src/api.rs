use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, multipart};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::path::Path;
use tracing::{debug, warn};

use crate::config::Config;
use crate::models::{
    Candidate, CandidateDetail, Job, JobCandidate, JobDetail, PipelineStatus, User,
};
use crate::session::{RegisterProfile, TokenStore};

/// Normalized failure of an API call. `Unauthorized` is the cross-cutting
/// signal: by the time a caller sees it, the persisted credential is already
/// gone. Everything else is classified by the call site via `anyhow` context
/// (read, auth, link, upload).
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("your session has expired; sign in again with `hireflow login`")]
    Unauthorized,
    #[error("request failed with status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("could not read file: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Default, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDraft {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seniority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_max: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub required_skills: Vec<String>,
}

#[derive(Debug, Clone, Default, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: String,
    pub company_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

/// Thin wrapper over the HireFlow HTTP API: bearer credential on every
/// request, JSON bodies, normalized errors. Cheap to clone; worker threads
/// confirming board moves each carry their own copy.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base: String,
    tokens: TokenStore,
}

impl ApiClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: Client::new(),
            base: config.api_url.clone(),
            tokens: TokenStore::new(&config.token_path),
        }
    }

    pub fn has_token(&self) -> bool {
        self.tokens.load().is_some()
    }

    pub fn store_token(&self, token: &str) -> anyhow::Result<()> {
        self.tokens.save(token)
    }

    pub fn clear_token(&self) {
        self.tokens.clear();
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Sends one request and normalizes the outcome. A 401 from any endpoint
    /// purges the persisted credential before returning; this is the only
    /// place that rule lives.
    fn check(&self, req: RequestBuilder, path: &str) -> Result<String, ApiError> {
        let req = match self.tokens.load() {
            Some(token) => req.bearer_auth(token),
            None => req,
        };

        let response = req.send()?;
        let status = response.status();
        debug!(%path, status = status.as_u16(), "api response");

        if status == StatusCode::UNAUTHORIZED {
            warn!(%path, "unauthorized response; clearing stored credential");
            self.tokens.clear();
            return Err(ApiError::Unauthorized);
        }

        let body = response.text()?;
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: error_message(&body, status),
            });
        }
        Ok(body)
    }

    fn fetch<T: DeserializeOwned>(&self, req: RequestBuilder, path: &str) -> Result<T, ApiError> {
        let body = self.check(req, path)?;
        Ok(serde_json::from_str(&body)?)
    }

    /// For ack-only endpoints whose response body carries nothing we need.
    fn ack(&self, req: RequestBuilder, path: &str) -> Result<(), ApiError> {
        self.check(req, path).map(|_| ())
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.fetch(self.http.get(self.url(path)), path)
    }

    pub(crate) fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl serde::Serialize,
    ) -> Result<T, ApiError> {
        self.fetch(self.http.post(self.url(path)).json(body), path)
    }

    // --- Session ---

    pub fn me(&self) -> Result<User, ApiError> {
        #[derive(Deserialize)]
        struct Me {
            user: User,
        }
        self.get::<Me>("/me").map(|me| me.user)
    }

    pub fn update_profile(&self, update: &ProfileUpdate) -> Result<(), ApiError> {
        self.ack(self.http.put(self.url("/me")).json(update), "/me")
    }

    pub fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        self.post_json(
            "/auth/login",
            &json!({ "email": email, "password": password }),
        )
    }

    pub fn register(&self, profile: &RegisterProfile) -> Result<AuthResponse, ApiError> {
        self.post_json("/auth/register", profile)
    }

    // --- Jobs ---

    pub fn jobs(&self) -> Result<Vec<Job>, ApiError> {
        self.get("/jobs")
    }

    pub fn job(&self, id: &str) -> Result<JobDetail, ApiError> {
        self.get(&format!("/jobs/{id}"))
    }

    pub fn create_job(&self, draft: &JobDraft) -> Result<Job, ApiError> {
        self.post_json("/jobs", draft)
    }

    pub fn update_job(&self, id: &str, update: &JobUpdate) -> Result<Job, ApiError> {
        let path = format!("/jobs/{id}");
        self.fetch(self.http.put(self.url(&path)).json(update), &path)
    }

    // --- Pipeline ---

    pub fn job_candidates(&self, job_id: &str) -> Result<Vec<JobCandidate>, ApiError> {
        self.get(&format!("/jobs/{job_id}/candidates"))
    }

    pub fn update_candidate_status(
        &self,
        job_id: &str,
        candidate_id: &str,
        status: PipelineStatus,
    ) -> Result<(), ApiError> {
        let path = format!("/jobs/{job_id}/candidates/{candidate_id}/status");
        self.ack(
            self.http
                .put(self.url(&path))
                .json(&json!({ "status": status })),
            &path,
        )
    }

    pub fn link_candidate(&self, job_id: &str, candidate_id: &str) -> Result<(), ApiError> {
        let path = format!("/jobs/{job_id}/candidates/{candidate_id}/link");
        self.ack(self.http.post(self.url(&path)), &path)
    }

    // --- Candidates ---

    pub fn candidates(&self) -> Result<Vec<Candidate>, ApiError> {
        self.get("/candidates")
    }

    pub fn candidate(&self, id: &str) -> Result<CandidateDetail, ApiError> {
        self.get(&format!("/candidates/{id}"))
    }

    pub fn upload_resume(&self, file: &Path) -> Result<Candidate, ApiError> {
        let form = multipart::Form::new().file("resume", file)?;
        let path = "/candidates/upload";
        self.fetch(self.http.post(self.url(path)).multipart(form), path)
    }
}

/// Servers answer failures with `{ "message": ... }` when they have one.
fn error_message(body: &str, status: StatusCode) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: String,
    }
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        return parsed.message;
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        trimmed.chars().take(200).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread::JoinHandle;

    /// One-shot HTTP stub: answers a single request with a canned response
    /// and hands back the raw request for assertions. No mocking crate
    /// needed for a blocking client.
    fn stub_server(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut raw = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let n = stream.read(&mut chunk).unwrap();
                raw.extend_from_slice(&chunk[..n]);
                if n == 0 || raw.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            let head = String::from_utf8_lossy(&raw).to_string();
            if let Some(len) = content_length(&head) {
                let header_end = raw
                    .windows(4)
                    .position(|w| w == b"\r\n\r\n")
                    .map(|p| p + 4)
                    .unwrap_or(raw.len());
                let mut remaining = len.saturating_sub(raw.len() - header_end);
                while remaining > 0 {
                    let n = stream.read(&mut chunk).unwrap();
                    if n == 0 {
                        break;
                    }
                    raw.extend_from_slice(&chunk[..n]);
                    remaining = remaining.saturating_sub(n);
                }
            }
            write!(
                stream,
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len(),
            )
            .unwrap();
            String::from_utf8_lossy(&raw).to_string()
        });
        (format!("http://{addr}"), handle)
    }

    fn content_length(head: &str) -> Option<usize> {
        head.lines()
            .find(|line| line.to_ascii_lowercase().starts_with("content-length:"))
            .and_then(|line| line.split(':').nth(1))
            .and_then(|value| value.trim().parse().ok())
    }

    fn client_for(base: String, token_path: &Path) -> ApiClient {
        let config = Config {
            api_url: base,
            token_path: token_path.to_path_buf(),
            log_path: token_path.with_extension("log"),
        };
        ApiClient::new(&config)
    }

    #[test]
    fn test_bearer_header_attached_when_token_present() {
        let dir = tempfile::tempdir().unwrap();
        let token_path = dir.path().join("token");
        std::fs::write(&token_path, "tok-123").unwrap();

        let (base, server) = stub_server("200 OK", r#"[]"#);
        let client = client_for(base, &token_path);

        let jobs = client.jobs().unwrap();
        assert!(jobs.is_empty());

        let request = server.join().unwrap();
        assert!(request.starts_with("GET /jobs HTTP/1.1"));
        assert!(request.contains("authorization: Bearer tok-123"));
    }

    #[test]
    fn test_no_bearer_header_without_token() {
        let dir = tempfile::tempdir().unwrap();
        let (base, server) = stub_server("200 OK", r#"[]"#);
        let client = client_for(base, &dir.path().join("token"));

        client.jobs().unwrap();
        let request = server.join().unwrap();
        assert!(!request.to_ascii_lowercase().contains("authorization:"));
    }

    #[test]
    fn test_unauthorized_purges_credential_from_any_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let token_path = dir.path().join("token");
        std::fs::write(&token_path, "stale").unwrap();

        let (base, server) = stub_server("401 Unauthorized", r#"{"message":"expired"}"#);
        let client = client_for(base, &token_path);

        let err = client.candidates().unwrap_err();
        server.join().unwrap();

        assert!(matches!(err, ApiError::Unauthorized));
        assert!(!token_path.exists(), "credential must be cleared on 401");
        assert!(!client.has_token());
    }

    #[test]
    fn test_non_success_status_extracts_server_message() {
        let dir = tempfile::tempdir().unwrap();
        let (base, server) = stub_server("409 Conflict", r#"{"message":"candidate already linked"}"#);
        let client = client_for(base, &dir.path().join("token"));

        let err = client.link_candidate("j1", "c1").unwrap_err();
        let request = server.join().unwrap();

        assert!(request.starts_with("POST /jobs/j1/candidates/c1/link"));
        match err {
            ApiError::Status { status, message } => {
                assert_eq!(status, 409);
                assert_eq!(message, "candidate already linked");
            }
            other => panic!("expected Status error, got {other:?}"),
        }
    }

    #[test]
    fn test_status_update_sends_enum_wire_form() {
        let dir = tempfile::tempdir().unwrap();
        let (base, server) = stub_server("200 OK", r#"{"status":"SHORTLISTED"}"#);
        let client = client_for(base, &dir.path().join("token"));

        client
            .update_candidate_status("j1", "c2", PipelineStatus::Shortlisted)
            .unwrap();
        let request = server.join().unwrap();

        assert!(request.starts_with("PUT /jobs/j1/candidates/c2/status"));
        assert!(request.contains(r#"{"status":"SHORTLISTED"}"#));
    }

    #[test]
    fn test_error_message_fallbacks() {
        assert_eq!(
            error_message("not json at all", StatusCode::BAD_GATEWAY),
            "not json at all"
        );
        assert_eq!(
            error_message("", StatusCode::BAD_GATEWAY),
            "Bad Gateway"
        );
        assert_eq!(
            error_message(r#"{"message":"nope"}"#, StatusCode::BAD_REQUEST),
            "nope"
        );
    }
}
