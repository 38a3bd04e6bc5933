use crate::models::{Candidate, JobCandidate, PipelineStatus, STAGE_COUNT};

/// One card on the board: a job-candidate link plus the display fields the
/// columns render. `link_id` is the identity used for the partition
/// invariant; `candidate_id` addresses the status route.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardEntry {
    pub link_id: String,
    pub candidate_id: String,
    pub name: String,
    pub title: Option<String>,
    pub skills: Vec<String>,
    pub match_score: Option<f64>,
    pub status: PipelineStatus,
}

impl BoardEntry {
    pub fn from_wire(wire: JobCandidate) -> Self {
        let status = PipelineStatus::from_raw(wire.status.as_deref());
        Self {
            candidate_id: wire.candidate_id().to_string(),
            name: wire.display_name().to_string(),
            link_id: wire.id,
            title: wire.title,
            skills: wire.skills,
            match_score: wire.match_score,
            status,
        }
    }

    pub fn from_candidate(candidate: &Candidate) -> Self {
        Self {
            link_id: candidate.id.clone(),
            candidate_id: candidate.id.clone(),
            name: candidate.display_name().to_string(),
            title: None,
            skills: candidate.skills.clone(),
            match_score: candidate.match_score,
            status: PipelineStatus::Sourced,
        }
    }
}

type Columns = [Vec<BoardEntry>; STAGE_COUNT];

/// An optimistic move that has been applied locally but not yet confirmed.
/// Carries the exact pre-move column state; a failed confirmation restores
/// that snapshot wholesale rather than applying an inverse patch, so a
/// rollback racing a later move can clobber it (accepted limitation).
#[derive(Debug)]
pub struct PendingMove {
    pub link_id: String,
    pub candidate_id: String,
    pub new_status: PipelineStatus,
    snapshot: Columns,
}

/// Per-job grouping of candidates by pipeline stage. Exclusively owned by
/// the pipeline view; all mutation goes through the methods below, and a
/// reload replaces the whole thing at once.
#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    job_id: String,
    columns: Columns,
}

impl Board {
    pub fn empty(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            columns: Default::default(),
        }
    }

    /// Groups fetched pipeline entries into columns, preserving fetch order.
    /// Entries with no recognizable status land in `Sourced`.
    pub fn from_entries(job_id: impl Into<String>, entries: Vec<JobCandidate>) -> Self {
        let mut board = Self::empty(job_id);
        for wire in entries {
            let entry = BoardEntry::from_wire(wire);
            board.columns[entry.status.index()].push(entry);
        }
        board
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn column(&self, status: PipelineStatus) -> &[BoardEntry] {
        &self.columns[status.index()]
    }

    pub fn len(&self) -> usize {
        self.columns.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains_candidate(&self, candidate_id: &str) -> bool {
        self.columns
            .iter()
            .flatten()
            .any(|entry| entry.candidate_id == candidate_id)
    }

    /// Relocates the card at `src[src_idx]` to `dst[dst_idx]`, synchronously
    /// and before any network traffic: the caller issues the status-update
    /// request afterwards and settles the returned `PendingMove` with
    /// `rollback` if it fails.
    ///
    /// Returns `None` for the same-column-same-index no-op (spurious drop),
    /// in which case no request must be issued. `src_idx` must be in bounds;
    /// `dst_idx` beyond the destination length appends.
    pub fn move_candidate(
        &mut self,
        src: PipelineStatus,
        src_idx: usize,
        dst: PipelineStatus,
        dst_idx: usize,
    ) -> Option<PendingMove> {
        if src == dst && src_idx == dst_idx {
            return None;
        }

        let snapshot = self.columns.clone();

        let mut entry = self.columns[src.index()].remove(src_idx);
        entry.status = dst;
        let pending = PendingMove {
            link_id: entry.link_id.clone(),
            candidate_id: entry.candidate_id.clone(),
            new_status: dst,
            snapshot,
        };

        let column = &mut self.columns[dst.index()];
        let at = dst_idx.min(column.len());
        column.insert(at, entry);

        Some(pending)
    }

    /// Failed confirmation: restore that move's own pre-move snapshot.
    pub fn rollback(&mut self, pending: PendingMove) {
        self.columns = pending.snapshot;
    }

    /// A freshly linked candidate starts at the end of `Sourced`.
    pub fn attach(&mut self, candidate: &Candidate) {
        self.columns[PipelineStatus::Sourced.index()].push(BoardEntry::from_candidate(candidate));
    }

    /// Candidates eligible for attaching: everything not already on the
    /// board, in any column.
    pub fn available_candidates<'a>(&self, all: &'a [Candidate]) -> Vec<&'a Candidate> {
        all.iter()
            .filter(|candidate| !self.contains_candidate(&candidate.id))
            .collect()
    }
}
