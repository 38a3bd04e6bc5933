use anyhow::{Context, Result};
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
};
use std::io::stdout;
use std::sync::mpsc;
use std::time::Duration;
use tracing::{info, warn};

use crate::api::{ApiClient, ApiError};
use crate::board::{Board, PendingMove};
use crate::models::{Candidate, PipelineStatus, STAGE_COUNT};

/// Result of an asynchronous confirmation coming back from a worker thread.
enum Outcome {
    Moved {
        pending: PendingMove,
        result: Result<(), ApiError>,
    },
    Attached {
        candidate: Candidate,
        result: Result<(), ApiError>,
    },
}

struct AttachPicker {
    choices: Vec<Candidate>,
    selected: usize,
}

struct BoardView {
    board: Board,
    job_title: String,
    all_candidates: Vec<Candidate>,
    column: usize,
    cursor: [usize; STAGE_COUNT],
    notice: Option<String>,
    attach: Option<AttachPicker>,
}

impl BoardView {
    fn new(board: Board, job_title: String, all_candidates: Vec<Candidate>) -> Self {
        Self {
            board,
            job_title,
            all_candidates,
            column: 0,
            cursor: [0; STAGE_COUNT],
            notice: None,
            attach: None,
        }
    }

    fn selected_status(&self) -> PipelineStatus {
        PipelineStatus::ALL[self.column]
    }

    /// Board mutations can shrink columns under the cursor.
    fn clamp_cursors(&mut self) {
        for status in PipelineStatus::ALL {
            let len = self.board.column(status).len();
            let cursor = &mut self.cursor[status.index()];
            *cursor = (*cursor).min(len.saturating_sub(1));
        }
    }

    fn next_card(&mut self) {
        let len = self.board.column(self.selected_status()).len();
        let cursor = &mut self.cursor[self.column];
        if len > 0 && *cursor < len - 1 {
            *cursor += 1;
        }
    }

    fn prev_card(&mut self) {
        let cursor = &mut self.cursor[self.column];
        *cursor = cursor.saturating_sub(1);
    }

    fn next_column(&mut self) {
        if self.column < STAGE_COUNT - 1 {
            self.column += 1;
        }
    }

    fn prev_column(&mut self) {
        self.column = self.column.saturating_sub(1);
    }

    /// The keyboard drag: relocates the selected card one column left or
    /// right. The local mutation is synchronous; the confirmation request it
    /// returns is handed to a worker by the caller.
    fn move_selected(&mut self, direction: isize) -> Option<PendingMove> {
        let src = self.selected_status();
        let src_idx = self.cursor[self.column];
        if self.board.column(src).is_empty() {
            return None;
        }
        let dst_col = self.column.checked_add_signed(direction)?;
        if dst_col >= STAGE_COUNT {
            return None;
        }
        let dst = PipelineStatus::ALL[dst_col];
        let dst_idx = self.board.column(dst).len();

        let pending = self.board.move_candidate(src, src_idx, dst, dst_idx)?;
        // Follow the card.
        self.column = dst_col;
        self.cursor[dst_col] = dst_idx;
        self.clamp_cursors();
        Some(pending)
    }

    /// Reorder within the selected column; still confirmed with the server,
    /// matching the drag semantics (any index change issues an update).
    fn reorder_selected(&mut self, direction: isize) -> Option<PendingMove> {
        let status = self.selected_status();
        let len = self.board.column(status).len();
        let src_idx = self.cursor[self.column];
        if len < 2 {
            return None;
        }
        let dst_idx = src_idx.checked_add_signed(direction)?;
        if dst_idx >= len {
            return None;
        }
        let pending = self.board.move_candidate(status, src_idx, status, dst_idx)?;
        self.cursor[self.column] = dst_idx;
        Some(pending)
    }

    fn open_attach_picker(&mut self) {
        let choices: Vec<Candidate> = self
            .board
            .available_candidates(&self.all_candidates)
            .into_iter()
            .cloned()
            .collect();
        if choices.is_empty() {
            self.notice = Some("No available candidates to attach.".to_string());
            return;
        }
        self.attach = Some(AttachPicker { choices, selected: 0 });
    }

    fn apply(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Moved { pending, result } => match result {
                Ok(()) => {
                    info!(link = %pending.link_id, candidate = %pending.candidate_id,
                        status = pending.new_status.as_str(), "move confirmed");
                }
                Err(err) => {
                    // Silent revert: the card reappearing in its old column
                    // is the only signal the user gets.
                    warn!(link = %pending.link_id, candidate = %pending.candidate_id, %err,
                        "move rejected; rolling back");
                    self.board.rollback(pending);
                    self.clamp_cursors();
                }
            },
            Outcome::Attached { candidate, result } => match result {
                Ok(()) => {
                    self.board.attach(&candidate);
                    self.notice = None;
                }
                Err(err) => {
                    self.notice =
                        Some(format!("Could not attach {}: {err}", candidate.display_name()));
                }
            },
        }
    }
}

fn load_board(client: &ApiClient, job_id: &str) -> Result<Board, ApiError> {
    let entries = client.job_candidates(job_id)?;
    Ok(Board::from_entries(job_id, entries))
}

/// Interactive pipeline board for one job.
pub fn run_board(client: &ApiClient, job_id: &str) -> Result<()> {
    let detail = client
        .job(job_id)
        .context("Unable to load job details right now. Please try again.")?;
    let board = load_board(client, job_id)
        .context("Unable to load the candidate pipeline right now. Please try again.")?;

    let mut view = BoardView::new(
        board,
        detail.title.unwrap_or_else(|| job_id.to_string()),
        Vec::new(),
    );
    match client.candidates() {
        Ok(candidates) => view.all_candidates = candidates,
        Err(err) => {
            warn!(%err, "could not load candidate pool; attach disabled");
            view.notice = Some("Candidate pool unavailable; attach is disabled.".to_string());
        }
    }

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_loop(&mut terminal, &mut view, client, job_id);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    view: &mut BoardView,
    client: &ApiClient,
    job_id: &str,
) -> Result<()> {
    let (tx, rx) = mpsc::channel::<Outcome>();

    loop {
        // Settle confirmations before drawing so the frame reflects them.
        while let Ok(outcome) = rx.try_recv() {
            view.apply(outcome);
        }

        terminal.draw(|frame| draw(frame, view))?;

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        if let Some(picker) = view.attach.as_mut() {
            match key.code {
                KeyCode::Esc | KeyCode::Char('q') => view.attach = None,
                KeyCode::Down | KeyCode::Char('j') => {
                    if picker.selected + 1 < picker.choices.len() {
                        picker.selected += 1;
                    }
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    picker.selected = picker.selected.saturating_sub(1);
                }
                KeyCode::Enter => {
                    let candidate = picker.choices[picker.selected].clone();
                    view.attach = None;
                    spawn_attach(client, job_id, &tx, candidate);
                }
                _ => {}
            }
            continue;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => break,
            KeyCode::Left | KeyCode::Char('h') => view.prev_column(),
            KeyCode::Right | KeyCode::Char('l') => view.next_column(),
            KeyCode::Down | KeyCode::Char('j') => view.next_card(),
            KeyCode::Up | KeyCode::Char('k') => view.prev_card(),
            KeyCode::Char('H') => {
                if let Some(pending) = view.move_selected(-1) {
                    spawn_confirm(client, job_id, &tx, pending);
                }
            }
            KeyCode::Char('L') => {
                if let Some(pending) = view.move_selected(1) {
                    spawn_confirm(client, job_id, &tx, pending);
                }
            }
            KeyCode::Char('J') => {
                if let Some(pending) = view.reorder_selected(1) {
                    spawn_confirm(client, job_id, &tx, pending);
                }
            }
            KeyCode::Char('K') => {
                if let Some(pending) = view.reorder_selected(-1) {
                    spawn_confirm(client, job_id, &tx, pending);
                }
            }
            KeyCode::Char('a') => view.open_attach_picker(),
            KeyCode::Char('r') => match load_board(client, job_id) {
                Ok(board) => {
                    view.board = board;
                    view.clamp_cursors();
                    view.notice = None;
                }
                Err(err) => {
                    warn!(%err, "board reload failed; keeping previous state");
                    view.notice = Some(
                        "Unable to load the pipeline right now. Press r to retry.".to_string(),
                    );
                }
            },
            _ => {}
        }
    }
    // Dropping the receiver discards any confirmation still in flight.
    Ok(())
}

fn spawn_confirm(
    client: &ApiClient,
    job_id: &str,
    tx: &mpsc::Sender<Outcome>,
    pending: PendingMove,
) {
    let client = client.clone();
    let job_id = job_id.to_string();
    let tx = tx.clone();
    std::thread::spawn(move || {
        let result =
            client.update_candidate_status(&job_id, &pending.candidate_id, pending.new_status);
        let _ = tx.send(Outcome::Moved { pending, result });
    });
}

fn spawn_attach(client: &ApiClient, job_id: &str, tx: &mpsc::Sender<Outcome>, candidate: Candidate) {
    let client = client.clone();
    let job_id = job_id.to_string();
    let tx = tx.clone();
    std::thread::spawn(move || {
        let result = client.link_candidate(&job_id, &candidate.id);
        let _ = tx.send(Outcome::Attached { candidate, result });
    });
}

fn stage_color(status: PipelineStatus) -> Color {
    match status {
        PipelineStatus::Sourced => Color::Cyan,
        PipelineStatus::Contacted => Color::Blue,
        PipelineStatus::Interviewing => Color::Yellow,
        PipelineStatus::Shortlisted => Color::Green,
        PipelineStatus::Rejected => Color::Red,
    }
}

fn draw(frame: &mut Frame, view: &BoardView) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            format!(" {} ", view.job_title),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("({} candidates on the board)", view.board.len()),
            Style::default().fg(Color::DarkGray),
        ),
    ]));
    frame.render_widget(header, rows[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(20); STAGE_COUNT])
        .split(rows[1]);

    for status in PipelineStatus::ALL {
        let entries = view.board.column(status);
        let items: Vec<ListItem> = entries
            .iter()
            .map(|entry| {
                let score = entry
                    .match_score
                    .map(|s| format!(" {:.0}%", s.clamp(0.0, 100.0)))
                    .unwrap_or_default();
                ListItem::new(format!("{}{}", entry.name, score))
            })
            .collect();

        let is_selected = status.index() == view.column;
        let border_style = if is_selected {
            Style::default().fg(stage_color(status))
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(border_style)
                    .title(format!(" {} ({}) ", status.label(), entries.len())),
            )
            .highlight_style(
                Style::default()
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");

        let area = columns[status.index()];
        if is_selected && !entries.is_empty() {
            let mut state = ListState::default();
            state.select(Some(view.cursor[status.index()]));
            frame.render_stateful_widget(list, area, &mut state);
        } else {
            frame.render_widget(list, area);
        }
    }

    let notice = Paragraph::new(view.notice.as_deref().unwrap_or(""))
        .style(Style::default().fg(Color::Red));
    frame.render_widget(notice, rows[2]);

    let help = Paragraph::new(
        " h/l:column  j/k:card  H/L:move card  J/K:reorder  a:attach  r:reload  q:quit",
    )
    .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, rows[3]);

    if let Some(picker) = &view.attach {
        draw_attach_picker(frame, picker);
    }
}

fn draw_attach_picker(frame: &mut Frame, picker: &AttachPicker) {
    let area = centered_rect(50, 60, frame.area());
    frame.render_widget(Clear, area);

    let items: Vec<ListItem> = picker
        .choices
        .iter()
        .map(|candidate| {
            let skills = if candidate.skills.is_empty() {
                String::new()
            } else {
                format!("  {}", candidate.skills.join(", "))
            };
            ListItem::new(format!("{}{}", candidate.display_name(), skills))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Attach Candidate (Enter to link, Esc to cancel) "),
        )
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(Some(picker.selected));
    frame.render_stateful_widget(list, area, &mut state);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::JobCandidate;

    fn wire(link: &str, status: &str) -> JobCandidate {
        JobCandidate {
            id: link.to_string(),
            candidate_id: Some(link.to_string()),
            full_name: Some(link.to_uppercase()),
            name: None,
            title: None,
            skills: vec![],
            match_score: None,
            notes: None,
            status: Some(status.to_string()),
        }
    }

    fn view() -> BoardView {
        let board = Board::from_entries(
            "j1",
            vec![wire("a", "SOURCED"), wire("b", "SOURCED"), wire("c", "CONTACTED")],
        );
        BoardView::new(board, "Engineer".to_string(), Vec::new())
    }

    #[test]
    fn test_move_selected_follows_card() {
        let mut v = view();
        let pending = v.move_selected(1).expect("move should happen");
        assert_eq!(pending.new_status, PipelineStatus::Contacted);
        assert_eq!(v.column, 1);
        // Appended after the existing contacted card.
        assert_eq!(v.cursor[1], 1);
        assert_eq!(v.board.column(PipelineStatus::Contacted).len(), 2);
    }

    #[test]
    fn test_move_selected_off_the_edge_is_none() {
        let mut v = view();
        assert!(v.move_selected(-1).is_none());
        v.column = STAGE_COUNT - 1;
        assert!(v.move_selected(1).is_none());
    }

    #[test]
    fn test_move_from_empty_column_is_none() {
        let mut v = view();
        v.column = PipelineStatus::Rejected.index();
        assert!(v.move_selected(-1).is_none());
    }

    #[test]
    fn test_reorder_bounds() {
        let mut v = view();
        // Only one card in Contacted: nothing to reorder against.
        v.column = 1;
        assert!(v.reorder_selected(1).is_none());

        v.column = 0;
        assert!(v.reorder_selected(-1).is_none(), "already at the top");
        let pending = v.reorder_selected(1).expect("swap downwards");
        assert_eq!(pending.new_status, PipelineStatus::Sourced);
        assert_eq!(v.cursor[0], 1);
    }

    #[test]
    fn test_failed_outcome_rolls_back_silently() {
        let mut v = view();
        let before = v.board.clone();
        let pending = v.move_selected(1).unwrap();
        v.apply(Outcome::Moved {
            pending,
            result: Err(ApiError::Status {
                status: 500,
                message: "boom".to_string(),
            }),
        });
        assert_eq!(v.board, before);
        assert!(v.notice.is_none(), "move failures never show a message");
    }

    #[test]
    fn test_attach_outcome_success_and_failure() {
        let mut v = view();
        let fresh = Candidate {
            id: "z".to_string(),
            full_name: Some("Zoe".to_string()),
            name: None,
            email: None,
            location: None,
            skills: vec![],
            created_at: None,
            match_score: None,
            status: None,
        };

        v.apply(Outcome::Attached {
            candidate: fresh.clone(),
            result: Ok(()),
        });
        assert!(v.board.contains_candidate("z"));

        v.apply(Outcome::Attached {
            candidate: fresh,
            result: Err(ApiError::Status {
                status: 409,
                message: "already linked".to_string(),
            }),
        });
        let notice = v.notice.expect("attach failures are visible");
        assert!(notice.contains("Zoe"));
    }

    #[test]
    fn test_open_attach_picker_excludes_board_members() {
        let mut v = view();
        v.all_candidates = vec![
            Candidate {
                id: "a".to_string(),
                full_name: Some("A".to_string()),
                name: None,
                email: None,
                location: None,
                skills: vec![],
                created_at: None,
                match_score: None,
                status: None,
            },
            Candidate {
                id: "free".to_string(),
                full_name: Some("Free".to_string()),
                name: None,
                email: None,
                location: None,
                skills: vec![],
                created_at: None,
                match_score: None,
                status: None,
            },
        ];
        v.open_attach_picker();
        let picker = v.attach.expect("picker opens when choices exist");
        assert_eq!(picker.choices.len(), 1);
        assert_eq!(picker.choices[0].id, "free");
    }

    #[test]
    fn test_cursor_clamps_after_shrink() {
        let mut v = view();
        v.cursor[0] = 1;
        v.move_selected(1).unwrap();
        v.column = 0;
        assert!(v.cursor[0] < v.board.column(PipelineStatus::Sourced).len().max(1));
    }
}
