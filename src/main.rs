mod ai;
mod api;
mod board;
mod config;
mod dashboard;
mod models;
mod session;
mod tui;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use api::{ApiClient, JobDraft, JobUpdate, ProfileUpdate};
use board::Board;
use config::Config;
use models::{PipelineStatus, User};
use session::{RegisterProfile, Session};

#[derive(Parser)]
#[command(name = "hireflow")]
#[command(about = "HireFlow recruiting workspace - jobs, candidates, and the pipeline board")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store a session credential
    Login {
        /// Work email
        email: String,

        /// Account password
        password: String,
    },

    /// Create an account and sign in
    Register {
        /// Full name
        name: String,

        /// Company name
        company: String,

        /// Work email
        email: String,

        /// Account password
        password: String,
    },

    /// Clear the stored session credential
    Logout,

    /// Show the current identity
    Whoami,

    /// Hiring overview: active roles, pipeline health, top matches
    Dashboard,

    /// Manage job postings
    Jobs {
        #[command(subcommand)]
        command: JobCommands,
    },

    /// Browse the talent pool
    Candidates {
        #[command(subcommand)]
        command: CandidateCommands,
    },

    /// Open the interactive pipeline board for a job
    Board {
        /// Job ID
        job_id: String,
    },

    /// AI helpers: job descriptions, outreach, summaries, fit scores
    Ai {
        #[command(subcommand)]
        command: AiCommands,
    },

    /// Account settings
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
}

#[derive(Subcommand)]
enum JobCommands {
    /// List job postings
    List,

    /// Show a job with its pipeline summary
    Show {
        /// Job ID
        id: String,
    },

    /// Create a job posting
    Create {
        /// Job title
        title: String,

        #[arg(short, long)]
        company: Option<String>,

        #[arg(short, long)]
        location: Option<String>,

        #[arg(long)]
        seniority: Option<String>,

        #[arg(long)]
        salary_min: Option<i64>,

        #[arg(long)]
        salary_max: Option<i64>,

        #[arg(short, long)]
        description: Option<String>,

        /// Comma-separated required skills
        #[arg(long)]
        skills: Option<String>,
    },

    /// Update fields on an existing job
    Update {
        /// Job ID
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(short, long)]
        company: Option<String>,

        #[arg(short, long)]
        location: Option<String>,

        #[arg(short, long)]
        description: Option<String>,
    },

    /// Generate a job description with AI, optionally saving it to the job
    Describe {
        /// Job ID
        id: String,

        /// What the role needs (seniority, key skills, location)
        #[arg(short, long)]
        prompt: Option<String>,

        /// Save the generated text as the job's description
        #[arg(long)]
        apply: bool,
    },
}

#[derive(Subcommand)]
enum CandidateCommands {
    /// List candidates
    List {
        /// Filter by name, email, location, or skill
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Show a candidate profile
    Show {
        /// Candidate ID
        id: String,
    },

    /// Add a candidate by uploading a resume
    Upload {
        /// Path to the resume file (PDF, DOC, or DOCX)
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum AiCommands {
    /// Draft an outreach message for a candidate and job
    Outreach {
        /// Job ID
        job_id: String,

        /// Candidate ID
        candidate_id: String,
    },

    /// Summarize a candidate against a job
    Summary {
        /// Job ID
        job_id: String,

        /// Candidate ID
        candidate_id: String,
    },

    /// Score a candidate's fit for a job (0-100)
    Score {
        /// Job ID
        job_id: String,

        /// Candidate ID
        candidate_id: String,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Update name, company, and bio
    Update {
        #[arg(long)]
        name: String,

        #[arg(long)]
        company: String,

        #[arg(long)]
        bio: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env();
    init_logging(&config)?;
    let client = ApiClient::new(&config);

    match cli.command {
        Commands::Login { email, password } => {
            let session = Session::login(&client, &email, &password)?;
            if let Some(user) = session.user() {
                println!("Signed in as {}.", user.display_name());
            }
        }

        Commands::Register {
            name,
            company,
            email,
            password,
        } => {
            let profile = RegisterProfile {
                name,
                company_name: company,
                email,
                password,
            };
            let session = Session::register(&client, &profile)?;
            if let Some(user) = session.user() {
                println!("Welcome to HireFlow, {}.", user.display_name());
            }
        }

        Commands::Logout => {
            Session::logout(&client);
            println!("Signed out.");
        }

        Commands::Whoami => {
            let session = Session::initialize(&client);
            match session.user() {
                Some(user) => {
                    println!("{} <{}>", user.display_name(), user.email);
                    if let Some(company) = &user.company_name {
                        println!("Company: {}", company);
                    }
                }
                None => println!("Not signed in."),
            }
        }

        Commands::Dashboard => {
            signed_in(&client, "hireflow dashboard")?;
            run_dashboard(&client)?;
        }

        Commands::Jobs { command } => {
            signed_in(&client, "hireflow jobs")?;
            run_jobs(&client, command)?;
        }

        Commands::Candidates { command } => {
            signed_in(&client, "hireflow candidates")?;
            run_candidates(&client, command)?;
        }

        Commands::Board { job_id } => {
            signed_in(&client, &format!("hireflow board {job_id}"))?;
            tui::run_board(&client, &job_id)?;
        }

        Commands::Ai { command } => {
            signed_in(&client, "hireflow ai")?;
            run_ai(&client, command)?;
        }

        Commands::Profile { command } => {
            signed_in(&client, "hireflow profile update")?;
            match command {
                ProfileCommands::Update { name, company, bio } => {
                    let update = ProfileUpdate {
                        name: name.trim().to_string(),
                        company_name: company.trim().to_string(),
                        bio: bio.map(|b| b.trim().to_string()).filter(|b| !b.is_empty()),
                    };
                    client
                        .update_profile(&update)
                        .context("Unable to save changes right now. Please try again.")?;
                    println!("Your profile was updated successfully.");
                }
            }
        }
    }

    Ok(())
}

/// Route guard for authenticated commands: resolve the session once, fail
/// with a pointer back to the attempted command when anonymous.
fn signed_in(client: &ApiClient, attempted: &str) -> Result<User> {
    let session = Session::initialize(client);
    session.require_user(attempted).cloned()
}

fn init_logging(config: &Config) -> Result<()> {
    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)
        .with_context(|| format!("failed to open log file {}", config.log_path.display()))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(false).with_writer(file))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    Ok(())
}

fn run_dashboard(client: &ApiClient) -> Result<()> {
    let jobs = client
        .jobs()
        .context("Unable to load dashboard data right now.")?;
    let candidates = client
        .candidates()
        .context("Unable to load dashboard data right now.")?;

    let active = dashboard::active_jobs(&jobs);
    let avg_days = dashboard::average_days_open(&active, Utc::now());
    let rate = dashboard::shortlist_rate(&candidates, dashboard::fallback_shortlist_rate());

    println!("Active jobs:       {}", active.len());
    println!("Total candidates:  {}", candidates.len());
    match avg_days {
        Some(days) => println!("Avg days open:     {}", days),
        None => println!("Avg days open:     -"),
    }
    println!("Shortlist rate:    {}%", rate);

    let recent = dashboard::recent_jobs(&jobs);
    if !recent.is_empty() {
        println!("\nRecent jobs:");
        println!("{:<12} {:<30} {:<20} {:<10}", "ID", "TITLE", "COMPANY", "STATUS");
        println!("{}", "-".repeat(74));
        for job in recent {
            println!(
                "{:<12} {:<30} {:<20} {:<10}",
                truncate(&job.id, 10),
                truncate(job.title.as_deref().unwrap_or("-"), 28),
                truncate(job.company.as_deref().unwrap_or("-"), 18),
                job.status.as_deref().unwrap_or("-"),
            );
        }
    }

    let top = dashboard::top_candidates(&candidates);
    if !top.is_empty() {
        println!("\nTop candidates:");
        println!("{:<12} {:<30} {:<20} {:>6}", "ID", "NAME", "LOCATION", "MATCH");
        println!("{}", "-".repeat(70));
        for candidate in top {
            let score = candidate
                .match_score
                .map(|s| format!("{:.0}%", s.clamp(0.0, 100.0)))
                .unwrap_or_else(|| "-".to_string());
            println!(
                "{:<12} {:<30} {:<20} {:>6}",
                truncate(&candidate.id, 10),
                truncate(candidate.display_name(), 28),
                truncate(candidate.location.as_deref().unwrap_or("-"), 18),
                score,
            );
        }
    }

    Ok(())
}

fn run_jobs(client: &ApiClient, command: JobCommands) -> Result<()> {
    match command {
        JobCommands::List => {
            let jobs = client
                .jobs()
                .context("Unable to load jobs right now. Please try again.")?;
            if jobs.is_empty() {
                println!("No jobs yet. Create one with `hireflow jobs create`.");
                return Ok(());
            }
            println!(
                "{:<12} {:<30} {:<20} {:<16} {:>10}",
                "ID", "TITLE", "COMPANY", "LOCATION", "CANDIDATES"
            );
            println!("{}", "-".repeat(92));
            for job in jobs {
                println!(
                    "{:<12} {:<30} {:<20} {:<16} {:>10}",
                    truncate(&job.id, 10),
                    truncate(job.title.as_deref().unwrap_or("-"), 28),
                    truncate(job.company.as_deref().unwrap_or("-"), 18),
                    truncate(job.location.as_deref().unwrap_or("-"), 14),
                    job.candidate_count
                        .map(|c| c.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                );
            }
        }

        JobCommands::Show { id } => {
            let job = client
                .job(&id)
                .context("Unable to load job details right now. Please try again.")?;
            println!("{}", job.title.as_deref().unwrap_or("(untitled)"));
            if let Some(company) = &job.company {
                println!("at {}", company);
            }
            if let Some(location) = &job.location {
                println!("Location: {}", location);
            }
            if let Some(seniority) = &job.seniority {
                println!("Seniority: {}", seniority);
            }
            if let Some(range) = &job.salary_range {
                println!("Salary range: {}", range);
            }
            if !job.required_skills.is_empty() {
                println!("Required skills: {}", job.required_skills.join(", "));
            }
            if let Some(description) = &job.description {
                println!("\n{}", textwrap::fill(description, 78));
            }

            let board = Board::from_entries(job.id.clone(), job.candidates);
            if !board.is_empty() {
                println!("\nPipeline:");
                for status in PipelineStatus::ALL {
                    let column = board.column(status);
                    if column.is_empty() {
                        continue;
                    }
                    let names: Vec<&str> =
                        column.iter().map(|entry| entry.name.as_str()).collect();
                    println!("  {:<14} {}", status.label(), names.join(", "));
                }
                println!("\nOpen the board with `hireflow board {}`.", job.id);
            }
        }

        JobCommands::Create {
            title,
            company,
            location,
            seniority,
            salary_min,
            salary_max,
            description,
            skills,
        } => {
            let draft = JobDraft {
                title,
                company,
                location,
                seniority,
                salary_min,
                salary_max,
                description,
                required_skills: skills
                    .map(|raw| {
                        raw.split(',')
                            .map(|s| s.trim().to_string())
                            .filter(|s| !s.is_empty())
                            .collect()
                    })
                    .unwrap_or_default(),
            };
            let job = client
                .create_job(&draft)
                .context("Could not create the job right now. Please try again.")?;
            println!(
                "Created job {} ({}).",
                job.title.as_deref().unwrap_or("(untitled)"),
                job.id
            );
        }

        JobCommands::Update {
            id,
            title,
            company,
            location,
            description,
        } => {
            let update = JobUpdate {
                title,
                company,
                location,
                description,
            };
            let job = client
                .update_job(&id, &update)
                .context("Could not save changes to the job. Please try again.")?;
            println!(
                "Updated job {} ({}).",
                job.title.as_deref().unwrap_or("(untitled)"),
                job.id
            );
        }

        JobCommands::Describe { id, prompt, apply } => {
            let job = client
                .job(&id)
                .context("Unable to load job details right now. Please try again.")?;

            // Seed the prompt from the job itself when none is given, the
            // same way the product pre-fills its generation dialog.
            let prompt = prompt.unwrap_or_else(|| {
                format!(
                    "Job: {}. Location: {}. Key skills: {}.",
                    job.title.as_deref().unwrap_or(""),
                    job.location.as_deref().unwrap_or(""),
                    job.required_skills.join(", "),
                )
            });

            let text = ai::generate(client, &ai::Generation::JobDescription { prompt: &prompt })
                .context("We could not generate a JD right now. Please try again later.")?;
            println!("{}", textwrap::fill(&text, 78));

            if apply {
                let update = JobUpdate {
                    description: Some(text),
                    ..JobUpdate::default()
                };
                client
                    .update_job(&id, &update)
                    .context("Could not save the generated description. Please try again.")?;
                println!("\nSaved as the job description.");
            }
        }
    }
    Ok(())
}

fn run_candidates(client: &ApiClient, command: CandidateCommands) -> Result<()> {
    match command {
        CandidateCommands::List { search } => {
            let candidates = client
                .candidates()
                .context("Unable to load candidates right now. Please try again.")?;
            let visible = models::filter_candidates(&candidates, search.as_deref().unwrap_or(""));
            if visible.is_empty() {
                println!("No candidates match this search yet.");
                return Ok(());
            }
            println!(
                "{:<12} {:<26} {:<26} {:<16} {:>6}",
                "ID", "NAME", "EMAIL", "LOCATION", "MATCH"
            );
            println!("{}", "-".repeat(90));
            for candidate in &visible {
                let score = candidate
                    .match_score
                    .map(|s| format!("{:.0}%", s.clamp(0.0, 100.0)))
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{:<12} {:<26} {:<26} {:<16} {:>6}",
                    truncate(&candidate.id, 10),
                    truncate(candidate.display_name(), 24),
                    truncate(candidate.email.as_deref().unwrap_or("-"), 24),
                    truncate(candidate.location.as_deref().unwrap_or("-"), 14),
                    score,
                );
            }
            println!("\n{} candidates shown", visible.len());
        }

        CandidateCommands::Show { id } => {
            let candidate = client
                .candidate(&id)
                .context("Unable to load candidate details right now. Please try again.")?;
            println!("{}", candidate.display_name());
            if let Some(email) = &candidate.email {
                println!("Email: {}", email);
            }
            if let Some(phone) = &candidate.phone {
                println!("Phone: {}", phone);
            }
            if let Some(location) = &candidate.location {
                println!("Location: {}", location);
            }
            for (label, link) in [
                ("LinkedIn", &candidate.linkedin),
                ("GitHub", &candidate.github),
                ("Website", &candidate.website),
            ] {
                if let Some(link) = link {
                    println!("{}: {}", label, link);
                }
            }
            if !candidate.skills.is_empty() {
                println!("Skills: {}", candidate.skills.join(", "));
            }
            if let Some(summary) = &candidate.summary {
                println!("\n{}", textwrap::fill(summary, 78));
            }
            if !candidate.experience.is_empty() {
                println!("\nExperience:");
                for item in &candidate.experience {
                    let period = match (item.start_date.as_deref(), item.end_date.as_deref()) {
                        (Some(start), Some(end)) => format!(" ({start} - {end})"),
                        (Some(start), None) => format!(" (since {start})"),
                        _ => String::new(),
                    };
                    println!(
                        "  {} at {}{}",
                        item.title.as_deref().unwrap_or("-"),
                        item.company.as_deref().unwrap_or("-"),
                        period,
                    );
                    if let Some(description) = &item.description {
                        for line in textwrap::fill(description, 72).lines() {
                            println!("    {}", line);
                        }
                    }
                }
            }
        }

        CandidateCommands::Upload { file } => {
            let candidate = client
                .upload_resume(&file)
                .context("Upload failed. Please try again.")?;
            println!(
                "Added candidate {} ({}).",
                candidate.display_name(),
                candidate.id
            );
        }
    }
    Ok(())
}

fn run_ai(client: &ApiClient, command: AiCommands) -> Result<()> {
    match command {
        AiCommands::Outreach { job_id, candidate_id } => {
            let (job, candidate) = load_pair(client, &job_id, &candidate_id)?;
            let text = ai::generate(client, &ai::Generation::Outreach {
                job: &job,
                candidate: &candidate,
            })
            .context("Unable to generate outreach right now. Please try again.")?;
            println!("{}", textwrap::fill(&text, 78));
        }

        AiCommands::Summary { job_id, candidate_id } => {
            let (job, candidate) = load_pair(client, &job_id, &candidate_id)?;
            let text = ai::generate(client, &ai::Generation::Summary {
                job: &job,
                candidate: &candidate,
            })
            .context("Unable to generate summary right now. Please try again.")?;
            println!("{}", textwrap::fill(&text, 78));
        }

        AiCommands::Score { job_id, candidate_id } => {
            let (job, candidate) = load_pair(client, &job_id, &candidate_id)?;
            let description = job.description.as_deref().ok_or_else(|| {
                anyhow!(
                    "Select a job with a description and ensure candidate resume text is available."
                )
            })?;
            let raw_text = candidate.raw_text.as_deref().ok_or_else(|| {
                anyhow!(
                    "Select a job with a description and ensure candidate resume text is available."
                )
            })?;

            let score = ai::score_candidate(client, description, raw_text)
                .context("We could not score this candidate right now. Please try again.")?;
            println!(
                "{} scores {:.0}% for {}",
                candidate.display_name(),
                score.clamped(),
                job.title.as_deref().unwrap_or("this role"),
            );
            if let Some(explanation) = &score.explanation {
                println!("\n{}", textwrap::fill(explanation, 78));
            }
        }
    }
    Ok(())
}

fn load_pair(
    client: &ApiClient,
    job_id: &str,
    candidate_id: &str,
) -> Result<(models::JobDetail, models::CandidateDetail)> {
    let job = client
        .job(job_id)
        .context("Unable to load job details right now. Please try again.")?;
    let candidate = client
        .candidate(candidate_id)
        .context("Unable to load candidate details right now. Please try again.")?;
    Ok((job, candidate))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        // Counting chars, not bytes: names are arbitrary UTF-8.
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}
