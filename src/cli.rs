// src/cli.rs
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::filter::{CriteriaPatch, ExperienceRange};
use crate::session::Session;
use crate::types::response::DEFAULT_PAGE_LIMIT;
use crate::types::{Candidate, CandidateStatus, CandidateUpdate, NewCandidate, Page};

#[derive(Parser)]
#[command(name = "hr-copilot")]
#[command(about = "Browse, filter and manage candidates of the HR Copilot backend")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Backend base URL, overrides configuration
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Request timeout in seconds, overrides configuration
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

#[derive(Subcommand)]
pub enum Command {
    /// List candidates, optionally filtered locally
    List {
        #[command(flatten)]
        filters: FilterArgs,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Show one candidate with its resumes
    Show { id: i64 },
    /// Create a candidate
    Add(CandidateFields),
    /// Edit fields of a candidate
    Update {
        id: i64,
        #[command(flatten)]
        fields: CandidateFields,
    },
    /// Change the hiring status of a candidate
    Status {
        id: i64,
        status: CandidateStatus,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete a candidate
    Delete { id: i64 },
    /// Filter candidates on the backend (location is not supported there)
    Filter {
        #[command(flatten)]
        filters: FilterArgs,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Upload resume files (PDF, DOC, DOCX; 10MB max each)
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Rank candidates against free-text job requirements
    Match {
        requirements: String,
        /// Restrict matching to these candidate ids
        #[arg(long = "id")]
        ids: Vec<i64>,
    },
    /// Turn a natural-language query into filters and list the result
    Optimize { query: String },
    /// Show the filter values the backend suggests
    Suggestions,
    /// List the resumes of a candidate
    Resumes { id: i64 },
    /// Show the extracted text of a resume
    Resume { resume_id: i64 },
    /// Save the stored resume file (PDF) to disk
    Download {
        resume_id: i64,
        /// Target file, defaults to resume-<id>.pdf
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
pub struct PageArgs {
    /// Number of candidates to skip
    #[arg(long, default_value_t = 0)]
    pub skip: u32,
    /// Maximum number of candidates returned (1-1000)
    #[arg(long, default_value_t = DEFAULT_PAGE_LIMIT)]
    pub limit: u32,
}

impl PageArgs {
    pub fn page(&self) -> Page {
        Page::new(self.skip, self.limit)
    }
}

#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    /// Free-text search over name, email, position, company and skills
    #[arg(long, short)]
    pub keyword: Option<String>,
    /// Required skill; repeat for "any of"
    #[arg(long = "skill", short)]
    pub skills: Vec<String>,
    /// Years of experience as min-max, e.g. 3-5 or 10+
    #[arg(long, short)]
    pub experience: Option<String>,
    #[arg(long)]
    pub status: Option<CandidateStatus>,
    #[arg(long)]
    pub location: Option<String>,
    #[arg(long)]
    pub education: Option<String>,
}

impl FilterArgs {
    pub fn to_patch(&self) -> CriteriaPatch {
        let mut patch = CriteriaPatch::new();
        if let Some(keyword) = &self.keyword {
            patch = patch.keyword(keyword.as_str());
        }
        if !self.skills.is_empty() {
            patch = patch.skills(self.skills.iter().cloned());
        }
        if let Some(raw) = &self.experience {
            let range = ExperienceRange::parse_lenient(raw);
            if !range.is_unbounded() {
                patch = patch.experience(range);
            }
        }
        if let Some(status) = self.status {
            patch = patch.status(status);
        }
        if let Some(location) = &self.location {
            patch = patch.location(location.as_str());
        }
        if let Some(education) = &self.education {
            patch = patch.education(education.as_str());
        }
        patch
    }
}

#[derive(Args, Debug, Default)]
pub struct CandidateFields {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub education: Option<String>,
    #[arg(long)]
    pub experience_years: Option<u32>,
    #[arg(long)]
    pub position: Option<String>,
    #[arg(long)]
    pub company: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
    /// Replaces the whole skill list; repeat for several skills
    #[arg(long = "skill")]
    pub skills: Vec<String>,
    #[arg(long)]
    pub notes: Option<String>,
}

impl CandidateFields {
    pub fn into_update(self) -> CandidateUpdate {
        CandidateUpdate {
            name: self.name,
            email: self.email,
            phone: self.phone,
            education: self.education,
            experience_years: self.experience_years,
            current_position: self.position,
            current_company: self.company,
            location: self.location,
            skills: (!self.skills.is_empty()).then_some(self.skills),
            status: None,
            notes: self.notes,
        }
    }

    pub fn into_new(self) -> NewCandidate {
        NewCandidate {
            name: self.name.unwrap_or_default(),
            email: self.email,
            phone: self.phone,
            education: self.education,
            experience_years: self.experience_years,
            current_position: self.position,
            current_company: self.company,
            skills: self.skills,
            notes: self.notes,
        }
    }
}

/// Run one command against the session. Failures have already been turned
/// into notifications by the session; they are returned so the exit code
/// reflects them.
pub async fn handle_command(command: Command, session: &Session) -> Result<()> {
    match command {
        Command::List { filters, page } => {
            session.refresh_page(page.page()).await?;
            session.set_criteria(filters.to_patch());
            print_candidates(&session.visible(), session.collection().len());

            let counts = session.status_counts();
            println!();
            for status in CandidateStatus::ALL {
                println!("  {:<12} {}", status.label(), counts.get(status));
            }
        }

        Command::Show { id } => {
            let candidate = session.candidate(id).await?;
            print_candidate(&candidate);
            let resumes = session.candidate_resumes(id).await?;
            if !resumes.is_empty() {
                println!("Resumes:");
                for resume in resumes {
                    println!(
                        "  #{:<5} {:<40} {:?}",
                        resume.id, resume.filename, resume.processing_status
                    );
                }
            }
        }

        Command::Add(fields) => {
            let created = session.create_candidate(&fields.into_new()).await?;
            println!("Created candidate #{}", created.id);
        }

        Command::Update { id, fields } => {
            let updated = session.update_candidate(id, &fields.into_update()).await?;
            print_candidate(&updated);
        }

        Command::Status { id, status, notes } => {
            session.change_status(id, status, notes.as_deref()).await?;
        }

        Command::Delete { id } => {
            session.delete_candidate(id).await?;
        }

        Command::Filter { filters, page } => {
            session.set_criteria(filters.to_patch());
            let response = session.server_filter(page.page()).await?;
            print_candidates(&response.candidates, response.total_count);
        }

        Command::Upload { files } => {
            let response = session.upload_paths(&files).await?;
            for name in &response.uploaded_files {
                println!("  uploaded  {}", name);
            }
            for failed in &response.failed_files {
                println!("  failed    {} ({})", failed.filename, failed.error);
            }
            println!("{} processed", response.total_processed);
        }

        Command::Match { requirements, ids } => {
            let response = session.smart_match(&requirements, &ids).await?;
            for m in &response.matches {
                println!("#{:<5} {:<24} score {:>5.1}", m.candidate_id, m.name, m.score);
                for reason in &m.reasons {
                    println!("        + {}", reason);
                }
                for concern in &m.concerns {
                    println!("        - {}", concern);
                }
            }
        }

        Command::Optimize { query } => {
            session.refresh().await?;
            let response = session.optimize_filter(&query).await?;
            for suggestion in &response.suggestions {
                println!("  * {}", suggestion);
            }
            print_candidates(&session.visible(), session.collection().len());
        }

        Command::Suggestions => {
            let suggestions = session.suggestions().await?;
            println!(
                "{}",
                serde_json::to_string_pretty(&suggestions)
                    .context("Failed to render suggestions")?
            );
        }

        Command::Resumes { id } => {
            for resume in session.candidate_resumes(id).await? {
                println!(
                    "#{:<5} {:<40} {:>10} bytes  {:?}",
                    resume.id, resume.filename, resume.file_size, resume.processing_status
                );
            }
        }

        Command::Resume { resume_id } => {
            let content = session.resume_content(resume_id).await?;
            println!(
                "#{} {} ({:?})",
                content.id, content.filename, content.processing_status
            );
            match content.raw_text {
                Some(text) => println!("{}", text),
                None => println!("No text extracted yet"),
            }
        }

        Command::Download { resume_id, output } => {
            let bytes = session.download_resume(resume_id).await?;
            let path = output.unwrap_or_else(|| PathBuf::from(format!("resume-{}.pdf", resume_id)));
            tokio::fs::write(&path, &bytes)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Saved {}", path.display());
        }
    }

    Ok(())
}

fn print_candidates(candidates: &[Candidate], total: usize) {
    println!(
        "{:<6} {:<24} {:<12} {:>5}  {:<30}",
        "ID", "Name", "Status", "Years", "Skills"
    );
    println!("{}", "-".repeat(82));
    for c in candidates {
        println!(
            "{:<6} {:<24} {:<12} {:>5}  {:<30}",
            c.id,
            c.name,
            c.status.label(),
            c.experience_years
                .map(|y| y.to_string())
                .unwrap_or_else(|| "-".to_string()),
            c.skills.join(", ")
        );
    }
    println!("{}/{} candidates", candidates.len(), total);
}

fn print_candidate(c: &Candidate) {
    let or_dash = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
    println!("#{} {}", c.id, c.name);
    println!("  Status:     {}", c.status.label());
    println!("  Email:      {}", or_dash(&c.email));
    println!("  Phone:      {}", or_dash(&c.phone));
    println!("  Position:   {}", or_dash(&c.current_position));
    println!("  Company:    {}", or_dash(&c.current_company));
    println!("  Location:   {}", or_dash(&c.location));
    println!("  Education:  {}", or_dash(&c.education));
    println!(
        "  Experience: {}",
        c.experience_years
            .map(|y| format!("{} years", y))
            .unwrap_or_else(|| "-".to_string())
    );
    println!("  Skills:     {}", c.skills.join(", "));
    if let Some(notes) = &c.notes {
        println!("  Notes:      {}", notes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterCriteria;

    #[test]
    fn test_parse_list_with_filters() {
        let cli = Cli::parse_from([
            "hr-copilot",
            "list",
            "--skill",
            "Rust",
            "--skill",
            "Go",
            "--experience",
            "3-5",
            "--status",
            "hired",
        ]);

        let Command::List { filters, page } = cli.command else {
            panic!("expected list command");
        };
        assert_eq!(page.page(), Page::default());
        let mut criteria = FilterCriteria::new();
        criteria.merge(filters.to_patch());
        assert_eq!(criteria.skills.len(), 2);
        assert_eq!(criteria.experience, Some(ExperienceRange::between(3, 5)));
        assert_eq!(criteria.status, Some(CandidateStatus::Hired));
        assert_eq!(criteria.keyword, None);
    }

    #[test]
    fn test_malformed_experience_is_ignored() {
        let filters = FilterArgs {
            experience: Some("lots".to_string()),
            ..Default::default()
        };
        let mut criteria = FilterCriteria::new();
        criteria.merge(filters.to_patch());
        assert!(criteria.is_unset());
    }

    #[test]
    fn test_update_fields_only_carry_given_values() {
        let cli = Cli::parse_from(["hr-copilot", "update", "4", "--company", "Initech"]);
        let Command::Update { id, fields } = cli.command else {
            panic!("expected update command");
        };
        assert_eq!(id, 4);
        let update = fields.into_update();
        assert_eq!(update.current_company.as_deref(), Some("Initech"));
        assert_eq!(update.skills, None);
        assert_eq!(update.name, None);
    }

    #[test]
    fn test_filter_paging_flags() {
        let cli = Cli::parse_from([
            "hr-copilot", "filter", "--skill", "Rust", "--skip", "200", "--limit", "50",
        ]);
        let Command::Filter { filters, page } = cli.command else {
            panic!("expected filter command");
        };
        assert_eq!(filters.skills, vec!["Rust".to_string()]);
        assert_eq!(page.page(), Page::new(200, 50));
    }

    #[test]
    fn test_download_output_flag() {
        let cli = Cli::parse_from(["hr-copilot", "download", "12", "-o", "cv.pdf"]);
        let Command::Download { resume_id, output } = cli.command else {
            panic!("expected download command");
        };
        assert_eq!(resume_id, 12);
        assert_eq!(output, Some(PathBuf::from("cv.pdf")));
    }

    #[test]
    fn test_match_ids_and_global_flags() {
        let cli = Cli::parse_from([
            "hr-copilot",
            "match",
            "Senior Rust developer",
            "--id",
            "1",
            "--id",
            "3",
            "--api-url",
            "http://backend/api",
        ]);
        assert_eq!(cli.api_url.as_deref(), Some("http://backend/api"));
        let Command::Match { requirements, ids } = cli.command else {
            panic!("expected match command");
        };
        assert_eq!(requirements, "Senior Rust developer");
        assert_eq!(ids, vec![1, 3]);
    }
}
