//! Idea ingestion from local sources
//!
//! Every source turns some input into one or more ideas and records a single
//! `ideas_ingested` event for the batch.

use serde_json::json;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{Result, SocialError};
use crate::events::{EventKind, EventLog};
use crate::ideas::{slugify, Idea, IdeaStore, NewIdea};
use crate::types::IdeaStatus;

/// Repo docs longer than this are cut before becoming an idea
pub const REPO_DOC_MAX_CHARS: usize = 2000;
const TRUNCATION_MARKER: &str = "\n\n[...truncated...]";

pub struct Ingestor {
    ideas: IdeaStore,
    events: EventLog,
}

impl Ingestor {
    pub fn new(ideas: IdeaStore, events: EventLog) -> Self {
        Self { ideas, events }
    }

    /// One idea per `*.md` file in `dir`, skipping README
    pub fn prompts(&self, dir: &Path) -> Result<Vec<Idea>> {
        let mut created = Vec::new();
        for path in files_with_extensions(dir, &["md"])? {
            let name = file_name(&path);
            if name.eq_ignore_ascii_case("readme.md") {
                continue;
            }
            let content = std::fs::read_to_string(&path)?;
            let idea = NewIdea::new(file_stem(&path), format!("prompts:{}", name), content);
            created.push(self.ideas.create(idea)?);
        }

        self.finish("prompts", created)
    }

    /// One idea per section of every `*.md` / `*.txt` file in `dir`
    ///
    /// Sections are separated by `---` lines or start at `## ` headings.
    pub fn transcripts(&self, dir: &Path) -> Result<Vec<Idea>> {
        let mut created = Vec::new();
        for path in files_with_extensions(dir, &["md", "txt"])? {
            let content = std::fs::read_to_string(&path)?;
            let stem = file_stem(&path);
            let name = file_name(&path);

            for (idx, section) in split_sections(&content).into_iter().enumerate() {
                let section_name = section_name(&section, idx);
                let idea = NewIdea::new(
                    format!("{}-{}", stem, section_name),
                    format!("transcripts:{}#{}", name, section_name),
                    section,
                );
                created.push(self.ideas.create(idea)?);
            }
        }

        self.finish("transcripts", created)
    }

    /// Docs added or modified in `repo` during the last `since_days` days
    ///
    /// Markdown files plus bare `README` / `CHANGELOG`. Ideas are created in
    /// `review` status since repo content is rarely post-ready.
    pub fn repo(&self, repo: &Path, since_days: u32) -> Result<Vec<Idea>> {
        let since = format!("--since={} days ago", since_days);
        let output = git(
            repo,
            &[
                "log",
                &since,
                "--name-only",
                "--pretty=format:",
                "--diff-filter=AM",
            ],
        )?;

        let changed: BTreeSet<&str> = output
            .lines()
            .map(str::trim)
            .filter(|line| line.ends_with(".md") || *line == "README" || *line == "CHANGELOG")
            .collect();

        let mut created = Vec::new();
        for rel_path in changed {
            let path = repo.join(rel_path);
            if !path.is_file() {
                tracing::debug!("Skipping {}, no longer present", rel_path);
                continue;
            }
            let content = truncate_chars(&std::fs::read_to_string(&path)?, REPO_DOC_MAX_CHARS);
            let idea = NewIdea::new(file_stem(&path), format!("repo:{}", rel_path), content)
                .with_status(IdeaStatus::Review);
            created.push(self.ideas.create(idea)?);
        }

        self.finish("repo", created)
    }

    /// One idea per subject of the last `count` commits in `repo`
    pub fn commits(&self, repo: &Path, count: usize) -> Result<Vec<Idea>> {
        let limit = format!("-n{}", count);
        let output = git(repo, &["log", &limit, "--pretty=%s"])?;
        let repo_name = repo
            .canonicalize()
            .ok()
            .as_deref()
            .map(file_name)
            .unwrap_or_else(|| "repo".to_string());

        let mut created = Vec::new();
        for (idx, subject) in output.lines().map(str::trim).filter(|s| !s.is_empty()).enumerate() {
            let idea = NewIdea::new(
                subject,
                format!("commits:{}#{}", repo_name, idx + 1),
                subject,
            );
            created.push(self.ideas.create(idea)?);
        }

        self.finish("commits", created)
    }

    /// Quick capture of a single line of text
    pub fn note(&self, text: &str) -> Result<Idea> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SocialError::InvalidInput("Note text cannot be empty".to_string()));
        }
        let idea = self.ideas.create(NewIdea::new(text, "note", text))?;
        let mut created = self.finish("note", vec![idea])?;
        created
            .pop()
            .ok_or_else(|| SocialError::NotFound("note idea".to_string()))
    }

    fn finish(&self, source: &str, created: Vec<Idea>) -> Result<Vec<Idea>> {
        tracing::info!("Ingested {} ideas from {}", created.len(), source);
        if !created.is_empty() {
            let ids: Vec<&str> = created.iter().map(|idea| idea.id.as_str()).collect();
            self.events.record(
                EventKind::IdeasIngested,
                json!({ "source": source, "count": created.len(), "ids": ids }),
            );
        }
        Ok(created)
    }
}

/// Split transcript text into trimmed, non-empty sections
pub fn split_sections(content: &str) -> Vec<String> {
    let mut sections = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in content.lines() {
        if line.trim_end() == "---" {
            sections.push(current.join("\n"));
            current.clear();
            continue;
        }
        if line.starts_with("## ") && !current.is_empty() {
            sections.push(current.join("\n"));
            current.clear();
        }
        current.push(line);
    }
    sections.push(current.join("\n"));

    sections
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn section_name(section: &str, idx: usize) -> String {
    section
        .lines()
        .next()
        .and_then(|first| first.strip_prefix("##"))
        .map(|title| slugify(title.trim_start_matches('#')))
        .filter(|slug| !slug.is_empty())
        .unwrap_or_else(|| format!("section-{}", idx + 1))
}

fn truncate_chars(content: &str, max: usize) -> String {
    if content.chars().count() <= max {
        return content.to_string();
    }
    let mut cut: String = content.chars().take(max).collect();
    cut.push_str(TRUNCATION_MARKER);
    cut
}

fn git(repo: &Path, args: &[&str]) -> Result<String> {
    if !repo.is_dir() {
        return Err(SocialError::NotFound(format!(
            "Repository not found: {}",
            repo.display()
        )));
    }

    tracing::debug!("git {} (in {})", args.join(" "), repo.display());
    let output = Command::new("git").arg("-C").arg(repo).args(args).output()?;
    if !output.status.success() {
        return Err(SocialError::InvalidInput(format!(
            "git {} failed in {}: {}",
            args.first().copied().unwrap_or_default(),
            repo.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Regular files in `dir` with one of `extensions`, sorted by name
///
/// A missing directory yields nothing.
fn files_with_extensions(dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        tracing::debug!("{} does not exist, nothing to ingest", dir.display());
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| extensions.contains(&ext));
        if path.is_file() && matches {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ingestor(root: &Path) -> Ingestor {
        Ingestor::new(
            IdeaStore::new(root.join("ideas")),
            EventLog::new(&root.join("state")),
        )
    }

    #[test]
    fn test_split_sections_on_rules_and_headings() {
        let content = "Intro line\n---\nSecond part\n## Topic A\nabout a\n## Topic B\nabout b\n";
        let sections = split_sections(content);
        assert_eq!(
            sections,
            vec![
                "Intro line".to_string(),
                "Second part".to_string(),
                "## Topic A\nabout a".to_string(),
                "## Topic B\nabout b".to_string(),
            ]
        );
    }

    #[test]
    fn test_split_sections_drops_empty() {
        assert!(split_sections("---\n\n---\n").is_empty());
    }

    #[test]
    fn test_section_names() {
        assert_eq!(section_name("## Big Launch!\ntext", 0), "big-launch");
        assert_eq!(section_name("plain text", 2), "section-3");
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 10), "short");
        let long = "x".repeat(2500);
        let cut = truncate_chars(&long, REPO_DOC_MAX_CHARS);
        assert!(cut.starts_with(&"x".repeat(2000)));
        assert!(cut.ends_with("[...truncated...]"));
    }

    #[test]
    fn test_prompts_skip_readme() {
        let temp_dir = TempDir::new().unwrap();
        let prompts = temp_dir.path().join("prompts");
        std::fs::create_dir_all(&prompts).unwrap();
        std::fs::write(prompts.join("README.md"), "docs").unwrap();
        std::fs::write(prompts.join("Launch Post.md"), "We launched").unwrap();
        std::fs::write(prompts.join("notes.txt"), "ignored").unwrap();

        let ingestor = ingestor(temp_dir.path());
        let created = ingestor.prompts(&prompts).unwrap();

        assert_eq!(created.len(), 1);
        assert!(created[0].id.ends_with("__launch-post"));
        assert_eq!(created[0].source, "prompts:Launch Post.md");
        assert_eq!(created[0].status, IdeaStatus::Ready);

        let events = EventLog::new(&temp_dir.path().join("state")).read_all().unwrap();
        assert_eq!(events[0].kind, EventKind::IdeasIngested);
        assert_eq!(events[0].data["count"], 1);
    }

    #[test]
    fn test_transcripts_sections_become_ideas() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("inputs/transcripts");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("call.md"), "## Pricing\nwe talked pricing\n## Roadmap\nnext quarter\n").unwrap();

        let created = ingestor(temp_dir.path()).transcripts(&dir).unwrap();
        let sources: Vec<_> = created.iter().map(|i| i.source.as_str()).collect();
        assert_eq!(
            sources,
            vec!["transcripts:call.md#pricing", "transcripts:call.md#roadmap"]
        );
    }

    #[test]
    fn test_missing_source_dir_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let created = ingestor(temp_dir.path())
            .prompts(&temp_dir.path().join("nope"))
            .unwrap();
        assert!(created.is_empty());
    }

    #[test]
    fn test_note() {
        let temp_dir = TempDir::new().unwrap();
        let ingestor = ingestor(temp_dir.path());

        let idea = ingestor.note("  Ship the planner  ").unwrap();
        assert_eq!(idea.source, "note");
        assert_eq!(idea.body, "Ship the planner");
        assert!(idea.id.ends_with("__ship-the-planner"));

        assert!(matches!(
            ingestor.note("   "),
            Err(SocialError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_repo_requires_directory() {
        let temp_dir = TempDir::new().unwrap();
        let err = ingestor(temp_dir.path())
            .repo(&temp_dir.path().join("missing"), 7)
            .unwrap_err();
        assert!(matches!(err, SocialError::NotFound(_)));
    }
}
