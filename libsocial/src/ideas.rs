//! Idea records under `ideas/`
//!
//! An idea is raw material for drafts: a prompt file, a transcript section,
//! a changed doc, a commit subject or a quick note. Each one is a markdown
//! file named by its id.

use chrono::{DateTime, Utc};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::error::{Result, SocialError};
use crate::frontmatter::Document;
use crate::types::IdeaStatus;

const SLUG_MAX_LEN: usize = 50;
const ID_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H-%M-%SZ";
pub(crate) const CREATED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

static STRIP_RE: OnceLock<Regex> = OnceLock::new();
static SEPARATOR_RE: OnceLock<Regex> = OnceLock::new();
static DASHES_RE: OnceLock<Regex> = OnceLock::new();

/// Lower-case, strip punctuation, join words with `-`, cap at 50 chars
pub fn slugify(text: &str) -> String {
    let strip = STRIP_RE.get_or_init(|| Regex::new(r"[^\w\s-]").unwrap());
    let separator = SEPARATOR_RE.get_or_init(|| Regex::new(r"[\s_]+").unwrap());
    let dashes = DASHES_RE.get_or_init(|| Regex::new(r"-+").unwrap());

    let lowered = text.to_lowercase();
    let stripped = strip.replace_all(&lowered, "");
    let joined = separator.replace_all(&stripped, "-");
    let collapsed = dashes.replace_all(&joined, "-");

    collapsed
        .trim_matches('-')
        .chars()
        .take(SLUG_MAX_LEN)
        .collect()
}

/// `<timestamp>__<slug>`, or the bare timestamp when the slug is empty
pub fn idea_id(slug: &str, at: DateTime<Utc>) -> String {
    let ts = at.format(ID_TIMESTAMP_FORMAT).to_string();
    if slug.is_empty() {
        ts
    } else {
        format!("{}__{}", ts, slug)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Idea {
    pub id: String,
    pub source: String,
    pub status: IdeaStatus,
    pub tags: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub body: String,
    pub path: PathBuf,
}

impl Idea {
    fn from_document(id: String, path: PathBuf, doc: &Document) -> Result<Self> {
        let status = match doc.get("status") {
            Some(raw) if !raw.is_empty() => raw.parse().map_err(|_| SocialError::Corrupt {
                path: path.display().to_string(),
                reason: format!("unknown idea status '{}'", raw),
            })?,
            _ => IdeaStatus::Ready,
        };

        Ok(Self {
            id,
            source: doc.get("source").unwrap_or_default().to_string(),
            status,
            tags: doc.get("tags").map(parse_tags).unwrap_or_default(),
            created_at: doc.get("created_at").and_then(parse_timestamp),
            body: doc.body.trim().to_string(),
            path,
        })
    }
}

fn parse_tags(raw: &str) -> Vec<String> {
    raw.trim_matches(|c| c == '[' || c == ']')
        .split(',')
        .map(|tag| tag.trim().trim_matches(|c| c == '\'' || c == '"').to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Input for a new idea
#[derive(Debug, Clone)]
pub struct NewIdea {
    /// Text the id slug is derived from
    pub title: String,
    pub source: String,
    pub body: String,
    pub status: IdeaStatus,
    pub tags: Vec<String>,
}

impl NewIdea {
    pub fn new(title: impl Into<String>, source: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            source: source.into(),
            body: body.into(),
            status: IdeaStatus::Ready,
            tags: Vec::new(),
        }
    }

    pub fn with_status(mut self, status: IdeaStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

#[derive(Debug, Clone)]
pub struct IdeaStore {
    dir: PathBuf,
}

impl IdeaStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.md", id))
    }

    /// Write a new idea stamped with the current time
    pub fn create(&self, idea: NewIdea) -> Result<Idea> {
        self.create_at(idea, Utc::now())
    }

    /// Write a new idea stamped with `now`
    ///
    /// Ids that already exist on disk get a numeric suffix, so several ideas
    /// ingested within the same second never overwrite each other.
    pub fn create_at(&self, idea: NewIdea, now: DateTime<Utc>) -> Result<Idea> {
        std::fs::create_dir_all(&self.dir)?;

        let base = idea_id(&slugify(&idea.title), now);
        let mut id = base.clone();
        let mut n = 2;
        while self.path_for(&id).exists() {
            id = format!("{}-{}", base, n);
            n += 1;
        }

        let doc = Document::new(format!("{}\n", idea.body.trim()))
            .with("id", id.as_str())
            .with("source", idea.source.as_str())
            .with("status", idea.status.as_str())
            .with("tags", idea.tags.join(", "))
            .with("created_at", now.format(CREATED_AT_FORMAT).to_string());

        let path = self.path_for(&id);
        std::fs::write(&path, doc.render())?;
        tracing::debug!("Created idea {} from {}", id, idea.source);

        Idea::from_document(id, path, &doc)
    }

    pub fn get(&self, id: &str) -> Result<Idea> {
        let path = self.path_for(id);
        if !path.exists() {
            return Err(SocialError::NotFound(format!("Idea not found: {}", id)));
        }
        let doc = Document::parse(&std::fs::read_to_string(&path)?);
        Idea::from_document(id.to_string(), path, &doc)
    }

    /// All ideas, optionally filtered by status, ordered by id
    pub fn list(&self, status: Option<IdeaStatus>) -> Result<Vec<Idea>> {
        let mut ideas = Vec::new();
        if !self.dir.exists() {
            return Ok(ideas);
        }

        for path in markdown_files(&self.dir)? {
            let Some(id) = path.file_stem().map(|s| s.to_string_lossy().to_string()) else {
                continue;
            };
            let doc = Document::parse(&std::fs::read_to_string(&path)?);
            let idea = Idea::from_document(id, path, &doc)?;
            if status.map_or(true, |s| idea.status == s) {
                ideas.push(idea);
            }
        }

        Ok(ideas)
    }

    pub fn set_status(&self, id: &str, status: IdeaStatus) -> Result<()> {
        let path = self.path_for(id);
        if !path.exists() {
            return Err(SocialError::NotFound(format!("Idea not found: {}", id)));
        }
        let mut doc = Document::parse(&std::fs::read_to_string(&path)?);
        doc.set("status", status.as_str());
        std::fs::write(&path, doc.render())?;
        Ok(())
    }
}

/// `*.md` files directly under `dir`, sorted by file name
pub(crate) fn markdown_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "md") {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}
