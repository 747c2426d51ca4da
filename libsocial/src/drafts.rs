//! Draft records under `drafts/`
//!
//! One file per (idea, network) pair, named `<idea_id>-<network>.md`. Only
//! the `status` header field changes after creation.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

use crate::error::{Result, SocialError};
use crate::frontmatter::Document;
use crate::ideas::{markdown_files, parse_timestamp, CREATED_AT_FORMAT};
use crate::types::{DraftStatus, Network};

#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    /// File name, e.g. `2024-01-01T09-00-00Z__launch-twitter.md`
    pub id: String,
    pub path: PathBuf,
    pub idea_id: String,
    /// Recorded target network; older drafts may lack one
    pub platform: Option<Network>,
    pub status: DraftStatus,
    pub created_at: Option<DateTime<Utc>>,
    /// Everything after the header block
    pub body: String,
}

impl Draft {
    /// A fresh draft in `draft` status
    pub fn new(idea_id: &str, platform: Network, body: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        let id = format!("{}-{}.md", idea_id, platform);
        Self {
            path: PathBuf::from(&id),
            id,
            idea_id: idea_id.to_string(),
            platform: Some(platform),
            status: DraftStatus::Draft,
            created_at: Some(created_at),
            body: body.into(),
        }
    }

    fn parse(path: PathBuf, content: &str) -> Result<Self> {
        let doc = Document::parse(content);
        let status = match doc.get("status") {
            Some(raw) if !raw.is_empty() => raw.parse().map_err(|_| SocialError::Corrupt {
                path: path.display().to_string(),
                reason: format!("unknown draft status '{}'", raw),
            })?,
            _ => DraftStatus::Draft,
        };

        Ok(Self {
            id: path
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_default(),
            idea_id: doc.get("idea_id").unwrap_or_default().to_string(),
            platform: doc
                .get("platform")
                .filter(|p| !p.is_empty())
                .map(Network::from_name),
            status,
            created_at: doc.get("created_at").and_then(parse_timestamp),
            body: doc.body,
            path,
        })
    }

    fn to_document(&self) -> Document {
        let mut doc = Document::new(self.body.clone()).with("idea_id", self.idea_id.as_str());
        if let Some(platform) = &self.platform {
            doc.set("platform", platform.as_str());
        }
        doc.set("status", self.status.as_str());
        if let Some(created_at) = self.created_at {
            doc.set("created_at", created_at.format(CREATED_AT_FORMAT).to_string());
        }
        doc
    }
}

#[derive(Debug, Clone)]
pub struct DraftStore {
    dir: PathBuf,
}

impl DraftStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Locate a draft file
    ///
    /// Absolute paths are used as-is. Relative paths resolve under the drafts
    /// directory first, then relative to the working directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            return path.to_path_buf();
        }
        let under_dir = self.dir.join(path);
        if under_dir.exists() || !path.exists() {
            under_dir
        } else {
            path.to_path_buf()
        }
    }

    pub fn get(&self, path: &Path) -> Result<Draft> {
        let resolved = self.resolve(path);
        if !resolved.is_file() {
            return Err(SocialError::NotFound(format!(
                "Draft not found: {}",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(&resolved)?;
        Draft::parse(resolved, &content)
    }

    /// Drafts matching the filters, ordered by file name
    ///
    /// The platform filter is alias-aware: `x` matches drafts recorded as
    /// `twitter` and the other way round. Files that are not UTF-8 or carry
    /// an unknown status are skipped with a warning; [`get`] stays strict.
    ///
    /// [`get`]: DraftStore::get
    pub fn list(&self, status: Option<DraftStatus>, platform: Option<&Network>) -> Result<Vec<Draft>> {
        let mut drafts = Vec::new();
        if !self.dir.exists() {
            return Ok(drafts);
        }

        for path in markdown_files(&self.dir)? {
            let content = match std::fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                    tracing::warn!("Skipping draft {}: not valid UTF-8", path.display());
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            let draft = match Draft::parse(path, &content) {
                Ok(draft) => draft,
                Err(e) => {
                    tracing::warn!("Skipping draft: {}", e);
                    continue;
                }
            };

            if status.is_some_and(|s| draft.status != s) {
                continue;
            }
            if let Some(wanted) = platform {
                if draft.platform.as_ref() != Some(wanted) {
                    continue;
                }
            }
            drafts.push(draft);
        }

        Ok(drafts)
    }

    pub fn set_status(&self, path: &Path, status: DraftStatus) -> Result<Draft> {
        let mut draft = self.get(path)?;
        let content = std::fs::read_to_string(&draft.path)?;
        let mut doc = Document::parse(&content);
        doc.set("status", status.as_str());
        std::fs::write(&draft.path, doc.render())?;

        tracing::debug!("Draft {} -> {}", draft.id, status);
        draft.status = status;
        Ok(draft)
    }

    pub fn approve(&self, path: &Path) -> Result<Draft> {
        self.set_status(path, DraftStatus::Approved)
    }

    /// Write a draft into the drafts directory under its id
    pub fn write(&self, draft: &Draft) -> Result<Draft> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(&draft.id);
        std::fs::write(&path, draft.to_document().render())?;

        let mut written = draft.clone();
        written.path = path;
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn created() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    fn write_raw(dir: &Path, name: &str, content: &str) -> PathBuf {
        std::fs::create_dir_all(dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_write_and_get() {
        let temp_dir = TempDir::new().unwrap();
        let store = DraftStore::new(temp_dir.path().join("drafts"));

        let draft = Draft::new("idea-1", Network::from_name("x"), "# Post\n\nHello\n", created());
        let written = store.write(&draft).unwrap();
        assert_eq!(written.id, "idea-1-twitter.md");

        let loaded = store.get(Path::new("idea-1-twitter.md")).unwrap();
        assert_eq!(loaded.idea_id, "idea-1");
        assert_eq!(loaded.platform, Some(Network::Twitter));
        assert_eq!(loaded.status, DraftStatus::Draft);
        assert_eq!(loaded.created_at, Some(created()));
        assert_eq!(loaded.body, "# Post\n\nHello\n");
    }

    #[test]
    fn test_approve_relative_path_resolves_under_dir() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("drafts");
        write_raw(&dir, "a.md", "---\nidea_id: a\nplatform: linkedin\nstatus: draft\n---\nbody");
        let store = DraftStore::new(&dir);

        let approved = store.approve(Path::new("a.md")).unwrap();
        assert_eq!(approved.status, DraftStatus::Approved);

        let content = std::fs::read_to_string(dir.join("a.md")).unwrap();
        assert_eq!(
            content,
            "---\nidea_id: a\nplatform: linkedin\nstatus: approved\n---\nbody"
        );
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let store = DraftStore::new(temp_dir.path());
        let err = store.get(Path::new("missing.md")).unwrap_err();
        assert!(matches!(err, SocialError::NotFound(_)));
        assert!(err.to_string().contains("missing.md"));
    }

    #[test]
    fn test_list_filters_status_and_platform_aliases() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        write_raw(dir, "b.md", "---\nplatform: x\nstatus: approved\n---\nB");
        write_raw(dir, "a.md", "---\nplatform: twitter\nstatus: approved\n---\nA");
        write_raw(dir, "c.md", "---\nplatform: linkedin\nstatus: approved\n---\nC");
        write_raw(dir, "d.md", "---\nplatform: twitter\nstatus: draft\n---\nD");
        write_raw(dir, "notes.txt", "ignored");
        let store = DraftStore::new(dir);

        let twitter = store
            .list(Some(DraftStatus::Approved), Some(&Network::from_name("x")))
            .unwrap();
        let ids: Vec<_> = twitter.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["a.md", "b.md"]);

        assert_eq!(store.list(None, None).unwrap().len(), 4);
        assert_eq!(store.list(Some(DraftStatus::Draft), None).unwrap().len(), 1);
    }

    #[test]
    fn test_draft_without_platform() {
        let temp_dir = TempDir::new().unwrap();
        write_raw(temp_dir.path(), "a.md", "---\nstatus: approved\n---\ntext");
        let store = DraftStore::new(temp_dir.path());

        let draft = store.get(Path::new("a.md")).unwrap();
        assert_eq!(draft.platform, None);
        assert!(store
            .list(None, Some(&Network::Twitter))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_unknown_status_is_corrupt() {
        let temp_dir = TempDir::new().unwrap();
        write_raw(temp_dir.path(), "a.md", "---\nstatus: posted\n---\ntext");
        let store = DraftStore::new(temp_dir.path());

        let err = store.get(Path::new("a.md")).unwrap_err();
        assert!(matches!(err, SocialError::Corrupt { .. }));
    }

    #[test]
    fn test_list_skips_unreadable_drafts() {
        let temp_dir = TempDir::new().unwrap();
        write_raw(temp_dir.path(), "a.md", "---\nplatform: twitter\nstatus: approved\n---\nA");
        write_raw(temp_dir.path(), "b.md", "---\nstatus: posted\n---\nB");
        std::fs::write(temp_dir.path().join("c.md"), [0xff, 0xfe, 0x00]).unwrap();
        let store = DraftStore::new(temp_dir.path());

        let all = store.list(None, None).unwrap();
        let ids: Vec<_> = all.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["a.md"]);
        assert!(store.get(Path::new("b.md")).is_err());
    }
}
