//! Turning ideas into drafts and drafts into postable text

use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::OnceLock;

use crate::drafts::{Draft, DraftStore};
use crate::error::Result;
use crate::frontmatter::Document;
use crate::ideas::{Idea, IdeaStore};
use crate::types::{IdeaStatus, Network};

const TWITTER_PREVIEW_CHARS: usize = 200;

static COMMENT_RE: OnceLock<Regex> = OnceLock::new();
static HEADING_RE: OnceLock<Regex> = OnceLock::new();
static BLANK_RUN_RE: OnceLock<Regex> = OnceLock::new();

fn linkedin_template(content: &str) -> String {
    format!(
        "# LinkedIn Post\n\n\
         {content}\n\n\
         <!--\n\
         LinkedIn formatting notes:\n\
         - Professional tone, 2-3 paragraphs\n\
         - Add a hook in the first line\n\
         - Include a call-to-action\n\
         - Use 3-4 relevant hashtags\n\
         -->\n\n\
         #Tech #Innovation #Development #Automation\n"
    )
}

fn twitter_template(content: &str) -> String {
    let content = if content.chars().count() > TWITTER_PREVIEW_CHARS {
        let head: String = content.chars().take(TWITTER_PREVIEW_CHARS).collect();
        format!("{}...", head)
    } else {
        content.to_string()
    };

    format!(
        "# Twitter/X Post\n\n\
         {content}\n\n\
         <!--\n\
         Twitter formatting notes:\n\
         - Concise and punchy\n\
         - Max 280 chars or use thread format\n\
         - 1-2 hashtags max\n\
         -->\n\n\
         #Tech #Dev\n"
    )
}

/// Draft body for `network`, or `None` when there is no template for it
pub fn render_draft(idea: &Idea, network: &Network) -> Option<String> {
    match network {
        Network::LinkedIn => Some(linkedin_template(&idea.body)),
        Network::Twitter => Some(twitter_template(&idea.body)),
        Network::Other(_) => None,
    }
}

/// Write drafts for one idea and mark it `drafted`
///
/// Networks without a template are skipped. Existing drafts for the same
/// (idea, network) pair are overwritten.
pub fn draft_idea(
    ideas: &IdeaStore,
    drafts: &DraftStore,
    idea_id: &str,
    networks: &[Network],
    now: DateTime<Utc>,
) -> Result<Vec<Draft>> {
    let idea = ideas.get(idea_id)?;
    let mut created = Vec::new();

    for network in networks {
        let Some(body) = render_draft(&idea, network) else {
            tracing::warn!("No draft template for network '{}', skipping", network);
            continue;
        };
        let draft = Draft::new(&idea.id, network.clone(), body, now);
        created.push(drafts.write(&draft)?);
    }

    ideas.set_status(&idea.id, IdeaStatus::Drafted)?;
    tracing::info!("Drafted idea {} ({} drafts)", idea.id, created.len());
    Ok(created)
}

/// Extract the text that actually gets posted from a draft file
///
/// Drops the header block, HTML comments, markdown heading lines and
/// `Platform:` / `Source:` metadata lines. Hashtag lines such as `#Tech #Dev`
/// are kept because they are not headings.
pub fn postable_text(content: &str) -> String {
    let comment = COMMENT_RE.get_or_init(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
    let heading = HEADING_RE.get_or_init(|| Regex::new(r"^#{1,6}(\s|$)").unwrap());
    let blank_run = BLANK_RUN_RE.get_or_init(|| Regex::new(r"\n{3,}").unwrap());

    let doc = Document::parse(content);
    let without_comments = comment.replace_all(&doc.body, "");

    let kept: Vec<&str> = without_comments
        .lines()
        .filter(|line| !heading.is_match(line.trim_start()))
        .filter(|line| {
            let trimmed = line.trim_start();
            !trimmed.starts_with("Platform:") && !trimmed.starts_with("Source:")
        })
        .map(str::trim_end)
        .collect();

    blank_run
        .replace_all(&kept.join("\n"), "\n\n")
        .trim()
        .to_string()
}
