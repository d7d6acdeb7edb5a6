//! File-based markdown posts
//!
//! Each `*.md` file in the posts directory is one post; the slug is the file
//! stem. An optional leading `---` block holds YAML frontmatter (`title`,
//! `date`, `description`, `image`, `tags`). The library is loaded once at
//! startup and is read-only afterwards.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::markdown::MarkdownRenderer;

static FRONTMATTER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^---\s*(.*?)\s*---\s*(.*)$").expect("valid frontmatter regex")
});

const WORDS_PER_MINUTE: usize = 200;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Frontmatter {
    title: Option<String>,
    date: Option<serde_yaml::Value>,
    description: Option<String>,
    image: Option<String>,
    tags: Option<Vec<String>>,
}

impl Frontmatter {
    /// Plain `key: value` lines, split on the first colon. Accepts values
    /// strict YAML rejects, such as an unquoted title containing `": "`.
    fn from_lines(block: &str) -> Self {
        let mut frontmatter = Self::default();
        for line in block.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = unquote(value.trim());
            if value.is_empty() {
                continue;
            }
            match key.trim() {
                "title" => frontmatter.title = Some(value.to_string()),
                "date" => frontmatter.date = Some(serde_yaml::Value::String(value.to_string())),
                "description" => frontmatter.description = Some(value.to_string()),
                "image" => frontmatter.image = Some(value.to_string()),
                "tags" => {
                    let list = value.trim_start_matches('[').trim_end_matches(']');
                    frontmatter.tags = Some(
                        list.split(',')
                            .map(|tag| unquote(tag.trim()).to_string())
                            .filter(|tag| !tag.is_empty())
                            .collect(),
                    );
                }
                _ => {}
            }
        }
        frontmatter
    }
}

fn unquote(value: &str) -> &str {
    ['"', '\'']
        .iter()
        .find_map(|q| value.strip_prefix(*q).and_then(|v| v.strip_suffix(*q)))
        .unwrap_or(value)
}

/// Listing view of a post
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub slug: String,
    pub title: String,
    pub date: DateTime<Utc>,
    pub description: String,
    pub image: Option<String>,
    pub tags: Vec<String>,
    pub reading_time: String,
}

/// A post with its markdown source and rendered HTML
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(flatten)]
    pub summary: PostSummary,
    pub content: String,
    pub html: String,
}

#[derive(Debug, Default)]
pub struct ContentLibrary {
    /// Newest first
    posts: Vec<Post>,
}

impl ContentLibrary {
    /// Load every `*.md` file in `dir`. A missing directory yields an empty
    /// library; unreadable files are errors.
    pub fn load(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            tracing::info!("No posts directory at {}, serving no posts", dir.display());
            return Ok(Self::default());
        }

        let renderer = MarkdownRenderer::new();
        let mut posts = Vec::new();

        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("Failed to read posts directory {}", dir.display()))?;
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("md") {
                continue;
            }
            let Some(slug) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if slug.is_empty() {
                continue;
            }

            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read post {}", path.display()))?;
            posts.push(parse_post(slug, &raw, &renderer));
        }

        Ok(Self::from_posts(posts))
    }

    pub fn from_posts(mut posts: Vec<Post>) -> Self {
        posts.sort_by(|a, b| {
            b.summary
                .date
                .cmp(&a.summary.date)
                .then_with(|| a.summary.slug.cmp(&b.summary.slug))
        });
        tracing::info!("Loaded {} markdown post(s)", posts.len());
        Self { posts }
    }

    pub fn summaries(&self) -> Vec<PostSummary> {
        self.posts.iter().map(|p| p.summary.clone()).collect()
    }

    pub fn get(&self, slug: &str) -> Option<&Post> {
        self.posts.iter().find(|p| p.summary.slug == slug)
    }

    pub fn slugs(&self) -> impl Iterator<Item = &str> {
        self.posts.iter().map(|p| p.summary.slug.as_str())
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

/// Split frontmatter from body. Without a frontmatter block the whole text is
/// the body.
fn split_frontmatter(raw: &str) -> (Option<&str>, &str) {
    match FRONTMATTER_REGEX.captures(raw) {
        Some(caps) => {
            let front = caps.get(1).map(|m| m.as_str());
            let body = caps.get(2).map_or("", |m| m.as_str());
            (front, body)
        }
        None => (None, raw),
    }
}

pub fn parse_post(slug: &str, raw: &str, renderer: &MarkdownRenderer) -> Post {
    let (front, body) = split_frontmatter(raw);

    let frontmatter = match front.filter(|f| !f.trim().is_empty()) {
        Some(yaml) => serde_yaml::from_str(yaml).unwrap_or_else(|e| {
            tracing::warn!(
                "Frontmatter in post '{}' is not valid YAML ({}), reading it line by line",
                slug,
                e
            );
            Frontmatter::from_lines(yaml)
        }),
        None => Frontmatter::default(),
    };

    let date = frontmatter
        .date
        .as_ref()
        .and_then(parse_date)
        .unwrap_or_else(Utc::now);

    Post {
        summary: PostSummary {
            slug: slug.to_string(),
            title: frontmatter
                .title
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "Untitled".to_string()),
            date,
            description: frontmatter.description.unwrap_or_default(),
            image: frontmatter.image.filter(|i| !i.is_empty()),
            tags: frontmatter.tags.unwrap_or_default(),
            reading_time: reading_time(body),
        },
        content: body.to_string(),
        html: renderer.render(body),
    }
}

/// Accepts RFC 3339 timestamps and bare `YYYY-MM-DD` dates
fn parse_date(value: &serde_yaml::Value) -> Option<DateTime<Utc>> {
    let s = value.as_str()?.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// `ceil(words / 200) min read`
pub fn reading_time(body: &str) -> String {
    let words = body.split_whitespace().count();
    format!("{} min read", words.div_ceil(WORDS_PER_MINUTE))
}
