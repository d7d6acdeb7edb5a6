//! Blog post model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::validation::{FieldError, Validator};

/// A CMS-managed blog post
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: i64,
    pub title: String,
    /// URL slug (unique), derived from the title
    pub slug: String,
    pub content: String,
    pub description: String,
    pub featured_image: Option<String>,
    pub category: String,
    pub tags: Vec<String>,
    pub author: String,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub seo_keywords: Option<Vec<String>>,
    pub status: PostStatus,
    /// Set while the post is published
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BlogPost {
    pub fn is_published(&self) -> bool {
        self.status == PostStatus::Published
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostStatus::Draft => write!(f, "draft"),
            PostStatus::Published => write!(f, "published"),
        }
    }
}

impl FromStr for PostStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(PostStatus::Draft),
            "published" => Ok(PostStatus::Published),
            _ => Err(anyhow::anyhow!("Invalid post status: {}", s)),
        }
    }
}

/// Admin request body for a new post. Slug and author are filled in by the
/// server.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateBlogPostInput {
    pub title: String,
    pub content: String,
    pub description: String,
    pub featured_image: Option<String>,
    pub category: String,
    pub tags: Vec<String>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub seo_keywords: Option<Vec<String>>,
    pub status: Option<PostStatus>,
}

impl CreateBlogPostInput {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut v = Validator::new();
        v.min_chars("title", &self.title, 10, "Title must be at least 10 characters")
            .min_chars(
                "content",
                &self.content,
                100,
                "Content must be at least 100 characters",
            )
            .min_chars(
                "description",
                &self.description,
                50,
                "Description must be at least 50 characters",
            )
            .required("category", &self.category);

        if let Some(seo_title) = &self.seo_title {
            v.min_chars(
                "seoTitle",
                seo_title,
                30,
                "SEO title must be at least 30 characters",
            );
        }
        if let Some(seo_description) = &self.seo_description {
            v.min_chars(
                "seoDescription",
                seo_description,
                50,
                "SEO description must be at least 50 characters",
            );
        }
        if let Some(keywords) = &self.seo_keywords {
            if keywords.len() < 3 {
                v.error("seoKeywords", "Add at least 3 SEO keywords");
            }
        }

        v.finish()
    }
}

/// Row to insert
#[derive(Debug, Clone)]
pub struct NewBlogPost {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub description: String,
    pub featured_image: Option<String>,
    pub category: String,
    pub tags: Vec<String>,
    pub author: String,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub seo_keywords: Option<Vec<String>>,
    pub status: PostStatus,
}

impl NewBlogPost {
    pub fn from_input(input: CreateBlogPostInput, slug: String, author: String) -> Self {
        Self {
            title: input.title,
            slug,
            content: input.content,
            description: input.description,
            featured_image: input.featured_image.filter(|s| !s.is_empty()),
            category: input.category,
            tags: input.tags,
            author,
            seo_title: input.seo_title,
            seo_description: input.seo_description,
            seo_keywords: input.seo_keywords,
            status: input.status.unwrap_or_default(),
        }
    }
}

/// `PATCH /api/admin/posts/{id}/status` body. Kept as a string so an unknown
/// status is a 400 rather than a body rejection.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusInput {
    pub status: String,
}
