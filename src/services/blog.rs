//! Blog post service
//!
//! Admin-managed posts stored through [`Storage`](crate::storage::Storage).
//! The public listing is cached and every write invalidates it.

use anyhow::Context;
use std::sync::Arc;

use crate::cache::{CacheLayer, MemoryCache};
use crate::models::{BlogPost, CreateBlogPostInput, FieldError, NewBlogPost, PostStatus};
use crate::storage::{DynStorage, StorageError};

const CACHE_KEY_PUBLISHED: &str = "blogs:published";
const CACHE_PATTERN_ALL: &str = "blogs:*";

#[derive(Debug, thiserror::Error)]
pub enum BlogServiceError {
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("Blog post not found")]
    NotFound,

    #[error("A post with slug '{0}' already exists")]
    SlugConflict(String),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct BlogService {
    storage: DynStorage,
    cache: Arc<MemoryCache>,
}

impl BlogService {
    pub fn new(storage: DynStorage, cache: Arc<MemoryCache>) -> Self {
        Self { storage, cache }
    }

    /// Published posts, most recently published first
    pub async fn list_published(&self) -> Result<Vec<BlogPost>, BlogServiceError> {
        if let Some(posts) = self
            .cache
            .get::<Vec<BlogPost>>(CACHE_KEY_PUBLISHED)
            .await
            .ok()
            .flatten()
        {
            return Ok(posts);
        }

        let posts = self
            .storage
            .get_published_blog_posts()
            .await
            .context("Failed to list published posts")?;

        if let Err(e) = self
            .cache
            .set(CACHE_KEY_PUBLISHED, &posts, self.cache.default_ttl())
            .await
        {
            tracing::warn!("Failed to cache published posts: {}", e);
        }
        Ok(posts)
    }

    /// A post visible to the public. Drafts are reported as missing.
    pub async fn get_published(&self, id: i64) -> Result<BlogPost, BlogServiceError> {
        let post = self
            .storage
            .get_blog_post(id)
            .await
            .context("Failed to get post")?;
        post.filter(BlogPost::is_published)
            .ok_or(BlogServiceError::NotFound)
    }

    /// Every post including drafts, newest first
    pub async fn list_all(&self) -> Result<Vec<BlogPost>, BlogServiceError> {
        Ok(self
            .storage
            .get_blog_posts()
            .await
            .context("Failed to list posts")?)
    }

    /// Validate and store a new post. The slug comes from the title and the
    /// author is the signed-in admin.
    pub async fn create(
        &self,
        input: CreateBlogPostInput,
        author: &str,
    ) -> Result<BlogPost, BlogServiceError> {
        input.validate().map_err(BlogServiceError::Validation)?;

        let slug = generate_slug(&input.title);
        if slug.is_empty() {
            return Err(BlogServiceError::Validation(vec![FieldError {
                field: "title".to_string(),
                message: "Title must contain letters or digits".to_string(),
            }]));
        }
        if author.trim().is_empty() {
            return Err(BlogServiceError::Validation(vec![FieldError {
                field: "author".to_string(),
                message: "author is required".to_string(),
            }]));
        }

        let post = self
            .storage
            .create_blog_post(NewBlogPost::from_input(input, slug.clone(), author.to_string()))
            .await
            .map_err(|e| match StorageError::find(&e) {
                Some(StorageError::Conflict { .. }) => BlogServiceError::SlugConflict(slug.clone()),
                _ => BlogServiceError::InternalError(e.context("Failed to create post")),
            })?;

        tracing::info!(id = post.id, slug = %post.slug, status = %post.status, "Blog post created");
        self.invalidate_cache().await;
        Ok(post)
    }

    pub async fn update_status(&self, id: i64, status: &str) -> Result<BlogPost, BlogServiceError> {
        let status: PostStatus = status
            .parse()
            .map_err(|_| BlogServiceError::InvalidStatus(status.to_string()))?;

        let post = self
            .storage
            .update_blog_post_status(id, status)
            .await
            .map_err(|e| match StorageError::find(&e) {
                Some(StorageError::NotFound(_)) => BlogServiceError::NotFound,
                _ => BlogServiceError::InternalError(e.context("Failed to update post status")),
            })?;

        tracing::info!(id, status = %post.status, "Blog post status changed");
        self.invalidate_cache().await;
        Ok(post)
    }

    async fn invalidate_cache(&self) {
        if let Err(e) = self.cache.delete_pattern(CACHE_PATTERN_ALL).await {
            tracing::warn!("Failed to invalidate blog cache: {}", e);
        }
    }
}

/// URL slug from a title: lowercase ASCII alphanumerics and non-ASCII
/// characters are kept, everything else becomes a single `-`.
pub fn generate_slug(title: &str) -> String {
    let lowered = title.to_lowercase();
    let mapped = lowered.chars().map(|c| {
        if c.is_ascii_alphanumeric() || !c.is_ascii() {
            c
        } else {
            '-'
        }
    });

    let mut slug = String::with_capacity(title.len());
    for c in mapped {
        if c == '-' && (slug.is_empty() || slug.ends_with('-')) {
            continue;
        }
        slug.push(c);
    }

    slug.trim_end_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::valid_input;
    use crate::storage::MemoryStorage;
    use proptest::prelude::*;
    use std::time::Duration;

    fn service() -> BlogService {
        BlogService::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(MemoryCache::with_ttl(Duration::from_secs(60))),
        )
    }

    #[test]
    fn test_generate_slug() {
        assert_eq!(generate_slug("Hello World"), "hello-world");
        assert_eq!(generate_slug("Hello, World!"), "hello-world");
        assert_eq!(generate_slug("  Hello   World  "), "hello-world");
        assert_eq!(generate_slug("snake_case-title"), "snake-case-title");
        assert_eq!(generate_slug("Café Ventures"), "café-ventures");
        assert_eq!(generate_slug("!!!"), "");
    }

    proptest! {
        #[test]
        fn prop_slug_is_url_shaped(title in "\\PC{0,60}") {
            let slug = generate_slug(&title);
            prop_assert!(!slug.starts_with('-'));
            prop_assert!(!slug.ends_with('-'));
            prop_assert!(!slug.contains("--"));
            prop_assert!(slug.chars().all(|c| !c.is_ascii() || c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
        }
    }

    #[tokio::test]
    async fn test_create_derives_slug_and_author() {
        let service = service();
        let post = service
            .create(valid_input("Building Ventures in 2024"), "admin")
            .await
            .unwrap();

        assert_eq!(post.slug, "building-ventures-in-2024");
        assert_eq!(post.author, "admin");
        assert_eq!(post.status, PostStatus::Draft);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_input() {
        let service = service();
        let mut input = valid_input("Short");
        input.content = "too short".to_string();

        match service.create(input, "admin").await {
            Err(BlogServiceError::Validation(errors)) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["title", "content"]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_slug_conflict() {
        let service = service();
        service
            .create(valid_input("A Perfectly Good Title"), "admin")
            .await
            .unwrap();
        let err = service
            .create(valid_input("A perfectly good title!"), "admin")
            .await
            .unwrap_err();
        assert!(matches!(err, BlogServiceError::SlugConflict(ref s) if s == "a-perfectly-good-title"));
    }

    #[tokio::test]
    async fn test_published_listing_is_invalidated_on_status_change() {
        let service = service();
        let post = service
            .create(valid_input("Draft That Will Go Live"), "admin")
            .await
            .unwrap();

        assert!(service.list_published().await.unwrap().is_empty());
        assert!(matches!(
            service.get_published(post.id).await,
            Err(BlogServiceError::NotFound)
        ));

        service.update_status(post.id, "published").await.unwrap();

        let published = service.list_published().await.unwrap();
        assert_eq!(published.len(), 1);
        assert!(published[0].published_at.is_some());
        assert_eq!(service.get_published(post.id).await.unwrap().id, post.id);
    }

    #[tokio::test]
    async fn test_update_status_errors() {
        let service = service();
        assert!(matches!(
            service.update_status(1, "archived").await,
            Err(BlogServiceError::InvalidStatus(_))
        ));
        assert!(matches!(
            service.update_status(999, "published").await,
            Err(BlogServiceError::NotFound)
        ));
    }
}
