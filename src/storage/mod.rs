//! Storage layer
//!
//! One async trait covers every entity the site persists. Two backends
//! implement it:
//! - [`MemoryStorage`]: process-local maps, the default for development
//! - [`DatabaseStorage`]: sqlx over SQLite or MySQL
//!
//! Uniqueness violations and missing rows surface as [`StorageError`] inside
//! the returned `anyhow::Error`, so callers can `downcast_ref` to tell them
//! apart from infrastructure failures.

mod database;
mod memory;

pub use database::DatabaseStorage;
pub use memory::MemoryStorage;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{Config, StorageDriver};
use crate::db::{create_pool, migrations};
use crate::models::{
    BlogPost, Contact, NewBlogPost, NewContact, NewSubscriber, NewUser, NewsletterSubscriber,
    PostStatus, Session, User,
};

/// Typed storage failures callers may want to react to
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A unique column already holds this value
    #[error("{entity} already exists: {key}")]
    Conflict { entity: &'static str, key: String },

    #[error("{0} not found")]
    NotFound(&'static str),
}

impl StorageError {
    /// Find a `StorageError` inside an `anyhow::Error`
    pub fn find(err: &anyhow::Error) -> Option<&StorageError> {
        err.downcast_ref::<StorageError>()
    }
}

#[async_trait]
pub trait Storage: Send + Sync {
    async fn get_user(&self, id: i64) -> Result<Option<User>>;

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Fails with [`StorageError::Conflict`] when the username is taken
    async fn create_user(&self, user: NewUser) -> Result<User>;

    /// All posts, newest first
    async fn get_blog_posts(&self) -> Result<Vec<BlogPost>>;

    async fn get_blog_post(&self, id: i64) -> Result<Option<BlogPost>>;

    async fn get_blog_post_by_slug(&self, slug: &str) -> Result<Option<BlogPost>>;

    /// Fails with [`StorageError::Conflict`] when the slug is taken.
    /// `published_at` is set iff the post starts out published.
    async fn create_blog_post(&self, post: NewBlogPost) -> Result<BlogPost>;

    /// Fails with [`StorageError::NotFound`] when no post has this id
    async fn update_blog_post_status(&self, id: i64, status: PostStatus) -> Result<BlogPost>;

    /// Published posts, most recently published first
    async fn get_published_blog_posts(&self) -> Result<Vec<BlogPost>>;

    async fn create_contact(&self, contact: NewContact) -> Result<Contact>;

    /// All contact submissions, newest first
    async fn get_contacts(&self) -> Result<Vec<Contact>>;

    /// Fails with [`StorageError::Conflict`] when the email is subscribed
    async fn create_newsletter(&self, subscriber: NewSubscriber) -> Result<NewsletterSubscriber>;

    async fn get_newsletter_by_email(&self, email: &str) -> Result<Option<NewsletterSubscriber>>;

    /// All subscribers, newest first
    async fn get_newsletters(&self) -> Result<Vec<NewsletterSubscriber>>;

    async fn create_session(&self, session: &Session) -> Result<()>;

    async fn get_session(&self, id: &str) -> Result<Option<Session>>;

    async fn delete_session(&self, id: &str) -> Result<()>;

    /// Remove expired sessions, returning how many were dropped
    async fn delete_expired_sessions(&self) -> Result<u64>;
}

pub type DynStorage = Arc<dyn Storage>;

/// Build the configured storage backend.
///
/// The database backend connects and runs pending migrations first.
pub async fn create_storage(config: &Config) -> Result<DynStorage> {
    match config.storage.driver {
        StorageDriver::Memory => {
            tracing::info!("Using in-memory storage");
            Ok(Arc::new(MemoryStorage::new()))
        }
        StorageDriver::Database => {
            tracing::info!("Using {:?} database storage", config.database.driver);
            let pool = create_pool(&config.database).await?;
            migrations::run_migrations(&pool).await?;
            Ok(Arc::new(DatabaseStorage::new(pool)))
        }
    }
}

/// Both backends must behave identically; every case runs against each.
#[cfg(test)]
mod conformance {
    use super::*;
    use crate::db::create_test_pool;
    use crate::models::fixtures::new_post;
    use crate::models::UserRole;
    use chrono::{Duration, Utc};

    async fn backends() -> Vec<(&'static str, DynStorage)> {
        let pool = create_test_pool().await.expect("test pool");
        migrations::run_migrations(&pool).await.expect("migrations");
        vec![
            ("memory", Arc::new(MemoryStorage::new()) as DynStorage),
            ("database", Arc::new(DatabaseStorage::new(pool)) as DynStorage),
        ]
    }

    fn is_conflict(err: &anyhow::Error) -> bool {
        matches!(StorageError::find(err), Some(StorageError::Conflict { .. }))
    }

    #[tokio::test]
    async fn users_are_unique_by_username() {
        for (name, storage) in backends().await {
            let user = storage
                .create_user(NewUser {
                    username: "admin".to_string(),
                    password_hash: "hash".to_string(),
                    role: UserRole::Admin,
                })
                .await
                .unwrap();
            assert!(user.id > 0, "{name}");
            assert!(user.is_admin(), "{name}");

            let found = storage.get_user_by_username("admin").await.unwrap();
            assert_eq!(found.map(|u| u.id), Some(user.id), "{name}");
            assert!(storage.get_user(user.id).await.unwrap().is_some(), "{name}");
            assert!(storage.get_user_by_username("nobody").await.unwrap().is_none(), "{name}");

            let err = storage
                .create_user(NewUser {
                    username: "admin".to_string(),
                    password_hash: "other".to_string(),
                    role: UserRole::User,
                })
                .await
                .unwrap_err();
            assert!(is_conflict(&err), "{name}: {err}");
        }
    }

    #[tokio::test]
    async fn blog_post_lifecycle() {
        for (name, storage) in backends().await {
            let draft = storage
                .create_blog_post(new_post("A first draft post", "a-first-draft-post", PostStatus::Draft))
                .await
                .unwrap();
            assert_eq!(draft.status, PostStatus::Draft, "{name}");
            assert!(draft.published_at.is_none(), "{name}");
            assert_eq!(draft.tags, vec!["rust".to_string()], "{name}");

            let live = storage
                .create_blog_post(new_post("A published post", "a-published-post", PostStatus::Published))
                .await
                .unwrap();
            assert!(live.published_at.is_some(), "{name}");

            let all = storage.get_blog_posts().await.unwrap();
            assert_eq!(
                all.iter().map(|p| p.id).collect::<Vec<_>>(),
                vec![live.id, draft.id],
                "{name}"
            );

            let published = storage.get_published_blog_posts().await.unwrap();
            assert_eq!(published.len(), 1, "{name}");
            assert_eq!(published[0].slug, "a-published-post", "{name}");

            let by_slug = storage.get_blog_post_by_slug("a-first-draft-post").await.unwrap();
            assert_eq!(by_slug.map(|p| p.id), Some(draft.id), "{name}");

            let updated = storage
                .update_blog_post_status(draft.id, PostStatus::Published)
                .await
                .unwrap();
            assert!(updated.is_published(), "{name}");
            assert!(updated.published_at.is_some(), "{name}");
            assert!(updated.updated_at >= draft.updated_at, "{name}");
            assert_eq!(storage.get_published_blog_posts().await.unwrap().len(), 2, "{name}");

            let reverted = storage
                .update_blog_post_status(draft.id, PostStatus::Draft)
                .await
                .unwrap();
            assert!(reverted.published_at.is_none(), "{name}");
        }
    }

    #[tokio::test]
    async fn duplicate_slug_and_missing_post() {
        for (name, storage) in backends().await {
            storage
                .create_blog_post(new_post("Same title here", "same-title-here", PostStatus::Draft))
                .await
                .unwrap();
            let err = storage
                .create_blog_post(new_post("Same title here", "same-title-here", PostStatus::Draft))
                .await
                .unwrap_err();
            assert!(is_conflict(&err), "{name}: {err}");

            let err = storage
                .update_blog_post_status(9_999, PostStatus::Published)
                .await
                .unwrap_err();
            assert!(
                matches!(StorageError::find(&err), Some(StorageError::NotFound(_))),
                "{name}: {err}"
            );
            assert_eq!(err.to_string(), "Post not found", "{name}");
            assert!(storage.get_blog_post(9_999).await.unwrap().is_none(), "{name}");
        }
    }

    #[tokio::test]
    async fn contacts_and_newsletters() {
        for (name, storage) in backends().await {
            let first = storage
                .create_contact(NewContact {
                    name: "Jane".to_string(),
                    email: "jane@example.com".to_string(),
                    interest_area: "Ventures".to_string(),
                    message: "Hello".to_string(),
                })
                .await
                .unwrap();
            let second = storage
                .create_contact(NewContact {
                    name: "Jane".to_string(),
                    email: "jane@example.com".to_string(),
                    interest_area: "Careers".to_string(),
                    message: "Again".to_string(),
                })
                .await
                .unwrap();
            assert_ne!(first.id, second.id, "{name}");
            let contacts = storage.get_contacts().await.unwrap();
            assert_eq!(contacts[0].id, second.id, "{name}");
            assert_eq!(contacts[1].interest_area, "Ventures", "{name}");

            let sub = storage
                .create_newsletter(NewSubscriber {
                    name: "Jane".to_string(),
                    email: "jane@example.com".to_string(),
                })
                .await
                .unwrap();
            assert_eq!(
                storage
                    .get_newsletter_by_email("jane@example.com")
                    .await
                    .unwrap()
                    .map(|s| s.id),
                Some(sub.id),
                "{name}"
            );
            let err = storage
                .create_newsletter(NewSubscriber {
                    name: "Other".to_string(),
                    email: "jane@example.com".to_string(),
                })
                .await
                .unwrap_err();
            assert!(is_conflict(&err), "{name}: {err}");
            assert_eq!(storage.get_newsletters().await.unwrap().len(), 1, "{name}");
        }
    }

    #[tokio::test]
    async fn sessions_expire() {
        for (name, storage) in backends().await {
            let live = Session::issue(1);
            let mut stale = Session::issue(1);
            stale.expires_at = Utc::now() - Duration::hours(1);

            storage.create_session(&live).await.unwrap();
            storage.create_session(&stale).await.unwrap();

            let found = storage.get_session(&live.id).await.unwrap();
            assert_eq!(found.map(|s| s.user_id), Some(1), "{name}");

            assert_eq!(storage.delete_expired_sessions().await.unwrap(), 1, "{name}");
            assert!(storage.get_session(&stale.id).await.unwrap().is_none(), "{name}");

            storage.delete_session(&live.id).await.unwrap();
            assert!(storage.get_session(&live.id).await.unwrap().is_none(), "{name}");
        }
    }
}
