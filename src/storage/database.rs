//! Database storage backend (SQLite or MySQL via sqlx)
//!
//! Queries use `?` placeholders, which both drivers accept, so each method is
//! written once and expanded per driver by `with_pool!`. List columns (`tags`,
//! `seo_keywords`) are stored as JSON text.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::mysql::MySqlQueryResult;
use sqlx::sqlite::SqliteQueryResult;
use sqlx::Row;
use std::str::FromStr;

use super::{Storage, StorageError};
use crate::db::DynDatabasePool;
use crate::models::{
    BlogPost, Contact, NewBlogPost, NewContact, NewSubscriber, NewUser, NewsletterSubscriber,
    PostStatus, Session, User, UserRole,
};

/// Run `$body` with `$pool` bound to whichever concrete pool backs `$self`
macro_rules! with_pool {
    ($self:ident, $pool:ident => $body:block) => {
        if let Some($pool) = $self.pool.as_sqlite() {
            $body
        } else if let Some($pool) = $self.pool.as_mysql() {
            $body
        } else {
            anyhow::bail!("Unsupported database pool")
        }
    };
}

macro_rules! row_to_user {
    ($row:expr) => {{
        let row = $row;
        User {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            password_hash: row.try_get("password_hash")?,
            role: UserRole::from_str(&row.try_get::<String, _>("role")?).unwrap_or_default(),
            created_at: row.try_get("created_at")?,
        }
    }};
}

macro_rules! row_to_post {
    ($row:expr) => {{
        let row = $row;
        BlogPost {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            slug: row.try_get("slug")?,
            content: row.try_get("content")?,
            description: row.try_get("description")?,
            featured_image: row.try_get("featured_image")?,
            category: row.try_get("category")?,
            tags: decode_list(row.try_get::<Option<String>, _>("tags")?).unwrap_or_default(),
            author: row.try_get("author")?,
            seo_title: row.try_get("seo_title")?,
            seo_description: row.try_get("seo_description")?,
            seo_keywords: decode_list(row.try_get::<Option<String>, _>("seo_keywords")?),
            status: PostStatus::from_str(&row.try_get::<String, _>("status")?)
                .unwrap_or_default(),
            published_at: row.try_get("published_at")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        }
    }};
}

macro_rules! row_to_contact {
    ($row:expr) => {{
        let row = $row;
        Contact {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            interest_area: row.try_get("interest_area")?,
            message: row.try_get("message")?,
            created_at: row.try_get("created_at")?,
        }
    }};
}

macro_rules! row_to_subscriber {
    ($row:expr) => {{
        let row = $row;
        NewsletterSubscriber {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            created_at: row.try_get("created_at")?,
        }
    }};
}

macro_rules! row_to_session {
    ($row:expr) => {{
        let row = $row;
        Session {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            expires_at: row.try_get("expires_at")?,
            created_at: row.try_get("created_at")?,
        }
    }};
}

const USER_COLUMNS: &str = "id, username, password_hash, role, created_at";
const POST_COLUMNS: &str = "id, title, slug, content, description, featured_image, category, tags, \
     author, seo_title, seo_description, seo_keywords, status, published_at, created_at, updated_at";
const CONTACT_COLUMNS: &str = "id, name, email, interest_area, message, created_at";
const SUBSCRIBER_COLUMNS: &str = "id, name, email, created_at";
const SESSION_COLUMNS: &str = "id, user_id, expires_at, created_at";

/// Auto-increment id of the row an INSERT created
trait InsertId {
    fn inserted_id(&self) -> i64;
}

impl InsertId for SqliteQueryResult {
    fn inserted_id(&self) -> i64 {
        self.last_insert_rowid()
    }
}

impl InsertId for MySqlQueryResult {
    fn inserted_id(&self) -> i64 {
        self.last_insert_id() as i64
    }
}

fn encode_list(values: &[String]) -> Result<String> {
    serde_json::to_string(values).context("Failed to encode list column")
}

fn decode_list(raw: Option<String>) -> Option<Vec<String>> {
    raw.and_then(|s| serde_json::from_str(&s).ok())
}

/// Turn a unique-key violation into [`StorageError::Conflict`]
fn map_insert_error(err: sqlx::Error, entity: &'static str, key: &str) -> anyhow::Error {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StorageError::Conflict {
                entity,
                key: key.to_string(),
            }
            .into();
        }
    }
    anyhow::Error::new(err).context(format!("Failed to insert {}", entity.to_lowercase()))
}

pub struct DatabaseStorage {
    pool: DynDatabasePool,
}

impl DatabaseStorage {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Storage for DatabaseStorage {
    async fn get_user(&self, id: i64) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
        with_pool!(self, pool => {
            let row = sqlx::query(&sql)
                .bind(id)
                .fetch_optional(pool)
                .await
                .context("Failed to get user by ID")?;
            Ok(match row {
                Some(row) => Some(row_to_user!(&row)),
                None => None,
            })
        })
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE username = ?", USER_COLUMNS);
        with_pool!(self, pool => {
            let row = sqlx::query(&sql)
                .bind(username)
                .fetch_optional(pool)
                .await
                .context("Failed to get user by username")?;
            Ok(match row {
                Some(row) => Some(row_to_user!(&row)),
                None => None,
            })
        })
    }

    async fn create_user(&self, user: NewUser) -> Result<User> {
        let now = Utc::now();
        let id = with_pool!(self, pool => {
            sqlx::query(
                "INSERT INTO users (username, password_hash, role, created_at) VALUES (?, ?, ?, ?)",
            )
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(user.role.to_string())
            .bind(now)
            .execute(pool)
            .await
            .map_err(|e| map_insert_error(e, "User", &user.username))?
            .inserted_id()
        });

        Ok(User {
            id,
            username: user.username,
            password_hash: user.password_hash,
            role: user.role,
            created_at: now,
        })
    }

    async fn get_blog_posts(&self) -> Result<Vec<BlogPost>> {
        let sql = format!("SELECT {} FROM blog_posts ORDER BY id DESC", POST_COLUMNS);
        with_pool!(self, pool => {
            let rows = sqlx::query(&sql)
                .fetch_all(pool)
                .await
                .context("Failed to list blog posts")?;
            let mut posts = Vec::with_capacity(rows.len());
            for row in &rows {
                posts.push(row_to_post!(row));
            }
            Ok(posts)
        })
    }

    async fn get_blog_post(&self, id: i64) -> Result<Option<BlogPost>> {
        let sql = format!("SELECT {} FROM blog_posts WHERE id = ?", POST_COLUMNS);
        with_pool!(self, pool => {
            let row = sqlx::query(&sql)
                .bind(id)
                .fetch_optional(pool)
                .await
                .context("Failed to get blog post by ID")?;
            Ok(match row {
                Some(row) => Some(row_to_post!(&row)),
                None => None,
            })
        })
    }

    async fn get_blog_post_by_slug(&self, slug: &str) -> Result<Option<BlogPost>> {
        let sql = format!("SELECT {} FROM blog_posts WHERE slug = ?", POST_COLUMNS);
        with_pool!(self, pool => {
            let row = sqlx::query(&sql)
                .bind(slug)
                .fetch_optional(pool)
                .await
                .context("Failed to get blog post by slug")?;
            Ok(match row {
                Some(row) => Some(row_to_post!(&row)),
                None => None,
            })
        })
    }

    async fn create_blog_post(&self, post: NewBlogPost) -> Result<BlogPost> {
        let now = Utc::now();
        let published_at = (post.status == PostStatus::Published).then_some(now);
        let tags = encode_list(&post.tags)?;
        let seo_keywords = post
            .seo_keywords
            .as_deref()
            .map(encode_list)
            .transpose()?;

        let id = with_pool!(self, pool => {
            sqlx::query(
                r#"
                INSERT INTO blog_posts (title, slug, content, description, featured_image, category,
                    tags, author, seo_title, seo_description, seo_keywords, status, published_at,
                    created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&post.title)
            .bind(&post.slug)
            .bind(&post.content)
            .bind(&post.description)
            .bind(&post.featured_image)
            .bind(&post.category)
            .bind(&tags)
            .bind(&post.author)
            .bind(&post.seo_title)
            .bind(&post.seo_description)
            .bind(&seo_keywords)
            .bind(post.status.to_string())
            .bind(published_at)
            .bind(now)
            .bind(now)
            .execute(pool)
            .await
            .map_err(|e| map_insert_error(e, "Post", &post.slug))?
            .inserted_id()
        });

        Ok(BlogPost {
            id,
            title: post.title,
            slug: post.slug,
            content: post.content,
            description: post.description,
            featured_image: post.featured_image,
            category: post.category,
            tags: post.tags,
            author: post.author,
            seo_title: post.seo_title,
            seo_description: post.seo_description,
            seo_keywords: post.seo_keywords,
            status: post.status,
            published_at,
            created_at: now,
            updated_at: now,
        })
    }

    async fn update_blog_post_status(&self, id: i64, status: PostStatus) -> Result<BlogPost> {
        let now = Utc::now();
        let published_at = (status == PostStatus::Published).then_some(now);

        let affected = with_pool!(self, pool => {
            sqlx::query(
                "UPDATE blog_posts SET status = ?, published_at = ?, updated_at = ? WHERE id = ?",
            )
            .bind(status.to_string())
            .bind(published_at)
            .bind(now)
            .bind(id)
            .execute(pool)
            .await
            .context("Failed to update blog post status")?
            .rows_affected()
        });

        if affected == 0 {
            return Err(StorageError::NotFound("Post").into());
        }

        self.get_blog_post(id)
            .await?
            .ok_or_else(|| StorageError::NotFound("Post").into())
    }

    async fn get_published_blog_posts(&self) -> Result<Vec<BlogPost>> {
        let sql = format!(
            "SELECT {} FROM blog_posts WHERE status = 'published' ORDER BY published_at DESC, id DESC",
            POST_COLUMNS
        );
        with_pool!(self, pool => {
            let rows = sqlx::query(&sql)
                .fetch_all(pool)
                .await
                .context("Failed to list published blog posts")?;
            let mut posts = Vec::with_capacity(rows.len());
            for row in &rows {
                posts.push(row_to_post!(row));
            }
            Ok(posts)
        })
    }

    async fn create_contact(&self, contact: NewContact) -> Result<Contact> {
        let now = Utc::now();
        let id = with_pool!(self, pool => {
            sqlx::query(
                "INSERT INTO contacts (name, email, interest_area, message, created_at) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&contact.name)
            .bind(&contact.email)
            .bind(&contact.interest_area)
            .bind(&contact.message)
            .bind(now)
            .execute(pool)
            .await
            .context("Failed to insert contact")?
            .inserted_id()
        });

        Ok(Contact {
            id,
            name: contact.name,
            email: contact.email,
            interest_area: contact.interest_area,
            message: contact.message,
            created_at: now,
        })
    }

    async fn get_contacts(&self) -> Result<Vec<Contact>> {
        let sql = format!("SELECT {} FROM contacts ORDER BY id DESC", CONTACT_COLUMNS);
        with_pool!(self, pool => {
            let rows = sqlx::query(&sql)
                .fetch_all(pool)
                .await
                .context("Failed to list contacts")?;
            let mut contacts = Vec::with_capacity(rows.len());
            for row in &rows {
                contacts.push(row_to_contact!(row));
            }
            Ok(contacts)
        })
    }

    async fn create_newsletter(&self, subscriber: NewSubscriber) -> Result<NewsletterSubscriber> {
        let now = Utc::now();
        let id = with_pool!(self, pool => {
            sqlx::query("INSERT INTO newsletters (name, email, created_at) VALUES (?, ?, ?)")
                .bind(&subscriber.name)
                .bind(&subscriber.email)
                .bind(now)
                .execute(pool)
                .await
                .map_err(|e| map_insert_error(e, "Subscriber", &subscriber.email))?
                .inserted_id()
        });

        Ok(NewsletterSubscriber {
            id,
            name: subscriber.name,
            email: subscriber.email,
            created_at: now,
        })
    }

    async fn get_newsletter_by_email(&self, email: &str) -> Result<Option<NewsletterSubscriber>> {
        let sql = format!(
            "SELECT {} FROM newsletters WHERE email = ?",
            SUBSCRIBER_COLUMNS
        );
        with_pool!(self, pool => {
            let row = sqlx::query(&sql)
                .bind(email)
                .fetch_optional(pool)
                .await
                .context("Failed to get subscriber by email")?;
            Ok(match row {
                Some(row) => Some(row_to_subscriber!(&row)),
                None => None,
            })
        })
    }

    async fn get_newsletters(&self) -> Result<Vec<NewsletterSubscriber>> {
        let sql = format!(
            "SELECT {} FROM newsletters ORDER BY id DESC",
            SUBSCRIBER_COLUMNS
        );
        with_pool!(self, pool => {
            let rows = sqlx::query(&sql)
                .fetch_all(pool)
                .await
                .context("Failed to list subscribers")?;
            let mut subscribers = Vec::with_capacity(rows.len());
            for row in &rows {
                subscribers.push(row_to_subscriber!(row));
            }
            Ok(subscribers)
        })
    }

    async fn create_session(&self, session: &Session) -> Result<()> {
        with_pool!(self, pool => {
            sqlx::query(
                "INSERT INTO sessions (id, user_id, expires_at, created_at) VALUES (?, ?, ?, ?)",
            )
            .bind(&session.id)
            .bind(session.user_id)
            .bind(session.expires_at)
            .bind(session.created_at)
            .execute(pool)
            .await
            .context("Failed to create session")?;
        });
        Ok(())
    }

    async fn get_session(&self, id: &str) -> Result<Option<Session>> {
        let sql = format!("SELECT {} FROM sessions WHERE id = ?", SESSION_COLUMNS);
        with_pool!(self, pool => {
            let row = sqlx::query(&sql)
                .bind(id)
                .fetch_optional(pool)
                .await
                .context("Failed to get session")?;
            Ok(match row {
                Some(row) => Some(row_to_session!(&row)),
                None => None,
            })
        })
    }

    async fn delete_session(&self, id: &str) -> Result<()> {
        with_pool!(self, pool => {
            sqlx::query("DELETE FROM sessions WHERE id = ?")
                .bind(id)
                .execute(pool)
                .await
                .context("Failed to delete session")?;
        });
        Ok(())
    }

    async fn delete_expired_sessions(&self) -> Result<u64> {
        let now = Utc::now();
        let removed = with_pool!(self, pool => {
            sqlx::query("DELETE FROM sessions WHERE expires_at < ?")
                .bind(now)
                .execute(pool)
                .await
                .context("Failed to delete expired sessions")?
                .rows_affected()
        });
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_columns_round_trip_through_json() {
        let encoded = encode_list(&["a".to_string(), "b c".to_string()]).unwrap();
        assert_eq!(encoded, r#"["a","b c"]"#);
        assert_eq!(
            decode_list(Some(encoded)),
            Some(vec!["a".to_string(), "b c".to_string()])
        );
        assert_eq!(decode_list(None), None);
        assert_eq!(decode_list(Some("not json".to_string())), None);
    }
}
