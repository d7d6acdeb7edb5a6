//! In-memory storage backend
//!
//! Everything lives behind one `RwLock`, so uniqueness checks and inserts are
//! atomic. Ids come from a single counter shared by all entity kinds. Data is
//! lost on restart.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

use super::{Storage, StorageError};
use crate::models::{
    BlogPost, Contact, NewBlogPost, NewContact, NewSubscriber, NewUser, NewsletterSubscriber,
    PostStatus, Session, User,
};

#[derive(Default)]
struct Tables {
    users: HashMap<i64, User>,
    posts: HashMap<i64, BlogPost>,
    contacts: HashMap<i64, Contact>,
    newsletters: HashMap<i64, NewsletterSubscriber>,
    sessions: HashMap<String, Session>,
}

pub struct MemoryStorage {
    tables: RwLock<Tables>,
    next_id: AtomicI64,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            next_id: AtomicI64::new(1),
        }
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

/// Clone the values out, newest first (ties broken by id)
fn newest_first<T: Clone>(
    values: impl Iterator<Item = T>,
    key: impl Fn(&T) -> (chrono::DateTime<Utc>, i64),
) -> Vec<T> {
    let mut out: Vec<T> = values.collect();
    out.sort_by(|a, b| key(b).cmp(&key(a)));
    out
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get_user(&self, id: i64) -> Result<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(StorageError::Conflict {
                entity: "User",
                key: user.username,
            }
            .into());
        }

        let user = User {
            id: self.next_id(),
            username: user.username,
            password_hash: user.password_hash,
            role: user.role,
            created_at: Utc::now(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_blog_posts(&self) -> Result<Vec<BlogPost>> {
        let tables = self.tables.read().await;
        Ok(newest_first(tables.posts.values().cloned(), |p| {
            (p.created_at, p.id)
        }))
    }

    async fn get_blog_post(&self, id: i64) -> Result<Option<BlogPost>> {
        Ok(self.tables.read().await.posts.get(&id).cloned())
    }

    async fn get_blog_post_by_slug(&self, slug: &str) -> Result<Option<BlogPost>> {
        let tables = self.tables.read().await;
        Ok(tables.posts.values().find(|p| p.slug == slug).cloned())
    }

    async fn create_blog_post(&self, post: NewBlogPost) -> Result<BlogPost> {
        let mut tables = self.tables.write().await;
        if tables.posts.values().any(|p| p.slug == post.slug) {
            return Err(StorageError::Conflict {
                entity: "Post",
                key: post.slug,
            }
            .into());
        }

        let now = Utc::now();
        let post = BlogPost {
            id: self.next_id(),
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
            published_at: (post.status == PostStatus::Published).then_some(now),
            status: post.status,
            created_at: now,
            updated_at: now,
        };
        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn update_blog_post_status(&self, id: i64, status: PostStatus) -> Result<BlogPost> {
        let mut tables = self.tables.write().await;
        let post = tables
            .posts
            .get_mut(&id)
            .ok_or(StorageError::NotFound("Post"))?;

        let now = Utc::now();
        post.status = status;
        post.published_at = (status == PostStatus::Published).then_some(now);
        post.updated_at = now;
        Ok(post.clone())
    }

    async fn get_published_blog_posts(&self) -> Result<Vec<BlogPost>> {
        let tables = self.tables.read().await;
        Ok(newest_first(
            tables.posts.values().filter(|p| p.is_published()).cloned(),
            |p| (p.published_at.unwrap_or(p.created_at), p.id),
        ))
    }

    async fn create_contact(&self, contact: NewContact) -> Result<Contact> {
        let contact = Contact {
            id: self.next_id(),
            name: contact.name,
            email: contact.email,
            interest_area: contact.interest_area,
            message: contact.message,
            created_at: Utc::now(),
        };
        self.tables
            .write()
            .await
            .contacts
            .insert(contact.id, contact.clone());
        Ok(contact)
    }

    async fn get_contacts(&self) -> Result<Vec<Contact>> {
        let tables = self.tables.read().await;
        Ok(newest_first(tables.contacts.values().cloned(), |c| {
            (c.created_at, c.id)
        }))
    }

    async fn create_newsletter(&self, subscriber: NewSubscriber) -> Result<NewsletterSubscriber> {
        let mut tables = self.tables.write().await;
        if tables
            .newsletters
            .values()
            .any(|n| n.email == subscriber.email)
        {
            return Err(StorageError::Conflict {
                entity: "Subscriber",
                key: subscriber.email,
            }
            .into());
        }

        let subscriber = NewsletterSubscriber {
            id: self.next_id(),
            name: subscriber.name,
            email: subscriber.email,
            created_at: Utc::now(),
        };
        tables
            .newsletters
            .insert(subscriber.id, subscriber.clone());
        Ok(subscriber)
    }

    async fn get_newsletter_by_email(&self, email: &str) -> Result<Option<NewsletterSubscriber>> {
        let tables = self.tables.read().await;
        Ok(tables
            .newsletters
            .values()
            .find(|n| n.email == email)
            .cloned())
    }

    async fn get_newsletters(&self) -> Result<Vec<NewsletterSubscriber>> {
        let tables = self.tables.read().await;
        Ok(newest_first(tables.newsletters.values().cloned(), |n| {
            (n.created_at, n.id)
        }))
    }

    async fn create_session(&self, session: &Session) -> Result<()> {
        self.tables
            .write()
            .await
            .sessions
            .insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn get_session(&self, id: &str) -> Result<Option<Session>> {
        Ok(self.tables.read().await.sessions.get(id).cloned())
    }

    async fn delete_session(&self, id: &str) -> Result<()> {
        self.tables.write().await.sessions.remove(id);
        Ok(())
    }

    async fn delete_expired_sessions(&self) -> Result<u64> {
        let mut tables = self.tables.write().await;
        let before = tables.sessions.len();
        tables.sessions.retain(|_, s| !s.is_expired());
        Ok((before - tables.sessions.len()) as u64)
    }
}
