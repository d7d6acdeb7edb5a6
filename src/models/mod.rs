//! Data models
//!
//! Stored entities (users, blog posts, contacts, newsletter subscribers,
//! sessions), the request bodies that create them, and field validation.
//! JSON uses camelCase keys.

mod blog_post;
mod lead;
mod session;
mod user;
mod validation;

pub use blog_post::{BlogPost, CreateBlogPostInput, NewBlogPost, PostStatus, UpdateStatusInput};
pub use lead::{
    Contact, ContactSubmission, LeadSubmission, NewContact, NewSubscriber, NewsletterSubmission,
    NewsletterSubscriber,
};
pub use session::{Session, SESSION_TTL_DAYS};
pub use user::{CreateUserInput, NewUser, User, UserRole};
pub use validation::{is_valid_email, FieldError};

#[cfg(test)]
pub(crate) use blog_post::fixtures;
