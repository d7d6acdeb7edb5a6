//! Services layer - Business logic
//!
//! Services sit between the HTTP handlers and storage. They own validation,
//! caching and the outbound integrations (mail, human verification).

pub mod blog;
pub mod content;
pub mod lead;
pub mod mailer;
pub mod markdown;
pub mod password;
pub mod rate_limiter;
pub mod seo;
pub mod sitemap;
pub mod user;
pub mod ventures;
pub mod verifier;

pub use blog::{generate_slug, BlogService, BlogServiceError};
pub use content::{ContentLibrary, Post, PostSummary};
pub use lead::{LeadError, LeadOutcome, LeadService};
pub use mailer::{create_mailer, DynMailer, Mailer, OutgoingMail};
pub use markdown::MarkdownRenderer;
pub use password::{hash_password, verify_password};
pub use rate_limiter::RateLimiter;
pub use seo::{SeoMeta, SeoRenderer};
pub use sitemap::SitemapGenerator;
pub use user::{LoginInput, UserService, UserServiceError};
pub use verifier::{DynVerifier, HumanVerifier, TurnstileVerifier};
