//! Lead-capture models: contact submissions and newsletter subscribers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{non_empty, FieldError, Validator};

/// A stored contact-form submission
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub interest_area: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// A stored newsletter subscription (email unique)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsletterSubscriber {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewContact {
    pub name: String,
    pub email: String,
    pub interest_area: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct NewSubscriber {
    pub name: String,
    pub email: String,
}

/// Contact form body, including the bot-mitigation fields
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    pub interest_area: String,
    pub message: String,
    /// Honeypot
    #[serde(rename = "bot_field")]
    pub bot_field: Option<String>,
    /// Turnstile token
    pub token: Option<String>,
}

/// Newsletter form body, including the bot-mitigation fields
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewsletterSubmission {
    pub name: String,
    pub email: String,
    #[serde(rename = "bot_field")]
    pub bot_field: Option<String>,
    pub token: Option<String>,
}

/// What the lead pipeline needs from either form
pub trait LeadSubmission {
    fn validate(&self) -> Result<(), Vec<FieldError>>;

    fn token(&self) -> Option<&str>;

    /// True when the honeypot field was filled in
    fn is_bot(&self) -> bool;
}

impl LeadSubmission for ContactSubmission {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        Validator::new()
            .required("name", &self.name)
            .email("email", &self.email)
            .required("interestArea", &self.interest_area)
            .required("message", &self.message)
            .finish()
    }

    fn token(&self) -> Option<&str> {
        non_empty(&self.token)
    }

    fn is_bot(&self) -> bool {
        non_empty(&self.bot_field).is_some()
    }
}

impl LeadSubmission for NewsletterSubmission {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        Validator::new()
            .required("name", &self.name)
            .email("email", &self.email)
            .finish()
    }

    fn token(&self) -> Option<&str> {
        non_empty(&self.token)
    }

    fn is_bot(&self) -> bool {
        non_empty(&self.bot_field).is_some()
    }
}

impl From<&ContactSubmission> for NewContact {
    fn from(s: &ContactSubmission) -> Self {
        Self {
            name: s.name.trim().to_string(),
            email: s.email.trim().to_string(),
            interest_area: s.interest_area.trim().to_string(),
            message: s.message.trim().to_string(),
        }
    }
}

impl From<&NewsletterSubmission> for NewSubscriber {
    fn from(s: &NewsletterSubmission) -> Self {
        Self {
            name: s.name.trim().to_string(),
            email: s.email.trim().to_string(),
        }
    }
}
