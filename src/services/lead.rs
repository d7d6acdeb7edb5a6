//! Lead capture: contact form and newsletter sign-up
//!
//! Both forms run through one pipeline:
//!
//! 1. rate limit per client IP (the attempt counts before validation)
//! 2. field validation
//! 3. human verification when a token is present; the edge profile refuses
//!    token-less requests while a secret is configured
//! 4. honeypot: a filled `bot_field` gets a fake success and nothing else
//! 5. newsletter only: duplicate email check
//! 6. notification mail (failures are logged, never surfaced)
//! 7. server profile persists and returns the record; edge profile returns
//!    a status message

use std::sync::Arc;

use crate::config::DeploymentProfile;
use crate::models::{
    Contact, ContactSubmission, FieldError, LeadSubmission, NewContact, NewSubscriber,
    NewsletterSubmission, NewsletterSubscriber,
};
use crate::services::mailer::{DynMailer, OutgoingMail};
use crate::services::rate_limiter::RateLimiter;
use crate::services::verifier::DynVerifier;
use crate::storage::{DynStorage, StorageError};

/// Error types for lead submissions
#[derive(Debug, thiserror::Error)]
pub enum LeadError {
    #[error("Too many requests. Please try again later.")]
    RateLimited,

    #[error("{message}")]
    Validation {
        message: &'static str,
        errors: Vec<FieldError>,
    },

    #[error("Turnstile verification failed")]
    VerificationFailed,

    #[error("Turnstile token required")]
    TokenRequired,

    #[error("Email already subscribed")]
    AlreadySubscribed,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// How an accepted submission ended
#[derive(Debug)]
pub enum LeadOutcome<T> {
    /// Persisted (server profile)
    Stored(T),
    /// Notified but not persisted (edge profile)
    Accepted { message: &'static str },
    /// Honeypot tripped; the caller must answer exactly like a success
    Discarded { message: &'static str },
}

pub struct LeadService {
    storage: DynStorage,
    verifier: Option<DynVerifier>,
    mailer: DynMailer,
    limiter: Arc<RateLimiter>,
    profile: DeploymentProfile,
    recipient: String,
}

impl LeadService {
    /// `verifier` is `None` when no Turnstile secret is configured
    pub fn new(
        storage: DynStorage,
        verifier: Option<DynVerifier>,
        mailer: DynMailer,
        limiter: Arc<RateLimiter>,
        profile: DeploymentProfile,
        recipient: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            verifier,
            mailer,
            limiter,
            profile,
            recipient: recipient.into(),
        }
    }

    /// Shared limiter, for the periodic cleanup task
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub async fn submit_contact(
        &self,
        submission: ContactSubmission,
        client_ip: &str,
    ) -> Result<LeadOutcome<Contact>, LeadError> {
        if !self
            .screen(&submission, client_ip, "Invalid contact form data")
            .await?
        {
            tracing::info!(ip = %client_ip, "Honeypot triggered on contact form");
            return Ok(LeadOutcome::Discarded {
                message: "Message sent",
            });
        }

        let contact = NewContact::from(&submission);
        self.notify(contact_notification(&contact, &self.recipient))
            .await;

        match self.profile {
            DeploymentProfile::Server => {
                let stored = self.storage.create_contact(contact).await?;
                tracing::info!(id = stored.id, "Contact submission stored");
                Ok(LeadOutcome::Stored(stored))
            }
            DeploymentProfile::Edge => Ok(LeadOutcome::Accepted {
                message: "Message sent successfully",
            }),
        }
    }

    pub async fn subscribe(
        &self,
        submission: NewsletterSubmission,
        client_ip: &str,
    ) -> Result<LeadOutcome<NewsletterSubscriber>, LeadError> {
        if !self
            .screen(&submission, client_ip, "Invalid newsletter data")
            .await?
        {
            tracing::info!(ip = %client_ip, "Honeypot triggered on newsletter form");
            return Ok(LeadOutcome::Discarded {
                message: "Subscribed",
            });
        }

        let subscriber = NewSubscriber::from(&submission);
        if self
            .storage
            .get_newsletter_by_email(&subscriber.email)
            .await?
            .is_some()
        {
            return Err(LeadError::AlreadySubscribed);
        }

        self.notify(newsletter_notification(&subscriber.email, &self.recipient))
            .await;

        match self.profile {
            DeploymentProfile::Server => {
                let stored = match self.storage.create_newsletter(subscriber).await {
                    Ok(stored) => stored,
                    Err(e) => {
                        return match StorageError::find(&e) {
                            Some(StorageError::Conflict { .. }) => {
                                Err(LeadError::AlreadySubscribed)
                            }
                            _ => Err(LeadError::Internal(e)),
                        }
                    }
                };
                tracing::info!(id = stored.id, "Newsletter subscriber stored");
                Ok(LeadOutcome::Stored(stored))
            }
            DeploymentProfile::Edge => Ok(LeadOutcome::Accepted {
                message: "Subscribed successfully",
            }),
        }
    }

    /// Steps 1-4. `Ok(false)` means the honeypot was filled in.
    async fn screen(
        &self,
        submission: &impl LeadSubmission,
        client_ip: &str,
        invalid_message: &'static str,
    ) -> Result<bool, LeadError> {
        if !self.limiter.check_and_record(client_ip).await {
            tracing::warn!(ip = %client_ip, "Lead submission rate limited");
            return Err(LeadError::RateLimited);
        }

        submission
            .validate()
            .map_err(|errors| LeadError::Validation {
                message: invalid_message,
                errors,
            })?;

        if let Some(verifier) = &self.verifier {
            match submission.token() {
                Some(token) => {
                    if !verifier.verify(token, client_ip).await {
                        return Err(LeadError::VerificationFailed);
                    }
                }
                None if self.profile == DeploymentProfile::Edge => {
                    return Err(LeadError::TokenRequired);
                }
                None => {}
            }
        }

        Ok(!submission.is_bot())
    }

    async fn notify(&self, mail: OutgoingMail) {
        if let Err(e) = self.mailer.send(mail).await {
            tracing::warn!("Failed to send lead notification: {:#}", e);
        }
    }
}

/// Mail sent to the site owner for a contact submission
pub fn contact_notification(contact: &NewContact, recipient: &str) -> OutgoingMail {
    OutgoingMail {
        to: recipient.to_string(),
        subject: format!("New Lead: {} ({})", contact.name, contact.interest_area),
        body: format!(
            "Name: {}\nEmail: {}\nInterest: {}\n\nMessage:\n{}",
            contact.name, contact.email, contact.interest_area, contact.message
        ),
    }
}

/// Mail sent to the site owner for a new subscriber
pub fn newsletter_notification(email: &str, recipient: &str) -> OutgoingMail {
    OutgoingMail {
        to: recipient.to_string(),
        subject: format!("New Newsletter Subscriber: {}", email),
        body: format!(
            "A new user has subscribed to the newsletter.\n\nEmail: {}",
            email
        ),
    }
}
