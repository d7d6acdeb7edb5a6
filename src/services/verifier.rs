//! Human verification (Cloudflare Turnstile)

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::config::TurnstileConfig;

/// Decides whether a widget token proves a human submitted the form
#[async_trait]
pub trait HumanVerifier: Send + Sync {
    /// Never errors: any failure to verify counts as "not human"
    async fn verify(&self, token: &str, remote_ip: &str) -> bool;
}

pub type DynVerifier = Arc<dyn HumanVerifier>;

#[derive(Debug, Deserialize)]
struct SiteVerifyResponse {
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

/// Verifies tokens against the Turnstile `siteverify` endpoint
pub struct TurnstileVerifier {
    client: reqwest::Client,
    secret: String,
    verify_url: String,
}

impl TurnstileVerifier {
    pub fn new(secret: impl Into<String>, verify_url: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            secret: secret.into(),
            verify_url: verify_url.into(),
        })
    }

    /// `None` when no secret is configured (verification disabled)
    pub fn from_config(config: &TurnstileConfig) -> anyhow::Result<Option<DynVerifier>> {
        match config.secret_key.as_deref().filter(|s| !s.is_empty()) {
            Some(secret) => Ok(Some(Arc::new(Self::new(secret, &config.verify_url)?))),
            None => Ok(None),
        }
    }

    async fn siteverify(&self, token: &str, remote_ip: &str) -> reqwest::Result<SiteVerifyResponse> {
        self.client
            .post(&self.verify_url)
            .form(&[
                ("secret", self.secret.as_str()),
                ("response", token),
                ("remoteip", remote_ip),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}

#[async_trait]
impl HumanVerifier for TurnstileVerifier {
    async fn verify(&self, token: &str, remote_ip: &str) -> bool {
        match self.siteverify(token, remote_ip).await {
            Ok(outcome) => {
                if !outcome.success {
                    tracing::info!(errors = ?outcome.error_codes, "Turnstile rejected token");
                }
                outcome.success
            }
            Err(e) => {
                tracing::error!("Turnstile verification error: {}", e);
                false
            }
        }
    }
}
