//! Delivery of sign-in links.
//!
//! The `log` mailer writes the link to the trace log and is meant for local
//! development. The `resend` mailer posts to the Resend HTTP API.

use std::{sync::Arc, time::Duration};

use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tokio::sync::Mutex;

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

fn default_from() -> String { "Calorice <onboarding@resend.dev>".to_owned() }

/// Mailer section of the server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MailerConfig {
  #[default]
  Log,
  Resend {
    api_key: String,
    #[serde(default = "default_from")]
    from:    String,
  },
}

#[derive(Debug, Error)]
pub enum MailError {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),
  #[error("provider answered {status}: {body}")]
  Rejected { status: u16, body: String },
}

/// A message captured by [`Mailer::Memory`].
#[derive(Debug, Clone)]
pub struct SentMail {
  pub to:   String,
  pub link: String,
}

/// Shared handle to the messages captured by a memory mailer.
pub type Outbox = Arc<Mutex<Vec<SentMail>>>;

#[derive(Clone)]
pub enum Mailer {
  Log,
  Resend {
    client:  reqwest::Client,
    api_key: String,
    from:    String,
  },
  /// Keeps messages in memory instead of sending them.
  Memory(Outbox),
  /// Records the message, then reports it as refused by the provider.
  #[cfg(test)]
  Rejecting(Outbox),
}

impl Mailer {
  pub fn from_config(config: &MailerConfig) -> Result<Self, MailError> {
    match config {
      MailerConfig::Log => Ok(Mailer::Log),
      MailerConfig::Resend { api_key, from } => {
        let client = reqwest::Client::builder()
          .timeout(Duration::from_secs(15))
          .build()?;
        Ok(Mailer::Resend { client, api_key: api_key.clone(), from: from.clone() })
      }
    }
  }

  /// A mailer that records messages, plus the handle to read them back.
  pub fn memory() -> (Self, Outbox) {
    let outbox = Outbox::default();
    (Mailer::Memory(outbox.clone()), outbox)
  }

  pub async fn send_magic_link(&self, to: &str, link: &str) -> Result<(), MailError> {
    match self {
      Mailer::Log => {
        tracing::info!(%to, %link, "sign-in link (log mailer)");
        Ok(())
      }
      Mailer::Resend { client, api_key, from } => {
        let payload = json!({
          "from": from,
          "to": [to],
          "subject": "Sign in to Calorice",
          "text": format!("Sign in to Calorice:\n{link}\n\nIf you did not request this email you can safely ignore it.\n"),
          "html": format!(
            "<p>Sign in to Calorice:</p><p><a href=\"{link}\">Sign in</a></p>\
             <p>If you did not request this email you can safely ignore it.</p>"
          ),
        });

        let resp = client
          .post(RESEND_ENDPOINT)
          .bearer_auth(api_key)
          .json(&payload)
          .send()
          .await?;

        let status = resp.status();
        if !status.is_success() {
          let body = resp.text().await.unwrap_or_default();
          return Err(MailError::Rejected { status: status.as_u16(), body });
        }
        tracing::debug!(%to, "sign-in email accepted by provider");
        Ok(())
      }
      Mailer::Memory(outbox) => {
        outbox.lock().await.push(SentMail { to: to.to_owned(), link: link.to_owned() });
        Ok(())
      }
      #[cfg(test)]
      Mailer::Rejecting(outbox) => {
        outbox.lock().await.push(SentMail { to: to.to_owned(), link: link.to_owned() });
        Err(MailError::Rejected { status: 422, body: "invalid recipient".into() })
      }
    }
  }
}
