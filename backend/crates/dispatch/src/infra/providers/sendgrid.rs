//! SendGrid v3 mail send adapter

use std::sync::Arc;

use serde::Serialize;

use super::{status_error, transport_error};
use crate::application::config::ProviderConfig;
use crate::domain::provider::{EmailProvider, OutgoingEmail};
use crate::error::DispatchResult;

const PROVIDER: &str = "sendgrid";

#[derive(Clone)]
pub struct SendGridClient {
    client: reqwest::Client,
    config: Arc<ProviderConfig>,
}

#[derive(Debug, Serialize)]
struct MailSendBody<'a> {
    personalizations: [Personalization<'a>; 1],
    from: Address<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<Address<'a>>,
    subject: &'a str,
    content: [Content<'a>; 2],
}

#[derive(Debug, Serialize)]
struct Personalization<'a> {
    to: [Address<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Address<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    mime: &'a str,
    value: &'a str,
}

impl SendGridClient {
    pub fn new(client: reqwest::Client, config: Arc<ProviderConfig>) -> Self {
        Self { client, config }
    }

    fn body<'a>(&'a self, email: &'a OutgoingEmail) -> MailSendBody<'a> {
        MailSendBody {
            personalizations: [Personalization {
                to: [Address {
                    email: email.to.as_str(),
                    name: None,
                }],
            }],
            from: Address {
                email: &self.config.sender_email,
                name: Some(&self.config.sender_name),
            },
            reply_to: email.reply_to.as_ref().map(|r| Address {
                email: r.as_str(),
                name: None,
            }),
            subject: &email.subject,
            // SendGrid requires text/plain before text/html
            content: [
                Content {
                    mime: "text/plain",
                    value: &email.text_body,
                },
                Content {
                    mime: "text/html",
                    value: &email.html_body,
                },
            ],
        }
    }
}

/// First `errors[].message` in a SendGrid error body
fn error_message(body: &serde_json::Value) -> Option<String> {
    body.get("errors")?
        .as_array()?
        .iter()
        .find_map(|e| e.get("message").and_then(|m| m.as_str()))
        .map(str::to_string)
}

impl EmailProvider for SendGridClient {
    async fn send(&self, email: &OutgoingEmail) -> DispatchResult<()> {
        let url = format!("{}/v3/mail/send", self.config.sendgrid_base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.sendgrid_api_key)
            .json(&self.body(email))
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, e))?;

        if !response.status().is_success() {
            return Err(status_error(PROVIDER, response, error_message).await);
        }

        tracing::debug!(status = response.status().as_u16(), "SendGrid accepted message");
        Ok(())
    }
}
