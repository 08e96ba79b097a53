use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use shared_config::AppConfig;

use crate::models::{
    ApprovalNotice, BookingNotice, EmailMessage, MailApiRequest, RejectionNotice,
};
use crate::services::notifier::Notifier;
use crate::services::templates::{ClinicBranding, PLAIN_TEXT_FALLBACK};

/// Delivers branded HTML email through an HTTP mail API.
pub struct EmailNotifier {
    client: Client,
    api_url: String,
    api_key: String,
    sender: String,
    reply_to: String,
    branding: ClinicBranding,
}

impl EmailNotifier {
    pub fn new(config: &AppConfig) -> Self {
        let timeout = Duration::from_secs(config.notification_timeout_secs);
        let client = Client::builder().timeout(timeout).build().unwrap_or_else(|e| {
            warn!("Failed to build mail client with timeout ({}), using defaults", e);
            Client::new()
        });

        let reply_to = if config.mail_reply_to.is_empty() {
            config.mail_sender.clone()
        } else {
            config.mail_reply_to.clone()
        };

        Self {
            client,
            api_url: config.mail_api_url.clone(),
            api_key: config.mail_api_key.clone(),
            sender: config.mail_sender.clone(),
            reply_to,
            branding: ClinicBranding {
                hospital_name: config.hospital_name.clone(),
                hospital_phone: config.hospital_phone.clone(),
                hospital_address: config.hospital_address.clone(),
            },
        }
    }

    pub fn branding(&self) -> &ClinicBranding {
        &self.branding
    }

    fn is_configured(&self) -> bool {
        !self.api_url.is_empty() && !self.api_key.is_empty() && !self.sender.is_empty()
    }

    fn headers(&self) -> Option<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key)).ok()?,
        );
        headers.insert(
            "Idempotency-Key",
            HeaderValue::from_str(&Uuid::new_v4().to_string()).ok()?,
        );
        Some(headers)
    }

    #[instrument(skip(self, message), fields(to = %message.to))]
    async fn send(&self, message: EmailMessage) -> bool {
        if !self.is_configured() {
            warn!("Email not configured. Skipping send to {}", message.to);
            return true;
        }

        let Some(headers) = self.headers() else {
            error!("Mail API key is not a valid header value");
            return false;
        };

        let body = MailApiRequest {
            from: format!("{} <{}>", self.branding.hospital_name, self.sender),
            to: vec![message.to.as_str()],
            reply_to: &self.reply_to,
            subject: &message.subject,
            html: &message.html,
            text: PLAIN_TEXT_FALLBACK,
        };

        debug!("Posting email '{}' to mail API", message.subject);

        match self
            .client
            .post(&self.api_url)
            .headers(headers)
            .json(&body)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                info!("Email sent to {}", message.to);
                true
            }
            Ok(response) => {
                let status = response.status();
                let text = response.text().await.unwrap_or_default();
                error!("Mail API rejected message ({}): {}", status, text);
                false
            }
            Err(e) => {
                error!("Email sending error: {}", e);
                false
            }
        }
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn notify_booked(&self, notice: &BookingNotice) -> bool {
        self.send(self.branding.booking(notice)).await
    }

    async fn notify_approved(&self, notice: &ApprovalNotice) -> bool {
        self.send(self.branding.confirmation(notice)).await
    }

    async fn notify_rejected(&self, notice: &RejectionNotice) -> bool {
        self.send(self.branding.rejection(notice)).await
    }
}
