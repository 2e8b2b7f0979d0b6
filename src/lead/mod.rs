//! Lead capture: where onboarding submissions are sent.

pub mod http;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::LeadConfig;
use crate::error::LeadError;
use crate::trial::model::OnboardingRecord;

pub use http::HttpLeadSink;

/// Body of a lead-capture submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadSubmission {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub utm_source: String,
    pub utm_medium: String,
    pub utm_campaign: String,
}

impl LeadSubmission {
    /// Build a submission for `record`, tagged with the configured attribution.
    pub fn from_record(record: &OnboardingRecord, config: &LeadConfig) -> Self {
        Self {
            name: record.name.clone(),
            email: record.email.clone(),
            phone: record.phone.clone(),
            company: record.company.clone(),
            timestamp: record.submitted_at,
            source: config.source.clone(),
            utm_source: config.utm_source.clone(),
            utm_medium: config.utm_medium.clone(),
            utm_campaign: config.utm_campaign.clone(),
        }
    }
}

/// Receives onboarding leads. `Ok` means the lead was accepted.
#[async_trait]
pub trait LeadSink: Send + Sync {
    async fn submit(&self, lead: &LeadSubmission) -> Result<(), LeadError>;
}

/// Accepts every lead and only logs it. Used when no endpoint is configured.
pub struct LoggingLeadSink;

#[async_trait]
impl LeadSink for LoggingLeadSink {
    async fn submit(&self, lead: &LeadSubmission) -> Result<(), LeadError> {
        info!(
            email = %lead.email,
            company = %lead.company,
            source = %lead.source,
            "Lead captured (no endpoint configured)"
        );
        Ok(())
    }
}
