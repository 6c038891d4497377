//! Typed fetch client for the Invoice Ninja REST API.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::{NinjaError, NinjaResult};
use crate::types::{SourceClient, SourceInvoice, SourcePayment};

/// Read access to the source system.
///
/// The orchestrators depend on this trait rather than the concrete client so
/// tests can substitute an in-memory feed.
#[async_trait]
pub trait SourceFeed: Send + Sync {
    /// Fetch one invoice by source id.
    async fn fetch_invoice(&self, id: &str) -> NinjaResult<SourceInvoice>;

    /// Fetch one payment by source id.
    async fn fetch_payment(&self, id: &str) -> NinjaResult<SourcePayment>;

    /// Fetch one client by source id.
    async fn fetch_client(&self, id: &str) -> NinjaResult<SourceClient>;

    /// List invoices, optionally only those issued on/after `since`.
    async fn list_invoices(&self, since: Option<NaiveDate>) -> NinjaResult<Vec<SourceInvoice>>;

    /// List payments, optionally only those dated on/after `since`.
    async fn list_payments(&self, since: Option<NaiveDate>) -> NinjaResult<Vec<SourcePayment>>;
}

/// Invoice Ninja API client.
#[derive(Debug, Clone)]
pub struct NinjaClient {
    http: reqwest::Client,
    base_url: String,
    api_token: String,
}

/// Single-entity response envelope.
#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

impl NinjaClient {
    /// Create a new client. `base_url` has no trailing slash,
    /// e.g. `https://invoicing.example.com/api/v1`.
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            http: reqwest::Client::new(),
            base_url,
            api_token: api_token.into(),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> NinjaResult<T> {
        let url = format!("{}{path}", self.base_url);
        debug!(url = %url, "Fetching from Invoice Ninja");

        let response = self
            .http
            .get(&url)
            .header("X-API-TOKEN", &self.api_token)
            .header("X-Requested-With", "XMLHttpRequest")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NinjaError::Api {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        Ok(response.json().await?)
    }

    fn not_found(entity: &'static str, id: &str, err: NinjaError) -> NinjaError {
        match err {
            NinjaError::Api { status: 404, .. } => NinjaError::NotFound {
                entity,
                id: id.to_string(),
            },
            other => other,
        }
    }
}

#[async_trait]
impl SourceFeed for NinjaClient {
    #[instrument(skip(self))]
    async fn fetch_invoice(&self, id: &str) -> NinjaResult<SourceInvoice> {
        let envelope: DataEnvelope<SourceInvoice> = self
            .get_json(&format!("/invoices/{id}"))
            .await
            .map_err(|e| Self::not_found("invoice", id, e))?;
        Ok(envelope.data)
    }

    #[instrument(skip(self))]
    async fn fetch_payment(&self, id: &str) -> NinjaResult<SourcePayment> {
        let envelope: DataEnvelope<SourcePayment> = self
            .get_json(&format!("/payments/{id}"))
            .await
            .map_err(|e| Self::not_found("payment", id, e))?;
        Ok(envelope.data)
    }

    #[instrument(skip(self))]
    async fn fetch_client(&self, id: &str) -> NinjaResult<SourceClient> {
        let envelope: DataEnvelope<SourceClient> = self
            .get_json(&format!("/clients/{id}"))
            .await
            .map_err(|e| Self::not_found("client", id, e))?;
        Ok(envelope.data)
    }

    #[instrument(skip(self))]
    async fn list_invoices(&self, since: Option<NaiveDate>) -> NinjaResult<Vec<SourceInvoice>> {
        let path = match since {
            Some(date) => format!("/invoices?per_page=500&date_range=date&start_date={date}"),
            None => "/invoices?per_page=500".to_string(),
        };
        let envelope: DataEnvelope<Vec<SourceInvoice>> = self.get_json(&path).await?;
        Ok(envelope.data)
    }

    #[instrument(skip(self))]
    async fn list_payments(&self, since: Option<NaiveDate>) -> NinjaResult<Vec<SourcePayment>> {
        let path = match since {
            Some(date) => format!("/payments?per_page=500&date_range=date&start_date={date}"),
            None => "/payments?per_page=500".to_string(),
        };
        let envelope: DataEnvelope<Vec<SourcePayment>> = self.get_json(&path).await?;
        Ok(envelope.data)
    }
}
