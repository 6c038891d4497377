//! Typed HTTP client for the Xero accounting API.
//!
//! Constructed only from valid vault tokens: [`XeroProvider::connect`]
//! returns `Ok(None)` when the integration is not connected, and callers
//! abort the current operation instead of retrying construction.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use ledgersync_vault::TokenVault;

use crate::error::{parse_api_error, LedgerError, LedgerResult};
use crate::types::{XeroContact, XeroInvoice, XeroInvoiceStatus, XeroPayment};

/// Default Xero accounting API base URL.
const DEFAULT_API_URL: &str = "https://api.xero.com/api.xro/2.0";

/// An invoice located in the ledger by reference.
#[derive(Debug, Clone)]
pub struct FoundInvoice {
    /// Xero invoice id.
    pub invoice_id: String,
    /// Current ledger-side status.
    pub status: Option<XeroInvoiceStatus>,
}

/// Ledger operations the orchestrators depend on.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Find a contact by exact name (falling back to email), or create one.
    /// Returns the contact id; never duplicates an exact name match.
    async fn get_or_create_contact(&self, contact: &XeroContact) -> LedgerResult<String>;

    /// Look up an invoice by its `Reference` field, the cross-system join
    /// key holding the source invoice number.
    async fn find_invoice_by_reference(
        &self,
        reference: &str,
    ) -> LedgerResult<Option<FoundInvoice>>;

    /// Create an invoice; returns the new invoice id.
    async fn create_invoice(&self, invoice: &XeroInvoice) -> LedgerResult<String>;

    /// Update an existing invoice in place; returns its id.
    async fn update_invoice(&self, invoice_id: &str, invoice: &XeroInvoice)
        -> LedgerResult<String>;

    /// Set an invoice's status to VOIDED (terminal). Never deletes.
    async fn void_invoice(&self, invoice_id: &str) -> LedgerResult<()>;

    /// Apply a payment to exactly one invoice; returns the payment id.
    async fn create_payment(&self, payment: &XeroPayment) -> LedgerResult<String>;
}

/// Builds a connected [`Ledger`] per operation, or reports "not connected".
#[async_trait]
pub trait LedgerProvider: Send + Sync {
    /// Whether OAuth application credentials exist at all. When false the
    /// whole integration is a no-op, not an error.
    fn is_configured(&self) -> bool;

    /// Fetch-or-refresh tokens and build a client. `Ok(None)` means not
    /// connected (no tokens, undecryptable tokens, or refresh failure).
    async fn connect(&self) -> LedgerResult<Option<Box<dyn Ledger>>>;
}

/// Production provider backed by the token vault.
#[derive(Debug, Clone)]
pub struct XeroProvider {
    vault: Arc<TokenVault>,
    api_url: String,
}

impl XeroProvider {
    /// Create a provider against the production Xero API.
    #[must_use]
    pub fn new(vault: Arc<TokenVault>) -> Self {
        Self {
            vault,
            api_url: DEFAULT_API_URL.to_string(),
        }
    }

    /// Override the API base URL (tests).
    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }
}

#[async_trait]
impl LedgerProvider for XeroProvider {
    fn is_configured(&self) -> bool {
        self.vault.is_configured()
    }

    async fn connect(&self) -> LedgerResult<Option<Box<dyn Ledger>>> {
        let Some(tokens) = self.vault.get_valid_tokens(None).await? else {
            debug!("No valid Xero tokens; not connected");
            return Ok(None);
        };

        Ok(Some(Box::new(XeroClient::new(
            tokens.access_token,
            tokens.tenant_id,
            self.api_url.clone(),
        ))))
    }
}

/// A connected Xero API client scoped to one tenant.
pub struct XeroClient {
    http: reqwest::Client,
    access_token: String,
    tenant_id: String,
    api_url: String,
}

impl std::fmt::Debug for XeroClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XeroClient")
            .field("tenant_id", &self.tenant_id)
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct ContactsResponse {
    #[serde(rename = "Contacts", default)]
    contacts: Vec<ContactEnvelope>,
}

#[derive(Debug, Deserialize)]
struct ContactEnvelope {
    #[serde(rename = "ContactID")]
    contact_id: String,
}

#[derive(Debug, Deserialize)]
struct InvoicesResponse {
    #[serde(rename = "Invoices", default)]
    invoices: Vec<InvoiceEnvelope>,
}

#[derive(Debug, Deserialize)]
struct InvoiceEnvelope {
    #[serde(rename = "InvoiceID")]
    invoice_id: String,
    #[serde(rename = "Status", default)]
    status: Option<XeroInvoiceStatus>,
}

#[derive(Debug, Deserialize)]
struct PaymentsResponse {
    #[serde(rename = "Payments", default)]
    payments: Vec<PaymentEnvelope>,
}

#[derive(Debug, Deserialize)]
struct PaymentEnvelope {
    #[serde(rename = "PaymentID")]
    payment_id: String,
}

impl XeroClient {
    /// Build a client from already-valid credentials.
    #[must_use]
    pub fn new(access_token: String, tenant_id: String, api_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            access_token,
            tenant_id,
            api_url,
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}{path}", self.api_url))
            .bearer_auth(&self.access_token)
            .header("Xero-Tenant-Id", &self.tenant_id)
            .header(reqwest::header::ACCEPT, "application/json")
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> LedgerResult<T> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(parse_api_error(status.as_u16(), &body));
        }
        serde_json::from_str(&body)
            .map_err(|e| LedgerError::UnexpectedResponse(format!("{e}: {body:.200}")))
    }

    async fn find_contact_where(&self, filter: &str) -> LedgerResult<Option<String>> {
        let response = self
            .request(reqwest::Method::GET, "/Contacts")
            .query(&[("where", filter)])
            .send()
            .await?;

        let parsed: ContactsResponse = Self::read_json(response).await?;
        Ok(parsed.contacts.into_iter().next().map(|c| c.contact_id))
    }
}

#[async_trait]
impl Ledger for XeroClient {
    #[instrument(skip(self, contact), fields(name = %contact.name))]
    async fn get_or_create_contact(&self, contact: &XeroContact) -> LedgerResult<String> {
        // Exact name match wins. An ambiguous name can false-positive here;
        // accepted risk, recorded as an open question rather than special-cased.
        let name_filter = format!(r#"Name=="{}""#, contact.name.replace('"', "'"));
        if let Some(id) = self.find_contact_where(&name_filter).await? {
            debug!(contact_id = %id, "Matched existing Xero contact by name");
            return Ok(id);
        }

        if let Some(email) = contact.email_address.as_deref().filter(|e| !e.is_empty()) {
            let email_filter = format!(r#"EmailAddress=="{}""#, email.replace('"', "'"));
            if let Some(id) = self.find_contact_where(&email_filter).await? {
                debug!(contact_id = %id, "Matched existing Xero contact by email");
                return Ok(id);
            }
        }

        let response = self
            .request(reqwest::Method::POST, "/Contacts")
            .json(&json!({ "Contacts": [contact] }))
            .send()
            .await?;

        let parsed: ContactsResponse = Self::read_json(response).await?;
        let created = parsed
            .contacts
            .into_iter()
            .next()
            .ok_or_else(|| LedgerError::UnexpectedResponse("no contact returned".to_string()))?;

        info!(contact_id = %created.contact_id, "Created Xero contact");
        Ok(created.contact_id)
    }

    #[instrument(skip(self))]
    async fn find_invoice_by_reference(
        &self,
        reference: &str,
    ) -> LedgerResult<Option<FoundInvoice>> {
        let filter = format!(r#"Reference=="{}""#, reference.replace('"', "'"));
        let response = self
            .request(reqwest::Method::GET, "/Invoices")
            .query(&[("where", filter.as_str())])
            .send()
            .await?;

        let parsed: InvoicesResponse = Self::read_json(response).await?;
        Ok(parsed.invoices.into_iter().next().map(|inv| FoundInvoice {
            invoice_id: inv.invoice_id,
            status: inv.status,
        }))
    }

    #[instrument(skip(self, invoice), fields(reference = %invoice.reference))]
    async fn create_invoice(&self, invoice: &XeroInvoice) -> LedgerResult<String> {
        let response = self
            .request(reqwest::Method::POST, "/Invoices")
            .json(&json!({ "Invoices": [invoice] }))
            .send()
            .await?;

        let parsed: InvoicesResponse = Self::read_json(response).await?;
        let created = parsed
            .invoices
            .into_iter()
            .next()
            .ok_or_else(|| LedgerError::UnexpectedResponse("no invoice returned".to_string()))?;

        info!(invoice_id = %created.invoice_id, "Created Xero invoice");
        Ok(created.invoice_id)
    }

    #[instrument(skip(self, invoice))]
    async fn update_invoice(
        &self,
        invoice_id: &str,
        invoice: &XeroInvoice,
    ) -> LedgerResult<String> {
        let mut body = serde_json::to_value(invoice)
            .map_err(|e| LedgerError::UnexpectedResponse(e.to_string()))?;
        body["InvoiceID"] = json!(invoice_id);

        let response = self
            .request(reqwest::Method::POST, "/Invoices")
            .json(&json!({ "Invoices": [body] }))
            .send()
            .await?;

        let parsed: InvoicesResponse = Self::read_json(response).await?;
        let updated = parsed
            .invoices
            .into_iter()
            .next()
            .ok_or_else(|| LedgerError::UnexpectedResponse("no invoice returned".to_string()))?;

        info!(invoice_id = %updated.invoice_id, "Updated Xero invoice");
        Ok(updated.invoice_id)
    }

    #[instrument(skip(self))]
    async fn void_invoice(&self, invoice_id: &str) -> LedgerResult<()> {
        let response = self
            .request(reqwest::Method::POST, "/Invoices")
            .json(&json!({
                "Invoices": [{ "InvoiceID": invoice_id, "Status": "VOIDED" }]
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(invoice_id, status = %status, "Void failed");
            return Err(parse_api_error(status.as_u16(), &body));
        }

        info!(invoice_id, "Voided Xero invoice");
        Ok(())
    }

    #[instrument(skip(self, payment), fields(invoice_id = %payment.invoice.invoice_id))]
    async fn create_payment(&self, payment: &XeroPayment) -> LedgerResult<String> {
        let response = self
            .request(reqwest::Method::PUT, "/Payments")
            .json(&json!({ "Payments": [payment] }))
            .send()
            .await?;

        let parsed: PaymentsResponse = Self::read_json(response).await?;
        let created = parsed
            .payments
            .into_iter()
            .next()
            .ok_or_else(|| LedgerError::UnexpectedResponse("no payment returned".to_string()))?;

        info!(payment_id = %created.payment_id, "Created Xero payment");
        Ok(created.payment_id)
    }
}
