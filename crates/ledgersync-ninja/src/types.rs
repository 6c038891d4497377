//! Invoice Ninja wire shapes consumed by the sync engine.
//!
//! Fields default aggressively: webhook payloads and list responses omit
//! anything unset, and a missing optional field must never fail a sync.

use serde::{Deserialize, Serialize};

/// Invoice status codes as Invoice Ninja reports them (`status_id`).
///
/// Numeric string table: "1" Draft, "2" Sent, "3" Viewed, "4" Approved,
/// "5" Partial, "6" Paid, "-1" Cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceInvoiceStatus {
    /// Not yet finalized; never synced.
    Draft,
    /// Sent to the client.
    Sent,
    /// Opened by the client.
    Viewed,
    /// Approved by the client.
    Approved,
    /// Partially paid.
    Partial,
    /// Fully paid.
    Paid,
    /// Cancelled in the source system.
    Cancelled,
}

impl SourceInvoiceStatus {
    /// Parse a `status_id` code. Unknown codes return `None`; the mapper
    /// treats that as Draft rather than failing.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "1" => Some(SourceInvoiceStatus::Draft),
            "2" => Some(SourceInvoiceStatus::Sent),
            "3" => Some(SourceInvoiceStatus::Viewed),
            "4" => Some(SourceInvoiceStatus::Approved),
            "5" => Some(SourceInvoiceStatus::Partial),
            "6" => Some(SourceInvoiceStatus::Paid),
            "-1" => Some(SourceInvoiceStatus::Cancelled),
            _ => None,
        }
    }
}

/// A contact person on a source client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceContact {
    /// First name.
    #[serde(default)]
    pub first_name: String,
    /// Last name.
    #[serde(default)]
    pub last_name: String,
    /// Email address.
    #[serde(default)]
    pub email: String,
}

/// A client (customer) in the source system.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceClient {
    /// Source id.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Contact people.
    #[serde(default)]
    pub contacts: Vec<SourceContact>,
}

impl SourceClient {
    /// Primary email, from the first contact that has one.
    #[must_use]
    pub fn primary_email(&self) -> Option<&str> {
        self.contacts
            .iter()
            .map(|c| c.email.as_str())
            .find(|e| !e.is_empty())
    }

    /// Best display name: client name, else first contact's full name.
    #[must_use]
    pub fn display_name(&self) -> String {
        if !self.name.is_empty() {
            return self.name.clone();
        }
        self.contacts
            .first()
            .map(|c| format!("{} {}", c.first_name, c.last_name).trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("Client {}", self.id))
    }
}

/// One line item on a source invoice.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceLineItem {
    /// Product key / SKU.
    #[serde(default)]
    pub product_key: String,
    /// Free-text description.
    #[serde(default)]
    pub notes: String,
    /// Quantity.
    #[serde(default)]
    pub quantity: f64,
    /// Unit cost.
    #[serde(default)]
    pub cost: f64,
}

/// An invoice in the source system.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceInvoice {
    /// Source id.
    pub id: String,
    /// Human-facing invoice number; stored as the Xero reference and used
    /// as the cross-system join key.
    #[serde(default)]
    pub number: String,
    /// Owning client id.
    #[serde(default)]
    pub client_id: String,
    /// Embedded client, present on webhook payloads.
    #[serde(default)]
    pub client: Option<SourceClient>,
    /// Status code (see [`SourceInvoiceStatus`]).
    #[serde(default)]
    pub status_id: String,
    /// Invoice total.
    #[serde(default)]
    pub amount: f64,
    /// Issue date (YYYY-MM-DD).
    #[serde(default)]
    pub date: String,
    /// Due date (YYYY-MM-DD).
    #[serde(default)]
    pub due_date: String,
    /// Line items; may be empty.
    #[serde(default)]
    pub line_items: Vec<SourceLineItem>,
}

impl SourceInvoice {
    /// Parsed status; unknown codes yield `None`.
    #[must_use]
    pub fn status(&self) -> Option<SourceInvoiceStatus> {
        SourceInvoiceStatus::from_code(&self.status_id)
    }

    /// Whether this invoice is a draft (ineligible for sync).
    #[must_use]
    pub fn is_draft(&self) -> bool {
        matches!(self.status(), Some(SourceInvoiceStatus::Draft))
    }
}

/// Allocation of a payment amount to one invoice.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentAllocation {
    /// Invoice the amount applies to.
    pub invoice_id: String,
    /// Amount applied.
    #[serde(default)]
    pub amount: f64,
}

/// A payment in the source system.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourcePayment {
    /// Source id.
    pub id: String,
    /// Human-facing payment number.
    #[serde(default)]
    pub number: String,
    /// Total payment amount.
    #[serde(default)]
    pub amount: f64,
    /// Payment date (YYYY-MM-DD).
    #[serde(default)]
    pub date: String,
    /// Free-text transaction reference.
    #[serde(default)]
    pub transaction_reference: String,
    /// Invoice allocations. A payment with no allocations is ineligible.
    #[serde(default)]
    pub invoices: Vec<PaymentAllocation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            SourceInvoiceStatus::from_code("1"),
            Some(SourceInvoiceStatus::Draft)
        );
        assert_eq!(
            SourceInvoiceStatus::from_code("6"),
            Some(SourceInvoiceStatus::Paid)
        );
        assert_eq!(
            SourceInvoiceStatus::from_code("-1"),
            Some(SourceInvoiceStatus::Cancelled)
        );
        assert_eq!(SourceInvoiceStatus::from_code("99"), None);
    }

    #[test]
    fn test_client_display_name_fallbacks() {
        let named = SourceClient {
            id: "c1".to_string(),
            name: "Acme Pty Ltd".to_string(),
            contacts: vec![],
        };
        assert_eq!(named.display_name(), "Acme Pty Ltd");

        let contact_only = SourceClient {
            id: "c2".to_string(),
            name: String::new(),
            contacts: vec![SourceContact {
                first_name: "Jo".to_string(),
                last_name: "Bloggs".to_string(),
                email: "jo@example.com".to_string(),
            }],
        };
        assert_eq!(contact_only.display_name(), "Jo Bloggs");
        assert_eq!(contact_only.primary_email(), Some("jo@example.com"));

        let bare = SourceClient {
            id: "c3".to_string(),
            ..Default::default()
        };
        assert_eq!(bare.display_name(), "Client c3");
        assert_eq!(bare.primary_email(), None);
    }

    #[test]
    fn test_webhook_payload_deserializes_with_missing_fields() {
        let invoice: SourceInvoice =
            serde_json::from_str(r#"{"id": "inv_1", "number": "INV-0001", "status_id": "1"}"#)
                .unwrap();
        assert!(invoice.is_draft());
        assert!(invoice.line_items.is_empty());
        assert!(invoice.client.is_none());
    }
}
