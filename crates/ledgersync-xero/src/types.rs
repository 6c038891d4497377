//! Xero accounting API wire shapes.
//!
//! Field names follow Xero's PascalCase JSON exactly; these structs exist to
//! serialize, not to model. Identifier fields use Xero's `...ID` casing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Xero invoice status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum XeroInvoiceStatus {
    /// Editable, not yet approved.
    Draft,
    /// Approved and awaiting payment.
    Authorised,
    /// Fully paid.
    Paid,
    /// Voided; terminal.
    Voided,
}

impl XeroInvoiceStatus {
    /// Convert to the wire string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            XeroInvoiceStatus::Draft => "DRAFT",
            XeroInvoiceStatus::Authorised => "AUTHORISED",
            XeroInvoiceStatus::Paid => "PAID",
            XeroInvoiceStatus::Voided => "VOIDED",
        }
    }
}

impl fmt::Display for XeroInvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A Xero contact, as sent on create.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct XeroContact {
    /// Xero contact id; absent on create.
    #[serde(rename = "ContactID", skip_serializing_if = "Option::is_none")]
    pub contact_id: Option<String>,
    /// Contact display name (unique within a Xero organisation).
    #[serde(rename = "Name")]
    pub name: String,
    /// First name of the primary person.
    #[serde(rename = "FirstName", skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Last name of the primary person.
    #[serde(rename = "LastName", skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Primary email address.
    #[serde(rename = "EmailAddress", skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
}

/// Reference to an existing contact by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XeroContactRef {
    /// Xero contact id.
    #[serde(rename = "ContactID")]
    pub contact_id: String,
}

/// One invoice line item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XeroLineItem {
    /// Line description.
    #[serde(rename = "Description")]
    pub description: String,
    /// Quantity.
    #[serde(rename = "Quantity")]
    pub quantity: f64,
    /// Unit price.
    #[serde(rename = "UnitAmount")]
    pub unit_amount: f64,
    /// Revenue account code.
    #[serde(rename = "AccountCode")]
    pub account_code: String,
    /// Tax treatment.
    #[serde(rename = "TaxType")]
    pub tax_type: String,
}

/// An accounts-receivable invoice, as sent on create/update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XeroInvoice {
    /// Invoice type; always `ACCREC` for sales invoices.
    #[serde(rename = "Type")]
    pub invoice_type: String,
    /// The contact being invoiced.
    #[serde(rename = "Contact")]
    pub contact: XeroContactRef,
    /// Source invoice number, surfaced as the Xero invoice number.
    #[serde(rename = "InvoiceNumber", skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<String>,
    /// Source invoice number; the cross-system join key used by
    /// `find_invoice_by_reference`.
    #[serde(rename = "Reference")]
    pub reference: String,
    /// Issue date (YYYY-MM-DD).
    #[serde(rename = "Date", skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Due date (YYYY-MM-DD).
    #[serde(rename = "DueDate", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    /// Target status.
    #[serde(rename = "Status")]
    pub status: XeroInvoiceStatus,
    /// Line items; always at least one.
    #[serde(rename = "LineItems")]
    pub line_items: Vec<XeroLineItem>,
}

/// A payment applied to exactly one invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XeroPayment {
    /// The invoice the payment applies to.
    #[serde(rename = "Invoice")]
    pub invoice: InvoiceRef,
    /// The bank account the payment was received into.
    #[serde(rename = "Account")]
    pub account: AccountRef,
    /// Payment date (YYYY-MM-DD).
    #[serde(rename = "Date", skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Amount applied.
    #[serde(rename = "Amount")]
    pub amount: f64,
    /// Free-text reference.
    #[serde(rename = "Reference", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

/// Reference to an invoice by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceRef {
    /// Xero invoice id.
    #[serde(rename = "InvoiceID")]
    pub invoice_id: String,
}

/// Reference to an account by code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountRef {
    /// Account code.
    #[serde(rename = "Code")]
    pub code: String,
}
