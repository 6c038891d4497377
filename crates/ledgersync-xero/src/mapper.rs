//! Pure source→ledger transformations. No I/O, no clocks, no panics.

use ledgersync_ninja::{SourceClient, SourceInvoice, SourceInvoiceStatus, SourcePayment};

use crate::types::{
    AccountRef, InvoiceRef, XeroContact, XeroContactRef, XeroInvoice, XeroInvoiceStatus,
    XeroLineItem, XeroPayment,
};

/// Map a source invoice status to the Xero status.
///
/// Total over every input: unknown codes map to DRAFT as the fail-safe
/// default rather than rejecting the invoice.
#[must_use]
pub fn map_invoice_status(status_id: &str) -> XeroInvoiceStatus {
    match SourceInvoiceStatus::from_code(status_id) {
        Some(SourceInvoiceStatus::Draft) | None => XeroInvoiceStatus::Draft,
        Some(
            SourceInvoiceStatus::Sent
            | SourceInvoiceStatus::Viewed
            | SourceInvoiceStatus::Approved
            | SourceInvoiceStatus::Partial,
        ) => XeroInvoiceStatus::Authorised,
        Some(SourceInvoiceStatus::Paid) => XeroInvoiceStatus::Paid,
        Some(SourceInvoiceStatus::Cancelled) => XeroInvoiceStatus::Voided,
    }
}

/// Map source line items to Xero line items.
///
/// When the source invoice carries no line items, exactly one line is
/// synthesized for the full invoice amount — an invoice is never rejected
/// purely for missing line-item detail.
#[must_use]
pub fn map_line_items(
    invoice: &SourceInvoice,
    account_code: &str,
    tax_type: &str,
) -> Vec<XeroLineItem> {
    if invoice.line_items.is_empty() {
        return vec![XeroLineItem {
            description: format!("Invoice {}", invoice.number),
            quantity: 1.0,
            unit_amount: invoice.amount,
            account_code: account_code.to_string(),
            tax_type: tax_type.to_string(),
        }];
    }

    invoice
        .line_items
        .iter()
        .map(|line| XeroLineItem {
            description: if line.notes.is_empty() {
                line.product_key.clone()
            } else {
                line.notes.clone()
            },
            quantity: line.quantity,
            unit_amount: line.cost,
            account_code: account_code.to_string(),
            tax_type: tax_type.to_string(),
        })
        .collect()
}

/// Map a source client to a Xero contact (for create/search).
#[must_use]
pub fn map_client_to_contact(client: &SourceClient) -> XeroContact {
    let primary = client.contacts.first();
    XeroContact {
        contact_id: None,
        name: client.display_name(),
        first_name: primary
            .map(|c| c.first_name.clone())
            .filter(|n| !n.is_empty()),
        last_name: primary
            .map(|c| c.last_name.clone())
            .filter(|n| !n.is_empty()),
        email_address: client.primary_email().map(str::to_string),
    }
}

/// Map a source invoice to a Xero invoice for the given contact.
#[must_use]
pub fn map_invoice(
    invoice: &SourceInvoice,
    contact_id: &str,
    account_code: &str,
    tax_type: &str,
) -> XeroInvoice {
    XeroInvoice {
        invoice_type: "ACCREC".to_string(),
        contact: XeroContactRef {
            contact_id: contact_id.to_string(),
        },
        invoice_number: non_empty(&invoice.number),
        reference: invoice.number.clone(),
        date: non_empty(&invoice.date),
        due_date: non_empty(&invoice.due_date),
        status: map_invoice_status(&invoice.status_id),
        line_items: map_line_items(invoice, account_code, tax_type),
    }
}

/// Map a source payment to a Xero payment against one ledger invoice.
///
/// Only the FIRST allocation is honored even when the source payment is
/// split across multiple invoices. Deliberate simplification carried over
/// from the system of record; callers must not "fix" it silently.
#[must_use]
pub fn map_payment(
    payment: &SourcePayment,
    xero_invoice_id: &str,
    payment_account_code: &str,
) -> XeroPayment {
    let amount = payment
        .invoices
        .first()
        .map_or(payment.amount, |alloc| alloc.amount);

    XeroPayment {
        invoice: InvoiceRef {
            invoice_id: xero_invoice_id.to_string(),
        },
        account: AccountRef {
            code: payment_account_code.to_string(),
        },
        date: non_empty(&payment.date),
        amount,
        reference: non_empty(&payment.transaction_reference)
            .or_else(|| non_empty(&payment.number)),
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgersync_ninja::{PaymentAllocation, SourceContact, SourceLineItem};

    #[test]
    fn test_status_mapping_is_total() {
        // The seven defined codes each map to exactly one Xero status.
        assert_eq!(map_invoice_status("1"), XeroInvoiceStatus::Draft);
        assert_eq!(map_invoice_status("2"), XeroInvoiceStatus::Authorised);
        assert_eq!(map_invoice_status("3"), XeroInvoiceStatus::Authorised);
        assert_eq!(map_invoice_status("4"), XeroInvoiceStatus::Authorised);
        assert_eq!(map_invoice_status("5"), XeroInvoiceStatus::Authorised);
        assert_eq!(map_invoice_status("6"), XeroInvoiceStatus::Paid);
        assert_eq!(map_invoice_status("-1"), XeroInvoiceStatus::Voided);

        // Unknown codes fail safe to DRAFT instead of erroring.
        assert_eq!(map_invoice_status("99"), XeroInvoiceStatus::Draft);
        assert_eq!(map_invoice_status(""), XeroInvoiceStatus::Draft);
        assert_eq!(map_invoice_status("paid"), XeroInvoiceStatus::Draft);
    }

    #[test]
    fn test_line_items_one_per_source_line() {
        let invoice = SourceInvoice {
            id: "inv_1".to_string(),
            number: "INV-0001".to_string(),
            line_items: vec![
                SourceLineItem {
                    product_key: "WIDGET".to_string(),
                    notes: "Blue widgets".to_string(),
                    quantity: 3.0,
                    cost: 12.5,
                },
                SourceLineItem {
                    product_key: "GADGET".to_string(),
                    notes: String::new(),
                    quantity: 1.0,
                    cost: 99.0,
                },
            ],
            ..Default::default()
        };

        let lines = map_line_items(&invoice, "200", "NONE");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].description, "Blue widgets");
        assert_eq!(lines[0].quantity, 3.0);
        assert_eq!(lines[0].unit_amount, 12.5);
        // Empty notes fall back to the product key.
        assert_eq!(lines[1].description, "GADGET");
        assert!(lines.iter().all(|l| l.account_code == "200"));
    }

    #[test]
    fn test_line_items_synthesized_when_absent() {
        let invoice = SourceInvoice {
            id: "inv_2".to_string(),
            number: "INV-0002".to_string(),
            amount: 150.0,
            ..Default::default()
        };

        let lines = map_line_items(&invoice, "200", "NONE");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 1.0);
        assert_eq!(lines[0].unit_amount, 150.0);
        assert_eq!(lines[0].description, "Invoice INV-0002");
    }

    #[test]
    fn test_client_to_contact() {
        let client = SourceClient {
            id: "c1".to_string(),
            name: "Acme Pty Ltd".to_string(),
            contacts: vec![SourceContact {
                first_name: "Jo".to_string(),
                last_name: "Bloggs".to_string(),
                email: "jo@acme.example".to_string(),
            }],
        };

        let contact = map_client_to_contact(&client);
        assert_eq!(contact.name, "Acme Pty Ltd");
        assert_eq!(contact.first_name.as_deref(), Some("Jo"));
        assert_eq!(contact.email_address.as_deref(), Some("jo@acme.example"));
        assert!(contact.contact_id.is_none());
    }

    #[test]
    fn test_payment_honors_first_allocation_only() {
        // A split payment still binds to exactly one ledger invoice.
        let payment = SourcePayment {
            id: "pay_1".to_string(),
            number: "PAY-7".to_string(),
            amount: 300.0,
            date: "2026-02-01".to_string(),
            transaction_reference: String::new(),
            invoices: vec![
                PaymentAllocation {
                    invoice_id: "inv_1".to_string(),
                    amount: 100.0,
                },
                PaymentAllocation {
                    invoice_id: "inv_2".to_string(),
                    amount: 200.0,
                },
            ],
        };

        let mapped = map_payment(&payment, "xero-inv-1", "090");
        assert_eq!(mapped.invoice.invoice_id, "xero-inv-1");
        assert_eq!(mapped.amount, 100.0);
        assert_eq!(mapped.account.code, "090");
        assert_eq!(mapped.reference.as_deref(), Some("PAY-7"));
    }

    #[test]
    fn test_invoice_mapping_carries_reference() {
        let invoice = SourceInvoice {
            id: "inv_3".to_string(),
            number: "INV-0003".to_string(),
            status_id: "2".to_string(),
            amount: 42.0,
            date: "2026-01-10".to_string(),
            due_date: String::new(),
            ..Default::default()
        };

        let mapped = map_invoice(&invoice, "c-9", "200", "NONE");
        assert_eq!(mapped.reference, "INV-0003");
        assert_eq!(mapped.invoice_number.as_deref(), Some("INV-0003"));
        assert_eq!(mapped.status, XeroInvoiceStatus::Authorised);
        assert_eq!(mapped.contact.contact_id, "c-9");
        assert!(mapped.due_date.is_none());
    }
}
