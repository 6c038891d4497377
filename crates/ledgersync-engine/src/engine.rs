//! The sync orchestrators.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use ledgersync_core::{EntityKind, RecordStatus, SyncOutcome};
use ledgersync_ninja::{SourceClient, SourceFeed, SourceInvoice, SourcePayment};
use ledgersync_xero::{mapper, Ledger, LedgerProvider};

use crate::error::{EngineError, EngineResult};
use crate::store::{SettingsSource, SyncLedger};

/// Note returned when the integration is entirely unconfigured.
const NOT_CONFIGURED_NOTE: &str = "Xero integration not configured; sync skipped";

/// The sync engine: one instance wired at startup, shared by all triggers.
pub struct SyncEngine {
    records: Arc<dyn SyncLedger>,
    config: Arc<dyn SettingsSource>,
    source: Arc<dyn SourceFeed>,
    provider: Arc<dyn LedgerProvider>,
}

impl SyncEngine {
    /// Create a new engine.
    #[must_use]
    pub fn new(
        records: Arc<dyn SyncLedger>,
        config: Arc<dyn SettingsSource>,
        source: Arc<dyn SourceFeed>,
        provider: Arc<dyn LedgerProvider>,
    ) -> Self {
        Self {
            records,
            config,
            source,
            provider,
        }
    }

    /// Access the sync ledger (status endpoint, reconciliation).
    #[must_use]
    pub(crate) fn records(&self) -> &dyn SyncLedger {
        self.records.as_ref()
    }

    pub(crate) fn config(&self) -> &dyn SettingsSource {
        self.config.as_ref()
    }

    pub(crate) fn source(&self) -> &dyn SourceFeed {
        self.source.as_ref()
    }

    pub(crate) fn provider(&self) -> &dyn LedgerProvider {
        self.provider.as_ref()
    }

    /// Whether webhook events should trigger sync. Read per event.
    pub async fn auto_sync_enabled(&self) -> bool {
        self.config.auto_sync_enabled().await.unwrap_or(true)
    }

    /// Whether OAuth application credentials exist at all.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.provider.is_configured()
    }

    // ------------------------------------------------------------------
    // Client sync
    // ------------------------------------------------------------------

    /// Sync one client to a Xero contact.
    #[instrument(skip(self, client), fields(ninja_id = %client.id))]
    pub async fn sync_client(&self, client: &SourceClient) -> SyncOutcome {
        if !self.provider.is_configured() {
            return SyncOutcome::noop(NOT_CONFIGURED_NOTE);
        }

        // Already synced: answer from the record without touching the vault.
        if let Ok(Some(record)) = self.records.get(EntityKind::Client, &client.id).await {
            if record.status == RecordStatus::Synced {
                if let Some(xero_id) = record.xero_id {
                    return SyncOutcome::synced(xero_id);
                }
            }
        }

        let ledger = match self.provider.connect().await {
            Ok(Some(ledger)) => ledger,
            Ok(None) => return self.record_failure(EntityKind::Client, &client.id, "Xero not connected").await,
            Err(e) => return self.record_failure(EntityKind::Client, &client.id, &e.to_string()).await,
        };

        match self.resolve_contact(client, ledger.as_ref()).await {
            Ok(contact_id) => SyncOutcome::synced(contact_id),
            Err(e) => self.record_failure(EntityKind::Client, &client.id, &e.to_string()).await,
        }
    }

    /// Get-or-create the Xero contact for a client, recording the outcome on
    /// the client's own sync record. Reuses the caller's ledger connection.
    async fn resolve_contact(
        &self,
        client: &SourceClient,
        ledger: &dyn Ledger,
    ) -> EngineResult<String> {
        if let Some(record) = self.records.get(EntityKind::Client, &client.id).await? {
            if record.status == RecordStatus::Synced {
                if let Some(xero_id) = record.xero_id {
                    return Ok(xero_id);
                }
            }
        }

        let contact = mapper::map_client_to_contact(client);
        let contact_id = match ledger.get_or_create_contact(&contact).await {
            Ok(id) => id,
            Err(e) => {
                self.records
                    .mark_failed(EntityKind::Client, &client.id, &e.to_string(), None)
                    .await?;
                return Err(e.into());
            }
        };

        self.records
            .mark_synced(EntityKind::Client, &client.id, &contact_id)
            .await?;
        info!(ninja_id = %client.id, xero_id = %contact_id, "Client synced");
        Ok(contact_id)
    }

    // ------------------------------------------------------------------
    // Invoice sync
    // ------------------------------------------------------------------

    /// Fetch an invoice from the source system and sync it.
    #[instrument(skip(self))]
    pub async fn sync_invoice_by_id(&self, ninja_id: &str, force_update: bool) -> SyncOutcome {
        if !self.provider.is_configured() {
            return SyncOutcome::noop(NOT_CONFIGURED_NOTE);
        }

        match self.source.fetch_invoice(ninja_id).await {
            Ok(invoice) => self.sync_invoice(&invoice, force_update).await,
            Err(e) => {
                let message = format!("Failed to fetch source invoice: {e}");
                self.record_failure(EntityKind::Invoice, ninja_id, &message).await
            }
        }
    }

    /// Sync one invoice to Xero, creating the contact first if needed.
    #[instrument(skip(self, invoice), fields(ninja_id = %invoice.id, force_update))]
    pub async fn sync_invoice(&self, invoice: &SourceInvoice, force_update: bool) -> SyncOutcome {
        if !self.provider.is_configured() {
            return SyncOutcome::noop(NOT_CONFIGURED_NOTE);
        }

        match self.sync_invoice_inner(invoice, force_update).await {
            Ok(outcome) => outcome,
            Err(e) => self.record_failure(EntityKind::Invoice, &invoice.id, &e.to_string()).await,
        }
    }

    async fn sync_invoice_inner(
        &self,
        invoice: &SourceInvoice,
        force_update: bool,
    ) -> EngineResult<SyncOutcome> {
        // Idempotency: at most one create per source entity per mirror
        // lifetime, however many times a trigger fires.
        if let Some(record) = self.records.get(EntityKind::Invoice, &invoice.id).await? {
            if record.status == RecordStatus::Synced && !force_update {
                if let Some(xero_id) = record.xero_id {
                    return Ok(SyncOutcome::synced(xero_id));
                }
            }
        }

        if invoice.is_draft() {
            let note = "Skipped draft invoice";
            self.records
                .mark_skipped(EntityKind::Invoice, &invoice.id, note)
                .await?;
            return Ok(SyncOutcome::skipped(note));
        }

        let ledger = self
            .provider
            .connect()
            .await?
            .ok_or(EngineError::NotConnected)?;

        // Dependency: the ledger-side contact must exist first.
        let client = self.resolve_source_client(invoice).await?;
        let contact_id = self
            .resolve_contact(&client, ledger.as_ref())
            .await
            .map_err(|e| EngineError::dependency(EntityKind::Client, &client.id, e.to_string()))?;

        let settings = self.config.settings().await?;
        let mapped = mapper::map_invoice(
            invoice,
            &contact_id,
            &settings.sales_account_code,
            &settings.tax_type,
        );

        // A forced update pushes changes to the existing ledger invoice,
        // located via the reference join key.
        if force_update {
            if let Some(found) = ledger.find_invoice_by_reference(&invoice.number).await? {
                let xero_id = ledger.update_invoice(&found.invoice_id, &mapped).await?;
                self.records
                    .mark_synced(EntityKind::Invoice, &invoice.id, &xero_id)
                    .await?;
                info!(ninja_id = %invoice.id, xero_id = %xero_id, "Invoice updated in Xero");
                return Ok(SyncOutcome::synced(xero_id));
            }
        }

        let xero_id = ledger.create_invoice(&mapped).await?;
        self.records
            .mark_synced(EntityKind::Invoice, &invoice.id, &xero_id)
            .await?;
        info!(ninja_id = %invoice.id, xero_id = %xero_id, "Invoice created in Xero");
        Ok(SyncOutcome::synced(xero_id))
    }

    /// The invoice's client: embedded on webhook payloads, fetched otherwise.
    async fn resolve_source_client(&self, invoice: &SourceInvoice) -> EngineResult<SourceClient> {
        if let Some(client) = &invoice.client {
            return Ok(client.clone());
        }
        if invoice.client_id.is_empty() {
            return Err(EngineError::dependency(
                EntityKind::Client,
                "<unknown>",
                "invoice has no client reference",
            ));
        }
        Ok(self.source.fetch_client(&invoice.client_id).await?)
    }

    /// Void the mirrored invoice after a source-side deletion and close out
    /// its sync record.
    #[instrument(skip(self))]
    pub async fn void_deleted_invoice(&self, ninja_id: &str) -> SyncOutcome {
        if !self.provider.is_configured() {
            return SyncOutcome::noop(NOT_CONFIGURED_NOTE);
        }

        let record = match self.records.get(EntityKind::Invoice, ninja_id).await {
            Ok(r) => r,
            Err(e) => return self.record_failure(EntityKind::Invoice, ninja_id, &e.to_string()).await,
        };

        let Some(xero_id) = record.as_ref().and_then(|r| r.xero_id.clone()) else {
            // Never mirrored; nothing to void in the ledger.
            let note = "Deleted in source before sync";
            return match self.records.mark_skipped(EntityKind::Invoice, ninja_id, note).await {
                Ok(_) => SyncOutcome::skipped(note),
                Err(e) => SyncOutcome::failed(e.to_string()),
            };
        };

        let result: EngineResult<()> = async {
            let ledger = self
                .provider
                .connect()
                .await?
                .ok_or(EngineError::NotConnected)?;
            ledger.void_invoice(&xero_id).await?;
            self.records
                .mark_skipped(EntityKind::Invoice, ninja_id, "Voided after source deletion")
                .await?;
            Ok(())
        }
        .await;

        match result {
            Ok(()) => {
                info!(ninja_id, xero_id = %xero_id, "Voided invoice after source deletion");
                SyncOutcome::skipped("Voided after source deletion")
            }
            Err(e) => self.record_failure(EntityKind::Invoice, ninja_id, &e.to_string()).await,
        }
    }

    // ------------------------------------------------------------------
    // Payment sync
    // ------------------------------------------------------------------

    /// Fetch a payment from the source system and sync it.
    #[instrument(skip(self))]
    pub async fn sync_payment_by_id(&self, ninja_id: &str, force_update: bool) -> SyncOutcome {
        if !self.provider.is_configured() {
            return SyncOutcome::noop(NOT_CONFIGURED_NOTE);
        }

        match self.source.fetch_payment(ninja_id).await {
            Ok(payment) => self.sync_payment(&payment, force_update).await,
            Err(e) => {
                let message = format!("Failed to fetch source payment: {e}");
                self.record_failure(EntityKind::Payment, ninja_id, &message).await
            }
        }
    }

    /// Sync one payment to Xero, syncing its invoice first if needed.
    #[instrument(skip(self, payment), fields(ninja_id = %payment.id, force_update))]
    pub async fn sync_payment(&self, payment: &SourcePayment, force_update: bool) -> SyncOutcome {
        if !self.provider.is_configured() {
            return SyncOutcome::noop(NOT_CONFIGURED_NOTE);
        }

        // Xero forbids payment mutation: a forced "update" of an already
        // synced payment is a no-op returning the existing mirror id. This
        // asymmetry with invoices is an external-system constraint.
        if let Ok(Some(record)) = self.records.get(EntityKind::Payment, &payment.id).await {
            if record.status == RecordStatus::Synced {
                if let Some(xero_id) = record.xero_id {
                    if force_update {
                        warn!(
                            ninja_id = %payment.id,
                            "Payment update requested; Xero payments are immutable, keeping existing mirror"
                        );
                    }
                    return SyncOutcome::synced(xero_id);
                }
            }
        }

        match self.sync_payment_inner(payment).await {
            Ok(outcome) => outcome,
            Err(e) => self.record_failure(EntityKind::Payment, &payment.id, &e.to_string()).await,
        }
    }

    async fn sync_payment_inner(&self, payment: &SourcePayment) -> EngineResult<SyncOutcome> {
        let Some(allocation) = payment.invoices.first() else {
            let note = "Skipped payment with no invoice allocations";
            self.records
                .mark_skipped(EntityKind::Payment, &payment.id, note)
                .await?;
            return Ok(SyncOutcome::skipped(note));
        };

        // Dependency: the allocated invoice must be mirrored first.
        let xero_invoice_id = match self
            .records
            .get(EntityKind::Invoice, &allocation.invoice_id)
            .await?
        {
            Some(record) if record.status == RecordStatus::Synced && record.xero_id.is_some() => {
                record.xero_id.unwrap_or_default()
            }
            _ => {
                let invoice_outcome = self.sync_invoice_by_id(&allocation.invoice_id, false).await;
                invoice_outcome.mirror_id.ok_or_else(|| {
                    EngineError::dependency(
                        EntityKind::Invoice,
                        &allocation.invoice_id,
                        invoice_outcome
                            .message
                            .unwrap_or_else(|| "no mirror id".to_string()),
                    )
                })?
            }
        };

        let ledger = self
            .provider
            .connect()
            .await?
            .ok_or(EngineError::NotConnected)?;

        let settings = self.config.settings().await?;
        let mapped = mapper::map_payment(payment, &xero_invoice_id, &settings.payment_account_code);

        let xero_id = ledger.create_payment(&mapped).await?;
        self.records
            .mark_synced(EntityKind::Payment, &payment.id, &xero_id)
            .await?;
        info!(ninja_id = %payment.id, xero_id = %xero_id, "Payment created in Xero");
        Ok(SyncOutcome::synced(xero_id))
    }

    // ------------------------------------------------------------------
    // Shared failure path
    // ------------------------------------------------------------------

    /// Record a failure in the sync ledger and fold it into an outcome.
    /// Best-effort: a store failure here is logged, not propagated.
    async fn record_failure(
        &self,
        entity: EntityKind,
        ninja_id: &str,
        message: &str,
    ) -> SyncOutcome {
        warn!(entity = %entity, ninja_id, error = message, "Sync attempt failed");

        if let Err(e) = self
            .records
            .mark_failed(entity, ninja_id, message, None)
            .await
        {
            warn!(entity = %entity, ninja_id, error = %e, "Could not record sync failure");
        }

        SyncOutcome::failed(message)
    }
}
