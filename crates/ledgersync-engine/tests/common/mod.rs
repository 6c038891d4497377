//! In-memory test doubles for the engine's trait seams.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use ledgersync_core::{EntityKind, RecordStatus};
use ledgersync_db::{DbResult, SyncRecord, SyncSettings};
use ledgersync_engine::{SettingsSource, SyncEngine, SyncLedger};
use ledgersync_ninja::{NinjaError, NinjaResult, SourceClient, SourceFeed, SourceInvoice, SourcePayment};
use ledgersync_xero::{FoundInvoice, Ledger, LedgerError, LedgerProvider, LedgerResult, XeroContact, XeroInvoice, XeroPayment};

// ---------------------------------------------------------------------------
// Sync ledger
// ---------------------------------------------------------------------------

/// Mutex-backed sync ledger mirroring the Postgres upsert semantics.
#[derive(Default)]
pub struct MemoryLedgerStore {
    rows: Mutex<HashMap<(EntityKind, String), SyncRecord>>,
}

impl MemoryLedgerStore {
    pub fn record(&self, entity: EntityKind, ninja_id: &str) -> Option<SyncRecord> {
        self.rows
            .lock()
            .unwrap()
            .get(&(entity, ninja_id.to_string()))
            .cloned()
    }

    pub fn seed(&self, record: SyncRecord) {
        self.rows
            .lock()
            .unwrap()
            .insert((record.entity_type, record.ninja_id.clone()), record);
    }
}

pub fn record(
    entity: EntityKind,
    ninja_id: &str,
    status: RecordStatus,
    xero_id: Option<&str>,
    retry_count: i32,
    updated_at: DateTime<Utc>,
) -> SyncRecord {
    SyncRecord {
        id: Uuid::new_v4(),
        entity_type: entity,
        ninja_id: ninja_id.to_string(),
        xero_id: xero_id.map(str::to_string),
        status,
        error_message: None,
        retry_count,
        synced_at: (status == RecordStatus::Synced).then(Utc::now),
        created_at: updated_at,
        updated_at,
    }
}

#[async_trait]
impl SyncLedger for MemoryLedgerStore {
    async fn get(&self, entity: EntityKind, ninja_id: &str) -> DbResult<Option<SyncRecord>> {
        Ok(self.record(entity, ninja_id))
    }

    async fn mark_synced(
        &self,
        entity: EntityKind,
        ninja_id: &str,
        xero_id: &str,
    ) -> DbResult<SyncRecord> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .entry((entity, ninja_id.to_string()))
            .or_insert_with(|| record(entity, ninja_id, RecordStatus::Pending, None, 0, Utc::now()));
        row.xero_id = Some(xero_id.to_string());
        row.status = RecordStatus::Synced;
        row.error_message = None;
        row.retry_count = 0;
        row.synced_at = Some(Utc::now());
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn mark_failed(
        &self,
        entity: EntityKind,
        ninja_id: &str,
        error: &str,
        xero_id: Option<&str>,
    ) -> DbResult<SyncRecord> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .entry((entity, ninja_id.to_string()))
            .or_insert_with(|| record(entity, ninja_id, RecordStatus::Pending, None, 0, Utc::now()));
        if let Some(id) = xero_id {
            row.xero_id = Some(id.to_string());
        }
        row.status = RecordStatus::Failed;
        row.error_message = Some(error.to_string());
        row.retry_count += 1;
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn mark_skipped(
        &self,
        entity: EntityKind,
        ninja_id: &str,
        note: &str,
    ) -> DbResult<SyncRecord> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .entry((entity, ninja_id.to_string()))
            .or_insert_with(|| record(entity, ninja_id, RecordStatus::Pending, None, 0, Utc::now()));
        row.status = RecordStatus::Skipped;
        row.error_message = Some(note.to_string());
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn failed_records(
        &self,
        entity: EntityKind,
        max_retries: i32,
    ) -> DbResult<Vec<SyncRecord>> {
        let rows = self.rows.lock().unwrap();
        let mut failed: Vec<SyncRecord> = rows
            .values()
            .filter(|r| {
                r.entity_type == entity
                    && r.status == RecordStatus::Failed
                    && r.retry_count < max_retries
            })
            .cloned()
            .collect();
        failed.sort_by_key(|r| r.updated_at);
        failed.truncate(50);
        Ok(failed)
    }

    async fn synced_source_ids(&self, entity: EntityKind) -> DbResult<Vec<String>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .values()
            .filter(|r| r.entity_type == entity && r.status == RecordStatus::Synced)
            .map(|r| r.ninja_id.clone())
            .collect())
    }

    async fn synced_records(&self, entity: EntityKind) -> DbResult<Vec<SyncRecord>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .values()
            .filter(|r| r.entity_type == entity && r.status == RecordStatus::Synced)
            .cloned()
            .collect())
    }

    async fn clear(&self) -> DbResult<u64> {
        let mut rows = self.rows.lock().unwrap();
        let count = rows.len() as u64;
        rows.clear();
        Ok(count)
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemorySettings {
    pub last_reconciliation: Mutex<Option<DateTime<Utc>>>,
}

#[async_trait]
impl SettingsSource for MemorySettings {
    async fn settings(&self) -> DbResult<SyncSettings> {
        Ok(SyncSettings::default())
    }

    async fn auto_sync_enabled(&self) -> DbResult<bool> {
        Ok(true)
    }

    async fn touch_last_reconciliation(&self, at: DateTime<Utc>) -> DbResult<()> {
        *self.last_reconciliation.lock().unwrap() = Some(at);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Source feed
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryFeed {
    pub invoices: Mutex<HashMap<String, SourceInvoice>>,
    pub payments: Mutex<HashMap<String, SourcePayment>>,
    pub clients: Mutex<HashMap<String, SourceClient>>,
}

impl MemoryFeed {
    pub fn add_invoice(&self, invoice: SourceInvoice) {
        self.invoices
            .lock()
            .unwrap()
            .insert(invoice.id.clone(), invoice);
    }

    pub fn add_payment(&self, payment: SourcePayment) {
        self.payments
            .lock()
            .unwrap()
            .insert(payment.id.clone(), payment);
    }

    pub fn add_client(&self, client: SourceClient) {
        self.clients
            .lock()
            .unwrap()
            .insert(client.id.clone(), client);
    }
}

fn missing(entity: &'static str, id: &str) -> NinjaError {
    NinjaError::NotFound {
        entity,
        id: id.to_string(),
    }
}

#[async_trait]
impl SourceFeed for MemoryFeed {
    async fn fetch_invoice(&self, id: &str) -> NinjaResult<SourceInvoice> {
        self.invoices
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| missing("invoice", id))
    }

    async fn fetch_payment(&self, id: &str) -> NinjaResult<SourcePayment> {
        self.payments
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| missing("payment", id))
    }

    async fn fetch_client(&self, id: &str) -> NinjaResult<SourceClient> {
        self.clients
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| missing("client", id))
    }

    async fn list_invoices(&self, _since: Option<chrono::NaiveDate>) -> NinjaResult<Vec<SourceInvoice>> {
        let mut invoices: Vec<SourceInvoice> =
            self.invoices.lock().unwrap().values().cloned().collect();
        invoices.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(invoices)
    }

    async fn list_payments(&self, _since: Option<chrono::NaiveDate>) -> NinjaResult<Vec<SourcePayment>> {
        let mut payments: Vec<SourcePayment> =
            self.payments.lock().unwrap().values().cloned().collect();
        payments.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(payments)
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Counting mock ledger.
#[derive(Default)]
pub struct MockLedger {
    pub contact_calls: AtomicUsize,
    pub find_invoice_calls: AtomicUsize,
    pub create_invoice_calls: AtomicUsize,
    pub update_invoice_calls: AtomicUsize,
    pub void_invoice_calls: AtomicUsize,
    pub create_payment_calls: AtomicUsize,
    /// Reference → existing ledger invoice, for the force-update path.
    pub existing_invoices: Mutex<HashMap<String, String>>,
    /// When set, `get_or_create_contact` fails with this message.
    pub contact_error: Mutex<Option<String>>,
    seq: AtomicUsize,
}

impl MockLedger {
    fn next_id(&self, prefix: &str) -> String {
        format!("{prefix}-{}", self.seq.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

#[async_trait]
impl Ledger for SharedLedger {
    async fn get_or_create_contact(&self, _contact: &XeroContact) -> LedgerResult<String> {
        self.0.contact_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.0.contact_error.lock().unwrap().clone() {
            return Err(LedgerError::Api {
                status: 400,
                message,
            });
        }
        Ok(self.0.next_id("contact"))
    }

    async fn find_invoice_by_reference(
        &self,
        reference: &str,
    ) -> LedgerResult<Option<FoundInvoice>> {
        self.0.find_invoice_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .0
            .existing_invoices
            .lock()
            .unwrap()
            .get(reference)
            .map(|id| FoundInvoice {
                invoice_id: id.clone(),
                status: None,
            }))
    }

    async fn create_invoice(&self, invoice: &XeroInvoice) -> LedgerResult<String> {
        self.0.create_invoice_calls.fetch_add(1, Ordering::SeqCst);
        let id = self.0.next_id("inv");
        self.0
            .existing_invoices
            .lock()
            .unwrap()
            .insert(invoice.reference.clone(), id.clone());
        Ok(id)
    }

    async fn update_invoice(
        &self,
        invoice_id: &str,
        _invoice: &XeroInvoice,
    ) -> LedgerResult<String> {
        self.0.update_invoice_calls.fetch_add(1, Ordering::SeqCst);
        Ok(invoice_id.to_string())
    }

    async fn void_invoice(&self, _invoice_id: &str) -> LedgerResult<()> {
        self.0.void_invoice_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn create_payment(&self, _payment: &XeroPayment) -> LedgerResult<String> {
        self.0.create_payment_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.0.next_id("pay"))
    }
}

/// Box-able handle sharing one [`MockLedger`] across connects.
pub struct SharedLedger(pub Arc<MockLedger>);

/// Provider returning the shared mock ledger.
pub struct MockProvider {
    pub ledger: Arc<MockLedger>,
    pub configured: bool,
    pub connected: bool,
}

impl MockProvider {
    pub fn connected(ledger: Arc<MockLedger>) -> Self {
        Self {
            ledger,
            configured: true,
            connected: true,
        }
    }
}

#[async_trait]
impl LedgerProvider for MockProvider {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn connect(&self) -> LedgerResult<Option<Box<dyn Ledger>>> {
        if !self.connected {
            return Ok(None);
        }
        Ok(Some(Box::new(SharedLedger(Arc::clone(&self.ledger)))))
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct Harness {
    pub engine: SyncEngine,
    pub store: Arc<MemoryLedgerStore>,
    pub settings: Arc<MemorySettings>,
    pub feed: Arc<MemoryFeed>,
    pub ledger: Arc<MockLedger>,
}

impl Harness {
    pub fn connected() -> Self {
        let ledger = Arc::new(MockLedger::default());
        Self::with_provider(MockProvider::connected(Arc::clone(&ledger)), ledger)
    }

    pub fn disconnected() -> Self {
        let ledger = Arc::new(MockLedger::default());
        let provider = MockProvider {
            ledger: Arc::clone(&ledger),
            configured: true,
            connected: false,
        };
        Self::with_provider(provider, ledger)
    }

    pub fn unconfigured() -> Self {
        let ledger = Arc::new(MockLedger::default());
        let provider = MockProvider {
            ledger: Arc::clone(&ledger),
            configured: false,
            connected: false,
        };
        Self::with_provider(provider, ledger)
    }

    fn with_provider(provider: MockProvider, ledger: Arc<MockLedger>) -> Self {
        let store = Arc::new(MemoryLedgerStore::default());
        let settings = Arc::new(MemorySettings::default());
        let feed = Arc::new(MemoryFeed::default());
        let engine = SyncEngine::new(
            Arc::clone(&store) as Arc<dyn SyncLedger>,
            Arc::clone(&settings) as Arc<dyn SettingsSource>,
            Arc::clone(&feed) as Arc<dyn SourceFeed>,
            Arc::new(provider),
        );
        Self {
            engine,
            store,
            settings,
            feed,
            ledger,
        }
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn draft_invoice(id: &str, number: &str) -> SourceInvoice {
    SourceInvoice {
        id: id.to_string(),
        number: number.to_string(),
        status_id: "1".to_string(),
        amount: 100.0,
        ..Default::default()
    }
}

pub fn sent_invoice(id: &str, number: &str, client_id: &str) -> SourceInvoice {
    SourceInvoice {
        id: id.to_string(),
        number: number.to_string(),
        client_id: client_id.to_string(),
        status_id: "2".to_string(),
        amount: 250.0,
        date: "2026-01-15".to_string(),
        ..Default::default()
    }
}

pub fn client(id: &str, name: &str) -> SourceClient {
    SourceClient {
        id: id.to_string(),
        name: name.to_string(),
        contacts: vec![],
    }
}
