//! Database models and stores.

pub mod sync_config;
pub mod sync_record;
pub mod xero_token;
