pub mod payment_processor;
pub mod record_store;
