pub mod admin;
pub mod billing_event;
pub mod refund;
pub mod user_record;
