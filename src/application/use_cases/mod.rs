pub mod admin;
pub mod analytics;
pub mod billing_webhook;
pub mod subscription_writer;
pub mod user_linker;
