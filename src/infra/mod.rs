pub mod app;
pub mod config;
pub mod db;
pub mod setup;
pub mod stripe_client;
pub mod webhook_verifier;
