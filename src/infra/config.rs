use std::collections::HashMap;
use std::net::SocketAddr;

use anyhow::{Context, bail};
use axum::http::HeaderValue;
use env_helpers::{get_env, get_env_default};
use secrecy::SecretString;
use url::Url;

use crate::infra::stripe_client::DEFAULT_STRIPE_API_BASE;

pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub cors_origin: HeaderValue,
    pub stripe_secret_key: SecretString,
    pub stripe_api_base: Url,
    pub stripe_webhook_secret: SecretString,
    /// Maximum age of a signed webhook delivery before it counts as a replay.
    pub webhook_tolerance_secs: i64,
    /// Secret used to verify identity-provider bearer tokens on admin routes.
    pub identity_jwt_secret: SecretString,
    /// Processor price/product id to internal plan id.
    pub plan_price_ids: HashMap<String, String>,
    /// Internal plan id to monthly price in cents.
    pub plan_monthly_prices: HashMap<String, i64>,
    pub log_file: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let bind_addr: SocketAddr =
            get_env_default("BIND_ADDR", SocketAddr::from(([127, 0, 0, 1], 3001)));
        let database_url: String = get_env("DATABASE_URL");
        let cors_origin: HeaderValue =
            get_env_default("CORS_ORIGIN", String::from("http://localhost:3000"))
                .parse()
                .context("CORS_ORIGIN must be a valid header value")?;

        let stripe_secret_key = SecretString::new(get_env::<String>("STRIPE_SECRET_KEY").into());
        let stripe_api_base: Url = Url::parse(&get_env_default(
            "STRIPE_API_BASE",
            DEFAULT_STRIPE_API_BASE.to_string(),
        ))
        .context("STRIPE_API_BASE must be a valid URL")?;
        let stripe_webhook_secret =
            SecretString::new(get_env::<String>("STRIPE_WEBHOOK_SECRET").into());
        let webhook_tolerance_secs: i64 = get_env_default("WEBHOOK_TOLERANCE_SECS", 300);

        let identity_jwt_secret =
            SecretString::new(get_env::<String>("IDENTITY_JWT_SECRET").into());

        let plan_price_ids = parse_pairs(&get_env::<String>("PLAN_PRICE_IDS"))
            .context("PLAN_PRICE_IDS must look like price_a=pro,price_b=team")?;
        let plan_monthly_prices = parse_pairs(&get_env::<String>("PLAN_MONTHLY_PRICES"))
            .context("PLAN_MONTHLY_PRICES must look like pro=2900,team=9900")?
            .into_iter()
            .map(|(plan, cents)| -> anyhow::Result<(String, i64)> {
                let cents: i64 = cents
                    .parse()
                    .with_context(|| format!("Monthly price for {plan} is not an integer"))?;
                Ok((plan, cents))
            })
            .collect::<anyhow::Result<HashMap<String, i64>>>()?;

        let log_file: Option<String> = std::env::var("LOG_FILE").ok().filter(|s| !s.is_empty());

        Ok(Self {
            bind_addr,
            database_url,
            cors_origin,
            stripe_secret_key,
            stripe_api_base,
            stripe_webhook_secret,
            webhook_tolerance_secs,
            identity_jwt_secret,
            plan_price_ids,
            plan_monthly_prices,
            log_file,
        })
    }
}

/// Parse `key=value,key=value`. Whitespace around entries is ignored.
pub fn parse_pairs(raw: &str) -> anyhow::Result<HashMap<String, String>> {
    let mut pairs = HashMap::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let Some((key, value)) = entry.split_once('=') else {
            bail!("Entry {entry:?} is missing '='");
        };
        let (key, value) = (key.trim(), value.trim());
        if key.is_empty() || value.is_empty() {
            bail!("Entry {entry:?} has an empty side");
        }
        if pairs.insert(key.to_string(), value.to_string()).is_some() {
            bail!("Duplicate key {key:?}");
        }
    }
    Ok(pairs)
}
