//! Verification of processor-signed webhook deliveries.
//!
//! Header format: `t=<unix secs>,v1=<hex hmac>[,v1=...]`. The signed content is
//! `"{t}."` followed by the raw body bytes, exactly as received.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

use crate::{
    app_error::{AppError, AppResult},
    domain::entities::billing_event::BillingEvent,
};

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "stripe-signature";

pub struct EventVerifier {
    secret: SecretString,
    tolerance_secs: i64,
}

impl EventVerifier {
    pub fn new(secret: SecretString, tolerance_secs: i64) -> Self {
        Self {
            secret,
            tolerance_secs,
        }
    }

    /// Verify the signature over the raw body, then parse it.
    pub fn verify(&self, payload: &[u8], signature_header: &str) -> AppResult<BillingEvent> {
        self.verify_at(payload, signature_header, chrono::Utc::now().timestamp())
    }

    pub fn verify_at(
        &self,
        payload: &[u8],
        signature_header: &str,
        now_secs: i64,
    ) -> AppResult<BillingEvent> {
        let (timestamp, signatures) = parse_signature_header(signature_header)?;

        let mac = signed_mac(self.secret.expose_secret(), timestamp, payload)?;
        let matched = signatures.iter().any(|sig| match hex::decode(sig) {
            Ok(bytes) => mac.clone().verify_slice(&bytes).is_ok(),
            Err(_) => false,
        });
        if !matched {
            return Err(AppError::InvalidSignature(
                "No signature matches the payload".into(),
            ));
        }

        if (now_secs - timestamp).abs() > self.tolerance_secs {
            return Err(AppError::InvalidSignature(
                "Timestamp outside tolerance".into(),
            ));
        }

        // Only interpret the payload once it is known to be authentic
        serde_json::from_slice(payload)
            .map_err(|e| AppError::InvalidInput(format!("Invalid event payload: {}", e)))
    }
}

/// Produce a signature header for `payload`. Used to sign test deliveries.
pub fn sign_payload(secret: &str, timestamp: i64, payload: &[u8]) -> AppResult<String> {
    let mac = signed_mac(secret, timestamp, payload)?;
    let signature = hex::encode(mac.finalize().into_bytes());
    Ok(format!("t={},v1={}", timestamp, signature))
}

fn signed_mac(secret: &str, timestamp: i64, payload: &[u8]) -> AppResult<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| AppError::Internal("HMAC error".into()))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac)
}

fn parse_signature_header(header: &str) -> AppResult<(i64, Vec<&str>)> {
    let mut timestamp: Option<&str> = None;
    let mut signatures: Vec<&str> = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = Some(value),
            "v1" => signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| AppError::InvalidSignature("Missing timestamp in signature".into()))?
        .parse::<i64>()
        .map_err(|_| AppError::InvalidSignature("Invalid timestamp in signature".into()))?;

    if signatures.is_empty() {
        return Err(AppError::InvalidSignature("Missing signature".into()));
    }

    Ok((timestamp, signatures))
}
