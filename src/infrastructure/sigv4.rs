//! AWS Signature Version 4
//!
//! Signs outbound requests to Amazon Managed Service for Prometheus. Only
//! `host` and `x-amz-date` are signed; the payload hash covers the request
//! body (empty for GET).

use crate::domain::entities::AwsSettings;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Request, Url};
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SIGNED_HEADERS: &str = "host;x-amz-date";
const AMZ_DATE_HEADER: &str = "x-amz-date";

/// Errors produced while signing.
#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    #[error("invalid signing key")]
    InvalidKey,
    #[error("request url has no host")]
    MissingHost,
    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
}

/// Request signer bound to one set of AWS credentials.
#[derive(Debug, Clone)]
pub struct SigV4Signer {
    access_key: String,
    secret_key: SecretString,
    region: String,
    service: String,
}

impl SigV4Signer {
    pub fn new(settings: &AwsSettings) -> Self {
        Self {
            access_key: settings.access_key.clone(),
            secret_key: settings.secret_key.clone(),
            region: settings.region.clone(),
            service: settings.service_name.clone(),
        }
    }

    /// Sign `request` in place using the current time.
    pub fn sign(&self, request: &mut Request) -> Result<(), SigningError> {
        self.sign_at(request, Utc::now())
    }

    /// Sign `request` in place as of `now`.
    pub fn sign_at(&self, request: &mut Request, now: DateTime<Utc>) -> Result<(), SigningError> {
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let payload = request
            .body()
            .and_then(|b| b.as_bytes())
            .unwrap_or_default();
        let payload_hash = hex::encode(Sha256::digest(payload));

        let authorization = self.authorization(
            request.method().as_str(),
            request.url(),
            &amz_date,
            &payload_hash,
        )?;

        let headers = request.headers_mut();
        headers.insert(AMZ_DATE_HEADER, HeaderValue::from_str(&amz_date)?);
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&authorization)?);
        Ok(())
    }

    /// Build the `Authorization` header value.
    pub fn authorization(
        &self,
        method: &str,
        url: &Url,
        amz_date: &str,
        payload_hash: &str,
    ) -> Result<String, SigningError> {
        let date = &amz_date[..8.min(amz_date.len())];
        let scope = format!("{}/{}/{}/aws4_request", date, self.region, self.service);

        let canonical_request = format!(
            "{}\n{}\n{}\nhost:{}\nx-amz-date:{}\n\n{}\n{}",
            method,
            canonical_uri(url),
            canonical_query(url),
            host_header(url)?,
            amz_date,
            SIGNED_HEADERS,
            payload_hash
        );

        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM,
            amz_date,
            scope,
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );

        let secret = format!("AWS4{}", self.secret_key.expose_secret());
        let k_date = hmac_sha256(secret.as_bytes(), date.as_bytes())?;
        let k_region = hmac_sha256(&k_date, self.region.as_bytes())?;
        let k_service = hmac_sha256(&k_region, self.service.as_bytes())?;
        let k_signing = hmac_sha256(&k_service, b"aws4_request")?;
        let signature = hex::encode(hmac_sha256(&k_signing, string_to_sign.as_bytes())?);

        Ok(format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM, self.access_key, scope, SIGNED_HEADERS, signature
        ))
    }
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, SigningError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| SigningError::InvalidKey)?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn host_header(url: &Url) -> Result<String, SigningError> {
    let host = url.host_str().ok_or(SigningError::MissingHost)?;
    Ok(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

// Non-S3 services expect each path segment encoded twice; `Url` already
// holds it encoded once.
fn canonical_uri(url: &Url) -> String {
    let path = url.path();
    if path.is_empty() {
        return "/".to_string();
    }
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn canonical_query(url: &Url) -> String {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            (
                urlencoding::encode(&k).into_owned(),
                urlencoding::encode(&v).into_owned(),
            )
        })
        .collect();
    pairs.sort();
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}
