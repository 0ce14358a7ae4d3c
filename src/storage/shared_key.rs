//! Storage account connection strings and Shared Key request signing.
//!
//! See "Authorize with Shared Key" in the Azure Storage REST docs; this
//! implements the 2015-02-21+ string-to-sign for the Blob service.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use url::Url;

use crate::error::{AdapterError, Result};

pub const API_VERSION: &str = "2021-08-06";

/// Credentials and endpoint parsed from an Azure Storage connection string.
#[derive(Clone)]
pub struct StorageAccount {
    pub name: String,
    pub blob_endpoint: String,
    key: Option<Vec<u8>>,
    sas_token: Option<String>,
}

impl std::fmt::Debug for StorageAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageAccount")
            .field("name", &self.name)
            .field("blob_endpoint", &self.blob_endpoint)
            .field("shared_key", &self.key.is_some())
            .field("sas", &self.sas_token.is_some())
            .finish()
    }
}

impl StorageAccount {
    pub fn from_connection_string(conn: &str) -> Result<Self> {
        let mut protocol = "https";
        let mut name = None;
        let mut key = None;
        let mut suffix = "core.windows.net";
        let mut blob_endpoint = None;
        let mut sas_token = None;

        for part in conn.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            // Keys and SAS tokens contain '=' themselves.
            let Some((k, v)) = part.split_once('=') else {
                return Err(invalid(format!("malformed segment '{part}'")));
            };
            match k {
                "DefaultEndpointsProtocol" => protocol = v,
                "AccountName" => name = Some(v.to_string()),
                "AccountKey" => key = Some(v),
                "EndpointSuffix" => suffix = v,
                "BlobEndpoint" => blob_endpoint = Some(v.trim_end_matches('/').to_string()),
                "SharedAccessSignature" => sas_token = Some(v.trim_start_matches('?').to_string()),
                _ => {}
            }
        }

        let key = key
            .map(|k| {
                STANDARD
                    .decode(k)
                    .map_err(|e| invalid(format!("AccountKey is not base64: {e}")))
            })
            .transpose()?;

        if key.is_none() && sas_token.is_none() {
            return Err(invalid(
                "needs AccountKey or SharedAccessSignature".to_string(),
            ));
        }

        let blob_endpoint = match (blob_endpoint, &name) {
            (Some(endpoint), _) => endpoint,
            (None, Some(account)) => format!("{protocol}://{account}.blob.{suffix}"),
            (None, None) => return Err(invalid("needs AccountName or BlobEndpoint".to_string())),
        };

        let name = match name {
            Some(n) => n,
            None => account_from_endpoint(&blob_endpoint)
                .ok_or_else(|| invalid("cannot infer AccountName".to_string()))?,
        };

        if key.is_some() && name.is_empty() {
            return Err(invalid("AccountName is empty".to_string()));
        }

        Ok(Self {
            name,
            blob_endpoint,
            key,
            sas_token,
        })
    }

    pub fn sas_token(&self) -> Option<&str> {
        if self.key.is_some() {
            None
        } else {
            self.sas_token.as_deref()
        }
    }

    /// `Authorization` header value for a request, or `None` when the
    /// account authenticates with a SAS token instead.
    pub fn authorization(&self, request: &SignableRequest<'_>) -> Option<String> {
        let key = self.key.as_ref()?;
        let to_sign = string_to_sign(&self.name, request);
        let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(key) else {
            return None;
        };
        mac.update(to_sign.as_bytes());
        let signature = STANDARD.encode(mac.finalize().into_bytes());
        Some(format!("SharedKey {}:{signature}", self.name))
    }
}

fn invalid(msg: String) -> AdapterError {
    AdapterError::NotConfigured(format!("Azure Storage connection string: {msg}"))
}

fn account_from_endpoint(endpoint: &str) -> Option<String> {
    let url = Url::parse(endpoint).ok()?;
    let host = url.host_str()?;
    host.split('.').next().map(str::to_string)
}

/// The parts of an outgoing request covered by the signature.
pub struct SignableRequest<'a> {
    pub method: &'a str,
    pub url: &'a Url,
    pub content_length: usize,
    pub content_type: Option<&'a str>,
    /// Every `x-ms-*` header sent with the request.
    pub ms_headers: &'a [(&'a str, String)],
}

pub fn string_to_sign(account: &str, req: &SignableRequest<'_>) -> String {
    let content_length = if req.content_length == 0 {
        String::new()
    } else {
        req.content_length.to_string()
    };

    let mut headers: Vec<(String, &str)> = req
        .ms_headers
        .iter()
        .map(|(k, v)| (k.to_ascii_lowercase(), v.trim()))
        .collect();
    headers.sort_by(|a, b| a.0.cmp(&b.0));
    let canonical_headers: String = headers
        .iter()
        .map(|(k, v)| format!("{k}:{v}\n"))
        .collect();

    format!(
        "{}\n\n\n{}\n\n{}\n\n\n\n\n\n\n{}{}",
        req.method,
        content_length,
        req.content_type.unwrap_or_default(),
        canonical_headers,
        canonical_resource(account, req.url)
    )
}

fn canonical_resource(account: &str, url: &Url) -> String {
    let mut resource = format!("/{account}{}", url.path());

    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.to_lowercase(), v.into_owned()))
        .collect();
    params.sort();

    let mut merged: Vec<(String, Vec<String>)> = Vec::new();
    for (k, v) in params {
        match merged.last_mut() {
            Some((last, values)) if *last == k => values.push(v),
            _ => merged.push((k, vec![v])),
        }
    }
    for (k, values) in merged {
        resource.push_str(&format!("\n{k}:{}", values.join(",")));
    }
    resource
}
