//! Pinata-backed IPFS pinning plus IP metadata generation. Only wired into
//! the tool registry when a Pinata JWT is configured.

use anyhow::{bail, Context, Result};
use base64::Engine;
use chrono::Utc;
use ethers_core::utils::keccak256;
use reqwest::multipart;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Map, Value};
use tracing::info;

const PINATA_API_BASE: &str = "https://api.pinata.cloud";

#[derive(Clone)]
pub struct PinataClient {
    http: reqwest::Client,
    jwt: SecretString,
    base: String,
}

impl PinataClient {
    pub fn new(jwt: SecretString) -> Self {
        Self::with_base(jwt, PINATA_API_BASE)
    }

    pub fn with_base(jwt: SecretString, base: &str) -> Self {
        PinataClient {
            http: reqwest::Client::new(),
            jwt,
            base: base.trim_end_matches('/').to_string(),
        }
    }

    /// Pin raw bytes and return an `ipfs://` URI.
    pub async fn upload_bytes(&self, bytes: Vec<u8>, file_name: &str) -> Result<String> {
        let part = multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = multipart::Form::new().part("file", part);

        let response = self
            .http
            .post(format!("{}/pinning/pinFileToIPFS", self.base))
            .bearer_auth(self.jwt.expose_secret())
            .multipart(form)
            .send()
            .await
            .context("pinata upload request failed")?
            .error_for_status()
            .context("pinata rejected file upload")?;

        let body: Value = response
            .json()
            .await
            .context("pinata returned invalid JSON")?;
        let hash = body
            .get("IpfsHash")
            .and_then(|h| h.as_str())
            .context("pinata response missing IpfsHash")?;
        info!(cid = %hash, %file_name, "pinned file to IPFS");
        Ok(format!("ipfs://{hash}"))
    }

    /// Pin a JSON document and return an `ipfs://` URI.
    pub async fn upload_json(&self, document: &Value, name: &str) -> Result<String> {
        let payload = json!({
            "pinataContent": document,
            "pinataMetadata": {"name": name},
        });
        let response = self
            .http
            .post(format!("{}/pinning/pinJSONToIPFS", self.base))
            .bearer_auth(self.jwt.expose_secret())
            .json(&payload)
            .send()
            .await
            .context("pinata upload request failed")?
            .error_for_status()
            .context("pinata rejected JSON upload")?;

        let body: Value = response
            .json()
            .await
            .context("pinata returned invalid JSON")?;
        let hash = body
            .get("IpfsHash")
            .and_then(|h| h.as_str())
            .context("pinata response missing IpfsHash")?;
        info!(cid = %hash, %name, "pinned JSON to IPFS");
        Ok(format!("ipfs://{hash}"))
    }

    /// Accepts either an http(s) URL (downloaded then pinned) or a base64
    /// payload (decoded then pinned).
    pub async fn upload_image(&self, image_data: &str) -> Result<String> {
        let bytes = if is_http_url(image_data) {
            self.download(image_data).await?
        } else {
            let stripped = image_data
                .split_once("base64,")
                .map(|(_, rest)| rest)
                .unwrap_or(image_data);
            base64::engine::general_purpose::STANDARD
                .decode(stripped.trim())
                .context("image data is neither a URL nor valid base64")?
        };
        if bytes.is_empty() {
            bail!("image payload is empty");
        }
        self.upload_bytes(bytes, "image.png").await
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("failed to download image: {url}"))?
            .error_for_status()
            .with_context(|| format!("image download rejected: {url}"))?;
        Ok(response.bytes().await.context("image body unreadable")?.to_vec())
    }

    /// Build and pin the ERC-721 NFT metadata and the IP metadata documents
    /// for one piece of content, returning the URIs and keccak hashes the
    /// registration workflow expects.
    pub async fn create_ip_metadata(
        &self,
        image_uri: &str,
        name: &str,
        description: &str,
        attributes: Option<&Value>,
    ) -> Result<Value> {
        let image_hash = self.image_hash(image_uri).await?;

        let nft_metadata = json!({
            "name": name,
            "description": description,
            "image": image_uri,
            "attributes": attributes.cloned().unwrap_or_else(|| json!([])),
        });
        let ip_metadata = json!({
            "title": name,
            "description": description,
            "createdAt": Utc::now().timestamp().to_string(),
            "image": image_uri,
            "imageHash": image_hash,
            "mediaUrl": image_uri,
            "mediaHash": image_hash,
            "mediaType": "image/png",
        });

        let nft_uri = self
            .upload_json(&nft_metadata, &format!("{name}-nft-metadata"))
            .await?;
        let ip_uri = self
            .upload_json(&ip_metadata, &format!("{name}-ip-metadata"))
            .await?;

        let nft_hash = hex_hash(&canonical_json(&nft_metadata));
        let ip_hash = hex_hash(&canonical_json(&ip_metadata));

        Ok(json!({
            "nft_metadata": nft_metadata,
            "ip_metadata": ip_metadata,
            "nft_metadata_uri": nft_uri,
            "ip_metadata_uri": ip_uri,
            "registration_metadata": {
                "ip_metadata_uri": ip_uri,
                "ip_metadata_hash": ip_hash,
                "nft_metadata_uri": nft_uri,
                "nft_metadata_hash": nft_hash,
            },
        }))
    }

    // For http(s) images the hash covers the actual bytes; for ipfs URIs and
    // bare CIDs the content is already addressed, so hash the URI text.
    async fn image_hash(&self, image_uri: &str) -> Result<String> {
        if is_http_url(image_uri) {
            let bytes = self.download(image_uri).await?;
            Ok(hex_hash(&bytes))
        } else {
            Ok(hex_hash(image_uri.as_bytes()))
        }
    }
}

fn is_http_url(s: &str) -> bool {
    url::Url::parse(s)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

fn hex_hash(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(keccak256(bytes)))
}

/// Serialize JSON with object keys sorted at every level, so the hash of a
/// document does not depend on insertion order.
fn canonical_json(value: &Value) -> Vec<u8> {
    fn sort(value: &Value) -> Value {
        match value {
            Value::Object(map) => {
                let mut sorted: Vec<(&String, &Value)> = map.iter().collect();
                sorted.sort_by(|a, b| a.0.cmp(b.0));
                let mut out = Map::new();
                for (k, v) in sorted {
                    out.insert(k.clone(), sort(v));
                }
                Value::Object(out)
            }
            Value::Array(items) => Value::Array(items.iter().map(sort).collect()),
            other => other.clone(),
        }
    }
    sort(value).to_string().into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_json_is_order_independent() {
        let a: Value = serde_json::from_str(r#"{"b": 1, "a": {"d": 2, "c": 3}}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"a": {"c": 3, "d": 2}, "b": 1}"#).unwrap();
        assert_eq!(canonical_json(&a), canonical_json(&b));
        assert_eq!(hex_hash(&canonical_json(&a)), hex_hash(&canonical_json(&b)));
    }

    #[test]
    fn ipfs_uris_are_not_treated_as_downloadable() {
        assert!(is_http_url("https://example.com/cat.png"));
        assert!(!is_http_url("ipfs://QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG"));
        assert!(!is_http_url("QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG"));
    }

    #[test]
    fn hex_hash_has_0x_prefix_and_32_bytes() {
        let h = hex_hash(b"story");
        assert!(h.starts_with("0x"));
        assert_eq!(h.len(), 66);
    }
}
