//! Cloudinary image hosting over its signed upload API.
//!
//! Requests are authenticated with a signature: the SHA-256 hex digest of the
//! signed parameters, sorted by name and joined as `k=v&k=v`, followed by the
//! API secret. The product environment must be set to SHA-256 signatures.

use std::time::Duration;

use amour_core::{
  asset::{AssetStore, Destroyed, StoredAsset},
  photo::Upload,
};
use chrono::Utc;
use reqwest::{
  Client,
  multipart::{Form, Part},
};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::{Error, Result};

fn default_api_base() -> String { "https://api.cloudinary.com/v1_1".to_owned() }

/// Account settings, deserialised from the `[assets]` config table.
#[derive(Clone, Deserialize)]
pub struct CloudinaryConfig {
  pub cloud_name: String,
  pub api_key:    String,
  pub api_secret: String,
  /// Folder uploads are placed in, e.g. `"amour"`.
  #[serde(default)]
  pub folder:     Option<String>,
  #[serde(default = "default_api_base")]
  pub api_base:   String,
}

/// Compute the request signature for `params` (excluding `file` and
/// `api_key`).
pub fn sign(params: &[(&str, &str)], api_secret: &str) -> String {
  let mut sorted = params.to_vec();
  sorted.sort_by_key(|(k, _)| *k);
  let joined = sorted
    .iter()
    .map(|(k, v)| format!("{k}={v}"))
    .collect::<Vec<_>>()
    .join("&");

  let mut hasher = Sha256::new();
  hasher.update(joined.as_bytes());
  hasher.update(api_secret.as_bytes());
  hex::encode(hasher.finalize())
}

#[derive(Deserialize)]
struct UploadResponse {
  public_id:  String,
  secure_url: String,
}

#[derive(Deserialize)]
struct DestroyResponse {
  result: String,
}

#[derive(Deserialize)]
struct ErrorBody {
  error: ErrorMessage,
}

#[derive(Deserialize)]
struct ErrorMessage {
  message: String,
}

/// Cloudinary-backed [`AssetStore`].
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct CloudinaryStore {
  client: Client,
  config: CloudinaryConfig,
}

impl CloudinaryStore {
  pub fn new(config: CloudinaryConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()?;
    Ok(Self { client, config })
  }

  fn endpoint(&self, action: &str) -> String {
    format!(
      "{}/{}/image/{action}",
      self.config.api_base.trim_end_matches('/'),
      self.config.cloud_name
    )
  }

  /// Turn a non-success response into [`Error::Rejected`], preferring the
  /// message from Cloudinary's error body.
  async fn check(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
      return Ok(resp);
    }
    let message = match resp.json::<ErrorBody>().await {
      Ok(body) => body.error.message,
      Err(_) => status.to_string(),
    };
    Err(Error::Rejected(message))
  }
}

impl AssetStore for CloudinaryStore {
  type Error = Error;

  async fn upload(&self, upload: Upload) -> Result<StoredAsset> {
    let timestamp = Utc::now().timestamp().to_string();
    let mut signed = vec![("timestamp", timestamp.as_str())];
    if let Some(folder) = self.config.folder.as_deref() {
      signed.push(("folder", folder));
    }
    let signature = sign(&signed, &self.config.api_secret);

    let mut file = Part::bytes(upload.bytes.to_vec()).file_name(upload.file_name.clone());
    if let Some(ct) = upload.content_type.as_deref() {
      file = file.mime_str(ct)?;
    }

    let mut form = Form::new()
      .part("file", file)
      .text("api_key", self.config.api_key.clone())
      .text("signature", signature);
    for (k, v) in signed {
      form = form.text(k, v.to_owned());
    }

    debug!(file_name = %upload.file_name, bytes = upload.bytes.len(), "uploading to cloudinary");
    let resp = self
      .client
      .post(self.endpoint("upload"))
      .multipart(form)
      .send()
      .await?;
    let body: UploadResponse = Self::check(resp).await?.json().await?;

    Ok(StoredAsset { url: body.secure_url, asset_id: body.public_id })
  }

  async fn destroy(&self, asset_id: &str) -> Result<Destroyed> {
    let timestamp = Utc::now().timestamp().to_string();
    let signature = sign(
      &[("public_id", asset_id), ("timestamp", timestamp.as_str())],
      &self.config.api_secret,
    );

    debug!(asset_id, "destroying cloudinary asset");
    let resp = self
      .client
      .post(self.endpoint("destroy"))
      .form(&[
        ("public_id", asset_id),
        ("timestamp", timestamp.as_str()),
        ("api_key", self.config.api_key.as_str()),
        ("signature", signature.as_str()),
      ])
      .send()
      .await?;
    let body: DestroyResponse = Self::check(resp).await?.json().await?;

    match body.result.as_str() {
      "ok" => Ok(Destroyed::Removed),
      "not found" => Ok(Destroyed::AlreadyGone),
      other => Err(Error::Rejected(format!("destroy returned {other:?}"))),
    }
  }
}
