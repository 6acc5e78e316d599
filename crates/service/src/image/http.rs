use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::{ImageHost, ImageHostError};

/// Imgur-compatible upload client: posts the image base64-encoded and reads `data.link`.
pub struct HttpImageHost {
    client: reqwest::Client,
    endpoint: String,
    client_id: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    success: Option<bool>,
    data: Option<UploadData>,
}

#[derive(Debug, Deserialize)]
struct UploadData {
    link: Option<String>,
}

impl HttpImageHost {
    pub fn new(endpoint: impl Into<String>, client_id: impl Into<String>, timeout: Duration) -> Result<Self, ImageHostError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ImageHostError::Transport(e.to_string()))?;
        Ok(Self { client, endpoint: endpoint.into(), client_id: client_id.into() })
    }

    pub fn from_config(cfg: &configs::ImageHostConfig) -> Result<Self, ImageHostError> {
        Self::new(cfg.endpoint.clone(), cfg.client_id.clone(), Duration::from_secs(cfg.timeout_secs))
    }
}

fn link_from(body: UploadResponse) -> Result<String, ImageHostError> {
    if body.success == Some(false) {
        return Err(ImageHostError::Rejected("host reported success=false".into()));
    }
    body.data
        .and_then(|d| d.link)
        .filter(|l| !l.is_empty())
        .ok_or_else(|| ImageHostError::InvalidResponse("missing data.link".into()))
}

#[async_trait]
impl ImageHost for HttpImageHost {
    #[instrument(skip(self, image), fields(bytes = image.len()))]
    async fn upload(&self, image: Vec<u8>) -> Result<String, ImageHostError> {
        if image.is_empty() {
            return Err(ImageHostError::Empty);
        }
        let encoded = base64::engine::general_purpose::STANDARD.encode(&image);
        let resp = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Client-ID {}", self.client_id))
            .json(&serde_json::json!({"image": encoded, "type": "base64"}))
            .send()
            .await
            .map_err(|e| ImageHostError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ImageHostError::Rejected(format!("status {status}")));
        }
        let body = resp
            .json::<UploadResponse>()
            .await
            .map_err(|e| ImageHostError::InvalidResponse(e.to_string()))?;
        let link = link_from(body)?;
        debug!(%link, "image uploaded");
        Ok(link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> UploadResponse { serde_json::from_str(s).unwrap() }

    #[test]
    fn link_is_read_from_data() {
        let body = parse(r#"{"success": true, "status": 200, "data": {"id": "abc", "link": "https://i.imgur.com/abc.png"}}"#);
        assert_eq!(link_from(body).unwrap(), "https://i.imgur.com/abc.png");
    }

    #[test]
    fn missing_link_or_failure_flag_is_an_error() {
        assert!(matches!(link_from(parse(r#"{"data": {}}"#)), Err(ImageHostError::InvalidResponse(_))));
        assert!(matches!(
            link_from(parse(r#"{"success": false, "data": {"link": "x"}}"#)),
            Err(ImageHostError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn empty_upload_never_hits_the_network() {
        let host = HttpImageHost::new("http://127.0.0.1:9/unreachable", "id", Duration::from_secs(1)).unwrap();
        assert_eq!(host.upload(Vec::new()).await, Err(ImageHostError::Empty));
    }
}
