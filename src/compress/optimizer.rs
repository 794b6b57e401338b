//! Optional re-compression of page images through an external service.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::model::RasterImage;

/// Re-compresses a JPEG page image.
///
/// Failures are always recoverable: callers keep the unoptimized image.
pub trait ImageOptimizer: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Return a smaller encoding of `image`, or an error.
    fn optimize(&self, image: &RasterImage) -> Result<RasterImage>;
}

/// Where and how to reach the re-compression service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizerConfig {
    /// Service URL; queried as `<endpoint>?img=<image URL>&qlty=<quality>`
    pub endpoint: String,

    /// Per-request timeout
    pub timeout: Duration,

    /// Quality to request; defaults to the image's own quality
    pub quality: Option<u8>,
}

impl OptimizerConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: Duration::from_secs(30),
            quality: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = Some(quality);
        self
    }

    pub fn validate(&self) -> Result<()> {
        let endpoint = self.endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(Error::validation(format!(
                "optimizer endpoint must be an http(s) URL, got {:?}",
                self.endpoint
            )));
        }
        if let Some(q) = self.quality {
            if !(1..=100).contains(&q) {
                return Err(Error::validation(format!(
                    "optimizer quality must be between 1 and 100, got {}",
                    q
                )));
            }
        }
        Ok(())
    }
}

/// Answer of the re-compression service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OptimizerResponse {
    /// URL of the re-compressed image
    pub dest: String,
    pub src_size: u64,
    pub dest_size: u64,
    pub percent: f64,
}

#[derive(Deserialize)]
struct RawResponse {
    dest: Option<String>,
    src_size: Option<u64>,
    dest_size: Option<u64>,
    percent: Option<f64>,
    error: Option<serde_json::Value>,
    error_long: Option<String>,
}

/// Parse the service's JSON answer.
pub fn parse_optimizer_response(body: &[u8]) -> Result<OptimizerResponse> {
    let raw: RawResponse = serde_json::from_slice(body)
        .map_err(|e| Error::ExternalService(format!("malformed optimizer response: {}", e)))?;

    if let Some(code) = raw.error {
        let detail = raw.error_long.unwrap_or_default();
        return Err(Error::ExternalService(format!(
            "optimizer returned error {}: {}",
            code, detail
        )));
    }

    match (raw.dest, raw.src_size, raw.dest_size) {
        (Some(dest), Some(src_size), Some(dest_size)) if !dest.is_empty() => {
            Ok(OptimizerResponse {
                dest,
                src_size,
                dest_size,
                percent: raw.percent.unwrap_or(0.0),
            })
        }
        _ => Err(Error::ExternalService(
            "optimizer response is missing dest or sizes".into(),
        )),
    }
}

/// `data:` URL carrying a JPEG.
pub fn jpeg_data_url(data: &[u8]) -> String {
    format!("data:image/jpeg;base64,{}", STANDARD.encode(data))
}

/// Accept `downloaded` as the new encoding of `original` only if it is a
/// JPEG of the same pixel size and strictly smaller.
pub fn accept_optimized(original: &RasterImage, downloaded: Vec<u8>) -> Result<RasterImage> {
    let decoded = image::load_from_memory_with_format(&downloaded, image::ImageFormat::Jpeg)
        .map_err(|e| Error::ExternalService(format!("optimizer returned a non-JPEG payload: {}", e)))?;
    if (decoded.width(), decoded.height()) != (original.width, original.height) {
        return Err(Error::ExternalService(format!(
            "optimizer changed image size from {}x{} to {}x{}",
            original.width,
            original.height,
            decoded.width(),
            decoded.height()
        )));
    }
    if downloaded.len() >= original.len() {
        return Err(Error::ExternalService(format!(
            "optimizer result is not smaller ({} >= {} bytes)",
            downloaded.len(),
            original.len()
        )));
    }
    Ok(RasterImage::new(
        original.width,
        original.height,
        downloaded,
        original.quality,
    ))
}

/// [`ImageOptimizer`] backed by an HTTP service.
#[cfg(feature = "remote-optimize")]
pub struct HttpImageOptimizer {
    config: OptimizerConfig,
    client: reqwest::blocking::Client,
}

#[cfg(feature = "remote-optimize")]
impl HttpImageOptimizer {
    pub fn new(config: OptimizerConfig) -> Result<Self> {
        config.validate()?;
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("pdfsuite/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::ExternalService(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    fn fetch(&self, url: &str, query: Option<&[(&str, String)]>) -> Result<Vec<u8>> {
        let mut request = self.client.get(url);
        if let Some(query) = query {
            request = request.query(query);
        }
        let response = request
            .send()
            .map_err(|e| Error::ExternalService(format!("request to {} failed: {}", url, e)))?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::ExternalService(format!(
                "{} answered with status {}",
                url, status
            )));
        }
        let body = response
            .bytes()
            .map_err(|e| Error::ExternalService(format!("reading response failed: {}", e)))?;
        Ok(body.to_vec())
    }
}

#[cfg(feature = "remote-optimize")]
impl ImageOptimizer for HttpImageOptimizer {
    fn name(&self) -> &str {
        "http"
    }

    fn optimize(&self, image: &RasterImage) -> Result<RasterImage> {
        let quality = self.config.quality.unwrap_or(image.quality);
        let query = [
            ("img", jpeg_data_url(&image.data)),
            ("qlty", quality.to_string()),
        ];
        let body = self.fetch(&self.config.endpoint, Some(&query[..]))?;
        let response = parse_optimizer_response(&body)?;
        log::debug!(
            "optimizer reports {} -> {} bytes ({:.1}%)",
            response.src_size,
            response.dest_size,
            response.percent
        );
        if response.dest_size >= response.src_size {
            return Err(Error::ExternalService(
                "optimizer reports no size reduction".into(),
            ));
        }
        let downloaded = self.fetch(&response.dest, None)?;
        accept_optimized(image, downloaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_response() {
        let body = br#"{"src":"x","dest":"https://cdn/x.jpg","src_size":1000,"dest_size":600,"percent":40}"#;
        let response = parse_optimizer_response(body).unwrap();
        assert_eq!(response.dest, "https://cdn/x.jpg");
        assert_eq!(response.src_size, 1000);
        assert_eq!(response.dest_size, 600);
        assert_eq!(response.percent, 40.0);
    }

    #[test]
    fn test_parse_error_response() {
        let body = br#"{"error":403,"error_long":"file too big"}"#;
        let err = parse_optimizer_response(body).unwrap_err();
        assert!(matches!(err, Error::ExternalService(_)));
        assert!(err.to_string().contains("file too big"));
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(
            parse_optimizer_response(b"<html>"),
            Err(Error::ExternalService(_))
        ));
        assert!(matches!(
            parse_optimizer_response(br#"{"dest":"","src_size":1,"dest_size":1}"#),
            Err(Error::ExternalService(_))
        ));
    }

    #[test]
    fn test_data_url() {
        assert_eq!(jpeg_data_url(&[0xFF, 0xD8]), "data:image/jpeg;base64,/9g=");
    }

    #[test]
    fn test_accept_rejects_non_image() {
        let original = RasterImage::new(2, 2, vec![0; 100], 70);
        assert!(matches!(
            accept_optimized(&original, b"not a jpeg".to_vec()),
            Err(Error::ExternalService(_))
        ));
    }

    #[test]
    fn test_config_validation() {
        assert!(OptimizerConfig::new("https://example.test/ws").validate().is_ok());
        assert!(OptimizerConfig::new("ftp://example.test").validate().is_err());
        assert!(OptimizerConfig::new("http://x")
            .with_quality(0)
            .validate()
            .is_err());
    }
}
