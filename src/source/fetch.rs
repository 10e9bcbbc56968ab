//! Remote pool download and body decoding.

use std::io::Read;
use std::time::Duration;

use anyhow::{Context, Result};
use flate2::read::GzDecoder;

/// gzip magic number.
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Download the pool document and return it as JSON text.
pub fn fetch_pool_text(url: &str) -> Result<String> {
    let agent = ureq::AgentBuilder::new()
        .timeout(Duration::from_secs(60))
        .build();

    let response = agent
        .get(url)
        .call()
        .with_context(|| format!("Failed to fetch pool from {url}"))?;

    let mut body = Vec::new();
    response
        .into_reader()
        .read_to_end(&mut body)
        .with_context(|| format!("Failed to read pool body from {url}"))?;

    tracing::debug!(%url, bytes = body.len(), "pool downloaded");
    decode_body(&body)
}

/// Gunzip the body when it is gzip, otherwise take it as UTF-8 JSON as-is.
pub fn decode_body(body: &[u8]) -> Result<String> {
    if body.starts_with(&GZIP_MAGIC) {
        let mut text = String::new();
        GzDecoder::new(body)
            .read_to_string(&mut text)
            .context("Failed to decompress gzip pool body")?;
        return Ok(text);
    }

    String::from_utf8(body.to_vec()).context("Pool body is neither gzip nor UTF-8 text")
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    #[test]
    fn test_decode_gzip_body() -> Result<()> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(r#"["Plasteel", 0]"#.as_bytes())?;
        let compressed = encoder.finish()?;

        assert_eq!(decode_body(&compressed)?, r#"["Plasteel", 0]"#);
        Ok(())
    }

    #[test]
    fn test_decode_raw_body() -> Result<()> {
        assert_eq!(decode_body(br#"[1, 2]"#)?, "[1, 2]");
        Ok(())
    }

    #[test]
    fn test_decode_rejects_binary() {
        assert!(decode_body(&[0xff, 0xfe, 0x00]).is_err());
        // Truncated gzip stream.
        assert!(decode_body(&[0x1f, 0x8b, 0x08]).is_err());
    }
}
