//! Compressed payload decoding.
//!
//! Data payloads are gzip (possibly multi-member) or zlib streams whose content is UTF-8
//! JSON. A payload that fails any stage is rejected as a whole so nothing partially decoded
//! can reach the cache.

use flate2::read::{MultiGzDecoder, ZlibDecoder};
use serde_json::Value;
use std::io::Read;

use crate::error::{DataError, Result};
use crate::types::Dataset;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Compression {
    Gzip,
    Zlib,
}

impl Compression {
    /// Detects the container from the stream header.
    fn detect(bytes: &[u8]) -> Option<Self> {
        match *bytes {
            [0x1f, 0x8b, ..] => Some(Self::Gzip),
            // Deflate method with a valid header checksum.
            [cmf, flg, ..] if cmf & 0x0f == 8 && cmf >> 4 <= 7 => {
                (u16::from_be_bytes([cmf, flg]) % 31 == 0).then_some(Self::Zlib)
            }
            _ => None,
        }
    }
}

/// Decompresses and parses a data payload.
///
/// # Errors
/// Returns [`DataError::Decode`] if the bytes are not gzip, not UTF-8, not JSON, or not one
/// of the accepted payload shapes.
pub fn decode_payload(bytes: &[u8]) -> Result<Dataset> {
    let Some(compression) = Compression::detect(bytes) else {
        return Err(DataError::Decode("payload is not gzip or zlib compressed".to_string()));
    };
    let text = inflate(bytes, compression)?;
    let value: Value = serde_json::from_str(&text)
        .map_err(|e| DataError::Decode(format!("invalid JSON: {e}")))?;
    Dataset::from_json(value)
}

/// Parses a metadata document, which may or may not be compressed.
///
/// # Errors
/// Returns [`DataError::Decode`] if decompression or JSON parsing fails.
pub fn decode_document(bytes: &[u8]) -> Result<Value> {
    let text = match Compression::detect(bytes) {
        Some(compression) => inflate(bytes, compression)?,
        None => String::from_utf8(bytes.to_vec())
            .map_err(|e| DataError::Decode(format!("invalid UTF-8: {e}")))?,
    };
    serde_json::from_str(&text).map_err(|e| DataError::Decode(format!("invalid JSON: {e}")))
}

fn inflate(bytes: &[u8], compression: Compression) -> Result<String> {
    let mut raw = Vec::new();
    let read = match compression {
        Compression::Gzip => MultiGzDecoder::new(bytes).read_to_end(&mut raw),
        Compression::Zlib => ZlibDecoder::new(bytes).read_to_end(&mut raw),
    };
    read.map_err(|e| DataError::Decode(format!("{compression:?} stream corrupt: {e}")))?;
    String::from_utf8(raw).map_err(|e| DataError::Decode(format!("invalid UTF-8: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::{GzEncoder, ZlibEncoder};
    use std::io::Write;

    fn gzip(text: &str) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(text.as_bytes()).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_decode_object_payload() {
        let bytes = gzip(r#"{"details":[{"date":"2024-01-02","amount":10}],"totalSales":10}"#);
        let dataset = decode_payload(&bytes).unwrap();
        assert_eq!(dataset.len(), 1);
        assert!(dataset.summary.contains_key("totalSales"));
    }

    #[test]
    fn test_decode_multi_member_gzip() {
        let mut bytes = gzip(r#"[{"a":1},"#);
        bytes.extend(gzip(r#"{"a":2}]"#));
        assert_eq!(decode_payload(&bytes).unwrap().len(), 2);
    }

    #[test]
    fn test_decode_zlib_payload() {
        let mut encoder = ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(br#"[{"a":1},{"a":2},{"a":3}]"#).unwrap();
        let bytes = encoder.finish().unwrap();

        assert_eq!(Compression::detect(&bytes), Some(Compression::Zlib));
        assert_eq!(decode_payload(&bytes).unwrap().len(), 3);
    }

    #[test]
    fn test_uncompressed_payload_is_rejected() {
        let err = decode_payload(br#"[{"a":1}]"#).unwrap_err();
        assert!(matches!(err, DataError::Decode(_)));
    }

    #[test]
    fn test_truncated_payload_is_rejected() {
        let bytes = gzip(r#"[{"a":1},{"a":2},{"a":3}]"#);
        let truncated = &bytes[..bytes.len() - 6];
        assert!(matches!(
            decode_payload(truncated),
            Err(DataError::Decode(_))
        ));
    }

    #[test]
    fn test_invalid_json_is_rejected() {
        let bytes = gzip("[{\"a\":1},");
        assert!(matches!(decode_payload(&bytes), Err(DataError::Decode(_))));
    }

    #[test]
    fn test_decode_document_plain_and_gzip() {
        let plain = decode_document(br#"{"availableYears":[2024,2025]}"#).unwrap();
        let zipped = decode_document(&gzip(r#"{"availableYears":[2024,2025]}"#)).unwrap();
        assert_eq!(plain, zipped);
    }
}
