//! Payload decoding for compressed JSON resources

use std::io::Read;

use flate2::read::GzDecoder;
use serde::de::DeserializeOwned;

use crate::core::error::{Error, Result};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Inflate the payload when it carries the gzip magic, pass it through otherwise
///
/// A server that honours `Content-Encoding: gzip` hands over already-decoded
/// JSON even for a `.gz` resource.
pub fn inflate(data: &[u8]) -> Result<Vec<u8>> {
    if !data.starts_with(&GZIP_MAGIC) {
        return Ok(data.to_vec());
    }
    let mut decoded = Vec::with_capacity(data.len() * 4);
    GzDecoder::new(data)
        .read_to_end(&mut decoded)
        .map_err(|e| Error::ParseError(format!("gzip decompression failed: {e}")))?;
    Ok(decoded)
}

/// Inflate then deserialize a JSON document
pub fn decode_json<T: DeserializeOwned>(data: &[u8]) -> Result<T> {
    let raw = inflate(data)?;
    Ok(serde_json::from_slice(&raw)?)
}

#[cfg(test)]
pub(crate) fn gzip(data: &[u8]) -> Vec<u8> {
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).expect("write to in-memory encoder");
    encoder.finish().expect("finish in-memory encoder")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Doc {
        value: u32,
    }

    #[test]
    fn test_decode_plain_json() {
        let doc: Doc = decode_json(br#"{"value": 7}"#).unwrap();
        assert_eq!(doc, Doc { value: 7 });
    }

    #[test]
    fn test_decode_gzipped_json() {
        let compressed = gzip(br#"{"value": 42}"#);
        assert!(compressed.starts_with(&GZIP_MAGIC));
        let doc: Doc = decode_json(&compressed).unwrap();
        assert_eq!(doc, Doc { value: 42 });
    }

    #[test]
    fn test_corrupt_gzip_is_parse_error() {
        let mut compressed = gzip(br#"{"value": 42}"#);
        compressed.truncate(12);
        assert!(matches!(decode_json::<Doc>(&compressed), Err(Error::ParseError(_))));
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        assert!(matches!(decode_json::<Doc>(b"<html>"), Err(Error::ParseError(_))));
    }
}
