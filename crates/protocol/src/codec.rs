//! Opaque string form of a [`Cursor`] for API boundaries.
//!
//! A token is URL-safe base64 over one format byte followed by the cursor's
//! JSON, either as-is or zlib-compressed, whichever is shorter. Callers must
//! treat tokens as opaque.

use crate::cursor::Cursor;
use anyhow::{Context, Result};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Read, Write};

/// Upper bound on the decoded JSON; symbol name lists dominate cursor size
const MAX_JSON_BYTES: usize = 256 * 1024;

const FORMAT_JSON: u8 = b'j';
const FORMAT_ZLIB_JSON: u8 = b'z';

pub fn encode_cursor(cursor: &Cursor) -> Result<String> {
    let json = serde_json::to_vec(cursor).context("serialize cursor")?;
    if json.len() > MAX_JSON_BYTES {
        anyhow::bail!("cursor is {} bytes, limit is {MAX_JSON_BYTES}", json.len());
    }

    let mut encoder = ZlibEncoder::new(vec![FORMAT_ZLIB_JSON], Compression::default());
    encoder.write_all(&json).context("compress cursor")?;
    let compressed = encoder.finish().context("finish cursor compression")?;

    let payload = if compressed.len() <= json.len() {
        compressed
    } else {
        let mut plain = Vec::with_capacity(json.len() + 1);
        plain.push(FORMAT_JSON);
        plain.extend_from_slice(&json);
        plain
    };
    Ok(URL_SAFE_NO_PAD.encode(payload))
}

pub fn decode_cursor(token: &str) -> Result<Cursor> {
    let token = token.trim();
    if token.is_empty() {
        anyhow::bail!("cursor token is empty");
    }
    if token.len() > MAX_JSON_BYTES * 2 {
        anyhow::bail!("cursor token is too long ({} chars)", token.len());
    }

    let payload = URL_SAFE_NO_PAD.decode(token).context("decode cursor base64")?;
    let (&format, body) = payload.split_first().context("cursor token has no payload")?;
    let json = match format {
        FORMAT_JSON => body.to_vec(),
        FORMAT_ZLIB_JSON => {
            let mut json = Vec::new();
            ZlibDecoder::new(body)
                .take(MAX_JSON_BYTES as u64 + 1)
                .read_to_end(&mut json)
                .context("decompress cursor")?;
            if json.len() > MAX_JSON_BYTES {
                anyhow::bail!("decompressed cursor exceeds {MAX_JSON_BYTES} bytes");
            }
            json
        }
        other => anyhow::bail!("unknown cursor format byte {other:#04x}"),
    };

    serde_json::from_slice(&json).context("parse cursor json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CursorVisibleUpload, Phase, Position};
    use pretty_assertions::assert_eq;

    #[test]
    fn cursor_survives_the_api_boundary() {
        let mut cursor = Cursor {
            phase: Phase::Remote,
            visible_uploads: vec![CursorVisibleUpload {
                upload_id: 42,
                target_path: "sub/main.go".to_string(),
                target_position: Position::new(10, 4),
                target_path_without_root: "main.go".to_string(),
            }],
            definition_ids: vec![42, 50],
            upload_ids: vec![50],
            remote_upload_offset: -1,
            remote_location_offset: 3,
            ..Default::default()
        };
        cursor.skip_paths_by_upload_id.insert(42, "main.go".to_string());
        cursor.add_symbol_names(vec!["scip-go gomod x v1 Foo.".to_string()]);

        let token = encode_cursor(&cursor).expect("encode cursor");
        assert_eq!(decode_cursor(&token).expect("decode cursor"), cursor);
    }

    #[test]
    fn large_cursors_are_compressed() {
        let mut cursor = Cursor::default();
        cursor.add_symbol_names((0..200).map(|i| format!("scip-go gomod pkg v1 Symbol{i}.")));

        let token = encode_cursor(&cursor).expect("encode cursor");
        let payload = URL_SAFE_NO_PAD.decode(&token).expect("base64");
        assert_eq!(payload[0], FORMAT_ZLIB_JSON);
        assert!(payload.len() < serde_json::to_vec(&cursor).expect("json").len());

        assert_eq!(decode_cursor(&token).expect("decode cursor").symbol_names.len(), 200);
    }

    #[test]
    fn plain_json_tokens_decode() {
        let mut payload = vec![FORMAT_JSON];
        payload.extend_from_slice(br#"{"phase":"done"}"#);
        let cursor = decode_cursor(&URL_SAFE_NO_PAD.encode(payload)).expect("decode");
        assert!(cursor.is_done());
    }

    #[test]
    fn rejects_garbage() {
        assert!(decode_cursor("").is_err());
        assert!(decode_cursor("!!!not base64!!!").is_err());

        let unknown = URL_SAFE_NO_PAD.encode(b"qhello");
        let err = decode_cursor(&unknown).expect_err("unknown format");
        assert!(err.to_string().contains("unknown cursor format"));

        let not_json = URL_SAFE_NO_PAD.encode(b"jhello");
        let err = decode_cursor(&not_json).expect_err("not json");
        assert!(format!("{err:#}").contains("parse cursor json"));
    }
}
