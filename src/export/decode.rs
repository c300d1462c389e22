//! Decode encoded payloads (`data:<mime>;base64,<data>` or bare base64) into bytes

use crate::error::{TransferError, TransferResult};
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;

// Standard alphabet; `=` padding may be present or omitted
const BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// A decoded binary ready to be handed to the host for saving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// Decode a payload.
///
/// With a `data:` header the MIME type comes from the header; bare base64 is
/// tagged with `fallback_mime`. Whitespace inside the base64 is ignored and
/// trailing `=` padding is optional.
pub fn decode_payload(payload: &str, fallback_mime: &str) -> TransferResult<Artifact> {
    let payload = payload.trim();
    if payload.is_empty() {
        return Err(TransferError::Decode("empty payload".to_string()));
    }

    let (mime_type, data) = match payload.strip_prefix("data:") {
        Some(rest) => {
            let (header, data) = rest
                .split_once(',')
                .ok_or_else(|| TransferError::Decode("data URI has no ',' separator".to_string()))?;
            let mut params = header.split(';');
            let mime = params.next().unwrap_or("").trim();
            if !params.any(|p| p.trim().eq_ignore_ascii_case("base64")) {
                return Err(TransferError::Decode(
                    "only base64 data URIs are supported".to_string(),
                ));
            }
            let mime = if mime.is_empty() { fallback_mime } else { mime };
            (mime.to_string(), data)
        }
        None => (fallback_mime.to_string(), payload),
    };

    let cleaned: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = BASE64
        .decode(cleaned.as_bytes())
        .map_err(|e| TransferError::Decode(format!("invalid base64: {}", e)))?;

    Ok(Artifact { bytes, mime_type })
}
