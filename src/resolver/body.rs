//! Flattening a fetched message into the text that gets scanned for links.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use tracing::debug;

use crate::services::inbox_api::{Message, MessagePart};

/// Gmail emits URL-safe base64, usually unpadded but not always.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

fn is_text(mime_type: &str) -> bool {
    let mime = mime_type.trim().to_ascii_lowercase();
    mime.starts_with("text/plain") || mime.starts_with("text/html")
}

/// Decodes URL-safe base64 body data. Invalid UTF-8 is replaced rather than
/// rejected; only the link text matters.
pub fn decode_part_data(data: &str) -> Option<String> {
    match URL_SAFE_LENIENT.decode(data.trim()) {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) => {
            debug!(error = %e, "Skipping undecodable body part");
            None
        }
    }
}

fn collect(part: &MessagePart, is_root: bool, out: &mut String) {
    if !part.parts.is_empty() {
        for child in &part.parts {
            collect(child, false, out);
        }
        return;
    }

    // A flat message's single body is decoded whatever its declared type.
    if !is_root && !is_text(&part.mime_type) {
        return;
    }

    if let Some(text) = part
        .body
        .as_ref()
        .and_then(|b| b.data.as_deref())
        .and_then(decode_part_data)
    {
        out.push_str(&text);
    }
}

/// Concatenates every text part of `message`, walking nested multi-part
/// bodies depth first. Binary parts are ignored.
pub fn decode_body(message: &Message) -> String {
    let mut body = String::new();
    if let Some(payload) = &message.payload {
        collect(payload, true, &mut body);
    }
    body
}
