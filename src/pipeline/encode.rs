//! Image bytes → base64 `data:` URI, for inline-image mode.
//!
//! With [`crate::config::ConversionConfig::inline_images`] set, the embedded
//! converter's image callback returns one of these instead of a relative
//! file path, so the Markdown is self-contained.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

/// Build a `data:<mime>;base64,<payload>` URI.
///
/// An empty or non-image `mime` is replaced by one guessed from the bytes,
/// falling back to `image/png`.
pub fn data_uri(bytes: &[u8], mime: &str) -> String {
    let mime = if mime.starts_with("image/") {
        mime.to_string()
    } else {
        image::guess_format(bytes)
            .map(|f| f.to_mime_type().to_string())
            .unwrap_or_else(|_| "image/png".to_string())
    };

    let b64 = STANDARD.encode(bytes);
    debug!("Inlined image → {} bytes base64", b64.len());
    format!("data:{mime};base64,{b64}")
}
