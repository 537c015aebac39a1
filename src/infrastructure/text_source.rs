use std::{fs, path::Path};

use anyhow::{Context, Result};
use encoding_rs::Encoding;
use tracing::{debug, warn};

use crate::domain::{error::InputError, settings::Settings};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    /// Canonical name of the encoding actually used, e.g. `UTF-8`.
    pub encoding: String,
}

/// Reads a whole file and decodes it with the given encoding label. A byte
/// order mark in the file takes precedence over the label.
pub fn read_text(path: &Path, encoding_label: &str, settings: &Settings) -> Result<DecodedText> {
    let metadata = fs::metadata(path)
        .with_context(|| format!("Unable to read file: {}", path.display()))?;
    let size = usize::try_from(metadata.len()).unwrap_or(usize::MAX);
    if size > settings.max_input_bytes {
        return Err(InputError::TooLarge {
            size,
            limit: settings.max_input_bytes,
        }
        .into());
    }

    let bytes =
        fs::read(path).with_context(|| format!("Unable to read file: {}", path.display()))?;
    Ok(decode_bytes(&bytes, encoding_label)?)
}

pub fn decode_bytes(bytes: &[u8], encoding_label: &str) -> Result<DecodedText, InputError> {
    let encoding = Encoding::for_label(encoding_label.trim().as_bytes())
        .ok_or_else(|| InputError::UnknownEncoding(encoding_label.to_string()))?;

    let (text, used_encoding, had_errors) = encoding.decode(bytes);
    if had_errors {
        warn!(
            encoding = used_encoding.name(),
            "input contained malformed sequences, replaced with U+FFFD"
        );
    }
    debug!(encoding = used_encoding.name(), bytes = bytes.len(), "decoded input");

    Ok(DecodedText {
        text: text.into_owned(),
        encoding: used_encoding.name().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::*;

    #[test]
    fn decodes_latin1_label() {
        let decoded = decode_bytes(b"name\nJos\xe9\n", "latin1").expect("label should resolve");

        assert_eq!(decoded.text, "name\nJosé\n");
        assert_eq!(decoded.encoding, "windows-1252");
    }

    #[test]
    fn utf8_bom_is_consumed() {
        let decoded =
            decode_bytes(b"\xef\xbb\xbfid\n1\n", "utf-8").expect("label should resolve");
        assert_eq!(decoded.text, "id\n1\n");
    }

    #[test]
    fn rejects_unknown_label() {
        let error = decode_bytes(b"x", "klingon").expect_err("label should be rejected");
        assert_eq!(error, InputError::UnknownEncoding("klingon".to_string()));
    }

    #[test]
    fn rejects_oversized_file() {
        let unique_suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time should be after unix epoch")
            .as_nanos();
        let path = std::env::temp_dir().join(format!("csv2sql_source_{unique_suffix}.csv"));
        fs::write(&path, "a,b\n1,2\n").expect("temp file should be written");

        let settings = Settings {
            max_input_bytes: 4,
            ..Settings::default()
        };
        let error = read_text(&path, "utf-8", &settings).expect_err("file should be too large");
        assert_eq!(
            error.downcast_ref::<InputError>(),
            Some(&InputError::TooLarge { size: 8, limit: 4 })
        );

        fs::remove_file(path).expect("temp file should be removed");
    }
}
