//! Text files that keep their byte-order mark across a rewrite.

use std::path::{Path, PathBuf};

use crate::error::{Result, SwitchError};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];

/// Encoding detected from the byte-order mark. No mark means UTF-8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Utf8Bom,
    Utf16Le,
    Utf16Be,
}

impl TextEncoding {
    fn detect(bytes: &[u8]) -> Self {
        if bytes.starts_with(UTF8_BOM) {
            Self::Utf8Bom
        } else if bytes.starts_with(UTF16_LE_BOM) {
            Self::Utf16Le
        } else if bytes.starts_with(UTF16_BE_BOM) {
            Self::Utf16Be
        } else {
            Self::Utf8
        }
    }

    fn bom(&self) -> &'static [u8] {
        match self {
            Self::Utf8 => &[],
            Self::Utf8Bom => UTF8_BOM,
            Self::Utf16Le => UTF16_LE_BOM,
            Self::Utf16Be => UTF16_BE_BOM,
        }
    }

    fn decode(&self, body: &[u8]) -> std::result::Result<String, String> {
        match self {
            Self::Utf8 | Self::Utf8Bom => {
                String::from_utf8(body.to_vec()).map_err(|e| format!("invalid UTF-8: {e}"))
            }
            Self::Utf16Le | Self::Utf16Be => {
                if body.len() % 2 != 0 {
                    return Err("truncated UTF-16 content".to_string());
                }
                let units: Vec<u16> = body
                    .chunks_exact(2)
                    .map(|pair| match self {
                        Self::Utf16Le => u16::from_le_bytes([pair[0], pair[1]]),
                        _ => u16::from_be_bytes([pair[0], pair[1]]),
                    })
                    .collect();
                String::from_utf16(&units).map_err(|e| format!("invalid UTF-16: {e}"))
            }
        }
    }

    fn encode(&self, text: &str) -> Vec<u8> {
        let mut bytes = self.bom().to_vec();
        match self {
            Self::Utf8 | Self::Utf8Bom => bytes.extend_from_slice(text.as_bytes()),
            Self::Utf16Le => bytes.extend(text.encode_utf16().flat_map(u16::to_le_bytes)),
            Self::Utf16Be => bytes.extend(text.encode_utf16().flat_map(u16::to_be_bytes)),
        }
        bytes
    }
}

/// A file's decoded text plus the encoding it was read with.
#[derive(Debug, Clone)]
pub struct TextFile {
    path: PathBuf,
    encoding: TextEncoding,
    pub text: String,
}

impl TextFile {
    /// Read `path`, detecting the encoding from its byte-order mark.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| SwitchError::io(path, e))?;
        Self::from_bytes(path, &bytes)
    }

    /// Decode in-memory bytes as if read from `path`.
    pub fn from_bytes(path: impl Into<PathBuf>, bytes: &[u8]) -> Result<Self> {
        let path = path.into();
        let encoding = TextEncoding::detect(bytes);
        let text = encoding
            .decode(&bytes[encoding.bom().len()..])
            .map_err(|message| SwitchError::ParseFailure {
                path: path.clone(),
                message,
            })?;
        Ok(Self {
            path,
            encoding,
            text,
        })
    }

    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// Encoded bytes of the current text, byte-order mark included.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.encoding.encode(&self.text)
    }

    /// Replace the text and write it back with the original encoding.
    pub fn write(&mut self, text: String) -> Result<()> {
        self.text = text;
        std::fs::write(&self.path, self.to_bytes()).map_err(|e| SwitchError::io(&self.path, e))
    }
}
