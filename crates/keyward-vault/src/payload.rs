// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plaintext formats sealed inside records.
//!
//! Entries are JSON objects. Attachments are a big-endian `u16` filename
//! length, the UTF-8 filename, then the raw file bytes.

use keyward_core::{KeywardError, RecordId};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// The secret bundle stored in one password entry.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct EntryPayload {
    pub service: String,
    pub username: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl EntryPayload {
    pub fn new(
        service: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            service: service.into(),
            username: username.into(),
            password: password.into(),
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub(crate) fn validate(&self) -> Result<(), KeywardError> {
        if self.service.trim().is_empty() {
            return Err(KeywardError::InvalidInput(
                "service must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn encode(&self) -> Result<Zeroizing<Vec<u8>>, KeywardError> {
        serde_json::to_vec(self)
            .map(Zeroizing::new)
            .map_err(|e| KeywardError::Internal(format!("failed to encode entry: {e}")))
    }

    pub(crate) fn decode(bytes: &[u8]) -> Result<Self, KeywardError> {
        serde_json::from_slice(bytes)
            .map_err(|e| KeywardError::InvalidInput(format!("malformed entry payload: {e}")))
    }
}

impl std::fmt::Debug for EntryPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryPayload")
            .field("service", &self.service)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("notes", &self.notes.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// A decrypted password entry.
#[derive(Debug, Clone)]
pub struct Entry {
    pub id: RecordId,
    pub data: EntryPayload,
}

/// A decrypted attachment.
pub struct Attachment {
    pub id: RecordId,
    pub entry_id: RecordId,
    pub filename: String,
    pub bytes: Zeroizing<Vec<u8>>,
}

impl std::fmt::Debug for Attachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attachment")
            .field("id", &self.id)
            .field("entry_id", &self.entry_id)
            .field("filename", &self.filename)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// Attachment listing row: everything except the file contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentInfo {
    pub id: RecordId,
    pub entry_id: RecordId,
    pub filename: String,
    pub size: usize,
}

pub(crate) fn encode_attachment(
    filename: &str,
    bytes: &[u8],
) -> Result<Zeroizing<Vec<u8>>, KeywardError> {
    if filename.is_empty() {
        return Err(KeywardError::InvalidInput(
            "attachment filename must not be empty".to_string(),
        ));
    }
    let name_len = u16::try_from(filename.len()).map_err(|_| {
        KeywardError::InvalidInput(format!(
            "attachment filename too long ({} bytes, max {})",
            filename.len(),
            u16::MAX
        ))
    })?;

    let mut out = Zeroizing::new(Vec::with_capacity(2 + filename.len() + bytes.len()));
    out.extend_from_slice(&name_len.to_be_bytes());
    out.extend_from_slice(filename.as_bytes());
    out.extend_from_slice(bytes);
    Ok(out)
}

/// Split a decrypted attachment into filename and contents.
pub(crate) fn decode_attachment(
    plaintext: &[u8],
) -> Result<(String, Zeroizing<Vec<u8>>), KeywardError> {
    let malformed = || KeywardError::InvalidInput("malformed attachment payload".to_string());

    let (len_bytes, rest) = plaintext.split_first_chunk::<2>().ok_or_else(malformed)?;
    let name_len = usize::from(u16::from_be_bytes(*len_bytes));
    if rest.len() < name_len {
        return Err(malformed());
    }
    let (name, body) = rest.split_at(name_len);
    let filename = std::str::from_utf8(name).map_err(|_| malformed())?.to_string();

    Ok((filename, Zeroizing::new(body.to_vec())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_json_omits_missing_notes() {
        let entry = EntryPayload::new("github", "alice", "p@ss");
        let bytes = entry.encode().unwrap();
        let json = std::str::from_utf8(&bytes).unwrap();
        assert!(!json.contains("notes"), "{json}");

        let back = EntryPayload::decode(&bytes).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn entry_debug_redacts_password_and_notes() {
        let entry = EntryPayload::new("github", "alice", "hunter2").with_notes("recovery codes");
        let dbg = format!("{entry:?}");
        assert!(dbg.contains("github"));
        assert!(!dbg.contains("hunter2"));
        assert!(!dbg.contains("recovery codes"));
    }

    #[test]
    fn blank_service_is_rejected() {
        let err = EntryPayload::new("  ", "alice", "pw").validate().unwrap_err();
        assert!(matches!(err, KeywardError::InvalidInput(_)));
    }

    #[test]
    fn attachment_framing_preserves_name_and_body() {
        let framed = encode_attachment("id_ed25519", b"\x00\x01binary").unwrap();
        assert_eq!(&framed[..2], &[0, 10]);

        let (name, body) = decode_attachment(&framed).unwrap();
        assert_eq!(name, "id_ed25519");
        assert_eq!(&body[..], b"\x00\x01binary");
    }

    #[test]
    fn attachment_with_empty_body_is_allowed() {
        let framed = encode_attachment("empty.txt", b"").unwrap();
        let (name, body) = decode_attachment(&framed).unwrap();
        assert_eq!(name, "empty.txt");
        assert!(body.is_empty());
    }

    #[test]
    fn truncated_attachment_is_rejected() {
        assert!(decode_attachment(&[0]).is_err());
        assert!(decode_attachment(&[0, 5, b'a', b'b']).is_err());
    }

    #[test]
    fn empty_filename_is_rejected() {
        assert!(encode_attachment("", b"data").is_err());
    }
}
