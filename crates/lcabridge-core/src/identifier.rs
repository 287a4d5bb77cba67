//! Deterministic identifier derivation
//!
//! Two unrelated derivations:
//! - [`forward`] / [`reverse`]: a reversible transform of a canonical UUID
//!   token. The version and variant characters (offsets 14 and 19) and the
//!   separators stay in place; the remaining 30 hex digits form a 15-byte
//!   payload run through AES-128 in CFB-8 mode, keyed by a fixed secret with
//!   the byte-reversed key as IV.
//! - [`name_hash`]: a one-way name-based UUID (v5) under a fixed namespace.
//!
//! Copyright (c) 2025 lcabridge Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use aes::Aes128;
use cfb8::cipher::{AsyncStreamCipher, KeyIvInit};
use std::fmt;
use uuid::Uuid;

type Aes128Cfb8Enc = cfb8::Encryptor<Aes128>;
type Aes128Cfb8Dec = cfb8::Decryptor<Aes128>;

const DEFAULT_KEY: [u8; 16] = *b"lcabridge-idmap1";

/// Namespace of identifiers produced by [`name_hash`]
pub const NAME_NAMESPACE: Uuid = Uuid::from_u128(0x3c1f_8a52_6e0d_5b7a_9d41_27c8_e0b3_f615);

const UUID_LEN: usize = 36;
const SEPARATORS: [usize; 4] = [8, 13, 18, 23];
const PRESERVED: [usize; 2] = [14, 19];

/// 16-byte secret for the reversible identifier transform
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct IdentifierKey([u8; 16]);

impl IdentifierKey {
    pub fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Key from exactly 16 ASCII characters
    pub fn from_text(text: &str) -> Result<Self> {
        let bytes: [u8; 16] = text
            .as_bytes()
            .try_into()
            .ok()
            .filter(|_| text.is_ascii())
            .ok_or_else(|| {
                Error::configuration(format!(
                    "identifier key must be 16 ASCII characters, got {} bytes",
                    text.len()
                ))
            })?;
        Ok(Self(bytes))
    }

    fn iv(&self) -> [u8; 16] {
        let mut iv = self.0;
        iv.reverse();
        iv
    }
}

impl Default for IdentifierKey {
    fn default() -> Self {
        Self(DEFAULT_KEY)
    }
}

impl fmt::Debug for IdentifierKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IdentifierKey(***)")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
}

/// Map a canonical UUID token in `direction`
///
/// Input is accepted in either case; output is lower case.
///
/// # Errors
///
/// `InvalidIdentifier` unless `id` is 36 characters with dashes at offsets
/// 8, 13, 18 and 23 and hex digits everywhere else.
pub fn map_identifier(id: &str, key: &IdentifierKey, direction: Direction) -> Result<String> {
    let id = id.trim().to_ascii_lowercase();
    validate(&id)?;

    let chars: Vec<char> = id.chars().collect();
    let payload_hex: String = chars
        .iter()
        .enumerate()
        .filter(|(i, _)| !SEPARATORS.contains(i) && !PRESERVED.contains(i))
        .map(|(_, c)| *c)
        .collect();
    let mut payload = hex::decode(&payload_hex).map_err(|e| Error::InvalidIdentifier {
        id: id.clone(),
        message: e.to_string(),
    })?;

    match direction {
        Direction::Forward => Aes128Cfb8Enc::new(&key.0.into(), &key.iv().into()).encrypt(&mut payload),
        Direction::Reverse => Aes128Cfb8Dec::new(&key.0.into(), &key.iv().into()).decrypt(&mut payload),
    }

    let mapped = hex::encode(payload);
    let mut digits = mapped.chars();
    let mut out = String::with_capacity(UUID_LEN);
    for (i, original) in chars.iter().enumerate() {
        if SEPARATORS.contains(&i) || PRESERVED.contains(&i) {
            out.push(*original);
        } else if let Some(digit) = digits.next() {
            out.push(digit);
        }
    }
    Ok(out)
}

/// Encrypt the payload of `id`
pub fn forward(id: &str, key: &IdentifierKey) -> Result<String> {
    map_identifier(id, key, Direction::Forward)
}

/// Decrypt the payload of `id`
pub fn reverse(id: &str, key: &IdentifierKey) -> Result<String> {
    map_identifier(id, key, Direction::Reverse)
}

/// Name-based identifier for arbitrary text
pub fn name_hash(text: &str) -> Uuid {
    Uuid::new_v5(&NAME_NAMESPACE, text.as_bytes())
}

fn validate(id: &str) -> Result<()> {
    let invalid = |message: &str| Error::InvalidIdentifier {
        id: id.to_string(),
        message: message.to_string(),
    };
    if id.len() != UUID_LEN || !id.is_ascii() {
        return Err(invalid("expected 36 ASCII characters"));
    }
    for (i, c) in id.chars().enumerate() {
        if SEPARATORS.contains(&i) {
            if c != '-' {
                return Err(invalid("expected '-' separators at offsets 8, 13, 18 and 23"));
            }
        } else if !c.is_ascii_hexdigit() {
            return Err(invalid("expected hexadecimal digits"));
        }
    }
    Ok(())
}
