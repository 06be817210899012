use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const ROOM_CODE_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
pub const MIN_ROOM_CODE_LEN: usize = 5;
pub const MAX_ROOM_CODE_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomCodeError {
    #[error("room code is empty")]
    Empty,
    #[error("room code contains invalid character {0:?}")]
    InvalidCharacter(char),
}

/// Short human-typeable identifier correlating a host and a viewer in the store.
///
/// Codes are not checked for uniqueness against the store; two hosts drawing
/// the same code is a known limitation.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Draws a fresh uppercase alphanumeric code. `len` is clamped to 5..=6.
    pub fn generate(len: usize) -> Self {
        let len = len.clamp(MIN_ROOM_CODE_LEN, MAX_ROOM_CODE_LEN);
        let mut rng = rand::thread_rng();
        let code = (0..len)
            .map(|_| ROOM_CODE_ALPHABET[rng.gen_range(0..ROOM_CODE_ALPHABET.len())] as char)
            .collect();
        Self(code)
    }

    /// Normalizes a typed code: surrounding whitespace is dropped and letters
    /// are upper-cased.
    pub fn parse(input: &str) -> Result<Self, RoomCodeError> {
        let code = input.trim().to_ascii_uppercase();
        if code.is_empty() {
            return Err(RoomCodeError::Empty);
        }
        if let Some(c) = code.chars().find(|c| !c.is_ascii_alphanumeric()) {
            return Err(RoomCodeError::InvalidCharacter(c));
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for RoomCode {
    type Err = RoomCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
