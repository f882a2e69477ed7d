//! Share tokens: opaque, URL-safe capabilities that grant public access to one
//! published plan.
//!
//! Tokens are drawn from the operating system's CSPRNG. If that source fails,
//! generation returns [`TokenError::RandomSource`]; there is no fallback.

use std::fmt;

use lazy_static::lazy_static;
use rand::{rngs::OsRng, RngCore};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_TOKEN_LENGTH: usize = 21;
/// Compact tokens for QR codes. Fewer symbols means weaker collision
/// resistance, so only hand these out where exposure is limited.
pub const DEFAULT_SHORT_TOKEN_LENGTH: usize = 12;
pub const DEFAULT_NUMERIC_TOKEN_LENGTH: usize = 8;

pub const MIN_TOKEN_LENGTH: usize = 8;
pub const MAX_TOKEN_LENGTH: usize = 50;

// 64 symbols, so masking a random byte to 6 bits picks each one uniformly.
const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token length {length} is outside {min}..={max}")]
    InvalidLength {
        length: usize,
        min: usize,
        max: usize,
    },

    #[error("invalid token format")]
    InvalidFormat,

    #[error("random source unavailable")]
    RandomSource(#[source] rand::Error),
}

/// A syntactically valid share token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShareToken(String);

impl ShareToken {
    /// Validates untrusted input. Says nothing about whether a plan exists.
    pub fn parse(raw: &str) -> Result<Self, TokenError> {
        if is_valid_token(raw) {
            Ok(Self(raw.to_owned()))
        } else {
            Err(TokenError::InvalidFormat)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ShareToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which generator to use when (re)issuing a plan's share token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenFormat {
    #[default]
    Standard,
    Compact,
    Numeric,
}

impl TokenFormat {
    /// `standard_length` only applies to [`TokenFormat::Standard`]; the other
    /// formats use their fixed defaults.
    pub fn generate(self, standard_length: usize) -> Result<ShareToken, TokenError> {
        match self {
            Self::Standard => generate_token(standard_length),
            Self::Compact => generate_short_token(DEFAULT_SHORT_TOKEN_LENGTH),
            // Digits are a subset of the token alphabet and the default
            // length sits at the minimum, so the result always parses.
            Self::Numeric => ShareToken::parse(&generate_numeric_token(
                DEFAULT_NUMERIC_TOKEN_LENGTH,
            )?),
        }
    }
}

/// Random token over `[A-Za-z0-9_-]`, `length` in `8..=50`.
pub fn generate_token(length: usize) -> Result<ShareToken, TokenError> {
    check_length(length, MIN_TOKEN_LENGTH)?;
    let token = random_bytes(length)?
        .into_iter()
        .map(|b| char::from(ALPHABET[usize::from(b & 0x3f)]))
        .collect();
    Ok(ShareToken(token))
}

pub fn generate_short_token(length: usize) -> Result<ShareToken, TokenError> {
    generate_token(length)
}

/// Digits only. Bytes >= 250 are discarded so every digit is equally likely.
pub fn generate_numeric_token(length: usize) -> Result<String, TokenError> {
    check_length(length, 1)?;
    let mut token = String::with_capacity(length);
    while token.len() < length {
        let missing = length - token.len();
        for b in random_bytes(missing + missing / 8 + 1)? {
            if b < 250 {
                token.push(char::from(b'0' + b % 10));
                if token.len() == length {
                    break;
                }
            }
        }
    }
    Ok(token)
}

/// Purely syntactic: 8..=50 characters from `[A-Za-z0-9_-]`.
pub fn is_valid_token(token: &str) -> bool {
    lazy_static! {
        static ref TOKEN_RE: Regex = Regex::new(r"^[A-Za-z0-9_-]+$").unwrap();
    }
    (MIN_TOKEN_LENGTH..=MAX_TOKEN_LENGTH).contains(&token.len()) && TOKEN_RE.is_match(token)
}

fn check_length(length: usize, min: usize) -> Result<(), TokenError> {
    if (min..=MAX_TOKEN_LENGTH).contains(&length) {
        Ok(())
    } else {
        Err(TokenError::InvalidLength {
            length,
            min,
            max: MAX_TOKEN_LENGTH,
        })
    }
}

fn random_bytes(len: usize) -> Result<Vec<u8>, TokenError> {
    let mut buf = vec![0_u8; len];
    OsRng
        .try_fill_bytes(&mut buf)
        .map_err(TokenError::RandomSource)?;
    Ok(buf)
}
