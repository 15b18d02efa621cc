//! Channel selection for outbound messages
//!
//! A selection is either `*` or a whitespace separated list of `chan<N>` and
//! `fft_chan<N>` tokens, both 1-indexed. Raw channels resolve to `N-1`,
//! spectral channels to `C+N-1` where `C` is the raw channel count.

use bci_core::{BciError, BciResult};
use std::num::IntErrorKind;

const RAW_PREFIX: &str = "chan";
const SPECTRAL_PREFIX: &str = "fft_chan";

/// One parsed selection token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelToken {
    /// `chan<N>`, 1-indexed
    Raw(i64),
    /// `fft_chan<N>`, 1-indexed
    Spectral(i64),
}

/// Parsed channel selection expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelSelection {
    /// Every raw channel, then every spectral channel when spectral is on
    All,
    /// Explicit tokens in the order written
    Explicit(Vec<ChannelToken>),
}

impl ChannelSelection {
    /// Parse a selection expression.
    ///
    /// Tokens with an unknown prefix are ignored. A known prefix followed by
    /// something that is not an integer is an error.
    pub fn parse(selection: &str) -> BciResult<Self> {
        if selection.trim() == "*" {
            return Ok(ChannelSelection::All);
        }

        let mut tokens = Vec::new();
        for raw_token in selection.split_whitespace() {
            if let Some(index) = raw_token.strip_prefix(SPECTRAL_PREFIX) {
                tokens.push(ChannelToken::Spectral(parse_index(raw_token, index)?));
            } else if let Some(index) = raw_token.strip_prefix(RAW_PREFIX) {
                tokens.push(ChannelToken::Raw(parse_index(raw_token, index)?));
            }
        }

        Ok(ChannelSelection::Explicit(tokens))
    }

    /// Logical output indices for `raw_channels` raw channels.
    ///
    /// Out-of-range tokens are dropped; order and duplicates are kept.
    pub fn resolve(&self, raw_channels: usize, spectral_active: bool) -> Vec<usize> {
        match self {
            ChannelSelection::All => {
                let total = if spectral_active { raw_channels * 2 } else { raw_channels };
                (0..total).collect()
            }
            ChannelSelection::Explicit(tokens) => tokens
                .iter()
                .filter_map(|token| match *token {
                    ChannelToken::Raw(n) => in_range(n, raw_channels),
                    ChannelToken::Spectral(n) => in_range(n, raw_channels).map(|i| raw_channels + i),
                })
                .collect(),
        }
    }
}

/// Channel number of a token. Numbers too large for `i64` saturate, which
/// keeps them out of range instead of making them malformed.
fn parse_index(token: &str, digits: &str) -> BciResult<i64> {
    match digits.parse::<i64>() {
        Ok(number) => Ok(number),
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => Ok(i64::MAX),
            IntErrorKind::NegOverflow => Ok(i64::MIN),
            _ => Err(BciError::InvalidChannelSelection {
                token: token.to_string(),
            }),
        },
    }
}

/// Zero-based index for a 1-based channel number, if it exists
fn in_range(number: i64, channels: usize) -> Option<usize> {
    if number >= 1 && (number as u64) <= channels as u64 {
        Some(number as usize - 1)
    } else {
        None
    }
}

/// Parse and resolve in one step
pub fn route_channels(selection: &str, raw_channels: usize, spectral_active: bool) -> BciResult<Vec<usize>> {
    Ok(ChannelSelection::parse(selection)?.resolve(raw_channels, spectral_active))
}
