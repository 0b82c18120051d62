// This file is part of Gear.

// Copyright (C) 2025 Gear Technologies Inc.
// SPDX-License-Identifier: GPL-3.0-or-later WITH Classpath-exception-2.0

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Random beacon primitive types.

#![warn(missing_docs)]

pub use primitive_types::{H160, H256, U256};

pub mod utils;

use parity_scale_codec::{Decode, Encode, MaxEncodedLen};
use std::str::FromStr;

/// Height of the hosting chain. Every time-based rule of the beacon is
/// expressed in blocks.
pub type BlockNumber = u64;

/// The error type returned when conversion fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConversionError {
    /// Invalid slice length.
    #[error("Slice should be 20 length")]
    InvalidSliceLength,
    /// Invalid hex string.
    #[error("Invalid hex string")]
    InvalidHexString,
}

/// Staker identity.
///
/// Basically a 20 bytes buffer, which is the address the stake ledger
/// accounts stake, slashes and rewards under.
#[derive(
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Encode,
    Decode,
    MaxEncodedLen,
    derive_more::From,
    derive_more::Debug,
    derive_more::Display,
)]
#[from([u8; 20], H160)]
#[display("0x{}", hex::encode(_0))]
#[debug("0x{}", hex::encode(_0))]
pub struct Address(pub [u8; 20]);

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Address {
    /// Lowercase hex representation without `0x` prefix.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Creates address from the byte slice, which must be exactly 20 bytes long.
    pub fn try_from_slice(slice: &[u8]) -> Result<Self, ConversionError> {
        <[u8; 20]>::try_from(slice)
            .map(Self)
            .map_err(|_| ConversionError::InvalidSliceLength)
    }
}

impl From<u64> for Address {
    fn from(value: u64) -> Self {
        let mut address = Self::default();
        address.0[12..].copy_from_slice(&value.to_be_bytes());
        address
    }
}

impl FromStr for Address {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|_| ConversionError::InvalidHexString)?;
        Self::try_from_slice(&bytes)
    }
}
