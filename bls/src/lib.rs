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

//! Pairing-based BLS signatures over BLS12-381.
//!
//! Signatures and hashed messages live in G1 (48 bytes compressed), public
//! keys live in G2 (96 bytes compressed). A signature `s` over message `m`
//! is valid for public key `pk` iff `e(s, g2) == e(H(m), pk)`, where `H` is
//! the hash-to-curve suite identified by [`DST_G1`].
//!
//! The same check serves both threshold use cases of the beacon: a relay
//! entry signed by a whole group, and a DKG result quorum whose per-member
//! shares are first interpolated into one group signature by
//! [`combine_signature_shares`].

#![warn(missing_docs)]

pub use ark_bls12_381;
pub use ark_ec;
pub use ark_ff;
pub use ark_serialize;
pub use ark_std;

mod threshold;
mod verify;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use threshold::{combine_signature_shares, split_signature_shares};
pub use verify::{decode_public_key, decode_signature, hash_to_point, verify};

use parity_scale_codec::{Decode, Encode};

/// Domain separation tag of the hash-to-G1 suite.
pub const DST_G1: &[u8] = b"BLS_SIG_BLS12381G1_XMD:SHA-256_SSWU_RO_NUL_";

/// Length of a compressed G1 point, i.e. of a signature.
pub const SIGNATURE_LENGTH: usize = 48;

/// Length of a compressed G2 point, i.e. of a public key.
pub const PUBLIC_KEY_LENGTH: usize = 96;

/// 1-based index of a signer inside its group. Share `i` of the group
/// secret is the evaluation of the sharing polynomial at `x = i`.
pub type ShareIndex = u16;

/// BLS errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BlsError {
    /// Bytes are not a valid compressed point of the expected subgroup.
    #[error("Invalid curve point")]
    InvalidPoint,
    /// Message can't be mapped to the curve.
    #[error("Failed to hash message to curve")]
    HashToCurve,
    /// Nothing to interpolate.
    #[error("No signature shares provided")]
    NoShares,
    /// Share index `0` is the group secret itself and never a share.
    #[error("Signature share index must be non-zero")]
    ZeroShareIndex,
    /// Two shares claim the same index.
    #[error("Duplicate signature share index: {0}")]
    DuplicateShareIndex(ShareIndex),
    /// Concatenated signatures don't split into the expected number of shares.
    #[error("Signatures length {actual} doesn't match {expected} bytes")]
    MalformedSignatures {
        /// Length of the provided bytes.
        actual: usize,
        /// Length implied by the number of signers.
        expected: usize,
    },
}

/// Compressed G2 public key.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Decode, derive_more::Debug)]
#[debug("0x{}", hex::encode(_0))]
pub struct PublicKey(pub [u8; PUBLIC_KEY_LENGTH]);

impl PublicKey {
    /// Creates public key from bytes, checking they encode a valid G2 point.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, BlsError> {
        let key = bytes
            .try_into()
            .map(Self)
            .map_err(|_| BlsError::InvalidPoint)?;
        decode_public_key(&key)?;

        Ok(key)
    }
}

impl AsRef<[u8]> for PublicKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Compressed G1 signature.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Encode, Decode, derive_more::Debug)]
#[debug("0x{}", hex::encode(_0))]
pub struct Signature(pub [u8; SIGNATURE_LENGTH]);

impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
