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

//! Hashing and big-endian conversion helpers.
//!
//! Ticket values, DKG result digests and relay entries are all derived from
//! Keccak-256, so changing the function here changes every derived value.

use crate::U256;
use sha3::{Digest as _, Keccak256};

/// Compute the Keccak-256 hash of a single byte slice.
#[inline]
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute the Keccak-256 hash of several concatenated byte slices without
/// allocating intermediate buffers.
#[inline]
pub fn keccak256_iter<'a, I>(parts: I) -> [u8; 32]
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Big-endian 32 bytes representation of the value.
pub fn u256_to_be_bytes(value: &U256) -> [u8; 32] {
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    bytes
}

/// Interprets a hash output as a 256-bit unsigned integer.
pub fn u256_from_hash(hash: [u8; 32]) -> U256 {
    U256::from_big_endian(&hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn keccak256_of_empty_input() {
        assert_eq!(
            keccak256(&[]),
            hex!("c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470")
        );
    }

    #[test]
    fn keccak256_iter_matches_concatenation() {
        let parts: [&[u8]; 3] = [b"random", b"-", b"beacon"];
        assert_eq!(keccak256_iter(parts), keccak256(b"random-beacon"));
    }

    #[test]
    fn u256_big_endian_conversion() {
        let value = U256::from(0x0102u64);
        let bytes = u256_to_be_bytes(&value);
        assert_eq!(&bytes[30..], &[0x01, 0x02]);
        assert_eq!(u256_from_hash(bytes), value);
    }
}
