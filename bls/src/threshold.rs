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

//! Threshold signature shares.

use crate::{BlsError, SIGNATURE_LENGTH, ShareIndex, Signature, verify};
use ark_bls12_381::{Fr, G1Projective};
use ark_ec::CurveGroup;
use ark_ff::{Field, One, Zero};
use std::collections::BTreeSet;

/// Splits concatenated signature shares, one per signer index.
pub fn split_signature_shares(
    signatures: &[u8],
    signers: usize,
) -> Result<Vec<&[u8]>, BlsError> {
    let expected = signers.saturating_mul(SIGNATURE_LENGTH);
    if signers == 0 || signatures.len() != expected {
        return Err(BlsError::MalformedSignatures {
            actual: signatures.len(),
            expected,
        });
    }

    Ok(signatures.chunks_exact(SIGNATURE_LENGTH).collect())
}

/// Lagrange coefficient at `x = 0` of the share at `index` within `indices`.
fn lagrange_coefficient(index: ShareIndex, indices: &[ShareIndex]) -> Result<Fr, BlsError> {
    let xi = Fr::from(index as u64);
    let mut numerator = Fr::one();
    let mut denominator = Fr::one();

    for &other in indices.iter().filter(|&&other| other != index) {
        let xj = Fr::from(other as u64);
        numerator *= xj;
        denominator *= xj - xi;
    }

    denominator
        .inverse()
        .map(|inverse| numerator * inverse)
        .ok_or(BlsError::DuplicateShareIndex(index))
}

/// Interpolates per-signer signature shares into one group signature.
///
/// `signatures` holds one compressed share per entry of `indices`, in the
/// same order. Any `threshold` or more consistent shares recover the same
/// group signature, which verifies against the group public key; whether it
/// does is left to a single [`verify`] call by the caller.
pub fn combine_signature_shares(
    indices: &[ShareIndex],
    signatures: &[u8],
) -> Result<Signature, BlsError> {
    if indices.is_empty() {
        return Err(BlsError::NoShares);
    }

    let mut seen = BTreeSet::new();
    for &index in indices {
        if index == 0 {
            return Err(BlsError::ZeroShareIndex);
        }
        if !seen.insert(index) {
            return Err(BlsError::DuplicateShareIndex(index));
        }
    }

    let shares = split_signature_shares(signatures, indices.len())?;

    let mut combined = G1Projective::zero();
    for (&index, share) in indices.iter().zip(shares) {
        let point = verify::decode_signature(share)?;
        combined += point * lagrange_coefficient(index, indices)?;
    }

    verify::encode_signature(combined.into_affine())
}
