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

use crate::{BlsError, DST_G1, PublicKey, SIGNATURE_LENGTH, Signature};
use ark_bls12_381::{Bls12_381, G1Affine, G1Projective, G2Affine};
use ark_ec::{
    AffineRepr,
    bls12::Bls12Config,
    hashing::{HashToCurve, curve_maps::wb::WBMap, map_to_curve_hasher::MapToCurveBasedHasher},
    pairing::Pairing,
};
use ark_ff::fields::field_hashers::DefaultFieldHasher;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};

type G1WBMap = WBMap<<ark_bls12_381::Config as Bls12Config>::G1Config>;
type G1Hasher = MapToCurveBasedHasher<G1Projective, DefaultFieldHasher<sha2::Sha256>, G1WBMap>;

/// Deterministically maps `message` to a G1 point.
pub fn hash_to_point(message: &[u8]) -> Result<G1Affine, BlsError> {
    let hasher = G1Hasher::new(DST_G1).map_err(|err| {
        log::debug!("Failed to create `MapToCurveBasedHasher`: {err:?}");
        BlsError::HashToCurve
    })?;

    hasher.hash(message).map_err(|err| {
        log::debug!("Failed to map message to G1: {err:?}");
        BlsError::HashToCurve
    })
}

/// Decodes a compressed G2 public key.
///
/// The point at infinity is rejected: it would make any signature equal to
/// the point at infinity valid for every message.
pub fn decode_public_key(key: &PublicKey) -> Result<G2Affine, BlsError> {
    let point = G2Affine::deserialize_compressed(&key.0[..]).map_err(|err| {
        log::debug!("Failed to decode public key {key:?}: {err}");
        BlsError::InvalidPoint
    })?;

    if point.is_zero() {
        return Err(BlsError::InvalidPoint);
    }

    Ok(point)
}

/// Decodes a compressed G1 signature from arbitrary bytes.
pub fn decode_signature(bytes: &[u8]) -> Result<G1Affine, BlsError> {
    if bytes.len() != SIGNATURE_LENGTH {
        log::debug!("Signature has unexpected length {}", bytes.len());
        return Err(BlsError::InvalidPoint);
    }

    let point = G1Affine::deserialize_compressed(bytes).map_err(|err| {
        log::debug!("Failed to decode signature: {err}");
        BlsError::InvalidPoint
    })?;

    if point.is_zero() {
        return Err(BlsError::InvalidPoint);
    }

    Ok(point)
}

pub(crate) fn encode_signature(point: G1Affine) -> Result<Signature, BlsError> {
    let mut bytes = [0u8; SIGNATURE_LENGTH];
    point
        .serialize_compressed(&mut bytes[..])
        .map_err(|_| BlsError::InvalidPoint)?;

    Ok(Signature(bytes))
}

#[cfg(any(test, feature = "mock"))]
pub(crate) fn encode_public_key(point: G2Affine) -> Result<PublicKey, BlsError> {
    let mut bytes = [0u8; crate::PUBLIC_KEY_LENGTH];
    point
        .serialize_compressed(&mut bytes[..])
        .map_err(|_| BlsError::InvalidPoint)?;

    Ok(PublicKey(bytes))
}

/// Checks `e(signature, g2) == e(H(message), public_key)`.
///
/// Malformed inputs are errors; a well-formed signature that doesn't match
/// is `Ok(false)`.
pub fn verify(public_key: &PublicKey, message: &[u8], signature: &[u8]) -> Result<bool, BlsError> {
    let public_key = decode_public_key(public_key)?;
    let signature = decode_signature(signature)?;
    let hashed = hash_to_point(message)?;

    let lhs = Bls12_381::pairing(signature, G2Affine::generator());
    let rhs = Bls12_381::pairing(hashed, public_key);

    Ok(lhs == rhs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PUBLIC_KEY_LENGTH, mock::SecretKey};

    fn init_logger() {
        let _ = tracing_subscriber::fmt::try_init();
    }

    #[test]
    fn hash_to_point_is_deterministic() {
        init_logger();

        let a = hash_to_point(b"entry").unwrap();
        let b = hash_to_point(b"entry").unwrap();
        let c = hash_to_point(b"other entry").unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.is_on_curve());
        assert!(a.is_in_correct_subgroup_assuming_on_curve());
    }

    #[test]
    fn valid_signature_verifies() {
        init_logger();

        let mut rng = ark_std::test_rng();
        let secret = SecretKey::random(&mut rng);
        let signature = secret.sign(b"previous entry");

        assert_eq!(
            verify(&secret.public_key(), b"previous entry", &signature.0),
            Ok(true)
        );
    }

    #[test]
    fn mismatching_signature_is_rejected_without_error() {
        init_logger();

        let mut rng = ark_std::test_rng();
        let secret = SecretKey::random(&mut rng);
        let other = SecretKey::random(&mut rng);

        let signature = secret.sign(b"previous entry");
        assert_eq!(
            verify(&secret.public_key(), b"another entry", &signature.0),
            Ok(false)
        );
        assert_eq!(
            verify(&other.public_key(), b"previous entry", &signature.0),
            Ok(false)
        );
    }

    #[test]
    fn malformed_points_are_invalid() {
        init_logger();

        let mut rng = ark_std::test_rng();
        let secret = SecretKey::random(&mut rng);
        let signature = secret.sign(b"message");

        assert_eq!(
            verify(&secret.public_key(), b"message", &signature.0[..47]),
            Err(BlsError::InvalidPoint)
        );
        assert_eq!(
            verify(&secret.public_key(), b"message", &[0xffu8; SIGNATURE_LENGTH]),
            Err(BlsError::InvalidPoint)
        );
        assert_eq!(
            verify(&PublicKey([0xffu8; PUBLIC_KEY_LENGTH]), b"message", &signature.0),
            Err(BlsError::InvalidPoint)
        );
        assert_eq!(
            PublicKey::from_slice(&[1u8; 10]),
            Err(BlsError::InvalidPoint)
        );
    }

    #[test]
    fn points_at_infinity_are_rejected() {
        let infinity = encode_signature(<G1Affine as AffineRepr>::zero()).unwrap();
        assert_eq!(decode_signature(&infinity.0), Err(BlsError::InvalidPoint));

        let infinity = encode_public_key(<G2Affine as AffineRepr>::zero()).unwrap();
        assert_eq!(decode_public_key(&infinity), Err(BlsError::InvalidPoint));
    }
}
