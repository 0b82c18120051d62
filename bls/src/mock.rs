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

//! Key material for tests: single keys and Shamir-shared group keys.

use crate::{PublicKey, ShareIndex, Signature, verify};
use ark_bls12_381::{Fr, G1Projective, G2Affine};
use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::{One, Zero};
use ark_std::{UniformRand, rand::Rng};

/// BLS secret scalar.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SecretKey(pub Fr);

impl SecretKey {
    /// Samples a non-zero secret.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        loop {
            let scalar = Fr::rand(rng);
            if !scalar.is_zero() {
                return Self(scalar);
            }
        }
    }

    /// Public key `g2 * sk`.
    pub fn public_key(&self) -> PublicKey {
        let point = (G2Affine::generator() * self.0).into_affine();
        verify::encode_public_key(point).expect("valid point always encodes")
    }

    /// Signature `H(message) * sk`.
    pub fn sign(&self, message: &[u8]) -> Signature {
        let hashed: G1Projective = verify::hash_to_point(message)
            .expect("hash to curve is infallible for the fixed DST")
            .into();
        verify::encode_signature((hashed * self.0).into_affine())
            .expect("valid point always encodes")
    }
}

/// Group secret shared with a random polynomial of degree `threshold - 1`.
///
/// Member `i` (1-based) holds `f(i)`; the group secret is `f(0)`.
#[derive(Clone, Debug)]
pub struct ThresholdKeys {
    coefficients: Vec<Fr>,
    size: usize,
}

impl ThresholdKeys {
    /// Generates shares for `size` members, any `threshold` of which can sign.
    pub fn generate<R: Rng + ?Sized>(size: usize, threshold: usize, rng: &mut R) -> Self {
        assert!(threshold > 0 && threshold <= size, "invalid threshold");

        let mut coefficients = vec![SecretKey::random(rng).0];
        coefficients.extend((1..threshold).map(|_| Fr::rand(rng)));

        Self { coefficients, size }
    }

    /// Number of members holding a share.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Group secret.
    pub fn group_secret(&self) -> SecretKey {
        SecretKey(self.coefficients[0])
    }

    /// Group public key.
    pub fn public_key(&self) -> PublicKey {
        self.group_secret().public_key()
    }

    /// Secret share of member `index`.
    pub fn share(&self, index: ShareIndex) -> SecretKey {
        assert!(
            index > 0 && usize::from(index) <= self.size,
            "share index out of range"
        );

        let x = Fr::from(index as u64);
        let mut power = Fr::one();
        let mut value = Fr::zero();
        for coefficient in &self.coefficients {
            value += *coefficient * power;
            power *= x;
        }

        SecretKey(value)
    }

    /// Whole-group signature, as produced after members combine their shares.
    pub fn sign(&self, message: &[u8]) -> Signature {
        self.group_secret().sign(message)
    }

    /// Concatenated signature shares of `signers` over `message`.
    pub fn sign_shares(&self, signers: &[ShareIndex], message: &[u8]) -> Vec<u8> {
        signers
            .iter()
            .flat_map(|&index| self.share(index).sign(message).0)
            .collect()
    }
}

/// Public key of an independent random secret, for "wrong group" cases.
pub fn random_public_key<R: Rng + ?Sized>(rng: &mut R) -> PublicKey {
    SecretKey::random(rng).public_key()
}

