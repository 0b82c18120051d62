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

use beacon_bls::{PublicKey, ShareIndex};
use beacon_primitives::utils::keccak256_iter;
use parity_scale_codec::{Decode, Encode};
use std::collections::BTreeSet;

/// Participants excluded from the group by a DKG result, by 1-based position
/// in the selected participant list.
///
/// Inactive participants didn't take part in key generation and are only
/// excluded. Disqualified ones misbehaved during it and are also penalized.
/// A position listed in both sets counts as disqualified.
#[derive(Clone, Debug, Default, PartialEq, Eq, Encode, Decode)]
pub struct MisbehavedMembers {
    pub inactive: BTreeSet<ShareIndex>,
    pub disqualified: BTreeSet<ShareIndex>,
}

impl MisbehavedMembers {
    pub fn new(
        inactive: impl IntoIterator<Item = ShareIndex>,
        disqualified: impl IntoIterator<Item = ShareIndex>,
    ) -> Self {
        Self {
            inactive: inactive.into_iter().collect(),
            disqualified: disqualified.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inactive.is_empty() && self.disqualified.is_empty()
    }

    pub fn is_misbehaved(&self, position: ShareIndex) -> bool {
        self.inactive.contains(&position) || self.disqualified.contains(&position)
    }

    /// Positions of every excluded participant.
    pub fn misbehaved(&self) -> BTreeSet<ShareIndex> {
        self.inactive.union(&self.disqualified).copied().collect()
    }

    /// Highest listed position, if any.
    pub fn max_position(&self) -> Option<ShareIndex> {
        self.inactive
            .last()
            .copied()
            .max(self.disqualified.last().copied())
    }

    /// Bit `i - 1` of the result is set for every listed position `i`.
    pub fn bitmap(positions: &BTreeSet<ShareIndex>, participants: usize) -> Vec<u8> {
        let mut bitmap = vec![0u8; participants.div_ceil(8)];
        for &position in positions {
            let bit = usize::from(position).wrapping_sub(1);
            if let Some(byte) = bitmap.get_mut(bit / 8) {
                *byte |= 1 << (bit % 8);
            }
        }
        bitmap
    }
}

/// Message the group signs to approve a DKG result:
/// `keccak256(public_key || inactive_bitmap || disqualified_bitmap)`.
pub fn result_digest(
    public_key: &PublicKey,
    misbehaved: &MisbehavedMembers,
    participants: usize,
) -> [u8; 32] {
    let inactive = MisbehavedMembers::bitmap(&misbehaved.inactive, participants);
    let disqualified = MisbehavedMembers::bitmap(&misbehaved.disqualified, participants);

    keccak256_iter([public_key.as_ref(), &inactive[..], &disqualified[..]])
}
