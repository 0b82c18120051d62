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

//! Interfaces of the collaborators the beacon calls into.

use beacon_primitives::Address;

/// Stake accounting owned by the staking layer.
pub trait StakeLedger {
    /// Number of virtual stakers, i.e. tickets, `staker` may submit per round.
    fn weight_of(&self, staker: &Address) -> u64;

    /// Current stake of `staker`.
    fn stake_of(&self, staker: &Address) -> u128;

    /// Slashes up to `amount` of the stake of `staker`, returning what was
    /// actually taken.
    fn slash(&mut self, staker: &Address, amount: u128) -> u128;

    /// Pays `amount` to `beneficiary`.
    fn pay_reward(&mut self, beneficiary: &Address, amount: u128);
}

/// Economic trigger deciding whether a fresh entry should start forming a
/// new group.
pub trait GroupCreationGate {
    fn should_create_group(&self) -> bool;
}

impl GroupCreationGate for bool {
    fn should_create_group(&self) -> bool {
        *self
    }
}
