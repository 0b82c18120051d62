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

//! In-memory collaborators for tests.

use crate::ledger::StakeLedger;
use beacon_primitives::Address;
use std::collections::BTreeMap;

/// Stake ledger keeping stakes and paid out balances in maps.
#[derive(Clone, Debug, Default)]
pub struct InMemoryStakeLedger {
    /// Stake backing one ticket.
    pub minimum_stake: u128,
    pub stakes: BTreeMap<Address, u128>,
    pub balances: BTreeMap<Address, u128>,
}

impl InMemoryStakeLedger {
    pub fn new(minimum_stake: u128) -> Self {
        Self {
            minimum_stake,
            ..Default::default()
        }
    }

    pub fn with_stake(mut self, staker: Address, stake: u128) -> Self {
        self.stakes.insert(staker, stake);
        self
    }

    pub fn balance_of(&self, account: &Address) -> u128 {
        self.balances.get(account).copied().unwrap_or_default()
    }
}

impl StakeLedger for InMemoryStakeLedger {
    fn weight_of(&self, staker: &Address) -> u64 {
        if self.minimum_stake == 0 {
            return 0;
        }

        let weight = self.stake_of(staker) / self.minimum_stake;
        weight.try_into().unwrap_or(u64::MAX)
    }

    fn stake_of(&self, staker: &Address) -> u128 {
        self.stakes.get(staker).copied().unwrap_or_default()
    }

    fn slash(&mut self, staker: &Address, amount: u128) -> u128 {
        let Some(stake) = self.stakes.get_mut(staker) else {
            return 0;
        };

        let slashed = amount.min(*stake);
        *stake -= slashed;
        slashed
    }

    fn pay_reward(&mut self, beneficiary: &Address, amount: u128) {
        *self.balances.entry(*beneficiary).or_default() += amount;
    }
}
