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

//! Penalties for protocol violations.
//!
//! A group proven to sign a value it was never asked to sign is terminated
//! and loses the whole stake of its members. A group missing a relay entry
//! deadline is terminated with a fixed penalty per member. In both cases the
//! reporter receives `tattletale_reward_percent` of what was slashed.
//! Disqualified DKG participants only lose the disqualification penalty.

use crate::{
    config::BeaconConfig,
    ledger::StakeLedger,
    registry::{GroupIndex, GroupRegistry, RegistryError},
};
use beacon_bls::{BlsError, PublicKey};
use beacon_primitives::{Address, BlockNumber, U256};
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SlashingError {
    #[error("Signature doesn't prove unauthorized signing")]
    InvalidSignature,
    #[error("Message was requested from the group")]
    AuthorizedMessage,
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Bls(#[from] BlsError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlashingReport {
    pub group_index: GroupIndex,
    /// Total amount taken from the members.
    pub slashed: u128,
    /// Part of `slashed` paid to the reporter.
    pub reward: u128,
}

#[derive(Clone, Debug)]
pub struct SlashingHook {
    dkg_disqualification_penalty: u128,
    relay_entry_timeout_penalty: u128,
    tattletale_reward_percent: u8,
}

impl SlashingHook {
    pub fn new(config: &BeaconConfig) -> Self {
        Self {
            dkg_disqualification_penalty: config.dkg_disqualification_penalty,
            relay_entry_timeout_penalty: config.relay_entry_timeout_penalty,
            tattletale_reward_percent: config.tattletale_reward_percent,
        }
    }

    fn tattletale_reward(&self, slashed: u128) -> u128 {
        slashed.saturating_mul(self.tattletale_reward_percent as u128) / 100
    }

    /// Terminates `group` if `signature` is its valid signature of a
    /// `message` it was never asked to sign.
    pub fn report_unauthorized_signing(
        &self,
        registry: &mut GroupRegistry,
        ledger: &mut impl StakeLedger,
        group: &PublicKey,
        message: &[u8],
        signature: &[u8],
        reporter: Address,
        now: BlockNumber,
    ) -> Result<SlashingReport, SlashingError> {
        let index = registry
            .index_of(group)
            .ok_or(RegistryError::UnknownGroup)?;

        if registry.is_terminated(index) {
            return Err(RegistryError::GroupAlreadyTerminated.into());
        }

        let requested = registry
            .group(index)
            .is_some_and(|record| {
                message.len() == 32
                    && record
                        .requested_entries
                        .contains(&U256::from_big_endian(message))
            });
        if requested {
            return Err(SlashingError::AuthorizedMessage);
        }

        if !beacon_bls::verify(group, message, signature)? {
            return Err(SlashingError::InvalidSignature);
        }

        log::warn!("Group #{index} proven to sign unauthorized message, reported by {reporter}");

        registry.terminate(index, now)?;

        let members = Self::distinct_members(registry, index);
        let slashed = members
            .iter()
            .map(|member| {
                let stake = ledger.stake_of(member);
                ledger.slash(member, stake)
            })
            .fold(0u128, u128::saturating_add);

        Ok(self.reward_reporter(ledger, index, slashed, reporter))
    }

    /// Slashes the disqualification penalty from each of `disqualified`.
    pub fn report_dkg_disqualification(
        &self,
        ledger: &mut impl StakeLedger,
        disqualified: &[Address],
    ) -> u128 {
        disqualified
            .iter()
            .map(|member| {
                let slashed = ledger.slash(member, self.dkg_disqualification_penalty);
                log::warn!("Slashed {slashed} from {member} disqualified in DKG");
                slashed
            })
            .fold(0u128, u128::saturating_add)
    }

    /// Terminates a group that missed a relay entry deadline.
    pub fn report_relay_entry_timeout(
        &self,
        registry: &mut GroupRegistry,
        ledger: &mut impl StakeLedger,
        index: GroupIndex,
        reporter: Address,
        now: BlockNumber,
    ) -> Result<SlashingReport, SlashingError> {
        registry.terminate(index, now)?;

        log::warn!("Group #{index} missed its relay entry, reported by {reporter}");

        let members = Self::distinct_members(registry, index);
        let slashed = members
            .iter()
            .map(|member| ledger.slash(member, self.relay_entry_timeout_penalty))
            .fold(0u128, u128::saturating_add);

        Ok(self.reward_reporter(ledger, index, slashed, reporter))
    }

    fn distinct_members(registry: &GroupRegistry, index: GroupIndex) -> BTreeSet<Address> {
        registry
            .group(index)
            .map(|group| group.members.iter().copied().collect())
            .unwrap_or_default()
    }

    fn reward_reporter(
        &self,
        ledger: &mut impl StakeLedger,
        group_index: GroupIndex,
        slashed: u128,
        reporter: Address,
    ) -> SlashingReport {
        let reward = self.tattletale_reward(slashed);
        if reward > 0 {
            ledger.pay_reward(&reporter, reward);
        }

        log::info!("Slashed {slashed} from group #{group_index}, {reward} paid to {reporter}");

        SlashingReport {
            group_index,
            slashed,
            reward,
        }
    }
}
