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

//! Registry of groups formed by the beacon.
//!
//! Groups are appended in registration order and never removed. Groups
//! below `expired_offset` are expired; the offset is only moved when a group
//! is selected, so `Expired` and `Stale` are always derived from the current
//! height. Terminated groups are tracked by position and skipped by
//! selection and by the active-group counts.


use crate::{config::BeaconConfig, ledger::StakeLedger};
use beacon_bls::PublicKey;
use beacon_primitives::{Address, BlockNumber, U256};
use parity_scale_codec::{Decode, Encode};
use std::collections::BTreeSet;
use thiserror::Error;

/// Position of a group in the registry.
pub type GroupIndex = u32;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    #[error("No active groups")]
    NoActiveGroups,
    #[error("Group already registered")]
    GroupAlreadyRegistered,
    #[error("Unknown group")]
    UnknownGroup,
    #[error("Group is not stale yet")]
    GroupNotStale,
    #[error("Group already terminated")]
    GroupAlreadyTerminated,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupState {
    Active,
    Expired,
    Stale,
    Terminated,
}

/// Time parameters of the group lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Encode, Decode)]
pub struct GroupLifecycle {
    pub group_active_time: BlockNumber,
    pub active_groups_threshold: u32,
    pub relay_entry_timeout: BlockNumber,
}

impl From<&BeaconConfig> for GroupLifecycle {
    fn from(config: &BeaconConfig) -> Self {
        Self {
            group_active_time: config.group_active_time,
            active_groups_threshold: u32::try_from(config.active_groups_threshold)
                .unwrap_or(u32::MAX),
            relay_entry_timeout: config.relay_entry_timeout,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub struct GroupRecord {
    pub public_key: PublicKey,
    pub members: Vec<Address>,
    pub registration_height: BlockNumber,
    /// Reward accumulated by every seat of the group.
    pub member_reward: u128,
    /// Seats whose reward has been withdrawn.
    pub withdrawn_seats: BTreeSet<u32>,
    /// Entries the group has been asked to sign.
    pub requested_entries: BTreeSet<U256>,
}

#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub struct GroupRegistry {
    lifecycle: GroupLifecycle,
    groups: Vec<GroupRecord>,
    expired_offset: GroupIndex,
    terminated: BTreeSet<GroupIndex>,
}

impl GroupRegistry {
    pub fn new(lifecycle: GroupLifecycle) -> Self {
        Self {
            lifecycle,
            groups: Vec::new(),
            expired_offset: 0,
            terminated: BTreeSet::new(),
        }
    }

    pub fn lifecycle(&self) -> &GroupLifecycle {
        &self.lifecycle
    }

    /// Total number of registered groups, including expired and terminated ones.
    pub fn number_of_groups(&self) -> usize {
        self.groups.len()
    }

    pub fn expired_offset(&self) -> GroupIndex {
        self.expired_offset
    }

    pub fn group(&self, index: GroupIndex) -> Option<&GroupRecord> {
        self.groups.get(index as usize)
    }

    pub fn index_of(&self, public_key: &PublicKey) -> Option<GroupIndex> {
        self.groups
            .iter()
            .position(|group| &group.public_key == public_key)
            .map(|index| index as GroupIndex)
    }

    pub fn get_group_members(&self, public_key: &PublicKey) -> Result<&[Address], RegistryError> {
        self.index_of(public_key)
            .and_then(|index| self.group(index))
            .map(|group| group.members.as_slice())
            .ok_or(RegistryError::UnknownGroup)
    }

    pub fn is_terminated(&self, index: GroupIndex) -> bool {
        self.terminated.contains(&index)
    }

    /// Whether any group can still be selected.
    pub fn has_active_groups(&self) -> bool {
        self.number_of_active_groups() > 0
    }

    pub fn register(
        &mut self,
        public_key: PublicKey,
        members: Vec<Address>,
        now: BlockNumber,
    ) -> Result<GroupIndex, RegistryError> {
        if self.index_of(&public_key).is_some() {
            return Err(RegistryError::GroupAlreadyRegistered);
        }

        let index = self.groups.len() as GroupIndex;
        log::info!(
            "Registering group #{index} {public_key:?} with {} members at block {now}",
            members.len()
        );

        self.groups.push(GroupRecord {
            public_key,
            members,
            registration_height: now,
            member_reward: 0,
            withdrawn_seats: BTreeSet::new(),
            requested_entries: BTreeSet::new(),
        });

        Ok(index)
    }

    fn is_time_expired(&self, index: GroupIndex, now: BlockNumber) -> bool {
        self.group(index).is_some_and(|group| {
            now > group
                .registration_height
                .saturating_add(self.lifecycle.group_active_time)
        })
    }

    fn is_time_stale(&self, index: GroupIndex, now: BlockNumber) -> bool {
        self.group(index).is_some_and(|group| {
            now > group
                .registration_height
                .saturating_add(self.lifecycle.group_active_time)
                .saturating_add(self.lifecycle.relay_entry_timeout)
        })
    }

    /// Non-terminated groups at or above `offset`.
    fn count_active_from(&self, offset: GroupIndex) -> u32 {
        let total = (self.groups.len() as u32).saturating_sub(offset);
        total - self.terminated.range(offset..).count() as u32
    }

    /// Offset the expiration cursor would move to at `now`.
    ///
    /// Moves past terminated groups and past time-expired ones for as long as
    /// more than `active_groups_threshold` groups stay active.
    pub fn projected_expired_offset(&self, now: BlockNumber) -> GroupIndex {
        let mut offset = self.expired_offset;
        let mut active = self.count_active_from(offset);

        while (offset as usize) < self.groups.len() {
            if self.is_terminated(offset) {
                offset += 1;
            } else if active > self.lifecycle.active_groups_threshold
                && self.is_time_expired(offset, now)
            {
                offset += 1;
                active -= 1;
            } else {
                break;
            }
        }

        offset
    }

    pub fn update_expiration_cursor(&mut self, now: BlockNumber) {
        let offset = self.projected_expired_offset(now);
        if offset != self.expired_offset {
            log::debug!(
                "Expired groups offset moved from {} to {offset}",
                self.expired_offset
            );
            self.expired_offset = offset;
        }
    }

    /// Non-terminated groups the cursor hasn't passed yet.
    pub fn number_of_active_groups(&self) -> u32 {
        self.count_active_from(self.expired_offset)
    }

    /// State of the group as of the last cursor update. A group is only
    /// expired once the cursor has moved past it, however old it is.
    pub fn group_state(&self, index: GroupIndex, now: BlockNumber) -> Option<GroupState> {
        self.group(index)?;

        let state = if self.is_terminated(index) {
            GroupState::Terminated
        } else if index >= self.expired_offset {
            GroupState::Active
        } else if self.is_time_stale(index, now) {
            GroupState::Stale
        } else {
            GroupState::Expired
        };

        Some(state)
    }

    /// Whether the group can no longer be expected to sign anything. Unknown
    /// groups are stale.
    pub fn is_stale(&self, public_key: &PublicKey, now: BlockNumber) -> bool {
        let Some(index) = self.index_of(public_key) else {
            return true;
        };

        match self.group_state(index, now) {
            Some(GroupState::Stale) | None => true,
            Some(GroupState::Terminated) => self.is_time_stale(index, now),
            Some(GroupState::Active | GroupState::Expired) => false,
        }
    }

    /// Picks the group answering a request seeded with `beacon_value`.
    pub fn select_group(
        &mut self,
        beacon_value: U256,
        now: BlockNumber,
    ) -> Result<GroupIndex, RegistryError> {
        self.update_expiration_cursor(now);

        let active = self.number_of_active_groups();
        if active == 0 {
            return Err(RegistryError::NoActiveGroups);
        }

        let mut remaining = (beacon_value % U256::from(active)).low_u32();
        let mut index = self.expired_offset;
        loop {
            if !self.is_terminated(index) {
                if remaining == 0 {
                    break;
                }
                remaining -= 1;
            }
            index += 1;
        }

        log::debug!("Selected group #{index} out of {active} active");

        Ok(index)
    }

    /// Permanently excludes the group from selection.
    pub fn terminate(&mut self, index: GroupIndex, now: BlockNumber) -> Result<(), RegistryError> {
        if self.group(index).is_none() {
            return Err(RegistryError::UnknownGroup);
        }
        if !self.terminated.insert(index) {
            return Err(RegistryError::GroupAlreadyTerminated);
        }

        log::warn!("Group #{index} terminated at block {now}");

        self.update_expiration_cursor(now);

        // Bring expired groups back if termination broke the active floor.
        // Stale groups stay out: older groups are stale too, so stop there.
        let mut active = self.number_of_active_groups();
        let mut candidate = self.expired_offset;
        while active < self.lifecycle.active_groups_threshold && candidate > 0 {
            candidate -= 1;
            if self.is_terminated(candidate) {
                continue;
            }
            if self.is_time_stale(candidate, now) {
                break;
            }

            self.expired_offset = candidate;
            active += 1;
        }

        Ok(())
    }

    /// Remembers that the group was asked to sign `entry`.
    pub fn record_requested_entry(&mut self, index: GroupIndex, entry: U256) {
        if let Some(group) = self.groups.get_mut(index as usize) {
            group.requested_entries.insert(entry);
        }
    }

    pub fn credit_member_reward(&mut self, index: GroupIndex, amount: u128) {
        if let Some(group) = self.groups.get_mut(index as usize) {
            group.member_reward = group.member_reward.saturating_add(amount);
        }
    }

    /// Pays `member` the reward of each of its seats in a stale group.
    pub fn withdraw_group_member_rewards(
        &mut self,
        ledger: &mut impl StakeLedger,
        member: Address,
        public_key: &PublicKey,
        now: BlockNumber,
    ) -> Result<u128, RegistryError> {
        let index = self
            .index_of(public_key)
            .ok_or(RegistryError::UnknownGroup)?;

        if self.is_terminated(index) {
            return Err(RegistryError::GroupAlreadyTerminated);
        }
        if !self.is_stale(public_key, now) {
            return Err(RegistryError::GroupNotStale);
        }

        let group = &mut self.groups[index as usize];
        let seats: Vec<u32> = group
            .members
            .iter()
            .enumerate()
            .filter(|(seat, address)| {
                **address == member && !group.withdrawn_seats.contains(&(*seat as u32))
            })
            .map(|(seat, _)| seat as u32)
            .collect();

        let amount = group.member_reward.saturating_mul(seats.len() as u128);
        group.withdrawn_seats.extend(seats);

        if amount > 0 {
            log::debug!("Paying {amount} of group #{index} rewards to {member}");
            ledger.pay_reward(&member, amount);
        }

        Ok(amount)
    }
}
