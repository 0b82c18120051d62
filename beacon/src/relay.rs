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

//! Relay entry requests and their signatures.

use crate::registry::{GroupIndex, GroupRegistry, RegistryError};
use beacon_bls::{BlsError, PublicKey};
use beacon_primitives::{
    BlockNumber, U256,
    utils::{keccak256, u256_from_hash, u256_to_be_bytes},
};
use parity_scale_codec::{Decode, Encode};
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RelayError {
    #[error("Relay entry request in progress")]
    RequestInProgress,
    #[error("No pending relay entry request")]
    NoPendingRequest,
    #[error("Relay entry timed out at block {deadline}")]
    EntryTimedOut { deadline: BlockNumber },
    #[error("Relay entry has not timed out yet, deadline is block {deadline}")]
    EntryNotTimedOut { deadline: BlockNumber },
    #[error("Invalid relay entry signature")]
    InvalidSignature,
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Bls(#[from] BlsError),
}

/// Request for a new entry, already paid for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Encode, Decode)]
pub struct EntryRequest {
    /// Entry the selected group has to sign.
    pub previous_entry: U256,
    /// Value selecting the group.
    pub seed: U256,
    /// Reward credited to every seat of the signing group.
    pub group_member_reward: u128,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Encode, Decode)]
pub struct PendingRequest {
    pub request: EntryRequest,
    pub group_index: GroupIndex,
    pub group_public_key: PublicKey,
    pub requested_at: BlockNumber,
    /// Last block at which the entry is accepted.
    pub deadline: BlockNumber,
}

impl PendingRequest {
    pub fn is_timed_out(&self, now: BlockNumber) -> bool {
        now > self.deadline
    }
}

/// Entry produced for a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RelayEntry {
    pub entry: U256,
    pub request: EntryRequest,
    pub group_index: GroupIndex,
}

/// Message a group signs for `previous_entry`: its 32 bytes big-endian form.
pub fn entry_message(previous_entry: &U256) -> [u8; 32] {
    u256_to_be_bytes(previous_entry)
}

/// New entry derived from a valid signature.
pub fn entry_from_signature(signature: &[u8]) -> U256 {
    u256_from_hash(keccak256(signature))
}

#[derive(Clone, Debug)]
pub struct RelayEntryCoordinator {
    relay_entry_timeout: BlockNumber,
    pending: Option<PendingRequest>,
}

impl RelayEntryCoordinator {
    pub fn new(relay_entry_timeout: BlockNumber) -> Self {
        Self {
            relay_entry_timeout,
            pending: None,
        }
    }

    /// Request awaiting its entry, including a timed out one nobody reported yet.
    pub fn pending(&self) -> Option<&PendingRequest> {
        self.pending.as_ref()
    }

    pub fn is_request_in_progress(&self, now: BlockNumber) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|pending| !pending.is_timed_out(now))
    }

    pub fn request_entry(
        &mut self,
        registry: &mut GroupRegistry,
        request: EntryRequest,
        now: BlockNumber,
    ) -> Result<PendingRequest, RelayError> {
        if let Some(pending) = &self.pending {
            if !pending.is_timed_out(now) {
                return Err(RelayError::RequestInProgress);
            }

            log::warn!(
                "Abandoning relay entry request for {:#x}: group #{} missed deadline {}",
                pending.request.previous_entry,
                pending.group_index,
                pending.deadline
            );
        }

        self.assign(registry, request, now)
    }

    /// Hands `request` over to a freshly selected group.
    pub fn assign(
        &mut self,
        registry: &mut GroupRegistry,
        request: EntryRequest,
        now: BlockNumber,
    ) -> Result<PendingRequest, RelayError> {
        let group_index = registry.select_group(request.seed, now)?;
        let group_public_key = registry
            .group(group_index)
            .map(|group| group.public_key)
            .ok_or(RegistryError::UnknownGroup)?;

        registry.record_requested_entry(group_index, request.previous_entry);

        let pending = PendingRequest {
            request,
            group_index,
            group_public_key,
            requested_at: now,
            deadline: now.saturating_add(self.relay_entry_timeout),
        };

        log::info!(
            "Group #{group_index} requested to sign entry {:#x} until block {}",
            request.previous_entry,
            pending.deadline
        );

        self.pending = Some(pending);
        Ok(pending)
    }

    pub fn submit_entry(
        &mut self,
        signature: &[u8],
        now: BlockNumber,
    ) -> Result<RelayEntry, RelayError> {
        let pending = self.pending.ok_or(RelayError::NoPendingRequest)?;

        if pending.is_timed_out(now) {
            return Err(RelayError::EntryTimedOut {
                deadline: pending.deadline,
            });
        }

        let message = entry_message(&pending.request.previous_entry);
        if !beacon_bls::verify(&pending.group_public_key, &message, signature)? {
            log::debug!(
                "Rejected relay entry signature for group #{}",
                pending.group_index
            );
            return Err(RelayError::InvalidSignature);
        }

        self.pending = None;

        let entry = entry_from_signature(signature);
        log::info!(
            "Relay entry {entry:#x} produced by group #{}",
            pending.group_index
        );

        Ok(RelayEntry {
            entry,
            request: pending.request,
            group_index: pending.group_index,
        })
    }

    /// Pending request whose deadline has passed.
    pub fn timed_out(&self, now: BlockNumber) -> Result<PendingRequest, RelayError> {
        let pending = self.pending.ok_or(RelayError::NoPendingRequest)?;

        if !pending.is_timed_out(now) {
            return Err(RelayError::EntryNotTimedOut {
                deadline: pending.deadline,
            });
        }

        Ok(pending)
    }

    /// Takes the pending request once its deadline has passed.
    pub fn take_timed_out(&mut self, now: BlockNumber) -> Result<PendingRequest, RelayError> {
        let pending = self.timed_out(now)?;
        self.pending = None;

        Ok(pending)
    }

    /// Drops the pending request if `group` is the one expected to answer it.
    pub fn take_assigned_to(&mut self, group: GroupIndex) -> Option<PendingRequest> {
        self.pending
            .take_if(|pending| pending.group_index == group)
    }
}
