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

//! Stake-weighted ticket sortition selecting the participants of the next
//! group.
//!
//! Every staker may submit one ticket per virtual staker it owns. Tickets
//! are deterministic hashes of the round seed, so none of them is known
//! before the seed is, and the `group_size` lowest tickets win once the
//! submission window closes.

mod pool;


pub use pool::{InsertOutcome, TicketPool};

use crate::ledger::StakeLedger;
use beacon_primitives::{
    Address, BlockNumber, U256,
    utils::{keccak256_iter, u256_from_hash, u256_to_be_bytes},
};
use parity_scale_codec::{Decode, Encode};
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SortitionError {
    #[error("No group selection round in progress")]
    NoRoundInProgress,
    #[error("Ticket submission window is closed")]
    SubmissionWindowClosed,
    #[error("Ticket submission window is still open")]
    SubmissionWindowOpen,
    #[error("Invalid ticket")]
    InvalidTicket,
    #[error("Duplicate ticket")]
    DuplicateTicket,
}

/// Candidacy of one virtual staker for the next group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Encode, Decode)]
pub struct Ticket {
    pub value: U256,
    pub owner: Address,
    /// 1-based index of the virtual staker within the owner's weight.
    pub virtual_index: u64,
}

impl Ticket {
    /// `keccak256(seed || owner || virtual_index)` read as a big-endian number.
    pub fn compute_value(seed: &U256, owner: &Address, virtual_index: u64) -> U256 {
        let seed = u256_to_be_bytes(seed);
        let index = virtual_index.to_be_bytes();

        u256_from_hash(keccak256_iter([&seed[..], owner.as_ref(), &index[..]]))
    }

    /// Builds the valid ticket of `owner`'s virtual staker for `seed`.
    pub fn new(seed: &U256, owner: Address, virtual_index: u64) -> Self {
        Self {
            value: Self::compute_value(seed, &owner, virtual_index),
            owner,
            virtual_index,
        }
    }
}

/// Sortition round state.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub struct SortitionRound {
    pub seed: U256,
    pub started_at: BlockNumber,
    pub pool: TicketPool,
    /// Virtual stakers that already submitted, evicted or rejected ones included.
    pub submitted: BTreeSet<(Address, u64)>,
}

/// Ticket sortition engine.
#[derive(Clone, Debug)]
pub struct TicketSortition {
    group_size: u32,
    submission_timeout: BlockNumber,
    round: Option<SortitionRound>,
}

impl TicketSortition {
    pub fn new(group_size: u32, submission_timeout: BlockNumber) -> Self {
        Self {
            group_size,
            submission_timeout,
            round: None,
        }
    }

    pub fn round(&self) -> Option<&SortitionRound> {
        self.round.as_ref()
    }

    pub fn is_round_in_progress(&self) -> bool {
        self.round.is_some()
    }

    /// First block at which tickets are no longer accepted.
    pub fn submission_end(&self) -> Option<BlockNumber> {
        self.round
            .as_ref()
            .map(|round| round.started_at.saturating_add(self.submission_timeout))
    }

    /// Discards tickets of any previous round and opens submissions for `seed`.
    pub fn start_round(&mut self, seed: U256, now: BlockNumber) {
        log::info!("Starting group selection round at block {now} with seed {seed:#x}");

        self.round = Some(SortitionRound {
            seed,
            started_at: now,
            pool: TicketPool::new(self.group_size),
            submitted: BTreeSet::new(),
        });
    }

    /// Closes the round, dropping its tickets.
    pub fn finish_round(&mut self) -> Option<SortitionRound> {
        self.round.take()
    }

    pub fn submit_ticket(
        &mut self,
        ledger: &impl StakeLedger,
        value: U256,
        owner: Address,
        virtual_index: u64,
        now: BlockNumber,
    ) -> Result<InsertOutcome, SortitionError> {
        let end = self.submission_end();
        let round = self
            .round
            .as_mut()
            .ok_or(SortitionError::NoRoundInProgress)?;

        if end.is_some_and(|end| now >= end) {
            return Err(SortitionError::SubmissionWindowClosed);
        }

        let weight = ledger.weight_of(&owner);
        if virtual_index == 0 || virtual_index > weight {
            log::debug!(
                "Ticket of {owner} rejected: virtual index {virtual_index} out of weight {weight}"
            );
            return Err(SortitionError::InvalidTicket);
        }

        if value != Ticket::compute_value(&round.seed, &owner, virtual_index) {
            log::debug!("Ticket of {owner} rejected: value doesn't match round seed");
            return Err(SortitionError::InvalidTicket);
        }

        if !round.submitted.insert((owner, virtual_index)) {
            return Err(SortitionError::DuplicateTicket);
        }

        let outcome = round.pool.insert(Ticket {
            value,
            owner,
            virtual_index,
        });

        match outcome {
            InsertOutcome::AcceptedEvicting(evicted) => log::debug!(
                "Ticket {value:#x} of {owner} evicted ticket {:#x} of {}",
                evicted.value,
                evicted.owner
            ),
            InsertOutcome::Rejected => {
                log::debug!("Ticket {value:#x} of {owner} is above the full pool")
            }
            InsertOutcome::Accepted => {}
        }

        Ok(outcome)
    }

    /// Winning tickets, lowest first. Available once submissions are closed.
    pub fn selected_tickets(&self, now: BlockNumber) -> Result<Vec<Ticket>, SortitionError> {
        let round = self
            .round
            .as_ref()
            .ok_or(SortitionError::NoRoundInProgress)?;

        if self.submission_end().is_some_and(|end| now < end) {
            return Err(SortitionError::SubmissionWindowOpen);
        }

        Ok(round.pool.ordered())
    }

    /// Owners of the winning tickets, lowest ticket first.
    pub fn selected_participants(&self, now: BlockNumber) -> Result<Vec<Address>, SortitionError> {
        self.selected_tickets(now)
            .map(|tickets| tickets.into_iter().map(|ticket| ticket.owner).collect())
    }
}
