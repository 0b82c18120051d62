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

//! Validation of published DKG results.
//!
//! Key generation itself happens off-chain between the selected
//! participants. Once its time is over, participants get the right to
//! publish the result one after another, `result_publication_block_step`
//! blocks apart, in the order they were selected. A result is accepted when
//! at least `group_threshold` participants signed it with their key shares.

mod misbehavior;

#[cfg(test)]
mod tests;

pub use misbehavior::{MisbehavedMembers, result_digest};

use crate::config::BeaconConfig;
use beacon_bls::{BlsError, PublicKey, SIGNATURE_LENGTH, ShareIndex};
use beacon_primitives::{Address, BlockNumber};
use parity_scale_codec::{Decode, Encode};
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DkgResultError {
    #[error("No DKG result expected")]
    NoResultExpected,
    #[error("DKG result publication timed out")]
    ResultPublicationTimedOut,
    #[error("Submitter is not a selected participant")]
    NotSelectedParticipant,
    #[error("Submitter is not eligible until block {eligible_at}")]
    NotEligibleYet { eligible_at: BlockNumber },
    #[error("Unknown signer index {0}")]
    UnknownSigner(ShareIndex),
    #[error("Duplicate signer index {0}")]
    DuplicateSignerIndex(ShareIndex),
    #[error("Insufficient signatures: {provided} provided, {required} required")]
    InsufficientSignatures { provided: usize, required: usize },
    #[error("Signatures length {actual} doesn't match {expected} bytes")]
    MalformedSignatures { actual: usize, expected: usize },
    #[error("Quorum signature doesn't match the result")]
    InvalidQuorumSignature,
    #[error("Misbehaved member index {0} out of range")]
    MisbehaviorOutOfRange(ShareIndex),
    #[error("Too many misbehaved members: {remaining} left, {required} required")]
    TooManyMisbehaved { remaining: usize, required: usize },
    #[error(transparent)]
    Bls(#[from] BlsError),
}

/// Result of the off-chain key generation as published by a participant.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub struct DkgResult {
    /// 1-based position of the submitter in the selected participant list.
    pub submitter_index: ShareIndex,
    pub group_public_key: PublicKey,
    pub misbehaved: MisbehavedMembers,
    /// Concatenated signature shares over [`result_digest`], one per signer.
    pub signatures: Vec<u8>,
    /// 1-based positions of the signers, in the order of `signatures`.
    pub signing_member_indices: Vec<ShareIndex>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Encode, Decode)]
pub enum DkgRoundState {
    AwaitingResult,
    Accepted,
    /// Nobody published a valid result in time.
    Rejected,
}

#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub struct DkgRound {
    pub participants: Vec<Address>,
    pub publication_start: BlockNumber,
    pub state: DkgRoundState,
}

/// Group produced by an accepted result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AcceptedGroup {
    pub public_key: PublicKey,
    /// Selected participants without the misbehaved ones, in selection order.
    pub members: Vec<Address>,
    /// Participants to penalize, one entry per disqualified position.
    pub disqualified: Vec<Address>,
}

#[derive(Clone, Debug)]
pub struct DkgResultValidator {
    group_threshold: usize,
    block_step: BlockNumber,
    publication_window: BlockNumber,
    round: Option<DkgRound>,
}

impl DkgResultValidator {
    pub fn new(config: &BeaconConfig) -> Self {
        Self {
            group_threshold: config.group_threshold,
            block_step: config.result_publication_block_step,
            publication_window: config.result_publication_window(),
            round: None,
        }
    }

    pub fn round(&self) -> Option<&DkgRound> {
        self.round.as_ref()
    }

    /// Starts awaiting the result of `participants`, unless already doing so.
    pub fn open_round(&mut self, participants: Vec<Address>, publication_start: BlockNumber) {
        if self.round.is_some() {
            return;
        }

        log::debug!(
            "Awaiting DKG result of {} participants from block {publication_start}",
            participants.len()
        );

        self.round = Some(DkgRound {
            participants,
            publication_start,
            state: DkgRoundState::AwaitingResult,
        });
    }

    pub fn close_round(&mut self) -> Option<DkgRound> {
        self.round.take()
    }

    /// First block at which no result is accepted any more.
    pub fn publication_end(&self) -> Option<BlockNumber> {
        self.round
            .as_ref()
            .map(|round| round.publication_start.saturating_add(self.publication_window))
    }

    /// Block from which the participant at `position` may publish.
    pub fn eligible_at(&self, position: ShareIndex) -> Option<BlockNumber> {
        let round = self.round.as_ref()?;
        let turn = BlockNumber::from(position.saturating_sub(1));

        Some(
            round
                .publication_start
                .saturating_add(turn.saturating_mul(self.block_step)),
        )
    }

    /// Current round state, rejecting the round if its window has elapsed.
    pub fn update_state(&mut self, now: BlockNumber) -> Option<DkgRoundState> {
        let end = self.publication_end()?;
        let round = self.round.as_mut()?;

        if round.state == DkgRoundState::AwaitingResult && now >= end {
            log::warn!("DKG result publication timed out at block {end}");
            round.state = DkgRoundState::Rejected;
        }

        Some(round.state)
    }

    pub fn submit_result(
        &mut self,
        submitter: Address,
        result: &DkgResult,
        now: BlockNumber,
    ) -> Result<AcceptedGroup, DkgResultError> {
        match self.update_state(now) {
            Some(DkgRoundState::AwaitingResult) => {}
            Some(DkgRoundState::Rejected) => return Err(DkgResultError::ResultPublicationTimedOut),
            Some(DkgRoundState::Accepted) | None => return Err(DkgResultError::NoResultExpected),
        }

        let Some(round) = self.round.as_ref() else {
            return Err(DkgResultError::NoResultExpected);
        };
        let participants = &round.participants;

        let submitter_position = usize::from(result.submitter_index);
        if submitter_position == 0 || participants.get(submitter_position - 1) != Some(&submitter)
        {
            return Err(DkgResultError::NotSelectedParticipant);
        }

        let eligible_at = self
            .eligible_at(result.submitter_index)
            .ok_or(DkgResultError::NoResultExpected)?;
        if now < eligible_at {
            return Err(DkgResultError::NotEligibleYet { eligible_at });
        }

        self.check_signers(participants.len(), &result.signing_member_indices)?;

        let misbehaved = result.misbehaved.misbehaved();
        if let Some(&position) = misbehaved
            .iter()
            .find(|&&position| position == 0 || usize::from(position) > participants.len())
        {
            return Err(DkgResultError::MisbehaviorOutOfRange(position));
        }

        let remaining = participants.len() - misbehaved.len();
        if remaining < self.group_threshold {
            return Err(DkgResultError::TooManyMisbehaved {
                remaining,
                required: self.group_threshold,
            });
        }

        let expected = result.signing_member_indices.len() * SIGNATURE_LENGTH;
        if result.signatures.len() != expected {
            return Err(DkgResultError::MalformedSignatures {
                actual: result.signatures.len(),
                expected,
            });
        }

        beacon_bls::decode_public_key(&result.group_public_key)?;

        let digest = result_digest(
            &result.group_public_key,
            &result.misbehaved,
            participants.len(),
        );
        let signature = beacon_bls::combine_signature_shares(
            &result.signing_member_indices,
            &result.signatures,
        )?;

        if !beacon_bls::verify(&result.group_public_key, &digest, signature.as_ref())? {
            log::debug!("DKG result of {submitter} carries invalid quorum signature");
            return Err(DkgResultError::InvalidQuorumSignature);
        }

        let members = participants
            .iter()
            .enumerate()
            .filter(|(i, _)| !misbehaved.contains(&position_of(*i)))
            .map(|(_, member)| *member)
            .collect();
        let disqualified = result
            .misbehaved
            .disqualified
            .iter()
            .map(|&position| participants[usize::from(position) - 1])
            .collect();

        let accepted = AcceptedGroup {
            public_key: result.group_public_key,
            members,
            disqualified,
        };

        if let Some(round) = self.round.as_mut() {
            round.state = DkgRoundState::Accepted;
        }

        log::info!(
            "DKG result of {submitter} accepted: group {:?} with {} members",
            accepted.public_key,
            accepted.members.len()
        );

        Ok(accepted)
    }

    fn check_signers(
        &self,
        participants: usize,
        indices: &[ShareIndex],
    ) -> Result<(), DkgResultError> {
        let mut seen = BTreeSet::new();
        for &index in indices {
            if index == 0 || usize::from(index) > participants {
                return Err(DkgResultError::UnknownSigner(index));
            }
            if !seen.insert(index) {
                return Err(DkgResultError::DuplicateSignerIndex(index));
            }
        }

        if indices.len() < self.group_threshold {
            return Err(DkgResultError::InsufficientSignatures {
                provided: indices.len(),
                required: self.group_threshold,
            });
        }

        Ok(())
    }
}

fn position_of(offset: usize) -> ShareIndex {
    ShareIndex::try_from(offset + 1).unwrap_or(ShareIndex::MAX)
}
