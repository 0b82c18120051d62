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

use crate::{
    config::BeaconConfig,
    dkg::{DkgResult, DkgResultError, DkgResultValidator},
    error::{Error, Result},
    ledger::{GroupCreationGate, StakeLedger},
    registry::{GroupIndex, GroupLifecycle, GroupRegistry, GroupState, RegistryError},
    relay::{EntryRequest, PendingRequest, RelayEntryCoordinator, RelayError},
    slashing::{SlashingHook, SlashingReport},
    sortition::{InsertOutcome, SortitionRound, Ticket, TicketSortition},
};
use beacon_bls::PublicKey;
use beacon_primitives::{Address, BlockNumber, U256};

/// Random beacon: every component wired together around one stake ledger.
///
/// All operations take the current height and either apply completely or
/// fail without changing anything.
#[derive(Debug)]
pub struct RandomBeacon<L> {
    config: BeaconConfig,
    ledger: L,
    current_entry: U256,
    sortition: TicketSortition,
    dkg: DkgResultValidator,
    registry: GroupRegistry,
    relay: RelayEntryCoordinator,
    slashing: SlashingHook,
}

impl<L: StakeLedger> RandomBeacon<L> {
    pub fn new(config: BeaconConfig, ledger: L) -> Self {
        let group_size = u32::try_from(config.group_size).unwrap_or(u32::MAX);

        Self {
            current_entry: config.genesis_entry,
            sortition: TicketSortition::new(group_size, config.ticket_submission_timeout),
            dkg: DkgResultValidator::new(&config),
            registry: GroupRegistry::new(GroupLifecycle::from(&config)),
            relay: RelayEntryCoordinator::new(config.relay_entry_timeout),
            slashing: SlashingHook::new(&config),
            ledger,
            config,
        }
    }

    pub fn config(&self) -> &BeaconConfig {
        &self.config
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    pub fn registry(&self) -> &GroupRegistry {
        &self.registry
    }

    /// Last entry produced, or the genesis entry.
    pub fn current_entry(&self) -> U256 {
        self.current_entry
    }

    pub fn pending_request(&self) -> Option<&PendingRequest> {
        self.relay.pending()
    }

    pub fn sortition_round(&self) -> Option<&SortitionRound> {
        self.sortition.round()
    }

    /// Last block of the current group selection: ticket submission, key
    /// generation and result publication.
    fn group_selection_end(&self) -> Option<BlockNumber> {
        let submission_end = self.sortition.submission_end()?;

        Some(
            self.config
                .result_publication_start(submission_end)
                .saturating_add(self.config.result_publication_window()),
        )
    }

    /// Whether a round is collecting tickets or awaiting its DKG result.
    pub fn is_group_selection_in_progress(&self, now: BlockNumber) -> bool {
        self.group_selection_end().is_some_and(|end| now < end)
    }

    fn start_group_selection(&mut self, seed: U256, now: BlockNumber) -> Result<()> {
        if self.is_group_selection_in_progress(now) {
            return Err(Error::GroupSelectionInProgress);
        }

        if self.sortition.is_round_in_progress() {
            log::warn!("Previous group selection ended without a DKG result");
        }

        self.dkg.close_round();
        self.sortition.start_round(seed, now);

        Ok(())
    }

    /// Starts the first group selection, seeded with the genesis entry.
    pub fn genesis(&mut self, now: BlockNumber) -> Result<()> {
        if self.registry.has_active_groups() {
            return Err(Error::GenesisNotAllowed);
        }

        self.start_group_selection(self.config.genesis_entry, now)
    }

    pub fn submit_ticket(
        &mut self,
        value: U256,
        owner: Address,
        virtual_index: u64,
        now: BlockNumber,
    ) -> Result<InsertOutcome> {
        Ok(self
            .sortition
            .submit_ticket(&self.ledger, value, owner, virtual_index, now)?)
    }

    pub fn selected_tickets(&self, now: BlockNumber) -> Result<Vec<Ticket>> {
        Ok(self.sortition.selected_tickets(now)?)
    }

    pub fn selected_participants(&self, now: BlockNumber) -> Result<Vec<Address>> {
        Ok(self.sortition.selected_participants(now)?)
    }

    /// Validates the DKG result and registers the new group.
    pub fn submit_result(
        &mut self,
        submitter: Address,
        result: &DkgResult,
        now: BlockNumber,
    ) -> Result<GroupIndex> {
        let submission_end = self
            .sortition
            .submission_end()
            .ok_or(DkgResultError::NoResultExpected)?;
        let participants = self.sortition.selected_participants(now)?;

        if self.registry.index_of(&result.group_public_key).is_some() {
            return Err(RegistryError::GroupAlreadyRegistered.into());
        }

        self.dkg.open_round(
            participants,
            self.config.result_publication_start(submission_end),
        );
        let accepted = self.dkg.submit_result(submitter, result, now)?;

        let index = self
            .registry
            .register(accepted.public_key, accepted.members, now)?;
        self.slashing
            .report_dkg_disqualification(&mut self.ledger, &accepted.disqualified);

        self.sortition.finish_round();
        self.dkg.close_round();

        Ok(index)
    }

    /// Asks a group selected by `seed` to sign the current entry.
    pub fn request_entry(
        &mut self,
        seed: U256,
        group_member_reward: u128,
        now: BlockNumber,
    ) -> Result<PendingRequest> {
        let request = EntryRequest {
            previous_entry: self.current_entry,
            seed,
            group_member_reward,
        };

        Ok(self.relay.request_entry(&mut self.registry, request, now)?)
    }

    /// Accepts the entry of the pending request and, if `gate` allows and
    /// no selection is running, seeds a new group selection with it.
    pub fn submit_entry(
        &mut self,
        signature: &[u8],
        gate: &impl GroupCreationGate,
        now: BlockNumber,
    ) -> Result<U256> {
        let entry = self.relay.submit_entry(signature, now)?;

        self.registry
            .credit_member_reward(entry.group_index, entry.request.group_member_reward);
        self.current_entry = entry.entry;

        if gate.should_create_group() && !self.is_group_selection_in_progress(now) {
            self.start_group_selection(entry.entry, now)?;
        }

        Ok(entry.entry)
    }

    pub fn report_unauthorized_signing(
        &mut self,
        group: &PublicKey,
        message: &[u8],
        signature: &[u8],
        reporter: Address,
        now: BlockNumber,
    ) -> Result<SlashingReport> {
        let report = self.slashing.report_unauthorized_signing(
            &mut self.registry,
            &mut self.ledger,
            group,
            message,
            signature,
            reporter,
            now,
        )?;

        if let Some(pending) = self.relay.take_assigned_to(report.group_index) {
            self.retry(pending.request, now);
        }

        Ok(report)
    }

    /// Punishes the group that missed the pending request's deadline and
    /// hands the request over to another group.
    pub fn report_relay_entry_timeout(
        &mut self,
        reporter: Address,
        now: BlockNumber,
    ) -> Result<SlashingReport> {
        let pending = self.relay.timed_out(now)?;

        let report = self.slashing.report_relay_entry_timeout(
            &mut self.registry,
            &mut self.ledger,
            pending.group_index,
            reporter,
            now,
        )?;

        self.relay.take_timed_out(now)?;
        self.retry(pending.request, now);

        Ok(report)
    }

    fn retry(&mut self, request: EntryRequest, now: BlockNumber) {
        match self.relay.assign(&mut self.registry, request, now) {
            Ok(pending) => log::info!(
                "Relay entry request for {:#x} retried with group #{}",
                request.previous_entry,
                pending.group_index
            ),
            Err(RelayError::Registry(err)) => log::warn!(
                "Relay entry request for {:#x} dropped: {err}",
                request.previous_entry
            ),
            Err(err) => log::error!("Failed to retry relay entry request: {err}"),
        }
    }

    pub fn is_stale_group(&self, group: &PublicKey, now: BlockNumber) -> bool {
        self.registry.is_stale(group, now)
    }

    pub fn group_state(&self, group: &PublicKey, now: BlockNumber) -> Option<GroupState> {
        self.registry
            .index_of(group)
            .and_then(|index| self.registry.group_state(index, now))
    }

    pub fn number_of_groups(&self) -> usize {
        self.registry.number_of_groups()
    }

    pub fn get_group_members(&self, group: &PublicKey) -> Result<&[Address]> {
        Ok(self.registry.get_group_members(group)?)
    }

    pub fn withdraw_group_member_rewards(
        &mut self,
        member: Address,
        group: &PublicKey,
        now: BlockNumber,
    ) -> Result<u128> {
        Ok(self
            .registry
            .withdraw_group_member_rewards(&mut self.ledger, member, group, now)?)
    }
}
