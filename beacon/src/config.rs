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

//! Protocol parameters.

use anyhow::{Context, Result, ensure};
use beacon_primitives::{BlockNumber, U256};
use serde::Deserialize;
use std::path::Path;

/// Validated protocol parameters shared by every beacon component.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BeaconConfig {
    /// Number of members selected for every new group.
    pub group_size: usize,
    /// Minimum number of members required to sign a DKG result or an entry.
    pub group_threshold: usize,
    /// Blocks the ticket submission window stays open after a round starts.
    pub ticket_submission_timeout: BlockNumber,
    /// Blocks reserved for the off-chain key generation before results may
    /// be published.
    pub dkg_duration: BlockNumber,
    /// Blocks between the publication turns of two consecutive participants.
    pub result_publication_block_step: BlockNumber,
    /// Blocks a group stays eligible for selection after registration.
    pub group_active_time: BlockNumber,
    /// Lower bound on the number of groups kept active regardless of age.
    pub active_groups_threshold: usize,
    /// Blocks a selected group has to produce an entry.
    pub relay_entry_timeout: BlockNumber,
    /// Amount slashed from every disqualified DKG participant.
    pub dkg_disqualification_penalty: u128,
    /// Amount slashed from every member of a group that failed to produce an entry.
    pub relay_entry_timeout_penalty: u128,
    /// Share of the slashed amount paid to the reporter, in percent.
    pub tattletale_reward_percent: u8,
    /// Seed of the very first sortition round.
    pub genesis_entry: U256,
}

impl BeaconConfig {
    /// First block of the window in which any participant may publish the
    /// DKG result of a round whose tickets closed at `selection_end`.
    pub fn result_publication_start(&self, selection_end: BlockNumber) -> BlockNumber {
        selection_end.saturating_add(self.dkg_duration)
    }

    /// Length of the whole result publication window.
    pub fn result_publication_window(&self) -> BlockNumber {
        (self.group_size as BlockNumber).saturating_mul(self.result_publication_block_step)
    }
}

impl Default for BeaconConfig {
    fn default() -> Self {
        Self {
            group_size: BeaconParams::DEFAULT_GROUP_SIZE,
            group_threshold: BeaconParams::DEFAULT_GROUP_THRESHOLD,
            ticket_submission_timeout: BeaconParams::DEFAULT_TICKET_SUBMISSION_TIMEOUT,
            dkg_duration: BeaconParams::DEFAULT_DKG_DURATION,
            result_publication_block_step: BeaconParams::DEFAULT_RESULT_PUBLICATION_BLOCK_STEP,
            group_active_time: BeaconParams::DEFAULT_GROUP_ACTIVE_TIME,
            active_groups_threshold: BeaconParams::DEFAULT_ACTIVE_GROUPS_THRESHOLD,
            relay_entry_timeout: BeaconParams::DEFAULT_RELAY_ENTRY_TIMEOUT,
            dkg_disqualification_penalty: BeaconParams::DEFAULT_DKG_DISQUALIFICATION_PENALTY,
            relay_entry_timeout_penalty: BeaconParams::DEFAULT_RELAY_ENTRY_TIMEOUT_PENALTY,
            tattletale_reward_percent: BeaconParams::DEFAULT_TATTLETALE_REWARD_PERCENT,
            genesis_entry: BeaconParams::DEFAULT_GENESIS_ENTRY,
        }
    }
}

/// Protocol parameters as read from a configuration file.
///
/// Every field is optional; missing ones take the `DEFAULT_*` values.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BeaconParams {
    #[serde(rename = "group-size")]
    pub group_size: Option<usize>,

    #[serde(rename = "group-threshold")]
    pub group_threshold: Option<usize>,

    #[serde(rename = "ticket-submission-timeout")]
    pub ticket_submission_timeout: Option<BlockNumber>,

    #[serde(rename = "dkg-duration")]
    pub dkg_duration: Option<BlockNumber>,

    #[serde(rename = "result-publication-block-step")]
    pub result_publication_block_step: Option<BlockNumber>,

    #[serde(rename = "group-active-time")]
    pub group_active_time: Option<BlockNumber>,

    #[serde(rename = "active-groups-threshold")]
    pub active_groups_threshold: Option<usize>,

    #[serde(rename = "relay-entry-timeout")]
    pub relay_entry_timeout: Option<BlockNumber>,

    #[serde(rename = "dkg-disqualification-penalty")]
    pub dkg_disqualification_penalty: Option<u128>,

    #[serde(rename = "relay-entry-timeout-penalty")]
    pub relay_entry_timeout_penalty: Option<u128>,

    #[serde(rename = "tattletale-reward-percent")]
    pub tattletale_reward_percent: Option<u8>,

    /// Hex encoded, `0x` prefix optional.
    #[serde(rename = "genesis-entry")]
    pub genesis_entry: Option<String>,
}

impl BeaconParams {
    pub const DEFAULT_GROUP_SIZE: usize = 64;
    pub const DEFAULT_GROUP_THRESHOLD: usize = 33;
    pub const DEFAULT_TICKET_SUBMISSION_TIMEOUT: BlockNumber = 12;
    pub const DEFAULT_DKG_DURATION: BlockNumber = 13;
    pub const DEFAULT_RESULT_PUBLICATION_BLOCK_STEP: BlockNumber = 3;
    pub const DEFAULT_GROUP_ACTIVE_TIME: BlockNumber = 5_760;
    pub const DEFAULT_ACTIVE_GROUPS_THRESHOLD: usize = 5;
    pub const DEFAULT_RELAY_ENTRY_TIMEOUT: BlockNumber = 24;
    pub const DEFAULT_DKG_DISQUALIFICATION_PENALTY: u128 = 100_000;
    pub const DEFAULT_RELAY_ENTRY_TIMEOUT_PENALTY: u128 = 100_000;
    pub const DEFAULT_TATTLETALE_REWARD_PERCENT: u8 = 5;
    /// First entry of the beacon, the leading 256 bits of the fractional part of `pi`.
    pub const DEFAULT_GENESIS_ENTRY: U256 = U256([
        0x082efa98ec4e6c89,
        0xa4093822299f31d0,
        0x13198a2e03707344,
        0x243f6a8885a308d3,
    ]);

    /// Parses parameters from a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("failed to parse beacon parameters")
    }

    /// Reads parameters from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("invalid config {}", path.display()))
    }

    /// Convert self into a proper `BeaconConfig` object.
    pub fn into_config(self) -> Result<BeaconConfig> {
        let group_size = self.group_size.unwrap_or(Self::DEFAULT_GROUP_SIZE);
        let group_threshold = self.group_threshold.unwrap_or(Self::DEFAULT_GROUP_THRESHOLD);

        ensure!(
            group_threshold >= 1 && group_threshold <= group_size,
            "`group-threshold` must be in range 1..=`group-size` ({group_size}), got {group_threshold}"
        );
        ensure!(
            group_size <= u16::MAX as usize,
            "`group-size` must fit signer indices, got {group_size}"
        );

        let active_groups_threshold = self
            .active_groups_threshold
            .unwrap_or(Self::DEFAULT_ACTIVE_GROUPS_THRESHOLD);
        ensure!(
            active_groups_threshold >= 1,
            "`active-groups-threshold` must be positive"
        );

        let ticket_submission_timeout = self
            .ticket_submission_timeout
            .unwrap_or(Self::DEFAULT_TICKET_SUBMISSION_TIMEOUT);
        let result_publication_block_step = self
            .result_publication_block_step
            .unwrap_or(Self::DEFAULT_RESULT_PUBLICATION_BLOCK_STEP);
        let relay_entry_timeout = self
            .relay_entry_timeout
            .unwrap_or(Self::DEFAULT_RELAY_ENTRY_TIMEOUT);
        ensure!(
            ticket_submission_timeout > 0,
            "`ticket-submission-timeout` must be positive"
        );
        ensure!(
            result_publication_block_step > 0,
            "`result-publication-block-step` must be positive"
        );
        ensure!(
            relay_entry_timeout > 0,
            "`relay-entry-timeout` must be positive"
        );

        let tattletale_reward_percent = self
            .tattletale_reward_percent
            .unwrap_or(Self::DEFAULT_TATTLETALE_REWARD_PERCENT);
        ensure!(
            tattletale_reward_percent <= 100,
            "`tattletale-reward-percent` must not exceed 100, got {tattletale_reward_percent}"
        );

        let genesis_entry = match self.genesis_entry {
            Some(entry) => parse_entry(&entry).with_context(|| "invalid `genesis-entry`")?,
            None => Self::DEFAULT_GENESIS_ENTRY,
        };

        Ok(BeaconConfig {
            group_size,
            group_threshold,
            ticket_submission_timeout,
            dkg_duration: self.dkg_duration.unwrap_or(Self::DEFAULT_DKG_DURATION),
            result_publication_block_step,
            group_active_time: self
                .group_active_time
                .unwrap_or(Self::DEFAULT_GROUP_ACTIVE_TIME),
            active_groups_threshold,
            relay_entry_timeout,
            dkg_disqualification_penalty: self
                .dkg_disqualification_penalty
                .unwrap_or(Self::DEFAULT_DKG_DISQUALIFICATION_PENALTY),
            relay_entry_timeout_penalty: self
                .relay_entry_timeout_penalty
                .unwrap_or(Self::DEFAULT_RELAY_ENTRY_TIMEOUT_PENALTY),
            tattletale_reward_percent,
            genesis_entry,
        })
    }
}

fn parse_entry(s: &str) -> Result<U256> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(s).context("not a hex string")?;
    ensure!(
        !bytes.is_empty() && bytes.len() <= 32,
        "expected 1..=32 bytes, got {}",
        bytes.len()
    );

    Ok(U256::from_big_endian(&bytes))
}
