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
    dkg::DkgResultError, registry::RegistryError, relay::RelayError, slashing::SlashingError,
    sortition::SortitionError,
};
use beacon_bls::BlsError;
use thiserror::Error;

/// Beacon operation error.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    Sortition(#[from] SortitionError),
    #[error(transparent)]
    DkgResult(#[from] DkgResultError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Relay(#[from] RelayError),
    #[error(transparent)]
    Slashing(#[from] SlashingError),
    #[error(transparent)]
    Bls(#[from] BlsError),
    #[error("Group selection is in progress")]
    GroupSelectionInProgress,
    #[error("Genesis requires no active groups")]
    GenesisNotAllowed,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
