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

//! Core of a threshold BLS random beacon.
//!
//! Stakers compete in a [ticket sortition](sortition) for seats in a new
//! group. The selected participants run the key generation off-chain and
//! publish its [result](dkg), which registers the group in the
//! [registry](registry). Active groups take turns answering
//! [relay entry requests](relay); every new entry seeds the next sortition.
//! Groups caught misbehaving are terminated and [slashed](slashing).
//!
//! [`RandomBeacon`] ties the components together. Stake accounting is left
//! to a [`StakeLedger`] implementation.

pub mod config;
pub mod dkg;
pub mod ledger;
pub mod registry;
pub mod relay;
pub mod slashing;
pub mod sortition;

mod beacon;
mod error;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use beacon::RandomBeacon;
pub use config::{BeaconConfig, BeaconParams};
pub use error::{Error, Result};
pub use ledger::{GroupCreationGate, StakeLedger};
