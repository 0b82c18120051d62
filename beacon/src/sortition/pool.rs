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

//! Bounded pool keeping the lowest tickets of a round.
//!
//! Tickets are stored in insertion slots; `previous[i]` holds the slot of
//! the next lower ticket, the lowest one pointing to itself, and `tail` is
//! the slot of the highest ticket. Once the pool is full, a lower ticket
//! takes over the slot of the evicted tail, so storage never exceeds the
//! capacity however many tickets are submitted.

use super::Ticket;
use parity_scale_codec::{Decode, Encode};

/// Result of an insertion into the pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Ticket took a free slot.
    Accepted,
    /// Ticket replaced the previous highest ticket, which is returned.
    AcceptedEvicting(Ticket),
    /// Pool is full and the ticket is not lower than the highest one.
    Rejected,
}

impl InsertOutcome {
    pub fn is_accepted(&self) -> bool {
        !matches!(self, Self::Rejected)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Encode, Decode)]
pub struct TicketPool {
    capacity: u32,
    tickets: Vec<Ticket>,
    previous: Vec<u32>,
    tail: Option<u32>,
}

impl TicketPool {
    pub fn new(capacity: u32) -> Self {
        Self {
            capacity,
            tickets: Vec::with_capacity(capacity as usize),
            previous: Vec::with_capacity(capacity as usize),
            tail: None,
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.tickets.len() >= self.capacity as usize
    }

    /// Highest ticket in the pool.
    pub fn tail(&self) -> Option<&Ticket> {
        self.tail.map(|slot| &self.tickets[slot as usize])
    }

    pub fn clear(&mut self) {
        self.tickets.clear();
        self.previous.clear();
        self.tail = None;
    }

    pub fn insert(&mut self, ticket: Ticket) -> InsertOutcome {
        if self.capacity == 0 {
            return InsertOutcome::Rejected;
        }

        if !self.is_full() {
            let slot = self.tickets.len() as u32;
            self.tickets.push(ticket);
            self.previous.push(slot);
            self.link(slot);

            return InsertOutcome::Accepted;
        }

        let Some(tail) = self.tail else {
            return InsertOutcome::Rejected;
        };

        if ticket.value >= self.tickets[tail as usize].value {
            return InsertOutcome::Rejected;
        }

        let below_tail = self.previous[tail as usize];
        self.tail = (below_tail != tail).then_some(below_tail);

        let evicted = std::mem::replace(&mut self.tickets[tail as usize], ticket);
        self.previous[tail as usize] = tail;
        self.link(tail);

        InsertOutcome::AcceptedEvicting(evicted)
    }

    /// Tickets in ascending value order.
    pub fn ordered(&self) -> Vec<Ticket> {
        let mut ordered = Vec::with_capacity(self.tickets.len());

        let mut cursor = self.tail;
        while let Some(slot) = cursor {
            ordered.push(self.tickets[slot as usize]);
            let previous = self.previous[slot as usize];
            cursor = (previous != slot).then_some(previous);
        }

        ordered.reverse();
        ordered
    }

    /// Links the ticket stored at `slot` into the ordered chain. The slot
    /// must not be part of the chain yet.
    fn link(&mut self, slot: u32) {
        let value = self.tickets[slot as usize].value;

        let Some(tail) = self.tail else {
            self.previous[slot as usize] = slot;
            self.tail = Some(slot);
            return;
        };

        if self.tickets[tail as usize].value < value {
            self.previous[slot as usize] = tail;
            self.tail = Some(slot);
            return;
        }

        let mut cursor = tail;
        loop {
            let lower = self.previous[cursor as usize];

            if lower == cursor {
                // New lowest ticket.
                self.previous[cursor as usize] = slot;
                self.previous[slot as usize] = slot;
                return;
            }

            if self.tickets[lower as usize].value < value {
                self.previous[cursor as usize] = slot;
                self.previous[slot as usize] = lower;
                return;
            }

            cursor = lower;
        }
    }

    #[cfg(test)]
    pub(crate) fn layout(&self) -> (Vec<beacon_primitives::U256>, Vec<u32>, Option<u32>) {
        (
            self.tickets.iter().map(|ticket| ticket.value).collect(),
            self.previous.clone(),
            self.tail,
        )
    }
}
