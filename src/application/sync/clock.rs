//! Logical mutation sequencing.
//!
//! Every local mutation takes a ticket. A remote response may overwrite local
//! state only if its ticket is still the latest one; the epoch changes when
//! the active store is swapped, which invalidates every outstanding ticket.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationTicket {
    seq: u64,
    epoch: u64,
}

impl MutationTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

#[derive(Debug, Default)]
pub struct MutationClock {
    seq: u64,
    epoch: u64,
}

impl MutationClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ticket for a new local mutation.
    pub fn next(&mut self) -> MutationTicket {
        self.seq += 1;
        self.current()
    }

    /// Ticket describing the state as it is now, for reads.
    pub fn current(&self) -> MutationTicket {
        MutationTicket {
            seq: self.seq,
            epoch: self.epoch,
        }
    }

    pub fn is_latest(&self, ticket: MutationTicket) -> bool {
        ticket == self.current()
    }

    /// False once the store the ticket was issued against has been swapped out.
    pub fn same_epoch(&self, ticket: MutationTicket) -> bool {
        ticket.epoch == self.epoch
    }

    /// Invalidate all outstanding tickets.
    pub fn new_epoch(&mut self) {
        self.epoch += 1;
        self.seq += 1;
    }

    pub fn latest_seq(&self) -> u64 {
        self.seq
    }
}
