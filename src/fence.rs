//! Request sequencing so late responses cannot overwrite newer state

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TICKET: AtomicU64 = AtomicU64::new(1);

/// Identifies one issued request. Unique for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(u64);

impl Ticket {
    pub fn seq(&self) -> u64 {
        self.0
    }
}

/// Tracks the latest request issued for one scope (tree, content page, file view).
#[derive(Debug, Default)]
pub struct RequestFence {
    latest: Option<Ticket>,
    in_flight: bool,
}

impl RequestFence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new ticket; every earlier one becomes stale.
    pub fn issue(&mut self) -> Ticket {
        let ticket = Ticket(NEXT_TICKET.fetch_add(1, Ordering::Relaxed));
        self.latest = Some(ticket);
        self.in_flight = true;
        ticket
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest == Some(ticket)
    }

    /// Accept a response. Returns false (and changes nothing) for stale tickets.
    pub fn settle(&mut self, ticket: Ticket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.in_flight = false;
        true
    }

    /// Make every outstanding ticket stale without issuing a new request.
    pub fn invalidate(&mut self) {
        self.latest = None;
        self.in_flight = false;
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_latest_ticket_settles() {
        let mut fence = RequestFence::new();
        let first = fence.issue();
        let second = fence.issue();
        assert!(second.seq() > first.seq());
        assert!(!fence.settle(first));
        assert!(fence.in_flight());
        assert!(fence.settle(second));
        assert!(!fence.in_flight());
    }

    #[test]
    fn test_invalidate_discards_outstanding() {
        let mut fence = RequestFence::new();
        let ticket = fence.issue();
        fence.invalidate();
        assert!(!fence.settle(ticket));
        assert!(!fence.in_flight());
    }

    #[test]
    fn test_tickets_unique_across_fences() {
        let mut a = RequestFence::new();
        let mut b = RequestFence::new();
        let ta = a.issue();
        let tb = b.issue();
        assert_ne!(ta, tb);
        assert!(!a.is_current(tb));
    }
}
