//! The admission queue: FIFO arrival ordering with a lifetime identity set.
//!
//! Owned exclusively by the coordinator actor, which serializes all access
//! through its mailbox. Only the head of the queue may negotiate; a car is
//! removed the instant its negotiation succeeds, not when it finishes
//! parking.

use std::collections::{HashSet, VecDeque};

use thiserror::Error;

/// A car identity collided with one already seen in this simulation's
/// lifetime. Rejected before the car enters the queue; the creator is
/// expected to regenerate the identity and retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("duplicate car identity: {0}")]
pub struct DuplicateIdentity(pub String);

/// FIFO queue of car plates plus the set of every plate ever admitted.
#[derive(Debug, Clone, Default)]
pub struct AdmissionQueue {
    order: VecDeque<String>,
    seen: HashSet<String>,
}

impl AdmissionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a plate to the tail.
    ///
    /// Fails if the plate has ever been enqueued before, even if that car
    /// has long since parked and left.
    pub fn enqueue(&mut self, plate: &str) -> Result<(), DuplicateIdentity> {
        if !self.seen.insert(plate.to_string()) {
            return Err(DuplicateIdentity(plate.to_string()));
        }
        self.order.push_back(plate.to_string());
        Ok(())
    }

    /// True iff `plate` is the current head and may negotiate.
    pub fn head_is_eligible(&self, plate: &str) -> bool {
        self.order.front().is_some_and(|head| head == plate)
    }

    /// Remove `plate` from the queue. No-op if absent.
    pub fn dequeue(&mut self, plate: &str) {
        if let Some(pos) = self.order.iter().position(|p| p == plate) {
            self.order.remove(pos);
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_head_eligibility() {
        let mut queue = AdmissionQueue::new();
        queue.enqueue("AB12CDE").unwrap();
        queue.enqueue("XY34ZZZ").unwrap();

        assert!(queue.head_is_eligible("AB12CDE"));
        assert!(!queue.head_is_eligible("XY34ZZZ"));

        queue.dequeue("AB12CDE");
        assert!(queue.head_is_eligible("XY34ZZZ"));
    }

    #[test]
    fn duplicate_rejected_for_simulation_lifetime() {
        let mut queue = AdmissionQueue::new();
        queue.enqueue("AB12CDE").unwrap();
        queue.dequeue("AB12CDE");

        // Still rejected after the original left the queue.
        assert_eq!(
            queue.enqueue("AB12CDE"),
            Err(DuplicateIdentity("AB12CDE".to_string()))
        );
    }

    #[test]
    fn dequeue_absent_is_noop() {
        let mut queue = AdmissionQueue::new();
        queue.enqueue("AB12CDE").unwrap();
        queue.dequeue("NOPE");
        assert_eq!(queue.len(), 1);
        assert!(queue.head_is_eligible("AB12CDE"));
    }

    #[test]
    fn dequeue_from_middle_preserves_order() {
        let mut queue = AdmissionQueue::new();
        for plate in ["A", "B", "C"] {
            queue.enqueue(plate).unwrap();
        }
        queue.dequeue("B");
        assert!(queue.head_is_eligible("A"));
        queue.dequeue("A");
        assert!(queue.head_is_eligible("C"));
    }

    #[test]
    fn empty_queue_has_no_eligible_head() {
        let queue = AdmissionQueue::new();
        assert!(!queue.head_is_eligible("AB12CDE"));
        assert!(queue.is_empty());
    }
}
