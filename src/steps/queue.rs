//! Bounded FIFO of pending steps.

use heapless::Deque;
use log::warn;

use super::Step;

/// Maximum number of queued steps.  Placing a 32-member combination queues
/// 260 steps including its callback.
pub const QUEUE_CAPACITY: usize = 512;

/// Returned when a sequence does not fit; nothing was enqueued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFull;

/// Strict FIFO with all-or-nothing sequence insertion.
#[derive(Default)]
pub struct ActionQueue {
    steps: Deque<Step, QUEUE_CAPACITY>,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a whole sequence, or none of it.
    pub fn push_sequence(&mut self, sequence: Vec<Step>) -> Result<(), QueueFull> {
        if sequence.len() > self.free() {
            warn!(
                "ActionQueue: sequence of {} steps rejected ({} free)",
                sequence.len(),
                self.free()
            );
            return Err(QueueFull);
        }
        for step in sequence {
            // Space was checked above.
            let _ = self.steps.push_back(step);
        }
        Ok(())
    }

    /// Enqueue one step.
    pub fn push(&mut self, step: Step) -> Result<(), QueueFull> {
        self.steps.push_back(step).map_err(|_| QueueFull)
    }

    pub fn pop(&mut self) -> Option<Step> {
        self.steps.pop_front()
    }

    pub fn front(&self) -> Option<&Step> {
        self.steps.front()
    }

    pub fn contains(&self, pred: impl Fn(&Step) -> bool) -> bool {
        self.steps.iter().any(pred)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Remaining room.
    pub fn free(&self) -> usize {
        QUEUE_CAPACITY - self.steps.len()
    }

    /// Snapshot of the pending steps, front first.
    pub fn iter(&self) -> impl Iterator<Item = &Step> {
        self.steps.iter()
    }
}
