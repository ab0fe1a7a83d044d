//! Unbounded immediate-task queues with bulk draining
//!
//! Exactly-once delivery per pushed task, no ordering across producers.

use crossbeam::queue::SegQueue;
use crossbeam_deque::{Steal, Stealer, Worker as Deque};

/// Consumer-side contract of an immediate queue
///
/// `drain` is only called by the thread that owns the hosted loop.
pub trait ImmediateQueue<T>: Send + Sync {
    /// Move the tasks currently in the queue into `buffer`
    ///
    /// Reserves room for the approximate length first, then takes at most
    /// that many tasks in one pass. Returns the number of tasks moved.
    fn drain(&self, buffer: &mut Vec<T>) -> usize;

    /// Approximate number of queued tasks; may be stale
    fn len_approx(&self) -> usize;

    /// Push follow-up work from the consuming thread itself
    fn push_local(&self, task: T);
}

/// Unbounded lock-free multi-producer queue
pub struct TaskQueue<T> {
    queue: SegQueue<T>,
}

impl<T> TaskQueue<T> {
    /// Create an empty queue
    pub fn new() -> Self {
        Self {
            queue: SegQueue::new(),
        }
    }

    /// Push a task; never blocks
    pub fn push(&self, task: T) {
        self.queue.push(task);
    }
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send> ImmediateQueue<T> for TaskQueue<T> {
    fn drain(&self, buffer: &mut Vec<T>) -> usize {
        drain_segment(&self.queue, buffer)
    }

    fn len_approx(&self) -> usize {
        self.queue.len()
    }

    fn push_local(&self, task: T) {
        self.queue.push(task);
    }
}

fn drain_segment<T>(queue: &SegQueue<T>, buffer: &mut Vec<T>) -> usize {
    let available = queue.len();
    if available == 0 {
        return 0;
    }
    buffer.reserve(available);

    let mut moved = 0;
    while moved < available {
        match queue.pop() {
            Some(task) => {
                buffer.push(task);
                moved += 1;
            }
            None => break,
        }
    }
    moved
}

/// Producer end of a single-producer queue
struct Producer<T>(Deque<T>);

// SAFETY: the deque owner is only reached through `SingleProducerQueue::push`,
// whose contract forbids concurrent callers. Sequential use from different
// threads is fine because the deque itself is `Send`.
unsafe impl<T: Send> Sync for Producer<T> {}

/// Unbounded queue with a cheaper push for callers that guarantee one producer
///
/// The producer end is an owner-only FIFO deque, so a push is an uncontended
/// store. Tasks the loop enqueues for itself go through a separate lock-free
/// side queue and never touch the producer end.
pub struct SingleProducerQueue<T> {
    producer: Producer<T>,
    stealer: Stealer<T>,
    local: SegQueue<T>,
}

impl<T> SingleProducerQueue<T> {
    /// Create an empty queue
    pub fn new() -> Self {
        let deque = Deque::new_fifo();
        let stealer = deque.stealer();
        Self {
            producer: Producer(deque),
            stealer,
            local: SegQueue::new(),
        }
    }

    /// Push a task from the producer thread
    ///
    /// # Safety
    ///
    /// No two threads may call `push` on the same queue concurrently. Calls
    /// from different threads must be ordered by some external
    /// synchronisation (e.g. `&mut` access to the owning wrapper, a lock, or a
    /// channel hand-off).
    pub unsafe fn push(&self, task: T) {
        self.producer.0.push(task);
    }
}

impl<T> Default for SingleProducerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send> ImmediateQueue<T> for SingleProducerQueue<T> {
    fn drain(&self, buffer: &mut Vec<T>) -> usize {
        let available = self.stealer.len();
        let mut moved = 0;
        if available > 0 {
            buffer.reserve(available);
            while moved < available {
                match self.stealer.steal() {
                    Steal::Success(task) => {
                        buffer.push(task);
                        moved += 1;
                    }
                    Steal::Empty => break,
                    Steal::Retry => continue,
                }
            }
        }
        moved + drain_segment(&self.local, buffer)
    }

    fn len_approx(&self) -> usize {
        self.stealer.len() + self.local.len()
    }

    fn push_local(&self, task: T) {
        self.local.push(task);
    }
}
