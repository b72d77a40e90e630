//! Single-threaded timer queue on a virtual millisecond clock.
//!
//! Tasks run one at a time to completion, earliest deadline first and FIFO
//! among equal deadlines. A running task receives the host state and the
//! queue itself, so it can schedule follow-up timers or cancel others.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

/// Handle returned by the scheduling calls; pass to [`TimerQueue::clear`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// A zero-argument action over host state `S`
pub type Task<S> = Box<dyn FnMut(&mut S, &mut TimerQueue<S>)>;

enum Kind {
    Once,
    Repeat(u64),
}

struct Timer<S> {
    kind: Kind,
    task: Task<S>,
}

/// Virtual-clock timer facility
pub struct TimerQueue<S> {
    now: u64,
    next_id: u64,
    next_seq: u64,
    // (due, seq, id); stale entries for cleared timers are skipped lazily
    heap: BinaryHeap<Reverse<(u64, u64, u64)>>,
    timers: HashMap<u64, Timer<S>>,
    // id of the task currently executing, and whether it repeats
    running: Option<(u64, bool)>,
    cancelled_while_running: HashSet<u64>,
}

impl<S> std::fmt::Debug for TimerQueue<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerQueue")
            .field("now", &self.now)
            .field("pending", &self.timers.len())
            .finish()
    }
}

impl<S> Default for TimerQueue<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> TimerQueue<S> {
    pub fn new() -> Self {
        Self {
            now: 0,
            next_id: 1,
            next_seq: 0,
            heap: BinaryHeap::new(),
            timers: HashMap::new(),
            running: None,
            cancelled_while_running: HashSet::new(),
        }
    }

    /// Current virtual time in milliseconds
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Number of live timers (a running recurring timer counts)
    pub fn pending(&self) -> usize {
        let running_repeat = self.running.is_some_and(|(id, repeats)| repeats && !self.cancelled_while_running.contains(&id));
        self.timers.len() + usize::from(running_repeat)
    }

    /// Run `task` once, no earlier than `delay_ms` from now
    pub fn set_timeout<F>(&mut self, delay_ms: u64, task: F) -> TimerHandle
    where
        F: FnMut(&mut S, &mut TimerQueue<S>) + 'static,
    {
        self.insert(delay_ms, Kind::Once, Box::new(task))
    }

    /// Run `task` every `period_ms`, first at `now + period_ms`.
    /// A zero period is clamped to 1ms so time always advances.
    pub fn set_interval<F>(&mut self, period_ms: u64, task: F) -> TimerHandle
    where
        F: FnMut(&mut S, &mut TimerQueue<S>) + 'static,
    {
        let period = period_ms.max(1);
        self.insert(period, Kind::Repeat(period), Box::new(task))
    }

    /// Cancel a timer. Returns false if it already fired (one-shot) or was
    /// never known.
    pub fn clear(&mut self, handle: TimerHandle) -> bool {
        if self.timers.remove(&handle.0).is_some() {
            return true;
        }
        if self.running == Some((handle.0, true)) {
            return self.cancelled_while_running.insert(handle.0);
        }
        false
    }

    /// Earliest deadline among live timers
    pub fn next_deadline(&mut self) -> Option<u64> {
        while let Some(Reverse((due, _, id))) = self.heap.peek().copied() {
            if self.timers.contains_key(&id) {
                return Some(due);
            }
            self.heap.pop();
        }
        None
    }

    /// Run every timer due at or before `deadline`, then set the clock to
    /// `deadline` (never backwards). Returns how many tasks ran.
    pub fn run_until(&mut self, state: &mut S, deadline: u64) -> usize {
        let mut ran = 0;
        while let Some(due) = self.next_deadline() {
            if due > deadline {
                break;
            }
            let Some(Reverse((due, _, id))) = self.heap.pop() else {
                break;
            };
            let Some(mut timer) = self.timers.remove(&id) else {
                continue;
            };
            self.now = self.now.max(due);
            self.running = Some((id, matches!(timer.kind, Kind::Repeat(_))));
            (timer.task)(state, self);
            self.running = None;
            ran += 1;

            let cancelled = self.cancelled_while_running.remove(&id);
            if let Kind::Repeat(period) = timer.kind {
                if !cancelled {
                    let seq = self.bump_seq();
                    self.heap.push(Reverse((due + period, seq, id)));
                    self.timers.insert(id, timer);
                }
            }
        }
        self.now = self.now.max(deadline);
        ran
    }

    /// Advance the clock by `ms`, running everything that comes due
    pub fn advance(&mut self, state: &mut S, ms: u64) -> usize {
        let target = self.now.saturating_add(ms);
        self.run_until(state, target)
    }

    fn insert(&mut self, delay_ms: u64, kind: Kind, task: Task<S>) -> TimerHandle {
        let id = self.next_id;
        self.next_id += 1;
        let seq = self.bump_seq();
        self.heap.push(Reverse((self.now.saturating_add(delay_ms), seq, id)));
        self.timers.insert(id, Timer { kind, task });
        TimerHandle(id)
    }

    fn bump_seq(&mut self) -> u64 {
        let s = self.next_seq;
        self.next_seq += 1;
        s
    }
}
