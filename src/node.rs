use crate::data::{Time, Value};
use crate::index::TimeIndex;

use std::sync::OnceLock;

/// Arena index of a [`Node`] within its owning trace.
///
/// Symbols refer to nodes by id only; aliased symbols share one id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

/// One value-change event. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistEnt {
    pub time: Time,
    pub value: Value,
}

/// What happened to an event handed to [`Node::append`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Append {
    Appended,
    /// Same time as the tail entry: last write wins.
    Replaced,
    /// Would violate monotonicity; the event was dropped.
    OutOfOrder,
}

/// The owner of one physical signal's entire value history.
///
/// The history is an owned, append-only sequence ordered by time. During
/// import the pipeline is the sole writer; afterwards the node is read-only
/// and the time index is built lazily on the first query.
#[derive(Debug)]
pub struct Node {
    msb: i32,
    lsb: i32,
    history: Vec<HistEnt>,
    index: OnceLock<TimeIndex>,
}

impl Node {
    pub fn new(msb: i32, lsb: i32) -> Self {
        Self {
            msb,
            lsb,
            history: Vec::new(),
            index: OnceLock::new(),
        }
    }

    pub fn msb(&self) -> i32 {
        self.msb
    }

    pub fn lsb(&self) -> i32 {
        self.lsb
    }

    pub fn width(&self) -> u32 {
        (self.msb - self.lsb).abs() as u32 + 1
    }

    /// Number of recorded transitions.
    pub fn num_hist(&self) -> usize {
        self.history.len()
    }

    pub fn history(&self) -> &[HistEnt] {
        &self.history
    }

    /// Append a value change.
    ///
    /// Entries must arrive in non-decreasing time order. An entry at the
    /// same time as the current tail replaces it; an earlier one is
    /// rejected. Invalidates a previously built index.
    pub fn append(&mut self, time: Time, value: Value) -> Append {
        let rv = match self.history.last_mut() {
            Some(tail) if time < tail.time => return Append::OutOfOrder,
            Some(tail) if time == tail.time => {
                tail.value = value;
                Append::Replaced
            }
            _ => {
                self.history.push(HistEnt { time, value });
                Append::Appended
            }
        };

        let _ = self.index.take();
        rv
    }

    /// The lazily built search accelerator over this node's history.
    ///
    /// Concurrent first queries may race to build it; every build over the
    /// complete history produces the same index, so whichever wins is fine.
    pub fn index(&self) -> &TimeIndex {
        self.index.get_or_init(|| TimeIndex::build(&self.history))
    }

    /// The entry in effect at time `t`, or `None` before the first event.
    ///
    /// Hold semantics: an entry takes effect exactly at its recorded time
    /// and stays in effect until the next one; the last entry never expires.
    pub fn value_at(&self, t: Time) -> Option<&HistEnt> {
        self.index()
            .last_at_or_before(t)
            .map(|i| &self.history[i])
    }
}
