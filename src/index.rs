use crate::data::Time;
use crate::node::HistEnt;

/// Search accelerator over one node's history.
///
/// Materializes the entry times into a dense sorted array so that a point
/// query is a binary search instead of a walk over the full history. Built
/// once per node after import; building it again from the same history
/// yields an identical index.
#[derive(Debug)]
pub struct TimeIndex {
    times: Box<[Time]>,
}

impl TimeIndex {
    pub fn build(history: &[HistEnt]) -> Self {
        let times = history.iter()
            .map(|ent| ent.time)
            .collect();

        Self { times }
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Index of the last entry with `time <= t`, or `None` if `t` precedes
    /// the first entry.
    pub fn last_at_or_before(&self, t: Time) -> Option<usize> {
        let n = self.times.partition_point(|&ent_t| ent_t <= t);

        if n == 0 {
            None
        } else {
            Some(n - 1)
        }
    }
}
