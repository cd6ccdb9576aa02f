use super::*;
use crate::data::{Time, Value};

/// Synthetic in-memory loader.
///
/// Declares a fixed set of signals and events, optionally deferring some
/// alias declarations to the alias-completion pass the way formats with
/// late alias records do.
pub struct TestLoader {
    signals: Vec<(String, i32, i32)>,
    events: Vec<(String, Time, Value)>,
    late_aliases: Vec<(String, String)>,
}

impl TestLoader {
    pub fn new(
        signals: Vec<(String, i32, i32)>,
        events: Vec<(String, Time, Value)>,
    ) -> Self {
        Self {
            signals,
            events,
            late_aliases: Vec::new(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    /// Defer `(alias, target)` bindings to the second import call.
    pub fn with_late_aliases(mut self, aliases: Vec<(String, String)>) -> Self {
        self.late_aliases = aliases;
        self
    }
}

impl LoadFormat for TestLoader {
    fn declare(&mut self, builder: &mut TraceBuilder) -> Result<()> {
        for (name, msb, lsb) in &self.signals {
            builder.declare_signal(name.clone(), *msb, *lsb)?;
        }

        Ok(())
    }

    fn populate(&mut self, builder: &mut TraceBuilder) -> Result<()> {
        for (name, time, value) in &self.events {
            if builder.aborted() {
                return Err(Error::Aborted);
            }

            let node = builder
                .lookup_node(name)
                .ok_or_else(|| Error::UnknownSignal(name.clone()))?;
            builder.append_event(node, *time, value.clone());
        }

        Ok(())
    }

    fn needs_alias_pass(&self) -> bool {
        !self.late_aliases.is_empty()
    }

    fn complete_aliases(&mut self, builder: &mut TraceBuilder) -> Result<()> {
        for (alias, target) in &self.late_aliases {
            let node = builder
                .lookup_node(target)
                .ok_or_else(|| Error::UnknownSignal(target.clone()))?;
            builder.declare_alias(alias.clone(), node)?;
        }

        Ok(())
    }
}
