use crate::data::{Time, TimeRange, Timescale, Value};
use crate::dir::{Directory, Symbol};
use crate::error::*;
use crate::load::{LoaderBox, LoaderRegistry};
use crate::node::{Append, Node, NodeId};

use log::warn;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

static ABORT_NEVER: AtomicBool = AtomicBool::new(false);

enum ImportState {
    /// Neither pass has run.
    Pending(LoaderBox),
    /// Both passes ran; the loader asked for an alias-completion scan.
    AliasPass(LoaderBox),
    /// Fully imported, read-only.
    Done,
}

/// The complete in-memory representation of one loaded dump file.
///
/// Owns the signal directory, the node arena with every value history, the
/// global time range and the timescale. Created with a pending loader;
/// populated by [`Trace::import_all`]; immutable afterwards, so any number
/// of threads may query it concurrently.
pub struct Trace {
    dir: Directory,
    nodes: Vec<Node>,
    timescale: Timescale,
    range: Option<TimeRange>,
    state: ImportState,
}

impl Trace {
    /// Select a loader for `path` by suffix and attach it, without running
    /// the import yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        LoaderRegistry::with_builtin().open(path)
    }

    pub fn new(loader: LoaderBox) -> Self {
        Self {
            dir: Directory::new(),
            nodes: Vec::new(),
            timescale: Timescale::default(),
            range: None,
            state: ImportState::Pending(loader),
        }
    }

    /// Import all declarations and events.
    ///
    /// The first call runs both passes (declare, then populate). A second
    /// call runs the loader's alias-completion scan if it declared the
    /// need, and is a guaranteed no-op otherwise; further calls are always
    /// no-ops. On error the trace is left empty and should be discarded —
    /// a partially imported trace is never exposed.
    pub fn import_all(&mut self) -> Result<()> {
        self.import_all_abortable(&ABORT_NEVER)
    }

    /// Like [`Trace::import_all`], but cooperatively abortable: loaders
    /// poll the flag between records and bail out with [`Error::Aborted`].
    pub fn import_all_abortable(&mut self, abort: &AtomicBool) -> Result<()> {
        match std::mem::replace(&mut self.state, ImportState::Done) {
            ImportState::Pending(mut loader) => {
                let res = (|| {
                    let mut builder = TraceBuilder {
                        dir: &mut self.dir,
                        nodes: &mut self.nodes,
                        timescale: &mut self.timescale,
                        range: &mut self.range,
                        abort,
                        dropped: 0,
                    };

                    loader.declare(&mut builder)?;
                    builder.dir.sort();
                    loader.populate(&mut builder)?;

                    if builder.dropped > 0 {
                        warn!("dropped {} out-of-order event(s) during import", builder.dropped);
                    }

                    Ok(())
                })();

                match res {
                    Ok(()) => {
                        if loader.needs_alias_pass() {
                            self.state = ImportState::AliasPass(loader);
                        }
                        Ok(())
                    }
                    Err(e) => {
                        self.dir = Directory::new();
                        self.nodes.clear();
                        self.range = None;
                        Err(e)
                    }
                }
            }

            ImportState::AliasPass(mut loader) => {
                let mut builder = TraceBuilder {
                    dir: &mut self.dir,
                    nodes: &mut self.nodes,
                    timescale: &mut self.timescale,
                    range: &mut self.range,
                    abort,
                    dropped: 0,
                };

                match loader.complete_aliases(&mut builder) {
                    Ok(()) => {
                        self.dir.sort();
                        Ok(())
                    }
                    Err(e) => {
                        self.dir = Directory::new();
                        self.nodes.clear();
                        self.range = None;
                        Err(e)
                    }
                }
            }

            ImportState::Done => Ok(()),
        }
    }

    /// Whether the attached loader still wants an alias-completion pass.
    pub fn needs_alias_pass(&self) -> bool {
        matches!(self.state, ImportState::AliasPass(_))
    }

    //
    // Read interface
    //

    pub fn lookup(&self, name: impl AsRef<str>) -> Option<&Symbol> {
        self.dir.lookup(name)
    }

    /// All symbols in name order.
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.dir.iter()
    }

    pub fn num_symbols(&self) -> usize {
        self.dir.len()
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn timescale(&self) -> Timescale {
        self.timescale
    }

    pub fn time_range(&self) -> Option<TimeRange> {
        self.range
    }

    /// The value of the named signal at time `time`.
    ///
    /// An absent name is [`Error::UnknownSignal`], an ordinary recoverable
    /// result so that callers may probe speculative names. Any time before
    /// the signal's first event (including times below the global start)
    /// yields the width-correct all-X value.
    pub fn value_at(&self, name: impl AsRef<str>, time: Time) -> Result<Value> {
        let name = name.as_ref();
        let sym = self
            .lookup(name)
            .ok_or_else(|| Error::UnknownSignal(name.to_string()))?;
        let node = self.node(sym.node);

        let rv = match node.value_at(time) {
            Some(ent) => ent.value.clone(),
            None => Value::unknown(node.width()),
        };

        Ok(rv)
    }
}

/// Import-side write interface handed to a loader.
///
/// The builder is the sole writer to the trace; it enforces name
/// idempotence, width compatibility across aliases, per-node time
/// monotonicity, and tracks the global time range.
pub struct TraceBuilder<'a> {
    dir: &'a mut Directory,
    nodes: &'a mut Vec<Node>,
    timescale: &'a mut Timescale,
    range: &'a mut Option<TimeRange>,
    abort: &'a AtomicBool,
    dropped: u64,
}

impl TraceBuilder<'_> {
    /// Create a symbol and its node, or resolve to the existing node if the
    /// name is already declared. A width mismatch on re-declaration is an
    /// [`Error::AliasConflict`].
    pub fn declare_signal(&mut self, name: impl Into<String>, msb: i32, lsb: i32) -> Result<NodeId> {
        let name = name.into();
        let declared = (msb - lsb).abs() as u32 + 1;

        if let Some(sym) = self.dir.lookup(&name) {
            let existing = self.nodes[sym.node.0].width();
            if existing != declared {
                return Err(Error::AliasConflict {
                    name,
                    declared,
                    existing,
                });
            }
            return Ok(sym.node);
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(msb, lsb));
        self.dir.insert(name, id);

        Ok(id)
    }

    /// Bind a further name to an existing node.
    pub fn declare_alias(&mut self, name: impl Into<String>, node: NodeId) -> Result<NodeId> {
        let name = name.into();

        if let Some(sym) = self.dir.lookup(&name) {
            if sym.node == node {
                return Ok(node);
            }
            let declared = self.nodes[node.0].width();
            let existing = self.nodes[sym.node.0].width();
            if declared != existing {
                return Err(Error::AliasConflict {
                    name,
                    declared,
                    existing,
                });
            }
            return Ok(sym.node);
        }

        self.dir.insert(name, node);
        Ok(node)
    }

    /// Resolve an already declared name, for alias-completion scans.
    pub fn lookup_node(&self, name: impl AsRef<str>) -> Option<NodeId> {
        self.dir.lookup(name).map(|sym| sym.node)
    }

    pub fn node_width(&self, node: NodeId) -> u32 {
        self.nodes[node.0].width()
    }

    /// Append one value-change event, normalized to the node's width.
    ///
    /// An event older than the node's tail violates monotonicity; it is
    /// dropped and logged rather than aborting the load.
    pub fn append_event(&mut self, node: NodeId, time: Time, value: Value) {
        let n = &mut self.nodes[node.0];
        let value = value.normalize(n.width());

        match n.append(time, value) {
            Append::OutOfOrder => {
                self.dropped += 1;
                warn!(
                    "out-of-order event at t={} for node {} dropped",
                    time, node.0
                );
            }
            _ => self.note_time(time),
        }
    }

    /// Fold a timestamp into the global time range.
    pub fn note_time(&mut self, t: Time) {
        match self.range {
            Some(range) => range.extend_to(t),
            None => *self.range = Some(TimeRange(t, t)),
        }
    }

    pub fn set_timescale(&mut self, timescale: Timescale) {
        *self.timescale = timescale;
    }

    /// Polled by loaders between records for cooperative abort.
    pub fn aborted(&self) -> bool {
        self.abort.load(Ordering::Relaxed)
    }
}
