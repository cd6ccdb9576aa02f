//! In-memory waveform trace database.
//!
//! Imports digital-circuit simulation dumps into a per-signal value-change
//! history and answers `value_at(signal, time)` point queries in
//! logarithmic time. Format decoders plug into one ingestion contract
//! ([`load::LoadFormat`]); the text value-change format is built in.

pub mod data;
pub mod dir;
pub mod error;
pub mod index;
pub mod load;
pub mod node;
pub mod trace;

pub use data::{Bit, SimTimeUnit, Time, TimeRange, Timescale, Value};
pub use dir::{Directory, Symbol};
pub use error::{Error, Result};
pub use load::{LoadFormat, LoaderBox, LoaderRegistry};
pub use node::{HistEnt, Node, NodeId};
pub use trace::{Trace, TraceBuilder};
