pub mod test;
pub mod vcd;

use crate::error::*;
use crate::trace::{Trace, TraceBuilder};

use std::collections::HashMap;
use std::path::Path;

/// Contract between a format decoder and the import pipeline.
///
/// A loader recognizes exactly one wire format. Construction reads and
/// sniffs the byte source (failing fast with [`Error::FormatMismatch`]
/// before any trace is touched); the import pipeline then drives the two
/// passes. Unknown or extension records must be skipped, not fatal;
/// truncation mid-record is fatal.
pub trait LoadFormat: Send + Sync {
    /// Pass 1: walk the structural section and declare every symbol, its
    /// node, width and index range. Aliased names must converge to one
    /// shared node. Must be idempotent.
    fn declare(&mut self, builder: &mut TraceBuilder) -> Result<()>;

    /// Pass 2: walk the time-ordered event stream and append history
    /// entries. Aliasing was resolved in pass 1, so events recorded against
    /// any aliased name land in the shared history.
    fn populate(&mut self, builder: &mut TraceBuilder) -> Result<()>;

    /// Whether this format defers some alias declarations to a second
    /// structural scan. When true, the next `import_all` call runs
    /// [`LoadFormat::complete_aliases`]; when false it is a no-op.
    fn needs_alias_pass(&self) -> bool {
        false
    }

    /// Second structural scan for formats that declare aliases after first
    /// use. Only ever called once, and only if
    /// [`LoadFormat::needs_alias_pass`] returned true.
    fn complete_aliases(&mut self, _builder: &mut TraceBuilder) -> Result<()> {
        Ok(())
    }
}

pub type LoaderBox = Box<dyn LoadFormat>;
pub type LoaderCtor = fn(&Path) -> Result<LoaderBox>;

/// Filename-suffix keyed loader selection.
///
/// Loaders are picked by suffix convention, never by trial-and-error
/// across formats. The text value-change loader is built in; decoders for
/// other formats (`fst`, `ghw`, compressed transports) register here.
pub struct LoaderRegistry {
    ctors: HashMap<String, LoaderCtor>,
}

impl LoaderRegistry {
    pub fn new() -> Self {
        Self {
            ctors: HashMap::new(),
        }
    }

    pub fn with_builtin() -> Self {
        let mut rv = Self::new();
        rv.register("vcd", |path| {
            let loader: LoaderBox = Box::new(vcd::VcdLoader::new(path)?);
            Ok(loader)
        });

        rv
    }

    pub fn register(&mut self, suffix: impl Into<String>, ctor: LoaderCtor) {
        self.ctors.insert(suffix.into(), ctor);
    }

    /// Select a loader for `path` by its dotted suffix.
    ///
    /// Compound suffixes win over plain ones, so a loader registered for
    /// `vcd.gz` takes precedence over one for `gz`.
    pub fn loader_for(&self, path: impl AsRef<Path>) -> Result<LoaderBox> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut rest = name.as_str();
        while let Some(pos) = rest.find('.') {
            rest = &rest[pos + 1..];
            if let Some(ctor) = self.ctors.get(rest) {
                return ctor(path);
            }
        }

        Err(Error::UnknownFileFormat(name))
    }

    pub fn open(&self, path: impl AsRef<Path>) -> Result<Trace> {
        Ok(Trace::new(self.loader_for(path)?))
    }
}

impl Default for LoaderRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

#[cfg(test)]
mod reg_test {
    use super::*;

    #[test]
    fn test_suffix_selection() {
        let reg = LoaderRegistry::with_builtin();

        // no registered transport for compressed dumps
        assert!(matches!(
            reg.loader_for("waves.vcd.gz"),
            Err(Error::UnknownFileFormat(_))
        ));
        assert!(matches!(
            reg.loader_for("waves.fst"),
            Err(Error::UnknownFileFormat(_))
        ));
        assert!(matches!(
            reg.loader_for("no_suffix"),
            Err(Error::UnknownFileFormat(_))
        ));
    }

    #[test]
    fn test_compound_suffix_precedence() {
        fn nope(_: &Path) -> Result<LoaderBox> {
            Err(Error::Aborted)
        }

        let mut reg = LoaderRegistry::new();
        reg.register("gz", nope);
        reg.register("vcd.gz", |_| {
            let loader: LoaderBox = Box::new(test::TestLoader::empty());
            Ok(loader)
        });

        assert!(reg.loader_for("waves.vcd.gz").is_ok());
        assert!(reg.loader_for("waves.tar.gz").is_err());
    }
}
