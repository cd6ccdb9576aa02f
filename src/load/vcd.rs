use super::*;
use crate::data::{Bit, Time, Timescale, Value};
use crate::node::NodeId;

use log::debug;
use std::collections::HashMap;
use std::path::Path;

/// Reference decoder for the line-oriented text value-change format.
///
/// Reads the whole byte source up front (the file handle is released
/// before parsing starts), sniffs the structural preamble, and decodes the
/// header and event sections on the two import passes. Unknown `$`-records
/// are skipped for forward compatibility.
pub struct VcdLoader {
    text: String,
    body_start: usize,
    ids: HashMap<String, NodeId>,
}

impl VcdLoader {
    pub fn new(filename: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read(filename.as_ref())?;
        Self::from_source(String::from_utf8_lossy(&raw).into_owned())
    }

    /// Build a loader from an already acquired byte source.
    pub fn from_source(text: impl Into<String>) -> Result<Self> {
        let text = text.into();

        // fail fast on anything that does not open with a header keyword
        match text.split_ascii_whitespace().next() {
            Some(tok) if tok.starts_with('$') => {}
            _ => {
                return Err(Error::FormatMismatch(
                    "expected a $-keyword preamble".to_string(),
                ));
            }
        }

        Ok(Self {
            text,
            body_start: 0,
            ids: HashMap::new(),
        })
    }

    fn declare_var(&mut self, builder: &mut TraceBuilder, scopes: &[String], parts: &[&str]) -> Result<()> {
        if parts.len() < 4 {
            return Err(Error::Truncated("$var record".to_string()));
        }

        let width: u32 = parts[1].parse().map_err(|_| {
            Error::FormatMismatch(format!("bad $var width '{}'", parts[1]))
        })?;
        let id_code = parts[2];
        // reference name plus an optional separate "[msb:lsb]" token
        let reference: String = parts[3..].concat();

        let name = if scopes.is_empty() {
            reference.clone()
        } else {
            format!("{}.{}", scopes.join("."), reference)
        };

        if let Some(&node) = self.ids.get(id_code) {
            // repeated id code: this name is an alias of the earlier node
            if builder.node_width(node) != width {
                return Err(Error::AliasConflict {
                    name,
                    declared: width,
                    existing: builder.node_width(node),
                });
            }
            builder.declare_alias(name, node)?;
        } else {
            let (msb, lsb) = parse_range(&reference)
                .unwrap_or((width as i32 - 1, 0));
            let node = builder.declare_signal(name, msb, lsb)?;
            self.ids.insert(id_code.to_string(), node);
        }

        Ok(())
    }
}

impl LoadFormat for VcdLoader {
    fn declare(&mut self, builder: &mut TraceBuilder) -> Result<()> {
        let text = std::mem::take(&mut self.text);
        let res = (|| {
            let mut toks = Tokens::new(&text);
            let mut scopes: Vec<String> = Vec::new();
            self.ids.clear();

            while let Some(tok) = toks.next() {
                match tok {
                    "$scope" => {
                        let parts = collect_until_end(&mut toks, "$scope")?;
                        if parts.len() < 2 {
                            return Err(Error::Truncated("$scope record".to_string()));
                        }
                        scopes.push(parts[1].to_string());
                    }

                    "$upscope" => {
                        collect_until_end(&mut toks, "$upscope")?;
                        scopes.pop();
                    }

                    "$timescale" => {
                        let parts = collect_until_end(&mut toks, "$timescale")?;
                        let ts = Timescale::from_string(parts.concat())?;
                        builder.set_timescale(ts);
                    }

                    "$var" => {
                        let parts = collect_until_end(&mut toks, "$var")?;
                        self.declare_var(builder, &scopes, &parts)?;
                    }

                    "$enddefinitions" => {
                        collect_until_end(&mut toks, "$enddefinitions")?;
                        self.body_start = text.len() - toks.remaining();
                        return Ok(());
                    }

                    t if t.starts_with('$') => {
                        // $date, $version, $comment, extensions
                        collect_until_end(&mut toks, t)?;
                    }

                    t => {
                        debug!("skipping stray header token '{}'", t);
                    }
                }
            }

            Err(Error::Truncated(
                "header without $enddefinitions".to_string(),
            ))
        })();

        self.text = text;
        res
    }

    fn populate(&mut self, builder: &mut TraceBuilder) -> Result<()> {
        let mut toks = Tokens::new(&self.text[self.body_start..]);
        let mut cur_t: Time = 0;
        let mut records = 0usize;

        while let Some(tok) = toks.next() {
            records += 1;
            if records % 4096 == 0 && builder.aborted() {
                return Err(Error::Aborted);
            }

            let mut chars = tok.chars();
            let first = match chars.next() {
                Some(c) => c,
                None => continue,
            };

            match first {
                '#' => {
                    cur_t = tok[1..].parse().map_err(|_| {
                        Error::FormatMismatch(format!("bad timestamp '{}'", tok))
                    })?;
                    builder.note_time(cur_t);
                }

                'b' | 'B' => {
                    let id_code = toks.next().ok_or_else(|| {
                        Error::Truncated(format!("vector value '{}' without id code", tok))
                    })?;
                    let bits: Option<Vec<Bit>> = tok[1..].chars().map(Bit::from_char).collect();

                    match (bits, self.ids.get(id_code)) {
                        (Some(bits), Some(&node)) => {
                            builder.append_event(node, cur_t, Value::Vector(bits));
                        }
                        (None, _) => debug!("skipping malformed vector '{}'", tok),
                        (_, None) => debug!("value change for undeclared id '{}'", id_code),
                    }
                }

                'r' | 'R' | 's' | 'S' => {
                    // real and string changes carry no bit value
                    toks.next().ok_or_else(|| {
                        Error::Truncated(format!("value '{}' without id code", tok))
                    })?;
                    debug!("skipping non-logic value change '{}'", tok);
                }

                '$' => match tok {
                    "$dumpvars" | "$dumpall" | "$dumpon" | "$dumpoff" | "$end" => {}
                    t => {
                        debug!("skipping unknown record '{}'", t);
                        collect_until_end(&mut toks, t)?;
                    }
                },

                _ => {
                    if let Some(bit) = Bit::from_char(first) {
                        let id_code = chars.as_str();
                        if let Some(&node) = self.ids.get(id_code) {
                            builder.append_event(node, cur_t, Value::Bit(bit));
                        } else {
                            debug!("value change for undeclared id '{}'", id_code);
                        }
                    } else {
                        debug!("skipping unrecognized token '{}'", tok);
                    }
                }
            }
        }

        Ok(())
    }
}

struct Tokens<'a> {
    rest: &'a str,
}

impl<'a> Tokens<'a> {
    fn new(s: &'a str) -> Self {
        Self { rest: s }
    }

    fn next(&mut self) -> Option<&'a str> {
        self.rest = self.rest.trim_start();
        if self.rest.is_empty() {
            return None;
        }

        let end = self
            .rest
            .find(char::is_whitespace)
            .unwrap_or(self.rest.len());
        let (tok, rest) = self.rest.split_at(end);
        self.rest = rest;

        Some(tok)
    }

    fn remaining(&self) -> usize {
        self.rest.len()
    }
}

fn collect_until_end<'a>(toks: &mut Tokens<'a>, what: &str) -> Result<Vec<&'a str>> {
    let mut rv = Vec::new();

    loop {
        match toks.next() {
            Some("$end") => return Ok(rv),
            Some(t) => rv.push(t),
            None => return Err(Error::Truncated(format!("{} without $end", what))),
        }
    }
}

/// Parse a trailing `[msb:lsb]` or `[bit]` out of a reference name.
fn parse_range(reference: &str) -> Option<(i32, i32)> {
    let open = reference.rfind('[')?;
    let inner = reference[open + 1..].strip_suffix(']')?;

    match inner.find(':') {
        Some(colon) => {
            let msb = inner[..colon].parse().ok()?;
            let lsb = inner[colon + 1..].parse().ok()?;
            Some((msb, lsb))
        }
        None => {
            let bit = inner.parse().ok()?;
            Some((bit, bit))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::trace::Trace;

    const SMALL: &str = "\
$date today $end
$version wavedb test $end
$timescale 1 ns $end
$scope module top $end
$var wire 1 ! clk $end
$var wire 4 \" data [3:0] $end
$var wire 4 \" data_shadow [3:0] $end
$upscope $end
$enddefinitions $end
#0
$dumpvars
0!
b0 \"
$end
#5
1!
b101 \"
#10
0!
";

    fn import(source: &str) -> Trace {
        let loader: LoaderBox = Box::new(VcdLoader::from_source(source).unwrap());
        let mut trace = Trace::new(loader);
        trace.import_all().unwrap();
        trace
    }

    #[test]
    fn test_parse_range() {
        assert_eq!(Some((7, 0)), parse_range("cycle[7:0]"));
        assert_eq!(Some((3, 3)), parse_range("flag[3]"));
        assert_eq!(None, parse_range("plain"));
        assert_eq!(None, parse_range("weird["));
    }

    #[test]
    fn test_header_declarations() {
        let trace = import(SMALL);

        assert_eq!(3, trace.num_symbols());
        assert_eq!(2, trace.num_nodes());
        assert_eq!(Timescale::from_string("1ns").unwrap(), trace.timescale());

        let clk = trace.lookup("top.clk").unwrap();
        assert_eq!(1, trace.node(clk.node).width());

        let data = trace.lookup("top.data[3:0]").unwrap();
        assert_eq!(4, trace.node(data.node).width());
        assert_eq!(3, trace.node(data.node).msb());
        assert_eq!(0, trace.node(data.node).lsb());
    }

    #[test]
    fn test_events_and_hold_semantics() {
        let trace = import(SMALL);

        assert_eq!("0", trace.value_at("top.clk", 0).unwrap().to_string());
        assert_eq!("1", trace.value_at("top.clk", 5).unwrap().to_string());
        assert_eq!("1", trace.value_at("top.clk", 9).unwrap().to_string());
        assert_eq!("0", trace.value_at("top.clk", 10).unwrap().to_string());
        // short vector literal extends to the declared width
        assert_eq!("0101", trace.value_at("top.data[3:0]", 7).unwrap().to_string());
        // before the first event: width-correct unknown
        assert_eq!("xxxx", trace.value_at("top.data[3:0]", -1).unwrap().to_string());
    }

    #[test]
    fn test_alias_converges_to_shared_node() {
        let trace = import(SMALL);

        let a = trace.lookup("top.data[3:0]").unwrap().node;
        let b = trace.lookup("top.data_shadow[3:0]").unwrap().node;
        assert_eq!(a, b);

        for t in [-1, 0, 5, 7, 100] {
            assert_eq!(
                trace.value_at("top.data[3:0]", t).unwrap(),
                trace.value_at("top.data_shadow[3:0]", t).unwrap()
            );
        }
    }

    #[test]
    fn test_alias_width_conflict() {
        let source = "\
$scope module top $end
$var wire 4 ! a [3:0] $end
$var wire 8 ! b [7:0] $end
$upscope $end
$enddefinitions $end
";
        let loader: LoaderBox = Box::new(VcdLoader::from_source(source).unwrap());
        let mut trace = Trace::new(loader);

        assert!(matches!(
            trace.import_all(),
            Err(Error::AliasConflict { .. })
        ));
        // discardable, never partially queryable
        assert_eq!(0, trace.num_symbols());
    }

    #[test]
    fn test_format_mismatch_fails_fast() {
        assert!(matches!(
            VcdLoader::from_source("PK\x03\x04 not a dump"),
            Err(Error::FormatMismatch(_))
        ));
        assert!(matches!(
            VcdLoader::from_source(""),
            Err(Error::FormatMismatch(_))
        ));
    }

    #[test]
    fn test_truncated_header() {
        let source = "$scope module top $end\n$var wire 1 ! clk $end\n";
        let loader: LoaderBox = Box::new(VcdLoader::from_source(source).unwrap());
        let mut trace = Trace::new(loader);

        assert!(matches!(trace.import_all(), Err(Error::Truncated(_))));
    }

    #[test]
    fn test_out_of_order_event_dropped_not_fatal() {
        // event stream with a rewinding timestamp in the middle
        let source = "\
$scope module t $end
$var wire 1 ! s $end
$upscope $end
$enddefinitions $end
#0
0!
#10
1!
#5
0!
#20
1!
";
        let loader: LoaderBox = Box::new(VcdLoader::from_source(source).unwrap());
        let mut trace = Trace::new(loader);
        trace.import_all().unwrap();

        let node = trace.lookup("t.s").unwrap().node;
        // the #5 record was dropped, the rest survived
        assert_eq!(3, trace.node(node).num_hist());
        assert_eq!("1", trace.value_at("t.s", 10).unwrap().to_string());
        assert_eq!("1", trace.value_at("t.s", 25).unwrap().to_string());
    }

    #[test]
    fn test_unknown_records_skipped() {
        let source = "\
$fancyextension anything at all $end
$scope module top $end
$var wire 1 ! clk $end
$upscope $end
$enddefinitions $end
#0
$comment mid-stream $end
r3.14 %
1!
#4
0!
";
        let trace = import(source);

        assert_eq!("1", trace.value_at("top.clk", 2).unwrap().to_string());
        assert_eq!("0", trace.value_at("top.clk", 4).unwrap().to_string());
    }

    #[test]
    fn test_truncated_vector_record() {
        let source = "\
$scope module top $end
$var wire 4 ! d [3:0] $end
$upscope $end
$enddefinitions $end
#0
b1010";
        let loader: LoaderBox = Box::new(VcdLoader::from_source(source).unwrap());
        let mut trace = Trace::new(loader);

        assert!(matches!(trace.import_all(), Err(Error::Truncated(_))));
    }
}
