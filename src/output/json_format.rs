//! JSON output formatting.

use super::OpenEndpoint;
use std::io::{self, Write};

/// Write endpoints as a pretty-printed JSON array.
pub fn write_json<W: Write>(endpoints: &[OpenEndpoint], mut out: W) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut out, endpoints)?;
    writeln!(out)
}
