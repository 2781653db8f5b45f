//! CSV output formatting.

use super::OpenEndpoint;
use std::io::Write;

/// Write endpoints as CSV with a `host,port` header.
pub fn write_csv<W: Write>(endpoints: &[OpenEndpoint], out: W) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(out);

    wtr.write_record(["host", "port"])?;
    for endpoint in endpoints {
        wtr.write_record([endpoint.host.as_str(), &endpoint.port.to_string()])?;
    }

    wtr.flush()?;
    Ok(())
}
