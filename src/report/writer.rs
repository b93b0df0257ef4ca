//! CSV report writing.
//!
//! Each report is a fixed header row followed by one row per counter entry
//! in the counter's iteration order.

use crate::error::{ClassifyError, Result};
use crate::models::{PortProtocolCounts, TagCounts};
use csv::{Writer, WriterBuilder};
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use tracing::debug;

pub const TAG_HEADER: [&str; 2] = ["Tag", "Count"];
pub const PORT_PROTOCOL_HEADER: [&str; 3] = ["Port", "Protocol", "Count"];

/// Write the `Tag,Count` report.
pub fn write_tag_report<W: Write>(counts: &TagCounts, writer: W) -> Result<()> {
    let mut csv = WriterBuilder::new().from_writer(writer);
    write_tag_rows(&mut csv, counts)?;
    csv.flush()?;
    Ok(())
}

/// Write the `Port,Protocol,Count` report.
pub fn write_port_protocol_report<W: Write>(counts: &PortProtocolCounts, writer: W) -> Result<()> {
    let mut csv = WriterBuilder::new().from_writer(writer);
    write_port_protocol_rows(&mut csv, counts)?;
    csv.flush()?;
    Ok(())
}

/// Write both reports into one stream, tag section first.
pub fn write_combined_report<W: Write>(
    tag_counts: &TagCounts,
    port_protocol_counts: &PortProtocolCounts,
    writer: W,
) -> Result<()> {
    let mut csv = WriterBuilder::new().flexible(true).from_writer(writer);
    write_tag_rows(&mut csv, tag_counts)?;
    write_port_protocol_rows(&mut csv, port_protocol_counts)?;
    csv.flush()?;
    Ok(())
}

/// Create `path` and hand a writer for it to `write`.
///
/// On failure the file may be left partially written.
pub fn save_to_path<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut File) -> Result<()>,
{
    let mut file = File::create(path).map_err(|e| ClassifyError::from_open(path, e))?;
    write(&mut file).map_err(|e| e.with_path(path))?;
    debug!("Wrote report {}", path.display());
    Ok(())
}

fn write_tag_rows<W: Write>(csv: &mut Writer<W>, counts: &TagCounts) -> Result<()> {
    csv.write_record(TAG_HEADER).map_err(write_error)?;
    for (tag, count) in counts.iter() {
        csv.write_record([tag.as_str(), count.to_string().as_str()])
            .map_err(write_error)?;
    }
    Ok(())
}

fn write_port_protocol_rows<W: Write>(
    csv: &mut Writer<W>,
    counts: &PortProtocolCounts,
) -> Result<()> {
    csv.write_record(PORT_PROTOCOL_HEADER).map_err(write_error)?;
    for (key, count) in counts.iter() {
        csv.write_record([
            key.port.as_str(),
            key.protocol.as_str(),
            count.to_string().as_str(),
        ])
        .map_err(write_error)?;
    }
    Ok(())
}

fn write_error(err: csv::Error) -> ClassifyError {
    match err.into_kind() {
        csv::ErrorKind::Io(e) => ClassifyError::Io(e),
        other => ClassifyError::Io(io::Error::new(
            io::ErrorKind::Other,
            format!("{:?}", other),
        )),
    }
}
