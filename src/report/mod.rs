//! Report output.

pub mod writer;

pub use writer::{
    save_to_path, write_combined_report, write_port_protocol_report, write_tag_report,
};
