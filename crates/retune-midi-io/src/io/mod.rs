//! Hardware and virtual MIDI ports through midir.

mod input;
mod output;

pub use input::{list_input_ports, open_input, MidiInputPort};
pub use output::{list_output_ports, open_output};

/// First name containing `pattern`, ignoring case.
fn find_port(names: &[String], pattern: &str) -> Option<usize> {
    let pattern = pattern.to_lowercase();
    names
        .iter()
        .position(|name| name.to_lowercase().contains(&pattern))
}
