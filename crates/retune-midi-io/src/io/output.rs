use midir::{MidiOutput, MidiOutputConnection};
use tracing::{debug, info};

use super::find_port;
use crate::{Error, Result};

pub fn list_output_ports(client_name: &str) -> Result<Vec<String>> {
    let midi_output = MidiOutput::new(client_name)?;
    Ok(midi_output
        .ports()
        .iter()
        .enumerate()
        .map(|(index, port)| {
            midi_output
                .port_name(port)
                .unwrap_or_else(|_| format!("Unknown Device {}", index))
        })
        .collect())
}

/// Opens the output side: the first port matching `connect_to`, or a virtual port.
pub fn open_output(
    client_name: &str,
    port_name: &str,
    connect_to: Option<&str>,
) -> Result<MidiOutputConnection> {
    let midi_output = MidiOutput::new(client_name)?;

    match connect_to {
        Some(pattern) => {
            let ports = midi_output.ports();
            let names: Vec<String> = ports
                .iter()
                .map(|port| midi_output.port_name(port).unwrap_or_default())
                .collect();
            let index = find_port(&names, pattern).ok_or_else(|| {
                Error::MidiDevice(format!("No MIDI output matching '{}' found", pattern))
            })?;
            let connection = midi_output.connect(&ports[index], port_name)?;
            info!("Connected MIDI output '{}'", names[index]);
            Ok(connection)
        }
        None => create_virtual(midi_output, port_name),
    }
}

#[cfg(unix)]
fn create_virtual(midi_output: MidiOutput, port_name: &str) -> Result<MidiOutputConnection> {
    use midir::os::unix::VirtualOutput;

    let connection = midi_output.create_virtual(port_name)?;
    debug!("Created virtual MIDI output '{}'", port_name);
    Ok(connection)
}

#[cfg(not(unix))]
fn create_virtual(_midi_output: MidiOutput, port_name: &str) -> Result<MidiOutputConnection> {
    debug!("Virtual MIDI output '{}' requested", port_name);
    Err(Error::MidiPort(
        "virtual ports are not supported on this platform; set connect_output".to_string(),
    ))
}
