use std::time::Instant;

use midir::{Ignore, MidiInput, MidiInputConnection};
use tracing::{debug, info};

use super::find_port;
use crate::port::InputProducer;
use crate::{Error, Result};

/// Open input connection. Messages stop flowing when it is dropped.
pub struct MidiInputPort {
    _connection: MidiInputConnection<()>,
    name: String,
}

impl MidiInputPort {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for MidiInputPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MidiInputPort")
            .field("name", &self.name)
            .finish()
    }
}

pub fn list_input_ports(client_name: &str) -> Result<Vec<String>> {
    let midi_input = MidiInput::new(client_name)?;
    Ok(midi_input
        .ports()
        .iter()
        .enumerate()
        .map(|(index, port)| {
            midi_input
                .port_name(port)
                .unwrap_or_else(|_| format!("Unknown Device {}", index))
        })
        .collect())
}

/// Opens the input side and feeds every message into `producer`.
///
/// With `connect_to` the first port whose name contains it is used; otherwise a
/// virtual port called `port_name` is created.
pub fn open_input(
    client_name: &str,
    port_name: &str,
    connect_to: Option<&str>,
    mut producer: InputProducer,
) -> Result<MidiInputPort> {
    let mut midi_input = MidiInput::new(client_name)?;
    // SysEx and clock are queued too; anything over three bytes is counted and dropped
    midi_input.ignore(Ignore::None);

    let callback = move |_timestamp: u64, message: &[u8], _: &mut ()| {
        producer.push_bytes(message, Instant::now());
    };

    match connect_to {
        Some(pattern) => {
            let ports = midi_input.ports();
            let names: Vec<String> = ports
                .iter()
                .map(|port| midi_input.port_name(port).unwrap_or_default())
                .collect();
            let index = find_port(&names, pattern).ok_or_else(|| {
                Error::MidiDevice(format!("No MIDI input matching '{}' found", pattern))
            })?;
            let name = names[index].clone();
            let connection = midi_input.connect(&ports[index], port_name, callback, ())?;
            info!("Connected MIDI input '{}'", name);
            Ok(MidiInputPort {
                _connection: connection,
                name,
            })
        }
        None => create_virtual(midi_input, port_name, callback),
    }
}

#[cfg(unix)]
fn create_virtual<F>(midi_input: MidiInput, port_name: &str, callback: F) -> Result<MidiInputPort>
where
    F: FnMut(u64, &[u8], &mut ()) + Send + 'static,
{
    use midir::os::unix::VirtualInput;

    let connection = midi_input.create_virtual(port_name, callback, ())?;
    debug!("Created virtual MIDI input '{}'", port_name);
    Ok(MidiInputPort {
        _connection: connection,
        name: port_name.to_string(),
    })
}

#[cfg(not(unix))]
fn create_virtual<F>(_midi_input: MidiInput, port_name: &str, _callback: F) -> Result<MidiInputPort>
where
    F: FnMut(u64, &[u8], &mut ()) + Send + 'static,
{
    debug!("Virtual MIDI input '{}' requested", port_name);
    Err(Error::MidiPort(
        "virtual ports are not supported on this platform; set connect_input".to_string(),
    ))
}
