//! MIDI keyboard input through midir
//!
//! The midir callback runs on its own thread and only forwards raw bytes
//! into a channel; note filtering happens on the frame loop in `poll`.

use crossbeam_channel::{unbounded, Receiver, Sender};
use pirate_synth::{MidiInput, MidiMessage, Result, SynthError};
use tracing::{debug, info, warn};

const CLIENT_NAME: &str = "pirate-synth";

/// ALSA always exposes a loopback port; it never has a keyboard behind it
const THROUGH_PORT_MARKER: &str = "Through";

/// [`MidiInput`] backed by a midir connection
pub struct MidirInput {
    connection: Option<midir::MidiInputConnection<()>>,
    port_name: Option<String>,
    event_tx: Sender<Vec<u8>>,
    event_rx: Receiver<Vec<u8>>,
}

impl MidirInput {
    pub fn new() -> Self {
        let (event_tx, event_rx) = unbounded();
        Self {
            connection: None,
            port_name: None,
            event_tx,
            event_rx,
        }
    }

    fn client() -> Result<midir::MidiInput> {
        midir::MidiInput::new(CLIENT_NAME)
            .map_err(|e| SynthError::device(format!("MIDI subsystem unavailable: {e}")))
    }

    fn port_names(client: &midir::MidiInput) -> Vec<String> {
        client
            .ports()
            .iter()
            .map(|port| client.port_name(port).unwrap_or_default())
            .collect()
    }
}

impl Default for MidirInput {
    fn default() -> Self {
        Self::new()
    }
}

/// Port index to open: the configured one, else the first real keyboard
///
/// With no configured id, a list holding only loopback ports counts as no
/// keyboard so the caller keeps polling for one.
fn choose_port(names: &[String], device_id: Option<usize>) -> Option<usize> {
    match device_id {
        Some(id) => (id < names.len()).then_some(id),
        None => names
            .iter()
            .position(|name| !name.contains(THROUGH_PORT_MARKER)),
    }
}

impl MidiInput for MidirInput {
    fn connect(&mut self, device_id: Option<usize>) -> Result<String> {
        self.disconnect();

        let client = Self::client()?;
        let ports = client.ports();
        let names = Self::port_names(&client);
        debug!(ports = ?names, "MIDI input ports");

        let index = choose_port(&names, device_id).ok_or_else(|| match device_id {
            Some(id) => SynthError::device(format!("MIDI port {id} not present")),
            None => SynthError::device("No MIDI keyboard among input ports"),
        })?;
        let port = ports
            .get(index)
            .ok_or_else(|| SynthError::device("MIDI port list changed"))?;
        let name = names.get(index).cloned().unwrap_or_default();

        let tx = self.event_tx.clone();
        let connection = client
            .connect(
                port,
                "pirate-synth-in",
                move |_timestamp, message, _| {
                    let _ = tx.send(message.to_vec());
                },
                (),
            )
            .map_err(|e| SynthError::device(format!("Cannot open MIDI port {name}: {e}")))?;

        info!(port = %name, "MIDI keyboard connected");
        self.connection = Some(connection);
        self.port_name = Some(name.clone());
        Ok(name)
    }

    fn is_connected(&mut self) -> bool {
        let Some(name) = self.port_name.clone() else {
            return false;
        };
        let present = match Self::client() {
            Ok(client) => Self::port_names(&client).contains(&name),
            Err(e) => {
                warn!(error = %e, "Cannot list MIDI ports");
                false
            }
        };
        if !present {
            warn!(port = %name, "MIDI keyboard disconnected");
            self.disconnect();
        }
        present
    }

    fn disconnect(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.close();
        }
        self.port_name = None;
        // Bytes from the old port are stale
        while self.event_rx.try_recv().is_ok() {}
    }

    fn poll(&mut self) -> Vec<MidiMessage> {
        self.event_rx
            .try_iter()
            .filter_map(|bytes| MidiMessage::from_bytes(&bytes))
            .collect()
    }
}

impl Drop for MidirInput {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn skips_through_port_by_default() {
        let ports = names(&["Midi Through:Midi Through Port-0 14:0", "Keystation 49:0 20:0"]);
        assert_eq!(choose_port(&ports, None), Some(1));
    }

    #[test]
    fn through_port_alone_is_no_keyboard() {
        let ports = names(&["Midi Through:Midi Through Port-0 14:0"]);
        assert_eq!(choose_port(&ports, None), None);
        assert_eq!(choose_port(&[], None), None);
    }

    #[test]
    fn configured_id_may_pick_through_port() {
        let ports = names(&["Midi Through:Midi Through Port-0 14:0"]);
        assert_eq!(choose_port(&ports, Some(0)), Some(0));
    }

    #[test]
    fn configured_id_must_exist() {
        let ports = names(&["a", "b"]);
        assert_eq!(choose_port(&ports, Some(1)), Some(1));
        assert_eq!(choose_port(&ports, Some(2)), None);
    }

    #[test]
    fn poll_filters_queued_bytes() {
        let mut input = MidirInput::new();
        input.event_tx.send(vec![0x90, 60, 90]).unwrap();
        input.event_tx.send(vec![0xF8]).unwrap();
        input.event_tx.send(vec![0x80, 60, 0]).unwrap();
        assert_eq!(
            input.poll(),
            vec![
                MidiMessage::NoteOn { key: 60, velocity: 90 },
                MidiMessage::NoteOff { key: 60 },
            ]
        );
        assert!(!input.is_connected());
    }
}
