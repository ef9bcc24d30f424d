//! MIDI input contract
//!
//! Only note messages are routed to the synthesizer; everything else a
//! keyboard sends (clock, aftertouch, controllers) is dropped here.

use crate::error::Result;

const NOTE_OFF: u8 = 0x80;
const NOTE_ON: u8 = 0x90;

/// A note message from the keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiMessage {
    NoteOn { key: u8, velocity: u8 },
    NoteOff { key: u8 },
}

impl MidiMessage {
    /// Interpret one raw MIDI message
    ///
    /// Note-on with velocity 0 is a note-off. The channel nibble is ignored;
    /// every note is played on synth channel 0.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let (&status, data) = bytes.split_first()?;
        let (&key, &velocity) = match data {
            [key, velocity, ..] => (key, velocity),
            _ => return None,
        };
        if key > 0x7F || velocity > 0x7F {
            return None;
        }
        match status & 0xF0 {
            NOTE_ON if velocity > 0 => Some(Self::NoteOn { key, velocity }),
            NOTE_ON | NOTE_OFF => Some(Self::NoteOff { key }),
            _ => None,
        }
    }
}

/// A MIDI keyboard port
pub trait MidiInput {
    /// Open a port: `device_id` picks a port index, `None` the first one
    ///
    /// Returns the port name.
    fn connect(&mut self, device_id: Option<usize>) -> Result<String>;

    /// Whether a port is open and still present
    fn is_connected(&mut self) -> bool;

    /// Close the port
    fn disconnect(&mut self);

    /// Note messages received since the last call
    fn poll(&mut self) -> Vec<MidiMessage>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_on_any_channel() {
        assert_eq!(
            MidiMessage::from_bytes(&[0x93, 60, 100]),
            Some(MidiMessage::NoteOn { key: 60, velocity: 100 })
        );
    }

    #[test]
    fn zero_velocity_note_on_is_note_off() {
        assert_eq!(
            MidiMessage::from_bytes(&[0x90, 64, 0]),
            Some(MidiMessage::NoteOff { key: 64 })
        );
        assert_eq!(
            MidiMessage::from_bytes(&[0x80, 64, 40]),
            Some(MidiMessage::NoteOff { key: 64 })
        );
    }

    #[test]
    fn other_messages_are_dropped() {
        assert_eq!(MidiMessage::from_bytes(&[0xB0, 7, 127]), None);
        assert_eq!(MidiMessage::from_bytes(&[0xF8]), None);
        assert_eq!(MidiMessage::from_bytes(&[0x90, 60]), None);
        assert_eq!(MidiMessage::from_bytes(&[]), None);
    }
}
