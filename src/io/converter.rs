use crate::{io::midi::MidiEvent, synth::message::SynthMessage, MAX_VOICES};

const CC_CHANNEL_VOLUME: u8 = 7;
const CC_ALL_SOUND_OFF: u8 = 120;
const CC_ALL_NOTES_OFF: u8 = 123;

/// Translate a decoded MIDI event into a synth control message.
///
/// Events on channels past the voice pool, and controllers we don't act on,
/// map to `None`.
pub fn midi_to_synth(midi: MidiEvent) -> Option<SynthMessage> {
    match midi {
        MidiEvent::NoteOn {
            channel,
            key,
            velocity: 0,
        }
        | MidiEvent::NoteOff { channel, key, .. } if in_pool(channel) => {
            Some(SynthMessage::NoteOff { channel, note: key })
        }
        MidiEvent::NoteOn {
            channel,
            key,
            velocity,
        } if in_pool(channel) => Some(SynthMessage::NoteOn {
            channel,
            note: key,
            velocity,
        }),
        MidiEvent::ProgramChange { channel, program } if in_pool(channel) => {
            Some(SynthMessage::SetInstrument {
                channel,
                instrument: program,
            })
        }
        MidiEvent::ControlChange {
            channel,
            controller,
            value,
        } if in_pool(channel) => match controller {
            CC_CHANNEL_VOLUME => Some(SynthMessage::AlterVolume {
                channel,
                velocity: value,
            }),
            CC_ALL_SOUND_OFF | CC_ALL_NOTES_OFF => Some(SynthMessage::AllNotesOff),
            _ => None,
        },
        MidiEvent::PitchBend { channel, value } if in_pool(channel) => {
            let amount = ((value.clamp(-8192, 8191) as i32 + 8192) >> 7) as u8;
            Some(SynthMessage::AlterPitch { channel, amount })
        }
        _ => None,
    }
}

fn in_pool(channel: u8) -> bool {
    (channel as usize) < MAX_VOICES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_velocity_note_on_is_note_off() {
        let msg = midi_to_synth(MidiEvent::NoteOn {
            channel: 0,
            key: 60,
            velocity: 0,
        });
        assert_eq!(msg, Some(SynthMessage::NoteOff { channel: 0, note: 60 }));
    }

    #[test]
    fn program_change_selects_instrument() {
        let msg = midi_to_synth(MidiEvent::ProgramChange {
            channel: 2,
            program: 7,
        });
        assert_eq!(
            msg,
            Some(SynthMessage::SetInstrument {
                channel: 2,
                instrument: 7
            })
        );
    }

    #[test]
    fn pitch_bend_maps_onto_seven_bits() {
        let bend = |value| match midi_to_synth(MidiEvent::PitchBend { channel: 1, value }) {
            Some(SynthMessage::AlterPitch { amount, .. }) => amount,
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(bend(-8192), 0);
        assert_eq!(bend(0), 64);
        assert_eq!(bend(8191), 127);
    }

    #[test]
    fn out_of_pool_channels_are_dropped() {
        let msg = midi_to_synth(MidiEvent::NoteOn {
            channel: MAX_VOICES as u8,
            key: 60,
            velocity: 100,
        });
        assert_eq!(msg, None);
    }

    #[test]
    fn unknown_controllers_are_dropped() {
        let msg = midi_to_synth(MidiEvent::ControlChange {
            channel: 0,
            controller: 64,
            value: 127,
        });
        assert_eq!(msg, None);
        let msg = midi_to_synth(MidiEvent::ControlChange {
            channel: 0,
            controller: 123,
            value: 0,
        });
        assert_eq!(msg, Some(SynthMessage::AllNotesOff));
    }
}
