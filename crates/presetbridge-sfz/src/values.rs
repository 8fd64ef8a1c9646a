use std::str::FromStr;

use crate::error::Error;
use crate::Result;

fn invalid(value: &str, expected: &'static str) -> Error {
    Error::InvalidValue {
        value: value.to_string(),
        expected,
    }
}

/// Typed reading of an opcode's text value.
pub trait OpcodeValue: Sized {
    fn parse_opcode(s: &str) -> Result<Self>;
}

impl OpcodeValue for i32 {
    fn parse_opcode(s: &str) -> Result<Self> {
        s.trim().parse().map_err(|_| invalid(s, "integer"))
    }
}

// offset/end/loop points are frame indices and can pass i32::MAX
impl OpcodeValue for i64 {
    fn parse_opcode(s: &str) -> Result<Self> {
        s.trim().parse().map_err(|_| invalid(s, "integer"))
    }
}

impl OpcodeValue for f64 {
    fn parse_opcode(s: &str) -> Result<Self> {
        s.trim().parse().map_err(|_| invalid(s, "number"))
    }
}

/// Value of the `loop_mode` opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopMode {
    NoLoop,
    OneShot,
    LoopContinuous,
    /// Loops while the key is held, then plays out
    LoopSustain,
}

impl LoopMode {
    /// Both loop modes repeat the loop section; the others never do.
    pub fn is_looping(self) -> bool {
        matches!(self, LoopMode::LoopContinuous | LoopMode::LoopSustain)
    }
}

impl FromStr for LoopMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mode = match s.trim().to_ascii_lowercase().as_str() {
            "no_loop" => LoopMode::NoLoop,
            "one_shot" => LoopMode::OneShot,
            "loop_continuous" | "loop" => LoopMode::LoopContinuous,
            "loop_sustain" => LoopMode::LoopSustain,
            _ => return Err(invalid(s, "loop mode")),
        };
        Ok(mode)
    }
}

impl OpcodeValue for LoopMode {
    fn parse_opcode(s: &str) -> Result<Self> {
        s.parse()
    }
}

/// A MIDI note number, written either as a number or a note name
///
/// Note names follow the SFZ convention where middle C is `c4` (60):
///
/// ```
/// use presetbridge_sfz::{MidiNote, OpcodeValue};
///
/// assert_eq!(MidiNote::parse_opcode("c4").unwrap(), MidiNote(60));
/// assert_eq!(MidiNote::parse_opcode("F#3").unwrap(), MidiNote(54));
/// assert_eq!(MidiNote::parse_opcode("eb-1").unwrap(), MidiNote(3));
/// assert_eq!(MidiNote::parse_opcode("72").unwrap(), MidiNote(72));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MidiNote(pub i32);

impl OpcodeValue for MidiNote {
    fn parse_opcode(s: &str) -> Result<Self> {
        let text = s.trim();
        if let Ok(number) = text.parse::<i32>() {
            return Ok(MidiNote(number));
        }

        let lower = text.to_ascii_lowercase();
        let mut chars = lower.chars();
        let pitch_class = match chars.next() {
            Some('c') => 0,
            Some('d') => 2,
            Some('e') => 4,
            Some('f') => 5,
            Some('g') => 7,
            Some('a') => 9,
            Some('b') => 11,
            _ => return Err(invalid(s, "note")),
        };
        let rest = chars.as_str();
        let (accidental, octave) = match rest.chars().next() {
            Some('#') => (1, &rest[1..]),
            Some('b') if rest.len() > 1 => (-1, &rest[1..]),
            _ => (0, rest),
        };
        let octave: i32 = octave.parse().map_err(|_| invalid(s, "note"))?;
        octave
            .checked_add(1)
            .and_then(|o| o.checked_mul(12))
            .and_then(|n| n.checked_add(pitch_class + accidental))
            .map(MidiNote)
            .ok_or_else(|| invalid(s, "note"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numbers() {
        assert_eq!(i32::parse_opcode("60").unwrap(), 60);
        assert_eq!(i64::parse_opcode("4294967296").unwrap(), 4_294_967_296);
        assert_eq!(f64::parse_opcode("-6.5").unwrap(), -6.5);
        assert!(i32::parse_opcode("sixty").is_err());
    }

    #[test]
    fn test_loop_mode() {
        assert_eq!("loop_continuous".parse::<LoopMode>().unwrap(), LoopMode::LoopContinuous);
        assert_eq!("LOOP_SUSTAIN".parse::<LoopMode>().unwrap(), LoopMode::LoopSustain);
        assert!(LoopMode::LoopSustain.is_looping());
        assert!(!LoopMode::OneShot.is_looping());
        assert!("bounce".parse::<LoopMode>().is_err());
    }

    #[test]
    fn test_note_names() {
        assert_eq!(MidiNote::parse_opcode("a4").unwrap(), MidiNote(69));
        assert_eq!(MidiNote::parse_opcode("Bb2").unwrap(), MidiNote(46));
        assert_eq!(MidiNote::parse_opcode("c-1").unwrap(), MidiNote(0));
        assert!(MidiNote::parse_opcode("h3").is_err());
        assert!(MidiNote::parse_opcode("b").is_err());
        assert!(MidiNote::parse_opcode("c999999999").is_err());
        assert!(MidiNote::parse_opcode("c-999999999").is_err());

        let err = MidiNote::parse_opcode("x9").unwrap_err();
        assert_eq!(err.to_string(), "'x9' is not a valid note");
    }
}
