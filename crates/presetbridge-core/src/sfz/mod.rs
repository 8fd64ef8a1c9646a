//! SFZ ↔ canonical tree mapping.
//!
//! Both directions share one opcode vocabulary; anything outside it is logged
//! on import and never written on export.

mod export;
mod import;

pub use export::export_sfz;
pub use import::import_sfz;

use std::fmt;

/// Opcodes the converter understands, in the order they are applied.
pub const SUPPORTED_OPCODES: &[&str] = &[
    "group_label",
    "amp_veltrack",
    "ampeg_attack",
    "ampeg_decay",
    "ampeg_sustain",
    "ampeg_release",
    "group",
    "off_by",
    "off_mode",
    "offset",
    "end",
    "lokey",
    "hikey",
    "key",
    "pitch_keycenter",
    "lovel",
    "hivel",
    "loop_mode",
    "loop_start",
    "loop_end",
    "sample",
    "seq_position",
    "seq_length",
    "sw_previous",
    "trigger",
    "tune",
    "volume",
    "pan",
    "pitch_keytrack",
];

/// The tree level a set of opcodes lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Global,
    Group,
    Region,
}

impl Level {
    pub fn header(self) -> &'static str {
        match self {
            Level::Global => "<global>",
            Level::Group => "<group>",
            Level::Region => "<region>",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

/// Whole-number scaling that ignores float noise just below an integer
/// (`0.29 * 100.0` is `28.999999999999996`).
fn scaled_int(value: f64, factor: f64) -> i64 {
    let scaled = value * factor;
    let nearest = scaled.round();
    if (scaled - nearest).abs() < 1e-6 {
        nearest as i64
    } else {
        scaled.trunc() as i64
    }
}
