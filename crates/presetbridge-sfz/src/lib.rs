//! SFZ reading for presetbridge.
//!
//! Parses SFZ text into a three-level section tree (global → group → region)
//! without flattening opcode inheritance, so a converter can map each level to
//! the matching level of another format.
//!
//! # Example
//!
//! ```
//! use presetbridge_sfz::parse_sfz_str;
//!
//! let sfz = parse_sfz_str("<group> volume=-3 <region> sample=C4.wav key=60").unwrap();
//! assert_eq!(sfz.groups[0].section.get("volume"), Some("-3"));
//! assert_eq!(sfz.groups[0].regions[0].get("key"), Some("60"));
//! ```

use std::fs;
use std::path::Path;

mod error;
mod parse;
mod types;
mod values;
pub mod path_utils;

pub use error::Error;
pub use types::{SfzFile, SfzGroup, SfzSection, SfzSectionType};
pub use values::{LoopMode, MidiNote, OpcodeValue};

pub type Result<T> = std::result::Result<T, Error>;

/// Parse SFZ content from a string
pub fn parse_sfz_str(content: &str) -> Result<SfzFile> {
    parse::parse_sfz(content)
}

/// Parse an SFZ file from disk, remembering its absolute location so sample
/// paths can be resolved relative to it
pub fn parse_sfz_file<P: AsRef<Path>>(path: P) -> Result<SfzFile> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let mut sfz = parse_sfz_str(&content)?;

    let absolute_path = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    sfz.source_file = Some(absolute_path);
    Ok(sfz)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_sfz_file_records_source() {
        let mut file = tempfile::Builder::new().suffix(".sfz").tempfile().unwrap();
        writeln!(file, "<region> sample=kick.wav key=36").unwrap();

        let sfz = parse_sfz_file(file.path()).unwrap();
        let source = sfz.source_file.clone().unwrap();
        assert!(source.is_absolute());

        let sample = sfz.resolve_sample_path(&sfz.groups[0].regions[0]).unwrap();
        assert_eq!(sample, source.parent().unwrap().join("kick.wav"));
    }

    #[test]
    fn test_parse_missing_file() {
        let err = parse_sfz_file("/definitely/not/here.sfz").unwrap_err();
        assert!(matches!(err, Error::IO(_)));
    }
}
