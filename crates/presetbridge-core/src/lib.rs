//! Sampler instrument conversion between EXS-style zone lists, SFZ and
//! DecentSampler presets.
//!
//! Importers build one canonical [`Instrument`] tree; exporters and the sample
//! materialization pass read it. Properties live on three levels (global,
//! group, region) and are only resolved against each other when sample files
//! are rendered.
//!
//! # Example
//!
//! ```
//! use presetbridge_core::PresetConverter;
//! use presetbridge_sfz::parse_sfz_str;
//!
//! let sfz = parse_sfz_str("<group> ampeg_release=0.4 <region> sample=C4.wav key=60").unwrap();
//! let mut converter = PresetConverter::new();
//! converter.import_sfz(&sfz);
//!
//! let preset = converter.to_xml().unwrap();
//! assert!(preset.contains(r#"<group release="0.4">"#));
//! ```

pub mod aiff;
pub mod bake;
pub mod config;
pub mod converter;
pub mod decode;
pub mod error;
pub mod exs;
pub mod inherit;
pub mod materialize;
pub mod model;
pub mod paths;
pub mod pcm;
pub mod riff;
pub mod sfz;
pub mod ui;
pub mod xml;

pub use config::{ConvertConfig, PathStyle, SampleHandling};
pub use converter::PresetConverter;
pub use decode::{SampleCodec, SymphoniaCodec};
pub use error::{BoundaryViolation, Error, Result};
pub use exs::{ExsGroup, ExsInstrument, ExsSample, ExsZone};
pub use materialize::{MaterializeMode, MaterializeOptions, MaterializeReport};
pub use model::{CrossfadeShape, Element, Group, Instrument, Properties, Region, SeqMode, Volume};
pub use paths::PathMode;
pub use pcm::{AudioData, AudioInfo, PcmCodec, WavCodec, WriteSpec};
