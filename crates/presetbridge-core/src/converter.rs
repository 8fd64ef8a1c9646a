use std::path::Path;

use presetbridge_sfz::SfzFile;

use crate::error::Result;
use crate::exs::{import_exs, ExsInstrument};
use crate::materialize::{self, MaterializeOptions, MaterializeReport};
use crate::model::Instrument;
use crate::paths::{self, PathMode};
use crate::decode::SampleCodec;
use crate::pcm::PcmCodec;
use crate::sfz;
use crate::xml;

/// One conversion pipeline: owns the instrument being converted.
///
/// Stages run in order: import, locate samples, convert millisecond
/// crossfades, then either materialize or rewrite paths, then export. A stage
/// that fails leaves the instrument as it was before that stage, and later
/// stages should not run.
pub struct PresetConverter {
    instrument: Instrument,
    codec: Box<dyn PcmCodec>,
}

impl Default for PresetConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl PresetConverter {
    pub fn new() -> Self {
        Self::with_codec(Box::new(SampleCodec))
    }

    pub fn with_codec(codec: Box<dyn PcmCodec>) -> Self {
        Self {
            instrument: Instrument::new(),
            codec,
        }
    }

    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    /// Replace the current instrument with a decoded EXS instrument.
    pub fn import_exs(&mut self, source: &ExsInstrument, generic_ui: bool) {
        self.instrument = import_exs(source, generic_ui);
    }

    /// Replace the current instrument with a parsed SFZ file.
    pub fn import_sfz(&mut self, source: &SfzFile) {
        self.instrument = sfz::import_sfz(source);
    }

    pub fn locate_samples(&mut self, search_root: &Path, set_name: &str) -> Result<()> {
        paths::locate_samples(&mut self.instrument, search_root, set_name)
    }

    pub fn convert_millisecond_crossfades(&mut self) -> Result<()> {
        materialize::convert_millisecond_crossfades(&mut self.instrument, self.codec.as_ref())
    }

    pub fn rewrite_paths(&mut self, mode: &PathMode) -> Result<()> {
        paths::rewrite_paths(&mut self.instrument, mode)
    }

    pub fn materialize(&mut self, options: &MaterializeOptions) -> Result<MaterializeReport> {
        materialize::materialize(&mut self.instrument, self.codec.as_ref(), options)
    }

    pub fn to_xml(&self) -> Result<String> {
        xml::render_preset(&self.instrument)
    }

    pub fn to_sfz(&self) -> String {
        sfz::export_sfz(&self.instrument)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exs::{ExsGroup, ExsSample, ExsZone};
    use crate::materialize::MaterializeMode;
    use crate::pcm::test_util::write_ramp;
    use presetbridge_sfz::parse_sfz_str;

    #[test]
    fn test_import_replaces_previous_tree() {
        let mut converter = PresetConverter::new();
        let sfz = parse_sfz_str("<region> sample=a.wav\n<region> sample=b.wav").unwrap();
        converter.import_sfz(&sfz);
        assert_eq!(converter.instrument().num_regions(), 2);

        let source = ExsInstrument {
            zones: vec![ExsZone {
                group_index: 0,
                ..Default::default()
            }],
            groups: vec![ExsGroup::default()],
            samples: vec![ExsSample {
                file_name: "c.wav".to_string(),
            }],
        };
        converter.import_exs(&source, false);
        assert_eq!(converter.instrument().num_regions(), 1);
    }

    #[test]
    fn test_full_bake_pipeline() {
        let _ = env_logger::builder().is_test(true).try_init();
        let dir = tempfile::tempdir().unwrap();
        let library = dir.path().join("library");
        std::fs::create_dir_all(library.join("Pad")).unwrap();
        write_ramp(&library.join("Pad/pad.wav"), 2000, 48000);

        let source = ExsInstrument {
            zones: vec![ExsZone {
                name: "pad".to_string(),
                group_index: 0,
                loop_enabled: true,
                loop_start: 500,
                loop_end: 1500,
                loop_crossfade_ms: 2,
                loop_equal_power: true,
                ..Default::default()
            }],
            groups: vec![ExsGroup {
                name: "Main".to_string(),
                ..Default::default()
            }],
            samples: vec![ExsSample {
                file_name: "pad.wav".to_string(),
            }],
        };

        let mut converter = PresetConverter::new();
        converter.import_exs(&source, true);
        converter.locate_samples(&library, "Pad").unwrap();
        converter.convert_millisecond_crossfades().unwrap();

        let region = &converter.instrument().groups[0].regions[0].props;
        assert_eq!(region.loop_crossfade, Some(96));
        assert_eq!(region.loop_crossfade_ms, None);

        let output = dir.path().join("out");
        let report = converter
            .materialize(&MaterializeOptions {
                output_root: output.clone(),
                set_name: "Pad".to_string(),
                mode: MaterializeMode::Bake,
                bit_depth: None,
            })
            .unwrap();
        assert_eq!(report.files, vec![output.join("Samples/Pad/pad.wav")]);

        let xml = converter.to_xml().unwrap();
        assert!(xml.contains(r#"path="Samples/Pad/pad.wav""#));
        assert!(xml.contains(r#"loopCrossfade="0""#));
        assert!(xml.contains(r#"loopEnd="1499""#));
        assert!(xml.contains("<effects>"));

        let sfz = converter.to_sfz();
        assert!(sfz.contains("sample=Samples/Pad/pad.wav"));
        assert!(sfz.contains("loop_end=1500"));
    }
}
