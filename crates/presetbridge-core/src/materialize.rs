//! Writing sample files for a converted instrument.
//!
//! Every node that references a file gets its own output file under
//! `<output_root>/Samples/<set_name>/`. Output is staged in a temporary
//! directory next to the destination and moved into place only after the whole
//! tree succeeded; on failure nothing is left behind and the tree is unchanged.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use presetbridge_sfz::path_utils::normalize_directory_name;
use tempfile::TempDir;

use crate::bake::BakePlan;
use crate::error::{Error, Result};
use crate::inherit::{cascade, PlaybackParams, ResolvedTree};
use crate::model::{CrossfadeShape, Instrument, Properties};
use crate::paths::SAMPLES_DIR;
use crate::pcm::{PcmCodec, WriteSpec};

/// Bit depths accepted as an output override.
pub const SUPPORTED_BIT_DEPTHS: [u16; 3] = [16, 24, 32];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterializeMode {
    /// Copy source files unchanged.
    Copy,
    /// Render trim and loop crossfades into new files.
    Bake,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializeOptions {
    pub output_root: PathBuf,
    pub set_name: String,
    pub mode: MaterializeMode,
    /// Output bit depth for baked files; `None` keeps the source depth.
    pub bit_depth: Option<u16>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterializeReport {
    /// Final locations of every file written.
    pub files: Vec<PathBuf>,
}

/// Write sample files for every node and point the tree at them.
pub fn materialize(
    instrument: &mut Instrument,
    codec: &dyn PcmCodec,
    options: &MaterializeOptions,
) -> Result<MaterializeReport> {
    let set_dir = normalize_directory_name(&options.set_name);
    let samples_root = options.output_root.join(SAMPLES_DIR);
    fs::create_dir_all(&samples_root).map_err(|source| Error::CreateDir {
        path: samples_root.clone(),
        source,
    })?;
    let staging = tempfile::Builder::new()
        .prefix(".presetbridge-")
        .tempdir_in(&samples_root)
        .map_err(|source| Error::CreateDir {
            path: samples_root.clone(),
            source,
        })?;

    let mut batch = Batch {
        codec,
        options,
        staging,
        destination: samples_root.join(&set_dir),
        reference_dir: format!("{}/{}", SAMPLES_DIR, set_dir),
        staged: BTreeSet::new(),
        copied: HashMap::new(),
    };

    // Parameters are resolved from the untouched tree
    let resolved = ResolvedTree::resolve(instrument);
    let mut working = instrument.clone();

    batch.process(&mut working.global, &resolved.global)?;
    for (group, resolved_group) in working.groups.iter_mut().zip(&resolved.groups) {
        batch.process(&mut group.props, &resolved_group.params)?;
        for (region, params) in group.regions.iter_mut().zip(&resolved_group.regions) {
            batch.process(&mut region.props, params)?;
        }
    }

    let report = batch.commit()?;
    *instrument = working;
    Ok(report)
}

struct Batch<'a> {
    codec: &'a dyn PcmCodec,
    options: &'a MaterializeOptions,
    staging: TempDir,
    destination: PathBuf,
    /// Directory written into the tree, relative to the output root.
    reference_dir: String,
    staged: BTreeSet<String>,
    /// Source file to staged name, so a file shared by several nodes is
    /// copied once.
    copied: HashMap<PathBuf, String>,
}

impl Batch<'_> {
    fn process(&mut self, props: &mut Properties, params: &PlaybackParams) -> Result<()> {
        let Some(path) = props.path.clone() else {
            return Ok(());
        };
        let source = PathBuf::from(&path);
        if !source.is_file() {
            log::error!(
                "A problem was encountered when processing file {}. Halting conversion process.",
                path
            );
            return Err(Error::SampleMissing { path: source });
        }

        let result = match self.options.mode {
            MaterializeMode::Copy => self.copy(props, &source),
            MaterializeMode::Bake => self.bake(props, params, &source),
        };
        if let Err(e) = &result {
            log::error!("{}. Halting conversion process.", e);
        }
        result
    }

    fn copy(&mut self, props: &mut Properties, source: &Path) -> Result<()> {
        let file_name = match self.copied.get(source) {
            Some(name) => name.clone(),
            None => {
                let stem = source
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .ok_or_else(|| Error::SampleMissing {
                        path: source.to_path_buf(),
                    })?;
                let extension = source
                    .extension()
                    .map(|ext| ext.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let name = self.unique_name(&stem, &extension);
                fs::copy(source, self.staging.path().join(&name))
                    .map_err(|e| Error::io(source, e))?;
                log::debug!("Copied {} to staging as {}", source.display(), name);

                self.staged.insert(name.clone());
                self.copied.insert(source.to_path_buf(), name.clone());
                name
            }
        };

        props.path = Some(format!("{}/{}", self.reference_dir, file_name));
        Ok(())
    }

    fn bake(
        &mut self,
        props: &mut Properties,
        params: &PlaybackParams,
        source: &Path,
    ) -> Result<()> {
        let extension = self
            .codec
            .output_extension(source)
            .ok_or_else(|| Error::UnsupportedFormat {
                path: source.to_path_buf(),
            })?;
        let audio = self.codec.read(source)?;
        let plan = BakePlan::new(params, audio.info.length, audio.info.loop_points).map_err(
            |violation| Error::Boundary {
                path: source.to_path_buf(),
                violation,
            },
        )?;
        log::debug!("{}: resolved {:?}", source.display(), params);
        if plan.is_looping() && params.shape == CrossfadeShape::Linear {
            log::debug!(
                "{}: linear crossfade requested, baking equal-power blend",
                source.display()
            );
        }

        let channels: Vec<Vec<f32>> = audio.channels.iter().map(|c| plan.render(c)).collect();
        let points = plan.rebased();
        let (bits_per_sample, float) = match self.options.bit_depth {
            Some(bits) if SUPPORTED_BIT_DEPTHS.contains(&bits) => (bits, bits == 32),
            _ => (audio.info.bits_per_sample, audio.info.float),
        };
        let spec = WriteSpec {
            sample_rate: audio.info.sample_rate,
            bits_per_sample,
            float,
            loop_points: points.file_loop(),
        };

        let stem = source
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "sample".to_string());
        let file_name = self.unique_name(&stem, extension);
        self.codec
            .write(&self.staging.path().join(&file_name), &channels, &spec)?;
        log::debug!(
            "Baked {} into {} ({} frames)",
            source.display(),
            file_name,
            plan.output_length()
        );
        self.staged.insert(file_name.clone());

        props.path = Some(format!("{}/{}", self.reference_dir, file_name));
        props.start = Some(0);
        props.end = Some(points.end);
        match points.loop_points {
            Some((loop_start, loop_end)) => {
                props.loop_enabled = Some(true);
                props.loop_start = Some(loop_start);
                props.loop_end = Some(loop_end);
                props.loop_crossfade = Some(0);
            }
            None => {
                // the old points refer to the untrimmed file
                props.loop_start = None;
                props.loop_end = None;
                props.loop_crossfade = None;
            }
        }
        props.loop_crossfade_mode = None;
        Ok(())
    }

    /// `stem.ext`, `stem (2).ext`, ... not taken in the destination or this batch.
    fn unique_name(&self, stem: &str, extension: &str) -> String {
        let name = |suffix: String| match extension {
            "" => format!("{}{}", stem, suffix),
            ext => format!("{}{}.{}", stem, suffix, ext),
        };
        let mut candidate = name(String::new());
        let mut counter = 2;
        while self.staged.contains(&candidate) || self.destination.join(&candidate).exists() {
            candidate = name(format!(" ({})", counter));
            counter += 1;
        }
        candidate
    }

    /// Move staged files into the destination. On failure, files already
    /// moved are removed again.
    fn commit(self) -> Result<MaterializeReport> {
        fs::create_dir_all(&self.destination).map_err(|source| Error::CreateDir {
            path: self.destination.clone(),
            source,
        })?;

        let mut files = Vec::with_capacity(self.staged.len());
        for name in &self.staged {
            let target = self.destination.join(name);
            if let Err(e) = fs::rename(self.staging.path().join(name), &target) {
                for moved in &files {
                    let _ = fs::remove_file(moved);
                }
                return Err(Error::io(target, e));
            }
            log::info!("Wrote {}", target.display());
            files.push(target);
        }
        Ok(MaterializeReport { files })
    }
}

/// Replace millisecond crossfades with frame counts at each file's own rate.
///
/// Millisecond values cascade like other properties; every node with a path
/// and an effective millisecond value gets an explicit `loop_crossfade`, and
/// millisecond values are cleared everywhere.
pub fn convert_millisecond_crossfades(
    instrument: &mut Instrument,
    codec: &dyn PcmCodec,
) -> Result<()> {
    let mut working = instrument.clone();

    let global_ms = working.global.loop_crossfade_ms.take();
    convert_node(&mut working.global, global_ms, codec)?;
    for group in &mut working.groups {
        let group_ms = cascade(&[group.props.loop_crossfade_ms.take(), global_ms]);
        convert_node(&mut group.props, group_ms, codec)?;
        for region in &mut group.regions {
            let region_ms = cascade(&[region.props.loop_crossfade_ms.take(), group_ms]);
            convert_node(&mut region.props, region_ms, codec)?;
        }
    }

    *instrument = working;
    Ok(())
}

fn convert_node(props: &mut Properties, ms: Option<f64>, codec: &dyn PcmCodec) -> Result<()> {
    let (Some(ms), Some(path)) = (ms, props.path.as_deref()) else {
        return Ok(());
    };
    let path = Path::new(path);
    if !path.is_file() {
        log::error!("Could not open {} to read its sample rate", path.display());
        return Err(Error::SampleMissing {
            path: path.to_path_buf(),
        });
    }
    let info = codec.read_info(path)?;
    let frames = (ms * f64::from(info.sample_rate) / 1000.0) as i64;
    log::debug!("{}: {} ms crossfade is {} samples", path.display(), ms, frames);
    props.loop_crossfade = Some(frames);
    Ok(())
}
