//! PCM file access.
//!
//! The engine only talks to [`PcmCodec`]. [`WavCodec`] handles WAV; the CLI
//! uses [`SampleCodec`](crate::decode::SampleCodec), which adds AIFF and FLAC
//! input. Samples are exchanged as de-interleaved `f32` channels.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::error::{Error, Result};
use crate::riff;

pub use crate::riff::LoopPoints;

/// Format details of a PCM file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioInfo {
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    pub float: bool,
    /// Length in sample frames.
    pub length: usize,
    pub loop_points: Option<LoopPoints>,
}

/// A fully decoded file.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioData {
    pub info: AudioInfo,
    pub channels: Vec<Vec<f32>>,
}

/// Output format for [`PcmCodec::write`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteSpec {
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    pub float: bool,
    pub loop_points: Option<LoopPoints>,
}

pub trait PcmCodec {
    /// File extension for output written from `path`, or `None` when the
    /// format is not supported.
    fn output_extension(&self, path: &Path) -> Option<&'static str>;

    /// Read the header and loop metadata without decoding samples.
    fn read_info(&self, path: &Path) -> Result<AudioInfo>;

    fn read(&self, path: &Path) -> Result<AudioData>;

    fn write(&self, path: &Path, channels: &[Vec<f32>], spec: &WriteSpec) -> Result<()>;
}

/// WAV files through `hound`, with loops in the RIFF `smpl` chunk.
#[derive(Debug, Clone, Copy, Default)]
pub struct WavCodec;

impl WavCodec {
    fn check_supported(&self, path: &Path) -> Result<()> {
        match self.output_extension(path) {
            Some(_) => Ok(()),
            None => Err(Error::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }

    fn info_from(&self, path: &Path, spec: WavSpec, length: usize) -> Result<AudioInfo> {
        let loop_points = riff::read_loop_from_file(path).map_err(|e| Error::io(path, e))?;
        Ok(AudioInfo {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
            float: spec.sample_format == SampleFormat::Float,
            length,
            loop_points,
        })
    }
}

impl PcmCodec for WavCodec {
    fn output_extension(&self, path: &Path) -> Option<&'static str> {
        let extension = path.extension()?.to_str()?;
        if extension.eq_ignore_ascii_case("wav") {
            Some("wav")
        } else {
            None
        }
    }

    fn read_info(&self, path: &Path) -> Result<AudioInfo> {
        self.check_supported(path)?;
        let reader = WavReader::open(path).map_err(|e| Error::audio(path, e))?;
        let spec = reader.spec();
        let length = reader.duration() as usize;
        self.info_from(path, spec, length)
    }

    fn read(&self, path: &Path) -> Result<AudioData> {
        self.check_supported(path)?;
        let reader = WavReader::open(path).map_err(|e| Error::audio(path, e))?;
        let spec = reader.spec();
        let length = reader.duration() as usize;

        let interleaved: Vec<f32> = match spec.sample_format {
            SampleFormat::Float => reader
                .into_samples::<f32>()
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| Error::audio(path, e))?,
            SampleFormat::Int => {
                let max_value = (1u64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / max_value))
                    .collect::<std::result::Result<_, _>>()
                    .map_err(|e| Error::audio(path, e))?
            }
        };

        let num_channels = usize::from(spec.channels.max(1));
        let mut channels = vec![Vec::with_capacity(length); num_channels];
        for frame in interleaved.chunks(num_channels) {
            for (channel, &sample) in channels.iter_mut().zip(frame) {
                channel.push(sample);
            }
        }

        Ok(AudioData {
            info: self.info_from(path, spec, length)?,
            channels,
        })
    }

    fn write(&self, path: &Path, channels: &[Vec<f32>], spec: &WriteSpec) -> Result<()> {
        let wav_spec = WavSpec {
            channels: channels.len() as u16,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
            sample_format: if spec.float {
                SampleFormat::Float
            } else {
                SampleFormat::Int
            },
        };
        let mut writer = WavWriter::create(path, wav_spec).map_err(|e| Error::audio(path, e))?;

        let length = channels.iter().map(Vec::len).min().unwrap_or(0);
        if spec.float {
            for frame in 0..length {
                for channel in channels {
                    writer
                        .write_sample(channel[frame])
                        .map_err(|e| Error::audio(path, e))?;
                }
            }
        } else {
            let scale = (1u64 << (spec.bits_per_sample - 1)) as f64;
            for frame in 0..length {
                for channel in channels {
                    let value = (f64::from(channel[frame]) * scale)
                        .round()
                        .clamp(-scale, scale - 1.0) as i32;
                    writer
                        .write_sample(value)
                        .map_err(|e| Error::audio(path, e))?;
                }
            }
        }
        writer.finalize().map_err(|e| Error::audio(path, e))?;

        if let Some(points) = spec.loop_points {
            riff::append_loop_to_file(path, spec.sample_rate, points)
                .map_err(|e| Error::io(path, e))?;
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::test_util::*;
    use super::*;

    #[test]
    fn test_header_reports_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ramp.wav");
        write_ramp(&path, 500, 44100);

        let info = WavCodec.read_info(&path).unwrap();
        assert_eq!(info.channels, 1);
        assert_eq!(info.sample_rate, 44100);
        assert_eq!(info.bits_per_sample, 16);
        assert!(!info.float);
        assert_eq!(info.length, 500);
        assert_eq!(info.loop_points, None);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = WavCodec.read_info(Path::new("piano.aif")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat { .. }));
        assert_eq!(WavCodec.output_extension(Path::new("A.WAV")), Some("wav"));
    }

    #[test]
    fn test_stereo_write_read_with_loop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let left: Vec<f32> = (0..100).map(|i| i as f32 / 200.0).collect();
        let right: Vec<f32> = left.iter().map(|s| -s).collect();
        let spec = WriteSpec {
            sample_rate: 48000,
            bits_per_sample: 24,
            float: false,
            loop_points: Some(LoopPoints { start: 10, end: 89 }),
        };
        WavCodec
            .write(&path, &[left.clone(), right.clone()], &spec)
            .unwrap();

        let data = WavCodec.read(&path).unwrap();
        assert_eq!(data.info.channels, 2);
        assert_eq!(data.info.bits_per_sample, 24);
        assert_eq!(data.info.length, 100);
        assert_eq!(data.info.loop_points, Some(LoopPoints { start: 10, end: 89 }));
        for (a, b) in data.channels[0].iter().zip(&left) {
            assert!((a - b).abs() < 1e-5);
        }
        for (a, b) in data.channels[1].iter().zip(&right) {
            assert!((a - b).abs() < 1e-5);
        }
    }

    #[test]
    fn test_float_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("float.wav");
        let spec = WriteSpec {
            sample_rate: 44100,
            bits_per_sample: 32,
            float: true,
            loop_points: None,
        };
        WavCodec.write(&path, &[vec![0.25, -0.5]], &spec).unwrap();

        let data = WavCodec.read(&path).unwrap();
        assert!(data.info.float);
        assert_eq!(data.channels[0], vec![0.25, -0.5]);
    }

    #[test]
    fn test_ramp_helper() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ramp.wav");
        write_ramp(&path, 4, 44100);
        assert_eq!(read_ints(&path), vec![0, 1, 2, 3]);
    }
}
