//! AIFF and FLAC input through `symphonia`.
//!
//! These formats are read only; baked output from them is written as WAV.

use std::fs::File;
use std::io;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{
    Decoder, DecoderOptions, CODEC_TYPE_NULL, CODEC_TYPE_PCM_F32BE, CODEC_TYPE_PCM_F32LE,
    CODEC_TYPE_PCM_F64BE, CODEC_TYPE_PCM_F64LE,
};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::aiff;
use crate::error::{Error, Result};
use crate::pcm::{AudioData, AudioInfo, PcmCodec, WavCodec, WriteSpec};

/// Extensions [`SymphoniaCodec`] decodes.
pub const DECODED_EXTENSIONS: [&str; 4] = ["aif", "aiff", "aifc", "flac"];

/// Decodes AIFF and FLAC; writes WAV.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymphoniaCodec;

struct OpenTrack {
    reader: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    info: AudioInfo,
    /// Frame count from the header, if it has one
    n_frames: Option<u64>,
}

fn is_aiff(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.to_ascii_lowercase().starts_with("aif"))
}

impl SymphoniaCodec {
    fn check_supported(&self, path: &Path) -> Result<()> {
        match self.output_extension(path) {
            Some(_) => Ok(()),
            None => Err(Error::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }

    fn open(&self, path: &Path) -> Result<OpenTrack> {
        self.check_supported(path)?;
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(extension);
        }
        let detected = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|e| Error::decode(path, e))?;
        let reader = detected.format;

        let track = reader
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| Error::UnsupportedFormat {
                path: path.to_path_buf(),
            })?;
        let params = &track.codec_params;
        let track_id = track.id;

        let sample_rate = params.sample_rate.ok_or_else(|| Error::UnsupportedFormat {
            path: path.to_path_buf(),
        })?;
        let float = [
            CODEC_TYPE_PCM_F32LE,
            CODEC_TYPE_PCM_F32BE,
            CODEC_TYPE_PCM_F64LE,
            CODEC_TYPE_PCM_F64BE,
        ]
        .contains(&params.codec);
        let bits_per_sample = match params.bits_per_sample {
            Some(bits) => bits as u16,
            None if float => 32,
            None => 16,
        };
        let channels = params.channels.map(|c| c.count() as u16).unwrap_or(1);
        let n_frames = params.n_frames;

        let loop_points = if is_aiff(path) {
            aiff::read_loop_from_file(path).map_err(|e| Error::io(path, e))?
        } else {
            None
        };

        let decoder = symphonia::default::get_codecs()
            .make(params, &DecoderOptions::default())
            .map_err(|e| Error::decode(path, e))?;

        Ok(OpenTrack {
            reader,
            decoder,
            track_id,
            info: AudioInfo {
                channels,
                sample_rate,
                bits_per_sample,
                float,
                length: n_frames.unwrap_or(0) as usize,
                loop_points,
            },
            n_frames,
        })
    }

    /// Decode every packet of the track into de-interleaved channels.
    fn decode_all(&self, path: &Path, track: &mut OpenTrack) -> Result<Vec<Vec<f32>>> {
        let num_channels = usize::from(track.info.channels.max(1));
        let mut channels = vec![Vec::new(); num_channels];
        let mut buffer: Option<SampleBuffer<f32>> = None;

        loop {
            let packet = match track.reader.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    break
                }
                Err(SymphoniaError::ResetRequired) => {
                    track.decoder.reset();
                    continue;
                }
                Err(e) => return Err(Error::decode(path, e)),
            };
            if packet.track_id() != track.track_id {
                continue;
            }

            let decoded = match track.decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(message)) => {
                    log::warn!("{}: skipping undecodable packet ({})", path.display(), message);
                    continue;
                }
                Err(e) => return Err(Error::decode(path, e)),
            };

            let samples = buffer.get_or_insert_with(|| {
                SampleBuffer::new(decoded.capacity() as u64, *decoded.spec())
            });
            if samples.capacity() < decoded.capacity() * num_channels {
                *samples = SampleBuffer::new(decoded.capacity() as u64, *decoded.spec());
            }
            samples.copy_interleaved_ref(decoded);
            for frame in samples.samples().chunks(num_channels) {
                for (channel, &sample) in channels.iter_mut().zip(frame) {
                    channel.push(sample);
                }
            }
        }

        if let Some(expected) = track.n_frames {
            let decoded = channels.first().map_or(0, Vec::len);
            if decoded as u64 != expected {
                log::debug!(
                    "{}: header says {} frames, decoded {}",
                    path.display(),
                    expected,
                    decoded
                );
            }
        }
        Ok(channels)
    }
}

impl PcmCodec for SymphoniaCodec {
    fn output_extension(&self, path: &Path) -> Option<&'static str> {
        let extension = path.extension()?.to_str()?;
        DECODED_EXTENSIONS
            .iter()
            .any(|known| extension.eq_ignore_ascii_case(known))
            .then_some("wav")
    }

    fn read_info(&self, path: &Path) -> Result<AudioInfo> {
        let mut track = self.open(path)?;
        if track.n_frames.is_none() {
            let channels = self.decode_all(path, &mut track)?;
            track.info.length = channels.first().map_or(0, Vec::len);
        }
        Ok(track.info)
    }

    fn read(&self, path: &Path) -> Result<AudioData> {
        let mut track = self.open(path)?;
        let channels = self.decode_all(path, &mut track)?;
        let mut info = track.info;
        info.length = channels.first().map_or(0, Vec::len);
        Ok(AudioData { info, channels })
    }

    fn write(&self, path: &Path, channels: &[Vec<f32>], spec: &WriteSpec) -> Result<()> {
        WavCodec.write(path, channels, spec)
    }
}

/// Routes WAV to [`WavCodec`] and the formats in [`DECODED_EXTENSIONS`] to
/// [`SymphoniaCodec`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SampleCodec;

impl SampleCodec {
    fn codec_for(&self, path: &Path) -> Result<&'static dyn PcmCodec> {
        if WavCodec.output_extension(path).is_some() {
            Ok(&WavCodec)
        } else if SymphoniaCodec.output_extension(path).is_some() {
            Ok(&SymphoniaCodec)
        } else {
            Err(Error::UnsupportedFormat {
                path: path.to_path_buf(),
            })
        }
    }
}

impl PcmCodec for SampleCodec {
    fn output_extension(&self, path: &Path) -> Option<&'static str> {
        WavCodec
            .output_extension(path)
            .or_else(|| SymphoniaCodec.output_extension(path))
    }

    fn read_info(&self, path: &Path) -> Result<AudioInfo> {
        self.codec_for(path)?.read_info(path)
    }

    fn read(&self, path: &Path) -> Result<AudioData> {
        self.codec_for(path)?.read(path)
    }

    fn write(&self, path: &Path, channels: &[Vec<f32>], spec: &WriteSpec) -> Result<()> {
        WavCodec.write(path, channels, spec)
    }
}
