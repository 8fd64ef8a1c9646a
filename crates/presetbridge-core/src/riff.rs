//! RIFF `smpl` chunk access for WAV loop metadata.
//!
//! Only the first loop is read or written (`Loop0Start`/`Loop0End`).

use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, Read, Seek, SeekFrom, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

/// A sustain loop stored in the file, in sample frames (both inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopPoints {
    pub start: u32,
    pub end: u32,
}

const SMPL_HEADER_SIZE: u32 = 36;
const SMPL_LOOP_SIZE: u32 = 24;
const MIDI_UNITY_NOTE: u32 = 60;

/// Find the first loop in a RIFF/WAVE stream. Non-WAVE data yields `None`.
pub fn read_loop<R: Read + Seek>(reader: &mut R) -> io::Result<Option<LoopPoints>> {
    let mut id = [0u8; 4];
    reader.read_exact(&mut id)?;
    if &id != b"RIFF" {
        return Ok(None);
    }
    let _riff_size = reader.read_u32::<LittleEndian>()?;
    reader.read_exact(&mut id)?;
    if &id != b"WAVE" {
        return Ok(None);
    }

    loop {
        match reader.read_exact(&mut id) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e),
        }
        let size = reader.read_u32::<LittleEndian>()?;

        if &id == b"smpl" && size >= SMPL_HEADER_SIZE {
            // manufacturer, product, sample period, unity note, pitch
            // fraction, SMPTE format, SMPTE offset
            for _ in 0..7 {
                reader.read_u32::<LittleEndian>()?;
            }
            let num_loops = reader.read_u32::<LittleEndian>()?;
            let _sampler_data = reader.read_u32::<LittleEndian>()?;
            if num_loops == 0 || size < SMPL_HEADER_SIZE + SMPL_LOOP_SIZE {
                return Ok(None);
            }
            let _cue_point_id = reader.read_u32::<LittleEndian>()?;
            let _loop_type = reader.read_u32::<LittleEndian>()?;
            let start = reader.read_u32::<LittleEndian>()?;
            let end = reader.read_u32::<LittleEndian>()?;
            return Ok(Some(LoopPoints { start, end }));
        }

        // Chunks are word aligned
        let skip = i64::from(size) + i64::from(size & 1);
        reader.seek(SeekFrom::Current(skip))?;
    }
}

/// Serialize a `smpl` chunk holding one forward loop.
pub fn encode_smpl_chunk(sample_rate: u32, points: LoopPoints) -> io::Result<Vec<u8>> {
    let size = SMPL_HEADER_SIZE + SMPL_LOOP_SIZE;
    let mut chunk = Vec::with_capacity(8 + size as usize);
    chunk.write_all(b"smpl")?;
    chunk.write_u32::<LittleEndian>(size)?;

    let sample_period = if sample_rate > 0 {
        1_000_000_000 / sample_rate
    } else {
        0
    };
    chunk.write_u32::<LittleEndian>(0)?; // manufacturer
    chunk.write_u32::<LittleEndian>(0)?; // product
    chunk.write_u32::<LittleEndian>(sample_period)?;
    chunk.write_u32::<LittleEndian>(MIDI_UNITY_NOTE)?;
    chunk.write_u32::<LittleEndian>(0)?; // pitch fraction
    chunk.write_u32::<LittleEndian>(0)?; // SMPTE format
    chunk.write_u32::<LittleEndian>(0)?; // SMPTE offset
    chunk.write_u32::<LittleEndian>(1)?; // loop count
    chunk.write_u32::<LittleEndian>(0)?; // sampler data

    chunk.write_u32::<LittleEndian>(0)?; // cue point id
    chunk.write_u32::<LittleEndian>(0)?; // forward loop
    chunk.write_u32::<LittleEndian>(points.start)?;
    chunk.write_u32::<LittleEndian>(points.end)?;
    chunk.write_u32::<LittleEndian>(0)?; // fraction
    chunk.write_u32::<LittleEndian>(0)?; // play count (infinite)
    Ok(chunk)
}

/// Append a loop chunk to a complete RIFF stream and fix up the RIFF size.
pub fn append_loop<S: Read + Write + Seek>(
    stream: &mut S,
    sample_rate: u32,
    points: LoopPoints,
) -> io::Result<()> {
    let mut length = stream.seek(SeekFrom::End(0))?;
    if length % 2 == 1 {
        stream.write_all(&[0])?;
        length += 1;
    }

    let chunk = encode_smpl_chunk(sample_rate, points)?;
    stream.write_all(&chunk)?;
    length += chunk.len() as u64;

    let riff_size = u32::try_from(length - 8)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "RIFF file too large"))?;
    stream.seek(SeekFrom::Start(4))?;
    stream.write_u32::<LittleEndian>(riff_size)?;
    stream.flush()
}

pub fn read_loop_from_file(path: &Path) -> io::Result<Option<LoopPoints>> {
    let mut reader = BufReader::new(File::open(path)?);
    read_loop(&mut reader)
}

pub fn append_loop_to_file(path: &Path, sample_rate: u32, points: LoopPoints) -> io::Result<()> {
    let mut file = OpenOptions::new().read(true).write(true).open(path)?;
    append_loop(&mut file, sample_rate, points)
}
