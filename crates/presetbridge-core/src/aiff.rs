//! AIFF loop metadata.
//!
//! AIFF keeps loops as a pair of marker ids in the `INST` chunk's sustain loop;
//! marker positions live in the `MARK` chunk. Marker positions sit between
//! frames, so the loop end marker is one past the last looped frame.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use byteorder::{BigEndian, ReadBytesExt};

use crate::riff::LoopPoints;

const NO_LOOP: i16 = 0;

struct SustainLoop {
    play_mode: i16,
    begin_marker: u16,
    end_marker: u16,
}

/// Find the sustain loop in an AIFF/AIFC stream. Other data yields `None`.
pub fn read_loop<R: Read + Seek>(reader: &mut R) -> io::Result<Option<LoopPoints>> {
    let mut id = [0u8; 4];
    reader.read_exact(&mut id)?;
    if &id != b"FORM" {
        return Ok(None);
    }
    let _form_size = reader.read_u32::<BigEndian>()?;
    reader.read_exact(&mut id)?;
    if &id != b"AIFF" && &id != b"AIFC" {
        return Ok(None);
    }

    let mut markers: HashMap<u16, u32> = HashMap::new();
    let mut sustain: Option<SustainLoop> = None;

    loop {
        match reader.read_exact(&mut id) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e),
        }
        let size = reader.read_u32::<BigEndian>()?;
        let body_start = reader.stream_position()?;

        match &id {
            b"MARK" => markers = read_markers(reader)?,
            b"INST" if size >= 20 => {
                // base note, detune, note range, velocity range, gain
                let mut skip = [0u8; 8];
                reader.read_exact(&mut skip)?;
                sustain = Some(SustainLoop {
                    play_mode: reader.read_i16::<BigEndian>()?,
                    begin_marker: reader.read_u16::<BigEndian>()?,
                    end_marker: reader.read_u16::<BigEndian>()?,
                });
            }
            _ => {}
        }

        let padded = u64::from(size) + u64::from(size % 2);
        reader.seek(SeekFrom::Start(body_start + padded))?;
    }

    let Some(sustain) = sustain.filter(|s| s.play_mode != NO_LOOP) else {
        return Ok(None);
    };
    let (Some(&start), Some(&end)) = (
        markers.get(&sustain.begin_marker),
        markers.get(&sustain.end_marker),
    ) else {
        log::debug!("AIFF sustain loop refers to missing markers");
        return Ok(None);
    };
    if end <= start {
        return Ok(None);
    }
    Ok(Some(LoopPoints { start, end: end - 1 }))
}

fn read_markers<R: Read>(reader: &mut R) -> io::Result<HashMap<u16, u32>> {
    let count = reader.read_u16::<BigEndian>()?;
    let mut markers = HashMap::with_capacity(usize::from(count));
    for _ in 0..count {
        let id = reader.read_u16::<BigEndian>()?;
        let position = reader.read_u32::<BigEndian>()?;
        // pascal string, padded so count byte plus text is even
        let length = usize::from(reader.read_u8()?);
        let mut name = vec![0u8; length + (length + 1) % 2];
        reader.read_exact(&mut name)?;
        markers.insert(id, position);
    }
    Ok(markers)
}

pub fn read_loop_from_file(path: &Path) -> io::Result<Option<LoopPoints>> {
    let mut reader = BufReader::new(File::open(path)?);
    read_loop(&mut reader)
}
