use presetbridge_sfz::{LoopMode, MidiNote, OpcodeValue, SfzFile, SfzSection};

use super::Level;
use crate::model::{Group, Instrument, Properties, Region, SeqMode, Volume, VOICE_GROUP_PREFIX};

/// Build the canonical tree from a parsed SFZ file.
///
/// Each SFZ level maps onto the same canonical level. Opcodes are applied in
/// file order, so `pitch_keycenter` after `key` wins for the root note.
pub fn import_sfz(sfz: &SfzFile) -> Instrument {
    let mut instrument = Instrument::new();
    if let Some(global) = &sfz.global {
        apply_section(sfz, global, &mut instrument.global, Level::Global);
    }

    for sfz_group in &sfz.groups {
        let mut group = Group::default();
        apply_section(sfz, &sfz_group.section, &mut group.props, Level::Group);
        for sfz_region in &sfz_group.regions {
            let mut region = Region::default();
            apply_section(sfz, sfz_region, &mut region.props, Level::Region);
            group.regions.push(region);
        }
        instrument.groups.push(group);
    }

    log::debug!("Imported SFZ instrument: {}", instrument.info());
    instrument
}

fn apply_section(sfz: &SfzFile, section: &SfzSection, props: &mut Properties, level: Level) {
    for (name, value) in section.iter() {
        let applied = if name == "sample" {
            props.path = sfz
                .resolve_sample_path(section)
                .map(|path| path.to_string_lossy().into_owned());
            Ok(true)
        } else {
            apply_opcode(props, level, name, value)
        };

        match applied {
            Ok(true) => {}
            Ok(false) => log::warn!("{} opcode {} not supported", level, name),
            Err(e) => log::warn!("{} opcode {}: {}, skipping", level, name, e),
        }
    }
}

fn parse<T: OpcodeValue>(value: &str) -> presetbridge_sfz::Result<T> {
    T::parse_opcode(value)
}

fn note(value: &str) -> presetbridge_sfz::Result<i32> {
    parse::<MidiNote>(value).map(|MidiNote(n)| n)
}

/// Apply one opcode. `Ok(false)` means the opcode is not part of the mapping.
fn apply_opcode(
    props: &mut Properties,
    level: Level,
    name: &str,
    value: &str,
) -> presetbridge_sfz::Result<bool> {
    match name {
        "group_label" if level == Level::Group => props.name = Some(value.to_string()),
        "amp_veltrack" => props.amp_vel_track = Some(parse::<f64>(value)? / 100.0),
        "ampeg_attack" => props.attack = Some(parse(value)?),
        "ampeg_decay" => props.decay = Some(parse(value)?),
        "ampeg_sustain" => props.sustain = Some(parse(value)?),
        "ampeg_release" => props.release = Some(parse(value)?),
        "group" => props.tags = Some(format!("{}{}", VOICE_GROUP_PREFIX, value)),
        "off_by" => props.silenced_by_tags = Some(format!("{}{}", VOICE_GROUP_PREFIX, value)),
        "off_mode" => props.silencing_mode = Some(value.to_string()),
        "offset" => props.start = Some(parse(value)?),
        "end" => props.end = Some(parse(value)?),
        "lokey" => props.lo_note = Some(note(value)?),
        "hikey" => props.hi_note = Some(note(value)?),
        "key" => {
            let key = note(value)?;
            props.root_note = Some(key);
            props.lo_note = Some(key);
            props.hi_note = Some(key);
        }
        "pitch_keycenter" => props.root_note = Some(note(value)?),
        "lovel" => props.lo_vel = Some(parse(value)?),
        "hivel" => props.hi_vel = Some(parse(value)?),
        "loop_mode" => props.loop_enabled = Some(parse::<LoopMode>(value)?.is_looping()),
        "loop_start" => props.loop_start = Some(parse(value)?),
        // SFZ loop ends are exclusive
        "loop_end" => props.loop_end = Some(parse::<i64>(value)? - 1),
        "seq_position" => {
            props.seq_position = Some(parse(value)?);
            props.seq_mode = Some(SeqMode::RoundRobin);
        }
        "seq_length" => {
            props.seq_length = Some(parse(value)?);
            props.seq_mode = Some(SeqMode::RoundRobin);
        }
        "sw_previous" => props.previous_note = Some(note(value)?),
        "trigger" => props.trigger = Some(value.to_string()),
        "tune" => props.tuning = Some(parse::<f64>(value)?.trunc() / 100.0),
        "volume" => props.volume = Some(Volume::Decibels(parse(value)?)),
        "pan" => props.pan = Some(parse(value)?),
        "pitch_keytrack" => props.pitch_key_track = Some(parse::<f64>(value)? / 100.0),
        _ => return Ok(false),
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use presetbridge_sfz::parse_sfz_str;

    fn import(text: &str) -> Instrument {
        import_sfz(&parse_sfz_str(text).unwrap())
    }

    #[test]
    fn test_levels_stay_separate() {
        let instrument = import(
            "<global> ampeg_release=0.8\n<group> group_label=Sustain volume=-3\n\
             <region> sample=a.wav lovel=0 hivel=90",
        );
        assert_eq!(instrument.global.release, Some(0.8));
        let group = &instrument.groups[0];
        assert_eq!(group.props.name.as_deref(), Some("Sustain"));
        assert_eq!(group.props.volume, Some(Volume::Decibels(-3.0)));
        assert_eq!(group.props.release, None);
        assert_eq!(group.regions[0].props.hi_vel, Some(90));
        assert_eq!(group.regions[0].props.volume, None);
    }

    #[test]
    fn test_key_sets_range_and_root() {
        let instrument = import("<region> sample=a.wav key=c4");
        let props = &instrument.groups[0].regions[0].props;
        assert_eq!(props.root_note, Some(60));
        assert_eq!(props.lo_note, Some(60));
        assert_eq!(props.hi_note, Some(60));

        let instrument = import("<region> key=60 pitch_keycenter=62 sample=a.wav");
        assert_eq!(instrument.groups[0].regions[0].props.root_note, Some(62));
    }

    #[test]
    fn test_scaled_opcodes() {
        let instrument = import(
            "<region> sample=a.wav tune=-25 amp_veltrack=50 pitch_keytrack=0 offset=10 end=999",
        );
        let props = &instrument.groups[0].regions[0].props;
        assert_eq!(props.tuning, Some(-0.25));
        assert_eq!(props.amp_vel_track, Some(0.5));
        assert_eq!(props.pitch_key_track, Some(0.0));
        assert_eq!(props.start, Some(10));
        assert_eq!(props.end, Some(999));
    }

    #[test]
    fn test_unsupported_and_invalid_opcodes_are_skipped() {
        let instrument = import(
            "<global> group_label=Nope\n\
             <region> sample=a.wav fil_type=lpf_2p lokey=banana hikey=72",
        );
        assert_eq!(instrument.global.name, None);
        let props = &instrument.groups[0].regions[0].props;
        assert_eq!(props.lo_note, None);
        assert_eq!(props.hi_note, Some(72));
    }

    #[test]
    fn test_overflowing_note_name_is_skipped() {
        let instrument = import("<region> sample=a.wav lokey=c999999999 hikey=c5");
        let props = &instrument.groups[0].regions[0].props;
        assert_eq!(props.lo_note, None);
        assert_eq!(props.hi_note, Some(72));
    }

    #[test]
    fn test_sequence_opcodes_set_round_robin() {
        let instrument = import("<region> sample=a.wav seq_length=4 seq_position=2");
        let props = &instrument.groups[0].regions[0].props;
        assert_eq!(props.seq_length, Some(4));
        assert_eq!(props.seq_position, Some(2));
        assert_eq!(props.seq_mode, Some(SeqMode::RoundRobin));
    }

    #[test]
    fn test_default_path_applied_to_samples() {
        let instrument = import("<control> default_path=Samples/Piano/\n<region> sample=C4.wav");
        assert_eq!(
            instrument.groups[0].regions[0].props.path.as_deref(),
            Some("Samples/Piano/C4.wav")
        );
    }

    #[test]
    fn test_loop_mode_no_loop() {
        let instrument = import("<region> sample=a.wav loop_mode=one_shot");
        assert_eq!(instrument.groups[0].regions[0].props.loop_enabled, Some(false));
    }
}
