//! Import of decoded EXS-style instruments.
//!
//! The container itself is decoded elsewhere; this module takes its flat zone,
//! group and sample lists (also readable from JSON) and builds the canonical
//! tree. Bad zones are logged and dropped, never fatal.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{CrossfadeShape, Group, Instrument, Properties, Region, SeqMode, Volume};
use crate::ui;

/// Group index of zones that belong to no group.
pub const UNGROUPED: i32 = -1;
/// Highest group index accepted before a zone is considered corrupt.
pub const MAX_GROUP_INDEX: i32 = 100;
/// Envelope attack given to every imported group, in seconds.
pub const DEFAULT_GROUP_ATTACK: f64 = 0.001;
/// Provisional crossfade conversion, assuming 48 kHz material.
pub const PROVISIONAL_SAMPLES_PER_MS: f64 = 48.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExsZone {
    pub name: String,
    pub group_index: i32,
    pub sample_index: i32,
    /// Root key.
    pub key: i32,
    pub key_low: i32,
    pub key_high: i32,
    /// Whether the zone tracks the keyboard pitch.
    pub pitch: bool,
    /// Semitones.
    pub coarse_tuning: i32,
    /// Cents.
    pub fine_tuning: i32,
    pub pan: i32,
    /// Decibels.
    pub volume: i32,
    pub sample_start: i64,
    /// Exclusive; 0 means the whole file.
    pub sample_end: i64,
    pub loop_enabled: bool,
    pub loop_start: i64,
    /// Exclusive.
    pub loop_end: i64,
    pub loop_crossfade_ms: i32,
    pub loop_equal_power: bool,
    pub velocity_range_on: bool,
    pub lo_vel: i32,
    pub hi_vel: i32,
    pub seq_number: i32,
}

impl Default for ExsZone {
    fn default() -> Self {
        Self {
            name: String::new(),
            group_index: UNGROUPED,
            sample_index: 0,
            key: 60,
            key_low: 0,
            key_high: 127,
            pitch: true,
            coarse_tuning: 0,
            fine_tuning: 0,
            pan: 0,
            volume: 0,
            sample_start: 0,
            sample_end: 0,
            loop_enabled: false,
            loop_start: 0,
            loop_end: 0,
            loop_crossfade_ms: 0,
            loop_equal_power: false,
            velocity_range_on: false,
            lo_vel: 0,
            hi_vel: 127,
            seq_number: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExsGroup {
    pub name: String,
    pub pan: i32,
    pub volume: i32,
    pub seq_number: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExsSample {
    pub file_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExsInstrument {
    pub zones: Vec<ExsZone>,
    pub groups: Vec<ExsGroup>,
    pub samples: Vec<ExsSample>,
}

impl ExsInstrument {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Build the canonical tree from a decoded instrument.
pub fn import_exs(source: &ExsInstrument, generic_ui: bool) -> Instrument {
    let groups = normalize_groups(source);

    let mut instrument = Instrument::new();
    if generic_ui {
        instrument.effects = Some(ui::generic_effects());
        instrument.ui = Some(ui::generic_ui());
    }

    let mut highest_seq = 0i64;
    for group_index in UNGROUPED..groups.len() as i32 {
        let exs_group = usize::try_from(group_index)
            .ok()
            .and_then(|i| groups.get(i))
            .cloned()
            .unwrap_or_default();

        let mut props = Properties {
            attack: Some(DEFAULT_GROUP_ATTACK),
            ..Default::default()
        };
        if !exs_group.name.is_empty() {
            props.name = Some(exs_group.name.clone());
        }
        if exs_group.pan != 0 {
            props.pan = Some(f64::from(exs_group.pan));
        }
        if exs_group.volume != 0 {
            props.volume = Some(Volume::Decibels(f64::from(exs_group.volume)));
        }
        if exs_group.seq_number != 0 {
            let seq = i64::from(exs_group.seq_number);
            props.seq_position = Some(seq);
            highest_seq = highest_seq.max(seq);
        }

        let regions: Vec<Region> = source
            .zones
            .iter()
            .filter(|zone| zone.group_index == group_index)
            .filter_map(|zone| zone_to_region(zone, source, &mut highest_seq))
            .collect();

        if regions.is_empty() {
            if group_index != UNGROUPED {
                log::warn!(
                    "Discarding group {} ('{}'): it has no playable zones",
                    group_index,
                    exs_group.name
                );
            }
            continue;
        }
        instrument.groups.push(Group { props, regions });
    }

    apply_sequence_length(&mut instrument, highest_seq);
    log::debug!("Imported EXS instrument: {}", instrument.info());
    instrument
}

/// Source groups extended with placeholders for every group index a zone
/// refers to. Zones with unusable indices are reported here.
fn normalize_groups(source: &ExsInstrument) -> Vec<ExsGroup> {
    let mut groups = source.groups.clone();
    for zone in &source.zones {
        if zone.group_index < 0 {
            continue;
        }
        if zone.group_index > MAX_GROUP_INDEX {
            log::warn!(
                "Zone '{}' has group index {} (above {}); this file may not be supported, \
                 skipping zone",
                zone.name,
                zone.group_index,
                MAX_GROUP_INDEX
            );
            continue;
        }
        while zone.group_index as usize >= groups.len() {
            let name = format!("unknown group {}", groups.len());
            groups.push(ExsGroup {
                name,
                ..Default::default()
            });
        }
    }
    groups
}

fn zone_to_region(zone: &ExsZone, source: &ExsInstrument, highest_seq: &mut i64) -> Option<Region> {
    let sample = match usize::try_from(zone.sample_index)
        .ok()
        .and_then(|i| source.samples.get(i))
    {
        Some(sample) => sample,
        None => {
            log::warn!(
                "Zone '{}' refers to sample {} which does not exist, skipping zone",
                zone.name,
                zone.sample_index
            );
            return None;
        }
    };

    let mut props = Properties {
        path: Some(sample.file_name.clone()),
        name: Some(zone.name.clone()),
        root_note: Some(zone.key),
        lo_note: Some(zone.key_low),
        hi_note: Some(zone.key_high),
        lo_vel: Some(if zone.velocity_range_on { zone.lo_vel } else { 0 }),
        hi_vel: Some(if zone.velocity_range_on { zone.hi_vel } else { 127 }),
        ..Default::default()
    };
    if !zone.pitch {
        props.pitch_key_track = Some(0.0);
    }

    let tuning = f64::from(zone.coarse_tuning) + f64::from(zone.fine_tuning) / 100.0;
    if tuning != 0.0 {
        props.tuning = Some(tuning);
    }
    if zone.pan != 0 {
        props.pan = Some(f64::from(zone.pan));
    }
    if zone.volume != 0 {
        props.volume = Some(Volume::Decibels(f64::from(zone.volume)));
    }
    if zone.sample_start != 0 {
        props.start = Some(zone.sample_start);
    }
    if zone.sample_end != 0 {
        props.end = Some(zone.sample_end - 1);
    }

    if zone.loop_enabled {
        props.loop_enabled = Some(true);
        props.loop_start = Some(zone.loop_start);
        props.loop_end = Some(if zone.loop_end > 0 { zone.loop_end - 1 } else { 0 });
        if zone.loop_crossfade_ms != 0 {
            let ms = f64::from(zone.loop_crossfade_ms);
            props.loop_crossfade_ms = Some(ms);
            props.loop_crossfade = Some((PROVISIONAL_SAMPLES_PER_MS * ms) as i64);
        }
        props.loop_crossfade_mode = Some(if zone.loop_equal_power {
            CrossfadeShape::EqualPower
        } else {
            CrossfadeShape::Linear
        });
    }

    if zone.seq_number != 0 {
        let seq = i64::from(zone.seq_number);
        props.seq_position = Some(seq);
        *highest_seq = (*highest_seq).max(seq);
    }

    Some(Region { props })
}

fn apply_sequence_length(instrument: &mut Instrument, highest_seq: i64) {
    let stamp = |props: &mut Properties| {
        if props.seq_position.is_some() {
            props.seq_length = Some(highest_seq);
            props.seq_mode = Some(SeqMode::RoundRobin);
        }
    };
    for group in &mut instrument.groups {
        stamp(&mut group.props);
        for region in &mut group.regions {
            stamp(&mut region.props);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(name: &str) -> ExsSample {
        ExsSample {
            file_name: name.to_string(),
        }
    }

    fn zone(group_index: i32, sample_index: i32) -> ExsZone {
        ExsZone {
            name: format!("zone {}", sample_index),
            group_index,
            sample_index,
            ..Default::default()
        }
    }

    #[test]
    fn test_group_overflow_creates_placeholders() {
        let source = ExsInstrument {
            zones: vec![zone(5, 0)],
            groups: vec![
                ExsGroup {
                    name: "A".to_string(),
                    ..Default::default()
                },
                ExsGroup {
                    name: "B".to_string(),
                    ..Default::default()
                },
            ],
            samples: vec![sample("C4.wav")],
        };

        let names: Vec<_> = normalize_groups(&source).into_iter().map(|g| g.name).collect();
        assert_eq!(
            names,
            vec![
                "A",
                "B",
                "unknown group 2",
                "unknown group 3",
                "unknown group 4",
                "unknown group 5"
            ]
        );

        let instrument = import_exs(&source, false);
        assert_eq!(instrument.groups.len(), 1);
        assert_eq!(instrument.groups[0].props.name.as_deref(), Some("unknown group 5"));
        assert_eq!(instrument.groups[0].regions.len(), 1);
    }

    #[test]
    fn test_bad_zones_are_dropped() {
        let source = ExsInstrument {
            zones: vec![zone(101, 0), zone(-7, 0), zone(0, 3), zone(0, 0)],
            groups: vec![ExsGroup::default()],
            samples: vec![sample("a.wav")],
        };
        let instrument = import_exs(&source, false);
        assert_eq!(instrument.num_regions(), 1);
        assert_eq!(instrument.groups.len(), 1);
    }

    #[test]
    fn test_ungrouped_zones_come_first() {
        let source = ExsInstrument {
            zones: vec![zone(0, 0), zone(UNGROUPED, 1)],
            groups: vec![ExsGroup {
                name: "Real".to_string(),
                volume: -3,
                ..Default::default()
            }],
            samples: vec![sample("a.wav"), sample("b.wav")],
        };
        let instrument = import_exs(&source, true);
        assert!(instrument.effects.is_some());
        assert!(instrument.ui.is_some());

        assert_eq!(instrument.groups.len(), 2);
        assert_eq!(instrument.groups[0].props.name, None);
        assert_eq!(instrument.groups[0].regions[0].props.path.as_deref(), Some("b.wav"));
        assert_eq!(instrument.groups[1].props.name.as_deref(), Some("Real"));
        assert_eq!(instrument.groups[1].props.volume, Some(Volume::Decibels(-3.0)));
        for group in &instrument.groups {
            assert_eq!(group.props.attack, Some(DEFAULT_GROUP_ATTACK));
        }
    }

    #[test]
    fn test_zone_field_mapping() {
        let source = ExsInstrument {
            zones: vec![ExsZone {
                name: "Pad C3".to_string(),
                group_index: 0,
                key: 48,
                key_low: 45,
                key_high: 50,
                pitch: false,
                coarse_tuning: -1,
                fine_tuning: 25,
                sample_start: 100,
                sample_end: 44100,
                loop_enabled: true,
                loop_start: 2000,
                loop_end: 40000,
                loop_crossfade_ms: 10,
                loop_equal_power: true,
                ..Default::default()
            }],
            groups: vec![ExsGroup::default()],
            samples: vec![sample("pad.wav")],
        };
        let instrument = import_exs(&source, false);
        let props = &instrument.groups[0].regions[0].props;

        assert_eq!(props.root_note, Some(48));
        assert_eq!(props.lo_note, Some(45));
        assert_eq!(props.hi_note, Some(50));
        assert_eq!(props.lo_vel, Some(0));
        assert_eq!(props.hi_vel, Some(127));
        assert_eq!(props.pitch_key_track, Some(0.0));
        assert_eq!(props.tuning, Some(-0.75));
        assert_eq!(props.start, Some(100));
        assert_eq!(props.end, Some(44099));
        assert_eq!(props.loop_enabled, Some(true));
        assert_eq!(props.loop_start, Some(2000));
        assert_eq!(props.loop_end, Some(39999));
        assert_eq!(props.loop_crossfade_ms, Some(10.0));
        assert_eq!(props.loop_crossfade, Some(480));
        assert_eq!(props.loop_crossfade_mode, Some(CrossfadeShape::EqualPower));
    }

    #[test]
    fn test_sequence_post_pass() {
        let mut second = zone(0, 1);
        second.seq_number = 2;
        let source = ExsInstrument {
            zones: vec![zone(0, 0), second, zone(1, 0)],
            groups: vec![
                ExsGroup::default(),
                ExsGroup {
                    seq_number: 3,
                    ..Default::default()
                },
            ],
            samples: vec![sample("a.wav"), sample("b.wav")],
        };
        let instrument = import_exs(&source, false);

        let first_group = &instrument.groups[0];
        assert_eq!(first_group.props.seq_length, None);
        assert_eq!(first_group.regions[0].props.seq_mode, None);
        assert_eq!(first_group.regions[1].props.seq_position, Some(2));
        assert_eq!(first_group.regions[1].props.seq_length, Some(3));

        let second_group = &instrument.groups[1];
        assert_eq!(second_group.props.seq_position, Some(3));
        assert_eq!(second_group.props.seq_length, Some(3));
        assert_eq!(second_group.props.seq_mode, Some(SeqMode::RoundRobin));
    }

    #[test]
    fn test_from_json_uses_defaults() {
        let json = r#"{
            "zones": [{ "name": "Kick", "groupIndex": 0, "sampleIndex": 0, "key": 36 }],
            "groups": [{ "name": "Drums" }],
            "samples": [{ "fileName": "kick.wav" }]
        }"#;
        let source = ExsInstrument::from_json(json).unwrap();
        assert_eq!(source.zones[0].key_high, 127);
        assert!(source.zones[0].pitch);

        let instrument = import_exs(&source, false);
        assert_eq!(instrument.groups[0].regions[0].props.root_note, Some(36));
    }
}
