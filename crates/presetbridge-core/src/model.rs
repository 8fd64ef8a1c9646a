//! Canonical instrument tree.
//!
//! Every importer writes this model and every exporter and materialization
//! pass reads it. It mirrors the DecentSampler preset layout:
//!
//! ```text
//! Instrument
//! ├── effects / ui   (opaque blocks, passed through untouched)
//! └── groups         (global properties)
//!     └── Group      (group properties)
//!         └── Region (one sample file + mapping)
//! ```
//!
//! Properties are a closed set of typed optional fields. `None` means *unset*:
//! nothing is defaulted until inheritance is resolved (see [`crate::inherit`]).

use std::fmt;

use crate::error::Result;

/// Tag prefix used for SFZ `group`/`off_by` voice groups.
pub const VOICE_GROUP_PREFIX: &str = "voice-group-";

/// A complete instrument.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Instrument {
    pub effects: Option<Element>,
    pub ui: Option<Element>,
    /// Properties on the `<groups>` container; the global defaults.
    pub global: Properties,
    pub groups: Vec<Group>,
}

impl Instrument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_regions(&self) -> usize {
        self.groups.iter().map(|g| g.regions.len()).sum()
    }

    /// Human-readable one-line summary.
    pub fn info(&self) -> String {
        format!(
            "{} groups, {} regions",
            self.groups.len(),
            self.num_regions()
        )
    }

    /// Visit global, then each group followed by its regions, stopping at the
    /// first error.
    pub fn try_for_each_node_mut<F>(&mut self, mut visit: F) -> Result<()>
    where
        F: FnMut(&mut Properties) -> Result<()>,
    {
        visit(&mut self.global)?;
        for group in &mut self.groups {
            visit(&mut group.props)?;
            for region in &mut group.regions {
                visit(&mut region.props)?;
            }
        }
        Ok(())
    }

    /// Build the element tree rendered by the XML exporter.
    pub fn to_element(&self) -> Element {
        let mut root = Element::new("DecentSampler");
        if let Some(effects) = &self.effects {
            root.children.push(effects.clone());
        }
        if let Some(ui) = &self.ui {
            root.children.push(ui.clone());
        }

        let mut groups = Element::new("groups").with_properties(&self.global);
        for group in &self.groups {
            let mut group_element = Element::new("group").with_properties(&group.props);
            for region in &group.regions {
                group_element
                    .children
                    .push(Element::new("sample").with_properties(&region.props));
            }
            groups.children.push(group_element);
        }
        root.children.push(groups);
        root
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Group {
    pub props: Properties,
    pub regions: Vec<Region>,
}

/// A single sample mapping (`<sample>` in the preset, `<region>` in SFZ).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Region {
    pub props: Properties,
}

/// The property vocabulary shared by all three levels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    pub name: Option<String>,
    pub path: Option<String>,

    pub root_note: Option<i32>,
    pub lo_note: Option<i32>,
    pub hi_note: Option<i32>,
    pub lo_vel: Option<i32>,
    pub hi_vel: Option<i32>,
    pub pitch_key_track: Option<f64>,
    /// Semitones; fractional part is cents / 100.
    pub tuning: Option<f64>,

    pub pan: Option<f64>,
    pub volume: Option<Volume>,
    pub amp_vel_track: Option<f64>,
    pub attack: Option<f64>,
    pub decay: Option<f64>,
    pub sustain: Option<f64>,
    pub release: Option<f64>,

    /// Inclusive sample frame indices.
    pub start: Option<i64>,
    pub end: Option<i64>,
    pub loop_enabled: Option<bool>,
    pub loop_start: Option<i64>,
    pub loop_end: Option<i64>,
    /// Crossfade length in sample frames.
    pub loop_crossfade: Option<i64>,
    /// Crossfade length in milliseconds, pending conversion to frames.
    pub loop_crossfade_ms: Option<f64>,
    pub loop_crossfade_mode: Option<CrossfadeShape>,

    pub seq_position: Option<i64>,
    pub seq_length: Option<i64>,
    pub seq_mode: Option<SeqMode>,

    pub tags: Option<String>,
    pub silenced_by_tags: Option<String>,
    pub silencing_mode: Option<String>,
    pub previous_note: Option<i32>,
    pub trigger: Option<String>,
}

impl Properties {
    /// Attributes in canonical preset order, rendered as strings.
    pub fn attributes(&self) -> Vec<(&'static str, String)> {
        let mut attrs = Vec::new();
        let mut push = |key: &'static str, value: Option<String>| {
            if let Some(value) = value {
                attrs.push((key, value));
            }
        };

        push("name", self.name.clone());
        push("path", self.path.clone());
        push("rootNote", self.root_note.map(|v| v.to_string()));
        push("loNote", self.lo_note.map(|v| v.to_string()));
        push("hiNote", self.hi_note.map(|v| v.to_string()));
        push("loVel", self.lo_vel.map(|v| v.to_string()));
        push("hiVel", self.hi_vel.map(|v| v.to_string()));
        push("pitchKeyTrack", self.pitch_key_track.map(format_number));
        push("tuning", self.tuning.map(format_number));
        push("pan", self.pan.map(format_number));
        push("volume", self.volume.map(|v| v.to_string()));
        push("ampVelTrack", self.amp_vel_track.map(format_number));
        push("attack", self.attack.map(format_number));
        push("decay", self.decay.map(format_number));
        push("sustain", self.sustain.map(format_number));
        push("release", self.release.map(format_number));
        push("start", self.start.map(|v| v.to_string()));
        push("end", self.end.map(|v| v.to_string()));
        push("loopEnabled", self.loop_enabled.map(|v| v.to_string()));
        push("loopStart", self.loop_start.map(|v| v.to_string()));
        push("loopEnd", self.loop_end.map(|v| v.to_string()));
        push("loopCrossfade", self.loop_crossfade.map(|v| v.to_string()));
        push("loopCrossfadeMilliseconds", self.loop_crossfade_ms.map(format_number));
        push("loopCrossfadeMode", self.loop_crossfade_mode.map(|v| v.to_string()));
        push("seqPosition", self.seq_position.map(|v| v.to_string()));
        push("seqLength", self.seq_length.map(|v| v.to_string()));
        push("seqMode", self.seq_mode.map(|v| v.to_string()));
        push("tags", self.tags.clone());
        push("silencedByTags", self.silenced_by_tags.clone());
        push("silencingMode", self.silencing_mode.clone());
        push("previousNote", self.previous_note.map(|v| v.to_string()));
        push("trigger", self.trigger.clone());
        attrs
    }
}

/// A volume as written by the source: decibels (`"-6dB"`) or linear gain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Volume {
    Decibels(f64),
    Linear(f64),
}

impl Volume {
    pub const MIN_DB: f64 = -100.0;
    pub const MAX_DB: f64 = 24.0;

    /// Accepts `"<n>dB"` (decibels) or a bare number (linear gain).
    pub fn parse(s: &str) -> Option<Volume> {
        let s = s.trim();
        match s.find("dB") {
            Some(pos) => s[..pos].trim().parse().ok().map(Volume::Decibels),
            None => s.parse().ok().map(Volume::Linear),
        }
    }

    /// Decibels clamped to `[-100, 24]`; a linear gain of zero or less is -100.
    pub fn to_decibels(self) -> f64 {
        let db = match self {
            Volume::Decibels(db) => db,
            Volume::Linear(gain) if gain > 0.0 => 20.0 * gain.log10(),
            Volume::Linear(_) => Self::MIN_DB,
        };
        db.clamp(Self::MIN_DB, Self::MAX_DB)
    }
}

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Volume::Decibels(db) => write!(f, "{}dB", format_number(*db)),
            Volume::Linear(gain) => write!(f, "{}", format_number(*gain)),
        }
    }
}

/// Loop crossfade curve tag. Carried through conversion; baking always
/// blends equal-power.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CrossfadeShape {
    #[default]
    Linear,
    EqualPower,
}

impl fmt::Display for CrossfadeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CrossfadeShape::Linear => "linear",
            CrossfadeShape::EqualPower => "equal_power",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeqMode {
    RoundRobin,
}

impl fmt::Display for SeqMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeqMode::RoundRobin => f.write_str("round_robin"),
        }
    }
}

/// A generic named node with string attributes and ordered children.
///
/// Used for the opaque `<ui>`/`<effects>` blocks and as the render tree for XML
/// output.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn get_attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn with_properties(mut self, props: &Properties) -> Self {
        self.attributes.extend(
            props
                .attributes()
                .into_iter()
                .map(|(k, v)| (k.to_string(), v)),
        );
        self
    }
}

/// Render a number without a trailing `.0` for whole values.
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
