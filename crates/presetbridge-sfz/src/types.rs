use std::path::PathBuf;

use crate::path_utils::resolve_absolute_path;

/// Represents a complete SFZ file, split into its three inheritance levels
///
/// Unlike a player, a converter must not flatten the hierarchy: a value set on
/// `<global>` or `<group>` has to stay on that level so it can be written back
/// to the same level in the target format. The file is therefore kept as a
/// tree:
///
/// ```text
/// <control>      -> control
/// <global>       -> global
/// <group>        -> groups[n].section
/// <region>       -> groups[n].regions[m]
/// ```
///
/// `<master>` opcodes are folded into the groups that follow them (a group's own
/// value wins). Regions that appear before any `<group>` header are collected
/// into an implicit group.
#[derive(Debug, Clone, PartialEq)]
pub struct SfzFile {
    /// The `<control>` section (`default_path` and friends)
    pub control: Option<SfzSection>,

    /// The `<global>` section
    pub global: Option<SfzSection>,

    /// Groups in file order, each owning its regions
    pub groups: Vec<SfzGroup>,

    /// Path to the source SFZ file, if parsed from disk
    pub source_file: Option<PathBuf>,
}

impl SfzFile {
    pub fn new() -> Self {
        Self {
            control: None,
            global: None,
            groups: Vec::new(),
            source_file: None,
        }
    }

    /// Total number of regions across all groups.
    pub fn num_regions(&self) -> usize {
        self.groups.iter().map(|g| g.regions.len()).sum()
    }

    pub fn get_default_path(&self) -> Option<&str> {
        self.control.as_ref().and_then(|ctrl| ctrl.get("default_path"))
    }

    /// Resolve the `sample` opcode of a section the way an SFZ player would:
    /// `default_path` first, then relative to the SFZ file's directory.
    pub fn resolve_sample_path(&self, section: &SfzSection) -> Option<PathBuf> {
        let sample_path = section.get("sample")?;
        Some(resolve_absolute_path(
            sample_path,
            self.get_default_path(),
            self.source_file.as_deref(),
        ))
    }
}

impl Default for SfzFile {
    fn default() -> Self {
        Self::new()
    }
}

/// A `<group>` section together with the regions that follow it
#[derive(Debug, Clone, PartialEq)]
pub struct SfzGroup {
    pub section: SfzSection,
    pub regions: Vec<SfzSection>,
    /// True for the group synthesized to hold regions declared before any `<group>`
    pub implicit: bool,
}

impl SfzGroup {
    pub fn new(section: SfzSection) -> Self {
        Self {
            section,
            regions: Vec::new(),
            implicit: false,
        }
    }

    pub fn implicit() -> Self {
        Self {
            section: SfzSection::new(SfzSectionType::Group),
            regions: Vec::new(),
            implicit: true,
        }
    }
}

/// SFZ section header types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SfzSectionType {
    Control,
    Global,
    Master,
    Group,
    Region,
    Curve,
    Effect,
}

impl SfzSectionType {
    pub fn from_header(header: &str) -> Option<Self> {
        match header.to_lowercase().as_str() {
            "control" => Some(Self::Control),
            "global" => Some(Self::Global),
            "master" => Some(Self::Master),
            "group" => Some(Self::Group),
            "region" => Some(Self::Region),
            "curve" => Some(Self::Curve),
            "effect" => Some(Self::Effect),
            _ => None,
        }
    }

    pub fn header_str(&self) -> &'static str {
        match self {
            Self::Control => "<control>",
            Self::Global => "<global>",
            Self::Master => "<master>",
            Self::Group => "<group>",
            Self::Region => "<region>",
            Self::Curve => "<curve>",
            Self::Effect => "<effect>",
        }
    }
}

/// A single section with its opcodes in file order
///
/// Order matters to the converter: when two opcodes write the same target
/// property (`key` and `pitch_keycenter` both set the root note) the later one
/// in the file wins. Setting an opcode twice keeps the first position and the
/// last value.
#[derive(Debug, Clone, PartialEq)]
pub struct SfzSection {
    pub section_type: SfzSectionType,
    opcodes: Vec<(String, String)>,
}

impl SfzSection {
    pub fn new(section_type: SfzSectionType) -> Self {
        Self {
            section_type,
            opcodes: Vec::new(),
        }
    }

    pub fn add_opcode(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.opcodes.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = value,
            None => self.opcodes.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.opcodes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.opcodes.iter().any(|(k, _)| k == name)
    }

    /// Opcodes in the order they were first declared.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.opcodes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.opcodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.opcodes.is_empty()
    }
}
