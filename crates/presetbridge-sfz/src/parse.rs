use crate::error::Error;
use crate::types::{SfzFile, SfzGroup, SfzSection, SfzSectionType};

/// Result type alias for parser functions
type Result<T> = std::result::Result<T, Error>;

/// Parse SFZ text into a section tree
///
/// # SFZ File Format
///
/// 1. **Section headers**: enclosed in angle brackets, like `<region>` or `<global>`
/// 2. **Opcodes**: `name=value` pairs, several per line allowed
/// 3. **Comments**: `//` to end of line, and `/* ... */` blocks
///
/// Headers and opcodes may share a line:
///
/// ```text
/// <group> group_label=Sustain <region> sample=Piano C4.wav lokey=60 hikey=61
/// ```
///
/// A value runs until the next `name=` token, so sample paths with spaces
/// survive. Preprocessor lines (`#define`, `#include`), `<curve>` and
/// `<effect>` sections, and unknown headers are skipped with a warning.
///
/// # Hierarchy
///
/// Opcodes are *not* flattened into regions. Each level keeps only what was
/// written on it (see [`SfzFile`]), except that `<master>` opcodes are copied
/// into the groups that follow.
pub fn parse_sfz(content: &str) -> Result<SfzFile> {
    let content = strip_block_comments(content);
    let mut builder = TreeBuilder::default();

    for (index, raw_line) in content.lines().enumerate() {
        let line_no = index + 1;
        let line = match raw_line.find("//") {
            Some(pos) => &raw_line[..pos],
            None => raw_line,
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.starts_with('#') {
            log::warn!(
                "line {}: preprocessor directive '{}' not supported, skipping",
                line_no,
                trimmed
            );
            continue;
        }

        parse_line(line, line_no, &mut builder)?;
    }

    Ok(builder.finish())
}

/// Blank out `/* ... */` comments, keeping newlines so line numbers stay right.
fn strip_block_comments(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();
    let mut in_comment = false;

    while let Some(c) = chars.next() {
        if in_comment {
            if c == '*' && chars.peek() == Some(&'/') {
                chars.next();
                in_comment = false;
                out.push_str("  ");
            } else if c == '\n' {
                out.push('\n');
            } else {
                out.push(' ');
            }
        } else if c == '/' && chars.peek() == Some(&'*') {
            chars.next();
            in_comment = true;
            out.push_str("  ");
        } else {
            out.push(c);
        }
    }
    out
}

/// Split one line into header and opcode segments.
fn parse_line(line: &str, line_no: usize, builder: &mut TreeBuilder) -> Result<()> {
    let mut rest = line;
    let mut offset = 0;

    while !rest.is_empty() {
        match rest.find('<') {
            Some(0) => {
                let close = rest.find('>').ok_or_else(|| Error::ParseAt {
                    line: line_no,
                    column: offset + 1,
                    message: format!("unterminated section header '{}'", rest.trim()),
                })?;
                let name = rest[1..close].trim();
                if name.is_empty() {
                    return Err(Error::ParseAt {
                        line: line_no,
                        column: offset + 1,
                        message: "empty section header".to_string(),
                    });
                }
                builder.open_section(name, line_no);
                rest = &rest[close + 1..];
                offset += close + 1;
            }
            Some(pos) => {
                parse_opcodes(&rest[..pos], line_no, offset, builder)?;
                rest = &rest[pos..];
                offset += pos;
            }
            None => {
                parse_opcodes(rest, line_no, offset, builder)?;
                break;
            }
        }
    }
    Ok(())
}

fn parse_opcodes(
    text: &str,
    line_no: usize,
    offset: usize,
    builder: &mut TreeBuilder,
) -> Result<()> {
    let mut pending: Option<(String, String)> = None;

    for token in text.split_whitespace() {
        match split_opcode(token) {
            Some((name, value)) => {
                if let Some((name, value)) = pending.take() {
                    builder.add_opcode(name, value, line_no);
                }
                pending = Some((name.to_string(), value.to_string()));
            }
            None => match pending.as_mut() {
                Some((_, value)) => {
                    if !value.is_empty() {
                        value.push(' ');
                    }
                    value.push_str(token);
                }
                None => {
                    let column = offset + (token.as_ptr() as usize - text.as_ptr() as usize) + 1;
                    return Err(Error::ParseAt {
                        line: line_no,
                        column,
                        message: format!("expected opcode=value, found '{}'", token),
                    });
                }
            },
        }
    }

    if let Some((name, value)) = pending {
        builder.add_opcode(name, value, line_no);
    }
    Ok(())
}

/// `name=value` where name is an identifier; anything else is a value continuation.
fn split_opcode(token: &str) -> Option<(&str, &str)> {
    let eq = token.find('=')?;
    let name = &token[..eq];
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    Some((name, &token[eq + 1..]))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Target {
    /// Opcodes before any header
    #[default]
    Orphan,
    Control,
    Global,
    Master,
    Group,
    Region,
    /// Inside a section the converter does not translate
    Ignored,
}

#[derive(Default)]
struct TreeBuilder {
    sfz: SfzFile,
    target: Target,
    master: Option<SfzSection>,
    group_open: bool,
}

impl TreeBuilder {
    fn open_section(&mut self, name: &str, line_no: usize) {
        self.target = match SfzSectionType::from_header(name) {
            Some(SfzSectionType::Control) => {
                self.sfz
                    .control
                    .get_or_insert_with(|| SfzSection::new(SfzSectionType::Control));
                Target::Control
            }
            Some(SfzSectionType::Global) => {
                self.sfz
                    .global
                    .get_or_insert_with(|| SfzSection::new(SfzSectionType::Global));
                Target::Global
            }
            Some(SfzSectionType::Master) => {
                self.master = Some(SfzSection::new(SfzSectionType::Master));
                self.group_open = false;
                Target::Master
            }
            Some(SfzSectionType::Group) => {
                let group = SfzGroup::new(self.inherited_group_section());
                self.sfz.groups.push(group);
                self.group_open = true;
                Target::Group
            }
            Some(SfzSectionType::Region) => {
                if !self.group_open {
                    let mut group = SfzGroup::implicit();
                    group.section = self.inherited_group_section();
                    self.sfz.groups.push(group);
                    self.group_open = true;
                }
                if let Some(group) = self.sfz.groups.last_mut() {
                    group.regions.push(SfzSection::new(SfzSectionType::Region));
                }
                Target::Region
            }
            Some(other) => {
                log::warn!(
                    "line {}: {} sections are not converted, skipping",
                    line_no,
                    other.header_str()
                );
                Target::Ignored
            }
            None => {
                log::warn!("line {}: unknown section header <{}>, skipping", line_no, name);
                Target::Ignored
            }
        };
    }

    /// A fresh group section pre-filled with the active `<master>` opcodes.
    fn inherited_group_section(&self) -> SfzSection {
        let mut section = SfzSection::new(SfzSectionType::Group);
        if let Some(master) = &self.master {
            for (name, value) in master.iter() {
                section.add_opcode(name, value);
            }
        }
        section
    }

    fn add_opcode(&mut self, name: String, value: String, line_no: usize) {
        let section = match self.target {
            Target::Control => self.sfz.control.as_mut(),
            Target::Global => self.sfz.global.as_mut(),
            Target::Master => self.master.as_mut(),
            Target::Group => self.sfz.groups.last_mut().map(|g| &mut g.section),
            Target::Region => self
                .sfz
                .groups
                .last_mut()
                .and_then(|g| g.regions.last_mut()),
            Target::Ignored => None,
            Target::Orphan => {
                log::warn!("line {}: opcode '{}' outside of any section, skipping", line_no, name);
                None
            }
        };
        if let Some(section) = section {
            section.add_opcode(name, value);
        }
    }

    fn finish(self) -> SfzFile {
        self.sfz
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_sfz() {
        let content = r#"
        <control>
        default_path=samples/piano/

        <global>
        volume=0

        <group>
        lovel=64
        <region>
        sample=piano_C3.wav
        key=60
        "#;

        let sfz = parse_sfz(content).expect("Failed to parse SFZ");

        assert_eq!(sfz.get_default_path(), Some("samples/piano/"));
        assert_eq!(sfz.global.as_ref().and_then(|g| g.get("volume")), Some("0"));
        assert_eq!(sfz.groups.len(), 1);

        let group = &sfz.groups[0];
        assert!(!group.implicit);
        assert_eq!(group.section.get("lovel"), Some("64"));
        // Group opcodes stay on the group
        assert_eq!(group.regions[0].get("lovel"), None);
        assert_eq!(group.regions[0].get("sample"), Some("piano_C3.wav"));
        assert_eq!(group.regions[0].get("key"), Some("60"));
    }

    #[test]
    fn test_header_and_opcodes_on_one_line() {
        let content = "<region> lokey=60 hikey=64 pitch_keycenter=62 sample=foo.wav volume=-6";
        let sfz = parse_sfz(content).unwrap();

        assert_eq!(sfz.groups.len(), 1);
        assert!(sfz.groups[0].implicit);
        let region = &sfz.groups[0].regions[0];
        let opcodes: Vec<_> = region.iter().collect();
        assert_eq!(
            opcodes,
            vec![
                ("lokey", "60"),
                ("hikey", "64"),
                ("pitch_keycenter", "62"),
                ("sample", "foo.wav"),
                ("volume", "-6"),
            ]
        );
    }

    #[test]
    fn test_sample_path_with_spaces() {
        let sfz = parse_sfz("<region>sample=Grand Piano C4.wav key=60 // inline comment").unwrap();
        let region = &sfz.groups[0].regions[0];
        assert_eq!(region.get("sample"), Some("Grand Piano C4.wav"));
        assert_eq!(region.get("key"), Some("60"));
    }

    #[test]
    fn test_master_opcodes_flow_into_groups() {
        let content = "<master> ampeg_release=0.5 volume=-3\n<group> volume=-1\n\
                       <region> sample=a.wav\n<group>\n<region> sample=b.wav";
        let sfz = parse_sfz(content).unwrap();

        assert_eq!(sfz.groups.len(), 2);
        assert_eq!(sfz.groups[0].section.get("volume"), Some("-1"));
        assert_eq!(sfz.groups[0].section.get("ampeg_release"), Some("0.5"));
        assert_eq!(sfz.groups[1].section.get("volume"), Some("-3"));
    }

    #[test]
    fn test_regions_before_groups_get_implicit_group() {
        let content = "<region> sample=a.wav\n<group> group_label=G\n<region> sample=b.wav";
        let sfz = parse_sfz(content).unwrap();
        assert_eq!(sfz.groups.len(), 2);
        assert!(sfz.groups[0].implicit);
        assert!(!sfz.groups[1].implicit);
        assert_eq!(sfz.num_regions(), 2);
    }

    #[test]
    fn test_block_comments_and_skipped_sections() {
        let content = "/* header\n comment */\n#define $KEY 60\n<curve> curve_index=1 v000=0\n\
                       <effect> type=reverb\n<region> sample=a.wav /* note */ key=61";
        let sfz = parse_sfz(content).unwrap();
        assert_eq!(sfz.num_regions(), 1);
        let region = &sfz.groups[0].regions[0];
        assert_eq!(region.get("key"), Some("61"));
        assert!(!region.contains("type"));
    }

    #[test]
    fn test_unterminated_header_reports_position() {
        let err = parse_sfz("<region> key=60\n  <group").unwrap_err();
        match err {
            Error::ParseAt { line, column, .. } => {
                assert_eq!(line, 2);
                assert_eq!(column, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_stray_token_is_an_error() {
        let err = parse_sfz("<region> garbage key=60").unwrap_err();
        assert!(matches!(err, Error::ParseAt { line: 1, column: 10, .. }));
    }
}
