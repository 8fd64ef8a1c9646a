use super::{scaled_int, Level};
use crate::model::{format_number, Instrument, Properties, VOICE_GROUP_PREFIX};

const HEADER: &str = "// SFZ file created with presetbridge";

/// Render the tree as SFZ text: one line per section, global first, each
/// group followed by its regions.
pub fn export_sfz(instrument: &Instrument) -> String {
    let mut out = String::new();
    out.push_str(HEADER);
    out.push_str("\n\n");

    let global = section_tokens(&instrument.global, Level::Global);
    if !global.is_empty() {
        push_line(&mut out, Level::Global, &global);
    }

    for group in &instrument.groups {
        push_line(&mut out, Level::Group, &section_tokens(&group.props, Level::Group));
        for region in &group.regions {
            push_line(&mut out, Level::Region, &section_tokens(&region.props, Level::Region));
        }
    }
    out
}

fn push_line(out: &mut String, level: Level, tokens: &[String]) {
    out.push_str(level.header());
    for token in tokens {
        out.push(' ');
        out.push_str(token);
    }
    out.push('\n');
}

fn strip_voice_group(tags: &str) -> &str {
    tags.strip_prefix(VOICE_GROUP_PREFIX).unwrap_or(tags)
}

/// `key=value` tokens for the properties present on one node.
fn section_tokens(props: &Properties, level: Level) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut push = |key: &str, value: String| tokens.push(format!("{}={}", key, value));

    if level == Level::Group {
        if let Some(name) = &props.name {
            push("group_label", name.clone());
        }
    }
    if let Some(track) = props.amp_vel_track {
        if (0.0..1.0).contains(&track) {
            push("amp_veltrack", scaled_int(track, 100.0).to_string());
        }
    }
    if let Some(attack) = props.attack {
        push("ampeg_attack", format_number(attack));
    }
    if let Some(decay) = props.decay {
        push("ampeg_decay", format_number(decay));
    }
    if let Some(sustain) = props.sustain {
        push("ampeg_sustain", format_number(sustain));
    }
    if let Some(release) = props.release {
        push("ampeg_release", format_number(release));
    }
    if let Some(tags) = &props.tags {
        push("group", strip_voice_group(tags).to_string());
    }
    if let Some(tags) = &props.silenced_by_tags {
        push("off_by", strip_voice_group(tags).to_string());
    }
    if let Some(mode) = &props.silencing_mode {
        push("off_mode", mode.clone());
    }
    if let Some(start) = props.start.filter(|start| *start != 0) {
        push("offset", start.to_string());
    }
    if let Some(end) = props.end {
        push("end", end.to_string());
    }
    if let Some(lo) = props.lo_note {
        push("lokey", lo.to_string());
    }
    if let Some(hi) = props.hi_note {
        push("hikey", hi.to_string());
    }
    if let Some(root) = props.root_note {
        push("pitch_keycenter", root.to_string());
    }
    if let Some(lo) = props.lo_vel.filter(|v| *v != 0) {
        push("lovel", lo.to_string());
    }
    if let Some(hi) = props.hi_vel.filter(|v| *v != 127) {
        push("hivel", hi.to_string());
    }
    if let Some(enabled) = props.loop_enabled {
        let mode = if enabled { "loop_continuous" } else { "no_loop" };
        push("loop_mode", mode.to_string());
    }
    if let Some(start) = props.loop_start {
        push("loop_start", start.to_string());
    }
    if let Some(end) = props.loop_end {
        push("loop_end", (end + 1).to_string());
    }
    if let Some(path) = &props.path {
        push("sample", path.clone());
    }
    if let Some(position) = props.seq_position {
        push("seq_position", position.to_string());
    }
    if let Some(length) = props.seq_length {
        push("seq_length", length.to_string());
    }
    if let Some(note) = props.previous_note {
        push("sw_previous", note.to_string());
    }
    if let Some(trigger) = &props.trigger {
        push("trigger", trigger.clone());
    }
    if let Some(tuning) = props.tuning {
        push("tune", scaled_int(tuning, 100.0).to_string());
    }
    if let Some(volume) = props.volume {
        push("volume", format_number(volume.to_decibels()));
    }
    if let Some(pan) = props.pan {
        push("pan", format_number(pan));
    }
    if let Some(track) = props.pitch_key_track {
        push("pitch_keytrack", format_number(track * 100.0));
    }

    tokens
}
