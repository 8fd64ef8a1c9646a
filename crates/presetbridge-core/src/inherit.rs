//! Three-level property inheritance (global → group → region).
//!
//! Resolution never touches the tree: each level's resolved parameters are
//! computed from its own explicit values with the parent's *resolved*
//! parameters as fallback.

use crate::model::{CrossfadeShape, Instrument, Properties};

/// First explicit value, most specific layer first.
pub fn cascade<T: Copy>(layers: &[Option<T>]) -> Option<T> {
    layers.iter().copied().flatten().next()
}

/// Effective playback and loop parameters of one node.
///
/// `None` on `end`/`loop_start`/`loop_end` means the value was never set at
/// any level; it is bound to the file length only once the file is known.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlaybackParams {
    pub start: i64,
    pub end: Option<i64>,
    pub loop_enabled: Option<bool>,
    pub loop_start: Option<i64>,
    pub loop_end: Option<i64>,
    pub crossfade: i64,
    pub shape: CrossfadeShape,
}

impl PlaybackParams {
    /// Resolve `node` against its parent's resolved parameters.
    pub fn resolve(node: &Properties, parent: &PlaybackParams) -> PlaybackParams {
        PlaybackParams {
            start: node.start.unwrap_or(parent.start),
            end: cascade(&[node.end, parent.end]),
            loop_enabled: cascade(&[node.loop_enabled, parent.loop_enabled]),
            loop_start: cascade(&[node.loop_start, parent.loop_start]),
            loop_end: cascade(&[node.loop_end, parent.loop_end]),
            crossfade: node.loop_crossfade.unwrap_or(parent.crossfade),
            shape: node.loop_crossfade_mode.unwrap_or(parent.shape),
        }
    }

    /// Resolve a chain of layers ordered from global to most specific.
    pub fn resolve_chain(layers: &[&Properties]) -> PlaybackParams {
        layers
            .iter()
            .fold(PlaybackParams::default(), |parent, node| {
                PlaybackParams::resolve(node, &parent)
            })
    }

    pub fn is_looping(&self) -> bool {
        self.loop_enabled.unwrap_or(false)
    }

    /// Write these parameters onto `props` as explicit values.
    pub fn apply_to(&self, props: &mut Properties) {
        props.start = Some(self.start);
        props.end = self.end;
        props.loop_enabled = self.loop_enabled;
        props.loop_start = self.loop_start;
        props.loop_end = self.loop_end;
        props.loop_crossfade = Some(self.crossfade);
        props.loop_crossfade_mode = Some(self.shape);
    }
}

/// Resolved parameters for every node of an instrument, in tree order.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTree {
    pub global: PlaybackParams,
    pub groups: Vec<ResolvedGroup>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedGroup {
    pub params: PlaybackParams,
    pub regions: Vec<PlaybackParams>,
}

impl ResolvedTree {
    pub fn resolve(instrument: &Instrument) -> ResolvedTree {
        let global = PlaybackParams::resolve(&instrument.global, &PlaybackParams::default());
        let groups = instrument
            .groups
            .iter()
            .map(|group| {
                let params = PlaybackParams::resolve(&group.props, &global);
                let regions = group
                    .regions
                    .iter()
                    .map(|region| PlaybackParams::resolve(&region.props, &params))
                    .collect();
                ResolvedGroup { params, regions }
            })
            .collect();

        ResolvedTree { global, groups }
    }
}
