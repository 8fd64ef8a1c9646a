//! Default `<effects>` and `<ui>` blocks for converted instruments.
//!
//! A filter, chorus and reverb chain, plus a single tab of knobs bound to the
//! amp envelope and those effects.

use crate::model::Element;

const KNOB_Y: &str = "80";
const KNOB_WIDTH: &str = "100";

pub fn generic_effects() -> Element {
    Element::new("effects")
        .child(
            Element::new("effect")
                .attr("type", "lowpass")
                .attr("frequency", "22000.0"),
        )
        .child(
            Element::new("effect")
                .attr("type", "chorus")
                .attr("mix", "0.0")
                .attr("modDepth", "0.2")
                .attr("modRate", "0.2"),
        )
        .child(
            Element::new("effect")
                .attr("type", "reverb")
                .attr("wetLevel", "0.5"),
        )
}

struct Knob {
    x: &'static str,
    label: &'static str,
    kind: &'static str,
    min: &'static str,
    max: &'static str,
    value: &'static str,
}

impl Knob {
    fn element(&self, binding: Element) -> Element {
        let text_color = if self.kind == "percent" { "FF000000" } else { "AA000000" };
        Element::new("labeled-knob")
            .attr("x", self.x)
            .attr("y", KNOB_Y)
            .attr("width", KNOB_WIDTH)
            .attr("textSize", "16")
            .attr("textColor", text_color)
            .attr("trackForegroundColor", "CC000000")
            .attr("trackBackgroundColor", "66999999")
            .attr("label", self.label)
            .attr("type", self.kind)
            .attr("minValue", self.min)
            .attr("maxValue", self.max)
            .attr("value", self.value)
            .child(binding)
    }
}

fn binding(kind: &str, position: &str, parameter: &str) -> Element {
    Element::new("binding")
        .attr("type", kind)
        .attr("level", "instrument")
        .attr("position", position)
        .attr("parameter", parameter)
}

pub fn generic_ui() -> Element {
    let envelope = [
        ("255", "Attack", "0.0", "5", "0.2", "ENV_ATTACK"),
        ("330", "Decay", "0.0", "5", "1", "ENV_DECAY"),
        ("405", "Sustain", "0.0", "1", "1", "ENV_SUSTAIN"),
        ("480", "Release", "0.01", "4.0", "0.1", "ENV_RELEASE"),
    ];

    let mut tab = Element::new("tab").attr("name", "main");
    for (x, label, min, max, value, parameter) in envelope {
        let knob = Knob {
            x,
            label,
            kind: "float",
            min,
            max,
            value,
        };
        tab = tab.child(knob.element(binding("amp", "0", parameter)));
    }

    let chorus = Knob {
        x: "562",
        label: "Chorus",
        kind: "float",
        min: "0.0",
        max: "1",
        value: "0",
    };
    tab = tab.child(chorus.element(binding("effect", "1", "FX_MIX")));

    let tone = Knob {
        x: "635",
        label: "Tone",
        kind: "float",
        min: "0.5",
        max: "1",
        value: "1",
    };
    tab = tab.child(tone.element(
        binding("effect", "0", "FX_FILTER_FREQUENCY")
            .attr("translation", "table")
            .attr(
                "translationTable",
                "0,33;0.3,150;0.4,450;0.5,1100;0.7,4100;0.9,11000;1.0001,22000",
            ),
    ));

    let reverb = Knob {
        x: "710",
        label: "Reverb",
        kind: "percent",
        min: "0",
        max: "100",
        value: "50",
    };
    tab = tab.child(reverb.element(
        binding("effect", "2", "FX_REVERB_WET_LEVEL")
            .attr("translation", "linear")
            .attr("translationOutputMin", "0")
            .attr("translationOutputMax", "1"),
    ));

    Element::new("ui")
        .attr("width", "812")
        .attr("height", "375")
        .attr("bgImage", "Images/background.jpg")
        .child(tab)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effect_chain_order() {
        let effects = generic_effects();
        let types: Vec<_> = effects
            .children
            .iter()
            .filter_map(|e| e.get_attr("type"))
            .collect();
        assert_eq!(types, vec!["lowpass", "chorus", "reverb"]);
    }

    #[test]
    fn test_knobs_bind_to_effect_positions() {
        let ui = generic_ui();
        let tab = &ui.children[0];
        assert_eq!(tab.children.len(), 7);

        let reverb = &tab.children[6];
        assert_eq!(reverb.get_attr("label"), Some("Reverb"));
        assert_eq!(reverb.children[0].get_attr("position"), Some("2"));
        assert_eq!(
            reverb.children[0].get_attr("parameter"),
            Some("FX_REVERB_WET_LEVEL")
        );
    }
}
