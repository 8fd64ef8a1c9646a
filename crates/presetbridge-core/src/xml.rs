//! DecentSampler preset output.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;

use crate::error::{Error, Result};
use crate::model::{Element, Instrument};

/// Render the instrument as an indented `.dspreset` document.
pub fn render_preset(instrument: &Instrument) -> Result<String> {
    render_document(&instrument.to_element())
}

pub fn render_document(root: &Element) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_error)?;
    write_element(&mut writer, root)?;

    let mut text = String::from_utf8(writer.into_inner()).map_err(|e| Error::Xml(e.to_string()))?;
    text.push('\n');
    Ok(text)
}

fn xml_error(e: impl std::fmt::Display) -> Error {
    Error::Xml(e.to_string())
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() {
        writer.write_event(Event::Empty(start)).map_err(xml_error)?;
        return Ok(());
    }

    writer.write_event(Event::Start(start)).map_err(xml_error)?;
    for child in &element.children {
        write_element(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(xml_error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Group, Properties, Region, Volume};
    use crate::ui;

    #[test]
    fn test_document_structure() {
        let mut instrument = Instrument::new();
        instrument.effects = Some(ui::generic_effects());
        instrument.ui = Some(ui::generic_ui());
        instrument.groups.push(Group {
            props: Properties {
                volume: Some(Volume::Decibels(-3.0)),
                ..Default::default()
            },
            regions: vec![Region {
                props: Properties {
                    path: Some("Samples/Piano/C4.wav".to_string()),
                    root_note: Some(60),
                    ..Default::default()
                },
            }],
        });

        let xml = render_preset(&instrument).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));

        let effects = xml.find("<effects>").unwrap();
        let ui = xml.find("<ui ").unwrap();
        let groups = xml.find("<groups>").unwrap();
        assert!(effects < ui && ui < groups);

        assert!(xml.contains(r#"<group volume="-3dB">"#));
        assert!(xml.contains(r#"<sample path="Samples/Piano/C4.wav" rootNote="60"/>"#));
        assert!(xml.trim_end().ends_with("</DecentSampler>"));
    }

    #[test]
    fn test_attribute_values_are_escaped() {
        let root = Element::new("sample").attr("path", "Tom & Jerry \"live\".wav");
        let xml = render_document(&root).unwrap();
        assert!(xml.contains("Tom &amp; Jerry &quot;live&quot;.wav"));
    }

    #[test]
    fn test_empty_instrument() {
        let xml = render_preset(&Instrument::new()).unwrap();
        assert!(xml.contains("<groups/>"));
    }
}
