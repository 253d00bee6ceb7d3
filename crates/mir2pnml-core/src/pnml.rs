//! PNML 2009 Place/Transition net serialization.
//!
//! Emits one `<net>` per [`PetriNet`], with a `<page>` holding every place,
//! transition, and arc, plus an `<initialMarking>` on each place that
//! starts with tokens. See `spec.md` §5 for the exact element shapes.

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::writer::Writer;

use crate::net::PetriNet;

const PNML_NAMESPACE: &str = "http://www.pnml.org/version-2009/grammar/pnml";
const PTNET_TYPE: &str = "http://www.pnml.org/version-2009/grammar/ptnet";

/// Serialize `net` as a PNML 2009 document, UTF-8, two-space indented.
pub fn write_pnml(net: &PetriNet) -> Result<String, quick_xml::Error> {
    let mut buf = Vec::new();
    let mut writer = Writer::new_with_indent(&mut buf, b' ', 2);

    writer.write_event(Event::Decl(quick_xml::events::BytesDecl::new(
        "1.0", Some("UTF-8"), None,
    )))?;

    writer.write_event(Event::Start(BytesStart::new("pnml")))?;

    let mut net_start = BytesStart::new("net");
    net_start.push_attribute(("id", "mir2pnml_net"));
    net_start.push_attribute(("xmlns", PNML_NAMESPACE));
    net_start.push_attribute(("type", PTNET_TYPE));
    writer.write_event(Event::Start(net_start))?;

    let mut page_start = BytesStart::new("page");
    page_start.push_attribute(("id", "page0"));
    writer.write_event(Event::Start(page_start))?;

    for place in &net.places {
        write_place(&mut writer, place)?;
    }
    for transition in &net.transitions {
        write_transition(&mut writer, transition)?;
    }
    for arc in &net.arcs {
        write_arc(&mut writer, arc)?;
    }

    writer.write_event(Event::End(BytesEnd::new("page")))?;
    writer.write_event(Event::End(BytesEnd::new("net")))?;
    writer.write_event(Event::End(BytesEnd::new("pnml")))?;

    String::from_utf8(buf).map_err(|e| quick_xml::Error::Utf8(e.utf8_error()))
}

fn write_name(
    writer: &mut Writer<&mut Vec<u8>>,
    text: &str,
) -> Result<(), quick_xml::Error> {
    writer.write_event(Event::Start(BytesStart::new("name")))?;
    writer.write_event(Event::Start(BytesStart::new("text")))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new("text")))?;
    writer.write_event(Event::End(BytesEnd::new("name")))?;
    Ok(())
}

fn write_place(
    writer: &mut Writer<&mut Vec<u8>>,
    place: &crate::net::Place,
) -> Result<(), quick_xml::Error> {
    let mut start = BytesStart::new("place");
    start.push_attribute(("id", place.id.as_str()));
    writer.write_event(Event::Start(start))?;
    write_name(writer, &place.name)?;

    if place.init_tokens > 0 {
        writer.write_event(Event::Start(BytesStart::new("initialMarking")))?;
        writer.write_event(Event::Start(BytesStart::new("text")))?;
        writer.write_event(Event::Text(BytesText::new(&place.init_tokens.to_string())))?;
        writer.write_event(Event::End(BytesEnd::new("text")))?;
        writer.write_event(Event::End(BytesEnd::new("initialMarking")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("place")))?;
    Ok(())
}

fn write_transition(
    writer: &mut Writer<&mut Vec<u8>>,
    transition: &crate::net::Transition,
) -> Result<(), quick_xml::Error> {
    let mut start = BytesStart::new("transition");
    start.push_attribute(("id", transition.id.as_str()));
    writer.write_event(Event::Start(start))?;
    write_name(writer, &transition.name)?;
    writer.write_event(Event::End(BytesEnd::new("transition")))?;
    Ok(())
}

fn write_arc(
    writer: &mut Writer<&mut Vec<u8>>,
    arc: &crate::net::Arc,
) -> Result<(), quick_xml::Error> {
    let mut start = BytesStart::new("arc");
    start.push_attribute(("id", arc.id.as_str()));
    start.push_attribute(("source", arc.source.as_str()));
    start.push_attribute(("target", arc.target.as_str()));
    writer.write_event(Event::Start(start))?;

    if arc.weight != 1 {
        writer.write_event(Event::Start(BytesStart::new("inscription")))?;
        writer.write_event(Event::Start(BytesStart::new("text")))?;
        writer.write_event(Event::Text(BytesText::new(&arc.weight.to_string())))?;
        writer.write_event(Event::End(BytesEnd::new("text")))?;
        writer.write_event(Event::End(BytesEnd::new("inscription")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("arc")))?;
    Ok(())
}
