use roxmltree::Node;

use super::{escape, WORDPROCESSING_NS};
use crate::template::{Alignment, Rgb, StyleDefinition, StyleKind, StyleSheet};

pub(super) const BULLET_NUMBERING_ID: u32 = 1;

pub(super) fn styles_xml(sheet: &StyleSheet) -> String {
    let mut xml = String::with_capacity(4096);
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(&format!(r#"<w:styles xmlns:w="{WORDPROCESSING_NS}">"#));
    xml.push_str(
        r#"<w:docDefaults><w:rPrDefault><w:rPr><w:lang w:val="en-US"/></w:rPr></w:rPrDefault><w:pPrDefault/></w:docDefaults>"#,
    );
    for style in sheet.styles() {
        write_style(&mut xml, style);
    }
    xml.push_str("</w:styles>");
    xml
}

fn write_style(xml: &mut String, style: &StyleDefinition) {
    xml.push_str(&format!(r#"<w:style w:type="{}""#, style.kind.as_ooxml()));
    if style.is_default {
        xml.push_str(r#" w:default="1""#);
    }
    xml.push_str(&format!(r#" w:styleId="{}">"#, escape(&style.id)));
    xml.push_str(&format!(r#"<w:name w:val="{}"/>"#, escape(&style.name)));
    if let Some(parent) = &style.based_on {
        xml.push_str(&format!(r#"<w:basedOn w:val="{}"/>"#, escape(parent)));
    }
    if let Some(next) = &style.next {
        xml.push_str(&format!(r#"<w:next w:val="{}"/>"#, escape(next)));
    }
    xml.push_str("<w:qFormat/>");

    let paragraph = paragraph_properties(style);
    if !paragraph.is_empty() {
        xml.push_str(&format!("<w:pPr>{paragraph}</w:pPr>"));
    }
    let run = run_properties(style);
    if !run.is_empty() {
        xml.push_str(&format!("<w:rPr>{run}</w:rPr>"));
    }
    if style.kind == StyleKind::Table {
        xml.push_str("<w:tblPr>");
        if style.grid_borders {
            xml.push_str(&grid_borders());
        }
        xml.push_str("</w:tblPr>");
    }
    xml.push_str("</w:style>");
}

fn paragraph_properties(style: &StyleDefinition) -> String {
    let mut props = String::new();
    if style.bullet_list {
        props.push_str(&format!(
            r#"<w:numPr><w:numId w:val="{BULLET_NUMBERING_ID}"/></w:numPr>"#
        ));
    }
    if style.space_before_twips.is_some() || style.space_after_twips.is_some() {
        props.push_str("<w:spacing");
        if let Some(before) = style.space_before_twips {
            props.push_str(&format!(r#" w:before="{before}""#));
        }
        if let Some(after) = style.space_after_twips {
            props.push_str(&format!(r#" w:after="{after}""#));
        }
        props.push_str("/>");
    }
    if let Some(alignment) = style.alignment {
        props.push_str(&format!(r#"<w:jc w:val="{}"/>"#, alignment.as_ooxml()));
    }
    if let Some(level) = style.outline_level {
        props.push_str(&format!(r#"<w:outlineLvl w:val="{level}"/>"#));
    }
    props
}

fn run_properties(style: &StyleDefinition) -> String {
    let mut props = String::new();
    if let Some(font) = &style.font {
        let font = escape(font);
        props.push_str(&format!(
            r#"<w:rFonts w:ascii="{font}" w:hAnsi="{font}" w:cs="{font}"/>"#
        ));
    }
    if style.bold {
        props.push_str("<w:b/>");
    }
    if let Some(color) = style.color {
        props.push_str(&format!(r#"<w:color w:val="{}"/>"#, color.hex()));
    }
    if let Some(size) = style.size_half_points {
        props.push_str(&format!(r#"<w:sz w:val="{size}"/><w:szCs w:val="{size}"/>"#));
    }
    props
}

pub(super) fn grid_borders() -> String {
    let mut borders = String::from("<w:tblBorders>");
    for edge in ["top", "left", "bottom", "right", "insideH", "insideV"] {
        borders.push_str(&format!(
            r#"<w:{edge} w:val="single" w:sz="4" w:space="0" w:color="auto"/>"#
        ));
    }
    borders.push_str("</w:tblBorders>");
    borders
}

/// Reads every paragraph, character and table style. Numbering styles and
/// latent style entries are ignored.
pub(super) fn parse_styles(raw: &str) -> Result<Vec<StyleDefinition>, roxmltree::Error> {
    let document = roxmltree::Document::parse(raw)?;
    let styles = document
        .root_element()
        .children()
        .filter(|node| node.has_tag_name((WORDPROCESSING_NS, "style")))
        .filter_map(parse_style)
        .collect();
    Ok(styles)
}

fn parse_style(node: Node<'_, '_>) -> Option<StyleDefinition> {
    let kind = match attr(node, "type") {
        Some(value) => StyleKind::from_ooxml(value)?,
        None => StyleKind::Paragraph,
    };
    let id = attr(node, "styleId")?.to_string();
    let name = child(node, "name").and_then(val).unwrap_or(id.as_str()).to_string();

    let mut style = StyleDefinition::new(kind, id, name);
    style.is_default = attr(node, "default").is_some_and(on_off);
    style.based_on = child(node, "basedOn").and_then(val).map(str::to_string);
    style.next = child(node, "next").and_then(val).map(str::to_string);

    if let Some(ppr) = child(node, "pPr") {
        style.bullet_list = child(ppr, "numPr")
            .and_then(|numbering| child(numbering, "numId"))
            .and_then(val)
            .is_some_and(|id| id != "0");
        if let Some(spacing) = child(ppr, "spacing") {
            style.space_before_twips = attr(spacing, "before").and_then(|v| v.parse().ok());
            style.space_after_twips = attr(spacing, "after").and_then(|v| v.parse().ok());
        }
        style.alignment = child(ppr, "jc").and_then(val).and_then(Alignment::from_ooxml);
        style.outline_level = child(ppr, "outlineLvl").and_then(val).and_then(|v| v.parse().ok());
    }

    if let Some(rpr) = child(node, "rPr") {
        style.font = child(rpr, "rFonts")
            .and_then(|fonts| attr(fonts, "ascii").or_else(|| attr(fonts, "hAnsi")))
            .map(str::to_string);
        style.bold = child(rpr, "b").is_some_and(|bold| val(bold).map_or(true, on_off));
        style.color = child(rpr, "color").and_then(val).and_then(Rgb::from_hex);
        style.size_half_points = child(rpr, "sz").and_then(val).and_then(|v| v.parse().ok());
    }

    style.grid_borders = child(node, "tblPr")
        .and_then(|table| child(table, "tblBorders"))
        .is_some_and(|borders| {
            borders.children().filter(Node::is_element).any(|edge| {
                attr(edge, "val").is_some_and(|kind| kind != "none" && kind != "nil")
            })
        });

    Some(style)
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|candidate| candidate.has_tag_name((WORDPROCESSING_NS, name)))
}

fn attr<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.attribute((WORDPROCESSING_NS, name))
}

fn val<'a>(node: Node<'a, '_>) -> Option<&'a str> {
    attr(node, "val")
}

fn on_off(value: &str) -> bool {
    matches!(value, "1" | "true" | "on")
}
