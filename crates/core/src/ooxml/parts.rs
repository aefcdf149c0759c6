//! Fixed package parts: content types, relationships, properties, numbering
//! and settings.

use super::styles::BULLET_NUMBERING_ID;
use super::{escape, DOCUMENT_PART, NUMBERING_PART, SETTINGS_PART, STYLES_PART, WORDPROCESSING_NS};
use crate::document::Image;

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
const RELATIONSHIPS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const OFFICE_RELATIONSHIP: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const MAIN_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";
const WORD_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml";

pub(super) fn media_target(number: usize, image: &Image) -> String {
    format!("media/image{number}.{}", image.extension)
}

pub(super) fn image_relationship_id(number: usize) -> String {
    format!("rIdImage{number}")
}

pub(super) fn content_types(images: &[&Image]) -> String {
    let mut xml = String::from(XML_DECLARATION);
    xml.push_str(
        r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    );
    xml.push_str(
        r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    );
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);

    let mut seen: Vec<&str> = Vec::new();
    for image in images {
        if seen.contains(&image.extension) {
            continue;
        }
        seen.push(image.extension);
        xml.push_str(&format!(
            r#"<Default Extension="{}" ContentType="{}"/>"#,
            image.extension, image.content_type
        ));
    }

    let overrides = [
        (DOCUMENT_PART, MAIN_CONTENT_TYPE.to_string()),
        (STYLES_PART, format!("{WORD_CONTENT_TYPE}.styles+xml")),
        (NUMBERING_PART, format!("{WORD_CONTENT_TYPE}.numbering+xml")),
        (SETTINGS_PART, format!("{WORD_CONTENT_TYPE}.settings+xml")),
        ("docProps/core.xml", "application/vnd.openxmlformats-package.core-properties+xml".into()),
    ];
    for (part, content_type) in overrides {
        xml.push_str(&format!(r#"<Override PartName="/{part}" ContentType="{content_type}"/>"#));
    }
    xml.push_str("</Types>");
    xml
}

pub(super) fn package_relationships() -> String {
    let mut xml = String::from(XML_DECLARATION);
    xml.push_str(&format!(r#"<Relationships xmlns="{RELATIONSHIPS_NS}">"#));
    xml.push_str(&relationship("rId1", &format!("{OFFICE_RELATIONSHIP}/officeDocument"), DOCUMENT_PART));
    xml.push_str(&relationship(
        "rId2",
        "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties",
        "docProps/core.xml",
    ));
    xml.push_str("</Relationships>");
    xml
}

pub(super) fn document_relationships(images: &[&Image]) -> String {
    let mut xml = String::from(XML_DECLARATION);
    xml.push_str(&format!(r#"<Relationships xmlns="{RELATIONSHIPS_NS}">"#));
    xml.push_str(&relationship("rId1", &format!("{OFFICE_RELATIONSHIP}/styles"), "styles.xml"));
    xml.push_str(&relationship("rId2", &format!("{OFFICE_RELATIONSHIP}/numbering"), "numbering.xml"));
    xml.push_str(&relationship("rId3", &format!("{OFFICE_RELATIONSHIP}/settings"), "settings.xml"));
    for (index, image) in images.iter().enumerate() {
        let number = index + 1;
        xml.push_str(&relationship(
            &image_relationship_id(number),
            &format!("{OFFICE_RELATIONSHIP}/image"),
            &media_target(number, image),
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

fn relationship(id: &str, kind: &str, target: &str) -> String {
    format!(r#"<Relationship Id="{id}" Type="{kind}" Target="{target}"/>"#)
}

/// No timestamps, so identical documents produce identical packages.
pub(super) fn core_properties(title: &str) -> String {
    let mut xml = String::from(XML_DECLARATION);
    xml.push_str(
        r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/">"#,
    );
    xml.push_str(&format!("<dc:title>{}</dc:title>", escape(title)));
    xml.push_str("<dc:creator>proposal-generator</dc:creator>");
    xml.push_str("</cp:coreProperties>");
    xml
}

pub(super) fn numbering() -> String {
    let mut xml = String::from(XML_DECLARATION);
    xml.push_str(&format!(r#"<w:numbering xmlns:w="{WORDPROCESSING_NS}">"#));
    xml.push_str(concat!(
        r#"<w:abstractNum w:abstractNumId="0"><w:multiLevelType w:val="singleLevel"/>"#,
        r#"<w:lvl w:ilvl="0"><w:start w:val="1"/><w:numFmt w:val="bullet"/>"#,
        "<w:lvlText w:val=\"\u{2022}\"/><w:lvlJc w:val=\"left\"/>",
        r#"<w:pPr><w:ind w:left="720" w:hanging="360"/></w:pPr></w:lvl></w:abstractNum>"#,
    ));
    xml.push_str(&format!(
        r#"<w:num w:numId="{BULLET_NUMBERING_ID}"><w:abstractNumId w:val="0"/></w:num>"#
    ));
    xml.push_str("</w:numbering>");
    xml
}

/// Asks the word processor to refresh fields (the table of contents) on open.
pub(super) fn settings() -> String {
    let mut xml = String::from(XML_DECLARATION);
    xml.push_str(&format!(r#"<w:settings xmlns:w="{WORDPROCESSING_NS}">"#));
    xml.push_str(r#"<w:zoom w:percent="100"/>"#);
    xml.push_str(r#"<w:defaultTabStop w:val="720"/>"#);
    xml.push_str(r#"<w:updateFields w:val="true"/>"#);
    xml.push_str(concat!(
        "<w:compat>",
        r#"<w:compatSetting w:name="compatibilityMode" w:uri="http://schemas.microsoft.com/office/word" w:val="15"/>"#,
        "</w:compat>",
    ));
    xml.push_str("</w:settings>");
    xml
}
