use super::parts::{image_relationship_id, media_target};
use super::styles::BULLET_NUMBERING_ID;
use super::{escape, WORDPROCESSING_NS};
use crate::document::{Block, Document, Image, Paragraph, Table};

/// US Letter with one-inch margins, in twentieths of a point.
const PAGE_WIDTH: u32 = 12_240;
const PAGE_HEIGHT: u32 = 15_840;
const PAGE_MARGIN: u32 = 1_440;
pub(super) const TEXT_WIDTH: u32 = PAGE_WIDTH - 2 * PAGE_MARGIN;

const TOC_INSTRUCTION: &str = r#" TOC \o "1-3" \h \z \u "#;

pub(super) fn document_xml(document: &Document) -> String {
    let mut xml = String::with_capacity(16 * 1024);
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(&format!(
        concat!(
            r#"<w:document xmlns:w="{}""#,
            r#" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships""#,
            r#" xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing""#,
            r#" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main""#,
            r#" xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
        ),
        WORDPROCESSING_NS
    ));
    xml.push_str("<w:body>");

    let mut image_number = 0;
    for block in document.blocks() {
        match block {
            Block::Paragraph(paragraph) => write_paragraph(&mut xml, paragraph),
            Block::Table(table) => write_table(&mut xml, table),
            Block::Image(image) => {
                image_number += 1;
                write_image(&mut xml, image, image_number);
            }
            Block::TableOfContents { placeholder } => write_table_of_contents(&mut xml, placeholder),
            Block::PageBreak => xml.push_str(r#"<w:p><w:r><w:br w:type="page"/></w:r></w:p>"#),
        }
    }

    xml.push_str(&format!(
        concat!(
            r#"<w:sectPr><w:pgSz w:w="{w}" w:h="{h}"/>"#,
            r#"<w:pgMar w:top="{m}" w:right="{m}" w:bottom="{m}" w:left="{m}" w:header="720" w:footer="720" w:gutter="0"/>"#,
            "</w:sectPr>",
        ),
        w = PAGE_WIDTH,
        h = PAGE_HEIGHT,
        m = PAGE_MARGIN
    ));
    xml.push_str("</w:body></w:document>");
    xml
}

fn write_paragraph(xml: &mut String, paragraph: &Paragraph) {
    xml.push_str("<w:p>");
    let mut props = String::new();
    if let Some(style) = &paragraph.style {
        props.push_str(&format!(r#"<w:pStyle w:val="{}"/>"#, escape(style)));
    }
    if paragraph.is_bullet() {
        props.push_str(&format!(
            r#"<w:numPr><w:ilvl w:val="0"/><w:numId w:val="{BULLET_NUMBERING_ID}"/></w:numPr>"#
        ));
    }
    if let Some(alignment) = paragraph.alignment {
        props.push_str(&format!(r#"<w:jc w:val="{}"/>"#, alignment.as_ooxml()));
    }
    if !props.is_empty() {
        xml.push_str(&format!("<w:pPr>{props}</w:pPr>"));
    }
    write_run(xml, &paragraph.text, false);
    xml.push_str("</w:p>");
}

/// Line breaks inside `text` become `<w:br/>` within the run.
fn write_run(xml: &mut String, text: &str, bold: bool) {
    if text.is_empty() {
        return;
    }
    xml.push_str("<w:r>");
    if bold {
        xml.push_str("<w:rPr><w:b/></w:rPr>");
    }
    for (index, line) in text.split('\n').enumerate() {
        if index > 0 {
            xml.push_str("<w:br/>");
        }
        let line = line.trim_end_matches('\r');
        xml.push_str(&format!(r#"<w:t xml:space="preserve">{}</w:t>"#, escape(line)));
    }
    xml.push_str("</w:r>");
}

fn write_table(xml: &mut String, table: &Table) {
    let columns = table.column_count();
    if columns == 0 {
        return;
    }
    let cell_width = TEXT_WIDTH / columns as u32;

    xml.push_str("<w:tbl><w:tblPr>");
    xml.push_str(&format!(r#"<w:tblStyle w:val="{}"/>"#, escape(&table.style)));
    xml.push_str(r#"<w:tblW w:w="5000" w:type="pct"/>"#);
    xml.push_str(
        r#"<w:tblLook w:val="04A0" w:firstRow="1" w:lastRow="0" w:firstColumn="1" w:lastColumn="0" w:noHBand="0" w:noVBand="1"/>"#,
    );
    xml.push_str("</w:tblPr><w:tblGrid>");
    for _ in 0..columns {
        xml.push_str(&format!(r#"<w:gridCol w:w="{cell_width}"/>"#));
    }
    xml.push_str("</w:tblGrid>");

    xml.push_str("<w:tr><w:trPr><w:tblHeader/></w:trPr>");
    for cell in &table.header {
        write_cell(xml, cell, cell_width, true);
    }
    xml.push_str("</w:tr>");
    for row in &table.rows {
        xml.push_str("<w:tr>");
        for cell in row {
            write_cell(xml, cell, cell_width, false);
        }
        xml.push_str("</w:tr>");
    }
    xml.push_str("</w:tbl>");
}

fn write_cell(xml: &mut String, text: &str, width: u32, bold: bool) {
    xml.push_str(&format!(r#"<w:tc><w:tcPr><w:tcW w:w="{width}" w:type="dxa"/></w:tcPr><w:p>"#));
    write_run(xml, text, bold);
    xml.push_str("</w:p></w:tc>");
}

fn write_image(xml: &mut String, image: &Image, number: usize) {
    let (cx, cy) = (image.width_emu, image.height_emu);
    let description = escape(&image.description);
    let file_name = media_target(number, image);
    let file_name = file_name.trim_start_matches("media/");
    let relationship = image_relationship_id(number);

    xml.push_str(r#"<w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:drawing>"#);
    xml.push_str(&format!(
        concat!(
            r#"<wp:inline distT="0" distB="0" distL="0" distR="0">"#,
            r#"<wp:extent cx="{cx}" cy="{cy}"/>"#,
            r#"<wp:docPr id="{n}" name="Picture {n}" descr="{descr}"/>"#,
            r#"<wp:cNvGraphicFramePr><a:graphicFrameLocks noChangeAspect="1"/></wp:cNvGraphicFramePr>"#,
            r#"<a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
            r#"<pic:pic><pic:nvPicPr><pic:cNvPr id="{n}" name="{file}"/><pic:cNvPicPr/></pic:nvPicPr>"#,
            r#"<pic:blipFill><a:blip r:embed="{rel}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#,
            r#"<pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#,
            r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr></pic:pic>"#,
            r#"</a:graphicData></a:graphic></wp:inline>"#,
        ),
        cx = cx,
        cy = cy,
        n = number,
        descr = description,
        file = file_name,
        rel = relationship
    ));
    xml.push_str("</w:drawing></w:r></w:p>");
}

fn write_table_of_contents(xml: &mut String, placeholder: &str) {
    xml.push_str("<w:p>");
    xml.push_str(r#"<w:r><w:fldChar w:fldCharType="begin" w:dirty="true"/></w:r>"#);
    xml.push_str(&format!(
        r#"<w:r><w:instrText xml:space="preserve">{}</w:instrText></w:r>"#,
        escape(TOC_INSTRUCTION)
    ));
    xml.push_str(r#"<w:r><w:fldChar w:fldCharType="separate"/></w:r>"#);
    write_run(xml, placeholder, false);
    xml.push_str(r#"<w:r><w:fldChar w:fldCharType="end"/></w:r>"#);
    xml.push_str("</w:p>");
}

#[cfg(test)]
mod tests {
    use super::{document_xml, TEXT_WIDTH};
    use crate::document::{Document, Image};
    use crate::template::StyleSheet;

    #[test]
    fn table_header_repeats_and_is_bold() {
        let mut document = Document::new(StyleSheet::base());
        document.add_table(
            "TableGrid",
            &["License", "Quantity", "Cost"],
            vec![vec!["Office 365".into(), "10".into(), "$2,000".into()]],
        );

        let xml = document_xml(&document);
        assert!(xml.contains("<w:tblHeader/>"));
        assert!(xml.contains(r#"<w:rPr><w:b/></w:rPr><w:t xml:space="preserve">License</w:t>"#));
        assert!(xml.contains(&format!(r#"<w:tcW w:w="{}" w:type="dxa"/>"#, TEXT_WIDTH / 3)));
        assert!(xml.contains(r#"<w:tblStyle w:val="TableGrid"/>"#));
    }

    #[test]
    fn bullets_carry_numbering() {
        let mut document = Document::new(StyleSheet::base());
        document.add_bullet("Migrate mailboxes");

        let xml = document_xml(&document);
        assert!(xml.contains(r#"<w:pStyle w:val="ListBullet"/><w:numPr>"#));
    }

    #[test]
    fn table_of_contents_is_a_dirty_field() {
        let mut document = Document::new(StyleSheet::base());
        document.add_table_of_contents("Update me");

        let xml = document_xml(&document);
        assert!(xml.contains(r#"w:fldCharType="begin" w:dirty="true""#));
        assert!(xml.contains(r#"TOC \o &quot;1-3&quot;"#));
        assert!(xml.contains("Update me"));
    }

    #[test]
    fn images_reference_their_relationship() {
        let mut document = Document::new(StyleSheet::base());
        document.add_image(Image {
            description: "Solution diagram".into(),
            extension: "png",
            content_type: "image/png",
            bytes: vec![1, 2, 3],
            width_emu: 5_486_400,
            height_emu: 2_743_200,
        });

        let xml = document_xml(&document);
        assert!(xml.contains(r#"r:embed="rIdImage1""#));
        assert!(xml.contains(r#"<wp:extent cx="5486400" cy="2743200"/>"#));
    }

    #[test]
    fn multiline_text_breaks_within_the_run() {
        let mut document = Document::new(StyleSheet::base());
        document.add_paragraph("line one\nline two", None);

        let xml = document_xml(&document);
        assert!(xml.contains("line one</w:t><w:br/><w:t"));
    }
}
