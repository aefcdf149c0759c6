//! Office Open XML (`.docx`) packaging.
//!
//! Writes a [`Document`] as a WordprocessingML package and reads style
//! definitions back out of a template package.

mod body;
mod parts;
mod styles;

use std::fs::File;
use std::io::{BufWriter, Cursor, Read, Seek, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::document::Document;
use crate::errors::PackageError;
use crate::template::StyleDefinition;

pub const WORDPROCESSING_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

pub const DOCUMENT_PART: &str = "word/document.xml";
pub const STYLES_PART: &str = "word/styles.xml";
pub const NUMBERING_PART: &str = "word/numbering.xml";
pub const SETTINGS_PART: &str = "word/settings.xml";

/// Writes the package into `sink` and hands the sink back.
pub fn write_package<W: Write + Seek>(document: &Document, sink: W) -> Result<W, PackageError> {
    let images = document.images();
    let mut zip = ZipWriter::new(sink);

    write_part(&mut zip, "[Content_Types].xml", parts::content_types(&images).as_bytes())?;
    write_part(&mut zip, "_rels/.rels", parts::package_relationships().as_bytes())?;
    write_part(&mut zip, "docProps/core.xml", parts::core_properties(document.title()).as_bytes())?;
    write_part(&mut zip, DOCUMENT_PART, body::document_xml(document).as_bytes())?;
    write_part(&mut zip, STYLES_PART, styles::styles_xml(document.styles()).as_bytes())?;
    write_part(&mut zip, NUMBERING_PART, parts::numbering().as_bytes())?;
    write_part(&mut zip, SETTINGS_PART, parts::settings().as_bytes())?;
    write_part(
        &mut zip,
        "word/_rels/document.xml.rels",
        parts::document_relationships(&images).as_bytes(),
    )?;
    for (index, image) in images.iter().enumerate() {
        let part = format!("word/{}", parts::media_target(index + 1, image));
        write_part(&mut zip, &part, &image.bytes)?;
    }

    Ok(zip.finish()?)
}

pub fn save(document: &Document, path: &Path) -> Result<(), PackageError> {
    let file = File::create(path)?;
    let mut writer = write_package(document, BufWriter::new(file))?;
    writer.flush()?;
    Ok(())
}

pub fn to_bytes(document: &Document) -> Result<Vec<u8>, PackageError> {
    let cursor = write_package(document, Cursor::new(Vec::new()))?;
    Ok(cursor.into_inner())
}

/// Style definitions declared in a package's `word/styles.xml`.
pub fn read_styles(path: &Path) -> Result<Vec<StyleDefinition>, PackageError> {
    let file = File::open(path)?;
    let mut archive = ZipArchive::new(file)?;
    let raw = read_part(&mut archive, STYLES_PART)?;
    styles::parse_styles(&raw).map_err(|source| PackageError::Xml { part: STYLES_PART, source })
}

/// Text of one package part.
pub fn read_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    part: &'static str,
) -> Result<String, PackageError> {
    let mut bytes = Vec::new();
    archive.by_name(part)?.read_to_end(&mut bytes)?;
    let text = String::from_utf8(bytes).map_err(|_| PackageError::Encoding { part })?;
    Ok(text.trim_start_matches('\u{feff}').to_string())
}

fn write_part<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    name: &str,
    bytes: &[u8],
) -> Result<(), PackageError> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    zip.start_file(name, options)?;
    zip.write_all(bytes)?;
    Ok(())
}

/// Escapes text for element content and attribute values, dropping characters
/// XML 1.0 cannot carry.
pub(crate) fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            '\t' | '\n' | '\r' => escaped.push(ch),
            ch if (ch as u32) < 0x20 => {}
            ch => escaped.push(ch),
        }
    }
    escaped
}
