//! DOCX templating: `{{ name }}` placeholders inside a Word document are
//! replaced with values from a [`TemplateContext`], producing a new DOCX.
//!
//! Word often splits a placeholder over several runs while the user types it
//! (`{{ Pro</w:t></w:r><w:r><w:t>fessor }}`). Markup found between the two
//! opening braces, between the two closing braces or inside the placeholder
//! is dropped before substitution, so the replacement lands in the first run.

use escola_core::{EscolaError, Result};
use regex::{Captures, Regex};
use std::collections::{BTreeMap, BTreeSet};
use std::io::{Cursor, Read, Write};
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

static SPLIT_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(?:<[^>]*>)+\{").expect("valid regex"));

static SPLIT_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\}(?:<[^>]*>)+\}").expect("valid regex"));

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{\{(.*?)\}\}").expect("valid regex"));

static XML_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

/// Run break inserted for every newline of a value.
const LINE_BREAK: &str = r#"</w:t><w:br/><w:t xml:space="preserve">"#;

/// Values for the placeholders of a template, keyed by placeholder name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateContext {
    values: BTreeMap<String, String>,
}

impl TemplateContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TemplateContext {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// A Word document used as a template.
#[derive(Debug, Clone)]
pub struct DocxTemplate {
    bytes: Vec<u8>,
}

impl DocxTemplate {
    /// Load a template from disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(EscolaError::TemplateNotFound(path.to_path_buf()));
        }
        let bytes = std::fs::read(path)?;
        debug!(path = %path.display(), size = bytes.len(), "loaded DOCX template");
        Self::from_bytes(bytes)
    }

    /// Use an in-memory DOCX as template. The archive is validated eagerly.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let archive = ZipArchive::new(Cursor::new(bytes.as_slice()))
            .map_err(|e| EscolaError::Template(format!("arquivo DOCX inválido: {e}")))?;
        if archive.index_for_name("word/document.xml").is_none() {
            return Err(EscolaError::Template(
                "arquivo DOCX sem word/document.xml".into(),
            ));
        }
        Ok(Self { bytes })
    }

    /// Names of all placeholders used in the body, headers and footers.
    pub fn placeholders(&self) -> Result<BTreeSet<String>> {
        let mut names = BTreeSet::new();
        for (name, content) in self.entries()? {
            if !is_renderable_part(&name) {
                continue;
            }
            let xml = String::from_utf8_lossy(&content);
            let xml = join_split_braces(&xml);
            for caps in PLACEHOLDER.captures_iter(&xml) {
                let key = placeholder_name(&caps[1]);
                if !key.is_empty() {
                    names.insert(key);
                }
            }
        }
        Ok(names)
    }

    /// Render the template, returning the bytes of the filled-in DOCX.
    pub fn render(&self, context: &TemplateContext) -> Result<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for (name, content) in self.entries()? {
            if name.ends_with('/') {
                writer
                    .add_directory(name.as_str(), options)
                    .map_err(|e| EscolaError::Template(format!("{name}: {e}")))?;
                continue;
            }

            writer
                .start_file(name.as_str(), options)
                .map_err(|e| EscolaError::Template(format!("{name}: {e}")))?;

            if is_renderable_part(&name) {
                let xml = String::from_utf8(content)
                    .map_err(|e| EscolaError::Template(format!("{name} não é UTF-8: {e}")))?;
                writer.write_all(render_xml(&xml, context).as_bytes())?;
            } else {
                writer.write_all(&content)?;
            }
        }

        let cursor = writer
            .finish()
            .map_err(|e| EscolaError::Template(format!("falha ao finalizar DOCX: {e}")))?;
        Ok(cursor.into_inner())
    }

    fn entries(&self) -> Result<Vec<(String, Vec<u8>)>> {
        let mut archive = ZipArchive::new(Cursor::new(self.bytes.as_slice()))
            .map_err(|e| EscolaError::Template(format!("arquivo DOCX inválido: {e}")))?;

        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive
                .by_index(i)
                .map_err(|e| EscolaError::Template(format!("entrada {i}: {e}")))?;
            let name = file.name().to_string();
            let mut content = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut content)?;
            entries.push((name, content));
        }
        Ok(entries)
    }
}

/// Body, header and footer parts carry user text; everything else (styles,
/// media, relationships) is copied untouched.
fn is_renderable_part(name: &str) -> bool {
    name == "word/document.xml"
        || ((name.starts_with("word/header") || name.starts_with("word/footer"))
            && name.ends_with(".xml"))
}

fn join_split_braces(xml: &str) -> String {
    let xml = SPLIT_OPEN.replace_all(xml, "{{");
    SPLIT_CLOSE.replace_all(&xml, "}}").into_owned()
}

fn placeholder_name(raw: &str) -> String {
    XML_TAG.replace_all(raw, "").trim().to_string()
}

/// Substitute every placeholder of one XML part.
fn render_xml(xml: &str, context: &TemplateContext) -> String {
    let xml = join_split_braces(xml);
    let rendered = PLACEHOLDER.replace_all(&xml, |caps: &Captures| {
        let key = placeholder_name(&caps[1]);
        match context.get(&key) {
            Some(value) => escape_value(value),
            None => {
                warn!(placeholder = %key, "placeholder without value, rendering empty");
                String::new()
            }
        }
    });
    // Values may start or end with spaces (" - 3º ano"); keep them.
    rendered.replace("<w:t>", r#"<w:t xml:space="preserve">"#)
}

fn escape_value(value: &str) -> String {
    let value: String = value.chars().filter(|c| is_xml_char(*c)).collect();
    xml_escape(&value)
        .replace("\r\n", "\n")
        .replace('\n', LINE_BREAK)
}

/// XML 1.0 forbids C0 controls other than tab, LF and CR; Word rejects
/// documents that contain them.
fn is_xml_char(c: char) -> bool {
    u32::from(c) >= 0x20 || matches!(c, '\t' | '\n' | '\r')
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC_HEAD: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#;
    const DOC_TAIL: &str = "</w:body></w:document>";

    fn docx_with_parts(parts: &[(&str, &str)]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        for (name, content) in parts {
            zip.start_file(*name, options).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    fn docx_with_body(body: &str) -> Vec<u8> {
        let document = format!("{DOC_HEAD}{body}{DOC_TAIL}");
        docx_with_parts(&[
            ("[Content_Types].xml", "<Types/>"),
            ("word/document.xml", &document),
            ("word/styles.xml", "<w:styles>{{ Untouched }}</w:styles>"),
        ])
    }

    fn read_part(docx: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(docx)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut out = String::new();
        file.read_to_string(&mut out).unwrap();
        out
    }

    #[test]
    fn test_render_simple_placeholder() {
        let template = DocxTemplate::from_bytes(docx_with_body(
            "<w:p><w:r><w:t>Professor: {{ Professor }}</w:t></w:r></w:p>",
        ))
        .unwrap();
        let context: TemplateContext = [("Professor", "Ana Souza")].into_iter().collect();

        let out = template.render(&context).unwrap();
        let xml = read_part(&out, "word/document.xml");
        assert!(xml.contains("Professor: Ana Souza"));
        assert!(!xml.contains("{{"));
    }

    #[test]
    fn test_render_placeholder_split_across_runs() {
        let body = concat!(
            "<w:p><w:r><w:t>{</w:t></w:r><w:r><w:t>{ Disci</w:t></w:r>",
            "<w:r><w:rPr><w:b/></w:rPr><w:t>plina }</w:t></w:r><w:r><w:t>}</w:t></w:r></w:p>"
        );
        let template = DocxTemplate::from_bytes(docx_with_body(body)).unwrap();
        let context: TemplateContext = [("Disciplina", "Matemática")].into_iter().collect();

        let xml = read_part(&template.render(&context).unwrap(), "word/document.xml");
        assert!(xml.contains("Matemática"));
        assert!(!xml.contains('{'));
        assert!(!xml.contains('}'));
    }

    #[test]
    fn test_render_escapes_and_breaks_lines() {
        let template = DocxTemplate::from_bytes(docx_with_body(
            "<w:p><w:r><w:t>{{Fontes}}</w:t></w:r></w:p>",
        ))
        .unwrap();
        let context: TemplateContext = [("Fontes", "• A & B\n\n• <C>")].into_iter().collect();

        let xml = read_part(&template.render(&context).unwrap(), "word/document.xml");
        assert!(xml.contains("• A &amp; B"));
        assert!(xml.contains("&lt;C&gt;"));
        assert_eq!(xml.matches("<w:br/>").count(), 2);
    }

    #[test]
    fn test_render_drops_xml_illegal_control_chars() {
        let template = DocxTemplate::from_bytes(docx_with_body(
            "<w:p><w:r><w:t>{{ TITULO }}</w:t></w:r></w:p>",
        ))
        .unwrap();
        let context: TemplateContext = [("TITULO", "Rob\u{1}tica\u{b}\u{0}\tA")]
            .into_iter()
            .collect();

        let xml = read_part(&template.render(&context).unwrap(), "word/document.xml");
        assert!(xml.contains("Robtica\tA"));
        assert!(
            !xml.chars()
                .any(|c| u32::from(c) < 0x20 && !matches!(c, '\t' | '\n' | '\r'))
        );
    }

    #[test]
    fn test_render_unknown_placeholder_is_empty() {
        let template = DocxTemplate::from_bytes(docx_with_body(
            "<w:p><w:r><w:t>[{{ Missing }}]</w:t></w:r></w:p>",
        ))
        .unwrap();
        let xml = read_part(
            &template.render(&TemplateContext::new()).unwrap(),
            "word/document.xml",
        );
        assert!(xml.contains("[]"));
    }

    #[test]
    fn test_render_preserves_leading_whitespace() {
        let template = DocxTemplate::from_bytes(docx_with_body(
            "<w:p><w:r><w:t>{{ANO_SERIE}}</w:t></w:r></w:p>",
        ))
        .unwrap();
        let context: TemplateContext = [("ANO_SERIE", " - 3º ano")].into_iter().collect();
        let xml = read_part(&template.render(&context).unwrap(), "word/document.xml");
        assert!(xml.contains(r#"<w:t xml:space="preserve"> - 3º ano</w:t>"#));
    }

    #[test]
    fn test_headers_rendered_other_parts_untouched() {
        let document = format!("{DOC_HEAD}<w:p/>{DOC_TAIL}");
        let bytes = docx_with_parts(&[
            ("word/document.xml", &document),
            ("word/header1.xml", "<w:hdr><w:t>{{ Professor }}</w:t></w:hdr>"),
            ("word/styles.xml", "<w:styles>{{ Professor }}</w:styles>"),
        ]);
        let template = DocxTemplate::from_bytes(bytes).unwrap();
        let context: TemplateContext = [("Professor", "Rui")].into_iter().collect();
        let out = template.render(&context).unwrap();

        assert!(read_part(&out, "word/header1.xml").contains("Rui"));
        assert_eq!(
            read_part(&out, "word/styles.xml"),
            "<w:styles>{{ Professor }}</w:styles>"
        );
    }

    #[test]
    fn test_placeholders_lists_names() {
        let body = concat!(
            "<w:p><w:r><w:t>{{ Titulo }} / {{Conteudo}}</w:t></w:r></w:p>",
            "<w:p><w:r><w:t>{{ Ti</w:t></w:r><w:r><w:t>tulo }}</w:t></w:r></w:p>"
        );
        let template = DocxTemplate::from_bytes(docx_with_body(body)).unwrap();
        let names: Vec<String> = template.placeholders().unwrap().into_iter().collect();
        assert_eq!(names, vec!["Conteudo", "Titulo"]);
    }

    #[test]
    fn test_from_bytes_rejects_non_docx() {
        assert!(matches!(
            DocxTemplate::from_bytes(b"not a zip".to_vec()),
            Err(EscolaError::Template(_))
        ));
        let no_document = docx_with_parts(&[("word/styles.xml", "<w:styles/>")]);
        assert!(DocxTemplate::from_bytes(no_document).is_err());
    }

    #[test]
    fn test_from_path_missing_template() {
        let err = DocxTemplate::from_path(Path::new("/nonexistent/template.docx")).unwrap_err();
        assert!(matches!(err, EscolaError::TemplateNotFound(_)));
    }

    #[test]
    fn test_context_from_iter_and_accessors() {
        let mut context: TemplateContext = [("A", "1")].into_iter().collect();
        context.insert("B", "2");
        assert_eq!(context.len(), 2);
        assert_eq!(context.get("B"), Some("2"));
        assert_eq!(context.keys().collect::<Vec<_>>(), vec!["A", "B"]);
        assert!(!context.is_empty());
    }
}
