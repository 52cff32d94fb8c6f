//! Fills `.docx` templates.
//!
//! A `.docx` is a zip archive. The main body, headers and footers are XML parts
//! rendered as minijinja templates; every other entry (styles, fonts, media) is
//! copied byte for byte. Placeholders must sit inside a single Word run, e.g.
//! `<w:t>{{ project_name }}</w:t>`.

use chrono::NaiveDate;
use minijinja::{AutoEscape, Environment, Value};
use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::core::error::AppError;
use crate::shared::thai::{baht_text, format_money, parse_amount, thai_date, to_thai_digits};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Invalid document archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Failed to read '{part}': {source}")]
    Read {
        part: String,
        source: std::io::Error,
    },

    #[error("Failed to render '{part}': {source}")]
    Template {
        part: String,
        source: minijinja::Error,
    },

    #[error("Failed to write document: {0}")]
    Write(#[from] std::io::Error),
}

impl From<RenderError> for AppError {
    fn from(e: RenderError) -> Self {
        AppError::Template(e.to_string())
    }
}

/// Body, header and footer parts carry placeholders
fn is_template_part(name: &str) -> bool {
    let Some(file) = name.strip_prefix("word/") else {
        return false;
    };
    if file.contains('/') || !file.ends_with(".xml") {
        return false;
    }
    file == "document.xml" || file.starts_with("header") || file.starts_with("footer")
}

/// Escape text for an XML text node. Newlines become Word line breaks.
fn xml_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\n' => out.push_str("</w:t><w:br/><w:t xml:space=\"preserve\">"),
            _ => out.push(c),
        }
    }
    out
}

/// Apply `f` to the text of a value. Field values arrive already escaped,
/// so a safe input stays safe.
fn map_text(value: &Value, f: impl Fn(&str) -> String) -> Value {
    let text = value
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| value.to_string());
    let out = f(&text);
    if value.is_safe() {
        Value::from_safe_string(out)
    } else {
        Value::from(out)
    }
}

fn baht_text_filter(value: &Value) -> Value {
    map_text(value, |text| {
        parse_amount(text)
            .and_then(baht_text)
            .unwrap_or_else(|| text.to_string())
    })
}

fn money_filter(value: &Value) -> Value {
    map_text(value, |text| {
        parse_amount(text)
            .map(format_money)
            .unwrap_or_else(|| text.to_string())
    })
}

fn thai_date_filter(value: &Value) -> Value {
    map_text(value, |text| {
        NaiveDate::parse_from_str(text.trim(), DATE_FORMAT)
            .map(thai_date)
            .unwrap_or_else(|_| text.to_string())
    })
}

fn thai_digits_filter(value: &Value) -> Value {
    map_text(value, to_thai_digits)
}

pub struct DocxRenderer {
    env: Environment<'static>,
}

impl Default for DocxRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl DocxRenderer {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::Html);
        env.add_filter("baht_text", baht_text_filter);
        env.add_filter("money", money_filter);
        env.add_filter("thai_date", thai_date_filter);
        env.add_filter("thai_digits", thai_digits_filter);
        Self { env }
    }

    /// Template context: every field pre-escaped for XML, plus `today`
    fn context(&self, fields: &BTreeMap<String, String>, today: NaiveDate) -> Value {
        let mut ctx: BTreeMap<String, Value> = fields
            .iter()
            .map(|(k, v)| (k.clone(), Value::from_safe_string(xml_text(v))))
            .collect();
        ctx.insert("today".to_string(), Value::from(thai_date(today)));
        ctx.insert(
            "today_iso".to_string(),
            Value::from(today.format(DATE_FORMAT).to_string()),
        );
        Value::from_iter(ctx)
    }

    /// Render `template` with `fields` and return the new `.docx` bytes
    pub fn render(
        &self,
        template: &[u8],
        fields: &BTreeMap<String, String>,
        today: NaiveDate,
    ) -> Result<Vec<u8>, RenderError> {
        let ctx = self.context(fields, today);
        let mut archive = ZipArchive::new(Cursor::new(template))?;

        let mut buffer: Vec<u8> = Vec::new();
        {
            let mut writer = ZipWriter::new(Cursor::new(&mut buffer));
            let options =
                SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

            for i in 0..archive.len() {
                let mut entry = archive.by_index(i)?;
                let name = entry.name().to_string();

                if !is_template_part(&name) {
                    writer.raw_copy_file(entry)?;
                    continue;
                }

                let mut xml = String::new();
                entry
                    .read_to_string(&mut xml)
                    .map_err(|source| RenderError::Read {
                        part: name.clone(),
                        source,
                    })?;

                let rendered =
                    self.env
                        .render_str(&xml, &ctx)
                        .map_err(|source| RenderError::Template {
                            part: name.clone(),
                            source,
                        })?;

                writer.start_file(name, options)?;
                writer.write_all(rendered.as_bytes())?;
            }

            writer.finish()?;
        }

        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_docx(parts: &[(&str, &[u8])]) -> Vec<u8> {
        let mut buffer = Vec::new();
        {
            let mut writer = ZipWriter::new(Cursor::new(&mut buffer));
            let options = SimpleFileOptions::default();
            for (name, data) in parts {
                writer.start_file(*name, options).unwrap();
                writer.write_all(data).unwrap();
            }
            writer.finish().unwrap();
        }
        buffer
    }

    fn read_part(docx: &[u8], name: &str) -> Vec<u8> {
        let mut archive = ZipArchive::new(Cursor::new(docx)).unwrap();
        let mut entry = archive.by_name(name).unwrap();
        let mut out = Vec::new();
        entry.read_to_end(&mut out).unwrap();
        out
    }

    fn fields(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    #[test]
    fn test_renders_body_header_and_footer() {
        let template = build_docx(&[
            ("[Content_Types].xml", &b"<Types/>"[..]),
            (
                "word/document.xml",
                "<w:body><w:t>เรื่อง {{ subject }}</w:t><w:t>{{ amount | money }} บาท ({{ amount | baht_text }})</w:t></w:body>".as_bytes(),
            ),
            ("word/header1.xml", &b"<w:hdr><w:t>{{ department }}</w:t></w:hdr>"[..]),
            ("word/footer1.xml", &b"<w:ftr><w:t>{{ today }}</w:t></w:ftr>"[..]),
        ]);

        let output = DocxRenderer::new()
            .render(
                &template,
                &fields(&[
                    ("subject", "ขออนุมัติโครงการ"),
                    ("amount", "1500.50"),
                    ("department", "กองคลัง"),
                ]),
                today(),
            )
            .unwrap();

        let body = String::from_utf8(read_part(&output, "word/document.xml")).unwrap();
        assert!(body.contains("เรื่อง ขออนุมัติโครงการ"));
        assert!(body.contains("1,500.50 บาท (หนึ่งพันห้าร้อยบาทห้าสิบสตางค์)"));

        let header = String::from_utf8(read_part(&output, "word/header1.xml")).unwrap();
        assert_eq!(header, "<w:hdr><w:t>กองคลัง</w:t></w:hdr>");

        let footer = String::from_utf8(read_part(&output, "word/footer1.xml")).unwrap();
        assert_eq!(footer, "<w:ftr><w:t>18 ตุลาคม 2569</w:t></w:ftr>");
    }

    #[test]
    fn test_field_values_are_xml_escaped() {
        let template = build_docx(&[("word/document.xml", &b"<w:t>{{ to }}</w:t>"[..])]);
        let output = DocxRenderer::new()
            .render(
                &template,
                &fields(&[("to", "ผอ. <กอง> & \"ฝ่าย\"")]),
                today(),
            )
            .unwrap();

        let body = String::from_utf8(read_part(&output, "word/document.xml")).unwrap();
        assert_eq!(
            body,
            "<w:t>ผอ. &lt;กอง&gt; &amp; &quot;ฝ่าย&quot;</w:t>"
        );
    }

    #[test]
    fn test_newlines_become_line_breaks() {
        let template = build_docx(&[("word/document.xml", &b"<w:t>{{ scope }}</w:t>"[..])]);
        let output = DocxRenderer::new()
            .render(&template, &fields(&[("scope", "ข้อ 1\nข้อ 2")]), today())
            .unwrap();

        let body = String::from_utf8(read_part(&output, "word/document.xml")).unwrap();
        assert_eq!(
            body,
            "<w:t>ข้อ 1</w:t><w:br/><w:t xml:space=\"preserve\">ข้อ 2</w:t>"
        );
    }

    #[test]
    fn test_other_parts_copied_unchanged() {
        let image: &[u8] = &[0x89, b'P', b'N', b'G', 0, 1, 2, 3, b'{', b'{'];
        let styles: &[u8] = b"<w:styles>{{ not_a_placeholder }}</w:styles>";
        let template = build_docx(&[
            ("word/document.xml", &b"<w:t>x</w:t>"[..]),
            ("word/media/image1.png", image),
            ("word/styles.xml", styles),
        ]);

        let output = DocxRenderer::new()
            .render(&template, &BTreeMap::new(), today())
            .unwrap();

        assert_eq!(read_part(&output, "word/media/image1.png"), image);
        assert_eq!(read_part(&output, "word/styles.xml"), styles);
    }

    #[test]
    fn test_missing_optional_field_renders_empty() {
        let template = build_docx(&[("word/document.xml", &b"<w:t>[{{ note }}]</w:t>"[..])]);
        let output = DocxRenderer::new()
            .render(&template, &BTreeMap::new(), today())
            .unwrap();

        assert_eq!(read_part(&output, "word/document.xml"), b"<w:t>[]</w:t>");
    }

    fn text(value: Value) -> String {
        value.to_string()
    }

    #[test]
    fn test_filters() {
        let v = Value::from;
        assert_eq!(text(thai_date_filter(&v("2026-01-05"))), "5 มกราคม 2569");
        assert_eq!(text(thai_date_filter(&v("เร็วๆ นี้"))), "เร็วๆ นี้");
        assert_eq!(text(money_filter(&v("25000"))), "25,000.00");
        assert_eq!(text(money_filter(&v("ไม่ระบุ"))), "ไม่ระบุ");
        assert_eq!(text(baht_text_filter(&v("21"))), "ยี่สิบเอ็ดบาทถ้วน");
        assert_eq!(
            text(baht_text_filter(&v("20000000000000000000"))),
            "20000000000000000000"
        );
        assert_eq!(text(thai_digits_filter(&v("12"))), "๑๒");
        assert_eq!(text(money_filter(&Value::from(1500))), "1,500.00");
    }

    #[test]
    fn test_filters_keep_escaped_fields_intact() {
        let template = build_docx(&[(
            "word/document.xml",
            &b"<w:t>{{ to | thai_digits }}</w:t>"[..],
        )]);
        let output = DocxRenderer::new()
            .render(&template, &fields(&[("to", "ห้อง 3 & 4")]), today())
            .unwrap();

        assert_eq!(
            String::from_utf8(read_part(&output, "word/document.xml")).unwrap(),
            "<w:t>ห้อง ๓ &amp; ๔</w:t>"
        );
    }

    #[test]
    fn test_broken_template_is_an_error() {
        let template = build_docx(&[("word/document.xml", &b"<w:t>{{ unclosed </w:t>"[..])]);
        let result = DocxRenderer::new().render(&template, &BTreeMap::new(), today());
        assert!(matches!(result, Err(RenderError::Template { .. })));

        let result = DocxRenderer::new().render(b"not a zip", &BTreeMap::new(), today());
        assert!(matches!(result, Err(RenderError::Archive(_))));
    }

    #[test]
    fn test_template_parts() {
        assert!(is_template_part("word/document.xml"));
        assert!(is_template_part("word/header2.xml"));
        assert!(is_template_part("word/footer1.xml"));
        assert!(!is_template_part("word/styles.xml"));
        assert!(!is_template_part("word/_rels/document.xml.rels"));
        assert!(!is_template_part("docProps/core.xml"));
    }
}
