// Minimal .xlsx writer for tests: just enough package parts for a reader
// to find the sheets and their cells.
use std::io::{Cursor, Write};

use anyhow::Result;
use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

pub(crate) enum XCell<'a> {
    Text(&'a str),
    Number(f64),
    Bool(bool),
    /// Formula source and its cached result.
    Formula(&'a str, &'a str),
    /// Anchor of a filled-down formula: source, covered range, cached result.
    SharedFormula(&'a str, &'a str, &'a str),
    /// A later cell of that fill, holding only its cached result.
    SharedFill(&'a str),
    /// Excel serial number with a built-in date format applied.
    Date(f64),
}

pub(crate) type Sheet<'a> = (&'a str, Vec<Vec<XCell<'a>>>);

/// Index into `cellXfs` of the style using built-in format 14 (`m/d/yyyy`).
const DATE_STYLE: usize = 1;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fonts count="1"><font/></fonts><fills count="1"><fill/></fills><borders count="1"><border/></borders><cellStyleXfs count="1"><xf numFmtId="0"/></cellStyleXfs><cellXfs count="2"><xf numFmtId="0" xfId="0"/><xf numFmtId="14" xfId="0" applyNumberFormat="1"/></cellXfs></styleSheet>"#;

pub(crate) fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn column_letter(col: usize) -> String {
    let mut n = col + 1;
    let mut out = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        out.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    out.iter().rev().collect()
}

fn cell_xml(reference: &str, cell: &XCell<'_>) -> String {
    match cell {
        XCell::Text(s) => format!(
            r#"<c r="{reference}" t="inlineStr"><is><t>{}</t></is></c>"#,
            escape(s)
        ),
        XCell::Number(v) => format!(r#"<c r="{reference}"><v>{v}</v></c>"#),
        XCell::Bool(b) => format!(
            r#"<c r="{reference}" t="b"><v>{}</v></c>"#,
            u8::from(*b)
        ),
        XCell::Formula(f, cached) => format!(
            r#"<c r="{reference}"{}><f>{}</f><v>{}</v></c>"#,
            cached_kind(cached),
            escape(f),
            escape(cached)
        ),
        XCell::SharedFormula(f, range, cached) => format!(
            r#"<c r="{reference}"{}><f t="shared" ref="{range}" si="0">{}</f><v>{}</v></c>"#,
            cached_kind(cached),
            escape(f),
            escape(cached)
        ),
        XCell::SharedFill(cached) => format!(
            r#"<c r="{reference}"{}><f t="shared" si="0"/><v>{}</v></c>"#,
            cached_kind(cached),
            escape(cached)
        ),
        XCell::Date(serial) => format!(r#"<c r="{reference}" s="{DATE_STYLE}"><v>{serial}</v></c>"#),
    }
}

fn cached_kind(cached: &str) -> &'static str {
    if cached.parse::<f64>().is_ok() {
        ""
    } else {
        r#" t="str""#
    }
}

fn sheet_xml(rows: &[Vec<XCell<'_>>]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );
    for (r, row) in rows.iter().enumerate() {
        xml.push_str(&format!(r#"<row r="{}">"#, r + 1));
        for (c, cell) in row.iter().enumerate() {
            let reference = format!("{}{}", column_letter(c), r + 1);
            xml.push_str(&cell_xml(&reference, cell));
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData></worksheet>");
    xml
}

/// Build the bytes of a workbook with the given sheets, in order.
pub(crate) fn workbook_bytes(sheets: &[Sheet<'_>]) -> Result<Vec<u8>> {
    let mut content_types = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#,
    );
    let mut workbook = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>"#,
    );
    let mut rels = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for (i, (name, _)) in sheets.iter().enumerate() {
        let n = i + 1;
        content_types.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{n}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
        ));
        workbook.push_str(&format!(
            r#"<sheet name="{}" sheetId="{n}" r:id="rId{n}"/>"#,
            escape(name)
        ));
        rels.push_str(&format!(
            r#"<Relationship Id="rId{n}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{n}.xml"/>"#
        ));
    }
    rels.push_str(&format!(
        r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
        sheets.len() + 1
    ));
    content_types.push_str("</Types>");
    workbook.push_str("</sheets></workbook>");
    rels.push_str("</Relationships>");

    let root_rels = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

    let mut buf = Vec::new();
    {
        let mut zip = ZipWriter::new(Cursor::new(&mut buf));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

        zip.start_file("[Content_Types].xml", options)?;
        zip.write_all(content_types.as_bytes())?;
        zip.start_file("_rels/.rels", options)?;
        zip.write_all(root_rels.as_bytes())?;
        zip.start_file("xl/workbook.xml", options)?;
        zip.write_all(workbook.as_bytes())?;
        zip.start_file("xl/_rels/workbook.xml.rels", options)?;
        zip.write_all(rels.as_bytes())?;
        zip.start_file("xl/styles.xml", options)?;
        zip.write_all(STYLES.as_bytes())?;
        for (i, (_, rows)) in sheets.iter().enumerate() {
            zip.start_file(format!("xl/worksheets/sheet{}.xml", i + 1), options)?;
            zip.write_all(sheet_xml(rows).as_bytes())?;
        }
        zip.finish()?;
    }
    Ok(buf)
}

#[test]
fn column_letters() {
    assert_eq!(column_letter(0), "A");
    assert_eq!(column_letter(25), "Z");
    assert_eq!(column_letter(26), "AA");
}
