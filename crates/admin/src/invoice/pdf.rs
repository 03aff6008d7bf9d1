//! Single-page PDF 1.4 writer.
//!
//! Only what an invoice needs: the two standard Helvetica faces, text runs
//! and stroked lines. Text is encoded as WinAnsi; characters outside Latin-1
//! print as `?`.

use std::io::Write;

use super::layout::{Font, InvoiceDocument, PAGE_HEIGHT_MM, PAGE_WIDTH_MM};

/// Points per millimetre.
pub const PT_PER_MM: f32 = 72.0 / 25.4;

const LINE_WIDTH_PT: f32 = 0.28;

/// Convert a top-left millimetre position to PDF user space.
#[must_use]
pub fn to_points(x_mm: f32, y_mm: f32) -> (f32, f32) {
    (x_mm * PT_PER_MM, (PAGE_HEIGHT_MM - y_mm) * PT_PER_MM)
}

/// Encode `doc` as a complete PDF file.
#[must_use]
pub fn write_pdf(doc: &InvoiceDocument) -> Vec<u8> {
    let content = content_stream(doc);

    let mut stream = Vec::with_capacity(content.len() + 64);
    let _ = write!(stream, "<< /Length {} >>\nstream\n", content.len());
    stream.extend_from_slice(&content);
    stream.extend_from_slice(b"\nendstream");

    let objects: [Vec<u8>; 6] = [
        b"<< /Type /Catalog /Pages 2 0 R >>".to_vec(),
        b"<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_vec(),
        format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
             /Resources << /Font << /F1 5 0 R /F2 6 0 R >> >> /Contents 4 0 R >>",
            number(PAGE_WIDTH_MM * PT_PER_MM),
            number(PAGE_HEIGHT_MM * PT_PER_MM),
        )
        .into_bytes(),
        stream,
        font_object("Helvetica"),
        font_object("Helvetica-Bold"),
    ];

    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

    let mut offsets = Vec::with_capacity(objects.len());
    for (index, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        let _ = writeln!(out, "{} 0 obj", index + 1);
        out.extend_from_slice(body);
        out.extend_from_slice(b"\nendobj\n");
    }

    let xref_offset = out.len();
    let _ = writeln!(out, "xref\n0 {}\n0000000000 65535 f ", objects.len() + 1);
    for offset in &offsets {
        let _ = writeln!(out, "{offset:010} 00000 n ");
    }
    let _ = writeln!(
        out,
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF",
        objects.len() + 1
    );
    out
}

fn font_object(base: &str) -> Vec<u8> {
    format!("<< /Type /Font /Subtype /Type1 /BaseFont /{base} /Encoding /WinAnsiEncoding >>")
        .into_bytes()
}

fn content_stream(doc: &InvoiceDocument) -> Vec<u8> {
    let mut out = Vec::new();

    let _ = writeln!(out, "0 0 0 rg");
    for item in &doc.texts {
        let (x, y) = to_points(item.x, item.y);
        let font = match item.font {
            Font::Regular => "F1",
            Font::Bold => "F2",
        };
        let _ = write!(
            out,
            "BT /{font} {} Tf {} {} Td (",
            number(item.size),
            number(x),
            number(y)
        );
        out.extend_from_slice(&encode_text(&item.text));
        out.extend_from_slice(b") Tj ET\n");
    }

    if !doc.rules.is_empty() {
        let _ = writeln!(out, "0 0 0 RG {} w", number(LINE_WIDTH_PT));
        for rule in &doc.rules {
            let (x1, y1) = to_points(rule.x1, rule.y1);
            let (x2, y2) = to_points(rule.x2, rule.y2);
            let _ = writeln!(
                out,
                "{} {} m {} {} l S",
                number(x1),
                number(y1),
                number(x2),
                number(y2)
            );
        }
    }
    out
}

/// Escape a string for a PDF literal and encode it as Latin-1.
#[must_use]
pub fn encode_text(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' => out.extend_from_slice(b"\\("),
            ')' => out.extend_from_slice(b"\\)"),
            '\\' => out.extend_from_slice(b"\\\\"),
            '\n' | '\r' => out.push(b' '),
            _ => out.push(u8::try_from(u32::from(c)).unwrap_or(b'?')),
        }
    }
    out
}

fn number(value: f32) -> String {
    let formatted = format!("{value:.2}");
    match formatted.split_once('.') {
        Some((whole, "00")) => whole.to_string(),
        Some((whole, fraction)) => format!("{whole}.{}", fraction.trim_end_matches('0')),
        None => formatted,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::invoice::layout::layout;
    use crate::invoice::tests::sample_data;

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }

    #[test]
    fn test_file_structure() {
        let pdf = write_pdf(&layout(&sample_data()));
        assert!(pdf.starts_with(b"%PDF-1.4\n"));
        assert!(pdf.ends_with(b"%%EOF\n"));
        assert!(find(&pdf, b"/BaseFont /Helvetica-Bold").is_some());
        assert!(find(&pdf, b"/MediaBox [0 0 595.28 841.89]").is_some());
    }

    #[test]
    fn test_xref_offsets_point_at_objects() {
        let pdf = write_pdf(&layout(&sample_data()));
        let text = String::from_utf8_lossy(&pdf);

        let startxref: usize = text
            .rsplit("startxref\n")
            .next()
            .unwrap()
            .lines()
            .next()
            .unwrap()
            .parse()
            .unwrap();
        assert!(pdf[startxref..].starts_with(b"xref\n"));

        let entries: Vec<usize> = text[text.find("xref\n").unwrap()..]
            .lines()
            .skip(3)
            .take(6)
            .map(|line| line[..10].parse().unwrap())
            .collect();
        for (index, offset) in entries.iter().enumerate() {
            let header = format!("{} 0 obj", index + 1);
            assert!(pdf[*offset..].starts_with(header.as_bytes()));
        }
    }

    #[test]
    fn test_stream_length_matches() {
        let pdf = write_pdf(&layout(&sample_data()));
        let text = String::from_utf8_lossy(&pdf);
        let start = text.find("<< /Length ").unwrap() + "<< /Length ".len();
        let length: usize = text[start..].split(' ').next().unwrap().parse().unwrap();
        let body = find(&pdf, b"stream\n").unwrap() + "stream\n".len();
        assert!(pdf[body + length..].starts_with(b"\nendstream"));
    }

    #[test]
    fn test_coordinates_flip_from_top() {
        let (x, y) = to_points(10.0, 10.0);
        assert_eq!(number(x), "28.35");
        assert_eq!(number(y), "813.54");

        let pdf = write_pdf(&layout(&sample_data()));
        assert!(find(&pdf, b"BT /F1 18 Tf 28.35 813.54 Td (Invoice) Tj ET").is_some());
    }

    #[test]
    fn test_encode_text() {
        assert_eq!(encode_text("a (b) \\c"), b"a \\(b\\) \\\\c".to_vec());
        assert_eq!(encode_text("caf\u{e9}"), vec![b'c', b'a', b'f', 0xE9]);
        assert_eq!(encode_text("\u{20ac}5"), b"?5".to_vec());
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(number(12.0), "12");
        assert_eq!(number(10.0), "10");
        assert_eq!(number(0.5), "0.5");
        assert_eq!(number(0.28), "0.28");
    }
}
