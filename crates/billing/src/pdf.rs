//! Bill → PDF.
//!
//! [`PdfRenderer`] writes a plain PDF 1.4 file: A4 pages, the built-in Courier
//! font (so columns line up without font metrics), one text object per page.

use crate::{Bill, BillingError, format_amount};

/// Turns a bill into a downloadable document.
pub trait BillRenderer: Send + Sync {
    fn render(&self, bill: &Bill) -> Result<Vec<u8>, BillingError>;

    fn content_type(&self) -> &'static str;

    fn file_extension(&self) -> &'static str;
}

const PAGE_WIDTH: u32 = 595;
const PAGE_HEIGHT: u32 = 842;
const MARGIN_LEFT: u32 = 50;
const TOP: u32 = 790;
const FONT_SIZE: u32 = 10;
const LEADING: u32 = 13;
pub const LINES_PER_PAGE: usize = 56;

const SERVICE_WIDTH: usize = 36;

#[derive(Debug, Clone)]
pub struct PdfRenderer {
    /// Printed when a bill carries no issuer address of its own.
    default_issuer: String,
}

impl PdfRenderer {
    pub fn new(default_issuer: impl Into<String>) -> Self {
        Self {
            default_issuer: default_issuer.into(),
        }
    }

    fn text_lines(&self, bill: &Bill) -> Vec<String> {
        let mut out = Vec::new();
        out.push(format!("BILL {}", bill.number));
        out.push(format!("Date: {}", bill.billing_date.format("%Y-%m-%d")));
        out.push(String::new());

        out.push("From:".to_string());
        let issuer = if bill.issuer_address.trim().is_empty() {
            &self.default_issuer
        } else {
            &bill.issuer_address
        };
        out.extend(issuer.lines().map(|l| format!("  {}", l.trim_end())));
        out.push(String::new());

        out.push("To:".to_string());
        out.extend(bill.billing_address.lines().map(|l| format!("  {}", l.trim_end())));
        out.push(String::new());

        out.push(format!(
            "{:<w$} {:>5} {:>14} {:>14}",
            "Service",
            "Qty",
            "Unit price",
            "Total",
            w = SERVICE_WIDTH
        ));
        out.push("-".repeat(SERVICE_WIDTH + 5 + 14 + 14 + 3));
        for line in &bill.lines {
            out.push(format!(
                "{:<w$} {:>5} {:>14} {:>14}",
                truncate(&line.service, SERVICE_WIDTH),
                line.quantity,
                format_amount(line.unit_price, &bill.currency),
                format_amount(line.total(), &bill.currency),
                w = SERVICE_WIDTH
            ));
            for desc in line.description.lines().filter(|l| !l.trim().is_empty()) {
                out.push(format!("    {}", desc.trim()));
            }
        }
        out.push(String::new());
        out.push(format!("TOTAL: {}", format_amount(bill.amount(), &bill.currency)));
        out
    }
}

impl Default for PdfRenderer {
    fn default() -> Self {
        Self::new("billjobs")
    }
}

impl BillRenderer for PdfRenderer {
    fn render(&self, bill: &Bill) -> Result<Vec<u8>, BillingError> {
        let lines = self.text_lines(bill);
        let pages: Vec<&[String]> = lines.chunks(LINES_PER_PAGE).collect();
        if pages.is_empty() {
            return Err(BillingError::Render("nothing to render".into()));
        }
        Ok(write_document(&pages))
    }

    fn content_type(&self) -> &'static str {
        "application/pdf"
    }

    fn file_extension(&self) -> &'static str {
        "pdf"
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut cut: String = s.chars().take(max - 1).collect();
        cut.push('~');
        cut
    }
}

/// Escape for a PDF literal string. Anything outside printable ASCII becomes `?`
/// since the standard fonts are used without an encoding dictionary.
fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' | '(' | ')' => {
                out.push('\\');
                out.push(c);
            }
            ' '..='~' => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

fn content_stream(lines: &[String]) -> String {
    let mut stream = format!(
        "BT\n/F1 {FONT_SIZE} Tf\n{LEADING} TL\n{MARGIN_LEFT} {TOP} Td\n"
    );
    for line in lines {
        stream.push('(');
        stream.push_str(&escape_text(line));
        stream.push_str(") Tj T*\n");
    }
    stream.push_str("ET");
    stream
}

// Object layout: 1 catalog, 2 page tree, 3 font, then (page, contents) pairs.
fn write_document(pages: &[&[String]]) -> Vec<u8> {
    let mut doc = PdfWriter::new();

    let kids = (0..pages.len())
        .map(|i| format!("{} 0 R", 4 + 2 * i))
        .collect::<Vec<_>>()
        .join(" ");

    doc.object("<< /Type /Catalog /Pages 2 0 R >>");
    doc.object(&format!(
        "<< /Type /Pages /Kids [{kids}] /Count {} >>",
        pages.len()
    ));
    doc.object("<< /Type /Font /Subtype /Type1 /BaseFont /Courier >>");

    for (i, page) in pages.iter().enumerate() {
        doc.object(&format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
             /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
            5 + 2 * i
        ));
        let stream = content_stream(page);
        doc.object(&format!(
            "<< /Length {} >>\nstream\n{stream}\nendstream",
            stream.len()
        ));
    }

    doc.finish()
}

struct PdfWriter {
    buf: Vec<u8>,
    offsets: Vec<usize>,
}

impl PdfWriter {
    fn new() -> Self {
        let mut buf = Vec::with_capacity(4096);
        buf.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");
        Self {
            buf,
            offsets: Vec::new(),
        }
    }

    fn object(&mut self, body: &str) {
        self.offsets.push(self.buf.len());
        let header = format!("{} 0 obj\n", self.offsets.len());
        self.buf.extend_from_slice(header.as_bytes());
        self.buf.extend_from_slice(body.as_bytes());
        self.buf.extend_from_slice(b"\nendobj\n");
    }

    fn finish(mut self) -> Vec<u8> {
        let xref_at = self.buf.len();
        let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", self.offsets.len() + 1);
        for offset in &self.offsets {
            xref.push_str(&format!("{offset:010} 00000 n \n"));
        }
        xref.push_str(&format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
            self.offsets.len() + 1
        ));
        self.buf.extend_from_slice(xref.as_bytes());
        self.buf
    }
}
