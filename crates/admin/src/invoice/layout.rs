//! Fixed A4 invoice layout.
//!
//! Coordinates are millimetres from the top-left corner; text `y` is the
//! baseline. The PDF writer flips them into page space.

use super::InvoiceData;

pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;

const LEFT: f32 = 10.0;
const RIGHT: f32 = PAGE_WIDTH_MM - 90.0;
const TABLE_TOP: f32 = 82.0;
const TABLE_LEFT: f32 = 14.0;
const TABLE_RIGHT: f32 = PAGE_WIDTH_MM - 14.0;
const ROW_HEIGHT: f32 = 8.0;
const CELL_PADDING: f32 = 2.0;
const TABLE_FONT: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
}

/// One line of text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextItem {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub font: Font,
    pub text: String,
}

/// A straight rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rule {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

/// A laid-out single page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvoiceDocument {
    pub texts: Vec<TextItem>,
    pub rules: Vec<Rule>,
}

impl InvoiceDocument {
    fn text(&mut self, x: f32, y: f32, size: f32, text: impl Into<String>) {
        self.texts.push(TextItem {
            x,
            y,
            size,
            font: Font::Regular,
            text: text.into(),
        });
    }

    fn bold(&mut self, x: f32, y: f32, size: f32, text: impl Into<String>) {
        self.texts.push(TextItem {
            x,
            y,
            size,
            font: Font::Bold,
            text: text.into(),
        });
    }

    /// First text item starting with `prefix`.
    #[must_use]
    pub fn find(&self, prefix: &str) -> Option<&TextItem> {
        self.texts.iter().find(|t| t.text.starts_with(prefix))
    }

    /// Draw a bordered two-column table and return its bottom edge.
    fn table(&mut self, top: f32, rows: &[(&str, &str, bool)]) -> f32 {
        let middle = (TABLE_LEFT + TABLE_RIGHT) / 2.0;
        let mut y = top;

        self.rules.push(Rule {
            x1: TABLE_LEFT,
            y1: y,
            x2: TABLE_RIGHT,
            y2: y,
        });
        for (label, value, bold) in rows {
            let baseline = y + ROW_HEIGHT - CELL_PADDING - 1.0;
            if *bold {
                self.bold(TABLE_LEFT + CELL_PADDING, baseline, TABLE_FONT, *label);
                self.bold(middle + CELL_PADDING, baseline, TABLE_FONT, *value);
            } else {
                self.text(TABLE_LEFT + CELL_PADDING, baseline, TABLE_FONT, *label);
                self.text(middle + CELL_PADDING, baseline, TABLE_FONT, *value);
            }
            y += ROW_HEIGHT;
            self.rules.push(Rule {
                x1: TABLE_LEFT,
                y1: y,
                x2: TABLE_RIGHT,
                y2: y,
            });
        }

        for x in [TABLE_LEFT, middle, TABLE_RIGHT] {
            self.rules.push(Rule {
                x1: x,
                y1: top,
                x2: x,
                y2: y,
            });
        }
        y
    }
}

/// Lay out an invoice.
#[must_use]
pub fn layout(data: &InvoiceData) -> InvoiceDocument {
    let mut doc = InvoiceDocument::default();

    doc.text(LEFT, 10.0, 18.0, "Invoice");

    doc.text(LEFT, 16.0, 12.0, &data.school_name);
    doc.text(LEFT, 22.0, 12.0, &data.school_address);
    doc.text(LEFT, 32.0, 12.0, &data.school_address2);

    doc.text(
        RIGHT,
        16.0,
        12.0,
        format!("Tel: {} / {}", data.school_phone, data.school_phone2),
    );
    doc.text(RIGHT, 22.0, 12.0, format!("Email: {}", data.school_email));
    doc.text(RIGHT, 32.0, 12.0, format!("Town: {}", data.school_town));

    doc.text(LEFT, 45.0, 16.0, "Student Details:");
    doc.text(LEFT, 52.0, 10.0, format!("Name: {}", data.student_name));
    doc.text(LEFT, 62.0, 10.0, format!("Grade: {}", data.class_name));
    doc.text(LEFT, 72.0, 10.0, format!("Guardian: {}", data.guardian_name));

    doc.text(RIGHT, 45.0, 16.0, "Invoice Details:");
    doc.text(RIGHT, 52.0, 10.0, format!("Date Paid: {}", data.date_paid));
    doc.text(RIGHT, 62.0, 10.0, format!("Amount: {}", data.amount));
    doc.text(
        RIGHT,
        72.0,
        10.0,
        format!("Mode of Payment: {}", data.payment_mode),
    );

    let final_y = doc.table(
        TABLE_TOP,
        &[
            ("Item", "Amount", true),
            ("Amount Paid", &data.amount, false),
            ("Total Balance Due", &data.balance_due, false),
            ("Paid Total", &data.amount, true),
        ],
    );

    let footer = final_y + 10.0;
    doc.text(LEFT, footer, 10.0, format!("Served By: {}", data.served_by));
    doc.text(LEFT, footer + 10.0, 10.0, "Bank Details:");
    doc.text(
        LEFT,
        footer + 20.0,
        10.0,
        format!("Account No: {}", data.bank_account),
    );
    doc.text(LEFT, footer + 30.0, 10.0, format!("Bank: {}", data.bank_name));
    doc.text(LEFT, footer + 40.0, 10.0, format!("Mpesa: {}", data.mpesa_info));

    doc
}
