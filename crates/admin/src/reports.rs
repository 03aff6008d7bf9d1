//! Class report: students of one class with fee totals, exportable as CSV.

use std::fmt::Write;

use schoolsoft_core::{ClassId, Kes, Student};

use crate::api::{ApiClient, Endpoint, Entity};
use crate::cache::ReferenceCache;
use crate::components::Applied;
use crate::components::data_table::{
    ListEndpoint, PageParam, SearchMode, class_report_table_config,
};
use crate::views::ListView;

/// Column headers of the exported file.
pub const REPORT_HEADERS: [&str; 7] = [
    "Id",
    "Student Name",
    "Guardian Name",
    "Guardian Phone",
    "Grade",
    "Fee Total",
    "Fee Balance",
];

const BOM: char = '\u{feff}';

/// List endpoint for one class's students.
///
/// Uses 1-based `page` and always sends `globalFilter` instead of switching to
/// a search path.
#[must_use]
pub fn class_report_endpoint(class_id: ClassId) -> ListEndpoint {
    ListEndpoint::new(
        Endpoint::new("class").segment(class_id).segment("students"),
        PageParam::OneBasedPage,
        SearchMode::GlobalFilterParam,
    )
}

/// Report screen. Nothing is fetched until a class is selected.
#[derive(Debug)]
pub struct ClassReport {
    client: ApiClient,
    cache: ReferenceCache,
    selected: Option<ClassId>,
    view: Option<ListView<Student>>,
}

impl ClassReport {
    #[must_use]
    pub const fn new(client: ApiClient, cache: ReferenceCache) -> Self {
        Self {
            client,
            cache,
            selected: None,
            view: None,
        }
    }

    /// Choose the class to report on. Table state starts over.
    pub fn select_class(&mut self, class_id: Option<ClassId>) {
        if class_id == self.selected {
            return;
        }
        self.selected = class_id;
        self.view = class_id.map(|id| {
            ListView::with_endpoint(
                Entity::Student,
                self.client.clone(),
                self.cache.clone(),
                class_report_endpoint(id),
                class_report_table_config(),
            )
        });
    }

    #[must_use]
    pub const fn selected(&self) -> Option<ClassId> {
        self.selected
    }

    #[must_use]
    pub const fn view(&self) -> Option<&ListView<Student>> {
        self.view.as_ref()
    }

    pub const fn view_mut(&mut self) -> Option<&mut ListView<Student>> {
        self.view.as_mut()
    }

    /// Fetch the current page. `None` while no class is selected.
    pub async fn refresh(&mut self) -> Option<Applied> {
        match self.view.as_mut() {
            Some(view) => Some(view.refresh().await),
            None => None,
        }
    }

    /// CSV of the rows currently on screen.
    #[must_use]
    pub fn export_csv(&self) -> Option<String> {
        self.view.as_ref().map(|view| students_csv(&view.page().items))
    }
}

/// Render students as CSV: UTF-8 BOM, comma separated, CRLF line endings,
/// strings double-quoted, numbers bare.
#[must_use]
pub fn students_csv(students: &[Student]) -> String {
    let mut csv = String::new();
    csv.push(BOM);

    let header: Vec<String> = REPORT_HEADERS.iter().map(|h| quote(h)).collect();
    let _ = write!(csv, "{}\r\n", header.join(","));

    for student in students {
        let _ = write!(
            csv,
            "{},{},{},{},{},{},{}\r\n",
            student.id,
            quote(&student.full_name()),
            quote(student.guardian_name.as_deref().unwrap_or_default()),
            quote(student.guardian_phone.as_deref().unwrap_or_default()),
            quote(student.class_name().unwrap_or_default()),
            number(student.fee_amount),
            number(student.fee_balance),
        );
    }
    csv
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn number(amount: Option<Kes>) -> String {
    amount.map_or_else(String::new, |kes| kes.amount().normalize().to_string())
}
