//! Payment modal with student-driven class and amount-due fields.
//!
//! Choosing a student fills in that student's class and shows the
//! outstanding fee balance. The balance is display-only and never submitted.

use std::sync::Arc;

use schoolsoft_core::{Kes, Payment, Student, StudentId};

use super::{FormModal, FormMode, SubmitOutcome};
use crate::api::{ApiClient, Entity};
use crate::cache::ReferenceCache;

/// Payment create/update modal.
#[derive(Debug, Clone)]
pub struct PaymentForm {
    modal: FormModal,
    students: Arc<Vec<Student>>,
    amount_due: Option<Kes>,
}

impl PaymentForm {
    /// An empty create form over the given student list.
    #[must_use]
    pub fn create(students: Arc<Vec<Student>>) -> Self {
        Self {
            modal: FormModal::create(Entity::Payment),
            students,
            amount_due: None,
        }
    }

    /// An update form pre-filled from `payment`.
    #[must_use]
    pub fn update(payment: &Payment, students: Arc<Vec<Student>>) -> Self {
        let mut form = Self {
            modal: FormModal::update(Entity::Payment, payment.id.as_i32(), payment),
            students,
            amount_due: None,
        };
        form.amount_due = form
            .find(payment.student_id)
            .and_then(|student| student.fee_balance);
        form
    }

    /// Select (or with `None`, deselect) the paying student.
    pub fn select_student(&mut self, student_id: Option<StudentId>) {
        let Some(id) = student_id else {
            self.modal.unset("studentId");
            self.modal.unset("classId");
            self.amount_due = None;
            return;
        };

        self.modal.set("studentId", id.to_string());
        let (class_id, balance) = self
            .find(id)
            .map_or((None, None), |student| (student.class_id, student.fee_balance));

        match class_id {
            Some(class_id) => self.modal.set("classId", class_id.to_string()),
            None => self.modal.unset("classId"),
        }
        self.amount_due = balance;
    }

    /// Outstanding balance of the selected student.
    #[must_use]
    pub const fn amount_due(&self) -> Option<Kes> {
        self.amount_due
    }

    /// Amount due as shown in the form, `KES 0.00` when unknown.
    #[must_use]
    pub fn amount_due_display(&self) -> String {
        Kes::display_or_zero(self.amount_due)
    }

    #[must_use]
    pub const fn modal(&self) -> &FormModal {
        &self.modal
    }

    pub const fn modal_mut(&mut self) -> &mut FormModal {
        &mut self.modal
    }

    #[must_use]
    pub const fn mode(&self) -> FormMode {
        self.modal.mode()
    }

    /// Validate and send. A successful save also clears the amount due.
    pub async fn submit(&mut self, client: &ApiClient, cache: &ReferenceCache) -> SubmitOutcome {
        let outcome = self.modal.submit(client, cache).await;
        if outcome.needs_refetch() {
            self.amount_due = None;
        }
        outcome
    }

    fn find(&self, id: StudentId) -> Option<&Student> {
        self.students.iter().find(|student| student.id == id)
    }
}
