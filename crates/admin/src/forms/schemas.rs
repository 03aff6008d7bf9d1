//! Field rules for every modal.

use rust_decimal::Decimal;

use super::schema::{FieldKind, FieldRule, Schema};
use crate::api::Entity;

const GENDERS: &[&str] = &["MALE", "FEMALE"];
const ROLES: &[&str] = &["ADMIN", "USER"];
const PAYMENT_MODES: &[&str] = &["MPESA", "CASH", "BANK", "CHEQUE"];

/// Whether a modal creates a record or edits an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Update(i32),
}

impl FormMode {
    #[must_use]
    pub const fn record_id(self) -> Option<i32> {
        match self {
            Self::Create => None,
            Self::Update(id) => Some(id),
        }
    }
}

/// Schema for an entity's create or update modal.
#[must_use]
pub fn schema_for(entity: Entity, mode: FormMode) -> Schema {
    match entity {
        Entity::Student => student_schema(),
        Entity::Teacher => teacher_schema(),
        Entity::Class => class_schema(),
        Entity::User => user_schema(mode),
        Entity::Payment => payment_schema(),
        Entity::School => school_schema(),
    }
}

#[must_use]
pub fn student_schema() -> Schema {
    Schema::new(vec![
        FieldRule::text("first_name", "First name")
            .min_len(2)
            .message("First name is required"),
        FieldRule::text("last_name", "Last name")
            .min_len(2)
            .message("Last name is required"),
        FieldRule::new("dob", "Date of birth", FieldKind::Date),
        FieldRule::new("gender", "Gender", FieldKind::Choice(GENDERS))
            .message("Gender must be 'FEMALE' or 'MALE'"),
        FieldRule::new("classId", "Class", FieldKind::Id).optional(),
        FieldRule::text("guardianName", "Guardian name")
            .min_len(2)
            .message("Guardian name is required"),
        FieldRule::phone("guardianPhone", "Guardian phone"),
        FieldRule::new("feeAmount", "Fee amount", FieldKind::Number)
            .min_value(Decimal::ZERO)
            .message("Amount total must be a non-negative number"),
    ])
}

#[must_use]
pub fn teacher_schema() -> Schema {
    Schema::new(vec![
        FieldRule::text("first_name", "First name")
            .min_len(2)
            .message("First name is required"),
        FieldRule::text("last_name", "Last name")
            .min_len(2)
            .message("Last name is required"),
        FieldRule::phone("phone", "Phone"),
    ])
}

#[must_use]
pub fn class_schema() -> Schema {
    Schema::new(vec![
        FieldRule::text("name", "Class name")
            .min_len(2)
            .message("Class name is required"),
        FieldRule::new("teacherId", "Class teacher", FieldKind::Id).optional(),
    ])
}

/// Users need a password on create only.
#[must_use]
pub fn user_schema(mode: FormMode) -> Schema {
    let mut rules = vec![
        FieldRule::text("name", "Name")
            .min_len(1)
            .message("Name is required"),
        FieldRule::new("email", "Email", FieldKind::Email).message("Invalid email address"),
    ];
    if mode == FormMode::Create {
        rules.push(
            FieldRule::text("password", "Password")
                .min_len(1)
                .message("Password is required"),
        );
    }
    rules.push(
        FieldRule::new("role", "Role", FieldKind::Choice(ROLES))
            .message("Role must be 'ADMIN' or 'USER'"),
    );
    rules.push(FieldRule::new("activeStatus", "Status", FieldKind::Bool));
    Schema::new(rules)
}

#[must_use]
pub fn payment_schema() -> Schema {
    Schema::new(vec![
        FieldRule::new("studentId", "Student", FieldKind::Id).message("Select a student"),
        FieldRule::new("classId", "Class", FieldKind::Id).message("Select a class"),
        FieldRule::new("amount", "Amount", FieldKind::Number)
            .min_value(Decimal::ZERO)
            .message("Amount must be a non-negative number"),
        FieldRule::text("reference", "Reference")
            .min_len(1)
            .message("Enter reference"),
        FieldRule::new("payment_mode", "Payment mode", FieldKind::Choice(PAYMENT_MODES))
            .message("Select a payment mode"),
    ])
}

#[must_use]
pub fn school_schema() -> Schema {
    Schema::new(vec![
        FieldRule::text("name", "Name")
            .min_len(2)
            .message("Name is required"),
        FieldRule::new("email", "Email", FieldKind::Email).message("Invalid email address"),
        FieldRule::phone("phone", "Phone"),
        FieldRule::phone("phone2", "Phone 2"),
        FieldRule::text("address", "Address")
            .min_len(2)
            .message("Address is required"),
        FieldRule::text("address2", "Address 2")
            .min_len(2)
            .message("Address 2 is required"),
        FieldRule::text("town", "Town")
            .min_len(2)
            .message("Town is required"),
        FieldRule::text("mpesaInfo", "Mpesa info").optional(),
        FieldRule::text("bankName", "Bank name").optional(),
        FieldRule::text("bankAcc", "Bank account").optional(),
        FieldRule::text("school_motto", "School motto")
            .min_len(2)
            .message("School motto is required"),
    ])
}

#[must_use]
pub fn login_schema() -> Schema {
    Schema::new(vec![
        FieldRule::new("email", "Email", FieldKind::Email).message("Invalid email address"),
        FieldRule::text("password", "Password")
            .min_len(1)
            .message("Password is required"),
    ])
}
