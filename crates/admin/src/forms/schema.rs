//! Declarative field rules and the single validator that interprets them.
//!
//! A form is a map of raw text inputs. [`Schema::validate`] checks every rule
//! and either returns the JSON body to send, with identifiers and amounts
//! coerced to numbers, or a [`ValidationErrors`] map of one message per
//! failing field. Fields without a rule are never sent.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use schoolsoft_core::Email;
use serde_json::{Map, Value};
use thiserror::Error;

/// Raw form inputs keyed by field name.
pub type FormValues = BTreeMap<String, String>;

/// Kenyan phone numbers with an optional country code and leading zero.
pub static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\+?\d{2,3})?0?\d{9}$").expect("Invalid regex"));

/// How a raw input is parsed and serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Email,
    /// `YYYY-MM-DD`, sent as a string.
    Date,
    /// Decimal amount, sent as a JSON number.
    Number,
    /// Positive integer record id, sent as a JSON number.
    Id,
    Bool,
    /// One of a fixed set of upper-case values.
    Choice(&'static [&'static str]),
}

/// Validation rule for one field.
#[derive(Debug, Clone)]
pub struct FieldRule {
    name: &'static str,
    label: &'static str,
    kind: FieldKind,
    required: bool,
    min_len: Option<usize>,
    min_value: Option<Decimal>,
    pattern: Option<&'static LazyLock<Regex>>,
    message: Option<&'static str>,
}

impl FieldRule {
    /// A required field of the given kind.
    #[must_use]
    pub const fn new(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            required: true,
            min_len: None,
            min_value: None,
            pattern: None,
            message: None,
        }
    }

    #[must_use]
    pub const fn text(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FieldKind::Text)
    }

    /// A text field that must match [`PHONE_RE`].
    #[must_use]
    pub fn phone(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FieldKind::Text)
            .pattern(&PHONE_RE)
            .message("Invalid phone number")
    }

    /// Empty input is allowed and omitted from the body.
    #[must_use]
    pub const fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    #[must_use]
    pub const fn min_len(mut self, min: usize) -> Self {
        self.min_len = Some(min);
        self
    }

    #[must_use]
    pub const fn min_value(mut self, min: Decimal) -> Self {
        self.min_value = Some(min);
        self
    }

    #[must_use]
    pub const fn pattern(mut self, pattern: &'static LazyLock<Regex>) -> Self {
        self.pattern = Some(pattern);
        self
    }

    /// Message shown for any failure of this field.
    #[must_use]
    pub const fn message(mut self, message: &'static str) -> Self {
        self.message = Some(message);
        self
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        self.label
    }

    #[must_use]
    pub const fn kind(&self) -> FieldKind {
        self.kind
    }

    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.required
    }

    /// Check one raw input. `Ok(None)` means an empty optional field.
    fn check(&self, raw: Option<&str>) -> Result<Option<Value>, String> {
        let raw = raw.unwrap_or_default();
        let blank = raw.trim().is_empty();

        if blank {
            return if self.required {
                Err(self.fail(format!("{} is required", self.label)))
            } else {
                Ok(None)
            };
        }

        if let Some(min) = self.min_len
            && raw.chars().count() < min
        {
            return Err(self.fail(format!(
                "{} must contain at least {min} character(s)",
                self.label
            )));
        }

        if let Some(pattern) = self.pattern
            && !pattern.is_match(raw.trim())
        {
            return Err(self.fail(format!("Invalid {}", self.label.to_lowercase())));
        }

        self.coerce(raw).map(Some)
    }

    fn coerce(&self, raw: &str) -> Result<Value, String> {
        let trimmed = raw.trim();
        match self.kind {
            FieldKind::Text => Ok(Value::String(raw.to_string())),
            FieldKind::Email => Email::parse(trimmed)
                .map(|email| Value::String(email.into_inner()))
                .map_err(|_| self.fail("Invalid email address".to_string())),
            FieldKind::Date => NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .map(|date| Value::String(date.format("%Y-%m-%d").to_string()))
                .map_err(|_| self.fail(format!("{} must be a valid date", self.label))),
            FieldKind::Number => {
                let amount = Decimal::from_str(&trimmed.replace(',', ""))
                    .map_err(|_| self.fail(format!("{} must be a number", self.label)))?;
                if let Some(min) = self.min_value
                    && amount < min
                {
                    return Err(self.fail(format!("{} must be at least {min}", self.label)));
                }
                decimal_to_json(amount)
                    .ok_or_else(|| self.fail(format!("{} must be a number", self.label)))
            }
            FieldKind::Id => match trimmed.parse::<i32>() {
                Ok(id) if id >= 1 => Ok(Value::from(id)),
                _ => Err(self.fail(format!("Select a {}", self.label.to_lowercase()))),
            },
            FieldKind::Bool => match trimmed.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "active" => Ok(Value::Bool(true)),
                "false" | "0" | "no" | "inactive" => Ok(Value::Bool(false)),
                _ => Err(self.fail(format!("{} must be true or false", self.label))),
            },
            FieldKind::Choice(options) => {
                let upper = trimmed.to_ascii_uppercase();
                if options.contains(&upper.as_str()) {
                    Ok(Value::String(upper))
                } else {
                    Err(self.fail(format!(
                        "{} must be one of {}",
                        self.label,
                        options.join(", ")
                    )))
                }
            }
        }
    }

    fn fail(&self, fallback: String) -> String {
        self.message.map_or(fallback, ToString::to_string)
    }
}

/// Serialize a decimal as a plain JSON number (`1500`, `250.5`).
fn decimal_to_json(amount: Decimal) -> Option<Value> {
    serde_json::from_str(&amount.normalize().to_string()).ok()
}

/// Per-field validation messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{} field(s) failed validation", .fields.len())]
pub struct ValidationErrors {
    fields: BTreeMap<String, String>,
}

impl ValidationErrors {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Message for one field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn insert(&mut self, field: &str, message: impl Into<String>) {
        self.fields.insert(field.to_string(), message.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// An ordered set of field rules.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    rules: Vec<FieldRule>,
}

impl Schema {
    #[must_use]
    pub fn new(rules: Vec<FieldRule>) -> Self {
        Self { rules }
    }

    #[must_use]
    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    #[must_use]
    pub fn rule(&self, name: &str) -> Option<&FieldRule> {
        self.rules.iter().find(|r| r.name == name)
    }

    /// Validate `values` and build the request body.
    ///
    /// # Errors
    ///
    /// Returns every failing field with its message.
    pub fn validate(&self, values: &FormValues) -> Result<Map<String, Value>, ValidationErrors> {
        let mut body = Map::new();
        let mut errors = ValidationErrors::default();

        for rule in &self.rules {
            match rule.check(values.get(rule.name).map(String::as_str)) {
                Ok(Some(value)) => {
                    body.insert(rule.name.to_string(), value);
                }
                Ok(None) => {}
                Err(message) => errors.insert(rule.name, message),
            }
        }

        if errors.is_empty() {
            Ok(body)
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn values(pairs: &[(&str, &str)]) -> FormValues {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_phone_pattern() {
        for ok in ["0712345678", "712345678", "+254712345678", "254712345678"] {
            assert!(PHONE_RE.is_match(ok), "{ok}");
        }
        for bad in ["12345", "07123456789a", "+2547 1234 5678", ""] {
            assert!(!PHONE_RE.is_match(bad), "{bad}");
        }
    }

    #[test]
    fn test_coercion() {
        let schema = Schema::new(vec![
            FieldRule::new("classId", "Class", FieldKind::Id),
            FieldRule::new("amount", "Amount", FieldKind::Number).min_value(Decimal::ZERO),
            FieldRule::new("dob", "Date of birth", FieldKind::Date),
            FieldRule::new("activeStatus", "Status", FieldKind::Bool),
            FieldRule::new("payment_mode", "Mode", FieldKind::Choice(&["MPESA", "CASH"])),
        ]);
        let body = schema
            .validate(&values(&[
                ("classId", " 4 "),
                ("amount", "1,500.50"),
                ("dob", "2015-03-09"),
                ("activeStatus", "true"),
                ("payment_mode", "mpesa"),
                ("ignored", "x"),
            ]))
            .unwrap();

        assert_eq!(
            Value::Object(body),
            json!({
                "classId": 4,
                "amount": 1500.5,
                "dob": "2015-03-09",
                "activeStatus": true,
                "payment_mode": "MPESA"
            })
        );
    }

    #[test]
    fn test_optional_blank_is_omitted() {
        let schema = Schema::new(vec![
            FieldRule::new("teacherId", "Teacher", FieldKind::Id).optional(),
        ]);
        let body = schema.validate(&values(&[("teacherId", "")])).unwrap();
        assert!(body.is_empty());
    }

    #[test]
    fn test_custom_messages_win() {
        let schema = Schema::new(vec![
            FieldRule::text("first_name", "First name")
                .min_len(2)
                .message("First name is required"),
            FieldRule::phone("guardianPhone", "Guardian phone"),
            FieldRule::new("amount", "Amount", FieldKind::Number)
                .min_value(Decimal::ZERO)
                .message("Amount total must be a non-negative number"),
        ]);
        let errors = schema
            .validate(&values(&[
                ("first_name", "J"),
                ("guardianPhone", "12"),
                ("amount", "-5"),
            ]))
            .unwrap_err();

        assert_eq!(errors.len(), 3);
        assert_eq!(errors.get("first_name"), Some("First name is required"));
        assert_eq!(errors.get("guardianPhone"), Some("Invalid phone number"));
        assert_eq!(
            errors.get("amount"),
            Some("Amount total must be a non-negative number")
        );
    }

    #[test]
    fn test_default_messages() {
        let schema = Schema::new(vec![
            FieldRule::new("email", "Email", FieldKind::Email),
            FieldRule::new("studentId", "Student", FieldKind::Id),
            FieldRule::new("role", "Role", FieldKind::Choice(&["ADMIN", "USER"])),
        ]);
        let errors = schema
            .validate(&values(&[("email", "nope"), ("studentId", "0"), ("role", "root")]))
            .unwrap_err();

        assert_eq!(errors.get("email"), Some("Invalid email address"));
        assert_eq!(errors.get("studentId"), Some("Select a student"));
        assert_eq!(errors.get("role"), Some("Role must be one of ADMIN, USER"));
        assert_eq!(errors.to_string(), "3 field(s) failed validation");
    }
}
