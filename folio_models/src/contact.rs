use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::{email_address::EmailAddress, macros::nutype_string};

nutype_string!(
    /// Full name of the sender
    ContactName(validate(len_char_min = 2))
);

nutype_string!(
    /// Subject line chosen by the sender
    ContactSubject(validate(len_char_min = 3))
);

nutype_string!(
    /// Free text body of the message
    ContactMessage(validate(len_char_min = 10))
);

impl ContactName {
    pub const MIN_LEN: usize = 2;
}

impl ContactSubject {
    pub const MIN_LEN: usize = 3;
}

impl ContactMessage {
    pub const MIN_LEN: usize = 10;
}

/// A validated contact form submission.
///
/// Lives for a single request only and is never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactSubmission {
    pub name: ContactName,
    pub email: EmailAddress,
    pub subject: ContactSubject,
    pub message: ContactMessage,
    /// Optional budget range, empty if not provided.
    pub budget: String,
    /// Honeypot field. Hidden in the form, so only bots fill it in.
    pub company: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactField {
    Name,
    Email,
    Subject,
    Message,
    Budget,
    Company,
}

/// Field level report of everything that is wrong with a submission.
///
/// Serializes to `{"formErrors": [...], "fieldErrors": {"<field>": [...]}}`,
/// which is the shape the contact page renders next to its inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactValidationErrors {
    pub form_errors: Vec<String>,
    pub field_errors: BTreeMap<ContactField, Vec<String>>,
}

impl ContactField {
    pub const fn key(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Subject => "subject",
            Self::Message => "message",
            Self::Budget => "budget",
            Self::Company => "company",
        }
    }
}

impl ContactSubmission {
    /// Validate a decoded request body.
    ///
    /// Every field is checked, so the returned report names all offending
    /// fields at once. Unknown keys are ignored.
    pub fn parse(body: &Value) -> Result<Self, ContactValidationErrors> {
        let Value::Object(fields) = body else {
            return Err(ContactValidationErrors {
                form_errors: vec![format!("Expected object, received {}", json_type(body))],
                field_errors: BTreeMap::new(),
            });
        };

        let mut errors = ContactValidationErrors::default();

        let name = errors.record(
            ContactField::Name,
            required(fields, ContactField::Name).and_then(|name| {
                ContactName::try_new(name).map_err(|_| too_short(ContactName::MIN_LEN))
            }),
        );
        let email = errors.record(
            ContactField::Email,
            required(fields, ContactField::Email).and_then(|email| {
                EmailAddress::try_new(email).map_err(|_| "Invalid email".to_owned())
            }),
        );
        let subject = errors.record(
            ContactField::Subject,
            required(fields, ContactField::Subject).and_then(|subject| {
                ContactSubject::try_new(subject).map_err(|_| too_short(ContactSubject::MIN_LEN))
            }),
        );
        let message = errors.record(
            ContactField::Message,
            required(fields, ContactField::Message).and_then(|message| {
                ContactMessage::try_new(message).map_err(|_| too_short(ContactMessage::MIN_LEN))
            }),
        );
        let budget = errors.record(ContactField::Budget, optional(fields, ContactField::Budget));
        let company = errors.record(ContactField::Company, optional(fields, ContactField::Company));

        match (name, email, subject, message, budget, company) {
            (Some(name), Some(email), Some(subject), Some(message), Some(budget), Some(company)) => {
                Ok(Self {
                    name,
                    email,
                    subject,
                    message,
                    budget,
                    company,
                })
            }
            _ => Err(errors),
        }
    }

    /// Whether the honeypot field has been filled in.
    pub fn is_bot(&self) -> bool {
        !self.company.is_empty()
    }
}

impl ContactValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.form_errors.is_empty() && self.field_errors.is_empty()
    }

    fn record<T>(&mut self, field: ContactField, result: Result<T, String>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.field_errors.entry(field).or_default().push(err);
                None
            }
        }
    }
}

impl std::fmt::Display for ContactValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for err in &self.form_errors {
            if !first {
                f.write_str("; ")?;
            }
            first = false;
            f.write_str(err)?;
        }
        for (field, errs) in &self.field_errors {
            for err in errs {
                if !first {
                    f.write_str("; ")?;
                }
                first = false;
                write!(f, "{}: {err}", field.key())?;
            }
        }
        Ok(())
    }
}

fn required(fields: &Map<String, Value>, field: ContactField) -> Result<String, String> {
    string_field(fields, field)?.ok_or_else(|| "Required".to_owned())
}

fn optional(fields: &Map<String, Value>, field: ContactField) -> Result<String, String> {
    string_field(fields, field).map(Option::unwrap_or_default)
}

fn string_field(fields: &Map<String, Value>, field: ContactField) -> Result<Option<String>, String> {
    match fields.get(field.key()) {
        None => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.clone())),
        Some(other) => Err(format!("Expected string, received {}", json_type(other))),
    }
}

fn too_short(min_len: usize) -> String {
    format!("String must contain at least {min_len} character(s)")
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
