//! Field Validation - per-field error payloads for request bodies
//!
//! Request payloads are validated field by field and every failure is
//! collected before the request is rejected. The wire format groups
//! messages by field name:
//!
//! ```json
//! {
//!     "email": ["This field may not be blank."],
//!     "non_field_errors": ["The two password fields didn't match."]
//! }
//! ```
//!
//! ## Examples
//! ```rust
//! use kernel::validation::{Field, ValidationErrors};
//!
//! let mut errors = ValidationErrors::new();
//! let email: Field<String> = Field::Present("   ".to_string());
//! assert!(email.required("email", &mut errors).is_none());
//! assert_eq!(errors.codes("email"), vec!["blank"]);
//! ```

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Key used for errors that do not belong to a single field
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

// ============================================================================
// ErrorDetail
// ============================================================================

/// A single validation failure: a stable machine code plus a user-facing message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDetail {
    code: Cow<'static, str>,
    message: Cow<'static, str>,
}

impl ErrorDetail {
    pub fn new(code: impl Into<Cow<'static, str>>, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Field was absent from the payload
    pub fn required() -> Self {
        Self::new("required", "This field is required.")
    }

    /// Field was explicitly `null`
    pub fn null() -> Self {
        Self::new("null", "This field may not be null.")
    }

    /// Field was an empty or whitespace-only string
    pub fn blank() -> Self {
        Self::new("blank", "This field may not be blank.")
    }

    /// Field exceeded its maximum length
    pub fn max_length(max: usize) -> Self {
        Self::new(
            "max_length",
            format!("Ensure this field has no more than {max} characters."),
        )
    }

    /// Field value is malformed
    pub fn invalid(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new("invalid", message)
    }

    /// Field value collides with an existing record
    pub fn unique(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new("unique", message)
    }

    #[inline]
    pub fn code(&self) -> &str {
        &self.code
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

// ============================================================================
// ValidationErrors
// ============================================================================

/// Validation failures grouped by field name
///
/// Field order is stable (sorted) so responses are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: BTreeMap<String, Vec<ErrorDetail>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an error set holding a single field failure
    pub fn single(field: impl Into<String>, detail: ErrorDetail) -> Self {
        let mut errors = Self::new();
        errors.add(field, detail);
        errors
    }

    /// Build an error set holding a single non-field failure
    pub fn non_field(detail: ErrorDetail) -> Self {
        Self::single(NON_FIELD_ERRORS, detail)
    }

    /// Record a failure for `field`
    pub fn add(&mut self, field: impl Into<String>, detail: ErrorDetail) {
        self.fields.entry(field.into()).or_default().push(detail);
    }

    /// Record a failure that spans several fields
    pub fn add_non_field(&mut self, detail: ErrorDetail) {
        self.add(NON_FIELD_ERRORS, detail);
    }

    /// Move every failure of `other` into `self`
    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, details) in other.fields {
            self.fields.entry(field).or_default().extend(details);
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[inline]
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Failures recorded for `field` (empty slice if none)
    pub fn get(&self, field: &str) -> &[ErrorDetail] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Error codes recorded for `field`
    pub fn codes(&self, field: &str) -> Vec<&str> {
        self.get(field).iter().map(ErrorDetail::code).collect()
    }

    /// Iterate over `(field, failures)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ErrorDetail])> {
        self.fields
            .iter()
            .map(|(field, details)| (field.as_str(), details.as_slice()))
    }

    /// `Ok(value)` when no failure was recorded, `Err(self)` otherwise
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl Serialize for ValidationErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (field, details) in &self.fields {
            let messages: Vec<&str> = details.iter().map(ErrorDetail::message).collect();
            map.serialize_entry(field, &messages)?;
        }
        map.end()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, details) in &self.fields {
            for detail in details {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {detail}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for ValidationErrors {
    fn into_response(self) -> axum::response::Response {
        (axum::http::StatusCode::BAD_REQUEST, axum::Json(self)).into_response()
    }
}

// ============================================================================
// Field
// ============================================================================

/// Tri-state payload field: absent, explicit `null`, or a value
///
/// Use with `#[serde(default)]` so an absent key becomes [`Field::Missing`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Field<T> {
    #[default]
    Missing,
    Null,
    Present(T),
}

impl<T> Field<T> {
    /// Value if present, `None` for missing and null
    pub fn into_option(self) -> Option<T> {
        match self {
            Field::Present(value) => Some(value),
            Field::Missing | Field::Null => None,
        }
    }

    #[inline]
    pub fn is_missing(&self) -> bool {
        matches!(self, Field::Missing)
    }
}

impl<'de, T> Deserialize<'de> for Field<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => Field::Present(value),
            None => Field::Null,
        })
    }
}

impl Field<String> {
    /// Required, non-blank text; surrounding whitespace is trimmed
    ///
    /// Records exactly one failure under `name` when the value is unusable.
    pub fn required(self, name: &str, errors: &mut ValidationErrors) -> Option<String> {
        match self {
            Field::Missing => {
                errors.add(name, ErrorDetail::required());
                None
            }
            Field::Null => {
                errors.add(name, ErrorDetail::null());
                None
            }
            Field::Present(value) => {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    errors.add(name, ErrorDetail::blank());
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
        }
    }

    /// Required text whose content is kept verbatim (passwords)
    pub fn required_raw(self, name: &str, errors: &mut ValidationErrors) -> Option<String> {
        match self {
            Field::Present(value) if !value.trim().is_empty() => Some(value),
            other => {
                // Same failure rules as `required`, without trimming the value
                other.required(name, errors);
                None
            }
        }
    }

    /// Optional text limited to `max_len` characters; absent/null become empty
    pub fn optional(self, name: &str, max_len: usize, errors: &mut ValidationErrors) -> String {
        let value = self.into_option().unwrap_or_default().trim().to_string();
        if value.chars().count() > max_len {
            errors.add(name, ErrorDetail::max_length(max_len));
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Payload {
        #[serde(default)]
        email: Field<String>,
    }

    #[test]
    fn test_field_deserialize_states() {
        let missing: Payload = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.email, Field::Missing);

        let null: Payload = serde_json::from_str(r#"{"email": null}"#).unwrap();
        assert_eq!(null.email, Field::Null);

        let present: Payload = serde_json::from_str(r#"{"email": "a@a.com"}"#).unwrap();
        assert_eq!(present.email, Field::Present("a@a.com".to_string()));
    }

    #[test]
    fn test_required_records_one_error_per_state() {
        let cases = [
            (Field::Missing, "required"),
            (Field::Null, "null"),
            (Field::Present(String::new()), "blank"),
            (Field::Present("   ".to_string()), "blank"),
        ];

        for (field, code) in cases {
            let mut errors = ValidationErrors::new();
            assert!(field.required("email", &mut errors).is_none());
            assert_eq!(errors.codes("email"), vec![code]);
        }
    }

    #[test]
    fn test_required_trims_value() {
        let mut errors = ValidationErrors::new();
        let value = Field::Present("  Aaa ".to_string()).required("first_name", &mut errors);
        assert_eq!(value.as_deref(), Some("Aaa"));
        assert!(errors.is_empty());
    }

    #[test]
    fn test_required_raw_keeps_whitespace() {
        let mut errors = ValidationErrors::new();
        let value = Field::Present(" secret pass ".to_string()).required_raw("password", &mut errors);
        assert_eq!(value.as_deref(), Some(" secret pass "));

        let blank = Field::Present(" ".to_string()).required_raw("password", &mut errors);
        assert!(blank.is_none());
        assert_eq!(errors.codes("password"), vec!["blank"]);
    }

    #[test]
    fn test_optional_max_length() {
        let mut errors = ValidationErrors::new();
        let value = Field::Present("abcdef".to_string()).optional("address", 3, &mut errors);
        assert_eq!(value, "abcdef");
        assert_eq!(errors.codes("address"), vec!["max_length"]);

        let mut errors = ValidationErrors::new();
        assert_eq!(Field::Null.optional("address", 3, &mut errors), "");
        assert!(errors.is_empty());
    }

    #[test]
    fn test_serialize_wire_format() {
        let mut errors = ValidationErrors::new();
        errors.add("email", ErrorDetail::blank());
        errors.add_non_field(ErrorDetail::new(
            "password_mismatch",
            "The two password fields didn't match.",
        ));

        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "email": ["This field may not be blank."],
                "non_field_errors": ["The two password fields didn't match."],
            })
        );
    }

    #[test]
    fn test_merge_and_into_result() {
        let mut errors = ValidationErrors::single("email", ErrorDetail::required());
        errors.merge(ValidationErrors::single("email", ErrorDetail::blank()));
        assert_eq!(errors.get("email").len(), 2);
        assert!(errors.clone().into_result(()).is_err());
        assert_eq!(ValidationErrors::new().into_result(7).unwrap(), 7);
    }
}
