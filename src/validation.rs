use serde::{Deserialize, Deserializer};

use crate::error::{ApiError, FieldErrors};

pub const MAX_LENGTH: usize = 255;

/// Collects field errors for one request body.
#[derive(Debug, Default)]
pub struct Validator {
    errors: FieldErrors,
}

impl Validator {
    fn fail(&mut self, field: &str, message: String) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message);
    }

    fn check_length(&mut self, field: &str, value: &str) -> bool {
        if value.chars().count() > MAX_LENGTH {
            self.fail(
                field,
                format!("The {field} field must not be greater than {MAX_LENGTH} characters."),
            );
            return false;
        }
        true
    }

    /// A non-blank string of at most `MAX_LENGTH` characters, trimmed.
    pub fn required_string(&mut self, field: &str, value: Option<String>) -> String {
        let value = value.map(|v| v.trim().to_string()).unwrap_or_default();
        if value.is_empty() {
            self.fail(field, format!("The {field} field is required."));
            return value;
        }
        self.check_length(field, &value);
        value
    }

    /// Like `required_string`, but only when the field was sent.
    pub fn optional_string(&mut self, field: &str, value: Option<String>) -> Option<String> {
        let value = value?.trim().to_string();
        if value.is_empty() {
            self.fail(field, format!("The {field} field must be a string."));
            return None;
        }
        self.check_length(field, &value).then_some(value)
    }

    /// A field that may be left out but not sent as `null`.
    pub fn not_null<T>(&mut self, field: &str, value: Option<Option<T>>, kind: &str) -> Option<T> {
        match value? {
            Some(value) => Some(value),
            None => {
                let label = field.replace('_', " ");
                self.fail(field, format!("The {label} field must be {kind}."));
                None
            }
        }
    }

    pub fn finish(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self.errors))
        }
    }
}

/// Trims a nullable text field; blank becomes null.
pub fn nullable_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
/// Use with `#[serde(default, deserialize_with = "present")]`.
pub fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Body {
        #[serde(default, deserialize_with = "present")]
        description: Option<Option<String>>,
    }

    fn errors(validator: Validator) -> FieldErrors {
        match validator.finish() {
            Err(ApiError::Validation(errors)) => errors,
            other => panic!("expected validation errors, got {other:?}"),
        }
    }

    #[test]
    fn test_required_string_trims() {
        let mut validator = Validator::default();
        let name = validator.required_string("name", Some("  Sprint  ".to_string()));
        assert_eq!(name, "Sprint");
        assert!(validator.finish().is_ok());
    }

    #[test]
    fn test_required_string_rejects_missing_and_blank() {
        let mut validator = Validator::default();
        validator.required_string("name", None);
        validator.required_string("title", Some("   ".to_string()));
        let errors = errors(validator);
        assert_eq!(errors["name"], vec!["The name field is required."]);
        assert_eq!(errors["title"], vec!["The title field is required."]);
    }

    #[test]
    fn test_length_limit_counts_characters() {
        let mut validator = Validator::default();
        validator.required_string("name", Some("é".repeat(255)));
        assert!(validator.finish().is_ok());

        let mut validator = Validator::default();
        validator.required_string("name", Some("x".repeat(256)));
        assert_eq!(
            errors(validator)["name"],
            vec!["The name field must not be greater than 255 characters."]
        );
    }

    #[test]
    fn test_optional_string() {
        let mut validator = Validator::default();
        assert_eq!(validator.optional_string("name", None), None);
        assert_eq!(
            validator.optional_string("name", Some("Done".to_string())),
            Some("Done".to_string())
        );
        assert!(validator.finish().is_ok());

        let mut validator = Validator::default();
        assert_eq!(validator.optional_string("name", Some(String::new())), None);
        assert!(errors(validator).contains_key("name"));
    }

    #[test]
    fn test_not_null_rejects_explicit_null() {
        let mut validator = Validator::default();
        assert_eq!(validator.not_null::<i64>("order", None, "an integer"), None);
        assert_eq!(validator.not_null("order", Some(Some(2_i64)), "an integer"), Some(2));
        assert!(validator.finish().is_ok());

        let mut validator = Validator::default();
        validator.not_null::<i64>("order", Some(None), "an integer");
        validator.not_null::<String>("column_id", Some(None), "a string");
        let errors = errors(validator);
        assert_eq!(errors["order"], vec!["The order field must be an integer."]);
        assert_eq!(errors["column_id"], vec!["The column id field must be a string."]);
    }

    #[test]
    fn test_present_distinguishes_null_from_absent() {
        let absent: Body = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.description, None);

        let null: Body = serde_json::from_str(r#"{"description": null}"#).unwrap();
        assert_eq!(null.description, Some(None));

        let text: Body = serde_json::from_str(r#"{"description": "notes"}"#).unwrap();
        assert_eq!(text.description, Some(Some("notes".to_string())));
    }

    #[test]
    fn test_nullable_text() {
        assert_eq!(nullable_text(Some("  ".to_string())), None);
        assert_eq!(nullable_text(Some(" a ".to_string())), Some("a".to_string()));
        assert_eq!(nullable_text(None), None);
    }
}
