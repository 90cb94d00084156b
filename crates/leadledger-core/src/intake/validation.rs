//! Submission validation.

use serde_json::Value;

use crate::enquiry::NewEnquiry;
use crate::scoring::score_lead;

/// Longest accepted first or last name.
pub const MAX_NAME_CHARS: usize = 100;
/// Longest accepted email address.
pub const MAX_EMAIL_CHARS: usize = 254;
/// Longest accepted phone number.
pub const MAX_PHONE_CHARS: usize = 30;
/// Longest accepted service or budget label.
pub const MAX_LABEL_CHARS: usize = 100;
/// Shortest accepted message.
pub const MIN_MESSAGE_CHARS: usize = 10;
/// Longest accepted message.
pub const MAX_MESSAGE_CHARS: usize = 5000;

/// Validation error for an enquiry submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// First name is empty.
    EmptyFirstName,
    /// First name is too long.
    FirstNameTooLong,
    /// Last name is empty.
    EmptyLastName,
    /// Last name is too long.
    LastNameTooLong,
    /// Email address is empty.
    EmptyEmail,
    /// Email address format is invalid.
    InvalidEmail,
    /// Email address is too long.
    EmailTooLong,
    /// Phone number is too long.
    PhoneTooLong,
    /// Service label is too long.
    ServiceTooLong,
    /// Budget label is too long.
    BudgetTooLong,
    /// Message is shorter than the minimum.
    MessageTooShort,
    /// Message is longer than the maximum.
    MessageTooLong,
}

impl ValidationError {
    /// Get human-readable error message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::EmptyFirstName => "First name is required",
            Self::FirstNameTooLong => "First name must be at most 100 characters",
            Self::EmptyLastName => "Last name is required",
            Self::LastNameTooLong => "Last name must be at most 100 characters",
            Self::EmptyEmail => "Email address is required",
            Self::InvalidEmail => "Invalid email address format",
            Self::EmailTooLong => "Email address must be at most 254 characters",
            Self::PhoneTooLong => "Phone number must be at most 30 characters",
            Self::ServiceTooLong => "Service must be at most 100 characters",
            Self::BudgetTooLong => "Budget must be at most 100 characters",
            Self::MessageTooShort => "Message must be at least 10 characters",
            Self::MessageTooLong => "Message must be at most 5000 characters",
        }
    }

    /// Get the field name this error relates to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::EmptyFirstName | Self::FirstNameTooLong => "firstName",
            Self::EmptyLastName | Self::LastNameTooLong => "lastName",
            Self::EmptyEmail | Self::InvalidEmail | Self::EmailTooLong => "email",
            Self::PhoneTooLong => "phone",
            Self::ServiceTooLong => "service",
            Self::BudgetTooLong => "budget",
            Self::MessageTooShort | Self::MessageTooLong => "message",
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ValidationError {}

/// Result of validating a submission.
pub type ValidationResult<T> = Result<T, Vec<ValidationError>>;

/// Raw form data as submitted, before any checks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSubmission {
    /// First name.
    pub first_name: Option<String>,
    /// Last name.
    pub last_name: Option<String>,
    /// Email address.
    pub email: Option<String>,
    /// Phone number.
    pub phone: Option<String>,
    /// Service category.
    pub service: Option<String>,
    /// Budget range.
    pub budget: Option<String>,
    /// Message body.
    pub message: Option<String>,
}

impl RawSubmission {
    /// Read a submission from an untyped JSON object.
    ///
    /// Accepts camelCase or `snake_case` keys. Strings are taken as-is,
    /// numbers are converted to text, anything else counts as absent.
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        let field = |keys: &[&str]| keys.iter().find_map(|key| text(value.get(key)?));

        Self {
            first_name: field(&["firstName", "first_name"]),
            last_name: field(&["lastName", "last_name"]),
            email: field(&["email"]),
            phone: field(&["phone"]),
            service: field(&["service"]),
            budget: field(&["budget"]),
            message: field(&["message"]),
        }
    }
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A submission that passed validation, trimmed and normalised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSubmission {
    /// `"{first} {last}"`.
    pub name: String,
    /// Lowercase email address.
    pub email: String,
    /// Phone number.
    pub phone: Option<String>,
    /// Service category.
    pub service: Option<String>,
    /// Budget range.
    pub budget: Option<String>,
    /// Message body.
    pub message: String,
}

impl ValidSubmission {
    /// Score the submission and build the record to store.
    #[must_use]
    pub fn into_new_enquiry(self, created_at: chrono::DateTime<chrono::Utc>) -> NewEnquiry {
        let priority = score_lead(
            self.service.as_deref(),
            self.budget.as_deref(),
            &self.message,
        );

        NewEnquiry {
            name: self.name,
            email: self.email,
            phone: self.phone,
            service: self.service,
            budget: self.budget,
            message: self.message,
            priority,
            created_at,
        }
    }
}

/// Validate a raw submission.
///
/// Returns every failing field, not just the first.
///
/// # Errors
///
/// Returns a vector of `ValidationError` if any fields are invalid.
pub fn validate_submission(raw: &RawSubmission) -> ValidationResult<ValidSubmission> {
    let mut errors = Vec::new();

    let first_name = trimmed(raw.first_name.as_deref());
    let last_name = trimmed(raw.last_name.as_deref());
    let email = trimmed(raw.email.as_deref());
    let phone = trimmed(raw.phone.as_deref());
    let service = trimmed(raw.service.as_deref());
    let budget = trimmed(raw.budget.as_deref());
    let message = trimmed(raw.message.as_deref());

    // Names
    match first_name {
        None => errors.push(ValidationError::EmptyFirstName),
        Some(s) if chars(s) > MAX_NAME_CHARS => errors.push(ValidationError::FirstNameTooLong),
        Some(_) => {}
    }
    match last_name {
        None => errors.push(ValidationError::EmptyLastName),
        Some(s) if chars(s) > MAX_NAME_CHARS => errors.push(ValidationError::LastNameTooLong),
        Some(_) => {}
    }

    // Email
    match email {
        None => errors.push(ValidationError::EmptyEmail),
        Some(s) if chars(s) > MAX_EMAIL_CHARS => errors.push(ValidationError::EmailTooLong),
        Some(s) if !is_valid_email(s) => errors.push(ValidationError::InvalidEmail),
        Some(_) => {}
    }

    // Optional fields
    if phone.is_some_and(|s| chars(s) > MAX_PHONE_CHARS) {
        errors.push(ValidationError::PhoneTooLong);
    }
    if service.is_some_and(|s| chars(s) > MAX_LABEL_CHARS) {
        errors.push(ValidationError::ServiceTooLong);
    }
    if budget.is_some_and(|s| chars(s) > MAX_LABEL_CHARS) {
        errors.push(ValidationError::BudgetTooLong);
    }

    // Message
    let message_len = message.map_or(0, chars);
    if message_len < MIN_MESSAGE_CHARS {
        errors.push(ValidationError::MessageTooShort);
    } else if message_len > MAX_MESSAGE_CHARS {
        errors.push(ValidationError::MessageTooLong);
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(ValidSubmission {
        name: format!(
            "{} {}",
            first_name.unwrap_or_default(),
            last_name.unwrap_or_default()
        ),
        email: email.unwrap_or_default().to_lowercase(),
        phone: phone.map(str::to_string),
        service: service.map(str::to_string),
        budget: budget.map(str::to_string),
        message: message.unwrap_or_default().to_string(),
    })
}

/// Trim a field, treating blank as absent.
fn trimmed(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

fn chars(s: &str) -> usize {
    s.chars().count()
}

/// Basic email validation.
fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    // Must contain exactly one @
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }

    // Domain must be dotted with no empty labels
    domain.contains('.') && domain.split('.').all(|label| !label.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::scoring::Priority;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn valid_raw() -> RawSubmission {
        RawSubmission {
            first_name: Some("  Jane ".to_string()),
            last_name: Some("Citizen".to_string()),
            email: Some("Jane@Example.COM".to_string()),
            phone: Some("  ".to_string()),
            service: Some("Auction Bidding".to_string()),
            budget: None,
            message: Some("We are bidding next Saturday.".to_string()),
        }
    }

    #[test]
    fn test_valid_email() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("user.name+tag@sub.example.com"));
    }

    #[test]
    fn test_invalid_email() {
        assert!(!is_valid_email("user"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@"));
        assert!(!is_valid_email("user@example"));
        assert!(!is_valid_email("user@@example.com"));
        assert!(!is_valid_email("user@example..com"));
        assert!(!is_valid_email("us er@example.com"));
    }

    #[test]
    fn test_normalises_valid_submission() {
        let valid = validate_submission(&valid_raw()).unwrap();

        assert_eq!(valid.name, "Jane Citizen");
        assert_eq!(valid.email, "jane@example.com");
        assert_eq!(valid.phone, None);
        assert_eq!(valid.service.as_deref(), Some("Auction Bidding"));
    }

    #[test]
    fn test_collects_all_errors() {
        let errors = validate_submission(&RawSubmission::default()).unwrap_err();

        assert!(errors.contains(&ValidationError::EmptyFirstName));
        assert!(errors.contains(&ValidationError::EmptyLastName));
        assert!(errors.contains(&ValidationError::EmptyEmail));
        assert!(errors.contains(&ValidationError::MessageTooShort));
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn test_message_bounds() {
        let mut raw = valid_raw();
        raw.message = Some("123456789".to_string());
        assert_eq!(
            validate_submission(&raw).unwrap_err(),
            vec![ValidationError::MessageTooShort]
        );

        raw.message = Some("1234567890".to_string());
        assert!(validate_submission(&raw).is_ok());

        raw.message = Some("x".repeat(MAX_MESSAGE_CHARS));
        assert!(validate_submission(&raw).is_ok());

        raw.message = Some("x".repeat(MAX_MESSAGE_CHARS + 1));
        assert_eq!(
            validate_submission(&raw).unwrap_err(),
            vec![ValidationError::MessageTooLong]
        );
    }

    #[test]
    fn test_optional_field_lengths() {
        let mut raw = valid_raw();
        raw.phone = Some("1".repeat(31));
        raw.budget = Some("$".repeat(101));
        let errors = validate_submission(&raw).unwrap_err();

        assert_eq!(
            errors,
            vec![ValidationError::PhoneTooLong, ValidationError::BudgetTooLong]
        );
        assert_eq!(errors[0].field(), "phone");
    }

    #[test]
    fn test_from_json_accepts_either_case_and_numbers() {
        let raw = RawSubmission::from_json(&json!({
            "first_name": "Jane",
            "lastName": "Citizen",
            "email": "jane@example.com",
            "phone": 400_000_000,
            "service": ["not", "text"],
            "message": "Please call me back."
        }));

        assert_eq!(raw.first_name.as_deref(), Some("Jane"));
        assert_eq!(raw.last_name.as_deref(), Some("Citizen"));
        assert_eq!(raw.phone.as_deref(), Some("400000000"));
        assert_eq!(raw.service, None);
    }

    #[test]
    fn test_into_new_enquiry_scores() {
        let created = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let enquiry = validate_submission(&valid_raw())
            .unwrap()
            .into_new_enquiry(created);

        assert_eq!(enquiry.priority, Priority::Warm);
        assert_eq!(enquiry.created_at, created);
    }
}
