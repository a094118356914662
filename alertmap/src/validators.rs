use std::sync::LazyLock;

use email_address::EmailAddress;
use regex::Regex;
use url::Url;

use crate::{
    catalog::CategoryCatalog,
    errors::{ValidationError, ValidationIssue, ValidationResult},
    types::{AlertPatch, NewAlert, NewUser, ProfileContact},
};

pub const TITLE_MAX_LEN: usize = 200;
pub const ADDRESS_MAX_LEN: usize = 255;
pub const PHONE_MAX_LEN: usize = 15;
pub const COMMENT_MAX_LEN: usize = 2000;
pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 150;

static USERNAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.@+-]+$").expect("username pattern compiles"));
static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9+()\- ]*$").expect("phone pattern compiles"));

/// Returns `true` if the provided string is a syntactically valid email address.
pub fn is_valid_email(value: &str) -> bool {
    EmailAddress::is_valid(value)
}

/// Returns `true` if the provided string parses as a URL with a scheme.
pub fn is_valid_url(value: &str) -> bool {
    Url::parse(value).is_ok()
}

fn check_length(field: &str, value: &str, min: usize, max: usize, issues: &mut Vec<ValidationIssue>) {
    let len = value.chars().count();
    if len < min {
        let message = if min == 1 {
            "field is required".to_string()
        } else {
            format!("length must be at least {min}")
        };
        let code = if min == 1 { "validation.required" } else { "validation.length" };
        issues.push(ValidationIssue::new(field, code, message));
    } else if len > max {
        issues.push(ValidationIssue::new(
            field,
            "validation.length",
            format!("length must be at most {max}"),
        ));
    }
}

fn check_range(field: &str, value: f64, min: f64, max: f64, issues: &mut Vec<ValidationIssue>) {
    if !value.is_finite() || value < min || value > max {
        issues.push(ValidationIssue::new(
            field,
            "validation.range",
            format!("value must be between {min} and {max}"),
        ));
    }
}

fn check_category(catalog: &CategoryCatalog, key: &str, issues: &mut Vec<ValidationIssue>) {
    if key.is_empty() {
        issues.push(ValidationIssue::new("category", "validation.required", "field is required"));
    } else if !catalog.contains(key) {
        issues.push(ValidationIssue::new(
            "category",
            "validation.enum",
            format!("unknown category '{key}'"),
        ));
    }
}

fn finish(issues: Vec<ValidationIssue>) -> ValidationResult<()> {
    if issues.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::new(issues))
    }
}

pub fn validate_coordinates(latitude: f64, longitude: f64) -> ValidationResult<()> {
    let mut issues = Vec::new();
    check_range("latitude", latitude, -90.0, 90.0, &mut issues);
    check_range("longitude", longitude, -180.0, 180.0, &mut issues);
    finish(issues)
}

pub fn validate_new_user(input: &NewUser) -> ValidationResult<()> {
    let mut issues = Vec::new();
    check_length("username", &input.username, USERNAME_MIN_LEN, USERNAME_MAX_LEN, &mut issues);
    if !input.username.is_empty() && !USERNAME_PATTERN.is_match(&input.username) {
        issues.push(ValidationIssue::new(
            "username",
            "validation.regex",
            "username may only contain letters, digits and @/./+/-/_",
        ));
    }
    if !is_valid_email(&input.email) {
        issues.push(ValidationIssue::new(
            "email",
            "validation.email",
            "value must be a valid email address",
        ));
    }
    check_length("first_name", &input.first_name, 0, 150, &mut issues);
    check_length("last_name", &input.last_name, 0, 150, &mut issues);
    finish(issues)
}

pub fn validate_new_alert(catalog: &CategoryCatalog, input: &NewAlert) -> ValidationResult<()> {
    let mut issues = Vec::new();
    check_category(catalog, &input.category, &mut issues);
    check_length("title", input.title.trim(), 1, TITLE_MAX_LEN, &mut issues);
    check_length("description", input.description.trim(), 1, usize::MAX, &mut issues);
    check_range("latitude", input.latitude, -90.0, 90.0, &mut issues);
    check_range("longitude", input.longitude, -180.0, 180.0, &mut issues);
    check_length("address", &input.address, 0, ADDRESS_MAX_LEN, &mut issues);
    finish(issues)
}

pub fn validate_alert_patch(catalog: &CategoryCatalog, patch: &AlertPatch) -> ValidationResult<()> {
    if patch.is_empty() {
        return Err(ValidationError::single(
            "__patch",
            "validation.empty",
            "at least one field must be provided",
        ));
    }
    let mut issues = Vec::new();
    if let Some(category) = &patch.category {
        check_category(catalog, category, &mut issues);
    }
    if let Some(title) = &patch.title {
        check_length("title", title.trim(), 1, TITLE_MAX_LEN, &mut issues);
    }
    if let Some(description) = &patch.description {
        check_length("description", description.trim(), 1, usize::MAX, &mut issues);
    }
    if let Some(latitude) = patch.latitude {
        check_range("latitude", latitude, -90.0, 90.0, &mut issues);
    }
    if let Some(longitude) = patch.longitude {
        check_range("longitude", longitude, -180.0, 180.0, &mut issues);
    }
    if let Some(address) = &patch.address {
        check_length("address", address, 0, ADDRESS_MAX_LEN, &mut issues);
    }
    finish(issues)
}

pub fn validate_comment_text(text: &str) -> ValidationResult<()> {
    let mut issues = Vec::new();
    check_length("text", text.trim(), 1, COMMENT_MAX_LEN, &mut issues);
    finish(issues)
}

pub fn validate_profile_contact(contact: &ProfileContact) -> ValidationResult<()> {
    let mut issues = Vec::new();
    if let Some(phone) = &contact.phone {
        check_length("phone", phone, 0, PHONE_MAX_LEN, &mut issues);
        if !PHONE_PATTERN.is_match(phone) {
            issues.push(ValidationIssue::new(
                "phone",
                "validation.regex",
                "phone may only contain digits, spaces and +-()",
            ));
        }
    }
    if let Some(avatar) = &contact.avatar
        && !avatar.is_empty()
        && !is_valid_url(avatar)
    {
        issues.push(ValidationIssue::new("avatar", "validation.url", "value must be a valid URL"));
    }
    finish(issues)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flooding(title: &str) -> NewAlert {
        NewAlert {
            category: "flooding".into(),
            title: title.into(),
            description: "Water over the road".into(),
            latitude: 4.65,
            longitude: -74.05,
            address: String::new(),
            image: None,
        }
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("test@example.com"));
        assert!(!is_valid_email("invalid"));
    }

    #[test]
    fn url_validation() {
        assert!(is_valid_url("https://example.com/a.png"));
        assert!(!is_valid_url("not-a-url"));
    }

    #[test]
    fn accepts_well_formed_alert() {
        assert!(validate_new_alert(&CategoryCatalog::builtin(), &flooding("Flooded")).is_ok());
    }

    #[test]
    fn rejects_unknown_category_and_blank_title() {
        let mut input = flooding("   ");
        input.category = "volcano".into();
        let err = validate_new_alert(&CategoryCatalog::builtin(), &input).unwrap_err();
        let fields: Vec<&str> = err.issues.iter().map(|issue| issue.field.as_str()).collect();
        assert_eq!(fields, vec!["category", "title"]);
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        let mut input = flooding("Flooded");
        input.latitude = 91.0;
        input.longitude = f64::NAN;
        let err = validate_new_alert(&CategoryCatalog::builtin(), &input).unwrap_err();
        assert_eq!(err.issues.len(), 2);
        assert!(err.issues.iter().all(|issue| issue.code == "validation.range"));
    }

    #[test]
    fn title_length_is_bounded() {
        let long = "x".repeat(TITLE_MAX_LEN + 1);
        let err = validate_new_alert(&CategoryCatalog::builtin(), &flooding(&long)).unwrap_err();
        assert_eq!(err.issues[0].code, "validation.length");
    }

    #[test]
    fn empty_patch_is_rejected() {
        let err = validate_alert_patch(&CategoryCatalog::builtin(), &AlertPatch::default()).unwrap_err();
        assert_eq!(err.issues[0].code, "validation.empty");
    }

    #[test]
    fn comment_text_must_not_be_blank() {
        assert!(validate_comment_text("still flooded").is_ok());
        let err = validate_comment_text("  \n ").unwrap_err();
        assert_eq!(err.issues[0].code, "validation.required");
    }

    #[test]
    fn username_rules() {
        let mut input = NewUser {
            username: "ana.maria".into(),
            email: "ana@example.com".into(),
            ..Default::default()
        };
        assert!(validate_new_user(&input).is_ok());
        input.username = "ana maria".into();
        assert!(validate_new_user(&input).is_err());
        input.username = "an".into();
        assert!(validate_new_user(&input).is_err());
    }

    #[test]
    fn profile_contact_rules() {
        let ok = ProfileContact {
            phone: Some("+57 (1) 5550101".into()),
            avatar: Some("https://cdn.example.com/a.png".into()),
        };
        assert!(validate_profile_contact(&ok).is_ok());
        let clearing = ProfileContact {
            phone: None,
            avatar: Some(String::new()),
        };
        assert!(validate_profile_contact(&clearing).is_ok());
        let bad = ProfileContact {
            phone: Some("call me maybe".into()),
            avatar: Some("nope".into()),
        };
        assert_eq!(validate_profile_contact(&bad).unwrap_err().issues.len(), 2);
    }
}
