use lazy_static::lazy_static;
use regex::Regex;

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Strip everything that is not a digit ("+91 98765-43210" -> "919876543210").
pub fn normalize_phone(phone: &str) -> String {
    phone.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Indian mobile numbers: exactly 10 digits, first digit 6-9.
pub fn is_valid_phone(phone: &str) -> bool {
    let digits = normalize_phone(phone);
    digits.len() == 10 && matches!(digits.as_bytes()[0], b'6'..=b'9')
}

/// At least 8 characters, one letter and one digit. The Err string is shown
/// to the user as-is.
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters long");
    }
    if !password.chars().any(|c| c.is_alphabetic()) {
        return Err("Password must contain at least one letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain at least one number");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_emails() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("first.last@sub.domain.org"));
        assert!(is_valid_email("user+tag@example.co.in"));
    }

    #[test]
    fn rejects_malformed_emails() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("plainaddress"));
        assert!(!is_valid_email("no domain@x.com"));
        assert!(!is_valid_email("a@b@c.com"));
        assert!(!is_valid_email("a@nodot"));
        assert!(!is_valid_email("a@x .com"));
    }

    #[test]
    fn accepts_indian_mobile_numbers() {
        assert!(is_valid_phone("9876543210"));
        assert!(is_valid_phone("6000000000"));
        assert!(is_valid_phone("7012345678"));
        assert!(is_valid_phone("98765-43210"));
        assert!(is_valid_phone("(987) 654-3210"));
    }

    #[test]
    fn rejects_other_numbers() {
        assert!(!is_valid_phone(""));
        assert!(!is_valid_phone("12345"));
        assert!(!is_valid_phone("5876543210")); // leading 5
        assert!(!is_valid_phone("987654321")); // 9 digits
        assert!(!is_valid_phone("98765432100")); // 11 digits
        assert!(!is_valid_phone("+91 9876543210")); // 12 digits after stripping
    }

    #[test]
    fn normalize_strips_formatting() {
        assert_eq!(normalize_phone("(987) 654-3210"), "9876543210");
        assert_eq!(normalize_phone("abc"), "");
    }

    #[test]
    fn password_rules_report_first_failure() {
        assert_eq!(
            validate_password("short1"),
            Err("Password must be at least 8 characters long")
        );
        assert_eq!(
            validate_password("12345678"),
            Err("Password must contain at least one letter")
        );
        assert_eq!(
            validate_password("longenough"),
            Err("Password must contain at least one number")
        );
        assert_eq!(validate_password("longenough1"), Ok(()));
        assert_eq!(validate_password("abcd1234"), Ok(()));
    }
}
