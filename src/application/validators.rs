use validator::ValidateEmail;

/// Validates that the input looks like a valid email address
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    !email.is_empty() && email.validate_email()
}

/// Validates a plan display name.
/// Rules:
/// - 1-100 characters after trimming
/// - No control characters
pub fn is_valid_plan_name(name: &str) -> bool {
    let name = name.trim();
    !name.is_empty() && name.chars().count() <= 100 && !name.chars().any(|c| c.is_control())
}

/// Prices are finite and non-negative.
pub fn is_valid_price(price: f64) -> bool {
    price.is_finite() && price >= 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_emails() {
        assert!(is_valid_email("test@example.com"));
        assert!(is_valid_email("user.name@domain.co.uk"));
        assert!(is_valid_email("user+tag@example.org"));
    }

    #[test]
    fn test_invalid_emails() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("   "));
        assert!(!is_valid_email("notanemail"));
        assert!(!is_valid_email("@nodomain.com"));
    }

    #[test]
    fn test_plan_names() {
        assert!(is_valid_plan_name("Basic"));
        assert!(is_valid_plan_name("Pro (yearly)"));
        assert!(!is_valid_plan_name(""));
        assert!(!is_valid_plan_name("   "));
        assert!(!is_valid_plan_name("bad\nname"));
        assert!(!is_valid_plan_name(&"a".repeat(101)));
    }

    #[test]
    fn test_prices() {
        assert!(is_valid_price(0.0));
        assert!(is_valid_price(1200.0));
        assert!(!is_valid_price(-0.01));
        assert!(!is_valid_price(f64::NAN));
        assert!(!is_valid_price(f64::INFINITY));
    }
}
