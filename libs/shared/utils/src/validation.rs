use std::sync::OnceLock;

use regex::Regex;

pub const MIN_PASSWORD_LENGTH: usize = 8;

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap())
}

fn phone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\+?[0-9][0-9 \-()]{6,19}$").unwrap())
}

// Calendar-date slot keys, e.g. "15_08_2024".
fn slot_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{1,2}_\d{1,2}_\d{4}$").unwrap())
}

pub fn is_valid_email(email: &str) -> bool {
    email_re().is_match(email)
}

pub fn is_valid_phone(phone: &str) -> bool {
    phone_re().is_match(phone)
}

pub fn is_valid_slot_date(slot_date: &str) -> bool {
    slot_date_re().is_match(slot_date)
}

pub fn is_strong_password(password: &str) -> bool {
    password.len() >= MIN_PASSWORD_LENGTH
}

pub const GENDERS: &[&str] = &["male", "female", "other", "prefer-not-to-say"];

pub const BLOOD_GROUPS: &[&str] = &["A+", "A-", "B+", "B-", "AB+", "AB-", "O+", "O-"];

pub fn is_valid_gender(gender: &str) -> bool {
    GENDERS.contains(&gender)
}

pub fn is_valid_blood_group(blood_group: &str) -> bool {
    BLOOD_GROUPS.contains(&blood_group)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_formats() {
        assert!(is_valid_email("jane.doe@example.com"));
        assert!(!is_valid_email("jane.doe"));
        assert!(!is_valid_email("jane @example.com"));
    }

    #[test]
    fn phone_formats() {
        assert!(is_valid_phone("+353 86 123 4567"));
        assert!(is_valid_phone("0861234567"));
        assert!(!is_valid_phone("abc"));
        assert!(!is_valid_phone("12"));
    }

    #[test]
    fn slot_date_keys() {
        assert!(is_valid_slot_date("15_08_2024"));
        assert!(is_valid_slot_date("1_1_2025"));
        assert!(!is_valid_slot_date("2024-08-15"));
        assert!(!is_valid_slot_date("15/08/2024"));
    }

    #[test]
    fn whitelists() {
        assert!(is_valid_gender("female"));
        assert!(!is_valid_gender("unknown"));
        assert!(is_valid_blood_group("O-"));
        assert!(!is_valid_blood_group("C+"));
    }
}
