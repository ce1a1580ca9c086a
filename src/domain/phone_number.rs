use std::fmt;

/// North-American calling code applied to bare 10-digit numbers
const COUNTRY_CALLING_CODE: &str = "+1";

/// Minimum digit count the marketing platform will accept for SMS profiles
const SMS_MIN_DIGITS: usize = 10;

/// A best-effort normalized phone number.
///
/// Construction never fails: all non-digit characters are stripped, and a
/// bare 10-digit number gains the `+1` calling code. Any other digit count is
/// kept as-is, digits only. The result is not a guaranteed-valid E.164 number.
#[derive(Debug, PartialEq, Clone)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub fn normalized(raw: &str) -> Self {
        let digits: String = raw.chars().filter(char::is_ascii_digit).collect();

        if digits.len() == 10 {
            Self(format!("{}{}", COUNTRY_CALLING_CODE, digits))
        } else {
            Self(digits)
        }
    }

    /// Whether the number carries enough digits to survive the marketing
    /// platform's stricter SMS validation
    pub fn is_sms_capable(&self) -> bool {
        self.0.chars().filter(char::is_ascii_digit).count() >= SMS_MIN_DIGITS
    }
}

impl AsRef<str> for PhoneNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
