//! Phone Number Value Object
//!
//! Numbers are parsed with the libphonenumber metadata and stored in E.164.
//! The verification provider addresses a phone by country calling code and
//! national number, so both parts are kept alongside the E.164 form.

use kernel::validation::ErrorDetail;
use phonenumber::Mode;

pub const INVALID_PHONE_MESSAGE: &str = "Enter a valid phone number.";

/// Validated international phone number
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhoneNumber {
    e164: String,
    country_code: u16,
    national: String,
}

impl PhoneNumber {
    /// Parse an international number (`+` prefix required)
    pub fn parse(raw: &str) -> Result<Self, ErrorDetail> {
        let invalid = || ErrorDetail::invalid(INVALID_PHONE_MESSAGE);

        let raw = raw.trim();
        if !raw.starts_with('+') {
            return Err(invalid());
        }

        let number = phonenumber::parse(None, raw).map_err(|_| invalid())?;
        if !phonenumber::is_valid(&number) {
            return Err(invalid());
        }

        Ok(Self {
            e164: number.format().mode(Mode::E164).to_string(),
            country_code: number.code().value(),
            national: number.national().value().to_string(),
        })
    }

    /// Compose a country calling code (`"+12"` or `"12"`) and national
    /// digits into a number
    pub fn compose(country_code: &str, national: &str) -> Result<Self, ErrorDetail> {
        let code = country_code.trim().trim_start_matches('+');
        if code.is_empty() || code.len() > 3 || !code.chars().all(|c| c.is_ascii_digit()) {
            return Err(ErrorDetail::invalid(INVALID_PHONE_MESSAGE));
        }

        let digits: String = national
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '(' | ')' | '.'))
            .collect();
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(ErrorDetail::invalid(INVALID_PHONE_MESSAGE));
        }

        Self::parse(&format!("+{code}{digits}"))
    }

    /// Accept either a full E.164 number or national digits plus a code
    pub fn from_parts(phone_number: &str, country_code: Option<&str>) -> Result<Self, ErrorDetail> {
        match country_code {
            Some(code) if !phone_number.trim().starts_with('+') => {
                Self::compose(code, phone_number)
            }
            _ => Self::parse(phone_number),
        }
    }

    /// Create from database value
    pub fn from_db(e164: &str) -> Result<Self, ErrorDetail> {
        Self::parse(e164)
    }

    pub fn as_str(&self) -> &str {
        &self.e164
    }

    pub fn country_code(&self) -> u16 {
        self.country_code
    }

    pub fn national_number(&self) -> &str {
        &self.national
    }
}

impl std::fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.e164)
    }
}
