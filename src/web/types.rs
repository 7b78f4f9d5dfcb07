//! Most of the structs in `web` module and their implementations live here.
//! Includes the signup submission, its validated form, the parsing implementations and tests for those.

use lazy_regex::regex_is_match;
use serde::Deserialize;

// ###################################
// ->   STRUCTS
// ###################################
/// Deserializable Signup
/// The raw body of a signup request. Every field is optional so that absent or `null`
/// fields are reported as missing instead of failing the JSON extraction.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeserSignup {
    pub first_name: Option<String>,
    pub phone: Option<String>,
    pub postcode: Option<String>,
}

/// Validated Signup
/// A Signup with all the fields validated and the phone number normalized.
#[derive(Debug, Clone)]
pub struct ValidSignup {
    pub first_name: FirstName,
    pub phone: PhoneNumber,
    pub postcode: Postcode,
}

impl TryFrom<DeserSignup> for ValidSignup {
    type Error = DataParsingError;

    /// Presence of all three fields is checked before the postcode format,
    /// so a request missing any field is always reported as `MissingFields`.
    fn try_from(deser: DeserSignup) -> Result<Self, Self::Error> {
        let (Some(first_name), Some(phone), Some(postcode)) = (
            non_blank(deser.first_name),
            non_blank(deser.phone),
            non_blank(deser.postcode),
        ) else {
            return Err(DataParsingError::MissingFields);
        };

        Ok(ValidSignup {
            postcode: Postcode::parse(postcode)?,
            first_name: FirstName::parse(first_name)?,
            phone: PhoneNumber::normalize(phone),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Validated first name, trimmed of surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirstName(String);

impl AsRef<str> for FirstName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FirstName {
    pub fn parse<S>(value: S) -> Result<Self, DataParsingError>
    where
        S: AsRef<str>,
    {
        let value = value.as_ref().trim();
        if value.is_empty() {
            return Err(DataParsingError::MissingFields);
        }

        Ok(FirstName(value.to_owned()))
    }
}

/// Australian postcode: exactly four ASCII digits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Postcode(String);

impl AsRef<str> for Postcode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Postcode {
    pub fn parse<S>(value: S) -> Result<Self, DataParsingError>
    where
        S: AsRef<str>,
    {
        let value = value.as_ref();
        if !regex_is_match!(r"^[0-9]{4}$", value) {
            return Err(DataParsingError::InvalidPostcode);
        }

        Ok(Postcode(value.to_owned()))
    }
}

/// Phone number in an E.164-like form, assuming Australian numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneNumber(String);

impl AsRef<str> for PhoneNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PhoneNumber {
    pub const COUNTRY_CODE: &'static str = "+61";

    /// Keeps only digits and `+`, then swaps a leading trunk `0` for the country code
    /// or prefixes the country code when there is no leading `+`.
    ///
    /// The digit count and numbering plan of the result are not checked.
    pub fn normalize<S>(value: S) -> Self
    where
        S: AsRef<str>,
    {
        let cleaned: String = value
            .as_ref()
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '+')
            .collect();

        let normalized = if let Some(local) = cleaned.strip_prefix('0') {
            format!("{}{local}", Self::COUNTRY_CODE)
        } else if !cleaned.starts_with('+') {
            format!("{}{cleaned}", Self::COUNTRY_CODE)
        } else {
            cleaned
        };

        PhoneNumber(normalized)
    }
}

// ###################################
// ->   ERROR
// ###################################
#[derive(Debug, thiserror::Error)]
pub enum DataParsingError {
    #[error("missing required fields")]
    MissingFields,
    #[error("postcode must be exactly four digits")]
    InvalidPostcode,
}
