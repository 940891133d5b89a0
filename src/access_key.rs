//! SRI access keys (clave de acceso).
//!
//! A key is 48 digits of document data followed by a modulo 11 check digit:
//!
//! | digits | field |
//! |---|---|
//! | 1-8 | emission date, `ddmmyyyy` |
//! | 9-10 | document type code |
//! | 11-23 | issuer RUC |
//! | 24-25 | environment, `01` test or `02` production |
//! | 26-28 | establishment |
//! | 29-31 | emission point |
//! | 32-40 | sequential number |
//! | 41-48 | numeric code |
//! | 49 | check digit |

use chrono::NaiveDate;
use rand::Rng;

use crate::document::DocumentType;

pub const ACCESS_KEY_LENGTH: usize = 49;

const DATE_FORMAT: &str = "%d%m%Y";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessKeyError {
    #[error("{field} must be exactly {expected} digits, got {actual}")]
    InvalidLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{field} must contain only digits")]
    NonNumeric { field: &'static str },

    #[error("environment must be \"01\" (test) or \"02\" (production), got \"{0}\"")]
    InvalidEnvironment(String),

    #[error("document type must be one of 01, 03, 04, 05, 06, 07, got \"{0}\"")]
    InvalidDocumentType(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AccessKeyComponents {
    /// Emission date as `ddmmyyyy`
    pub date: String,
    pub document_type: String,
    pub ruc: String,
    pub environment: String,
    pub establishment: String,
    pub emission_point: String,
    pub sequential: String,
    /// Generated at random when missing
    pub numeric_code: Option<String>,
}

impl AccessKeyComponents {
    pub fn set_date(&mut self, date: NaiveDate) {
        self.date = date.format(DATE_FORMAT).to_string();
    }

    pub fn set_document_type(&mut self, document_type: DocumentType) {
        self.document_type = document_type.code().to_owned();
    }
}

/// Fields of a well-formed access key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAccessKey {
    pub date: String,
    pub document_type: String,
    pub ruc: String,
    pub environment: String,
    pub establishment: String,
    pub emission_point: String,
    pub sequential: String,
    pub numeric_code: String,
    pub check_digit: u8,
}

impl ParsedAccessKey {
    pub fn emission_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, DATE_FORMAT).ok()
    }

    pub fn document_type(&self) -> Option<DocumentType> {
        DocumentType::from_code(&self.document_type)
    }
}

fn check_numeric(value: &str, expected: usize, field: &'static str) -> Result<(), AccessKeyError> {
    if value.len() != expected {
        return Err(AccessKeyError::InvalidLength {
            field,
            expected,
            actual: value.chars().count(),
        });
    }
    if !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AccessKeyError::NonNumeric { field });
    }
    Ok(())
}

/// Modulo 11 check digit of the first 48 digits.
///
/// Weights 2 through 7 are applied cyclically starting from the rightmost
/// digit; a result of 11 maps to 0 and 10 maps to 1.
pub fn check_digit(digits: &str) -> Result<u8, AccessKeyError> {
    check_numeric(digits, ACCESS_KEY_LENGTH - 1, "access key without check digit")?;

    let sum: u32 = digits
        .bytes()
        .rev()
        .zip([2u32, 3, 4, 5, 6, 7].into_iter().cycle())
        .map(|(digit, weight)| u32::from(digit - b'0') * weight)
        .sum();

    Ok(match 11 - sum % 11 {
        11 => 0,
        10 => 1,
        digit => digit as u8,
    })
}

/// Build a complete 49-digit access key
pub fn generate(components: &AccessKeyComponents) -> Result<String, AccessKeyError> {
    check_numeric(&components.date, 8, "date")?;
    check_numeric(&components.document_type, 2, "document type")?;
    check_numeric(&components.ruc, 13, "ruc")?;
    check_numeric(&components.environment, 2, "environment")?;
    check_numeric(&components.establishment, 3, "establishment")?;
    check_numeric(&components.emission_point, 3, "emission point")?;
    check_numeric(&components.sequential, 9, "sequential")?;

    if !matches!(components.environment.as_str(), "01" | "02") {
        return Err(AccessKeyError::InvalidEnvironment(components.environment.clone()));
    }
    if DocumentType::from_code(&components.document_type).is_none() {
        return Err(AccessKeyError::InvalidDocumentType(components.document_type.clone()));
    }

    let numeric_code = match &components.numeric_code {
        Some(code) => {
            check_numeric(code, 8, "numeric code")?;
            code.clone()
        }
        None => random_numeric_code(),
    };

    let mut key = String::with_capacity(ACCESS_KEY_LENGTH);
    key.push_str(&components.date);
    key.push_str(&components.document_type);
    key.push_str(&components.ruc);
    key.push_str(&components.environment);
    key.push_str(&components.establishment);
    key.push_str(&components.emission_point);
    key.push_str(&components.sequential);
    key.push_str(&numeric_code);

    let digit = check_digit(&key)?;
    key.push(char::from(b'0' + digit));
    Ok(key)
}

fn random_numeric_code() -> String {
    rand::rng().random_range(10_000_000u32..=99_999_999).to_string()
}

/// Whether `key` has 49 digits and a correct check digit
pub fn validate(key: &str) -> bool {
    if key.len() != ACCESS_KEY_LENGTH || !key.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let (digits, provided) = key.split_at(ACCESS_KEY_LENGTH - 1);
    check_digit(digits).is_ok_and(|expected| provided.as_bytes()[0] - b'0' == expected)
}

/// Split a 49-digit key into its fields. The check digit is not verified.
pub fn parse(key: &str) -> Result<ParsedAccessKey, AccessKeyError> {
    check_numeric(key, ACCESS_KEY_LENGTH, "access key")?;

    Ok(ParsedAccessKey {
        date: key[0..8].to_owned(),
        document_type: key[8..10].to_owned(),
        ruc: key[10..23].to_owned(),
        environment: key[23..25].to_owned(),
        establishment: key[25..28].to_owned(),
        emission_point: key[28..31].to_owned(),
        sequential: key[31..40].to_owned(),
        numeric_code: key[40..48].to_owned(),
        check_digit: key.as_bytes()[48] - b'0',
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn components() -> AccessKeyComponents {
        AccessKeyComponents {
            date: "18042024".into(),
            document_type: "01".into(),
            ruc: "1792123456001".into(),
            environment: "01".into(),
            establishment: "001".into(),
            emission_point: "001".into(),
            sequential: "000000005".into(),
            numeric_code: Some("12345678".into()),
        }
    }

    #[test]
    fn test_check_digit() {
        assert_eq!(check_digit("180420240117921234560010100100100000000512345678"), Ok(4));
        assert_eq!(check_digit("141020260409900000000010200201000000123487654321"), Ok(2));
    }

    #[test]
    fn test_check_digit_special_cases() {
        // remainder 0 gives 11, remainder 1 gives 10
        assert_eq!(check_digit("180420240117921234560010100100100000000512340001"), Ok(0));
        assert_eq!(check_digit("180420240117921234560010100100100000000512340007"), Ok(1));
    }

    #[test]
    fn test_check_digit_rejects_bad_input() {
        assert!(matches!(
            check_digit("123"),
            Err(AccessKeyError::InvalidLength { expected: 48, actual: 3, .. })
        ));
        assert!(matches!(
            check_digit(&"a".repeat(48)),
            Err(AccessKeyError::NonNumeric { .. })
        ));
    }

    #[test]
    fn test_generate() {
        let key = generate(&components()).unwrap();
        assert_eq!(key, "1804202401179212345600101001001000000005123456784");
        assert!(validate(&key));
    }

    #[test]
    fn test_generate_random_numeric_code() {
        let mut components = components();
        components.numeric_code = None;

        let key = generate(&components).unwrap();
        assert_eq!(key.len(), ACCESS_KEY_LENGTH);
        assert!(validate(&key));

        let code: u32 = parse(&key).unwrap().numeric_code.parse().unwrap();
        assert!((10_000_000..=99_999_999).contains(&code));
    }

    #[test]
    fn test_generate_rejects_invalid_components() {
        let mut bad = components();
        bad.environment = "03".into();
        assert_eq!(generate(&bad), Err(AccessKeyError::InvalidEnvironment("03".into())));

        let mut bad = components();
        bad.document_type = "02".into();
        assert_eq!(generate(&bad), Err(AccessKeyError::InvalidDocumentType("02".into())));

        let mut bad = components();
        bad.ruc = "179212345600".into();
        assert_eq!(
            generate(&bad),
            Err(AccessKeyError::InvalidLength {
                field: "ruc",
                expected: 13,
                actual: 12
            })
        );

        let mut bad = components();
        bad.numeric_code = Some("1234567x".into());
        assert_eq!(
            generate(&bad),
            Err(AccessKeyError::NonNumeric { field: "numeric code" })
        );
    }

    #[test]
    fn test_typed_setters() {
        let mut components = components();
        components.set_date(NaiveDate::from_ymd_opt(2026, 10, 14).unwrap());
        components.set_document_type(DocumentType::NotaCredito);
        assert_eq!(components.date, "14102026");
        assert_eq!(components.document_type, "04");
    }

    #[test]
    fn test_validate() {
        assert!(validate("1804202401179212345600101001001000000005123456784"));
        assert!(!validate("1804202401179212345600101001001000000005123456785"));
        assert!(!validate("180420240117921234560010100100100000000512345678"));
        assert!(!validate("180420240117921234560010100100100000000512345678a"));
    }

    #[test]
    fn test_parse() {
        let parsed = parse("1804202401179212345600101001001000000005123456784").unwrap();
        assert_eq!(
            parsed,
            ParsedAccessKey {
                date: "18042024".into(),
                document_type: "01".into(),
                ruc: "1792123456001".into(),
                environment: "01".into(),
                establishment: "001".into(),
                emission_point: "001".into(),
                sequential: "000000005".into(),
                numeric_code: "12345678".into(),
                check_digit: 4,
            }
        );
        assert_eq!(parsed.emission_date(), NaiveDate::from_ymd_opt(2024, 4, 18));
        assert_eq!(parsed.document_type(), Some(DocumentType::Factura));
        assert!(parse("12").is_err());
    }
}
