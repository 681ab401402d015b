//! Vocabulary and value validators for PII detection
//!
//! Field-name knowledge lives in a TOML vocabulary so deployments can extend
//! it without a rebuild; value-shape knowledge lives in the compiled
//! validators below.

use super::PiiType;
use crate::domain::{parse_date, Result, SieveError};
use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;

const BUILTIN_VOCABULARY: &str = include_str!("../../../../patterns/pii_vocabulary.toml");

/// Score for a field name listed verbatim in the vocabulary
pub const EXACT_NAME_SCORE: f64 = 0.8;
/// Score for a field name containing a vocabulary token
pub const TOKEN_NAME_SCORE: f64 = 0.6;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$").expect("email regex is valid")
});

static SSN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{3}-\d{2}-\d{4}$").expect("ssn regex is valid"));

static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[\d\s().\-]{7,24}$").expect("phone regex is valid"));

static PERSON_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z][a-z]+(?:[ '\-][A-Z][a-z]+){1,2}$").expect("person name regex is valid")
});

static STREET_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\d+[A-Za-z]?\s+[\w .'\-]+\b(street|st|avenue|ave|road|rd|lane|ln|boulevard|blvd|drive|dr|court|ct|way|place|pl)\b",
    )
    .expect("street address regex is valid")
});

static UUID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$")
        .expect("uuid regex is valid")
});

/// Terms for one PII type
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TermDefinition {
    /// Normalised field names that match outright
    #[serde(default)]
    pub exact: Vec<String>,
    /// Tokens that match anywhere in a field name
    #[serde(default)]
    pub tokens: Vec<String>,
    /// Tokens that rule the type out
    #[serde(default)]
    pub exclude: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct VocabularyFile {
    types: HashMap<String, TermDefinition>,
}

/// Field-name vocabulary keyed by PII type
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    terms: BTreeMap<PiiType, TermDefinition>,
}

impl Vocabulary {
    /// Load a vocabulary from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            SieveError::Configuration(format!(
                "Failed to read vocabulary {}: {e}",
                path.as_ref().display()
            ))
        })?;
        Self::from_toml(&content)
    }

    /// Parse a vocabulary from TOML content
    pub fn from_toml(content: &str) -> Result<Self> {
        let file: VocabularyFile = toml::from_str(content)?;

        let mut terms = BTreeMap::new();
        for (name, mut definition) in file.types {
            let pii_type = PiiType::from_str(&name).map_err(|_| {
                SieveError::Configuration(format!("Unknown PII type in vocabulary: {name}"))
            })?;
            for list in [
                &mut definition.exact,
                &mut definition.tokens,
                &mut definition.exclude,
            ] {
                for term in list.iter_mut() {
                    *term = term.to_lowercase();
                }
            }
            terms.insert(pii_type, definition);
        }

        Ok(Self { terms })
    }

    /// The vocabulary shipped with the crate
    pub fn builtin() -> Self {
        Self::from_toml(BUILTIN_VOCABULARY).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Built-in PII vocabulary failed to parse");
            Self::default()
        })
    }

    /// Replace or add the terms for one type
    pub fn with_terms(mut self, pii_type: PiiType, definition: TermDefinition) -> Self {
        self.terms.insert(pii_type, definition);
        self
    }

    /// Score a field name for one PII type
    pub fn name_score(&self, pii_type: PiiType, field: &str) -> f64 {
        let Some(definition) = self.terms.get(&pii_type) else {
            return 0.0;
        };

        let tokens = field_tokens(field);
        if tokens.iter().any(|t| definition.exclude.contains(t)) {
            return 0.0;
        }

        let normalised = tokens.join("_");
        if definition.exact.contains(&normalised) {
            EXACT_NAME_SCORE
        } else if tokens.iter().any(|t| definition.tokens.contains(t)) {
            TOKEN_NAME_SCORE
        } else {
            0.0
        }
    }
}

/// Split a field name into lowercase tokens
///
/// Separators, camelCase humps and letter/digit boundaries all split:
/// `billingAddress2` becomes `["billing", "address", "2"]`.
pub fn field_tokens(field: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut prev: Option<char> = None;

    for c in field.chars() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            prev = None;
            continue;
        }

        if let Some(p) = prev {
            let hump = p.is_lowercase() && c.is_uppercase();
            let digit_edge = p.is_ascii_digit() != c.is_ascii_digit();
            if (hump || digit_edge) && !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
        }

        current.extend(c.to_lowercase());
        prev = Some(c);
    }

    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Whether text is an email address
pub fn is_email(text: &str) -> bool {
    EMAIL.is_match(text.trim())
}

/// Whether text is a US social security number
pub fn is_ssn(text: &str) -> bool {
    SSN.is_match(text.trim())
}

/// Whether text looks like a phone number
///
/// Bare digit runs and dates are rejected; a phone needs a leading `+` or a
/// separator.
pub fn is_phone(text: &str) -> bool {
    let text = text.trim();
    if !PHONE.is_match(text) || parse_date(text).is_some() {
        return false;
    }
    let digits = text.chars().filter(|c| c.is_ascii_digit()).count();
    let formatted = text.starts_with('+') || text.chars().any(|c| " ().-".contains(c));
    (7..=15).contains(&digits) && formatted
}

/// Whether text is a Luhn-valid card number of plausible length
pub fn is_credit_card(text: &str) -> bool {
    let compact: String = text
        .chars()
        .filter(|c| !matches!(c, ' ' | '-'))
        .collect();
    (13..=19).contains(&compact.len()) && luhn_valid(&compact)
}

/// Luhn checksum over a string of ASCII digits
pub fn luhn_valid(digits: &str) -> bool {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let sum: u32 = digits
        .bytes()
        .rev()
        .enumerate()
        .map(|(i, b)| {
            let d = u32::from(b - b'0');
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}

/// Whether text is a plausible birth date
pub fn is_birth_date(text: &str) -> bool {
    parse_date(text).is_some_and(|parsed| {
        let year = chrono::Datelike::year(&parsed.date());
        (1900..=2100).contains(&year)
    })
}

/// Whether text is shaped like a person's name (`Jane Doe`, `Mary-Ann Smith`)
pub fn is_person_name(text: &str) -> bool {
    PERSON_NAME.is_match(text.trim())
}

/// Whether text starts like a street address
pub fn is_street_address(text: &str) -> bool {
    STREET_ADDRESS.is_match(text.trim())
}

/// Whether text is a UUID
pub fn is_uuid(text: &str) -> bool {
    UUID.is_match(text.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("firstName", &["first", "name"] ; "camel case")]
    #[test_case("billing_address2", &["billing", "address", "2"] ; "digit edge")]
    #[test_case("user-ID", &["user", "id"] ; "separator and caps")]
    #[test_case("DOB", &["dob"] ; "acronym")]
    fn test_field_tokens(field: &str, expected: &[&str]) {
        assert_eq!(field_tokens(field), expected);
    }

    #[test]
    fn test_builtin_vocabulary_parses() {
        let vocabulary = Vocabulary::from_toml(BUILTIN_VOCABULARY).unwrap();
        assert_eq!(vocabulary.terms.len(), PiiType::ALL.len());
    }

    #[test]
    fn test_name_scores() {
        let vocabulary = Vocabulary::builtin();
        assert_eq!(vocabulary.name_score(PiiType::Email, "email"), EXACT_NAME_SCORE);
        assert_eq!(vocabulary.name_score(PiiType::Email, "workEmail"), TOKEN_NAME_SCORE);
        assert_eq!(vocabulary.name_score(PiiType::Name, "first_name"), EXACT_NAME_SCORE);
        assert_eq!(vocabulary.name_score(PiiType::Name, "company_name"), 0.0);
        assert_eq!(vocabulary.name_score(PiiType::Name, "file_name"), 0.0);
        assert_eq!(vocabulary.name_score(PiiType::Email, "amount"), 0.0);
    }

    #[test]
    fn test_from_toml_rejects_unknown_type() {
        let err = Vocabulary::from_toml("[types.shoe_size]\ntokens = [\"shoe\"]\n").unwrap_err();
        assert!(matches!(err, SieveError::Configuration(_)));
    }

    #[test]
    fn test_with_terms_extends_vocabulary() {
        let vocabulary = Vocabulary::default().with_terms(
            PiiType::Id,
            TermDefinition {
                tokens: vec!["mrn".into()],
                ..TermDefinition::default()
            },
        );
        assert_eq!(vocabulary.name_score(PiiType::Id, "patient_mrn"), TOKEN_NAME_SCORE);
    }

    #[test]
    fn test_value_validators() {
        assert!(is_email("alice@example.com"));
        assert!(!is_email("alice at example"));
        assert!(is_ssn("123-45-6789"));
        assert!(is_phone("(555) 123-4567"));
        assert!(is_phone("+44 20 7946 0958"));
        assert!(!is_phone("5551234567"));
        assert!(!is_phone("2024-01-02"));
        assert!(is_credit_card("4111 1111 1111 1111"));
        assert!(!is_credit_card("4111 1111 1111 1112"));
        assert!(is_birth_date("1985-02-17"));
        assert!(is_person_name("Jane Doe"));
        assert!(!is_person_name("jane"));
        assert!(is_street_address("221B Baker Street"));
        assert!(is_uuid("123e4567-e89b-12d3-a456-426614174000"));
    }
}
