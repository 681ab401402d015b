//! Synthetic value generation
//!
//! [`FakeValueGenerator`] is the seam for swapping the data source behind the
//! `fake` method. The engine hands it an rng already keyed on
//! (seed, field, original value), so any generator that draws only from that
//! rng is deterministic and preserves referential integrity.

use crate::anonymization::detector::patterns::{field_tokens, is_email};
use crate::anonymization::rules::FakeKind;
use crate::domain::{as_number, number_value, parse_date};
use chrono::{Duration, NaiveDate};
use fake::faker::address::en::{BuildingNumber, CityName, StateAbbr, StreetName, ZipCode};
use fake::faker::company::en::CompanyName;
use fake::faker::internet::en::{DomainSuffix, SafeEmail};
use fake::faker::lorem::en::Word;
use fake::faker::name::en::{FirstName, LastName, Name};
use fake::faker::phone_number::en::PhoneNumber;
use fake::Fake;
use rand::rngs::StdRng;
use rand::Rng;
use serde_json::{Number, Value};

/// Produces a synthetic value of a given kind from a keyed rng
pub trait FakeValueGenerator: Send + Sync {
    /// Generate a replacement for `original`
    ///
    /// Implementations must draw all randomness from `rng`.
    fn generate(&self, kind: FakeKind, original: &Value, rng: &mut StdRng) -> Value;
}

/// Default generator backed by the `fake` crate's English locale
#[derive(Debug, Clone, Copy, Default)]
pub struct FakerGenerator;

impl FakeValueGenerator for FakerGenerator {
    fn generate(&self, kind: FakeKind, original: &Value, rng: &mut StdRng) -> Value {
        let text = match kind {
            FakeKind::Name => Name().fake_with_rng::<String, _>(rng),
            FakeKind::FirstName => FirstName().fake_with_rng::<String, _>(rng),
            FakeKind::LastName => LastName().fake_with_rng::<String, _>(rng),
            FakeKind::Email => SafeEmail().fake_with_rng::<String, _>(rng),
            FakeKind::Phone => PhoneNumber().fake_with_rng::<String, _>(rng),
            FakeKind::Address => format!(
                "{} {}, {}, {} {}",
                BuildingNumber().fake_with_rng::<String, _>(rng),
                StreetName().fake_with_rng::<String, _>(rng),
                CityName().fake_with_rng::<String, _>(rng),
                StateAbbr().fake_with_rng::<String, _>(rng),
                ZipCode().fake_with_rng::<String, _>(rng),
            ),
            FakeKind::City => CityName().fake_with_rng::<String, _>(rng),
            FakeKind::Company => CompanyName().fake_with_rng::<String, _>(rng),
            FakeKind::Url => format!(
                "https://www.{}.{}",
                Word().fake_with_rng::<String, _>(rng),
                DomainSuffix().fake_with_rng::<String, _>(rng),
            ),
            FakeKind::Date => fake_date(rng),
            FakeKind::Number => return fake_number(original, rng),
            FakeKind::Ssn => format!(
                "{:03}-{:02}-{:04}",
                rng.gen_range(100..900),
                rng.gen_range(10..100),
                rng.gen_range(1000..10000)
            ),
            FakeKind::CreditCard => fake_card_number(rng),
            FakeKind::Id => format!("{:012x}", rng.gen::<u64>() & 0xffff_ffff_ffff),
            FakeKind::Text => format!(
                "{} {}",
                Word().fake_with_rng::<String, _>(rng),
                Word().fake_with_rng::<String, _>(rng),
            ),
        };
        Value::String(text)
    }
}

/// Pick a fake kind for a field without an explicit one
///
/// Field-name tokens win; the value's shape is the fallback.
pub fn infer_kind(field: &str, value: &Value) -> FakeKind {
    let tokens = field_tokens(field);
    let has = |t: &str| tokens.iter().any(|token| token == t);

    if has("email") || has("mail") {
        return FakeKind::Email;
    }
    if has("phone") || has("mobile") || has("tel") || has("fax") {
        return FakeKind::Phone;
    }
    if has("first") || has("given") || has("firstname") {
        return FakeKind::FirstName;
    }
    if has("last") || has("surname") || has("family") || has("lastname") {
        return FakeKind::LastName;
    }
    if has("company") || has("employer") || has("organization") {
        return FakeKind::Company;
    }
    if has("name") || has("fullname") {
        return FakeKind::Name;
    }
    if has("city") || has("town") {
        return FakeKind::City;
    }
    if has("address") || has("street") {
        return FakeKind::Address;
    }
    if has("url") || has("website") || has("homepage") {
        return FakeKind::Url;
    }
    if has("ssn") {
        return FakeKind::Ssn;
    }
    if has("card") {
        return FakeKind::CreditCard;
    }
    if has("dob") || has("birth") || has("birthday") || has("date") {
        return FakeKind::Date;
    }
    if has("id") || has("uuid") {
        return FakeKind::Id;
    }

    match value {
        Value::Number(_) => FakeKind::Number,
        Value::String(s) if is_email(s) => FakeKind::Email,
        Value::String(s) if parse_date(s).is_some() => FakeKind::Date,
        _ => FakeKind::Text,
    }
}

fn fake_date(rng: &mut StdRng) -> String {
    let epoch = NaiveDate::from_ymd_opt(1940, 1, 1).unwrap_or_default();
    let date = epoch + Duration::days(rng.gen_range(0..365 * 65));
    date.format("%Y-%m-%d").to_string()
}

/// Random number of the same magnitude and integrality as the original
fn fake_number(original: &Value, rng: &mut StdRng) -> Value {
    let source = as_number(original).unwrap_or(100.0);
    let magnitude = source.abs().max(1.0);
    let upper = 10f64.powf(magnitude.log10().floor() + 1.0);
    let lower = upper / 10.0;
    let mut n = rng.gen_range(lower..upper);
    if source < 0.0 {
        n = -n;
    }
    if source.fract() == 0.0 {
        number_value(n.trunc())
    } else {
        Number::from_f64((n * 100.0).round() / 100.0)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

/// Sixteen-digit Visa-style number with a valid Luhn check digit
fn fake_card_number(rng: &mut StdRng) -> String {
    let mut digits: Vec<u32> = vec![4];
    digits.extend((0..14).map(|_| rng.gen_range(0..10)));
    digits.push(luhn_check_digit(&digits));
    digits.iter().map(|d| char::from(b'0' + *d as u8)).collect()
}

fn luhn_check_digit(payload: &[u32]) -> u32 {
    let sum: u32 = payload
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 0 {
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
    (10 - sum % 10) % 10
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anonymization::anonymizer::hash::value_rng;
    use crate::anonymization::detector::patterns::luhn_valid;
    use serde_json::json;
    use test_case::test_case;

    fn generate(kind: FakeKind, original: Value) -> Value {
        let mut rng = value_rng("seed", "field", &original);
        FakerGenerator.generate(kind, &original, &mut rng)
    }

    #[test]
    fn test_generation_is_deterministic_per_value() {
        let a = generate(FakeKind::Name, json!("Alice Smith"));
        let b = generate(FakeKind::Name, json!("Alice Smith"));
        assert_eq!(a, b);
        assert!(a.as_str().is_some_and(|s| !s.is_empty()));
    }

    #[test]
    fn test_fake_email_is_valid() {
        let value = generate(FakeKind::Email, json!("alice@example.com"));
        assert!(is_email(value.as_str().unwrap()));
    }

    #[test]
    fn test_fake_card_passes_luhn() {
        for original in ["4111111111111111", "5500000000000004", "340000000000009"] {
            let value = generate(FakeKind::CreditCard, json!(original));
            let card = value.as_str().unwrap();
            assert_eq!(card.len(), 16);
            assert!(luhn_valid(card), "{card} should pass Luhn");
        }
    }

    #[test]
    fn test_fake_number_keeps_integrality() {
        let value = generate(FakeKind::Number, json!(42));
        assert!(value.is_i64());
        let n = value.as_i64().unwrap();
        assert!((10..100).contains(&n));

        let value = generate(FakeKind::Number, json!(3.75));
        assert!(value.is_f64());
    }

    #[test]
    fn test_fake_date_parses() {
        let value = generate(FakeKind::Date, json!("1990-04-12"));
        assert!(parse_date(value.as_str().unwrap()).is_some());
    }

    #[test_case("email", json!("x"), FakeKind::Email ; "email field")]
    #[test_case("firstName", json!("x"), FakeKind::FirstName ; "camel case first name")]
    #[test_case("customer_name", json!("x"), FakeKind::Name ; "name token")]
    #[test_case("company_name", json!("x"), FakeKind::Company ; "company before name")]
    #[test_case("contact", json!("bob@example.com"), FakeKind::Email ; "email value")]
    #[test_case("score", json!(12), FakeKind::Number ; "number value")]
    #[test_case("notes", json!("hello"), FakeKind::Text ; "fallback")]
    fn test_infer_kind(field: &str, value: Value, expected: FakeKind) {
        assert_eq!(infer_kind(field, &value), expected);
    }
}
