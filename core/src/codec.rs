//! Conversions between domain values and the primitive column types SQLite
//! stores (TEXT, INTEGER, REAL, BLOB).
//!
//! Encoders are total over well-typed values; decoders report malformed input
//! instead of substituting defaults.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::models::{NutrientMap, Timestamp};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// The stored form of an empty list.
pub const EMPTY_LIST: &str = "[]";
/// The stored form of an empty map.
pub const EMPTY_MAP: &str = "{}";

// --- Identifiers ---

#[must_use]
pub fn encode_id(id: &Uuid) -> String {
    id.hyphenated().to_string()
}

pub fn decode_id(text: &str) -> Result<Uuid> {
    Uuid::parse_str(text).map_err(|source| StoreError::MalformedIdentifier {
        value: text.to_string(),
        source,
    })
}

// --- Instants ---

#[must_use]
pub fn encode_instant(ts: Timestamp) -> i64 {
    ts.as_millis()
}

pub fn decode_instant(millis: i64) -> Result<Timestamp> {
    Timestamp::from_millis(millis).ok_or_else(|| StoreError::MalformedTimestamp {
        value: millis.to_string(),
    })
}

// --- Calendar dates ---

#[must_use]
pub fn encode_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn decode_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text, DATE_FORMAT).map_err(|_| StoreError::MalformedTimestamp {
        value: text.to_string(),
    })
}

// --- Ordered string lists ---

/// JSON array text. Element content is escaped by the JSON grammar, so any
/// string (separators, quotes, newlines) survives the round trip.
#[must_use]
pub fn encode_list(items: &[String]) -> String {
    // Serializing a slice of strings cannot fail.
    serde_json::to_string(items).unwrap_or_else(|_| EMPTY_LIST.to_string())
}

pub fn decode_list(text: &str) -> Result<Vec<String>> {
    serde_json::from_str(text).map_err(|e| StoreError::MalformedList {
        reason: format!("{e} in {text:?}"),
    })
}

// --- String-keyed numeric maps ---

/// JSON object text with keys in sorted order, so equal maps always encode
/// to identical text. Non-finite values have no JSON representation.
// --- Numbers ---

/// Rejects NaN and the infinities, which SQLite cannot store as REAL.
pub fn encode_real(column: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(StoreError::MalformedNumber { column, value })
    }
}

pub fn encode_map(map: &NutrientMap) -> Result<String> {
    if let Some((key, value)) = map.iter().find(|(_, v)| !v.is_finite()) {
        return Err(StoreError::MalformedMap {
            reason: format!("value for {key:?} is not finite ({value})"),
        });
    }
    serde_json::to_string(map).map_err(|e| StoreError::MalformedMap {
        reason: e.to_string(),
    })
}

pub fn decode_map(text: &str) -> Result<NutrientMap> {
    serde_json::from_str(text).map_err(|e| StoreError::MalformedMap {
        reason: format!("{e} in {text:?}"),
    })
}

// --- Booleans ---

#[must_use]
pub fn encode_bool(value: bool) -> i64 {
    i64::from(value)
}

#[must_use]
pub fn decode_bool(value: i64) -> bool {
    value != 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_id_round_trip_is_canonical() {
        let id = Uuid::new_v4();
        let text = encode_id(&id);
        assert_eq!(text.len(), 36);
        assert_eq!(text, text.to_lowercase());
        assert_eq!(decode_id(&text).unwrap(), id);
    }

    #[test]
    fn test_decode_id_rejects_garbage() {
        for bad in ["", "not-a-uuid", "1234"] {
            let err = decode_id(bad).unwrap_err();
            assert!(matches!(err, StoreError::MalformedIdentifier { .. }), "{bad}");
        }
    }

    #[test]
    fn test_instant_bounds() {
        for ts in [Timestamp::min_value(), Timestamp::max_value()] {
            assert_eq!(decode_instant(encode_instant(ts)).unwrap(), ts);
        }
        assert_eq!(encode_instant(Timestamp::from_millis(0).unwrap()), 0);
    }

    #[test]
    fn test_decode_instant_out_of_range() {
        let err = decode_instant(i64::MAX).unwrap_err();
        assert!(matches!(err, StoreError::MalformedTimestamp { .. }));
    }

    #[test]
    fn test_date_text_form() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(encode_date(date), "2024-02-29");
        assert_eq!(decode_date("2024-02-29").unwrap(), date);
        assert!(matches!(
            decode_date("2023-02-29").unwrap_err(),
            StoreError::MalformedTimestamp { .. }
        ));
    }

    #[test]
    fn test_empty_list_literal() {
        assert_eq!(encode_list(&[]), EMPTY_LIST);
        assert!(decode_list(EMPTY_LIST).unwrap().is_empty());
    }

    #[test]
    fn test_list_with_empty_string_element_is_not_empty_list() {
        let items = vec![String::new()];
        let text = encode_list(&items);
        assert_ne!(text, EMPTY_LIST);
        assert_eq!(decode_list(&text).unwrap(), items);
    }

    #[test]
    fn test_list_preserves_order_and_duplicates() {
        let items: Vec<String> = ["flour", "sugar", "flour"]
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(decode_list(&encode_list(&items)).unwrap(), items);
    }

    #[test]
    fn test_list_elements_may_contain_separators() {
        let items = vec![
            "a|||b".to_string(),
            "k:1;j:2".to_string(),
            "quote \" and \\ backslash".to_string(),
            "line\nbreak".to_string(),
        ];
        assert_eq!(decode_list(&encode_list(&items)).unwrap(), items);
    }

    #[test]
    fn test_decode_list_rejects_malformed() {
        for bad in ["", "flour|||sugar", "[1, 2]", "{\"a\": 1}"] {
            assert!(
                matches!(decode_list(bad), Err(StoreError::MalformedList { .. })),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_empty_map_literal() {
        let map = NutrientMap::new();
        assert_eq!(encode_map(&map).unwrap(), EMPTY_MAP);
        assert!(decode_map(EMPTY_MAP).unwrap().is_empty());
    }

    #[test]
    fn test_map_encoding_is_stable() {
        let mut a = NutrientMap::new();
        a.insert("zinc".to_string(), 11.0);
        a.insert("iron".to_string(), 18.0);
        let mut b = NutrientMap::new();
        b.insert("iron".to_string(), 18.0);
        b.insert("zinc".to_string(), 11.0);
        assert_eq!(encode_map(&a).unwrap(), encode_map(&b).unwrap());
        assert_eq!(encode_map(&a).unwrap(), r#"{"iron":18.0,"zinc":11.0}"#);
    }

    #[test]
    fn test_map_rejects_non_finite() {
        let mut map = NutrientMap::new();
        map.insert("vitamin c".to_string(), f64::NAN);
        assert!(matches!(
            encode_map(&map),
            Err(StoreError::MalformedMap { .. })
        ));
    }

    #[test]
    fn test_encode_real_rejects_non_finite() {
        assert_eq!(encode_real("fat", -0.5).unwrap(), -0.5);
        assert_eq!(encode_real("fat", f64::MAX).unwrap(), f64::MAX);
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                encode_real("fat", bad),
                Err(StoreError::MalformedNumber { column: "fat", .. })
            ));
        }
    }

    #[test]
    fn test_decode_map_rejects_malformed() {
        for bad in ["", "iron:18.0;zinc:11.0", "[]", r#"{"iron":"lots"}"#] {
            assert!(
                matches!(decode_map(bad), Err(StoreError::MalformedMap { .. })),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_bool_encoding() {
        assert_eq!(encode_bool(true), 1);
        assert_eq!(encode_bool(false), 0);
        assert!(decode_bool(1));
        assert!(decode_bool(7));
        assert!(!decode_bool(0));
    }

    proptest! {
        #[test]
        fn prop_list_round_trips(items in proptest::collection::vec(".*", 0..8)) {
            prop_assert_eq!(decode_list(&encode_list(&items)).unwrap(), items);
        }

        #[test]
        fn prop_map_round_trips(
            map in proptest::collection::btree_map(".*", -1.0e12f64..1.0e12, 0..8)
        ) {
            prop_assert_eq!(decode_map(&encode_map(&map).unwrap()).unwrap(), map);
        }

        #[test]
        fn prop_instant_round_trips(millis in -8_000_000_000_000_000i64..8_000_000_000_000_000) {
            let ts = Timestamp::from_millis(millis).unwrap();
            prop_assert_eq!(decode_instant(encode_instant(ts)).unwrap(), ts);
        }
    }
}
