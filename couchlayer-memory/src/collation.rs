//! Key collation for in-memory listings.
//!
//! Listing bounds (`startkey`, `endkey`, `key`) are arbitrary JSON values and
//! are compared against document ids using the server's collation order:
//!
//! `null < false < true < numbers < strings < arrays < objects`
//!
//! Arrays compare element by element, objects key/value pair by pair in their
//! serialized order. Strings compare by code point, which is enough for the
//! ids produced by this server.

use serde_json::Value;
use std::cmp::Ordering;

/// Comparable view over a JSON key.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Number(f64),
    String(&'a str),
    Array(Vec<Comparable<'a>>),
    Object(Vec<(&'a str, Comparable<'a>)>),
}

impl<'a> From<&'a Value> for Comparable<'a> {
    fn from(value: &'a Value) -> Self {
        match value {
            Value::Null => Comparable::Null,
            Value::Bool(value) => Comparable::Bool(*value),
            Value::Number(value) => Comparable::Number(value.as_f64().unwrap_or(f64::NAN)),
            Value::String(value) => Comparable::String(value),
            Value::Array(values) => Comparable::Array(values.iter().map(Comparable::from).collect()),
            Value::Object(map) => Comparable::Object(
                map.iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect(),
            ),
        }
    }
}

impl Comparable<'_> {
    fn rank(&self) -> u8 {
        match self {
            Comparable::Null => 0,
            Comparable::Bool(_) => 1,
            Comparable::Number(_) => 2,
            Comparable::String(_) => 3,
            Comparable::Array(_) => 4,
            Comparable::Object(_) => 5,
        }
    }

    /// Total order used for listings.
    pub(crate) fn collate(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.total_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.cmp(b),
            (Comparable::Array(a), Comparable::Array(b)) => a
                .iter()
                .zip(b.iter())
                .map(|(x, y)| x.collate(y))
                .find(|ordering| ordering.is_ne())
                .unwrap_or_else(|| a.len().cmp(&b.len())),
            (Comparable::Object(a), Comparable::Object(b)) => a
                .iter()
                .zip(b.iter())
                .map(|((ka, va), (kb, vb))| ka.cmp(kb).then_with(|| va.collate(vb)))
                .find(|ordering| ordering.is_ne())
                .unwrap_or_else(|| a.len().cmp(&b.len())),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// Compares a document id with a JSON listing key.
pub(crate) fn compare_id(id: &str, key: &Value) -> Ordering {
    Comparable::String(id).collate(&Comparable::from(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn zero_sorts_before_every_id() {
        for id in ["", "0", "_design/x", "a", "zzz"] {
            assert_eq!(compare_id(id, &json!(0)), Ordering::Greater, "{id}");
        }
    }

    #[test]
    fn type_ranks_follow_collation() {
        let ordered = [json!(null), json!(false), json!(true), json!(-1), json!(2.5), json!("a"), json!(["a"]), json!({ "a": 1 })];

        for pair in ordered.windows(2) {
            let (low, high) = (Comparable::from(&pair[0]), Comparable::from(&pair[1]));
            assert_eq!(low.collate(&high), Ordering::Less, "{} < {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn strings_compare_with_ids() {
        assert_eq!(compare_id("c", &json!("c")), Ordering::Equal);
        assert_eq!(compare_id("b", &json!("c")), Ordering::Less);
        assert_eq!(compare_id("d", &json!("c")), Ordering::Greater);
        assert_eq!(compare_id("z", &json!(["a"])), Ordering::Less);
    }

    #[test]
    fn arrays_compare_elementwise_then_by_length() {
        let short = json!(["a"]);
        let long = json!(["a", 1]);

        assert_eq!(Comparable::from(&short).collate(&Comparable::from(&long)), Ordering::Less);
    }
}
