use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

/// 2^64, the first float past `u64::MAX`.
const U64_LIMIT: f64 = 18_446_744_073_709_551_616.0;

/// A decoded payload, independent of its wire encoding.
///
/// Unsigned integers above `i64::MAX` decode as [`Value::Float`]. Map keys
/// that are numbers or booleans are stored by their text form, and
/// MessagePack `bin` values decode as arrays of byte integers.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Array(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Name of the variant, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Non-negative whole number. Floats qualify when they have no
    /// fractional part and fit in a `u64`.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Integer(i) => u64::try_from(*i).ok(),
            Value::Float(f) if f.fract() == 0.0 && *f >= 0.0 && *f < U64_LIMIT => Some(*f as u64),
            _ => None,
        }
    }

    /// Numeric value as a float; integers are widened.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Look up `key` if this is a map.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|map| map.get(key))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<u64> for Value {
    fn from(u: u64) -> Self {
        match i64::try_from(u) {
            Ok(i) => Value::Integer(i),
            Err(_) => Value::Float(u as f64),
        }
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

impl FromIterator<(String, Value)> for Value {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Value::Map(iter.into_iter().collect())
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map {
                    out.serialize_entry(key, value)?;
                }
                out.end()
            }
        }
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a null, boolean, number, string, byte string, array or map")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Boolean(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Integer(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
        Ok(Value::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
        Ok(Value::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Value, E> {
        Ok(Value::Array(v.iter().map(|&b| Value::Integer(i64::from(b))).collect()))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        Value::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0).min(1024));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Value, A::Error> {
        let mut map = BTreeMap::new();
        while let Some((key, value)) = access.next_entry::<Value, Value>()? {
            map.insert(map_key(key)?, value);
        }
        Ok(Value::Map(map))
    }
}

/// Text form of a decoded map key. Arrays, maps and null are not keys.
fn map_key<E: de::Error>(key: Value) -> Result<String, E> {
    match key {
        Value::String(s) => Ok(s),
        Value::Integer(i) => Ok(i.to_string()),
        Value::Float(f) => Ok(f.to_string()),
        Value::Boolean(b) => Ok(b.to_string()),
        other => Err(E::invalid_type(
            de::Unexpected::Other(other.type_name()),
            &"a string, number or boolean map key",
        )),
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Value, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_are_typed() {
        assert_eq!(Value::Integer(-3).as_i64(), Some(-3));
        assert_eq!(Value::Integer(-3).as_u64(), None);
        assert_eq!(Value::Integer(7).as_f64(), Some(7.0));
        assert_eq!(Value::Float(1.5).as_i64(), None);
        assert_eq!(Value::Float(1.5).as_u64(), None);
        assert_eq!(Value::Float(-2.0).as_u64(), None);
        assert_eq!(Value::Float(f64::NAN).as_u64(), None);
        assert_eq!(Value::Float(f64::INFINITY).as_u64(), None);
        assert_eq!(Value::Float(4096.0).as_u64(), Some(4096));
        assert_eq!(Value::String("x".into()).as_f64(), None);
        assert_eq!(Value::Boolean(true).as_bool(), Some(true));
        assert!(Value::Null.is_null());
        assert!(Value::Array(vec![]).as_map().is_none());
    }

    #[test]
    fn get_only_works_on_maps() {
        let value: Value = [("t".to_string(), Value::Integer(1))].into_iter().collect();
        assert_eq!(value.get("t"), Some(&Value::Integer(1)));
        assert_eq!(value.get("w"), None);
        assert_eq!(Value::Array(vec![]).get("t"), None);
    }

    #[test]
    fn json_maps_to_every_variant() {
        let value: Value =
            serde_json::from_str(r#"{"n":null,"b":false,"i":-2,"f":0.25,"s":"hi","a":[1,[2]]}"#)
                .unwrap();

        assert_eq!(value.get("n"), Some(&Value::Null));
        assert_eq!(value.get("b"), Some(&Value::Boolean(false)));
        assert_eq!(value.get("i"), Some(&Value::Integer(-2)));
        assert_eq!(value.get("f"), Some(&Value::Float(0.25)));
        assert_eq!(value.get("s").and_then(Value::as_str), Some("hi"));
        assert_eq!(
            value.get("a"),
            Some(&Value::Array(vec![
                Value::Integer(1),
                Value::Array(vec![Value::Integer(2)])
            ]))
        );
    }

    #[test]
    fn huge_unsigned_becomes_float() {
        let value: Value = serde_json::from_str("18446744073709551615").unwrap();
        assert_eq!(value.type_name(), "float");
    }

    #[test]
    fn huge_unsigned_stays_usable_as_u64() {
        let value = Value::from(1u64 << 63);
        assert_eq!(value.type_name(), "float");
        assert_eq!(value.as_u64(), Some(1u64 << 63));
    }

    #[test]
    fn msgpack_mixed_keys_decode() {
        // {true: 1, -1: 2, "s": 3}
        let bytes = [0x83, 0xc3, 0x01, 0xff, 0x02, 0xa1, b's', 0x03];
        let value: Value = rmp_serde::from_slice(&bytes).unwrap();

        assert_eq!(value.get("true"), Some(&Value::Integer(1)));
        assert_eq!(value.get("-1"), Some(&Value::Integer(2)));
        assert_eq!(value.get("s"), Some(&Value::Integer(3)));
    }

    #[test]
    fn msgpack_map_decodes() {
        // {"t": 5, "w": [1.5]}
        let bytes = [
            0x82, 0xa1, b't', 0x05, 0xa1, b'w', 0x91, 0xcb, 0x3f, 0xf8, 0, 0, 0, 0, 0, 0,
        ];
        let value: Value = rmp_serde::from_slice(&bytes).unwrap();

        assert_eq!(value.get("t"), Some(&Value::Integer(5)));
        assert_eq!(value.get("w"), Some(&Value::Array(vec![Value::Float(1.5)])));
    }

    #[test]
    fn serialize_matches_json_shape() {
        let value: Value = [
            ("t".to_string(), Value::from(10u64)),
            ("w".to_string(), Value::from(vec![1.0, 2.5])),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            serde_json::to_string(&value).unwrap(),
            r#"{"t":10,"w":[1.0,2.5]}"#
        );
    }
}
