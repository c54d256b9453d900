//! The string key/value dictionaries that annotate most `.vox` chunks.

use core::fmt;
use core::str::FromStr;

use itertools::Itertools as _;

use crate::read::ByteReader;
use crate::{AttributeError, DecodeError};

/// Ordered list of string key/value pairs.
///
/// Keys are not required to be unique; lookups return the first match,
/// but all entries are preserved in order.
#[derive(Clone, Default, Eq, Hash, PartialEq)]
pub struct Dictionary {
    entries: Vec<(String, String)>,
}

impl Dictionary {
    /// Constructs an empty dictionary.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Reads an `i32` entry count followed by that many key and value strings.
    pub fn read(reader: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
        let count = reader.read_length()?;
        // Each entry is at least two 4-byte lengths.
        let mut entries = Vec::with_capacity(reader.capacity_hint(count, 8));
        for _ in 0..count {
            let key = reader.read_string()?;
            let value = reader.read_string()?;
            entries.push((key, value));
        }
        Ok(Self { entries })
    }

    /// Appends an entry, without checking whether the key is already present.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.push((key.into(), value.into()));
    }

    /// Returns the value of the first entry whose key is `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Interprets the value of `key` as space-separated tokens and parses the token at
    /// `index` as a `T`.
    ///
    /// ```
    /// use vox_scene::Dictionary;
    ///
    /// let dict = Dictionary::from_iter([("_t", "10 -3 7")]);
    /// assert_eq!(dict.get_token::<i32>("_t", 1), Ok(-3));
    /// assert!(dict.get_token::<i32>("_t", 3).is_err());
    /// ```
    pub fn get_token<T: FromStr>(&self, key: &str, index: usize) -> Result<T, AttributeError> {
        let token = self
            .get(key)
            .and_then(|value| value.split_whitespace().nth(index))
            .ok_or_else(|| AttributeError::MissingToken {
                key: key.to_owned(),
                index,
            })?;
        token.parse().map_err(|_| AttributeError::ParseToken {
            key: key.to_owned(),
            index,
            token: token.to_owned(),
        })
    }

    /// Like [`Self::get_token()`], but returns `Ok(None)` if the key is absent entirely,
    /// which is how the format expresses “default value”.
    pub fn get_optional_token<T: FromStr>(
        &self,
        key: &str,
        index: usize,
    ) -> Result<Option<T>, AttributeError> {
        if self.get(key).is_some() {
            self.get_token(key, index).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Returns all entries in their original order.
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    /// Iterates over all keys, including duplicates.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Iterates over all entries.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of entries, including duplicates.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Dictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Dictionary {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Dictionary {
    type Item = &'a (String, String);
    type IntoIter = core::slice::Iter<'a, (String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Logs the keys of `attributes` that are not among `expected_attributes`, since they may
/// indicate data this library does not know how to interpret.
pub(crate) fn warn_extra_attributes(
    thing: fmt::Arguments<'_>,
    attributes: &Dictionary,
    expected_attributes: &[&'static str],
) {
    let unexpected = unknown_keys(attributes, expected_attributes);
    if !unexpected.is_empty() {
        log::info!("{thing} contains unknown attributes {unexpected:?}");
    }
}

/// Keys of `attributes` not in `expected_attributes`, each listed once, in first-seen order.
fn unknown_keys<'d>(attributes: &'d Dictionary, expected_attributes: &[&str]) -> Vec<&'d str> {
    attributes
        .keys()
        .filter(|key| !expected_attributes.contains(key))
        .unique()
        .collect_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::VoxWriter;
    use pretty_assertions::assert_eq;

    #[test]
    fn round_trip_preserves_order_and_duplicates() {
        let dict = Dictionary::from_iter([("b", "1"), ("a", "2"), ("b", "3"), ("", "")]);
        let bytes = VoxWriter::new().dict(&dict).into_bytes();

        let mut reader = ByteReader::new(&bytes);
        let decoded = Dictionary::read(&mut reader).unwrap();
        assert_eq!(decoded, dict);
        assert_eq!(reader.consumed(), bytes.len());
        assert_eq!(decoded.get("b"), Some("1"));
    }

    #[test]
    fn unknown_keys_are_listed_once() {
        let dict = Dictionary::from_iter([
            ("_name", "a"),
            ("_color", "red"),
            ("_hidden", "0"),
            ("_color", "blue"),
            ("_size", "3"),
        ]);
        assert_eq!(
            unknown_keys(&dict, &["_name", "_hidden"]),
            vec!["_color", "_size"]
        );
        assert_eq!(unknown_keys(&Dictionary::new(), &["_name"]), Vec::<&str>::new());
    }

    #[test]
    fn negative_count() {
        let bytes = (-5i32).to_le_bytes();
        assert_eq!(
            Dictionary::read(&mut ByteReader::new(&bytes)),
            Err(DecodeError::InvalidLength { length: -5 })
        );
    }

    #[test]
    fn huge_count_is_truncation_not_allocation() {
        let bytes = i32::MAX.to_le_bytes();
        assert!(matches!(
            Dictionary::read(&mut ByteReader::new(&bytes)),
            Err(DecodeError::TruncatedInput { .. })
        ));
    }

    #[test]
    fn tokens() {
        let dict = Dictionary::from_iter([("_t", "1  2 x"), ("_r", "")]);
        assert_eq!(dict.get_token::<i32>("_t", 0), Ok(1));
        assert_eq!(dict.get_token::<i32>("_t", 1), Ok(2));
        assert_eq!(
            dict.get_token::<i32>("_t", 2),
            Err(AttributeError::ParseToken {
                key: "_t".into(),
                index: 2,
                token: "x".into()
            })
        );
        assert_eq!(
            dict.get_token::<u8>("_r", 0),
            Err(AttributeError::MissingToken {
                key: "_r".into(),
                index: 0
            })
        );
        assert_eq!(dict.get_optional_token::<u8>("_r", 0).is_err(), true);
        assert_eq!(dict.get_optional_token::<u8>("_name", 0), Ok(None));
    }

    #[test]
    fn debug_format() {
        let dict = Dictionary::from_iter([("_name", "tree")]);
        assert_eq!(format!("{dict:?}"), r#"{"_name": "tree"}"#);
    }
}
