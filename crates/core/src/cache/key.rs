//! Cache key sanitization and composition.
//!
//! A logical key plus its disambiguating parameters flatten into a single
//! filesystem-safe token:
//!
//! ```text
//! base__name1-value1__name2-value2
//! ```
//!
//! Parameters are sorted by name first, so insertion order never changes
//! the result. Sanitization is lossy: `"a/b"` and `"a:b"` both become
//! `"a_b"`, and nothing here tries to tell them apart.

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use regex::Regex;

static UNSAFE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("static regex"));

/// Restrict a string to `[A-Za-z0-9._-]`.
///
/// Every run of other characters collapses to one `_`, then leading and
/// trailing underscores are stripped. Input made only of unsafe characters
/// yields an empty string.
pub fn sanitize_key(key: &str) -> String {
    UNSAFE_RUN.replace_all(key, "_").trim_matches('_').to_string()
}

/// A parameter value folded into a cache key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyValue {
    /// Absent value; renders as `none`.
    Null,
    Scalar(String),
    /// Rendered comma-joined, in the given order.
    Seq(Vec<String>),
    /// Rendered as comma-joined `key:value` pairs, sorted by key.
    Map(BTreeMap<String, String>),
}

impl KeyValue {
    /// Flatten to the string used inside a composed key.
    pub fn flatten(&self) -> String {
        match self {
            KeyValue::Null => "none".to_string(),
            KeyValue::Scalar(s) => s.clone(),
            KeyValue::Seq(items) => items.join(","),
            KeyValue::Map(entries) => entries
                .iter()
                .map(|(k, v)| format!("{k}:{v}"))
                .collect::<Vec<_>>()
                .join(","),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, KeyValue::Null)
    }
}

macro_rules! scalar_key_value {
    ($($t:ty),*) => {
        $(
            impl From<$t> for KeyValue {
                fn from(v: $t) -> Self {
                    KeyValue::Scalar(v.to_string())
                }
            }
        )*
    };
}

scalar_key_value!(&str, String, &String, i16, i32, i64, u16, u32, u64, usize, f64, bool, char);

impl<T: Into<KeyValue>> From<Option<T>> for KeyValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(KeyValue::Null, Into::into)
    }
}

impl<T: ToString> From<Vec<T>> for KeyValue {
    fn from(items: Vec<T>) -> Self {
        KeyValue::Seq(items.iter().map(ToString::to_string).collect())
    }
}

impl<T: ToString> From<&[T]> for KeyValue {
    fn from(items: &[T]) -> Self {
        KeyValue::Seq(items.iter().map(ToString::to_string).collect())
    }
}

impl<K: ToString, V: ToString> From<BTreeMap<K, V>> for KeyValue {
    fn from(entries: BTreeMap<K, V>) -> Self {
        KeyValue::Map(entries.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
    }
}

impl<K: ToString, V: ToString> From<HashMap<K, V>> for KeyValue {
    fn from(entries: HashMap<K, V>) -> Self {
        KeyValue::Map(entries.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
    }
}

/// Disambiguating parameters for a cache entry, keyed by parameter name.
///
/// Setting the same name twice keeps the last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyParams {
    entries: BTreeMap<String, KeyValue>,
}

impl KeyParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parameters addressing one race in the hierarchical layout.
    pub fn race(year: impl Into<KeyValue>, series_id: impl Into<KeyValue>, race_id: impl Into<KeyValue>) -> Self {
        Self::new()
            .with("year", year)
            .with("series_id", series_id)
            .with("race_id", race_id)
    }

    /// Add or replace a parameter.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<KeyValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<KeyValue>) {
        self.entries.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&KeyValue> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Parameters in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &KeyValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Copy of these parameters without the named ones.
    pub fn without(&self, names: &[&str]) -> Self {
        let entries = self
            .entries
            .iter()
            .filter(|(k, _)| !names.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Self { entries }
    }
}

impl<K: Into<String>, V: Into<KeyValue>> FromIterator<(K, V)> for KeyParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = KeyParams::new();
        for (name, value) in iter {
            params.insert(name, value);
        }
        params
    }
}

/// Compose a stable cache key from a base name and parameters.
///
/// Returns `base` unchanged when there are no parameters. The result is not
/// sanitized; path derivation does that.
pub fn compose_key(base: &str, params: &KeyParams) -> String {
    if params.is_empty() {
        return base.to_string();
    }

    let tokens: Vec<String> = params
        .iter()
        .map(|(name, value)| format!("{name}-{}", value.flatten()))
        .collect();

    format!("{base}__{}", tokens.join("__"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_safe(s: &str) -> bool {
        s.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-')
    }

    #[test]
    fn test_sanitize_collapses_runs() {
        assert_eq!(sanitize_key("lap times/2024"), "lap_times_2024");
        assert_eq!(sanitize_key("a:::b"), "a_b");
        assert_eq!(sanitize_key("results.v2-final"), "results.v2-final");
    }

    #[test]
    fn test_sanitize_strips_edge_underscores() {
        assert_eq!(sanitize_key("__cautions__"), "cautions");
        assert_eq!(sanitize_key("  pit stops  "), "pit_stops");
        assert_eq!(sanitize_key("/etc/passwd"), "etc_passwd");
    }

    #[test]
    fn test_sanitize_degenerate_input() {
        assert_eq!(sanitize_key(""), "");
        assert_eq!(sanitize_key("///"), "");
        assert_eq!(sanitize_key("ñ"), "");
    }

    #[test]
    fn test_sanitize_output_alphabet() {
        let inputs = [
            "lap_times__series-cup__year-2024",
            "Daytona 500 (2024)!",
            "../../escape",
            "tab\tnewline\n",
            "émoji 🏁 flag",
            "__a__b__",
        ];
        for input in inputs {
            let out = sanitize_key(input);
            assert!(is_safe(&out), "{out:?} from {input:?}");
            assert!(!out.starts_with('_') && !out.ends_with('_'), "{out:?} from {input:?}");
        }
    }

    #[test]
    fn test_sanitize_collisions_are_not_resolved() {
        assert_eq!(sanitize_key("a/b"), sanitize_key("a:b"));
    }

    #[test]
    fn test_compose_without_params() {
        assert_eq!(compose_key("lap_times", &KeyParams::new()), "lap_times");
    }

    #[test]
    fn test_compose_sorted_by_name() {
        let params = KeyParams::new().with("year", 2024).with("series", "cup");
        assert_eq!(compose_key("lap_times", &params), "lap_times__series-cup__year-2024");
    }

    #[test]
    fn test_compose_order_independent() {
        let forward: KeyParams = vec![("a", KeyValue::from(1)), ("b", "x".into()), ("c", vec![3, 4].into())]
            .into_iter()
            .collect();
        let reverse: KeyParams = vec![("c", KeyValue::from(vec![3, 4])), ("b", "x".into()), ("a", 1.into())]
            .into_iter()
            .collect();
        assert_eq!(compose_key("base", &forward), compose_key("base", &reverse));
    }

    #[test]
    fn test_compose_flattens_sequences_and_maps() {
        let mut filters = HashMap::new();
        filters.insert("z", 1);
        filters.insert("a", 2);

        let params = KeyParams::new()
            .with("drivers", vec![4, 11, 24])
            .with("filters", filters);

        assert_eq!(compose_key("stats", &params), "stats__drivers-4,11,24__filters-a:2,z:1");
    }

    #[test]
    fn test_compose_null_value() {
        let params = KeyParams::new().with("race_id", None::<i64>);
        assert_eq!(compose_key("results", &params), "results__race_id-none");
    }

    #[test]
    fn test_params_last_write_wins() {
        let params = KeyParams::new().with("year", 2023).with("year", 2024);
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("year"), Some(&KeyValue::Scalar("2024".into())));
    }

    #[test]
    fn test_params_without() {
        let params = KeyParams::race(2024, 1, 5314).with("stage", 2);
        let extra = params.without(&["year", "series_id", "race_id"]);
        assert_eq!(extra.len(), 1);
        assert!(extra.contains("stage"));
    }
}
