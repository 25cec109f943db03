//! Canonical column keys.
//!
//! A column may be requested bare (`user_id`) or qualified by its table
//! (`user_achievements.user_id`, `"posts"."title"`). Both forms identify the
//! same join key. [`ColumnKey`] carries the raw reference together with its
//! canonical key, computed once when the column is first named.

use std::fmt;

/// A column reference paired with its canonical key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnKey {
    raw: String,
    key: String,
}

impl ColumnKey {
    /// Parse a column reference as given by a caller.
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let key = canonical_key(&raw).to_string();
        Self { raw, key }
    }

    /// A column of a specific table.
    pub fn qualified(table: &str, column: &str) -> Self {
        Self::new(format!("{}.{}", table, column))
    }

    /// The column as it was written.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The bare, qualification-free key name.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The table qualifier, if the reference has one.
    pub fn table(&self) -> Option<&str> {
        let trimmed = trim_trailing_non_word(&self.raw);
        let head = &trimmed[..trimmed.len() - self.key.len()];
        let head = trim_trailing_non_word(head);
        let start = head
            .char_indices()
            .rev()
            .find(|(_, c)| !is_word(*c))
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        let table = &head[start..];
        (!table.is_empty()).then_some(table)
    }

    /// Whether this reference names the same key as `other`.
    pub fn same_key(&self, other: &ColumnKey) -> bool {
        self.key == other.key
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for ColumnKey {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for ColumnKey {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

/// Strip table qualification and quoting from a column reference.
///
/// `user_achievements.user_id` and `"users"."id"` become `user_id` and `id`.
/// The key is the last run of word characters in the reference.
pub fn canonical_key(column: &str) -> &str {
    let trimmed = trim_trailing_non_word(column);
    let start = trimmed
        .char_indices()
        .rev()
        .find(|(_, c)| !is_word(*c))
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    &trimmed[start..]
}

/// Deduplicate column references by canonical key, keeping the first form.
pub fn dedup_by_key(columns: impl IntoIterator<Item = ColumnKey>) -> Vec<ColumnKey> {
    let mut out: Vec<ColumnKey> = Vec::new();
    for column in columns {
        if !out.iter().any(|seen| seen.same_key(&column)) {
            out.push(column);
        }
    }
    out
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn trim_trailing_non_word(s: &str) -> &str {
    s.trim_end_matches(|c: char| !is_word(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_key() {
        assert_eq!(canonical_key("user_id"), "user_id");
        assert_eq!(canonical_key("user_achievements.user_id"), "user_id");
        assert_eq!(canonical_key("\"posts\".\"title\""), "title");
        assert_eq!(canonical_key("`users`.`id` "), "id");
        assert_eq!(canonical_key(""), "");
    }

    #[test]
    fn test_column_key_parts() {
        let col = ColumnKey::qualified("users", "id");
        assert_eq!(col.raw(), "users.id");
        assert_eq!(col.key(), "id");
        assert_eq!(col.table(), Some("users"));

        let bare = ColumnKey::new("name");
        assert_eq!(bare.table(), None);

        let quoted = ColumnKey::new("\"posts\".\"title\"");
        assert_eq!(quoted.table(), Some("posts"));
    }

    #[test]
    fn test_same_key_across_tables() {
        let a = ColumnKey::new("posts.user_id");
        let b = ColumnKey::new("user_id");
        assert!(a.same_key(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn test_dedup_keeps_first_form() {
        let cols = dedup_by_key([
            ColumnKey::new("users.id"),
            ColumnKey::new("name"),
            ColumnKey::new("id"),
            ColumnKey::new("users.name"),
        ]);
        let raw: Vec<_> = cols.iter().map(ColumnKey::raw).collect();
        assert_eq!(raw, vec!["users.id", "name"]);
    }
}
