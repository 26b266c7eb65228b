//! Parameterized WHERE-clause builder
//!
//! Each predicate is appended together with its arguments so clause order and
//! bind order cannot drift apart. Values never reach the SQL text.

use sqlx::query::{Query, QueryAs};
use sqlx::sqlite::{Sqlite, SqliteArguments};

/// A bound argument
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Int(i64),
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Int(i64::from(value))
    }
}

/// Escape `%`, `_` and `\` and wrap in wildcards for `LIKE ? ESCAPE '\'`
pub fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// `?, ?, ?` for an `IN (...)` list
pub fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// A `column LIKE ? ESCAPE '\'` predicate
pub fn like(column: &str) -> String {
    format!("{} LIKE ? ESCAPE '\\'", column)
}

#[derive(Debug, Default, Clone)]
pub struct FilterBuilder {
    clauses: Vec<String>,
    params: Vec<SqlValue>,
}

impl FilterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one predicate with exactly as many arguments as it has `?`
    pub fn push<I, V>(&mut self, clause: impl Into<String>, params: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        let clause = clause.into();
        let before = self.params.len();
        self.params.extend(params.into_iter().map(Into::into));
        debug_assert_eq!(
            clause.matches('?').count(),
            self.params.len() - before,
            "placeholder count mismatch in `{}`",
            clause
        );
        self.clauses.push(clause);
        self
    }

    /// Append a predicate that binds nothing
    pub fn push_raw(&mut self, clause: impl Into<String>) -> &mut Self {
        self.push(clause, std::iter::empty::<SqlValue>())
    }

    /// `(a LIKE ? OR b LIKE ?)`, all bound to the same substring
    pub fn push_like_any(&mut self, columns: &[&str], needle: &str) -> &mut Self {
        if columns.is_empty() || needle.trim().is_empty() {
            return self;
        }
        let pattern = like_pattern(needle.trim());
        let clause = columns
            .iter()
            .map(|column| like(column))
            .collect::<Vec<_>>()
            .join(" OR ");
        self.push(
            format!("({})", clause),
            std::iter::repeat(pattern).take(columns.len()),
        )
    }

    /// One substring predicate per word, all required
    pub fn push_all_words(&mut self, column: &str, words: &[&str]) -> &mut Self {
        for word in words.iter().filter(|w| !w.is_empty()) {
            self.push(like(column), [like_pattern(word)]);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// ` WHERE a AND b`, or an empty string when nothing was pushed
    pub fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }

    pub fn params(&self) -> &[SqlValue] {
        &self.params
    }
}

/// Bind values in order onto a plain query
pub fn bind_all<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    values: &'q [SqlValue],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for value in values {
        query = match value {
            SqlValue::Text(text) => query.bind(text.as_str()),
            SqlValue::Int(int) => query.bind(*int),
        };
    }
    query
}

/// Bind values in order onto a typed query
pub fn bind_all_as<'q, O>(
    mut query: QueryAs<'q, Sqlite, O, SqliteArguments<'q>>,
    values: &'q [SqlValue],
) -> QueryAs<'q, Sqlite, O, SqliteArguments<'q>> {
    for value in values {
        query = match value {
            SqlValue::Text(text) => query.bind(text.as_str()),
            SqlValue::Int(int) => query.bind(*int),
        };
    }
    query
}
