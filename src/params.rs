//! Named-parameter rewriting.
//!
//! SQL templates carry `:name` placeholders. A single left-to-right scan
//! replaces each occurrence with whatever text the callback returns, while
//! the callback accumulates the positional argument list as a side effect.
//! `to_positional` is the standard Postgres callback, emitting `$1`, `$2`,
//! and so on.

use crate::types::SqlValue;

/// Ordered bag of named parameter values for a SQL template.
///
/// Unbound names are not an error: the rewriter hands the callback `None`
/// and lets it decide, so callbacks can supply defaults.
#[derive(Debug, Clone, Default)]
pub struct ParamBag {
    entries: Vec<(String, SqlValue)>,
}

impl ParamBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a value to a placeholder name. Later binds win on lookup.
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.entries.push((name.into(), value.into()));
        self
    }

    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.entries
            .iter()
            .rev()
            .find(|(entry, _)| entry == name)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Rewrites every `:name` occurrence in `template` with the callback's
/// return text.
///
/// The callback runs once per occurrence (a repeated name is rewritten
/// independently each time) and receives the bag value for the name, or
/// `None` when the bag has no entry. Text outside placeholders is copied
/// verbatim; a bare `:` with no word character after it is not a
/// placeholder and passes through untouched.
pub fn rewrite<F>(template: &str, bag: &ParamBag, mut replace: F) -> String
where
    F: FnMut(&str, Option<&SqlValue>) -> String,
{
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find(':') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        // Word characters are ASCII, so char count == byte length here.
        let name_len = after.chars().take_while(|c| is_word_char(*c)).count();
        if name_len == 0 {
            out.push(':');
            rest = after;
        } else {
            let name = &after[..name_len];
            out.push_str(&replace(name, bag.get(name)));
            rest = &after[name_len..];
        }
    }

    out.push_str(rest);
    out
}

/// The standard Postgres rewrite: each placeholder occurrence becomes `$1`,
/// `$2`, ... in source order, and the looked-up values accumulate into the
/// positional argument list. An unbound name binds NULL.
///
/// The returned argument list has exactly one entry per placeholder
/// occurrence.
pub fn to_positional(template: &str, bag: &ParamBag) -> (String, Vec<SqlValue>) {
    let mut args = Vec::with_capacity(bag.len());
    let sql = rewrite(template, bag, |_, value| {
        args.push(value.cloned().unwrap_or(SqlValue::Null));
        format!("${}", args.len())
    });
    (sql, args)
}
