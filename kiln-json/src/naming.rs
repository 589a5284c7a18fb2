//! Which JSON names a record member answers to.
//!
//! The first candidate is what serialization writes; every candidate is
//! accepted when reading. Strategies are plain values handed to the engine
//! through [`EngineOptions`](crate::EngineOptions).

use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::TypeId;
use core::fmt;
use std::collections::HashMap;

use kiln_shape::{Member, Shape, Shaped};

use crate::error::ArgumentError;

/// Maps a record member to its candidate JSON names.
///
/// An empty list, or an empty name, makes plan compilation fail.
pub trait NamingStrategy: Send + Sync {
    /// Candidate names for `member` of `record`; the first one is written.
    fn candidate_names(&self, record: &'static Shape, member: &Member) -> Vec<String>;
}

impl<F> NamingStrategy for F
where
    F: Fn(&'static Shape, &Member) -> Vec<String> + Send + Sync,
{
    fn candidate_names(&self, record: &'static Shape, member: &Member) -> Vec<String> {
        self(record, member)
    }
}

fn with_aliases(primary: String, member: &Member) -> Vec<String> {
    let mut names = Vec::with_capacity(1 + member.aliases.len());
    names.push(primary);
    names.extend(member.aliases.iter().map(|alias| alias.to_string()));
    names
}

/// The default: the declared rename, or else the field name, followed by
/// declared aliases.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclaredNames;

impl NamingStrategy for DeclaredNames {
    fn candidate_names(&self, _record: &'static Shape, member: &Member) -> Vec<String> {
        with_aliases(member.json_name().to_string(), member)
    }
}

/// Case conventions understood by [`RenameAll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameRule {
    /// camelCase
    CamelCase,
    /// snake_case
    SnakeCase,
    /// kebab-case
    KebabCase,
    /// PascalCase
    PascalCase,
    /// SCREAMING_SNAKE_CASE
    ScreamingSnakeCase,
    /// SCREAMING-KEBAB-CASE
    ScreamingKebabCase,
    /// lowercase
    Lowercase,
    /// UPPERCASE
    Uppercase,
}

impl RenameRule {
    /// Parse a rule from its own spelling, e.g. `"camelCase"`.
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "camelCase" => RenameRule::CamelCase,
            "snake_case" => RenameRule::SnakeCase,
            "kebab-case" => RenameRule::KebabCase,
            "PascalCase" => RenameRule::PascalCase,
            "SCREAMING_SNAKE_CASE" => RenameRule::ScreamingSnakeCase,
            "SCREAMING-KEBAB-CASE" => RenameRule::ScreamingKebabCase,
            "lowercase" => RenameRule::Lowercase,
            "UPPERCASE" => RenameRule::Uppercase,
            _ => return None,
        })
    }

    /// Rewrite an identifier under this rule.
    pub fn apply(&self, name: &str) -> String {
        let words = split_into_words(name);
        match self {
            RenameRule::CamelCase => {
                let mut out = String::with_capacity(name.len());
                for (i, word) in words.iter().enumerate() {
                    if i == 0 {
                        out.push_str(&word.to_lowercase());
                    } else {
                        push_capitalized(&mut out, word);
                    }
                }
                out
            }
            RenameRule::PascalCase => {
                let mut out = String::with_capacity(name.len());
                for word in &words {
                    push_capitalized(&mut out, word);
                }
                out
            }
            RenameRule::SnakeCase => join(&words, '_', str::to_lowercase),
            RenameRule::KebabCase => join(&words, '-', str::to_lowercase),
            RenameRule::ScreamingSnakeCase => join(&words, '_', str::to_uppercase),
            RenameRule::ScreamingKebabCase => join(&words, '-', str::to_uppercase),
            RenameRule::Lowercase => name.to_lowercase(),
            RenameRule::Uppercase => name.to_uppercase(),
        }
    }
}

impl fmt::Display for RenameRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RenameRule::CamelCase => "camelCase",
            RenameRule::SnakeCase => "snake_case",
            RenameRule::KebabCase => "kebab-case",
            RenameRule::PascalCase => "PascalCase",
            RenameRule::ScreamingSnakeCase => "SCREAMING_SNAKE_CASE",
            RenameRule::ScreamingKebabCase => "SCREAMING-KEBAB-CASE",
            RenameRule::Lowercase => "lowercase",
            RenameRule::Uppercase => "UPPERCASE",
        })
    }
}

fn push_capitalized(out: &mut String, word: &str) {
    let mut chars = word.chars();
    if let Some(first) = chars.next() {
        out.extend(first.to_uppercase());
        out.push_str(&chars.as_str().to_lowercase());
    }
}

fn join(words: &[&str], sep: char, case: fn(&str) -> String) -> String {
    let mut out = String::new();
    for (i, word) in words.iter().enumerate() {
        if i > 0 {
            out.push(sep);
        }
        out.push_str(&case(word));
    }
    out
}

/// Words of an identifier: split on `_` and `-`, before an uppercase letter
/// that follows a lowercase letter or digit, and before the last capital of an
/// uppercase run when a lowercase letter comes next (`HTTPServer`).
fn split_into_words(name: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let mut start = 0;
    let mut prev: Option<char> = None;
    let mut chars = name.char_indices().peekable();
    while let Some((i, ch)) = chars.next() {
        if ch == '_' || ch == '-' {
            if start < i {
                words.push(&name[start..i]);
            }
            start = i + ch.len_utf8();
        } else if ch.is_uppercase() && start < i {
            let next = chars.peek().map(|&(_, c)| c);
            let after_run = prev.is_some_and(char::is_uppercase);
            if !after_run || next.is_some_and(char::is_lowercase) {
                words.push(&name[start..i]);
                start = i;
            }
        }
        prev = Some(ch);
    }
    if start < name.len() {
        words.push(&name[start..]);
    }
    words
}

/// Applies a [`RenameRule`] to every field name. Members with a declared
/// rename keep it; declared aliases are accepted as well.
#[derive(Debug, Clone, Copy)]
pub struct RenameAll(pub RenameRule);

impl NamingStrategy for RenameAll {
    fn candidate_names(&self, _record: &'static Shape, member: &Member) -> Vec<String> {
        let primary = match member.rename {
            Some(rename) => rename.to_string(),
            None => self.0.apply(member.name),
        };
        with_aliases(primary, member)
    }
}

/// Explicit candidate lists for chosen members, and another strategy for
/// the rest.
#[derive(Clone)]
pub struct Overrides {
    names: HashMap<(TypeId, &'static str), Vec<String>>,
    fallback: Arc<dyn NamingStrategy>,
}

impl Overrides {
    /// No overrides yet; everything goes to `fallback`.
    pub fn new(fallback: impl NamingStrategy + 'static) -> Self {
        Self {
            names: HashMap::new(),
            fallback: Arc::new(fallback),
        }
    }

    /// Give `member` (the field name) of record `T` exactly these names.
    pub fn set<T: Shaped>(
        mut self,
        member: &'static str,
        names: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<Self, ArgumentError> {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(ArgumentError::new("names", "at least one name is required"));
        }
        if names.iter().any(String::is_empty) {
            return Err(ArgumentError::new("names", "names must not be empty"));
        }
        self.names.insert((TypeId::of::<T>(), member), names);
        Ok(self)
    }
}

impl Default for Overrides {
    fn default() -> Self {
        Self::new(DeclaredNames)
    }
}

impl NamingStrategy for Overrides {
    fn candidate_names(&self, record: &'static Shape, member: &Member) -> Vec<String> {
        match self.names.get(&(record.id.get(), member.name)) {
            Some(names) => names.clone(),
            None => self.fallback.candidate_names(record, member),
        }
    }
}

impl fmt::Debug for Overrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Overrides")
            .field("overridden", &self.names.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_testhelpers::test;

    #[derive(Default)]
    struct Account {
        user_id: u64,
        display_name: String,
    }

    kiln_shape::record!(Account {
        user_id: u64,
        display_name: String => "displayName" | "name",
    });

    fn members() -> &'static [Member] {
        match &Account::SHAPE.def {
            kiln_shape::Def::Record(record) => record.members,
            _ => unreachable!(),
        }
    }

    fn names(strategy: &dyn NamingStrategy) -> Vec<Vec<String>> {
        members()
            .iter()
            .map(|m| strategy.candidate_names(Account::SHAPE, m))
            .collect()
    }

    #[test]
    fn declared_names_use_rename_and_aliases() {
        assert_eq!(
            names(&DeclaredNames),
            [vec!["user_id"], vec!["displayName", "name"]]
        );
    }

    #[test]
    fn rename_all_leaves_explicit_renames() {
        assert_eq!(
            names(&RenameAll(RenameRule::ScreamingKebabCase)),
            [vec!["USER-ID"], vec!["displayName", "name"]]
        );
    }

    #[test]
    fn rename_rules() {
        let cases = [
            (RenameRule::CamelCase, "userId"),
            (RenameRule::SnakeCase, "user_id"),
            (RenameRule::KebabCase, "user-id"),
            (RenameRule::PascalCase, "UserId"),
            (RenameRule::ScreamingSnakeCase, "USER_ID"),
            (RenameRule::ScreamingKebabCase, "USER-ID"),
            (RenameRule::Lowercase, "user_id"),
            (RenameRule::Uppercase, "USER_ID"),
        ];
        for (rule, expected) in cases {
            assert_eq!(rule.apply("user_id"), expected, "{rule}");
            assert_eq!(RenameRule::parse(&rule.to_string()), Some(rule));
        }
        assert_eq!(RenameRule::SnakeCase.apply("httpRequestId"), "http_request_id");
        assert_eq!(RenameRule::CamelCase.apply("HttpRequest"), "httpRequest");
        assert_eq!(RenameRule::parse("Title Case"), None);
    }

    #[test]
    fn acronyms_stay_one_word() {
        assert_eq!(split_into_words("HTTPServer"), ["HTTP", "Server"]);
        assert_eq!(split_into_words("userID"), ["user", "ID"]);
        assert_eq!(split_into_words("parseJSONBody2Fast"), ["parse", "JSON", "Body2", "Fast"]);
        assert_eq!(RenameRule::SnakeCase.apply("HTTPServer"), "http_server");
        assert_eq!(RenameRule::KebabCase.apply("userID"), "user-id");
        assert_eq!(RenameRule::CamelCase.apply("XMLHttpRequest"), "xmlHttpRequest");
        assert_eq!(RenameRule::ScreamingSnakeCase.apply("ID"), "ID");
    }

    #[test]
    fn overrides_fall_back_per_member() {
        let strategy = Overrides::new(RenameAll(RenameRule::CamelCase))
            .set::<Account>("user_id", ["id", "uid"])
            .unwrap();
        assert_eq!(
            names(&strategy),
            [vec!["id", "uid"], vec!["displayName", "name"]]
        );
        assert!(
            Overrides::default()
                .set::<Account>("user_id", Vec::<String>::new())
                .is_err()
        );
        assert!(Overrides::default().set::<Account>("user_id", [""]).is_err());
    }

    #[test]
    fn closures_are_strategies() {
        let upper = |_: &'static Shape, m: &Member| vec![m.name.to_uppercase()];
        assert_eq!(names(&upper), [vec!["USER_ID"], vec!["DISPLAY_NAME"]]);
    }
}
