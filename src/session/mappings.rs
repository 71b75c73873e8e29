//! Property mappings with `@name@` macro expansion

use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

fn macro_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"@([A-Za-z0-9_.\-]+)@").expect("valid regex"))
}

/// Splits a delimited `key=value` list (commas, spaces, tabs, newlines)
pub(crate) fn split_entries(text: &str) -> Vec<String> {
    static EQ: OnceLock<Regex> = OnceLock::new();
    let eq = EQ.get_or_init(|| Regex::new(r"\s*=\s*").expect("valid regex"));
    eq.replace_all(text, "=")
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Default, Clone)]
pub struct PropertyMappings {
    values: HashMap<String, String>,
}

impl PropertyMappings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a mapping; earlier registrations win
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> bool {
        let name = name.into();
        if self.values.contains_key(&name) {
            return false;
        }
        self.values.insert(name, value.into());
        true
    }

    /// Parses `a=b, c=d` text; entries without `=` are returned as rejects
    pub fn parse(text: &str) -> (Vec<(String, String)>, Vec<String>) {
        let mut accepted = Vec::new();
        let mut rejected = Vec::new();
        for entry in split_entries(text) {
            match entry.split_once('=') {
                Some((name, value)) if !name.is_empty() => {
                    accepted.push((name.to_string(), value.to_string()))
                }
                _ => rejected.push(entry),
            }
        }
        (accepted, rejected)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Fully expanded value of a mapping; `None` when absent or cyclic
    pub fn get(&self, name: &str) -> Option<String> {
        self.resolve(name, &mut HashSet::new())
    }

    /// Expands `@name@` tokens in arbitrary text. Unknown tokens stay literal;
    /// a cycle anywhere makes the whole result `None`.
    pub fn expand(&self, value: &str) -> Option<String> {
        self.expand_with(value, &mut HashSet::new())
    }

    fn resolve(&self, name: &str, visiting: &mut HashSet<String>) -> Option<String> {
        let raw = self.values.get(name)?;
        if !visiting.insert(name.to_string()) {
            return None;
        }
        let expanded = self.expand_with(raw, visiting);
        visiting.remove(name);
        expanded
    }

    fn expand_with(&self, value: &str, visiting: &mut HashSet<String>) -> Option<String> {
        let mut out = String::with_capacity(value.len());
        let mut last = 0;
        let mut pos = 0;
        while let Some(caps) = macro_regex().captures_at(value, pos) {
            let whole = caps.get(0)?;
            let name = &caps[1];
            if !self.values.contains_key(name) {
                // The closing `@` may open the next token
                pos = whole.start() + 1;
                continue;
            }
            out.push_str(&value[last..whole.start()]);
            out.push_str(&self.resolve(name, visiting)?);
            last = whole.end();
            pos = last;
        }
        out.push_str(&value[last..]);
        Some(out)
    }
}
