//! Version ordering used when picking a best version among duplicates

use std::cmp::Ordering;

/// Pluggable ordering strategy for version strings
pub trait VersionComparator: Send + Sync {
    fn compare(&self, a: &str, b: &str) -> Ordering;

    /// Whether the string is a concrete version the comparator can order
    fn is_parseable(&self, version: &str) -> bool {
        !version.trim().is_empty()
    }
}

/// Maven's canonical version ordering (qualifier-aware, trailing-zero tolerant)
#[derive(Debug, Default, Clone, Copy)]
pub struct MavenVersionComparator;

impl VersionComparator for MavenVersionComparator {
    fn compare(&self, a: &str, b: &str) -> Ordering {
        let left = Item::List(parse(a));
        let right = Item::List(parse(b));
        left.compare(Some(&right))
    }

    fn is_parseable(&self, version: &str) -> bool {
        let version = version.trim();
        !version.is_empty() && !version.contains("${")
    }
}

const QUALIFIERS: [&str; 7] = ["alpha", "beta", "milestone", "rc", "snapshot", "", "sp"];
const RELEASE_INDEX: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Item {
    /// Digits without leading zeros ("" is zero)
    Int(String),
    Str(String),
    List(Vec<Item>),
}

fn int_item(digits: &str) -> Item {
    Item::Int(digits.trim_start_matches('0').to_string())
}

fn string_item(value: &str, followed_by_digit: bool) -> Item {
    let value = if followed_by_digit && value.len() == 1 {
        match value {
            "a" => "alpha",
            "b" => "beta",
            "m" => "milestone",
            other => other,
        }
    } else {
        value
    };
    let value = match value {
        "ga" | "final" | "release" => "",
        "cr" => "rc",
        other => other,
    };
    Item::Str(value.to_string())
}

fn parse_item(is_digit: bool, token: &str) -> Item {
    if is_digit {
        int_item(token)
    } else {
        string_item(token, false)
    }
}

fn comparable_qualifier(qualifier: &str) -> String {
    match QUALIFIERS.iter().position(|q| *q == qualifier) {
        Some(index) => index.to_string(),
        None => format!("{}-{}", QUALIFIERS.len(), qualifier),
    }
}

impl Item {
    fn is_null(&self) -> bool {
        match self {
            Item::Int(digits) => digits.is_empty(),
            Item::Str(value) => comparable_qualifier(value) == RELEASE_INDEX.to_string(),
            Item::List(items) => items.is_empty(),
        }
    }

    fn compare(&self, other: Option<&Item>) -> Ordering {
        match (self, other) {
            (Item::Int(digits), None) => {
                if digits.is_empty() {
                    Ordering::Equal
                } else {
                    Ordering::Greater
                }
            }
            (Item::Int(a), Some(Item::Int(b))) => a.len().cmp(&b.len()).then_with(|| a.cmp(b)),
            (Item::Int(_), Some(_)) => Ordering::Greater,

            (Item::Str(value), None) => {
                comparable_qualifier(value).cmp(&RELEASE_INDEX.to_string())
            }
            (Item::Str(_), Some(Item::Int(_))) => Ordering::Less,
            (Item::Str(a), Some(Item::Str(b))) => {
                comparable_qualifier(a).cmp(&comparable_qualifier(b))
            }
            (Item::Str(_), Some(Item::List(_))) => Ordering::Less,

            (Item::List(items), None) => items
                .iter()
                .map(|i| i.compare(None))
                .find(|o| *o != Ordering::Equal)
                .unwrap_or(Ordering::Equal),
            (Item::List(_), Some(Item::Int(_))) => Ordering::Less,
            (Item::List(_), Some(Item::Str(_))) => Ordering::Greater,
            (Item::List(left), Some(Item::List(right))) => {
                let len = left.len().max(right.len());
                for i in 0..len {
                    let result = match (left.get(i), right.get(i)) {
                        (Some(l), r) => l.compare(r),
                        (None, Some(r)) => r.compare(None).reverse(),
                        (None, None) => Ordering::Equal,
                    };
                    if result != Ordering::Equal {
                        return result;
                    }
                }
                Ordering::Equal
            }
        }
    }
}

fn normalize(items: &mut Vec<Item>) {
    let mut i = items.len();
    while i > 0 {
        i -= 1;
        if items[i].is_null() {
            items.remove(i);
        } else if !matches!(items[i], Item::List(_)) {
            break;
        }
    }
}

fn parse(version: &str) -> Vec<Item> {
    let version = version.trim().to_lowercase();
    let chars: Vec<char> = version.chars().collect();

    // Each '-' or digit/letter transition opens a nested list as the last
    // element of the current one; popping appends it back in place.
    let mut stack: Vec<Vec<Item>> = vec![Vec::new()];
    let mut is_digit = false;
    let mut start = 0;

    let token = |from: usize, to: usize| -> String { chars[from..to].iter().collect() };

    for (i, &c) in chars.iter().enumerate() {
        let current = stack.len() - 1;
        if c == '.' || c == '-' {
            if i == start {
                stack[current].push(Item::Int(String::new()));
            } else {
                stack[current].push(parse_item(is_digit, &token(start, i)));
            }
            start = i + 1;
            if c == '-' {
                stack.push(Vec::new());
            }
        } else if c.is_ascii_digit() {
            if !is_digit && i > start {
                stack[current].push(string_item(&token(start, i), true));
                start = i;
                stack.push(Vec::new());
            }
            is_digit = true;
        } else {
            if is_digit && i > start {
                stack[current].push(parse_item(true, &token(start, i)));
                start = i;
                stack.push(Vec::new());
            }
            is_digit = false;
        }
    }

    if chars.len() > start {
        let current = stack.len() - 1;
        stack[current].push(parse_item(is_digit, &token(start, chars.len())));
    }

    while stack.len() > 1 {
        let mut list = stack.pop().unwrap_or_default();
        normalize(&mut list);
        if let Some(parent) = stack.last_mut() {
            parent.push(Item::List(list));
        }
    }
    let mut root = stack.pop().unwrap_or_default();
    normalize(&mut root);
    root
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmp(a: &str, b: &str) -> Ordering {
        MavenVersionComparator.compare(a, b)
    }

    #[test]
    fn test_numeric_ordering() {
        assert_eq!(cmp("1.10", "1.9"), Ordering::Greater);
        assert_eq!(cmp("2.0", "10.0"), Ordering::Less);
        assert_eq!(cmp("1.0", "1"), Ordering::Equal);
        assert_eq!(cmp("1.0.0", "1"), Ordering::Equal);
        assert_eq!(cmp("1.0.1", "1.0"), Ordering::Greater);
    }

    #[test]
    fn test_qualifier_ordering() {
        assert_eq!(cmp("1.0-alpha-1", "1.0-beta-1"), Ordering::Less);
        assert_eq!(cmp("1.0-rc1", "1.0"), Ordering::Less);
        assert_eq!(cmp("1.0-SNAPSHOT", "1.0"), Ordering::Less);
        assert_eq!(cmp("1.0-rc1", "1.0-SNAPSHOT"), Ordering::Less);
        assert_eq!(cmp("1.0", "1.0-sp1"), Ordering::Less);
        assert_eq!(cmp("1.0.Final", "1.0"), Ordering::Equal);
        assert_eq!(cmp("1.0-cr1", "1.0-rc1"), Ordering::Equal);
    }

    #[test]
    fn test_unknown_qualifier_sorts_after_release() {
        assert_eq!(cmp("1.0-redhat-1", "1.0"), Ordering::Greater);
        assert_eq!(cmp("1.0-redhat-2", "1.0-redhat-1"), Ordering::Greater);
    }

    #[test]
    fn test_large_numbers_do_not_overflow() {
        assert_eq!(
            cmp("1.20240101000000000000", "1.20231231000000000000"),
            Ordering::Greater
        );
    }

    #[test]
    fn test_parseable() {
        assert!(MavenVersionComparator.is_parseable("1.0"));
        assert!(!MavenVersionComparator.is_parseable(""));
        assert!(!MavenVersionComparator.is_parseable("${foo.version}"));
    }
}
