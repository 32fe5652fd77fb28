//! Editable-element selector matching.
//!
//! Supports the compound selectors used to pick target fields: a tag name
//! (or `*`) followed by zero or more `[attr]` / `[attr="value"]` tests,
//! comma-separated into a list, e.g.
//! `textarea, input[type="text"], div[contenteditable="true"]`.
//! Tag and attribute names compare case-insensitively, values exactly.

use crate::host::{ElementId, FieldHost};

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttributeTest {
    name: String,
    value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CompoundSelector {
    /// `None` matches any tag
    tag: Option<String>,
    attributes: Vec<AttributeTest>,
}

/// A parsed selector list
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectorList {
    selectors: Vec<CompoundSelector>,
}

impl SelectorList {
    /// Parse a comma-separated selector list
    pub fn parse(source: &str) -> Result<Self, String> {
        let selectors = source
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(parse_compound)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { selectors })
    }

    /// Parse several selector strings into one list
    pub fn parse_all<S: AsRef<str>>(sources: &[S]) -> Result<Self, String> {
        let mut selectors = Vec::new();
        for source in sources {
            selectors.extend(Self::parse(source.as_ref())?.selectors);
        }
        Ok(Self { selectors })
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    pub fn matches(&self, host: &dyn FieldHost, id: ElementId) -> bool {
        let Some(tag) = host.tag_name(id) else {
            return false;
        };
        self.selectors.iter().any(|selector| {
            let tag_ok = selector
                .tag
                .as_deref()
                .map_or(true, |wanted| wanted.eq_ignore_ascii_case(tag));
            tag_ok
                && selector.attributes.iter().all(|test| {
                    match (host.attribute(id, &test.name), &test.value) {
                        (Some(_), None) => true,
                        (Some(actual), Some(expected)) => actual == expected,
                        (None, _) => false,
                    }
                })
        })
    }
}

fn parse_compound(part: &str) -> Result<CompoundSelector, String> {
    let (tag, mut rest) = match part.find('[') {
        Some(idx) => (part[..idx].trim(), &part[idx..]),
        None => (part.trim(), ""),
    };

    if tag.is_empty() && rest.is_empty() {
        return Err(format!("empty selector in '{part}'"));
    }
    if !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '*') {
        return Err(format!("unsupported selector syntax '{part}'"));
    }

    let mut attributes = Vec::new();
    while !rest.is_empty() {
        let inner_end = rest
            .find(']')
            .ok_or_else(|| format!("unclosed '[' in '{part}'"))?;
        let inner = rest[1..inner_end].trim();
        attributes.push(parse_attribute(inner, part)?);
        rest = rest[inner_end + 1..].trim_start();
        if !rest.is_empty() && !rest.starts_with('[') {
            return Err(format!("unsupported selector syntax '{part}'"));
        }
    }

    Ok(CompoundSelector {
        tag: match tag {
            "" | "*" => None,
            name => Some(name.to_ascii_lowercase()),
        },
        attributes,
    })
}

fn parse_attribute(inner: &str, part: &str) -> Result<AttributeTest, String> {
    let (name, value) = match inner.split_once('=') {
        Some((name, value)) => {
            let value = value.trim();
            let unquoted = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                .unwrap_or(value);
            (name.trim(), Some(unquoted.to_string()))
        }
        None => (inner, None),
    };
    if name.is_empty() {
        return Err(format!("empty attribute name in '{part}'"));
    }
    Ok(AttributeTest {
        name: name.to_ascii_lowercase(),
        value,
    })
}
