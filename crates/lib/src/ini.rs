//! Reading and writing virt-builder index files.
//!
//! The format is the usual INI dialect: `[section]` headers followed by
//! `key=value` lines. A line starting with whitespace continues the value on
//! the previous line. Comments (`#` or `;`) and blank lines are dropped.
//!
//! Serialization never puts whitespace around `=`, as virt-builder's parser
//! does not accept it.

use std::fmt::Display;

use indexmap::IndexMap;

/// The keys and values of one section, in file order.
pub type Section = IndexMap<String, String>;

/// Errors from [`IniDocument::parse`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// A `key=value` line before the first section header.
    #[error("line {line}: entry outside of any section")]
    NoSection {
        /// One-based line number.
        line: usize,
    },
    /// A line that is neither a header nor an entry.
    #[error("line {line}: expected `key=value`")]
    MissingEquals {
        /// One-based line number.
        line: usize,
    },
    /// An indented line with no entry before it.
    #[error("line {line}: continuation without a preceding entry")]
    DanglingContinuation {
        /// One-based line number.
        line: usize,
    },
    /// `[` without a closing `]`, or an empty name.
    #[error("line {line}: invalid section header")]
    BadHeader {
        /// One-based line number.
        line: usize,
    },
}

/// An ordered collection of named sections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IniDocument {
    sections: IndexMap<String, Section>,
}

impl IniDocument {
    /// Parse `input`.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let mut doc = Self::default();
        let mut current: Option<String> = None;
        let mut last_key: Option<String> = None;

        for (idx, raw) in input.lines().enumerate() {
            let line = idx + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
                continue;
            }

            if raw.starts_with(char::is_whitespace) {
                let (Some(section), Some(key)) = (current.as_ref(), last_key.as_ref()) else {
                    return Err(ParseError::DanglingContinuation { line });
                };
                // Both were set together when the entry was inserted
                if let Some(value) = doc
                    .sections
                    .get_mut(section)
                    .and_then(|s| s.get_mut(key))
                {
                    if !value.is_empty() {
                        value.push('\n');
                    }
                    value.push_str(trimmed);
                }
                continue;
            }

            if let Some(rest) = trimmed.strip_prefix('[') {
                let name = rest
                    .strip_suffix(']')
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .ok_or(ParseError::BadHeader { line })?;
                doc.sections.entry(name.to_string()).or_default();
                current = Some(name.to_string());
                last_key = None;
                continue;
            }

            let Some((key, value)) = trimmed.split_once('=') else {
                return Err(ParseError::MissingEquals { line });
            };
            let Some(section) = current.as_ref() else {
                return Err(ParseError::NoSection { line });
            };
            let key = key.trim().to_string();
            doc.sections
                .entry(section.clone())
                .or_default()
                .insert(key.clone(), value.trim().to_string());
            last_key = Some(key);
        }

        Ok(doc)
    }

    /// The section called `name`.
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.get(name)
    }

    /// All sections, in order.
    pub fn sections(&self) -> impl Iterator<Item = (&str, &Section)> {
        self.sections.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of sections.
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Whether there are no sections.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Drop any section called `name` and append `section` under that name.
    /// The previous contents, if any, are returned; nothing is merged.
    pub fn replace_section(&mut self, name: &str, section: Section) -> Option<Section> {
        let previous = self.sections.shift_remove(name);
        self.sections.insert(name.to_string(), section);
        previous
    }
}

impl Display for IniDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, (name, section)) in self.sections.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "[{name}]")?;
            for (key, value) in section {
                let mut lines = value.split('\n');
                writeln!(f, "{key}={}", lines.next().unwrap_or_default())?;
                for cont in lines {
                    writeln!(f, " {cont}")?;
                }
            }
        }
        Ok(())
    }
}
