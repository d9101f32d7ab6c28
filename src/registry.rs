//! Endpoint registry
//!
//! Declares which objects support which verbs, per module. Patterns use
//! brace expansion (`{contacts,leads}/notes` ⇒ `contacts/notes`,
//! `leads/notes`); groups may nest and combine as a cartesian product.
//! A pattern of `*` matches every object of its module.

use crate::error::{Error, ErrorKind, Result};
use crate::types::ModuleId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

/// Connector verb subject to registry checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
    Read,
    Write,
    Delete,
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verb::Read => write!(f, "read"),
            Verb::Write => write!(f, "write"),
            Verb::Delete => write!(f, "delete"),
        }
    }
}

/// Verbs an endpoint pattern accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Support {
    pub read: bool,
    pub write: bool,
    pub delete: bool,
}

impl Support {
    pub const NONE: Support = Support {
        read: false,
        write: false,
        delete: false,
    };

    pub const READ: Support = Support {
        read: true,
        ..Support::NONE
    };

    pub const ALL: Support = Support {
        read: true,
        write: true,
        delete: true,
    };

    #[must_use]
    pub const fn with_write(mut self) -> Self {
        self.write = true;
        self
    }

    #[must_use]
    pub const fn with_delete(mut self) -> Self {
        self.delete = true;
        self
    }

    pub fn supports(self, verb: Verb) -> bool {
        match verb {
            Verb::Read => self.read,
            Verb::Write => self.write,
            Verb::Delete => self.delete,
        }
    }

    fn union(self, other: Support) -> Support {
        Support {
            read: self.read || other.read,
            write: self.write || other.write,
            delete: self.delete || other.delete,
        }
    }
}

/// One declared pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointEntry {
    pub pattern: String,
    pub support: Support,
}

impl EndpointEntry {
    pub fn new(pattern: impl Into<String>, support: Support) -> Self {
        Self {
            pattern: pattern.into(),
            support,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct ModuleEndpoints {
    objects: HashMap<String, Support>,
    wildcard: Support,
}

/// Flattened `(module, object) → verbs` table
#[derive(Debug, Clone, Default)]
pub struct EndpointRegistry {
    modules: HashMap<ModuleId, ModuleEndpoints>,
}

impl EndpointRegistry {
    /// Expand every pattern; unbalanced braces fail construction
    pub fn new(entries: BTreeMap<ModuleId, Vec<EndpointEntry>>) -> Result<Self> {
        let mut modules = HashMap::new();

        for (module, entries) in entries {
            let mut endpoints = ModuleEndpoints::default();
            for entry in entries {
                if entry.pattern == "*" {
                    endpoints.wildcard = endpoints.wildcard.union(entry.support);
                    continue;
                }
                for object in expand(&entry.pattern)? {
                    let support = endpoints.objects.entry(object).or_default();
                    *support = support.union(entry.support);
                }
            }
            modules.insert(module, endpoints);
        }

        Ok(Self { modules })
    }

    /// Registry for a single-module provider
    pub fn single(module: impl Into<ModuleId>, entries: Vec<EndpointEntry>) -> Result<Self> {
        Self::new(BTreeMap::from([(module.into(), entries)]))
    }

    pub fn supports(&self, module: &str, object: &str, verb: Verb) -> bool {
        self.modules.get(module).is_some_and(|endpoints| {
            endpoints.wildcard.supports(verb)
                || endpoints
                    .objects
                    .get(object)
                    .is_some_and(|support| support.supports(verb))
        })
    }

    /// `OperationNotSupportedForObject` unless the triple was declared
    pub fn validate(&self, module: &str, object: &str, verb: Verb) -> Result<()> {
        if self.supports(module, object, verb) {
            Ok(())
        } else {
            Err(Error::with_message(
                ErrorKind::OperationNotSupportedForObject,
                format!("{verb} is not supported for object '{object}' in module '{module}'"),
            ))
        }
    }

    /// Explicitly declared objects supporting `verb`
    pub fn objects(&self, module: &str, verb: Verb) -> BTreeSet<String> {
        self.modules
            .get(module)
            .map(|endpoints| {
                endpoints
                    .objects
                    .iter()
                    .filter(|(_, support)| support.supports(verb))
                    .map(|(object, _)| object.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Expand a brace pattern into every object name it denotes
pub fn expand(pattern: &str) -> Result<Vec<String>> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut pos = 0;
    let expanded = expand_sequence(&chars, &mut pos, false, pattern)?;
    Ok(expanded)
}

/// A run of literals and groups; stops at `,` or `}` inside a group
fn expand_sequence(
    chars: &[char],
    pos: &mut usize,
    nested: bool,
    pattern: &str,
) -> Result<Vec<String>> {
    let mut acc = vec![String::new()];

    while let Some(&c) = chars.get(*pos) {
        match c {
            '{' => {
                *pos += 1;
                let alternatives = expand_group(chars, pos, pattern)?;
                acc = acc
                    .iter()
                    .flat_map(|prefix| alternatives.iter().map(move |alt| format!("{prefix}{alt}")))
                    .collect();
            }
            '}' | ',' if nested => break,
            '}' => return Err(unbalanced(pattern)),
            c => {
                for s in &mut acc {
                    s.push(c);
                }
                *pos += 1;
            }
        }
    }

    Ok(acc)
}

/// Alternatives of a group whose `{` was already consumed
fn expand_group(chars: &[char], pos: &mut usize, pattern: &str) -> Result<Vec<String>> {
    let mut alternatives = Vec::new();
    loop {
        alternatives.extend(expand_sequence(chars, pos, true, pattern)?);
        match chars.get(*pos) {
            Some(',') => *pos += 1,
            Some('}') => {
                *pos += 1;
                return Ok(alternatives);
            }
            _ => return Err(unbalanced(pattern)),
        }
    }
}

fn unbalanced(pattern: &str) -> Error {
    Error::registry(format!("unbalanced braces in endpoint pattern '{pattern}'"))
}
