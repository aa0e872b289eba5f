//! Hierarchical names.

use core::fmt;
use core::str::FromStr;

use crate::error::NameError;

/// A hierarchical name such as `/mobile/A`.
///
/// Regular names and trace names share this type. Equality compares every
/// component, which is what trace matching relies on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Name {
    components: Vec<String>,
}

impl Name {
    /// The root name `/`.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_components<I, S>(components: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            components: components
                .into_iter()
                .map(Into::into)
                .filter(|c: &String| !c.is_empty())
                .collect(),
        }
    }

    /// Return a copy with `component` appended.
    pub fn append(mut self, component: impl Into<String>) -> Self {
        let component = component.into();
        if !component.is_empty() {
            self.components.push(component);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.components.get(index).map(String::as_str)
    }

    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.components.iter().map(String::as_str)
    }

    /// True if every component of `self` leads `other`. The root name is a
    /// prefix of everything.
    pub fn is_prefix_of(&self, other: &Name) -> bool {
        self.components.len() <= other.components.len()
            && self
                .components
                .iter()
                .zip(&other.components)
                .all(|(a, b)| a == b)
    }
}

impl FromStr for Name {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(NameError::Empty);
        }
        let path = s.strip_prefix("ndn:").unwrap_or(s);
        if !path.starts_with('/') {
            return Err(NameError::MissingLeadingSlash(s.to_string()));
        }
        Ok(Self::from_components(path.split('/')))
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.components.is_empty() {
            return f.write_str("/");
        }
        for component in &self.components {
            write!(f, "/{component}")?;
        }
        Ok(())
    }
}
