use std::collections::BTreeSet;
use std::fmt;

use crate::error::{Result, StoreError};
use crate::state::MAIN;

/// Ordered graph names, bottom first. `main` is always the bottom layer and
/// later layers win on read.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Stack {
    names: Vec<String>,
}

impl Stack {
    /// Just `main`.
    pub fn main() -> Self {
        Self {
            names: vec![MAIN.to_string()],
        }
    }

    /// `main` with `overlays` stacked on top, in order.
    pub fn new<I, S>(overlays: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names = vec![MAIN.to_string()];
        names.extend(overlays.into_iter().map(Into::into));
        Self::from_names(names)
    }

    /// A full stack as given. The first name must be `main`.
    pub fn from_names(names: Vec<String>) -> Result<Self> {
        match names.first() {
            Some(first) if first == MAIN => {}
            Some(first) => {
                return Err(StoreError::InvalidStack(format!(
                    "stack must start with {MAIN:?}, found {first:?}"
                )))
            }
            None => return Err(StoreError::InvalidStack("stack is empty".into())),
        }

        let mut seen = BTreeSet::new();
        for name in &names {
            if name.is_empty() {
                return Err(StoreError::InvalidStack("empty graph name".into()));
            }
            if !seen.insert(name.as_str()) {
                return Err(StoreError::InvalidStack(format!("{name:?} appears twice")));
            }
        }
        Ok(Self { names })
    }

    /// A new stack with `overlay` on top.
    pub fn with_overlay(&self, overlay: impl Into<String>) -> Result<Self> {
        let mut names = self.names.clone();
        names.push(overlay.into());
        Self::from_names(names)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// The top layer: where local writes go.
    pub fn current(&self) -> &str {
        self.names.last().map(String::as_str).unwrap_or(MAIN)
    }

    pub fn is_main(&self) -> bool {
        self.current() == MAIN
    }
}

impl fmt::Display for Stack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.names.join(" > "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn main_is_prefixed() {
        let stack = Stack::new(["edit"]).unwrap();
        assert_eq!(stack.names(), &["main".to_string(), "edit".to_string()]);
        assert_eq!(stack.current(), "edit");
        assert!(!stack.is_main());
        assert!(Stack::main().is_main());
    }

    #[test]
    fn rejects_malformed_stacks() {
        assert!(matches!(Stack::new([""]), Err(StoreError::InvalidStack(_))));
        assert!(matches!(Stack::new(["main"]), Err(StoreError::InvalidStack(_))));
        assert!(matches!(Stack::new(["a", "a"]), Err(StoreError::InvalidStack(_))));
        assert!(matches!(
            Stack::from_names(vec!["edit".into()]),
            Err(StoreError::InvalidStack(_))
        ));
        assert!(matches!(Stack::from_names(vec![]), Err(StoreError::InvalidStack(_))));
    }

    #[test]
    fn with_overlay_stacks_on_top() {
        let stack = Stack::main().with_overlay("a").unwrap().with_overlay("b").unwrap();
        assert_eq!(stack.current(), "b");
        assert_eq!(stack.to_string(), "main > a > b");
    }
}
