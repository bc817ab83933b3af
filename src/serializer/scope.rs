//! Stack of open scopes below a base path.

use crate::core::path;
use crate::util::{Error, Result};

#[derive(Clone, Debug)]
pub(super) struct ScopeStack {
    base: String,
    names: Vec<String>,
}

impl ScopeStack {
    pub fn new(base: String) -> Self {
        Self { base, names: Vec::new() }
    }

    pub fn depth(&self) -> usize {
        self.names.len()
    }

    pub fn push(&mut self, name: &str) {
        self.names.push(name.to_string());
    }

    pub fn pop(&mut self) -> Result<String> {
        self.names
            .pop()
            .ok_or_else(|| Error::ScopeMismatch("exit without enter".to_string()))
    }

    /// Absolute path of the innermost scope.
    pub fn current(&self) -> String {
        let mut segments: Vec<&str> = path::segments(&self.base).collect();
        segments.extend(self.names.iter().map(String::as_str));
        path::join(&segments)
    }

    /// Absolute path of `key` inside the innermost scope.
    pub fn path(&self, key: &str) -> String {
        let mut segments: Vec<&str> = path::segments(&self.base).collect();
        segments.extend(self.names.iter().map(String::as_str));
        segments.push(key);
        path::join(&segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let mut stack = ScopeStack::new("/".to_string());
        assert_eq!(stack.current(), "/");
        assert_eq!(stack.path("x"), "/x");

        stack.push("a");
        stack.push("b");
        assert_eq!(stack.current(), "/a/b");
        assert_eq!(stack.path("x"), "/a/b/x");

        assert_eq!(stack.pop().unwrap(), "b");
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn test_base() {
        let stack = ScopeStack::new("/run/results".to_string());
        assert_eq!(stack.path("x"), "/run/results/x");
    }

    #[test]
    fn test_pop_empty() {
        let mut stack = ScopeStack::new("/".to_string());
        assert!(matches!(stack.pop(), Err(Error::ScopeMismatch(_))));
    }
}
