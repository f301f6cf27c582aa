//! Hierarchical addresses.

use std::fmt;

/// Path of child indices from the root to a node.
///
/// Ordering is lexicographic over the indices: element-wise, with a proper prefix ordering
/// before each of its extensions. This matches a pre-order walk of the tree, so an ancestor
/// sorts before its descendants and left siblings before right ones. Identical paths are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Position(Vec<usize>);

impl Position {
    /// Position from a path of child indices.
    pub fn new(indices: Vec<usize>) -> Self {
        Self(indices)
    }

    /// The root position (empty path).
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// The child indices.
    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    /// Depth of the addressed node (0 for the root).
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether this addresses the root.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Position of the parent, `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        let (_, parent) = self.0.split_last()?;
        Some(Self(parent.to_vec()))
    }

    /// Position of the `index`-th child.
    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    /// Index within the parent, `None` for the root.
    pub fn last(&self) -> Option<usize> {
        self.0.last().copied()
    }

    /// Number of leading indices shared with `other`.
    pub fn common_prefix_len(&self, other: &Self) -> usize {
        self.0
            .iter()
            .zip(&other.0)
            .take_while(|(a, b)| a == b)
            .count()
    }

    /// Whether `self` is a proper ancestor of `other`.
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        self.len() < other.len() && other.0.starts_with(&self.0)
    }
}

impl From<Vec<usize>> for Position {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{index}")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cmp::Ordering;

    #[test]
    fn test_prefix_sorts_first() {
        let parent = Position::new(vec![0, 2]);
        let child = parent.child(0);
        assert!(parent < child);
        assert!(parent.is_ancestor_of(&child));
        assert_eq!(child.parent(), Some(parent));
    }

    #[test]
    fn test_elementwise_order() {
        assert!(Position::new(vec![0, 5, 9]) < Position::new(vec![1]));
        assert!(Position::new(vec![1, 0]) > Position::new(vec![0, 7]));
    }

    #[test]
    fn test_equal_paths_compare_equal() {
        let a = Position::new(vec![3, 1]);
        assert_eq!(a.cmp(&a.clone()), Ordering::Equal);
    }

    #[test]
    fn test_display() {
        assert_eq!(Position::new(vec![0, 1, 2]).to_string(), "[0, 1, 2]");
        assert_eq!(Position::root().to_string(), "[]");
    }
}
