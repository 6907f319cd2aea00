//! Loader configuration.

use crate::parser::DEFAULT_MAX_DEPTH;

/// Default cap on the nodes one document may expand to.
pub const DEFAULT_MAX_EXPANDED_NODES: u64 = 1_000_000;

/// Resource limits for loading.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadOptions {
    /// Maximum nesting of collections.
    pub max_depth: usize,
    /// Maximum number of nodes a document expands to once every alias is
    /// substituted by its target.
    pub max_expanded_nodes: u64,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_expanded_nodes: DEFAULT_MAX_EXPANDED_NODES,
        }
    }
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn max_expanded_nodes(mut self, max_expanded_nodes: u64) -> Self {
        self.max_expanded_nodes = max_expanded_nodes;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let options = LoadOptions::new().max_depth(4).max_expanded_nodes(10);
        assert_eq!(options.max_depth, 4);
        assert_eq!(options.max_expanded_nodes, 10);
        assert_eq!(LoadOptions::default().max_depth, 128);
    }
}
