//! Which recognizers silence which once they begin.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::ConfigError;

/// Index of a recognizer in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecognizerId(pub usize);

#[derive(Debug, Clone, Default)]
pub struct ExclusionGraph {
    edges: BTreeMap<RecognizerId, BTreeSet<RecognizerId>>,
}

impl ExclusionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Once `blocker` recognizes, `blocked` is blocked for the rest of the
    /// contact.
    pub fn block(&mut self, blocker: RecognizerId, blocked: RecognizerId) -> Result<(), ConfigError> {
        if blocker == blocked {
            return Err(ConfigError::SelfBlock(format!("#{}", blocker.0)));
        }
        self.edges.entry(blocker).or_default().insert(blocked);
        Ok(())
    }

    pub fn block_mutual(&mut self, a: RecognizerId, b: RecognizerId) -> Result<(), ConfigError> {
        self.block(a, b)?;
        self.block(b, a)
    }

    pub fn blocks(&self, blocker: RecognizerId, blocked: RecognizerId) -> bool {
        self.edges
            .get(&blocker)
            .is_some_and(|set| set.contains(&blocked))
    }

    pub fn blocked_by(&self, blocker: RecognizerId) -> impl Iterator<Item = RecognizerId> + '_ {
        self.edges.get(&blocker).into_iter().flatten().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_way_and_mutual_edges() {
        let (a, b, c) = (RecognizerId(0), RecognizerId(1), RecognizerId(2));
        let mut g = ExclusionGraph::new();
        g.block(a, b).unwrap();
        g.block_mutual(b, c).unwrap();

        assert!(g.blocks(a, b));
        assert!(!g.blocks(b, a));
        assert!(g.blocks(b, c) && g.blocks(c, b));
        assert_eq!(g.blocked_by(b).collect::<Vec<_>>(), vec![c]);
        assert_eq!(g.blocked_by(RecognizerId(9)).count(), 0);
    }

    #[test]
    fn self_block_is_rejected() {
        let mut g = ExclusionGraph::new();
        assert!(g.block(RecognizerId(3), RecognizerId(3)).is_err());
    }
}
