use crate::engine::node::Node;
use crate::engine::{Evaluator, GameState, Score};
use crate::error::{Error, Result};
use std::collections::HashMap;

/// Heuristic memo for a single search invocation.
///
/// Keyed by the position itself, so two different positions can never share
/// an entry no matter how their hashes collide. The perspective is fixed for
/// the lifetime of the cache.
pub struct EvalCache<G: GameState> {
    entries: HashMap<G, Score>,
    enabled: bool,
    hits: u64,
    misses: u64,
}

impl<G: GameState> EvalCache<G> {
    pub fn new(enabled: bool) -> Self {
        Self {
            entries: HashMap::new(),
            enabled,
            hits: 0,
            misses: 0,
        }
    }

    pub const fn hits(&self) -> u64 {
        self.hits
    }

    pub const fn misses(&self) -> u64 {
        self.misses
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Evaluator plus cache, handed to the move orderer and used at the cutoff
/// frontier.
pub struct Scorer<'a, G: GameState> {
    evaluator: &'a dyn Evaluator<G>,
    cache: &'a mut EvalCache<G>,
}

impl<'a, G: GameState> Scorer<'a, G> {
    pub fn new(evaluator: &'a dyn Evaluator<G>, cache: &'a mut EvalCache<G>) -> Self {
        Self { evaluator, cache }
    }

    /// Heuristic value of a non-terminal node from the maximizing player's
    /// point of view, clamped strictly inside the utility range.
    pub fn heuristic(&mut self, node: &Node<G>) -> Result<Score> {
        if node.is_terminal() {
            return Err(Error::Precondition("heuristic requested on a terminal node"));
        }

        let state = node.state();
        if self.cache.enabled {
            if let Some(&score) = self.cache.entries.get(state) {
                self.cache.hits += 1;
                return Ok(score);
            }
        }

        let raw = self.evaluator.evaluate(state, node.maximizing_player());
        let score = clamp_heuristic::<G>(raw);
        self.cache.misses += 1;
        if self.cache.enabled {
            self.cache.entries.insert(state.clone(), score);
        }
        Ok(score)
    }

    /// Terminal utility for decided nodes, heuristic otherwise.
    pub fn static_score(&mut self, node: &Node<G>) -> Result<Score> {
        if node.is_terminal() {
            node.terminal_utility()
        } else {
            self.heuristic(node)
        }
    }
}

pub(crate) fn clamp_heuristic<G: GameState>(raw: Score) -> Score {
    let bound = G::MAX_UTILITY - 1;
    if raw < -bound || raw > bound {
        log::warn!("heuristic {raw} outside (-{0}, {0}), clamping", G::MAX_UTILITY);
    }
    raw.clamp(-bound, bound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::tictactoe::{LineHeuristic, Mark, TicTacToe};

    #[test]
    fn test_heuristic_is_idempotent_and_cached() {
        let evaluator = LineHeuristic;
        let mut cache: EvalCache<TicTacToe> = EvalCache::new(true);
        let node = Node::root(TicTacToe::parse("X../.O./...", Mark::X).unwrap(), Mark::X);

        let mut scorer = Scorer::new(&evaluator, &mut cache);
        let first = scorer.heuristic(&node).unwrap();
        let second = scorer.heuristic(&node).unwrap();
        assert_eq!(first, second);
        assert_eq!(cache.misses(), 1);
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_structurally_equal_states_share_entry() {
        let evaluator = LineHeuristic;
        let mut cache: EvalCache<TicTacToe> = EvalCache::new(true);
        let a = Node::root(TicTacToe::parse("X../.O./...", Mark::X).unwrap(), Mark::X);
        let b = Node::root(TicTacToe::parse("X.. .O. ...", Mark::X).unwrap(), Mark::X);
        let c = Node::root(TicTacToe::parse(".X./.O./...", Mark::X).unwrap(), Mark::X);

        let mut scorer = Scorer::new(&evaluator, &mut cache);
        scorer.heuristic(&a).unwrap();
        scorer.heuristic(&b).unwrap();
        scorer.heuristic(&c).unwrap();
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_disabled_cache_still_scores() {
        let evaluator = LineHeuristic;
        let mut cache: EvalCache<TicTacToe> = EvalCache::new(false);
        let node = Node::root(TicTacToe::new(), Mark::X);
        let mut scorer = Scorer::new(&evaluator, &mut cache);
        scorer.heuristic(&node).unwrap();
        scorer.heuristic(&node).unwrap();
        assert_eq!(cache.hits(), 0);
        assert_eq!(cache.misses(), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_heuristic_on_terminal_node_is_rejected() {
        let evaluator = LineHeuristic;
        let mut cache: EvalCache<TicTacToe> = EvalCache::new(true);
        let node = Node::root(TicTacToe::parse("XXX/OO./...", Mark::O).unwrap(), Mark::X);
        let mut scorer = Scorer::new(&evaluator, &mut cache);
        assert!(matches!(scorer.heuristic(&node), Err(Error::Precondition(_))));
        assert_eq!(scorer.static_score(&node).unwrap(), 100);
    }

    #[test]
    fn test_out_of_range_heuristic_is_clamped() {
        let evaluator = |_: &TicTacToe, _: Mark| 5_000;
        let mut cache: EvalCache<TicTacToe> = EvalCache::new(true);
        let node = Node::root(TicTacToe::new(), Mark::X);
        let mut scorer = Scorer::new(&evaluator, &mut cache);
        assert_eq!(scorer.heuristic(&node).unwrap(), 99);
        assert_eq!(clamp_heuristic::<TicTacToe>(-5_000), -99);
    }

    #[test]
    fn test_extreme_heuristic_is_clamped() {
        assert_eq!(clamp_heuristic::<TicTacToe>(Score::MIN), -99);
        assert_eq!(clamp_heuristic::<TicTacToe>(Score::MAX), 99);
        assert_eq!(clamp_heuristic::<TicTacToe>(-99), -99);

        let evaluator = |_: &TicTacToe, _: Mark| Score::MIN;
        let mut cache: EvalCache<TicTacToe> = EvalCache::new(true);
        let node = Node::root(TicTacToe::new(), Mark::X);
        let mut scorer = Scorer::new(&evaluator, &mut cache);
        assert_eq!(scorer.heuristic(&node).unwrap(), -99);
    }
}
