use crate::engine::config::SearchConfig;
use crate::engine::eval::{EvalCache, Scorer};
use crate::engine::node::Node;
use crate::engine::search::{check_utility_range, RootSelector};
use crate::engine::{Evaluator, GameState, Score, SearchOutcome, SearchStats, Searcher};
use crate::error::{Error, Result};
use std::sync::Arc;
use std::time::Instant;

/// Depth-thresholded minimax without pruning. Every child of every
/// expanded node is visited in generation order, which makes it the
/// reference the pruned engine is checked against.
pub struct MinimaxEngine<G: GameState, E: Evaluator<G>> {
    config: Arc<SearchConfig>,
    evaluator: E,
    cache: EvalCache<G>,
    nodes_searched: u64,
}

impl<G: GameState, E: Evaluator<G>> MinimaxEngine<G, E> {
    pub fn new(config: Arc<SearchConfig>, evaluator: E) -> Result<Self> {
        config.validate()?;
        check_utility_range::<G>()?;
        Ok(Self {
            cache: EvalCache::new(config.cache_heuristics),
            config,
            evaluator,
            nodes_searched: 0,
        })
    }

    pub const fn nodes_searched(&self) -> u64 {
        self.nodes_searched
    }

    fn minimax(&mut self, node: &mut Node<G>) -> Result<Score> {
        self.nodes_searched += 1;

        let value = if node.is_terminal() {
            node.terminal_utility()?
        } else if node.depth() >= self.config.max_depth {
            Scorer::new(&self.evaluator, &mut self.cache).heuristic(node)?
        } else {
            let mut children = node.children()?;
            if children.is_empty() {
                Scorer::new(&self.evaluator, &mut self.cache).heuristic(node)?
            } else {
                let maximizing = node.is_maximizing();
                let mut best = None;
                for child in &mut children {
                    let score = self.minimax(child)?;
                    best = Some(match best {
                        None => score,
                        Some(b) if maximizing => score.max(b),
                        Some(b) => score.min(b),
                    });
                }
                best.ok_or(Error::Precondition("expanded node without children"))?
            }
        };

        node.set_utility(value);
        Ok(value)
    }
}

impl<G: GameState, E: Evaluator<G>> Searcher<G> for MinimaxEngine<G, E> {
    fn search(&mut self, root_state: &G, maximizing: G::Player) -> Result<SearchOutcome<G::Move>> {
        let start = Instant::now();
        if root_state.player_to_move() != maximizing {
            return Err(Error::Precondition(
                "the player to move at the root must be the maximizing player",
            ));
        }
        self.nodes_searched = 0;
        self.cache = EvalCache::new(self.config.cache_heuristics);

        let root = Node::root(root_state.clone(), maximizing);
        let (best_move, score) = if root.is_terminal() {
            (None, root.terminal_utility()?)
        } else {
            let mut selector = RootSelector::new(self.config.tie_break);
            for mut child in root.children()? {
                let value = self.minimax(&mut child)?;
                if let Some(ply) = child.last_move() {
                    selector.offer(ply.clone(), value);
                }
            }
            let (ply, score) = selector.finish().ok_or(Error::NoMoveAvailable)?;
            (Some(ply), score)
        };

        Ok(SearchOutcome {
            best_move,
            score,
            stats: SearchStats {
                depth: self.config.max_depth,
                nodes: self.nodes_searched,
                cutoffs: 0,
                cache_hits: self.cache.hits(),
                cache_misses: self.cache.misses(),
                time_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
                timed_out: false,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Ply;
    use crate::games::tictactoe::{LineHeuristic, Mark, Square, TicTacToe};

    #[test]
    fn test_minimax_empty_board_is_a_draw() {
        let config = Arc::new(SearchConfig::default().with_max_depth(9));
        let mut engine = MinimaxEngine::new(config, LineHeuristic).unwrap();
        let outcome = engine.search(&TicTacToe::new(), Mark::X).unwrap();
        assert_eq!(outcome.score, 0);
        assert!(outcome.best_move.is_some());
        assert_eq!(outcome.stats.cutoffs, 0);
        assert_eq!(outcome.stats.nodes, engine.nodes_searched());
    }

    #[test]
    fn test_minimax_finds_win() {
        let config = Arc::new(SearchConfig::default().with_max_depth(2));
        let mut engine = MinimaxEngine::new(config, LineHeuristic).unwrap();
        let state = TicTacToe::parse("XX./OO./...", Mark::X).unwrap();
        let outcome = engine.search(&state, Mark::X).unwrap();
        assert_eq!(outcome.best_move, Some(Ply::Move(Square::new(0, 2))));
        assert_eq!(outcome.score, 100);
    }
}
