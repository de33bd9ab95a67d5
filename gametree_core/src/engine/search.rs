use crate::engine::config::{SearchConfig, TieBreak};
use crate::engine::eval::{EvalCache, Scorer};
use crate::engine::node::Node;
use crate::engine::ordering::{orderer_for, MoveOrderer};
use crate::engine::{
    Evaluator, GameState, Ply, Score, SearchOutcome, SearchStats, Searcher, INFINITY,
};
use crate::error::{Error, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Instant;

pub struct AlphaBetaEngine<G: GameState, E: Evaluator<G>> {
    config: Arc<SearchConfig>,
    evaluator: E,
    orderer: Box<dyn MoveOrderer<G>>,
    cache: EvalCache<G>,
    nodes_searched: u64,
    cutoffs: u64,
    deadline: Option<Instant>,
    max_depth: u32,
}

struct RootIteration<M> {
    best: Option<(Ply<M>, Score)>,
    completed: usize,
    timed_out: bool,
}

impl<G: GameState, E: Evaluator<G>> AlphaBetaEngine<G, E> {
    pub fn new(config: Arc<SearchConfig>, evaluator: E) -> Result<Self> {
        config.validate()?;
        check_utility_range::<G>()?;
        Ok(Self {
            orderer: orderer_for(config.ordering),
            cache: EvalCache::new(config.cache_heuristics),
            max_depth: config.max_depth,
            config,
            evaluator,
            nodes_searched: 0,
            cutoffs: 0,
            deadline: None,
        })
    }

    pub fn update_config(&mut self, config: Arc<SearchConfig>) -> Result<()> {
        config.validate()?;
        if config.ordering != self.config.ordering {
            self.orderer = orderer_for(config.ordering);
        }
        self.config = config;
        Ok(())
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub const fn nodes_searched(&self) -> u64 {
        self.nodes_searched
    }

    fn check_time(&self) -> Result<()> {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(Error::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    fn order(&mut self, parent: &Node<G>, children: Vec<Node<G>>) -> Result<Vec<Node<G>>> {
        let mut scorer = Scorer::new(&self.evaluator, &mut self.cache);
        self.orderer.order(parent, children, &mut scorer)
    }

    fn heuristic(&mut self, node: &Node<G>) -> Result<Score> {
        Scorer::new(&self.evaluator, &mut self.cache).heuristic(node)
    }

    fn alpha_beta(
        &mut self,
        node: &mut Node<G>,
        mut alpha: Score,
        mut beta: Score,
    ) -> Result<Score> {
        self.nodes_searched += 1;

        if node.is_terminal() {
            let value = node.terminal_utility()?;
            node.set_utility(value);
            return Ok(value);
        }

        if node.depth() >= self.max_depth {
            let value = self.heuristic(node)?;
            node.set_utility(value);
            return Ok(value);
        }

        self.check_time()?;

        let children = node.children()?;
        if children.is_empty() {
            let value = self.heuristic(node)?;
            node.set_utility(value);
            return Ok(value);
        }
        let mut children = self.order(node, children)?;

        let value = if node.is_maximizing() {
            let mut value = -INFINITY;
            for child in &mut children {
                value = value.max(self.alpha_beta(child, alpha, beta)?);
                alpha = alpha.max(value);
                if beta <= alpha {
                    self.cutoffs += 1;
                    break; // Beta cutoff
                }
            }
            value
        } else {
            let mut value = INFINITY;
            for child in &mut children {
                value = value.min(self.alpha_beta(child, alpha, beta)?);
                beta = beta.min(value);
                if beta <= alpha {
                    self.cutoffs += 1;
                    break; // Alpha cutoff
                }
            }
            value
        };

        node.set_utility(value);
        Ok(value)
    }

    fn search_root(
        &mut self,
        root: &Node<G>,
        preferred: Option<&Ply<G::Move>>,
    ) -> Result<RootIteration<G::Move>> {
        let children = root.children()?;
        let mut children = self.order(root, children)?;
        if let Some(ply) = preferred {
            promote(&mut children, ply);
        }

        let mut selector = RootSelector::new(self.config.tie_break);
        let mut completed = 0;
        let mut timed_out = false;

        for mut child in children {
            match self.alpha_beta(&mut child, selector.window_alpha(), INFINITY) {
                Ok(value) => {
                    completed += 1;
                    if let Some(ply) = child.last_move() {
                        selector.offer(ply.clone(), value);
                    }
                }
                Err(Error::DeadlineExceeded) => {
                    timed_out = true;
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(RootIteration {
            best: selector.finish(),
            completed,
            timed_out,
        })
    }

    /// First ordered root child with its static score, for when the deadline
    /// expires before a single root subtree completes.
    fn fallback(&mut self, root: &Node<G>) -> Result<(Ply<G::Move>, Score)> {
        let children = root.children()?;
        let first = self
            .order(root, children)?
            .into_iter()
            .next()
            .ok_or(Error::NoMoveAvailable)?;
        let score = Scorer::new(&self.evaluator, &mut self.cache).static_score(&first)?;
        let ply = first.last_move().cloned().ok_or(Error::NoMoveAvailable)?;
        log::warn!("deadline expired before any root move completed, falling back to {ply:?}");
        Ok((ply, score))
    }

    fn stats(&self, depth: u32, start: Instant, timed_out: bool) -> SearchStats {
        SearchStats {
            depth,
            nodes: self.nodes_searched,
            cutoffs: self.cutoffs,
            cache_hits: self.cache.hits(),
            cache_misses: self.cache.misses(),
            time_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            timed_out,
        }
    }

    /// Runs one decision. With iterative deepening each completed depth
    /// replaces the answer and seeds the next depth's root ordering; an
    /// interrupted depth only answers when nothing shallower completed.
    pub fn search_with_deadline(
        &mut self,
        root_state: &G,
        maximizing: G::Player,
        deadline: Option<Instant>,
    ) -> Result<SearchOutcome<G::Move>> {
        let start = Instant::now();
        if root_state.player_to_move() != maximizing {
            return Err(Error::Precondition(
                "the player to move at the root must be the maximizing player",
            ));
        }

        self.nodes_searched = 0;
        self.cutoffs = 0;
        self.cache = EvalCache::new(self.config.cache_heuristics);
        self.deadline = deadline;
        self.orderer.reset();

        let mut root = Node::root(root_state.clone(), maximizing);
        if root.is_terminal() {
            let score = root.terminal_utility()?;
            root.set_utility(score);
            return Ok(SearchOutcome {
                best_move: None,
                score,
                stats: self.stats(0, start, false),
            });
        }

        let max_depth = self.config.max_depth;
        let first_depth = if self.config.iterative_deepening { 1 } else { max_depth };
        let mut best: Option<(Ply<G::Move>, Score)> = None;
        let mut completed_depth = 0;
        let mut timed_out = false;

        for depth in first_depth..=max_depth {
            if depth > first_depth && self.check_time().is_err() {
                timed_out = true;
                break;
            }

            self.max_depth = depth;
            let iteration = self.search_root(&root, best.as_ref().map(|(ply, _)| ply))?;

            if iteration.timed_out {
                log::debug!(
                    "depth {depth} interrupted after {} root moves",
                    iteration.completed
                );
                timed_out = true;
                if best.is_none() {
                    best = iteration.best;
                }
                break;
            }

            best = iteration.best;
            completed_depth = depth;

            if let Some((ply, score)) = &best {
                log::debug!(
                    "depth {depth}: best {ply:?} score {score} nodes {}",
                    self.nodes_searched
                );
                if score.abs() >= G::MAX_UTILITY {
                    break;
                }
            }
        }

        let (ply, score) = match best {
            Some(found) => found,
            None => self.fallback(&root)?,
        };
        root.set_utility(score);

        let stats = self.stats(completed_depth, start, timed_out);
        log::info!(
            "chose {ply:?} score {score} depth {} nodes {} in {}ms",
            stats.depth,
            stats.nodes,
            stats.time_ms
        );

        Ok(SearchOutcome {
            best_move: Some(ply),
            score,
            stats,
        })
    }
}

impl<G: GameState, E: Evaluator<G>> Searcher<G> for AlphaBetaEngine<G, E> {
    fn search(&mut self, root: &G, maximizing: G::Player) -> Result<SearchOutcome<G::Move>> {
        let deadline = self.config.deadline_from(Instant::now());
        self.search_with_deadline(root, maximizing, deadline)
    }
}

pub(crate) fn check_utility_range<G: GameState>() -> Result<()> {
    if G::MAX_UTILITY <= 0 || G::MAX_UTILITY >= INFINITY {
        return Err(Error::InvalidConfig {
            message: format!(
                "terminal utility {} must lie in (0, {INFINITY})",
                G::MAX_UTILITY
            ),
        });
    }
    Ok(())
}

fn promote<G: GameState>(children: &mut Vec<Node<G>>, ply: &Ply<G::Move>) {
    if let Some(idx) = children.iter().position(|c| c.last_move() == Some(ply)) {
        let child = children.remove(idx);
        children.insert(0, child);
    }
}

/// Root-level best child selection shared by the alpha-beta and minimax
/// engines.
pub(crate) struct RootSelector<M> {
    tie_break: TieBreak,
    best: Option<Score>,
    candidates: Vec<Ply<M>>,
}

impl<M: Ord> RootSelector<M> {
    pub(crate) const fn new(tie_break: TieBreak) -> Self {
        Self {
            tie_break,
            best: None,
            candidates: Vec::new(),
        }
    }

    /// Lower bound to search the next root child with. Children that cannot
    /// beat it (or tie it, when ties matter) may come back with a bound
    /// instead of an exact value.
    pub(crate) const fn window_alpha(&self) -> Score {
        match self.best {
            None => -INFINITY,
            Some(best) if self.tie_break.needs_exact_ties() => best - 1,
            Some(best) => best,
        }
    }

    pub(crate) fn offer(&mut self, ply: Ply<M>, value: Score) {
        match self.best {
            Some(best) if value < best => {}
            Some(best) if value == best => match self.tie_break {
                TieBreak::FirstSeen => {}
                TieBreak::LowestMove => {
                    if self.candidates.first().is_some_and(|current| ply < *current) {
                        self.candidates.clear();
                        self.candidates.push(ply);
                    }
                }
                TieBreak::Seeded { .. } => self.candidates.push(ply),
            },
            _ => {
                self.best = Some(value);
                self.candidates.clear();
                self.candidates.push(ply);
            }
        }
    }

    pub(crate) fn finish(mut self) -> Option<(Ply<M>, Score)> {
        let best = self.best?;
        let idx = match self.tie_break {
            TieBreak::Seeded { seed } if self.candidates.len() > 1 => {
                StdRng::seed_from_u64(seed).gen_range(0..self.candidates.len())
            }
            _ => 0,
        };
        if idx >= self.candidates.len() {
            return None;
        }
        Some((self.candidates.swap_remove(idx), best))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::tictactoe::{LineHeuristic, Mark, Square, TicTacToe};

    fn engine(config: SearchConfig) -> AlphaBetaEngine<TicTacToe, LineHeuristic> {
        AlphaBetaEngine::new(Arc::new(config), LineHeuristic).unwrap()
    }

    #[test]
    fn test_selector_first_seen() {
        let mut selector = RootSelector::new(TieBreak::FirstSeen);
        assert_eq!(selector.window_alpha(), -INFINITY);
        selector.offer(Ply::Move(5), 3);
        selector.offer(Ply::Move(1), 3);
        selector.offer(Ply::Move(9), 2);
        assert_eq!(selector.window_alpha(), 3);
        assert_eq!(selector.finish(), Some((Ply::Move(5), 3)));
    }

    #[test]
    fn test_selector_lowest_move() {
        let mut selector = RootSelector::new(TieBreak::LowestMove);
        selector.offer(Ply::Move(5), 3);
        assert_eq!(selector.window_alpha(), 2);
        selector.offer(Ply::Move(1), 3);
        selector.offer(Ply::Move(0), 1);
        assert_eq!(selector.finish(), Some((Ply::Move(1), 3)));
    }

    #[test]
    fn test_selector_better_value_wins() {
        let mut selector = RootSelector::new(TieBreak::LowestMove);
        selector.offer(Ply::Move(1), 3);
        selector.offer(Ply::Move(7), 4);
        assert_eq!(selector.finish(), Some((Ply::Move(7), 4)));
    }

    #[test]
    fn test_selector_seeded_is_reproducible() {
        let run = || {
            let mut selector = RootSelector::new(TieBreak::Seeded { seed: 99 });
            for mv in 0..6 {
                selector.offer(Ply::Move(mv), 0);
            }
            selector.finish()
        };
        let first = run();
        assert!(first.is_some());
        assert_eq!(first, run());
    }

    #[test]
    fn test_selector_empty() {
        let selector: RootSelector<u8> = RootSelector::new(TieBreak::FirstSeen);
        assert_eq!(selector.finish(), None);
    }

    #[test]
    fn test_root_must_be_maximizing() {
        let mut engine = engine(SearchConfig::default());
        let result = engine.search(&TicTacToe::new(), Mark::O);
        assert!(matches!(result, Err(Error::Precondition(_))));
    }

    #[test]
    fn test_terminal_root_has_no_move() {
        let mut engine = engine(SearchConfig::default());
        let finished = TicTacToe::parse("XXX/OO./...", Mark::O).unwrap();
        let outcome = engine.search(&finished, Mark::O).unwrap();
        assert_eq!(outcome.best_move, None);
        assert_eq!(outcome.score, -TicTacToe::MAX_UTILITY);
    }

    #[test]
    fn test_win_in_one() {
        let mut engine = engine(SearchConfig::default().with_max_depth(9));
        let state = TicTacToe::parse("XX./OO./...", Mark::X).unwrap();
        let outcome = engine.search(&state, Mark::X).unwrap();
        assert_eq!(outcome.best_move, Some(Ply::Move(Square::new(0, 2))));
        assert_eq!(outcome.score, TicTacToe::MAX_UTILITY);
    }

    #[test]
    fn test_blocks_immediate_loss() {
        let mut engine = engine(SearchConfig::default().with_max_depth(4));
        // O threatens the middle row; X has no win of its own.
        let state = TicTacToe::parse("X../OO./..X", Mark::X).unwrap();
        let outcome = engine.search(&state, Mark::X).unwrap();
        assert_eq!(outcome.best_move, Some(Ply::Move(Square::new(1, 2))));
    }

    #[test]
    fn test_stats_are_populated() {
        let mut engine = engine(
            SearchConfig::default()
                .with_max_depth(3)
                .with_iterative_deepening(false),
        );
        let outcome = engine.search(&TicTacToe::new(), Mark::X).unwrap();
        assert_eq!(outcome.stats.depth, 3);
        assert!(outcome.stats.nodes > 9);
        assert!(outcome.stats.cache_misses > 0);
        assert!(!outcome.stats.timed_out);
        assert_eq!(engine.nodes_searched(), outcome.stats.nodes);
    }

    #[test]
    fn test_update_config_validates() {
        let mut engine = engine(SearchConfig::default());
        let bad = Arc::new(SearchConfig::default().with_max_depth(0));
        assert!(engine.update_config(bad).is_err());
        let good = Arc::new(SearchConfig::default().with_max_depth(2));
        engine.update_config(good).unwrap();
        assert_eq!(engine.config().max_depth, 2);
    }
}
