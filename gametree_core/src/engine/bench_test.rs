//! Node-count checks on a small hand-built tree whose pruned and unpruned
//! traversals can be counted by hand.

use crate::engine::config::{OrderingPolicy, SearchConfig};
use crate::engine::minimax::MinimaxEngine;
use crate::engine::search::AlphaBetaEngine;
use crate::engine::{GameState, Outcome, Ply, Score, Searcher};
use crate::error::Result;
use std::sync::Arc;

const LEAVES: [[Score; 3]; 3] = [[3, 12, 8], [2, 4, 6], [14, 5, 2]];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Side {
    Max,
    Min,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TextbookTree {
    path: Vec<u8>,
    to_move: Side,
}

impl TextbookTree {
    fn root() -> Self {
        Self {
            path: Vec::new(),
            to_move: Side::Max,
        }
    }
}

impl GameState for TextbookTree {
    type Move = u8;
    type Player = Side;

    const MAX_UTILITY: Score = 100;

    fn player_to_move(&self) -> Side {
        self.to_move
    }

    fn outcome(&self) -> Option<Outcome<Side>> {
        None
    }

    fn legal_moves(&self) -> Vec<u8> {
        if self.path.len() < 2 {
            vec![0, 1, 2]
        } else {
            Vec::new()
        }
    }

    fn apply_move(&self, mv: &u8) -> Result<Self> {
        let mut next = self.pass();
        next.path.push(*mv);
        Ok(next)
    }

    fn pass(&self) -> Self {
        Self {
            path: self.path.clone(),
            to_move: match self.to_move {
                Side::Max => Side::Min,
                Side::Min => Side::Max,
            },
        }
    }
}

/// Exact values: leaves from the table, inner nodes the minimum of their
/// leaves, so heuristic ordering is perfect.
fn exact(state: &TextbookTree, _perspective: Side) -> Score {
    let row = |i: u8| LEAVES.get(usize::from(i)).copied().unwrap_or_default();
    match state.path.as_slice() {
        [a, b] => row(*a).get(usize::from(*b)).copied().unwrap_or_default(),
        [a] => row(*a).into_iter().min().unwrap_or_default(),
        _ => 3,
    }
}

fn config(ordering: OrderingPolicy) -> Arc<SearchConfig> {
    Arc::new(
        SearchConfig::default()
            .with_max_depth(2)
            .with_ordering(ordering)
            .with_iterative_deepening(false),
    )
}

#[test]
fn bench_identity_ordering() {
    let mut engine: AlphaBetaEngine<TextbookTree, _> =
        AlphaBetaEngine::new(config(OrderingPolicy::Identity), exact).unwrap();
    let outcome = engine.search(&TextbookTree::root(), Side::Max).unwrap();
    println!("identity: {:?}", outcome.stats);

    assert_eq!(outcome.score, 3);
    assert_eq!(outcome.best_move, Some(Ply::Move(0)));
    assert_eq!(outcome.stats.nodes, 10);
    assert_eq!(outcome.stats.cutoffs, 2);
}

#[test]
fn bench_heuristic_ordering() {
    let mut engine: AlphaBetaEngine<TextbookTree, _> =
        AlphaBetaEngine::new(config(OrderingPolicy::Heuristic), exact).unwrap();
    let outcome = engine.search(&TextbookTree::root(), Side::Max).unwrap();
    println!("heuristic: {:?}", outcome.stats);

    assert_eq!(outcome.score, 3);
    assert_eq!(outcome.best_move, Some(Ply::Move(0)));
    assert_eq!(outcome.stats.nodes, 8);
}

#[test]
fn bench_minimax_visits_everything() {
    let mut engine: MinimaxEngine<TextbookTree, _> =
        MinimaxEngine::new(config(OrderingPolicy::Identity), exact).unwrap();
    let outcome = engine.search(&TextbookTree::root(), Side::Max).unwrap();

    assert_eq!(outcome.score, 3);
    assert_eq!(outcome.best_move, Some(Ply::Move(0)));
    assert_eq!(outcome.stats.nodes, 12);
}
