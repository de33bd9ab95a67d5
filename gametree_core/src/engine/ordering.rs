use crate::engine::config::OrderingPolicy;
use crate::engine::eval::Scorer;
use crate::engine::node::Node;
use crate::engine::{GameState, Score};
use crate::error::Result;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Reorders a node's children before expansion. Implementations return a
/// permutation of their input and never touch child state.
pub trait MoveOrderer<G: GameState> {
    fn order(
        &mut self,
        parent: &Node<G>,
        children: Vec<Node<G>>,
        scorer: &mut Scorer<'_, G>,
    ) -> Result<Vec<Node<G>>>;

    /// Called once at the start of every search invocation.
    fn reset(&mut self) {}
}

pub fn orderer_for<G: GameState>(policy: OrderingPolicy) -> Box<dyn MoveOrderer<G>> {
    match policy {
        OrderingPolicy::Identity => Box::new(IdentityOrderer),
        OrderingPolicy::Heuristic => Box::new(HeuristicOrderer),
        OrderingPolicy::Shuffle { seed } => Box::new(ShuffleOrderer::new(seed)),
    }
}

/// Generation order, unchanged.
pub struct IdentityOrderer;

impl<G: GameState> MoveOrderer<G> for IdentityOrderer {
    fn order(
        &mut self,
        _parent: &Node<G>,
        children: Vec<Node<G>>,
        _scorer: &mut Scorer<'_, G>,
    ) -> Result<Vec<Node<G>>> {
        Ok(children)
    }
}

/// Best child for the player to move first, by static score. Equal scores
/// fall back to the move's `Ord`, then to generation order.
pub struct HeuristicOrderer;

impl<G: GameState> MoveOrderer<G> for HeuristicOrderer {
    fn order(
        &mut self,
        parent: &Node<G>,
        children: Vec<Node<G>>,
        scorer: &mut Scorer<'_, G>,
    ) -> Result<Vec<Node<G>>> {
        let maximizing = parent.is_maximizing();
        let mut keyed: Vec<(Score, Node<G>)> = children
            .into_iter()
            .map(|child| {
                let score = scorer.static_score(&child)?;
                Ok((if maximizing { score } else { -score }, child))
            })
            .collect::<Result<_>>()?;

        keyed.sort_by(|(sa, a), (sb, b)| {
            sb.cmp(sa).then_with(|| a.last_move().cmp(&b.last_move()))
        });

        Ok(keyed.into_iter().map(|(_, child)| child).collect())
    }
}

/// Seeded random permutation. The generator is rewound on every search so
/// repeated searches of the same position expand in the same order.
pub struct ShuffleOrderer {
    seed: u64,
    rng: StdRng,
}

impl ShuffleOrderer {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<G: GameState> MoveOrderer<G> for ShuffleOrderer {
    fn order(
        &mut self,
        _parent: &Node<G>,
        mut children: Vec<Node<G>>,
        _scorer: &mut Scorer<'_, G>,
    ) -> Result<Vec<Node<G>>> {
        children.shuffle(&mut self.rng);
        Ok(children)
    }

    fn reset(&mut self) {
        self.rng = StdRng::seed_from_u64(self.seed);
    }
}
