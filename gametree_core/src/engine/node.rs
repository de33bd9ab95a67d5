use crate::engine::{GameState, Ply, Score};
use crate::error::{Error, Result};

/// One position in the search tree.
///
/// Children are generated on demand and owned by the caller that asked for
/// them, so a subtree is dropped as soon as the search call that expanded it
/// returns.
#[derive(Debug, Clone)]
pub struct Node<G: GameState> {
    state: G,
    player_to_move: G::Player,
    maximizing_player: G::Player,
    depth: u32,
    last_move: Option<Ply<G::Move>>,
    utility: Option<Score>,
}

impl<G: GameState> Node<G> {
    pub fn root(state: G, maximizing_player: G::Player) -> Self {
        Self {
            player_to_move: state.player_to_move(),
            state,
            maximizing_player,
            depth: 0,
            last_move: None,
            utility: None,
        }
    }

    fn child(&self, state: G, ply: Ply<G::Move>) -> Self {
        Self {
            player_to_move: state.player_to_move(),
            state,
            maximizing_player: self.maximizing_player,
            depth: self.depth + 1,
            last_move: Some(ply),
            utility: None,
        }
    }

    pub const fn state(&self) -> &G {
        &self.state
    }

    pub fn player_to_move(&self) -> G::Player {
        self.player_to_move
    }

    pub fn maximizing_player(&self) -> G::Player {
        self.maximizing_player
    }

    pub const fn depth(&self) -> u32 {
        self.depth
    }

    pub const fn last_move(&self) -> Option<&Ply<G::Move>> {
        self.last_move.as_ref()
    }

    pub const fn utility(&self) -> Option<Score> {
        self.utility
    }

    pub(crate) fn set_utility(&mut self, value: Score) {
        self.utility = Some(value);
    }

    pub fn is_maximizing(&self) -> bool {
        self.player_to_move == self.maximizing_player
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn terminal_utility(&self) -> Result<Score> {
        self.state
            .terminal_utility(self.maximizing_player)
            .ok_or(Error::Precondition(
                "terminal utility requested on a non-terminal node",
            ))
    }

    /// One child per legal move, in the order the rules produce them, or a
    /// single pass child when the player to move has nothing legal.
    pub fn children(&self) -> Result<Vec<Self>> {
        if self.is_terminal() {
            return Err(Error::Precondition("children requested on a terminal node"));
        }

        let moves = self.state.legal_moves();
        if moves.is_empty() {
            return Ok(vec![self.child(self.state.pass(), Ply::Pass)]);
        }

        moves
            .into_iter()
            .map(|mv| {
                let next = self.state.apply_move(&mv)?;
                Ok(self.child(next, Ply::Move(mv)))
            })
            .collect()
    }
}
