use clap::ValueEnum;
use gametree_core::engine::search::AlphaBetaEngine;
use gametree_core::engine::{Evaluator, GameState, Outcome, Ply, SearchConfig, Searcher};
use gametree_core::games::othello::{Othello, PhaseHeuristic};
use gametree_core::games::tictactoe::{LineHeuristic, TicTacToe};
use gametree_core::games::ultimate::{UltimateHeuristic, UltimateTicTacToe};
use gametree_core::{Error, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GameKind {
    TicTacToe,
    Ultimate,
    Othello,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Opponent {
    /// A second engine with the same configuration.
    Engine,
    /// Uniformly random legal moves from a seeded generator.
    Random,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineResult {
    Win,
    Loss,
    Draw,
}

#[derive(Debug, Clone)]
pub struct MatchSettings {
    pub config: Arc<SearchConfig>,
    pub opponent: Opponent,
    pub seed: u64,
    pub engine_second: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchSummary {
    pub game: GameKind,
    pub engine_result: EngineResult,
    pub plies: usize,
    pub engine_nodes: u64,
    pub final_position: String,
}

pub trait Player<G: GameState> {
    fn name(&self) -> &'static str;

    /// Only called on non-terminal states.
    fn choose(&mut self, state: &G) -> Result<Ply<G::Move>>;
}

/// Searches every position from the side to move.
pub struct EnginePlayer<G: GameState, E: Evaluator<G>> {
    engine: AlphaBetaEngine<G, E>,
    side: Option<G::Player>,
    nodes: u64,
}

impl<G: GameState, E: Evaluator<G>> EnginePlayer<G, E> {
    pub fn new(config: Arc<SearchConfig>, evaluator: E) -> Result<Self> {
        Ok(Self {
            engine: AlphaBetaEngine::new(config, evaluator)?,
            side: None,
            nodes: 0,
        })
    }
}

impl<G: GameState, E: Evaluator<G>> Player<G> for EnginePlayer<G, E> {
    fn name(&self) -> &'static str {
        "engine"
    }

    fn choose(&mut self, state: &G) -> Result<Ply<G::Move>> {
        let side = state.player_to_move();
        self.side = Some(side);

        let outcome = self.engine.search(state, side)?;
        self.nodes += outcome.stats.nodes;
        tracing::debug!(
            depth = outcome.stats.depth,
            nodes = outcome.stats.nodes,
            cutoffs = outcome.stats.cutoffs,
            score = outcome.score,
            timed_out = outcome.stats.timed_out,
            "engine decision"
        );
        outcome.best_move.ok_or(Error::NoMoveAvailable)
    }
}

pub struct RandomPlayer {
    rng: StdRng,
}

impl RandomPlayer {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<G: GameState> Player<G> for RandomPlayer {
    fn name(&self) -> &'static str {
        "random"
    }

    fn choose(&mut self, state: &G) -> Result<Ply<G::Move>> {
        Ok(state
            .legal_moves()
            .choose(&mut self.rng)
            .cloned()
            .map_or(Ply::Pass, Ply::Move))
    }
}

pub struct MatchReport<G: GameState> {
    pub outcome: Outcome<G::Player>,
    pub plies: usize,
    pub final_state: G,
}

/// Plays `start` to the end. `first` answers for whoever moves at `start`,
/// `second` for the other side.
pub fn play_match<'a, G: GameState>(
    start: G,
    first: &'a mut dyn Player<G>,
    second: &'a mut dyn Player<G>,
) -> Result<MatchReport<G>> {
    let first_side = start.player_to_move();
    let mut state = start;
    let mut plies = 0;

    loop {
        if let Some(outcome) = state.outcome() {
            tracing::info!(plies, ?outcome, "game over");
            return Ok(MatchReport {
                outcome,
                plies,
                final_state: state,
            });
        }

        let side = state.player_to_move();
        let player = if side == first_side {
            &mut *first
        } else {
            &mut *second
        };
        let ply = player.choose(&state)?;
        plies += 1;
        tracing::info!(n = plies, ?side, by = player.name(), mv = ?ply, "move");

        state = match &ply {
            Ply::Move(mv) => state.apply_move(mv)?,
            Ply::Pass => state.pass(),
        };
    }
}

pub fn run(game: GameKind, settings: &MatchSettings) -> Result<MatchSummary> {
    match game {
        GameKind::TicTacToe => run_game(game, TicTacToe::new(), LineHeuristic, settings),
        GameKind::Ultimate => run_game(game, UltimateTicTacToe::new(), UltimateHeuristic, settings),
        GameKind::Othello => run_game(game, Othello::new(), PhaseHeuristic, settings),
    }
}

fn run_game<G, E>(
    game: GameKind,
    start: G,
    evaluator: E,
    settings: &MatchSettings,
) -> Result<MatchSummary>
where
    G: GameState + fmt::Display + 'static,
    E: Evaluator<G> + Clone + 'static,
{
    let mut engine = EnginePlayer::new(Arc::clone(&settings.config), evaluator.clone())?;
    let mut opponent: Box<dyn Player<G>> = match settings.opponent {
        Opponent::Engine => Box::new(EnginePlayer::new(Arc::clone(&settings.config), evaluator)?),
        Opponent::Random => Box::new(RandomPlayer::new(settings.seed)),
    };

    tracing::info!(
        ?game,
        opponent = opponent.name(),
        engine_second = settings.engine_second,
        max_depth = settings.config.max_depth,
        "starting match"
    );

    let report = if settings.engine_second {
        play_match(start, opponent.as_mut(), &mut engine)?
    } else {
        play_match(start, &mut engine, opponent.as_mut())?
    };

    let engine_result = match (report.outcome, engine.side) {
        (Outcome::Draw, _) => EngineResult::Draw,
        (Outcome::Win(winner), Some(side)) if winner == side => EngineResult::Win,
        (Outcome::Win(_), _) => EngineResult::Loss,
    };

    Ok(MatchSummary {
        game,
        engine_result,
        plies: report.plies,
        engine_nodes: engine.nodes,
        final_position: report.final_state.to_string(),
    })
}
