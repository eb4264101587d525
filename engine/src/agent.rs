use std::collections::HashMap;
use std::io;
use log::{debug, info};
use crate::board::{Board, Pile};
use crate::console::Console;
use crate::engine::{Engine, Score, SearchStats};

/// The computer's reply to a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComputerMove {
    pub board: Board,
    /// `None` when no pile had a marble to take.
    pub pile: Option<Pile>,
    /// Minimax value of the chosen reply.
    pub value: Option<Score>,
    /// Answered from the decision cache without searching.
    pub cached: bool,
}

/// Minimax-driven opponent. Decisions are remembered per `(red, blue, depth)`.
pub struct ComputerAgent {
    engine: Engine,
    decisions: HashMap<(u32, u32, u32), ComputerMove>,
}

impl ComputerAgent {
    pub fn new() -> Self {
        Self::with_engine(Engine::new())
    }

    pub fn with_engine(engine: Engine) -> Self {
        Self {
            engine,
            decisions: HashMap::new(),
        }
    }

    pub fn stats(&self) -> SearchStats {
        self.engine.stats()
    }

    /// Picks the pile whose resulting position scores highest for the
    /// minimizing opponent. The reply itself is not charged against `depth`.
    /// Ties go to the pile enumerated first.
    pub fn choose_move(&mut self, board: Board, depth: u32) -> ComputerMove {
        let key = (board.red, board.blue, depth);
        if let Some(decision) = self.decisions.get(&key) {
            debug!("decision cache hit for {} at depth {}", board, depth);
            return ComputerMove {
                cached: true,
                ..*decision
            };
        }

        let mut best: Option<(Pile, Score)> = None;
        for pile in board.legal_moves() {
            let value = self.engine.search_root(board.take(pile), depth, false);
            debug!("taking {} from {} scores {}", pile, board, value);
            if best.map_or(true, |(_, best_value)| value > best_value) {
                best = Some((pile, value));
            }
        }

        let decision = ComputerMove {
            board: best.map_or(board, |(pile, _)| board.take(pile)),
            pile: best.map(|(pile, _)| pile),
            value: best.map(|(_, value)| value),
            cached: false,
        };
        let stats = self.engine.stats();
        info!(
            "computer chose {:?} from {} (value {:?}; {} nodes, {} cache hits, {} cutoffs, {} cached so far)",
            decision.pile, board, decision.value, stats.nodes, stats.cache_hits, stats.cutoffs, self.engine.cache_len()
        );
        self.decisions.insert(key, decision);
        decision
    }
}

const PILE_PROMPT: &str = "Choose a pile to remove a marble from (red/blue): ";

/// Moves typed by a person at the console.
pub struct HumanAgent;

impl HumanAgent {
    /// Prompts until the answer is exactly `red` or `blue`.
    pub fn choose_pile<C: Console + ?Sized>(&self, console: &mut C) -> io::Result<Pile> {
        let mut answer = console.prompt(&format!("Your turn. {}", PILE_PROMPT))?;
        loop {
            match answer.parse::<Pile>() {
                Ok(pile) => return Ok(pile),
                Err(e) => {
                    debug!("rejected input: {}", e);
                    answer = console.prompt(&format!("Invalid input. {}", PILE_PROMPT))?;
                }
            }
        }
    }

    /// Naming an empty pile leaves the board as it was.
    pub fn choose_move<C: Console + ?Sized>(&self, board: Board, console: &mut C) -> io::Result<Board> {
        let pile = self.choose_pile(console)?;
        Ok(board.take(pile))
    }
}
