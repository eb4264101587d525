use std::fmt;
use std::io::{self, Error, ErrorKind};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use crate::agent::{ComputerAgent, ComputerMove, HumanAgent};
use crate::board::{Board, Pile};
use crate::console::Console;
use crate::engine::{Score, SearchStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Player {
    Human,
    Computer,
}

impl Player {
    pub fn other(self) -> Self {
        match self {
            Player::Human => Player::Computer,
            Player::Computer => Player::Human,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Player::Human => "human",
            Player::Computer => "computer",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub red: u32,
    pub blue: u32,
    /// Look-ahead below the computer's own move.
    pub depth: u32,
    pub first_player: Player,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            red: 3,
            blue: 4,
            depth: 3,
            first_player: Player::Human,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    InProgress,
    HumanWon(Score),
    ComputerWon(Score),
}

impl Status {
    /// An empty red pile goes to the human (3 per blue marble left), an empty
    /// blue pile to the computer (2 per red marble left).
    pub fn of(board: &Board) -> Self {
        if board.red == 0 {
            Status::HumanWon(3 * Score::from(board.blue))
        } else if board.blue == 0 {
            Status::ComputerWon(2 * Score::from(board.red))
        } else {
            Status::InProgress
        }
    }

    pub fn is_over(&self) -> bool {
        *self != Status::InProgress
    }

    pub fn winner(&self) -> Option<Player> {
        match self {
            Status::InProgress => None,
            Status::HumanWon(_) => Some(Player::Human),
            Status::ComputerWon(_) => Some(Player::Computer),
        }
    }

    pub fn score(&self) -> Option<Score> {
        match *self {
            Status::InProgress => None,
            Status::HumanWon(score) | Status::ComputerWon(score) => Some(score),
        }
    }
}

/// One game of Red-Blue Nim between a human and the computer. The game is
/// the only owner of the board; agents hand back new boards.
pub struct Game {
    config: GameConfig,
    board: Board,
    turn: u32,
    computer: ComputerAgent,
}

impl Game {
    pub fn new(config: GameConfig) -> Self {
        Self::with_computer(config, ComputerAgent::new())
    }

    pub fn with_computer(config: GameConfig, computer: ComputerAgent) -> Self {
        Self {
            config,
            board: Board::new(config.red, config.blue),
            turn: 0,
            computer,
        }
    }

    pub fn board(&self) -> Board {
        self.board
    }

    pub fn turns_played(&self) -> u32 {
        self.turn
    }

    pub fn search_stats(&self) -> SearchStats {
        self.computer.stats()
    }

    pub fn status(&self) -> Status {
        Status::of(&self.board)
    }

    pub fn to_move(&self) -> Player {
        if self.turn % 2 == 0 {
            self.config.first_player
        } else {
            self.config.first_player.other()
        }
    }

    fn expect_turn(&self, player: Player) -> io::Result<()> {
        if self.status().is_over() {
            return Err(Error::new(ErrorKind::InvalidInput, "Game is over"));
        }
        if self.to_move() != player {
            return Err(Error::new(ErrorKind::InvalidInput, format!("It is the {}'s turn", self.to_move())));
        }
        Ok(())
    }

    fn advance(&mut self, board: Board) {
        debug!("turn {}: {} -> {}", self.turn, self.board, board);
        self.board = board;
        self.turn += 1;
    }

    pub fn play_human(&mut self, pile: Pile) -> io::Result<Board> {
        self.expect_turn(Player::Human)?;
        let board = self.board.take(pile);
        self.advance(board);
        Ok(board)
    }

    pub fn play_computer(&mut self) -> io::Result<ComputerMove> {
        self.expect_turn(Player::Computer)?;
        let reply = self.computer.choose_move(self.board, self.config.depth);
        self.advance(reply.board);
        Ok(reply)
    }

    /// Plays to the end over `console` and returns the final status.
    pub fn play<C: Console + ?Sized>(&mut self, console: &mut C) -> io::Result<Status> {
        info!("starting game: {:?}", self.config);
        console.say(&format!(
            "Starting game with red={}, blue={}, first_player={}, depth={}",
            self.config.red, self.config.blue, self.config.first_player, self.config.depth
        ))?;

        while !self.status().is_over() {
            match self.to_move() {
                Player::Human => {
                    let board = HumanAgent.choose_move(self.board, console)?;
                    self.advance(board);
                }
                Player::Computer => {
                    let reply = self.play_computer()?;
                    // a remembered decision is replayed silently
                    if !reply.cached {
                        console.say("Computer is taking their turn.")?;
                        if let Some(pile) = reply.pile {
                            console.say(&format!("Computer now takes a {} marble.", pile))?;
                        }
                    }
                }
            }
            console.say(&format!("Current state: {}", self.board))?;
        }

        let status = self.status();
        match status {
            Status::HumanWon(score) => console.say(&format!("You win! Final score: {}", score))?,
            Status::ComputerWon(score) => console.say(&format!("Computer wins! Final score: {}", score))?,
            Status::InProgress => {}
        }
        let stats = self.search_stats();
        info!(
            "game over after {} turns: {:?} ({} nodes searched, {} cache hits)",
            self.turns_played(), status, stats.nodes, stats.cache_hits
        );
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::Terminal;
    use proptest::prelude::*;
    use std::io::Cursor;

    fn play(config: GameConfig, input: &str) -> (io::Result<Status>, String) {
        let mut terminal = Terminal::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());
        let result = Game::new(config).play(&mut terminal);
        (result, String::from_utf8(terminal.into_output()).unwrap())
    }

    fn config(red: u32, blue: u32, depth: u32, first_player: Player) -> GameConfig {
        GameConfig { red, blue, depth, first_player }
    }

    #[test]
    fn defaults_match_command_line() {
        assert_eq!(GameConfig::default(), config(3, 4, 3, Player::Human));
        let partial: GameConfig = serde_json::from_str(r#"{"red": 7, "first_player": "computer"}"#).unwrap();
        assert_eq!(partial, config(7, 4, 3, Player::Computer));
    }

    #[test]
    fn status_scores_the_remaining_pile() {
        assert_eq!(Status::of(&Board::new(0, 4)), Status::HumanWon(12));
        assert_eq!(Status::of(&Board::new(5, 0)), Status::ComputerWon(10));
        assert_eq!(Status::of(&Board::new(0, 0)), Status::HumanWon(0));
        assert_eq!(Status::of(&Board::new(1, 1)), Status::InProgress);
        assert_eq!(Status::HumanWon(3).winner(), Some(Player::Human));
        assert_eq!(Status::InProgress.score(), None);
    }

    #[test]
    fn empty_blue_pile_ends_game_before_any_move() {
        let (status, output) = play(config(1, 0, 3, Player::Human), "");
        assert_eq!(status.unwrap(), Status::ComputerWon(2));
        assert_eq!(
            output,
            "Starting game with red=1, blue=0, first_player=human, depth=3\n\
             Computer wins! Final score: 2\n"
        );
    }

    #[test]
    fn empty_red_pile_ends_game_before_any_move() {
        let (status, output) = play(config(0, 1, 3, Player::Computer), "");
        assert_eq!(status.unwrap(), Status::HumanWon(3));
        assert!(output.ends_with("You win! Final score: 3\n"));
    }

    #[test]
    fn computer_opening_on_single_marbles() {
        let (status, output) = play(config(1, 1, 3, Player::Computer), "");
        assert_eq!(status.unwrap(), Status::HumanWon(3));
        assert_eq!(
            output,
            "Starting game with red=1, blue=1, first_player=computer, depth=3\n\
             Computer is taking their turn.\n\
             Computer now takes a red marble.\n\
             Current state: red = 0, blue = 1\n\
             You win! Final score: 3\n"
        );
    }

    #[test]
    fn human_and_computer_alternate() {
        let (status, output) = play(config(1, 2, 3, Player::Human), "yellow\nblue\n");
        assert_eq!(status.unwrap(), Status::HumanWon(3));
        assert_eq!(
            output,
            "Starting game with red=1, blue=2, first_player=human, depth=3\n\
             Your turn. Choose a pile to remove a marble from (red/blue): \
             Invalid input. Choose a pile to remove a marble from (red/blue): \
             Current state: red = 1, blue = 1\n\
             Computer is taking their turn.\n\
             Computer now takes a red marble.\n\
             Current state: red = 0, blue = 1\n\
             You win! Final score: 3\n"
        );
    }

    #[test]
    fn remembered_decision_is_replayed_silently() {
        let mut computer = ComputerAgent::new();
        computer.choose_move(Board::new(1, 1), 3);
        let mut terminal = Terminal::new(Cursor::new(Vec::<u8>::new()), Vec::new());
        let status = Game::with_computer(config(1, 1, 3, Player::Computer), computer)
            .play(&mut terminal)
            .unwrap();
        assert_eq!(status, Status::HumanWon(3));
        let output = String::from_utf8(terminal.into_output()).unwrap();
        assert_eq!(
            output,
            "Starting game with red=1, blue=1, first_player=computer, depth=3\n\
             Current state: red = 0, blue = 1\n\
             You win! Final score: 3\n"
        );
        assert!(!output.contains("Computer is taking their turn."));
        assert!(!output.contains("Computer now takes"));
    }

    #[test]
    fn moves_out_of_turn_are_rejected() {
        let mut game = Game::new(config(3, 3, 2, Player::Human));
        assert_eq!(game.play_computer().unwrap_err().kind(), ErrorKind::InvalidInput);
        assert_eq!(game.play_human(Pile::Blue).unwrap(), Board::new(3, 2));
        assert_eq!(game.to_move(), Player::Computer);
        assert_eq!(game.play_human(Pile::Red).unwrap_err().kind(), ErrorKind::InvalidInput);
        game.play_computer().unwrap();
        assert_eq!(game.turns_played(), 2);
    }

    #[test]
    fn finished_game_accepts_no_moves() {
        let mut game = Game::new(config(1, 1, 3, Player::Human));
        assert_eq!(game.play_human(Pile::Blue).unwrap(), Board::new(1, 0));
        assert_eq!(game.status(), Status::ComputerWon(2));
        assert_eq!(game.play_computer().unwrap_err().kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn running_out_of_input_is_an_error() {
        let (status, _) = play(config(3, 4, 3, Player::Human), "red\n");
        assert_eq!(status.unwrap_err().kind(), ErrorKind::UnexpectedEof);
    }

    #[test]
    fn identical_games_produce_identical_transcripts() {
        let input = "red\nblue\nred\nblue\nred\nblue\nred\n";
        let (first_status, first) = play(GameConfig::default(), input);
        let (second_status, second) = play(GameConfig::default(), input);
        assert_eq!(first_status.unwrap(), second_status.unwrap());
        assert_eq!(first, second);
    }

    proptest! {
        #[test]
        fn games_end_within_marble_count(
            red in 1u32..12,
            blue in 1u32..12,
            depth in 0u32..5,
            computer_first: bool,
            picks in proptest::collection::vec(any::<bool>(), 24),
        ) {
            let first_player = if computer_first { Player::Computer } else { Player::Human };
            let input: String = picks.iter().map(|&red| if red { "red\n" } else { "blue\n" }).collect();
            let mut terminal = Terminal::new(Cursor::new(input.into_bytes()), Vec::new());
            let mut game = Game::new(config(red, blue, depth, first_player));
            let status = game.play(&mut terminal).unwrap();
            prop_assert!(status.is_over());
            prop_assert!(game.turns_played() <= red + blue);
            prop_assert_eq!(status, Status::of(&game.board()));
        }
    }
}
