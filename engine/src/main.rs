mod agent;
mod board;
mod console;
mod engine;
mod game;
mod server;

use std::io::{self, Error, ErrorKind};
use clap::Parser;
use log::info;
use crate::console::Terminal;
use crate::game::{Game, GameConfig, Player};

#[derive(Parser, Debug)]
#[command(author, version, about = "Red-Blue Nim against a minimax opponent", long_about = None)]
struct Args {
    /// Number of red marbles to start the game with
    #[arg(long, default_value_t = 3)]
    red: u32,
    /// Number of blue marbles to start the game with
    #[arg(long, default_value_t = 4)]
    blue: u32,
    /// Depth of the computer's search tree
    #[arg(long, default_value_t = 3)]
    depth: u32,
    /// Player to take the first turn
    #[arg(long = "firstplayer", value_enum, default_value_t = Player::Human)]
    first_player: Player,
    /// Serve games over websocket instead of playing on the console
    #[arg(long)]
    serve: bool,
    #[arg(long, default_value = "localhost")]
    host: String,
    #[arg(long, default_value_t = 9999)]
    port: u16,
    /// Log level (error, warn, info, debug, trace); defaults to warn, or info when serving
    #[arg(long, value_parser = parse_level)]
    log_level: Option<log::Level>,
}

fn parse_level(s: &str) -> Result<log::Level, String> {
    s.parse().map_err(|_| format!("unknown log level: {}", s))
}

fn main() -> Result<(), Error> {
    let args = Args::parse();
    let default_level = if args.serve { log::Level::Info } else { log::Level::Warn };
    simple_logger::init_with_level(args.log_level.unwrap_or(default_level))
        .map_err(|e| Error::new(ErrorKind::Other, e.to_string()))?;

    if args.serve {
        let runtime = tokio::runtime::Runtime::new()?;
        return runtime.block_on(server::serve(&args.host, args.port));
    }

    let config = GameConfig {
        red: args.red,
        blue: args.blue,
        depth: args.depth,
        first_player: args.first_player,
    };
    let mut terminal = Terminal::new(io::stdin().lock(), io::stdout());
    let status = Game::new(config).play(&mut terminal)?;
    info!("final status: {:?}", status);
    Ok(())
}
