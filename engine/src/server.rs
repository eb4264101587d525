use std::io::{Error, ErrorKind};
use futures_util::{SinkExt, StreamExt};
use log::{info, error};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::protocol::Message;
use crate::board::Pile;
use crate::game::{Game, GameConfig, Player};

pub async fn serve(host: &str, port: u16) -> Result<(), Error> {
    let address = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&address).await?;
    info!("Listening on: {}", address);

    while let Ok((stream, _)) = listener.accept().await {
        tokio::spawn(async move {
            if let Err(e) = accept_connection(stream).await {
                error!("Connection failed: {:?}", e);
            }
        });
    }

    Ok(())
}

/// Per-connection state. Every `start` replaces the game, and with it the
/// computer's search caches; nothing is shared between games or connections.
#[derive(Default)]
struct Session {
    game: Option<Game>,
}

async fn accept_connection(stream: TcpStream) -> Result<(), Error> {
    let addr = stream.peer_addr()?;
    info!("Peer address: {}", addr);

    let ws_stream = tokio_tungstenite::accept_async(stream)
        .await
        .map_err(|e| Error::new(ErrorKind::ConnectionAborted, e.to_string()))?;
    info!("New WebSocket connection: {}", addr);

    let (mut write, mut read) = ws_stream.split();
    let mut session = Session::default();

    while let Some(raw_message) = read.next().await {
        match raw_message {
            Ok(text_message) => {
                if !text_message.is_text() && !text_message.is_binary() { continue; }
                let response = match serde_json::from_slice::<Value>(&text_message.into_data()) {
                    Ok(data) => {
                        info!("Received: {}", data);
                        handle_message(&mut session, data).unwrap_or_else(|e| {
                            error!("Error handling message: {:?}", e);
                            json!({"error": e.to_string()})
                        })
                    },
                    Err(e) => {
                        error!("Error parsing JSON: {:?}", e);
                        json!({"error": e.to_string()})
                    }
                };
                let response_str = response.to_string();
                write.send(Message::text(response_str.clone())).await
                    .map_err(|e| Error::new(ErrorKind::BrokenPipe, e.to_string()))?;
                info!("Sent: {}", response_str);
            }
            Err(e) => { error!("Error reading websocket message: {:?}", e); }
        }
    }

    info!("Connection closed: {}", addr);
    Ok(())
}

fn handle_message(session: &mut Session, data: Value) -> Result<Value, Error> {
    let map = data.as_object()
        .ok_or_else(|| Error::new(ErrorKind::InvalidInput, "Expected a dict"))?;

    // client message protocol: "start", "move"
    // server message protocol: "state", "move", "legal_moves", "end", "error"
    if map.contains_key("start") {
        let config: GameConfig = match &data["start"] {
            Value::Null => GameConfig::default(),
            start => serde_json::from_value(start.clone())?,
        };
        handle_start(session, config)
    } else if map.contains_key("move") {
        let game = session.game.as_mut()
            .ok_or_else(|| Error::new(ErrorKind::InvalidInput, "Game has not started yet"))?;
        let pile: Pile = serde_json::from_value(data["move"].clone())?;
        handle_move(game, pile)
    } else {
        Err(Error::new(ErrorKind::InvalidInput, format!("Invalid message: {}", data)))
    }
}

fn handle_start(session: &mut Session, config: GameConfig) -> Result<Value, Error> {
    info!("Starting game: {:?}", config);
    let game = session.game.insert(Game::new(config));
    if let Some(game_over) = check_game_over(game) {
        return Ok(json!({ "end": game_over }));
    }
    match game.to_move() {
        Player::Human => Ok(position(game)),
        Player::Computer => make_engine_move(game),
    }
}

fn handle_move(game: &mut Game, pile: Pile) -> Result<Value, Error> {
    game.play_human(pile)?;
    match check_game_over(game) {
        Some(game_over) => Ok(json!({ "end": game_over })),
        None => make_engine_move(game)
    }
}

fn make_engine_move(game: &mut Game) -> Result<Value, Error> {
    let reply = game.play_computer()?;
    match check_game_over(game) {
        Some(game_over) => Ok(json!({ "move": reply.pile, "end": game_over })),
        None => {
            let mut response = position(game);
            response["move"] = json!(reply.pile);
            Ok(response)
        }
    }
}

fn position(game: &Game) -> Value {
    json!({ "state": game.board(), "legal_moves": game.board().legal_moves() })
}

fn check_game_over(game: &Game) -> Option<Value> {
    let status = game.status();
    status.winner().map(|winner| json!({
        "winner": winner,
        "score": status.score(),
        "state": game.board(),
    }))
}
