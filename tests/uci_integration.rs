use alfiere::uci::{parse, UciCommand, UciEngine};

fn drive(engine: &mut UciEngine, line: &str) -> Vec<String> {
    engine.handle_command(parse(line))
}

#[test]
fn handshake_sequence() {
    let mut engine = UciEngine::new();
    let replies = drive(&mut engine, "uci");
    assert!(replies.iter().any(|r| r.starts_with("id name")));
    assert!(replies.iter().any(|r| r.starts_with("id author")));
    assert_eq!(replies.last().map(String::as_str), Some("uciok"));
    assert_eq!(drive(&mut engine, "isready"), vec!["readyok"]);
}

#[test]
fn go_then_stop_yields_control_promptly() {
    let mut engine = UciEngine::new();
    drive(&mut engine, "position startpos moves e2e4 e7e5");
    // unbounded search; stop must interrupt it and join the worker
    assert!(drive(&mut engine, "go infinite").is_empty());
    std::thread::sleep(std::time::Duration::from_millis(50));
    drive(&mut engine, "stop");
    // the engine is reusable afterwards
    assert_eq!(drive(&mut engine, "isready"), vec!["readyok"]);
    engine.shutdown();
}

#[test]
fn consecutive_go_commands_serialize() {
    let mut engine = UciEngine::new();
    drive(&mut engine, "position startpos");
    drive(&mut engine, "go depth 2");
    // second go implicitly stops the first worker before spawning
    drive(&mut engine, "go depth 2");
    drive(&mut engine, "stop");
    engine.shutdown();
}

#[test]
fn ucinewgame_resets_to_the_start_position() {
    let mut engine = UciEngine::new();
    drive(&mut engine, "position startpos moves e2e4");
    drive(&mut engine, "ucinewgame");
    let display = drive(&mut engine, "d");
    // the pawn is back home: rank 2 fully populated
    assert!(display[0].contains("P P P P P P P P"));
}

#[test]
fn display_command_prints_the_board() {
    let mut engine = UciEngine::new();
    let display = drive(&mut engine, "d");
    assert_eq!(display.len(), 1);
    assert!(display[0].contains("r n b q k b n r"));
}

#[test]
fn perft_command_counts_from_the_current_position() {
    let mut engine = UciEngine::new();
    drive(&mut engine, "position startpos moves e2e4");
    let replies = drive(&mut engine, "perft 1");
    assert!(replies[0].contains("nodes 20"));
}

#[test]
fn unknown_commands_are_ignored() {
    let mut engine = UciEngine::new();
    assert!(drive(&mut engine, "xyzzy frobnicate").is_empty());
    assert!(matches!(parse("xyzzy"), UciCommand::Unknown(_)));
}
