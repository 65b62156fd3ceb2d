// Tokenizer for the line protocol. Parsing never fails hard: a line that
// does not match any command comes back as `Unknown` and the caller
// decides how loudly to complain.

use crate::search::SearchParams;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UciCommand {
    Uci,
    IsReady,
    UciNewGame,
    Position {
        fen: Option<String>,
        moves: Vec<String>,
    },
    Go(SearchParams),
    Stop,
    Quit,
    SetOption {
        name: String,
        value: Option<String>,
    },
    /// "d": print the board, a debugging convenience.
    Display,
    Perft(u8),
    Unknown(String),
}

pub fn parse(line: &str) -> UciCommand {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    match tokens.first() {
        None => UciCommand::Unknown(String::new()),
        Some(&"uci") => UciCommand::Uci,
        Some(&"isready") => UciCommand::IsReady,
        Some(&"ucinewgame") => UciCommand::UciNewGame,
        Some(&"stop") => UciCommand::Stop,
        Some(&"quit") => UciCommand::Quit,
        Some(&"d") => UciCommand::Display,
        Some(&"position") => parse_position(&tokens[1..]),
        Some(&"go") => UciCommand::Go(parse_go(&tokens[1..])),
        Some(&"setoption") => parse_setoption(&tokens[1..]),
        Some(&"perft") => match tokens.get(1).and_then(|t| t.parse().ok()) {
            Some(depth) => UciCommand::Perft(depth),
            None => UciCommand::Unknown(line.to_string()),
        },
        Some(_) => UciCommand::Unknown(line.to_string()),
    }
}

fn parse_position(tokens: &[&str]) -> UciCommand {
    let mut fen = None;
    let mut moves = Vec::new();
    let mut i = 0;
    match tokens.first() {
        Some(&"startpos") => i = 1,
        Some(&"fen") => {
            // FEN is six whitespace-separated fields
            let fields: Vec<&str> = tokens[1..]
                .iter()
                .take_while(|t| **t != "moves")
                .copied()
                .collect();
            i = 1 + fields.len();
            fen = Some(fields.join(" "));
        }
        _ => return UciCommand::Unknown(format!("position {}", tokens.join(" "))),
    }
    if tokens.get(i) == Some(&"moves") {
        moves = tokens[i + 1..].iter().map(|t| t.to_string()).collect();
    }
    UciCommand::Position { fen, moves }
}

fn parse_go(tokens: &[&str]) -> SearchParams {
    let mut params = SearchParams::new();
    let mut i = 0;
    while i < tokens.len() {
        let value = |j: usize| tokens.get(j).and_then(|t| t.parse::<u64>().ok());
        match tokens[i] {
            "depth" => {
                if let Some(d) = value(i + 1) {
                    params = params.depth(d.min(u8::MAX as u64) as u8);
                    i += 1;
                }
            }
            "movetime" => {
                if let Some(ms) = value(i + 1) {
                    params = params.movetime(ms);
                    i += 1;
                }
            }
            "wtime" => {
                if let Some(ms) = value(i + 1) {
                    params = params.wtime(ms);
                    i += 1;
                }
            }
            "btime" => {
                if let Some(ms) = value(i + 1) {
                    params = params.btime(ms);
                    i += 1;
                }
            }
            "winc" => {
                if let Some(ms) = value(i + 1) {
                    params = params.winc(ms);
                    i += 1;
                }
            }
            "binc" => {
                if let Some(ms) = value(i + 1) {
                    params = params.binc(ms);
                    i += 1;
                }
            }
            "infinite" => params = params.infinite(),
            _ => {}
        }
        i += 1;
    }
    params
}

fn parse_setoption(tokens: &[&str]) -> UciCommand {
    // setoption name <name tokens> [value <value tokens>]
    if tokens.first() != Some(&"name") {
        return UciCommand::Unknown(format!("setoption {}", tokens.join(" ")));
    }
    let name_tokens: Vec<&str> = tokens[1..]
        .iter()
        .take_while(|t| **t != "value")
        .copied()
        .collect();
    let name = name_tokens.join(" ");
    let value_start = 1 + name_tokens.len() + 1;
    let value = if tokens.len() > value_start {
        Some(tokens[value_start..].join(" "))
    } else {
        None
    };
    UciCommand::SetOption { name, value }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_basic_commands() {
        assert_eq!(parse("uci"), UciCommand::Uci);
        assert_eq!(parse("isready"), UciCommand::IsReady);
        assert_eq!(parse("ucinewgame"), UciCommand::UciNewGame);
        assert_eq!(parse("stop"), UciCommand::Stop);
        assert_eq!(parse("quit"), UciCommand::Quit);
        assert_eq!(parse("  stop  "), UciCommand::Stop);
    }

    #[test]
    fn parses_position_startpos_with_moves() {
        let cmd = parse("position startpos moves e2e4 e7e5");
        assert_eq!(
            cmd,
            UciCommand::Position {
                fen: None,
                moves: vec!["e2e4".into(), "e7e5".into()],
            }
        );
    }

    #[test]
    fn parses_position_fen() {
        let fen = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1";
        let cmd = parse(&format!("position fen {} moves a1a8", fen));
        assert_eq!(
            cmd,
            UciCommand::Position {
                fen: Some(fen.to_string()),
                moves: vec!["a1a8".into()],
            }
        );
    }

    #[test]
    fn parses_go_clock_fields() {
        let cmd = parse("go wtime 300000 btime 300000 winc 2000 binc 2000");
        let expected = SearchParams::new()
            .wtime(300_000)
            .btime(300_000)
            .winc(2_000)
            .binc(2_000);
        assert_eq!(cmd, UciCommand::Go(expected));
    }

    #[test]
    fn parses_go_depth_and_infinite() {
        assert_eq!(parse("go depth 6"), UciCommand::Go(SearchParams::new().depth(6)));
        assert_eq!(parse("go infinite"), UciCommand::Go(SearchParams::new().infinite()));
        assert_eq!(parse("go"), UciCommand::Go(SearchParams::new()));
    }

    #[test]
    fn parses_setoption_name_value() {
        assert_eq!(
            parse("setoption name Hash value 64"),
            UciCommand::SetOption {
                name: "Hash".into(),
                value: Some("64".into()),
            }
        );
        assert_eq!(
            parse("setoption name Clear Hash"),
            UciCommand::SetOption {
                name: "Clear Hash".into(),
                value: None,
            }
        );
    }

    #[test]
    fn garbage_is_reported_not_swallowed() {
        assert!(matches!(parse("xyzzy"), UciCommand::Unknown(_)));
        assert!(matches!(parse("position nowhere"), UciCommand::Unknown(_)));
    }
}
