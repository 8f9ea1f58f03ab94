use tracing::trace;

#[derive(Debug, PartialEq)]
pub enum UciCommand {
    /// "uci" cmd, sent at startup
    Uci,
    /// "isready" cmd, to check if engine is ready
    IsReady,
    /// "ucinewgame" cmd, to setup a new game state
    UciNewGame,
    /// "position" cmd, to setup the board
    Position {
        startpos: bool,
        fen: Option<String>,
        moves: Vec<String>,
    },
    /// "go" cmd, to start search + time controls
    Go(GoParams),
    /// "stop" cmd, to stop search
    Stop,
    /// "setoption" cmd, to configure engine options
    SetOption { name: String, value: String },
    /// "quit" cmd, to exit game
    Quit,
    /// unknown or unsupported cmd
    Unknown(String),
}

#[derive(Debug, PartialEq, Default)]
pub struct GoParams {
    pub wtime: Option<u64>,
    pub btime: Option<u64>,
    pub winc: Option<u64>,
    pub binc: Option<u64>,
    pub moves_to_go: Option<u64>,
    pub move_time: Option<u64>,
    pub depth: Option<u8>,
    pub nodes: Option<u64>,
    pub infinite: bool,
}

pub fn parse_line(line: &str) -> UciCommand {
    trace!("UCI: {line}");
    let parts: Vec<&str> = line.trim().split_ascii_whitespace().collect();
    if parts.is_empty() {
        return UciCommand::Unknown(line.to_string());
    }

    match parts[0] {
        "uci" => UciCommand::Uci,
        "isready" => UciCommand::IsReady,
        "stop" => UciCommand::Stop,
        "quit" => UciCommand::Quit,
        "position" => parse_position(&parts[1..]),
        "go" => parse_go(&parts[1..]),
        "ucinewgame" => UciCommand::UciNewGame,
        "setoption" => parse_setoption(&parts[1..]),
        _ => UciCommand::Unknown(line.to_string()),
    }
}

fn parse_position(parts: &[&str]) -> UciCommand {
    let mut fen: Option<String> = None;
    let mut moves: Vec<String> = Vec::new();
    let mut startpos = false;

    let moves_idx = parts.iter().position(|&p| p == "moves");

    let position_parts = if let Some(idx) = moves_idx {
        &parts[..idx]
    } else {
        parts
    };

    match position_parts.first() {
        Some(&"startpos") => startpos = true,
        Some(&"fen") => fen = Some(position_parts[1..].join(" ")),
        _ => {}
    }

    if let Some(idx) = moves_idx {
        moves = parts[idx + 1..].iter().map(|s| s.to_string()).collect();
    }

    UciCommand::Position {
        startpos,
        fen,
        moves,
    }
}

fn parse_go(parts: &[&str]) -> UciCommand {
    let mut params = GoParams::default();

    let mut i = 0;
    while i < parts.len() {
        let value = parts.get(i + 1);
        let number = || value.and_then(|v| v.parse::<u64>().ok());
        match parts[i] {
            "wtime" => params.wtime = number(),
            "btime" => params.btime = number(),
            "winc" => params.winc = number(),
            "binc" => params.binc = number(),
            "movestogo" => params.moves_to_go = number(),
            "movetime" => params.move_time = number(),
            "nodes" => params.nodes = number(),
            "depth" => params.depth = value.and_then(|v| v.parse().ok()),
            "infinite" => {
                params.infinite = true;
                i += 1;
                continue;
            }
            _ => {
                i += 1;
                continue;
            }
        }
        // skip the value too
        i += 2;
    }

    UciCommand::Go(params)
}

/// `setoption name <name> [value <value>]`, both of which may contain spaces
fn parse_setoption(parts: &[&str]) -> UciCommand {
    let value_idx = parts.iter().position(|&p| p == "value");
    let name_end = value_idx.unwrap_or(parts.len());
    let name_start = parts
        .iter()
        .position(|&p| p == "name")
        .map_or(name_end, |i| (i + 1).min(name_end));

    let name = parts[name_start..name_end].join(" ");
    let value = value_idx.map_or_else(String::new, |i| parts[i + 1..].join(" "));
    UciCommand::SetOption { name, value }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_commands() {
        assert_eq!(parse_line("uci"), UciCommand::Uci);
        assert_eq!(parse_line("  isready  "), UciCommand::IsReady);
        assert_eq!(parse_line("ucinewgame"), UciCommand::UciNewGame);
        assert_eq!(parse_line("stop"), UciCommand::Stop);
        assert_eq!(parse_line("quit"), UciCommand::Quit);
        assert_eq!(
            parse_line("xyzzy 1"),
            UciCommand::Unknown("xyzzy 1".to_string())
        );
    }

    #[test]
    fn position_with_moves() {
        assert_eq!(
            parse_line("position startpos moves e2e4 e7e5"),
            UciCommand::Position {
                startpos: true,
                fen: None,
                moves: vec!["e2e4".to_string(), "e7e5".to_string()],
            }
        );
        assert_eq!(
            parse_line("position fen 8/8/8/8/8/8/8/K6k w - - 0 1"),
            UciCommand::Position {
                startpos: false,
                fen: Some("8/8/8/8/8/8/8/K6k w - - 0 1".to_string()),
                moves: Vec::new(),
            }
        );
    }

    #[test]
    fn go_params() {
        let UciCommand::Go(params) =
            parse_line("go wtime 60000 btime 55000 winc 1000 binc 1000 movestogo 20")
        else {
            panic!("expected go");
        };
        assert_eq!(params.wtime, Some(60000));
        assert_eq!(params.btime, Some(55000));
        assert_eq!(params.winc, Some(1000));
        assert_eq!(params.binc, Some(1000));
        assert_eq!(params.moves_to_go, Some(20));
        assert!(!params.infinite);

        let UciCommand::Go(params) = parse_line("go infinite depth 9 movetime 250") else {
            panic!("expected go");
        };
        assert!(params.infinite);
        assert_eq!(params.depth, Some(9));
        assert_eq!(params.move_time, Some(250));
    }

    #[test]
    fn setoption_with_spaces() {
        assert_eq!(
            parse_line("setoption name LogFile value true"),
            UciCommand::SetOption {
                name: "LogFile".to_string(),
                value: "true".to_string(),
            }
        );
        assert_eq!(
            parse_line("setoption name Clear Hash"),
            UciCommand::SetOption {
                name: "Clear Hash".to_string(),
                value: String::new(),
            }
        );
    }
}
