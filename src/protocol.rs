//! Line-oriented text protocol for driving the engine from another program.
//!
//! The framing follows GTP: each command may start with a numeric id, and
//! each response is `=id text` on success or `?id message` on failure,
//! followed by a blank line.
//!
//! ## Supported Commands
//!
//! - `name`, `version`, `protocol_version`, `list_commands`,
//!   `known_command <cmd>`, `quit`
//! - `clear_board` - Start a new game on an empty board
//! - `difficulty <easy|medium|hard>` - Load a search preset
//! - `simulations <n>` - Set the simulation budget
//! - `exploration <c>` - Set the UCB1 exploration constant
//! - `seed <n>` - Reseed the random generator
//! - `drop <x> <y>` - Report where a piece dropped into column (x, y) lands
//! - `play <1|2> <x> <y>` - Apply a move; replies `continue`, `win <p>` or `draw`
//! - `genmove <1|2>` - Choose and apply a move; replies `x y z`, followed by
//!   the outcome if the game ended
//! - `valid_moves` - List the valid moves
//! - `showboard` - Render the board, top layer first
//!
//! ## Example
//!
//! ```ignore
//! use stack4::protocol::ProtocolEngine;
//! let mut engine = ProtocolEngine::new();
//! engine.run()?;
//! ```

use std::io::{self, BufRead, Write};

use log::info;

use crate::board::{Board, Player};
use crate::config::{Difficulty, SearchConfig};
use crate::engine::{decide, drop_piece, try_apply, Outcome};
use crate::rules::valid_moves;

/// The list of known commands.
const KNOWN_COMMANDS: &[&str] = &[
    "clear_board",
    "difficulty",
    "drop",
    "exploration",
    "genmove",
    "known_command",
    "list_commands",
    "name",
    "play",
    "protocol_version",
    "quit",
    "seed",
    "showboard",
    "simulations",
    "valid_moves",
    "version",
];

/// Protocol session state: one board and one search configuration.
pub struct ProtocolEngine {
    /// Current game board
    board: Board,
    /// Search settings for `genmove`
    config: SearchConfig,
    rng: fastrand::Rng,
    /// Set once the game has been won or drawn
    finished: Option<Outcome>,
}

impl Default for ProtocolEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ProtocolEngine {
    /// Create an engine with the default search configuration.
    pub fn new() -> Self {
        Self::with_config(SearchConfig::default(), fastrand::Rng::new())
    }

    /// Create an engine with a given configuration and random generator.
    pub fn with_config(config: SearchConfig, rng: fastrand::Rng) -> Self {
        Self {
            board: Board::new(),
            config,
            rng,
            finished: None,
        }
    }

    /// Current board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Run the command loop, reading from stdin and writing to stdout.
    pub fn run(&mut self) -> io::Result<()> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        self.serve(stdin.lock(), stdout.lock())
    }

    /// Run the command loop over arbitrary streams until `quit` or EOF.
    pub fn serve<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        for line in input.lines() {
            let line = line?;

            // Skip empty lines and comments
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (id, command_line) = Self::parse_id(line);
            let parts: Vec<&str> = command_line.split_whitespace().collect();
            let Some((command, args)) = parts.split_first() else {
                continue;
            };
            let command = command.to_lowercase();

            let (success, message) = self.execute(&command, args);
            let prefix = if success { '=' } else { '?' };
            let id_str = id.map(|i| i.to_string()).unwrap_or_default();

            writeln!(output, "{prefix}{id_str} {message}\n")?;
            output.flush()?;

            if command == "quit" {
                break;
            }
        }
        Ok(())
    }

    /// Parse an optional numeric command id from the beginning of the line.
    fn parse_id(line: &str) -> (Option<u32>, &str) {
        let trimmed = line.trim();
        let end = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        if end > 0 {
            if let Ok(id) = trimmed[..end].parse::<u32>() {
                return (Some(id), trimmed[end..].trim());
            }
        }
        (None, trimmed)
    }

    fn parse_player(arg: &str) -> Result<Player, String> {
        arg.parse::<u8>()
            .ok()
            .and_then(Player::from_id)
            .ok_or_else(|| format!("invalid player '{arg}', expected 1 or 2"))
    }

    fn parse_column(args: &[&str]) -> Result<(usize, usize), String> {
        let [x, y] = args else {
            return Err("expected two coordinates".to_string());
        };
        match (x.parse::<usize>(), y.parse::<usize>()) {
            (Ok(x), Ok(y)) => Ok((x, y)),
            _ => Err(format!("invalid coordinates '{x} {y}'")),
        }
    }

    fn ensure_ongoing(&self) -> Result<(), String> {
        match self.finished {
            Some(outcome) => Err(format!("game is over ({outcome})")),
            None => Ok(()),
        }
    }

    /// Execute a command and return (success, response).
    fn execute(&mut self, command: &str, args: &[&str]) -> (bool, String) {
        let result = match command {
            "name" => Ok(env!("CARGO_PKG_NAME").to_string()),
            "version" => Ok(env!("CARGO_PKG_VERSION").to_string()),
            "protocol_version" => Ok("2".to_string()),
            "list_commands" => Ok(KNOWN_COMMANDS.join("\n")),
            "known_command" => match args.first() {
                Some(cmd) => {
                    let known = KNOWN_COMMANDS.contains(&cmd.to_lowercase().as_str());
                    Ok(known.to_string())
                }
                None => Err("missing argument".to_string()),
            },
            "quit" => Ok(String::new()),
            "clear_board" => {
                self.board = Board::new();
                self.finished = None;
                Ok(String::new())
            }
            "difficulty" => self.cmd_difficulty(args),
            "simulations" => self.cmd_simulations(args),
            "exploration" => self.cmd_exploration(args),
            "seed" => self.cmd_seed(args),
            "drop" => Self::parse_column(args).and_then(|(x, y)| {
                self.board
                    .drop_move(x, y)
                    .map(|mv| mv.to_string())
                    .map_err(|e| e.to_string())
            }),
            "play" => self.cmd_play(args),
            "genmove" => self.cmd_genmove(args),
            "valid_moves" => Ok(valid_moves(&self.board)
                .iter()
                .map(|mv| mv.to_string())
                .collect::<Vec<_>>()
                .join("\n")),
            "showboard" => Ok(format!("\n{}", self.board).trim_end().to_string()),
            _ => Err(format!("unknown command: {command}")),
        };
        match result {
            Ok(message) => (true, message),
            Err(message) => (false, message),
        }
    }

    fn cmd_difficulty(&mut self, args: &[&str]) -> Result<String, String> {
        let arg = args.first().ok_or("missing argument")?;
        let difficulty: Difficulty = arg.parse().map_err(|e| format!("{e}"))?;
        self.config = difficulty.config();
        info!("difficulty set to {difficulty}: {:?}", self.config);
        Ok(String::new())
    }

    fn cmd_simulations(&mut self, args: &[&str]) -> Result<String, String> {
        let arg = args.first().ok_or("missing argument")?;
        let n = arg
            .parse::<u32>()
            .map_err(|_| format!("invalid simulation count '{arg}'"))?;
        self.config = self.config.with_simulations(n);
        Ok(String::new())
    }

    fn cmd_exploration(&mut self, args: &[&str]) -> Result<String, String> {
        let arg = args.first().ok_or("missing argument")?;
        let c = arg
            .parse::<f64>()
            .map_err(|_| format!("invalid exploration constant '{arg}'"))?;
        self.config =
            SearchConfig::new(self.config.simulations(), c).map_err(|e| e.to_string())?;
        Ok(String::new())
    }

    fn cmd_seed(&mut self, args: &[&str]) -> Result<String, String> {
        let arg = args.first().ok_or("missing argument")?;
        let seed = arg
            .parse::<u64>()
            .map_err(|_| format!("invalid seed '{arg}'"))?;
        self.rng = fastrand::Rng::with_seed(seed);
        Ok(String::new())
    }

    fn cmd_play(&mut self, args: &[&str]) -> Result<String, String> {
        let (player_arg, column_args) = args.split_first().ok_or("missing arguments")?;
        let player = Self::parse_player(player_arg)?;
        let (x, y) = Self::parse_column(column_args)?;
        self.ensure_ongoing()?;

        let (board, _, outcome) =
            drop_piece(&self.board, x, y, player).map_err(|e| format!("illegal move: {e}"))?;
        self.board = board;
        if outcome.is_over() {
            self.finished = Some(outcome);
        }
        Ok(outcome.to_string())
    }

    fn cmd_genmove(&mut self, args: &[&str]) -> Result<String, String> {
        let player = Self::parse_player(args.first().ok_or("missing argument")?)?;
        self.ensure_ongoing()?;

        let decision =
            decide(&self.board, player, &self.config, &mut self.rng).map_err(|e| e.to_string())?;
        let (board, outcome) =
            try_apply(&self.board, decision.mv, player).map_err(|e| e.to_string())?;
        self.board = board;
        if outcome.is_over() {
            self.finished = Some(outcome);
            Ok(format!("{}\n{outcome}", decision.mv))
        } else {
            Ok(decision.mv.to_string())
        }
    }
}
