use std::io::{self, BufRead, Write};
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};

use crate::board::{Color, Position};
use crate::evaluation::Evaluator;
use crate::game::{GameState, Status};
use crate::movegen::Move;
use crate::selector::{Difficulty, MoveSelector, SelectorConfig};

#[derive(Debug, Clone)]
pub struct ProtocolConfig {
    /// Side played by the selector, if any.
    pub ai_color: Option<Color>,
    pub difficulty: Difficulty,
    pub seed: Option<u64>,
    /// Pause before the selector answers a move in `run`.
    pub ai_delay: Duration,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            ai_color: None,
            difficulty: Difficulty::default(),
            seed: None,
            ai_delay: Duration::from_millis(500),
        }
    }
}

/// Line-oriented front end to a single game.
///
/// Every command returns its full textual response; nothing is printed except
/// by `run`. Moves arriving here, whether typed, sent as JSON by a peer, or
/// chosen by the selector, all go through `GameState::execute_move`.
pub struct ProtocolHandler {
    game: GameState,
    selector: MoveSelector,
    evaluator: Evaluator,
    config: ProtocolConfig,
}

impl ProtocolHandler {
    pub fn new(config: ProtocolConfig) -> Self {
        let selector = MoveSelector::new(SelectorConfig {
            difficulty: config.difficulty,
            seed: config.seed,
            ..SelectorConfig::default()
        });
        Self {
            game: GameState::new(),
            selector,
            evaluator: Evaluator::new(),
            config,
        }
    }

    pub fn game(&self) -> &GameState {
        &self.game
    }

    pub fn run(&mut self) -> Result<()> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        let mut reader = stdin.lock();
        let mut line = String::new();

        write!(stdout, "{}", self.handle_board())?;
        stdout.flush()?;
        self.play_ai_turn(&mut stdout)?;

        while reader.read_line(&mut line)? > 0 {
            let command = line.trim();
            if command == "quit" {
                break;
            }

            match self.handle_command(command) {
                Ok(response) => write!(stdout, "{response}")?,
                Err(e) => writeln!(stdout, "error: {e}")?,
            }
            stdout.flush()?;
            self.play_ai_turn(&mut stdout)?;

            line.clear();
        }
        Ok(())
    }

    fn play_ai_turn(&mut self, out: &mut impl Write) -> Result<()> {
        if self.ai_to_move() {
            thread::sleep(self.config.ai_delay);
            if let Some(response) = self.ai_reply()? {
                write!(out, "{response}")?;
                out.flush()?;
            }
        }
        Ok(())
    }

    /// True when the configured AI side is to move in a live game and has a
    /// move to play.
    pub fn ai_to_move(&self) -> bool {
        let side = self.game.side_to_move;
        self.config.ai_color == Some(side)
            && !self.game.terminal
            && self.game.has_legal_move(side)
    }

    /// Plays the selector's move when it is the AI side's turn.
    pub fn ai_reply(&mut self) -> Result<Option<String>> {
        if !self.ai_to_move() {
            return Ok(None);
        }
        self.handle_go(&[]).map(Some)
    }

    pub fn handle_command(&mut self, command: &str) -> Result<String> {
        let parts: Vec<&str> = command.split_whitespace().collect();
        if parts.is_empty() {
            return Ok(String::new());
        }

        match parts[0] {
            "new" | "reset" => Ok(self.handle_reset()),
            "board" | "d" => Ok(self.handle_board()),
            "select" => self.handle_select(&parts[1..]),
            "move" => self.handle_move(&parts[1..]),
            "go" => self.handle_go(&parts[1..]),
            "undo" => self.handle_undo(),
            "status" => Ok(self.handle_status()),
            "history" => Ok(self.handle_history()),
            "captured" => Ok(self.handle_captured()),
            "snapshot" => Ok(format!("{}\n", self.game.to_snapshot_json()?)),
            "load" => self.handle_load(command),
            "request" => self.handle_request(command),
            other => bail!("unknown command {other:?}"),
        }
    }

    fn handle_reset(&mut self) -> String {
        self.game.reset();
        "ok\n".to_string()
    }

    fn handle_board(&self) -> String {
        format!("{}{}\n", self.game.board, self.game.turn_indicator())
    }

    fn handle_select(&mut self, parts: &[&str]) -> Result<String> {
        let square: Position = parts
            .first()
            .ok_or_else(|| anyhow!("usage: select <square>"))?
            .parse()?;
        let destinations = self.game.select_piece(square)?;
        let listed: Vec<String> = destinations.iter().map(Position::to_string).collect();
        Ok(format!("moves {}\n", listed.join(" ")))
    }

    fn handle_move(&mut self, parts: &[&str]) -> Result<String> {
        let mv: Move = match parts {
            [mv] => mv.parse::<Move>()?,
            [from, to] => Move::new(from.parse()?, to.parse()?),
            _ => bail!("usage: move <from><to>"),
        };
        let status = self.game.execute_move(mv)?;
        Ok(self.describe_move(status))
    }

    fn handle_go(&mut self, parts: &[&str]) -> Result<String> {
        let difficulty = match parts.first() {
            Some(level) => level.parse::<Difficulty>()?,
            None => self.selector.difficulty(),
        };
        let side = self.game.side_to_move;
        match self.selector.choose_move_with(&self.game, side, difficulty) {
            Some(mv) => {
                let status = self.game.execute_move(mv)?;
                Ok(format!("bestmove {mv}\n{}", self.describe_move(status)))
            }
            None => Ok(format!("bestmove none\nstatus {}\n", self.game.status())),
        }
    }

    fn handle_undo(&mut self) -> Result<String> {
        let record = self.game.undo()?;
        Ok(format!(
            "undone {}\n{}\n",
            record.notation(),
            self.game.turn_indicator()
        ))
    }

    fn handle_status(&self) -> String {
        format!(
            "{}\nstatus {}\nmaterial white {} black {}\nbalance {}\n",
            self.game.turn_indicator(),
            self.game.status(),
            self.evaluator.material(&self.game.board, Color::White),
            self.evaluator.material(&self.game.board, Color::Black),
            self.evaluator.evaluate(&self.game.board, self.game.side_to_move),
        )
    }

    fn handle_history(&self) -> String {
        let mut response = String::new();
        for (number, pair) in self.game.history_notation().chunks(2).enumerate() {
            response.push_str(&format!("{}. {}\n", number + 1, pair.join(" ")));
        }
        response
    }

    fn handle_captured(&self) -> String {
        format!(
            "white {}\nblack {}\n",
            self.game.captured.symbols(Color::White),
            self.game.captured.symbols(Color::Black)
        )
    }

    fn handle_load(&mut self, command: &str) -> Result<String> {
        let json = json_argument(command, "load")?;
        self.game.load_snapshot(json)?;
        Ok(self.handle_board())
    }

    fn handle_request(&mut self, command: &str) -> Result<String> {
        let json = json_argument(command, "request")?;
        let status = self.game.apply_request_json(json)?;
        Ok(self.describe_move(status))
    }

    fn describe_move(&self, status: Status) -> String {
        let last = self
            .game
            .history
            .last()
            .map(|record| record.notation())
            .unwrap_or_default();
        format!(
            "played {last}\nstatus {status}\n{}\n",
            self.game.turn_indicator()
        )
    }
}

/// Everything after the command word, which may itself contain spaces.
fn json_argument<'a>(command: &'a str, keyword: &str) -> Result<&'a str> {
    let json = command.trim_start()[keyword.len()..].trim();
    if json.is_empty() {
        bail!("usage: {keyword} <json>");
    }
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler() -> ProtocolHandler {
        ProtocolHandler::new(ProtocolConfig {
            seed: Some(7),
            ai_delay: Duration::ZERO,
            ..ProtocolConfig::default()
        })
    }

    #[test]
    fn test_move_and_history() {
        let mut handler = handler();
        let response = handler.handle_command("move e2e4").unwrap();
        assert!(response.contains("played ♙e2-e4"));
        assert!(response.contains("status Game in Progress"));
        assert!(response.contains("Black's Turn"));

        handler.handle_command("move e7 e5").unwrap();
        let history = handler.handle_command("history").unwrap();
        assert_eq!(history, "1. ♙e2-e4 ♟e7-e5\n");
    }

    #[test]
    fn test_rejected_commands_leave_game_untouched() {
        let mut handler = handler();
        let before = handler.game().clone();

        assert!(handler.handle_command("move e2e5").is_err());
        assert!(handler.handle_command("move e7e5").is_err());
        assert!(handler.handle_command("move z9e4").is_err());
        assert!(handler.handle_command("undo").is_err());
        assert!(handler.handle_command("select e7").is_err());
        assert!(handler.handle_command("fly").is_err());

        assert_eq!(handler.game(), &before);
    }

    #[test]
    fn test_select_lists_destinations() {
        let mut handler = handler();
        assert_eq!(handler.handle_command("select b1").unwrap(), "moves c3 a3\n");
        assert_eq!(
            handler.handle_command("select e2").unwrap(),
            "moves e3 e4\n"
        );
    }

    #[test]
    fn test_go_plays_for_side_to_move() {
        let mut handler = handler();
        let response = handler.handle_command("go easy").unwrap();
        assert!(response.starts_with("bestmove "));
        assert_eq!(handler.game().side_to_move, Color::Black);
        assert_eq!(handler.game().history.len(), 1);
    }

    #[test]
    fn test_snapshot_load_and_request() {
        let mut handler = handler();
        handler.handle_command("move d2d4").unwrap();
        let snapshot = handler.handle_command("snapshot").unwrap();

        let mut peer = self::handler();
        peer.handle_command(&format!("load {}", snapshot.trim())).unwrap();
        assert_eq!(peer.game().board, handler.game().board);
        assert_eq!(peer.game().side_to_move, Color::Black);

        let response = peer
            .handle_command(r#"request {"from":{"row":1,"col":3},"to":{"row":3,"col":3}}"#)
            .unwrap();
        assert!(response.contains("played ♟d7-d5"));
        assert!(peer
            .handle_command(r#"request {"from":{"row":9,"col":3},"to":{"row":3,"col":3}}"#)
            .is_err());
    }

    #[test]
    fn test_ai_side_detection() {
        let mut handler = ProtocolHandler::new(ProtocolConfig {
            ai_color: Some(Color::Black),
            seed: Some(1),
            ai_delay: Duration::ZERO,
            ..ProtocolConfig::default()
        });
        assert!(!handler.ai_to_move());
        handler.handle_command("move g1f3").unwrap();
        assert!(handler.ai_to_move());
    }

    #[test]
    fn test_ai_opens_when_playing_white() {
        let mut handler = ProtocolHandler::new(ProtocolConfig {
            ai_color: Some(Color::White),
            seed: Some(5),
            ai_delay: Duration::ZERO,
            ..ProtocolConfig::default()
        });
        assert!(handler.ai_to_move());

        let reply = handler.ai_reply().unwrap().unwrap();
        assert!(reply.starts_with("bestmove "));
        assert_eq!(handler.game().side_to_move, Color::Black);
        assert_eq!(handler.game().history.len(), 1);
        assert_eq!(handler.ai_reply().unwrap(), None);
    }

    #[test]
    fn test_stalemated_ai_side_stays_quiet() {
        let board = crate::board::Board::from_diagram(
            "
            k . . . . . . .
            . . Q . . . . .
            . K . . . . . .
            . . . . . . . .
            . . . . . . . .
            . . . . . . . .
            . . . . . . . .
            . . . . . . . .
            ",
        )
        .unwrap();
        let stalemate = GameState::from_board(board, Color::Black).unwrap();
        let snapshot = stalemate.to_snapshot_json().unwrap();

        let mut handler = ProtocolHandler::new(ProtocolConfig {
            ai_color: Some(Color::Black),
            seed: Some(2),
            ai_delay: Duration::ZERO,
            ..ProtocolConfig::default()
        });
        handler.handle_command(&format!("load {snapshot}")).unwrap();
        assert_eq!(handler.game().side_to_move, Color::Black);
        assert!(!handler.game().terminal);
        assert!(!handler.ai_to_move());
        assert_eq!(handler.ai_reply().unwrap(), None);
        assert!(handler.game().history.is_empty());
    }

    #[test]
    fn test_status_reports_material_balance() {
        let mut handler = handler();
        let status = handler.handle_command("status").unwrap();
        assert!(status.contains("material white 390 black 390"));
        assert!(status.ends_with("balance 0\n"));

        for m in ["move e2e4", "move d7d5", "move e4d5"] {
            handler.handle_command(m).unwrap();
        }
        let status = handler.handle_command("status").unwrap();
        assert!(status.contains("Black's Turn"));
        assert!(status.ends_with("balance -10\n"));
    }
}
