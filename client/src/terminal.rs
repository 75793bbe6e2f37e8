use console::Term;
use noughts::board::{Cell, CELLS, SIDE};
use noughts::game::InvalidMove;
use noughts::{GameOutcome, MoveSource, PlayerRole, Presenter};

const PROMPT: &str = "Enter a number between 1 and 9: ";

fn board_lines(cells: &[Cell; CELLS]) -> Vec<String> {
    cells
        .chunks(SIDE)
        .map(|row| {
            row.iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("  ")
        })
        .collect()
}

fn announcement(outcome: GameOutcome) -> &'static str {
    match outcome {
        GameOutcome::Won => "You won!",
        GameOutcome::Lost => "You lost.",
        GameOutcome::Draw => "Draw match!",
        GameOutcome::Undetermined => "Game ended without a result.",
    }
}

/// Writes game events to the terminal.
#[derive(Debug, Clone)]
pub struct ConsolePresenter {
    term: Term,
}

impl ConsolePresenter {
    pub fn new(term: Term) -> Self {
        Self { term }
    }

    fn write_lines<I: IntoIterator<Item = String>>(&self, lines: I) {
        for line in lines {
            if let Err(err) = self.term.write_line(&line) {
                tracing::warn!(%err, "Failed to write to terminal");
                return;
            }
        }
    }
}

impl Presenter for ConsolePresenter {
    fn render_board(&mut self, cells: &[Cell; CELLS]) {
        self.write_lines(std::iter::once(String::new()).chain(board_lines(cells)));
    }

    fn game_ended(&mut self, outcome: GameOutcome) {
        self.write_lines(vec![announcement(outcome).to_owned()]);
    }

    fn role_assigned(&mut self, role: PlayerRole) {
        self.write_lines(vec![format!("You are {}!", role.identifier())]);
    }

    fn move_rejected(&mut self, reason: &InvalidMove) {
        self.write_lines(vec![format!("Invalid move: {}.", reason)]);
    }
}

/// Prompts on the terminal for every move. Piped input is read line by
/// line and runs out at end of file.
#[derive(Debug, Clone)]
pub struct ConsoleMoves {
    term: Term,
}

impl ConsoleMoves {
    pub fn new(term: Term) -> Self {
        Self { term }
    }

    fn read_piped() -> std::io::Result<Option<String>> {
        let mut line = String::new();
        match std::io::stdin().read_line(&mut line)? {
            0 => Ok(None),
            _ => Ok(Some(line)),
        }
    }
}

impl MoveSource for ConsoleMoves {
    fn next_move(&mut self) -> Option<String> {
        let line = self.term.write_str(PROMPT).and_then(|_| {
            if self.term.is_term() {
                self.term.read_line().map(Some)
            } else {
                Self::read_piped()
            }
        });
        match line {
            Ok(line) => line,
            Err(err) => {
                tracing::warn!(%err, "Failed to read move");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows() {
        let mut cells = [Cell::Empty; CELLS];
        cells[0] = Cell::X;
        cells[4] = Cell::O;
        cells[8] = Cell::X;
        assert_eq!(board_lines(&cells), vec!["X  -  -", "-  O  -", "-  -  X"]);
    }

    #[test]
    fn announcements() {
        assert_eq!(announcement(GameOutcome::Won), "You won!");
        assert_eq!(announcement(GameOutcome::Lost), "You lost.");
        assert_eq!(announcement(GameOutcome::Draw), "Draw match!");
    }
}
