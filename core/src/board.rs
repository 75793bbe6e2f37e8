use crate::packet::MessageCode;
use std::fmt;

pub const SIDE: usize = 3;
pub const CELLS: usize = SIDE * SIDE;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("cell out of range (expected: 1-9, found: {0})")]
    OutOfRange(u8),
    #[error("cell {0} is occupied")]
    IllegalMove(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    pub fn opponent(self) -> Self {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }

    /// Data-packet code announcing that this mark won.
    pub fn victory(self) -> MessageCode {
        match self {
            Mark::X => MessageCode::XWins,
            Mark::O => MessageCode::OWins,
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Cell::from(*self))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    Empty,
    X,
    O,
}

impl Default for Cell {
    fn default() -> Self {
        Cell::Empty
    }
}

impl From<Mark> for Cell {
    fn from(mark: Mark) -> Self {
        match mark {
            Mark::X => Cell::X,
            Mark::O => Cell::O,
        }
    }
}

impl Cell {
    pub fn mark(self) -> Option<Mark> {
        match self {
            Cell::Empty => None,
            Cell::X => Some(Mark::X),
            Cell::O => Some(Mark::O),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Cell::Empty => "-",
            Cell::X => "X",
            Cell::O => "O",
        };
        f.write_str(symbol)
    }
}

/// Zero-indexed `(row, col)` of a 1-9 cell index, numbered row-major.
pub fn position(cell: u8) -> Result<(usize, usize), BoardError> {
    match cell {
        1..=9 => {
            let index = (cell - 1) as usize;
            Ok((index / SIDE, index % SIDE))
        }
        cell => Err(BoardError::OutOfRange(cell)),
    }
}

const LINES: [[(usize, usize); SIDE]; 8] = [
    [(0, 0), (0, 1), (0, 2)],
    [(1, 0), (1, 1), (1, 2)],
    [(2, 0), (2, 1), (2, 2)],
    [(0, 0), (1, 0), (2, 0)],
    [(0, 1), (1, 1), (2, 1)],
    [(0, 2), (1, 2), (2, 2)],
    [(0, 0), (1, 1), (2, 2)],
    [(0, 2), (1, 1), (2, 0)],
];

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Board {
    cells: [[Cell; SIDE]; SIDE],
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, cell: u8) -> Result<Cell, BoardError> {
        let (row, col) = position(cell)?;
        Ok(self.cells[row][col])
    }

    pub fn is_occupied(&self, cell: u8) -> Result<bool, BoardError> {
        Ok(self.get(cell)? != Cell::Empty)
    }

    /// Flips one empty cell to `mark`. Callers validate occupancy first;
    /// an occupied cell here means their bookkeeping is broken.
    pub fn place(&mut self, cell: u8, mark: Mark) -> Result<(), BoardError> {
        let (row, col) = position(cell)?;
        let slot = &mut self.cells[row][col];
        if *slot != Cell::Empty {
            return Err(BoardError::IllegalMove(cell));
        }
        *slot = mark.into();
        Ok(())
    }

    /// Cells in row-major order.
    pub fn render(&self) -> [Cell; CELLS] {
        let mut out = [Cell::Empty; CELLS];
        for (slot, cell) in out.iter_mut().zip(self.cells.iter().flatten()) {
            *slot = *cell;
        }
        out
    }

    pub fn winner(&self) -> Option<Mark> {
        LINES.iter().find_map(|line| {
            let [a, b, c] = line.map(|(row, col)| self.cells[row][col]);
            match a.mark() {
                Some(mark) if a == b && b == c => Some(mark),
                _ => None,
            }
        })
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().flatten().all(|cell| *cell != Cell::Empty)
    }

    /// Result code once the game is decided, `None` while it is still open.
    pub fn outcome(&self) -> Option<MessageCode> {
        match self.winner() {
            Some(mark) => Some(mark.victory()),
            None if self.is_full() => Some(MessageCode::DrawMatch),
            None => None,
        }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.iter() {
            writeln!(f, "{}  {}  {}", row[0], row[1], row[2])?;
        }
        Ok(())
    }
}
