use crate::board::{Board, BoardError, Cell, Mark};
use crate::packet::{MessageCode, Packet, PacketKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    Undetermined,
    Won,
    Lost,
    Draw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerRole {
    identifier: Mark,
    opponent: Mark,
}

impl PlayerRole {
    pub fn new(identifier: Mark) -> Self {
        Self {
            identifier,
            opponent: identifier.opponent(),
        }
    }

    pub fn identifier(&self) -> Mark {
        self.identifier
    }

    pub fn opponent(&self) -> Mark {
        self.opponent
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    AwaitingUsernameRequest,
    AwaitingRoleAssignment,
    MyTurn,
    OpponentTurn,
    /// Terminal; only ever holds `Won`, `Lost` or `Draw`.
    GameOver(GameOutcome),
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("board: {0}")]
    Board(#[from] BoardError),
    #[error("opponent moved on occupied cell {0}")]
    OccupiedByOpponent(u8),
    #[error("no role assigned yet")]
    RoleUnassigned,
    #[error("can't move while in state {0:?}")]
    NotMyTurn(State),
}

/// Why a locally entered move was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidMove {
    #[error("entered value is not a number")]
    NotANumber,
    #[error("entered value is not in the range 1 to 9")]
    OutOfRange,
    #[error("location {0} is already occupied")]
    Occupied(u8),
}

/// What a single inbound packet did to the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    UsernameRequested,
    RoleAssigned(PlayerRole),
    OpponentMoved(u8),
    Finished(GameOutcome),
    Ignored,
}

/// Client side game state machine: role, turn ownership and the local board.
#[derive(Debug, Clone)]
pub struct Game {
    state: State,
    board: Board,
    role: Option<PlayerRole>,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    pub fn new() -> Self {
        Self {
            state: State::AwaitingUsernameRequest,
            board: Board::new(),
            role: None,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn role(&self) -> Option<PlayerRole> {
        self.role
    }

    pub fn outcome(&self) -> GameOutcome {
        match self.state {
            State::GameOver(outcome) => outcome,
            _ => GameOutcome::Undetermined,
        }
    }

    pub fn awaits_move(&self) -> bool {
        self.state == State::MyTurn
    }

    pub fn handle(&mut self, packet: Packet) -> Result<Transition, GameError> {
        use MessageCode::*;

        let transition = match (self.state, packet.kind(), packet.message()) {
            (State::GameOver(_), _, _) => Transition::Ignored,
            (State::AwaitingUsernameRequest, PacketKind::Connection, Some(UsernameRequest)) => {
                self.state = State::AwaitingRoleAssignment;
                Transition::UsernameRequested
            }
            (State::AwaitingRoleAssignment, PacketKind::Connection, Some(Player1Indication)) => {
                self.assign(Mark::X)
            }
            (State::AwaitingRoleAssignment, PacketKind::Connection, Some(Player2Indication)) => {
                self.assign(Mark::O)
            }
            (State::OpponentTurn, PacketKind::Data, Some(Move(cell))) => {
                self.opponent_moved(cell)?
            }
            (
                State::MyTurn | State::OpponentTurn,
                PacketKind::Data,
                Some(code @ (DrawMatch | OWins | XWins)),
            ) => self.finish(code)?,
            _ => Transition::Ignored,
        };

        if transition == Transition::Ignored {
            tracing::warn!(?packet, state = ?self.state, "ignoring unexpected packet");
        } else {
            tracing::debug!(?transition, state = ?self.state, "handled packet");
        }
        Ok(transition)
    }

    /// Parses and checks a locally entered move without touching any state.
    pub fn validate_move(&self, input: &str) -> Result<u8, InvalidMove> {
        let input = input.trim();
        if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidMove::NotANumber);
        }
        let cell = match input.parse::<u8>() {
            Ok(cell @ 1..=9) => cell,
            _ => return Err(InvalidMove::OutOfRange),
        };
        match self.board.get(cell) {
            Ok(Cell::Empty) => Ok(cell),
            _ => Err(InvalidMove::Occupied(cell)),
        }
    }

    /// Places our own mark on `cell` and yields the packet announcing it.
    pub fn play(&mut self, cell: u8) -> Result<Packet, GameError> {
        if self.state != State::MyTurn {
            return Err(GameError::NotMyTurn(self.state));
        }
        let role = self.role.ok_or(GameError::RoleUnassigned)?;
        self.board.place(cell, role.identifier())?;
        self.state = State::OpponentTurn;
        Ok(Packet::movement(cell))
    }

    fn assign(&mut self, mark: Mark) -> Transition {
        let role = PlayerRole::new(mark);
        self.role = Some(role);
        self.state = match mark {
            Mark::X => State::MyTurn,
            Mark::O => State::OpponentTurn,
        };
        Transition::RoleAssigned(role)
    }

    fn opponent_moved(&mut self, cell: u8) -> Result<Transition, GameError> {
        let role = self.role.ok_or(GameError::RoleUnassigned)?;
        if self.board.is_occupied(cell)? {
            return Err(GameError::OccupiedByOpponent(cell));
        }
        self.board.place(cell, role.opponent())?;
        self.state = State::MyTurn;
        Ok(Transition::OpponentMoved(cell))
    }

    fn finish(&mut self, code: MessageCode) -> Result<Transition, GameError> {
        let role = self.role.ok_or(GameError::RoleUnassigned)?;
        let winner = match code {
            MessageCode::XWins => Some(Mark::X),
            MessageCode::OWins => Some(Mark::O),
            _ => None,
        };
        let outcome = match winner {
            Some(mark) if mark == role.identifier() => GameOutcome::Won,
            Some(_) => GameOutcome::Lost,
            None => GameOutcome::Draw,
        };
        self.state = State::GameOver(outcome);
        Ok(Transition::Finished(outcome))
    }
}
