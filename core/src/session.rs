use crate::board::{Cell, CELLS};
use crate::game::{Game, GameError, GameOutcome, InvalidMove, PlayerRole, Transition};
use crate::packet::{DecodeError, Packet, PacketKind, FRAME_LEN};
use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};

/// Where the player's intended moves come from.
pub trait MoveSource {
    /// Raw text of the next candidate move, or `None` once the source has
    /// nothing more to offer.
    fn next_move(&mut self) -> Option<String>;
}

/// Move source of a client that only joins and watches.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoMoves;

impl MoveSource for NoMoves {
    fn next_move(&mut self) -> Option<String> {
        None
    }
}

/// Receives board and outcome notifications.
pub trait Presenter {
    fn render_board(&mut self, cells: &[Cell; CELLS]);

    fn game_ended(&mut self, outcome: GameOutcome);

    fn role_assigned(&mut self, _role: PlayerRole) {}

    fn move_rejected(&mut self, _reason: &InvalidMove) {}
}

/// Longest username line the server accepts, newline excluded.
pub const MAX_USERNAME_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UsernameError {
    #[error("username is empty")]
    Empty,
    #[error("username is longer than 64 bytes")]
    TooLong,
    #[error("username contains control characters")]
    ControlCharacter,
    /// Byte 0xCC opens an admin frame, so the server would not read a name.
    #[error("username starts with the admin packet byte")]
    AdminPrefix,
}

/// Trims `name` and checks that it fits on the single handshake line.
pub fn validate_username(name: &str) -> Result<&str, UsernameError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(UsernameError::Empty);
    }
    if name.len() > MAX_USERNAME_LEN {
        return Err(UsernameError::TooLong);
    }
    if name.chars().any(char::is_control) {
        return Err(UsernameError::ControlCharacter);
    }
    if name.as_bytes()[0] == PacketKind::Admin as u8 {
        return Err(UsernameError::AdminPrefix);
    }
    Ok(name)
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("connection: {0}")]
    Connection(#[source] io::Error),
    #[error("io: {0}")]
    IO(#[from] io::Error),
    #[error("decode: {0}")]
    Decode(#[from] DecodeError),
    #[error("game: {0}")]
    Game(#[from] GameError),
    #[error("username: {0}")]
    Username(#[from] UsernameError),
}

/// How a session left its receive loop without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Finished(GameOutcome),
    /// The server closed the transport.
    Closed,
    /// A move was required but the move source was exhausted.
    OutOfMoves,
}

fn is_closed(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::UnexpectedEof
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
    )
}

/// A write that failed because the server went away ends the session
/// like a closed read does.
fn closed_on_write(result: Result<(), Error>) -> Result<Option<SessionEnd>, Error> {
    match result {
        Ok(()) => Ok(None),
        Err(Error::IO(err)) if is_closed(&err) => {
            tracing::info!(%err, "Server closed the connection");
            Ok(Some(SessionEnd::Closed))
        }
        Err(err) => Err(err),
    }
}

#[derive(Debug)]
pub struct ClientSession<T> {
    transport: T,
    username: String,
    game: Game,
}

impl ClientSession<TcpStream> {
    #[tracing::instrument(skip(address))]
    pub fn connect(address: impl ToSocketAddrs, username: &str) -> Result<Self, Error> {
        let stream = TcpStream::connect(address).map_err(Error::Connection)?;
        if let Err(err) = stream.set_nodelay(true) {
            tracing::warn!(%err, "Failed to disable Nagle's algorithm");
        }
        tracing::info!(peer = ?stream.peer_addr().ok(), "Connected");
        Ok(Self::new(stream, username))
    }
}

impl<T: Read + Write> ClientSession<T> {
    pub fn new(transport: T, username: impl Into<String>) -> Self {
        Self {
            transport,
            username: username.into(),
            game: Game::new(),
        }
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Drives the game until it ends or the server goes away. Blocks on every
    /// receive and on the move source.
    pub fn run(
        &mut self,
        moves: &mut impl MoveSource,
        presenter: &mut impl Presenter,
    ) -> Result<SessionEnd, Error> {
        loop {
            let packet = match self.recv() {
                Ok(packet) => packet,
                Err(Error::IO(err)) if is_closed(&err) => {
                    tracing::info!("Server closed the connection");
                    return Ok(SessionEnd::Closed);
                }
                Err(Error::Decode(DecodeError::UnknownPacketKind(kind))) => {
                    tracing::warn!(kind, "Skipping frame of unknown kind");
                    continue;
                }
                Err(err) => return Err(err),
            };

            match self.game.handle(packet)? {
                Transition::UsernameRequested => {
                    let name = self.username.clone();
                    if let Some(end) = closed_on_write(self.send_username(&name))? {
                        return Ok(end);
                    }
                }
                Transition::RoleAssigned(role) => presenter.role_assigned(role),
                Transition::OpponentMoved(_) => presenter.render_board(&self.game.board().render()),
                Transition::Finished(outcome) => {
                    presenter.game_ended(outcome);
                    return Ok(SessionEnd::Finished(outcome));
                }
                Transition::Ignored => {}
            }

            if self.game.awaits_move() {
                let cell = match self.read_move(moves, presenter) {
                    Some(cell) => cell,
                    None => {
                        tracing::info!("Move source exhausted, leaving the game");
                        return Ok(SessionEnd::OutOfMoves);
                    }
                };
                let packet = self.game.play(cell)?;
                if let Some(end) = closed_on_write(self.send(packet))? {
                    return Ok(end);
                }
                presenter.render_board(&self.game.board().render());
            }
        }
    }

    /// Writes the username line. This is the only message that is not a
    /// 2-byte frame.
    pub fn send_username(&mut self, name: &str) -> Result<(), Error> {
        let name = validate_username(name)?;
        let line = format!("{}\n", name);
        self.transport.write_all(line.as_bytes())?;
        self.transport.flush()?;
        tracing::debug!(username = name, "Sent username");
        Ok(())
    }

    fn read_move(
        &mut self,
        moves: &mut impl MoveSource,
        presenter: &mut impl Presenter,
    ) -> Option<u8> {
        loop {
            let input = moves.next_move()?;
            match self.game.validate_move(&input) {
                Ok(cell) => return Some(cell),
                Err(reason) => {
                    tracing::debug!(%reason, ?input, "Rejected move");
                    presenter.move_rejected(&reason);
                }
            }
        }
    }

    fn send(&mut self, packet: Packet) -> Result<(), Error> {
        self.transport.write_all(&packet.to_bytes())?;
        self.transport.flush()?;
        tracing::debug!(?packet, "Sent packet");
        Ok(())
    }

    fn recv(&mut self) -> Result<Packet, Error> {
        let mut frame = [0; FRAME_LEN];
        self.transport.read_exact(&mut frame)?;
        let packet = Packet::decode(&frame[..])?;
        tracing::debug!(?packet, "Received packet");
        Ok(packet)
    }
}
