pub mod admin;
pub mod board;
pub mod game;
pub mod packet;
pub mod session;

pub const PORT: u16 = 9000;
pub const HOST: &str = "127.0.0.1";

pub use admin::AdminChannel;
pub use board::{Board, Cell, Mark};
pub use game::{Game, GameOutcome, PlayerRole, State};
pub use packet::{MessageCode, Packet, PacketKind};
pub use session::{ClientSession, MoveSource, NoMoves, Presenter, SessionEnd};
