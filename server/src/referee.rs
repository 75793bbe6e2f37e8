use dashmap::DashMap;
use noughts::board::{Board, BoardError, Mark};
use noughts::packet::{DecodeError, MessageCode, Packet, PacketKind, FRAME_LEN};
use std::fmt;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

pub type ID = uuid::Uuid;
pub type Store = DashMap<ID, Summary>;

const MARKS: [Mark; 2] = [Mark::X, Mark::O];

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    IO(#[from] std::io::Error),
    #[error("decode: {0}")]
    Decode(#[from] DecodeError),
    #[error("board: {0}")]
    Board(#[from] BoardError),
    #[error("expected a move, got {0:?}")]
    UnexpectedPacket(Packet),
    #[error("cell {0} is already occupied")]
    Occupied(u8),
}

/// Ongoing-games store entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub x: String,
    pub o: String,
    pub moves: usize,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (X) vs {} (O), {} moves", self.x, self.o, self.moves)
    }
}

#[derive(Debug)]
pub struct Player<S> {
    name: String,
    stream: BufReader<S>,
}

impl<S: AsyncRead + AsyncWrite + Unpin> Player<S> {
    pub fn new(name: impl Into<String>, stream: S) -> Self {
        Self::from_reader(name, BufReader::new(stream))
    }

    /// Keeps whatever the handshake already buffered.
    pub(crate) fn from_reader(name: impl Into<String>, stream: BufReader<S>) -> Self {
        Self {
            name: name.into(),
            stream,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolves once the player can no longer be paired: the stream ended or
    /// failed, or the client sent bytes before any match started. Nothing is
    /// consumed from the stream.
    pub(crate) async fn departed(&mut self) {
        match self.stream.fill_buf().await {
            Ok([]) => tracing::debug!(player = %self.name, "Connection closed"),
            Ok(bytes) => {
                tracing::warn!(player = %self.name, len = bytes.len(), "Sent data before a match")
            }
            Err(err) => tracing::debug!(player = %self.name, %err, "Connection failed"),
        }
    }

    async fn send(&mut self, packet: Packet) -> Result<(), Error> {
        self.stream.write_all(&packet.to_bytes()).await?;
        self.stream.flush().await?;
        tracing::debug!(player = %self.name, ?packet, "Sent packet");
        Ok(())
    }

    async fn recv(&mut self) -> Result<Packet, Error> {
        let mut frame = [0; FRAME_LEN];
        self.stream.read_exact(&mut frame).await?;
        let packet = Packet::decode(&frame[..])?;
        tracing::debug!(player = %self.name, ?packet, "Received packet");
        Ok(packet)
    }
}

/// One game between two paired players. The referee keeps its own board and
/// is the only party that decides the result.
#[derive(Debug)]
pub struct Match<S> {
    id: ID,
    players: [Player<S>; 2],
    board: Board,
}

impl<S: AsyncRead + AsyncWrite + Unpin> Match<S> {
    pub fn new(x: Player<S>, o: Player<S>) -> Self {
        Self {
            id: ID::new_v4(),
            players: [x, o],
            board: Board::new(),
        }
    }

    pub fn id(&self) -> ID {
        self.id
    }

    pub fn summary(&self) -> Summary {
        Summary {
            x: self.players[0].name.clone(),
            o: self.players[1].name.clone(),
            moves: 0,
        }
    }

    /// Assigns roles and referees moves until the board is decided.
    pub async fn run(mut self, games: &Store) -> Result<MessageCode, Error> {
        let indications = [MessageCode::Player1Indication, MessageCode::Player2Indication];
        for (player, code) in self.players.iter_mut().zip(indications.iter()) {
            player
                .send(Packet::with_code(PacketKind::Connection, *code))
                .await?;
        }

        let mut turn = 0;
        loop {
            let packet = self.players[turn].recv().await?;
            let cell = match (packet.kind(), packet.message()) {
                (PacketKind::Data, Some(MessageCode::Move(cell))) => cell,
                _ => return Err(Error::UnexpectedPacket(packet)),
            };
            if self.board.is_occupied(cell)? {
                return Err(Error::Occupied(cell));
            }
            self.board.place(cell, MARKS[turn])?;
            if let Some(mut summary) = games.get_mut(&self.id) {
                summary.moves += 1;
            }

            if let Some(code) = self.board.outcome() {
                let result = Packet::with_code(PacketKind::Data, code);
                for player in self.players.iter_mut() {
                    if let Err(err) = player.send(result).await {
                        tracing::warn!(player = %player.name, %err, "Could not deliver result");
                    }
                }
                tracing::info!(?code, board = %self.board, "Match decided");
                return Ok(code);
            }

            self.players[1 - turn].send(packet).await?;
            turn = 1 - turn;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::DuplexStream;

    struct Table {
        x: DuplexStream,
        o: DuplexStream,
        game: Match<DuplexStream>,
    }

    fn table() -> Table {
        let (x, x_remote) = tokio::io::duplex(64);
        let (o, o_remote) = tokio::io::duplex(64);
        Table {
            x,
            o,
            game: Match::new(Player::new("xavier", x_remote), Player::new("olga", o_remote)),
        }
    }

    async fn frame(stream: &mut DuplexStream) -> [u8; FRAME_LEN] {
        let mut frame = [0; FRAME_LEN];
        stream.read_exact(&mut frame).await.unwrap();
        frame
    }

    async fn play(mover: &mut DuplexStream, other: &mut DuplexStream, cell: u8) {
        mover.write_all(&[0xBB, 100 + cell]).await.unwrap();
        assert_eq!(frame(other).await, [0xBB, 100 + cell]);
    }

    #[tokio::test]
    async fn roles_then_win_on_anti_diagonal() {
        let Table {
            mut x,
            mut o,
            game,
        } = table();
        let store = Store::new();
        store.insert(game.id(), game.summary());
        let id = game.id();

        let (result, _) = tokio::join!(game.run(&store), async {
            assert_eq!(frame(&mut x).await, [0xAA, 5]);
            assert_eq!(frame(&mut o).await, [0xAA, 6]);
            play(&mut x, &mut o, 3).await;
            play(&mut o, &mut x, 1).await;
            play(&mut x, &mut o, 5).await;
            play(&mut o, &mut x, 2).await;
            x.write_all(&[0xBB, 107]).await.unwrap();
            assert_eq!(frame(&mut x).await, [0xBB, 13]);
            assert_eq!(frame(&mut o).await, [0xBB, 13]);
        });

        assert_eq!(result.unwrap(), MessageCode::XWins);
        assert_eq!(store.get(&id).unwrap().moves, 5);
    }

    #[tokio::test]
    async fn full_board_is_a_draw() {
        let Table {
            mut x,
            mut o,
            game,
        } = table();
        let store = Store::new();

        let (result, _) = tokio::join!(game.run(&store), async {
            frame(&mut x).await;
            frame(&mut o).await;
            for (i, cell) in [1, 2, 3, 5, 4, 6, 8, 7].iter().enumerate() {
                if i % 2 == 0 {
                    play(&mut x, &mut o, *cell).await;
                } else {
                    play(&mut o, &mut x, *cell).await;
                }
            }
            x.write_all(&[0xBB, 109]).await.unwrap();
            assert_eq!(frame(&mut x).await, [0xBB, 11]);
            assert_eq!(frame(&mut o).await, [0xBB, 11]);
        });

        assert_eq!(result.unwrap(), MessageCode::DrawMatch);
    }

    #[tokio::test]
    async fn occupied_cell_aborts() {
        let Table {
            mut x,
            mut o,
            game,
        } = table();
        let store = Store::new();

        let (result, _) = tokio::join!(game.run(&store), async {
            frame(&mut x).await;
            frame(&mut o).await;
            play(&mut x, &mut o, 5).await;
            o.write_all(&[0xBB, 105]).await.unwrap();
        });

        assert!(matches!(result, Err(Error::Occupied(5))));
    }

    #[tokio::test]
    async fn non_move_packet_aborts() {
        let Table { mut x, mut o, game } = table();
        let store = Store::new();

        let (result, _) = tokio::join!(game.run(&store), async {
            frame(&mut x).await;
            frame(&mut o).await;
            x.write_all(&[0xBB, 13]).await.unwrap();
        });

        assert!(matches!(result, Err(Error::UnexpectedPacket(_))));
    }

    #[tokio::test]
    async fn disconnect_aborts() {
        let Table { mut x, mut o, game } = table();
        let store = Store::new();

        let (result, _) = tokio::join!(game.run(&store), async {
            frame(&mut x).await;
            frame(&mut o).await;
            drop(x);
        });

        assert!(matches!(result, Err(Error::IO(_))));
    }

    #[test]
    fn summary_display() {
        let summary = Summary {
            x: "ann".into(),
            o: "bo".into(),
            moves: 3,
        };
        assert_eq!(summary.to_string(), "ann (X) vs bo (O), 3 moves");
    }
}
