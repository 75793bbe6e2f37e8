use crate::referee::Player;
use crate::{admin, Shared};
use noughts::packet::{DecodeError, MessageCode, Packet, PacketKind, FRAME_LEN};
use noughts::session::{validate_username, UsernameError, MAX_USERNAME_LEN};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    IO(#[from] std::io::Error),
    #[error("decode: {0}")]
    Decode(#[from] DecodeError),
    #[error("connection closed during handshake")]
    Closed,
    #[error("username is longer than 64 bytes")]
    UsernameTooLong,
    #[error("{0}")]
    Username(#[from] UsernameError),
    #[error("username is not valid UTF-8")]
    InvalidUsername(#[from] std::string::FromUtf8Error),
    #[error("lobby is closed")]
    LobbyClosed,
}

/// What the peer turned out to be after the username request.
#[derive(Debug)]
pub enum Handshake<S> {
    Player(Player<S>),
    Admin(Packet),
}

/// Requests a username and tells players apart from admin channels by the
/// first byte of the reply.
pub async fn handshake<S>(stream: S) -> Result<Handshake<S>, Error>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut stream = BufReader::new(stream);
    let request = Packet::with_code(PacketKind::Connection, MessageCode::UsernameRequest);
    stream.write_all(&request.to_bytes()).await?;
    stream.flush().await?;

    let first = match stream.fill_buf().await?.first() {
        Some(byte) => *byte,
        None => return Err(Error::Closed),
    };
    if first == PacketKind::Admin as u8 {
        let mut frame = [0; FRAME_LEN];
        stream.read_exact(&mut frame).await?;
        return Ok(Handshake::Admin(Packet::decode(&frame[..])?));
    }

    let name = read_username(&mut stream).await?;
    Ok(Handshake::Player(Player::from_reader(name, stream)))
}

async fn read_username<R>(reader: &mut R) -> Result<String, Error>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::new();
    reader
        .take(MAX_USERNAME_LEN as u64 + 1)
        .read_until(b'\n', &mut line)
        .await?;
    match line.pop() {
        Some(b'\n') => {}
        _ if line.len() >= MAX_USERNAME_LEN => return Err(Error::UsernameTooLong),
        _ => return Err(Error::Closed),
    }

    let name = String::from_utf8(line)?;
    Ok(validate_username(&name)?.to_owned())
}

#[tracing::instrument(skip(stream, shared, lobby))]
pub async fn handle(
    stream: TcpStream,
    address: SocketAddr,
    shared: Arc<Shared>,
    lobby: mpsc::Sender<Player<TcpStream>>,
) -> Result<(), Error> {
    if let Err(err) = stream.set_nodelay(true) {
        tracing::warn!(%err, "Failed to disable Nagle's algorithm");
    }
    match handshake(stream).await? {
        Handshake::Admin(packet) => admin::handle(packet, &shared),
        Handshake::Player(player) => {
            tracing::info!(name = player.name(), "Player joined the lobby");
            lobby.send(player).await.map_err(|_| Error::LobbyClosed)?;
        }
    }
    Ok(())
}
