use crate::packet::{MessageCode, Packet, PacketKind, FRAME_LEN};
use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("connection: {0}")]
    Connection(#[source] io::Error),
    #[error("io: {0}")]
    IO(#[from] io::Error),
}

/// Fire-and-forget sender of server administration commands.
#[derive(Debug)]
pub struct AdminChannel<T> {
    transport: T,
}

impl AdminChannel<TcpStream> {
    /// Connects and consumes the server's username request, so nothing is
    /// left unread when the channel is dropped.
    #[tracing::instrument(skip(address))]
    pub fn connect(address: impl ToSocketAddrs) -> Result<Self, Error> {
        let mut stream = TcpStream::connect(address).map_err(Error::Connection)?;
        let mut greeting = [0; FRAME_LEN];
        stream.read_exact(&mut greeting)?;
        tracing::debug!(greeting = ?Packet::decode(&greeting[..]), "Connected");
        Ok(Self::new(stream))
    }
}

impl<T: Write> AdminChannel<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn request_start(&mut self) -> Result<(), Error> {
        self.send(MessageCode::StartServer)
    }

    pub fn request_shutdown(&mut self) -> Result<(), Error> {
        self.send(MessageCode::ShutdownServer)
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    fn send(&mut self, code: MessageCode) -> Result<(), Error> {
        let packet = Packet::with_code(PacketKind::Admin, code);
        self.transport.write_all(&packet.to_bytes())?;
        self.transport.flush()?;
        tracing::info!(?code, "Sent admin command");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Refusing;

    impl Write for Refusing {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn start() {
        let mut admin = AdminChannel::new(Vec::new());
        admin.request_start().unwrap();
        assert_eq!(admin.into_inner(), [0xCC, 7]);
    }

    #[test]
    fn shutdown() {
        let mut admin = AdminChannel::new(Vec::new());
        admin.request_shutdown().unwrap();
        assert_eq!(admin.into_inner(), [0xCC, 8]);
    }

    #[test]
    fn failure_is_reported() {
        let mut admin = AdminChannel::new(Refusing);
        assert!(matches!(admin.request_start(), Err(Error::IO(_))));
    }
}
