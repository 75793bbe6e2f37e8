pub mod admin;
pub mod connection;
pub mod lobby;
pub mod referee;

use lobby::Lobby;
use referee::{Player, Store};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    IO(#[from] std::io::Error),
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Hold matchmaking until an admin `StartServer` arrives.
    pub await_start: bool,
}

/// State reachable from every connection task.
#[derive(Debug)]
pub struct Shared {
    games: Arc<Store>,
    started: watch::Sender<bool>,
    shutdown: watch::Sender<bool>,
}

impl Shared {
    pub fn new(config: &Config) -> Self {
        Self {
            games: Arc::new(Store::new()),
            started: watch::channel(!config.await_start).0,
            shutdown: watch::channel(false).0,
        }
    }

    pub fn games(&self) -> &Arc<Store> {
        &self.games
    }

    pub fn is_started(&self) -> bool {
        *self.started.borrow()
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    pub fn start(&self) {
        if !self.started.send_replace(true) {
            tracing::info!("Matchmaking opened");
        }
    }

    pub fn shutdown(&self) {
        if !self.shutdown.send_replace(true) {
            tracing::info!("Shutdown requested");
        }
    }
}

pub struct Server {
    listener: TcpListener,
    shared: Arc<Shared>,
}

impl Server {
    pub async fn bind(address: SocketAddr, config: Config) -> Result<Self, Error> {
        let listener = TcpListener::bind(address).await?;
        Ok(Self {
            listener,
            shared: Arc::new(Shared::new(&config)),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        Ok(self.listener.local_addr()?)
    }

    pub fn shared(&self) -> Arc<Shared> {
        self.shared.clone()
    }

    /// Accepts connections until an admin `ShutdownServer` arrives. Matches
    /// already running are left to the runtime.
    pub async fn run(self) -> Result<(), Error> {
        let Self { listener, shared } = self;
        let (lobby, queue) = mpsc::channel::<Player<TcpStream>>(lobby::CAPACITY);
        tokio::spawn(Lobby::new(queue, shared.started.subscribe(), shared.games.clone()).run());

        let mut shutdown = shared.shutdown.subscribe();
        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, address) = match accepted {
                        Ok(accepted) => accepted,
                        Err(err) => {
                            tracing::warn!(%err, "Failed to accept connection");
                            continue;
                        }
                    };
                    tracing::debug!(%address, "Accepted connection");
                    let shared = shared.clone();
                    let lobby = lobby.clone();
                    tokio::spawn(async move {
                        if let Err(err) = connection::handle(stream, address, shared, lobby).await {
                            tracing::warn!(%address, %err, "Handshake failed");
                        }
                    });
                }
                _ = shutdown.changed() => {}
            }
        }
        tracing::info!("Server stopped");
        Ok(())
    }
}
