use crate::referee::{Match, Player, Store};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, watch};
use tracing::Instrument;

/// Players waiting to be paired.
pub const CAPACITY: usize = 32;

/// Pairs queued players first-come-first-served and hands each pair to a
/// referee task. Pairing is held while matchmaking is closed, and a waiting
/// player who disconnects is dropped instead of paired.
#[derive(Debug)]
pub struct Lobby<S> {
    queue: mpsc::Receiver<Player<S>>,
    started: watch::Receiver<bool>,
    games: Arc<Store>,
}

impl<S> Lobby<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    pub fn new(
        queue: mpsc::Receiver<Player<S>>,
        started: watch::Receiver<bool>,
        games: Arc<Store>,
    ) -> Self {
        Self {
            queue,
            started,
            games,
        }
    }

    pub async fn run(mut self) {
        loop {
            if !self.wait_for_start().await {
                return;
            }
            let mut x = match self.queue.recv().await {
                Some(player) => player,
                None => return,
            };
            tracing::info!(player = x.name(), "Waiting for an opponent");
            let o = loop {
                tokio::select! {
                    biased;
                    _ = x.departed() => {
                        tracing::info!(player = x.name(), "Left the lobby");
                        x = match self.queue.recv().await {
                            Some(player) => player,
                            None => return,
                        };
                        tracing::info!(player = x.name(), "Waiting for an opponent");
                    }
                    player = self.queue.recv() => match player {
                        Some(player) => break player,
                        None => return,
                    },
                }
            };
            self.spawn(Match::new(x, o));
        }
    }

    async fn wait_for_start(&mut self) -> bool {
        while !*self.started.borrow() {
            if self.started.changed().await.is_err() {
                return false;
            }
        }
        true
    }

    fn spawn(&self, game: Match<S>) {
        let id = game.id();
        let summary = game.summary();
        tracing::info!(%id, %summary, "Starting match");
        self.games.insert(id, summary);

        let games = self.games.clone();
        tokio::spawn(
            async move {
                match game.run(&games).await {
                    Ok(code) => tracing::info!(?code, "Match finished"),
                    Err(err) => tracing::warn!(%err, "Match aborted"),
                }
                games.remove(&id);
            }
            .instrument(tracing::info_span!("match", %id)),
        );
    }
}
