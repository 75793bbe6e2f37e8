use crate::Shared;
use noughts::packet::{MessageCode, Packet, PacketKind};

/// Acts on a single admin packet. Admin channels get no reply.
pub fn handle(packet: Packet, shared: &Shared) {
    let code = match (packet.kind(), packet.message()) {
        (PacketKind::Admin, Some(code)) => code,
        _ => {
            tracing::warn!(?packet, "Ignoring malformed admin packet");
            return;
        }
    };

    match code {
        MessageCode::StartServer => shared.start(),
        MessageCode::ShutdownServer => shared.shutdown(),
        MessageCode::NumOfGames => tracing::info!(games = shared.games().len(), "Ongoing games"),
        MessageCode::DisplayOngoingGames => {
            tracing::info!(games = shared.games().len(), "Ongoing games");
            for game in shared.games().iter() {
                tracing::info!(id = %game.key(), "{}", game.value());
            }
        }
        MessageCode::RebootServer | MessageCode::GetGameInfo => {
            tracing::warn!(?code, "Unsupported admin command")
        }
        code => tracing::warn!(?code, "Not an admin command"),
    }
}
