use bytes::{Buf, BufMut};
use std::convert::TryFrom;

/// Every framed message is exactly `[kind][payload]`.
pub const FRAME_LEN: usize = 2;

/// Added to a cell index (1-9) to form a move payload, so moves never
/// collide with the result codes sharing the data namespace.
pub const MOVE_OFFSET: u8 = 100;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed frame: expected 2 bytes, got {0}")]
    MalformedFrame(usize),

    #[error("unknown packet kind {0:#04x}")]
    UnknownPacketKind(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PacketKind {
    Connection = 0xAA,
    Data = 0xBB,
    Admin = 0xCC,
}

impl TryFrom<u8> for PacketKind {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0xAA => Ok(Self::Connection),
            0xBB => Ok(Self::Data),
            0xCC => Ok(Self::Admin),
            value => Err(DecodeError::UnknownPacketKind(value)),
        }
    }
}

/// Meaning of a payload byte. Control codes travel on connection and admin
/// packets, moves and results on data packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageCode {
    UsernameRequest,
    NumOfGames,
    RebootServer,
    DisplayOngoingGames,
    GetGameInfo,
    Player1Indication,
    Player2Indication,
    StartServer,
    ShutdownServer,
    /// Cell index in `1..=9`, carried on the wire as `cell + MOVE_OFFSET`.
    Move(u8),
    DrawMatch,
    OWins,
    XWins,
}

impl MessageCode {
    const CONTROL: [MessageCode; 9] = [
        MessageCode::UsernameRequest,
        MessageCode::NumOfGames,
        MessageCode::RebootServer,
        MessageCode::DisplayOngoingGames,
        MessageCode::GetGameInfo,
        MessageCode::Player1Indication,
        MessageCode::Player2Indication,
        MessageCode::StartServer,
        MessageCode::ShutdownServer,
    ];

    pub fn payload(self) -> u8 {
        match self {
            MessageCode::UsernameRequest => 0,
            MessageCode::NumOfGames => 1,
            MessageCode::RebootServer => 2,
            MessageCode::DisplayOngoingGames => 3,
            MessageCode::GetGameInfo => 4,
            MessageCode::Player1Indication => 5,
            MessageCode::Player2Indication => 6,
            MessageCode::StartServer => 7,
            MessageCode::ShutdownServer => 8,
            MessageCode::Move(cell) => move_payload(cell),
            MessageCode::DrawMatch => 11,
            MessageCode::OWins => 12,
            MessageCode::XWins => 13,
        }
    }

    fn control(payload: u8) -> Option<Self> {
        Self::CONTROL.get(payload as usize).copied()
    }

    fn data(payload: u8) -> Option<Self> {
        match payload {
            11 => Some(MessageCode::DrawMatch),
            12 => Some(MessageCode::OWins),
            13 => Some(MessageCode::XWins),
            payload => cell_from_payload(payload).map(MessageCode::Move),
        }
    }
}

/// Wire payload for a cell index.
pub fn move_payload(cell: u8) -> u8 {
    cell + MOVE_OFFSET
}

/// Cell index carried by a move payload, if the payload is in `101..=109`.
pub fn cell_from_payload(payload: u8) -> Option<u8> {
    match payload.checked_sub(MOVE_OFFSET) {
        Some(cell @ 1..=9) => Some(cell),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packet {
    kind: PacketKind,
    payload: u8,
}

impl Packet {
    pub fn new(kind: PacketKind, payload: u8) -> Self {
        Self { kind, payload }
    }

    pub fn with_code(kind: PacketKind, code: MessageCode) -> Self {
        Self::new(kind, code.payload())
    }

    /// Data packet announcing a move on `cell` (1-9).
    pub fn movement(cell: u8) -> Self {
        Self::new(PacketKind::Data, move_payload(cell))
    }

    pub fn kind(&self) -> PacketKind {
        self.kind
    }

    pub fn payload(&self) -> u8 {
        self.payload
    }

    pub fn encode(&self, mut buf: impl BufMut) {
        buf.put_u8(self.kind as u8);
        buf.put_u8(self.payload);
    }

    pub fn to_bytes(&self) -> [u8; FRAME_LEN] {
        let mut frame = [0; FRAME_LEN];
        self.encode(&mut frame[..]);
        frame
    }

    pub fn decode(mut bytes: impl Buf) -> Result<Self, DecodeError> {
        if bytes.remaining() != FRAME_LEN {
            return Err(DecodeError::MalformedFrame(bytes.remaining()));
        }
        let kind = PacketKind::try_from(bytes.get_u8())?;
        Ok(Self::new(kind, bytes.get_u8()))
    }

    /// Interprets the payload relative to the packet kind. `None` means the
    /// (kind, payload) pair carries no known meaning.
    pub fn message(&self) -> Option<MessageCode> {
        match self.kind {
            PacketKind::Connection | PacketKind::Admin => MessageCode::control(self.payload),
            PacketKind::Data => MessageCode::data(self.payload),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod frame {
        use super::*;

        #[test]
        fn de() {
            const BYTES: &[u8] = &[0xAA, 0x05];
            assert_eq!(
                Packet::decode(BYTES).unwrap(),
                Packet::new(PacketKind::Connection, 5)
            );
        }

        #[test]
        fn ser() {
            let mut buffer = Vec::new();
            Packet::new(PacketKind::Admin, 8).encode(&mut buffer);
            assert_eq!(buffer, [0xCC, 0x08]);
            assert_eq!(Packet::movement(9).to_bytes(), [0xBB, 109]);
        }

        #[test]
        fn wrong_length() {
            assert_eq!(
                Packet::decode(&[0xBBu8][..]),
                Err(DecodeError::MalformedFrame(1))
            );
            assert_eq!(
                Packet::decode(&[0xBBu8, 0x65, 0x00][..]),
                Err(DecodeError::MalformedFrame(3))
            );
            assert_eq!(Packet::decode(&b""[..]), Err(DecodeError::MalformedFrame(0)));
        }

        #[test]
        fn unknown_kind() {
            assert_eq!(
                Packet::decode(&[0x42u8, 0x00][..]),
                Err(DecodeError::UnknownPacketKind(0x42))
            );
        }
    }

    mod message {
        use super::*;

        #[test]
        fn control_codes() {
            let packet = Packet::new(PacketKind::Connection, 0);
            assert_eq!(packet.message(), Some(MessageCode::UsernameRequest));
            let packet = Packet::new(PacketKind::Connection, 6);
            assert_eq!(packet.message(), Some(MessageCode::Player2Indication));
            let packet = Packet::new(PacketKind::Admin, 7);
            assert_eq!(packet.message(), Some(MessageCode::StartServer));
            assert_eq!(Packet::new(PacketKind::Connection, 9).message(), None);
        }

        #[test]
        fn data_codes() {
            let result = |payload| Packet::new(PacketKind::Data, payload).message();
            assert_eq!(result(11), Some(MessageCode::DrawMatch));
            assert_eq!(result(12), Some(MessageCode::OWins));
            assert_eq!(result(13), Some(MessageCode::XWins));
            assert_eq!(result(105), Some(MessageCode::Move(5)));
            assert_eq!(result(100), None);
            assert_eq!(result(110), None);
            assert_eq!(result(5), None);
        }

        #[test]
        fn with_code() {
            let packet = Packet::with_code(PacketKind::Data, MessageCode::XWins);
            assert_eq!(packet.to_bytes(), [0xBB, 13]);
            let packet = Packet::with_code(PacketKind::Admin, MessageCode::ShutdownServer);
            assert_eq!(packet.message(), Some(MessageCode::ShutdownServer));
        }
    }

    mod moves {
        use super::*;

        #[test]
        fn offset_is_exact_for_every_cell() {
            for cell in 1..=9 {
                let packet = Packet::decode(&Packet::movement(cell).to_bytes()[..]).unwrap();
                assert_eq!(packet.message(), Some(MessageCode::Move(cell)));
            }
        }

        #[test]
        fn out_of_range_payloads() {
            assert_eq!(cell_from_payload(0), None);
            assert_eq!(cell_from_payload(100), None);
            assert_eq!(cell_from_payload(101), Some(1));
            assert_eq!(cell_from_payload(109), Some(9));
            assert_eq!(cell_from_payload(255), None);
        }
    }
}
