//! Wire protocol shared by both peers.
//!
//! A message is a single line of UTF-8 text: the type tag followed by its
//! positional fields, all joined with `|`. [`WireMessage::to_frame`] adds
//! the `\n` terminator; [`crate::FrameDecoder`] strips it on the way in.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tictactoe_core::{ParsePlayerError, Player};

/// Field separator.
pub const SEPARATOR: char = '|';
/// Frame terminator.
pub const TERMINATOR: u8 = b'\n';

/// Message type tag, the first field of every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    Move,
    PlayerInfo,
    GameStart,
    GameStartSync,
    GameReset,
    RematchRequest,
    RematchResponse,
    GameQuit,
    OpponentDisconnected,
    Heartbeat,
    GameEndSync,
    GoToGame,
}

impl MessageType {
    /// Tag as written on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Move => "MOVE",
            Self::PlayerInfo => "PLAYER_INFO",
            Self::GameStart => "GAME_START",
            Self::GameStartSync => "GAME_START_SYNC",
            Self::GameReset => "GAME_RESET",
            Self::RematchRequest => "REMATCH_REQUEST",
            Self::RematchResponse => "REMATCH_RESPONSE",
            Self::GameQuit => "GAME_QUIT",
            Self::OpponentDisconnected => "OPPONENT_DISCONNECTED",
            Self::Heartbeat => "HEARTBEAT",
            Self::GameEndSync => "GAME_END_SYNC",
            Self::GoToGame => "GO_TO_GAME",
        }
    }

    /// Number of `|`-separated fields, tag included.
    #[must_use]
    pub const fn arity(self) -> usize {
        match self {
            Self::Move => 4,
            Self::PlayerInfo => 3,
            _ => 2,
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageType {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "MOVE" => Self::Move,
            "PLAYER_INFO" => Self::PlayerInfo,
            "GAME_START" => Self::GameStart,
            "GAME_START_SYNC" => Self::GameStartSync,
            "GAME_RESET" => Self::GameReset,
            "REMATCH_REQUEST" => Self::RematchRequest,
            "REMATCH_RESPONSE" => Self::RematchResponse,
            "GAME_QUIT" => Self::GameQuit,
            "OPPONENT_DISCONNECTED" => Self::OpponentDisconnected,
            "HEARTBEAT" => Self::Heartbeat,
            "GAME_END_SYNC" => Self::GameEndSync,
            "GO_TO_GAME" => Self::GoToGame,
            other => return Err(DecodeError::UnknownTag(other.to_string())),
        })
    }
}

/// Liveness probe direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Heartbeat {
    Ping,
    Pong,
}

impl Heartbeat {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::Pong => "pong",
        }
    }
}

/// A protocol message exchanged between the two peers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum WireMessage {
    /// A mark was placed. Coordinates are validated by the receiver's rules.
    Move { row: usize, col: usize, player: Player },
    /// Sender's display name and the mark it plays.
    PlayerInfo { name: String, role: Player },
    /// Both sides have exchanged names.
    GameStart,
    /// Acknowledges a reset or an accepted rematch.
    GameStartSync,
    /// Proposes a new game.
    GameReset,
    RematchRequest,
    RematchResponse { accepted: bool },
    /// Sender left the game.
    GameQuit,
    /// Sender is closing the link.
    OpponentDisconnected,
    Heartbeat(Heartbeat),
    /// Sender saw the game end.
    GameEndSync,
    /// Receiver should show the board.
    GoToGame,
}

/// Error decoding a frame. The frame is dropped; the link stays up.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("Empty frame")]
    Empty,
    #[error("Unknown message type: {0:?}")]
    UnknownTag(String),
    #[error("{tag} expects {expected} fields, got {found}")]
    Arity {
        tag: MessageType,
        expected: usize,
        found: usize,
    },
    #[error("Invalid number: {0:?}")]
    InvalidNumber(String),
    #[error(transparent)]
    InvalidPlayer(#[from] ParsePlayerError),
    #[error("Invalid {tag} value: {value:?}")]
    InvalidLiteral { tag: MessageType, value: String },
    #[error("Frame is not valid UTF-8")]
    InvalidUtf8,
    #[error("Frame exceeds {max} bytes")]
    FrameTooLong { max: usize },
}

impl WireMessage {
    #[must_use]
    pub const fn message_type(&self) -> MessageType {
        match self {
            Self::Move { .. } => MessageType::Move,
            Self::PlayerInfo { .. } => MessageType::PlayerInfo,
            Self::GameStart => MessageType::GameStart,
            Self::GameStartSync => MessageType::GameStartSync,
            Self::GameReset => MessageType::GameReset,
            Self::RematchRequest => MessageType::RematchRequest,
            Self::RematchResponse { .. } => MessageType::RematchResponse,
            Self::GameQuit => MessageType::GameQuit,
            Self::OpponentDisconnected => MessageType::OpponentDisconnected,
            Self::Heartbeat(_) => MessageType::Heartbeat,
            Self::GameEndSync => MessageType::GameEndSync,
            Self::GoToGame => MessageType::GoToGame,
        }
    }

    /// Encodes the message without its terminator.
    #[must_use]
    pub fn encode(&self) -> String {
        let tag = self.message_type();
        match self {
            Self::Move { row, col, player } => format!("{tag}|{row}|{col}|{player}"),
            Self::PlayerInfo { name, role } => format!("{tag}|{}|{role}", sanitize_name(name)),
            Self::GameStart => format!("{tag}|start"),
            Self::GameStartSync | Self::GameEndSync => format!("{tag}|sync"),
            Self::GameReset => format!("{tag}|reset"),
            Self::RematchRequest => format!("{tag}|request"),
            Self::RematchResponse { accepted } => format!("{tag}|{accepted}"),
            Self::GameQuit => format!("{tag}|quit"),
            Self::OpponentDisconnected => format!("{tag}|disconnected"),
            Self::Heartbeat(beat) => format!("{tag}|{}", beat.as_str()),
            Self::GoToGame => format!("{tag}|navigate"),
        }
    }

    /// Encodes the message as a terminated frame ready to write.
    #[must_use]
    pub fn to_frame(&self) -> Vec<u8> {
        let mut frame = self.encode().into_bytes();
        frame.push(TERMINATOR);
        frame
    }

    /// Decodes one frame with the terminator already stripped.
    ///
    /// # Errors
    /// Returns an error on an unknown tag, a wrong field count, or a field
    /// that does not parse. Literal fields of signal messages are not
    /// checked.
    pub fn decode(frame: &str) -> Result<Self, DecodeError> {
        if frame.is_empty() {
            return Err(DecodeError::Empty);
        }
        let fields: Vec<&str> = frame.split(SEPARATOR).collect();
        let tag: MessageType = fields[0].parse()?;
        if fields.len() != tag.arity() {
            return Err(DecodeError::Arity {
                tag,
                expected: tag.arity(),
                found: fields.len(),
            });
        }

        Ok(match tag {
            MessageType::Move => Self::Move {
                row: parse_index(fields[1])?,
                col: parse_index(fields[2])?,
                player: fields[3].parse()?,
            },
            MessageType::PlayerInfo => Self::PlayerInfo {
                name: fields[1].to_string(),
                role: fields[2].parse()?,
            },
            MessageType::GameStart => Self::GameStart,
            MessageType::GameStartSync => Self::GameStartSync,
            MessageType::GameReset => Self::GameReset,
            MessageType::RematchRequest => Self::RematchRequest,
            MessageType::RematchResponse => Self::RematchResponse {
                accepted: match fields[1] {
                    "true" => true,
                    "false" => false,
                    other => return Err(invalid_literal(tag, other)),
                },
            },
            MessageType::GameQuit => Self::GameQuit,
            MessageType::OpponentDisconnected => Self::OpponentDisconnected,
            MessageType::Heartbeat => Self::Heartbeat(match fields[1] {
                "ping" => Heartbeat::Ping,
                "pong" => Heartbeat::Pong,
                other => return Err(invalid_literal(tag, other)),
            }),
            MessageType::GameEndSync => Self::GameEndSync,
            MessageType::GoToGame => Self::GoToGame,
        })
    }
}

impl fmt::Display for WireMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

fn parse_index(field: &str) -> Result<usize, DecodeError> {
    field
        .parse()
        .map_err(|_| DecodeError::InvalidNumber(field.to_string()))
}

fn invalid_literal(tag: MessageType, value: &str) -> DecodeError {
    DecodeError::InvalidLiteral {
        tag,
        value: value.to_string(),
    }
}

/// Replaces characters that would break framing.
fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '|' | '\r' | '\n' => ' ',
            c => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_messages() -> Vec<WireMessage> {
        vec![
            WireMessage::Move {
                row: 0,
                col: 0,
                player: Player::X,
            },
            WireMessage::Move {
                row: 2,
                col: 2,
                player: Player::O,
            },
            WireMessage::PlayerInfo {
                name: "Ana".to_string(),
                role: Player::O,
            },
            WireMessage::PlayerInfo {
                name: String::new(),
                role: Player::X,
            },
            WireMessage::GameStart,
            WireMessage::GameStartSync,
            WireMessage::GameReset,
            WireMessage::RematchRequest,
            WireMessage::RematchResponse { accepted: true },
            WireMessage::RematchResponse { accepted: false },
            WireMessage::GameQuit,
            WireMessage::OpponentDisconnected,
            WireMessage::Heartbeat(Heartbeat::Ping),
            WireMessage::Heartbeat(Heartbeat::Pong),
            WireMessage::GameEndSync,
            WireMessage::GoToGame,
        ]
    }

    #[test]
    fn test_every_variant_roundtrips() {
        for msg in all_messages() {
            assert_eq!(WireMessage::decode(&msg.encode()), Ok(msg.clone()), "{msg}");
        }
    }

    #[test]
    fn test_wire_literals() {
        assert_eq!(
            WireMessage::Move {
                row: 1,
                col: 2,
                player: Player::X
            }
            .encode(),
            "MOVE|1|2|X"
        );
        assert_eq!(WireMessage::GameStart.encode(), "GAME_START|start");
        assert_eq!(WireMessage::GameEndSync.encode(), "GAME_END_SYNC|sync");
        assert_eq!(
            WireMessage::OpponentDisconnected.encode(),
            "OPPONENT_DISCONNECTED|disconnected"
        );
        assert_eq!(WireMessage::GoToGame.to_frame(), b"GO_TO_GAME|navigate\n");
    }

    #[test]
    fn test_signal_literal_is_not_checked() {
        assert_eq!(
            WireMessage::decode("GAME_RESET|whatever"),
            Ok(WireMessage::GameReset)
        );
        assert_eq!(
            WireMessage::decode("GAME_START_SYNC|"),
            Ok(WireMessage::GameStartSync)
        );
    }

    #[test]
    fn test_decode_errors() {
        assert_eq!(WireMessage::decode(""), Err(DecodeError::Empty));
        assert_eq!(
            WireMessage::decode("JUMP|1"),
            Err(DecodeError::UnknownTag("JUMP".to_string()))
        );
        assert_eq!(
            WireMessage::decode("MOVE|1|2"),
            Err(DecodeError::Arity {
                tag: MessageType::Move,
                expected: 4,
                found: 3
            })
        );
        assert_eq!(
            WireMessage::decode("GAME_QUIT"),
            Err(DecodeError::Arity {
                tag: MessageType::GameQuit,
                expected: 2,
                found: 1
            })
        );
        assert_eq!(
            WireMessage::decode("MOVE|a|2|X"),
            Err(DecodeError::InvalidNumber("a".to_string()))
        );
        assert_eq!(
            WireMessage::decode("MOVE|-1|2|X"),
            Err(DecodeError::InvalidNumber("-1".to_string()))
        );
        assert!(matches!(
            WireMessage::decode("MOVE|1|2|Z"),
            Err(DecodeError::InvalidPlayer(_))
        ));
        assert!(matches!(
            WireMessage::decode("REMATCH_RESPONSE|yes"),
            Err(DecodeError::InvalidLiteral { .. })
        ));
        assert!(matches!(
            WireMessage::decode("HEARTBEAT|pang"),
            Err(DecodeError::InvalidLiteral { .. })
        ));
    }

    #[test]
    fn test_out_of_board_move_still_decodes() {
        // the rules engine rejects it, not the codec
        assert_eq!(
            WireMessage::decode("MOVE|7|0|O"),
            Ok(WireMessage::Move {
                row: 7,
                col: 0,
                player: Player::O
            })
        );
    }

    #[test]
    fn test_name_is_sanitized() {
        let msg = WireMessage::PlayerInfo {
            name: "a|b\nc".to_string(),
            role: Player::O,
        };
        assert_eq!(msg.encode(), "PLAYER_INFO|a b c|O");
        assert_eq!(
            WireMessage::decode(&msg.encode()),
            Ok(WireMessage::PlayerInfo {
                name: "a b c".to_string(),
                role: Player::O
            })
        );
    }

    #[test]
    fn test_message_serialization() {
        let msg = WireMessage::RematchResponse { accepted: true };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("rematch_response"));
        let parsed: WireMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, msg);
    }
}
