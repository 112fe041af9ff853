//! Wire protocol and tuning constants shared by the client components.
//!
//! Every message is a single newline-free JSON text with a `type`
//! discriminator, sent over one persistent TCP connection and framed by
//! newlines. The record types carry the decode defaults the server is
//! allowed to omit: numeric fields fall back to zero, `lives` to 3 and
//! powerup `active` to true.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Base movement speed of a player, in pixels per second.
pub const PLAYER_SPEED: f32 = 200.0;
/// Multiplier applied to [`PLAYER_SPEED`] while a speed boost is active.
pub const SPEED_BOOST_MULTIPLIER: f32 = 1.5;
/// Displacements at or below this many pixels are absorbed by normal
/// target-seeking (the Tracking strategy).
pub const SNAP_THRESHOLD: f32 = 8.0;
/// Displacements above [`SNAP_THRESHOLD`] and at or below this many pixels
/// are corrected with a timed ease-out tween (the Smoothing strategy);
/// anything larger teleports.
pub const SMOOTH_THRESHOLD: f32 = 200.0;
/// Bounds for the smoothing tween duration, in milliseconds.
pub const SMOOTH_MIN_MS: f32 = 80.0;
pub const SMOOTH_MAX_MS: f32 = 300.0;
/// Fraction of the remaining distance a remote entity covers per second.
pub const REMOTE_LERP_RATE: f32 = 10.0;
/// Half-period of the invulnerability flash, keyed to wall-clock time.
pub const INVULN_FLASH_MS: u64 = 100;
/// Lives assumed when the server omits the field.
pub const DEFAULT_LIVES: i32 = 3;
/// Side length of the player square, in pixels.
pub const PLAYER_SIZE: f32 = 30.0;

/// A discrete movement or action command reported upstream.
///
/// The directional variants start movement on the server; the `STOP_*`
/// variants end it. `START` requests a game start and is only considered
/// acknowledged once the server broadcasts `game_start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InputAction {
    Left,
    Right,
    Up,
    Down,
    Stop,
    StopLeft,
    StopRight,
    StopUp,
    StopDown,
    Fire,
    Start,
}

/// Cardinal facing of a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// The action that starts movement in this direction.
    pub fn start_action(self) -> InputAction {
        match self {
            Direction::Up => InputAction::Up,
            Direction::Down => InputAction::Down,
            Direction::Left => InputAction::Left,
            Direction::Right => InputAction::Right,
        }
    }

    /// The action that stops movement in this direction.
    pub fn stop_action(self) -> InputAction {
        match self {
            Direction::Up => InputAction::StopUp,
            Direction::Down => InputAction::StopDown,
            Direction::Left => InputAction::StopLeft,
            Direction::Right => InputAction::StopRight,
        }
    }
}

/// Messages sent client → server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    #[serde(rename_all = "camelCase")]
    Register {
        player_id: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        game_id: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Input {
        player_id: u32,
        action: InputAction,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<serde_json::Value>,
    },
    Ping,
}

/// Messages sent server → client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    State {
        #[serde(default)]
        players: Vec<PlayerRecord>,
        #[serde(default)]
        projectiles: Vec<ProjectileRecord>,
        #[serde(default)]
        powerups: Vec<PowerupRecord>,
    },
    #[serde(rename_all = "camelCase")]
    Registered { player_id: u32 },
    GameStart {
        #[serde(default)]
        map: Option<String>,
    },
    GameOver {
        #[serde(default)]
        winner: Option<u32>,
    },
    Error {
        #[serde(default)]
        message: String,
    },
}

/// Inbound message kinds, used to route subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    State,
    Registered,
    GameStart,
    GameOver,
    Error,
}

impl ServerMessage {
    pub fn kind(&self) -> MessageKind {
        match self {
            ServerMessage::State { .. } => MessageKind::State,
            ServerMessage::Registered { .. } => MessageKind::Registered,
            ServerMessage::GameStart { .. } => MessageKind::GameStart,
            ServerMessage::GameOver { .. } => MessageKind::GameOver,
            ServerMessage::Error { .. } => MessageKind::Error,
        }
    }
}

/// One player entry in a `state` broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRecord {
    pub id: u32,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub has_speed_boost: bool,
    #[serde(default)]
    pub speed_boost_timer: f32,
    #[serde(default = "default_lives")]
    pub lives: i32,
    #[serde(default)]
    pub invulnerable_time: f32,
}

impl PlayerRecord {
    pub fn new(id: u32, x: f32, y: f32) -> Self {
        Self {
            id,
            x,
            y,
            has_speed_boost: false,
            speed_boost_timer: 0.0,
            lives: DEFAULT_LIVES,
            invulnerable_time: 0.0,
        }
    }
}

fn default_lives() -> i32 {
    DEFAULT_LIVES
}

/// One projectile entry in a `state` broadcast. Velocity is authoritative
/// and stable between snapshots, so the client dead-reckons from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileRecord {
    pub id: u32,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub vx: f32,
    #[serde(default)]
    pub vy: f32,
}

/// One powerup entry in a `state` broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerupRecord {
    pub id: u32,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(rename = "type", default)]
    pub kind: PowerupKind,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum PowerupKind {
    #[default]
    Speed,
    NoCooldown,
    SpreadShot,
    #[serde(other)]
    Unknown,
}

/// Why an inbound payload could not be decoded.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("payload is not a JSON object")]
    NotAnObject,
    #[error("payload has no string `type` tag")]
    MissingKind,
}

/// Decodes one inbound wire text into a typed message.
///
/// Returns `Ok(None)` for well-formed messages whose `type` the client does
/// not recognize; those are ignored rather than treated as errors. Fails
/// only on unparseable payloads, non-object payloads, a missing kind tag,
/// or a recognized kind whose body does not match its schema.
pub fn decode_server_message(raw: &str) -> Result<Option<ServerMessage>, DecodeError> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    let object = value.as_object().ok_or(DecodeError::NotAnObject)?;
    let kind = object
        .get("type")
        .and_then(|t| t.as_str())
        .ok_or(DecodeError::MissingKind)?;
    match kind {
        "state" | "registered" | "game_start" | "game_over" | "error" => {
            Ok(Some(serde_json::from_value(value)?))
        }
        _ => Ok(None),
    }
}

/// Encodes an outbound message as a single-line JSON text.
pub fn encode_client_message(msg: &ClientMessage) -> Result<String, serde_json::Error> {
    serde_json::to_string(msg)
}
