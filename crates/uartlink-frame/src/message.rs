use std::fmt;
use std::str::FromStr;

/// The closed set of message types the counterpart emits.
///
/// The discriminant is the wire tag. Types 0–3 carry fixed-layout binary
/// payloads; 4–6 carry newline-terminated UTF-8 lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    /// Wheel revolutions per minute.
    Rpm = 0,
    /// Ultrasonic range measurement.
    Uss = 1,
    /// Inertial measurement (orientation + acceleration).
    Imu = 2,
    /// Command response code.
    Res = 3,
    /// Error text.
    Err = 4,
    /// Log text.
    Log = 5,
    /// Debug text.
    Dbg = 6,
}

impl MessageType {
    /// Number of message types.
    pub const COUNT: usize = 7;

    /// All types, in tag order.
    pub const ALL: [MessageType; Self::COUNT] = [
        MessageType::Rpm,
        MessageType::Uss,
        MessageType::Imu,
        MessageType::Res,
        MessageType::Err,
        MessageType::Log,
        MessageType::Dbg,
    ];

    /// Map a wire tag to its type, if known.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(MessageType::Rpm),
            1 => Some(MessageType::Uss),
            2 => Some(MessageType::Imu),
            3 => Some(MessageType::Res),
            4 => Some(MessageType::Err),
            5 => Some(MessageType::Log),
            6 => Some(MessageType::Dbg),
            _ => None,
        }
    }

    /// The wire tag for this type.
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Index into per-type tables (tag order).
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Uppercase wire name.
    pub const fn name(self) -> &'static str {
        match self {
            MessageType::Rpm => "RPM",
            MessageType::Uss => "USS",
            MessageType::Imu => "IMU",
            MessageType::Res => "RES",
            MessageType::Err => "ERR",
            MessageType::Log => "LOG",
            MessageType::Dbg => "DBG",
        }
    }

    /// Whether the payload is a newline-terminated UTF-8 line.
    pub const fn is_text(self) -> bool {
        matches!(
            self,
            MessageType::Err | MessageType::Log | MessageType::Dbg
        )
    }

    /// Fixed payload size for binary types; `None` for text types.
    pub const fn fixed_payload_len(self) -> Option<usize> {
        match self {
            MessageType::Rpm => Some(4),
            MessageType::Uss => Some(5),
            MessageType::Imu => Some(24),
            MessageType::Res => Some(1),
            MessageType::Err | MessageType::Log | MessageType::Dbg => None,
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MessageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, String> {
        match s.to_ascii_uppercase().as_str() {
            "RPM" => Ok(MessageType::Rpm),
            "USS" => Ok(MessageType::Uss),
            "IMU" => Ok(MessageType::Imu),
            "RES" => Ok(MessageType::Res),
            "ERR" => Ok(MessageType::Err),
            "LOG" => Ok(MessageType::Log),
            "DBG" => Ok(MessageType::Dbg),
            other => Err(format!("unknown message type '{other}'")),
        }
    }
}

/// A decoded inbound message.
///
/// One variant per [`MessageType`], carrying the unpacked payload. Field
/// order in the binary variants matches the wire layout (little-endian).
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Wheel speed.
    Rpm { rpm: f32 },
    /// Ultrasonic range: which sensor, and the measured distance.
    Uss { side: u8, distance: f32 },
    /// Orientation (yaw/pitch/roll) and acceleration (x/y/z).
    Imu {
        yaw: f32,
        pitch: f32,
        roll: f32,
        ax: f32,
        ay: f32,
        az: f32,
    },
    /// Response code for a previously sent command.
    Res { code: u8 },
    /// Error line from the counterpart.
    Err(String),
    /// Log line from the counterpart.
    Log(String),
    /// Debug line from the counterpart.
    Dbg(String),
}

impl Message {
    /// The type tag this message was decoded from.
    pub fn message_type(&self) -> MessageType {
        match self {
            Message::Rpm { .. } => MessageType::Rpm,
            Message::Uss { .. } => MessageType::Uss,
            Message::Imu { .. } => MessageType::Imu,
            Message::Res { .. } => MessageType::Res,
            Message::Err(_) => MessageType::Err,
            Message::Log(_) => MessageType::Log,
            Message::Dbg(_) => MessageType::Dbg,
        }
    }

    /// The text line, for text-typed messages.
    pub fn text(&self) -> Option<&str> {
        match self {
            Message::Err(line) | Message::Log(line) | Message::Dbg(line) => Some(line),
            _ => None,
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Rpm { rpm } => write!(f, "(RPM) {rpm}"),
            Message::Uss { side, distance } => write!(f, "(USS) side {side}: {distance}"),
            Message::Imu {
                yaw,
                pitch,
                roll,
                ax,
                ay,
                az,
            } => write!(f, "(IMU) ypr: {yaw}, {pitch}, {roll} acc: {ax}, {ay}, {az}"),
            Message::Res { code } => write!(f, "(RES) {code}"),
            Message::Err(line) => write!(f, "(ERR) {line}"),
            Message::Log(line) => write!(f, "(LOG) {line}"),
            Message::Dbg(line) => write!(f, "(DBG) {line}"),
        }
    }
}
