use std::io::{ErrorKind, Read};

use crate::error::{FrameError, Result};
use crate::message::{Message, MessageType};

/// Frame header: type tag (1) + payload length (2, little-endian) = 3 bytes.
pub const HEADER_SIZE: usize = 3;

/// Longest text payload accepted before declaring the line unterminated.
pub const MAX_TEXT_LINE: usize = 1024;

/// Encode an outbound command for the wire.
///
/// Wire format:
/// ```text
/// ┌───────────────────┬──────┐
/// │ ASCII command     │ "\n" │
/// └───────────────────┴──────┘
/// ```
///
/// Fails with [`FrameError::EmptyCommand`] for the empty string — an empty
/// command has no meaning to the counterpart and must never be transmitted.
pub fn encode_command(command: &str) -> Result<Vec<u8>> {
    if command.is_empty() {
        return Err(FrameError::EmptyCommand);
    }
    let mut encoded = Vec::with_capacity(command.len() + 1);
    encoded.extend_from_slice(command.as_bytes());
    encoded.push(b'\n');
    Ok(encoded)
}

/// Decode a frame header.
///
/// Wire format:
/// ```text
/// ┌──────────┬──────────────┬──────────────────┐
/// │ Type (1B)│ Length (2B LE)│ Payload           │
/// └──────────┴──────────────┴──────────────────┘
/// ```
///
/// Fails with [`FrameError::Truncated`] when fewer than [`HEADER_SIZE`]
/// bytes are supplied and [`FrameError::UnknownType`] for a tag outside the
/// known set.
pub fn decode_header(bytes: &[u8]) -> Result<(MessageType, u16)> {
    if bytes.len() < HEADER_SIZE {
        return Err(FrameError::Truncated {
            needed: HEADER_SIZE,
            got: bytes.len(),
        });
    }
    let tag = bytes[0];
    let length = u16::from_le_bytes([bytes[1], bytes[2]]);
    let msg_type = MessageType::from_tag(tag).ok_or(FrameError::UnknownType(tag))?;
    Ok((msg_type, length))
}

/// Decode one payload directly off a reader.
///
/// Binary types read exactly the type's fixed size (after checking it
/// against the header `length`); text types read through the next newline
/// and ignore `length`, which the counterpart does not populate reliably
/// for text frames.
pub fn decode_payload<R: Read>(msg_type: MessageType, length: u16, reader: &mut R) -> Result<Message> {
    match msg_type.fixed_payload_len() {
        Some(expected) => {
            if usize::from(length) != expected {
                return Err(FrameError::LengthMismatch {
                    kind: msg_type.name(),
                    expected,
                    got: usize::from(length),
                });
            }
            let mut payload = vec![0u8; expected];
            read_exact_or_short(reader, &mut payload)?;
            Ok(unpack_fixed(msg_type, &payload))
        }
        None => {
            let line = read_text_line(reader)?;
            decode_text(msg_type, &line)
        }
    }
}

/// Unpack a fixed-layout binary payload. Caller guarantees
/// `payload.len() == msg_type.fixed_payload_len()`.
pub(crate) fn unpack_fixed(msg_type: MessageType, payload: &[u8]) -> Message {
    match msg_type {
        MessageType::Rpm => Message::Rpm {
            rpm: f32_at(payload, 0),
        },
        MessageType::Uss => Message::Uss {
            side: payload[0],
            distance: f32_at(payload, 1),
        },
        MessageType::Imu => Message::Imu {
            yaw: f32_at(payload, 0),
            pitch: f32_at(payload, 4),
            roll: f32_at(payload, 8),
            ax: f32_at(payload, 12),
            ay: f32_at(payload, 16),
            az: f32_at(payload, 20),
        },
        MessageType::Res => Message::Res { code: payload[0] },
        MessageType::Err | MessageType::Log | MessageType::Dbg => {
            unreachable!("text types have no fixed layout")
        }
    }
}

/// Decode a text payload (newline already removed), stripping a trailing
/// carriage return if the counterpart sent CRLF.
pub(crate) fn decode_text(msg_type: MessageType, line: &[u8]) -> Result<Message> {
    let line = match line.last() {
        Some(b'\r') => &line[..line.len() - 1],
        _ => line,
    };
    let text = std::str::from_utf8(line)?.to_string();
    Ok(match msg_type {
        MessageType::Err => Message::Err(text),
        MessageType::Log => Message::Log(text),
        MessageType::Dbg => Message::Dbg(text),
        _ => unreachable!("binary types carry no text"),
    })
}

fn f32_at(payload: &[u8], offset: usize) -> f32 {
    f32::from_le_bytes(payload[offset..offset + 4].try_into().unwrap())
}

fn read_exact_or_short<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    let wanted = buf.len();
    let mut got = 0;
    while got < wanted {
        match reader.read(&mut buf[got..]) {
            Ok(0) => return Err(FrameError::ShortRead { wanted, got }),
            Ok(n) => got += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) if err.kind() == ErrorKind::TimedOut || err.kind() == ErrorKind::WouldBlock => {
                return Err(FrameError::ShortRead { wanted, got });
            }
            Err(err) => return Err(FrameError::Io(err)),
        }
    }
    Ok(())
}

fn read_text_line<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    let mut line = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        match reader.read(&mut byte) {
            Ok(0) => {
                return Err(FrameError::ShortRead {
                    wanted: line.len() + 1,
                    got: line.len(),
                })
            }
            Ok(_) => {
                if byte[0] == b'\n' {
                    return Ok(line);
                }
                if line.len() >= MAX_TEXT_LINE {
                    return Err(FrameError::LineTooLong {
                        limit: MAX_TEXT_LINE,
                    });
                }
                line.push(byte[0]);
            }
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) if err.kind() == ErrorKind::TimedOut || err.kind() == ErrorKind::WouldBlock => {
                return Err(FrameError::ShortRead {
                    wanted: line.len() + 1,
                    got: line.len(),
                });
            }
            Err(err) => return Err(FrameError::Io(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn encode_command_appends_one_newline() {
        assert_eq!(encode_command("SS512").unwrap(), b"SS512\n");
        assert_eq!(encode_command("OK").unwrap(), b"OK\n");
    }

    #[test]
    fn encode_command_rejects_empty() {
        assert!(matches!(
            encode_command(""),
            Err(FrameError::EmptyCommand)
        ));
    }

    #[test]
    fn decode_header_concrete() {
        let (msg_type, length) = decode_header(&[0x01, 0x05, 0x00]).unwrap();
        assert_eq!(msg_type, MessageType::Uss);
        assert_eq!(length, 5);
    }

    #[test]
    fn decode_header_truncated() {
        assert!(matches!(
            decode_header(&[0x01, 0x05]),
            Err(FrameError::Truncated { needed: 3, got: 2 })
        ));
        assert!(matches!(
            decode_header(&[]),
            Err(FrameError::Truncated { needed: 3, got: 0 })
        ));
    }

    #[test]
    fn decode_header_unknown_tag() {
        assert!(matches!(
            decode_header(&[0x09, 0x00, 0x00]),
            Err(FrameError::UnknownType(0x09))
        ));
    }

    #[test]
    fn decode_uss_payload_concrete() {
        let mut payload = vec![0u8];
        payload.extend_from_slice(&120.5f32.to_le_bytes());
        let msg = decode_payload(MessageType::Uss, 5, &mut Cursor::new(payload)).unwrap();
        assert_eq!(
            msg,
            Message::Uss {
                side: 0,
                distance: 120.5
            }
        );
    }

    #[test]
    fn decode_rpm_payload() {
        let payload = 1520.25f32.to_le_bytes();
        let msg = decode_payload(MessageType::Rpm, 4, &mut Cursor::new(payload)).unwrap();
        assert_eq!(msg, Message::Rpm { rpm: 1520.25 });
    }

    #[test]
    fn decode_imu_payload() {
        let fields = [1.0f32, -2.0, 3.5, 0.25, -0.5, 9.81];
        let mut payload = Vec::new();
        for value in fields {
            payload.extend_from_slice(&value.to_le_bytes());
        }
        let msg = decode_payload(MessageType::Imu, 24, &mut Cursor::new(payload)).unwrap();
        assert_eq!(
            msg,
            Message::Imu {
                yaw: 1.0,
                pitch: -2.0,
                roll: 3.5,
                ax: 0.25,
                ay: -0.5,
                az: 9.81
            }
        );
    }

    #[test]
    fn decode_res_payload() {
        let msg = decode_payload(MessageType::Res, 1, &mut Cursor::new([0x02])).unwrap();
        assert_eq!(msg, Message::Res { code: 2 });
    }

    #[test]
    fn decode_rejects_length_mismatch() {
        let err = decode_payload(MessageType::Rpm, 5, &mut Cursor::new([0u8; 5])).unwrap_err();
        assert!(matches!(
            err,
            FrameError::LengthMismatch {
                kind: "RPM",
                expected: 4,
                got: 5
            }
        ));
    }

    #[test]
    fn decode_short_binary_read() {
        let err = decode_payload(MessageType::Imu, 24, &mut Cursor::new([0u8; 10])).unwrap_err();
        assert!(matches!(
            err,
            FrameError::ShortRead {
                wanted: 24,
                got: 10
            }
        ));
    }

    #[test]
    fn decode_text_line_strips_terminators() {
        let msg =
            decode_payload(MessageType::Log, 0, &mut Cursor::new(b"battery low\r\n")).unwrap();
        assert_eq!(msg, Message::Log("battery low".to_string()));

        let msg = decode_payload(MessageType::Err, 0, &mut Cursor::new(b"stall\n")).unwrap();
        assert_eq!(msg, Message::Err("stall".to_string()));
    }

    #[test]
    fn decode_text_rejects_invalid_utf8() {
        let err = decode_payload(
            MessageType::Dbg,
            0,
            &mut Cursor::new([0xFF, 0xFE, b'\n']),
        )
        .unwrap_err();
        assert!(matches!(err, FrameError::InvalidUtf8(_)));
    }

    #[test]
    fn decode_text_without_terminator_is_short() {
        let err = decode_payload(MessageType::Log, 0, &mut Cursor::new(b"no newline")).unwrap_err();
        assert!(matches!(err, FrameError::ShortRead { .. }));
    }

    #[test]
    fn binary_roundtrip_every_type() {
        let cases = [
            (MessageType::Rpm, {
                let mut buf = Vec::new();
                buf.extend_from_slice(&812.0f32.to_le_bytes());
                buf
            }),
            (MessageType::Uss, {
                let mut buf = vec![1u8];
                buf.extend_from_slice(&33.25f32.to_le_bytes());
                buf
            }),
            (MessageType::Res, vec![0u8]),
        ];

        for (msg_type, payload) in cases {
            let length = payload.len() as u16;
            let msg = decode_payload(msg_type, length, &mut Cursor::new(&payload)).unwrap();
            assert_eq!(msg.message_type(), msg_type);
        }
    }
}
