//! End-to-end session behavior over an in-memory link pair.

use std::io::{ErrorKind, Read, Write};
use std::thread;
use std::time::{Duration, Instant};

use uartlink_frame::{Message, MessageType};
use uartlink_port::{NoResetLine, SerialLink};
use uartlink_session::{Messenger, SessionConfig, SessionError};

fn messenger_pair() -> (Messenger, SerialLink) {
    messenger_pair_with(SessionConfig::default())
}

fn messenger_pair_with(config: SessionConfig) -> (Messenger, SerialLink) {
    let (local, remote) = SerialLink::loopback_pair();
    let messenger = Messenger::over(local, Box::new(NoResetLine), config)
        .expect("session over loopback should start");
    (messenger, remote)
}

fn frame(msg_type: MessageType, payload: &[u8]) -> Vec<u8> {
    let mut wire = vec![msg_type.tag()];
    wire.extend_from_slice(&(payload.len() as u16).to_le_bytes());
    wire.extend_from_slice(payload);
    wire
}

fn rpm_frame(rpm: f32) -> Vec<u8> {
    frame(MessageType::Rpm, &rpm.to_le_bytes())
}

fn text_frame(msg_type: MessageType, line: &str) -> Vec<u8> {
    let mut payload = line.as_bytes().to_vec();
    payload.push(b'\n');
    frame(msg_type, &payload)
}

fn read_n(link: &mut SerialLink, n: usize, deadline: Duration) -> Vec<u8> {
    let stop_at = Instant::now() + deadline;
    let mut out = Vec::new();
    while out.len() < n && Instant::now() < stop_at {
        let mut buf = [0u8; 64];
        match link.read(&mut buf) {
            Ok(0) => break,
            Ok(read) => out.extend_from_slice(&buf[..read]),
            Err(err)
                if err.kind() == ErrorKind::TimedOut || err.kind() == ErrorKind::WouldBlock =>
            {
                continue;
            }
            Err(err) => panic!("remote read failed: {err}"),
        }
    }
    out
}

#[test]
fn commands_transmit_in_fifo_order() {
    let (messenger, mut remote) = messenger_pair();

    messenger.send_command("IO");
    messenger.send_command("PC");
    messenger.send_command("DP25");

    let wire = read_n(&mut remote, 11, Duration::from_secs(2));
    assert_eq!(wire, b"IO\nPC\nDP25\n");
}

#[test]
fn empty_command_never_reaches_the_link() {
    let (messenger, mut remote) = messenger_pair();

    messenger.send_command("");
    messenger.send_command("IO");

    // If the empty command produced any bytes they would precede "IO\n".
    let wire = read_n(&mut remote, 3, Duration::from_secs(2));
    assert_eq!(wire, b"IO\n");
    assert_eq!(remote.pending_read().unwrap(), 0);
}

#[test]
fn mixed_frames_demultiplex_in_arrival_order() {
    let (mut messenger, mut remote) = messenger_pair();

    let mut wire = Vec::new();
    wire.extend(rpm_frame(1.0));
    wire.extend(text_frame(MessageType::Log, "first"));
    wire.extend(rpm_frame(2.0));
    let mut uss = vec![1u8];
    uss.extend_from_slice(&77.5f32.to_le_bytes());
    wire.extend(frame(MessageType::Uss, &uss));
    wire.extend(text_frame(MessageType::Log, "second"));
    wire.extend(frame(MessageType::Res, &[3]));
    remote.write_all(&wire).unwrap();

    messenger.start_receiver().unwrap();

    let timeout = Duration::from_secs(2);
    assert_eq!(
        messenger.wait(MessageType::Rpm, timeout),
        Some(Message::Rpm { rpm: 1.0 })
    );
    assert_eq!(
        messenger.wait(MessageType::Rpm, timeout),
        Some(Message::Rpm { rpm: 2.0 })
    );
    assert_eq!(
        messenger.wait(MessageType::Log, timeout),
        Some(Message::Log("first".to_string()))
    );
    assert_eq!(
        messenger.wait(MessageType::Log, timeout),
        Some(Message::Log("second".to_string()))
    );
    assert_eq!(
        messenger.wait(MessageType::Uss, timeout),
        Some(Message::Uss {
            side: 1,
            distance: 77.5
        })
    );
    assert_eq!(
        messenger.wait(MessageType::Res, timeout),
        Some(Message::Res { code: 3 })
    );

    // Nothing lost, nothing duplicated.
    for msg_type in MessageType::ALL {
        assert_eq!(messenger.fetch(msg_type), None, "{msg_type} not drained");
        assert_eq!(messenger.queues().dropped(msg_type), 0);
    }
}

#[test]
fn malformed_frame_does_not_poison_the_stream() {
    let (mut messenger, mut remote) = messenger_pair();

    // RES frame claiming a 4-byte payload, then a valid RPM frame.
    let mut wire = vec![MessageType::Res.tag(), 0x04, 0x00];
    wire.extend_from_slice(&[0xAA; 4]);
    wire.extend(rpm_frame(5.5));
    remote.write_all(&wire).unwrap();

    messenger.start_receiver().unwrap();

    assert_eq!(
        messenger.wait(MessageType::Rpm, Duration::from_secs(2)),
        Some(Message::Rpm { rpm: 5.5 })
    );
    assert_eq!(messenger.fetch(MessageType::Res), None);
}

#[test]
fn telemetry_overflow_drops_oldest() {
    let (mut messenger, mut remote) = messenger_pair_with(SessionConfig {
        message_capacity: 2,
        ..SessionConfig::default()
    });

    let mut wire = Vec::new();
    wire.extend(rpm_frame(1.0));
    wire.extend(rpm_frame(2.0));
    wire.extend(rpm_frame(3.0));
    remote.write_all(&wire).unwrap();

    messenger.start_receiver().unwrap();

    let deadline = Instant::now() + Duration::from_secs(2);
    while messenger.queues().dropped(MessageType::Rpm) < 1 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }

    assert_eq!(messenger.queues().dropped(MessageType::Rpm), 1);
    assert_eq!(
        messenger.fetch(MessageType::Rpm),
        Some(Message::Rpm { rpm: 2.0 })
    );
    assert_eq!(
        messenger.fetch(MessageType::Rpm),
        Some(Message::Rpm { rpm: 3.0 })
    );
}

#[test]
fn connection_handshake_acknowledges_once() {
    let (mut messenger, remote) = messenger_pair();

    let mut announcer_half = remote.try_clone().unwrap();
    let announcer = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        announcer_half.write_all(b"available\n").unwrap();
    });

    assert!(messenger
        .wait_for_connection(Duration::from_secs(2))
        .unwrap());
    announcer.join().unwrap();

    let mut remote = remote;
    let reply = read_n(&mut remote, 3, Duration::from_secs(2));
    assert_eq!(reply, b"OK\n");
    assert_eq!(remote.pending_read().unwrap(), 0);
}

#[test]
fn connection_handshake_timeout_writes_nothing() {
    let (mut messenger, remote) = messenger_pair();

    assert!(!messenger
        .wait_for_connection(Duration::from_millis(60))
        .unwrap());
    assert_eq!(remote.pending_read().unwrap(), 0);
}

#[test]
fn receiver_owns_the_read_half_exclusively() {
    let (mut messenger, mut remote) = messenger_pair();
    messenger.start_receiver().unwrap();

    assert!(matches!(
        messenger.fetch_msg(),
        Err(SessionError::ReceiverActive)
    ));
    assert!(matches!(
        messenger.wait_for_connection(Duration::from_millis(10)),
        Err(SessionError::ReceiverActive)
    ));
    assert!(matches!(
        messenger.start_receiver(),
        Err(SessionError::ReceiverActive)
    ));

    // Reclaiming the read half restores the diagnostic path.
    messenger.stop_receiver();
    remote.write_all(&rpm_frame(9.0)).unwrap();
    assert_eq!(messenger.fetch_msg().unwrap(), Message::Rpm { rpm: 9.0 });
}

#[test]
fn fetch_msg_bypasses_the_queues() {
    let (mut messenger, mut remote) = messenger_pair();

    remote.write_all(&text_frame(MessageType::Dbg, "probe")).unwrap();
    let message = messenger.fetch_msg().unwrap();
    assert_eq!(message, Message::Dbg("probe".to_string()));
    assert_eq!(message.to_string(), "(DBG) probe");
    assert_eq!(messenger.fetch(MessageType::Dbg), None);
}

#[test]
fn shutdown_joins_both_workers() {
    let (mut messenger, mut remote) = messenger_pair();
    messenger.send_command("IO");
    messenger.start_receiver().unwrap();

    // Queued commands drain before the sender exits.
    messenger.shutdown();
    let wire = read_n(&mut remote, 3, Duration::from_secs(2));
    assert_eq!(wire, b"IO\n");

    // Idempotent, and late sends are dropped without panicking.
    messenger.shutdown();
    messenger.send_command("FO");
}

#[test]
fn drop_shuts_down_cleanly() {
    let (mut messenger, _remote) = messenger_pair();
    messenger.start_receiver().unwrap();
    drop(messenger);
}
