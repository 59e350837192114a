use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use uartlink_frame::MessageType;

use crate::cmd::{open_messenger, WatchArgs};
use crate::exit::{session_error, CliError, CliResult, SUCCESS};
use crate::output::{print_message, OutputFormat};

const IDLE_SLEEP: Duration = Duration::from_millis(25);

pub fn run(args: WatchArgs, format: OutputFormat) -> CliResult<i32> {
    let mut messenger = open_messenger(&args.port, args.baud)?;
    messenger
        .start_receiver()
        .map_err(|err| session_error("receiver start failed", err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let selected: Vec<MessageType> = args
        .types
        .clone()
        .unwrap_or_else(|| MessageType::ALL.to_vec());
    let mut printed = 0usize;

    while running.load(Ordering::SeqCst) {
        let mut idle = true;
        for msg_type in &selected {
            while let Some(message) = messenger.fetch(*msg_type) {
                idle = false;
                print_message(&message, format);
                printed = printed.saturating_add(1);
                if let Some(count) = args.count {
                    if printed >= count {
                        return Ok(SUCCESS);
                    }
                }
            }
        }
        if idle {
            thread::sleep(IDLE_SLEEP);
        }
    }

    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
