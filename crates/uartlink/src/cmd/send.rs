use crate::cmd::{open_messenger, SendArgs};
use crate::exit::{CliResult, SUCCESS};
use crate::output::OutputFormat;

pub fn run(args: SendArgs, _format: OutputFormat) -> CliResult<i32> {
    let mut messenger = open_messenger(&args.port, args.baud)?;

    for command in &args.commands {
        messenger.send_command(command.as_str());
    }

    // Joins the sender worker after it drains the queue, so every command
    // is on the wire before we exit.
    messenger.shutdown();
    Ok(SUCCESS)
}
