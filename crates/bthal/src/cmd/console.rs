use std::io::{BufRead, IsTerminal, Write};

use bthal_client::ClientConfig;
use bthal_console::{Dispatcher, Flow, Session};
use tracing::{debug, info};

use crate::cmd::{parse_duration, ConsoleArgs};
use crate::exit::{io_error, CliResult, SUCCESS};

const PROMPT: &str = "> ";

pub fn run(args: ConsoleArgs) -> CliResult<i32> {
    let config = ClientConfig {
        endpoint: args.socket.socket,
        request_timeout: parse_duration(&args.timeout)?,
    };
    info!(endpoint = %config.endpoint, "starting console");

    let stdin = std::io::stdin();
    let prompt = !args.no_prompt && stdin.is_terminal();
    let mut session = Session::new(Box::new(std::io::stdout()), config);

    run_lines(&Dispatcher::standard(), &mut session, stdin.lock(), prompt)?;
    Ok(SUCCESS)
}

/// Feed lines to the dispatcher until `quit`, `exit` or end of input.
fn run_lines<B: BufRead>(
    dispatcher: &Dispatcher,
    session: &mut Session,
    input: B,
    prompt: bool,
) -> CliResult<()> {
    let mut lines = input.lines();
    loop {
        if prompt {
            write!(session.out(), "{PROMPT}")
                .and_then(|()| session.out().flush())
                .map_err(|err| io_error("failed writing prompt", err))?;
        }

        let Some(line) = lines.next() else {
            debug!("end of console input");
            return Ok(());
        };
        let line = line.map_err(|err| io_error("failed reading console input", err))?;

        if dispatcher.process_line(session, &line) == Flow::Quit {
            debug!("console quit");
            return Ok(());
        }
    }
}
