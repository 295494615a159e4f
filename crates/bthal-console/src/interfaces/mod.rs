//! Console interfaces, one per HAL profile.

use std::io::Write;

use bthal_proto::Bdaddr;

use crate::error::{HandlerError, HandlerResult};
use crate::registry::Interface;
use crate::session::Session;

pub mod adapter;
pub mod av;
pub mod hidhost;

/// Every bundled interface in display order.
pub static ALL: &[Interface] = &[
    Interface {
        name: "adapter",
        methods: adapter::METHODS,
    },
    Interface {
        name: "hidhost",
        methods: hidhost::METHODS,
    },
    Interface {
        name: "av",
        methods: av::METHODS,
    },
];

/// Positional argument `index`, or a usage error.
fn arg<'a>(args: &[&'a str], index: usize, usage: &'static str) -> Result<&'a str, HandlerError> {
    args.get(index).copied().ok_or(HandlerError::Usage(usage))
}

fn addr_arg(args: &[&str], index: usize, usage: &'static str) -> Result<Bdaddr, HandlerError> {
    Ok(arg(args, index, usage)?.parse()?)
}

/// Print the outcome line for a completed operation.
fn report(session: &mut Session, args: &[&str], result: bthal_client::Result<()>) -> HandlerResult {
    result?;
    let name = args.get(..2).unwrap_or(args).join(" ");
    writeln!(session.out(), "{name}: success")?;
    Ok(())
}
