use bthal_proto::{Bdaddr, Event};
use tracing::debug;

use super::report;
use crate::error::{HandlerError, HandlerResult};
use crate::registry::{Method, Registry};
use crate::session::Session;

pub static METHODS: &[Method] = &[
    Method::new("init", init),
    Method::new("connect", connect).help("<addr>"),
    Method::new("disconnect", disconnect).help("<addr>"),
    Method::new("cleanup", cleanup),
];

fn optional_addr(args: &[&str]) -> Result<Option<Bdaddr>, HandlerError> {
    Ok(args.get(2).map(|text| text.parse::<Bdaddr>()).transpose()?)
}

fn init(_: &Registry, session: &mut Session, args: &[&str]) -> HandlerResult {
    let (av, client) = session.av_and_client()?;
    let result = av.init(
        client,
        Box::new(|event: &Event| {
            debug!(opcode = event.opcode, name = event.name(), "a2dp event");
        }),
    );
    report(session, args, result)
}

fn connect(_: &Registry, session: &mut Session, args: &[&str]) -> HandlerResult {
    let addr = optional_addr(args)?;
    let result = session.av().connect(addr.as_ref());
    report(session, args, result)
}

fn disconnect(_: &Registry, session: &mut Session, args: &[&str]) -> HandlerResult {
    let addr = optional_addr(args)?;
    let result = session.av().disconnect(addr.as_ref());
    report(session, args, result)
}

fn cleanup(_: &Registry, session: &mut Session, args: &[&str]) -> HandlerResult {
    if !session.av().is_initialized() {
        return report(session, args, Ok(()));
    }
    let (av, client) = session.av_and_client()?;
    let result = av.cleanup(client).map(|_| ());
    report(session, args, result)
}
