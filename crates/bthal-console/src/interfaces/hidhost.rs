use bthal_client::ProtocolMode;

use super::{addr_arg, arg, report};
use crate::error::HandlerResult;
use crate::registry::{Method, Registry};
use crate::session::Session;

pub static METHODS: &[Method] = &[
    Method::new("init", init),
    Method::new("cleanup", cleanup),
    Method::new("connect", connect).help("<addr>"),
    Method::new("disconnect", disconnect).help("<addr>"),
    Method::new("virtual_unplug", virtual_unplug).help("<addr>"),
    Method::new("get_protocol", get_protocol).help("<addr> <report|boot>"),
    Method::new("set_protocol", set_protocol).help("<addr> <report|boot>"),
];

fn init(_: &Registry, session: &mut Session, args: &[&str]) -> HandlerResult {
    let result = session.client()?.hidhost().init();
    report(session, args, result)
}

fn cleanup(_: &Registry, session: &mut Session, args: &[&str]) -> HandlerResult {
    if session.is_connected() {
        let result = session.client()?.hidhost().cleanup().map(|_| ());
        return report(session, args, result);
    }
    report(session, args, Ok(()))
}

fn connect(_: &Registry, session: &mut Session, args: &[&str]) -> HandlerResult {
    let addr = addr_arg(args, 2, "hidhost connect <addr>")?;
    let result = session.client()?.hidhost().connect(&addr);
    report(session, args, result)
}

fn disconnect(_: &Registry, session: &mut Session, args: &[&str]) -> HandlerResult {
    let addr = addr_arg(args, 2, "hidhost disconnect <addr>")?;
    let result = session.client()?.hidhost().disconnect(&addr);
    report(session, args, result)
}

fn virtual_unplug(_: &Registry, session: &mut Session, args: &[&str]) -> HandlerResult {
    let addr = addr_arg(args, 2, "hidhost virtual_unplug <addr>")?;
    let result = session.client()?.hidhost().virtual_unplug(&addr);
    report(session, args, result)
}

fn get_protocol(_: &Registry, session: &mut Session, args: &[&str]) -> HandlerResult {
    const USAGE: &str = "hidhost get_protocol <addr> <report|boot>";
    let addr = addr_arg(args, 2, USAGE)?;
    let mode: ProtocolMode = arg(args, 3, USAGE)?.parse()?;
    let result = session.client()?.hidhost().get_protocol(&addr, mode);
    report(session, args, result)
}

fn set_protocol(_: &Registry, session: &mut Session, args: &[&str]) -> HandlerResult {
    const USAGE: &str = "hidhost set_protocol <addr> <report|boot>";
    let addr = addr_arg(args, 2, USAGE)?;
    let mode: ProtocolMode = arg(args, 3, USAGE)?.parse()?;
    let result = session.client()?.hidhost().set_protocol(&addr, mode);
    report(session, args, result)
}
