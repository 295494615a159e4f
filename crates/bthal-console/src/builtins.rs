//! Commands available without an interface.

use std::io::Write;

use crate::error::{HandlerError, HandlerResult};
use crate::registry::{Interface, Method, Registry};
use crate::session::Session;

pub static COMMANDS: &[Method] = &[
    Method::new("help", help)
        .help("[<interface>]")
        .complete(Registry::interface_names),
    Method::new("quit", quit),
    Method::new("exit", quit),
];

/// Print every method of `interface` as `<interface> <method> <help>`.
pub fn print_interface(out: &mut dyn Write, interface: &Interface) -> std::io::Result<()> {
    for method in interface.methods {
        writeln!(
            out,
            "{} {} {}",
            interface.name,
            method.name,
            method.help.unwrap_or("")
        )?;
    }
    Ok(())
}

fn help(registry: &Registry, session: &mut Session, args: &[&str]) -> HandlerResult {
    let out = session.out();
    if let Some(name) = args.get(1) {
        let interface = registry
            .find_interface(name)
            .ok_or_else(|| HandlerError::NoSuchInterface(name.to_string()))?;
        print_interface(out, interface)?;
        return Ok(());
    }

    writeln!(out, "bthal console calls Bluetooth HAL methods.")?;
    writeln!(out, "\nAvailable commands:")?;
    for command in registry.commands() {
        writeln!(out, "\t{} {}", command.name, command.help.unwrap_or(""))?;
    }
    writeln!(out, "\nAvailable interfaces to use:")?;
    for interface in registry.interfaces() {
        writeln!(out, "\t{}", interface.name)?;
    }
    writeln!(out, "\nTo get help on methods for each interface type:")?;
    writeln!(out, "\n\thelp <interface>")?;
    writeln!(out, "\nBasic scenario:\n\tadapter init")?;
    writeln!(out, "\tadapter enable\n\tadapter start_discovery")?;
    writeln!(out, "\thidhost init\n")?;
    Ok(())
}

fn quit(_: &Registry, session: &mut Session, _: &[&str]) -> HandlerResult {
    session.request_quit();
    Ok(())
}
