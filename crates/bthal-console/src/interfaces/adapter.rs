use super::{addr_arg, arg, report};
use crate::error::{HandlerError, HandlerResult};
use crate::registry::{Method, Registry};
use crate::session::Session;

pub static METHODS: &[Method] = &[
    Method::new("init", init),
    Method::new("cleanup", cleanup),
    Method::new("enable", enable),
    Method::new("disable", disable),
    Method::new("get_adapter_properties", get_adapter_properties),
    Method::new("get_adapter_property", get_adapter_property).help("<prop_type>"),
    Method::new("get_remote_device_properties", get_remote_device_properties).help("<addr>"),
    Method::new("start_discovery", start_discovery),
    Method::new("cancel_discovery", cancel_discovery),
    Method::new("create_bond", create_bond).help("<addr>"),
    Method::new("remove_bond", remove_bond).help("<addr>"),
    Method::new("cancel_bond", cancel_bond).help("<addr>"),
    Method::new("dut_mode_configure", dut_mode_configure).help("<0|1>"),
];

/// Adapter property types by name.
const PROPERTY_TYPES: &[(&str, u8)] = &[
    ("bdname", 0x01),
    ("bdaddr", 0x02),
    ("uuids", 0x03),
    ("class_of_device", 0x04),
    ("type_of_device", 0x05),
    ("service_record", 0x06),
    ("scan_mode", 0x07),
    ("bonded_devices", 0x08),
    ("discovery_timeout", 0x09),
];

fn property_type(text: &str) -> Result<u8, HandlerError> {
    if let Some((_, code)) = PROPERTY_TYPES.iter().find(|(name, _)| *name == text) {
        return Ok(*code);
    }
    text.parse::<u8>()
        .map_err(|_| HandlerError::InvalidArgument(format!("unknown property type '{text}'")))
}

fn init(_: &Registry, session: &mut Session, args: &[&str]) -> HandlerResult {
    let result = session.client()?.bluetooth().init();
    report(session, args, result)
}

fn cleanup(_: &Registry, session: &mut Session, args: &[&str]) -> HandlerResult {
    if session.is_connected() {
        let result = session.client()?.bluetooth().cleanup().map(|_| ());
        return report(session, args, result);
    }
    report(session, args, Ok(()))
}

fn enable(_: &Registry, session: &mut Session, args: &[&str]) -> HandlerResult {
    let result = session.client()?.bluetooth().enable();
    report(session, args, result)
}

fn disable(_: &Registry, session: &mut Session, args: &[&str]) -> HandlerResult {
    let result = session.client()?.bluetooth().disable();
    report(session, args, result)
}

fn get_adapter_properties(_: &Registry, session: &mut Session, args: &[&str]) -> HandlerResult {
    let result = session.client()?.bluetooth().get_adapter_props();
    report(session, args, result)
}

fn get_adapter_property(_: &Registry, session: &mut Session, args: &[&str]) -> HandlerResult {
    let prop = property_type(arg(args, 2, "adapter get_adapter_property <prop_type>")?)?;
    let result = session.client()?.bluetooth().get_adapter_prop(prop);
    report(session, args, result)
}

fn get_remote_device_properties(
    _: &Registry,
    session: &mut Session,
    args: &[&str],
) -> HandlerResult {
    let addr = addr_arg(args, 2, "adapter get_remote_device_properties <addr>")?;
    let result = session.client()?.bluetooth().get_remote_device_props(&addr);
    report(session, args, result)
}

fn start_discovery(_: &Registry, session: &mut Session, args: &[&str]) -> HandlerResult {
    let result = session.client()?.bluetooth().start_discovery();
    report(session, args, result)
}

fn cancel_discovery(_: &Registry, session: &mut Session, args: &[&str]) -> HandlerResult {
    let result = session.client()?.bluetooth().cancel_discovery();
    report(session, args, result)
}

fn create_bond(_: &Registry, session: &mut Session, args: &[&str]) -> HandlerResult {
    let addr = addr_arg(args, 2, "adapter create_bond <addr>")?;
    let result = session.client()?.bluetooth().create_bond(&addr);
    report(session, args, result)
}

fn remove_bond(_: &Registry, session: &mut Session, args: &[&str]) -> HandlerResult {
    let addr = addr_arg(args, 2, "adapter remove_bond <addr>")?;
    let result = session.client()?.bluetooth().remove_bond(&addr);
    report(session, args, result)
}

fn cancel_bond(_: &Registry, session: &mut Session, args: &[&str]) -> HandlerResult {
    let addr = addr_arg(args, 2, "adapter cancel_bond <addr>")?;
    let result = session.client()?.bluetooth().cancel_bond(&addr);
    report(session, args, result)
}

fn dut_mode_configure(_: &Registry, session: &mut Session, args: &[&str]) -> HandlerResult {
    let enable = match arg(args, 2, "adapter dut_mode_configure <0|1>")? {
        "0" => false,
        "1" => true,
        other => {
            return Err(HandlerError::InvalidArgument(format!(
                "expected 0 or 1, got '{other}'"
            )))
        }
    };
    let result = session.client()?.bluetooth().dut_mode_conf(enable);
    report(session, args, result)
}
