//! Per-service opcode tables.
//!
//! Each table lists the opcodes a service defines, in numeric order. Tables
//! are checked at compile time: an opcode may appear at most once per
//! service, and its declared kind must agree with the range it sits in.

use crate::opcode::OpcodeKind;
use crate::service::{self, ServiceId};

/// One named opcode within a service namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeDef {
    pub opcode: u8,
    pub name: &'static str,
    pub kind: OpcodeKind,
}

impl OpcodeDef {
    pub const fn command(opcode: u8, name: &'static str) -> Self {
        Self {
            opcode,
            name,
            kind: OpcodeKind::Command,
        }
    }

    pub const fn event(opcode: u8, name: &'static str) -> Self {
        Self {
            opcode,
            name,
            kind: OpcodeKind::Event,
        }
    }
}

/// A service and the opcodes it defines.
#[derive(Debug, Clone, Copy)]
pub struct ServiceDef {
    pub id: ServiceId,
    pub name: &'static str,
    pub opcodes: &'static [OpcodeDef],
}

impl ServiceDef {
    /// Look up an opcode in this service's table.
    pub fn opcode(&self, opcode: u8) -> Option<&'static OpcodeDef> {
        self.opcodes.iter().find(|def| def.opcode == opcode)
    }
}

/// Core service: module registration.
pub mod control {
    use super::OpcodeDef;

    pub const REGISTER_MODULE: u8 = 0x01;
    pub const UNREGISTER_MODULE: u8 = 0x02;

    pub const OPCODES: &[OpcodeDef] = &[
        OpcodeDef::command(REGISTER_MODULE, "register_module"),
        OpcodeDef::command(UNREGISTER_MODULE, "unregister_module"),
    ];
}

/// Bluetooth service: adapter and remote devices.
pub mod bluetooth {
    use super::OpcodeDef;

    pub const ENABLE: u8 = 0x01;
    pub const DISABLE: u8 = 0x02;
    pub const GET_ADAPTER_PROPS: u8 = 0x03;
    pub const GET_ADAPTER_PROP: u8 = 0x04;
    pub const SET_ADAPTER_PROP: u8 = 0x05;
    pub const GET_REMOTE_DEVICE_PROPS: u8 = 0x06;
    pub const GET_REMOTE_DEVICE_PROP: u8 = 0x07;
    pub const SET_REMOTE_DEVICE_PROP: u8 = 0x08;
    pub const GET_REMOTE_SERVICE_REC: u8 = 0x09;
    pub const GET_REMOTE_SERVICE: u8 = 0x0a;
    pub const START_DISCOVERY: u8 = 0x0b;
    pub const CANCEL_DISCOVERY: u8 = 0x0c;
    pub const CREATE_BOND: u8 = 0x0d;
    pub const REMOVE_BOND: u8 = 0x0e;
    pub const CANCEL_BOND: u8 = 0x0f;
    pub const PIN_REPLY: u8 = 0x10;
    pub const SSP_REPLY: u8 = 0x11;
    pub const DUT_MODE_CONF: u8 = 0x12;
    pub const DUT_MODE_SEND: u8 = 0x13;
    pub const LE_TEST_MODE: u8 = 0x14;

    pub const EV_ADAPTER_STATE_CHANGED: u8 = 0x81;
    pub const EV_ADAPTER_PROPS_CHANGED: u8 = 0x82;
    pub const EV_REMOTE_DEVICE_PROPS: u8 = 0x83;
    pub const EV_DEVICE_FOUND: u8 = 0x84;
    pub const EV_DISCOVERY_STATE_CHANGED: u8 = 0x85;
    pub const EV_PIN_REQUEST: u8 = 0x86;
    pub const EV_SSP_REQUEST: u8 = 0x87;
    pub const EV_BOND_STATE_CHANGED: u8 = 0x88;
    pub const EV_ACL_STATE_CHANGED: u8 = 0x89;
    pub const EV_DUT_MODE_RECEIVE: u8 = 0x8a;
    pub const EV_LE_TEST_MODE: u8 = 0x8b;

    pub const OPCODES: &[OpcodeDef] = &[
        OpcodeDef::command(ENABLE, "enable"),
        OpcodeDef::command(DISABLE, "disable"),
        OpcodeDef::command(GET_ADAPTER_PROPS, "get_adapter_properties"),
        OpcodeDef::command(GET_ADAPTER_PROP, "get_adapter_property"),
        OpcodeDef::command(SET_ADAPTER_PROP, "set_adapter_property"),
        OpcodeDef::command(GET_REMOTE_DEVICE_PROPS, "get_remote_device_properties"),
        OpcodeDef::command(GET_REMOTE_DEVICE_PROP, "get_remote_device_property"),
        OpcodeDef::command(SET_REMOTE_DEVICE_PROP, "set_remote_device_property"),
        OpcodeDef::command(GET_REMOTE_SERVICE_REC, "get_remote_service_record"),
        OpcodeDef::command(GET_REMOTE_SERVICE, "get_remote_services"),
        OpcodeDef::command(START_DISCOVERY, "start_discovery"),
        OpcodeDef::command(CANCEL_DISCOVERY, "cancel_discovery"),
        OpcodeDef::command(CREATE_BOND, "create_bond"),
        OpcodeDef::command(REMOVE_BOND, "remove_bond"),
        OpcodeDef::command(CANCEL_BOND, "cancel_bond"),
        OpcodeDef::command(PIN_REPLY, "pin_reply"),
        OpcodeDef::command(SSP_REPLY, "ssp_reply"),
        OpcodeDef::command(DUT_MODE_CONF, "dut_mode_configure"),
        OpcodeDef::command(DUT_MODE_SEND, "dut_mode_send"),
        OpcodeDef::command(LE_TEST_MODE, "le_test_mode"),
        OpcodeDef::event(EV_ADAPTER_STATE_CHANGED, "adapter_state_changed"),
        OpcodeDef::event(EV_ADAPTER_PROPS_CHANGED, "adapter_properties_changed"),
        OpcodeDef::event(EV_REMOTE_DEVICE_PROPS, "remote_device_properties"),
        OpcodeDef::event(EV_DEVICE_FOUND, "device_found"),
        OpcodeDef::event(EV_DISCOVERY_STATE_CHANGED, "discovery_state_changed"),
        OpcodeDef::event(EV_PIN_REQUEST, "pin_request"),
        OpcodeDef::event(EV_SSP_REQUEST, "ssp_request"),
        OpcodeDef::event(EV_BOND_STATE_CHANGED, "bond_state_changed"),
        OpcodeDef::event(EV_ACL_STATE_CHANGED, "acl_state_changed"),
        OpcodeDef::event(EV_DUT_MODE_RECEIVE, "dut_mode_receive"),
        OpcodeDef::event(EV_LE_TEST_MODE, "le_test_mode"),
    ];
}

/// HID host service.
pub mod hidhost {
    use super::OpcodeDef;

    pub const CONNECT: u8 = 0x01;
    pub const DISCONNECT: u8 = 0x02;
    pub const VIRTUAL_UNPLUG: u8 = 0x03;
    pub const SET_INFO: u8 = 0x04;
    pub const GET_PROTOCOL: u8 = 0x05;
    pub const SET_PROTOCOL: u8 = 0x06;
    pub const GET_REPORT: u8 = 0x07;
    pub const SET_REPORT: u8 = 0x08;
    pub const SEND_DATA: u8 = 0x09;

    pub const REPORT_PROTOCOL: u8 = 0x00;
    pub const BOOT_PROTOCOL: u8 = 0x01;
    pub const UNSUPPORTED_PROTOCOL: u8 = 0xff;

    pub const INPUT_REPORT: u8 = 0x01;
    pub const OUTPUT_REPORT: u8 = 0x02;
    pub const FEATURE_REPORT: u8 = 0x03;

    pub const OPCODES: &[OpcodeDef] = &[
        OpcodeDef::command(CONNECT, "connect"),
        OpcodeDef::command(DISCONNECT, "disconnect"),
        OpcodeDef::command(VIRTUAL_UNPLUG, "virtual_unplug"),
        OpcodeDef::command(SET_INFO, "set_info"),
        OpcodeDef::command(GET_PROTOCOL, "get_protocol"),
        OpcodeDef::command(SET_PROTOCOL, "set_protocol"),
        OpcodeDef::command(GET_REPORT, "get_report"),
        OpcodeDef::command(SET_REPORT, "set_report"),
        OpcodeDef::command(SEND_DATA, "send_data"),
    ];
}

const SERVICE_COUNT: usize = service::MAX_SERVICE as usize + 1;

const SERVICE_TABLE: [ServiceDef; SERVICE_COUNT] = [
    ServiceDef {
        id: service::CORE,
        name: "core",
        opcodes: control::OPCODES,
    },
    ServiceDef {
        id: service::BLUETOOTH,
        name: "bluetooth",
        opcodes: bluetooth::OPCODES,
    },
    ServiceDef {
        id: service::SOCK,
        name: "socket",
        opcodes: &[],
    },
    ServiceDef {
        id: service::HIDHOST,
        name: "hidhost",
        opcodes: hidhost::OPCODES,
    },
    ServiceDef {
        id: service::PAN,
        name: "pan",
        opcodes: &[],
    },
    ServiceDef {
        id: service::HANDSFREE,
        name: "handsfree",
        opcodes: &[],
    },
    ServiceDef {
        id: service::A2DP,
        name: "a2dp",
        opcodes: &[],
    },
    ServiceDef {
        id: service::HEALTH,
        name: "health",
        opcodes: &[],
    },
    ServiceDef {
        id: service::AVRCP,
        name: "avrcp",
        opcodes: &[],
    },
    ServiceDef {
        id: service::GATT,
        name: "gatt",
        opcodes: &[],
    },
];

/// Every assigned service, indexed by id.
pub static SERVICES: [ServiceDef; SERVICE_COUNT] = SERVICE_TABLE;

/// True if no opcode repeats and every declared kind matches its range.
pub const fn table_is_consistent(table: &[OpcodeDef]) -> bool {
    let mut i = 0;
    while i < table.len() {
        let def = table[i];
        if OpcodeKind::of(def.opcode) as u8 != def.kind as u8 {
            return false;
        }
        let mut j = i + 1;
        while j < table.len() {
            if table[j].opcode == def.opcode {
                return false;
            }
            j += 1;
        }
        i += 1;
    }
    true
}

const fn services_are_consistent(services: &[ServiceDef]) -> bool {
    let mut i = 0;
    while i < services.len() {
        if services[i].id as usize != i || !table_is_consistent(services[i].opcodes) {
            return false;
        }
        i += 1;
    }
    true
}

const _: () = assert!(
    table_is_consistent(control::OPCODES),
    "core opcode table has a collision"
);
const _: () = assert!(
    table_is_consistent(bluetooth::OPCODES),
    "bluetooth opcode table has a collision"
);
const _: () = assert!(
    table_is_consistent(hidhost::OPCODES),
    "hidhost opcode table has a collision"
);
const _: () = assert!(
    services_are_consistent(&SERVICE_TABLE),
    "service table is out of order or inconsistent"
);

/// Look up a service definition by id.
pub fn service_def(id: ServiceId) -> Option<&'static ServiceDef> {
    SERVICES.get(usize::from(id))
}

/// Look up an opcode definition within a service.
pub fn opcode_def(service_id: ServiceId, opcode: u8) -> Option<&'static OpcodeDef> {
    service_def(service_id)?.opcode(opcode)
}

/// Human-readable opcode name, falling back to its range.
pub fn opcode_name(service_id: ServiceId, opcode: u8) -> &'static str {
    match opcode_def(service_id, opcode) {
        Some(def) => def.name,
        None => OpcodeKind::of(opcode).as_str(),
    }
}
