//! Service identifiers.
//!
//! Service 0 is the core service that registers and unregisters the others.

/// Raw one-byte service identifier.
pub type ServiceId = u8;

/// Core control service (module registration).
pub const CORE: ServiceId = 0;
/// Adapter and remote device management.
pub const BLUETOOTH: ServiceId = 1;
/// RFCOMM/L2CAP sockets.
pub const SOCK: ServiceId = 2;
/// HID host profile.
pub const HIDHOST: ServiceId = 3;
/// Personal area networking.
pub const PAN: ServiceId = 4;
/// Hands-free profile.
pub const HANDSFREE: ServiceId = 5;
/// Advanced audio distribution profile.
pub const A2DP: ServiceId = 6;
/// Health device profile.
pub const HEALTH: ServiceId = 7;
/// AV remote control profile.
pub const AVRCP: ServiceId = 8;
/// Generic attribute profile.
pub const GATT: ServiceId = 9;

/// Highest assigned service id.
pub const MAX_SERVICE: ServiceId = GATT;

/// Returns the service's name, or `None` for unassigned ids.
pub fn service_name(id: ServiceId) -> Option<&'static str> {
    let name = match id {
        CORE => "core",
        BLUETOOTH => "bluetooth",
        SOCK => "socket",
        HIDHOST => "hidhost",
        PAN => "pan",
        HANDSFREE => "handsfree",
        A2DP => "a2dp",
        HEALTH => "health",
        AVRCP => "avrcp",
        GATT => "gatt",
        _ => return None,
    };
    Some(name)
}

/// Returns true if `id` names an assigned service.
pub fn is_valid(id: ServiceId) -> bool {
    id <= MAX_SERVICE
}

/// Name for diagnostics, `"unknown"` for unassigned ids.
pub fn display_name(id: ServiceId) -> &'static str {
    service_name(id).unwrap_or("unknown")
}
