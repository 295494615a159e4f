//! Opcode ranges shared by every service namespace.

/// Error response; the payload is one status byte.
pub const OP_ERROR: u8 = 0x00;

/// Highest command/response opcode.
pub const MAX_COMMAND: u8 = 0x80;

/// Lowest event opcode.
pub const MIN_EVENT: u8 = 0x81;

/// Which range an opcode falls in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpcodeKind {
    Error,
    Command,
    Event,
}

impl OpcodeKind {
    /// Classify a raw opcode.
    pub const fn of(opcode: u8) -> Self {
        match opcode {
            OP_ERROR => Self::Error,
            MIN_EVENT..=u8::MAX => Self::Event,
            _ => Self::Command,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Command => "command",
            Self::Event => "event",
        }
    }
}

/// True for opcodes the service sends unsolicited.
pub const fn is_event(opcode: u8) -> bool {
    opcode >= MIN_EVENT
}

/// True for opcodes the controller issues and the service answers.
pub const fn is_command(opcode: u8) -> bool {
    opcode != OP_ERROR && opcode <= MAX_COMMAND
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_threshold_holds_for_every_opcode() {
        for opcode in 0..=u8::MAX {
            assert_eq!(is_event(opcode), opcode >= 0x81, "opcode {opcode:#04x}");
            assert_eq!(
                OpcodeKind::of(opcode) == OpcodeKind::Event,
                is_event(opcode)
            );
        }
    }

    #[test]
    fn ranges_partition_opcode_space() {
        for opcode in 0..=u8::MAX {
            let kinds = [opcode == OP_ERROR, is_command(opcode), is_event(opcode)];
            assert_eq!(kinds.iter().filter(|k| **k).count(), 1);
        }
        assert_eq!(OpcodeKind::of(0x00), OpcodeKind::Error);
        assert_eq!(OpcodeKind::of(0x80), OpcodeKind::Command);
        assert_eq!(OpcodeKind::of(0x81), OpcodeKind::Event);
    }
}
