use tracing::debug;

use crate::error::{ProtoError, Result};
use crate::service::{self, ServiceId};

/// Which services completed their registration handshake.
///
/// The core service is always ready; it carries the handshake itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadyServices {
    bits: u16,
}

impl ReadyServices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_ready(&self, id: ServiceId) -> bool {
        id == service::CORE || (service::is_valid(id) && self.bits & Self::bit(id) != 0)
    }

    /// Fail with `NotReady` unless `id` is ready.
    pub fn require_ready(&self, id: ServiceId) -> Result<()> {
        if self.is_ready(id) {
            return Ok(());
        }
        Err(ProtoError::NotReady {
            id,
            name: service::display_name(id),
        })
    }

    /// Record a registration confirmation.
    pub fn mark_ready(&mut self, id: ServiceId) -> Result<()> {
        if !service::is_valid(id) {
            return Err(ProtoError::UnknownService(id));
        }
        if id != service::CORE {
            self.bits |= Self::bit(id);
            debug!(service_id = id, "service ready");
        }
        Ok(())
    }

    /// Clear a service's ready flag. Returns whether it was set.
    pub fn mark_unregistered(&mut self, id: ServiceId) -> bool {
        if id == service::CORE || !service::is_valid(id) {
            return false;
        }
        let was_ready = self.bits & Self::bit(id) != 0;
        self.bits &= !Self::bit(id);
        was_ready
    }

    /// Ready services other than core, ascending.
    pub fn iter(&self) -> impl Iterator<Item = ServiceId> + '_ {
        (service::CORE + 1..=service::MAX_SERVICE).filter(|id| self.is_ready(*id))
    }

    fn bit(id: ServiceId) -> u16 {
        1 << id
    }
}
