use crate::types::{HealthRes, MessageRes};

/// Liveness and informational responses shared by every API surface.
#[derive(Clone, Debug, Default)]
pub struct HealthService;

impl HealthService {
    /// Reports that the service is up.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "PMS is alive".into(),
        }
    }

    /// Greeting served from the root path.
    pub fn welcome() -> MessageRes {
        MessageRes::new("Patient Management System API!")
    }

    /// Static description served from `/about`.
    pub fn about() -> MessageRes {
        MessageRes::new("A fully functional API to manage your patient records")
    }
}
