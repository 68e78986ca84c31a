use crate::schema::HealthRes;

/// Health check shared by every binary that exposes the read API.
#[derive(Clone, Default)]
pub struct HealthService;

impl HealthService {
    pub fn new() -> Self {
        Self
    }

    /// Returns a `HealthRes` indicating the service is alive.
    ///
    /// Liveness only; neither the database nor the upstream source is consulted.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "Quotes API is alive".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_health_reports_ok() {
        let res = HealthService::check_health();
        assert!(res.ok);
        assert!(!res.message.is_empty());
    }
}
