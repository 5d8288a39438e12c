//! # ASV Executable Parameters
//!
//! This module provide parameters for the ASV executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;
use std::time::Duration;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Deserialize, Debug, Clone)]
pub struct AsvExecParams {
    /// Period of the bus drain
    pub bus_period_ms: u64,

    /// Client ID of the pilot
    pub pilot_id: String,

    /// Client ID of the helm adapter
    pub helm_id: String,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl AsvExecParams {
    pub fn bus_period(&self) -> Duration {
        util::time::millis(self.bus_period_ms)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse() {
        let params: AsvExecParams = util::params::parse(
            r#"
            bus_period_ms = 10
            pilot_id = "pilot"
            helm_id = "helm"
            "#,
        )
        .unwrap();

        assert_eq!(params.bus_period(), Duration::from_millis(10));
        assert_eq!(params.helm_id, "helm");
    }
}
