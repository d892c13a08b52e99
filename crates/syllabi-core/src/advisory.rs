use serde::{Deserialize, Serialize};

/// Credits per week above which the load is flagged as too dense.
pub const DENSE_RATIO: f64 = 1.5;
/// Credits per week below which the load is flagged as thin.
pub const SPARSE_RATIO: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Info,
}

/// Presentation-only note about the credit/duration balance of a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advisory {
    pub severity: Severity,
    pub ratio: f64,
    pub message: String,
}

/// Advise on the credit-to-duration ratio. Returns `None` for a balanced
/// load or when either input is zero.
pub fn credit_advisory(duration_weeks: u32, credit_hours: u32) -> Option<Advisory> {
    if duration_weeks == 0 || credit_hours == 0 {
        return None;
    }
    let ratio = f64::from(credit_hours) / f64::from(duration_weeks);
    if ratio > DENSE_RATIO {
        Some(Advisory {
            severity: Severity::Warning,
            ratio,
            message: format!(
                "Intensity Alert: {credit_hours} credits in {duration_weeks} weeks is extremely dense. \
                 Consider increasing duration or reducing credits for better student outcomes."
            ),
        })
    } else if ratio < SPARSE_RATIO {
        Some(Advisory {
            severity: Severity::Info,
            ratio,
            message: "Structure Note: Low credit-to-duration ratio. Ensure the curriculum has \
                      sufficient depth to maintain student engagement."
                .to_string(),
        })
    } else {
        None
    }
}
