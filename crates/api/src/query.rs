//! Shared query parameter types for API handlers.

use serde::Deserialize;

/// `?limit=` for endpoints that return a bounded, unpaginated list.
#[derive(Debug, Default, Deserialize)]
pub struct LimitParams {
    pub limit: Option<i64>,
}

impl LimitParams {
    /// The requested limit clamped into `1..=max`, or `default` if absent.
    pub fn clamped(&self, default: i64, max: i64) -> i64 {
        self.limit.unwrap_or(default).clamp(1, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamped_applies_default_and_bounds() {
        assert_eq!(LimitParams::default().clamped(10, 50), 10);
        assert_eq!(LimitParams { limit: Some(0) }.clamped(10, 50), 1);
        assert_eq!(LimitParams { limit: Some(500) }.clamped(10, 50), 50);
    }
}
