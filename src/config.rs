//! Configuration for the real closure engine.

/// Tunable parameters of a [`crate::RcfManager`].
///
/// All precisions are in bits: a precision of `k` means intervals of width
/// below `1/2^k`.
#[derive(Debug, Clone)]
pub struct RcfConfig {
    /// Initial precision for fresh intervals (transcendentals,
    /// infinitesimals, lazily computed rational intervals).
    pub initial_precision: u32,
    /// `2^inf_precision` is the finite bound used when approximating an
    /// infinite value by an unbounded interval.
    pub inf_precision: u32,
    /// Intervals with magnitude below `-min_mag` are considered too small
    /// and are saved before being refined further.
    pub min_mag: u32,
    /// Number of bits retained by approximate dyadic division.
    pub div_precision: u32,
}

impl Default for RcfConfig {
    fn default() -> Self {
        Self {
            initial_precision: 24,
            inf_precision: 24,
            min_mag: 64,
            div_precision: 24,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RcfConfig::default();
        assert_eq!(config.initial_precision, 24);
        assert_eq!(config.inf_precision, 24);
        assert_eq!(config.min_mag, 64);
        assert_eq!(config.div_precision, 24);
    }
}
