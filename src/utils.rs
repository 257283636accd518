pub const PROTON: f64 = 1.007276466812;
pub const ELECTRON_MASS: f64 = 0.00054857990946;

/// The signed mass error of `observed` relative to `expected` in parts-per-million
#[inline]
pub fn ppm_error(observed: f64, expected: f64) -> f64 {
    (observed - expected) / expected * 1e6
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_ppm_error() {
        assert!((ppm_error(1000.01, 1000.0) - 10.0).abs() < 1e-6);
        assert!((ppm_error(999.99, 1000.0) + 10.0).abs() < 1e-6);
    }
}
