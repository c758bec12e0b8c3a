use crate::core::error::MatchError;

/// Cosine similarity of two aligned vectors
///
/// Returns 0.0 when either vector has zero magnitude. Vectors of different
/// lengths are an invariant violation: every vector in one engine call is built
/// from the same vocabulary.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> Result<f64, MatchError> {
    if a.len() != b.len() {
        return Err(MatchError::InternalInvariantViolation(format!(
            "vector length mismatch: {} vs {}",
            a.len(),
            b.len()
        )));
    }

    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;

    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok(dot / (norm_a.sqrt() * norm_b.sqrt()))
}

/// Round to a fixed number of decimal places
#[inline]
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_vectors() {
        let sim = cosine_similarity(&[3.0, 4.0, 0.0], &[3.0, 4.0, 0.0]).unwrap();
        assert!((sim - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_proportional_vectors() {
        let sim = cosine_similarity(&[1.0, 2.0], &[2.0, 4.0]).unwrap();
        assert!((sim - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_orthogonal_vectors() {
        let sim = cosine_similarity(&[1.0, 0.0], &[0.0, 5.0]).unwrap();
        assert_eq!(sim, 0.0);
    }

    #[test]
    fn test_zero_norm_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]).unwrap(), 0.0);
        assert_eq!(cosine_similarity(&[], &[]).unwrap(), 0.0);
    }

    #[test]
    fn test_symmetric() {
        let a = [5.0, 2.0, 0.0, 1.0];
        let b = [4.0, 0.0, 3.0, 2.0];
        assert_eq!(cosine_similarity(&a, &b).unwrap(), cosine_similarity(&b, &a).unwrap());
    }

    #[test]
    fn test_length_mismatch() {
        let err = cosine_similarity(&[1.0], &[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, MatchError::InternalInvariantViolation(_)));
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(0.93064, 3), 0.931);
        assert_eq!(round_to(0.04999999999999999, 3), 0.05);
        assert_eq!(round_to(0.9999999999999998, 3), 1.0);
    }
}
