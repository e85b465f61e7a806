//! Distance computation between descriptors

/// Squared Euclidean (L2) distance between two descriptors.
///
/// Results are never square-rooted so every engine reports directly
/// comparable values.
#[inline]
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let diff = x - y;
            diff * diff
        })
        .sum()
}

/// Whether every coordinate of `candidate` lies within `[query[i] - window, query[i] + window]`.
#[inline]
pub fn within_window(query: &[f32], candidate: &[f32], window: f32) -> bool {
    query
        .iter()
        .zip(candidate.iter())
        .all(|(q, c)| *c >= q - window && *c <= q + window)
}

/// Index of the row in `rows` (row-major, `dim` wide) closest to `query`.
///
/// Ties resolve to the lowest row index. Returns `None` when `rows` is empty.
pub fn nearest_row(query: &[f32], rows: &[f32], dim: usize) -> Option<usize> {
    rows.chunks_exact(dim)
        .enumerate()
        .map(|(i, row)| (i, squared_l2(query, row)))
        .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_squared_l2() {
        let dist = squared_l2(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]);
        assert_relative_eq!(dist, 27.0, epsilon = 1e-6);
    }

    #[test]
    fn test_squared_l2_same_vector() {
        let v = [1.0, 2.0, 3.0];
        assert_relative_eq!(squared_l2(&v, &v), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_squared_l2_scales_with_dimension() {
        let a = vec![0.0; 100];
        let b = vec![3.0; 100];
        assert_relative_eq!(squared_l2(&a, &b), 900.0, epsilon = 1e-3);
    }

    #[test]
    fn test_within_window() {
        assert!(within_window(&[0.0, 0.0], &[1.0, -1.0], 1.0));
        assert!(!within_window(&[0.0, 0.0], &[1.5, 0.0], 1.0));
        assert!(within_window(&[5.0], &[5.0], 0.0));
    }

    #[test]
    fn test_nearest_row() {
        let rows = [0.0, 0.0, 10.0, 10.0, 1.0, 1.0];
        assert_eq!(nearest_row(&[9.0, 9.0], &rows, 2), Some(1));
        assert_eq!(nearest_row(&[0.4, 0.4], &rows, 2), Some(0));
        assert_eq!(nearest_row(&[0.0, 0.0], &[], 2), None);
    }
}
