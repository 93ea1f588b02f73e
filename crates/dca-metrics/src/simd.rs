//! SIMD-optimized numeric kernels.
//!
//! These implementations use the `wide` crate for portable SIMD operations. Lane order
//! is fixed, so results are bit-identical across runs on the same input.

use wide::f64x4;

/// SIMD-optimized simple returns: `data[i + 1] / data[i] - 1`.
///
/// A non-positive previous price yields a return of 0.
pub fn returns_simd(data: &[f64]) -> Vec<f64> {
    if data.len() < 2 {
        return vec![];
    }

    let n = data.len() - 1;
    let mut result = Vec::with_capacity(n);
    let chunks = n / 4;
    let one = f64x4::splat(1.0);

    for i in 0..chunks {
        let idx = i * 4;
        let prev = f64x4::new([data[idx], data[idx + 1], data[idx + 2], data[idx + 3]]);
        let curr = f64x4::new([
            data[idx + 1],
            data[idx + 2],
            data[idx + 3],
            data[idx + 4],
        ]);
        result.extend((curr / prev - one).to_array());
    }

    for i in (chunks * 4)..n {
        result.push(data[i + 1] / data[i] - 1.0);
    }

    for (ret, &prev) in result.iter_mut().zip(data.iter()) {
        if prev <= 0.0 {
            *ret = 0.0;
        }
    }

    result
}

/// SIMD-optimized sum of a slice.
pub fn sum_simd(data: &[f64]) -> f64 {
    let chunks = data.len() / 4;
    let mut simd_sum = f64x4::splat(0.0);

    for i in 0..chunks {
        let idx = i * 4;
        let values = f64x4::new([data[idx], data[idx + 1], data[idx + 2], data[idx + 3]]);
        simd_sum += values;
    }

    let mut result = simd_sum.reduce_add();

    // Handle remaining elements
    for &value in &data[(chunks * 4)..] {
        result += value;
    }

    result
}

/// SIMD-optimized arithmetic mean. Empty input yields 0.
pub fn mean_simd(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    sum_simd(data) / data.len() as f64
}

/// SIMD-optimized dot product.
pub fn dot_product_simd(a: &[f64], b: &[f64]) -> f64 {
    let len = a.len().min(b.len());
    let chunks = len / 4;
    let mut simd_sum = f64x4::splat(0.0);

    for i in 0..chunks {
        let idx = i * 4;
        let va = f64x4::new([a[idx], a[idx + 1], a[idx + 2], a[idx + 3]]);
        let vb = f64x4::new([b[idx], b[idx + 1], b[idx + 2], b[idx + 3]]);
        simd_sum += va * vb;
    }

    let mut result = simd_sum.reduce_add();

    for i in (chunks * 4)..len {
        result += a[i] * b[i];
    }

    result
}

/// Subtract the mean from every element.
pub fn center_simd(data: &[f64]) -> Vec<f64> {
    let mean = mean_simd(data);
    let chunks = data.len() / 4;
    let mean_vec = f64x4::splat(mean);
    let mut result = Vec::with_capacity(data.len());

    for i in 0..chunks {
        let idx = i * 4;
        let values = f64x4::new([data[idx], data[idx + 1], data[idx + 2], data[idx + 3]]);
        result.extend((values - mean_vec).to_array());
    }

    for &value in &data[(chunks * 4)..] {
        result.push(value - mean);
    }

    result
}

/// SIMD-optimized min/max finder.
pub fn minmax_simd(data: &[f64]) -> Option<(f64, f64)> {
    if data.is_empty() {
        return None;
    }

    let chunks = data.len() / 4;
    let mut min_vec = f64x4::splat(f64::INFINITY);
    let mut max_vec = f64x4::splat(f64::NEG_INFINITY);

    for i in 0..chunks {
        let idx = i * 4;
        let values = f64x4::new([data[idx], data[idx + 1], data[idx + 2], data[idx + 3]]);
        min_vec = min_vec.min(values);
        max_vec = max_vec.max(values);
    }

    let min_arr = min_vec.to_array();
    let max_arr = max_vec.to_array();

    let mut min = min_arr[0].min(min_arr[1]).min(min_arr[2]).min(min_arr[3]);
    let mut max = max_arr[0].max(max_arr[1]).max(max_arr[2]).max(max_arr[3]);

    for &value in &data[(chunks * 4)..] {
        min = min.min(value);
        max = max.max(value);
    }

    Some((min, max))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_returns_simd_matches_scalar() {
        let data: Vec<f64> = (0..23)
            .map(|i| 100.0 + (i as f64 * 0.7).sin() * 8.0)
            .collect();
        let result = returns_simd(&data);

        assert_eq!(result.len(), data.len() - 1);
        for (i, r) in result.iter().enumerate() {
            let expected = data[i + 1] / data[i] - 1.0;
            assert!((r - expected).abs() < 1e-15);
        }
    }

    #[test]
    fn test_returns_simd_zero_price() {
        let result = returns_simd(&[0.0, 10.0, 11.0]);
        assert_eq!(result[0], 0.0);
        assert!((result[1] - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_returns_simd_short_input() {
        assert!(returns_simd(&[5.0]).is_empty());
        assert!(returns_simd(&[]).is_empty());
    }

    #[test]
    fn test_sum_simd() {
        let data: Vec<f64> = (1..=100).map(|x| x as f64).collect();
        let result = sum_simd(&data);

        // Sum of 1 to 100 = 5050
        assert!((result - 5050.0).abs() < 1e-10);
    }

    #[test]
    fn test_center_and_dot() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let centered = center_simd(&data);
        assert_eq!(centered, vec![-2.0, -1.0, 0.0, 1.0, 2.0]);
        assert!((dot_product_simd(&centered, &centered) - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_minmax_simd() {
        let data = vec![3.0, -1.0, 7.5, 2.0, 0.5, 9.0];
        assert_eq!(minmax_simd(&data), Some((-1.0, 9.0)));
        assert_eq!(minmax_simd(&[]), None);
    }
}
