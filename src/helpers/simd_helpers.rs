//! Inclusive range filters over numeric column slices.
//!
//! Matching positions are pushed to `out` as `base + offset`, in ascending
//! order, so a caller can scan any sub-range of a column and get absolute
//! record indices back. AVX2 is used when the CPU has it.

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::{
    __m256i, _CMP_GE_OQ, _CMP_LE_OQ, _mm256_and_pd, _mm256_castsi256_pd, _mm256_cmp_pd,
    _mm256_cmpgt_epi64, _mm256_loadu_pd, _mm256_loadu_si256, _mm256_movemask_pd,
    _mm256_or_si256, _mm256_set1_epi64x, _mm256_set1_pd,
};

#[cfg(target_arch = "x86_64")]
const LANES: usize = 4; // __m256i / __m256d hold 4 x 64-bit

/// Pushes `base + i` for every `values[i]` with `lo <= values[i] <= hi`.
pub fn filter_i64_between(values: &[i64], lo: i64, hi: i64, base: usize, out: &mut Vec<usize>) {
    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx2") {
            unsafe { filter_i64_between_avx2(values, lo, hi, base, out) };
            return;
        }
    }
    filter_i64_between_scalar(values, lo, hi, base, out);
}

/// Pushes `base + i` for every `values[i]` with `lo <= values[i] <= hi`. NaN never matches.
pub fn filter_f64_between(values: &[f64], lo: f64, hi: f64, base: usize, out: &mut Vec<usize>) {
    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx2") {
            unsafe { filter_f64_between_avx2(values, lo, hi, base, out) };
            return;
        }
    }
    filter_f64_between_scalar(values, lo, hi, base, out);
}

fn filter_i64_between_scalar(values: &[i64], lo: i64, hi: i64, base: usize, out: &mut Vec<usize>) {
    out.extend(
        values
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v >= lo && v <= hi)
            .map(|(i, _)| base + i),
    );
}

fn filter_f64_between_scalar(values: &[f64], lo: f64, hi: f64, base: usize, out: &mut Vec<usize>) {
    out.extend(
        values
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v >= lo && v <= hi)
            .map(|(i, _)| base + i),
    );
}

#[cfg(target_arch = "x86_64")]
#[inline]
fn push_lanes(mask_bits: i32, start: usize, out: &mut Vec<usize>) {
    for lane in 0..LANES {
        if (mask_bits & (1 << lane)) != 0 {
            out.push(start + lane);
        }
    }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn filter_i64_between_avx2(
    values: &[i64],
    lo: i64,
    hi: i64,
    base: usize,
    out: &mut Vec<usize>,
) {
    let chunks = values.chunks_exact(LANES);
    let remainder = chunks.remainder();

    unsafe {
        let lo_v = _mm256_set1_epi64x(lo);
        let hi_v = _mm256_set1_epi64x(hi);

        for (chunk_idx, chunk) in chunks.enumerate() {
            let v = _mm256_loadu_si256(chunk.as_ptr() as *const __m256i);
            // no cmpge for epi64: take the lanes that are below lo or above hi and invert
            let outside = _mm256_or_si256(_mm256_cmpgt_epi64(lo_v, v), _mm256_cmpgt_epi64(v, hi_v));
            let outside_bits = _mm256_movemask_pd(_mm256_castsi256_pd(outside));
            push_lanes(!outside_bits & 0b1111, base + chunk_idx * LANES, out);
        }
    }

    let tail = values.len() - remainder.len();
    filter_i64_between_scalar(remainder, lo, hi, base + tail, out);
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn filter_f64_between_avx2(
    values: &[f64],
    lo: f64,
    hi: f64,
    base: usize,
    out: &mut Vec<usize>,
) {
    let chunks = values.chunks_exact(LANES);
    let remainder = chunks.remainder();

    unsafe {
        let lo_v = _mm256_set1_pd(lo);
        let hi_v = _mm256_set1_pd(hi);

        for (chunk_idx, chunk) in chunks.enumerate() {
            let v = _mm256_loadu_pd(chunk.as_ptr());
            let ge = _mm256_cmp_pd(v, lo_v, _CMP_GE_OQ);
            let le = _mm256_cmp_pd(v, hi_v, _CMP_LE_OQ);
            let mask_bits = _mm256_movemask_pd(_mm256_and_pd(ge, le));
            push_lanes(mask_bits, base + chunk_idx * LANES, out);
        }
    }

    let tail = values.len() - remainder.len();
    filter_f64_between_scalar(remainder, lo, hi, base + tail, out);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_i64_between_is_inclusive() {
        let values = [1, 5, 10, 15, 20, 25, 30];
        let mut out = Vec::new();
        filter_i64_between(&values, 10, 25, 100, &mut out);
        assert_eq!(out, vec![102, 103, 104, 105]);
    }

    #[test]
    fn test_i64_between_matches_scalar() {
        let values: Vec<i64> = (0..103).map(|i| (i * 37) % 50 - 10).collect();
        let mut fast = Vec::new();
        let mut slow = Vec::new();
        filter_i64_between(&values, -3, 17, 7, &mut fast);
        filter_i64_between_scalar(&values, -3, 17, 7, &mut slow);
        assert_eq!(fast, slow);
    }

    #[test]
    fn test_f64_between_is_inclusive_and_skips_nan() {
        let values = [40.5, 40.9, f64::NAN, 40.4999, 40.7, 41.0];
        let mut out = Vec::new();
        filter_f64_between(&values, 40.5, 40.9, 0, &mut out);
        assert_eq!(out, vec![0, 1, 4]);
    }

    #[test]
    fn test_f64_between_matches_scalar() {
        let values: Vec<f64> = (0..61).map(|i| 40.0 + (i % 13) as f64 * 0.1).collect();
        let mut fast = Vec::new();
        let mut slow = Vec::new();
        filter_f64_between(&values, 40.3, 40.8, 0, &mut fast);
        filter_f64_between_scalar(&values, 40.3, 40.8, 0, &mut slow);
        assert_eq!(fast, slow);
    }

    #[test]
    fn test_empty_input() {
        let mut out = Vec::new();
        filter_i64_between(&[], 0, 1, 0, &mut out);
        filter_f64_between(&[], 0.0, 1.0, 0, &mut out);
        assert!(out.is_empty());
    }
}
