//! SIMD kernels for vector distance computation using the wide crate.

use wide::f32x8;

const LANES: usize = 8;

#[inline]
fn load(chunk: &[f32]) -> f32x8 {
    let mut lanes = [0.0f32; LANES];
    lanes.copy_from_slice(chunk);
    f32x8::new(lanes)
}

/// Squared Euclidean distance processing 8 lanes at once.
///
/// Both slices must have the same length; callers validate dimensions.
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());

    let mut acc = f32x8::splat(0.0);
    let a_chunks = a.chunks_exact(LANES);
    let b_chunks = b.chunks_exact(LANES);
    let a_rest = a_chunks.remainder();
    let b_rest = b_chunks.remainder();

    for (ca, cb) in a_chunks.zip(b_chunks) {
        let diff = load(ca) - load(cb);
        acc = acc + diff * diff;
    }

    let mut sum: f32 = acc.to_array().iter().sum();
    for (x, y) in a_rest.iter().zip(b_rest.iter()) {
        let d = x - y;
        sum += d * d;
    }
    sum
}

/// Dot product processing 8 lanes at once.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());

    let mut acc = f32x8::splat(0.0);
    let a_chunks = a.chunks_exact(LANES);
    let b_chunks = b.chunks_exact(LANES);
    let a_rest = a_chunks.remainder();
    let b_rest = b_chunks.remainder();

    for (ca, cb) in a_chunks.zip(b_chunks) {
        acc = acc + load(ca) * load(cb);
    }

    let mut sum: f32 = acc.to_array().iter().sum();
    for (x, y) in a_rest.iter().zip(b_rest.iter()) {
        sum += x * y;
    }
    sum
}
