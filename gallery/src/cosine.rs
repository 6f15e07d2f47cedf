/// Compute the cosine distance between two vectors.
///
/// Returns a value in `[0, 2]` where 0 means identical direction and
/// 2 means opposite direction.
///
/// Uses f64 intermediate precision. Returns 2.0 for zero vectors or
/// dimension mismatches.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 2.0;
    }

    let mut dot: f64 = 0.0;
    let mut norm_a: f64 = 0.0;
    let mut norm_b: f64 = 0.0;

    for i in 0..a.len() {
        let ai = a[i] as f64;
        let bi = b[i] as f64;
        dot += ai * bi;
        norm_a += ai * ai;
        norm_b += bi * bi;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 2.0;
    }

    let similarity = dot / (norm_a.sqrt() * norm_b.sqrt());
    // Clamp to [-1, 1] to handle floating point errors.
    let similarity = similarity.clamp(-1.0, 1.0);
    (1.0 - similarity) as f32
}

/// Scale `v` to unit length in place.
///
/// Returns false and leaves `v` untouched when its norm is zero or
/// not finite.
pub fn l2_normalize(v: &mut [f32]) -> bool {
    let norm: f64 = v
        .iter()
        .map(|&x| (x as f64) * (x as f64))
        .sum::<f64>()
        .sqrt();
    if norm == 0.0 || !norm.is_finite() {
        return false;
    }
    let s = (1.0 / norm) as f32;
    for x in v.iter_mut() {
        *x *= s;
    }
    true
}
