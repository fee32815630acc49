/// Estimate the length of a curve from an unordered sample of points along
/// it, by greedy nearest-neighbor traversal.
///
/// Starting from the first point in sequence order, the walk repeatedly
/// jumps to the nearest not-yet-visited point and accumulates the Euclidean
/// hop distance. Ties go to the earliest point in the remaining sequence
/// order, so results are reproducible on regularly-sampled data where ties
/// are common.
///
/// This approximates the physical length of a skeletonized branch; it is
/// not a shortest-Hamiltonian-path solver. Deliberately O(n²): per-branch
/// point counts are small after upstream downsampling and clustering.
///
/// The input is consumed; callers needing the points afterwards should pass
/// a clone. An empty input yields `0.0` by definition, not an error.
pub fn estimate_path_length(mut points: Vec<[f32; 3]>) -> f32 {
    if points.is_empty() {
        return 0.0;
    }

    let mut current = points.remove(0);
    let mut total = 0.0f64;

    while !points.is_empty() {
        let mut best = 0;
        let mut best_dist = distance(&current, &points[0]);
        for (i, p) in points.iter().enumerate().skip(1) {
            let d = distance(&current, p);
            if d < best_dist {
                best_dist = d;
                best = i;
            }
        }

        total += best_dist as f64;
        // Vec::remove keeps the relative order of the remainder, which the
        // tie-break rule depends on.
        current = points.remove(best);
    }

    total as f32
}

fn distance(a: &[f32; 3], b: &[f32; 3]) -> f32 {
    ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)).sqrt()
}
