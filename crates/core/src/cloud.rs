use crate::Aabb;

/// Cluster label conventionally assigned to unclustered/noise points.
pub const NOISE_LABEL: i32 = -1;

/// A 3D point cloud stored as struct-of-arrays, with an optional per-point
/// cluster label column.
///
/// Labels are integer cluster ids as produced by a clustering stage;
/// [`NOISE_LABEL`] marks points that belong to no cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct PointCloud {
    pub x: Vec<f32>,
    pub y: Vec<f32>,
    pub z: Vec<f32>,
    pub labels: Option<Vec<i32>>,
}

impl PointCloud {
    pub fn new() -> Self {
        Self {
            x: Vec::new(),
            y: Vec::new(),
            z: Vec::new(),
            labels: None,
        }
    }

    pub fn from_xyz(x: Vec<f32>, y: Vec<f32>, z: Vec<f32>) -> Self {
        assert_eq!(x.len(), y.len(), "x and y must have same length");
        assert_eq!(x.len(), z.len(), "x and z must have same length");

        Self {
            x,
            y,
            z,
            labels: None,
        }
    }

    /// Attach a label column to an existing cloud.
    ///
    /// # Panics
    ///
    /// Panics if `labels.len() != self.len()`.
    pub fn with_labels(mut self, labels: Vec<i32>) -> Self {
        assert_eq!(
            labels.len(),
            self.len(),
            "label column must match point count"
        );
        self.labels = Some(labels);
        self
    }

    pub fn len(&self) -> usize {
        debug_assert_eq!(self.x.len(), self.y.len());
        debug_assert_eq!(self.x.len(), self.z.len());
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_xyz(&self.x, &self.y, &self.z)
    }

    pub fn point(&self, i: usize) -> [f32; 3] {
        [self.x[i], self.y[i], self.z[i]]
    }

    pub fn iter_points(&self) -> impl Iterator<Item = [f32; 3]> + '_ {
        self.x
            .iter()
            .zip(&self.y)
            .zip(&self.z)
            .map(|((x, y), z)| [*x, *y, *z])
    }

    /// Collect the points into an owned `Vec<[f32; 3]>`.
    ///
    /// Useful for consumers that need an ordered, mutable point sequence
    /// (e.g. the greedy path-length estimator).
    pub fn to_points(&self) -> Vec<[f32; 3]> {
        self.iter_points().collect()
    }

    /// Extract the subset of points at the given indices, carrying labels.
    ///
    /// # Panics
    ///
    /// Panics if any index is out of bounds.
    pub fn select(&self, indices: &[usize]) -> Self {
        let mut x = Vec::with_capacity(indices.len());
        let mut y = Vec::with_capacity(indices.len());
        let mut z = Vec::with_capacity(indices.len());

        for &idx in indices {
            assert!(idx < self.len(), "index out of bounds in select");
            x.push(self.x[idx]);
            y.push(self.y[idx]);
            z.push(self.z[idx]);
        }

        let labels = self
            .labels
            .as_ref()
            .map(|l| indices.iter().map(|&idx| l[idx]).collect());

        Self { x, y, z, labels }
    }

    /// Select all points NOT in the given index set.
    ///
    /// The returned cloud preserves the relative order of the retained points.
    ///
    /// # Panics
    ///
    /// Panics if any index in `indices` is out of bounds.
    pub fn select_inverse(&self, indices: &[usize]) -> Self {
        let n = self.len();
        let mut exclude = vec![false; n];
        for &idx in indices {
            assert!(idx < n, "index out of bounds in select_inverse");
            exclude[idx] = true;
        }

        let kept: Vec<usize> = (0..n).filter(|&i| !exclude[i]).collect();
        self.select(&kept)
    }

    /// Indices of all points carrying the given cluster label.
    ///
    /// Returns an empty vector when the cloud has no label column.
    pub fn indices_with_label(&self, label: i32) -> Vec<usize> {
        match &self.labels {
            Some(labels) => (0..self.len()).filter(|&i| labels[i] == label).collect(),
            None => Vec::new(),
        }
    }

    /// Distinct cluster labels present in the cloud, ascending, noise
    /// ([`NOISE_LABEL`]) excluded.
    pub fn cluster_labels(&self) -> Vec<i32> {
        let mut out: Vec<i32> = match &self.labels {
            Some(labels) => labels
                .iter()
                .copied()
                .filter(|&l| l != NOISE_LABEL)
                .collect(),
            None => Vec::new(),
        };
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Drop all points labeled as noise, keeping the label column.
    ///
    /// Clouds without a label column are returned unchanged.
    pub fn without_noise(&self) -> Self {
        match &self.labels {
            Some(labels) => {
                let kept: Vec<usize> = (0..self.len())
                    .filter(|&i| labels[i] != NOISE_LABEL)
                    .collect();
                self.select(&kept)
            }
            None => self.clone(),
        }
    }
}

impl Default for PointCloud {
    fn default() -> Self {
        Self::new()
    }
}
