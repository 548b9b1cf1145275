//! Triangular membership functions over the unit interval.
//!
//! A [`MembershipSet`] is never stored on its own: it is derived from a short list of
//! interior centers. The centers are sorted and bracketed by the boundary points `0.0`
//! and `1.0`, and one triangle is built per point. Each triangle's feet sit on the
//! neighbouring points, so only adjacent triangles overlap and the degrees at any `x`
//! strictly inside `(0, 1)` sum to one.
//!
//! ```text
//!   1 ┤╲      ╱╲    ╱╲      ╱
//!     │ ╲    ╱  ╲  ╱  ╲    ╱
//!     │  ╲  ╱    ╲╱    ╲  ╱
//!   0 ┼───╳──────╳──────╳───
//!     0   c1     c2     c3  1
//! ```
//!
//! The first and last triangles are degenerate (their outer foot equals their peak).
//! They still evaluate without dividing by zero, but at exactly `x = 1.0` every degree
//! is zero. Inputs must therefore go through
//! [`open_unit`](crate::normalize::open_unit) before inference.

use arrayvec::ArrayVec;

/// A triangular membership function `(left, peak, right)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangularMf {
    left: f64,
    peak: f64,
    right: f64,
}

impl TriangularMf {
    /// Creates a triangle. The points must satisfy `left <= peak <= right`.
    #[must_use]
    pub fn new(left: f64, peak: f64, right: f64) -> Self {
        debug_assert!(left <= peak && peak <= right);
        Self { left, peak, right }
    }

    #[must_use]
    pub fn left(&self) -> f64 {
        self.left
    }

    #[must_use]
    pub fn peak(&self) -> f64 {
        self.peak
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.right
    }

    /// Membership degree of `x`, in `[0, 1]`.
    ///
    /// Each ramp is only taken when its width is strictly positive, so degenerate
    /// boundary triangles never divide by zero.
    ///
    /// ```
    /// # use fuzzpilot_fuzzy::membership::TriangularMf;
    /// let mf = TriangularMf::new(0.0, 0.5, 1.0);
    /// assert_eq!(mf.membership(0.5), 1.0);
    /// assert_eq!(mf.membership(0.25), 0.5);
    /// assert_eq!(mf.membership(1.0), 0.0);
    /// ```
    #[must_use]
    pub fn membership(&self, x: f64) -> f64 {
        if self.left < x && x < self.peak {
            (x - self.left) / (self.peak - self.left)
        } else if self.peak <= x && x < self.right {
            (self.right - x) / (self.right - self.peak)
        } else {
            0.0
        }
    }
}

/// An ordered set of triangles covering `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct MembershipSet {
    mfs: Vec<TriangularMf>,
}

impl MembershipSet {
    /// Builds `centers.len() + 2` triangles from interior centers.
    ///
    /// Centers need not be sorted. Values are expected in `(0, 1)`; anything outside is
    /// clamped into `[0, 1]` and NaN is read as `0.5`, so the triangles stay well-formed.
    ///
    /// ```
    /// # use fuzzpilot_fuzzy::membership::MembershipSet;
    /// let set = MembershipSet::from_centers(&[0.8, 0.3, 0.5]);
    /// assert_eq!(set.peaks().collect::<Vec<_>>(), [0.0, 0.3, 0.5, 0.8, 1.0]);
    /// ```
    #[must_use]
    pub fn from_centers(centers: &[f64]) -> Self {
        let mut full = Vec::with_capacity(centers.len() + 2);
        full.push(0.0);
        full.extend(
            centers
                .iter()
                .map(|c| if c.is_nan() { 0.5 } else { c.clamp(0.0, 1.0) }),
        );
        full[1..].sort_by(f64::total_cmp);
        full.push(1.0);

        let n = full.len();
        let mfs = (0..n)
            .map(|i| {
                let left = if i > 0 { full[i - 1] } else { full[0] };
                let right = if i + 1 < n { full[i + 1] } else { full[n - 1] };
                TriangularMf::new(left, full[i], right)
            })
            .collect();
        Self { mfs }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.mfs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mfs.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&TriangularMf> {
        self.mfs.get(index)
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &TriangularMf> + '_ {
        self.mfs.iter()
    }

    pub fn peaks(&self) -> impl ExactSizeIterator<Item = f64> + '_ {
        self.mfs.iter().map(TriangularMf::peak)
    }

    /// Degree of `x` in every triangle, in order.
    pub fn degrees(&self, x: f64) -> impl ExactSizeIterator<Item = f64> + '_ {
        self.mfs.iter().map(move |mf| mf.membership(x))
    }

    /// The (at most two) triangles with a non-zero degree at `x`.
    ///
    /// Because supports only overlap with immediate neighbours, the only candidates are
    /// the triangle whose peak is the last peak `<= x` (falling ramp) and the one right
    /// after it (rising ramp).
    #[must_use]
    pub fn active(&self, x: f64) -> ArrayVec<(usize, f64), 2> {
        let mut result = ArrayVec::new();
        let upper = self.mfs.partition_point(|mf| mf.peak <= x);
        let lower = upper.saturating_sub(1);
        for (i, mf) in self.mfs.iter().enumerate().take(upper + 1).skip(lower) {
            let degree = mf.membership(x);
            if degree > 0.0 && !result.is_full() {
                result.push((i, degree));
            }
        }
        result
    }
}
