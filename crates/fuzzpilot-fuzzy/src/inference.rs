//! Zeroth-order TSK inference over two inputs.
//!
//! For inputs `x1`, `x2`, membership sets `A` and `B` and a rule matrix `R`
//! (`R[i][j]` is the crisp consequent of "x1 is `A_i` AND x2 is `B_j`"):
//!
//! ```text
//! w[i][j] = A_i(x1) · B_j(x2)
//! y       = Σ w[i][j] · R[i][j] / (Σ w[i][j] + ε)
//! ```
//!
//! The additive `ε` keeps the division finite when every weight is zero; the result then
//! degrades towards `0` instead of faulting.
//!
//! Two evaluation paths exist. [`tsk_infer`] walks the whole rule grid
//! (`O(|A|·|B|)`), which is the reference. [`tsk_infer_sparse`] only visits the at most
//! four rules whose antecedents are active, which is what the controller uses per
//! asteroid per tick.

use crate::{membership::MembershipSet, normalize::open_unit};

/// Denominator floor for the weighted average.
pub const EPSILON: f64 = f64::EPSILON;

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum RuleShapeError {
    #[display("rule matrix expects {expected} constants, got {actual}")]
    ValueCount { expected: usize, actual: usize },
    #[display("rule matrix is {rows}x{cols} but inputs have {mfs1}x{mfs2} membership functions")]
    InputMismatch {
        rows: usize,
        cols: usize,
        mfs1: usize,
        mfs2: usize,
    },
}

/// Row-major grid of rule consequents.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleMatrix {
    rows: usize,
    cols: usize,
    values: Vec<f64>,
}

impl RuleMatrix {
    pub fn new(rows: usize, cols: usize, values: Vec<f64>) -> Result<Self, RuleShapeError> {
        if values.len() != rows * cols {
            return Err(RuleShapeError::ValueCount {
                expected: rows * cols,
                actual: values.len(),
            });
        }
        Ok(Self { rows, cols, values })
    }

    /// A matrix with every consequent set to `value`.
    #[must_use]
    pub fn filled(rows: usize, cols: usize, value: f64) -> Self {
        Self {
            rows,
            cols,
            values: vec![value; rows * cols],
        }
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        assert!(row < self.rows && col < self.cols);
        self.values[row * self.cols + col]
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

/// Reference TSK inference over the full rule grid.
///
/// Pure: the result depends only on the arguments.
#[must_use]
pub fn tsk_infer(
    x1: f64,
    x2: f64,
    mfs1: &MembershipSet,
    mfs2: &MembershipSet,
    rules: &RuleMatrix,
) -> f64 {
    debug_assert_eq!((rules.rows(), rules.cols()), (mfs1.len(), mfs2.len()));
    let mut num = 0.0;
    let mut den = 0.0;
    for (i, d1) in mfs1.degrees(x1).enumerate() {
        for (j, d2) in mfs2.degrees(x2).enumerate() {
            let w = d1 * d2;
            num += w * rules.get(i, j);
            den += w;
        }
    }
    num / (den + EPSILON)
}

/// TSK inference restricted to the active antecedents.
///
/// Gives the same result as [`tsk_infer`] (inactive rules contribute zero weight) while
/// visiting at most four rules.
#[must_use]
pub fn tsk_infer_sparse(
    x1: f64,
    x2: f64,
    mfs1: &MembershipSet,
    mfs2: &MembershipSet,
    rules: &RuleMatrix,
) -> f64 {
    debug_assert_eq!((rules.rows(), rules.cols()), (mfs1.len(), mfs2.len()));
    let active2 = mfs2.active(x2);
    let mut num = 0.0;
    let mut den = 0.0;
    for (i, d1) in mfs1.active(x1) {
        for &(j, d2) in &active2 {
            let w = d1 * d2;
            num += w * rules.get(i, j);
            den += w;
        }
    }
    num / (den + EPSILON)
}

/// A two-input TSK block: two membership sets and their rule matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct TskBlock {
    inputs: [MembershipSet; 2],
    rules: RuleMatrix,
}

impl TskBlock {
    pub fn new(
        mfs1: MembershipSet,
        mfs2: MembershipSet,
        rules: RuleMatrix,
    ) -> Result<Self, RuleShapeError> {
        if rules.rows() != mfs1.len() || rules.cols() != mfs2.len() {
            return Err(RuleShapeError::InputMismatch {
                rows: rules.rows(),
                cols: rules.cols(),
                mfs1: mfs1.len(),
                mfs2: mfs2.len(),
            });
        }
        Ok(Self {
            inputs: [mfs1, mfs2],
            rules,
        })
    }

    #[must_use]
    pub fn inputs(&self) -> &[MembershipSet; 2] {
        &self.inputs
    }

    #[must_use]
    pub fn rules(&self) -> &RuleMatrix {
        &self.rules
    }

    /// Evaluates the block after moving both inputs into the open unit interval.
    #[must_use]
    pub fn evaluate(&self, x1: f64, x2: f64) -> f64 {
        let [mfs1, mfs2] = &self.inputs;
        tsk_infer_sparse(open_unit(x1), open_unit(x2), mfs1, mfs2, &self.rules)
    }
}
