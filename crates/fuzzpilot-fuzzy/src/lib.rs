//! Zeroth-order Takagi–Sugeno–Kang fuzzy inference primitives.
//!
//! This crate is the numeric core of the fuzzy pilot:
//!
//! - **Membership functions**: partition-of-unity triangle sets built from interior centers
//! - **Inference**: two-input TSK blocks with constant rule consequents
//! - **Normalization**: the single open-interval clamp every inference caller goes through
//!
//! # Modules
//!
//! - [`membership`]: [`TriangularMf`](membership::TriangularMf) and
//!   [`MembershipSet`](membership::MembershipSet)
//! - [`inference`]: [`RuleMatrix`](inference::RuleMatrix), [`tsk_infer`](inference::tsk_infer)
//!   and the [`TskBlock`](inference::TskBlock) wrapper
//! - [`normalize`]: [`open_unit`](normalize::open_unit) and friends
//!
//! # Examples
//!
//! ```
//! use fuzzpilot_fuzzy::{
//!     inference::{RuleMatrix, TskBlock},
//!     membership::MembershipSet,
//! };
//!
//! let a = MembershipSet::from_centers(&[0.5]);
//! let b = MembershipSet::from_centers(&[0.5]);
//! let rules = RuleMatrix::filled(3, 3, 7.0);
//! let block = TskBlock::new(a, b, rules).unwrap();
//! assert!((block.evaluate(0.2, 0.9) - 7.0).abs() < 1e-9);
//! ```

pub mod inference;
pub mod membership;
pub mod normalize;
