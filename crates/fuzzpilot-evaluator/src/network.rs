//! Decoded fuzzy cascade.
//!
//! [`FuzzyNetwork::decode`] turns a chromosome into named TSK blocks following a
//! [`ChromosomeSchema`]. Decoding is all-or-nothing: a chromosome of the wrong length is
//! rejected before any gene is read, since silently truncating or padding would shift
//! every later block.
//!
//! The cascade wiring:
//!
//! ```text
//! closure, proximity ─► ThreatKinematic ─┐
//!                                        ├─► ThreatCombined ─► threat
//! rel heading, size ──► ThreatAspect ────┘
//!
//! rel heading, proximity ─► Thrust ─► thrust contribution
//!
//! closure, proximity ─► AvoidBase ─┐
//!                                  ├─► AvoidDecision ─► avoidance
//! rel heading ─────────────────────┘
//! ```

use std::collections::BTreeMap;

use fuzzpilot_fuzzy::{
    inference::{RuleMatrix, RuleShapeError, TskBlock},
    membership::MembershipSet,
};

use crate::{
    features::AsteroidFeatures,
    schema::{ChromosomeSchema, GeneCursor, SchemaError, SlotKind, SlotName},
};

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum DecodeError {
    #[display("chromosome has {actual} genes, schema expects {expected}")]
    LengthMismatch { expected: usize, actual: usize },
    #[display("gene {index} is not finite")]
    NonFinite { index: usize },
    #[display("slot {slot} needs {needed} genes, {remaining} left")]
    Underrun {
        slot: SlotName,
        needed: usize,
        remaining: usize,
    },
    #[display("{remaining} genes left after decoding")]
    Trailing { remaining: usize },
    #[display("invalid schema")]
    Schema(SchemaError),
    #[display("invalid block shape")]
    Shape(RuleShapeError),
}

#[derive(Debug, Clone)]
enum Decoded {
    Scalar(f64),
    Block(TskBlock),
}

fn decode_block(
    cursor: &mut GeneCursor<'_>,
    slot: SlotName,
    [c1, c2]: [usize; 2],
) -> Result<TskBlock, DecodeError> {
    let mfs1 = MembershipSet::from_centers(cursor.take(slot, c1)?);
    let mfs2 = MembershipSet::from_centers(cursor.take(slot, c2)?);
    let values = cursor.take(slot, mfs1.len() * mfs2.len())?.to_vec();
    let rules = RuleMatrix::new(mfs1.len(), mfs2.len(), values).map_err(DecodeError::Shape)?;
    TskBlock::new(mfs1, mfs2, rules).map_err(DecodeError::Shape)
}

/// The materialized cascade. Immutable once decoded; controllers share it through an
/// `Arc`.
#[derive(Debug, Clone)]
pub struct FuzzyNetwork {
    threat_scale: f64,
    thrust_scale: f64,
    threat_kinematic: TskBlock,
    threat_aspect: TskBlock,
    threat_combined: TskBlock,
    thrust: TskBlock,
    avoid_base: TskBlock,
    avoid_decision: TskBlock,
}

impl FuzzyNetwork {
    /// Decodes `genes` slot by slot in schema order.
    ///
    /// ```
    /// # use fuzzpilot_evaluator::{network::FuzzyNetwork, schema::ChromosomeSchema};
    /// let schema = ChromosomeSchema::standard();
    /// assert!(FuzzyNetwork::decode(&schema, &[0.5; 68]).is_ok());
    /// assert!(FuzzyNetwork::decode(&schema, &[0.5; 67]).is_err());
    /// ```
    pub fn decode(schema: &ChromosomeSchema, genes: &[f64]) -> Result<Self, DecodeError> {
        schema.validate().map_err(DecodeError::Schema)?;
        let expected = schema.gene_count();
        if genes.len() != expected {
            return Err(DecodeError::LengthMismatch {
                expected,
                actual: genes.len(),
            });
        }
        if let Some(index) = genes.iter().position(|g| !g.is_finite()) {
            return Err(DecodeError::NonFinite { index });
        }

        let mut cursor = GeneCursor::new(genes);
        let mut decoded = BTreeMap::new();
        for slot in schema.slots() {
            let value = match slot.kind {
                SlotKind::Scalar => Decoded::Scalar(cursor.take_one(slot.name)?),
                SlotKind::Block { centers } => {
                    Decoded::Block(decode_block(&mut cursor, slot.name, centers)?)
                }
            };
            decoded.insert(slot.name, value);
        }
        cursor.finish()?;

        let mut scalar = |name: SlotName| match decoded.remove(&name) {
            Some(Decoded::Scalar(value)) => Ok(value),
            Some(Decoded::Block(_)) => Err(SchemaError::KindMismatch { name }),
            None => Err(SchemaError::MissingSlot { name }),
        };
        let threat_scale = scalar(SlotName::ThreatScale).map_err(DecodeError::Schema)?;
        let thrust_scale = scalar(SlotName::ThrustScale).map_err(DecodeError::Schema)?;

        let mut block = |name: SlotName| match decoded.remove(&name) {
            Some(Decoded::Block(block)) => Ok(block),
            Some(Decoded::Scalar(_)) => Err(SchemaError::KindMismatch { name }),
            None => Err(SchemaError::MissingSlot { name }),
        };
        Ok(Self {
            threat_scale,
            thrust_scale,
            threat_kinematic: block(SlotName::ThreatKinematic).map_err(DecodeError::Schema)?,
            threat_aspect: block(SlotName::ThreatAspect).map_err(DecodeError::Schema)?,
            threat_combined: block(SlotName::ThreatCombined).map_err(DecodeError::Schema)?,
            thrust: block(SlotName::Thrust).map_err(DecodeError::Schema)?,
            avoid_base: block(SlotName::AvoidBase).map_err(DecodeError::Schema)?,
            avoid_decision: block(SlotName::AvoidDecision).map_err(DecodeError::Schema)?,
        })
    }

    /// The value of a scalar slot, `None` for block slots.
    #[must_use]
    pub fn scalar(&self, name: SlotName) -> Option<f64> {
        match name {
            SlotName::ThreatScale => Some(self.threat_scale),
            SlotName::ThrustScale => Some(self.thrust_scale),
            _ => None,
        }
    }

    /// The block decoded for a block slot, `None` for scalar slots.
    #[must_use]
    pub fn block(&self, name: SlotName) -> Option<&TskBlock> {
        match name {
            SlotName::ThreatScale | SlotName::ThrustScale => None,
            SlotName::ThreatKinematic => Some(&self.threat_kinematic),
            SlotName::ThreatAspect => Some(&self.threat_aspect),
            SlotName::ThreatCombined => Some(&self.threat_combined),
            SlotName::Thrust => Some(&self.thrust),
            SlotName::AvoidBase => Some(&self.avoid_base),
            SlotName::AvoidDecision => Some(&self.avoid_decision),
        }
    }

    #[must_use]
    pub fn threat_scale(&self) -> f64 {
        self.threat_scale
    }

    #[must_use]
    pub fn thrust_scale(&self) -> f64 {
        self.thrust_scale
    }

    /// Threat score of one asteroid.
    #[must_use]
    pub fn threat(&self, f: &AsteroidFeatures) -> f64 {
        let kinematic = self.threat_kinematic.evaluate(f.closure, f.proximity);
        let aspect = self.threat_aspect.evaluate(f.relative_heading, f.size);
        self.threat_combined.evaluate(kinematic, aspect)
    }

    /// Raw thrust block output for one asteroid, before centering and gain.
    #[must_use]
    pub fn thrust_contribution(&self, f: &AsteroidFeatures) -> f64 {
        self.thrust.evaluate(f.relative_heading, f.proximity)
    }

    /// Avoidance score of one asteroid.
    #[must_use]
    pub fn avoidance(&self, f: &AsteroidFeatures) -> f64 {
        let base = self.avoid_base.evaluate(f.closure, f.proximity);
        self.avoid_decision.evaluate(f.relative_heading, base)
    }
}
