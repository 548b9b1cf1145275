//! Chromosome layout of the fuzzy cascade.
//!
//! A chromosome is a flat `[f64]` with no self-description: position alone decides what
//! a gene means. The layout is declared once here as an ordered list of named [`Slot`]s,
//! and both the decoder ([`FuzzyNetwork::decode`](crate::network::FuzzyNetwork::decode))
//! and the GA gene bounds ([`ChromosomeSchema::gene_ranges`]) read it.
//!
//! # Slot layout
//!
//! A scalar slot takes one gene. A two-input block with `c1` and `c2` interior centers
//! takes, in order:
//!
//! ```text
//! [ c1 centers | c2 centers | (c1 + 2) x (c2 + 2) rule constants, row-major ]
//! ```
//!
//! The standard cascade uses one center per input, so every block is `1 + 1 + 9 = 11`
//! genes and the whole chromosome is `2 + 6 x 11 = 68` genes.
//!
//! # Standard cascade
//!
//! | slot | kind | inputs |
//! |---|---|---|
//! | [`ThreatScale`](SlotName::ThreatScale) | scalar | mode-switch threshold factor |
//! | [`ThrustScale`](SlotName::ThrustScale) | scalar | thrust gain factor |
//! | [`ThreatKinematic`](SlotName::ThreatKinematic) | block | closure x proximity |
//! | [`ThreatAspect`](SlotName::ThreatAspect) | block | relative heading x size |
//! | [`ThreatCombined`](SlotName::ThreatCombined) | block | kinematic x aspect |
//! | [`Thrust`](SlotName::Thrust) | block | relative heading x proximity |
//! | [`AvoidBase`](SlotName::AvoidBase) | block | closure x proximity |
//! | [`AvoidDecision`](SlotName::AvoidDecision) | block | relative heading x avoid base |

use serde::{Deserialize, Serialize};

use crate::network::DecodeError;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
pub enum SlotName {
    ThreatScale,
    ThrustScale,
    ThreatKinematic,
    ThreatAspect,
    ThreatCombined,
    Thrust,
    AvoidBase,
    AvoidDecision,
}

impl SlotName {
    pub const ALL: [Self; 8] = [
        Self::ThreatScale,
        Self::ThrustScale,
        Self::ThreatKinematic,
        Self::ThreatAspect,
        Self::ThreatCombined,
        Self::Thrust,
        Self::AvoidBase,
        Self::AvoidDecision,
    ];

    /// Whether the controller reads this slot as a scalar (otherwise as a block).
    #[must_use]
    pub const fn is_scalar(self) -> bool {
        matches!(self, Self::ThreatScale | Self::ThrustScale)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum SlotKind {
    Scalar,
    /// Two-input TSK block with the given number of interior centers per input.
    Block { centers: [usize; 2] },
}

impl SlotKind {
    /// ```
    /// # use fuzzpilot_evaluator::schema::SlotKind;
    /// assert_eq!(SlotKind::Scalar.gene_count(), 1);
    /// assert_eq!(SlotKind::Block { centers: [1, 1] }.gene_count(), 11);
    /// assert_eq!(SlotKind::Block { centers: [2, 1] }.gene_count(), 3 + 12);
    /// ```
    #[must_use]
    pub const fn gene_count(self) -> usize {
        match self {
            Self::Scalar => 1,
            Self::Block { centers: [c1, c2] } => c1 + c2 + (c1 + 2) * (c2 + 2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub name: SlotName,
    pub kind: SlotKind,
}

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum SchemaError {
    #[display("slot {name} declared more than once")]
    DuplicateSlot { name: SlotName },
    #[display("slot {name} is missing")]
    MissingSlot { name: SlotName },
    #[display("slot {name} has the wrong kind")]
    KindMismatch { name: SlotName },
    #[display("rule range [{min}, {max}] is empty")]
    EmptyRuleRange { min: f64, max: f64 },
}

/// Ordered slot list plus the bounds of rule constants.
#[derive(Debug, Clone, PartialEq)]
pub struct ChromosomeSchema {
    slots: Vec<Slot>,
    rule_range: (f64, f64),
}

impl Default for ChromosomeSchema {
    fn default() -> Self {
        Self::standard()
    }
}

impl ChromosomeSchema {
    /// Builds and validates a schema from an explicit slot order.
    pub fn new(slots: Vec<Slot>, rule_range: (f64, f64)) -> Result<Self, SchemaError> {
        let this = Self { slots, rule_range };
        this.validate()?;
        Ok(this)
    }

    /// The 68-gene cascade with one center per input.
    #[must_use]
    pub fn standard() -> Self {
        Self::with_centers(1)
    }

    /// The standard cascade with `centers` interior centers on every block input.
    ///
    /// ```
    /// # use fuzzpilot_evaluator::schema::ChromosomeSchema;
    /// assert_eq!(ChromosomeSchema::standard().gene_count(), 68);
    /// assert_eq!(ChromosomeSchema::with_centers(2).gene_count(), 122);
    /// ```
    #[must_use]
    pub fn with_centers(centers: usize) -> Self {
        let slots = SlotName::ALL
            .into_iter()
            .map(|name| Slot {
                name,
                kind: if name.is_scalar() {
                    SlotKind::Scalar
                } else {
                    SlotKind::Block {
                        centers: [centers; 2],
                    }
                },
            })
            .collect();
        Self {
            slots,
            rule_range: (0.0, 1.0),
        }
    }

    /// Replaces the bounds used for rule-constant genes.
    pub fn with_rule_range(mut self, min: f64, max: f64) -> Result<Self, SchemaError> {
        if !(min.is_finite() && max.is_finite() && min < max) {
            return Err(SchemaError::EmptyRuleRange { min, max });
        }
        self.rule_range = (min, max);
        Ok(self)
    }

    #[must_use]
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    #[must_use]
    pub fn rule_range(&self) -> (f64, f64) {
        self.rule_range
    }

    #[must_use]
    pub fn slot(&self, name: SlotName) -> Option<&Slot> {
        self.slots.iter().find(|slot| slot.name == name)
    }

    #[must_use]
    pub fn gene_count(&self) -> usize {
        self.slots.iter().map(|slot| slot.kind.gene_count()).sum()
    }

    /// Interior centers per input, if every block uses the same count.
    #[must_use]
    pub fn uniform_centers(&self) -> Option<usize> {
        let mut counts = self.slots.iter().filter_map(|slot| match slot.kind {
            SlotKind::Scalar => None,
            SlotKind::Block { centers } => Some(centers),
        });
        let first = counts.next()?;
        let [c1, c2] = first;
        (c1 == c2 && counts.all(|centers| centers == first)).then_some(c1)
    }

    /// Bounds for every gene, in chromosome order.
    ///
    /// Scalars and centers live in `[0, 1]`; rule constants in [`Self::rule_range`].
    #[must_use]
    pub fn gene_ranges(&self) -> Vec<(f64, f64)> {
        let mut ranges = Vec::with_capacity(self.gene_count());
        for slot in &self.slots {
            match slot.kind {
                SlotKind::Scalar => ranges.push((0.0, 1.0)),
                SlotKind::Block { centers: [c1, c2] } => {
                    ranges.extend(std::iter::repeat_n((0.0, 1.0), c1 + c2));
                    ranges.extend(std::iter::repeat_n(self.rule_range, (c1 + 2) * (c2 + 2)));
                }
            }
        }
        ranges
    }

    /// Checks that every slot the controller reads is present exactly once with the
    /// right kind.
    pub fn validate(&self) -> Result<(), SchemaError> {
        for name in SlotName::ALL {
            let mut found = self.slots.iter().filter(|slot| slot.name == name);
            let slot = found.next().ok_or(SchemaError::MissingSlot { name })?;
            if found.next().is_some() {
                return Err(SchemaError::DuplicateSlot { name });
            }
            if slot.kind.is_scalar() != name.is_scalar() {
                return Err(SchemaError::KindMismatch { name });
            }
        }
        let (min, max) = self.rule_range;
        if !(min.is_finite() && max.is_finite() && min < max) {
            return Err(SchemaError::EmptyRuleRange { min, max });
        }
        Ok(())
    }
}

/// Read-only cursor consuming a chromosome prefix by prefix.
#[derive(Debug, Clone)]
pub struct GeneCursor<'a> {
    genes: &'a [f64],
    position: usize,
}

impl<'a> GeneCursor<'a> {
    #[must_use]
    pub fn new(genes: &'a [f64]) -> Self {
        Self { genes, position: 0 }
    }

    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.genes.len() - self.position
    }

    /// Takes the next `count` genes for `slot`.
    pub fn take(&mut self, slot: SlotName, count: usize) -> Result<&'a [f64], DecodeError> {
        let genes = self
            .genes
            .get(self.position..self.position + count)
            .ok_or(DecodeError::Underrun {
                slot,
                needed: count,
                remaining: self.remaining(),
            })?;
        self.position += count;
        Ok(genes)
    }

    pub fn take_one(&mut self, slot: SlotName) -> Result<f64, DecodeError> {
        Ok(self.take(slot, 1)?[0])
    }

    /// Succeeds only when every gene has been consumed.
    pub fn finish(self) -> Result<(), DecodeError> {
        match self.remaining() {
            0 => Ok(()),
            remaining => Err(DecodeError::Trailing { remaining }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_layout() {
        let schema = ChromosomeSchema::standard();
        assert_eq!(schema.slots().len(), 8);
        assert_eq!(schema.gene_count(), 68);
        assert_eq!(schema.uniform_centers(), Some(1));
        schema.validate().unwrap();

        let ranges = schema.gene_ranges();
        assert_eq!(ranges.len(), 68);
        assert!(ranges.iter().all(|r| *r == (0.0, 1.0)));
    }

    #[test]
    fn test_rule_range_only_affects_rule_genes() {
        let schema = ChromosomeSchema::standard()
            .with_rule_range(-1.0, 2.0)
            .unwrap();
        let ranges = schema.gene_ranges();
        // Two scalars, then the first block's two centers.
        assert!(ranges[..4].iter().all(|r| *r == (0.0, 1.0)));
        assert!(ranges[4..13].iter().all(|r| *r == (-1.0, 2.0)));
        assert_eq!(ranges[13], (0.0, 1.0));
        assert!(ChromosomeSchema::standard().with_rule_range(1.0, 1.0).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_layouts() {
        let mut slots = ChromosomeSchema::standard().slots().to_vec();
        slots.pop();
        assert_eq!(
            ChromosomeSchema::new(slots.clone(), (0.0, 1.0)),
            Err(SchemaError::MissingSlot {
                name: SlotName::AvoidDecision
            })
        );

        slots.push(slots[0]);
        assert!(matches!(
            ChromosomeSchema::new(slots, (0.0, 1.0)),
            Err(SchemaError::DuplicateSlot { .. } | SchemaError::MissingSlot { .. })
        ));

        let mut slots = ChromosomeSchema::standard().slots().to_vec();
        slots[0].kind = SlotKind::Block { centers: [1, 1] };
        assert_eq!(
            ChromosomeSchema::new(slots, (0.0, 1.0)),
            Err(SchemaError::KindMismatch {
                name: SlotName::ThreatScale
            })
        );
    }

    #[test]
    fn test_reordered_slots_are_valid() {
        let mut slots = ChromosomeSchema::with_centers(2).slots().to_vec();
        slots.reverse();
        let schema = ChromosomeSchema::new(slots, (0.0, 1.0)).unwrap();
        assert_eq!(schema.gene_count(), 122);
        assert_eq!(schema.slots()[0].name, SlotName::AvoidDecision);
    }

    #[test]
    fn test_cursor_never_overruns() {
        let genes = [0.1, 0.2, 0.3];
        let mut cursor = GeneCursor::new(&genes);
        assert_eq!(cursor.take(SlotName::Thrust, 2).unwrap(), &[0.1, 0.2]);
        assert!(matches!(
            cursor.take(SlotName::Thrust, 2),
            Err(DecodeError::Underrun {
                needed: 2,
                remaining: 1,
                ..
            })
        ));
        assert_eq!(cursor.position(), 2);
        assert!(matches!(
            cursor.clone().finish(),
            Err(DecodeError::Trailing { remaining: 1 })
        ));
        assert_eq!(cursor.take_one(SlotName::ThreatScale).unwrap(), 0.3);
        cursor.finish().unwrap();
    }
}
