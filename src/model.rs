//! Domain types consumed from the excluded data model.
//!
//! This crate only sees the boundary shape of the object model: items with
//! named real-valued parameters, judgments comparing two disjoint item sets,
//! and training sets of judgments. Everything is insertion-ordered so that a
//! given training set always enumerates its preference pairs identically;
//! the pair order is the single source of truth for the QP matrices and for
//! mapping the solved weights back to item pairs.

use std::collections::{BTreeMap, HashMap};

use crate::error::InvalidInput;

/// An identified alternative with a named-parameter vector.
///
/// Parameters are kept in a `BTreeMap` so iteration order (and therefore the
/// derived parameter schema) is deterministic.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: String,
    pub parameters: BTreeMap<String, f64>,
}

impl Item {
    pub fn new<I, S>(id: impl Into<String>, parameters: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            parameters: parameters
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        }
    }

    /// Convenience constructor for single-parameter items.
    pub fn scalar(id: impl Into<String>, value: f64) -> Self {
        Self::new(id, [("value", value)])
    }
}

/// Ordered list of parameter names shared by all items of a training set.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSchema {
    names: Vec<String>,
}

impl ParameterSchema {
    /// Derive the schema from a reference item.
    pub fn from_item(item: &Item) -> Self {
        Self {
            names: item.parameters.keys().cloned().collect(),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Extract the item's parameter vector in schema order.
    ///
    /// Fails if the item carries a different set of parameter names than the
    /// schema was derived from.
    pub fn encode(&self, item: &Item) -> Result<Vec<f64>, InvalidInput> {
        if item.parameters.len() != self.names.len()
            || !self.names.iter().all(|n| item.parameters.contains_key(n))
        {
            return Err(InvalidInput::SchemaMismatch {
                id: item.id.clone(),
                expected: self.names.join(","),
                actual: item
                    .parameters
                    .keys()
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(","),
            });
        }
        Ok(self.names.iter().map(|n| item.parameters[n]).collect())
    }
}

/// An expert statement that every item of `preferable` outranks every item
/// of `inferior`.
///
/// Both sides are non-empty, insertion-ordered sets, disjoint by item id.
/// A judgment with singleton sides is *precise*; with a larger side it is a
/// *group (interval)* judgment.
#[derive(Debug, Clone, PartialEq)]
pub struct Judgment {
    preferable: Vec<Item>,
    inferior: Vec<Item>,
}

impl Judgment {
    pub fn new(preferable: Vec<Item>, inferior: Vec<Item>) -> Result<Self, InvalidInput> {
        if preferable.is_empty() {
            return Err(InvalidInput::EmptyJudgmentSide { side: "preferable" });
        }
        if inferior.is_empty() {
            return Err(InvalidInput::EmptyJudgmentSide { side: "inferior" });
        }
        for p in &preferable {
            if inferior.iter().any(|i| i.id == p.id) {
                return Err(InvalidInput::OverlappingSides { id: p.id.clone() });
            }
        }
        Ok(Self {
            preferable,
            inferior,
        })
    }

    /// Shorthand for a singleton-vs-singleton judgment.
    pub fn precise(preferable: Item, inferior: Item) -> Result<Self, InvalidInput> {
        Self::new(vec![preferable], vec![inferior])
    }

    pub fn preferable(&self) -> &[Item] {
        &self.preferable
    }

    pub fn inferior(&self) -> &[Item] {
        &self.inferior
    }

    pub fn is_precise(&self) -> bool {
        self.preferable.len() == 1 && self.inferior.len() == 1
    }

    /// Number of preference pairs this judgment contributes.
    pub fn pair_count(&self) -> usize {
        self.preferable.len() * self.inferior.len()
    }
}

/// Ordered collection of judgments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingSet {
    judgments: Vec<Judgment>,
}

impl TrainingSet {
    pub fn new(judgments: Vec<Judgment>) -> Self {
        Self { judgments }
    }

    pub fn judgments(&self) -> &[Judgment] {
        &self.judgments
    }

    pub fn len(&self) -> usize {
        self.judgments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.judgments.is_empty()
    }

    pub fn has_group_judgments(&self) -> bool {
        self.judgments.iter().any(|j| !j.is_precise())
    }

    /// Derive the parameter schema from the first item of the first judgment.
    pub fn schema(&self) -> Result<ParameterSchema, InvalidInput> {
        let first = self
            .judgments
            .first()
            .ok_or(InvalidInput::EmptyTrainingSet)?;
        Ok(ParameterSchema::from_item(&first.preferable()[0]))
    }

    /// Enumerate all preference pairs in the canonical order.
    ///
    /// Per judgment this is the Cartesian product `preferable × inferior`
    /// (outer loop over preferable items, inner loop over inferior items),
    /// concatenated in training-set order. A pair stated by more than one
    /// judgment keeps the position of its first occurrence and records
    /// every judgment that contains it, so each (preferable, inferior)
    /// combination is exactly one optimization variable. Repeated runs over
    /// the same training set produce the same list.
    pub fn enumerate_pairs(
        &self,
        schema: &ParameterSchema,
    ) -> Result<Vec<PreferencePair>, InvalidInput> {
        if self.judgments.is_empty() {
            return Err(InvalidInput::EmptyTrainingSet);
        }
        let mut pairs: Vec<PreferencePair> = Vec::new();
        let mut positions: HashMap<(String, String), usize> = HashMap::new();
        for (judgment_index, judgment) in self.judgments.iter().enumerate() {
            for preferable in judgment.preferable() {
                let x = schema.encode(preferable)?;
                for inferior in judgment.inferior() {
                    let key = (preferable.id.clone(), inferior.id.clone());
                    if let Some(&position) = positions.get(&key) {
                        let owners = &mut pairs[position].judgment_indices;
                        if owners.last() != Some(&judgment_index) {
                            owners.push(judgment_index);
                        }
                        continue;
                    }
                    let z = schema.encode(inferior)?;
                    positions.insert(key, pairs.len());
                    pairs.push(PreferencePair {
                        judgment_indices: vec![judgment_index],
                        preferable_id: preferable.id.clone(),
                        inferior_id: inferior.id.clone(),
                        preferable: x.clone(),
                        inferior: z,
                    });
                }
            }
        }
        Ok(pairs)
    }
}

/// One unique (preferable, inferior) item combination with schema-encoded
/// parameter vectors, tagged with every judgment that states it.
#[derive(Debug, Clone, PartialEq)]
pub struct PreferencePair {
    pub judgment_indices: Vec<usize>,
    pub preferable_id: String,
    pub inferior_id: String,
    pub preferable: Vec<f64>,
    pub inferior: Vec<f64>,
}
