//! Collapse of group (interval) judgments into precise ones.
//!
//! Some kernels only compare single items, so a training set with group
//! judgments is first reduced: each multi-item side is replaced by one
//! synthetic item built from the side's Hausdorff-extremal points relative
//! to the opposing sides of the other judgments. The transform is a pure
//! function over schema-encoded value objects; the input training set is
//! never mutated.

use crate::error::InvalidInput;
use crate::model::{Item, Judgment, ParameterSchema, TrainingSet};
use crate::utils::euclidean_distance;

/// One judgment side decomposed into immutable (id, vector) value objects.
#[derive(Debug, Clone)]
struct EncodedSide {
    ids: Vec<String>,
    vectors: Vec<Vec<f64>>,
}

impl EncodedSide {
    fn encode(items: &[Item], schema: &ParameterSchema) -> Result<Self, InvalidInput> {
        let mut ids = Vec::with_capacity(items.len());
        let mut vectors = Vec::with_capacity(items.len());
        for item in items {
            ids.push(item.id.clone());
            vectors.push(schema.encode(item)?);
        }
        Ok(Self { ids, vectors })
    }

    fn len(&self) -> usize {
        self.vectors.len()
    }
}

/// Reduces group judgments to precise ones via Hausdorff extremal points.
///
/// For each group side S of judgment j, every other judgment contributes a
/// reference set: its side of the opposite role. The point of S attaining
/// the directed Hausdorff distance `max_{s in S} min_{o in O} ||s - o||`
/// to a reference set O is that set's extremal pick; the synthetic
/// replacement item averages the picks weighted by their Hausdorff
/// distances. Precise judgments pass through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntervalJudgmentTransformer;

impl IntervalJudgmentTransformer {
    pub fn new() -> Self {
        Self
    }

    /// Produce a precise training set consumable by singleton-only kernels.
    pub fn transform(&self, training: &TrainingSet) -> Result<TrainingSet, InvalidInput> {
        let schema = training.schema()?;

        let encoded: Vec<(EncodedSide, EncodedSide)> = training
            .judgments()
            .iter()
            .map(|j| {
                Ok((
                    EncodedSide::encode(j.preferable(), &schema)?,
                    EncodedSide::encode(j.inferior(), &schema)?,
                ))
            })
            .collect::<Result<_, InvalidInput>>()?;

        let mut collapsed = Vec::with_capacity(training.len());
        for (index, judgment) in training.judgments().iter().enumerate() {
            if judgment.is_precise() {
                collapsed.push(judgment.clone());
                continue;
            }

            let (preferable, inferior) = &encoded[index];
            let preferable_item = self.collapse_side(
                preferable,
                judgment.preferable(),
                &reference_sides(&encoded, index, Role::Inferior),
                &schema,
            );
            let inferior_item = self.collapse_side(
                inferior,
                judgment.inferior(),
                &reference_sides(&encoded, index, Role::Preferable),
                &schema,
            );
            collapsed.push(Judgment::new(vec![preferable_item], vec![inferior_item])?);
        }

        Ok(TrainingSet::new(collapsed))
    }

    /// Replace a side with a single item. Singleton sides keep their item;
    /// group sides get the distance-weighted average of their extremal
    /// points, under an id joining the member ids.
    fn collapse_side(
        &self,
        side: &EncodedSide,
        original: &[Item],
        references: &[&EncodedSide],
        schema: &ParameterSchema,
    ) -> Item {
        if side.len() == 1 {
            return original[0].clone();
        }

        let mut total_distance = 0.0;
        let mut weighted = vec![0.0; schema.len()];
        let mut picks: Vec<usize> = Vec::with_capacity(references.len());

        for reference in references {
            let (pick, distance) = extremal_point(side, reference);
            picks.push(pick);
            total_distance += distance;
            for (accumulated, &value) in weighted.iter_mut().zip(&side.vectors[pick]) {
                *accumulated += distance * value;
            }
        }

        let parameters: Vec<f64> = if total_distance > 0.0 {
            weighted.iter().map(|v| v / total_distance).collect()
        } else {
            // All extremal points coincide with their references; fall back
            // to the plain average of the picks.
            let mut mean = vec![0.0; schema.len()];
            for &pick in &picks {
                for (accumulated, &value) in mean.iter_mut().zip(&side.vectors[pick]) {
                    *accumulated += value;
                }
            }
            mean.iter().map(|v| v / picks.len() as f64).collect()
        };

        Item::new(
            side.ids.join("+"),
            schema
                .names()
                .iter()
                .cloned()
                .zip(parameters.iter().copied()),
        )
    }
}

#[derive(Clone, Copy)]
enum Role {
    Preferable,
    Inferior,
}

/// Opposite-role sides of every judgment except `skip`; when `skip` is the
/// only judgment, its own opposite side is the single reference.
fn reference_sides(
    encoded: &[(EncodedSide, EncodedSide)],
    skip: usize,
    role: Role,
) -> Vec<&EncodedSide> {
    fn pick(pair: &(EncodedSide, EncodedSide), role: Role) -> &EncodedSide {
        match role {
            Role::Preferable => &pair.0,
            Role::Inferior => &pair.1,
        }
    }
    let others: Vec<&EncodedSide> = encoded
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != skip)
        .map(|(_, pair)| pick(pair, role))
        .collect();
    if others.is_empty() {
        vec![pick(&encoded[skip], role)]
    } else {
        others
    }
}

/// Index and distance of the side's directed-Hausdorff achiever against a
/// reference set: the member farthest from its nearest reference point.
/// Ties keep the first member in side order.
fn extremal_point(side: &EncodedSide, reference: &EncodedSide) -> (usize, f64) {
    let mut best = 0;
    let mut best_distance = f64::NEG_INFINITY;
    for (index, vector) in side.vectors.iter().enumerate() {
        let nearest = reference
            .vectors
            .iter()
            .map(|other| euclidean_distance(vector, other))
            .fold(f64::INFINITY, f64::min);
        if nearest > best_distance {
            best = index;
            best_distance = nearest;
        }
    }
    (best, best_distance)
}
