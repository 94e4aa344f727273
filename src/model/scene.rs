//! Scene: composition root for one balance-scale screen
//!
//! Owns the terms, the term creators for both sides, the balance scale,
//! the variables, in-flight drags and the snapshot slots. Every mutation
//! goes through here so derived state (plate weights, scale angle) can be
//! recomputed right after it.

use std::collections::BTreeMap;

use glam::Vec2;

use super::balance_scale::{BalanceScale, Side};
use super::events::SceneEvent;
use super::fraction::Fraction;
use super::operation::UniversalOperation;
use super::plate::Plate;
use super::snapshot::{SceneSnapshot, Snapshots};
use super::term::{Sign, Term, TermId, TermKind, TermPool};
use super::term_creator::{CreatorContext, CreatorId, TermCreator};
use super::variable::{Variable, VariableId};
use crate::config::SceneConfig;
use crate::drag::{DragId, DragOutcome, DragSession};
use crate::error::{ModelError, ModelResult};

/// What a universal operation did
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OperationOutcome {
    /// False when refused (max integer exceeded)
    pub applied: bool,
    /// Like-terms cells whose occupant summed to zero
    pub summed_to_zero: Vec<(Side, usize)>,
}

#[derive(Debug)]
pub struct Scene {
    pub(crate) config: SceneConfig,
    pub(crate) variables: Vec<Variable>,
    initial_variables: Vec<Variable>,
    pub(crate) terms: TermPool,
    /// Left creators first, then right. `CreatorId` indexes this.
    pub(crate) creators: Vec<TermCreator>,
    pub(crate) scale: BalanceScale,
    /// `None` when the scene has no lock control
    locked: Option<bool>,
    pub(crate) drags: BTreeMap<DragId, DragSession>,
    pub(crate) finished_drags: BTreeMap<DragId, DragOutcome>,
    pub(crate) next_drag_id: u32,
    pub(crate) events: Vec<SceneEvent>,
    snapshots: Snapshots,
}

impl Scene {
    /// Scene with the same kinds of creators on both sides
    pub fn new(config: SceneConfig, variables: Vec<Variable>, kinds: &[TermKind]) -> ModelResult<Self> {
        Self::with_creators(config, variables, kinds, kinds)
    }

    pub fn with_creators(
        config: SceneConfig,
        variables: Vec<Variable>,
        left: &[TermKind],
        right: &[TermKind],
    ) -> ModelResult<Self> {
        config
            .validate()
            .map_err(|e| ModelError::InvalidConfig(e.to_string()))?;
        if left.len() != right.len() {
            return Err(ModelError::UnbalancedCreators {
                left: left.len(),
                right: right.len(),
            });
        }
        for kind in left.iter().chain(right) {
            if let TermKind::Variable(VariableId(v)) | TermKind::Object(VariableId(v)) = *kind {
                if v >= variables.len() {
                    return Err(ModelError::UnknownVariable(v));
                }
            }
        }

        if config.combine_like_terms {
            if let Some(i) = left.iter().chain(right).position(|k| matches!(k, TermKind::Object(_))) {
                return Err(ModelError::NotCombinable(CreatorId(i)));
            }
        }

        let n = left.len();
        let scale = BalanceScale::new(&config.scale);
        let like_cells: Vec<Option<usize>> = if config.combine_like_terms {
            scale
                .plate(Side::Left)
                .grid()
                .like_terms_cells(n)?
                .into_iter()
                .map(Some)
                .collect()
        } else {
            vec![None; n]
        };

        let mut creators = Vec::with_capacity(2 * n);
        for (side, kinds) in [(Side::Left, left), (Side::Right, right)] {
            for (i, kind) in kinds.iter().enumerate() {
                creators.push(TermCreator::new(
                    CreatorId(creators.len()),
                    side,
                    *kind,
                    like_cells[i],
                    config.drag_bounds,
                    config.small_term_diameter,
                    config.big_term_diameter,
                ));
            }
        }

        for (side, range) in [(Side::Left, 0..n), (Side::Right, n..2 * n)] {
            for a in range.clone() {
                for b in a + 1..range.end {
                    if creators[a].is_like_term_creator(&creators[b]) {
                        return Err(ModelError::DuplicateLikeTermCreators {
                            side,
                            first: CreatorId(a),
                            second: CreatorId(b),
                        });
                    }
                }
            }
        }
        for i in 0..n {
            let (l, r) = (&creators[i], &creators[n + i]);
            if !l.is_like_term_creator(r) {
                return Err(ModelError::UnpairedCreators(i));
            }
            l.set_equivalent_creator(r.id)?;
            r.set_equivalent_creator(l.id)?;
        }
        scale
            .plate(Side::Left)
            .set_creators((0..n).map(CreatorId).collect())?;
        scale
            .plate(Side::Right)
            .set_creators((n..2 * n).map(CreatorId).collect())?;

        let mut scene = Self {
            locked: config.locked,
            snapshots: Snapshots::new(config.number_of_snapshots),
            initial_variables: variables.clone(),
            variables,
            terms: TermPool::new(),
            creators,
            scale,
            drags: BTreeMap::new(),
            finished_drags: BTreeMap::new(),
            next_drag_id: 1,
            events: Vec::new(),
            config,
        };
        scene.refresh();
        log::info!(
            "scene created: {} creators per side, {}, lock {:?}",
            n,
            if scene.combines_like_terms() { "combine like terms" } else { "separate cells" },
            scene.locked
        );
        Ok(scene)
    }

    // === Accessors ===

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn combines_like_terms(&self) -> bool {
        self.config.combine_like_terms
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn terms(&self) -> &TermPool {
        &self.terms
    }

    pub fn term(&self, id: TermId) -> ModelResult<&Term> {
        self.terms.try_get(id)
    }

    pub fn creators(&self) -> &[TermCreator] {
        &self.creators
    }

    pub fn creator(&self, id: CreatorId) -> ModelResult<&TermCreator> {
        self.creators.get(id.0).ok_or(ModelError::UnknownCreator(id))
    }

    pub fn creators_on(&self, side: Side) -> impl Iterator<Item = &TermCreator> {
        self.creators.iter().filter(move |c| c.side == side)
    }

    /// Creator at `index` in a side's toolbox order
    pub fn creator_id(&self, side: Side, index: usize) -> ModelResult<CreatorId> {
        self.creators_on(side)
            .nth(index)
            .map(|c| c.id)
            .ok_or(ModelError::UnknownToolboxIndex { side, index })
    }

    pub fn scale(&self) -> &BalanceScale {
        &self.scale
    }

    pub fn plate(&self, side: Side) -> &Plate {
        self.scale.plate(side)
    }

    pub fn angle(&self) -> f32 {
        self.scale.angle()
    }

    /// `None` when the scene has no lock control
    pub fn locked(&self) -> Option<bool> {
        self.locked
    }

    pub fn is_locked(&self) -> bool {
        self.locked == Some(true)
    }

    pub fn snapshots(&self) -> &Snapshots {
        &self.snapshots
    }

    pub fn plate_weight(&self, side: Side) -> Fraction {
        self.creators_on(side)
            .map(|c| c.weight_on_plate(&self.terms, &self.variables))
            .sum()
    }

    /// Take the events queued since the last call
    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.events)
    }

    // === Internal plumbing ===

    /// A creator together with the rest of the scene it works on
    pub(crate) fn creator_cx(&mut self, id: CreatorId) -> ModelResult<(&mut TermCreator, CreatorContext<'_>)> {
        let creator = self
            .creators
            .get_mut(id.0)
            .ok_or(ModelError::UnknownCreator(id))?;
        let cx = CreatorContext {
            terms: &mut self.terms,
            plate: self.scale.plate_mut(creator.side),
            variables: &self.variables,
            events: &mut self.events,
        };
        Ok((creator, cx))
    }

    pub(crate) fn equivalent_creator(&self, id: CreatorId) -> ModelResult<CreatorId> {
        self.creator(id)?.equivalent_creator()
    }

    /// Dispose a term via its creator. No-op for terms already gone.
    pub(crate) fn dispose_term(&mut self, term: TermId) -> ModelResult<bool> {
        let Some(creator) = self.terms.get(term).map(|t| t.creator) else {
            return Ok(false);
        };
        let (creator, mut cx) = self.creator_cx(creator)?;
        creator.dispose_term(term, &mut cx)
    }

    /// Recompute plate weights and the scale angle
    pub(crate) fn refresh(&mut self) {
        let left = self.plate_weight(Side::Left);
        let right = self.plate_weight(Side::Right);
        self.scale.update(left, right, &mut self.terms);
    }

    /// Warn the host and purge every term that is not on a plate
    pub(crate) fn max_integer_exceeded(&mut self, creator: CreatorId) -> ModelResult<()> {
        log::warn!("max integer {} exceeded by creator {}", self.config.max_integer, creator);
        self.events.push(SceneEvent::MaxIntegerExceeded { creator });
        self.dispose_all_terms_not_on_plate()
    }

    pub(crate) fn side_full(&mut self, side: Side) {
        log::warn!("{} plate is full", side);
        self.events.push(SceneEvent::SideFull { side });
    }

    fn dispose_all_terms_not_on_plate(&mut self) -> ModelResult<()> {
        for i in 0..self.creators.len() {
            let (creator, mut cx) = self.creator_cx(CreatorId(i))?;
            creator.dispose_terms_not_on_plate(&mut cx)?;
        }
        Ok(())
    }

    // === Setup ===

    /// Second construction phase, once the host knows where the toolbox icons are
    pub fn initialize_toolbox_positions(
        &mut self,
        side: Side,
        index: usize,
        positive: Vec2,
        negative: Vec2,
    ) -> ModelResult<()> {
        let id = self.creator_id(side, index)?;
        self.creator(id)?
            .initialize_toolbox_positions(positive, negative)
    }

    /// Lay the toolboxes out in a row under each plate. For hosts without a layout pass.
    pub fn initialize_default_toolbox_positions(&mut self) -> ModelResult<()> {
        let spacing = self.config.big_term_diameter * 1.2;
        let y = self.config.drag_bounds.max.y - self.config.big_term_diameter;
        for side in [Side::Left, Side::Right] {
            let count = self.creators_on(side).count();
            let center = self.plate(side).position().x;
            // Positive and negative icons side by side, creators in order
            let first = center - (2 * count).saturating_sub(1) as f32 * spacing / 2.0;
            for index in 0..count {
                let x = first + (2 * index) as f32 * spacing;
                self.initialize_toolbox_positions(
                    side,
                    index,
                    Vec2::new(x, y),
                    Vec2::new(x + spacing, y),
                )?;
            }
        }
        Ok(())
    }

    // === Controls ===

    /// Toggle the lock. Terms being dragged or animating are disposed.
    pub fn set_locked(&mut self, locked: bool) -> ModelResult<()> {
        let Some(current) = self.locked else {
            log::debug!("scene has no lock control");
            return Ok(());
        };
        if current == locked {
            return Ok(());
        }
        self.dispose_all_terms_not_on_plate()?;
        self.sweep_drags()?;
        self.locked = Some(locked);
        log::debug!("lock {}", if locked { "on" } else { "off" });
        self.refresh();
        Ok(())
    }

    /// Returns the value actually used after clamping to the variable's range
    pub fn set_variable_value(&mut self, id: VariableId, value: i64) -> ModelResult<i64> {
        let variable = self
            .variables
            .get_mut(id.0)
            .ok_or(ModelError::UnknownVariable(id.0))?;
        let value = variable.set_value(value);
        self.refresh();
        Ok(value)
    }

    /// Remove every term from the scene
    pub fn clear(&mut self) -> ModelResult<()> {
        for i in 0..self.creators.len() {
            let (creator, mut cx) = self.creator_cx(CreatorId(i))?;
            creator.dispose_all_terms(&mut cx)?;
        }
        self.drags.clear();
        self.finished_drags.clear();
        self.refresh();
        log::info!("scene cleared");
        Ok(())
    }

    /// Regroup the terms on both plates. Nothing to do when like terms combine.
    pub fn organize(&mut self) -> ModelResult<()> {
        if self.combines_like_terms() {
            log::debug!("organize skipped: like terms already share cells");
            return Ok(());
        }
        for side in [Side::Left, Side::Right] {
            self.scale
                .plate_mut(side)
                .organize(&self.creators, &mut self.terms, &mut self.events)?;
        }
        self.refresh();
        Ok(())
    }

    /// Back to the initial state: no terms, initial variable values and lock, no snapshots
    pub fn reset(&mut self) -> ModelResult<()> {
        self.clear()?;
        self.variables = self.initial_variables.clone();
        self.locked = self.config.locked;
        self.snapshots.clear();
        self.refresh();
        log::info!("scene reset");
        Ok(())
    }

    /// Cancel every settle animation. Terms in flight are disposed outright.
    pub fn stop_animations(&mut self) -> ModelResult<()> {
        let animating: Vec<TermId> = self
            .terms
            .iter()
            .filter(|t| t.is_animating())
            .map(|t| t.id)
            .collect();
        for term in animating {
            self.dispose_term(term)?;
        }
        self.sweep_drags()?;
        self.refresh();
        Ok(())
    }

    /// Advance animations and drags by `dt` seconds
    pub fn step(&mut self, dt: f32) -> ModelResult<()> {
        self.advance_drags(dt)?;
        self.refresh();
        Ok(())
    }

    /// Apply an operation to both sides of the scale. All new values are
    /// checked before anything changes.
    pub fn apply_universal_operation(&mut self, operation: &UniversalOperation) -> ModelResult<OperationOutcome> {
        if !self.combines_like_terms() {
            return Err(ModelError::NotCombineScene);
        }
        self.dispose_all_terms_not_on_plate()?;
        self.sweep_drags()?;

        let mut overflow = None;
        for creator in &self.creators {
            let preview = creator.preview_operation(operation, &self.terms)?;
            if preview.is_some_and(|value| value.exceeds(self.config.max_integer)) {
                overflow = Some(creator.id);
                break;
            }
        }
        if let Some(creator) = overflow {
            self.max_integer_exceeded(creator)?;
            return Ok(OperationOutcome::default());
        }

        let mut outcome = OperationOutcome {
            applied: true,
            summed_to_zero: Vec::new(),
        };
        for i in 0..self.creators.len() {
            let (creator, mut cx) = self.creator_cx(CreatorId(i))?;
            let side = creator.side;
            let Some(cell) = creator.like_terms_cell() else {
                continue;
            };
            if creator.apply_operation(operation, &mut cx)? {
                let position = cx.plate.grid().cell_position(cell)?;
                outcome.summed_to_zero.push((side, cell));
                cx.events.push(SceneEvent::SumToZero { side, position });
            }
        }
        self.refresh();
        log::info!(
            "applied {} (left={}, right={})",
            operation,
            self.plate_weight(Side::Left),
            self.plate_weight(Side::Right)
        );
        Ok(outcome)
    }

    // === Snapshots ===

    pub fn create_snapshot(&self) -> ModelResult<SceneSnapshot> {
        let creators = self
            .creators
            .iter()
            .map(|c| c.create_snapshot(self.plate(c.side), &self.terms))
            .collect::<ModelResult<Vec<_>>>()?;
        Ok(SceneSnapshot {
            creators,
            variable_values: self.variables.iter().map(Variable::value).collect(),
        })
    }

    /// Clear the scene and rebuild it from a snapshot
    pub fn apply_snapshot(&mut self, snapshot: &SceneSnapshot) -> ModelResult<()> {
        if snapshot.creators.len() != self.creators.len()
            || snapshot.variable_values.len() != self.variables.len()
        {
            return Err(ModelError::SnapshotMismatch(format!(
                "{} creators and {} variables, scene has {} and {}",
                snapshot.creators.len(),
                snapshot.variable_values.len(),
                self.creators.len(),
                self.variables.len()
            )));
        }
        self.clear()?;
        for (i, creator_snapshot) in snapshot.creators.iter().enumerate() {
            let (creator, mut cx) = self.creator_cx(CreatorId(i))?;
            creator.restore_snapshot(creator_snapshot, &mut cx)?;
        }
        for (variable, value) in self.variables.iter_mut().zip(&snapshot.variable_values) {
            variable.set_value(*value);
        }
        self.refresh();
        log::info!("restored snapshot with {} terms", snapshot.number_of_terms());
        Ok(())
    }

    /// Save into the next free slot (or over the selected one)
    pub fn save_snapshot(&mut self) -> ModelResult<Option<usize>> {
        let snapshot = self.create_snapshot()?;
        Ok(self.snapshots.save(snapshot))
    }

    pub fn restore_snapshot(&mut self, index: usize) -> ModelResult<bool> {
        let Some(snapshot) = self.snapshots.get(index)?.cloned() else {
            return Ok(false);
        };
        self.apply_snapshot(&snapshot)?;
        self.snapshots.select(index)?;
        Ok(true)
    }

    pub fn delete_snapshot(&mut self, index: usize) -> ModelResult<()> {
        self.snapshots.delete(index).map(|_| ())
    }

    pub fn clear_snapshots(&mut self) {
        self.snapshots.clear();
    }

    /// Sign-specific toolbox position of a creator
    pub fn toolbox_position(&self, creator: CreatorId, sign: Sign) -> ModelResult<Vec2> {
        self.creator(creator)?.toolbox_position(sign)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::operation::Operator;
    use proptest::prelude::*;

    fn variables() -> Vec<Variable> {
        vec![Variable::new("x", 2, -10, 10)]
    }

    fn kinds() -> Vec<TermKind> {
        vec![TermKind::Variable(VariableId(0)), TermKind::Constant]
    }

    fn scene(config: SceneConfig) -> Scene {
        let mut scene = Scene::new(config, variables(), &kinds()).unwrap();
        scene.initialize_default_toolbox_positions().unwrap();
        scene
    }

    fn place(scene: &mut Scene, creator: CreatorId, sign: Sign, cell: Option<usize>) -> TermId {
        let (creator, mut cx) = scene.creator_cx(creator).unwrap();
        let term = creator.create_term(sign, None, &mut cx).unwrap();
        creator.put_term_on_plate(term, cell, &mut cx).unwrap();
        scene.refresh();
        term
    }

    #[test]
    fn test_new_wires_equivalent_creators() {
        let s = scene(SceneConfig::default());
        assert_eq!(s.creators().len(), 4);
        assert_eq!(s.equivalent_creator(CreatorId(0)).unwrap(), CreatorId(2));
        assert_eq!(s.equivalent_creator(CreatorId(3)).unwrap(), CreatorId(1));
        assert_eq!(s.plate(Side::Right).creators(), &[CreatorId(2), CreatorId(3)]);
        assert_eq!(s.angle(), 0.0);
    }

    #[test]
    fn test_like_term_creators_rejected_on_one_side() {
        let err = Scene::new(
            SceneConfig::default(),
            variables(),
            &[TermKind::Constant, TermKind::Constant],
        )
        .unwrap_err();
        assert_eq!(
            err,
            ModelError::DuplicateLikeTermCreators {
                side: Side::Left,
                first: CreatorId(0),
                second: CreatorId(1),
            }
        );
    }

    #[test]
    fn test_mismatched_sides_rejected() {
        let err = Scene::with_creators(
            SceneConfig::default(),
            variables(),
            &[TermKind::Constant],
            &[TermKind::Variable(VariableId(0))],
        )
        .unwrap_err();
        assert_eq!(err, ModelError::UnpairedCreators(0));

        let err = Scene::new(SceneConfig::default(), vec![], &[TermKind::Variable(VariableId(0))]).unwrap_err();
        assert_eq!(err, ModelError::UnknownVariable(0));
    }

    #[test]
    fn test_weights_follow_variable_value() {
        let mut s = scene(SceneConfig::default());
        place(&mut s, CreatorId(0), Sign::Positive, Some(35));
        place(&mut s, CreatorId(3), Sign::Positive, Some(35));
        // x = 2 vs 1
        assert!(s.angle() < 0.0);
        s.set_variable_value(VariableId(0), 1).unwrap();
        assert_eq!(s.angle(), 0.0);
        assert_eq!(s.set_variable_value(VariableId(0), 99).unwrap(), 10);
    }

    #[test]
    fn test_toolbox_positions_set_once() {
        let mut s = scene(SceneConfig::default());
        assert!(matches!(
            s.initialize_toolbox_positions(Side::Left, 0, Vec2::ZERO, Vec2::ZERO),
            Err(ModelError::AlreadySet { .. })
        ));
        assert!(s.initialize_toolbox_positions(Side::Left, 5, Vec2::ZERO, Vec2::ZERO).is_err());
    }

    #[test]
    fn test_creator_id_names_side_and_index() {
        let s = scene(SceneConfig::default());
        assert_eq!(s.creator_id(Side::Right, 1).unwrap(), CreatorId(3));
        assert_eq!(
            s.creator_id(Side::Right, 2),
            Err(ModelError::UnknownToolboxIndex {
                side: Side::Right,
                index: 2
            })
        );
    }

    #[test]
    fn test_set_locked_without_lock_control_is_noop() {
        let mut s = scene(SceneConfig::combining());
        s.set_locked(true).unwrap();
        assert_eq!(s.locked(), None);
        assert!(!s.is_locked());
    }

    #[test]
    fn test_clear_and_reset() {
        let mut s = scene(SceneConfig::default());
        place(&mut s, CreatorId(1), Sign::Positive, Some(35));
        s.set_locked(true).unwrap();
        s.set_variable_value(VariableId(0), 5).unwrap();
        s.save_snapshot().unwrap();
        s.reset().unwrap();
        assert!(s.terms().is_empty());
        assert_eq!(s.variables()[0].value(), 2);
        assert_eq!(s.locked(), Some(false));
        assert!(s.snapshots().get(0).unwrap().is_none());
        assert!(s
            .drain_events()
            .iter()
            .any(|e| matches!(e, SceneEvent::TermDisposed { .. })));
    }

    #[test]
    fn test_organize_groups_by_creator_and_sign() {
        let mut s = scene(SceneConfig::default());
        let a1 = place(&mut s, CreatorId(0), Sign::Positive, Some(35));
        let b = place(&mut s, CreatorId(1), Sign::Positive, Some(34));
        let a_neg = place(&mut s, CreatorId(0), Sign::Negative, Some(33));
        let a2 = place(&mut s, CreatorId(0), Sign::Positive, Some(32));
        s.organize().unwrap();
        let grid = s.plate(Side::Left).grid();
        // 3 columns used of 6: shifted right by 1
        assert_eq!(grid.cell_for_term(a1), Some(31));
        assert_eq!(grid.cell_for_term(a2), Some(25));
        assert_eq!(grid.cell_for_term(a_neg), Some(32));
        assert_eq!(grid.cell_for_term(b), Some(33));
    }

    #[test]
    fn test_universal_operation_applies_to_both_sides() {
        let mut s = scene(SceneConfig::combining());
        let outcome = s
            .apply_universal_operation(&UniversalOperation::constant(Operator::Plus, 3))
            .unwrap();
        assert!(outcome.applied);
        assert_eq!(s.plate_weight(Side::Left), Fraction::from(3));
        assert_eq!(s.plate_weight(Side::Right), Fraction::from(3));

        let outcome = s
            .apply_universal_operation(&UniversalOperation::constant(Operator::Minus, 3))
            .unwrap();
        assert_eq!(outcome.summed_to_zero.len(), 2);
        assert!(s.terms().is_empty());
        assert_eq!(
            s.drain_events()
                .iter()
                .filter(|e| matches!(e, SceneEvent::SumToZero { .. }))
                .count(),
            2
        );
    }

    #[test]
    fn test_universal_operation_overflow_changes_nothing() {
        let mut s = scene(SceneConfig::combining());
        s.apply_universal_operation(&UniversalOperation::constant(Operator::Plus, 2))
            .unwrap();
        s.drain_events();
        let big = UniversalOperation::constant(Operator::Times, crate::consts::MAX_INTEGER);
        let outcome = s.apply_universal_operation(&big).unwrap();
        assert!(!outcome.applied);
        assert_eq!(s.plate_weight(Side::Left), Fraction::from(2));
        assert!(s
            .drain_events()
            .iter()
            .any(|e| matches!(e, SceneEvent::MaxIntegerExceeded { .. })));
    }

    #[test]
    fn test_universal_operation_needs_combine_scene() {
        let mut s = scene(SceneConfig::default());
        assert_eq!(
            s.apply_universal_operation(&UniversalOperation::constant(Operator::Plus, 1)),
            Err(ModelError::NotCombineScene)
        );
    }

    #[test]
    fn test_divide_by_zero_leaves_terms_unchanged() {
        let mut s = scene(SceneConfig::combining());
        s.apply_universal_operation(&UniversalOperation::constant(Operator::Plus, 4))
            .unwrap();
        let before = s.terms().ids();
        let outcome = s
            .apply_universal_operation(&UniversalOperation::constant(Operator::Divide, 0))
            .unwrap();
        assert!(outcome.applied);
        assert!(outcome.summed_to_zero.is_empty());
        assert_eq!(s.terms().ids(), before);
    }

    #[test]
    fn test_snapshot_save_and_restore() {
        let mut s = scene(SceneConfig::default());
        let term = place(&mut s, CreatorId(0), Sign::Negative, Some(33));
        let slot = s.save_snapshot().unwrap().unwrap();
        s.set_variable_value(VariableId(0), 7).unwrap();
        s.clear().unwrap();

        assert!(s.restore_snapshot(slot).unwrap());
        assert!(s.terms().is_disposed(term));
        assert_eq!(s.variables()[0].value(), 2);
        assert_eq!(s.plate_weight(Side::Left), Fraction::from(-2));
        let restored = s.plate(Side::Left).terms();
        assert_eq!(s.plate(Side::Left).grid().cell_for_term(restored[0]), Some(33));
        assert_eq!(s.snapshots().selected(), Some(slot));

        s.delete_snapshot(slot).unwrap();
        assert!(!s.restore_snapshot(slot).unwrap());
    }

    proptest! {
        #[test]
        fn prop_organize_keeps_terms(cells in proptest::collection::btree_set(30usize..36, 1..6), negative in any::<bool>()) {
            let mut s = scene(SceneConfig::default());
            let sign = if negative { Sign::Negative } else { Sign::Positive };
            for (i, cell) in cells.iter().enumerate() {
                place(&mut s, CreatorId(i % 2), sign, Some(*cell));
            }
            let before = s.plate_weight(Side::Left);
            let mut terms_before = s.plate(Side::Left).terms();
            terms_before.sort();
            s.organize().unwrap();
            let mut terms_after = s.plate(Side::Left).terms();
            terms_after.sort();
            prop_assert_eq!(terms_before, terms_after);
            prop_assert_eq!(s.plate_weight(Side::Left), before);
        }
    }
}
