//! Term creators: lifecycle authority for one kind of term on one side
//!
//! A creator makes terms (from the toolbox, snapshots or operations), keeps
//! track of which of them are on its plate, and disposes them. In
//! combine-like-terms mode all of its terms share one fixed cell, so at most
//! one of them is on the plate at a time.

use std::cell::OnceCell;
use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::balance_scale::Side;
use super::events::{Interaction, SceneEvent};
use super::fraction::Fraction;
use super::operation::UniversalOperation;
use super::plate::Plate;
use super::snapshot::{SnapshotEntry, TermCreatorSnapshot};
use super::term::{Sign, Term, TermId, TermKind, TermOptions, TermPool, TermValue};
use super::variable::Variable;
use crate::Bounds;
use crate::error::{ModelError, ModelResult};
use crate::view::TermViewFactory;

/// Index into a scene's creator list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CreatorId(pub usize);

impl fmt::Display for CreatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// Where new terms appear, and where returning terms go
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToolboxAnchors {
    pub positive: Vec2,
    pub negative: Vec2,
}

/// The parts of a scene a creator works with
pub struct CreatorContext<'a> {
    pub terms: &'a mut TermPool,
    pub plate: &'a mut Plate,
    pub variables: &'a [Variable],
    pub events: &'a mut Vec<SceneEvent>,
}

#[derive(Debug, Clone)]
pub struct TermCreator {
    pub id: CreatorId,
    pub side: Side,
    kind: TermKind,
    /// Some => combine like terms in this cell
    like_terms_cell: Option<usize>,
    drag_bounds: Bounds,
    small_diameter: f32,
    big_diameter: f32,
    /// Every live term this creator made
    all_terms: Vec<TermId>,
    /// Subset of `all_terms` currently in the plate's grid
    terms_on_plate: Vec<TermId>,
    equivalent_creator: OnceCell<CreatorId>,
    anchors: OnceCell<ToolboxAnchors>,
}

impl TermCreator {
    pub fn new(
        id: CreatorId,
        side: Side,
        kind: TermKind,
        like_terms_cell: Option<usize>,
        drag_bounds: Bounds,
        small_diameter: f32,
        big_diameter: f32,
    ) -> Self {
        Self {
            id,
            side,
            kind,
            like_terms_cell,
            drag_bounds,
            small_diameter,
            big_diameter,
            all_terms: Vec::new(),
            terms_on_plate: Vec::new(),
            equivalent_creator: OnceCell::new(),
            anchors: OnceCell::new(),
        }
    }

    pub fn kind(&self) -> TermKind {
        self.kind
    }

    pub fn like_terms_cell(&self) -> Option<usize> {
        self.like_terms_cell
    }

    pub fn combines_like_terms(&self) -> bool {
        self.like_terms_cell.is_some()
    }

    pub fn big_diameter(&self) -> f32 {
        self.big_diameter
    }

    // === Two-phase wiring ===

    pub fn set_equivalent_creator(&self, other: CreatorId) -> ModelResult<()> {
        self.equivalent_creator
            .set(other)
            .map_err(|_| ModelError::AlreadySet {
                field: "equivalent term creator",
            })
    }

    /// The like-term creator on the opposite side
    pub fn equivalent_creator(&self) -> ModelResult<CreatorId> {
        self.equivalent_creator
            .get()
            .copied()
            .ok_or(ModelError::NotInitialized {
                field: "equivalent term creator",
            })
    }

    /// Called once, after the host has laid out the toolbox
    pub fn initialize_toolbox_positions(&self, positive: Vec2, negative: Vec2) -> ModelResult<()> {
        self.anchors
            .set(ToolboxAnchors { positive, negative })
            .map_err(|_| ModelError::AlreadySet {
                field: "toolbox positions",
            })
    }

    pub fn is_initialized(&self) -> bool {
        self.anchors.get().is_some()
    }

    pub fn toolbox_position(&self, sign: Sign) -> ModelResult<Vec2> {
        let anchors = self.anchors.get().ok_or(ModelError::NotInitialized {
            field: "toolbox positions",
        })?;
        Ok(match sign {
            Sign::Negative => anchors.negative,
            Sign::Positive | Sign::Zero => anchors.positive,
        })
    }

    // === Queries ===

    pub fn all_terms(&self) -> &[TermId] {
        &self.all_terms
    }

    pub fn terms_on_plate(&self) -> &[TermId] {
        &self.terms_on_plate
    }

    pub fn number_of_terms_on_plate(&self) -> usize {
        self.terms_on_plate.len()
    }

    pub fn terms_not_on_plate(&self) -> Vec<TermId> {
        self.all_terms
            .iter()
            .copied()
            .filter(|t| !self.terms_on_plate.contains(t))
            .collect()
    }

    pub fn manages(&self, term: TermId) -> bool {
        self.all_terms.contains(&term)
    }

    pub fn is_term_on_plate(&self, term: TermId) -> bool {
        self.terms_on_plate.contains(&term)
    }

    pub fn positive_terms_on_plate(&self, terms: &TermPool) -> Vec<TermId> {
        self.terms_on_plate_with_sign(terms, Sign::Positive)
    }

    pub fn negative_terms_on_plate(&self, terms: &TermPool) -> Vec<TermId> {
        self.terms_on_plate_with_sign(terms, Sign::Negative)
    }

    fn terms_on_plate_with_sign(&self, terms: &TermPool, sign: Sign) -> Vec<TermId> {
        self.terms_on_plate
            .iter()
            .copied()
            .filter(|t| terms.get(*t).is_some_and(|term| term.sign() == sign))
            .collect()
    }

    /// The single on-plate term of a combine-mode creator
    pub fn like_term_on_plate(&self) -> Option<TermId> {
        debug_assert!(self.terms_on_plate.len() <= 1 || !self.combines_like_terms());
        if self.combines_like_terms() {
            self.terms_on_plate.first().copied()
        } else {
            None
        }
    }

    pub fn weight_on_plate(&self, terms: &TermPool, variables: &[Variable]) -> Fraction {
        self.terms_on_plate
            .iter()
            .filter_map(|t| terms.get(*t))
            .map(|term| term.weight(variables))
            .sum()
    }

    /// True if the two creators make like terms. Compares throwaway unit values.
    pub fn is_like_term_creator(&self, other: &TermCreator) -> bool {
        let mine = self.kind.unit_value(Sign::Positive);
        let theirs = other.kind.unit_value(Sign::Positive);
        mine.is_like(&theirs)
    }

    // === Term lifecycle ===

    /// Create a unit term (1, -1, x, -x, ...) at the toolbox
    pub fn create_term(
        &mut self,
        sign: Sign,
        interaction: Option<Interaction>,
        cx: &mut CreatorContext<'_>,
    ) -> ModelResult<TermId> {
        if sign == Sign::Zero {
            return Err(ModelError::ZeroSign);
        }
        let options = TermOptions {
            value: self.kind.unit_value(sign),
            diameter: self.small_diameter,
        };
        self.create_term_with(options, interaction, cx)
    }

    /// Create a term from options and start managing it
    pub fn create_term_with(
        &mut self,
        options: TermOptions,
        interaction: Option<Interaction>,
        cx: &mut CreatorContext<'_>,
    ) -> ModelResult<TermId> {
        debug_assert_eq!(options.value.kind(), self.kind, "creator {} made a foreign term", self.id);
        let toolbox_position = self.toolbox_position(options.value.sign())?;
        let creator = self.id;
        let drag_bounds = self.drag_bounds;
        let id = cx.terms.insert_with(|id| {
            let mut term = Term::new(id, creator, options, toolbox_position);
            term.toolbox_position = toolbox_position;
            term.drag_bounds = drag_bounds;
            term
        });
        self.all_terms.push(id);
        log::debug!("{} {} created term {} = {}", self.side, creator, id, options.value);
        cx.events.push(SceneEvent::TermCreated {
            creator,
            term: id,
            interaction,
        });
        Ok(id)
    }

    /// Put a managed term in a cell. Combine-mode creators default to their like-terms cell.
    pub fn put_term_on_plate(
        &mut self,
        term: TermId,
        cell: Option<usize>,
        cx: &mut CreatorContext<'_>,
    ) -> ModelResult<usize> {
        if !self.manages(term) {
            return Err(ModelError::NotManaged {
                term,
                creator: self.id,
            });
        }
        if self.is_term_on_plate(term) {
            return Err(ModelError::AlreadyOnPlate(term));
        }
        let cell = match (self.like_terms_cell, cell) {
            (Some(like_cell), cell) => {
                if !self.terms_on_plate.is_empty() {
                    return Err(ModelError::LikeTermsCellOccupied(self.id));
                }
                cell.unwrap_or(like_cell)
            }
            (None, Some(cell)) => cell,
            (None, None) => {
                let position = cx.terms.try_get(term)?.position;
                cx.plate
                    .grid()
                    .best_empty_cell(position)
                    .ok_or(ModelError::PlateFull(self.side))?
            }
        };
        cx.plate.add_term(term, cell, cx.terms, cx.events)?;
        self.terms_on_plate.push(term);
        // A term at rest in a cell can always be picked up
        let t = cx.terms.try_get_mut(term)?;
        t.halt_animation();
        t.on_plate = true;
        t.pickable = true;
        Ok(cell)
    }

    /// Take a term off the plate. Returns the cell it was in.
    pub fn remove_term_from_plate(&mut self, term: TermId, cx: &mut CreatorContext<'_>) -> ModelResult<usize> {
        let index = self
            .terms_on_plate
            .iter()
            .position(|t| *t == term)
            .ok_or(ModelError::NotOnPlate(term))?;
        let cell = cx.plate.remove_term(term, cx.terms, cx.events)?;
        self.terms_on_plate.remove(index);
        if let Some(t) = cx.terms.get_mut(term) {
            t.on_plate = false;
        }
        Ok(cell)
    }

    /// Dispose a term this creator manages. Disposing twice is a no-op (returns false).
    pub fn dispose_term(&mut self, term: TermId, cx: &mut CreatorContext<'_>) -> ModelResult<bool> {
        let Some(index) = self.all_terms.iter().position(|t| *t == term) else {
            return Ok(false);
        };
        if self.is_term_on_plate(term) {
            self.remove_term_from_plate(term, cx)?;
        }
        self.all_terms.remove(index);
        cx.terms.remove(term);
        log::debug!("{} {} disposed term {}", self.side, self.id, term);
        cx.events.push(SceneEvent::TermDisposed {
            creator: self.id,
            term,
        });
        Ok(true)
    }

    pub fn dispose_all_terms(&mut self, cx: &mut CreatorContext<'_>) -> ModelResult<()> {
        for term in self.all_terms.clone() {
            self.dispose_term(term, cx)?;
        }
        self.clear_halos(cx.terms);
        Ok(())
    }

    pub fn dispose_terms_on_plate(&mut self, cx: &mut CreatorContext<'_>) -> ModelResult<()> {
        for term in self.terms_on_plate.clone() {
            self.dispose_term(term, cx)?;
        }
        self.clear_halos(cx.terms);
        Ok(())
    }

    /// Dispose terms being dragged or animating
    pub fn dispose_terms_not_on_plate(&mut self, cx: &mut CreatorContext<'_>) -> ModelResult<()> {
        for term in self.terms_not_on_plate() {
            self.dispose_term(term, cx)?;
        }
        self.clear_halos(cx.terms);
        Ok(())
    }

    /// A halo must never outlive the term that caused it
    pub fn clear_halos(&self, terms: &mut TermPool) {
        for id in &self.all_terms {
            if let Some(term) = terms.get_mut(*id) {
                term.halo_visible = false;
            }
        }
    }

    // === Universal operations ===

    /// Value the like-terms cell would hold after `operation`, without changing anything.
    /// `None` if the operation does not apply.
    pub fn preview_operation(
        &self,
        operation: &UniversalOperation,
        terms: &TermPool,
    ) -> ModelResult<Option<TermValue>> {
        if !self.combines_like_terms() {
            return Err(ModelError::NotCombineMode(self.id));
        }
        let current = match self.like_term_on_plate() {
            Some(id) => *terms.try_get(id)?.value(),
            None => self.kind.zero_value(),
        };
        Ok(current.apply_operation(operation))
    }

    /// Apply an operation to the like-terms cell. Returns true if a term that
    /// was there summed to zero; an empty cell staying empty is not reported.
    pub fn apply_operation(
        &mut self,
        operation: &UniversalOperation,
        cx: &mut CreatorContext<'_>,
    ) -> ModelResult<bool> {
        let like_cell = self.like_terms_cell.ok_or(ModelError::NotCombineMode(self.id))?;
        let existing = self.like_term_on_plate();
        let Some(value) = self.preview_operation(operation, cx.terms)? else {
            return Ok(false);
        };

        if let Some(old) = existing {
            self.dispose_term(old, cx)?;
        }
        if value.sign() == Sign::Zero {
            return Ok(existing.is_some());
        }
        let options = TermOptions {
            value,
            diameter: self.big_diameter,
        };
        let term = self.create_term_with(options, None, cx)?;
        self.put_term_on_plate(term, Some(like_cell), cx)?;
        Ok(false)
    }

    // === Snapshots ===

    pub fn create_snapshot(&self, plate: &Plate, terms: &TermPool) -> ModelResult<TermCreatorSnapshot> {
        let entries = self
            .terms_on_plate
            .iter()
            .map(|id| {
                let cell = plate
                    .grid()
                    .cell_for_term(*id)
                    .ok_or(ModelError::TermNotInGrid(*id))?;
                Ok(SnapshotEntry {
                    cell,
                    options: terms.try_get(*id)?.copy_options(),
                })
            })
            .collect::<ModelResult<Vec<_>>>()?;
        Ok(TermCreatorSnapshot { entries })
    }

    /// Recreate and place each term in a snapshot. The plate should be clear.
    pub fn restore_snapshot(
        &mut self,
        snapshot: &TermCreatorSnapshot,
        cx: &mut CreatorContext<'_>,
    ) -> ModelResult<()> {
        for entry in &snapshot.entries {
            let term = self.create_term_with(entry.options, None, cx)?;
            self.put_term_on_plate(term, Some(entry.cell), cx)?;
        }
        Ok(())
    }

    // === Presentation ===

    pub fn create_icon<F: TermViewFactory>(&self, factory: &F, sign: Sign) -> F::Icon {
        factory.create_icon(self.kind, sign)
    }

    pub fn create_term_node<F: TermViewFactory>(&self, factory: &F, term: &Term) -> ModelResult<F::Node> {
        if !self.manages(term.id) {
            return Err(ModelError::NotManaged {
                term: term.id,
                creator: self.id,
            });
        }
        Ok(factory.create_term_node(term))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::operation::Operator;
    use crate::model::variable::VariableId;

    struct Fixture {
        terms: TermPool,
        plate: Plate,
        variables: Vec<Variable>,
        events: Vec<SceneEvent>,
    }

    impl Fixture {
        fn new(rows: usize, columns: usize) -> Self {
            Self {
                terms: TermPool::new(),
                plate: Plate::new(Side::Left, 300.0, 50.0, rows, columns, 1.0),
                variables: vec![Variable::new("x", 2, -10, 10)],
                events: Vec::new(),
            }
        }

        fn cx(&mut self) -> CreatorContext<'_> {
            CreatorContext {
                terms: &mut self.terms,
                plate: &mut self.plate,
                variables: &self.variables,
                events: &mut self.events,
            }
        }
    }

    fn creator(kind: TermKind, like_terms_cell: Option<usize>) -> TermCreator {
        let c = TermCreator::new(
            CreatorId(0),
            Side::Left,
            kind,
            like_terms_cell,
            Bounds::EVERYTHING,
            45.0,
            55.0,
        );
        c.initialize_toolbox_positions(Vec2::new(100.0, 700.0), Vec2::new(150.0, 700.0))
            .unwrap();
        c
    }

    #[test]
    fn test_create_term_manages_and_announces() {
        let mut fx = Fixture::new(6, 6);
        let mut c = creator(TermKind::Constant, None);
        let id = c.create_term(Sign::Negative, None, &mut fx.cx()).unwrap();
        assert_eq!(c.all_terms(), &[id]);
        let term = fx.terms.get(id).unwrap();
        assert_eq!(term.position, Vec2::new(150.0, 700.0));
        assert_eq!(term.toolbox_position, Vec2::new(150.0, 700.0));
        assert!(matches!(fx.events[0], SceneEvent::TermCreated { term, .. } if term == id));
        assert_eq!(
            c.create_term(Sign::Zero, None, &mut fx.cx()),
            Err(ModelError::ZeroSign)
        );
    }

    #[test]
    fn test_toolbox_positions_required_and_set_once() {
        let mut fx = Fixture::new(6, 6);
        let mut c = TermCreator::new(
            CreatorId(0),
            Side::Left,
            TermKind::Constant,
            None,
            Bounds::EVERYTHING,
            45.0,
            55.0,
        );
        assert!(matches!(
            c.create_term(Sign::Positive, None, &mut fx.cx()),
            Err(ModelError::NotInitialized { .. })
        ));
        c.initialize_toolbox_positions(Vec2::ZERO, Vec2::ZERO).unwrap();
        assert!(matches!(
            c.initialize_toolbox_positions(Vec2::ZERO, Vec2::ZERO),
            Err(ModelError::AlreadySet { .. })
        ));
        c.set_equivalent_creator(CreatorId(1)).unwrap();
        assert!(c.set_equivalent_creator(CreatorId(2)).is_err());
        assert_eq!(c.equivalent_creator().unwrap(), CreatorId(1));
    }

    #[test]
    fn test_put_and_remove_track_on_plate_state() {
        let mut fx = Fixture::new(6, 6);
        let mut c = creator(TermKind::Variable(VariableId(0)), None);
        let a = c.create_term(Sign::Positive, None, &mut fx.cx()).unwrap();
        let b = c.create_term(Sign::Positive, None, &mut fx.cx()).unwrap();
        c.put_term_on_plate(a, Some(35), &mut fx.cx()).unwrap();
        c.put_term_on_plate(b, Some(34), &mut fx.cx()).unwrap();
        assert!(fx.terms.get(a).unwrap().on_plate);
        assert_eq!(c.weight_on_plate(&fx.terms, &fx.variables), Fraction::from(4));
        assert_eq!(c.terms_not_on_plate(), vec![]);

        assert_eq!(c.remove_term_from_plate(a, &mut fx.cx()).unwrap(), 35);
        assert!(!fx.terms.get(a).unwrap().on_plate);
        assert_eq!(c.terms_not_on_plate(), vec![a]);
        assert_eq!(
            c.remove_term_from_plate(a, &mut fx.cx()),
            Err(ModelError::NotOnPlate(a))
        );
    }

    #[test]
    fn test_combine_mode_allows_one_term_on_plate() {
        let mut fx = Fixture::new(6, 6);
        let mut c = creator(TermKind::Constant, Some(33));
        let a = c.create_term(Sign::Positive, None, &mut fx.cx()).unwrap();
        let b = c.create_term(Sign::Positive, None, &mut fx.cx()).unwrap();
        assert_eq!(c.put_term_on_plate(a, None, &mut fx.cx()).unwrap(), 33);
        assert_eq!(
            c.put_term_on_plate(b, None, &mut fx.cx()),
            Err(ModelError::LikeTermsCellOccupied(CreatorId(0)))
        );
        assert_eq!(c.like_term_on_plate(), Some(a));
    }

    #[test]
    fn test_dispose_is_idempotent_and_cleans_plate() {
        let mut fx = Fixture::new(6, 6);
        let mut c = creator(TermKind::Constant, None);
        let a = c.create_term(Sign::Positive, None, &mut fx.cx()).unwrap();
        c.put_term_on_plate(a, Some(30), &mut fx.cx()).unwrap();
        assert!(c.dispose_term(a, &mut fx.cx()).unwrap());
        assert!(!c.dispose_term(a, &mut fx.cx()).unwrap());
        assert!(fx.terms.is_disposed(a));
        assert_eq!(fx.plate.number_of_terms(), 0);
        assert!(c.all_terms().is_empty());
    }

    #[test]
    fn test_bulk_disposal_clears_halos() {
        let mut fx = Fixture::new(6, 6);
        let mut c = creator(TermKind::Constant, None);
        let on = c.create_term(Sign::Positive, None, &mut fx.cx()).unwrap();
        let off = c.create_term(Sign::Positive, None, &mut fx.cx()).unwrap();
        c.put_term_on_plate(on, Some(30), &mut fx.cx()).unwrap();
        fx.terms.get_mut(on).unwrap().halo_visible = true;
        c.dispose_terms_not_on_plate(&mut fx.cx()).unwrap();
        assert!(fx.terms.is_disposed(off));
        assert!(!fx.terms.get(on).unwrap().halo_visible);
    }

    #[test]
    fn test_apply_operation_sum_to_zero_only_when_occupied() {
        let mut fx = Fixture::new(6, 6);
        let mut c = creator(TermKind::Constant, Some(33));
        let minus_three = UniversalOperation::constant(Operator::Minus, 3);
        let plus_three = UniversalOperation::constant(Operator::Plus, 3);

        // Empty cell: 0 - 3 = -3 is placed
        assert!(!c.apply_operation(&minus_three, &mut fx.cx()).unwrap());
        let t = c.like_term_on_plate().unwrap();
        assert_eq!(fx.terms.get(t).unwrap().value().significant_value(), Fraction::from(-3));
        assert_eq!(fx.terms.get(t).unwrap().diameter, 55.0);

        // -3 + 3 = 0: the occupant summed to zero
        assert!(c.apply_operation(&plus_three, &mut fx.cx()).unwrap());
        assert_eq!(c.like_term_on_plate(), None);

        // Times on an empty cell leaves it empty, not reported
        let times_two = UniversalOperation::constant(Operator::Times, 2);
        assert!(!c.apply_operation(&times_two, &mut fx.cx()).unwrap());
        assert_eq!(c.like_term_on_plate(), None);
    }

    #[test]
    fn test_apply_operation_not_applicable_leaves_term() {
        let mut fx = Fixture::new(6, 6);
        let mut c = creator(TermKind::Constant, Some(33));
        let a = c.create_term(Sign::Positive, None, &mut fx.cx()).unwrap();
        c.put_term_on_plate(a, None, &mut fx.cx()).unwrap();
        let divide_by_zero = UniversalOperation::constant(Operator::Divide, 0);
        assert!(!c.apply_operation(&divide_by_zero, &mut fx.cx()).unwrap());
        assert_eq!(c.like_term_on_plate(), Some(a));
        assert!(!fx.terms.is_disposed(a));
    }

    #[test]
    fn test_like_term_creators() {
        let x = creator(TermKind::Variable(VariableId(0)), None);
        let y = creator(TermKind::Variable(VariableId(1)), None);
        let k = creator(TermKind::Constant, None);
        assert!(x.is_like_term_creator(&x.clone()));
        assert!(!x.is_like_term_creator(&y));
        assert!(!x.is_like_term_creator(&k));
    }

    #[test]
    fn test_snapshot_restores_cells_and_values() {
        let mut fx = Fixture::new(6, 6);
        let mut c = creator(TermKind::Constant, None);
        let a = c.create_term(Sign::Positive, None, &mut fx.cx()).unwrap();
        let b = c.create_term(Sign::Negative, None, &mut fx.cx()).unwrap();
        c.put_term_on_plate(a, Some(35), &mut fx.cx()).unwrap();
        c.put_term_on_plate(b, Some(30), &mut fx.cx()).unwrap();
        let snapshot = c.create_snapshot(&fx.plate, &fx.terms).unwrap();

        c.dispose_all_terms(&mut fx.cx()).unwrap();
        assert_eq!(fx.plate.number_of_terms(), 0);

        c.restore_snapshot(&snapshot, &mut fx.cx()).unwrap();
        assert_eq!(c.number_of_terms_on_plate(), 2);
        let restored = c.create_snapshot(&fx.plate, &fx.terms).unwrap();
        assert_eq!(restored, snapshot);
    }
}
