//! Combine-like-terms placement: each creator owns one cell per plate and
//! every term dropped there is added to its occupant.

use super::{DragId, DragOutcome, DragPhase, DragSession};
use crate::error::{ModelError, ModelResult};
use crate::model::{CreatorId, Scene, SceneEvent, Sign, TermId, TermOptions, TermValue};

impl Scene {
    /// Lock pick-up: subtract the lifted term from the opposite like term so
    /// both sides lose the same amount. Returns `(equivalent, inverse)`, or
    /// `None` if the subtraction would exceed the max integer.
    pub(crate) fn start_opposite_combined(
        &mut self,
        term: TermId,
        creator: CreatorId,
    ) -> ModelResult<Option<(Option<TermId>, Option<TermId>)>> {
        let opposite_creator = self.equivalent_creator(creator)?;
        let value = *self.terms.try_get(term)?.value();
        let opposite = self.creator(opposite_creator)?;
        let cell = opposite
            .like_terms_cell()
            .ok_or(ModelError::NotCombineMode(opposite_creator))?;
        let occupant = opposite.like_term_on_plate();
        let current = match occupant {
            Some(id) => *self.terms.try_get(id)?.value(),
            None => opposite.kind().zero_value(),
        };
        let remainder = current
            .minus(&value)
            .ok_or(ModelError::NotCombinable(opposite_creator))?;
        if remainder.exceeds(self.config.max_integer) {
            self.max_integer_exceeded(opposite_creator)?;
            return Ok(None);
        }

        let big = self.config.big_term_diameter;
        let (c, mut cx) = self.creator_cx(opposite_creator)?;
        if let Some(old) = occupant {
            c.dispose_term(old, &mut cx)?;
        }
        let inverse = if remainder.sign() == Sign::Zero {
            None
        } else {
            let options = TermOptions {
                value: remainder,
                diameter: big,
            };
            let id = c.create_term_with(options, None, &mut cx)?;
            c.put_term_on_plate(id, Some(cell), &mut cx)?;
            Some(id)
        };
        let equivalent = self.create_equivalent(term, opposite_creator)?;
        Ok(Some((Some(equivalent), inverse)))
    }

    /// Both terms head for their like-terms cells and settle independently
    pub(crate) fn animate_to_plate_combined(&mut self, id: DragId) -> ModelResult<()> {
        let mut session = self.session(id)?;
        let cell = self
            .creator(session.creator)?
            .like_terms_cell()
            .ok_or(ModelError::NotCombineMode(session.creator))?;
        self.retarget(session.term, session.side, cell)?;
        session.target_cell = Some(cell);
        session.phase = DragPhase::ToPlate;

        if let Some(equivalent) = session.equivalent_term {
            let opposite_creator = self.equivalent_creator(session.creator)?;
            let opposite_cell = self
                .creator(opposite_creator)?
                .like_terms_cell()
                .ok_or(ModelError::NotCombineMode(opposite_creator))?;
            self.retarget(equivalent, session.side.opposite(), opposite_cell)?;
            session.opposite_target = Some(opposite_cell);
        }
        self.drags.insert(id, session);
        log::debug!("{} settling into cell {}", id, cell);
        Ok(())
    }

    pub(crate) fn track_opposite_target(&mut self, id: DragId) -> ModelResult<()> {
        let session = self.session(id)?;
        if let (Some(cell), Some(equivalent)) = (session.opposite_target, session.equivalent_term) {
            self.retarget(equivalent, session.side.opposite(), cell)?;
        }
        Ok(())
    }

    pub(crate) fn arrive_on_plate_combined(&mut self, id: DragId) -> ModelResult<()> {
        let mut session = self.session(id)?;
        if self.abort_on_overflow(&mut session)? {
            return Ok(());
        }
        let outcome = self.combine_into_cell(session.creator, session.term)?;
        self.settle(session, outcome);
        Ok(())
    }

    pub(crate) fn arrive_opposite_combined(&mut self, id: DragId) -> ModelResult<()> {
        let mut session = self.session(id)?;
        let Some(equivalent) = session.equivalent_term else {
            return Ok(());
        };
        if self.abort_on_overflow(&mut session)? {
            return Ok(());
        }
        let opposite_creator = self.equivalent_creator(session.creator)?;
        let outcome = self.combine_into_cell(opposite_creator, equivalent)?;
        log::debug!("{} opposite side: {:?}", id, outcome);
        session.opposite_target = None;
        self.drags.insert(id, session);
        Ok(())
    }

    /// Check every leg still travelling. If any would exceed the max integer,
    /// neither commits and the session is aborted.
    fn abort_on_overflow(&mut self, session: &mut DragSession) -> ModelResult<bool> {
        let max = self.config.max_integer;
        let mut offender = None;
        if session.phase == DragPhase::ToPlate
            && self
                .like_term_sum(session.creator, session.term)?
                .is_some_and(|sum| sum.exceeds(max))
        {
            offender = Some(session.creator);
        }
        if let (None, Some(_), Some(equivalent)) = (offender, session.opposite_target, session.equivalent_term) {
            let opposite_creator = self.equivalent_creator(session.creator)?;
            if self
                .like_term_sum(opposite_creator, equivalent)?
                .is_some_and(|sum| sum.exceeds(max))
            {
                offender = Some(opposite_creator);
            }
        }
        let Some(offender) = offender else {
            return Ok(false);
        };

        self.max_integer_exceeded(offender)?;
        session.opposite_target = None;
        if session.phase == DragPhase::ToPlate {
            session.phase = DragPhase::Settled(DragOutcome::Aborted);
        }
        self.drags.insert(session.id, *session);
        log::debug!("{} aborted at the max integer", session.id);
        Ok(true)
    }

    /// What `incoming` would add up to with the creator's like term, `None` if the cell is empty
    fn like_term_sum(&self, creator: CreatorId, incoming: TermId) -> ModelResult<Option<TermValue>> {
        let Some(occupant) = self.creator(creator)?.like_term_on_plate() else {
            return Ok(None);
        };
        let value = *self.terms.try_get(incoming)?.value();
        self.terms
            .try_get(occupant)?
            .value()
            .plus(&value)
            .map(Some)
            .ok_or(ModelError::NotCombinable(creator))
    }

    /// Put an arriving term in its like-terms cell: alone and enlarged if the
    /// cell is empty, otherwise replaced together with the occupant by their sum.
    fn combine_into_cell(&mut self, creator: CreatorId, term: TermId) -> ModelResult<DragOutcome> {
        let sum = self.like_term_sum(creator, term)?;
        let big = self.config.big_term_diameter;
        let (c, mut cx) = self.creator_cx(creator)?;
        let cell = c.like_terms_cell().ok_or(ModelError::NotCombineMode(creator))?;

        let Some(sum) = sum else {
            cx.terms.try_get_mut(term)?.diameter = big;
            c.put_term_on_plate(term, Some(cell), &mut cx)?;
            return Ok(DragOutcome::Placed);
        };
        if let Some(occupant) = c.like_term_on_plate() {
            c.dispose_term(occupant, &mut cx)?;
        }
        c.dispose_term(term, &mut cx)?;

        if sum.sign() == Sign::Zero {
            let side = c.side;
            let position = cx.plate.grid().cell_position(cell)?;
            cx.events.push(SceneEvent::SumToZero { side, position });
            return Ok(DragOutcome::SummedToZero);
        }
        let options = TermOptions {
            value: sum,
            diameter: big,
        };
        let merged = c.create_term_with(options, None, &mut cx)?;
        c.put_term_on_plate(merged, Some(cell), &mut cx)?;
        Ok(DragOutcome::Merged)
    }
}
