//! Separate-cells placement: one term per cell. Terms only ever meet when a
//! term is dropped on its inverse and both cancel.

use super::{DragId, DragOutcome, DragPhase, DragSession};
use crate::error::{ModelError, ModelResult};
use crate::model::{CreatorId, Scene, SceneEvent, Side, TermId};

impl Scene {
    /// Lock pick-up. Prefer lifting an equivalent term off the opposite plate;
    /// otherwise leave an inverse term there. `None` if that needs room and
    /// the opposite plate is full.
    pub(crate) fn start_opposite_separate(
        &mut self,
        term: TermId,
        creator: CreatorId,
    ) -> ModelResult<Option<(Option<TermId>, Option<TermId>)>> {
        let opposite_creator = self.equivalent_creator(creator)?;
        let side = self.creator(creator)?.side;
        let value = *self.terms.try_get(term)?.value();
        let cell = self
            .plate(side)
            .grid()
            .cell_for_term(term)
            .ok_or(ModelError::TermNotInGrid(term))?;

        let opposite_grid = self.plate(side.opposite()).grid();
        if let Some(equivalent) = opposite_grid.closest_equivalent_term(&value, cell, &self.terms)? {
            let (c, mut cx) = self.creator_cx(opposite_creator)?;
            c.remove_term_from_plate(equivalent, &mut cx)?;
            cx.terms.try_get_mut(equivalent)?.pickable = false;
            return Ok(Some((Some(equivalent), None)));
        }

        let near = opposite_grid.cell_position(cell)?;
        let Some(inverse_cell) = opposite_grid.best_empty_cell(near) else {
            self.side_full(side.opposite());
            return Ok(None);
        };
        let options = self.terms.try_get(term)?.inverse_options();
        let inverse = {
            let (c, mut cx) = self.creator_cx(opposite_creator)?;
            let inverse = c.create_term_with(options, None, &mut cx)?;
            c.put_term_on_plate(inverse, Some(inverse_cell), &mut cx)?;
            inverse
        };
        let equivalent = self.create_equivalent(term, opposite_creator)?;
        Ok(Some((Some(equivalent), Some(inverse))))
    }

    /// Head for the empty cell nearest the term. With no room (here, or on the
    /// opposite plate when the lock needs it) the term goes back to the toolbox.
    pub(crate) fn animate_to_plate_separate(&mut self, id: DragId) -> ModelResult<()> {
        let mut session = self.session(id)?;
        let position = self.terms.try_get(session.term)?.position;
        let cell = self.plate(session.side).grid().best_empty_cell(position);
        let opposite_full = needs_opposite_room(&session) && self.plate(session.side.opposite()).grid().is_full();

        match cell {
            Some(cell) if !opposite_full => {
                self.retarget(session.term, session.side, cell)?;
                session.target_cell = Some(cell);
                session.phase = DragPhase::ToPlate;
                self.drags.insert(id, session);
                log::debug!("{} settling into cell {}", id, cell);
                Ok(())
            }
            _ => {
                if opposite_full {
                    self.side_full(session.side.opposite());
                } else {
                    log::debug!("{}: {} plate is full", id, session.side);
                }
                self.animate_to_toolbox(id)
            }
        }
    }

    /// Restart if the target cell stopped being the best place to land, or
    /// the opposite plate filled up meanwhile.
    pub(crate) fn track_plate_target_separate(&mut self, id: DragId) -> ModelResult<()> {
        let session = self.session(id)?;
        let Some(cell) = session.target_cell else {
            return self.animate_to_plate_separate(id);
        };
        if self.target_still_valid(&session, cell)? {
            self.retarget(session.term, session.side, cell)
        } else {
            log::debug!("{}: cell {} was taken, restarting", id, cell);
            self.animate_to_plate_separate(id)
        }
    }

    pub(crate) fn arrive_on_plate_separate(&mut self, id: DragId) -> ModelResult<()> {
        let session = self.session(id)?;
        let cell = match session.target_cell {
            Some(cell) if self.target_still_valid(&session, cell)? => cell,
            _ => return self.animate_to_plate_separate(id),
        };
        {
            let (c, mut cx) = self.creator_cx(session.creator)?;
            c.put_term_on_plate(session.term, Some(cell), &mut cx)?;
        }

        match (session.equivalent_term, session.inverse_term) {
            // Back where it came from: the compensation is no longer needed
            (Some(equivalent), Some(inverse)) => {
                self.dispose_term(equivalent)?;
                self.dispose_term(inverse)?;
            }
            (Some(equivalent), None) => self.place_equivalent(&session, equivalent)?,
            _ => {}
        }
        self.settle(session, DragOutcome::Placed);
        Ok(())
    }

    /// Dropped on an inverse term: both go, then the opposite side follows suit
    pub(crate) fn sum_to_zero_separate(&mut self, id: DragId, inverse: TermId) -> ModelResult<()> {
        let session = self.session(id)?;
        let cell = self
            .plate(session.side)
            .grid()
            .cell_for_term(inverse)
            .ok_or(ModelError::TermNotInGrid(inverse))?;
        let position = self.plate(session.side).grid().cell_position(cell)?;
        self.dispose_term(session.term)?;
        self.dispose_term(inverse)?;
        self.events.push(SceneEvent::SumToZero {
            side: session.side,
            position,
        });

        match (session.equivalent_term, session.inverse_term) {
            (Some(equivalent), Some(compensation)) => {
                self.dispose_term(equivalent)?;
                self.dispose_term(compensation)?;
            }
            (Some(equivalent), None) => {
                let opposite = session.side.opposite();
                let grid = self.plate(opposite).grid();
                let value = *self.terms.try_get(equivalent)?.value();
                match grid.closest_inverse_term(&value, cell, &self.terms)? {
                    Some(opposite_inverse) => {
                        let cell = grid
                            .cell_for_term(opposite_inverse)
                            .ok_or(ModelError::TermNotInGrid(opposite_inverse))?;
                        let position = grid.cell_position(cell)?;
                        self.dispose_term(equivalent)?;
                        self.dispose_term(opposite_inverse)?;
                        self.events.push(SceneEvent::SumToZero {
                            side: opposite,
                            position,
                        });
                    }
                    None => self.place_equivalent(&session, equivalent)?,
                }
            }
            _ => {}
        }
        self.settle(session, DragOutcome::SummedToZero);
        Ok(())
    }

    /// Put the equivalent term in the empty cell nearest to it on the opposite plate
    fn place_equivalent(&mut self, session: &DragSession, equivalent: TermId) -> ModelResult<()> {
        let opposite: Side = session.side.opposite();
        let position = self.terms.try_get(equivalent)?.position;
        let Some(cell) = self.plate(opposite).grid().best_empty_cell(position) else {
            self.side_full(opposite);
            self.dispose_term(equivalent)?;
            return Ok(());
        };
        let creator = self.equivalent_creator(session.creator)?;
        let (c, mut cx) = self.creator_cx(creator)?;
        c.put_term_on_plate(equivalent, Some(cell), &mut cx)?;
        Ok(())
    }

    /// The target is still the cell the term would pick from where it is
    /// heading, and the opposite plate still has room if the lock needs it.
    fn target_still_valid(&self, session: &DragSession, cell: usize) -> ModelResult<bool> {
        let grid = self.plate(session.side).grid();
        let center = grid.cell_position(cell)?;
        if grid.best_empty_cell(center) != Some(cell) {
            return Ok(false);
        }
        Ok(!(needs_opposite_room(session) && self.plate(session.side.opposite()).grid().is_full()))
    }
}

/// An equivalent term with no inverse to cancel against will need an opposite cell
fn needs_opposite_room(session: &DragSession) -> bool {
    session.equivalent_term.is_some() && session.inverse_term.is_none()
}
