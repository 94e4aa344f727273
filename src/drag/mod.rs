//! Drag-and-combine protocol
//!
//! A drag session follows one term from pick-up until it settles. While the
//! lock is on, the opposite side is kept in step: an equivalent term follows
//! the dragged one, and lifting a term off its plate may leave an inverse
//! term on the opposite plate to compensate.
//!
//! Placement policy lives in `combine` (like terms share one cell) and
//! `separate` (one term per cell).

mod combine;
mod separate;

use std::collections::BTreeSet;
use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::model::{CreatorId, Interaction, MotionStatus, Scene, Side, Sign, TermId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DragId(pub u32);

impl fmt::Display for DragId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "drag{}", self.0)
    }
}

/// How a drag ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DragOutcome {
    /// Combined with the like term already in the cell
    Merged,
    /// Cancelled out with an inverse term
    SummedToZero,
    /// Put in an empty cell
    Placed,
    ReturnedToToolbox,
    /// Max integer exceeded, or the term was disposed mid-drag
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DragPhase {
    /// Following the pointer
    Dragging,
    /// Settle animation toward `target_cell`
    ToPlate,
    /// Settle animation back to the toolbox; the term is disposed on arrival
    ToToolbox,
    Settled(DragOutcome),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    pub id: DragId,
    pub pointer: u32,
    pub term: TermId,
    pub creator: CreatorId,
    pub side: Side,
    /// Lock only: the copy that follows on the opposite side
    pub equivalent_term: Option<TermId>,
    /// Lock only: compensating term placed on the opposite plate at pick-up
    pub inverse_term: Option<TermId>,
    pub target_cell: Option<usize>,
    pub phase: DragPhase,
    /// Like-terms cell the equivalent term is still travelling to
    pub opposite_target: Option<usize>,
    /// On-plate term showing a halo because the dragged term is over it
    halo_term: Option<TermId>,
    /// Equivalent term x minus dragged term x
    x_offset: f32,
}

impl DragSession {
    pub fn is_settled(&self) -> bool {
        matches!(self.phase, DragPhase::Settled(_)) && self.opposite_target.is_none()
    }

    pub fn outcome(&self) -> Option<DragOutcome> {
        match self.phase {
            DragPhase::Settled(outcome) => Some(outcome),
            _ => None,
        }
    }
}

impl Scene {
    pub fn drag_session(&self, id: DragId) -> Option<&DragSession> {
        self.drags.get(&id)
    }

    /// How a finished drag ended. `None` while it is still in progress.
    pub fn drag_outcome(&self, id: DragId) -> Option<DragOutcome> {
        self.finished_drags.get(&id).copied()
    }

    pub fn has_active_drags(&self) -> bool {
        !self.drags.is_empty()
    }

    pub(crate) fn session(&self, id: DragId) -> ModelResult<DragSession> {
        self.drags.get(&id).copied().ok_or(ModelError::UnknownDrag(id))
    }

    /// Create a term at a creator's toolbox icon and start dragging it.
    /// Refused (`None`) when the lock needs room on a full opposite plate.
    pub fn create_term_from_toolbox(
        &mut self,
        creator: CreatorId,
        sign: Sign,
        interaction: Interaction,
    ) -> ModelResult<Option<DragId>> {
        let side = self.creator(creator)?.side;
        let equivalent_creator = self.equivalent_creator(creator)?;
        if self.is_locked() && !self.combines_like_terms() && self.plate(side.opposite()).grid().is_full() {
            self.side_full(side.opposite());
            return Ok(None);
        }

        let term = {
            let (c, mut cx) = self.creator_cx(creator)?;
            c.create_term(sign, Some(interaction), &mut cx)?
        };
        let equivalent_term = if self.is_locked() {
            Some(self.create_equivalent(term, equivalent_creator)?)
        } else {
            None
        };
        let id = self.begin_session(term, creator, interaction.pointer, equivalent_term, None)?;
        self.drag(id, interaction.position)?;
        Ok(Some(id))
    }

    /// Pick a term up off its plate. `None` if it can't be picked up right now,
    /// or if the lock could not resolve the opposite side.
    pub fn start_drag(&mut self, term: TermId, pointer: u32) -> ModelResult<Option<DragId>> {
        let t = self.terms.try_get(term)?;
        if !t.pickable || t.dragging || !t.on_plate {
            return Ok(None);
        }
        let (creator, position) = (t.creator, t.position);

        let (equivalent_term, inverse_term) = if self.is_locked() {
            let resolved = if self.combines_like_terms() {
                self.start_opposite_combined(term, creator)?
            } else {
                self.start_opposite_separate(term, creator)?
            };
            match resolved {
                Some(pair) => pair,
                None => return Ok(None),
            }
        } else {
            (None, None)
        };

        {
            let (c, mut cx) = self.creator_cx(creator)?;
            c.remove_term_from_plate(term, &mut cx)?;
        }
        let id = self.begin_session(term, creator, pointer, equivalent_term, inverse_term)?;
        self.refresh();
        self.drag(id, position)?;
        Ok(Some(id))
    }

    /// Move a dragged term (clamped to its drag bounds). The equivalent term follows.
    pub fn drag(&mut self, id: DragId, position: Vec2) -> ModelResult<()> {
        let mut session = self.session(id)?;
        if session.phase != DragPhase::Dragging {
            return Ok(());
        }
        let term = self.terms.try_get_mut(session.term)?;
        let position = term.drag_bounds.closest_point(position);
        term.move_to(position);
        if let Some(equivalent) = session.equivalent_term.and_then(|e| self.terms.get_mut(e)) {
            let follow = equivalent
                .drag_bounds
                .closest_point(position + Vec2::new(session.x_offset, 0.0));
            equivalent.move_to(follow);
        }

        let overlapped = self.overlapped_term(&session)?;
        if overlapped != session.halo_term {
            if let Some(old) = session.halo_term.and_then(|h| self.terms.get_mut(h)) {
                old.halo_visible = false;
            }
            if let Some(new) = overlapped.and_then(|h| self.terms.get_mut(h)) {
                new.halo_visible = true;
            }
            self.terms.try_get_mut(session.term)?.halo_visible = overlapped.is_some();
            session.halo_term = overlapped;
            self.drags.insert(id, session);
        }
        Ok(())
    }

    /// Release a dragged term: back to the toolbox if dropped well below its
    /// plate, cancel with an overlapped inverse term, or settle onto the plate.
    pub fn end_drag(&mut self, id: DragId) -> ModelResult<()> {
        let mut session = self.session(id)?;
        if session.phase != DragPhase::Dragging {
            return Ok(());
        }
        let term = self.terms.try_get_mut(session.term)?;
        term.dragging = false;
        term.shadow_visible = false;
        term.halo_visible = false;
        let position = term.position;

        let overlapped = session.halo_term.take();
        if let Some(h) = overlapped.and_then(|h| self.terms.get_mut(h)) {
            h.halo_visible = false;
        }
        self.drags.insert(id, session);

        let threshold = self.plate(session.side).position().y + self.config.return_to_toolbox_dy;
        match overlapped {
            _ if position.y > threshold => self.animate_to_toolbox(id)?,
            Some(inverse) if !self.combines_like_terms() => self.sum_to_zero_separate(id, inverse)?,
            _ => self.animate_to_plate(id)?,
        }
        // Cancelling out happens right away, not on a later step
        self.refresh();
        Ok(())
    }

    fn animate_to_plate(&mut self, id: DragId) -> ModelResult<()> {
        if self.combines_like_terms() {
            self.animate_to_plate_combined(id)
        } else {
            self.animate_to_plate_separate(id)
        }
    }

    pub(crate) fn animate_to_toolbox(&mut self, id: DragId) -> ModelResult<()> {
        let mut session = self.session(id)?;
        let speed = self.config.animation_speed;
        for term in [Some(session.term), session.equivalent_term].into_iter().flatten() {
            if let Some(t) = self.terms.get_mut(term) {
                let destination = t.toolbox_position;
                t.animate_to(destination, speed, false);
            }
        }
        session.phase = DragPhase::ToToolbox;
        session.target_cell = None;
        session.opposite_target = None;
        self.drags.insert(id, session);
        log::debug!("{} returning {} to the toolbox", id, session.term);
        Ok(())
    }

    /// Start a session for a term that is already off its plate
    pub(crate) fn begin_session(
        &mut self,
        term: TermId,
        creator: CreatorId,
        pointer: u32,
        equivalent_term: Option<TermId>,
        inverse_term: Option<TermId>,
    ) -> ModelResult<DragId> {
        let side = self.creator(creator)?.side;
        let sign = self.terms.try_get(term)?.sign();
        let equivalent_creator = self.equivalent_creator(creator)?;
        let x_offset =
            self.toolbox_position(equivalent_creator, sign)?.x - self.toolbox_position(creator, sign)?.x;

        let t = self.terms.try_get_mut(term)?;
        t.halt_animation();
        t.dragging = true;
        t.shadow_visible = true;

        let id = DragId(self.next_drag_id);
        self.next_drag_id += 1;
        self.drags.insert(
            id,
            DragSession {
                id,
                pointer,
                term,
                creator,
                side,
                equivalent_term,
                inverse_term,
                target_cell: None,
                phase: DragPhase::Dragging,
                opposite_target: None,
                halo_term: None,
                x_offset,
            },
        );
        log::debug!("{} started: {} from {} ({} side)", id, term, creator, side);
        Ok(id)
    }

    /// Unplaced copy of `term` made by the opposite creator
    pub(crate) fn create_equivalent(&mut self, term: TermId, equivalent_creator: CreatorId) -> ModelResult<TermId> {
        let options = self.terms.try_get(term)?.copy_options();
        let (c, mut cx) = self.creator_cx(equivalent_creator)?;
        let equivalent = c.create_term_with(options, None, &mut cx)?;
        cx.terms.try_get_mut(equivalent)?.pickable = false;
        Ok(equivalent)
    }

    /// On-plate term under the dragged term that it would combine with
    fn overlapped_term(&self, session: &DragSession) -> ModelResult<Option<TermId>> {
        let term = self.terms.try_get(session.term)?;
        let Some(other) = self.plate(session.side).grid().term_at_position(term.position) else {
            return Ok(None);
        };
        let other_term = self.terms.try_get(other)?;
        let qualifies = if self.combines_like_terms() {
            term.is_like_term(other_term)
        } else {
            term.is_inverse_term(other_term)
        };
        Ok(qualifies.then_some(other))
    }

    pub(crate) fn settle(&mut self, mut session: DragSession, outcome: DragOutcome) {
        log::debug!("{} settled: {:?}", session.id, outcome);
        session.phase = DragPhase::Settled(outcome);
        self.drags.insert(session.id, session);
    }

    /// Per-frame drag work: advance motions, then dispatch arrivals and re-check targets
    pub(crate) fn advance_drags(&mut self, dt: f32) -> ModelResult<()> {
        let animating: Vec<TermId> = self
            .terms
            .iter()
            .filter(|t| t.is_animating())
            .map(|t| t.id)
            .collect();
        let mut arrived = BTreeSet::new();
        for term in animating {
            if let Some(t) = self.terms.get_mut(term) {
                if t.advance(dt) == MotionStatus::Arrived {
                    arrived.insert(term);
                }
            }
        }

        self.sweep_drags()?;
        let ids: Vec<DragId> = self.drags.keys().copied().collect();
        for id in ids {
            let Some(session) = self.drags.get(&id).copied() else {
                continue;
            };
            match session.phase {
                DragPhase::ToPlate if arrived.contains(&session.term) => self.arrive_on_plate(id)?,
                DragPhase::ToPlate => self.track_plate_target(id)?,
                DragPhase::ToToolbox if arrived.contains(&session.term) => {
                    self.dispose_term(session.term)?;
                    if let Some(equivalent) = session.equivalent_term {
                        self.dispose_term(equivalent)?;
                    }
                    self.settle(session, DragOutcome::ReturnedToToolbox);
                }
                _ => {}
            }

            // Equivalent term travelling to the opposite like-terms cell
            let Some(session) = self.drags.get(&id).copied() else {
                continue;
            };
            if let (Some(_), Some(equivalent)) = (session.opposite_target, session.equivalent_term) {
                if arrived.contains(&equivalent) {
                    self.arrive_opposite_combined(id)?;
                } else {
                    self.track_opposite_target(id)?;
                }
            }
        }
        self.sweep_drags()
    }

    fn arrive_on_plate(&mut self, id: DragId) -> ModelResult<()> {
        if self.combines_like_terms() {
            self.arrive_on_plate_combined(id)
        } else {
            self.arrive_on_plate_separate(id)
        }
    }

    fn track_plate_target(&mut self, id: DragId) -> ModelResult<()> {
        if self.combines_like_terms() {
            let session = self.session(id)?;
            if let Some(cell) = session.target_cell {
                self.retarget(session.term, session.side, cell)?;
            }
            Ok(())
        } else {
            self.track_plate_target_separate(id)
        }
    }

    /// Keep a settling term aimed at its cell while the plate moves
    pub(crate) fn retarget(&mut self, term: TermId, side: Side, cell: usize) -> ModelResult<()> {
        let destination = self.plate(side).grid().cell_position(cell)?;
        let speed = self.config.animation_speed;
        if let Some(t) = self.terms.get_mut(term) {
            if t.destination() != Some(destination) {
                t.animate_to(destination, speed, false);
            }
        }
        Ok(())
    }

    /// Abort sessions whose term was disposed elsewhere, and retire settled ones
    pub(crate) fn sweep_drags(&mut self) -> ModelResult<()> {
        let ids: Vec<DragId> = self.drags.keys().copied().collect();
        for id in ids {
            let Some(mut session) = self.drags.get(&id).copied() else {
                continue;
            };
            let equivalent_gone = session
                .equivalent_term
                .is_none_or(|e| self.terms.is_disposed(e));
            if session.opposite_target.is_some() && equivalent_gone {
                session.opposite_target = None;
            }
            if !matches!(session.phase, DragPhase::Settled(_)) && self.terms.is_disposed(session.term) {
                log::debug!("{} aborted: {} was disposed", id, session.term);
                session.phase = DragPhase::Settled(DragOutcome::Aborted);
                if let Some(equivalent) = session.equivalent_term {
                    if self.terms.get(equivalent).is_some_and(|e| !e.on_plate) {
                        self.dispose_term(equivalent)?;
                    }
                }
                session.opposite_target = None;
            }
            if let Some(halo) = session.halo_term.filter(|_| session.phase != DragPhase::Dragging) {
                if let Some(t) = self.terms.get_mut(halo) {
                    t.halo_visible = false;
                }
                session.halo_term = None;
            }

            if session.is_settled() {
                self.drags.remove(&id);
                if let Some(outcome) = session.outcome() {
                    self.finished_drags.insert(id, outcome);
                }
            } else {
                self.drags.insert(id, session);
            }
        }
        Ok(())
    }
}
