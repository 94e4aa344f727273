//! One side's placement surface
//!
//! A plate owns the grid its terms sit in. Writes come only from the term
//! creators assigned to it; the plate fires `ContentsChanged` after each.

use std::cell::OnceCell;
use std::collections::BTreeSet;

use glam::Vec2;

use super::balance_scale::Side;
use super::events::SceneEvent;
use super::grid::Grid;
use super::term::{Sign, TermId, TermPool};
use super::term_creator::{CreatorId, TermCreator};
use crate::Bounds;
use crate::error::{ModelError, ModelResult};

#[derive(Debug, Clone)]
pub struct Plate {
    pub side: Side,
    pub diameter: f32,
    pub support_height: f32,
    grid_y_offset: f32,
    grid: Grid,
    /// Creators that put terms on this plate, in toolbox order. Set once.
    creators: OnceCell<Vec<CreatorId>>,
    position: Vec2,
}

impl Plate {
    pub fn new(
        side: Side,
        diameter: f32,
        support_height: f32,
        rows: usize,
        columns: usize,
        grid_y_offset: f32,
    ) -> Self {
        let cell = diameter / columns as f32;
        Self {
            side,
            diameter,
            support_height,
            grid_y_offset,
            grid: Grid::new(rows, columns, cell, cell, Vec2::ZERO),
            creators: OnceCell::new(),
            position: Vec2::ZERO,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Moves the grid and every term on it
    pub fn set_position(&mut self, position: Vec2, terms: &mut TermPool) {
        self.position = position;
        self.grid
            .set_position(position - Vec2::new(0.0, self.grid_y_offset), terms);
    }

    pub fn set_creators(&self, creators: Vec<CreatorId>) -> ModelResult<()> {
        self.creators.set(creators).map_err(|_| ModelError::AlreadySet {
            field: "plate term creators",
        })
    }

    pub fn creators(&self) -> &[CreatorId] {
        self.creators.get().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn number_of_terms(&self) -> usize {
        self.grid.number_of_terms()
    }

    pub fn terms(&self) -> Vec<TermId> {
        self.grid.terms()
    }

    pub fn contains(&self, term: TermId) -> bool {
        self.grid.cell_for_term(term).is_some()
    }

    pub fn grid_bounds(&self) -> Bounds {
        self.grid.bounds()
    }

    pub fn add_term(
        &mut self,
        term: TermId,
        cell: usize,
        terms: &mut TermPool,
        events: &mut Vec<SceneEvent>,
    ) -> ModelResult<()> {
        self.grid.put_term(term, cell, terms)?;
        events.push(SceneEvent::ContentsChanged { side: self.side });
        Ok(())
    }

    pub fn remove_term(
        &mut self,
        term: TermId,
        terms: &mut TermPool,
        events: &mut Vec<SceneEvent>,
    ) -> ModelResult<usize> {
        let cell = self.grid.remove_term(term, terms)?;
        events.push(SceneEvent::ContentsChanged { side: self.side });
        Ok(cell)
    }

    /// Regroup the plate's terms: one or more columns per creator and sign,
    /// in creator order, then center the occupied columns.
    pub fn organize(
        &mut self,
        all_creators: &[TermCreator],
        terms: &mut TermPool,
        events: &mut Vec<SceneEvent>,
    ) -> ModelResult<()> {
        let total = self.grid.number_of_terms();
        if total == 0 {
            return Ok(());
        }
        let before: BTreeSet<TermId> = self.grid.terms().into_iter().collect();

        let mut groups: Vec<Vec<TermId>> = Vec::new();
        for id in self.creators() {
            let creator = all_creators.get(id.0).ok_or(ModelError::UnknownCreator(*id))?;
            for sign in [Sign::Positive, Sign::Negative] {
                let group: Vec<TermId> = creator
                    .terms_on_plate()
                    .iter()
                    .copied()
                    .filter(|t| terms.get(*t).is_some_and(|term| term.sign() == sign))
                    .collect();
                if !group.is_empty() {
                    groups.push(group);
                }
            }
        }

        self.grid.clear_all_cells();
        let rows = self.grid.rows();
        let columns = self.grid.columns();
        let bottom = rows - 1;
        let mut row = bottom;
        let mut column = 0;
        let mut placed = 0;

        for (i, group) in groups.iter().enumerate() {
            // A new group gets its own column if the columns to the right can hold what's left
            if i > 0 && row != bottom {
                let remaining = total - placed;
                if (columns - column - 1) * rows >= remaining {
                    column += 1;
                    row = bottom;
                }
            }
            for id in group {
                let cell = self.grid.cell_at(row, column)?;
                self.grid.put_term(*id, cell, terms)?;
                placed += 1;
                if row == 0 {
                    column += 1;
                    row = bottom;
                } else {
                    row -= 1;
                }
            }
        }

        let used_columns = if row == bottom { column } else { column + 1 };
        let shift = columns.saturating_sub(used_columns) / 2;
        if shift > 0 {
            let occupied: Vec<(usize, TermId)> = (0..self.grid.cell_count())
                .filter_map(|cell| self.grid.term_in_cell(cell).ok().flatten().map(|id| (cell, id)))
                .collect();
            self.grid.clear_all_cells();
            for (cell, id) in occupied {
                self.grid.put_term(id, cell + shift, terms)?;
            }
        }

        let after: BTreeSet<TermId> = self.grid.terms().into_iter().collect();
        debug_assert!(
            before.symmetric_difference(&after).next().is_none(),
            "organize changed the set of terms on the {} plate",
            self.side
        );
        log::debug!("organized {} terms on the {} plate", total, self.side);
        events.push(SceneEvent::ContentsChanged { side: self.side });
        Ok(())
    }
}
