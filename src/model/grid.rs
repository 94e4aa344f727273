//! 2D cell grid that holds the terms on one plate
//!
//! Cells are addressed by index `row * columns + column`. Row 0 is the top
//! row; the grid's origin is its bottom-center, in view coordinates (y down).
//!
//! Invariant: no column has an empty cell below an occupied one. Removing a
//! term compacts its column so the terms above it fall down.

use glam::Vec2;

use super::term::{TermId, TermPool, TermValue};
use crate::Bounds;
use crate::error::{ModelError, ModelResult};

#[derive(Debug, Clone)]
pub struct Grid {
    rows: usize,
    columns: usize,
    cell_width: f32,
    cell_height: f32,
    /// Bottom-center of the grid
    position: Vec2,
    cells: Vec<Option<TermId>>,
}

impl Grid {
    pub fn new(rows: usize, columns: usize, cell_width: f32, cell_height: f32, position: Vec2) -> Self {
        assert!(rows > 0 && columns > 0, "grid must have at least one cell");
        Self {
            rows,
            columns,
            cell_width,
            cell_height,
            position,
            cells: vec![None; rows * columns],
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn columns(&self) -> usize {
        self.columns
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn cell_size(&self) -> Vec2 {
        Vec2::new(self.cell_width, self.cell_height)
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn bounds(&self) -> Bounds {
        let width = self.columns as f32 * self.cell_width;
        let height = self.rows as f32 * self.cell_height;
        Bounds::new(
            Vec2::new(self.position.x - width / 2.0, self.position.y - height),
            Vec2::new(self.position.x + width / 2.0, self.position.y),
        )
    }

    /// Move the grid (with its plate) and re-seat every occupant on its cell
    pub fn set_position(&mut self, position: Vec2, terms: &mut TermPool) {
        self.position = position;
        for index in 0..self.cells.len() {
            if let Some(id) = self.cells[index] {
                let center = self.center_of(index);
                if let Some(term) = terms.get_mut(id) {
                    term.move_to(center);
                }
            }
        }
    }

    fn check_index(&self, index: usize) -> ModelResult<()> {
        if index < self.cells.len() {
            Ok(())
        } else {
            Err(ModelError::InvalidCell {
                index,
                rows: self.rows,
                columns: self.columns,
            })
        }
    }

    pub fn cell_at(&self, row: usize, column: usize) -> ModelResult<usize> {
        if row >= self.rows || column >= self.columns {
            return Err(ModelError::InvalidRowColumn {
                row,
                column,
                rows: self.rows,
                columns: self.columns,
            });
        }
        Ok(row * self.columns + column)
    }

    pub fn row_of(&self, index: usize) -> ModelResult<usize> {
        self.check_index(index)?;
        Ok(index / self.columns)
    }

    pub fn column_of(&self, index: usize) -> ModelResult<usize> {
        self.check_index(index)?;
        Ok(index % self.columns)
    }

    fn center_of(&self, index: usize) -> Vec2 {
        let bounds = self.bounds();
        let row = index / self.columns;
        let column = index % self.columns;
        Vec2::new(
            bounds.min.x + (column as f32 + 0.5) * self.cell_width,
            bounds.min.y + (row as f32 + 0.5) * self.cell_height,
        )
    }

    /// Center of a cell
    pub fn cell_position(&self, index: usize) -> ModelResult<Vec2> {
        self.check_index(index)?;
        Ok(self.center_of(index))
    }

    pub fn is_empty_cell(&self, index: usize) -> ModelResult<bool> {
        self.check_index(index)?;
        Ok(self.cells[index].is_none())
    }

    pub fn has_empty_cell(&self) -> bool {
        self.cells.iter().any(Option::is_none)
    }

    pub fn is_full(&self) -> bool {
        !self.has_empty_cell()
    }

    pub fn clear_cell(&mut self, index: usize) -> ModelResult<()> {
        self.check_index(index)?;
        self.cells[index] = None;
        Ok(())
    }

    pub fn clear_all_cells(&mut self) {
        self.cells.fill(None);
    }

    pub fn cell_for_term(&self, term: TermId) -> Option<usize> {
        self.cells.iter().position(|c| *c == Some(term))
    }

    pub fn term_in_cell(&self, index: usize) -> ModelResult<Option<TermId>> {
        self.check_index(index)?;
        Ok(self.cells[index])
    }

    /// Occupants in index order
    pub fn terms(&self) -> Vec<TermId> {
        self.cells.iter().flatten().copied().collect()
    }

    pub fn number_of_terms(&self) -> usize {
        self.cells.iter().flatten().count()
    }

    /// Cell containing `point`. Points on the bottom/right edge map to the last row/column.
    pub fn cell_at_position(&self, point: Vec2) -> Option<usize> {
        let bounds = self.bounds();
        if !bounds.contains(point) {
            return None;
        }
        let column = ((point.x - bounds.min.x) / self.cell_width).floor() as usize;
        let row = ((point.y - bounds.min.y) / self.cell_height).floor() as usize;
        let column = column.min(self.columns - 1);
        let row = row.min(self.rows - 1);
        Some(row * self.columns + column)
    }

    pub fn term_at_position(&self, point: Vec2) -> Option<TermId> {
        self.cell_at_position(point).and_then(|index| self.cells[index])
    }

    /// Occupant nearest to `target`'s cell whose value is equivalent to `value`.
    /// Ties go to the lowest index.
    pub fn closest_equivalent_term(
        &self,
        value: &TermValue,
        target: usize,
        terms: &TermPool,
    ) -> ModelResult<Option<TermId>> {
        self.closest_term_matching(target, terms, |candidate| candidate.is_equivalent(value))
    }

    /// Occupant nearest to `target`'s cell whose value is the inverse of `value`
    pub fn closest_inverse_term(
        &self,
        value: &TermValue,
        target: usize,
        terms: &TermPool,
    ) -> ModelResult<Option<TermId>> {
        self.closest_term_matching(target, terms, |candidate| candidate.is_inverse(value))
    }

    fn closest_term_matching(
        &self,
        target: usize,
        terms: &TermPool,
        matches: impl Fn(&TermValue) -> bool,
    ) -> ModelResult<Option<TermId>> {
        let target_position = self.cell_position(target)?;
        let mut closest: Option<(TermId, f32)> = None;
        for (index, cell) in self.cells.iter().enumerate() {
            let Some(id) = *cell else { continue };
            let Some(term) = terms.get(id) else { continue };
            if !matches(term.value()) {
                continue;
            }
            let distance = self.center_of(index).distance(target_position);
            if closest.is_none_or(|(_, best)| distance < best) {
                closest = Some((id, distance));
            }
        }
        Ok(closest.map(|(id, _)| id))
    }

    /// Place a term in an empty cell and snap it to the cell center
    pub fn put_term(&mut self, term: TermId, index: usize, terms: &mut TermPool) -> ModelResult<()> {
        self.check_index(index)?;
        if self.cells[index].is_some() {
            return Err(ModelError::CellOccupied(index));
        }
        let center = self.center_of(index);
        terms.try_get_mut(term)?.move_to(center);
        self.cells[index] = Some(term);
        Ok(())
    }

    /// Remove a term and let the terms above it fall. Returns the vacated cell.
    pub fn remove_term(&mut self, term: TermId, terms: &mut TermPool) -> ModelResult<usize> {
        let index = self
            .cell_for_term(term)
            .ok_or(ModelError::TermNotInGrid(term))?;
        self.cells[index] = None;
        self.compact_column(index % self.columns, terms)?;
        Ok(index)
    }

    /// Close gaps in a column, keeping the terms' top-to-bottom order
    pub fn compact_column(&mut self, column: usize, terms: &mut TermPool) -> ModelResult<()> {
        let mut occupants = Vec::new();
        let mut gap = false;
        for row in 0..self.rows {
            let index = self.cell_at(row, column)?;
            match self.cells[index] {
                Some(id) => occupants.push(id),
                None if !occupants.is_empty() => gap = true,
                None => {}
            }
        }
        if !gap {
            return Ok(());
        }

        for row in 0..self.rows {
            let index = self.cell_at(row, column)?;
            self.cells[index] = None;
        }
        let first_row = self.rows - occupants.len();
        for (offset, id) in occupants.into_iter().enumerate() {
            let index = self.cell_at(first_row + offset, column)?;
            self.put_term(id, index, terms)?;
        }
        Ok(())
    }

    /// Empty cell nearest to `point`, preferring the lowest empty cell in
    /// that cell's column so terms land at the bottom. `None` if full.
    pub fn best_empty_cell(&self, point: Vec2) -> Option<usize> {
        let mut closest: Option<(usize, f32)> = None;
        for index in (0..self.cells.len()).rev() {
            if self.cells[index].is_some() {
                continue;
            }
            let distance = self.center_of(index).distance(point);
            // <= while scanning backward: the lowest index wins a tie
            if closest.is_none_or(|(_, best)| distance <= best) {
                closest = Some((index, distance));
            }
        }

        let (index, _) = closest?;
        let row = index / self.columns;
        let column = index % self.columns;
        for below in (row + 1..self.rows).rev() {
            let candidate = below * self.columns + column;
            if self.cells[candidate].is_none() {
                return Some(candidate);
            }
        }
        Some(index)
    }

    /// Cells used by combine-mode creators, centered in the bottom row and
    /// continuing upward when there are more creators than columns
    pub fn like_terms_cells(&self, count: usize) -> ModelResult<Vec<usize>> {
        let first_row_count = count.min(self.columns);
        let offset = (self.columns - first_row_count) / 2;
        (0..count)
            .map(|i| {
                let row_from_bottom = i / self.columns;
                let column = if row_from_bottom == 0 { offset + i } else { i % self.columns };
                let row = self
                    .rows
                    .checked_sub(1 + row_from_bottom)
                    .ok_or(ModelError::InvalidRowColumn {
                        row: row_from_bottom,
                        column,
                        rows: self.rows,
                        columns: self.columns,
                    })?;
                self.cell_at(row, column)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fraction::Fraction;
    use crate::model::term::{Term, TermOptions};
    use crate::model::term_creator::CreatorId;
    use proptest::prelude::*;

    fn grid(rows: usize, columns: usize) -> Grid {
        Grid::new(rows, columns, 10.0, 10.0, Vec2::new(0.0, 100.0))
    }

    fn add_constant(pool: &mut TermPool, value: i64) -> TermId {
        let options = TermOptions {
            value: TermValue::Constant {
                value: Fraction::from(value),
            },
            diameter: 8.0,
        };
        pool.insert_with(|id| Term::new(id, CreatorId(0), options, Vec2::ZERO))
    }

    #[test]
    fn test_cell_addressing() {
        let g = grid(3, 4);
        assert_eq!(g.cell_at(2, 3).unwrap(), 11);
        assert_eq!(g.row_of(6).unwrap(), 1);
        assert_eq!(g.column_of(6).unwrap(), 2);
        assert!(matches!(g.cell_at(3, 0), Err(ModelError::InvalidRowColumn { .. })));
        assert!(matches!(g.is_empty_cell(12), Err(ModelError::InvalidCell { .. })));
    }

    #[test]
    fn test_geometry() {
        let g = grid(2, 2);
        // 20x20 grid sitting on y=100, centered on x=0
        assert_eq!(g.bounds(), Bounds::new(Vec2::new(-10.0, 80.0), Vec2::new(10.0, 100.0)));
        assert_eq!(g.cell_position(0).unwrap(), Vec2::new(-5.0, 85.0));
        assert_eq!(g.cell_position(3).unwrap(), Vec2::new(5.0, 95.0));
        // The far edges clamp into the last row/column
        assert_eq!(g.cell_at_position(Vec2::new(10.0, 100.0)), Some(3));
        assert_eq!(g.cell_at_position(Vec2::new(10.1, 100.0)), None);
    }

    #[test]
    fn test_put_term_snaps_position_and_rejects_occupied() {
        let mut pool = TermPool::new();
        let mut g = grid(2, 2);
        let a = add_constant(&mut pool, 1);
        let b = add_constant(&mut pool, 2);
        g.put_term(a, 2, &mut pool).unwrap();
        assert_eq!(pool.get(a).unwrap().position, g.cell_position(2).unwrap());
        assert_eq!(g.put_term(b, 2, &mut pool), Err(ModelError::CellOccupied(2)));
        assert_eq!(g.cell_for_term(a), Some(2));
        assert_eq!(g.term_at_position(Vec2::new(-5.0, 95.0)), Some(a));
    }

    #[test]
    fn test_remove_compacts_column() {
        let mut pool = TermPool::new();
        let mut g = grid(4, 1);
        let ids: Vec<_> = (1..=4).map(|v| add_constant(&mut pool, v)).collect();
        for (row, id) in ids.iter().enumerate() {
            g.put_term(*id, row, &mut pool).unwrap();
        }
        // Remove the third from the top; the two above fall by one row
        assert_eq!(g.remove_term(ids[2], &mut pool).unwrap(), 2);
        assert_eq!(g.term_in_cell(0).unwrap(), None);
        assert_eq!(g.term_in_cell(1).unwrap(), Some(ids[0]));
        assert_eq!(g.term_in_cell(2).unwrap(), Some(ids[1]));
        assert_eq!(g.term_in_cell(3).unwrap(), Some(ids[3]));
        assert_eq!(pool.get(ids[0]).unwrap().position, g.cell_position(1).unwrap());
    }

    #[test]
    fn test_best_empty_cell_falls_to_bottom() {
        let mut pool = TermPool::new();
        let mut g = grid(3, 3);
        let a = add_constant(&mut pool, 1);
        g.put_term(a, 7, &mut pool).unwrap(); // bottom-middle
        // Aim at the top-left cell: the best cell is the bottom of column 0
        let top_left = g.cell_position(0).unwrap();
        assert_eq!(g.best_empty_cell(top_left), Some(6));
        // Aim at the top-middle: column 1's lowest empty cell is row 1
        let top_middle = g.cell_position(1).unwrap();
        assert_eq!(g.best_empty_cell(top_middle), Some(4));
    }

    #[test]
    fn test_best_empty_cell_tie_goes_to_lowest_index() {
        let g = grid(1, 2);
        // Exactly between the two cells
        assert_eq!(g.best_empty_cell(Vec2::new(0.0, 95.0)), Some(0));
    }

    #[test]
    fn test_best_empty_cell_none_when_full() {
        let mut pool = TermPool::new();
        let mut g = grid(1, 1);
        let a = add_constant(&mut pool, 1);
        g.put_term(a, 0, &mut pool).unwrap();
        assert!(g.is_full());
        assert_eq!(g.best_empty_cell(Vec2::new(0.0, 95.0)), None);
    }

    #[test]
    fn test_closest_equivalent_term() {
        let mut pool = TermPool::new();
        let mut g = grid(1, 5);
        let far = add_constant(&mut pool, 2);
        let other = add_constant(&mut pool, 3);
        let near = add_constant(&mut pool, 2);
        g.put_term(far, 0, &mut pool).unwrap();
        g.put_term(other, 3, &mut pool).unwrap();
        g.put_term(near, 4, &mut pool).unwrap();
        let two = *pool.get(far).unwrap().value();
        assert_eq!(g.closest_equivalent_term(&two, 3, &pool).unwrap(), Some(near));
        // Equidistant from cell 2: lowest index wins
        let mut g2 = grid(1, 5);
        g2.put_term(far, 0, &mut pool).unwrap();
        g2.put_term(near, 4, &mut pool).unwrap();
        assert_eq!(g2.closest_equivalent_term(&two, 2, &pool).unwrap(), Some(far));
        let minus_two = two.negated();
        assert_eq!(g.closest_inverse_term(&minus_two, 0, &pool).unwrap(), Some(far));
    }

    #[test]
    fn test_like_terms_cells_centered_in_bottom_row() {
        let g = grid(6, 6);
        assert_eq!(g.like_terms_cells(2).unwrap(), vec![32, 33]);
        let narrow = grid(2, 2);
        assert_eq!(narrow.like_terms_cells(3).unwrap(), vec![2, 3, 0]);
    }

    proptest! {
        /// Removing any term from a full-height stack drops everything above it by one row
        #[test]
        fn prop_compaction_preserves_order(rows in 1usize..8, filled in 1usize..8, remove_at in 0usize..8) {
            let filled = filled.min(rows);
            let remove_at = remove_at % filled;
            let mut pool = TermPool::new();
            let mut g = grid(rows, 1);
            let ids: Vec<_> = (0..filled).map(|v| add_constant(&mut pool, v as i64 + 1)).collect();
            // Stack from the bottom, top-most first in `ids`
            let first_row = rows - filled;
            for (offset, id) in ids.iter().enumerate() {
                g.put_term(*id, first_row + offset, &mut pool).unwrap();
            }
            g.remove_term(ids[remove_at], &mut pool).unwrap();

            for (offset, id) in ids.iter().enumerate() {
                let expected_row = if offset < remove_at {
                    first_row + offset + 1
                } else if offset > remove_at {
                    first_row + offset
                } else {
                    continue;
                };
                prop_assert_eq!(g.cell_for_term(*id), Some(expected_row));
            }
            // Gravity: no empty cell below an occupied one
            let mut seen_occupied = false;
            for row in 0..rows {
                let occupied = !g.is_empty_cell(row).unwrap();
                prop_assert!(!(seen_occupied && !occupied));
                seen_occupied |= occupied;
            }
        }
    }
}
