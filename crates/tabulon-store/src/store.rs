//! The sparse cell store.

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;
use tabulon_common::{CellKey, CellRange, CellSource, CellValue, CellNavigation, DimensionProvider, Direction};
use tracing::debug;

use crate::error::StoreError;
use crate::record::{CellRecord, ColInfo, RowInfo};
use crate::used_range::UsedRange;

/// Sparse, in-memory grid. Only non-empty cells are stored; side indexes are
/// kept in lock-step with the primary map so every present `(r, c)` has a
/// matching entry in both `row_index` and `col_index`.
#[derive(Debug, Default)]
pub struct CellStore {
    cells: FxHashMap<CellKey, CellRecord>,
    row_index: FxHashMap<u32, BTreeSet<u32>>,
    col_index: FxHashMap<u32, BTreeSet<u32>>,
    rows: FxHashMap<u32, RowInfo>,
    cols: FxHashMap<u32, ColInfo>,
    used_range: UsedRange,
}

impl CellStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- basic access -----------------------------------------------

    pub fn get(&self, row: u32, col: u32) -> Option<&CellRecord> {
        let key = CellKey::try_new(row, col).ok()?;
        self.cells.get(&key)
    }

    pub fn has(&self, row: u32, col: u32) -> bool {
        self.get(row, col).is_some()
    }

    /// Write `record`, or delete the cell if `record` is `None`. An empty
    /// record (per `CellRecord::is_empty`) is treated as a delete — empty
    /// cells are never stored.
    pub fn set(&mut self, row: u32, col: u32, record: Option<CellRecord>) -> Result<(), StoreError> {
        let key = CellKey::try_new(row, col)
            .map_err(|e| StoreError::invalid(Some(row), Some(col), e.to_string()))?;

        match record {
            None => self.delete_key(key),
            Some(record) if record.is_empty() => self.delete_key(key),
            Some(record) => {
                debug!(row, col, "store.set");
                if self.cells.insert(key, record).is_none() {
                    self.row_index.entry(row).or_default().insert(col);
                    self.col_index.entry(col).or_default().insert(row);
                }
                self.used_range.include(row, col);
            }
        }
        Ok(())
    }

    pub fn delete(&mut self, row: u32, col: u32) {
        if let Ok(key) = CellKey::try_new(row, col) {
            self.delete_key(key);
        }
    }

    fn delete_key(&mut self, key: CellKey) {
        let (row, col) = key.into();
        if self.cells.remove(&key).is_some() {
            debug!(row, col, "store.delete");
            if let Some(set) = self.row_index.get_mut(&row) {
                set.remove(&col);
                if set.is_empty() {
                    self.row_index.remove(&row);
                }
            }
            if let Some(set) = self.col_index.get_mut(&col) {
                set.remove(&row);
                if set.is_empty() {
                    self.col_index.remove(&col);
                }
            }
            if self.used_range.touches_boundary(row, col) {
                self.used_range.dirty = true;
            }
        }
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.row_index.clear();
        self.col_index.clear();
        self.rows.clear();
        self.cols.clear();
        self.used_range = UsedRange::EMPTY;
    }

    // ---- range operations ---------------------------------------------

    /// Chooses between iterating the rectangle and iterating all cells,
    /// whichever is smaller, per the store's range-iteration rule.
    pub fn get_range(&self, range: &CellRange) -> Vec<(CellKey, &CellRecord)> {
        let rect_size = range.width() as u64 * range.height() as u64;
        if rect_size <= self.cells.len() as u64 {
            range
                .iter()
                .filter_map(|key| self.cells.get(&key).map(|r| (key, r)))
                .collect()
        } else {
            self.cells
                .iter()
                .filter(|(key, _)| range.contains(**key))
                .map(|(k, r)| (*k, r))
                .collect()
        }
    }

    pub fn clear_range(&mut self, range: &CellRange) {
        let keys: Vec<CellKey> = self.get_range(range).into_iter().map(|(k, _)| k).collect();
        for key in keys {
            self.delete_key(key);
        }
    }

    pub fn cells_in_row(&self, row: u32) -> Vec<(CellKey, &CellRecord)> {
        self.row_index
            .get(&row)
            .into_iter()
            .flat_map(|cols| cols.iter())
            .filter_map(|&col| CellKey::try_new(row, col).ok().map(|k| (k, &self.cells[&k])))
            .collect()
    }

    pub fn cells_in_column(&self, col: u32) -> Vec<(CellKey, &CellRecord)> {
        self.col_index
            .get(&col)
            .into_iter()
            .flat_map(|rows| rows.iter())
            .filter_map(|&row| CellKey::try_new(row, col).ok().map(|k| (k, &self.cells[&k])))
            .collect()
    }

    pub fn iterate_cells(&self) -> impl Iterator<Item = (CellKey, &CellRecord)> {
        self.cells.iter().map(|(k, r)| (*k, r))
    }

    // ---- structural ops --------------------------------------------------

    /// Shift every key with `row >= at` down by `count` rows. Keys whose new
    /// row would exceed `MAX_ROWS` are dropped. Iterates in descending row
    /// order to avoid overwriting not-yet-moved entries.
    pub fn insert_rows(&mut self, at: u32, count: u32) -> Result<(), StoreError> {
        if at >= tabulon_common::MAX_ROWS {
            return Err(StoreError::invalid(Some(at), None, "row out of range"));
        }
        if count == 0 {
            return Ok(());
        }
        let mut keys: Vec<CellKey> = self
            .cells
            .keys()
            .copied()
            .filter(|k| k.row() >= at)
            .collect();
        keys.sort_by(|a, b| b.row().cmp(&a.row()));

        for key in keys {
            let record = self.cells.remove(&key).expect("key collected from map");
            let (row, col) = key.into();
            self.remove_from_indexes(row, col);
            if let Some(new_row) = row.checked_add(count).filter(|r| *r < tabulon_common::MAX_ROWS) {
                let new_key = CellKey::new(new_row, col);
                self.cells.insert(new_key, record);
                self.row_index.entry(new_row).or_default().insert(col);
                self.col_index.entry(col).or_default().insert(new_row);
            }
        }

        self.shift_row_info(at, count as i64);
        self.used_range.dirty = true;
        debug!(at, count, "store.insert_rows");
        Ok(())
    }

    pub fn delete_rows(&mut self, at: u32, count: u32) -> Result<(), StoreError> {
        if at >= tabulon_common::MAX_ROWS {
            return Err(StoreError::invalid(Some(at), None, "row out of range"));
        }
        if count == 0 {
            return Ok(());
        }
        let removed: Vec<CellKey> = self
            .cells
            .keys()
            .copied()
            .filter(|k| k.row() >= at && k.row() < at + count)
            .collect();
        for key in removed {
            self.delete_key(key);
        }

        let mut keys: Vec<CellKey> = self
            .cells
            .keys()
            .copied()
            .filter(|k| k.row() >= at + count)
            .collect();
        keys.sort_by_key(|k| k.row());

        for key in keys {
            let record = self.cells.remove(&key).expect("key collected from map");
            let (row, col) = key.into();
            self.remove_from_indexes(row, col);
            let new_row = row - count;
            let new_key = CellKey::new(new_row, col);
            self.cells.insert(new_key, record);
            self.row_index.entry(new_row).or_default().insert(col);
            self.col_index.entry(col).or_default().insert(new_row);
        }

        self.shift_row_info(at, -(count as i64));
        self.used_range.dirty = true;
        debug!(at, count, "store.delete_rows");
        Ok(())
    }

    pub fn insert_cols(&mut self, at: u32, count: u32) -> Result<(), StoreError> {
        if at >= tabulon_common::MAX_COLS {
            return Err(StoreError::invalid(None, Some(at), "col out of range"));
        }
        if count == 0 {
            return Ok(());
        }
        let mut keys: Vec<CellKey> = self
            .cells
            .keys()
            .copied()
            .filter(|k| k.col() >= at)
            .collect();
        keys.sort_by(|a, b| b.col().cmp(&a.col()));

        for key in keys {
            let record = self.cells.remove(&key).expect("key collected from map");
            let (row, col) = key.into();
            self.remove_from_indexes(row, col);
            if let Some(new_col) = col.checked_add(count).filter(|c| *c < tabulon_common::MAX_COLS) {
                let new_key = CellKey::new(row, new_col);
                self.cells.insert(new_key, record);
                self.row_index.entry(row).or_default().insert(new_col);
                self.col_index.entry(new_col).or_default().insert(row);
            }
        }

        self.shift_col_info(at, count as i64);
        self.used_range.dirty = true;
        debug!(at, count, "store.insert_cols");
        Ok(())
    }

    pub fn delete_cols(&mut self, at: u32, count: u32) -> Result<(), StoreError> {
        if at >= tabulon_common::MAX_COLS {
            return Err(StoreError::invalid(None, Some(at), "col out of range"));
        }
        if count == 0 {
            return Ok(());
        }
        let removed: Vec<CellKey> = self
            .cells
            .keys()
            .copied()
            .filter(|k| k.col() >= at && k.col() < at + count)
            .collect();
        for key in removed {
            self.delete_key(key);
        }

        let mut keys: Vec<CellKey> = self
            .cells
            .keys()
            .copied()
            .filter(|k| k.col() >= at + count)
            .collect();
        keys.sort_by_key(|k| k.col());

        for key in keys {
            let record = self.cells.remove(&key).expect("key collected from map");
            let (row, col) = key.into();
            self.remove_from_indexes(row, col);
            let new_col = col - count;
            let new_key = CellKey::new(row, new_col);
            self.cells.insert(new_key, record);
            self.row_index.entry(row).or_default().insert(new_col);
            self.col_index.entry(new_col).or_default().insert(row);
        }

        self.shift_col_info(at, -(count as i64));
        self.used_range.dirty = true;
        debug!(at, count, "store.delete_cols");
        Ok(())
    }

    fn remove_from_indexes(&mut self, row: u32, col: u32) {
        if let Some(set) = self.row_index.get_mut(&row) {
            set.remove(&col);
            if set.is_empty() {
                self.row_index.remove(&row);
            }
        }
        if let Some(set) = self.col_index.get_mut(&col) {
            set.remove(&row);
            if set.is_empty() {
                self.col_index.remove(&col);
            }
        }
    }

    fn shift_row_info(&mut self, at: u32, delta: i64) {
        let entries: Vec<(u32, RowInfo)> = self.rows.iter().map(|(r, i)| (*r, *i)).collect();
        self.rows.clear();
        for (row, info) in entries {
            if delta < 0 && row >= at && (row as i64) < at as i64 - delta {
                continue;
            }
            if row >= at {
                let new_row = (row as i64 + delta) as u32;
                self.rows.insert(new_row, info);
            } else {
                self.rows.insert(row, info);
            }
        }
    }

    fn shift_col_info(&mut self, at: u32, delta: i64) {
        let entries: Vec<(u32, ColInfo)> = self.cols.iter().map(|(c, i)| (*c, *i)).collect();
        self.cols.clear();
        for (col, info) in entries {
            if delta < 0 && col >= at && (col as i64) < at as i64 - delta {
                continue;
            }
            if col >= at {
                let new_col = (col as i64 + delta) as u32;
                self.cols.insert(new_col, info);
            } else {
                self.cols.insert(col, info);
            }
        }
    }

    // ---- row/col dimension accessors -----------------------------------

    pub fn row_height(&self, row: u32) -> f64 {
        self.rows.get(&row).copied().unwrap_or_default().height
    }

    pub fn set_row_height(&mut self, row: u32, height: f64) {
        let info = self.rows.entry(row).or_default();
        info.height = height;
        info.custom_height = true;
        if info.is_default() {
            self.rows.remove(&row);
        }
    }

    pub fn is_row_hidden(&self, row: u32) -> bool {
        self.rows.get(&row).map(|i| i.hidden).unwrap_or(false)
    }

    pub fn set_row_hidden(&mut self, row: u32, hidden: bool) {
        let info = self.rows.entry(row).or_default();
        info.hidden = hidden;
        if info.is_default() {
            self.rows.remove(&row);
        }
    }

    pub fn col_width(&self, col: u32) -> f64 {
        self.cols.get(&col).copied().unwrap_or_default().width
    }

    pub fn set_col_width(&mut self, col: u32, width: f64) {
        let info = self.cols.entry(col).or_default();
        info.width = width;
        info.custom_width = true;
        if info.is_default() {
            self.cols.remove(&col);
        }
    }

    pub fn is_col_hidden(&self, col: u32) -> bool {
        self.cols.get(&col).map(|i| i.hidden).unwrap_or(false)
    }

    pub fn set_col_hidden(&mut self, col: u32, hidden: bool) {
        let info = self.cols.entry(col).or_default();
        info.hidden = hidden;
        if info.is_default() {
            self.cols.remove(&col);
        }
    }

    // ---- used range ------------------------------------------------------

    /// The current bounding box. If a prior boundary-touching delete left
    /// the box dirty, this rescans all stored cells before returning.
    pub fn used_range(&mut self) -> UsedRange {
        if self.used_range.dirty {
            self.rescan_used_range();
        }
        self.used_range
    }

    fn rescan_used_range(&mut self) {
        let mut range = UsedRange::EMPTY;
        for key in self.cells.keys() {
            range.include(key.row(), key.col());
        }
        range.dirty = false;
        self.used_range = range;
    }

    // ---- navigation --------------------------------------------------

    pub fn find_next_non_empty(&self, row: u32, col: u32, dir: Direction) -> (u32, u32) {
        let (dr, dc): (i64, i64) = match dir {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        };

        let step = |r: u32, c: u32| -> Option<(u32, u32)> {
            let nr = r as i64 + dr;
            let nc = c as i64 + dc;
            if nr < 0 || nc < 0 || nr as u32 >= tabulon_common::MAX_ROWS || nc as u32 >= tabulon_common::MAX_COLS {
                None
            } else {
                Some((nr as u32, nc as u32))
            }
        };

        let here_has_value = self.has(row, col);
        let mut cur = (row, col);

        if here_has_value {
            let Some(mut next) = step(cur.0, cur.1) else {
                return cur;
            };
            if self.has(next.0, next.1) {
                cur = next;
                loop {
                    let Some(candidate) = step(cur.0, cur.1) else {
                        break;
                    };
                    if self.has(candidate.0, candidate.1) {
                        cur = candidate;
                    } else {
                        break;
                    }
                }
                return cur;
            }
            loop {
                if self.has(next.0, next.1) {
                    return next;
                }
                match step(next.0, next.1) {
                    Some(candidate) => next = candidate,
                    None => return next,
                }
            }
        } else {
            loop {
                match step(cur.0, cur.1) {
                    Some(candidate) => cur = candidate,
                    None => return cur,
                }
                if self.has(cur.0, cur.1) {
                    return cur;
                }
            }
        }
    }

    pub fn find_current_region(&self, row: u32, col: u32) -> Option<CellRange> {
        if !self.has(row, col) {
            return None;
        }
        let mut min_row = row;
        let mut max_row = row;
        let mut min_col = col;
        let mut max_col = col;
        let mut stack = vec![(row, col)];
        let mut visited: std::collections::HashSet<(u32, u32)> = std::collections::HashSet::new();
        visited.insert((row, col));

        while let Some((r, c)) = stack.pop() {
            min_row = min_row.min(r);
            max_row = max_row.max(r);
            min_col = min_col.min(c);
            max_col = max_col.max(c);

            let neighbors = [
                r.checked_sub(1).map(|nr| (nr, c)),
                Some((r + 1, c)),
                c.checked_sub(1).map(|nc| (r, nc)),
                Some((r, c + 1)),
            ];
            for n in neighbors.into_iter().flatten() {
                if !visited.contains(&n) && self.has(n.0, n.1) {
                    visited.insert(n);
                    stack.push(n);
                }
            }
        }

        Some(CellRange::new(
            CellKey::new(min_row, min_col),
            CellKey::new(max_row, max_col),
        ))
    }
}

impl DimensionProvider for CellStore {
    fn row_height(&self, row: u32) -> f64 {
        CellStore::row_height(self, row)
    }

    fn col_width(&self, col: u32) -> f64 {
        CellStore::col_width(self, col)
    }

    fn is_row_hidden(&self, row: u32) -> bool {
        CellStore::is_row_hidden(self, row)
    }

    fn is_col_hidden(&self, col: u32) -> bool {
        CellStore::is_col_hidden(self, col)
    }
}

impl CellSource for CellStore {
    type Cell = CellRecord;

    fn get_cell(&self, row: u32, col: u32) -> Option<CellRecord> {
        self.get(row, col).cloned()
    }
}

impl CellNavigation for CellStore {
    fn find_next_non_empty(&self, row: u32, col: u32, dir: Direction) -> (u32, u32) {
        CellStore::find_next_non_empty(self, row, col, dir)
    }

    fn find_current_region(&self, row: u32, col: u32) -> Option<CellRange> {
        CellStore::find_current_region(self, row, col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_value(store: &mut CellStore, row: u32, col: u32, n: f64) {
        store.set(row, col, Some(CellRecord::new(CellValue::Number(n)))).unwrap();
    }

    #[test]
    fn set_then_get_round_trips() {
        let mut store = CellStore::new();
        set_value(&mut store, 2, 3, 42.0);
        assert_eq!(store.get(2, 3).unwrap().value, CellValue::Number(42.0));
        assert!(store.has(2, 3));
    }

    #[test]
    fn empty_cells_are_never_stored() {
        let mut store = CellStore::new();
        store.set(0, 0, Some(CellRecord::new(CellValue::Null))).unwrap();
        assert!(!store.has(0, 0));
    }

    #[test]
    fn delete_removes_from_side_indexes() {
        let mut store = CellStore::new();
        set_value(&mut store, 1, 1, 1.0);
        store.delete(1, 1);
        assert!(store.row_index.is_empty());
        assert!(store.col_index.is_empty());
    }

    #[test]
    fn used_range_tracks_bounding_box() {
        let mut store = CellStore::new();
        set_value(&mut store, 5, 2, 1.0);
        set_value(&mut store, 1, 9, 1.0);
        let range = store.used_range();
        assert_eq!((range.start_row, range.start_col), (1, 2));
        assert_eq!((range.end_row, range.end_col), (5, 9));
    }

    #[test]
    fn boundary_delete_forces_rescan() {
        let mut store = CellStore::new();
        set_value(&mut store, 0, 0, 1.0);
        set_value(&mut store, 5, 5, 1.0);
        store.delete(5, 5);
        let range = store.used_range();
        assert_eq!((range.end_row, range.end_col), (0, 0));
    }

    #[test]
    fn insert_rows_shifts_keys_down() {
        let mut store = CellStore::new();
        set_value(&mut store, 3, 0, 1.0);
        store.insert_rows(1, 2).unwrap();
        assert!(!store.has(3, 0));
        assert!(store.has(5, 0));
    }

    #[test]
    fn delete_rows_removes_then_shifts_up() {
        let mut store = CellStore::new();
        set_value(&mut store, 1, 0, 1.0);
        set_value(&mut store, 5, 0, 2.0);
        store.delete_rows(1, 2).unwrap();
        assert!(!store.has(1, 0));
        assert!(store.has(3, 0));
    }

    #[test]
    fn find_next_non_empty_skips_gaps() {
        let mut store = CellStore::new();
        set_value(&mut store, 0, 0, 1.0);
        set_value(&mut store, 5, 0, 1.0);
        let found = store.find_next_non_empty(0, 0, Direction::Down);
        assert_eq!(found, (5, 0));
    }

    #[test]
    fn find_current_region_flood_fills_contiguous_block() {
        let mut store = CellStore::new();
        for r in 0..3 {
            for c in 0..2 {
                set_value(&mut store, r, c, 1.0);
            }
        }
        let region = store.find_current_region(1, 1).unwrap();
        assert_eq!(region.start(), CellKey::new(0, 0));
        assert_eq!(region.end(), CellKey::new(2, 1));
    }

    #[test]
    fn find_current_region_none_on_empty_anchor() {
        let store = CellStore::new();
        assert!(store.find_current_region(0, 0).is_none());
    }
}
