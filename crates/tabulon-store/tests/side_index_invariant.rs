use proptest::prelude::*;
use tabulon_common::CellValue;
use tabulon_store::{CellRecord, CellStore};

proptest! {
    #[test]
    fn side_indexes_agree_with_primary_map(
        ops in prop::collection::vec((0u32..50, 0u32..50, prop::bool::ANY), 1..200)
    ) {
        let mut store = CellStore::new();
        for (row, col, present) in ops {
            if present {
                store.set(row, col, Some(CellRecord::new(CellValue::Number(1.0)))).unwrap();
            } else {
                store.delete(row, col);
            }
        }

        for row in 0..50u32 {
            for col in 0..50u32 {
                let in_row_index = store
                    .cells_in_row(row)
                    .iter()
                    .any(|(k, _)| k.col() == col);
                let in_col_index = store
                    .cells_in_column(col)
                    .iter()
                    .any(|(k, _)| k.row() == row);
                prop_assert_eq!(store.has(row, col), in_row_index);
                prop_assert_eq!(store.has(row, col), in_col_index);
            }
        }
    }
}
