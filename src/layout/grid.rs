use eframe::egui::{Pos2, pos2};

use super::LayoutOptions;

/// `(column, row)` of the `index`-th node in a row-major grid of `count`
/// nodes with `ceil(sqrt(count))` columns.
pub fn grid_cell(index: usize, count: usize) -> (usize, usize) {
    let columns = columns_for(count);
    (index % columns, index / columns)
}

fn columns_for(count: usize) -> usize {
    ((count as f64).sqrt().ceil() as usize).max(1)
}

pub(super) fn grid(count: usize, width: f32, height: f32, options: &LayoutOptions) -> Vec<Pos2> {
    if count == 0 {
        return Vec::new();
    }

    let columns = columns_for(count);
    let rows = count.div_ceil(columns);
    let cell_width = (width - options.padding * 2.0).max(1.0) / columns as f32;
    let cell_height = (height - options.padding * 2.0).max(1.0) / rows as f32;

    (0..count)
        .map(|index| {
            let (column, row) = grid_cell(index, count);
            pos2(
                options.padding + (column as f32 + 0.5) * cell_width,
                options.padding + (row as f32 + 0.5) * cell_height,
            )
        })
        .collect()
}
