#![no_std]

//! Row-major grid helpers for N-in-a-row games (tic-tac-toe, connect four,
//! gomoku and the local boards of ultimate tic-tac-toe).
//!
//! Cells are any `Copy + PartialEq` value; the caller decides what "empty"
//! looks like and which value it is scanning for.

/// The four line directions as (d_row, d_col). Opposite directions are
/// covered by walking each one both ways.
pub const DIRECTIONS: [(i32, i32); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

/// Returns true if `who` owns `line_size` consecutive cells anywhere on the grid.
///
/// # Arguments
/// * `cells` - The board data as a flat row-major slice
/// * `width` - Board width
/// * `height` - Board height
/// * `who` - The cell value to look for
/// * `line_size` - Number of consecutive cells needed
pub fn check_line_win<T: Copy + PartialEq>(
    cells: &[T],
    width: usize,
    height: usize,
    who: T,
    line_size: usize,
) -> bool {
    if line_size == 0 || cells.len() < width * height {
        return false;
    }
    (0..height).any(|row| {
        (0..width).any(|col| {
            cells[row * width + col] == who
                && DIRECTIONS.iter().any(|&(dr, dc)| {
                    run_from(cells, width, height, row, col, dr, dc, who) >= line_size
                })
        })
    })
}

/// Length of the longest line of `who` passing through (row, col).
///
/// Returns 0 when the cell itself does not hold `who`. Checking only the
/// cell that was just played is enough to detect a fresh win.
pub fn longest_run_through<T: Copy + PartialEq>(
    cells: &[T],
    width: usize,
    height: usize,
    row: usize,
    col: usize,
    who: T,
) -> usize {
    if row >= height || col >= width || cells[row * width + col] != who {
        return 0;
    }
    DIRECTIONS
        .iter()
        .map(|&(dr, dc)| {
            run_from(cells, width, height, row, col, dr, dc, who)
                + run_from(cells, width, height, row, col, -dr, -dc, who)
                - 1
        })
        .max()
        .unwrap_or(0)
}

/// Counts consecutive `who` cells starting at (row, col) and stepping by (dr, dc).
#[allow(clippy::too_many_arguments)]
fn run_from<T: Copy + PartialEq>(
    cells: &[T],
    width: usize,
    height: usize,
    row: usize,
    col: usize,
    dr: i32,
    dc: i32,
    who: T,
) -> usize {
    let (w, h) = (width as i32, height as i32);
    let (mut r, mut c) = (row as i32, col as i32);
    let mut count = 0;
    while r >= 0 && c >= 0 && r < h && c < w && cells[(r * w + c) as usize] == who {
        count += 1;
        r += dr;
        c += dc;
    }
    count
}

/// Visits every window of `line_size` consecutive cells on the grid, in all
/// four directions, handing the window's cell indices to `visit`.
///
/// Used by static evaluators that score partially filled lines.
pub fn for_each_window<F: FnMut(&[usize])>(
    width: usize,
    height: usize,
    line_size: usize,
    mut visit: F,
) {
    if line_size == 0 || line_size > 16 {
        return;
    }
    let mut window = [0usize; 16];
    let (w, h, n) = (width as i32, height as i32, line_size as i32);
    for row in 0..h {
        for col in 0..w {
            for &(dr, dc) in DIRECTIONS.iter() {
                let end_r = row + dr * (n - 1);
                let end_c = col + dc * (n - 1);
                if end_r < 0 || end_r >= h || end_c < 0 || end_c >= w {
                    continue;
                }
                for k in 0..n {
                    window[k as usize] = ((row + dr * k) * w + (col + dc * k)) as usize;
                }
                visit(&window[..line_size]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_diagonal_line() {
        let mut cells = [0i8; 16];
        for i in 0..4 {
            cells[i * 4 + i] = 1;
        }
        assert!(check_line_win(&cells, 4, 4, 1, 4));
        assert!(!check_line_win(&cells, 4, 4, 2, 4));
        assert_eq!(longest_run_through(&cells, 4, 4, 2, 2, 1), 4);
    }

    #[test]
    fn anti_diagonal_run_through_middle() {
        let mut cells = [0i8; 9];
        cells[2] = 1;
        cells[4] = 1;
        cells[6] = 1;
        assert_eq!(longest_run_through(&cells, 3, 3, 1, 1, 1), 3);
        assert!(check_line_win(&cells, 3, 3, 1, 3));
    }

    #[test]
    fn window_count_matches_standard_connect_four() {
        let mut windows = 0;
        for_each_window(7, 6, 4, |_| windows += 1);
        assert_eq!(windows, 69);
    }
}
