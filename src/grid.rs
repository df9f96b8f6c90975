//! Toroidal grid of colored cells.

use anyhow::{Context, Result};
use rand::prelude::*;
use rand_distr::{Normal, weighted::WeightedIndex};
use serde::{Deserialize, Serialize};

/// A single colored cell of the grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    row: usize,
    col: usize,
    pub color: usize,
    /// Number of areas whose border runs through this cell.
    pub border_count: u32,
    /// Ids of every area containing this cell.
    pub areas: Vec<usize>,
}

impl Cell {
    pub fn new(row: usize, col: usize, color: usize) -> Self {
        Self {
            row,
            col,
            color,
            border_count: 0,
            areas: Vec::new(),
        }
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn col(&self) -> usize {
        self.col
    }

    pub fn is_border(&self) -> bool {
        self.border_count > 0
    }
}

/// Toroidal grid of `height x width` cells stored in row-major order.
///
/// Holds the global color distribution the initial colors are drawn from and
/// the bias point that centers the color patches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    height: usize,
    width: usize,
    n_colors: usize,
    color_dist: Vec<f64>,
    bias: (f64, f64),
    cells: Vec<Cell>,
}

impl Grid {
    /// Create a grid whose colors are drawn from a fresh global color distribution.
    pub fn generate<R: Rng + ?Sized>(
        height: usize,
        width: usize,
        n_colors: usize,
        heterogeneity: f64,
        rng: &mut R,
    ) -> Result<Self> {
        let color_dist = create_color_distribution(n_colors, heterogeneity, rng)
            .context("failed to create color distribution")?;
        let color_idx = WeightedIndex::new(&color_dist)?;

        let mut cells = Vec::with_capacity(height * width);
        for row in 0..height {
            for col in 0..width {
                cells.push(Cell::new(row, col, color_idx.sample(rng)));
            }
        }

        let bias = (rng.random::<f64>(), rng.random::<f64>());

        Ok(Self {
            height,
            width,
            n_colors,
            color_dist,
            bias,
            cells,
        })
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn n_colors(&self) -> usize {
        self.n_colors
    }

    pub fn color_dist(&self) -> &[f64] {
        &self.color_dist
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, idx: usize) -> &Cell {
        &self.cells[idx]
    }

    pub fn cell_mut(&mut self, idx: usize) -> &mut Cell {
        &mut self.cells[idx]
    }

    /// Index of the cell at `(row, col)`, wrapping around both axes.
    pub fn idx(&self, row: usize, col: usize) -> usize {
        (row % self.height) * self.width + col % self.width
    }

    /// Indices of the 8 toroidal Moore neighbors of a cell.
    pub fn moore_neighbors(&self, idx: usize) -> [usize; 8] {
        let row = idx / self.width;
        let col = idx % self.width;
        let up = row + self.height - 1;
        let left = col + self.width - 1;
        [
            self.idx(up, left),
            self.idx(up, col),
            self.idx(up, col + 1),
            self.idx(row, left),
            self.idx(row, col + 1),
            self.idx(row + 1, left),
            self.idx(row + 1, col),
            self.idx(row + 1, col + 1),
        ]
    }

    /// Turn uniformly random colors into spatially clustered patches.
    ///
    /// The further a cell lies from the bias point the more likely it is
    /// redrawn from the global distribution; otherwise it takes the most
    /// common color of its neighbors. `patch_power` widens the region around
    /// the bias point where patches form.
    pub fn color_patches<R: Rng + ?Sized>(
        &mut self,
        steps: usize,
        patch_power: f64,
        rng: &mut R,
    ) -> Result<()> {
        if steps == 0 {
            return Ok(());
        }
        let gauss = Normal::new(0.0, patch_power).context("invalid patch power")?;
        let color_idx = WeightedIndex::new(&self.color_dist)?;

        let mut order: Vec<usize> = (0..self.cells.len()).collect();
        let mut counts = vec![0usize; self.n_colors];
        for _ in 0..steps {
            order.shuffle(rng);
            for &idx in &order {
                let cell = &self.cells[idx];
                let norm_row = cell.row as f64 / self.height as f64;
                let norm_col = cell.col as f64 / self.width as f64;
                let bias_factor = (norm_row - self.bias.0).abs() + (norm_col - self.bias.1).abs();

                let color = if gauss.sample(rng).abs() < bias_factor {
                    color_idx.sample(rng)
                } else {
                    counts.fill(0);
                    for nbr in self.moore_neighbors(idx) {
                        counts[self.cells[nbr].color] += 1;
                    }
                    let max_count = counts.iter().copied().max().unwrap_or(0);
                    let tied: Vec<usize> = (0..self.n_colors)
                        .filter(|&color| counts[color] == max_count)
                        .collect();
                    *tied.choose(rng).context("no neighbor colors")?
                };
                self.cells[idx].color = color;
            }
        }

        Ok(())
    }
}

/// Global color distribution with a spread set by `heterogeneity`.
///
/// Each color gets weight `|N(1, heterogeneity)|` before normalizing, so `0`
/// yields a uniform distribution.
pub fn create_color_distribution<R: Rng + ?Sized>(
    n_colors: usize,
    heterogeneity: f64,
    rng: &mut R,
) -> Result<Vec<f64>> {
    let gauss = Normal::new(1.0, heterogeneity).context("invalid heterogeneity")?;
    let mut dist: Vec<f64> = (0..n_colors).map(|_| gauss.sample(rng).abs()).collect();
    let total: f64 = dist.iter().sum();
    if total > 0.0 {
        dist.iter_mut().for_each(|val| *val /= total);
    } else {
        dist.fill(1.0 / n_colors as f64);
    }
    Ok(dist)
}
