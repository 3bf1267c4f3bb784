use crate::mods::{
    constants::{SPIN_DOWN, SPIN_UP},
    error::{SimError, SimResult},
};
use rand::Rng;

/// Periodic 2D spin lattice with a precomputed neighbor table.
///
/// Sites are stored row-major: site `(i, j)` lives at `i * cols + j`.
/// Every entry of `spins` is always `-1` or `+1`.
#[derive(Debug, Clone, PartialEq)]
pub struct Lattice {
    rows: usize,
    cols: usize,
    size: usize,
    coupling: f64,
    spins: Box<[i8]>,
    // up, down, left, right
    neibs: Box<[[usize; 4]]>,
}

impl Lattice {
    /// Create a lattice with every site drawn uniformly from {-1, +1}.
    pub fn new<R: Rng + ?Sized>(
        rows: usize,
        cols: usize,
        coupling: f64,
        rng: &mut R,
    ) -> SimResult<Self> {
        Self::check_params(rows, cols, coupling)?;

        let spins = (0..rows * cols)
            .map(|_| if rng.random_bool(0.5) { SPIN_UP } else { SPIN_DOWN })
            .collect::<Vec<_>>();

        Ok(Self::build(rows, cols, coupling, spins.into_boxed_slice()))
    }

    /// Create a lattice from an explicit row-major spin buffer.
    pub fn from_spins(rows: usize, cols: usize, coupling: f64, spins: Vec<i8>) -> SimResult<Self> {
        Self::check_params(rows, cols, coupling)?;

        if spins.len() != rows * cols {
            return Err(SimError::ShapeMismatch {
                rows,
                cols,
                len: spins.len(),
            });
        }
        if let Some(&bad) = spins.iter().find(|&&s| !is_valid_spin(s)) {
            return Err(SimError::InvalidSpin(bad));
        }

        Ok(Self::build(rows, cols, coupling, spins.into_boxed_slice()))
    }

    /// Create a lattice with every site set to `value`.
    pub fn uniform(rows: usize, cols: usize, coupling: f64, value: i8) -> SimResult<Self> {
        if !is_valid_spin(value) {
            return Err(SimError::InvalidSpin(value));
        }
        Self::check_params(rows, cols, coupling)?;
        Self::from_spins(rows, cols, coupling, vec![value; rows * cols])
    }

    fn check_params(rows: usize, cols: usize, coupling: f64) -> SimResult<()> {
        check_shape(rows, cols)?;
        if !coupling.is_finite() {
            return Err(SimError::InvalidCoupling(coupling));
        }
        Ok(())
    }

    fn build(rows: usize, cols: usize, coupling: f64, spins: Box<[i8]>) -> Self {
        let size = rows * cols;
        let mut lattice = Self {
            rows,
            cols,
            size,
            coupling,
            spins,
            neibs: vec![[0; 4]; size].into_boxed_slice(),
        };
        lattice.precomp_neibs();
        lattice
    }

    fn precomp_neibs(&mut self) {
        let (rows, cols) = (self.rows, self.cols);

        for idx in 0..self.size {
            let (i, j) = self.idx_to_rc(idx);
            let up = (i + rows - 1) % rows;
            let down = (i + 1) % rows;
            let left = (j + cols - 1) % cols;
            let right = (j + 1) % cols;

            self.neibs[idx] = [
                up * cols + j,
                down * cols + j,
                i * cols + left,
                i * cols + right,
            ];
        }
    }

    #[inline(always)]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline(always)]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline(always)]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline(always)]
    pub fn coupling(&self) -> f64 {
        self.coupling
    }

    /// Row-major view of all spins.
    #[inline(always)]
    pub fn spins(&self) -> &[i8] {
        &self.spins
    }

    /// Spins of row `i`.
    pub fn row(&self, i: usize) -> &[i8] {
        &self.spins[i * self.cols..(i + 1) * self.cols]
    }

    #[inline(always)]
    pub fn rc_to_idx(&self, i: usize, j: usize) -> usize {
        i * self.cols + j
    }

    #[inline(always)]
    pub fn idx_to_rc(&self, idx: usize) -> (usize, usize) {
        (idx / self.cols, idx % self.cols)
    }

    /// Flat indices of the four periodic neighbors of flat site `idx`.
    #[inline(always)]
    pub fn neibs_of(&self, idx: usize) -> &[usize; 4] {
        &self.neibs[idx]
    }

    /// Spin at `(i, j)`. Panics when the site lies outside the lattice.
    #[inline(always)]
    pub fn get(&self, i: usize, j: usize) -> i8 {
        assert!(i < self.rows && j < self.cols, "site ({i}, {j}) out of bounds");
        self.spins[self.rc_to_idx(i, j)]
    }

    pub fn set(&mut self, i: usize, j: usize, value: i8) -> SimResult<()> {
        if i >= self.rows || j >= self.cols {
            return Err(SimError::SiteOutOfBounds {
                i,
                j,
                rows: self.rows,
                cols: self.cols,
            });
        }
        if !is_valid_spin(value) {
            return Err(SimError::InvalidSpin(value));
        }

        let idx = self.rc_to_idx(i, j);
        self.spins[idx] = value;
        Ok(())
    }

    /// Toggle the spin at flat index `idx`.
    #[inline(always)]
    pub fn flip_idx(&mut self, idx: usize) {
        self.spins[idx] = -self.spins[idx];
    }

    #[inline(always)]
    pub fn flip(&mut self, i: usize, j: usize) {
        assert!(i < self.rows && j < self.cols, "site ({i}, {j}) out of bounds");
        let idx = self.rc_to_idx(i, j);
        self.flip_idx(idx);
    }

    /// The four sites adjacent to `(i, j)` under periodic wraparound, ordered
    /// up, down, left, right.
    pub fn neighbors(&self, i: usize, j: usize) -> [(usize, usize); 4] {
        assert!(i < self.rows && j < self.cols, "site ({i}, {j}) out of bounds");
        self.neibs[self.rc_to_idx(i, j)].map(|n| self.idx_to_rc(n))
    }

    /// Sum of all spins.
    pub fn total_spin(&self) -> i64 {
        self.spins.iter().map(|&s| s as i64).sum()
    }

    /// Mean spin value, in [-1, 1].
    pub fn magnetization(&self) -> f64 {
        self.total_spin() as f64 / self.size as f64
    }
}

/// Both dimensions positive and `rows * cols` addressable.
pub fn check_shape(rows: usize, cols: usize) -> SimResult<usize> {
    match rows.checked_mul(cols) {
        Some(size) if size > 0 => Ok(size),
        _ => Err(SimError::InvalidShape { rows, cols }),
    }
}

#[inline(always)]
pub fn is_valid_spin(value: i8) -> bool {
    value == SPIN_UP || value == SPIN_DOWN
}
