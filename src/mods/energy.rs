use crate::mods::lattice::Lattice;

/// Total nearest-neighbor energy with periodic boundaries.
///
/// Each site contributes its bond to the right and its bond downwards, so every
/// bond of the torus is counted exactly once.
pub fn total_energy(lattice: &Lattice) -> f64 {
    let (rows, cols) = (lattice.rows(), lattice.cols());
    let spins = lattice.spins();

    let mut bond_sum: i64 = 0;
    for i in 0..rows {
        let down_row = (i + 1) % rows;
        for j in 0..cols {
            let s = spins[i * cols + j] as i64;
            let right = spins[i * cols + (j + 1) % cols] as i64;
            let down = spins[down_row * cols + j] as i64;
            bond_sum += s * (right + down);
        }
    }

    -lattice.coupling() * bond_sum as f64
}

/// Energy per site.
pub fn energy_per_site(lattice: &Lattice) -> f64 {
    total_energy(lattice) / lattice.size() as f64
}

/// Sum of the neighbor spins of flat site `idx`.
///
/// A neighbor that is the site itself (an axis of length 1) is skipped: its
/// self-bond does not change when the spin flips.
#[inline(always)]
pub fn neighbor_sum(lattice: &Lattice, idx: usize) -> i32 {
    let spins = lattice.spins();
    lattice
        .neibs_of(idx)
        .iter()
        .filter(|&&n| n != idx)
        .map(|&n| spins[n] as i32)
        .sum()
}

/// Energy change caused by flipping site `(i, j)`: `2 J s (sum of neighbors)`.
#[inline(always)]
pub fn local_flip_cost(lattice: &Lattice, i: usize, j: usize) -> f64 {
    assert!(
        i < lattice.rows() && j < lattice.cols(),
        "site ({i}, {j}) out of bounds"
    );
    local_flip_cost_idx(lattice, lattice.rc_to_idx(i, j))
}

#[inline(always)]
pub fn local_flip_cost_idx(lattice: &Lattice, idx: usize) -> f64 {
    let s = lattice.spins()[idx] as i32;
    2.0 * lattice.coupling() * (s * neighbor_sum(lattice, idx)) as f64
}
