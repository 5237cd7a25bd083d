//! Seeded terrain and channel network generation.
//!
//! Everything random about a hydrology domain comes from one
//! [`ChaCha8Rng`] seeded with the `seed` key, drawn in a fixed order:
//! cell elevations, then link positions, then link connectivity, then the
//! link each land cell drains to. Equal seeds give equal domains.

use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::params::HydroParams;

/// Highest generated elevation in metres.
pub const MAX_ELEVATION: f64 = 200.0;

/// Chance that a link other than the first is itself an outlet.
const OUTLET_ODDS: u64 = 8;

/// A generated domain.
#[derive(Clone, Debug, PartialEq)]
pub struct Terrain {
    /// Elevation per land cell, row-major `[ny, nx]`.
    pub elevation: Vec<f64>,
    /// Link x position.
    pub link_x: Vec<f64>,
    /// Link y position.
    pub link_y: Vec<f64>,
    /// Downstream link per link, `None` at outlets.
    pub downstream: Vec<Option<usize>>,
    /// Link each land cell drains into, row-major `[ny, nx]`.
    pub cell_link: Vec<usize>,
}

impl Terrain {
    /// Generate the domain described by `params`.
    ///
    /// Every link drains to a link with a smaller index, so link 0 is always
    /// an outlet and the network is acyclic.
    pub fn generate(params: &HydroParams) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
        let cells = params.land_cells();
        let width = params.nx as f64 * params.dx;
        let height = params.ny as f64 * params.dx;

        let elevation = (0..cells).map(|_| unit(&mut rng) * MAX_ELEVATION).collect();
        let (link_x, link_y) = (0..params.nlinks)
            .map(|_| (unit(&mut rng) * width, unit(&mut rng) * height))
            .unzip();
        let downstream = (0..params.nlinks)
            .map(|k| {
                if k == 0 || rng.next_u64() % OUTLET_ODDS == 0 {
                    None
                } else {
                    Some(below(&mut rng, k))
                }
            })
            .collect();
        let cell_link = (0..cells).map(|_| below(&mut rng, params.nlinks)).collect();

        Self {
            elevation,
            link_x,
            link_y,
            downstream,
            cell_link,
        }
    }

    /// Links with no downstream neighbour, ascending.
    pub fn outlets(&self) -> Vec<usize> {
        self.downstream
            .iter()
            .enumerate()
            .filter_map(|(k, d)| d.is_none().then_some(k))
            .collect()
    }

    /// Flattened `(from, to)` node pairs, one per connected link.
    pub fn edge_nodes(&self) -> Vec<i32> {
        self.downstream
            .iter()
            .enumerate()
            .filter_map(|(k, d)| d.map(|to| [k as i32, to as i32]))
            .flatten()
            .collect()
    }
}

/// Uniform in `[0, 1)` from the top 53 bits.
fn unit(rng: &mut ChaCha8Rng) -> f64 {
    (rng.next_u64() >> 11) as f64 / (1u64 << 53) as f64
}

/// Uniform in `0..n`, `n > 0`.
fn below(rng: &mut ChaCha8Rng, n: usize) -> usize {
    (rng.next_u64() % n as u64) as usize
}
