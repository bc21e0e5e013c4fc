use std::ops::Sub;

/// 3D coordinate vector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Coordinate {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Squared Euclidean norm
    pub fn norm_squared(&self) -> f64 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }
}

impl Sub for Coordinate {
    type Output = Coordinate;

    fn sub(self, rhs: Coordinate) -> Coordinate {
        Coordinate::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

/// Box bounds as written under `ITEM: BOX BOUNDS`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationBox {
    pub low: [f64; 3],
    pub high: [f64; 3],
    /// Tilt factors (xy, xz, yz) for triclinic boxes
    pub tilt: Option<[f64; 3]>,
}

impl SimulationBox {
    /// Map fractional (`xs ys zs`) coordinates back to box units.
    ///
    /// For triclinic boxes the stored bounds are the bounding box of the
    /// tilted cell, so the cell origin and edge lengths are recovered first.
    pub fn unscale(&self, s: Coordinate) -> Coordinate {
        let [xy, xz, yz] = self.tilt.unwrap_or([0.0; 3]);

        let xlo = self.low[0] - 0.0f64.min(xy).min(xz).min(xy + xz);
        let xhi = self.high[0] - 0.0f64.max(xy).max(xz).max(xy + xz);
        let ylo = self.low[1] - 0.0f64.min(yz);
        let yhi = self.high[1] - 0.0f64.max(yz);
        let zlo = self.low[2];
        let zhi = self.high[2];

        Coordinate::new(
            xlo + s.x * (xhi - xlo) + s.y * xy + s.z * xz,
            ylo + s.y * (yhi - ylo) + s.z * yz,
            zlo + s.z * (zhi - zlo),
        )
    }
}

/// One timestep of a trajectory.
///
/// Per-particle columns are `Some` only when the dump schema declares them.
/// When ids are present every column is ordered by ascending id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub step: i64,
    pub particle_count: usize,
    pub sim_box: Option<SimulationBox>,
    pub ids: Option<Vec<i64>>,
    pub type_ids: Option<Vec<i64>>,
    pub molecules: Option<Vec<i64>>,
    pub charges: Option<Vec<f64>>,
    pub masses: Option<Vec<f64>>,
    pub positions: Option<Vec<Coordinate>>,
    pub velocities: Option<Vec<Coordinate>>,
    pub images: Option<Vec<[i64; 3]>>,
}

impl Snapshot {
    /// Snapshot carrying only positions, mostly useful for building fixtures
    pub fn from_positions(step: i64, positions: Vec<Coordinate>) -> Self {
        Self {
            step,
            particle_count: positions.len(),
            positions: Some(positions),
            ..Default::default()
        }
    }

    /// Reorder every per-particle column by ascending particle id
    pub(crate) fn sort_by_id(&mut self) {
        let ids = match &self.ids {
            Some(ids) => ids,
            None => return,
        };
        if ids.windows(2).all(|w| w[0] <= w[1]) {
            return;
        }

        let mut order: Vec<usize> = (0..ids.len()).collect();
        order.sort_by_key(|&i| ids[i]);

        fn permute<T: Clone>(column: &mut Option<Vec<T>>, order: &[usize]) {
            if let Some(values) = column.as_mut() {
                *values = order.iter().map(|&i| values[i].clone()).collect();
            }
        }

        permute(&mut self.ids, &order);
        permute(&mut self.type_ids, &order);
        permute(&mut self.molecules, &order);
        permute(&mut self.charges, &order);
        permute(&mut self.masses, &order);
        permute(&mut self.positions, &order);
        permute(&mut self.velocities, &order);
        permute(&mut self.images, &order);
    }
}
