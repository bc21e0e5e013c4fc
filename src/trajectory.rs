use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{AnalysisError, Result};
use crate::schema::{DumpSchema, SchemaSource};
use crate::structure::{Coordinate, SimulationBox, Snapshot};

/// Read access to the timestep snapshots of one simulation
pub trait Trajectory {
    /// Snapshots in the order they were stored
    fn snapshots(&self) -> &[Snapshot];

    /// File the snapshots came from, if any
    fn source(&self) -> Option<&Path> {
        None
    }
}

impl Trajectory for Vec<Snapshot> {
    fn snapshots(&self) -> &[Snapshot] {
        self
    }
}

impl Trajectory for [Snapshot] {
    fn snapshots(&self) -> &[Snapshot] {
        self
    }
}

/// Trajectory loaded from a LAMMPS dump file
#[derive(Debug, Clone)]
pub struct DumpTrajectory {
    file_path: PathBuf,
    snapshots: Vec<Snapshot>,
}

impl DumpTrajectory {
    /// Read every snapshot of a LAMMPS text dump.
    ///
    /// # Arguments
    /// * `file_path` - Path to the dump file
    /// * `schema` - Column layout, fixed or taken from each `ITEM: ATOMS` header
    ///
    /// # Returns
    /// The trajectory, or the first parse error. A file without snapshots is an error.
    pub fn read(file_path: impl AsRef<Path>, schema: &SchemaSource) -> Result<Self> {
        let file_path = file_path.as_ref().to_path_buf();
        let file = File::open(&file_path).map_err(|source| AnalysisError::Io {
            path: file_path.clone(),
            source,
        })?;

        let snapshots = read_dump(BufReader::new(file), &file_path, schema)?;
        if snapshots.is_empty() {
            return Err(AnalysisError::EmptyTrajectory(file_path));
        }
        debug!("Read {} snapshots from {}", snapshots.len(), file_path.display());

        Ok(Self { file_path, snapshots })
    }
}

impl Trajectory for DumpTrajectory {
    fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    fn source(&self) -> Option<&Path> {
        Some(&self.file_path)
    }
}

/// Line source that remembers where it is, for error messages
struct DumpLines<'a, R: BufRead> {
    lines: Lines<R>,
    line_no: usize,
    path: &'a Path,
}

impl<'a, R: BufRead> DumpLines<'a, R> {
    fn next_line(&mut self) -> Result<Option<String>> {
        match self.lines.next() {
            Some(Ok(line)) => {
                self.line_no += 1;
                Ok(Some(line))
            }
            Some(Err(source)) => Err(AnalysisError::Io {
                path: self.path.to_path_buf(),
                source,
            }),
            None => Ok(None),
        }
    }

    fn expect_line(&mut self, what: &str) -> Result<String> {
        self.next_line()?
            .ok_or_else(|| self.error(format!("unexpected end of file, expected {}", what)))
    }

    fn error(&self, message: String) -> AnalysisError {
        AnalysisError::Parse {
            path: self.path.to_path_buf(),
            line: self.line_no,
            message,
        }
    }

    fn parse_value<T: std::str::FromStr>(&self, token: &str, what: &str) -> Result<T>
    where
        T::Err: std::fmt::Display,
    {
        token
            .parse::<T>()
            .map_err(|e| self.error(format!("invalid {} '{}': {}", what, token, e)))
    }
}

/// Parse LAMMPS text dump content into snapshots, in file order
pub fn read_dump<R: BufRead>(reader: R, path: &Path, schema: &SchemaSource) -> Result<Vec<Snapshot>> {
    let mut lines = DumpLines {
        lines: reader.lines(),
        line_no: 0,
        path,
    };

    let mut snapshots = Vec::new();
    let mut step: Option<i64> = None;
    let mut particle_count: Option<usize> = None;
    let mut sim_box: Option<SimulationBox> = None;

    while let Some(line) = lines.next_line()? {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let item = trimmed
            .strip_prefix("ITEM:")
            .ok_or_else(|| lines.error(format!("expected an ITEM header, got '{}'", trimmed)))?
            .trim();

        if item == "TIMESTEP" {
            let value = lines.expect_line("timestep value")?;
            step = Some(lines.parse_value(value.trim(), "timestep")?);
            particle_count = None;
            sim_box = None;
        } else if item == "NUMBER OF ATOMS" {
            let value = lines.expect_line("atom count")?;
            particle_count = Some(lines.parse_value(value.trim(), "atom count")?);
        } else if let Some(flags) = item.strip_prefix("BOX BOUNDS") {
            let triclinic = flags.split_whitespace().any(|f| f == "xy");
            sim_box = Some(read_box(&mut lines, triclinic)?);
        } else if let Some(header) = item.strip_prefix("ATOMS") {
            let step_value = step
                .take()
                .ok_or_else(|| lines.error("ATOMS section before TIMESTEP".to_string()))?;
            let count = particle_count
                .ok_or_else(|| lines.error("ATOMS section before NUMBER OF ATOMS".to_string()))?;

            let labels: Vec<&str> = header.split_whitespace().collect();
            let layout = match schema {
                SchemaSource::Fixed(s) => s.clone(),
                SchemaSource::Auto => DumpSchema::from_atoms_header(&labels)
                    .map_err(|e| lines.error(e.to_string()))?,
            };

            let mut snapshot = read_atoms(&mut lines, &layout, step_value, count)?;
            snapshot.sim_box = sim_box;
            if layout.scaled_position {
                let bounds = sim_box
                    .ok_or_else(|| lines.error("scaled positions need a BOX BOUNDS section".to_string()))?;
                if let Some(positions) = snapshot.positions.as_mut() {
                    for p in positions.iter_mut() {
                        *p = bounds.unscale(*p);
                    }
                }
            }
            snapshot.sort_by_id();
            snapshots.push(snapshot);
        } else if item == "TIME" || item == "UNITS" {
            lines.expect_line(item)?;
        } else {
            return Err(lines.error(format!("unsupported section 'ITEM: {}'", item)));
        }
    }

    if step.is_some() {
        return Err(lines.error("trajectory ends before the ATOMS section of the last timestep".to_string()));
    }

    Ok(snapshots)
}

fn read_box<R: BufRead>(lines: &mut DumpLines<'_, R>, triclinic: bool) -> Result<SimulationBox> {
    let mut low = [0.0; 3];
    let mut high = [0.0; 3];
    let mut tilt = [0.0; 3];
    let expected = if triclinic { 3 } else { 2 };

    for axis in 0..3 {
        let line = lines.expect_line("box bounds")?;
        let values = line
            .split_whitespace()
            .map(|t| lines.parse_value::<f64>(t, "box bound"))
            .collect::<Result<Vec<f64>>>()?;
        if values.len() != expected {
            return Err(lines.error(format!(
                "expected {} box values, got {}",
                expected,
                values.len()
            )));
        }
        low[axis] = values[0];
        high[axis] = values[1];
        if triclinic {
            tilt[axis] = values[2];
        }
    }

    Ok(SimulationBox {
        low,
        high,
        tilt: triclinic.then_some(tilt),
    })
}

fn read_atoms<R: BufRead>(
    lines: &mut DumpLines<'_, R>,
    schema: &DumpSchema,
    step: i64,
    count: usize,
) -> Result<Snapshot> {
    let required = schema.required_columns();

    fn column<T>(present: bool, count: usize) -> Option<Vec<T>> {
        present.then(|| Vec::with_capacity(count))
    }
    let mut ids = column(schema.id.is_some(), count);
    let mut type_ids = column(schema.typeid.is_some(), count);
    let mut molecules = column(schema.molecule.is_some(), count);
    let mut charges = column(schema.charge.is_some(), count);
    let mut masses = column(schema.mass.is_some(), count);
    let mut positions = column(schema.position.is_some(), count);
    let mut velocities = column(schema.velocity.is_some(), count);
    let mut images = column(schema.image.is_some(), count);

    for _ in 0..count {
        let line = lines.expect_line("atom line")?;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < required {
            return Err(lines.error(format!(
                "atom line has {} columns, schema needs {}",
                fields.len(),
                required
            )));
        }

        let float = |i: usize| lines.parse_value::<f64>(fields[i], "float");
        let int = |i: usize| lines.parse_value::<i64>(fields[i], "integer");
        let coord = |c: [usize; 3]| -> Result<Coordinate> {
            Ok(Coordinate::new(float(c[0])?, float(c[1])?, float(c[2])?))
        };

        if let (Some(col), Some(v)) = (schema.id, ids.as_mut()) {
            v.push(int(col)?);
        }
        if let (Some(col), Some(v)) = (schema.typeid, type_ids.as_mut()) {
            v.push(int(col)?);
        }
        if let (Some(col), Some(v)) = (schema.molecule, molecules.as_mut()) {
            v.push(int(col)?);
        }
        if let (Some(col), Some(v)) = (schema.charge, charges.as_mut()) {
            v.push(float(col)?);
        }
        if let (Some(col), Some(v)) = (schema.mass, masses.as_mut()) {
            v.push(float(col)?);
        }
        if let (Some(cols), Some(v)) = (schema.position, positions.as_mut()) {
            v.push(coord(cols)?);
        }
        if let (Some(cols), Some(v)) = (schema.velocity, velocities.as_mut()) {
            v.push(coord(cols)?);
        }
        if let (Some(cols), Some(v)) = (schema.image, images.as_mut()) {
            v.push([int(cols[0])?, int(cols[1])?, int(cols[2])?]);
        }
    }

    Ok(Snapshot {
        step,
        particle_count: count,
        sim_box: None,
        ids,
        type_ids,
        molecules,
        charges,
        masses,
        positions,
        velocities,
        images,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::sample_trajectory;
    use std::io::Cursor;

    const TWO_FRAMES: &str = "\
ITEM: TIMESTEP
100
ITEM: NUMBER OF ATOMS
3
ITEM: BOX BOUNDS pp pp pp
-10.0 10.0
-10.0 10.0
-10.0 10.0
ITEM: ATOMS id x y z
3 2.0 0.0 0.0
1 0.0 0.0 0.0
2 1.0 0.0 0.0
ITEM: TIMESTEP
0
ITEM: NUMBER OF ATOMS
3
ITEM: BOX BOUNDS pp pp pp
-10.0 10.0
-10.0 10.0
-10.0 10.0
ITEM: ATOMS id x y z
1 0.0 0.0 0.0
2 0.0 1.0 0.0
3 0.0 3.0 0.0
";

    fn parse(content: &str, schema: &SchemaSource) -> Result<Vec<Snapshot>> {
        read_dump(Cursor::new(content), Path::new("test.lammpstrj"), schema)
    }

    #[test]
    fn test_read_two_frames_in_file_order() {
        let snaps = parse(TWO_FRAMES, &SchemaSource::default()).unwrap();
        assert_eq!(snaps.len(), 2);
        assert_eq!(snaps[0].step, 100);
        assert_eq!(snaps[1].step, 0);
        assert_eq!(snaps[0].particle_count, 3);

        // atoms are reordered by id
        let first = snaps[0].positions.as_ref().unwrap();
        assert_eq!(snaps[0].ids, Some(vec![1, 2, 3]));
        assert_eq!(first[0], Coordinate::new(0.0, 0.0, 0.0));
        assert_eq!(first[2], Coordinate::new(2.0, 0.0, 0.0));

        let sim_box = snaps[0].sim_box.unwrap();
        assert_eq!(sim_box.low, [-10.0; 3]);
        assert_eq!(sim_box.tilt, None);
    }

    #[test]
    fn test_auto_schema_and_triclinic_box() {
        let content = "\
ITEM: UNITS
lj
ITEM: TIMESTEP
5
ITEM: NUMBER OF ATOMS
2
ITEM: BOX BOUNDS xy xz yz pp pp pp
0.0 5.0 0.5
0.0 5.0 0.0
0.0 5.0 0.0
ITEM: ATOMS type id vx vy vz xu yu zu
1 2 0.1 0.2 0.3 4.0 4.0 4.0
1 1 0.0 0.0 0.0 1.0 1.0 1.0
";
        let snaps = parse(content, &SchemaSource::Auto).unwrap();
        assert_eq!(snaps.len(), 1);
        let snap = &snaps[0];
        assert_eq!(snap.ids, Some(vec![1, 2]));
        assert_eq!(snap.type_ids, Some(vec![1, 1]));
        assert_eq!(snap.positions.as_ref().unwrap()[1], Coordinate::new(4.0, 4.0, 4.0));
        assert_eq!(snap.velocities.as_ref().unwrap()[1], Coordinate::new(0.1, 0.2, 0.3));
        assert_eq!(snap.sim_box.unwrap().tilt, Some([0.5, 0.0, 0.0]));
    }

    #[test]
    fn test_scaled_positions_are_mapped_to_box_units() {
        let content = "\
ITEM: TIMESTEP
0
ITEM: NUMBER OF ATOMS
2
ITEM: BOX BOUNDS pp pp pp
0.0 10.0
0.0 10.0
0.0 10.0
ITEM: ATOMS id xs ys zs
1 0.0 0.0 0.0
2 1.0 0.0 0.0
";
        let snaps = parse(content, &SchemaSource::Auto).unwrap();
        let positions = snaps[0].positions.as_ref().unwrap();
        assert_eq!(positions[1], Coordinate::new(10.0, 0.0, 0.0));

        let point = sample_trajectory(&snaps, 1).unwrap();
        assert_eq!(point.r, 100.0);

        let fixed: SchemaSource = "id=0 scaled_position=1,2,3".parse().unwrap();
        let snaps = parse(content, &fixed).unwrap();
        assert_eq!(snaps[0].positions.as_ref().unwrap()[1], Coordinate::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn test_scaled_positions_without_box_is_error() {
        let content = "\
ITEM: TIMESTEP
0
ITEM: NUMBER OF ATOMS
1
ITEM: ATOMS id xs ys zs
1 0.5 0.5 0.5
";
        assert!(matches!(
            parse(content, &SchemaSource::Auto),
            Err(AnalysisError::Parse { .. })
        ));
    }

    #[test]
    fn test_short_atom_line_is_error() {
        let content = "\
ITEM: TIMESTEP
0
ITEM: NUMBER OF ATOMS
1
ITEM: ATOMS id x y
1 0.0 0.0
";
        match parse(content, &SchemaSource::default()) {
            Err(AnalysisError::Parse { line, .. }) => assert_eq!(line, 6),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_truncated_atoms_block_is_error() {
        let content = "\
ITEM: TIMESTEP
0
ITEM: NUMBER OF ATOMS
2
ITEM: ATOMS id x y z
1 0.0 0.0 0.0
";
        assert!(matches!(
            parse(content, &SchemaSource::default()),
            Err(AnalysisError::Parse { .. })
        ));
    }

    #[test]
    fn test_structural_errors() {
        let no_step = "ITEM: NUMBER OF ATOMS\n1\nITEM: ATOMS id x y z\n1 0 0 0\n";
        assert!(parse(no_step, &SchemaSource::default()).is_err());

        let bad_number = "ITEM: TIMESTEP\nten\n";
        assert!(parse(bad_number, &SchemaSource::default()).is_err());

        let unknown = "ITEM: BONDS\n1 2\n";
        assert!(parse(unknown, &SchemaSource::default()).is_err());

        let garbage = "hello\n";
        assert!(parse(garbage, &SchemaSource::default()).is_err());

        let dangling = "ITEM: TIMESTEP\n0\nITEM: NUMBER OF ATOMS\n1\n";
        assert!(parse(dangling, &SchemaSource::default()).is_err());
    }

    #[test]
    fn test_empty_file_is_empty_trajectory() {
        let path = std::env::temp_dir().join(format!("polymer_scaling_empty_{}.lammpstrj", std::process::id()));
        std::fs::write(&path, "").unwrap();
        let result = DumpTrajectory::read(&path, &SchemaSource::default());
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(AnalysisError::EmptyTrajectory(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = DumpTrajectory::read("/nonexistent/chain.lammpstrj", &SchemaSource::default());
        assert!(matches!(result, Err(AnalysisError::Io { .. })));
    }
}
