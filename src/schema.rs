use std::fmt;
use std::str::FromStr;

use crate::error::{AnalysisError, Result};

/// Maps semantic per-particle fields to zero-based column indices of the
/// `ITEM: ATOMS` block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DumpSchema {
    pub id: Option<usize>,
    pub typeid: Option<usize>,
    pub molecule: Option<usize>,
    pub charge: Option<usize>,
    pub mass: Option<usize>,
    pub position: Option<[usize; 3]>,
    pub velocity: Option<[usize; 3]>,
    pub image: Option<[usize; 3]>,
    /// Positions are fractions of the box (`xs ys zs`) and get mapped back to box units
    pub scaled_position: bool,
}

impl DumpSchema {
    /// `id` in column 0 and positions in columns 1..=3
    pub fn id_and_position() -> Self {
        Self {
            id: Some(0),
            position: Some([1, 2, 3]),
            ..Default::default()
        }
    }

    /// Minimum number of columns an atom line must carry
    pub fn required_columns(&self) -> usize {
        let scalars = [self.id, self.typeid, self.molecule, self.charge, self.mass];
        let triples = [self.position, self.velocity, self.image];
        scalars
            .iter()
            .flatten()
            .copied()
            .chain(triples.iter().flatten().flat_map(|t| t.iter().copied()))
            .max()
            .map_or(0, |max| max + 1)
    }

    /// Build a schema from the column labels following `ITEM: ATOMS`.
    ///
    /// Positions are taken from the first complete triple of `xu`, `xsu`,
    /// `x`, `xs`, so unwrapped coordinates win over wrapped ones.
    pub fn from_atoms_header(labels: &[&str]) -> Result<Self> {
        let find = |name: &str| labels.iter().position(|l| *l == name);
        let triple = |names: [&str; 3]| -> Option<[usize; 3]> {
            Some([find(names[0])?, find(names[1])?, find(names[2])?])
        };

        let (position, scaled_position) = match triple(["xu", "yu", "zu"]) {
            Some(cols) => (Some(cols), false),
            None => match triple(["xsu", "ysu", "zsu"]) {
                Some(cols) => (Some(cols), true),
                None => match triple(["x", "y", "z"]) {
                    Some(cols) => (Some(cols), false),
                    None => (triple(["xs", "ys", "zs"]), true),
                },
            },
        };

        let schema = Self {
            id: find("id"),
            typeid: find("type"),
            molecule: find("mol"),
            charge: find("q"),
            mass: find("mass"),
            position,
            velocity: triple(["vx", "vy", "vz"]),
            image: triple(["ix", "iy", "iz"]),
            scaled_position: scaled_position && position.is_some(),
        };

        if schema == Self::default() {
            return Err(AnalysisError::Schema(format!(
                "no known columns in ATOMS header '{}'",
                labels.join(" ")
            )));
        }
        Ok(schema)
    }
}

impl FromStr for DumpSchema {
    type Err = AnalysisError;

    /// Parse entries such as `id=0 position=1,2,3`, separated by whitespace or `;`.
    /// `scaled_position=...` declares fractional coordinates.
    fn from_str(s: &str) -> Result<Self> {
        let mut schema = DumpSchema::default();

        let entries = s
            .split(|c: char| c.is_whitespace() || c == ';')
            .filter(|e| !e.is_empty());

        for entry in entries {
            let (field, value) = entry
                .split_once('=')
                .ok_or_else(|| AnalysisError::Schema(format!("expected field=index, got '{}'", entry)))?;

            let indices = value
                .split(',')
                .map(|v| {
                    v.trim().parse::<usize>().map_err(|e| {
                        AnalysisError::Schema(format!("bad column index '{}' for {}: {}", v, field, e))
                    })
                })
                .collect::<Result<Vec<usize>>>()?;

            let scalar = || -> Result<Option<usize>> {
                match indices.as_slice() {
                    [i] => Ok(Some(*i)),
                    _ => Err(AnalysisError::Schema(format!("{} takes one column, got {}", field, indices.len()))),
                }
            };
            let triple = || -> Result<Option<[usize; 3]>> {
                match indices.as_slice() {
                    [a, b, c] => Ok(Some([*a, *b, *c])),
                    _ => Err(AnalysisError::Schema(format!("{} takes three columns, got {}", field, indices.len()))),
                }
            };

            match field.trim() {
                "id" => schema.id = scalar()?,
                "typeid" => schema.typeid = scalar()?,
                "molecule" => schema.molecule = scalar()?,
                "charge" => schema.charge = scalar()?,
                "mass" => schema.mass = scalar()?,
                "position" => {
                    schema.position = triple()?;
                    schema.scaled_position = false;
                }
                "scaled_position" => {
                    schema.position = triple()?;
                    schema.scaled_position = true;
                }
                "velocity" => schema.velocity = triple()?,
                "image" => schema.image = triple()?,
                other => return Err(AnalysisError::Schema(format!("unknown field '{}'", other))),
            }
        }

        if schema == DumpSchema::default() {
            return Err(AnalysisError::Schema("schema declares no columns".to_string()));
        }
        Ok(schema)
    }
}

impl fmt::Display for DumpSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        let scalars = [
            ("id", self.id),
            ("typeid", self.typeid),
            ("molecule", self.molecule),
            ("charge", self.charge),
            ("mass", self.mass),
        ];
        for (name, col) in scalars {
            if let Some(c) = col {
                parts.push(format!("{}={}", name, c));
            }
        }
        let position_name = if self.scaled_position { "scaled_position" } else { "position" };
        let triples = [(position_name, self.position), ("velocity", self.velocity), ("image", self.image)];
        for (name, cols) in triples {
            if let Some([a, b, c]) = cols {
                parts.push(format!("{}={},{},{}", name, a, b, c));
            }
        }
        write!(f, "{}", parts.join(" "))
    }
}

/// Where the column layout of each dump file comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSource {
    /// Same layout for every file
    Fixed(DumpSchema),
    /// Read from each file's `ITEM: ATOMS` header
    Auto,
}

impl Default for SchemaSource {
    fn default() -> Self {
        SchemaSource::Fixed(DumpSchema::id_and_position())
    }
}

impl FromStr for SchemaSource {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("auto") {
            Ok(SchemaSource::Auto)
        } else {
            s.parse().map(SchemaSource::Fixed)
        }
    }
}
