use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::core::models::event::{EventRecord, InteractionSummary};
use crate::core::models::particle::ParticleType;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("JSON error for '{path}': {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
    #[error("Inconsistent event table: column '{column}' has {found} rows, expected {expected}")]
    Inconsistent {
        column: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("Inconsistent event table: event {event} has ragged interaction columns")]
    Ragged { event: usize },
}

/// Columnar event table. Row `i` of every column describes event `i`; the inner vectors of
/// the per-interaction columns are indexed by interaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventTable {
    pub event_weight: Vec<f64>,
    pub primary_type: Vec<Vec<ParticleType>>,
    pub primary_energy: Vec<Vec<f64>>,
    pub vertex: Vec<Vec<[f64; 3]>>,
    pub secondary_types: Vec<Vec<Vec<ParticleType>>>,
    pub in_fiducial: Vec<Vec<bool>>,
    /// `-1` marks the primary interaction.
    pub parent_index: Vec<Vec<i64>>,
}

impl EventTable {
    pub fn from_records(records: &[EventRecord]) -> Self {
        let mut table = Self::default();
        for record in records {
            table.push(record);
        }
        table
    }

    pub fn push(&mut self, record: &EventRecord) {
        let rows = &record.interactions;
        self.event_weight.push(record.event_weight);
        self.primary_type
            .push(rows.iter().map(|i| i.primary_type).collect());
        self.primary_energy
            .push(rows.iter().map(|i| i.primary_energy).collect());
        self.vertex.push(rows.iter().map(|i| i.vertex).collect());
        self.secondary_types
            .push(rows.iter().map(|i| i.secondary_types.clone()).collect());
        self.in_fiducial
            .push(rows.iter().map(|i| i.in_fiducial).collect());
        self.parent_index.push(
            rows.iter()
                .map(|i| i.parent_index.map_or(-1, |p| p as i64))
                .collect(),
        );
    }

    pub fn len(&self) -> usize {
        self.event_weight.len()
    }

    pub fn is_empty(&self) -> bool {
        self.event_weight.is_empty()
    }

    pub fn validate(&self) -> Result<(), TableError> {
        let expected = self.len();
        let columns: [(&'static str, usize); 6] = [
            ("primary_type", self.primary_type.len()),
            ("primary_energy", self.primary_energy.len()),
            ("vertex", self.vertex.len()),
            ("secondary_types", self.secondary_types.len()),
            ("in_fiducial", self.in_fiducial.len()),
            ("parent_index", self.parent_index.len()),
        ];
        for (column, found) in columns {
            if found != expected {
                return Err(TableError::Inconsistent {
                    column,
                    expected,
                    found,
                });
            }
        }
        for event in 0..expected {
            let n = self.primary_type[event].len();
            let ragged = self.primary_energy[event].len() != n
                || self.vertex[event].len() != n
                || self.secondary_types[event].len() != n
                || self.in_fiducial[event].len() != n
                || self.parent_index[event].len() != n;
            if ragged {
                return Err(TableError::Ragged { event });
            }
        }
        Ok(())
    }

    pub fn into_records(self) -> Result<Vec<EventRecord>, TableError> {
        self.validate()?;
        let mut records = Vec::with_capacity(self.len());
        let rows = self
            .event_weight
            .into_iter()
            .zip(self.primary_type)
            .zip(self.primary_energy)
            .zip(self.vertex)
            .zip(self.secondary_types)
            .zip(self.in_fiducial)
            .zip(self.parent_index);
        for ((((((weight, types), energies), vertices), secondaries), fiducial), parents) in rows {
            let interactions = types
                .into_iter()
                .zip(energies)
                .zip(vertices)
                .zip(secondaries)
                .zip(fiducial)
                .zip(parents)
                .map(
                    |(((((primary_type, primary_energy), vertex), secondary_types), in_fiducial), parent)| {
                        InteractionSummary {
                            primary_type,
                            primary_energy,
                            vertex,
                            secondary_types,
                            in_fiducial,
                            parent_index: usize::try_from(parent).ok(),
                        }
                    },
                )
                .collect();
            records.push(EventRecord {
                event_weight: weight,
                interactions,
            });
        }
        Ok(records)
    }

    /// Writes the table next to `path` and renames it into place, so readers never observe
    /// a partially written file.
    pub fn write_atomic(&self, path: &Path) -> Result<(), TableError> {
        let path_str = path.to_string_lossy().to_string();
        let io_err = |source| TableError::Io {
            path: path_str.clone(),
            source,
        };
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(io_err)?;

        let mut temp = NamedTempFile::new_in(dir).map_err(io_err)?;
        {
            let mut writer = BufWriter::new(temp.as_file_mut());
            serde_json::to_writer(&mut writer, self).map_err(|e| TableError::Json {
                path: path_str.clone(),
                source: e,
            })?;
            writer.flush().map_err(io_err)?;
        }
        temp.persist(path).map_err(|e| io_err(e.error))?;
        Ok(())
    }

    pub fn read(path: &Path) -> Result<Self, TableError> {
        let path_str = path.to_string_lossy().to_string();
        let file = fs::File::open(path).map_err(|e| TableError::Io {
            path: path_str.clone(),
            source: e,
        })?;
        let table: Self =
            serde_json::from_reader(BufReader::new(file)).map_err(|e| TableError::Json {
                path: path_str,
                source: e,
            })?;
        table.validate()?;
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_records() -> Vec<EventRecord> {
        vec![
            EventRecord {
                event_weight: 0.5,
                interactions: vec![
                    InteractionSummary {
                        primary_type: ParticleType::NU_MU,
                        primary_energy: 1.2,
                        vertex: [0.0, 0.1, -40.0],
                        secondary_types: vec![ParticleType::N4, ParticleType::SI28_NUCLEUS],
                        in_fiducial: false,
                        parent_index: None,
                    },
                    InteractionSummary {
                        primary_type: ParticleType::N4,
                        primary_energy: 1.1,
                        vertex: [0.0, 0.1, 0.5],
                        secondary_types: vec![ParticleType::NU_MU, ParticleType::GAMMA],
                        in_fiducial: true,
                        parent_index: Some(0),
                    },
                ],
            },
            EventRecord {
                event_weight: 0.25,
                interactions: vec![],
            },
        ]
    }

    #[test]
    fn parent_index_column_marks_primary_with_minus_one() {
        let table = EventTable::from_records(&sample_records());
        assert_eq!(table.parent_index, vec![vec![-1, 0], vec![]]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn write_then_read_restores_records() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("events.json");
        let records = sample_records();
        EventTable::from_records(&records)
            .write_atomic(&path)
            .unwrap();
        let restored = EventTable::read(&path).unwrap().into_records().unwrap();
        assert_eq!(restored, records);
    }

    #[test]
    fn write_overwrites_existing_file_without_leftovers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.json");
        EventTable::from_records(&sample_records())
            .write_atomic(&path)
            .unwrap();
        EventTable::default().write_atomic(&path).unwrap();
        assert!(EventTable::read(&path).unwrap().is_empty());
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn mismatched_column_lengths_are_rejected() {
        let mut table = EventTable::from_records(&sample_records());
        table.in_fiducial.pop();
        assert!(matches!(
            table.validate(),
            Err(TableError::Inconsistent {
                column: "in_fiducial",
                expected: 2,
                found: 1
            })
        ));

        let mut table = EventTable::from_records(&sample_records());
        table.vertex[0].pop();
        assert!(matches!(
            table.into_records(),
            Err(TableError::Ragged { event: 0 })
        ));
    }

    #[test]
    fn read_rejects_inconsistent_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(
            &path,
            r#"{"event_weight":[1.0],"primary_type":[],"primary_energy":[],"vertex":[],
               "secondary_types":[],"in_fiducial":[],"parent_index":[]}"#,
        )
        .unwrap();
        assert!(matches!(
            EventTable::read(&path),
            Err(TableError::Inconsistent { .. })
        ));
        assert!(matches!(
            EventTable::read(&dir.path().join("missing.json")),
            Err(TableError::Io { .. })
        ));
    }
}
