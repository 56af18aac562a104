use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::particle::ParticleType;
use crate::core::physics::kinematics::FourMomentum;

/// Full kinematic record of one interaction (scattering or decay) during generation.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionDatum {
    pub primary_type: ParticleType,
    pub primary_momentum: FourMomentum,
    /// Struck nucleus for scatterings, `None` for decays.
    pub target_type: Option<ParticleType>,
    pub vertex: Point3<f64>,
    pub secondary_types: Vec<ParticleType>,
    pub secondary_momenta: Vec<FourMomentum>,
    /// Index of the interaction that produced this one's primary.
    pub parent_index: Option<usize>,
}

impl InteractionDatum {
    pub fn secondary(&self, index: usize) -> Option<(ParticleType, &FourMomentum)> {
        Some((
            *self.secondary_types.get(index)?,
            self.secondary_momenta.get(index)?,
        ))
    }
}

/// The persisted projection of an [`InteractionDatum`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionSummary {
    pub primary_type: ParticleType,
    pub primary_energy: f64,
    pub vertex: [f64; 3],
    pub secondary_types: Vec<ParticleType>,
    pub in_fiducial: bool,
    pub parent_index: Option<usize>,
}

impl InteractionSummary {
    pub fn from_datum(datum: &InteractionDatum, in_fiducial: bool) -> Self {
        Self {
            primary_type: datum.primary_type,
            primary_energy: datum.primary_momentum.energy,
            vertex: [datum.vertex.x, datum.vertex.y, datum.vertex.z],
            secondary_types: datum.secondary_types.clone(),
            in_fiducial,
            parent_index: datum.parent_index,
        }
    }
}

/// One generated event: its weight and its interaction tree in breadth-first order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub event_weight: f64,
    pub interactions: Vec<InteractionSummary>,
}

/// Addresses one secondary of one interaction inside an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectionIndex {
    pub interaction: usize,
    pub secondary: usize,
}

impl SelectionIndex {
    /// The photon emitted by the heavy lepton decay.
    pub const DECAY_PHOTON: Self = Self {
        interaction: 1,
        secondary: 1,
    };

    pub fn new(interaction: usize, secondary: usize) -> Self {
        Self {
            interaction,
            secondary,
        }
    }
}

impl Default for SelectionIndex {
    fn default() -> Self {
        Self::DECAY_PHOTON
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EventIndexError {
    #[error("interaction {requested} requested but the event has {available}")]
    MissingInteraction { requested: usize, available: usize },
    #[error("secondary {requested} of interaction {interaction} requested but it has {available}")]
    MissingSecondary {
        interaction: usize,
        requested: usize,
        available: usize,
    },
}

impl EventRecord {
    pub fn interaction(&self, index: usize) -> Result<&InteractionSummary, EventIndexError> {
        self.interactions
            .get(index)
            .ok_or(EventIndexError::MissingInteraction {
                requested: index,
                available: self.interactions.len(),
            })
    }

    pub fn secondary_type(&self, index: SelectionIndex) -> Result<ParticleType, EventIndexError> {
        let interaction = self.interaction(index.interaction)?;
        interaction
            .secondary_types
            .get(index.secondary)
            .copied()
            .ok_or(EventIndexError::MissingSecondary {
                interaction: index.interaction,
                requested: index.secondary,
                available: interaction.secondary_types.len(),
            })
    }

    pub fn in_fiducial(&self, interaction: usize) -> Result<bool, EventIndexError> {
        Ok(self.interaction(interaction)?.in_fiducial)
    }
}
