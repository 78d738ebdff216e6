//! Explosion propagation
//!
//! A detonation casts four bounded rays from its origin cell. Each ray stops
//! at the first blocking tile (after asking the field to clear it if it is
//! destructible) unless the blast bypasses soft blocks and the tile is not
//! hard. The rays never interact, so a destroyed block only affects the ray
//! that reached it.

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::grid::{Direction, LayerMask};

/// Visual/logical stage of a fire marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlastStage {
    /// Origin cell
    Start,
    /// Ray segment with more fire beyond it
    Middle,
    /// Last segment of a ray
    End,
}

/// One burning cell produced by a detonation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplosionMarker {
    pub cell: IVec2,
    /// `None` for the origin
    pub direction: Option<Direction>,
    pub stage: BlastStage,
}

/// Parameters a bomb carries into its detonation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlastParams {
    pub radius: u32,
    /// Layers that stop a ray
    pub blocking_mask: LayerMask,
    /// Blocking layers a bypassing blast may burn through
    pub pass_through_mask: LayerMask,
    pub bypass_soft_blocks: bool,
}

impl BlastParams {
    /// Layers that stop a ray even when bypassing
    pub fn hard_mask(&self) -> LayerMask {
        self.blocking_mask.without(self.pass_through_mask)
    }
}

/// The world as seen by a propagating explosion
pub trait BlastField {
    /// Layers present at `cell`. Cells outside the world must report a hard layer.
    fn layers_at(&self, cell: IVec2) -> LayerMask;

    /// Destroy whatever destructible sits at `cell`
    fn clear_destructible(&mut self, cell: IVec2);

    /// Damage every damageable occupant of `cell`
    fn damage_at(&mut self, cell: IVec2);
}

/// Run a detonation at `origin`, returning the fire markers in emission order
pub fn propagate(
    field: &mut impl BlastField,
    origin: IVec2,
    params: &BlastParams,
) -> Vec<ExplosionMarker> {
    let mut markers = Vec::with_capacity(1 + 4 * params.radius as usize);
    markers.push(ExplosionMarker {
        cell: origin,
        direction: None,
        stage: BlastStage::Start,
    });
    field.damage_at(origin);

    let hard = params.hard_mask();
    for direction in Direction::ALL {
        let step = direction.offset();
        let mut cell = origin;
        let mut remaining = params.radius;

        while remaining > 0 {
            cell += step;

            let layers = field.layers_at(cell);
            if layers.intersects(params.blocking_mask) {
                field.clear_destructible(cell);
                if !params.bypass_soft_blocks || layers.intersects(hard) {
                    break;
                }
            }

            markers.push(ExplosionMarker {
                cell,
                direction: Some(direction),
                stage: if remaining > 1 {
                    BlastStage::Middle
                } else {
                    BlastStage::End
                },
            });
            field.damage_at(cell);
            remaining -= 1;
        }
    }

    markers
}
