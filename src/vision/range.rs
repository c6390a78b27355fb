use crate::foundation::core::{GridCalibration, ItemId, Role};
use crate::foundation::error::{UmbraError, UmbraResult};
use crate::geometry::region::Region;
use crate::scene::model::{IndicatorRing, Viewer};

/// Final per-viewer regions after range clipping and torch containment.
#[derive(Clone, Debug)]
pub struct RangeOutcome {
    /// One region per input viewer, same order.
    pub regions: Vec<Region>,
    /// Union of every non-torch viewer's clipped region.
    pub full_vision: Region,
    /// GM-only range indicators.
    pub rings: Vec<IndicatorRing>,
}

pub(crate) fn ring_id(viewer: &ItemId) -> ItemId {
    ItemId::new(format!("umbra/ring/{viewer}"))
}

/// Clip each region to its viewer's vision disc, then confine torches to `full_vision`.
///
/// Indicator rings are produced only for a GM client, for ranged non-torch viewers whose
/// owner is not a GM.
pub fn apply_range_and_torches(
    viewers: &[Viewer],
    regions: Vec<Region>,
    grid: GridCalibration,
    local_role: Role,
    disc_tolerance: f64,
) -> UmbraResult<RangeOutcome> {
    if viewers.len() != regions.len() {
        return Err(UmbraError::validation(format!(
            "{} viewers but {} regions",
            viewers.len(),
            regions.len()
        )));
    }

    let mut rings = Vec::new();
    let clipped = viewers
        .iter()
        .zip(regions)
        .map(|(viewer, region)| {
            if !viewer.is_ranged() {
                return region;
            }
            let radius = grid.range_radius(viewer.vision_range);
            if local_role == Role::Gm && !viewer.torch && viewer.owner_role != Role::Gm {
                rings.push(IndicatorRing {
                    id: ring_id(&viewer.id),
                    viewer_id: viewer.id.clone(),
                    center: viewer.position,
                    radius,
                    color: viewer.owner_color.clone(),
                });
            }
            region.intersection(&Region::disc(viewer.position, radius, disc_tolerance))
        })
        .collect::<Vec<_>>();

    let full_vision = Region::union_all(
        viewers
            .iter()
            .zip(&clipped)
            .filter(|(v, _)| !v.torch)
            .map(|(_, r)| r),
    );

    let regions = viewers
        .iter()
        .zip(clipped)
        .map(|(viewer, region)| {
            if viewer.torch {
                region.intersection(&full_vision)
            } else {
                region
            }
        })
        .collect();

    Ok(RangeOutcome {
        regions,
        full_vision,
        rings,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/vision/range.rs"]
mod tests;
