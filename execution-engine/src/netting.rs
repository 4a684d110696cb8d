//! Broker lot-size rounding with residual netting.
//!
//! When a portfolio has a residual sibling, every routed order is split in
//! two: the part the broker can trade (a multiple of the minimum step, at
//! least the minimum size) and a remainder parked in the residual
//! portfolio. `rounded + residual` always equals the desired unit.

/// Target positions closer to zero than this are treated as flat.
pub const FLAT_TOLERANCE: f64 = 1e-3;

const LOT_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Netting {
    /// Units the broker is asked to trade.
    pub rounded: f64,
    /// Units left over after rounding, including the previous residual.
    pub residual: f64,
}

/// Rounds `wanted` to a tradable lot.
///
/// Magnitudes below half the minimum size round to zero. Anything else is
/// rounded toward zero to a multiple of `min_step`, then lifted to at least
/// `min_size` (itself rounded up to a step multiple) and at least one step.
pub fn round_to_lot(wanted: f64, min_size: f64, min_step: f64) -> f64 {
    let magnitude = wanted.abs();
    if magnitude == 0.0 || magnitude < min_size * 0.5 {
        return 0.0;
    }
    let (down, size_floor) = if min_step > 0.0 {
        (
            (magnitude / min_step + LOT_EPSILON).floor() * min_step,
            (min_size / min_step - LOT_EPSILON).ceil().max(0.0) * min_step,
        )
    } else {
        (magnitude, min_size)
    };
    wanted.signum() * down.max(size_floor).max(min_step)
}

/// Splits `unit` into a broker lot and a residual.
///
/// # Arguments
///
/// * `unit` - Signed units the order asks for.
/// * `existing_residual` - Units currently held by the residual portfolio.
/// * `aggregated` - Units currently held by the ordering portfolio tree.
/// * `min_size` / `min_step` - Broker lot constraints from the instruction.
pub fn net_residual(
    unit: f64,
    existing_residual: f64,
    aggregated: f64,
    min_size: f64,
    min_step: f64,
) -> Netting {
    let wanted = unit - existing_residual;
    if (aggregated + wanted).abs() <= FLAT_TOLERANCE {
        // Closing out: trade everything so the position ends exactly flat.
        return Netting {
            rounded: wanted,
            residual: existing_residual,
        };
    }
    let rounded = round_to_lot(wanted, min_size, min_step);
    Netting {
        rounded,
        residual: wanted - rounded + existing_residual,
    }
}
