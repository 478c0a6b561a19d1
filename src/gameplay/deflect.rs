//! Incidence classification and forced-deflection math for ball contacts.
//!
//! A top-down ball constrained to a plane bounces exactly back and forth when
//! it meets an axis-aligned wall square-on; the engine's angle-preserving
//! reflection never breaks the loop. These helpers classify such contacts and
//! compute a randomized deflection that stays visually plausible. All
//! functions are pure and planar; randomness comes through the caller's RNG
//! so tests can seed it.

use bevy::prelude::*;
use rand::Rng;

use crate::core::plane::{reflect_planar, rotate_planar};

/// Incidence angles in (80, 100) degrees count as perpendicular to the wall.
const PERPENDICULAR_BAND_DEG: (f32, f32) = (80.0, 100.0);
/// Below 10 / above 170 degrees the travel is parallel to the normal, which
/// under top-down projection is a head-on wall hit.
const PARALLEL_BAND_DEG: (f32, f32) = (10.0, 170.0);
/// Reflection within ~45 degrees of reversing the incoming direction.
const REFLECT_BACK_DOT: f32 = 0.7;
/// Post-deflection directions still within 60 degrees of reversal are rejected.
const FINAL_REVERSAL_DOT: f32 = 0.5;
/// Minimum deflection away from the naive reflection, in degrees.
const MIN_DEFLECTION_DEG: f32 = 45.0;
/// Raised floor when the naive reflection already points back at the sender.
const MIN_DEFLECTION_REVERSAL_DEG: f32 = 60.0;

/// Outcome of classifying one contact.
#[derive(Debug, Clone, Copy)]
pub struct Incidence {
    /// Angle between travel direction and contact normal, degrees in [0, 90].
    pub angle_deg: f32,
    /// Naive physical reflection of the travel direction (normalized).
    pub reflect: Vec2,
    /// Reflection nearly reverses the incoming direction (ping-pong geometry).
    pub reflecting_back: bool,
    /// Contact needs forced deflection instead of the engine response.
    pub vertical: bool,
}

/// Classify a contact. `incoming` is the normalized travel direction,
/// `normal` the normalized planar contact normal (pointing toward the ball).
pub fn classify(incoming: Vec2, normal: Vec2) -> Incidence {
    let dot = incoming.dot(normal);
    let angle_deg = dot.abs().clamp(0.0, 1.0).acos().to_degrees();
    let reflect = reflect_planar(incoming, normal).normalize_or_zero();
    let reflecting_back = reflect.dot(-incoming) > REFLECT_BACK_DOT;
    let perpendicular =
        angle_deg > PERPENDICULAR_BAND_DEG.0 && angle_deg < PERPENDICULAR_BAND_DEG.1;
    let parallel = angle_deg < PARALLEL_BAND_DEG.0 || angle_deg > PARALLEL_BAND_DEG.1;
    Incidence {
        angle_deg,
        reflect,
        reflecting_back,
        vertical: perpendicular || parallel || reflecting_back,
    }
}

/// Escalation factor for the consecutive-hit counter value *after* increment:
/// 1 -> x1, 2 -> x2, 3 -> x3, 4+ -> x5 with a counter reset.
pub fn escalation(hits: u32) -> (f32, bool) {
    match hits {
        0 | 1 => (1.0, false),
        2 => (2.0, false),
        3 => (3.0, false),
        _ => (5.0, true),
    }
}

/// Random planar direction biased forward (out of the flipper corner), used as
/// the last-resort fallback and for stuck-ball recovery.
pub fn random_forward_dir<R: Rng>(rng: &mut R) -> Vec2 {
    Vec2::new(rng.gen_range(-1.0..1.0), rng.gen_range(0.5..1.0)).normalize()
}

/// Compute the forced deflection direction for a vertical-incidence contact.
///
/// `magnitude_deg` is the escalated half-range; the actual deflection is drawn
/// uniformly from `[-magnitude, magnitude]` and raised to the floor when it
/// comes in too small. Layered fallbacks (surface tangent, then random) make
/// sure the result is a valid non-reversing unit vector.
pub fn deflect_direction<R: Rng>(
    rng: &mut R,
    incidence: &Incidence,
    incoming: Vec2,
    normal: Vec2,
    magnitude_deg: f32,
) -> Vec2 {
    let mut floor = MIN_DEFLECTION_DEG;
    let mut magnitude = magnitude_deg.max(1e-3); // empty range would panic the draw
    if incidence.reflecting_back {
        floor = MIN_DEFLECTION_REVERSAL_DEG;
        magnitude = magnitude.max(floor);
    }

    let mut deflection = rng.gen_range(-magnitude..magnitude);
    if deflection.abs() < floor {
        deflection = if deflection > 0.0 { floor } else { -floor };
    }

    let mut dir = rotate_planar(incidence.reflect, deflection).normalize_or_zero();

    if dir.dot(-incoming) > FINAL_REVERSAL_DOT {
        // Still aimed back at the sender; take the surface tangent instead.
        dir = Vec2::new(-normal.y, normal.x).normalize_or_zero();
        if dir.length_squared() < 0.01 {
            dir = Vec2::new(normal.y, -normal.x).normalize_or_zero();
        }
    }
    if dir.length_squared() < 0.01 {
        dir = random_forward_dir(rng);
    }
    dir
}
