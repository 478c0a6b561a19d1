//! Central system ordering labels to make update sequence explicit.
//! Both sets live in `PostUpdate`, bracketing rapier's `PhysicsSet`
//! (configured in `app::game`):
//! 1. PrePhysics (flipper kinematics, plane clamp, zone forces, speed
//!    control) — before `PhysicsSet::SyncBackend`
//! 2. Rapier step + writeback (handled by plugin)
//! 3. PostPhysicsAdjust (collision routing, round bookkeeping) — after
//!    `PhysicsSet::Writeback`, so this frame's contact events and manifolds
//!    are read in the frame they were produced
use bevy::prelude::*;

#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub struct PrePhysicsSet; // velocity/transform edits applied before the physics step

#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub struct PostPhysicsAdjustSet; // corrections driven by this frame's contacts
