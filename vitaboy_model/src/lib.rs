//! Skeleton and playback runtime built on top of `vitaboy_format`'s record
//! types: bone hierarchy construction, forward-kinematic transform
//! propagation, two-phase mesh deformation, and skill playback.
pub mod playback;
pub mod skeleton;
