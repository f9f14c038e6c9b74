//! Helper items to assist the working of the jump-network machinery.

pub mod geometry;
pub(crate) mod misc;
