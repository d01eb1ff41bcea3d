pub mod geometry;
pub mod keypoint;

pub use geometry::{bounding_box, scale_to_bounding_box, torso_center, BoundingBox};
pub use keypoint::{Keypoint, KeypointIndex, Pose};
