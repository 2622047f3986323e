pub mod landmarks;

pub use landmarks::{BodyPoint, Landmark, LandmarkDocument, LandmarkFrame, LandmarkSet};
