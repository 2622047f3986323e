//! Pose-tracker output: one landmark snapshot per video frame.
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Named body points delivered by the pose tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyPoint {
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl BodyPoint {
    pub const ALL: [BodyPoint; 12] = [
        BodyPoint::LeftShoulder,
        BodyPoint::RightShoulder,
        BodyPoint::LeftElbow,
        BodyPoint::RightElbow,
        BodyPoint::LeftWrist,
        BodyPoint::RightWrist,
        BodyPoint::LeftHip,
        BodyPoint::RightHip,
        BodyPoint::LeftKnee,
        BodyPoint::RightKnee,
        BodyPoint::LeftAnkle,
        BodyPoint::RightAnkle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BodyPoint::LeftShoulder => "left_shoulder",
            BodyPoint::RightShoulder => "right_shoulder",
            BodyPoint::LeftElbow => "left_elbow",
            BodyPoint::RightElbow => "right_elbow",
            BodyPoint::LeftWrist => "left_wrist",
            BodyPoint::RightWrist => "right_wrist",
            BodyPoint::LeftHip => "left_hip",
            BodyPoint::RightHip => "right_hip",
            BodyPoint::LeftKnee => "left_knee",
            BodyPoint::RightKnee => "right_knee",
            BodyPoint::LeftAnkle => "left_ankle",
            BodyPoint::RightAnkle => "right_ankle",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        BodyPoint::ALL.into_iter().find(|p| p.as_str() == name)
    }
}

/// Normalized image-relative coordinate plus tracker visibility.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    #[serde(default)]
    pub visibility: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64, z: f64, visibility: f64) -> Self {
        Self { x, y, z, visibility }
    }

    /// Lenient decoding used for tracker output: x/y must be finite numbers,
    /// z and visibility default to 0.0 when absent.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let field = |key: &str| object.get(key).and_then(Value::as_f64);

        let landmark = Landmark {
            x: field("x")?,
            y: field("y")?,
            z: match object.get("z") {
                None | Some(Value::Null) => 0.0,
                Some(_) => field("z")?,
            },
            visibility: match object.get("visibility") {
                None | Some(Value::Null) => 0.0,
                Some(_) => field("visibility")?,
            },
        };

        landmark.is_finite().then_some(landmark)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite() && self.visibility.is_finite()
    }
}

/// The landmarks detected in one frame. Missing points are simply absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkSet {
    points: IndexMap<BodyPoint, Landmark>,
}

impl LandmarkSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, point: BodyPoint, landmark: Landmark) -> Self {
        self.insert(point, landmark);
        self
    }

    pub fn insert(&mut self, point: BodyPoint, landmark: Landmark) {
        self.points.insert(point, landmark);
    }

    /// Returns the landmark only when all of its coordinates are usable.
    pub fn get(&self, point: BodyPoint) -> Option<&Landmark> {
        self.points.get(&point).filter(|l| l.is_finite())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BodyPoint, &Landmark)> {
        self.points.iter()
    }

    /// Mean visibility over every stored landmark, `None` when empty. Summed
    /// in body-point order so the result does not depend on insertion order.
    pub fn mean_visibility(&self) -> Option<f64> {
        if self.points.is_empty() {
            return None;
        }
        let total: f64 = BodyPoint::ALL
            .iter()
            .filter_map(|point| self.points.get(point))
            .map(|l| l.visibility)
            .sum();
        Some(total / self.points.len() as f64)
    }
}

/// One tracked instant of the input video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawLandmarkFrame")]
pub struct LandmarkFrame {
    pub frame_number: u32,
    pub timestamp: f64,
    pub pose_detected: bool,
    pub landmarks: Option<LandmarkSet>,
}

impl LandmarkFrame {
    pub fn detected(frame_number: u32, timestamp: f64, landmarks: LandmarkSet) -> Self {
        Self {
            frame_number,
            timestamp,
            pose_detected: true,
            landmarks: Some(landmarks),
        }
    }

    pub fn missing(frame_number: u32, timestamp: f64) -> Self {
        Self {
            frame_number,
            timestamp,
            pose_detected: false,
            landmarks: None,
        }
    }

    /// The landmark set of a frame the tracker actually detected.
    pub fn valid_landmarks(&self) -> Option<&LandmarkSet> {
        if self.pose_detected {
            self.landmarks.as_ref()
        } else {
            None
        }
    }
}

#[derive(Deserialize)]
struct RawLandmarkFrame {
    frame_number: u32,
    timestamp: f64,
    #[serde(default)]
    pose_detected: bool,
    #[serde(default)]
    landmarks: Option<IndexMap<String, Value>>,
}

impl From<RawLandmarkFrame> for LandmarkFrame {
    fn from(raw: RawLandmarkFrame) -> Self {
        let landmarks = raw.landmarks.map(|entries| {
            let mut set = LandmarkSet::new();
            for (name, value) in &entries {
                let Some(point) = BodyPoint::from_name(name) else {
                    continue;
                };
                match Landmark::from_value(value) {
                    Some(landmark) => set.insert(point, landmark),
                    None => tracing::debug!(
                        "Dropping malformed landmark '{}' in frame {}",
                        name,
                        raw.frame_number
                    ),
                }
            }
            set
        });

        Self {
            frame_number: raw.frame_number,
            timestamp: raw.timestamp,
            pose_detected: raw.pose_detected,
            landmarks,
        }
    }
}

/// A whole tracked video as handed over by the pose-tracking collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkDocument {
    pub fps: f64,
    pub frames: Vec<LandmarkFrame>,
    #[serde(default)]
    pub video_quality: Option<Value>,
}
