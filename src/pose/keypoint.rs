/// MoveNet の 17 キーポイントインデックス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum KeypointIndex {
    Nose = 0,
    LeftEye = 1,
    RightEye = 2,
    LeftEar = 3,
    RightEar = 4,
    LeftShoulder = 5,
    RightShoulder = 6,
    LeftElbow = 7,
    RightElbow = 8,
    LeftWrist = 9,
    RightWrist = 10,
    LeftHip = 11,
    RightHip = 12,
    LeftKnee = 13,
    RightKnee = 14,
    LeftAnkle = 15,
    RightAnkle = 16,
}

impl KeypointIndex {
    pub const COUNT: usize = 17;

    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Nose),
            1 => Some(Self::LeftEye),
            2 => Some(Self::RightEye),
            3 => Some(Self::LeftEar),
            4 => Some(Self::RightEar),
            5 => Some(Self::LeftShoulder),
            6 => Some(Self::RightShoulder),
            7 => Some(Self::LeftElbow),
            8 => Some(Self::RightElbow),
            9 => Some(Self::LeftWrist),
            10 => Some(Self::RightWrist),
            11 => Some(Self::LeftHip),
            12 => Some(Self::RightHip),
            13 => Some(Self::LeftKnee),
            14 => Some(Self::RightKnee),
            15 => Some(Self::LeftAnkle),
            16 => Some(Self::RightAnkle),
            _ => None,
        }
    }

    /// 正準名（snake_case、ポーズ推定モデルの出力名と一致）
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nose => "nose",
            Self::LeftEye => "left_eye",
            Self::RightEye => "right_eye",
            Self::LeftEar => "left_ear",
            Self::RightEar => "right_ear",
            Self::LeftShoulder => "left_shoulder",
            Self::RightShoulder => "right_shoulder",
            Self::LeftElbow => "left_elbow",
            Self::RightElbow => "right_elbow",
            Self::LeftWrist => "left_wrist",
            Self::RightWrist => "right_wrist",
            Self::LeftHip => "left_hip",
            Self::RightHip => "right_hip",
            Self::LeftKnee => "left_knee",
            Self::RightKnee => "right_knee",
            Self::LeftAnkle => "left_ankle",
            Self::RightAnkle => "right_ankle",
        }
    }

    /// 名前からの逆引き（完全一致、大文字小文字を区別）
    pub fn from_name(name: &str) -> Option<Self> {
        (0..Self::COUNT)
            .filter_map(Self::from_index)
            .find(|idx| idx.as_str() == name)
    }
}

/// 単一キーポイント
///
/// 座標系は処理段階に依存する: 推定器からはフレームピクセル座標、
/// フレーム正規化後は 0.0〜1.0、バウンディングボックス正規化後も 0.0〜1.0。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    pub part: KeypointIndex,
    pub x: f32,
    pub y: f32,
    /// 信頼度スコア (0.0〜1.0)。None はスコアなし
    pub score: Option<f32>,
}

impl Keypoint {
    pub fn new(part: KeypointIndex, x: f32, y: f32, score: Option<f32>) -> Self {
        Self { part, x, y, score }
    }

    /// 信頼度が閾値以上か（スコアなしは常に有効扱い）
    pub fn is_valid(&self, threshold: f32) -> bool {
        self.score.map_or(true, |s| s >= threshold)
    }

    pub fn name(&self) -> &'static str {
        self.part.as_str()
    }
}

/// 1人分の検出結果（キーポイント列 + 全体スコア）
///
/// 推定器が毎フレーム生成する。フレームをまたいで保持されるのは
/// 直近1件のみ（`state::SharedPose`）。
#[derive(Debug, Clone)]
pub struct Pose {
    pub keypoints: Vec<Keypoint>,
    pub score: f32,
}

impl Pose {
    pub fn new(keypoints: Vec<Keypoint>, score: f32) -> Self {
        Self { keypoints, score }
    }

    /// インデックスでキーポイントを検索
    pub fn get(&self, part: KeypointIndex) -> Option<&Keypoint> {
        self.keypoints.iter().find(|kp| kp.part == part)
    }
}
