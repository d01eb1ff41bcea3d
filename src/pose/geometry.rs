use crate::error::PoseError;

use super::keypoint::{Keypoint, KeypointIndex};

/// キーポイント列のバウンディングボックス（軸ごとのmin/max）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x_min: f32,
    pub x_max: f32,
    pub y_min: f32,
    pub y_max: f32,
}

impl BoundingBox {
    pub fn width(&self) -> f32 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f32 {
        self.y_max - self.y_min
    }
}

/// キーポイント列からバウンディングボックスを計算
///
/// 空の入力はエラー（min/maxが定義できない）。
pub fn bounding_box(keypoints: &[Keypoint]) -> Result<BoundingBox, PoseError> {
    let first = keypoints.first().ok_or(PoseError::EmptyKeypoints)?;

    let mut bbox = BoundingBox {
        x_min: first.x,
        x_max: first.x,
        y_min: first.y,
        y_max: first.y,
    };

    for kp in &keypoints[1..] {
        bbox.x_min = bbox.x_min.min(kp.x);
        bbox.x_max = bbox.x_max.max(kp.x);
        bbox.y_min = bbox.y_min.min(kp.y);
        bbox.y_max = bbox.y_max.max(kp.y);
    }

    Ok(bbox)
}

/// 各キーポイントを自身のバウンディングボックスで 0.0〜1.0 に正規化
///
/// 位置・サイズに不変な体形表現。part/scoreはそのまま保持する。
/// 幅または高さがゼロの退化ポーズは `DegeneratePose` で拒否する
/// （NaNを学習データへ流さない）。
pub fn scale_to_bounding_box(keypoints: &[Keypoint]) -> Result<Vec<Keypoint>, PoseError> {
    let bbox = bounding_box(keypoints)?;

    if bbox.width() == 0.0 {
        return Err(PoseError::DegeneratePose { axis: "width" });
    }
    if bbox.height() == 0.0 {
        return Err(PoseError::DegeneratePose { axis: "height" });
    }

    Ok(keypoints
        .iter()
        .map(|kp| Keypoint {
            part: kp.part,
            x: (kp.x - bbox.x_min) / bbox.width(),
            y: (kp.y - bbox.y_min) / bbox.height(),
            score: kp.score,
        })
        .collect())
}

/// 胴体中心（左右の肩・左右の腰の平均座標）
///
/// 4点のいずれかが入力に無ければ `MissingLandmark`。
pub fn torso_center(keypoints: &[Keypoint]) -> Result<(f32, f32), PoseError> {
    let find = |part: KeypointIndex| {
        keypoints
            .iter()
            .find(|kp| kp.part == part)
            .ok_or(PoseError::MissingLandmark(part))
    };

    let left_shoulder = find(KeypointIndex::LeftShoulder)?;
    let right_shoulder = find(KeypointIndex::RightShoulder)?;
    let left_hip = find(KeypointIndex::LeftHip)?;
    let right_hip = find(KeypointIndex::RightHip)?;

    let x = (left_shoulder.x + right_shoulder.x + left_hip.x + right_hip.x) / 4.0;
    let y = (left_shoulder.y + right_shoulder.y + left_hip.y + right_hip.y) / 4.0;

    Ok((x, y))
}
