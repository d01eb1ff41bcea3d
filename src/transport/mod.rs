pub mod midi;
pub mod osc;

use log::warn;

use crate::pose::{scale_to_bounding_box, Keypoint, Pose};

pub use midi::{encode_midi_messages, MidiTransport};
pub use osc::{build_keypoint_message, OscTransport};

/// フレームのピクセルサイズ
#[derive(Debug, Clone, Copy)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

/// 送信前のフィルタ・正規化オプション
#[derive(Debug, Clone, Copy)]
pub struct TransportOptions {
    /// このスコア未満のキーポイントは送信しない
    pub score_threshold: f32,
    /// フレーム正規化後、さらにバウンディングボックス相対へ再スケール
    pub scale_pose: bool,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            score_threshold: 0.3,
            scale_pose: false,
        }
    }
}

/// 送信メッセージ1件分のペイロード
#[derive(Debug, Clone, PartialEq)]
pub struct KeypointMessage {
    /// 検出された人物のインデックス
    pub person: usize,
    /// ランドマークのインデックス
    pub index: usize,
    pub x: f32,
    pub y: f32,
    pub name: &'static str,
}

/// ポーズ列を送信ペイロード列へ変換する（OSC/MIDI共通の純粋部分）
///
/// キーポイントはフレームサイズで 0.0〜1.0 へ正規化し、
/// `scale_pose` 時はさらに自身のバウンディングボックスへ再スケール、
/// その後スコア閾値でフィルタして1キーポイント1メッセージを生成する。
/// 退化ポーズの再スケール失敗はそのポーズをスキップする（送信側を
/// 巻き込まない）。
pub fn keypoint_messages(
    poses: &[Pose],
    frame: FrameSize,
    options: &TransportOptions,
) -> Vec<KeypointMessage> {
    let mut messages = Vec::new();

    for (person, pose) in poses.iter().enumerate() {
        let mut keypoints: Vec<Keypoint> = pose
            .keypoints
            .iter()
            .map(|kp| Keypoint {
                part: kp.part,
                x: kp.x / frame.width as f32,
                y: kp.y / frame.height as f32,
                score: kp.score,
            })
            .collect();

        if options.scale_pose {
            match scale_to_bounding_box(&keypoints) {
                Ok(scaled) => keypoints = scaled,
                Err(e) => {
                    warn!("skipping pose {person}: {e}");
                    continue;
                }
            }
        }

        for (index, kp) in keypoints.iter().enumerate() {
            if !kp.is_valid(options.score_threshold) {
                continue;
            }
            messages.push(KeypointMessage {
                person,
                index,
                x: kp.x,
                y: kp.y,
                name: kp.name(),
            });
        }
    }

    messages
}
