use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::PoseError;
use crate::pose::{scale_to_bounding_box, Keypoint, KeypointIndex};

/// 1サンプルの特徴ベクトル長（x,yをランドマーク順にインターリーブ）
pub const FEATURE_LEN: usize = KeypointIndex::COUNT * 2;

/// ラベル → 正規化済みサンプル列のストア
///
/// ラベルの順序は明示的なリストで保持する（マップの列挙順に依存しない）。
/// 学習時のクラスインデックス = このリスト内の位置。
/// ラベル内のサンプル順は追加順（append-only）。
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SampleStore {
    labels: Vec<String>,
    samples: HashMap<String, Vec<Vec<f32>>>,
}

impl SampleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// キーポイント列を正規化・平坦化してラベルに追加
    ///
    /// 空ラベルは拒否。退化ポーズや特徴長の不一致はストアに入る前に
    /// エラーとして弾く。
    pub fn add_sample(&mut self, label: &str, keypoints: &[Keypoint]) -> Result<(), PoseError> {
        if label.is_empty() {
            return Err(PoseError::EmptyLabel);
        }

        let scaled = scale_to_bounding_box(keypoints)?;
        let features = flatten(&scaled);
        if features.len() != FEATURE_LEN {
            return Err(PoseError::FeatureLength {
                expected: FEATURE_LEN,
                got: features.len(),
            });
        }

        if !self.samples.contains_key(label) {
            self.labels.push(label.to_string());
            self.samples.insert(label.to_string(), Vec::new());
        }
        self.samples.get_mut(label).unwrap().push(features);

        Ok(())
    }

    /// ラベル一覧（登録順）
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn samples_for(&self, label: &str) -> Option<&[Vec<f32>]> {
        self.samples.get(label).map(|v| v.as_slice())
    }

    /// 全ラベルの合計サンプル数
    pub fn sample_count(&self) -> usize {
        self.samples.values().map(|v| v.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.sample_count() == 0
    }

    /// ストア全体をJSONへ（永続化スロットの値）
    pub fn to_json(&self) -> Result<Vec<u8>, PoseError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// JSONからストア全体を置き換える
    ///
    /// 入力が空なら「保存データなし」: 中身は空のまま、エラーにしない。
    /// 戻り値はデータを読み込んだかどうか。
    pub fn from_json(&mut self, bytes: &[u8]) -> Result<bool, PoseError> {
        if bytes.is_empty() {
            warn!("no stored pose data found");
            self.labels.clear();
            self.samples.clear();
            return Ok(false);
        }

        let loaded: SampleStore = serde_json::from_slice(bytes)?;
        *self = loaded;
        info!(
            "loaded {} samples across {} labels",
            self.sample_count(),
            self.labels.len()
        );
        Ok(true)
    }

    /// ファイルへ保存（スロット全体の置き換え）
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), PoseError> {
        let json = self.to_json()?;
        fs::write(path, json)?;
        Ok(())
    }

    /// ファイルから読み込み。ファイルが無ければ「保存データなし」扱い
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<bool, PoseError> {
        match fs::read(path) {
            Ok(bytes) => self.from_json(&bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("no stored pose data file");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// x,yをランドマーク順（入力順）にインターリーブして平坦化
fn flatten(keypoints: &[Keypoint]) -> Vec<f32> {
    let mut features = Vec::with_capacity(keypoints.len() * 2);
    for kp in keypoints {
        features.push(kp.x);
        features.push(kp.y);
    }
    features
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::KeypointIndex;

    fn full_pose(offset: f32) -> Vec<Keypoint> {
        (0..KeypointIndex::COUNT)
            .map(|i| {
                Keypoint::new(
                    KeypointIndex::from_index(i).unwrap(),
                    offset + i as f32,
                    offset + (i * 2) as f32,
                    Some(0.9),
                )
            })
            .collect()
    }

    #[test]
    fn test_add_sample() {
        let mut store = SampleStore::new();
        store.add_sample("wave", &full_pose(0.0)).unwrap();
        store.add_sample("wave", &full_pose(5.0)).unwrap();

        assert_eq!(store.labels(), &["wave".to_string()]);
        assert_eq!(store.samples_for("wave").unwrap().len(), 2);
        assert_eq!(store.samples_for("wave").unwrap()[0].len(), FEATURE_LEN);
        assert_eq!(store.sample_count(), 2);
    }

    #[test]
    fn test_add_sample_empty_label_rejected() {
        let mut store = SampleStore::new();
        assert!(matches!(
            store.add_sample("", &full_pose(0.0)),
            Err(PoseError::EmptyLabel)
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_add_sample_short_pose_rejected() {
        let mut store = SampleStore::new();
        let pose = full_pose(0.0);
        assert!(matches!(
            store.add_sample("wave", &pose[..5]),
            Err(PoseError::FeatureLength { expected: FEATURE_LEN, got: 10 })
        ));
    }

    #[test]
    fn test_add_sample_degenerate_pose_rejected() {
        let mut store = SampleStore::new();
        let flat: Vec<Keypoint> = (0..KeypointIndex::COUNT)
            .map(|i| Keypoint::new(KeypointIndex::from_index(i).unwrap(), 5.0, i as f32, None))
            .collect();
        assert!(matches!(
            store.add_sample("wave", &flat),
            Err(PoseError::DegeneratePose { .. })
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_label_order_is_insertion_order() {
        let mut store = SampleStore::new();
        store.add_sample("zeta", &full_pose(0.0)).unwrap();
        store.add_sample("alpha", &full_pose(1.0)).unwrap();
        store.add_sample("zeta", &full_pose(2.0)).unwrap();

        assert_eq!(store.labels(), &["zeta".to_string(), "alpha".to_string()]);
    }

    #[test]
    fn test_json_round_trip() {
        let mut store = SampleStore::new();
        store.add_sample("up", &full_pose(0.0)).unwrap();
        store.add_sample("down", &full_pose(3.0)).unwrap();
        store.add_sample("up", &full_pose(7.0)).unwrap();

        let json = store.to_json().unwrap();

        let mut restored = SampleStore::new();
        assert!(restored.from_json(&json).unwrap());

        assert_eq!(restored.labels(), store.labels());
        for label in store.labels() {
            assert_eq!(restored.samples_for(label), store.samples_for(label));
        }
    }

    #[test]
    fn test_from_json_empty_is_no_data() {
        let mut store = SampleStore::new();
        store.add_sample("up", &full_pose(0.0)).unwrap();

        // 空入力 = 保存データなし、エラーではない
        assert!(!store.from_json(&[]).unwrap());
        assert!(store.is_empty());
        assert!(store.labels().is_empty());
    }

    #[test]
    fn test_from_json_corrupt_is_error() {
        let mut store = SampleStore::new();
        assert!(store.from_json(b"not json").is_err());
    }

    #[test]
    fn test_load_missing_file_is_no_data() {
        let mut store = SampleStore::new();
        assert!(!store.load("/nonexistent/poses_data.json").unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn test_save_and_load_file() {
        let mut store = SampleStore::new();
        store.add_sample("sit", &full_pose(0.0)).unwrap();

        let path = std::env::temp_dir().join("pose_trainer_store_test.json");
        store.save(&path).unwrap();

        let mut restored = SampleStore::new();
        assert!(restored.load(&path).unwrap());
        assert_eq!(restored.labels(), store.labels());

        let _ = std::fs::remove_file(&path);
    }
}
