pub mod model;
pub mod session;
pub mod store;

use std::path::Path;

use log::{info, warn};

use crate::error::PoseError;
use crate::pose::{scale_to_bounding_box, Keypoint};

pub use model::{ClassifierModel, TrainOptions};
pub use session::{Clock, CollectSession, SessionController, SessionState, SystemClock};
pub use store::{SampleStore, FEATURE_LEN};

/// 1回の推論結果
#[derive(Debug, Clone)]
pub struct Prediction {
    pub label: String,
    /// 予測ラベルのsoftmax確率
    pub probability: f32,
    /// 学習時ラベル順の全クラス分布
    pub distribution: Vec<f32>,
}

/// 学習済みモデルと、その学習時点で凍結されたラベル語彙
///
/// 両者は常に1つの構造体として丸ごと差し替えられるため、
/// モデルと語彙の不整合な組み合わせは存在しない。
struct TrainedClassifier {
    model: ClassifierModel,
    labels: Vec<String>,
}

/// サンプル収集 → 学習 → 推論のオーケストレーション
///
/// 状態は Untrained → Trained の一方向。再学習のみがTrainedを
/// 再突入させ、モデル＋語彙を丸ごと置き換える。
pub struct PoseClassifier {
    store: SampleStore,
    trained: Option<TrainedClassifier>,
    options: TrainOptions,
    dropout_rate: f32,
}

impl Default for PoseClassifier {
    fn default() -> Self {
        Self::new(TrainOptions::default(), 0.5)
    }
}

impl PoseClassifier {
    pub fn new(options: TrainOptions, dropout_rate: f32) -> Self {
        Self {
            store: SampleStore::new(),
            trained: None,
            options,
            dropout_rate,
        }
    }

    /// キーポイント列を正規化してラベル付きサンプルとして追加
    pub fn add_sample(&mut self, label: &str, keypoints: &[Keypoint]) -> Result<(), PoseError> {
        self.store.add_sample(label, keypoints)
    }

    pub fn store(&self) -> &SampleStore {
        &self.store
    }

    pub fn is_trained(&self) -> bool {
        self.trained.is_some()
    }

    /// 蓄積サンプル全体からモデルを学習する
    ///
    /// クラスインデックス = 呼び出し時点のストアのラベル順。
    /// 成功時は既存の学習結果を丸ごと置き換える。
    pub fn train(&mut self) -> Result<(), PoseError> {
        if self.store.is_empty() {
            return Err(PoseError::NoSamples);
        }

        let labels: Vec<String> = self.store.labels().to_vec();

        let mut features: Vec<Vec<f32>> = Vec::new();
        let mut targets: Vec<u32> = Vec::new();
        for (class, label) in labels.iter().enumerate() {
            for sample in self.store.samples_for(label).unwrap_or(&[]) {
                features.push(sample.clone());
                targets.push(class as u32);
            }
        }

        let mut model = ClassifierModel::new(FEATURE_LEN, labels.len(), self.dropout_rate)?;
        model.fit(&features, &targets, &self.options)?;

        info!(
            "trained on {} samples, {} labels",
            features.len(),
            labels.len()
        );
        self.trained = Some(TrainedClassifier { model, labels });
        Ok(())
    }

    /// キーポイント列のラベルを推論する
    ///
    /// 未学習なら `Ok(None)`（not-ready、エラーではない）。
    /// 入力は学習時と同じバウンディングボックス正規化を通す。
    /// argmaxの同値は最小インデックス（学習時に先に見たラベル）が勝つ。
    pub fn predict(&self, keypoints: &[Keypoint]) -> Result<Option<Prediction>, PoseError> {
        let trained = match &self.trained {
            Some(t) => t,
            None => {
                warn!("model is not trained yet");
                return Ok(None);
            }
        };

        let scaled = scale_to_bounding_box(keypoints)?;
        let mut features = Vec::with_capacity(scaled.len() * 2);
        for kp in &scaled {
            features.push(kp.x);
            features.push(kp.y);
        }
        if features.len() != FEATURE_LEN {
            return Err(PoseError::FeatureLength {
                expected: FEATURE_LEN,
                got: features.len(),
            });
        }

        let distribution = trained.model.predict_proba(&features)?;

        let mut best = 0;
        for (i, p) in distribution.iter().enumerate() {
            if *p > distribution[best] {
                best = i;
            }
        }

        Ok(Some(Prediction {
            label: trained.labels[best].clone(),
            probability: distribution[best],
            distribution,
        }))
    }

    /// ストアを永続化スロットへ保存
    pub fn save_to_storage<P: AsRef<Path>>(&self, path: P) -> Result<(), PoseError> {
        self.store.save(path)
    }

    /// 永続化スロットからストアを復元
    ///
    /// 学習済みモデルの凍結語彙には影響しない。戻り値はデータ有無。
    pub fn load_from_storage<P: AsRef<Path>>(&mut self, path: P) -> Result<bool, PoseError> {
        self.store.load(path)
    }
}
