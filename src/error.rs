use crate::pose::KeypointIndex;

/// 幾何・ストア・分類器で共有するエラー型
///
/// 「未学習のpredict」「保存データなし」はエラーではなく
/// `Ok(None)` / 空ストアとして扱う（§ not-ready）。
#[derive(Debug, thiserror::Error)]
pub enum PoseError {
    /// キーポイント列が空
    #[error("keypoint sequence is empty")]
    EmptyKeypoints,

    /// ラベルが空文字列
    #[error("label is required")]
    EmptyLabel,

    /// バウンディングボックスの幅または高さがゼロ（退化ポーズ）
    #[error("degenerate pose: zero-{axis} bounding box")]
    DegeneratePose { axis: &'static str },

    /// 必須ランドマークが入力に存在しない
    #[error("missing landmark: {0:?}")]
    MissingLandmark(KeypointIndex),

    /// 特徴ベクトル長の不一致
    #[error("feature vector length mismatch: expected {expected}, got {got}")]
    FeatureLength { expected: usize, got: usize },

    /// サンプルが1件もない状態でのtrain
    #[error("no samples collected")]
    NoSamples,

    /// ストアのJSONが壊れている
    #[error("stored data is corrupt: {0}")]
    CorruptData(#[from] serde_json::Error),

    /// 永続化スロットの読み書き失敗
    #[error("storage I/O: {0}")]
    Io(#[from] std::io::Error),

    /// candle側のエラー
    #[error("model error: {0}")]
    Model(#[from] candle_core::Error),
}
