use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub osc: OscConfig,
    #[serde(default)]
    pub transport: TransportConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClassifierConfig {
    /// 学習エポック数
    #[serde(default = "default_epochs")]
    pub epochs: usize,
    /// 検証データの割合
    #[serde(default = "default_validation_split")]
    pub validation_split: f32,
    /// AdamWの学習率
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    /// dropout率
    #[serde(default = "default_dropout")]
    pub dropout: f32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    /// 収集開始前のカウントダウン秒数
    #[serde(default = "default_countdown_seconds")]
    pub countdown_seconds: u32,
    /// 1セッションで収集するサンプル数
    #[serde(default = "default_sample_count")]
    pub sample_count: usize,
    /// サンプル間の待機（ミリ秒）
    #[serde(default = "default_inter_sample_delay_ms")]
    pub inter_sample_delay_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// サンプルストアの保存先パス
    #[serde(default = "default_storage_path")]
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OscConfig {
    /// OSC送信先 (host:port)
    #[serde(default = "default_osc_addr")]
    pub addr: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TransportConfig {
    /// 送信するキーポイントの最低スコア
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f32,
    /// バウンディングボックス相対座標で送信するか
    #[serde(default)]
    pub scale_pose: bool,
}

fn default_epochs() -> usize { 10 }
fn default_validation_split() -> f32 { 0.15 }
fn default_learning_rate() -> f64 { 1e-4 }
fn default_dropout() -> f32 { 0.5 }
fn default_countdown_seconds() -> u32 { 3 }
fn default_sample_count() -> usize { 10 }
fn default_inter_sample_delay_ms() -> u64 { 500 }
fn default_storage_path() -> String { "poses_data.json".to_string() }
fn default_osc_addr() -> String { crate::transport::osc::OSC_DEFAULT_ADDR.to_string() }
fn default_score_threshold() -> f32 { 0.3 }

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            epochs: default_epochs(),
            validation_split: default_validation_split(),
            learning_rate: default_learning_rate(),
            dropout: default_dropout(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            countdown_seconds: default_countdown_seconds(),
            sample_count: default_sample_count(),
            inter_sample_delay_ms: default_inter_sample_delay_ms(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

impl Default for OscConfig {
    fn default() -> Self {
        Self {
            addr: default_osc_addr(),
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            score_threshold: default_score_threshold(),
            scale_pose: false,
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// 設定ファイルが無ければデフォルトで起動
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        Self::load(path).unwrap_or_default()
    }
}

impl From<&ClassifierConfig> for crate::classifier::TrainOptions {
    fn from(config: &ClassifierConfig) -> Self {
        Self {
            epochs: config.epochs,
            validation_split: config.validation_split,
            learning_rate: config.learning_rate,
        }
    }
}
