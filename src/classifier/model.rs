use candle_core::{DType, Device, Result, Tensor, D};
use candle_nn::{linear, loss, ops, AdamW, Dropout, Linear, Module, Optimizer, ParamsAdamW, VarBuilder, VarMap};
use log::debug;
use rand::seq::SliceRandom;

/// 学習ハイパーパラメータ
#[derive(Debug, Clone, Copy)]
pub struct TrainOptions {
    pub epochs: usize,
    /// 学習データから切り出す検証データの割合
    pub validation_split: f32,
    pub learning_rate: f64,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            epochs: 10,
            validation_split: 0.15,
            learning_rate: 1e-4,
        }
    }
}

/// 小さな全結合分類ネットワーク
///
/// dense(in→in, relu) → dropout → dense(in→in/2, relu) → dropout →
/// dense(→クラス数)。損失はcross entropy、推論時はsoftmax分布を返す。
/// 最適化・逆伝播はcandleに委譲する。
pub struct ClassifierModel {
    varmap: VarMap,
    fc1: Linear,
    fc2: Linear,
    fc3: Linear,
    dropout: Dropout,
    device: Device,
    input_len: usize,
    num_classes: usize,
}

impl ClassifierModel {
    pub fn new(input_len: usize, num_classes: usize, dropout_rate: f32) -> Result<Self> {
        let device = Device::Cpu;
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);

        let middle = input_len / 2;
        let fc1 = linear(input_len, input_len, vb.pp("fc1"))?;
        let fc2 = linear(input_len, middle, vb.pp("fc2"))?;
        let fc3 = linear(middle, num_classes, vb.pp("fc3"))?;

        Ok(Self {
            varmap,
            fc1,
            fc2,
            fc3,
            dropout: Dropout::new(dropout_rate),
            device,
            input_len,
            num_classes,
        })
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// 順伝播（logitsを返す。dropoutは学習時のみ有効）
    fn forward(&self, xs: &Tensor, train: bool) -> Result<Tensor> {
        let xs = self.fc1.forward(xs)?.relu()?;
        let xs = self.dropout.forward(&xs, train)?;
        let xs = self.fc2.forward(&xs)?.relu()?;
        let xs = self.dropout.forward(&xs, train)?;
        self.fc3.forward(&xs)
    }

    /// 蓄積サンプルで学習する
    ///
    /// シャッフル後に末尾validation_split分を検証用に切り出す
    /// （学習サンプルが最低1件残るように切り詰める）。
    /// エポックごとにAdamWで全バッチ1ステップ。
    pub fn fit(&mut self, features: &[Vec<f32>], targets: &[u32], opts: &TrainOptions) -> Result<()> {
        let n = features.len();
        assert_eq!(n, targets.len());

        let mut indices: Vec<usize> = (0..n).collect();
        indices.shuffle(&mut rand::rng());

        let mut val_len = (n as f32 * opts.validation_split).floor() as usize;
        if val_len >= n {
            val_len = n - 1;
        }
        let (train_idx, val_idx) = indices.split_at(n - val_len);

        let train_x = self.feature_tensor(features, train_idx)?;
        let train_y = self.target_tensor(targets, train_idx)?;
        let val = if val_idx.is_empty() {
            None
        } else {
            Some((
                self.feature_tensor(features, val_idx)?,
                self.target_tensor(targets, val_idx)?,
            ))
        };

        let params = ParamsAdamW {
            lr: opts.learning_rate,
            ..Default::default()
        };
        let mut optimizer = AdamW::new(self.varmap.all_vars(), params)?;

        for epoch in 0..opts.epochs {
            let logits = self.forward(&train_x, true)?;
            let train_loss = loss::cross_entropy(&logits, &train_y)?;
            optimizer.backward_step(&train_loss)?;

            match &val {
                Some((val_x, val_y)) => {
                    let val_logits = self.forward(val_x, false)?;
                    let val_loss = loss::cross_entropy(&val_logits, val_y)?;
                    debug!(
                        "epoch {}: loss {:.4}, val_loss {:.4}",
                        epoch + 1,
                        train_loss.to_scalar::<f32>()?,
                        val_loss.to_scalar::<f32>()?
                    );
                }
                None => {
                    debug!("epoch {}: loss {:.4}", epoch + 1, train_loss.to_scalar::<f32>()?);
                }
            }
        }

        Ok(())
    }

    /// 1サンプルのsoftmax分布を返す
    pub fn predict_proba(&self, features: &[f32]) -> Result<Vec<f32>> {
        let xs = Tensor::from_slice(features, (1, self.input_len), &self.device)?;
        let logits = self.forward(&xs, false)?;
        let probs = ops::softmax(&logits, D::Minus1)?;
        probs.squeeze(0)?.to_vec1::<f32>()
    }

    fn feature_tensor(&self, features: &[Vec<f32>], indices: &[usize]) -> Result<Tensor> {
        let mut flat = Vec::with_capacity(indices.len() * self.input_len);
        for &i in indices {
            flat.extend_from_slice(&features[i]);
        }
        Tensor::from_vec(flat, (indices.len(), self.input_len), &self.device)
    }

    fn target_tensor(&self, targets: &[u32], indices: &[usize]) -> Result<Tensor> {
        let picked: Vec<u32> = indices.iter().map(|&i| targets[i]).collect();
        Tensor::from_vec(picked, (indices.len(),), &self.device)
    }
}
