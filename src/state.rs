use std::sync::{Arc, Mutex};

use crate::pose::Pose;

/// 直近1件の検出ポーズを共有するスロット
///
/// 推論側が毎フレーム `set` し、収集ループが `snapshot` で読む。
/// 書き手は推論側の1箇所、読み手は収集ループの1箇所（single-writer /
/// single-reader）。検出なしのフレームでは `clear` される。
#[derive(Clone, Default)]
pub struct SharedPose {
    inner: Arc<Mutex<Option<Pose>>>,
}

impl SharedPose {
    pub fn new() -> Self {
        Self::default()
    }

    /// 推論結果で上書き（フレームごとに1回）
    pub fn set(&self, pose: Pose) {
        *self.inner.lock().unwrap() = Some(pose);
    }

    /// 検出なしフレーム
    pub fn clear(&self) {
        *self.inner.lock().unwrap() = None;
    }

    /// 直近ポーズのコピーを取得（未検出ならNone）
    pub fn snapshot(&self) -> Option<Pose> {
        self.inner.lock().unwrap().clone()
    }
}
