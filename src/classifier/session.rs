use std::time::Duration;

use log::warn;

use crate::error::PoseError;
use crate::pose::Pose;
use crate::state::SharedPose;

use super::{PoseClassifier, Prediction};

/// 待機の注入点（テストでは仮想クロックに差し替える）
pub trait Clock {
    fn sleep(&self, duration: Duration);
}

/// 実時間で待機するクロック
pub struct SystemClock;

impl Clock for SystemClock {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// 収集セッションの進行状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    /// カウントダウン中（残り秒数）
    Counting { remaining: u32 },
    /// サンプル収集中（完了したイテレーション数）
    Collecting { iteration: usize },
    Done,
}

/// 1ラベル分の収集セッション
///
/// カウントダウン → サンプル収集の台本を明示的な状態機械として進める。
/// `tick` が1ステップ実行し、次のtickまでの待機時間を返す（Noneで完了）。
/// 待機は呼び出し側が`Clock`経由で行うため、実時間なしでテストできる。
pub struct CollectSession {
    label: String,
    total: usize,
    countdown_seconds: u32,
    inter_sample_delay: Duration,
    state: SessionState,
    collected: usize,
}

impl CollectSession {
    pub fn new(
        label: &str,
        sample_count: usize,
        countdown_seconds: u32,
        inter_sample_delay: Duration,
    ) -> Self {
        Self {
            label: label.to_string(),
            total: sample_count,
            countdown_seconds,
            inter_sample_delay,
            state: SessionState::Idle,
            collected: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// 実際にストアへ入ったサンプル数
    pub fn collected(&self) -> usize {
        self.collected
    }

    /// 状態機械を1ステップ進める
    ///
    /// 収集イテレーションでは直近ポーズを1サンプルとして追加する。
    /// ポーズ未検出や不正サンプルはログして次のイテレーションへ進む
    /// （瞬間的な検出抜けでセッション全体を捨てない）。
    pub fn tick(
        &mut self,
        classifier: &mut PoseClassifier,
        latest: Option<&Pose>,
        progress: &mut dyn FnMut(&str),
    ) -> Option<Duration> {
        match self.state {
            SessionState::Idle => {
                self.state = SessionState::Counting {
                    remaining: self.countdown_seconds,
                };
                progress(&format!(
                    "Prepare to collect data in {}s",
                    self.countdown_seconds
                ));
                Some(Duration::from_secs(1))
            }
            SessionState::Counting { remaining } if remaining > 0 => {
                let remaining = remaining - 1;
                self.state = SessionState::Counting { remaining };
                progress(&format!("Prepare to collect data in {remaining}s"));
                Some(Duration::from_secs(1))
            }
            SessionState::Counting { .. } => {
                self.state = SessionState::Collecting { iteration: 0 };
                self.tick(classifier, latest, progress)
            }
            SessionState::Collecting { iteration } => {
                if iteration >= self.total {
                    self.state = SessionState::Done;
                    progress("");
                    return None;
                }

                progress(&format!("Collecting {}/{} sample", iteration + 1, self.total));

                match latest {
                    Some(pose) => match classifier.add_sample(&self.label, &pose.keypoints) {
                        Ok(()) => self.collected += 1,
                        Err(e) => warn!("skipping sample {}: {e}", iteration + 1),
                    },
                    None => warn!("no pose detected, skipping sample {}", iteration + 1),
                }

                let next = iteration + 1;
                if next >= self.total {
                    self.state = SessionState::Done;
                    progress("");
                    None
                } else {
                    self.state = SessionState::Collecting { iteration: next };
                    Some(self.inter_sample_delay)
                }
            }
            SessionState::Done => None,
        }
    }
}

/// GUI/コンソールのトリガーと分類器をつなぐコントローラ
///
/// 収集台本の駆動と、train/predict/save/load のパススルーを提供する。
/// `current_pose_name` はUIがバインドする収集先ラベル。
pub struct SessionController<C: Clock = SystemClock> {
    classifier: PoseClassifier,
    shared: SharedPose,
    clock: C,
    pub current_pose_name: String,
}

impl SessionController<SystemClock> {
    pub fn new(classifier: PoseClassifier, shared: SharedPose) -> Self {
        Self::with_clock(classifier, shared, SystemClock)
    }
}

impl<C: Clock> SessionController<C> {
    pub fn with_clock(classifier: PoseClassifier, shared: SharedPose, clock: C) -> Self {
        Self {
            classifier,
            shared,
            clock,
            current_pose_name: "pose1".to_string(),
        }
    }

    pub fn classifier(&self) -> &PoseClassifier {
        &self.classifier
    }

    /// `current_pose_name` ラベルでサンプルを収集する
    ///
    /// カウントダウンを1秒刻みで進めてから、指定回数サンプルを取る。
    /// 戻り値は実際に追加できたサンプル数。
    pub fn collect(
        &mut self,
        sample_count: usize,
        countdown_seconds: u32,
        inter_sample_delay: Duration,
        progress: &mut dyn FnMut(&str),
    ) -> Result<usize, PoseError> {
        if self.current_pose_name.is_empty() {
            return Err(PoseError::EmptyLabel);
        }

        let mut session = CollectSession::new(
            &self.current_pose_name,
            sample_count,
            countdown_seconds,
            inter_sample_delay,
        );

        loop {
            let latest = self.shared.snapshot();
            match session.tick(&mut self.classifier, latest.as_ref(), progress) {
                Some(wait) => self.clock.sleep(wait),
                None => break,
            }
        }

        Ok(session.collected())
    }

    pub fn train(&mut self) -> Result<(), PoseError> {
        self.classifier.train()
    }

    /// 直近の検出ポーズを推論する（ポーズなし・未学習はOk(None)）
    pub fn predict(&self) -> Result<Option<Prediction>, PoseError> {
        match self.shared.snapshot() {
            Some(pose) => self.classifier.predict(&pose.keypoints),
            None => {
                warn!("no pose to predict");
                Ok(None)
            }
        }
    }

    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), PoseError> {
        self.classifier.save_to_storage(path)
    }

    pub fn load<P: AsRef<std::path::Path>>(&mut self, path: P) -> Result<bool, PoseError> {
        self.classifier.load_from_storage(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::{Keypoint, KeypointIndex};
    use std::cell::RefCell;

    /// 実時間を使わず待機を記録するクロック
    struct VirtualClock {
        slept: RefCell<Vec<Duration>>,
    }

    impl VirtualClock {
        fn new() -> Self {
            Self {
                slept: RefCell::new(Vec::new()),
            }
        }
    }

    impl Clock for VirtualClock {
        fn sleep(&self, duration: Duration) {
            self.slept.borrow_mut().push(duration);
        }
    }

    fn full_pose(seed: f32) -> Pose {
        let keypoints = (0..KeypointIndex::COUNT)
            .map(|i| {
                Keypoint::new(
                    KeypointIndex::from_index(i).unwrap(),
                    seed + i as f32,
                    seed + (i * 3 % 7) as f32,
                    Some(0.9),
                )
            })
            .collect();
        Pose::new(keypoints, 0.9)
    }

    #[test]
    fn test_session_countdown_and_collect_sequence() {
        let mut classifier = PoseClassifier::default();
        let pose = full_pose(0.0);
        let mut session = CollectSession::new("wave", 3, 2, Duration::from_millis(500));
        let mut messages: Vec<String> = Vec::new();
        let mut progress = |text: &str| messages.push(text.to_string());

        let mut waits = Vec::new();
        while let Some(wait) = session.tick(&mut classifier, Some(&pose), &mut progress) {
            waits.push(wait);
        }

        assert_eq!(session.state(), SessionState::Done);
        assert_eq!(session.collected(), 3);
        assert_eq!(
            messages,
            vec![
                "Prepare to collect data in 2s",
                "Prepare to collect data in 1s",
                "Prepare to collect data in 0s",
                "Collecting 1/3 sample",
                "Collecting 2/3 sample",
                "Collecting 3/3 sample",
                "",
            ]
        );
        // カウントダウン3回は1秒、サンプル間2回は500ms
        assert_eq!(
            waits,
            vec![
                Duration::from_secs(1),
                Duration::from_secs(1),
                Duration::from_secs(1),
                Duration::from_millis(500),
                Duration::from_millis(500),
            ]
        );
    }

    #[test]
    fn test_session_missing_pose_skips_and_continues() {
        let mut classifier = PoseClassifier::default();
        let mut session = CollectSession::new("wave", 2, 0, Duration::from_millis(1));
        let mut progress = |_: &str| {};

        while session.tick(&mut classifier, None, &mut progress).is_some() {}

        // ポーズ未検出でもセッションは完走し、サンプルは入らない
        assert_eq!(session.state(), SessionState::Done);
        assert_eq!(session.collected(), 0);
        assert!(classifier.store().is_empty());
    }

    #[test]
    fn test_session_zero_samples() {
        let mut classifier = PoseClassifier::default();
        let pose = full_pose(0.0);
        let mut session = CollectSession::new("wave", 0, 0, Duration::from_millis(1));
        let mut progress = |_: &str| {};

        while session.tick(&mut classifier, Some(&pose), &mut progress).is_some() {}

        assert_eq!(session.collected(), 0);
        assert_eq!(session.state(), SessionState::Done);
    }

    #[test]
    fn test_controller_collect_with_virtual_clock() {
        let shared = SharedPose::new();
        shared.set(full_pose(1.0));

        let mut controller = SessionController::with_clock(
            PoseClassifier::default(),
            shared,
            VirtualClock::new(),
        );
        controller.current_pose_name = "lean".to_string();

        let mut progress = |_: &str| {};
        let collected = controller
            .collect(5, 1, Duration::from_millis(500), &mut progress)
            .unwrap();

        assert_eq!(collected, 5);
        assert_eq!(
            controller.classifier().store().samples_for("lean").unwrap().len(),
            5
        );
    }

    #[test]
    fn test_controller_collect_empty_label_rejected() {
        let mut controller = SessionController::with_clock(
            PoseClassifier::default(),
            SharedPose::new(),
            VirtualClock::new(),
        );
        controller.current_pose_name = String::new();

        let mut progress = |_: &str| {};
        let result = controller.collect(1, 0, Duration::from_millis(1), &mut progress);
        assert!(matches!(result, Err(PoseError::EmptyLabel)));
    }

    #[test]
    fn test_controller_predict_without_pose_is_none() {
        let controller = SessionController::with_clock(
            PoseClassifier::default(),
            SharedPose::new(),
            VirtualClock::new(),
        );
        assert!(controller.predict().unwrap().is_none());
    }

    #[test]
    fn test_controller_collect_then_train_then_predict() {
        let shared = SharedPose::new();
        shared.set(full_pose(2.0));

        let mut controller = SessionController::with_clock(
            PoseClassifier::default(),
            shared.clone(),
            VirtualClock::new(),
        );
        controller.current_pose_name = "stand".to_string();

        let mut progress = |_: &str| {};
        controller
            .collect(3, 0, Duration::from_millis(1), &mut progress)
            .unwrap();
        controller.train().unwrap();

        let prediction = controller.predict().unwrap().unwrap();
        assert_eq!(prediction.label, "stand");
    }
}
