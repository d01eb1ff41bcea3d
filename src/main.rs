use anyhow::Result;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pose_trainer::classifier::{PoseClassifier, SessionController, TrainOptions};
use pose_trainer::config::Config;
use pose_trainer::pose::{Keypoint, KeypointIndex, Pose};
use pose_trainer::state::SharedPose;
use pose_trainer::transport::{FrameSize, OscTransport, TransportOptions};

const CONFIG_PATH: &str = "config.toml";

/// 合成ポーズ生成（推論パイプラインのスタンドイン）
///
/// variantで体形の広がりを変えられるので、ラベルごとに違う形を
/// 収集して分類を試せる。座標はフレームピクセル。
fn synthetic_pose(variant: f32, t: f32) -> Pose {
    let keypoints = (0..KeypointIndex::COUNT)
        .map(|i| {
            let part = KeypointIndex::from_index(i).unwrap();
            let spread = 40.0 + variant * 60.0;
            let x = 320.0 + (i as f32 * 0.7).sin() * spread + (t * 2.0).sin() * 3.0;
            let y = 80.0 + i as f32 * 20.0 + (t * 1.3).cos() * 3.0;
            Keypoint::new(part, x, y, Some(0.9))
        })
        .collect();
    Pose::new(keypoints, 0.9)
}

fn main() -> Result<()> {
    env_logger::init();

    let config = Config::load_or_default(CONFIG_PATH);
    let frame = FrameSize { width: 640, height: 480 };
    let transport_options = TransportOptions {
        score_threshold: config.transport.score_threshold,
        scale_pose: config.transport.scale_pose,
    };

    let shared = SharedPose::new();
    let variant = Arc::new(Mutex::new(0.0f32));
    let osc_enabled = Arc::new(AtomicBool::new(false));
    let running = Arc::new(AtomicBool::new(true));

    // フレームスレッド: 毎フレーム合成ポーズを書き込み、OSC送信（任意）
    let frame_thread = {
        let shared = shared.clone();
        let variant = Arc::clone(&variant);
        let osc_enabled = Arc::clone(&osc_enabled);
        let running = Arc::clone(&running);
        let mut osc = OscTransport::new(&config.osc.addr);
        std::thread::spawn(move || {
            let mut t = 0.0f32;
            while running.load(Ordering::Relaxed) {
                let v = *variant.lock().unwrap();
                let pose = synthetic_pose(v, t);
                if osc_enabled.load(Ordering::Relaxed) {
                    osc.transmit_poses(std::slice::from_ref(&pose), frame, &transport_options);
                }
                shared.set(pose);
                t += 1.0 / 30.0;
                std::thread::sleep(Duration::from_millis(33));
            }
        })
    };

    let classifier = PoseClassifier::new(
        TrainOptions::from(&config.classifier),
        config.classifier.dropout,
    );
    let mut controller = SessionController::new(classifier, shared);

    println!("=== Pose Trainer ({}) ===", env!("GIT_VERSION"));
    println!("OSC送信先: {}", config.osc.addr);
    println!();
    println!("コマンド:");
    println!("  n <label>     - 収集先ラベルを設定 (現在: {})", controller.current_pose_name);
    println!("  f <value>     - 合成ポーズの形を変更 (例: f 1.5)");
    println!("  c             - サンプル収集 ({}個, カウントダウン{}秒)", config.session.sample_count, config.session.countdown_seconds);
    println!("  t             - 学習");
    println!("  p             - 直近ポーズを推論");
    println!("  s / l         - ストアを保存 / 読み込み ({})", config.storage.path);
    println!("  o             - OSC送信のON/OFF");
    println!("  q             - 終了");
    println!();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let parts: Vec<&str> = input.trim().split_whitespace().collect();

        if parts.is_empty() {
            continue;
        }

        match parts[0] {
            "n" if parts.len() == 2 => {
                controller.current_pose_name = parts[1].to_string();
                println!("ラベル: {}", controller.current_pose_name);
            }
            "f" if parts.len() == 2 => {
                let v: f32 = parts[1].parse()?;
                *variant.lock().unwrap() = v;
                println!("合成ポーズ: variant = {}", v);
            }
            "c" => {
                let mut progress = |text: &str| {
                    if !text.is_empty() {
                        println!("{}", text);
                    }
                };
                match controller.collect(
                    config.session.sample_count,
                    config.session.countdown_seconds,
                    Duration::from_millis(config.session.inter_sample_delay_ms),
                    &mut progress,
                ) {
                    Ok(count) => println!("{}サンプル収集しました", count),
                    Err(e) => println!("収集失敗: {}", e),
                }
            }
            "t" => match controller.train() {
                Ok(()) => println!("学習完了"),
                Err(e) => println!("学習失敗: {}", e),
            },
            "p" => match controller.predict() {
                Ok(Some(prediction)) => {
                    println!(
                        "予測: {} ({:.1}%)",
                        prediction.label,
                        prediction.probability * 100.0
                    );
                    println!("分布: {:?}", prediction.distribution);
                }
                Ok(None) => println!("未学習またはポーズ未検出です"),
                Err(e) => println!("推論失敗: {}", e),
            },
            "s" => match controller.save(&config.storage.path) {
                Ok(()) => println!("保存しました"),
                Err(e) => println!("保存失敗: {}", e),
            },
            "l" => match controller.load(&config.storage.path) {
                Ok(true) => println!(
                    "読み込みました ({}サンプル)",
                    controller.classifier().store().sample_count()
                ),
                Ok(false) => println!("保存データがありません"),
                Err(e) => println!("読み込み失敗: {}", e),
            },
            "o" => {
                let enabled = !osc_enabled.load(Ordering::Relaxed);
                osc_enabled.store(enabled, Ordering::Relaxed);
                println!("OSC送信: {}", if enabled { "ON" } else { "OFF" });
            }
            "q" => {
                println!("終了します");
                break;
            }
            _ => {
                println!("不明なコマンド: {}", parts[0]);
            }
        }
    }

    running.store(false, Ordering::Relaxed);
    let _ = frame_thread.join();

    Ok(())
}
