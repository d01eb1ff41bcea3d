use log::warn;
use midir::{MidiOutput, MidiOutputConnection};

use crate::pose::Pose;

use super::{keypoint_messages, FrameSize, KeypointMessage, TransportOptions};

const NOTE_ON: u8 = 0x90;
const VELOCITY: u8 = 0x7f;

/// 0.0〜1.0 をMIDIデータバイト(0〜127)へ変換（範囲外はクランプ）
pub fn float_to_midi(value: f32) -> u8 {
    (value * 127.0).floor().clamp(0.0, 127.0) as u8
}

/// キーポイント1件を2つのNOTE_ONメッセージへエンコード
///
/// x→偶数側チャンネル、y→奇数側チャンネル。チャンネルの組は
/// ランドマークインデックスから `(index * 2) % 16` で割り当てる。
pub fn encode_midi_messages(msg: &KeypointMessage) -> [[u8; 3]; 2] {
    let channel = (msg.index * 2) % 16;
    [
        [NOTE_ON | channel as u8, float_to_midi(msg.x), VELOCITY],
        [NOTE_ON | (channel as u8 + 1), float_to_midi(msg.y), VELOCITY],
    ]
}

/// MIDI出力デバイスへの送信クライアント
///
/// デバイスが無い環境でも構築は成功する（送信はスキップ、ログのみ）。
pub struct MidiTransport {
    connection: Option<MidiOutputConnection>,
}

impl MidiTransport {
    /// 最初に見つかった出力ポートへ接続する
    pub fn new() -> Self {
        let connection = Self::open_first_port();
        if connection.is_none() {
            warn!("no MIDI output devices detected");
        }
        Self { connection }
    }

    fn open_first_port() -> Option<MidiOutputConnection> {
        let output = MidiOutput::new("pose-trainer").ok()?;
        let ports = output.ports();
        let port = ports.first()?;
        output.connect(port, "pose-trainer-out").ok()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// ポーズ列をキーポイントごとのNOTE_ONメッセージ対として送信する
    pub fn transmit_poses(&mut self, poses: &[Pose], frame: FrameSize, options: &TransportOptions) {
        let connection = match &mut self.connection {
            Some(c) => c,
            None => return,
        };

        for msg in keypoint_messages(poses, frame, options) {
            for bytes in encode_midi_messages(&msg) {
                if let Err(e) = connection.send(&bytes) {
                    warn!("midi send failed: {e}");
                }
            }
        }
    }
}

impl Default for MidiTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_to_midi() {
        assert_eq!(float_to_midi(0.0), 0);
        assert_eq!(float_to_midi(1.0), 127);
        assert_eq!(float_to_midi(0.5), 63);
    }

    #[test]
    fn test_float_to_midi_clamps() {
        assert_eq!(float_to_midi(-0.5), 0);
        assert_eq!(float_to_midi(2.0), 127);
    }

    #[test]
    fn test_encode_midi_messages() {
        let msg = KeypointMessage {
            person: 0,
            index: 3,
            x: 0.5,
            y: 1.0,
            name: "left_ear",
        };
        let [x_msg, y_msg] = encode_midi_messages(&msg);

        // index 3 → チャンネル6(x)と7(y)
        assert_eq!(x_msg, [0x96, 63, 0x7f]);
        assert_eq!(y_msg, [0x97, 127, 0x7f]);
    }

    #[test]
    fn test_encode_midi_messages_channel_wraps() {
        // index 9 → (9*2)%16 = 2 → チャンネル2と3
        let msg = KeypointMessage {
            person: 0,
            index: 9,
            x: 0.0,
            y: 0.0,
            name: "left_wrist",
        };
        let [x_msg, y_msg] = encode_midi_messages(&msg);
        assert_eq!(x_msg[0], 0x92);
        assert_eq!(y_msg[0], 0x93);
    }
}
