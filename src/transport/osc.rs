use std::net::UdpSocket;

use anyhow::Result;
use log::warn;
use rosc::{encoder, OscMessage, OscPacket, OscType};

use crate::pose::Pose;

use super::{keypoint_messages, FrameSize, KeypointMessage, TransportOptions};

/// OSC送信先のデフォルトアドレス
pub const OSC_DEFAULT_ADDR: &str = "127.0.0.1:9000";

/// キーポイント1件分のOSCメッセージを構築
/// 引数: person, index, x, y, name
pub fn build_keypoint_message(msg: &KeypointMessage) -> OscMessage {
    OscMessage {
        addr: "/pose/".to_string(),
        args: vec![
            OscType::Int(msg.person as i32),
            OscType::Int(msg.index as i32),
            OscType::Float(msg.x),
            OscType::Float(msg.y),
            OscType::String(msg.name.to_string()),
        ],
    }
}

/// OSCメッセージをバイト列にエンコード
pub fn encode_osc_message(msg: &OscMessage) -> Result<Vec<u8>> {
    let packet = OscPacket::Message(msg.clone());
    let encoded = encoder::encode(&packet)?;
    Ok(encoded)
}

/// UDP経由のOSC送信クライアント
///
/// 送信失敗時はソケットを破棄し、次回送信時に再接続する。
/// 失敗は呼び出し側（フレームループ）へ伝播させない。
pub struct OscTransport {
    socket: Option<UdpSocket>,
    target_addr: String,
}

impl OscTransport {
    pub fn new(target_addr: &str) -> Self {
        Self {
            socket: None,
            target_addr: target_addr.to_string(),
        }
    }

    /// デフォルトアドレス(127.0.0.1:9000)で作成
    pub fn with_default_addr() -> Self {
        Self::new(OSC_DEFAULT_ADDR)
    }

    fn connect(&mut self) -> Result<&UdpSocket> {
        if self.socket.is_none() {
            let socket = UdpSocket::bind("0.0.0.0:0")?;
            socket.connect(&self.target_addr)?;
            self.socket = Some(socket);
        }
        Ok(self.socket.as_ref().unwrap())
    }

    /// ポーズ列を1キーポイント1メッセージで送信する
    ///
    /// 戻り値は送信できたメッセージ数。失敗はログのみ。
    pub fn transmit_poses(
        &mut self,
        poses: &[Pose],
        frame: FrameSize,
        options: &TransportOptions,
    ) -> usize {
        let messages = keypoint_messages(poses, frame, options);
        let mut sent = 0;

        for msg in &messages {
            match self.send_message(msg) {
                Ok(()) => sent += 1,
                Err(e) => {
                    warn!("osc send failed, will reconnect: {e}");
                    // 次の送信でバインドし直す
                    self.socket = None;
                }
            }
        }

        sent
    }

    fn send_message(&mut self, msg: &KeypointMessage) -> Result<()> {
        let encoded = encode_osc_message(&build_keypoint_message(msg))?;
        let socket = self.connect()?;
        socket.send(&encoded)?;
        Ok(())
    }
}
