//! 출력 싱크
//!
//! 관리자가 컨테이너 로그 등 사용자에게 보여줄 줄 단위 출력을 보내는 곳입니다.
//! 생성 시점에 주입되며, CLI는 표준 출력 싱크를, 테스트는 [`MemorySink`]를 사용합니다.

use std::sync::Mutex;

use tokio::sync::mpsc;

/// 줄 단위 출력 대상
pub trait OutputSink: Send + Sync {
    /// 한 줄을 출력합니다. 줄바꿈 문자는 포함되지 않습니다.
    fn write_line(&self, line: &str);
}

/// `tracing` 이벤트로 출력하는 싱크
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl OutputSink for TracingSink {
    fn write_line(&self, line: &str) {
        tracing::info!(target: "berth::container_log", "{line}");
    }
}

/// 채널로 각 줄을 전달하는 싱크
///
/// 수신측이 닫혀 있으면 줄을 버립니다.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelSink {
    /// 새 채널 싱크와 수신기를 생성합니다.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl OutputSink for ChannelSink {
    fn write_line(&self, line: &str) {
        let _ = self.tx.send(line.to_owned());
    }
}

/// 메모리에 줄을 모으는 싱크
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    /// 빈 싱크를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 지금까지 기록된 줄의 복사본을 반환합니다.
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }
}

impl OutputSink for MemorySink {
    fn write_line(&self, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line.to_owned());
        }
    }
}

/// 바이트 프레임을 줄 단위로 나눠 싱크에 씁니다.
///
/// 런타임 로그 프레임은 여러 줄을 포함하거나 끝에 줄바꿈이 붙어 옵니다.
pub(crate) fn write_frame(sink: &dyn OutputSink, frame: &[u8]) {
    let text = String::from_utf8_lossy(frame);
    for line in text.lines() {
        sink.write_line(line.trim_end_matches('\r'));
    }
}
