//! 進捗シンク
//!
//! 実行中のジョブはタイムスタンプ付きのコンソール行を [`ProgressSink`] に書き込み、
//! ホストは対になる [`ProgressReceiver`] から受け取る。シンクは終了コードとともに
//! ちょうど一度だけ終了され、その後の書き込みはプログラミングエラーとして
//! パニックする。

use crate::error::{CoreError, Result};
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// コンソール行が属するストリーム
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputKind {
    System,
    Error,
}

impl OutputKind {
    const TABLE: [(OutputKind, &'static str); 2] =
        [(OutputKind::System, "system"), (OutputKind::Error, "stderr")];

    pub fn as_str(self) -> &'static str {
        match self {
            OutputKind::System => "system",
            OutputKind::Error => "stderr",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::TABLE
            .iter()
            .find(|(_, name)| name.eq_ignore_ascii_case(value))
            .map(|(kind, _)| *kind)
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// コンソールの1行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressLine {
    pub timestamp: DateTime<Utc>,
    pub kind: OutputKind,
    pub text: String,
}

/// ホストが受け取るもの
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Line(ProgressLine),
    Terminated { exit_code: i32 },
}

struct SinkInner {
    tx: mpsc::UnboundedSender<ProgressEvent>,
    terminated: Mutex<bool>,
}

/// ジョブのコンソールの書き込み側
#[derive(Clone)]
pub struct ProgressSink {
    inner: Arc<SinkInner>,
}

impl fmt::Debug for ProgressSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressSink")
            .field("terminated", &self.is_terminated())
            .finish()
    }
}

impl ProgressSink {
    /// シンクと、ホストが読み取るレシーバーを作成
    pub fn channel() -> (ProgressSink, ProgressReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink = ProgressSink {
            inner: Arc::new(SinkInner {
                tx,
                terminated: Mutex::new(false),
            }),
        };
        (sink, ProgressReceiver { rx })
    }

    pub fn is_terminated(&self) -> bool {
        *self
            .inner
            .terminated
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    /// 行を追加する。シンクが既に終了していればその旨を返す
    pub fn try_write(&self, kind: OutputKind, text: impl Into<String>) -> Result<()> {
        let terminated = self
            .inner
            .terminated
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if *terminated {
            return Err(CoreError::SinkTerminated);
        }

        let line = ProgressLine {
            timestamp: Utc::now(),
            kind,
            text: text.into(),
        };
        if self.inner.tx.send(ProgressEvent::Line(line)).is_err() {
            tracing::trace!("progress receiver dropped, line discarded");
        }
        Ok(())
    }

    /// 行を追加
    ///
    /// # Panics
    /// シンクが既に終了している場合
    pub fn write(&self, kind: OutputKind, text: impl Into<String>) {
        if let Err(e) = self.try_write(kind, text) {
            panic!("{}", e);
        }
    }

    pub fn println(&self, text: impl Into<String>) {
        self.write(OutputKind::System, text);
    }

    pub fn errorln(&self, text: impl Into<String>) {
        self.write(OutputKind::Error, text);
    }

    /// ジョブの終了を記録する。成功するのは最初の呼び出しのみ
    pub fn terminate(&self, exit_code: i32) -> Result<()> {
        let mut terminated = self
            .inner
            .terminated
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if *terminated {
            return Err(CoreError::SinkTerminated);
        }
        *terminated = true;
        if self
            .inner
            .tx
            .send(ProgressEvent::Terminated { exit_code })
            .is_err()
        {
            tracing::trace!("progress receiver dropped before termination");
        }
        Ok(())
    }
}

/// ジョブのコンソールの読み取り側。ホストが所有する
#[derive(Debug)]
pub struct ProgressReceiver {
    rx: mpsc::UnboundedReceiver<ProgressEvent>,
}

impl ProgressReceiver {
    pub async fn recv(&mut self) -> Option<ProgressEvent> {
        self.rx.recv().await
    }

    /// 終了イベントまでをすべて読み出す
    ///
    /// 受け取った行と終了コードを返す。シンクが終了せずに破棄された場合
    /// （ジョブのキャンセルなど）は `None`
    pub async fn collect(mut self) -> (Vec<ProgressLine>, Option<i32>) {
        let mut lines = Vec::new();
        while let Some(event) = self.rx.recv().await {
            match event {
                ProgressEvent::Line(line) => lines.push(line),
                ProgressEvent::Terminated { exit_code } => return (lines, Some(exit_code)),
            }
        }
        (lines, None)
    }
}
