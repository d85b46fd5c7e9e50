//! ジョブ診断の重大度
//!
//! 分析ジョブサービスは重大度を文字列で報告する。バリアントと文字列の
//! 対応は固定のテーブルで、双方向の変換に使う。

use crate::progress::OutputKind;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Warning,
    Error,
    Info,
    SevereWarning,
    Deprecated,
    UserWarning,
}

impl Severity {
    pub const ALL: [Severity; 6] = [
        Severity::Warning,
        Severity::Error,
        Severity::Info,
        Severity::SevereWarning,
        Severity::Deprecated,
        Severity::UserWarning,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Warning => "Warning",
            Severity::Error => "Error",
            Severity::Info => "Info",
            Severity::SevereWarning => "SevereWarning",
            Severity::Deprecated => "Deprecated",
            Severity::UserWarning => "UserWarning",
        }
    }

    /// 大文字小文字を区別せずに検索。テーブルにないものは `None`
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(value))
    }

    /// この重大度の診断を書き込むコンソールストリーム
    pub fn output_kind(self) -> OutputKind {
        match self {
            Severity::Error | Severity::SevereWarning => OutputKind::Error,
            Severity::Warning | Severity::Info | Severity::Deprecated | Severity::UserWarning => {
                OutputKind::System
            }
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Severity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Severity::parse(&value)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown severity: {}", value)))
    }
}

/// 未知の重大度はペイロード全体を失敗させず `None` になる
fn lenient_severity<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Severity>, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.as_deref().and_then(Severity::parse))
}

/// ジョブに付いた1件の診断
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDiagnostic {
    #[serde(default, deserialize_with = "lenient_severity")]
    pub severity: Option<Severity>,
    #[serde(default)]
    pub message: String,
    pub line_number: Option<u32>,
    pub column_number: Option<u32>,
}

impl JobDiagnostic {
    /// この診断のコンソールストリーム。未知の重大度は system へ
    pub fn output_kind(&self) -> OutputKind {
        self.severity
            .map(Severity::output_kind)
            .unwrap_or(OutputKind::System)
    }
}

impl fmt::Display for JobDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = self.severity.map(Severity::as_str).unwrap_or("Unknown");
        match (self.line_number, self.column_number) {
            (Some(line), Some(col)) => write!(f, "[{}] {}:{} {}", severity, line, col, self.message),
            (Some(line), None) => write!(f, "[{}] {} {}", severity, line, self.message),
            _ => write!(f, "[{}] {}", severity, self.message),
        }
    }
}
