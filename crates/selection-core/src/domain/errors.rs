//! Errors - エラー型と分類
//!
//! # 分類
//! - 分類スキップ（Classification の variant、エラーではない）
//! - MissingCapability: 登録済み handler が呼び出し時に操作を持たない
//! - Handler: handler 自身の失敗（そのまま呼び出し元へ伝播）

use std::fmt;

use thiserror::Error;

/// handler の本体（supports / select）が返すエラー
///
/// core はこの値を加工せずに `SelectionError::Handler` で運ぶだけです。
/// 呼び出し側は `downcast_ref` で元の型を取り出せます。
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Capability は handler 契約の 2 操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Supports,
    Select,
}

impl Capability {
    /// candidate 側で探す操作名
    pub fn operation_name(self) -> &'static str {
        match self {
            Capability::Supports => "supports",
            Capability::Select => "select",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.operation_name())
    }
}

/// SelectionError は登録と dispatch のエラー
#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("handler '{handler}' has no '{capability}' operation")]
    MissingCapability {
        handler: String,
        capability: Capability,
    },

    #[error("handler '{handler}' returned a non-boolean value from supports: {value}")]
    NonBooleanSupports {
        handler: String,
        value: serde_json::Value,
    },

    #[error("invalid arguments for '{operation}': {reason}")]
    InvalidArguments { operation: String, reason: String },

    #[error("'{handler}' is not a selection handler: {reason}")]
    NotSelectionHandler { handler: String, reason: String },

    #[error("handler '{0}' is already registered")]
    DuplicateHandler(String),

    #[error("no handler matched uri={0}")]
    NoHandlerMatched(String),

    /// handler 自身の失敗。Display / source は元のエラーのまま
    #[error(transparent)]
    Handler(HandlerError),
}

impl SelectionError {
    pub fn missing(handler: impl Into<String>, capability: Capability) -> Self {
        SelectionError::MissingCapability {
            handler: handler.into(),
            capability,
        }
    }

    pub fn is_missing_capability(&self) -> bool {
        matches!(self, SelectionError::MissingCapability { .. })
    }

    /// handler の元エラーへの参照（Handler variant のときだけ）
    pub fn handler_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            SelectionError::Handler(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}
