//! Handler trait - selection handler の契約と、候補を包む adapter
//!
//! # 二層構造
//! - **契約**: `SelectionHandler` trait（object-safe、`Arc<dyn SelectionHandler>` で保持）
//! - **Adapter**: `CandidateHandler` が候補の操作を bind 時に解決して保持する
//!
//! 呼び出しのたびに操作を名前で探すことはしません。`bind()` の時点で
//! `supports(URI)` と `select(URI, Map) -> void` を解決し、無ければ `None` として持ちます。

use std::sync::Arc;

use serde_json::Value;
use tracing::trace;
use url::Url;

use crate::domain::{
    Candidate, Capability, MissingSupportsPolicy, Operation, ParamType, Params, SelectionError,
    Signature,
};

use super::classifier::Classifier;

/// SelectionHandler は URI を引き受けるかの判定と、選択処理を提供する
///
/// # 使用例
/// ```ignore
/// struct PdfSelection;
///
/// impl SelectionHandler for PdfSelection {
///     fn name(&self) -> &str { "PdfSelection" }
///
///     fn supports(&self, uri: &Url) -> Result<bool, SelectionError> {
///         Ok(uri.path().ends_with(".pdf"))
///     }
///
///     fn select(&self, uri: &Url, params: &Params) -> Result<(), SelectionError> {
///         println!("selected {uri} with {params:?}");
///         Ok(())
///     }
/// }
/// ```
///
/// `select` は同じ dispatch 内で `supports` が true を返した後にだけ呼ばれます。
pub trait SelectionHandler: Send + Sync {
    /// 安定した識別子（候補の名前）
    fn name(&self) -> &str;

    /// suffix を除いた名前
    fn logical_name(&self) -> &str {
        self.name()
    }

    fn supports(&self, uri: &Url) -> Result<bool, SelectionError>;

    fn select(&self, uri: &Url, params: &Params) -> Result<(), SelectionError>;
}

/// CandidateHandler は候補を `SelectionHandler` として包む
///
/// 構築後は不変です。候補は `Arc` で共有し、読み取りだけを行います。
pub struct CandidateHandler {
    candidate: Arc<Candidate>,
    logical_name: String,
    supports: Option<Operation>,
    select: Option<Operation>,
    missing_supports: MissingSupportsPolicy,
}

impl CandidateHandler {
    /// 候補の操作を解決して adapter を作る
    ///
    /// 分類はしません（`HandlerRegistry` が事前に行います）。
    /// `supports` は名前と引数 `(URI)` で探し、戻り値型は問いません。
    pub fn bind(
        candidate: Arc<Candidate>,
        classifier: &Classifier,
        missing_supports: MissingSupportsPolicy,
    ) -> Self {
        let supports = candidate
            .find_by_params(Capability::Supports.operation_name(), &[ParamType::Uri])
            .cloned();
        let select = candidate.find_operation(&Signature::select()).cloned();
        let logical_name = classifier.logical_name(candidate.name()).to_string();
        Self {
            candidate,
            logical_name,
            supports,
            select,
            missing_supports,
        }
    }

    pub fn candidate(&self) -> &Candidate {
        &self.candidate
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        match capability {
            Capability::Supports => self.supports.is_some(),
            Capability::Select => self.select.is_some(),
        }
    }

    fn missing(&self, capability: Capability) -> SelectionError {
        SelectionError::missing(self.candidate.name(), capability)
    }
}

impl SelectionHandler for CandidateHandler {
    fn name(&self) -> &str {
        self.candidate.name()
    }

    fn logical_name(&self) -> &str {
        &self.logical_name
    }

    fn supports(&self, uri: &Url) -> Result<bool, SelectionError> {
        let Some(op) = &self.supports else {
            return match self.missing_supports {
                MissingSupportsPolicy::Fail => Err(self.missing(Capability::Supports)),
                MissingSupportsPolicy::AlwaysMatch => Ok(true),
                MissingSupportsPolicy::NeverMatch => Ok(false),
            };
        };

        let value = op
            .invoke(&[Value::String(uri.to_string())])
            .map_err(SelectionError::Handler)?;
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(SelectionError::NonBooleanSupports {
                handler: self.name().to_string(),
                value: other,
            }),
        }
    }

    fn select(&self, uri: &Url, params: &Params) -> Result<(), SelectionError> {
        let op = self
            .select
            .as_ref()
            .ok_or_else(|| self.missing(Capability::Select))?;

        trace!(handler = self.name(), %uri, "invoking select");
        op.invoke(&[Value::String(uri.to_string()), Value::Object(params.clone())])
            .map_err(SelectionError::Handler)?;
        Ok(())
    }
}

impl std::fmt::Debug for CandidateHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CandidateHandler")
            .field("name", &self.candidate.name())
            .field("supports", &self.supports.is_some())
            .field("select", &self.select.is_some())
            .field("missing_supports", &self.missing_supports)
            .finish()
    }
}
