//! Candidate - selection handler 候補の静的な形
//!
//! 候補は「名前」と「宣言された操作の集合」を持ちます。
//! 操作は signature（名前・引数型・戻り値型）と、位置引数で呼び出せる本体からなり、
//! classifier は signature だけを見て判定します。
//!
//! # 学習ポイント
//! - `Arc<dyn Fn>` による呼び出し可能オブジェクトの保持
//! - Builder パターン（型付きクロージャ → 動的な Invoker への変換）

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use super::errors::{Capability, HandlerError, SelectionError};
use super::request::Params;

/// 操作の引数型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamType {
    Uri,
    Map,
    String,
    Value,
}

/// 操作の戻り値型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReturnType {
    Void,
    Bool,
    Value,
}

/// Signature は操作の形（名前・引数・戻り値）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    pub name: String,
    pub params: Vec<ParamType>,
    pub returns: ReturnType,
}

impl Signature {
    pub fn new(name: impl Into<String>, params: Vec<ParamType>, returns: ReturnType) -> Self {
        Self {
            name: name.into(),
            params,
            returns,
        }
    }

    /// `select(URI, Map) -> void`
    pub fn select() -> Self {
        Self::new(
            Capability::Select.operation_name(),
            vec![ParamType::Uri, ParamType::Map],
            ReturnType::Void,
        )
    }

    /// `supports(URI) -> bool`
    pub fn supports() -> Self {
        Self::new(
            Capability::Supports.operation_name(),
            vec![ParamType::Uri],
            ReturnType::Bool,
        )
    }

    /// 名前と引数型が一致するか（戻り値型は見ない）
    pub fn accepts_params(&self, name: &str, params: &[ParamType]) -> bool {
        self.name == name && self.params == params
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?}) -> {:?}", self.name, self.params, self.returns)
    }
}

/// 操作に付く情報タグ
///
/// 説明用のメタデータで、classifier や dispatch からは参照されません。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationTag {
    Selectable,
}

/// 位置引数を受け取って値を返す操作本体
pub type Invoker = Arc<dyn Fn(&[Value]) -> Result<Value, HandlerError> + Send + Sync>;

/// Operation は候補が宣言する 1 つの操作
#[derive(Clone)]
pub struct Operation {
    signature: Signature,
    tags: Vec<OperationTag>,
    invoker: Invoker,
}

impl Operation {
    pub fn new(signature: Signature, invoker: Invoker) -> Self {
        Self {
            signature,
            tags: Vec::new(),
            invoker,
        }
    }

    pub fn tagged(mut self, tag: OperationTag) -> Self {
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
        self
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn name(&self) -> &str {
        &self.signature.name
    }

    pub fn tags(&self) -> &[OperationTag] {
        &self.tags
    }

    pub fn has_tag(&self, tag: OperationTag) -> bool {
        self.tags.contains(&tag)
    }

    /// 操作を位置引数で呼び出す
    pub fn invoke(&self, args: &[Value]) -> Result<Value, HandlerError> {
        (self.invoker)(args)
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("signature", &self.signature)
            .field("tags", &self.tags)
            .finish_non_exhaustive()
    }
}

/// Candidate はアプリケーションが提供する handler 候補
///
/// # 使用例
/// ```ignore
/// let candidate = Candidate::builder("ImageSelection")
///     .supports(|uri| Ok(uri.path().ends_with(".png")))
///     .select(|uri, params| {
///         println!("select {uri} {params:?}");
///         Ok(())
///     })
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct Candidate {
    name: String,
    operations: Vec<Operation>,
}

impl Candidate {
    pub fn new(name: impl Into<String>, operations: Vec<Operation>) -> Self {
        Self {
            name: name.into(),
            operations,
        }
    }

    pub fn builder(name: impl Into<String>) -> CandidateBuilder {
        CandidateBuilder {
            name: name.into(),
            operations: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// signature が完全一致する操作を探す
    pub fn find_operation(&self, signature: &Signature) -> Option<&Operation> {
        self.operations.iter().find(|op| op.signature() == signature)
    }

    /// 名前と引数型で操作を探す（戻り値型は問わない）
    pub fn find_by_params(&self, name: &str, params: &[ParamType]) -> Option<&Operation> {
        self.operations
            .iter()
            .find(|op| op.signature().accepts_params(name, params))
    }

    pub fn declares(&self, signature: &Signature) -> bool {
        self.find_operation(signature).is_some()
    }

    /// `Selectable` タグが付いた操作名
    pub fn selectable_operations(&self) -> impl Iterator<Item = &str> {
        self.operations
            .iter()
            .filter(|op| op.has_tag(OperationTag::Selectable))
            .map(Operation::name)
    }
}

/// CandidateBuilder は型付きクロージャから Candidate を組み立てる
pub struct CandidateBuilder {
    name: String,
    operations: Vec<Operation>,
}

impl CandidateBuilder {
    /// 任意の形の操作を追加
    pub fn operation(mut self, operation: Operation) -> Self {
        self.operations.push(operation);
        self
    }

    /// `supports(URI) -> bool` を追加
    pub fn supports<F>(self, f: F) -> Self
    where
        F: Fn(&Url) -> Result<bool, HandlerError> + Send + Sync + 'static,
    {
        let invoker: Invoker = Arc::new(move |args: &[Value]| -> Result<Value, HandlerError> {
            let uri = uri_arg(Capability::Supports.operation_name(), args)?;
            f(&uri).map(Value::Bool)
        });
        self.operation(Operation::new(Signature::supports(), invoker))
    }

    /// `select(URI, Map) -> void` を追加（`Selectable` タグ付き）
    pub fn select<F>(self, f: F) -> Self
    where
        F: Fn(&Url, &Params) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        let invoker: Invoker = Arc::new(move |args: &[Value]| -> Result<Value, HandlerError> {
            let name = Capability::Select.operation_name();
            let uri = uri_arg(name, args)?;
            let params = match args.get(1) {
                Some(Value::Object(map)) => map,
                other => return Err(invalid_args(name, format!("expected map, got {other:?}"))),
            };
            f(&uri, params).map(|()| Value::Null)
        });
        self.operation(
            Operation::new(Signature::select(), invoker).tagged(OperationTag::Selectable),
        )
    }

    pub fn build(self) -> Candidate {
        Candidate::new(self.name, self.operations)
    }
}

fn uri_arg(operation: &str, args: &[Value]) -> Result<Url, HandlerError> {
    match args.first() {
        Some(Value::String(s)) => {
            Url::parse(s).map_err(|e| invalid_args(operation, format!("uri: {e}")))
        }
        other => Err(invalid_args(operation, format!("expected uri, got {other:?}"))),
    }
}

fn invalid_args(operation: &str, reason: String) -> HandlerError {
    Box::new(SelectionError::InvalidArguments {
        operation: operation.to_string(),
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builder_declares_contract_signatures() {
        let candidate = Candidate::builder("ImageSelection")
            .supports(|_| Ok(true))
            .select(|_, _| Ok(()))
            .build();

        assert!(candidate.declares(&Signature::supports()));
        assert!(candidate.declares(&Signature::select()));
        assert_eq!(candidate.selectable_operations().collect::<Vec<_>>(), vec!["select"]);
    }

    #[test]
    fn supports_invoker_returns_bool_value() {
        let candidate = Candidate::builder("PngSelection")
            .supports(|uri| Ok(uri.path().ends_with(".png")))
            .build();
        let op = candidate.find_operation(&Signature::supports()).unwrap();

        let out = op.invoke(&[json!("file:///a.png")]).unwrap();
        assert_eq!(out, Value::Bool(true));
        let out = op.invoke(&[json!("file:///a.jpg")]).unwrap();
        assert_eq!(out, Value::Bool(false));
    }

    #[test]
    fn select_invoker_rejects_non_map_params() {
        let candidate = Candidate::builder("PngSelection")
            .select(|_, _| Ok(()))
            .build();
        let op = candidate.find_operation(&Signature::select()).unwrap();

        let err = op.invoke(&[json!("file:///a.png"), json!([1, 2])]).unwrap_err();
        assert!(err.to_string().contains("expected map"));
    }

    #[test]
    fn find_by_params_ignores_return_type() {
        let invoker: Invoker =
            Arc::new(|_: &[Value]| -> Result<Value, HandlerError> { Ok(json!("yes")) });
        let candidate = Candidate::new(
            "LooseSelection",
            vec![Operation::new(
                Signature::new("supports", vec![ParamType::Uri], ReturnType::Value),
                invoker,
            )],
        );

        assert!(!candidate.declares(&Signature::supports()));
        assert!(candidate.find_by_params("supports", &[ParamType::Uri]).is_some());
    }
}
