//! HandlerRegistry - handler の登録と dispatch
//!
//! # 設計
//! - handler 列は `Arc<[Arc<dyn SelectionHandler>]>` のスナップショットで保持
//! - dispatch は読みロック中にスナップショットを clone するだけで、呼び出し中はロックを持たない
//! - 変更（登録・削除・reload）は新しい列を組み立てて書きロック下で差し替える
//!
//! dispatch からは古い列か新しい列のどちらかが見え、組み立て途中の列は見えません。

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info, trace};
use url::Url;

use crate::domain::{
    Candidate, DuplicatePolicy, Params, SelectionConfig, SelectionError, SelectionRequest,
};

use super::classifier::{Classification, Classifier};
use super::handler::{CandidateHandler, SelectionHandler};

/// 登録済み handler の不変スナップショット（登録順）
pub type HandlerList = Arc<[Arc<dyn SelectionHandler>]>;

/// `try_register` の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Registered,
    Skipped(Classification),
}

impl Registration {
    pub fn is_registered(self) -> bool {
        self == Registration::Registered
    }
}

/// dispatch の結果
///
/// 一致なしはエラーではありません。呼び出し側が区別したいときのために
/// `NoMatch` を返します。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Selected { handler: String },
    NoMatch,
}

impl DispatchOutcome {
    pub fn is_selected(&self) -> bool {
        matches!(self, DispatchOutcome::Selected { .. })
    }

    pub fn handler(&self) -> Option<&str> {
        match self {
            DispatchOutcome::Selected { handler } => Some(handler),
            DispatchOutcome::NoMatch => None,
        }
    }
}

/// HandlerRegistry は selection handler を登録順に保持し、URI を振り分ける
///
/// # 使用例
/// ```ignore
/// let registry = HandlerRegistry::new();
/// registry.register_if_selection_handler(image_selection);
///
/// let outcome = registry.dispatch(&uri, &params)?;
/// ```
///
/// # 二重登録
/// `DuplicatePolicy::Reject`（既定）では同名の 2 件目を拒否します。
/// `DuplicatePolicy::Allow` では独立した handler として両方を登録順に参照します。
pub struct HandlerRegistry {
    config: SelectionConfig,
    classifier: Classifier,
    handlers: RwLock<HandlerList>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::with_config(SelectionConfig::default_v1())
    }

    pub fn with_config(config: SelectionConfig) -> Self {
        let classifier = Classifier::from_config(&config);
        Self {
            config,
            classifier,
            handlers: RwLock::new(Arc::from(Vec::new())),
        }
    }

    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn classify(&self, candidate: &Candidate) -> Classification {
        self.classifier.classify(candidate)
    }

    /// 候補を分類し、受理されれば包んで末尾に追加する
    ///
    /// 分類で外れた候補は `Ok(Registration::Skipped)`、
    /// `DuplicatePolicy::Reject` で同名がある場合は `Err(DuplicateHandler)`。
    pub fn try_register(
        &self,
        candidate: impl Into<Arc<Candidate>>,
    ) -> Result<Registration, SelectionError> {
        let candidate = candidate.into();
        let classification = self.classify(&candidate);
        if !classification.is_accepted() {
            debug!(candidate = candidate.name(), ?classification, "not a selection handler");
            return Ok(Registration::Skipped(classification));
        }

        self.push(Arc::new(self.bind(candidate)))?;
        Ok(Registration::Registered)
    }

    /// 候補を分類し、受理されて登録できたら true
    ///
    /// 二重登録が拒否された場合も false を返します（registry は変化しない）。
    pub fn register_if_selection_handler(&self, candidate: impl Into<Arc<Candidate>>) -> bool {
        match self.try_register(candidate) {
            Ok(registration) => registration.is_registered(),
            Err(e) => {
                debug!(error = %e, "registration rejected");
                false
            }
        }
    }

    /// 構築済みの handler を末尾に追加する
    ///
    /// 型で `select` を持つので形の判定は省くが、名前は候補と同じ規約で判定する。
    /// 規約に合わない名前は `Err(NotSelectionHandler)`。
    pub fn register(&self, handler: Arc<dyn SelectionHandler>) -> Result<(), SelectionError> {
        let classification = self.classifier.classify_name(handler.name());
        if !classification.is_accepted() {
            debug!(handler = handler.name(), ?classification, "not a selection handler");
            return Err(SelectionError::NotSelectionHandler {
                handler: handler.name().to_string(),
                reason: format!("{classification:?}"),
            });
        }
        self.push(handler)
    }

    fn push(&self, handler: Arc<dyn SelectionHandler>) -> Result<(), SelectionError> {
        let mut guard = self.write();
        if self.config.duplicates == DuplicatePolicy::Reject
            && guard.iter().any(|h| h.name() == handler.name())
        {
            return Err(SelectionError::DuplicateHandler(handler.name().to_string()));
        }

        debug!(handler = handler.name(), position = guard.len(), "registered selection handler");
        let mut next: Vec<_> = guard.iter().cloned().collect();
        next.push(handler);
        *guard = Arc::from(next);
        Ok(())
    }

    /// 候補一覧から registry 全体を作り直す
    ///
    /// 新しい列はロックの外で組み立て、最後に一度だけ差し替えます。
    /// 戻り値は登録された handler の数。
    pub fn reload<I>(&self, candidates: I) -> usize
    where
        I: IntoIterator,
        I::Item: Into<Arc<Candidate>>,
    {
        let mut next: Vec<Arc<dyn SelectionHandler>> = Vec::new();
        for candidate in candidates {
            let candidate = candidate.into();
            let classification = self.classify(&candidate);
            if !classification.is_accepted() {
                debug!(candidate = candidate.name(), ?classification, "not a selection handler");
                continue;
            }
            if self.config.duplicates == DuplicatePolicy::Reject
                && next.iter().any(|h| h.name() == candidate.name())
            {
                debug!(candidate = candidate.name(), "duplicate skipped on reload");
                continue;
            }
            next.push(Arc::new(self.bind(candidate)));
        }

        let count = next.len();
        *self.write() = Arc::from(next);
        info!(handlers = count, "selection handlers reloaded");
        count
    }

    /// 名前（完全名または論理名）が一致する handler を取り除き、その数を返す
    pub fn remove(&self, name: &str) -> usize {
        let mut guard = self.write();
        let next: Vec<_> = guard
            .iter()
            .filter(|h| !matches_name(h, name))
            .cloned()
            .collect();
        let removed = guard.len() - next.len();
        if removed > 0 {
            *guard = Arc::from(next);
            debug!(handler = name, removed, "removed selection handler");
        }
        removed
    }

    pub fn clear(&self) {
        *self.write() = Arc::from(Vec::new());
    }

    /// 現在の handler 列（登録順）
    pub fn snapshot(&self) -> HandlerList {
        self.read().clone()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn handler_names(&self) -> Vec<String> {
        self.read().iter().map(|h| h.name().to_string()).collect()
    }

    /// 完全名または論理名で最初に一致する handler
    pub fn find(&self, name: &str) -> Option<Arc<dyn SelectionHandler>> {
        self.read()
            .iter()
            .find(|h| matches_name(h, name))
            .cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// 登録順に `supports(uri)` を試し、最初に true を返した handler の `select` を呼ぶ
    ///
    /// - 実行される handler は高々 1 つ
    /// - `supports` / `select` のエラーはそのまま返し、後続の handler には進まない
    /// - 一致なしは `Ok(DispatchOutcome::NoMatch)`
    pub fn dispatch(&self, uri: &Url, params: &Params) -> Result<DispatchOutcome, SelectionError> {
        let handlers = self.snapshot();
        for handler in handlers.iter() {
            if handler.supports(uri)? {
                trace!(handler = handler.name(), %uri, "selection handler matched");
                handler.select(uri, params)?;
                return Ok(DispatchOutcome::Selected {
                    handler: handler.name().to_string(),
                });
            }
        }
        trace!(%uri, handlers = handlers.len(), "no selection handler matched");
        Ok(DispatchOutcome::NoMatch)
    }

    pub fn dispatch_request(
        &self,
        request: &SelectionRequest,
    ) -> Result<DispatchOutcome, SelectionError> {
        self.dispatch(&request.uri, &request.params)
    }

    /// 一致なしを `NoHandlerMatched` として返す dispatch
    pub fn dispatch_strict(&self, uri: &Url, params: &Params) -> Result<String, SelectionError> {
        match self.dispatch(uri, params)? {
            DispatchOutcome::Selected { handler } => Ok(handler),
            DispatchOutcome::NoMatch => Err(SelectionError::NoHandlerMatched(uri.to_string())),
        }
    }

    fn bind(&self, candidate: Arc<Candidate>) -> CandidateHandler {
        CandidateHandler::bind(candidate, &self.classifier, self.config.missing_supports)
    }

    // スナップショットの差し替えだけを守るロックなので、poison されても中身は壊れていない
    fn read(&self) -> RwLockReadGuard<'_, HandlerList> {
        self.handlers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HandlerList> {
        self.handlers.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn matches_name(handler: &Arc<dyn SelectionHandler>, name: &str) -> bool {
    handler.name() == name || handler.logical_name() == name
}
