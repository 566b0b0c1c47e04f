//! SelectionAppBuilder - 起動時の探索と登録
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）

use std::sync::Arc;

use tracing::info;
use url::Url;

use crate::domain::{Candidate, Params, SelectionConfig, SelectionError, SelectionRequest};
use crate::ports::{CandidateSource, DiscoveryError};
use crate::typed::{DispatchOutcome, HandlerRegistry, SelectionHandler};

/// SelectionAppBuilder は候補を集めて SelectionApp を構築
///
/// # 使用例
/// ```ignore
/// let app = SelectionAppBuilder::new()
///     .discover(&source)?
///     .candidate(image_selection)
///     .expect_handlers(&["Image"])
///     .build()?;
/// ```
///
/// # Fail-fast 設計
/// - expect_handlers() で必須の handler 名（完全名または論理名）を指定
/// - build() 時にすべて登録済みかをチェック
pub struct SelectionAppBuilder {
    config: SelectionConfig,
    candidates: Vec<Candidate>,
    handlers: Vec<Arc<dyn SelectionHandler>>,
    expected_handlers: Option<Vec<String>>,
}

/// BuildError はアプリケーション構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing selection handlers: {0:?}. These handlers were expected but not registered.")]
    MissingHandlers(Vec<String>),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Registration(#[from] SelectionError),
}

impl SelectionAppBuilder {
    pub fn new() -> Self {
        Self {
            config: SelectionConfig::default_v1(),
            candidates: Vec::new(),
            handlers: Vec::new(),
            expected_handlers: None,
        }
    }

    pub fn config(mut self, config: SelectionConfig) -> Self {
        self.config = config;
        self
    }

    /// source から候補を取り込む（探索順を保つ）
    pub fn discover(mut self, source: &dyn CandidateSource) -> Result<Self, BuildError> {
        let found = source.candidates()?;
        info!(source = source.name(), candidates = found.len(), "discovered candidates");
        self.candidates.extend(found);
        Ok(self)
    }

    pub fn candidate(mut self, candidate: Candidate) -> Self {
        self.candidates.push(candidate);
        self
    }

    /// 構築済みの handler（候補の後ろに並ぶ）
    ///
    /// 名前は候補と同じ命名規約で判定され、外れると build() が失敗する。
    pub fn handler(mut self, handler: Arc<dyn SelectionHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    pub fn expect_handlers(mut self, names: &[&str]) -> Self {
        self.expected_handlers = Some(names.iter().map(|name| name.to_string()).collect());
        self
    }

    /// 候補を分類・登録して SelectionApp を生成
    ///
    /// # 検証
    /// - 同名の二重登録（`DuplicatePolicy::Reject` のとき）は `BuildError::Registration`
    /// - 命名規約に合わない直接登録の handler も `BuildError::Registration`
    /// - expect_handlers() の名前が足りなければ `BuildError::MissingHandlers`
    pub fn build(self) -> Result<SelectionApp, BuildError> {
        let registry = HandlerRegistry::with_config(self.config);
        for candidate in self.candidates {
            registry.try_register(candidate)?;
        }
        for handler in self.handlers {
            registry.register(handler)?;
        }

        if let Some(expected) = &self.expected_handlers {
            let missing: Vec<String> = expected
                .iter()
                .filter(|name| !registry.contains(name))
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(BuildError::MissingHandlers(missing));
            }
        }

        info!(handlers = registry.len(), "selection app built");
        Ok(SelectionApp {
            registry: Arc::new(registry),
        })
    }
}

impl Default for SelectionAppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// SelectionApp は構築済みの registry を共有して dispatch する
#[derive(Clone)]
pub struct SelectionApp {
    registry: Arc<HandlerRegistry>,
}

impl SelectionApp {
    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.registry
    }

    pub fn dispatch(&self, uri: &Url, params: &Params) -> Result<DispatchOutcome, SelectionError> {
        self.registry.dispatch(uri, params)
    }

    pub fn dispatch_request(
        &self,
        request: &SelectionRequest,
    ) -> Result<DispatchOutcome, SelectionError> {
        self.registry.dispatch_request(request)
    }
}
