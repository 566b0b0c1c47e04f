//! selection-core
//!
//! 命名規約に従う "selection" handler の分類・登録・dispatch。
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（candidate, request, config, errors）
//! - **typed**: handler 契約（SelectionHandler）、Classifier、HandlerRegistry
//! - **ports**: 抽象化レイヤー（CandidateSource）
//! - **impls**: 実装（StaticCandidateSource）
//! - **app**: 起動時の探索と構築（SelectionAppBuilder）

pub mod domain;
pub mod ports;
pub mod app;
pub mod typed;
pub mod impls;

pub use domain::{Candidate, Params, SelectionConfig, SelectionError, SelectionRequest};
pub use typed::{DispatchOutcome, HandlerRegistry, SelectionHandler};
