//! Typed - selection handler の契約・分類・登録
//!
//! # 構成
//! - **handler**: `SelectionHandler` trait と、候補を包む `CandidateHandler`
//! - **classifier**: 命名規約と `select` の形による判定
//! - **registry**: 登録順の handler 列と first-match dispatch

pub mod classifier;
pub mod handler;
pub mod registry;

// 主要な trait/型 を再エクスポート
pub use self::classifier::{Classification, Classifier};
pub use self::handler::{CandidateHandler, SelectionHandler};
pub use self::registry::{DispatchOutcome, HandlerList, HandlerRegistry, Registration};
