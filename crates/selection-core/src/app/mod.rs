//! App - アプリケーション層
//!
//! 候補の探索・分類・登録をまとめ、構築済みの registry を共有します。
//!
//! # 主要コンポーネント
//! - **SelectionAppBuilder**: 探索と起動時検証
//! - **SelectionApp**: 構築済み registry への dispatch

pub mod builder;

pub use self::builder::{BuildError, SelectionApp, SelectionAppBuilder};
