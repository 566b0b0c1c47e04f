//! Impls - ports の実装（開発用・テスト用）
//!
//! # 含まれる実装
//! - **StaticCandidateSource**: メモリ上の候補一覧

pub mod static_source;

pub use self::static_source::StaticCandidateSource;
