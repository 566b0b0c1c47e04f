//! Ports - 抽象化レイヤー
//!
//! core の外側にある協調者（候補の探索など）とのインターフェースを定義します。

pub mod candidate_source;

pub use self::candidate_source::{CandidateSource, DiscoveryError};
