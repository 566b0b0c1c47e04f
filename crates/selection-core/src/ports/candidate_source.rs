//! CandidateSource port - 候補の供給元
//!
//! 候補をどう見つけるか（ディレクトリ走査、明示的な登録 API など）は実装側の責務です。
//! core は「候補の一覧」を受け取って分類するだけです。

use thiserror::Error;

use crate::domain::Candidate;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("candidate source '{source_name}' failed: {reason}")]
    SourceFailed { source_name: String, reason: String },
}

/// CandidateSource は分類前の候補を返す
///
/// 同じ候補を 2 回返さないこと。各候補は分類にちょうど 1 回渡されます。
pub trait CandidateSource: Send + Sync {
    fn name(&self) -> &str;

    fn candidates(&self) -> Result<Vec<Candidate>, DiscoveryError>;
}
