//! StaticCandidateSource - メモリ上の候補一覧
//!
//! 明示的に組み立てた候補をそのまま返す、もっとも単純な CandidateSource 実装です。

use std::sync::Mutex;

use crate::domain::Candidate;
use crate::ports::{CandidateSource, DiscoveryError};

/// StaticCandidateSource は渡された候補を一度だけ返す
///
/// 2 回目以降の `candidates()` は空を返します（同じ候補を二重に分類させないため）。
pub struct StaticCandidateSource {
    name: String,
    pending: Mutex<Vec<Candidate>>,
}

impl StaticCandidateSource {
    pub fn new(name: impl Into<String>, candidates: Vec<Candidate>) -> Self {
        Self {
            name: name.into(),
            pending: Mutex::new(candidates),
        }
    }
}

impl CandidateSource for StaticCandidateSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn candidates(&self) -> Result<Vec<Candidate>, DiscoveryError> {
        let mut pending = self.pending.lock().map_err(|e| DiscoveryError::SourceFailed {
            source_name: self.name.clone(),
            reason: e.to_string(),
        })?;
        Ok(std::mem::take(&mut *pending))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yields_candidates_once() {
        let source = StaticCandidateSource::new(
            "static",
            vec![
                Candidate::builder("ImageSelection").build(),
                Candidate::builder("PdfSelection").build(),
            ],
        );

        let first = source.candidates().unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].name(), "ImageSelection");
        assert!(source.candidates().unwrap().is_empty());
    }
}
