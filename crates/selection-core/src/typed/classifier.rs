//! Classifier - 候補が selection handler かどうかの判定
//!
//! # 判定ルール
//! 1. 名前が空なら拒否
//! 2. 名前が artefact suffix（既定 `Selection`）で終わらなければ拒否
//! 3. `select(URI, Map) -> void` を宣言していなければ拒否
//! 4. それ以外は受理
//!
//! `supports` はここでは要求しません。欠けている候補も登録され、
//! 呼び出し時に `MissingSupportsPolicy` に従って扱われます。

use crate::domain::{Candidate, SelectionConfig, Signature};

/// 判定結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Accepted,
    EmptyName,
    MissingSuffix,
    MissingSelectOperation,
}

impl Classification {
    pub fn is_accepted(self) -> bool {
        self == Classification::Accepted
    }
}

/// Classifier は命名規約と形で候補を判定する
///
/// 副作用はなく、同じ形の候補には常に同じ結果を返します。
#[derive(Debug, Clone)]
pub struct Classifier {
    suffix: String,
    select: Signature,
}

impl Classifier {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
            select: Signature::select(),
        }
    }

    pub fn from_config(config: &SelectionConfig) -> Self {
        Self::new(config.artefact_suffix.clone())
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn classify(&self, candidate: &Candidate) -> Classification {
        let by_name = self.classify_name(candidate.name());
        if !by_name.is_accepted() {
            return by_name;
        }
        if !candidate.declares(&self.select) {
            return Classification::MissingSelectOperation;
        }
        Classification::Accepted
    }

    /// 名前だけで判定する（ルール 1, 2）
    ///
    /// 構築済みの `SelectionHandler` は `select` を型で持つので、名前の判定だけを通す。
    pub fn classify_name(&self, name: &str) -> Classification {
        if name.is_empty() {
            return Classification::EmptyName;
        }
        if !name.ends_with(&self.suffix) {
            return Classification::MissingSuffix;
        }
        Classification::Accepted
    }

    pub fn is_selection_candidate(&self, candidate: &Candidate) -> bool {
        self.classify(candidate).is_accepted()
    }

    /// モジュールパスと suffix を除いた論理名
    ///
    /// `app::crm::ContactSelection` → `Contact`。
    /// suffix だけの名前（`Selection`）はそのまま返す。
    pub fn logical_name<'a>(&self, name: &'a str) -> &'a str {
        let short = name
            .rsplit(|c: char| c == ':' || c == '.')
            .next()
            .unwrap_or(name);
        match short.strip_suffix(self.suffix.as_str()) {
            Some(stripped) if !stripped.is_empty() => stripped,
            _ => short,
        }
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(SelectionConfig::DEFAULT_SUFFIX)
    }
}
