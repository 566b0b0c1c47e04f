//! SelectionConfig - 登録と dispatch の方針

use std::path::Path;

use serde::{Deserialize, Serialize};

/// 同名 handler を二重登録したときの扱い
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// 後から来た方を拒否（registry は変化しない）
    #[default]
    Reject,
    /// 独立した handler として両方登録し、登録順に参照する
    Allow,
}

/// `supports` を宣言していない候補を呼び出したときの扱い
///
/// classifier は `supports` を要求しないので、登録済みでも欠けていることがある。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingSupportsPolicy {
    /// `MissingCapability` で失敗させる
    #[default]
    Fail,
    AlwaysMatch,
    NeverMatch,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("artefact_suffix must not be empty")]
    EmptySuffix,
}

/// SelectionConfig は registry の振る舞いを決める設定
///
/// 省略されたフィールドは `default_v1()` の値になります。
/// ```json
/// { "artefact_suffix": "Selection", "duplicates": "reject", "missing_supports": "fail" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub artefact_suffix: String,
    pub duplicates: DuplicatePolicy,
    pub missing_supports: MissingSupportsPolicy,
}

impl SelectionConfig {
    pub const DEFAULT_SUFFIX: &'static str = "Selection";

    pub fn default_v1() -> Self {
        Self {
            artefact_suffix: Self::DEFAULT_SUFFIX.to_string(),
            duplicates: DuplicatePolicy::Reject,
            missing_supports: MissingSupportsPolicy::Fail,
        }
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.artefact_suffix.is_empty() {
            return Err(ConfigError::EmptySuffix);
        }
        Ok(())
    }

    pub fn with_duplicates(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicates = policy;
        self
    }

    pub fn with_missing_supports(mut self, policy: MissingSupportsPolicy) -> Self {
        self.missing_supports = policy;
        self
    }
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self::default_v1()
    }
}
