//! SelectionRequest - dispatch 1 回分の入力（URI + パラメータ）

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

/// パラメータ: 文字列キー → 任意の値（キーは一意、順序は意味を持たない）
pub type Params = serde_json::Map<String, Value>;

/// SelectionRequest は呼び出し側が所有する一時的なリクエスト
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionRequest {
    pub uri: Url,
    #[serde(default)]
    pub params: Params,
}

impl SelectionRequest {
    pub fn new(uri: Url) -> Self {
        Self {
            uri,
            params: Params::new(),
        }
    }

    pub fn parse(uri: &str) -> Result<Self, url::ParseError> {
        Ok(Self::new(Url::parse(uri)?))
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn with_param_overwrites_same_key() {
        let req = SelectionRequest::parse("file:///a.png")
            .unwrap()
            .with_param("limit", 10)
            .with_param("limit", 20);

        assert_eq!(req.params.len(), 1);
        assert_eq!(req.params["limit"], json!(20));
    }

    #[test]
    fn deserializes_without_params() {
        let req: SelectionRequest =
            serde_json::from_value(json!({ "uri": "crm://contact/42" })).unwrap();
        assert_eq!(req.uri.scheme(), "crm");
        assert!(req.params.is_empty());
    }
}
