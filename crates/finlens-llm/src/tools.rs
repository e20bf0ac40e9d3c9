//! Provider-side tools the model may use while answering

use serde::{Deserialize, Serialize};

/// Built-in tool executed by the model provider itself
///
/// These are not function-calling tools: the provider runs them while generating
/// and folds the results into the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuiltinTool {
    /// Live web search grounding
    GoogleSearch,
}

impl BuiltinTool {
    /// Wire name of the tool
    pub fn as_str(self) -> &'static str {
        match self {
            BuiltinTool::GoogleSearch => "google_search",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_names() {
        assert_eq!(BuiltinTool::GoogleSearch.as_str(), "google_search");
        assert_eq!(
            serde_json::to_string(&BuiltinTool::GoogleSearch).unwrap(),
            "\"google_search\""
        );
    }
}
