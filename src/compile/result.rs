// src/compile/result.rs
use serde::{Deserialize, Serialize};

/// A compile request as posted to `/compile`.
#[derive(Deserialize, Debug, Clone)]
pub struct CompileRequest {
    pub content: String,
    #[serde(rename = "confirmationKey", default)]
    pub confirmation_key: Option<String>,
    /// Client-side submission time, carried through for logging only.
    #[serde(default)]
    pub time: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FilePos {
    pub line: i64,
    pub char: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FileRange {
    pub file: String,
    pub start: FilePos,
    pub end: FilePos,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    #[serde(rename = "isError")]
    pub is_error: bool,
    pub message: String,
    #[serde(rename = "hasRange")]
    pub has_range: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<FileRange>,
}

/// The compiler's verdict, decoded from `QatCompilationResult.json`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CompileResult {
    pub problems: Vec<Problem>,
    pub status: bool,
    #[serde(rename = "compilationTime")]
    pub compilation_time: i64,
    #[serde(rename = "linkingTime")]
    pub linking_time: i64,
    #[serde(rename = "binarySizes")]
    pub binary_sizes: Vec<i64>,
    #[serde(rename = "hasMain")]
    pub has_main: bool,
}

impl CompileResult {
    pub fn error_count(&self) -> usize {
        self.problems.iter().filter(|p| p.is_error).count()
    }
}

/// A result file that decoded cleanly, with the exact bytes the compiler
/// wrote. The bytes are what the caller receives, so fields this server does
/// not model still reach the client.
#[derive(Debug, Clone)]
pub struct HarvestedResult {
    pub result: CompileResult,
    pub raw: Vec<u8>,
}
