// src/compile/harvester.rs
use std::io::ErrorKind;
use std::path::Path;

use crate::compile::result::{CompileResult, HarvestedResult};
use crate::errors::{Result, ServerError};

pub const RESULT_FILE_NAME: &str = "QatCompilationResult.json";

/// Read and validate the compiler's result file from `build_dir`.
pub async fn harvest(build_dir: &Path) -> Result<HarvestedResult> {
    let path = build_dir.join(RESULT_FILE_NAME);

    match tokio::fs::try_exists(&path).await {
        Ok(true) => {}
        Ok(false) => return Err(ServerError::ResultMissing),
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(ServerError::ResultMissing),
        Err(e) => return Err(ServerError::ResultUnreadable(e)),
    }

    let bytes = tokio::fs::read(&path)
        .await
        .map_err(ServerError::ResultUnreadable)?;

    let result = parse_result(&bytes)?;
    Ok(HarvestedResult { result, raw: bytes })
}

pub fn parse_result(bytes: &[u8]) -> Result<CompileResult> {
    serde_json::from_slice(bytes).map_err(ServerError::ResultMalformed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> serde_json::Value {
        json!({
            "problems": [{
                "isError": true,
                "message": "Expected ;",
                "hasRange": true,
                "range": {
                    "file": "main.qat",
                    "start": { "line": 3, "char": 7 },
                    "end": { "line": 3, "char": 8 }
                }
            }],
            "status": false,
            "compilationTime": 1200,
            "linkingTime": 0,
            "binarySizes": [],
            "hasMain": true
        })
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = harvest(dir.path()).await.unwrap_err();
        assert!(matches!(err, ServerError::ResultMissing));
    }

    #[tokio::test]
    async fn test_directory_in_place_of_file_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(RESULT_FILE_NAME)).unwrap();

        let err = harvest(dir.path()).await.unwrap_err();
        assert!(matches!(err, ServerError::ResultUnreadable(_)));
    }

    #[tokio::test]
    async fn test_decoded_fields_match_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = sample();
        std::fs::write(
            dir.path().join(RESULT_FILE_NAME),
            serde_json::to_vec(&source).unwrap(),
        )
        .unwrap();

        let harvested = harvest(dir.path()).await.unwrap();
        let result = &harvested.result;
        assert_eq!(result.compilation_time, 1200);
        assert_eq!(result.problems[0].range.as_ref().unwrap().start.char, 7);
        assert_eq!(serde_json::to_value(result).unwrap(), source);
    }

    #[tokio::test]
    async fn test_raw_bytes_keep_unmodelled_fields() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = sample();
        source["compilerVersion"] = json!("0.5.1");
        let bytes = serde_json::to_vec_pretty(&source).unwrap();
        std::fs::write(dir.path().join(RESULT_FILE_NAME), &bytes).unwrap();

        let harvested = harvest(dir.path()).await.unwrap();
        assert_eq!(harvested.raw, bytes);
        assert!(!harvested.result.status);
    }

    #[test]
    fn test_not_json_is_malformed() {
        let err = parse_result(b"Segmentation fault").unwrap_err();
        assert!(matches!(err, ServerError::ResultMalformed(_)));
    }

    #[test]
    fn test_missing_field_is_malformed() {
        let mut value = sample();
        value.as_object_mut().unwrap().remove("hasMain");
        let err = parse_result(&serde_json::to_vec(&value).unwrap()).unwrap_err();
        assert!(matches!(err, ServerError::ResultMalformed(_)));
    }

    #[test]
    fn test_wrong_type_is_malformed() {
        let mut value = sample();
        value["status"] = json!("yes");
        let err = parse_result(&serde_json::to_vec(&value).unwrap()).unwrap_err();
        assert!(matches!(err, ServerError::ResultMalformed(_)));
    }
}
