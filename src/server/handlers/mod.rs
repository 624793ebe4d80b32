pub mod folders;
pub mod query;
pub mod root;
pub mod sessions;

use std::collections::HashMap;

use crate::core::errors::ApiError;

fn require_param<'a>(
    params: &'a HashMap<String, String>,
    key: &str,
) -> Result<&'a str, ApiError> {
    params
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| ApiError::InvalidParameter(format!("missing required parameter: {key}")))
}

fn optional_param(params: &HashMap<String, String>, key: &str) -> Option<String> {
    params.get(key).filter(|v| !v.is_empty()).cloned()
}
