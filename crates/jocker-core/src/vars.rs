//! 変数ファイルの読み込み
//!
//! 変数ファイルは YAML（または JSON）のマッピング、もしくは `key = "value"`
//! 形式の TOML。値は任意の型で、テンプレートからは JSON 値として参照される。

use crate::error::{CoreError, Result};
use std::collections::HashMap;
use std::path::Path;

/// 変数コンテキスト
pub type Variables = HashMap<String, serde_json::Value>;

/// 変数ファイルを読み込む
pub fn load_variables(path: &Path) -> Result<Variables> {
    let content = std::fs::read_to_string(path).map_err(|source| CoreError::VarsUnreadable {
        path: path.to_path_buf(),
        source,
    })?;

    let vars = match VarsFormat::of(path) {
        VarsFormat::Toml => parse_toml(&content),
        VarsFormat::Yaml => parse_variables(&content),
    }
    .map_err(|message| CoreError::VarsMalformed {
        path: path.to_path_buf(),
        message,
    })?;

    tracing::debug!(
        vars_file = %path.display(),
        variable_count = vars.len(),
        "Loaded variables"
    );
    Ok(vars)
}

/// 変数ファイルの形式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VarsFormat {
    Yaml,
    Toml,
}

impl VarsFormat {
    /// 拡張子から判定する
    ///
    /// `.py` は旧形式の `varsfile.py` で、`key = "value"` の代入だけなら TOML として読める。
    fn of(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") | Some("py") => VarsFormat::Toml,
            _ => VarsFormat::Yaml,
        }
    }
}

const NOT_A_MAPPING: &str = "expected a mapping of variable names to values";

fn parse_variables(content: &str) -> std::result::Result<Variables, String> {
    if content.trim().is_empty() {
        return Ok(Variables::new());
    }

    let value: serde_yaml::Value = match serde_yaml::from_str(content) {
        Ok(value) => value,
        // `key = "value"` の行は YAML としては壊れていることがある
        Err(e) => return parse_toml(content).map_err(|_| e.to_string()),
    };

    match value {
        // コメントだけのファイルは変数なし
        serde_yaml::Value::Null => Ok(Variables::new()),
        serde_yaml::Value::Mapping(_) => serde_yaml::from_value(value).map_err(|e| e.to_string()),
        // `packages = "git make curl"` は YAML では1つの文字列になる
        serde_yaml::Value::String(_) => {
            parse_toml(content).map_err(|_| NOT_A_MAPPING.to_string())
        }
        _ => Err(NOT_A_MAPPING.to_string()),
    }
}

fn parse_toml(content: &str) -> std::result::Result<Variables, String> {
    toml::from_str::<Variables>(content).map_err(|e| e.to_string())
}
