//! ビルド / プッシュ API のステータス出力のパース
//!
//! Docker はステータスを `{"stream": "..."}` や `{"status": "..."}` の
//! JSON オブジェクトで返すが、区切り文字の保証が無く、
//! 複数のオブジェクトが1つの文字列に連結されて届くことがある。

use serde::Deserialize;

/// デコード済みのステータス行
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StatusLine {
    pub id: Option<String>,
    pub stream: Option<String>,
    pub status: Option<String>,
    pub progress: Option<String>,
    pub error: Option<String>,
    #[serde(rename = "errorDetail", alias = "error_detail")]
    pub error_detail: Option<ErrorDetail>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ErrorDetail {
    pub code: Option<i64>,
    pub message: Option<String>,
}

impl StatusLine {
    /// エンジンが報告したエラーメッセージ
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref().or_else(|| {
            self.error_detail
                .as_ref()
                .and_then(|detail| detail.message.as_deref())
        })
    }
}

/// 連結された JSON オブジェクト列を個々のオブジェクトに分割する
///
/// 文字列全体が1つの JSON として読めればそのまま返す（配列なら要素ごと）。
/// 読めない場合は波括弧の深さを数えて分割する。末尾の閉じていない断片は捨てる。
pub fn parse_status(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(serde_json::Value::Object(_)) => return vec![trimmed.to_string()],
        Ok(serde_json::Value::Array(items)) => {
            return items
                .into_iter()
                .filter(|item| item.is_object())
                .map(|item| item.to_string())
                .collect();
        }
        Ok(other) => {
            tracing::debug!(value = %other, "Ignoring non-object status payload");
            return Vec::new();
        }
        Err(e) => {
            tracing::trace!(error = %e, "Status output is not a single document, splitting");
        }
    }

    split_objects(raw)
}

/// 波括弧の深さで JSON オブジェクトを切り出す
///
/// 文字列リテラル内の波括弧は数えない。CR / LF は読み飛ばす。
/// オブジェクトの外にある文字は区切りとして扱う。
fn split_objects(raw: &str) -> Vec<String> {
    let mut units = Vec::new();
    let mut buffer = String::new();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for c in raw.chars() {
        if c == '\r' || c == '\n' {
            continue;
        }

        if depth == 0 && c != '{' {
            continue;
        }

        buffer.push(c);

        if in_string {
            if escape_next {
                escape_next = false;
            } else if c == '\\' {
                escape_next = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    units.push(std::mem::take(&mut buffer));
                }
            }
            _ => {}
        }
    }

    if !buffer.is_empty() {
        tracing::debug!(
            fragment_len = buffer.len(),
            depth,
            "Dropping truncated status fragment"
        );
    }

    units
}

/// ステータス出力を分割して `StatusLine` にデコードする
///
/// デコードできない断片は読み飛ばす。
pub fn decode_status(raw: &str) -> Vec<StatusLine> {
    parse_status(raw)
        .into_iter()
        .filter_map(|unit| match serde_json::from_str::<StatusLine>(&unit) {
            Ok(line) => Some(line),
            Err(e) => {
                tracing::debug!(error = %e, unit = %unit, "Skipping undecodable status line");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_JSON_STRING: &str =
        r#"{"status":"test one (len: 1)"}{"status":"test two (len: 1)"}"#;

    #[test]
    fn test_empty_input() {
        assert!(parse_status("").is_empty());
        assert!(parse_status("\r\n").is_empty());
    }

    #[test]
    fn test_single_object() {
        let s = r#"{"stream":"Step 1/3 : FROM ubuntu\n"}"#;
        assert_eq!(parse_status(s), vec![s.to_string()]);
    }

    #[test]
    fn test_back_to_back_objects() {
        // 連結された文字列はそのままでは JSON として読めない
        let err = serde_json::from_str::<serde_json::Value>(TEST_JSON_STRING).unwrap_err();
        assert!(err.to_string().contains("trailing characters"));

        let units = parse_status(TEST_JSON_STRING);

        assert_eq!(
            units,
            vec![
                r#"{"status":"test one (len: 1)"}"#.to_string(),
                r#"{"status":"test two (len: 1)"}"#.to_string(),
            ]
        );
        for unit in &units {
            serde_json::from_str::<serde_json::Value>(unit).unwrap();
        }
    }

    #[test]
    fn test_many_objects_keep_order() {
        let objects: Vec<String> = (0..20)
            .map(|i| format!(r#"{{"stream":"line {}"}}"#, i))
            .collect();
        let raw = objects.concat();

        assert_eq!(parse_status(&raw), objects);
    }

    #[test]
    fn test_line_breaks_are_skipped() {
        let raw = "{\"stream\":\"a\"}\r\n{\"status\":\n\"b\"}\n";

        let units = parse_status(raw);

        assert_eq!(
            units,
            vec![r#"{"stream":"a"}"#.to_string(), r#"{"status":"b"}"#.to_string()]
        );
    }

    #[test]
    fn test_truncated_trailing_fragment_is_dropped() {
        let raw = r#"{"stream":"one"}{"stream":"two"}{"stream":"thr"#;

        let units = parse_status(raw);

        assert_eq!(
            units,
            vec![r#"{"stream":"one"}"#.to_string(), r#"{"stream":"two"}"#.to_string()]
        );
    }

    #[test]
    fn test_nested_objects() {
        let raw = r#"{"status":"Pushing","progressDetail":{"current":1,"total":2}}{"status":"Pushed"}"#;

        let lines = decode_status(raw);

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].status.as_deref(), Some("Pushing"));
        assert_eq!(lines[1].status.as_deref(), Some("Pushed"));
    }

    #[test]
    fn test_braces_inside_strings() {
        let raw = r#"{"stream":"RUN echo ${HOME} }{"}{"stream":"say \"{hi}\""}"#;

        let units = parse_status(raw);

        assert_eq!(units.len(), 2);
        let first: StatusLine = serde_json::from_str(&units[0]).unwrap();
        let second: StatusLine = serde_json::from_str(&units[1]).unwrap();
        assert_eq!(first.stream.as_deref(), Some("RUN echo ${HOME} }{"));
        assert_eq!(second.stream.as_deref(), Some(r#"say "{hi}""#));
    }

    #[test]
    fn test_separators_between_objects_are_ignored() {
        let raw = r#" {"stream":"a"} , {"stream":"b"} }"#;

        assert_eq!(
            parse_status(raw),
            vec![r#"{"stream":"a"}"#.to_string(), r#"{"stream":"b"}"#.to_string()]
        );
    }

    #[test]
    fn test_json_array_fast_path() {
        let raw = r#"[{"stream":"a"},{"stream":"b"}]"#;

        let lines = decode_status(raw);

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].stream.as_deref(), Some("a"));
        assert_eq!(lines[1].stream.as_deref(), Some("b"));
    }

    #[test]
    fn test_error_detail() {
        let raw = r#"{"errorDetail":{"message":"denied: requested access to the resource is denied"},"error":"denied: requested access to the resource is denied"}"#;

        let lines = decode_status(raw);

        assert_eq!(lines.len(), 1);
        assert_eq!(
            lines[0].error_message(),
            Some("denied: requested access to the resource is denied")
        );
    }

    #[test]
    fn test_error_detail_without_error_field() {
        let raw = r#"{"errorDetail":{"code":1,"message":"The command returned a non-zero code: 1"}}"#;

        let lines = decode_status(raw);

        assert_eq!(
            lines[0].error_message(),
            Some("The command returned a non-zero code: 1")
        );
    }

    #[test]
    fn test_undecodable_units_are_skipped() {
        let raw = r#"{"stream":"ok"}{"stream":42}"#;

        let lines = decode_status(raw);

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].stream.as_deref(), Some("ok"));
    }
}
