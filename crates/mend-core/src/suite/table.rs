//! Table-form test suites.
//!
//! Column 0 is the case label, column 1 the expected output, columns 2+
//! positional arguments typed by a `name:type` header. Supported casts:
//! int, float, str, bool, list, tuple, dict, json.

use serde::{Deserialize, Serialize};

use crate::errors::SuiteError;

use super::value::{ArgValue, TestCase};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cast {
    Int,
    Float,
    Str,
    Bool,
    List,
    Tuple,
    Dict,
    Json,
}

impl Cast {
    fn parse(name: &str) -> Option<Cast> {
        match name {
            "int" => Some(Cast::Int),
            "float" => Some(Cast::Float),
            "str" => Some(Cast::Str),
            "bool" => Some(Cast::Bool),
            "list" => Some(Cast::List),
            "tuple" => Some(Cast::Tuple),
            "dict" => Some(Cast::Dict),
            "json" => Some(Cast::Json),
            _ => None,
        }
    }
}

/// An ordered, immutable test suite shared read-only across a whole search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestSuite {
    cases: Vec<TestCase>,
}

impl TestSuite {
    pub fn from_cases(cases: Vec<TestCase>) -> Self {
        Self { cases }
    }

    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// Build a suite from a header row and data rows.
    ///
    /// Headers: `[label, expected, "name:type", ...]`. The first two header
    /// cells are free-form; only argument columns carry the cast.
    pub fn from_table(headers: &[String], rows: &[Vec<String>]) -> Result<Self, SuiteError> {
        if headers.len() < 2 {
            return Err(SuiteError::MissingColumns {
                columns: headers.len(),
            });
        }
        let casts = headers[2..]
            .iter()
            .map(|header| {
                let (_, cast_name) = header
                    .split_once(':')
                    .ok_or_else(|| SuiteError::BadHeader {
                        header: header.clone(),
                    })?;
                Cast::parse(cast_name.trim()).ok_or_else(|| SuiteError::UnknownCast {
                    header: header.clone(),
                    cast: cast_name.trim().to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut cases = Vec::with_capacity(rows.len());
        for (row_idx, row) in rows.iter().enumerate() {
            if row.len() != headers.len() {
                return Err(SuiteError::RaggedRow {
                    row: row_idx + 1,
                    got: row.len(),
                    expected: headers.len(),
                });
            }
            let args = row[2..]
                .iter()
                .zip(casts.iter())
                .map(|(cell, cast)| cast_cell(row_idx + 1, cell, *cast))
                .collect::<Result<Vec<_>, _>>()?;
            cases.push(TestCase::new(row[0].trim(), row[1].trim(), args));
        }
        Ok(Self { cases })
    }

    /// Build a suite from CSV text whose first record is the header row.
    /// Fields may be double-quoted; quoted fields can contain commas and
    /// doubled quotes.
    pub fn from_csv(text: &str) -> Result<Self, SuiteError> {
        let mut records = text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(split_csv_record);
        let headers = records.next().ok_or(SuiteError::MissingColumns { columns: 0 })?;
        let rows: Vec<Vec<String>> = records.collect();
        Self::from_table(&headers, &rows)
    }
}

fn cast_cell(row: usize, cell: &str, cast: Cast) -> Result<ArgValue, SuiteError> {
    let bad = |message: String| SuiteError::BadCast {
        row,
        cell: cell.to_string(),
        cast: format!("{:?}", cast).to_lowercase(),
        message,
    };
    let trimmed = cell.trim();
    match cast {
        Cast::Int => trimmed
            .parse::<i64>()
            .map(ArgValue::Int)
            .map_err(|e| bad(e.to_string())),
        Cast::Float => trimmed
            .parse::<f64>()
            .map(ArgValue::Float)
            .map_err(|e| bad(e.to_string())),
        Cast::Str => Ok(ArgValue::Str(cell.to_string())),
        Cast::Bool => match trimmed {
            "True" | "true" | "1" => Ok(ArgValue::Bool(true)),
            "False" | "false" | "0" => Ok(ArgValue::Bool(false)),
            other => Err(bad(format!("not a boolean: {other}"))),
        },
        Cast::List | Cast::Tuple | Cast::Dict | Cast::Json => {
            let value: serde_json::Value =
                serde_json::from_str(trimmed).map_err(|e| bad(e.to_string()))?;
            let arg = ArgValue::from_json(&value);
            match (cast, arg) {
                (Cast::Tuple, ArgValue::List(items)) => Ok(ArgValue::Tuple(items)),
                (Cast::List, v @ ArgValue::List(_)) => Ok(v),
                (Cast::Dict, v @ ArgValue::Dict(_)) => Ok(v),
                (Cast::Json, v) => Ok(v),
                (_, v) => Ok(v),
            }
        }
    }
}

/// Split one CSV record, honoring double-quoted fields.
fn split_csv_record(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut chars = line.chars().peekable();
    let mut in_quotes = false;
    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut field));
            }
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_typed_argument_columns() {
        let headers = vec![
            "test_cases".to_string(),
            "expected_output".to_string(),
            "prices:dict".to_string(),
            "bonus:int".to_string(),
        ];
        let rows = vec![vec![
            "test1".to_string(),
            "30".to_string(),
            r#"{"a": 10, "b": 20}"#.to_string(),
            "0".to_string(),
        ]];
        let suite = TestSuite::from_table(&headers, &rows).unwrap();
        assert_eq!(suite.len(), 1);
        let case = &suite.cases()[0];
        assert_eq!(case.name, "test1");
        assert_eq!(case.expected, "30");
        assert_eq!(case.args.len(), 2);
        assert_eq!(case.args[1], ArgValue::Int(0));
        match &case.args[0] {
            ArgValue::Dict(pairs) => assert_eq!(pairs.len(), 2),
            other => panic!("expected dict, got {other:?}"),
        }
    }

    #[test]
    fn csv_front_end_handles_quoted_json() {
        let csv = "test_cases,expected_output,data:list\n\
                   t1,6,\"[1, 2, 3]\"\n\
                   t2,0,\"[]\"\n";
        let suite = TestSuite::from_csv(csv).unwrap();
        assert_eq!(suite.len(), 2);
        assert_eq!(
            suite.cases()[0].args[0],
            ArgValue::List(vec![ArgValue::Int(1), ArgValue::Int(2), ArgValue::Int(3)])
        );
    }

    #[test]
    fn rejects_unknown_casts() {
        let headers = vec![
            "label".to_string(),
            "expected".to_string(),
            "x:complex128".to_string(),
        ];
        let err = TestSuite::from_table(&headers, &[]).unwrap_err();
        assert!(matches!(err, SuiteError::UnknownCast { .. }));
    }

    #[test]
    fn tuple_cast_wraps_json_arrays() {
        let headers = vec![
            "label".to_string(),
            "expected".to_string(),
            "pair:tuple".to_string(),
        ];
        let rows = vec![vec![
            "t".to_string(),
            "x".to_string(),
            "[1, 2]".to_string(),
        ]];
        let suite = TestSuite::from_table(&headers, &rows).unwrap();
        assert_eq!(
            suite.cases()[0].args[0],
            ArgValue::Tuple(vec![ArgValue::Int(1), ArgValue::Int(2)])
        );
    }
}
