//! ARFF dataset loader and writer
//!
//! Parses attribute-relation files into a [`Dataset`]: a polars `DataFrame`
//! paired with the attribute manifest declared in the file header. Numeric
//! attributes (`numeric`, `real`, `integer`) become `Float64` columns;
//! nominal and string attributes become `String` columns. `?` is a missing
//! value. Both dense rows and sparse rows (`{index value, ...}`) are accepted.

use std::fmt;

use polars::prelude::*;
use serde::Serialize;

use super::error::{PipelineError, PipelineResult};

/// Declared type of an ARFF attribute, kept verbatim from the header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeType {
    Numeric,
    Real,
    Integer,
    String,
    /// Nominal attribute with its declared domain, in declaration order
    Nominal(Vec<String>),
}

impl AttributeType {
    /// Whether values of this attribute are stored as `Float64`
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            AttributeType::Numeric | AttributeType::Real | AttributeType::Integer
        )
    }

    fn parse(raw: &str, line: usize) -> PipelineResult<Self> {
        let raw = raw.trim();
        if let Some(inner) = raw.strip_prefix('{') {
            let inner = inner.strip_suffix('}').ok_or_else(|| {
                PipelineError::parse(line, format!("unterminated nominal domain '{}'", raw))
            })?;
            let values = split_values(inner, line)?
                .iter()
                .map(|token| unquote(token).0)
                .collect::<Vec<_>>();
            if values.is_empty() {
                return Err(PipelineError::parse(line, "nominal attribute with empty domain"));
            }
            return Ok(AttributeType::Nominal(values));
        }

        match raw.to_lowercase().as_str() {
            "numeric" => Ok(AttributeType::Numeric),
            "real" => Ok(AttributeType::Real),
            "integer" => Ok(AttributeType::Integer),
            "string" => Ok(AttributeType::String),
            other => Err(PipelineError::parse(
                line,
                format!("unknown attribute type '{}'", other),
            )),
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeType::Numeric => write!(f, "numeric"),
            AttributeType::Real => write!(f, "real"),
            AttributeType::Integer => write!(f, "integer"),
            AttributeType::String => write!(f, "string"),
            AttributeType::Nominal(values) => {
                let quoted: Vec<String> = values.iter().map(|v| quote_if_needed(v)).collect();
                write!(f, "{{{}}}", quoted.join(","))
            }
        }
    }
}

/// A named, typed column declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribute {
    pub name: String,
    pub kind: AttributeType,
}

/// Record table with a frozen column manifest.
///
/// The manifest is validated against the frame on construction, so every
/// later stage can rely on column names and types without re-checking the
/// data itself.
#[derive(Debug, Clone)]
pub struct Dataset {
    relation: String,
    attributes: Vec<Attribute>,
    frame: DataFrame,
}

impl Dataset {
    /// Pair a frame with its manifest, checking that they agree.
    pub fn new(
        relation: impl Into<String>,
        attributes: Vec<Attribute>,
        frame: DataFrame,
    ) -> PipelineResult<Self> {
        if attributes.len() != frame.width() {
            return Err(PipelineError::Schema(format!(
                "manifest declares {} attributes but table has {} columns",
                attributes.len(),
                frame.width()
            )));
        }

        for (attr, col) in attributes.iter().zip(frame.get_columns()) {
            if attr.name != col.name().as_str() {
                return Err(PipelineError::Schema(format!(
                    "manifest column '{}' does not match table column '{}'",
                    attr.name,
                    col.name()
                )));
            }
            let compatible = if attr.kind.is_numeric() {
                col.dtype().is_primitive_numeric()
            } else {
                col.dtype() == &DataType::String
            };
            if !compatible {
                return Err(PipelineError::Schema(format!(
                    "column '{}' declared {} but stored as {}",
                    attr.name,
                    attr.kind,
                    col.dtype()
                )));
            }
        }

        Ok(Self {
            relation: relation.into(),
            attributes,
            frame,
        })
    }

    /// Build a dataset from an existing frame, inferring the manifest from dtypes.
    ///
    /// Primitive numeric columns become `numeric` attributes and `String`
    /// columns become `string` attributes; any other dtype is rejected.
    pub fn from_frame(relation: impl Into<String>, frame: DataFrame) -> PipelineResult<Self> {
        let attributes = frame
            .get_columns()
            .iter()
            .map(|col| {
                let kind = if col.dtype().is_primitive_numeric() {
                    AttributeType::Numeric
                } else if col.dtype() == &DataType::String {
                    AttributeType::String
                } else {
                    return Err(PipelineError::Schema(format!(
                        "column '{}' has unsupported type {}",
                        col.name(),
                        col.dtype()
                    )));
                };
                Ok(Attribute {
                    name: col.name().to_string(),
                    kind,
                })
            })
            .collect::<PipelineResult<Vec<_>>>()?;

        Self::new(relation, attributes, frame)
    }

    pub fn relation(&self) -> &str {
        &self.relation
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// Ordered (name, declared type) pairs
    pub fn schema(&self) -> Vec<(String, AttributeType)> {
        self.attributes
            .iter()
            .map(|a| (a.name.clone(), a.kind.clone()))
            .collect()
    }

    /// Look up an attribute, failing with a schema error when absent
    pub fn attribute(&self, name: &str) -> PipelineResult<&Attribute> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .ok_or_else(|| {
                PipelineError::Schema(format!(
                    "column '{}' not found. Available columns: {:?}",
                    name,
                    self.attributes.iter().map(|a| &a.name).collect::<Vec<_>>()
                ))
            })
    }

    /// Values of a numeric column as `f64`
    pub fn numeric_values(&self, name: &str) -> PipelineResult<Vec<Option<f64>>> {
        let attr = self.attribute(name)?;
        if !attr.kind.is_numeric() {
            return Err(PipelineError::Schema(format!(
                "column '{}' is {} but a numeric column is required",
                name, attr.kind
            )));
        }
        column_as_f64(self.frame.column(name)?)
    }

    /// Values of a categorical column as owned strings
    pub fn string_values(&self, name: &str) -> PipelineResult<Vec<Option<String>>> {
        let attr = self.attribute(name)?;
        if attr.kind.is_numeric() {
            return Err(PipelineError::Schema(format!(
                "column '{}' is {} but a categorical column is required",
                name, attr.kind
            )));
        }
        column_as_strings(self.frame.column(name)?)
    }

    /// Rows at the given positions, in the given order
    pub fn take_rows(&self, indices: &[IdxSize]) -> PipelineResult<Self> {
        let idx = IdxCa::from_vec("idx".into(), indices.to_vec());
        let frame = self.frame.take(&idx)?;
        Ok(Self {
            relation: self.relation.clone(),
            attributes: self.attributes.clone(),
            frame,
        })
    }

    /// Same manifest, different column values. Used by conditioning steps.
    pub fn with_frame(&self, frame: DataFrame) -> PipelineResult<Self> {
        Self::new(self.relation.clone(), self.attributes.clone(), frame)
    }

    /// Copy of the dataset without the named column
    pub fn drop_column(&self, name: &str) -> PipelineResult<Self> {
        self.attribute(name)?;
        let frame = self.frame.drop(name)?;
        let attributes = self
            .attributes
            .iter()
            .filter(|a| a.name != name)
            .cloned()
            .collect();
        Self::new(self.relation.clone(), attributes, frame)
    }

    /// Copy restricted to the named columns, in the given order
    pub fn select_columns(&self, names: &[&str]) -> PipelineResult<Self> {
        let attributes = names
            .iter()
            .map(|n| self.attribute(n).cloned())
            .collect::<PipelineResult<Vec<_>>>()?;
        let frame = self.frame.select(names.iter().copied())?;
        Self::new(self.relation.clone(), attributes, frame)
    }
}

/// Cast any numeric column to `f64` values
pub(crate) fn column_as_f64(col: &Column) -> PipelineResult<Vec<Option<f64>>> {
    let cast = col.cast(&DataType::Float64)?;
    Ok(cast.f64()?.iter().collect())
}

pub(crate) fn column_as_strings(col: &Column) -> PipelineResult<Vec<Option<String>>> {
    Ok(col
        .str()?
        .iter()
        .map(|v| v.map(|s| s.to_string()))
        .collect())
}

enum ColumnBuilder {
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

impl ColumnBuilder {
    fn push_missing(&mut self) {
        match self {
            ColumnBuilder::Numeric(v) => v.push(None),
            ColumnBuilder::Text(v) => v.push(None),
        }
    }
}

/// Parse an ARFF document from raw bytes.
///
/// The whole stream is decoded up front; a leading BOM is tolerated and
/// invalid UTF-8 is reported as a parse error.
pub fn parse_arff(bytes: &[u8]) -> PipelineResult<Dataset> {
    let (text, _, had_errors) = encoding_rs::UTF_8.decode(bytes);
    if had_errors {
        return Err(PipelineError::Parse(
            "input is not valid UTF-8 text".to_string(),
        ));
    }

    let mut relation: Option<String> = None;
    let mut attributes: Vec<Attribute> = Vec::new();
    let mut builders: Vec<ColumnBuilder> = Vec::new();
    let mut in_data = false;

    for (idx, raw_line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('%') {
            continue;
        }

        if !in_data {
            let (keyword, rest) = split_keyword(line);
            match keyword.to_lowercase().as_str() {
                "@relation" => {
                    if rest.is_empty() {
                        return Err(PipelineError::parse(line_no, "@relation without a name"));
                    }
                    relation = Some(unquote(rest).0);
                }
                "@attribute" => {
                    if relation.is_none() {
                        return Err(PipelineError::parse(
                            line_no,
                            "@attribute declared before @relation",
                        ));
                    }
                    let (name, type_str) = split_attribute_name(rest, line_no)?;
                    if attributes.iter().any(|a| a.name == name) {
                        return Err(PipelineError::parse(
                            line_no,
                            format!("duplicate attribute '{}'", name),
                        ));
                    }
                    let kind = AttributeType::parse(type_str, line_no)?;
                    builders.push(if kind.is_numeric() {
                        ColumnBuilder::Numeric(Vec::new())
                    } else {
                        ColumnBuilder::Text(Vec::new())
                    });
                    attributes.push(Attribute { name, kind });
                }
                "@data" => {
                    if relation.is_none() {
                        return Err(PipelineError::parse(line_no, "missing @relation header"));
                    }
                    if attributes.is_empty() {
                        return Err(PipelineError::parse(line_no, "no @attribute declarations"));
                    }
                    in_data = true;
                }
                _ => {
                    return Err(PipelineError::parse(
                        line_no,
                        format!("unexpected header line '{}'", line),
                    ))
                }
            }
            continue;
        }

        if line.starts_with('{') {
            parse_sparse_row(line, line_no, &attributes, &mut builders)?;
        } else {
            parse_dense_row(line, line_no, &attributes, &mut builders)?;
        }
    }

    if !in_data {
        return Err(PipelineError::Parse(
            if relation.is_none() {
                "missing @relation header"
            } else {
                "missing @data section"
            }
            .to_string(),
        ));
    }

    let columns: Vec<Column> = attributes
        .iter()
        .zip(builders)
        .map(|(attr, builder)| match builder {
            ColumnBuilder::Numeric(values) => Column::new(attr.name.as_str().into(), values),
            ColumnBuilder::Text(values) => Column::new(attr.name.as_str().into(), values),
        })
        .collect();

    let frame = DataFrame::new(columns)?;
    Dataset::new(relation.unwrap_or_default(), attributes, frame)
}

fn parse_dense_row(
    line: &str,
    line_no: usize,
    attributes: &[Attribute],
    builders: &mut [ColumnBuilder],
) -> PipelineResult<()> {
    let tokens = split_values(line, line_no)?;
    if tokens.len() != attributes.len() {
        return Err(PipelineError::parse(
            line_no,
            format!(
                "row has {} values, expected {}",
                tokens.len(),
                attributes.len()
            ),
        ));
    }

    for ((token, attr), builder) in tokens.iter().zip(attributes).zip(builders.iter_mut()) {
        push_cell(token, attr, builder, line_no)?;
    }
    Ok(())
}

fn parse_sparse_row(
    line: &str,
    line_no: usize,
    attributes: &[Attribute],
    builders: &mut [ColumnBuilder],
) -> PipelineResult<()> {
    let inner = line
        .strip_prefix('{')
        .and_then(|l| l.strip_suffix('}'))
        .ok_or_else(|| PipelineError::parse(line_no, "unterminated sparse row"))?;

    let mut cells: Vec<Option<&str>> = vec![None; attributes.len()];
    for entry in split_values(inner, line_no)? {
        let (index, value) = entry
            .split_once(char::is_whitespace)
            .ok_or_else(|| PipelineError::parse(line_no, format!("bad sparse entry '{}'", entry)))?;
        let index: usize = index.trim().parse().map_err(|_| {
            PipelineError::parse(line_no, format!("bad sparse index '{}'", index))
        })?;
        if index >= attributes.len() {
            return Err(PipelineError::parse(
                line_no,
                format!(
                    "sparse index {} out of range for {} attributes",
                    index,
                    attributes.len()
                ),
            ));
        }
        cells[index] = Some(value.trim());
    }

    for ((cell, attr), builder) in cells.into_iter().zip(attributes).zip(builders.iter_mut()) {
        match cell {
            Some(token) => push_cell(token, attr, builder, line_no)?,
            None => match (&attr.kind, builder) {
                (AttributeType::Nominal(domain), ColumnBuilder::Text(v)) => {
                    v.push(domain.first().cloned())
                }
                (_, ColumnBuilder::Text(v)) => v.push(Some(String::new())),
                (_, ColumnBuilder::Numeric(v)) => v.push(Some(0.0)),
            },
        }
    }
    Ok(())
}

fn push_cell(
    token: &str,
    attr: &Attribute,
    builder: &mut ColumnBuilder,
    line_no: usize,
) -> PipelineResult<()> {
    let (value, quoted) = unquote(token);
    if !quoted && value == "?" {
        builder.push_missing();
        return Ok(());
    }

    match (&attr.kind, builder) {
        (AttributeType::Nominal(domain), ColumnBuilder::Text(v)) => {
            if !domain.contains(&value) {
                return Err(PipelineError::parse(
                    line_no,
                    format!(
                        "value '{}' not in the declared domain of '{}'",
                        value, attr.name
                    ),
                ));
            }
            v.push(Some(value));
        }
        (_, ColumnBuilder::Text(v)) => v.push(Some(value)),
        (_, ColumnBuilder::Numeric(v)) => {
            let parsed = value
                .parse::<f64>()
                .ok()
                .filter(|x| x.is_finite())
                .ok_or_else(|| {
                    PipelineError::parse(
                        line_no,
                        format!("'{}' is not a finite number (column '{}')", value, attr.name),
                    )
                })?;
            v.push(Some(parsed));
        }
    }
    Ok(())
}

/// Split a header line into its `@keyword` and the remainder
fn split_keyword(line: &str) -> (&str, &str) {
    match line.split_once(char::is_whitespace) {
        Some((keyword, rest)) => (keyword, rest.trim()),
        None => (line, ""),
    }
}

/// Split `name type` where the name may be quoted and contain spaces
fn split_attribute_name(rest: &str, line_no: usize) -> PipelineResult<(String, &str)> {
    let rest = rest.trim();
    let first = rest.chars().next().ok_or_else(|| {
        PipelineError::parse(line_no, "@attribute without a name")
    })?;

    let (name, type_str) = if first == '\'' || first == '"' {
        let close = rest[1..].find(first).ok_or_else(|| {
            PipelineError::parse(line_no, "unterminated quoted attribute name")
        })?;
        (rest[1..close + 1].to_string(), rest[close + 2..].trim())
    } else {
        match rest.split_once(char::is_whitespace) {
            Some((name, type_str)) => (name.to_string(), type_str.trim()),
            None => (rest.to_string(), ""),
        }
    };

    if type_str.is_empty() {
        return Err(PipelineError::parse(
            line_no,
            format!("attribute '{}' has no type", name),
        ));
    }
    Ok((name, type_str))
}

/// Split a comma-separated list, keeping quoted commas inside their token.
/// Tokens are returned trimmed but still quoted.
fn split_values(line: &str, line_no: usize) -> PipelineResult<Vec<&str>> {
    let mut tokens = Vec::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, c) {
            (Some(_), '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (None, '\'') | (None, '"') => quote = Some(c),
            (None, ',') => {
                tokens.push(line[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }

    if quote.is_some() {
        return Err(PipelineError::parse(line_no, "unterminated quoted value"));
    }

    let last = line[start..].trim();
    if !(tokens.is_empty() && last.is_empty()) {
        tokens.push(last);
    }
    Ok(tokens)
}

/// Strip surrounding quotes and resolve backslash escapes.
/// Returns the value and whether it was quoted.
fn unquote(token: &str) -> (String, bool) {
    let token = token.trim();
    let mut chars = token.chars();
    match chars.next() {
        Some(q @ ('\'' | '"')) if token.len() >= 2 && token.ends_with(q) => {
            let inner = &token[1..token.len() - 1];
            let mut out = String::with_capacity(inner.len());
            let mut escaped = false;
            for c in inner.chars() {
                if escaped {
                    out.push(match c {
                        'n' => '\n',
                        't' => '\t',
                        other => other,
                    });
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else {
                    out.push(c);
                }
            }
            (out, true)
        }
        _ => (token.to_string(), false),
    }
}

fn quote_if_needed(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value == "?"
        || value
            .chars()
            .any(|c| matches!(c, ',' | '\'' | '"' | '%' | '{' | '}' | ' ' | '\t' | '\\'));
    if needs_quotes {
        format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
    } else {
        value.to_string()
    }
}

/// Serialize a dataset as an ARFF document.
///
/// The attribute manifest is written verbatim, so nominal domains survive a
/// round trip even when a subset no longer contains every declared value.
pub fn write_arff(dataset: &Dataset) -> PipelineResult<String> {
    let mut out = String::new();
    out.push_str(&format!("@relation {}\n\n", quote_if_needed(dataset.relation())));

    for attr in dataset.attributes() {
        out.push_str(&format!(
            "@attribute {} {}\n",
            quote_if_needed(&attr.name),
            attr.kind
        ));
    }
    out.push_str("\n@data\n");

    let cells: Vec<Vec<String>> = dataset
        .attributes()
        .iter()
        .map(|attr| {
            if attr.kind.is_numeric() {
                Ok(dataset
                    .numeric_values(&attr.name)?
                    .into_iter()
                    .map(|v| v.map_or_else(|| "?".to_string(), |x| format!("{}", x)))
                    .collect())
            } else {
                Ok(dataset
                    .string_values(&attr.name)?
                    .into_iter()
                    .map(|v| v.map_or_else(|| "?".to_string(), |s| quote_if_needed(&s)))
                    .collect())
            }
        })
        .collect::<PipelineResult<_>>()?;

    for row in 0..dataset.height() {
        let line: Vec<&str> = cells.iter().map(|col| col[row].as_str()).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }

    Ok(out)
}
