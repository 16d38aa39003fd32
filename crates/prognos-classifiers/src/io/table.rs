//! Column-typed CSV table.
//!
//! Cells are typed per column the way dataframe CSV readers infer them: a
//! column is numeric when every present cell parses as a number, boolean
//! when every cell is a `True`/`False` literal, and text otherwise. Missing
//! cells become `NaN` in numeric columns and `None` in text columns.
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::PredictError;
use crate::math::Array2;

/// Tokens read as a missing value.
const NA_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

const TRUE_VALUES: &[&str] = &["True", "TRUE", "true"];
const FALSE_VALUES: &[&str] = &["False", "FALSE", "false"];

#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Numeric(Vec<f32>),
    Boolean(Vec<bool>),
    Text(Vec<Option<String>>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(v) => v.len(),
            Column::Boolean(v) => v.len(),
            Column::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Column::Text(_))
    }

    /// Numeric view of the column; `None` for text columns.
    pub fn as_f32(&self) -> Option<Vec<f32>> {
        match self {
            Column::Numeric(v) => Some(v.clone()),
            Column::Boolean(v) => Some(v.iter().map(|&b| if b { 1.0 } else { 0.0 }).collect()),
            Column::Text(_) => None,
        }
    }

    /// Render a cell as a row label.
    fn label(&self, row: usize) -> String {
        match self {
            Column::Numeric(v) => format_number(v[row]),
            Column::Boolean(v) => if v[row] { "True" } else { "False" }.to_string(),
            Column::Text(v) => v[row].clone().unwrap_or_else(|| "nan".to_string()),
        }
    }

    fn infer(cells: Vec<String>) -> Column {
        let present: Vec<&str> = cells
            .iter()
            .map(|c| c.as_str())
            .filter(|c| !is_missing(c))
            .collect();

        if present.iter().all(|c| c.trim().parse::<f64>().is_ok()) {
            return Column::Numeric(
                cells
                    .iter()
                    .map(|c| {
                        if is_missing(c) {
                            f32::NAN
                        } else {
                            c.trim().parse::<f64>().map(|v| v as f32).unwrap_or(f32::NAN)
                        }
                    })
                    .collect(),
            );
        }

        let all_bool = present.len() == cells.len()
            && present
                .iter()
                .all(|c| TRUE_VALUES.contains(c) || FALSE_VALUES.contains(c));
        if all_bool {
            return Column::Boolean(
                cells
                    .iter()
                    .map(|c| TRUE_VALUES.contains(&c.as_str()))
                    .collect(),
            );
        }

        Column::Text(
            cells
                .into_iter()
                .map(|c| if is_missing(&c) { None } else { Some(c) })
                .collect(),
        )
    }
}

fn is_missing(cell: &str) -> bool {
    NA_VALUES.contains(&cell)
}

fn format_number(v: f32) -> String {
    if v.is_nan() {
        "nan".to_string()
    } else if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}

/// A CSV table with named, typed columns and string row labels.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    columns: Vec<Column>,
    index: Vec<String>,
}

impl Table {
    /// Build a table from named columns. Row labels default to positions.
    pub fn new(headers: Vec<String>, columns: Vec<Column>) -> Result<Self, PredictError> {
        if headers.len() != columns.len() {
            return Err(PredictError::Schema(format!(
                "{} column names for {} columns",
                headers.len(),
                columns.len()
            )));
        }
        let nrows = columns.first().map(|c| c.len()).unwrap_or(0);
        if let Some((name, _)) = headers
            .iter()
            .zip(columns.iter())
            .find(|(_, c)| c.len() != nrows)
        {
            return Err(PredictError::Schema(format!(
                "column '{}' length does not match {} rows",
                name, nrows
            )));
        }
        Ok(Self {
            headers,
            columns,
            index: (0..nrows).map(|i| i.to_string()).collect(),
        })
    }

    /// Parse a headered CSV stream.
    ///
    /// Rows shorter than the header are padded with missing cells; rows
    /// longer than the header are rejected.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, PredictError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
        if headers.is_empty() || (headers.len() == 1 && headers[0].is_empty()) {
            return Err(PredictError::Schema("No columns to parse from file".to_string()));
        }

        let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
        for record in reader.records() {
            let record = record?;
            if record.len() > headers.len() {
                let line = record.position().map(|p| p.line()).unwrap_or(0);
                return Err(PredictError::Schema(format!(
                    "Expected {} fields in line {}, saw {}",
                    headers.len(),
                    line,
                    record.len()
                )));
            }
            for (i, col) in cells.iter_mut().enumerate() {
                col.push(record.get(i).unwrap_or("").to_string());
            }
        }

        let columns = cells.into_iter().map(Column::infer).collect();
        Self::new(headers, columns)
    }

    pub fn nrows(&self) -> usize {
        self.index.len()
    }

    pub fn ncols(&self) -> usize {
        self.headers.len()
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Row labels; positional (`"0"`, `"1"`, ...) unless an index column was
    /// set. Positional labels are strings too, so callers can match on them
    /// like any other sample id.
    pub fn index(&self) -> &[String] {
        &self.index
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.column_index(name).map(|i| &self.columns[i])
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.headers.iter().map(|h| h.as_str()).zip(self.columns.iter())
    }

    pub fn columns_mut(&mut self) -> impl Iterator<Item = (&str, &mut Column)> {
        self.headers.iter().map(|h| h.as_str()).zip(self.columns.iter_mut())
    }

    /// Remove a column, returning it if present.
    pub fn drop_column(&mut self, name: &str) -> Option<Column> {
        let idx = self.column_index(name)?;
        self.headers.remove(idx);
        Some(self.columns.remove(idx))
    }

    /// Move a column into the row labels.
    pub fn set_index(&mut self, name: &str) -> Result<(), PredictError> {
        let column = self
            .drop_column(name)
            .ok_or_else(|| PredictError::Schema(format!("column '{}' not in table", name)))?;
        self.index = (0..column.len()).map(|row| column.label(row)).collect();
        Ok(())
    }

    /// Swap rows and columns: row labels become headers and headers become
    /// row labels. Only numeric tables can be transposed.
    pub fn transpose(&self) -> Result<Table, PredictError> {
        let matrix = self.to_matrix(&(0..self.ncols()).collect::<Vec<_>>())?;
        let t = matrix.transpose();
        let columns = (0..t.ncols())
            .map(|c| Column::Numeric(t.column(c).to_vec()))
            .collect();
        Ok(Table {
            headers: self.index.clone(),
            columns,
            index: self.headers.clone(),
        })
    }

    /// Dense `f32` matrix of the given columns, in the given order.
    pub fn to_matrix(&self, columns: &[usize]) -> Result<Array2<f32>, PredictError> {
        let nrows = self.nrows();
        let mut values = Vec::with_capacity(columns.len());
        for &c in columns {
            let col = self.columns[c].as_f32().ok_or_else(|| {
                PredictError::Schema(format!(
                    "column '{}' is not numeric and cannot be used as a feature",
                    self.headers[c]
                ))
            })?;
            values.push(col);
        }

        let mut data = Vec::with_capacity(nrows * columns.len());
        for row in 0..nrows {
            data.extend(values.iter().map(|col| col[row]));
        }
        Array2::from_shape_vec((nrows, columns.len()), data)
            .map_err(|e| PredictError::Schema(e.to_string()))
    }
}

/// Read a CSV file from disk.
pub fn read_table<P: AsRef<Path>>(path: P) -> Result<Table, PredictError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(PredictError::MissingInput(path.to_path_buf()));
    }
    let file = File::open(path)?;
    Table::from_reader(file)
}
