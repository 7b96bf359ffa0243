//! Reader for MAT v4 simulation result files.
//!
//! A result file is a stream of level-4 matrices:
//!
//! - `Aclass`: text, row 4 is `binTrans` or `binNormal` (storage order)
//! - `name`: text, one variable name per column (`binTrans`) or row
//! - `dataInfo`: integers, per variable `[block, signed column, interp, extrap]`
//! - `data_1`: constant block (usually two samples: start and stop time)
//! - `data_2`: continuous block, column 1 is time
//!
//! Block 0 in `dataInfo` marks the time variable itself.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::source::DataSource;
use crate::{ResultsError, ResultsResult};

const HEADER_LEN: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ByteOrder {
    Little,
    Big,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Precision {
    F64,
    F32,
    I32,
    I16,
    U16,
    U8,
}

impl Precision {
    fn from_digit(p: i32) -> ResultsResult<Self> {
        Ok(match p {
            0 => Self::F64,
            1 => Self::F32,
            2 => Self::I32,
            3 => Self::I16,
            4 => Self::U16,
            5 => Self::U8,
            other => {
                return Err(ResultsError::malformed(format!(
                    "unknown element precision {other}"
                )));
            }
        })
    }

    fn size(self) -> usize {
        match self {
            Self::F64 => 8,
            Self::F32 | Self::I32 => 4,
            Self::I16 | Self::U16 => 2,
            Self::U8 => 1,
        }
    }
}

/// One decoded matrix, column-major.
#[derive(Debug, Clone)]
struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row + col * self.rows]
    }

    /// Read the matrix as text, one string per row (`by_column == false`)
    /// or per column.
    fn strings(&self, by_column: bool) -> Vec<String> {
        let (count, len) = if by_column {
            (self.cols, self.rows)
        } else {
            (self.rows, self.cols)
        };
        (0..count)
            .map(|i| {
                let s: String = (0..len)
                    .map(|j| {
                        let v = if by_column { self.get(j, i) } else { self.get(i, j) };
                        char::from_u32(v as u32).unwrap_or('\0')
                    })
                    .collect();
                s.trim_end_matches(['\0', ' ']).to_string()
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DataInfo {
    block: i32,
    column: i32,
}

/// A parsed MAT v4 result file.
#[derive(Debug, Clone)]
pub struct MatResultFile {
    names: Vec<String>,
    index: HashMap<String, usize>,
    info: Vec<DataInfo>,
    blocks: [Option<Matrix>; 2],
    transposed: bool,
}

impl MatResultFile {
    pub fn open(path: &Path) -> ResultsResult<Self> {
        let bytes = fs::read(path)?;
        let file = Self::from_bytes(&bytes)?;
        tracing::debug!(
            path = %path.display(),
            variables = file.names.len(),
            transposed = file.transposed,
            "loaded MAT v4 results"
        );
        Ok(file)
    }

    pub fn from_bytes(bytes: &[u8]) -> ResultsResult<Self> {
        let mut matrices = read_matrices(bytes)?;

        let aclass = matrices
            .remove("Aclass")
            .ok_or_else(|| ResultsError::malformed("missing Aclass matrix"))?;
        let transposed = storage_is_transposed(&aclass)?;

        let name_matrix = matrices
            .remove("name")
            .ok_or_else(|| ResultsError::malformed("missing name matrix"))?;
        let names = name_matrix.strings(transposed);

        let info_matrix = matrices
            .remove("dataInfo")
            .ok_or_else(|| ResultsError::malformed("missing dataInfo matrix"))?;
        let info = decode_data_info(&info_matrix, transposed, names.len())?;

        let blocks = [matrices.remove("data_1"), matrices.remove("data_2")];
        if blocks.iter().all(Option::is_none) {
            return Err(ResultsError::malformed("no data_1 or data_2 matrix"));
        }

        let index = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), i))
            .collect();

        Ok(Self {
            names,
            index,
            info,
            blocks,
            transposed,
        })
    }

    fn lookup(&self, name: &str) -> ResultsResult<DataInfo> {
        self.index
            .get(name)
            .map(|&i| self.info[i])
            .ok_or_else(|| ResultsError::UnknownVariable {
                name: name.to_string(),
            })
    }

    /// Block 0 (the time variable) lives in the continuous block when present.
    fn block(&self, block: i32) -> ResultsResult<&Matrix> {
        let slot = match block {
            0 => {
                if self.blocks[1].is_some() {
                    1
                } else {
                    0
                }
            }
            1 => 0,
            2 => 1,
            other => {
                return Err(ResultsError::malformed(format!(
                    "variable refers to data block {other}"
                )));
            }
        };
        self.blocks[slot]
            .as_ref()
            .ok_or_else(|| ResultsError::malformed(format!("data block {block} is missing")))
    }

    /// Number of samples and stored columns of a data block.
    fn shape(&self, m: &Matrix) -> (usize, usize) {
        if self.transposed {
            (m.cols, m.rows)
        } else {
            (m.rows, m.cols)
        }
    }

    fn column(&self, m: &Matrix, column: usize) -> ResultsResult<Vec<f64>> {
        let (samples, columns) = self.shape(m);
        if column >= columns {
            return Err(ResultsError::malformed(format!(
                "column {} out of range ({} columns)",
                column + 1,
                columns
            )));
        }
        Ok((0..samples)
            .map(|t| {
                if self.transposed {
                    m.get(column, t)
                } else {
                    m.get(t, column)
                }
            })
            .collect())
    }
}

impl DataSource for MatResultFile {
    fn variable_names(&self) -> &[String] {
        &self.names
    }

    fn time_abscissa(&self, name: &str) -> ResultsResult<Vec<f64>> {
        let info = self.lookup(name)?;
        let block = self.block(info.block)?;
        self.column(block, 0)
    }

    fn values(&self, name: &str) -> ResultsResult<Vec<f64>> {
        let info = self.lookup(name)?;
        let block = self.block(info.block)?;
        if info.column == 0 {
            return Err(ResultsError::malformed(format!(
                "variable {name} has column reference 0"
            )));
        }
        let column = info.column.unsigned_abs() as usize - 1;
        let values = self.column(block, column)?;
        if info.column < 0 {
            Ok(values.into_iter().map(|v| -v).collect())
        } else {
            Ok(values)
        }
    }
}

fn storage_is_transposed(aclass: &Matrix) -> ResultsResult<bool> {
    let mut text = aclass.strings(false);
    text.extend(aclass.strings(true));
    if text.iter().any(|s| s.contains("binTrans")) {
        Ok(true)
    } else if text.iter().any(|s| s.contains("binNormal")) {
        Ok(false)
    } else {
        Err(ResultsError::malformed(
            "Aclass names neither binTrans nor binNormal",
        ))
    }
}

fn decode_data_info(m: &Matrix, transposed: bool, count: usize) -> ResultsResult<Vec<DataInfo>> {
    let (entries, width) = if transposed {
        (m.cols, m.rows)
    } else {
        (m.rows, m.cols)
    };
    if entries != count || width < 2 {
        return Err(ResultsError::malformed(format!(
            "dataInfo is {}x{} for {} variables",
            m.rows, m.cols, count
        )));
    }
    Ok((0..count)
        .map(|i| {
            let (block, column) = if transposed {
                (m.get(0, i), m.get(1, i))
            } else {
                (m.get(i, 0), m.get(i, 1))
            };
            DataInfo {
                block: block as i32,
                column: column as i32,
            }
        })
        .collect())
}

/// Split a level-4 stream into named matrices.
fn read_matrices(bytes: &[u8]) -> ResultsResult<HashMap<String, Matrix>> {
    let mut matrices = HashMap::new();
    let mut offset = 0;

    while offset < bytes.len() {
        let header = bytes
            .get(offset..offset + HEADER_LEN)
            .ok_or_else(|| ResultsError::malformed("truncated matrix header"))?;
        let order = detect_order(header)?;
        let field = |i: usize| read_i32(&header[i * 4..i * 4 + 4], order);

        let type_code = field(0);
        let rows = usize::try_from(field(1))
            .map_err(|_| ResultsError::malformed("negative row count"))?;
        let cols = usize::try_from(field(2))
            .map_err(|_| ResultsError::malformed("negative column count"))?;
        let imaginary = field(3);
        let name_len = usize::try_from(field(4))
            .map_err(|_| ResultsError::malformed("negative name length"))?;
        offset += HEADER_LEN;

        let (precision, kind) = split_type(type_code)?;
        if kind == 2 {
            return Err(ResultsError::malformed("sparse matrices are not supported"));
        }
        if imaginary != 0 {
            return Err(ResultsError::malformed("complex matrices are not supported"));
        }

        let name_end = offset
            .checked_add(name_len)
            .ok_or_else(|| ResultsError::malformed("matrix name too long"))?;
        let name_bytes = bytes
            .get(offset..name_end)
            .ok_or_else(|| ResultsError::malformed("truncated matrix name"))?;
        let name = String::from_utf8_lossy(name_bytes)
            .trim_end_matches('\0')
            .to_string();
        offset = name_end;

        let count = rows
            .checked_mul(cols)
            .ok_or_else(|| ResultsError::malformed("matrix too large"))?;
        let size = precision.size();
        let end = count
            .checked_mul(size)
            .and_then(|len| offset.checked_add(len))
            .ok_or_else(|| ResultsError::malformed("matrix too large"))?;
        let data_bytes = bytes
            .get(offset..end)
            .ok_or_else(|| ResultsError::malformed(format!("truncated data for {name}")))?;
        let data = data_bytes
            .chunks_exact(size)
            .map(|chunk| decode(chunk, precision, order))
            .collect();
        offset = end;

        matrices.insert(name, Matrix { rows, cols, data });
    }

    Ok(matrices)
}

/// The thousands digit of the type field is 0 for little-endian and 1 for
/// big-endian; only one reading of the header yields a valid digit.
fn detect_order(header: &[u8]) -> ResultsResult<ByteOrder> {
    let le = read_i32(&header[0..4], ByteOrder::Little);
    if (0..1000).contains(&le) {
        return Ok(ByteOrder::Little);
    }
    let be = read_i32(&header[0..4], ByteOrder::Big);
    if (1000..2000).contains(&be) {
        return Ok(ByteOrder::Big);
    }
    Err(ResultsError::malformed(format!(
        "unsupported matrix type field {le}"
    )))
}

/// Returns (precision, matrix kind) from the MOPT type field.
fn split_type(type_code: i32) -> ResultsResult<(Precision, i32)> {
    let o = (type_code / 100) % 10;
    if o != 0 {
        return Err(ResultsError::malformed(format!(
            "type field {type_code} has non-zero O digit"
        )));
    }
    let p = (type_code / 10) % 10;
    let t = type_code % 10;
    Ok((Precision::from_digit(p)?, t))
}

fn read_i32(b: &[u8], order: ByteOrder) -> i32 {
    let arr = [b[0], b[1], b[2], b[3]];
    match order {
        ByteOrder::Little => i32::from_le_bytes(arr),
        ByteOrder::Big => i32::from_be_bytes(arr),
    }
}

fn decode(b: &[u8], precision: Precision, order: ByteOrder) -> f64 {
    macro_rules! num {
        ($t:ty, $n:expr) => {{
            let mut arr = [0u8; $n];
            arr.copy_from_slice(b);
            match order {
                ByteOrder::Little => <$t>::from_le_bytes(arr) as f64,
                ByteOrder::Big => <$t>::from_be_bytes(arr) as f64,
            }
        }};
    }
    match precision {
        Precision::F64 => num!(f64, 8),
        Precision::F32 => num!(f32, 4),
        Precision::I32 => num!(i32, 4),
        Precision::I16 => num!(i16, 2),
        Precision::U16 => num!(u16, 2),
        Precision::U8 => b[0] as f64,
    }
}
