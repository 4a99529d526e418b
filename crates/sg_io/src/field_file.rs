// crates/sg_io/src/field_file.rs

//! 顶点场文件读写
//!
//! - `.sgb`: 字段 `values` (f32, 形状 `[n_vertices, n_frames]`，顶点主序)
//! - `.csv`: 每行一个顶点，每列一帧；可选表头，支持 `#` 注释行
//!
//! # 使用示例
//!
//! ```ignore
//! use sg_io::{read_field, write_field};
//!
//! let field = read_field("curvature.csv")?;
//! write_field("curvature.sgb", &field)?;
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;

use sg_gradient::VertexField;
use tracing::{debug, info, warn};

use crate::error::{IoError, IoResult};
use crate::sgb::{SgbReader, SgbWriter};

const FIELD_FORMATS: &str = "sgb, csv";

/// SGB 中顶点场的字段名
pub const VALUES_FIELD: &str = "values";

/// 顶点场文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldFormat {
    /// SGB 二进制
    Sgb,
    /// 逗号分隔文本
    Csv,
}

impl FieldFormat {
    /// 由扩展名识别
    pub fn from_path(path: &Path) -> IoResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("sgb") => Ok(Self::Sgb),
            Some("csv") => Ok(Self::Csv),
            _ => Err(IoError::UnsupportedFormat {
                path: path.to_path_buf(),
                supported: FIELD_FORMATS,
            }),
        }
    }
}

// ============================================================
// CSV 配置
// ============================================================

/// CSV 读写配置
#[derive(Debug, Clone)]
pub struct CsvFieldConfig {
    /// 分隔符
    pub delimiter: char,
    /// 注释行前缀（以此开头的行将被跳过）
    pub comment_prefix: Option<char>,
    /// 写入时是否输出表头
    pub write_header: bool,
}

impl Default for CsvFieldConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            comment_prefix: Some('#'),
            write_header: true,
        }
    }
}

impl CsvFieldConfig {
    /// 制表符分隔的配置
    pub fn tab_separated() -> Self {
        Self {
            delimiter: '\t',
            ..Default::default()
        }
    }

    /// 不写表头
    pub fn without_header(mut self) -> Self {
        self.write_header = false;
        self
    }
}

// ============================================================
// 分派
// ============================================================

/// 读取顶点场
pub fn read_field(path: impl AsRef<Path>) -> IoResult<VertexField> {
    let path = path.as_ref();
    let field = match FieldFormat::from_path(path)? {
        FieldFormat::Sgb => {
            let file = File::open(path).map_err(|e| IoError::io(path, e))?;
            read_field_sgb(BufReader::new(file))?
        }
        FieldFormat::Csv => {
            let content = std::fs::read_to_string(path).map_err(|e| IoError::io(path, e))?;
            parse_field_csv(&content, &CsvFieldConfig::default(), &path.display().to_string())?
        }
    };
    info!(
        "读取顶点场 {}: {} 顶点 × {} 帧",
        path.display(),
        field.n_vertices(),
        field.n_frames()
    );
    Ok(field)
}

/// 写入顶点场
pub fn write_field(path: impl AsRef<Path>, field: &VertexField) -> IoResult<()> {
    let path = path.as_ref();
    let format = FieldFormat::from_path(path)?;
    let file = File::create(path).map_err(|e| IoError::io(path, e))?;
    match format {
        FieldFormat::Sgb => {
            write_field_sgb(BufWriter::new(file), field)?;
        }
        FieldFormat::Csv => {
            let mut writer = BufWriter::new(file);
            write_field_csv(&mut writer, field, &CsvFieldConfig::default())?;
            writer.flush()?;
        }
    }
    debug!("写入顶点场 {}", path.display());
    Ok(())
}

// ============================================================
// SGB
// ============================================================

/// 从 SGB 数据流读取顶点场
pub fn read_field_sgb<R: Read + Seek>(reader: R) -> IoResult<VertexField> {
    let mut sgb = SgbReader::open(reader)?;
    let (values, shape) = sgb.read_field::<f32>(VALUES_FIELD)?;
    let (n_vertices, n_frames) = match shape.as_slice() {
        &[n] => (n, 1),
        &[n, f] => (n, f),
        other => {
            return Err(IoError::ShapeMismatch {
                field: VALUES_FIELD.to_string(),
                reason: format!("期望 [n_vertices] 或 [n_vertices, n_frames], 实际 {other:?}"),
            })
        }
    };
    Ok(VertexField::from_vertex_major(n_vertices, n_frames, values)?)
}

/// 把顶点场写入 SGB 数据流
pub fn write_field_sgb<W: Write + Seek>(writer: W, field: &VertexField) -> IoResult<W> {
    let mut sgb = SgbWriter::new(writer)?;
    sgb.write_field(VALUES_FIELD, field.values(), &[field.n_vertices(), field.n_frames()])?;
    sgb.finish()
}

// ============================================================
// CSV
// ============================================================

/// 解析 CSV 顶点场
///
/// 第一条非注释行若不能全部解析为数值则视为表头。所有数据行的列数必须一致。
/// `source` 仅用于错误信息。
pub fn parse_field_csv(content: &str, config: &CsvFieldConfig, source: &str) -> IoResult<VertexField> {
    let mut values = Vec::new();
    let mut n_frames = 0usize;
    let mut n_vertices = 0usize;
    let mut seen_first = false;

    for (line_num, line) in content.lines().enumerate() {
        let line_no = line_num + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(prefix) = config.comment_prefix {
            if trimmed.starts_with(prefix) {
                continue;
            }
        }

        let parsed: Result<Vec<f32>, _> = trimmed
            .split(config.delimiter)
            .map(|cell| cell.trim().parse::<f32>())
            .collect();

        let row = match parsed {
            Ok(row) => row,
            Err(_) if !seen_first => {
                seen_first = true;
                debug!("{} 第 {} 行作为表头: {}", source, line_no, trimmed);
                continue;
            }
            Err(e) => {
                return Err(IoError::parse(source, line_no, format!("无效数值: {e}")));
            }
        };
        seen_first = true;

        if n_vertices == 0 {
            n_frames = row.len();
        } else if row.len() != n_frames {
            return Err(IoError::parse(
                source,
                line_no,
                format!("列数不一致: 期望 {n_frames}, 实际 {}", row.len()),
            ));
        }
        values.extend(row);
        n_vertices += 1;
    }

    if n_vertices == 0 {
        return Err(IoError::parse(source, 0, "没有数据行"));
    }
    let n_nonfinite = values.iter().filter(|x| !x.is_finite()).count();
    if n_nonfinite > 0 {
        warn!("{}: {} 个非有限值", source, n_nonfinite);
    }
    Ok(VertexField::from_vertex_major(n_vertices, n_frames, values)?)
}

/// 输出 CSV 顶点场
pub fn write_field_csv<W: Write>(writer: &mut W, field: &VertexField, config: &CsvFieldConfig) -> IoResult<()> {
    let delim = config.delimiter.to_string();
    if config.write_header {
        let header: Vec<String> = (0..field.n_frames()).map(|f| format!("frame_{f}")).collect();
        writeln!(writer, "{}", header.join(&delim))?;
    }
    for v in 0..field.n_vertices() {
        let row: Vec<String> = field.vertex_values(v).iter().map(|x| x.to_string()).collect();
        writeln!(writer, "{}", row.join(&delim))?;
    }
    Ok(())
}
