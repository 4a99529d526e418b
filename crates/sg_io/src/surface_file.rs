// crates/sg_io/src/surface_file.rs

//! 表面文件读写
//!
//! 按扩展名分派：
//! - `.sgb`: 字段 `positions` (f64, `[n, 3]`)、`triangles` (u32, `[m, 3]`)、
//!   可选 `ripped` (u8, `[n]`)
//! - `.obj`: Wavefront OBJ，只读取 `v` 和 `f` 记录；多边形按扇形三角化，
//!   支持 1 起始索引和负索引
//!
//! 只有三角形拓扑被保存，邻居列表和切平面标架在读取时重新计算。

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use glam::DVec3;
use sg_mesh::Surface;
use tracing::{debug, info};

use crate::error::{IoError, IoResult};
use crate::sgb::{SgbReader, SgbWriter};

const SURFACE_FORMATS: &str = "sgb, obj";

/// 表面文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceFormat {
    /// SGB 二进制
    Sgb,
    /// Wavefront OBJ
    Obj,
}

impl SurfaceFormat {
    /// 由扩展名识别
    pub fn from_path(path: &Path) -> IoResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("sgb") => Ok(Self::Sgb),
            Some("obj") => Ok(Self::Obj),
            _ => Err(IoError::UnsupportedFormat {
                path: path.to_path_buf(),
                supported: SURFACE_FORMATS,
            }),
        }
    }
}

/// 读取表面
pub fn read_surface(path: impl AsRef<Path>) -> IoResult<Surface> {
    let path = path.as_ref();
    let format = SurfaceFormat::from_path(path)?;
    let surface = match format {
        SurfaceFormat::Sgb => {
            let file = File::open(path).map_err(|e| IoError::io(path, e))?;
            read_surface_sgb(BufReader::new(file))?
        }
        SurfaceFormat::Obj => {
            let content = std::fs::read_to_string(path).map_err(|e| IoError::io(path, e))?;
            parse_obj(&content, &path.display().to_string())?
        }
    };
    info!(
        "读取表面 {}: {} 顶点, {} 三角形",
        path.display(),
        surface.n_vertices(),
        surface.n_triangles()
    );
    Ok(surface)
}

/// 写入表面
pub fn write_surface(path: impl AsRef<Path>, surface: &Surface) -> IoResult<()> {
    let path = path.as_ref();
    let format = SurfaceFormat::from_path(path)?;
    let file = File::create(path).map_err(|e| IoError::io(path, e))?;
    match format {
        SurfaceFormat::Sgb => {
            write_surface_sgb(BufWriter::new(file), surface)?;
        }
        SurfaceFormat::Obj => {
            let mut writer = BufWriter::new(file);
            write_obj(&mut writer, surface)?;
            writer.flush()?;
        }
    }
    debug!("写入表面 {}", path.display());
    Ok(())
}

// ============================================================
// SGB
// ============================================================

/// 从 SGB 数据流读取表面
pub fn read_surface_sgb<R: std::io::Read + std::io::Seek>(reader: R) -> IoResult<Surface> {
    let mut sgb = SgbReader::open(reader)?;
    let (coords, shape) = sgb.read_field_shaped::<f64>("positions", &[None, Some(3)])?;
    let n = shape[0];
    let positions = coords
        .chunks_exact(3)
        .map(|c| DVec3::new(c[0], c[1], c[2]))
        .collect();

    let triangles = if sgb.has_field("triangles") {
        let (indices, _) = sgb.read_field_shaped::<u32>("triangles", &[None, Some(3)])?;
        indices
            .chunks_exact(3)
            .map(|t| [t[0] as usize, t[1] as usize, t[2] as usize])
            .collect()
    } else {
        Vec::new()
    };

    let ripped = if sgb.has_field("ripped") {
        sgb.read_field_shaped::<u8>("ripped", &[Some(n)])?.0
    } else {
        Vec::new()
    };

    let mut surface = Surface::from_triangles(positions, triangles)?;
    for (v, _) in ripped.iter().enumerate().filter(|&(_, &r)| r != 0) {
        surface.rip_vertex(v)?;
    }
    if surface.n_ripped() > 0 {
        // 排除顶点在首次展开邻域时剔除
        surface.reset_neighborhood_size(surface.neighborhood_size())?;
    }
    Ok(surface)
}

/// 把表面写入 SGB 数据流
pub fn write_surface_sgb<W: std::io::Write + std::io::Seek>(writer: W, surface: &Surface) -> IoResult<W> {
    let mut sgb = SgbWriter::new(writer)?;

    let positions: Vec<f64> = surface
        .vertices()
        .iter()
        .flat_map(|v| v.position.to_array())
        .collect();
    sgb.write_field("positions", &positions, &[surface.n_vertices(), 3])?;

    let mut triangles = Vec::with_capacity(surface.n_triangles() * 3);
    for tri in surface.triangles() {
        for &i in tri {
            let i = u32::try_from(i).map_err(|_| IoError::ShapeMismatch {
                field: "triangles".to_string(),
                reason: format!("顶点索引 {i} 超出 u32 范围"),
            })?;
            triangles.push(i);
        }
    }
    sgb.write_field("triangles", &triangles, &[surface.n_triangles(), 3])?;

    if surface.n_ripped() > 0 {
        let ripped: Vec<u8> = surface.vertices().iter().map(|v| u8::from(v.ripped)).collect();
        sgb.write_field("ripped", &ripped, &[surface.n_vertices()])?;
    }

    sgb.finish()
}

// ============================================================
// OBJ
// ============================================================

/// 解析 OBJ 文本
///
/// `source` 仅用于错误信息。
pub fn parse_obj(content: &str, source: &str) -> IoResult<Surface> {
    let mut positions = Vec::new();
    let mut triangles = Vec::new();

    for (line_num, line) in content.lines().enumerate() {
        let line_no = line_num + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut tokens = trimmed.split_whitespace();
        match tokens.next() {
            Some("v") => {
                let mut xyz = [0.0f64; 3];
                for (k, slot) in xyz.iter_mut().enumerate() {
                    let token = tokens.next().ok_or_else(|| {
                        IoError::parse(source, line_no, format!("顶点缺少第 {} 个坐标", k + 1))
                    })?;
                    *slot = token.parse().map_err(|_| {
                        IoError::parse(source, line_no, format!("无效坐标 '{token}'"))
                    })?;
                }
                positions.push(DVec3::from_array(xyz));
            }
            Some("f") => {
                let face = tokens
                    .map(|t| obj_index(t, positions.len()))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|msg| IoError::parse(source, line_no, msg))?;
                if face.len() < 3 {
                    return Err(IoError::parse(source, line_no, "面至少需要 3 个顶点"));
                }
                for i in 1..face.len() - 1 {
                    triangles.push([face[0], face[i], face[i + 1]]);
                }
            }
            // 法向、纹理坐标、分组等记录不影响拓扑
            _ => {}
        }
    }

    if positions.is_empty() {
        return Err(IoError::parse(source, 0, "文件中没有顶点"));
    }
    Ok(Surface::from_triangles(positions, triangles)?)
}

/// 解析面记录中的单个顶点引用 `i`、`i/t`、`i//n` 或 `i/t/n`
fn obj_index(token: &str, n_positions: usize) -> Result<usize, String> {
    let head = token.split('/').next().unwrap_or(token);
    let raw: i64 = head
        .parse()
        .map_err(|_| format!("无效顶点索引 '{token}'"))?;
    let resolved = match raw {
        0 => None,
        r if r > 0 => Some(r - 1),
        r => Some(n_positions as i64 + r),
    };
    match resolved {
        Some(i) if i >= 0 && (i as usize) < n_positions => Ok(i as usize),
        _ => Err(format!("顶点索引 {raw} 超出范围 (当前 {n_positions} 个顶点)")),
    }
}

/// 输出 OBJ 文本（1 起始索引）
pub fn write_obj<W: Write>(writer: &mut W, surface: &Surface) -> IoResult<()> {
    writeln!(writer, "# {} vertices, {} triangles", surface.n_vertices(), surface.n_triangles())?;
    for v in surface.vertices() {
        let p = v.position;
        writeln!(writer, "v {} {} {}", p.x, p.y, p.z)?;
    }
    for &[a, b, c] in surface.triangles() {
        writeln!(writer, "f {} {} {}", a + 1, b + 1, c + 1)?;
    }
    Ok(())
}
