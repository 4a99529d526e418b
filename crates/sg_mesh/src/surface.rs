// crates/sg_mesh/src/surface.rs

//! 表面网格数据结构
//!
//! 顶点按 AoS 存储，每个顶点携带自身的切平面标架和环邻居列表。
//! 梯度估计器只读访问；邻域展开和标架计算是唯一的写入路径。

use glam::DVec3;
use tracing::debug;

use crate::error::{MeshError, MeshResult};

// ============================================================
// 顶点
// ============================================================

/// 表面顶点
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceVertex {
    /// 三维位置
    pub position: DVec3,
    /// 单位法向
    pub normal: DVec3,
    /// 切平面第一基向量
    pub e1: DVec3,
    /// 切平面第二基向量
    pub e2: DVec3,
    /// 第一主曲率 (k1 >= k2)
    pub k1: f64,
    /// 第二主曲率
    pub k2: f64,
    /// 是否被排除（ripped）
    pub ripped: bool,
    /// 当前邻域内的邻居顶点
    pub neighbors: Vec<usize>,
}

impl SurfaceVertex {
    /// 在给定位置创建顶点，标架默认为 xy 平面
    pub fn new(position: DVec3) -> Self {
        Self {
            position,
            normal: DVec3::Z,
            e1: DVec3::X,
            e2: DVec3::Y,
            k1: 0.0,
            k2: 0.0,
            ripped: false,
            neighbors: Vec::new(),
        }
    }

    /// 设置切平面基，法向取 `e1 × e2`
    pub fn with_frame(mut self, e1: DVec3, e2: DVec3) -> Self {
        self.e1 = e1;
        self.e2 = e2;
        self.normal = e1.cross(e2).normalize_or_zero();
        self
    }

    /// 设置邻居列表
    pub fn with_neighbors(mut self, neighbors: Vec<usize>) -> Self {
        self.neighbors = neighbors;
        self
    }

    /// 标记为排除
    pub fn with_ripped(mut self, ripped: bool) -> Self {
        self.ripped = ripped;
        self
    }

    /// 邻居数量
    #[inline]
    pub fn degree(&self) -> usize {
        self.neighbors.len()
    }
}

// ============================================================
// 表面
// ============================================================

/// 三角表面
#[derive(Debug, Clone)]
pub struct Surface {
    pub(crate) vertices: Vec<SurfaceVertex>,
    pub(crate) triangles: Vec<[usize; 3]>,
    /// 1-环邻接（对称、升序）
    pub(crate) adjacency: Vec<Vec<usize>>,
    pub(crate) neighborhood_size: usize,
}

impl Surface {
    /// 从顶点位置和三角形构建表面
    ///
    /// 邻居初始化为 1-环，并计算顶点标架。
    pub fn from_triangles(positions: Vec<DVec3>, triangles: Vec<[usize; 3]>) -> MeshResult<Self> {
        let n = positions.len();
        if n == 0 {
            return Err(MeshError::Empty);
        }

        for (t, tri) in triangles.iter().enumerate() {
            if let Some(&bad) = tri.iter().find(|&&i| i >= n) {
                return Err(MeshError::InvalidTriangle {
                    triangle: t,
                    reason: format!("顶点索引 {bad} 超出范围 0..{n}"),
                });
            }
            if tri[0] == tri[1] || tri[1] == tri[2] || tri[0] == tri[2] {
                return Err(MeshError::InvalidTriangle {
                    triangle: t,
                    reason: format!("重复顶点 {:?}", tri),
                });
            }
        }

        let mut adjacency = vec![Vec::new(); n];
        for tri in &triangles {
            for k in 0..3 {
                let a = tri[k];
                let b = tri[(k + 1) % 3];
                adjacency[a].push(b);
                adjacency[b].push(a);
            }
        }
        for list in &mut adjacency {
            list.sort_unstable();
            list.dedup();
        }

        let vertices = positions
            .into_iter()
            .zip(adjacency.iter())
            .map(|(p, adj)| SurfaceVertex::new(p).with_neighbors(adj.clone()))
            .collect();

        let mut surface = Self {
            vertices,
            triangles,
            adjacency,
            neighborhood_size: 1,
        };
        surface.compute_tangent_frames();

        debug!(
            "构建表面: {} 顶点, {} 三角形",
            surface.n_vertices(),
            surface.n_triangles()
        );
        Ok(surface)
    }

    /// 从预先计算好的顶点（标架 + 邻居）构建表面
    ///
    /// 用于切平面标架由外部提供的场景。邻居列表同时作为展开邻域时的邻接关系
    /// （补全为对称）。
    pub fn from_vertices(vertices: Vec<SurfaceVertex>) -> MeshResult<Self> {
        let n = vertices.len();
        if n == 0 {
            return Err(MeshError::Empty);
        }

        for (v, vertex) in vertices.iter().enumerate() {
            for &nb in &vertex.neighbors {
                if nb >= n {
                    return Err(MeshError::NeighborOutOfRange {
                        vertex: v,
                        neighbor: nb,
                        len: n,
                    });
                }
                if nb == v {
                    return Err(MeshError::SelfNeighbor { vertex: v });
                }
            }
        }

        let mut adjacency = vec![Vec::new(); n];
        for (v, vertex) in vertices.iter().enumerate() {
            for &nb in &vertex.neighbors {
                adjacency[v].push(nb);
                adjacency[nb].push(v);
            }
        }
        for list in &mut adjacency {
            list.sort_unstable();
            list.dedup();
        }

        Ok(Self {
            vertices,
            triangles: Vec::new(),
            adjacency,
            neighborhood_size: 1,
        })
    }

    /// 顶点数
    #[inline]
    pub fn n_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// 三角形数
    #[inline]
    pub fn n_triangles(&self) -> usize {
        self.triangles.len()
    }

    /// 访问顶点
    #[inline]
    pub fn vertex(&self, index: usize) -> &SurfaceVertex {
        &self.vertices[index]
    }

    /// 全部顶点
    #[inline]
    pub fn vertices(&self) -> &[SurfaceVertex] {
        &self.vertices
    }

    /// 全部三角形
    #[inline]
    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    /// 顶点的 1-环邻接
    #[inline]
    pub fn adjacency(&self, index: usize) -> &[usize] {
        &self.adjacency[index]
    }

    /// 当前邻域环数
    #[inline]
    pub fn neighborhood_size(&self) -> usize {
        self.neighborhood_size
    }

    /// 排除顶点
    ///
    /// 邻居列表要在下一次 [`Surface::reset_neighborhood_size`] 后才会剔除该顶点。
    pub fn rip_vertex(&mut self, index: usize) -> MeshResult<()> {
        let len = self.vertices.len();
        let vertex = self
            .vertices
            .get_mut(index)
            .ok_or(MeshError::VertexOutOfRange { index, len })?;
        vertex.ripped = true;
        Ok(())
    }

    /// 被排除的顶点数
    pub fn n_ripped(&self) -> usize {
        self.vertices.iter().filter(|v| v.ripped).count()
    }

    /// 表面统计信息
    pub fn statistics(&self) -> SurfaceStatistics {
        let mut bbox_min = DVec3::splat(f64::INFINITY);
        let mut bbox_max = DVec3::splat(f64::NEG_INFINITY);
        let mut min_degree = usize::MAX;
        let mut max_degree = 0;
        let mut total_degree = 0;
        let mut n_active = 0;

        for v in &self.vertices {
            bbox_min = bbox_min.min(v.position);
            bbox_max = bbox_max.max(v.position);
            if v.ripped {
                continue;
            }
            n_active += 1;
            min_degree = min_degree.min(v.degree());
            max_degree = max_degree.max(v.degree());
            total_degree += v.degree();
        }

        SurfaceStatistics {
            n_vertices: self.n_vertices(),
            n_triangles: self.n_triangles(),
            n_ripped: self.n_vertices() - n_active,
            neighborhood_size: self.neighborhood_size,
            min_degree: if n_active == 0 { 0 } else { min_degree },
            max_degree,
            mean_degree: if n_active == 0 {
                0.0
            } else {
                total_degree as f64 / n_active as f64
            },
            bbox_min,
            bbox_max,
        }
    }
}

/// 表面统计信息
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceStatistics {
    /// 顶点数
    pub n_vertices: usize,
    /// 三角形数
    pub n_triangles: usize,
    /// 被排除顶点数
    pub n_ripped: usize,
    /// 邻域环数
    pub neighborhood_size: usize,
    /// 最小邻居数（不含被排除顶点）
    pub min_degree: usize,
    /// 最大邻居数
    pub max_degree: usize,
    /// 平均邻居数
    pub mean_degree: f64,
    /// 包围盒最小角
    pub bbox_min: DVec3,
    /// 包围盒最大角
    pub bbox_max: DVec3,
}
