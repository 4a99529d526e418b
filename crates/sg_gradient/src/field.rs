// crates/sg_gradient/src/field.rs

//! 按顶点排列的多帧标量场
//!
//! 存储为顶点主序 `values[v * n_frames + f]`，同一顶点的所有帧连续存放，
//! 并行计算时每个工作线程持有互不相交的顶点切片。

use sg_foundation::{SgError, SgResult};

/// 多帧顶点标量场（单精度）
#[derive(Debug, Clone, PartialEq)]
pub struct VertexField {
    n_vertices: usize,
    n_frames: usize,
    values: Vec<f32>,
}

impl VertexField {
    /// 创建全零场
    pub fn new(n_vertices: usize, n_frames: usize) -> SgResult<Self> {
        Self::check_shape(n_vertices, n_frames)?;
        Ok(Self {
            n_vertices,
            n_frames,
            values: vec![0.0; n_vertices * n_frames],
        })
    }

    /// 从顶点主序数据创建
    pub fn from_vertex_major(n_vertices: usize, n_frames: usize, values: Vec<f32>) -> SgResult<Self> {
        Self::check_shape(n_vertices, n_frames)?;
        SgError::check_size("field_values", n_vertices * n_frames, values.len())?;
        Ok(Self {
            n_vertices,
            n_frames,
            values,
        })
    }

    /// 从逐帧数据创建，每帧长度相同
    pub fn from_frames(frames: &[Vec<f32>]) -> SgResult<Self> {
        let n_frames = frames.len();
        let n_vertices = frames.first().map_or(0, Vec::len);
        let mut field = Self::new(n_vertices, n_frames)?;
        for (f, frame) in frames.iter().enumerate() {
            SgError::check_size("frame", n_vertices, frame.len())?;
            for (v, &x) in frame.iter().enumerate() {
                field.set(v, f, x);
            }
        }
        Ok(field)
    }

    fn check_shape(n_vertices: usize, n_frames: usize) -> SgResult<()> {
        if n_vertices == 0 {
            return Err(SgError::invalid_input("顶点场至少需要一个顶点"));
        }
        if n_frames == 0 {
            return Err(SgError::invalid_input("顶点场至少需要一帧"));
        }
        Ok(())
    }

    /// 顶点数
    #[inline]
    pub fn n_vertices(&self) -> usize {
        self.n_vertices
    }

    /// 帧数
    #[inline]
    pub fn n_frames(&self) -> usize {
        self.n_frames
    }

    /// 读取 (顶点, 帧) 的值
    #[inline]
    pub fn get(&self, v: usize, f: usize) -> f32 {
        debug_assert!(f < self.n_frames);
        self.values[v * self.n_frames + f]
    }

    /// 写入 (顶点, 帧) 的值
    #[inline]
    pub fn set(&mut self, v: usize, f: usize, x: f32) {
        debug_assert!(f < self.n_frames);
        self.values[v * self.n_frames + f] = x;
    }

    /// 顶点的全部帧
    #[inline]
    pub fn vertex_values(&self, v: usize) -> &[f32] {
        let start = v * self.n_frames;
        &self.values[start..start + self.n_frames]
    }

    /// 顶点主序原始数据
    #[inline]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// 顶点主序原始数据（可写）
    #[inline]
    pub fn values_mut(&mut self) -> &mut [f32] {
        &mut self.values
    }

    /// 全部置为同一值
    pub fn fill(&mut self, x: f32) {
        self.values.fill(x);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_is_vertex_major() {
        let mut field = VertexField::new(3, 2).unwrap();
        field.set(1, 0, 5.0);
        field.set(1, 1, 6.0);
        assert_eq!(field.values(), &[0.0, 0.0, 5.0, 6.0, 0.0, 0.0]);
        assert_eq!(field.vertex_values(1), &[5.0, 6.0]);
        assert_eq!(field.get(1, 1), 6.0);
    }

    #[test]
    fn test_from_frames() {
        let field = VertexField::from_frames(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(field.n_vertices(), 2);
        assert_eq!(field.n_frames(), 2);
        assert_eq!(field.get(0, 1), 3.0);
        assert_eq!(field.get(1, 0), 2.0);

        assert!(VertexField::from_frames(&[vec![1.0, 2.0], vec![3.0]]).is_err());
        assert!(VertexField::from_frames(&[]).is_err());
    }

    #[test]
    fn test_shape_validation() {
        assert!(VertexField::new(0, 1).is_err());
        assert!(VertexField::new(4, 0).is_err());
        assert!(matches!(
            VertexField::from_vertex_major(2, 2, vec![0.0; 3]),
            Err(SgError::SizeMismatch { expected: 4, actual: 3, .. })
        ));
    }
}
