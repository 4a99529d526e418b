// crates/sg_mesh/src/neighborhood.rs

//! 环邻域展开
//!
//! 从 1-环邻接出发做广度优先搜索，把 `nsize` 跳以内的未排除顶点作为邻居。
//! 邻居按环排列，同一环内按索引升序，因此结果与线程调度无关。

use rayon::prelude::*;
use tracing::debug;

use crate::error::{MeshError, MeshResult};
use crate::surface::Surface;

impl Surface {
    /// 按边跳数重新计算所有顶点的邻居列表
    ///
    /// 被排除的顶点既不作为邻居，也不参与向外展开；其自身邻居列表被清空。
    pub fn reset_neighborhood_size(&mut self, nsize: usize) -> MeshResult<()> {
        if nsize == 0 {
            return Err(MeshError::InvalidNeighborhoodSize { size: nsize });
        }

        let n = self.n_vertices();
        let ripped: Vec<bool> = self.vertices.iter().map(|v| v.ripped).collect();
        let adjacency = &self.adjacency;

        // 每块顶点共享一个标记数组：mark[u] == v 表示 u 已在顶点 v 的搜索中访问过，
        // 块内无需逐顶点清零
        let block = block_len(n, rayon::current_num_threads());
        let mut lists: Vec<Vec<usize>> = vec![Vec::new(); n];
        lists
            .par_chunks_mut(block)
            .enumerate()
            .for_each(|(b, out)| {
                let mut mark = vec![usize::MAX; n];
                let first = b * block;
                for (i, list) in out.iter_mut().enumerate() {
                    let v = first + i;
                    if !ripped[v] {
                        *list = ring_neighbors(adjacency, &ripped, v, nsize, &mut mark);
                    }
                }
            });

        for (vertex, list) in self.vertices.iter_mut().zip(lists) {
            vertex.neighbors = list;
        }
        self.neighborhood_size = nsize;

        debug!(
            "邻域环数设为 {}: 平均邻居数 {:.1}",
            nsize,
            self.statistics().mean_degree
        );
        Ok(())
    }
}

/// 并行块长度：约每线程 4 块，标记数组的分配次数与顶点数无关
fn block_len(n: usize, threads: usize) -> usize {
    n.div_ceil(threads.max(1) * 4).max(1)
}

/// 单个顶点的 `nsize` 环邻居
fn ring_neighbors(
    adjacency: &[Vec<usize>],
    ripped: &[bool],
    center: usize,
    nsize: usize,
    mark: &mut [usize],
) -> Vec<usize> {
    let mut result = Vec::new();
    let mut frontier = vec![center];
    mark[center] = center;

    for _ in 0..nsize {
        let mut next = Vec::new();
        for &u in &frontier {
            for &w in &adjacency[u] {
                if mark[w] == center || ripped[w] {
                    continue;
                }
                mark[w] = center;
                next.push(w);
            }
        }
        if next.is_empty() {
            break;
        }
        next.sort_unstable();
        result.extend_from_slice(&next);
        frontier = next;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;

    /// 一条 0-1-2-3-4 的三角带
    fn strip() -> Surface {
        let positions = (0..6)
            .map(|i| DVec3::new((i / 2) as f64, (i % 2) as f64, 0.0))
            .collect();
        // 顶点 0,2,4 在 y=0；1,3,5 在 y=1
        let triangles = vec![[0, 2, 1], [1, 2, 3], [2, 4, 3], [3, 4, 5]];
        Surface::from_triangles(positions, triangles).unwrap()
    }

    #[test]
    fn test_one_ring_matches_adjacency() {
        let mut s = strip();
        s.reset_neighborhood_size(1).unwrap();
        for v in 0..s.n_vertices() {
            assert_eq!(s.vertex(v).neighbors, s.adjacency(v));
        }
    }

    #[test]
    fn test_rings_ordered_by_distance() {
        let mut s = strip();
        s.reset_neighborhood_size(2).unwrap();
        // 0 的 1-环: {1, 2}; 2-环: {3, 4}
        assert_eq!(s.vertex(0).neighbors, vec![1, 2, 3, 4]);
        s.reset_neighborhood_size(3).unwrap();
        assert_eq!(s.vertex(0).neighbors, vec![1, 2, 3, 4, 5]);
        assert_eq!(s.neighborhood_size(), 3);
    }

    #[test]
    fn test_ripped_vertices_excluded() {
        let mut s = strip();
        s.rip_vertex(2).unwrap();
        s.reset_neighborhood_size(2).unwrap();
        assert!(s.vertex(2).neighbors.is_empty());
        // 绕过 2 只能经由 1 到达 3
        assert_eq!(s.vertex(0).neighbors, vec![1, 3]);
        assert!(s.vertices().iter().all(|v| !v.neighbors.contains(&2)));
    }

    #[test]
    fn test_isolated_vertex_has_no_neighbors() {
        let positions = vec![DVec3::ZERO, DVec3::X, DVec3::Y, DVec3::new(5.0, 5.0, 0.0)];
        let mut s = Surface::from_triangles(positions, vec![[0, 1, 2]]).unwrap();
        s.reset_neighborhood_size(3).unwrap();
        assert!(s.vertex(3).neighbors.is_empty());
    }

    #[test]
    fn test_block_len_bounds_allocations() {
        assert_eq!(block_len(0, 8), 1);
        assert_eq!(block_len(10, 8), 1);
        assert_eq!(block_len(1000, 4), 63);
        assert_eq!(block_len(1000, 0), 250);
        // 块数不超过 4 × 线程数
        for n in [1usize, 17, 4096, 163_842] {
            for threads in [1, 3, 16] {
                assert!(n.div_ceil(block_len(n, threads)) <= threads * 4);
            }
        }
    }

    #[test]
    fn test_shared_mark_matches_fresh_search() {
        // 20×20 网格，顶点数远大于块数，块内标记数组被反复复用
        let m = 20;
        let positions = (0..m * m)
            .map(|i| DVec3::new((i % m) as f64, (i / m) as f64, 0.0))
            .collect();
        let mut triangles = Vec::new();
        for j in 0..m - 1 {
            for i in 0..m - 1 {
                let a = j * m + i;
                triangles.push([a, a + 1, a + m + 1]);
                triangles.push([a, a + m + 1, a + m]);
            }
        }
        let mut s = Surface::from_triangles(positions, triangles).unwrap();
        s.rip_vertex(42).unwrap();
        s.reset_neighborhood_size(3).unwrap();

        let ripped: Vec<bool> = s.vertices().iter().map(|v| v.ripped).collect();
        for v in 0..s.n_vertices() {
            let expected = if ripped[v] {
                Vec::new()
            } else {
                let mut fresh = vec![usize::MAX; s.n_vertices()];
                ring_neighbors(&s.adjacency, &ripped, v, 3, &mut fresh)
            };
            assert_eq!(s.vertex(v).neighbors, expected, "vertex {v}");
        }
    }

    #[test]
    fn test_zero_size_rejected() {
        let mut s = strip();
        assert!(matches!(
            s.reset_neighborhood_size(0),
            Err(MeshError::InvalidNeighborhoodSize { size: 0 })
        ));
    }
}
