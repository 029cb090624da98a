//! 棋盘拓扑
//!
//! 23 节点扇形棋盘的邻接关系与跳吃三元组。进程启动时构建一次，
//! 全局只读共享，对每局对局都相同。

use std::sync::OnceLock;

use crate::constants::NODE_COUNT;
use crate::piece::NodeId;

/// 邻接表（对称：A 邻 B 则 B 邻 A）
const ADJACENCY: [&[NodeId]; NODE_COUNT] = [
    &[2, 3, 4, 5],       // 0 顶点
    &[2, 7],             // 1
    &[0, 1, 3, 8],       // 2
    &[0, 2, 4, 9],       // 3
    &[0, 3, 5, 10],      // 4
    &[0, 4, 6, 11],      // 5
    &[5, 12],            // 6
    &[1, 8, 13],         // 7
    &[2, 7, 9, 14],      // 8
    &[3, 8, 10, 15],     // 9
    &[4, 9, 11, 16],     // 10
    &[5, 10, 12, 17],    // 11
    &[6, 11, 18],        // 12
    &[7, 14],            // 13
    &[8, 13, 15, 19],    // 14
    &[9, 14, 16, 20],    // 15
    &[10, 15, 17, 21],   // 16
    &[11, 16, 18, 22],   // 17
    &[12, 17],           // 18
    &[14, 20],           // 19
    &[15, 19, 21],       // 20
    &[16, 20, 22],       // 21
    &[17, 21],           // 22
];

/// 棋盘直线：4 条横线 + 6 条扇形线，跳吃只能沿这些线进行
const LINES: [&[NodeId]; 10] = [
    &[1, 2, 3, 4, 5, 6],
    &[7, 8, 9, 10, 11, 12],
    &[13, 14, 15, 16, 17, 18],
    &[19, 20, 21, 22],
    &[1, 7, 13],
    &[0, 2, 8, 14, 19],
    &[0, 3, 9, 15, 20],
    &[0, 4, 10, 16, 21],
    &[0, 5, 11, 17, 22],
    &[6, 12, 18],
];

/// 跳吃三元组 (起点, 被跳, 落点)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CaptureTriple {
    pub start: NodeId,
    pub over: NodeId,
    pub landing: NodeId,
}

/// 棋盘拓扑：邻接查询与跳吃三元组查询
pub struct Topology {
    triples: Vec<CaptureTriple>,
    /// 按起点分组的三元组
    by_start: Vec<Vec<CaptureTriple>>,
}

impl Topology {
    /// 获取全局共享拓扑
    pub fn shared() -> &'static Topology {
        static TOPOLOGY: OnceLock<Topology> = OnceLock::new();
        TOPOLOGY.get_or_init(Topology::build)
    }

    /// 沿每条直线正反方向滑动三点窗口生成跳吃三元组，去重
    fn build() -> Self {
        let mut triples = Vec::new();
        for line in LINES {
            for w in line.windows(3) {
                triples.push(CaptureTriple {
                    start: w[0],
                    over: w[1],
                    landing: w[2],
                });
                triples.push(CaptureTriple {
                    start: w[2],
                    over: w[1],
                    landing: w[0],
                });
            }
        }
        triples.sort();
        triples.dedup();

        let mut by_start = vec![Vec::new(); NODE_COUNT];
        for t in &triples {
            by_start[t.start as usize].push(*t);
        }

        Self { triples, by_start }
    }

    /// 节点编号是否在棋盘内
    pub fn contains(node: NodeId) -> bool {
        (node as usize) < NODE_COUNT
    }

    /// 节点的相邻节点
    pub fn neighbors(&self, node: NodeId) -> &'static [NodeId] {
        ADJACENCY[node as usize]
    }

    /// 两节点是否直接相邻
    pub fn is_adjacent(&self, a: NodeId, b: NodeId) -> bool {
        ADJACENCY[a as usize].contains(&b)
    }

    /// 以指定节点为起点的所有跳吃三元组
    pub fn jumps_from(&self, node: NodeId) -> &[CaptureTriple] {
        &self.by_start[node as usize]
    }

    /// 全部跳吃三元组
    pub fn triples(&self) -> &[CaptureTriple] {
        &self.triples
    }
}
