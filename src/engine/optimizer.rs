// ==========================================
// 晚宴分桌系统 - 局部搜索修复
// ==========================================
// 职责: 移动已落座客人，为未落座客人腾出有效位置
// 顺序: 直接补位 -> 简单置换 -> 双屋互换 -> 链式置换 -> 容量合并
// 红线: 每次移动都按受影响房屋的完整成员列表重新校验相容性
// 红线: 未落座数为 0 时立即停止
// ==========================================

mod chain;
mod consolidation;
mod direct_insert;
mod simple_swap;
mod two_way;


pub use chain::ChainSwap;
pub use consolidation::CapacityConsolidation;
pub use direct_insert::DirectInsertion;
pub use simple_swap::SimpleSwap;
pub use two_way::TwoWaySwap;

use crate::engine::context::SeatingContext;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// 各策略落座人数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizerReport {
    pub direct_insertion: usize,
    pub simple_swap: usize,
    pub two_way_swap: usize,
    pub chain_swap: usize,
    pub consolidation: usize,
}

impl OptimizerReport {
    pub fn total(&self) -> usize {
        self.direct_insertion
            + self.simple_swap
            + self.two_way_swap
            + self.chain_swap
            + self.consolidation
    }
}

// ==========================================
// LocalSearchOptimizer - 局部搜索修复器
// ==========================================
pub struct LocalSearchOptimizer {
    // 无状态引擎,不需要注入依赖
}

impl LocalSearchOptimizer {
    pub fn new() -> Self {
        Self {}
    }

    /// 依次执行五种策略，每种策略作用于上一种的结果
    #[instrument(skip_all, fields(unseated = ctx.unseated_count()))]
    pub fn run(&self, ctx: &mut SeatingContext) -> OptimizerReport {
        let mut report = OptimizerReport::default();

        if ctx.unseated_count() == 0 {
            return report;
        }
        report.direct_insertion = DirectInsertion::new().run(ctx);
        info!(seated = report.direct_insertion, unseated = ctx.unseated_count(), "直接补位完成");

        if ctx.unseated_count() == 0 {
            return report;
        }
        report.simple_swap = SimpleSwap::new().run(ctx);
        info!(seated = report.simple_swap, unseated = ctx.unseated_count(), "简单置换完成");

        if ctx.unseated_count() == 0 {
            return report;
        }
        report.two_way_swap = TwoWaySwap::new().run(ctx);
        info!(seated = report.two_way_swap, unseated = ctx.unseated_count(), "双屋互换完成");

        if ctx.unseated_count() == 0 {
            return report;
        }
        report.chain_swap = ChainSwap::new().run(ctx);
        info!(seated = report.chain_swap, unseated = ctx.unseated_count(), "链式置换完成");

        if ctx.unseated_count() == 0 {
            return report;
        }
        report.consolidation = CapacityConsolidation::new().run(ctx);
        info!(seated = report.consolidation, unseated = ctx.unseated_count(), "容量合并完成");

        report
    }
}

impl Default for LocalSearchOptimizer {
    fn default() -> Self {
        Self::new()
    }
}
