// ==========================================
// 晚宴分桌系统 - 分配结果领域模型
// ==========================================
// 职责: 引擎唯一输出物（座位表 + 客人落座标记 + 未落座清单）
// ==========================================

use crate::domain::attendee::GuestRecord;
use crate::domain::house::{GridRow, House};
use serde::{Deserialize, Serialize};

// ==========================================
// UnseatedMember - 未落座成员
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnseatedMember {
    pub code: String,
    pub party_size: u32,
    /// 可选房屋（仅在 unseated_options 开启时填充）
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<HouseOption>,
}

/// 未落座成员的候选房屋：座位足够，列出阻碍落座的成员
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HouseOption {
    pub house_id: u32,
    pub free_seats: u32,
    pub blockers: Vec<String>,
}

// ==========================================
// RelaxedPlacement - 放宽阈值后的落座记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelaxedPlacement {
    pub code: String,
    pub house_id: u32,
    pub threshold_months: i64,
}

// ==========================================
// PhaseReport - 各阶段未落座数量
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseReport {
    pub total_guests: usize,
    pub attempts_run: usize,
    pub after_initial: usize,
    pub seated_by_direct_insertion: usize,
    pub seated_by_simple_swap: usize,
    pub seated_by_two_way_swap: usize,
    pub seated_by_chain_swap: usize,
    pub seated_by_consolidation: usize,
    pub after_local_search: usize,
    pub seated_by_relaxation: usize,
    pub after_relaxation: usize,
}

impl PhaseReport {
    pub fn seated_by_local_search(&self) -> usize {
        self.seated_by_direct_insertion
            + self.seated_by_simple_swap
            + self.seated_by_two_way_swap
            + self.seated_by_chain_swap
            + self.seated_by_consolidation
    }
}

// ==========================================
// SeatingOutcome - 一次运行的完整输出
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatingOutcome {
    pub run_id: String,
    pub houses: Vec<House>,
    pub guests: Vec<GuestRecord>,
    pub residual: Vec<UnseatedMember>,
    pub relaxed_placements: Vec<RelaxedPlacement>,
    pub report: PhaseReport,
}

impl SeatingOutcome {
    pub fn is_complete(&self) -> bool {
        self.residual.is_empty()
    }

    /// 写回表格用的座位行
    pub fn grid_rows(&self) -> Vec<GridRow> {
        self.houses.iter().map(GridRow::from).collect()
    }

    pub fn house_of(&self, code: &str) -> Option<&House> {
        self.houses.iter().find(|h| h.contains(code))
    }
}
