// ==========================================
// 晚宴分桌系统 - 首轮落座
// ==========================================
// 职责: 将未落座客人放入房屋（容量、成员上限、全员相容）
// 策略: Scored（逐客评分，默认） / GreedyRestart（随机重启贪心装箱）
// 红线: 首轮落座不放宽任何约束
// ==========================================

mod greedy;
mod scored;

#[cfg(test)]
mod tests;

pub use greedy::GreedyRestartPlacer;
pub use scored::ScoredPlacer;

use crate::config::control::ControlVariables;
use crate::domain::attendee::Attendee;
use crate::domain::types::PlacementPolicy;
use crate::engine::context::SeatingContext;
use std::cmp::Ordering;
use tracing::info;

/// 首轮落座结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementSummary {
    pub attempts_run: usize,
    pub unseated: usize,
}

// ==========================================
// InitialPlacement - 首轮落座调度
// ==========================================
pub struct InitialPlacement {
    // 无状态引擎,不需要注入依赖
}

impl InitialPlacement {
    pub fn new() -> Self {
        Self {}
    }

    /// 按控制参数选择策略执行首轮落座
    pub fn run(&self, ctx: &mut SeatingContext, control: &ControlVariables) -> PlacementSummary {
        let summary = match control.placement_policy {
            PlacementPolicy::Scored => ScoredPlacer::from_control(control).place(ctx),
            PlacementPolicy::GreedyRestart => GreedyRestartPlacer::from_control(control).place(ctx),
        };

        info!(
            policy = %control.placement_policy,
            attempts = summary.attempts_run,
            unseated = summary.unseated,
            "首轮落座完成"
        );
        summary
    }
}

impl Default for InitialPlacement {
    fn default() -> Self {
        Self::new()
    }
}

/// 未落座客人的处理顺序
///
/// 排序键（sort=true 时）:
/// 1) 历史同桌次数降序
/// 2) order 升序（缺失者在后）
/// 3) 成员列表原顺序
pub(crate) fn ordered_guests(ctx: &SeatingContext, sort: bool) -> Vec<String> {
    let mut guests: Vec<(usize, &Attendee)> = ctx
        .guests()
        .filter(|g| !g.seated)
        .enumerate()
        .collect();

    if sort {
        guests.sort_by(|(ia, a), (ib, b)| {
            b.prior_connections
                .cmp(&a.prior_connections)
                .then_with(|| compare_order(a.order, b.order))
                .then_with(|| ia.cmp(ib))
        });
    }

    guests.into_iter().map(|(_, g)| g.code.clone()).collect()
}

/// 房屋的填充顺序（sort=true 时按主人历史同桌次数降序）
pub(crate) fn ordered_houses(ctx: &SeatingContext, sort: bool) -> Vec<usize> {
    let houses: Vec<(usize, Option<&Attendee>)> = ctx
        .active_houses()
        .map(|h| (h, ctx.houses[h].host.as_deref().and_then(|code| ctx.attendee(code))))
        .collect();

    if !sort {
        return houses.into_iter().map(|(h, _)| h).collect();
    }

    let mut houses = houses;
    houses.sort_by(|(_, a), (_, b)| compare_hosts(*a, *b));
    houses.into_iter().map(|(h, _)| h).collect()
}

/// 新建房屋时主人的顺序（sort=true 时历史同桌次数降序，order 升序）
pub(crate) fn ordered_houses_for_hosts(mut hosts: Vec<&Attendee>, sort: bool) -> Vec<&Attendee> {
    if sort {
        hosts.sort_by(|a, b| compare_hosts(Some(*a), Some(*b)));
    }
    hosts
}

fn compare_hosts(a: Option<&Attendee>, b: Option<&Attendee>) -> Ordering {
    let prior_a = a.map(|h| h.prior_connections).unwrap_or(0);
    let prior_b = b.map(|h| h.prior_connections).unwrap_or(0);
    prior_b
        .cmp(&prior_a)
        .then_with(|| compare_order(a.and_then(|h| h.order), b.and_then(|h| h.order)))
}

fn compare_order(a: Option<i64>, b: Option<i64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
