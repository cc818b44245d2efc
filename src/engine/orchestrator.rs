// ==========================================
// 晚宴分桌系统 - 引擎编排器
// ==========================================
// 用途: 校验输入 -> 构建上下文 -> 首轮落座 -> 局部搜索 -> 约束放宽 -> 输出
// 红线: 引擎内不做任何 I/O；输入不合法时在落座前整体失败
// 红线: 无法全部落座不是错误，以未落座清单返回
// ==========================================

use crate::config::control::ControlVariables;
use crate::domain::assignment::{PhaseReport, SeatingOutcome, UnseatedMember};
use crate::domain::attendee::{Attendee, GuestRecord, HostRecord};
use crate::domain::house::{House, MAX_MEMBERS, MAX_SEAT_CAPACITY};
use crate::domain::pair::NeverMatchSet;
use crate::domain::roster::Roster;
use crate::engine::audit::{AuditReport, GridAuditor};
use crate::engine::compatibility::CompatibilityOracle;
use crate::engine::context::SeatingContext;
use crate::engine::critical::CriticalGuestAnalyzer;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::optimizer::LocalSearchOptimizer;
use crate::engine::pair_history::PairHistoryIndex;
use crate::engine::placement::{ordered_houses_for_hosts, InitialPlacement};
use crate::engine::relaxation::ConstraintRelaxationPass;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// SeatingOrchestrator - 引擎编排器
// ==========================================
pub struct SeatingOrchestrator {
    placement: InitialPlacement,
    optimizer: LocalSearchOptimizer,
}

impl SeatingOrchestrator {
    /// 创建新的编排器实例
    pub fn new() -> Self {
        Self {
            placement: InitialPlacement::new(),
            optimizer: LocalSearchOptimizer::new(),
        }
    }

    /// 执行完整分桌流程
    ///
    /// # 参数
    /// - `roster`: 主人、客人、座位表、永不同桌列表
    /// - `history`: 历史同桌索引（完整台账构建）
    /// - `control`: 控制参数
    ///
    /// # 返回
    /// - Ok(SeatingOutcome): 座位表 + 客人落座标记 + 未落座清单
    /// - Err(EngineError): 输入校验失败（未执行任何落座）
    #[instrument(skip_all, fields(
        hosts = roster.hosts.len(),
        guests = roster.guests.len(),
        threshold = control.time_lapse_months,
        policy = %control.placement_policy
    ))]
    pub fn run(
        &self,
        roster: &Roster,
        history: &PairHistoryIndex,
        control: &ControlVariables,
    ) -> EngineResult<SeatingOutcome> {
        control.validate()?;
        let mut ctx = self.build_context(roster, history, control)?;

        let run_id = Uuid::new_v4().to_string();
        info!(
            run_id = %run_id,
            houses = ctx.active_houses().count(),
            unseated = ctx.unseated_count(),
            history_pairs = ctx.oracle.history().pair_count(),
            "开始执行分桌流程"
        );
        for critical in CriticalGuestAnalyzer::new(control.critical_ceiling).analyze(&ctx) {
            debug!(code = %critical.code, options = critical.options, "关键客人");
        }

        let mut report = PhaseReport {
            total_guests: ctx.guest_count(),
            ..PhaseReport::default()
        };

        // ==========================================
        // 步骤1: 首轮落座
        // ==========================================
        let placement = self.placement.run(&mut ctx, control);
        report.attempts_run = placement.attempts_run;
        report.after_initial = ctx.unseated_count();

        // ==========================================
        // 步骤2: 局部搜索修复
        // ==========================================
        if ctx.unseated_count() > 0 {
            let optimized = self.optimizer.run(&mut ctx);
            report.seated_by_direct_insertion = optimized.direct_insertion;
            report.seated_by_simple_swap = optimized.simple_swap;
            report.seated_by_two_way_swap = optimized.two_way_swap;
            report.seated_by_chain_swap = optimized.chain_swap;
            report.seated_by_consolidation = optimized.consolidation;
        }
        report.after_local_search = ctx.unseated_count();

        // ==========================================
        // 步骤3: 约束放宽
        // ==========================================
        let relaxed_placements = if ctx.unseated_count() > 0 {
            ConstraintRelaxationPass::new(control.effective_relaxation_steps()).run(&mut ctx)
        } else {
            Vec::new()
        };
        report.seated_by_relaxation = relaxed_placements.len();
        report.after_relaxation = ctx.unseated_count();

        // ==========================================
        // 步骤4: 输出
        // ==========================================
        let residual = self.residual(&ctx, control);
        let guests: Vec<GuestRecord> = roster
            .guests
            .iter()
            .map(|g| GuestRecord {
                code: g.code.trim().to_string(),
                seated: ctx.is_seated(g.code.trim()),
                ..g.clone()
            })
            .collect();

        info!(
            run_id = %run_id,
            total_guests = report.total_guests,
            after_initial = report.after_initial,
            after_local_search = report.after_local_search,
            after_relaxation = report.after_relaxation,
            "分桌流程完成"
        );

        Ok(SeatingOutcome {
            run_id,
            houses: ctx.houses,
            guests,
            residual,
            relaxed_placements,
            report,
        })
    }

    /// 审计名单中现有座位表（不清空座位表与落座标记）
    pub fn audit(
        &self,
        roster: &Roster,
        history: &PairHistoryIndex,
        control: &ControlVariables,
    ) -> EngineResult<AuditReport> {
        let keep_grid = ControlVariables {
            clear_grid: false,
            clear_seated: false,
            ..control.clone()
        };
        let ctx = self.build_context(roster, history, &keep_grid)?;
        let unseated = self.residual(&ctx, &keep_grid);

        Ok(GridAuditor::new().audit(
            &ctx.houses,
            history,
            ctx.oracle.never_match(),
            ctx.threshold,
            unseated,
        ))
    }

    /// 校验名单并构建运行上下文
    ///
    /// 规则:
    /// 1) 成员代码非空且唯一（主人与客人共用命名空间）
    /// 2) 客人同行人数 >= 1；主人自身占座 1-2 且不超过座位数
    /// 3) 座位表中的成员必须存在，且只出现一次
    /// 4) 座位表房屋不得超出容量与成员上限
    /// 5) 客人落座标记以座位表为准
    pub fn build_context(
        &self,
        roster: &Roster,
        history: &PairHistoryIndex,
        control: &ControlVariables,
    ) -> EngineResult<SeatingContext> {
        validate_roster(roster)?;

        let threshold = control.time_lapse_months;
        let history = history.narrowed(roster.codes().map(str::trim), threshold);

        let (never_match, rejected) = NeverMatchSet::from_entries(&roster.never_match);
        if !rejected.is_empty() {
            warn!(rejected = ?rejected, "永不同桌列表中存在无法解析的条目，已忽略");
        }

        let hosts: Vec<Attendee> = roster
            .hosts
            .iter()
            .map(|h| {
                let record = trimmed_host(h);
                let prior = history.prior_connections(&record.code);
                Attendee::host(&record, prior)
            })
            .collect();

        let houses = build_houses(roster, &hosts, control)?;
        let housed: HashSet<&str> = houses
            .iter()
            .flat_map(|h| h.guests.iter().map(|g| g.as_str()))
            .collect();

        let mut reconciled = 0;
        let guests: Vec<Attendee> = roster
            .guests
            .iter()
            .map(|g| {
                let code = g.code.trim();
                let seated = housed.contains(code);
                if seated != g.seated && !control.clear_seated {
                    reconciled += 1;
                }
                let record = GuestRecord {
                    code: code.to_string(),
                    seated,
                    ..g.clone()
                };
                Attendee::guest(&record, history.prior_connections(code))
            })
            .collect();
        if reconciled > 0 {
            warn!(reconciled, "落座标记与座位表不一致，已按座位表修正");
        }

        let attendees: Vec<Attendee> = hosts.into_iter().chain(guests).collect();
        let oracle = CompatibilityOracle::new(never_match, history);
        Ok(SeatingContext::new(attendees, houses, oracle, threshold))
    }

    /// 未落座清单（可选附带候选房屋）
    fn residual(&self, ctx: &SeatingContext, control: &ControlVariables) -> Vec<UnseatedMember> {
        let analyzer = CriticalGuestAnalyzer::new(control.critical_ceiling);
        ctx.unseated_guests()
            .into_iter()
            .map(|code| {
                let options = if control.unseated_options {
                    analyzer.house_options(ctx, &code)
                } else {
                    Vec::new()
                };
                UnseatedMember {
                    party_size: ctx.party_size(&code),
                    code,
                    options,
                }
            })
            .collect()
    }
}

impl Default for SeatingOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// 输入校验
// ==========================================

fn validate_roster(roster: &Roster) -> EngineResult<()> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(roster.attendee_count());

    for (row, host) in roster.hosts.iter().enumerate() {
        let code = host.code.trim();
        if code.is_empty() {
            return Err(EngineError::EmptyCode { row: row + 1 });
        }
        if !seen.insert(code) {
            return Err(EngineError::DuplicateCode(code.to_string()));
        }
        if !(1..=2).contains(&host.self_occupancy) {
            return Err(EngineError::InvalidHost {
                code: code.to_string(),
                message: format!("自身占座必须为 1 或 2: {}", host.self_occupancy),
            });
        }
        if host.seat_capacity > MAX_SEAT_CAPACITY {
            return Err(EngineError::InvalidHost {
                code: code.to_string(),
                message: format!(
                    "座位数 {} 超过上限 {}",
                    host.seat_capacity, MAX_SEAT_CAPACITY
                ),
            });
        }
        if host.seat_capacity < host.self_occupancy {
            return Err(EngineError::InvalidHost {
                code: code.to_string(),
                message: format!(
                    "座位数 {} 小于自身占座 {}",
                    host.seat_capacity, host.self_occupancy
                ),
            });
        }
    }

    for (row, guest) in roster.guests.iter().enumerate() {
        let code = guest.code.trim();
        if code.is_empty() {
            return Err(EngineError::EmptyCode {
                row: roster.hosts.len() + row + 1,
            });
        }
        if !seen.insert(code) {
            return Err(EngineError::DuplicateCode(code.to_string()));
        }
        if guest.party_size == 0 || guest.party_size > MAX_SEAT_CAPACITY {
            return Err(EngineError::InvalidPartySize {
                code: code.to_string(),
                party_size: guest.party_size,
            });
        }
    }

    Ok(())
}

fn trimmed_host(host: &HostRecord) -> HostRecord {
    HostRecord {
        code: host.code.trim().to_string(),
        ..host.clone()
    }
}

/// 构建房屋列表
///
/// - 未清空座位表时，带主人的座位行保留编号与顺序（clear_seated 时只保留主人）
/// - 尚未有房屋的主人追加新房屋，编号顺延
fn build_houses(
    roster: &Roster,
    hosts: &[Attendee],
    control: &ControlVariables,
) -> EngineResult<Vec<House>> {
    let host_by_code: HashMap<&str, &Attendee> =
        hosts.iter().map(|h| (h.code.as_str(), h)).collect();
    let guest_party: HashMap<&str, u32> = roster
        .guests
        .iter()
        .map(|g| (g.code.trim(), g.party_size))
        .collect();

    let mut houses: Vec<House> = Vec::new();
    let mut housed_hosts: HashSet<&str> = HashSet::new();
    let mut seated: HashSet<&str> = HashSet::new();

    if !control.clear_grid {
        for (row_idx, row) in roster.grid.iter().enumerate() {
            let house_id = row.house_id.unwrap_or(row_idx as u32 + 1);
            let host_code = match row.host.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
                Some(code) => code,
                None => {
                    if row.guest_codes().any(|g| !g.trim().is_empty()) {
                        warn!(house_id, "座位行没有主人，忽略其中的客人");
                    }
                    continue;
                }
            };

            let host = host_by_code
                .get(host_code)
                .ok_or_else(|| EngineError::UnknownMember {
                    house_id,
                    code: host_code.to_string(),
                })?;
            if !housed_hosts.insert(host_code) {
                return Err(EngineError::MemberSeatedTwice(host_code.to_string()));
            }

            let capacity = host.seat_capacity().unwrap_or(host.party_size);
            let mut house = House::new(house_id, capacity, host_code, host.party_size);

            if !control.clear_seated {
                for code in row.guest_codes().map(str::trim).filter(|c| !c.is_empty()) {
                    let party_size = *guest_party.get(code).ok_or_else(|| {
                        EngineError::UnknownMember {
                            house_id,
                            code: code.to_string(),
                        }
                    })?;
                    if !seated.insert(code) {
                        return Err(EngineError::MemberSeatedTwice(code.to_string()));
                    }
                    if house.member_count() >= MAX_MEMBERS {
                        return Err(EngineError::TooManyMembers {
                            house_id,
                            members: house.member_count() + 1,
                        });
                    }
                    house.guests.push(code.to_string());
                    house.occupied_seats += party_size;
                }

                if house.occupied_seats > house.capacity {
                    return Err(EngineError::HouseOverCapacity {
                        house_id,
                        occupied: house.occupied_seats,
                        capacity: house.capacity,
                    });
                }
            }

            houses.push(house);
        }
    }

    let unhoused: Vec<&Attendee> = hosts
        .iter()
        .filter(|h| !housed_hosts.contains(h.code.as_str()))
        .collect();
    let mut next_id = houses.iter().map(|h| h.id).max().unwrap_or(0) + 1;
    for host in ordered_houses_for_hosts(unhoused, control.sort_hosts) {
        let capacity = host.seat_capacity().unwrap_or(host.party_size);
        houses.push(House::new(next_id, capacity, &host.code, host.party_size));
        next_id += 1;
    }

    debug!(houses = houses.len(), carried = seated.len(), "房屋列表构建完成");
    Ok(houses)
}
