// ==========================================
// 晚宴分桌系统 - 命令行入口
// ==========================================
// 用法: dinner-grid [--db PATH] <COMMAND>
// 日志写 stderr，命令结果写 stdout
// ==========================================

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use dinner_grid::app::AppState;
use dinner_grid::config::ControlVariables;
use dinner_grid::{db, logging, PlacementPolicy};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "dinner-grid", version, about = "晚宴分桌系统: 生成座位表并维护同桌台账")]
struct Cli {
    /// SQLite 数据库路径（默认: DINNER_GRID_DB_PATH 或用户数据目录）
    #[arg(long, global = true)]
    db: Option<String>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 生成座位表
    Build {
        /// CSV 目录或 .xlsx 工作簿
        #[arg(long)]
        roster: PathBuf,
        /// 导出目录（grid.csv / guests.csv / outcome.json / audit.json）
        #[arg(long)]
        out: Option<PathBuf>,
        #[command(flatten)]
        overrides: ControlOverrides,
        /// 以 JSON 输出完整结果
        #[arg(long)]
        json: bool,
    },

    /// 审计现有座位表
    Audit {
        #[arg(long)]
        roster: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
        /// 覆盖间隔阈值（月）
        #[arg(long)]
        threshold: Option<i64>,
        #[arg(long)]
        json: bool,
    },

    /// 以下次晚宴日期重算台账间隔月数
    PrepConnections {
        /// 默认使用已保存的 next_dinner_date
        #[arg(long)]
        next_dinner: Option<NaiveDate>,
    },

    /// 晚宴结束后把座位表写入台账
    UpdateConnections {
        #[arg(long)]
        roster: PathBuf,
        /// 本次晚宴日期
        #[arg(long)]
        dinner_date: NaiveDate,
        /// 下次晚宴日期（默认使用已保存的 next_dinner_date）
        #[arg(long)]
        next_dinner: Option<NaiveDate>,
    },

    /// 批量导入台账 CSV
    ImportConnections {
        #[arg(long)]
        file: PathBuf,
        /// 导入前清空现有台账
        #[arg(long)]
        replace: bool,
    },

    /// 控制参数
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// 显示生效的控制参数
    Show,
    /// 保存单个参数
    Set { key: String, value: String },
    /// 输出全部已保存参数的 JSON 快照
    Snapshot,
    /// 从 JSON 快照文件恢复
    Restore { file: PathBuf },
}

/// 单次运行覆盖的控制参数（不写回数据库）
#[derive(clap::Args, Debug, Default)]
struct ControlOverrides {
    #[arg(long)]
    threshold: Option<i64>,
    #[arg(long)]
    next_dinner: Option<NaiveDate>,
    #[arg(long)]
    policy: Option<PlacementPolicy>,
    #[arg(long)]
    max_attempts: Option<usize>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    throttle_singles: bool,
    #[arg(long)]
    clear_grid: bool,
    #[arg(long)]
    clear_seated: bool,
    #[arg(long)]
    unseated_options: bool,
}

impl ControlOverrides {
    fn apply(&self, mut control: ControlVariables) -> ControlVariables {
        if let Some(threshold) = self.threshold {
            control.time_lapse_months = threshold;
        }
        if let Some(date) = self.next_dinner {
            control.next_dinner_date = Some(date);
        }
        if let Some(policy) = self.policy {
            control.placement_policy = policy;
        }
        if let Some(max_attempts) = self.max_attempts {
            control.max_attempts = max_attempts;
        }
        if let Some(seed) = self.seed {
            control.shuffle_seed = Some(seed);
        }
        control.throttle_singles |= self.throttle_singles;
        control.clear_grid |= self.clear_grid;
        control.clear_seated |= self.clear_seated;
        control.unseated_options |= self.unseated_options;
        control
    }
}

fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();

    let db_path = cli.db.clone().unwrap_or_else(db::get_default_db_path);
    info!(db_path = %db_path, version = dinner_grid::VERSION, "使用数据库");
    let state = AppState::new(&db_path).with_context(|| format!("无法打开数据库: {}", db_path))?;

    match cli.cmd {
        Commands::Build {
            roster,
            out,
            overrides,
            json,
        } => {
            let control = overrides.apply(state.load_control()?);
            let outcome = state.build(&roster, out.as_deref(), &control)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                let r = &outcome.report;
                println!("run_id={}", outcome.run_id);
                println!(
                    "guests={} after_initial={} after_local_search={} after_relaxation={}",
                    r.total_guests, r.after_initial, r.after_local_search, r.after_relaxation
                );
                for relaxed in &outcome.relaxed_placements {
                    println!(
                        "relaxed {} -> house {} (threshold {})",
                        relaxed.code, relaxed.house_id, relaxed.threshold_months
                    );
                }
                for member in &outcome.residual {
                    println!("unseated {} (party {})", member.code, member.party_size);
                }
            }
        }
        Commands::Audit {
            roster,
            out,
            threshold,
            json,
        } => {
            let mut control = state.load_control()?;
            if let Some(threshold) = threshold {
                control.time_lapse_months = threshold;
            }
            let report = state.audit(&roster, out.as_deref(), &control)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                let s = &report.summary;
                println!(
                    "connections={} never_met={} avg={:?} min={:?} max={:?} threshold={}",
                    s.total_connections,
                    s.never_met,
                    s.average_months,
                    s.min_months,
                    s.max_months,
                    s.threshold_months
                );
                for pair in report.never_match_violations.iter().chain(&report.problem_pairs) {
                    if let Some(warning) = pair.warning {
                        println!(
                            "house {}: {}-{} {}",
                            pair.house_id, pair.member_1, pair.member_2, warning
                        );
                    }
                }
                println!("unseated={}", s.unseated_members);
            }
        }
        Commands::PrepConnections { next_dinner } => {
            let next_dinner = resolve_next_dinner(&state, next_dinner)?;
            let updated = state.prep_connections(next_dinner)?;
            println!("updated={}", updated);
        }
        Commands::UpdateConnections {
            roster,
            dinner_date,
            next_dinner,
        } => {
            let next_dinner = resolve_next_dinner(&state, next_dinner)?;
            let written = state.update_connections(&roster, dinner_date, next_dinner)?;
            println!("written={}", written);
        }
        Commands::ImportConnections { file, replace } => {
            let written = state.import_connections(&file, replace)?;
            println!("imported={}", written);
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let control = state.load_control()?;
                println!("{}", serde_json::to_string_pretty(&control)?);
            }
            ConfigAction::Set { key, value } => {
                state.set_control_value(&key, &value)?;
                println!("{}={}", key, value);
            }
            ConfigAction::Snapshot => {
                let snapshot = state
                    .config
                    .get_config_snapshot()
                    .map_err(|e| anyhow::anyhow!("{}", e))?;
                println!("{}", snapshot);
            }
            ConfigAction::Restore { file } => {
                let json = std::fs::read_to_string(&file)
                    .with_context(|| format!("无法读取快照: {}", file.display()))?;
                let restored = state
                    .config
                    .restore_config_from_snapshot(&json)
                    .map_err(|e| anyhow::anyhow!("{}", e))?;
                println!("restored={}", restored);
            }
        },
    }

    Ok(())
}

fn resolve_next_dinner(state: &AppState, explicit: Option<NaiveDate>) -> Result<NaiveDate> {
    match explicit {
        Some(date) => Ok(date),
        None => state
            .load_control()?
            .next_dinner_date
            .context("未提供 --next-dinner，且未保存 next_dinner_date"),
    }
}
