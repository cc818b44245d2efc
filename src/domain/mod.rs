// ==========================================
// 晚宴分桌系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、容量约束接口
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod assignment;
pub mod attendee;
pub mod house;
pub mod pair;
pub mod roster;
pub mod types;

// 重导出核心类型
pub use assignment::{HouseOption, PhaseReport, RelaxedPlacement, SeatingOutcome, UnseatedMember};
pub use attendee::{Attendee, GuestRecord, HostRecord};
pub use house::{GridRow, House, SeatCapacity, GUEST_SLOTS, MAX_MEMBERS, MAX_SEAT_CAPACITY};
pub use pair::{months_between, ConnectionEntry, NeverMatchSet, PairKey};
pub use roster::Roster;
pub use types::{AuditWarning, PlacementPolicy, Role};
