use super::*;
use crate::config::control::ScoringWeights;
use crate::engine::context::fixtures::{assert_valid, context};

// ==========================================
// 评分落座
// ==========================================

#[test]
fn test_scored_seats_everyone_when_room() {
    let mut ctx = context(
        &[("H1", 1, 4), ("H2", 1, 4), ("H3", 1, 2)],
        &[("G1", 1), ("G2", 1), ("G3", 1), ("G4", 1), ("G5", 1), ("G6", 1)],
        &[],
        &[],
        12,
    );
    let summary = ScoredPlacer::new(ScoringWeights::default(), 2, true, true).place(&mut ctx);
    assert_eq!(summary.unseated, 0);
    assert_eq!(summary.attempts_run, 1);
    assert_valid(&ctx);
}

#[test]
fn test_scored_respects_threshold() {
    let mut ctx = context(
        &[("H1", 1, 6)],
        &[("G1", 1), ("G2", 1)],
        &[("G1", "G2", 3)],
        &[],
        12,
    );
    let summary = ScoredPlacer::new(ScoringWeights::default(), 2, false, false).place(&mut ctx);
    assert_eq!(summary.unseated, 1);
    assert_valid(&ctx);
}

#[test]
fn test_scored_prefers_roomier_house() {
    let ctx = context(&[("H1", 1, 3), ("H2", 1, 6)], &[("G1", 1)], &[], &[], 12);
    let placer = ScoredPlacer::new(ScoringWeights::default(), 2, false, false);
    assert!(placer.score(&ctx, 1, "G1") > placer.score(&ctx, 0, "G1"));
}

#[test]
fn test_scored_ties_keep_earliest_house() {
    let mut ctx = context(&[("H1", 1, 4), ("H2", 1, 4)], &[("G1", 1)], &[], &[], 12);
    ScoredPlacer::new(ScoringWeights::default(), 2, false, false).place(&mut ctx);
    assert_eq!(ctx.house_of("G1"), Some(0));
}

#[test]
fn test_scored_freshness_prefers_longer_separation() {
    let weights = ScoringWeights {
        slack: 0.0,
        balance: 0.0,
        freshness: 1.0,
        months_cap: 36,
    };
    let ctx = context(
        &[("H1", 1, 4), ("H2", 1, 4)],
        &[("G1", 1)],
        &[("G1", "H1", 14), ("G1", "H2", 30)],
        &[],
        12,
    );
    let placer = ScoredPlacer::new(weights, 2, false, false);
    assert!(placer.score(&ctx, 1, "G1") > placer.score(&ctx, 0, "G1"));
}

#[test]
fn test_scored_critical_guest_is_not_stranded() {
    // G2 只能进 H2（一个空位）；G1 排在前面且两个房屋都可进
    let mut ctx = context(
        &[("H1", 1, 3), ("H2", 1, 2)],
        &[("G1", 1), ("G2", 1)],
        &[("G2", "H1", 1)],
        &[],
        12,
    );
    ScoredPlacer::new(ScoringWeights::default(), 2, false, false).place(&mut ctx);
    assert_eq!(ctx.unseated_count(), 0);
    assert_eq!(ctx.house_of("G2"), Some(1));
    assert_valid(&ctx);
}

#[test]
fn test_scored_competing_critical_guests_share_last_seat() {
    // H1 只剩 1 个空位，两位客人都只能进 H1
    for prioritize in [true, false] {
        let mut ctx = context(
            &[("H1", 1, 2), ("H2", 1, 4)],
            &[("G1", 1), ("G2", 1)],
            &[],
            &[("G1", "H2"), ("G2", "H2")],
            12,
        );
        let summary =
            ScoredPlacer::new(ScoringWeights::default(), 2, prioritize, false).place(&mut ctx);
        assert_eq!(summary.unseated, 1);
        assert_eq!(ctx.houses[0].guests.len(), 1);
        assert_valid(&ctx);
    }
}

#[test]
fn test_scored_promotes_most_constrained_guest() {
    // G2 只有一个候选房屋，开启关键优先后先于 G1 处理
    let mut ctx = context(
        &[("H1", 1, 2), ("H2", 1, 2)],
        &[("G1", 1), ("G2", 1)],
        &[("G2", "H1", 1)],
        &[],
        12,
    );
    ScoredPlacer::new(ScoringWeights::default(), 2, true, false).place(&mut ctx);
    assert_eq!(ctx.house_of("G2"), Some(1));
    assert_eq!(ctx.house_of("G1"), Some(0));
}

// ==========================================
// 随机重启贪心
// ==========================================

#[test]
fn test_greedy_fills_in_house_order() {
    let mut ctx = context(
        &[("H1", 1, 3), ("H2", 1, 3)],
        &[("G1", 1), ("G2", 1), ("G3", 1), ("G4", 1)],
        &[],
        &[],
        12,
    );
    let summary = GreedyRestartPlacer::new(10, 7, false, false, false).place(&mut ctx);
    assert_eq!(summary.unseated, 0);
    assert_eq!(summary.attempts_run, 1);
    assert_eq!(ctx.houses[0].guests, vec!["G1".to_string(), "G2".to_string()]);
    assert_valid(&ctx);
}

#[test]
fn test_greedy_throttle_skips_singles_for_lone_host() {
    let mut ctx = context(&[("H1", 1, 4)], &[("G1", 1), ("G2", 2)], &[], &[], 12);
    GreedyRestartPlacer::new(1, 7, true, false, false).place(&mut ctx);
    assert_eq!(ctx.houses[0].guests, vec!["G2".to_string(), "G1".to_string()]);
}

#[test]
fn test_greedy_is_reproducible_for_seed() {
    let build = || {
        context(
            &[("H1", 1, 3), ("H2", 1, 3), ("H3", 2, 4)],
            &[("G1", 1), ("G2", 2), ("G3", 1), ("G4", 1), ("G5", 2), ("G6", 1)],
            &[("G1", "G2", 2), ("G3", "H1", 4), ("G5", "H2", 1), ("G6", "G4", 5)],
            &[("G2", "H3"), ("G1", "G3")],
            12,
        )
    };
    let mut first = build();
    let mut second = build();
    let placer = GreedyRestartPlacer::new(10, 99, false, true, true);
    let a = placer.place(&mut first);
    let b = placer.place(&mut second);
    assert_eq!(a, b);
    assert_eq!(first.houses, second.houses);
    assert_valid(&first);
}

#[test]
fn test_greedy_never_worse_than_first_attempt() {
    let build = || {
        context(
            &[("H1", 1, 3), ("H2", 1, 3)],
            &[("G1", 2), ("G2", 1), ("G3", 1), ("G4", 1)],
            &[("G1", "G2", 1)],
            &[],
            12,
        )
    };
    let mut single = build();
    let first = GreedyRestartPlacer::new(1, 3, false, false, false).place(&mut single);
    let mut many = build();
    let best = GreedyRestartPlacer::new(10, 3, false, false, false).place(&mut many);
    assert!(best.unseated <= first.unseated);
    assert_valid(&many);
}

// ==========================================
// 调度与排序
// ==========================================

#[test]
fn test_ordered_guests_by_prior_connections() {
    let ctx = context(
        &[("H1", 1, 6)],
        &[("G1", 1), ("G2", 1), ("G3", 1)],
        &[("G3", "X1", 20), ("G3", "X2", 20), ("G2", "X1", 20)],
        &[],
        12,
    );
    assert_eq!(ordered_guests(&ctx, true), vec!["G3", "G2", "G1"]);
    assert_eq!(ordered_guests(&ctx, false), vec!["G1", "G2", "G3"]);
}

#[test]
fn test_initial_placement_dispatches_policy() {
    use crate::domain::types::PlacementPolicy;

    let mut ctx = context(&[("H1", 1, 4)], &[("G1", 1), ("G2", 1)], &[], &[], 12);
    let control = ControlVariables {
        placement_policy: PlacementPolicy::GreedyRestart,
        ..ControlVariables::default()
    };
    let summary = InitialPlacement::new().run(&mut ctx, &control);
    assert_eq!(summary.unseated, 0);
}
