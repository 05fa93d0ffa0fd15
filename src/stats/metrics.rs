//! Career metrics derived from raw totals.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::totals::CareerTotals;
use crate::error::PipelineError;
use crate::types::{Corner, FightRecord};

/// Minutes in a standard three-round fight
const NORMALIZED_MINUTES: f64 = 15.0;

/// Per-fighter career snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FighterMetrics {
    pub fighter_id: String,
    pub name: String,

    // Raw totals
    pub total_fights: u32,
    pub total_fight_time_sec: i64,
    pub wins: u32,
    pub kd: u32,
    pub kd_received: u32,
    pub sig_str_landed: u32,
    pub sig_str_attempted: u32,
    pub sub_att: u32,
    pub leg_landed: u32,
    pub body_landed: u32,
    pub td_landed: u32,
    pub td_attempted: u32,
    pub ctrl_sec: u64,
    pub ko_tko_wins: u32,
    pub sub_wins: u32,
    pub ko_losses: u32,
    pub sub_losses: u32,
    pub five_round_fights: u32,
    pub five_round_wins: u32,

    // Per 15 minutes of fight time
    pub kd_avg: f64,
    pub sig_str_landed_avg: f64,
    pub ctrl_avg: f64,
    pub leg_landed_avg: f64,
    pub body_landed_avg: f64,
    pub td_landed_avg: f64,
    pub sub_att_avg: f64,
    pub kd_received_avg: f64,
    pub td_attempts_received_avg: f64,
    pub sub_att_received_avg: f64,

    // Percentages
    pub career_td_acc: f64,
    pub career_sig_str_acc: f64,
    pub finish_rate: f64,
    pub sub_def: f64,
    pub ko_loss_rate: f64,
    pub five_round_win_rate: f64,
    pub five_round_decision_rate: f64,
    pub ground_finish_rate: f64,

    // Other
    pub splm_std: f64,
    pub never_submitted: bool,
    pub ground_landed_per_tko: f64,
    pub sig_str_landed_per_sec: f64,
    pub avg_fight_time_sec: f64,
}

impl FighterMetrics {
    pub fn from_totals(fighter_id: &str, totals: &CareerTotals) -> Self {
        let secs = totals.fight_secs;
        let per_15 = |count: f64| -> f64 {
            if secs > 0 {
                round2(count / (secs as f64 / 60.0) * NORMALIZED_MINUTES)
            } else {
                0.0
            }
        };

        Self {
            fighter_id: fighter_id.to_string(),
            name: totals.name.clone(),

            total_fights: totals.fights,
            total_fight_time_sec: secs,
            wins: totals.wins,
            kd: totals.kd,
            kd_received: totals.kd_received,
            sig_str_landed: totals.sig_str_landed,
            sig_str_attempted: totals.sig_str_attempted,
            sub_att: totals.sub_att,
            leg_landed: totals.leg_landed,
            body_landed: totals.body_landed,
            td_landed: totals.td_landed,
            td_attempted: totals.td_attempted,
            ctrl_sec: totals.ctrl_secs,
            ko_tko_wins: totals.ko_tko_wins,
            sub_wins: totals.sub_wins,
            ko_losses: totals.ko_losses,
            sub_losses: totals.sub_losses,
            five_round_fights: totals.five_round_fights,
            five_round_wins: totals.five_round_wins,

            kd_avg: per_15(totals.kd as f64),
            sig_str_landed_avg: per_15(totals.sig_str_landed as f64),
            ctrl_avg: per_15(totals.ctrl_secs as f64),
            leg_landed_avg: per_15(totals.leg_landed as f64),
            body_landed_avg: per_15(totals.body_landed as f64),
            td_landed_avg: per_15(totals.td_landed as f64),
            sub_att_avg: per_15(totals.sub_att as f64),
            kd_received_avg: per_15(totals.kd_received as f64),
            td_attempts_received_avg: per_15(totals.td_attempts_received as f64),
            sub_att_received_avg: per_15(totals.sub_att_received as f64),

            career_td_acc: percent(totals.td_landed, totals.td_attempted),
            career_sig_str_acc: percent(totals.sig_str_landed, totals.sig_str_attempted),
            finish_rate: percent(totals.ko_tko_wins + totals.sub_wins, totals.fights),
            sub_def: percent(totals.sub_defended, totals.sub_att_received.max(1)),
            ko_loss_rate: percent(totals.ko_losses, totals.fights),
            five_round_win_rate: percent(totals.five_round_wins, totals.five_round_fights),
            five_round_decision_rate: percent(
                totals.five_round_decision_wins,
                totals.five_round_wins,
            ),
            ground_finish_rate: percent(totals.ko_wins_with_ground, totals.ko_tko_wins),

            splm_std: round2(population_std(&totals.splm_samples)),
            never_submitted: totals.sub_losses == 0,
            ground_landed_per_tko: ratio(
                totals.ground_landed_in_ko_wins as f64,
                totals.ko_tko_wins as f64,
                round2,
            ),
            sig_str_landed_per_sec: ratio(totals.sig_str_landed as f64, secs as f64, round4),
            avg_fight_time_sec: ratio(secs as f64, totals.fights as f64, round2),
        }
    }
}

/// Compute career metrics for every fighter appearing in `fights`.
///
/// `outcomes` maps fight id to winner id (`None` for draws and no-contests).
/// Fights without an outcome entry are treated as having no winner. A corner
/// without a fighter id is skipped; nothing here aborts the whole run.
pub fn aggregate(
    fights: &[FightRecord],
    outcomes: &HashMap<String, Option<String>>,
) -> BTreeMap<String, FighterMetrics> {
    let mut totals: HashMap<String, CareerTotals> = HashMap::new();

    for fight in fights {
        let winner = match outcomes.get(&fight.fight_id) {
            Some(winner) => winner.as_deref(),
            None => {
                let e = PipelineError::AggregationInput {
                    fight_id: fight.fight_id.clone(),
                    reason: "no recorded outcome, treating as no winner".to_string(),
                };
                debug!("{}", e);
                None
            }
        };

        for corner in Corner::BOTH {
            let fighter_id = &fight.corner(corner).fighter_id;
            if fighter_id.is_empty() {
                let e = PipelineError::AggregationInput {
                    fight_id: fight.fight_id.clone(),
                    reason: format!("{} corner has no fighter id", corner.as_str()),
                };
                debug!("{}", e);
                continue;
            }

            totals
                .entry(fighter_id.clone())
                .or_default()
                .absorb(fight, corner, winner);
        }
    }

    totals
        .iter()
        .map(|(id, t)| (id.clone(), FighterMetrics::from_totals(id, t)))
        .collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// `part / whole * 100`, 0 when `whole` is 0
fn percent(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        0.0
    } else {
        round2(part as f64 / whole as f64 * 100.0)
    }
}

fn ratio(numerator: f64, denominator: f64, round: fn(f64) -> f64) -> f64 {
    if denominator > 0.0 {
        round(numerator / denominator)
    } else {
        0.0
    }
}

fn population_std(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Attempts, CornerStats, FinishMethod};

    fn corner(id: &str) -> CornerStats {
        CornerStats {
            fighter_id: id.to_string(),
            fighter_name: id.to_uppercase(),
            ..Default::default()
        }
    }

    fn bout(id: &str, red: CornerStats, blue: CornerStats, secs: i64) -> FightRecord {
        FightRecord {
            fight_id: id.to_string(),
            method: FinishMethod::Decision,
            match_time_sec: secs,
            total_rounds: Some(3),
            red,
            blue,
            ..Default::default()
        }
    }

    fn winners(pairs: &[(&str, Option<&str>)]) -> HashMap<String, Option<String>> {
        pairs
            .iter()
            .map(|(f, w)| (f.to_string(), w.map(str::to_string)))
            .collect()
    }

    #[test]
    fn test_knockdown_rate_scenario() {
        let fights = vec![
            bout("f1", CornerStats { kd: 1, ..corner("a") }, corner("x"), 300),
            bout("f2", CornerStats { kd: 0, ..corner("a") }, corner("y"), 600),
        ];
        let metrics = aggregate(&fights, &HashMap::new());

        let a = &metrics["a"];
        assert_eq!(a.total_fights, 2);
        assert_eq!(a.total_fight_time_sec, 900);
        assert_eq!(a.kd_avg, 1.0);
    }

    #[test]
    fn test_zero_time_rates_are_zero() {
        let red = CornerStats {
            kd: 2,
            sig_str: Attempts::new(10, 20),
            td: Attempts::new(1, 2),
            sub_att: 1,
            ctrl_sec: 30,
            leg: Attempts::new(3, 3),
            body: Attempts::new(2, 2),
            ..corner("a")
        };
        let blue = CornerStats {
            kd: 1,
            sub_att: 1,
            td: Attempts::new(0, 3),
            ..corner("b")
        };
        let metrics = aggregate(&[bout("f1", red, blue, 0)], &HashMap::new());

        let a = &metrics["a"];
        for rate in [
            a.kd_avg,
            a.sig_str_landed_avg,
            a.ctrl_avg,
            a.leg_landed_avg,
            a.body_landed_avg,
            a.td_landed_avg,
            a.sub_att_avg,
            a.kd_received_avg,
            a.td_attempts_received_avg,
            a.sub_att_received_avg,
            a.sig_str_landed_per_sec,
        ] {
            assert_eq!(rate, 0.0);
        }
        assert_eq!(a.total_fights, 1);
        assert_eq!(a.kd, 2);
        assert_eq!(a.splm_std, 0.0);
    }

    #[test]
    fn test_zero_time_fight_keeps_count_based_rates() {
        let ko = FightRecord {
            method: FinishMethod::KoTko,
            ..bout("f1", corner("a"), CornerStats { sub_att: 1, ..corner("b") }, 0)
        };
        let metrics = aggregate(&[ko], &winners(&[("f1", Some("a"))]));

        let a = &metrics["a"];
        assert_eq!(a.total_fight_time_sec, 0);
        assert_eq!(a.finish_rate, 100.0);
        assert_eq!(a.sub_def, 100.0);
        assert_eq!(a.sub_att_received_avg, 0.0);
        assert_eq!(metrics["b"].ko_loss_rate, 100.0);
    }

    #[test]
    fn test_submission_defense() {
        let lost = FightRecord {
            method: FinishMethod::Submission,
            ..bout("f1", corner("a"), CornerStats { sub_att: 1, ..corner("b") }, 200)
        };
        let metrics = aggregate(&[lost], &winners(&[("f1", Some("b"))]));
        assert_eq!(metrics["a"].sub_def, 0.0);
        assert!(!metrics["a"].never_submitted);

        let won = bout("f2", corner("a"), CornerStats { sub_att: 1, ..corner("b") }, 900);
        let metrics = aggregate(&[won], &winners(&[("f2", Some("a"))]));
        assert_eq!(metrics["a"].sub_def, 100.0);
        assert!(metrics["a"].never_submitted);
    }

    #[test]
    fn test_no_attempts_received() {
        let metrics = aggregate(&[bout("f1", corner("a"), corner("b"), 900)], &HashMap::new());

        assert_eq!(metrics["a"].sub_att_received_avg, 0.0);
        assert_eq!(metrics["a"].sub_def, 0.0);
    }

    #[test]
    fn test_mirrored_corners_are_symmetric() {
        let one = CornerStats {
            kd: 1,
            sig_str: Attempts::new(40, 80),
            td: Attempts::new(2, 5),
            sub_att: 1,
            ctrl_sec: 120,
            leg: Attempts::new(5, 6),
            body: Attempts::new(7, 9),
            ground: Attempts::new(3, 4),
            ..Default::default()
        };
        let two = CornerStats {
            kd: 0,
            sig_str: Attempts::new(25, 70),
            td: Attempts::new(0, 3),
            sub_att: 2,
            ctrl_sec: 15,
            ..Default::default()
        };

        let fights = vec![
            bout("f1", one.clone().with_id("a"), two.clone().with_id("b"), 900),
            bout("f2", two.with_id("c"), one.with_id("d"), 900),
        ];
        let metrics = aggregate(&fights, &winners(&[("f1", Some("a")), ("f2", Some("d"))]));

        let mut a = metrics["a"].clone();
        let mut d = metrics["d"].clone();
        a.fighter_id.clear();
        a.name.clear();
        d.fighter_id.clear();
        d.name.clear();
        assert_eq!(a, d);
    }

    #[test]
    fn test_finish_and_loss_rates() {
        let ko_win = FightRecord {
            method: FinishMethod::KoTko,
            ..bout(
                "f1",
                CornerStats { ground: Attempts::new(12, 15), ..corner("a") },
                corner("b"),
                300,
            )
        };
        let ko_loss = FightRecord {
            method: FinishMethod::KoTko,
            ..bout("f2", corner("a"), corner("c"), 300)
        };
        let decision = FightRecord {
            total_rounds: Some(5),
            ..bout("f3", corner("a"), corner("d"), 1500)
        };
        let sub_win = FightRecord {
            method: FinishMethod::Submission,
            ..bout("f4", corner("a"), corner("e"), 120)
        };

        let metrics = aggregate(
            &[ko_win, ko_loss, decision, sub_win],
            &winners(&[
                ("f1", Some("a")),
                ("f2", Some("c")),
                ("f3", Some("a")),
                ("f4", Some("a")),
            ]),
        );
        let a = &metrics["a"];

        assert_eq!(a.total_fights, 4);
        assert_eq!(a.ko_tko_wins, 1);
        assert_eq!(a.sub_wins, 1);
        assert_eq!(a.finish_rate, 50.0);
        assert_eq!(a.ko_loss_rate, 25.0);
        assert_eq!(a.ground_landed_per_tko, 12.0);
        assert_eq!(a.ground_finish_rate, 100.0);
        assert_eq!(a.five_round_fights, 1);
        assert_eq!(a.five_round_win_rate, 100.0);
        assert_eq!(a.five_round_decision_rate, 100.0);
        assert_eq!(a.avg_fight_time_sec, 555.0);
        assert!(a.never_submitted);
    }

    #[test]
    fn test_accuracy_and_per_second_rate() {
        let red = CornerStats {
            sig_str: Attempts::new(45, 100),
            td: Attempts::new(1, 3),
            ..corner("a")
        };
        let metrics = aggregate(&[bout("f1", red, corner("b"), 900)], &HashMap::new());
        let a = &metrics["a"];

        assert_eq!(a.career_sig_str_acc, 45.0);
        assert_eq!(a.career_td_acc, 33.33);
        assert_eq!(a.sig_str_landed_per_sec, 0.05);
        assert_eq!(a.sig_str_landed_avg, 45.0);
    }

    #[test]
    fn test_splm_std_is_population() {
        // 30 landed in 10 min = 3.0/min, 50 landed in 10 min = 5.0/min
        let fights = vec![
            bout("f1", CornerStats { sig_str: Attempts::new(30, 60), ..corner("a") }, corner("b"), 600),
            bout("f2", CornerStats { sig_str: Attempts::new(50, 90), ..corner("a") }, corner("c"), 600),
        ];
        let metrics = aggregate(&fights, &HashMap::new());

        assert_eq!(metrics["a"].splm_std, 1.0);
    }

    #[test]
    fn test_corner_without_fighter_is_skipped() {
        let metrics = aggregate(&[bout("f1", corner("a"), corner(""), 300)], &HashMap::new());

        assert_eq!(metrics.len(), 1);
        assert!(metrics.contains_key("a"));
    }

    impl CornerStats {
        fn with_id(self, id: &str) -> Self {
            CornerStats {
                fighter_id: id.to_string(),
                fighter_name: id.to_string(),
                ..self
            }
        }
    }
}
