//! Raw career totals accumulated fight by fight.

use crate::types::{Corner, FightRecord, FinishMethod};

/// Running totals for one fighter. Every fight is absorbed from the point of
/// view of the corner the fighter stood in; the opposite corner supplies the
/// defensive numbers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CareerTotals {
    pub name: String,
    pub fights: u32,
    /// Sum of positive fight times only
    pub fight_secs: i64,
    pub wins: u32,

    // Offence
    pub kd: u32,
    pub sig_str_landed: u32,
    pub sig_str_attempted: u32,
    pub sub_att: u32,
    pub leg_landed: u32,
    pub body_landed: u32,
    pub td_landed: u32,
    pub td_attempted: u32,
    pub ctrl_secs: u64,

    // Defence
    pub kd_received: u32,
    pub td_attempts_received: u32,
    pub sub_att_received: u32,
    pub sub_defended: u32,

    // Outcomes
    pub ko_tko_wins: u32,
    pub sub_wins: u32,
    pub ko_losses: u32,
    pub sub_losses: u32,
    pub five_round_fights: u32,
    pub five_round_wins: u32,
    pub five_round_decision_wins: u32,
    pub ground_landed_in_ko_wins: u32,
    pub ko_wins_with_ground: u32,

    /// Significant strikes landed per minute, one sample per fight
    pub splm_samples: Vec<f64>,
}

impl CareerTotals {
    /// Add one fight seen from `corner`. `winner_id` is `None` for draws,
    /// no-contests and fights without a recorded outcome.
    pub fn absorb(&mut self, fight: &FightRecord, corner: Corner, winner_id: Option<&str>) {
        let own = fight.corner(corner);
        let opp = fight.corner(corner.opponent());
        let won = winner_id == Some(own.fighter_id.as_str());

        if !own.fighter_name.is_empty() {
            self.name = own.fighter_name.clone();
        }

        self.fights += 1;
        if fight.match_time_sec > 0 {
            self.fight_secs += fight.match_time_sec;
            let minutes = fight.match_time_sec as f64 / 60.0;
            self.splm_samples.push(own.sig_str.landed as f64 / minutes);
        } else {
            self.splm_samples.push(0.0);
        }

        self.kd += own.kd;
        self.sig_str_landed += own.sig_str.landed;
        self.sig_str_attempted += own.sig_str.attempted;
        self.sub_att += own.sub_att;
        self.leg_landed += own.leg.landed;
        self.body_landed += own.body.landed;
        self.td_landed += own.td.landed;
        self.td_attempted += own.td.attempted;
        self.ctrl_secs += own.ctrl_sec as u64;

        self.kd_received += opp.kd;
        self.td_attempts_received += opp.td.attempted;
        self.sub_att_received += opp.sub_att;
        if fight.method != FinishMethod::Submission || won {
            self.sub_defended += opp.sub_att;
        }

        match (fight.method, won) {
            (FinishMethod::KoTko, true) => {
                self.ko_tko_wins += 1;
                self.ground_landed_in_ko_wins += own.ground.landed;
                if own.ground.landed > 0 {
                    self.ko_wins_with_ground += 1;
                }
            }
            (FinishMethod::KoTko, false) => self.ko_losses += 1,
            (FinishMethod::Submission, true) => self.sub_wins += 1,
            (FinishMethod::Submission, false) => self.sub_losses += 1,
            _ => {}
        }

        if won {
            self.wins += 1;
        }

        if fight.total_rounds == Some(5) {
            self.five_round_fights += 1;
            if won {
                self.five_round_wins += 1;
                if fight.method == FinishMethod::Decision {
                    self.five_round_decision_wins += 1;
                }
            }
        }
    }
}
