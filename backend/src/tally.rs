// Tally computation for election results
//
// The vote ledger is never the only input to a published result: an admin
// can set a per-candidate display override that replaces the raw count for
// that candidate. The override participates in the total, so it shifts every
// other candidate's percentage as well. The ledger itself stays untouched.

use rocket_db_pools::diesel::prelude::*;
use serde::Serialize;

/// One candidate's standing as read from the database: the raw ledger count
/// grouped per candidate, plus the nullable display override.
#[derive(Debug, Clone, Queryable)]
pub struct CandidateCount {
    pub candidate_id: String,
    pub candidate_name: String,
    pub color: String,
    pub vote_display_override: Option<i32>,
    pub raw_votes: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TallyRow {
    pub candidate_id: String,
    pub candidate_name: String,
    pub votes: i64,
    pub percentage: f64,
    pub color: String,
}

fn round_two(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Turn per-candidate counts into display rows. Each candidate shows its
/// override when one is set, its raw ledger count otherwise; percentages are
/// computed against the sum of displayed counts and rounded to two decimals.
/// A zero total yields 0.0 for every candidate.
pub fn compute_tally(counts: Vec<CandidateCount>) -> Vec<TallyRow> {
    let total: i64 = counts
        .iter()
        .map(|c| c.vote_display_override.map(i64::from).unwrap_or(c.raw_votes))
        .sum();

    counts
        .into_iter()
        .map(|c| {
            let displayed = c
                .vote_display_override
                .map(i64::from)
                .unwrap_or(c.raw_votes);
            let percentage = if total == 0 {
                0.0
            } else {
                round_two(displayed as f64 / total as f64 * 100.0)
            };
            TallyRow {
                candidate_id: c.candidate_id,
                candidate_name: c.candidate_name,
                votes: displayed,
                percentage,
                color: c.color,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(id: &str, raw: i64, override_votes: Option<i32>) -> CandidateCount {
        CandidateCount {
            candidate_id: id.to_string(),
            candidate_name: format!("Candidate {}", id),
            color: "#336699".to_string(),
            vote_display_override: override_votes,
            raw_votes: raw,
        }
    }

    #[test]
    fn no_votes_and_no_overrides_yields_zero_rows() {
        let rows = compute_tally(vec![count("c1", 0, None), count("c2", 0, None)]);
        assert_eq!(rows.len(), 2);
        for row in rows {
            assert_eq!(row.votes, 0);
            assert_eq!(row.percentage, 0.0);
        }
    }

    #[test]
    fn raw_counts_are_conserved_without_overrides() {
        let rows = compute_tally(vec![
            count("c1", 3, None),
            count("c2", 1, None),
            count("c3", 0, None),
        ]);
        let total: i64 = rows.iter().map(|r| r.votes).sum();
        assert_eq!(total, 4);
        assert_eq!(rows[0].percentage, 75.0);
        assert_eq!(rows[1].percentage, 25.0);
        assert_eq!(rows[2].percentage, 0.0);
    }

    #[test]
    fn override_replaces_raw_count_and_joins_the_total() {
        // Three real votes for c1, override of 100; c2 untouched.
        let rows = compute_tally(vec![count("c1", 3, Some(100)), count("c2", 0, None)]);
        assert_eq!(rows[0].votes, 100);
        assert_eq!(rows[0].percentage, 100.0);
        assert_eq!(rows[1].votes, 0);
        assert_eq!(rows[1].percentage, 0.0);
    }

    #[test]
    fn overrides_apply_per_candidate_independently() {
        let rows = compute_tally(vec![
            count("c1", 7, Some(50)),
            count("c2", 30, None),
            count("c3", 4, Some(20)),
        ]);
        assert_eq!(rows[0].votes, 50);
        assert_eq!(rows[1].votes, 30);
        assert_eq!(rows[2].votes, 20);
        assert_eq!(rows[0].percentage, 50.0);
        assert_eq!(rows[1].percentage, 30.0);
        assert_eq!(rows[2].percentage, 20.0);
    }

    #[test]
    fn zero_override_pins_a_candidate_to_zero() {
        let rows = compute_tally(vec![count("c1", 5, Some(0)), count("c2", 5, None)]);
        assert_eq!(rows[0].votes, 0);
        assert_eq!(rows[0].percentage, 0.0);
        assert_eq!(rows[1].percentage, 100.0);
    }

    #[test]
    fn percentages_sum_close_to_one_hundred() {
        let rows = compute_tally(vec![
            count("c1", 1, None),
            count("c2", 1, None),
            count("c3", 1, None),
        ]);
        let sum: f64 = rows.iter().map(|r| r.percentage).sum();
        assert!((sum - 100.0).abs() < 0.05, "sum was {}", sum);
    }

    #[test]
    fn rounding_is_two_decimal_places() {
        let rows = compute_tally(vec![count("c1", 1, None), count("c2", 2, None)]);
        assert_eq!(rows[0].percentage, 33.33);
        assert_eq!(rows[1].percentage, 66.67);
    }

    #[test]
    fn rows_serialize_to_camel_case() {
        let rows = compute_tally(vec![count("c1", 2, None)]);
        let json = serde_json::to_value(&rows[0]).unwrap();
        assert_eq!(json["candidateId"], "c1");
        assert_eq!(json["candidateName"], "Candidate c1");
        assert_eq!(json["votes"], 2);
        assert_eq!(json["percentage"], 100.0);
    }
}
