//! Reconciliation matcher.
//!
//! Matching is planned as a pure function over (extract order, open-claim
//! snapshot) and then applied through the store's guarded transition, so the
//! same plan entry can lose a race against a concurrent run and simply fall
//! back to unmatched. Re-running an interrupted import is safe: closed claims
//! drop out of the snapshot and cannot be consumed twice.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use uuid::Uuid;

use crate::db::queries;
use crate::domain::{BankTransaction, PaymentClaim};
use crate::error::AppError;
use crate::extract::{ParsedExtract, RowError};
use crate::services::store::PaymentRecordStore;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MatchedPair {
    pub claim_id: Uuid,
    pub transaction_id: String,
}

#[derive(Debug, Default, Serialize)]
pub struct ReconciliationReport {
    pub matched: Vec<MatchedPair>,
    pub unmatched: Vec<String>,
    pub ambiguous: Vec<String>,
    pub already_matched: Vec<String>,
    pub row_errors: Vec<RowError>,
}

/// The slice of a claim the planner needs.
#[derive(Debug, Clone)]
pub struct ClaimCandidate {
    pub id: Uuid,
    pub amount: BigDecimal,
    pub created_at: DateTime<Utc>,
}

impl From<&PaymentClaim> for ClaimCandidate {
    fn from(claim: &PaymentClaim) -> Self {
        Self {
            id: claim.id,
            amount: claim.amount.clone(),
            created_at: claim.created_at,
        }
    }
}

#[derive(Debug, Default)]
pub struct MatchPlan {
    pub pairs: Vec<MatchedPair>,
    pub unmatched: Vec<String>,
    pub ambiguous: Vec<String>,
}

/// Plans matches for one run. `candidates` must be sorted oldest-first with
/// id as tie-break; the winner for each transaction is then simply the first
/// unconsumed candidate within epsilon. A transaction whose winner ties on
/// age with another eligible claim still matches deterministically but is
/// flagged ambiguous for manual review.
pub fn plan_matches(
    transactions: &[BankTransaction],
    candidates: &[ClaimCandidate],
    epsilon: &BigDecimal,
) -> MatchPlan {
    let mut plan = MatchPlan::default();
    let mut consumed: HashSet<Uuid> = HashSet::new();

    for tx in transactions {
        let eligible: Vec<&ClaimCandidate> = candidates
            .iter()
            .filter(|c| !consumed.contains(&c.id))
            .filter(|c| amounts_match(&c.amount, &tx.amount, epsilon))
            .collect();

        match eligible.first() {
            Some(winner) => {
                consumed.insert(winner.id);
                if eligible
                    .iter()
                    .skip(1)
                    .any(|c| c.created_at == winner.created_at)
                {
                    plan.ambiguous.push(tx.external_id.clone());
                }
                plan.pairs.push(MatchedPair {
                    claim_id: winner.id,
                    transaction_id: tx.external_id.clone(),
                });
            }
            None => plan.unmatched.push(tx.external_id.clone()),
        }
    }

    plan
}

fn amounts_match(a: &BigDecimal, b: &BigDecimal, epsilon: &BigDecimal) -> bool {
    (a - b).abs() <= *epsilon
}

#[derive(Clone)]
pub struct ReconciliationMatcher {
    store: PaymentRecordStore,
    epsilon: BigDecimal,
}

impl ReconciliationMatcher {
    pub fn new(store: PaymentRecordStore, epsilon: BigDecimal) -> Self {
        Self { store, epsilon }
    }

    /// Runs one reconciliation pass over a parsed extract.
    pub async fn run(&self, extract: ParsedExtract) -> Result<ReconciliationReport, AppError> {
        let snapshot = self.store.open_snapshot().await?;
        let candidates: Vec<ClaimCandidate> = snapshot.iter().map(ClaimCandidate::from).collect();

        let plan = plan_matches(&extract.transactions, &candidates, &self.epsilon);

        let mut report = ReconciliationReport {
            ambiguous: plan.ambiguous,
            row_errors: extract.row_errors,
            ..Default::default()
        };
        let mut unmatched = plan.unmatched;

        for pair in plan.pairs {
            match self
                .store
                .complete_from_match(pair.claim_id, &pair.transaction_id)
                .await
            {
                Ok(_) => report.matched.push(pair),
                Err(AppError::Conflict(_)) | Err(AppError::NotFound(_)) => {
                    // A concurrent run or a staff confirm got there first.
                    tracing::warn!(
                        claim_id = %pair.claim_id,
                        transaction_id = %pair.transaction_id,
                        "planned match lost the transition race"
                    );
                    unmatched.push(pair.transaction_id);
                }
                Err(e) => return Err(e),
            }
        }

        // Split stale re-imports from genuinely new unmatched rows.
        for transaction_id in unmatched {
            let seen =
                queries::claim_id_for_external_txn(self.store.pool(), &transaction_id).await?;
            if seen.is_some() {
                report.already_matched.push(transaction_id);
            } else {
                report.unmatched.push(transaction_id);
            }
        }

        tracing::info!(
            matched = report.matched.len(),
            unmatched = report.unmatched.len(),
            ambiguous = report.ambiguous.len(),
            already_matched = report.already_matched.len(),
            row_errors = report.row_errors.len(),
            "reconciliation run finished"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, Utc};

    fn tx(id: &str, amount: &str) -> BankTransaction {
        BankTransaction {
            date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            description: "ZELLE PAYMENT".to_string(),
            amount: amount.parse().unwrap(),
            external_id: id.to_string(),
        }
    }

    fn candidate(amount: &str, age_minutes: i64) -> ClaimCandidate {
        ClaimCandidate {
            id: Uuid::new_v4(),
            amount: amount.parse().unwrap(),
            created_at: Utc::now() - Duration::minutes(age_minutes),
        }
    }

    fn sort_candidates(mut candidates: Vec<ClaimCandidate>) -> Vec<ClaimCandidate> {
        candidates.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        candidates
    }

    fn epsilon() -> BigDecimal {
        "0.01".parse().unwrap()
    }

    #[test]
    fn exact_amount_matches_oldest_claim() {
        let old = candidate("150.00", 120);
        let new = candidate("150.00", 5);
        let old_id = old.id;
        let candidates = sort_candidates(vec![new, old]);

        let plan = plan_matches(&[tx("TXN555", "150.00")], &candidates, &epsilon());

        assert_eq!(plan.pairs.len(), 1);
        assert_eq!(plan.pairs[0].claim_id, old_id);
        assert!(plan.unmatched.is_empty());
    }

    #[test]
    fn within_epsilon_counts_as_a_match() {
        let claim = candidate("150.00", 60);
        let candidates = vec![claim];

        let plan = plan_matches(&[tx("T1", "150.01")], &candidates, &epsilon());
        assert_eq!(plan.pairs.len(), 1);

        let plan = plan_matches(&[tx("T2", "150.02")], &candidates, &epsilon());
        assert!(plan.pairs.is_empty());
        assert_eq!(plan.unmatched, vec!["T2".to_string()]);
    }

    #[test]
    fn claim_is_consumed_by_at_most_one_transaction() {
        let claim = candidate("89.00", 60);
        let candidates = vec![claim];

        let plan = plan_matches(
            &[tx("T1", "89.00"), tx("T2", "89.00")],
            &candidates,
            &epsilon(),
        );

        assert_eq!(plan.pairs.len(), 1);
        assert_eq!(plan.pairs[0].transaction_id, "T1");
        assert_eq!(plan.unmatched, vec!["T2".to_string()]);
    }

    #[test]
    fn match_count_is_bounded_by_min_of_sides() {
        let candidates = sort_candidates(vec![
            candidate("10.00", 30),
            candidate("10.00", 20),
            candidate("10.00", 10),
        ]);
        let transactions: Vec<BankTransaction> = (0..5)
            .map(|i| tx(&format!("T{}", i), "10.00"))
            .collect();

        let plan = plan_matches(&transactions, &candidates, &epsilon());

        assert_eq!(plan.pairs.len(), 3);
        assert_eq!(plan.unmatched.len(), 2);
    }

    #[test]
    fn equal_age_tie_is_flagged_ambiguous_and_broken_by_id() {
        let created = Utc::now() - Duration::minutes(60);
        let mut a = candidate("25.00", 0);
        let mut b = candidate("25.00", 0);
        a.created_at = created;
        b.created_at = created;
        let candidates = sort_candidates(vec![a, b]);
        let expected_winner = candidates[0].id;

        let plan = plan_matches(&[tx("T1", "25.00")], &candidates, &epsilon());

        assert_eq!(plan.pairs[0].claim_id, expected_winner);
        assert_eq!(plan.ambiguous, vec!["T1".to_string()]);
    }

    #[test]
    fn different_ages_are_not_ambiguous() {
        let candidates = sort_candidates(vec![candidate("25.00", 90), candidate("25.00", 10)]);

        let plan = plan_matches(&[tx("T1", "25.00")], &candidates, &epsilon());

        assert_eq!(plan.pairs.len(), 1);
        assert!(plan.ambiguous.is_empty());
    }

    #[test]
    fn transactions_are_processed_in_extract_order() {
        let older = candidate("40.00", 90);
        let newer = candidate("40.00", 10);
        let (older_id, newer_id) = (older.id, newer.id);
        let candidates = sort_candidates(vec![newer, older]);

        let plan = plan_matches(
            &[tx("FIRST", "40.00"), tx("SECOND", "40.00")],
            &candidates,
            &epsilon(),
        );

        assert_eq!(plan.pairs[0].transaction_id, "FIRST");
        assert_eq!(plan.pairs[0].claim_id, older_id);
        assert_eq!(plan.pairs[1].transaction_id, "SECOND");
        assert_eq!(plan.pairs[1].claim_id, newer_id);
    }

    #[test]
    fn empty_snapshot_leaves_everything_unmatched() {
        let plan = plan_matches(&[tx("T1", "5.00"), tx("T2", "6.00")], &[], &epsilon());

        assert!(plan.pairs.is_empty());
        assert_eq!(plan.unmatched.len(), 2);
    }
}
