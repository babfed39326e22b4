//! Recommends how to spread new stake over staking pools
//!
//! The stake is handed out in equal slices. Every slice goes to the pool whose
//! stake is currently the smallest relative to the fees it generates, weighted
//! by how much of the rewards its operator keeps. Later slices see the stake
//! added by earlier ones, so a large amount spreads over several pools.

use std::collections::HashSet;

use rust_decimal::Decimal;
use tracing::{debug, info};

use super::AllocationOptions;
use crate::shared::errors::StakingError;
use crate::shared::types::{PoolStat, StakingRecommendation};
use crate::shared::utils::{checked_pow, checked_sum, share_of, truncate_to_display};

/// Iterative Cobb-Douglas allocator
#[derive(Debug, Clone, Default)]
pub struct StakingAllocator {
    options: AllocationOptions,
}

impl StakingAllocator {
    pub fn new(options: AllocationOptions) -> Result<Self, StakingError> {
        options.validate()?;
        Ok(Self { options })
    }

    /// Split `amount_to_stake` (truncated to the display decimals) over `pools`.
    ///
    /// The returned amounts always sum exactly to the truncated amount and are
    /// sorted largest first. Zero stake or no pools yield an empty list.
    pub fn allocate(
        &self,
        amount_to_stake: Decimal,
        pools: &[PoolStat],
    ) -> Result<Vec<StakingRecommendation>, StakingError> {
        if amount_to_stake.is_sign_negative() && !amount_to_stake.is_zero() {
            return Err(StakingError::InvalidAmount(amount_to_stake));
        }
        validate_pools(pools)?;

        let target = truncate_to_display(amount_to_stake);
        if pools.is_empty() || target.is_zero() {
            return Ok(Vec::new());
        }

        let operator_weights = pools
            .iter()
            .map(|pool| self.operator_weight(pool))
            .collect::<Result<Vec<_>, _>>()?;

        let slice = target
            .checked_div(Decimal::from(self.options.num_iterations))
            .ok_or(StakingError::ArithmeticOverflow("stake slice"))?;

        // Working stake per pool; the caller's pools stay untouched
        let mut working_stake: Vec<Decimal> = pools.iter().map(|p| p.zrx_staked).collect();
        let total_fees = checked_sum(pools.iter().map(|p| p.recent_fees_generated_in_eth), "total fees")?;
        // (pool index, allocated amount) in order of first allocation
        let mut allocated: Vec<(usize, Decimal)> = Vec::new();

        for iteration in 0..self.options.num_iterations {
            let total_stake = checked_sum(working_stake.iter().copied(), "total stake")?;
            let (chosen, adjusted_ratio) =
                least_crowded_pool(pools, &working_stake, &operator_weights, total_stake, total_fees)?;

            working_stake[chosen] = working_stake[chosen]
                .checked_add(slice)
                .ok_or(StakingError::ArithmeticOverflow("working stake"))?;
            match allocated.iter_mut().find(|(index, _)| *index == chosen) {
                Some((_, amount)) => {
                    *amount = amount
                        .checked_add(slice)
                        .ok_or(StakingError::ArithmeticOverflow("allocated amount"))?
                }
                None => allocated.push((chosen, slice)),
            }

            debug!(
                iteration,
                pool_id = %pools[chosen].pool_id,
                adjusted_ratio = ?adjusted_ratio,
                slice = %slice,
                "allocated stake slice"
            );
        }

        let mut recommendations: Vec<StakingRecommendation> = allocated
            .into_iter()
            .map(|(index, amount)| StakingRecommendation {
                pool_id: pools[index].pool_id.clone(),
                zrx_amount: truncate_to_display(amount),
            })
            .collect();
        // Stable sort: equal amounts keep first-allocation order
        recommendations.sort_by(|a, b| b.zrx_amount.cmp(&a.zrx_amount));
        reconcile(&mut recommendations, target)?;

        info!(
            "📊 Recommended {} across {} of {} pools",
            target,
            recommendations.len(),
            pools.len()
        );
        Ok(recommendations)
    }

    /// `((1 - alpha) / (1 - operator_share)) ^ (1 / alpha)`
    fn operator_weight(&self, pool: &PoolStat) -> Result<Decimal, StakingError> {
        let alpha = self.options.alpha;
        let base = (Decimal::ONE - alpha)
            .checked_div(Decimal::ONE - pool.operator_share)
            .ok_or(StakingError::ArithmeticOverflow("operator weight"))?;
        let exponent = Decimal::ONE
            .checked_div(alpha)
            .ok_or(StakingError::ArithmeticOverflow("operator weight"))?;
        checked_pow(base, exponent, "operator weight")
    }
}

/// Split `amount_to_stake` with the given options, or the protocol defaults
pub fn get_recommended_staking_pools(
    amount_to_stake: Decimal,
    pools: &[PoolStat],
    options: Option<AllocationOptions>,
) -> Result<Vec<StakingRecommendation>, StakingError> {
    StakingAllocator::new(options.unwrap_or_default())?.allocate(amount_to_stake, pools)
}

fn validate_pools(pools: &[PoolStat]) -> Result<(), StakingError> {
    let mut seen = HashSet::with_capacity(pools.len());
    for pool in pools {
        if !seen.insert(pool.pool_id.as_str()) {
            return Err(StakingError::invalid_pool(&pool.pool_id, "duplicate pool id"));
        }
        if pool.operator_share.is_sign_negative() && !pool.operator_share.is_zero() {
            return Err(StakingError::invalid_pool(&pool.pool_id, "negative operator share"));
        }
        if pool.operator_share >= Decimal::ONE {
            return Err(StakingError::invalid_pool(
                &pool.pool_id,
                format!("operator share {} leaves nothing to members", pool.operator_share),
            ));
        }
        if pool.zrx_staked.is_sign_negative() && !pool.zrx_staked.is_zero() {
            return Err(StakingError::invalid_pool(&pool.pool_id, "negative stake"));
        }
        if pool.recent_fees_generated_in_eth.is_sign_negative()
            && !pool.recent_fees_generated_in_eth.is_zero()
        {
            return Err(StakingError::invalid_pool(&pool.pool_id, "negative fees"));
        }
    }
    Ok(())
}

/// Index of the pool with the lowest adjusted stake ratio; the first one wins ties.
/// `pools` must not be empty.
///
/// A pool without fees while others have some has no finite ratio (`None`)
/// and loses against every pool that has one.
fn least_crowded_pool(
    pools: &[PoolStat],
    working_stake: &[Decimal],
    operator_weights: &[Decimal],
    total_stake: Decimal,
    total_fees: Decimal,
) -> Result<(usize, Option<Decimal>), StakingError> {
    let ratio_of = |index: usize| -> Result<Option<Decimal>, StakingError> {
        let stake_share = share_of(working_stake[index], total_stake, Decimal::ZERO)?;
        let fee_share = share_of(pools[index].recent_fees_generated_in_eth, total_fees, Decimal::ONE)?;
        if fee_share.is_zero() {
            return Ok(None);
        }
        let stake_ratio = stake_share
            .checked_div(fee_share)
            .ok_or(StakingError::ArithmeticOverflow("stake ratio"))?;
        operator_weights[index]
            .checked_mul(stake_ratio)
            .map(Some)
            .ok_or(StakingError::ArithmeticOverflow("adjusted stake ratio"))
    };

    let mut best = (0, ratio_of(0)?);
    for index in 1..pools.len() {
        let adjusted = ratio_of(index)?;
        let is_better = match (best.1, adjusted) {
            (Some(current), Some(candidate)) => candidate < current,
            (None, Some(_)) => true,
            (_, None) => false,
        };
        if is_better {
            best = (index, adjusted);
        }
    }
    Ok(best)
}

/// Push whatever truncation left over onto the largest recommendation
fn reconcile(recommendations: &mut [StakingRecommendation], target: Decimal) -> Result<(), StakingError> {
    let distributed = checked_sum(recommendations.iter().map(|r| r.zrx_amount), "distributed amount")?;
    let difference = target
        .checked_sub(distributed)
        .ok_or(StakingError::ArithmeticOverflow("rounding difference"))?;
    if difference.is_zero() {
        return Ok(());
    }
    if let Some(top) = recommendations.first_mut() {
        debug!(pool_id = %top.pool_id, difference = %difference, "reconciled rounding difference");
        let reconciled = top
            .zrx_amount
            .checked_add(difference)
            .ok_or(StakingError::ArithmeticOverflow("rounding difference"))?;
        top.zrx_amount = truncate_to_display(reconciled);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    /// Pool set shaped like a live staking pool listing
    fn sample_pools() -> Vec<PoolStat> {
        vec![
            PoolStat::new("1", dec!(0.10), dec!(3_529_071.62), dec!(8.391)),
            PoolStat::new("2", dec!(0.05), dec!(1_287_112.17), dec!(1.274)),
            PoolStat::new("3", dec!(0.20), dec!(12_481_553.90), dec!(35.902)),
            PoolStat::new("4", dec!(0.00), dec!(412_007.04), dec!(0.388)),
            PoolStat::new("5", dec!(0.15), dec!(6_994_215.33), dec!(11.057)),
            PoolStat::new("6", dec!(0.30), dec!(240_000), dec!(0)),
            PoolStat::new("7", dec!(0.08), dec!(2_010_500.50), dec!(5.420)),
        ]
    }

    fn total(recommendations: &[StakingRecommendation]) -> Decimal {
        recommendations.iter().map(|r| r.zrx_amount).sum()
    }

    #[test]
    fn test_allocation_sums_to_requested_amount() {
        let recommendations = get_recommended_staking_pools(dec!(470), &sample_pools(), None).unwrap();
        assert!(!recommendations.is_empty());
        assert_eq!(total(&recommendations), dec!(470));
    }

    #[test]
    fn test_large_amount_has_no_drift() {
        let recommendations =
            get_recommended_staking_pools(dec!(123456789.12), &sample_pools(), None).unwrap();
        assert_eq!(total(&recommendations), dec!(123456789.12));
    }

    #[test]
    fn test_excess_precision_is_truncated() {
        let recommendations =
            get_recommended_staking_pools(dec!(1277.12999), &sample_pools(), None).unwrap();
        assert_eq!(total(&recommendations), dec!(1277.12));
    }

    #[test]
    fn test_conservation_across_amounts_and_iterations() {
        let pools = sample_pools();
        let amounts = [
            dec!(0.01),
            dec!(0.02),
            dec!(1),
            dec!(10.1),
            dec!(333.33),
            dec!(1000000),
            dec!(98765432.10),
        ];
        for num_iterations in [1, 2, 3, 7, 10] {
            let allocator = StakingAllocator::new(AllocationOptions {
                num_iterations,
                ..Default::default()
            })
            .unwrap();
            for amount in amounts {
                let recommendations = allocator.allocate(amount, &pools).unwrap();
                assert_eq!(total(&recommendations), amount, "amount {} / {} iterations", amount, num_iterations);
                assert!(recommendations.iter().all(|r| !r.zrx_amount.is_sign_negative()));
                assert!(recommendations.windows(2).all(|w| w[0].zrx_amount >= w[1].zrx_amount));
            }
        }
    }

    #[test]
    fn test_zero_amount_returns_empty() {
        assert!(get_recommended_staking_pools(Decimal::ZERO, &sample_pools(), None).unwrap().is_empty());
        // truncates to zero as well
        assert!(get_recommended_staking_pools(dec!(0.009), &sample_pools(), None).unwrap().is_empty());
    }

    #[test]
    fn test_no_pools_returns_empty() {
        assert!(get_recommended_staking_pools(dec!(470), &[], None).unwrap().is_empty());
    }

    #[test]
    fn test_single_pool_takes_everything() {
        let pools = vec![PoolStat::new("solo", dec!(0.5), dec!(1000), dec!(2))];
        let recommendations = get_recommended_staking_pools(dec!(99.999), &pools, None).unwrap();
        assert_eq!(
            recommendations,
            vec![StakingRecommendation {
                pool_id: "solo".to_string(),
                zrx_amount: dec!(99.99),
            }]
        );
    }

    #[test]
    fn test_ties_go_to_first_pool_in_input_order() {
        let pools = vec![
            PoolStat::new("a", dec!(0.1), dec!(1000), dec!(1)),
            PoolStat::new("b", dec!(0.1), dec!(1000), dec!(1)),
        ];
        let one_slice = StakingAllocator::new(AllocationOptions {
            num_iterations: 1,
            ..Default::default()
        })
        .unwrap();
        let recommendations = one_slice.allocate(dec!(300), &pools).unwrap();
        assert_eq!(recommendations.len(), 1);
        assert_eq!(recommendations[0].pool_id, "a");

        // The second slice sees pool "a" as more crowded
        let two_slices = StakingAllocator::new(AllocationOptions {
            num_iterations: 2,
            ..Default::default()
        })
        .unwrap();
        let recommendations = two_slices.allocate(dec!(300), &pools).unwrap();
        let ids: Vec<&str> = recommendations.iter().map(|r| r.pool_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert!(recommendations.iter().all(|r| r.zrx_amount == dec!(150)));
    }

    #[test]
    fn test_repeated_picks_are_accumulated() {
        let pools = vec![
            PoolStat::new("big", dec!(0.1), dec!(10), dec!(50)),
            PoolStat::new("small", dec!(0.1), dec!(1_000_000), dec!(1)),
        ];
        let recommendations = get_recommended_staking_pools(dec!(90), &pools, None).unwrap();
        assert_eq!(recommendations.len(), 1);
        assert_eq!(recommendations[0].pool_id, "big");
        assert_eq!(recommendations[0].zrx_amount, dec!(90));
    }

    #[test]
    fn test_lower_operator_share_is_preferred() {
        let pools = vec![
            PoolStat::new("greedy", dec!(0.5), dec!(1000), dec!(1)),
            PoolStat::new("generous", dec!(0.1), dec!(1000), dec!(1)),
        ];
        let allocator = StakingAllocator::new(AllocationOptions {
            num_iterations: 1,
            ..Default::default()
        })
        .unwrap();
        let recommendations = allocator.allocate(dec!(10), &pools).unwrap();
        assert_eq!(recommendations[0].pool_id, "generous");
    }

    #[test]
    fn test_pool_without_fees_is_skipped_when_others_earn() {
        let pools = vec![
            PoolStat::new("idle", dec!(0), dec!(0), dec!(0)),
            PoolStat::new("busy", dec!(0.1), dec!(5_000_000), dec!(3)),
        ];
        let recommendations = get_recommended_staking_pools(dec!(1000), &pools, None).unwrap();
        assert_eq!(recommendations.len(), 1);
        assert_eq!(recommendations[0].pool_id, "busy");
    }

    #[test]
    fn test_no_fees_anywhere_falls_back_to_stake() {
        let pools = vec![
            PoolStat::new("crowded", dec!(0.1), dec!(100_000), dec!(0)),
            PoolStat::new("quiet", dec!(0.1), dec!(10), dec!(0)),
        ];
        let allocator = StakingAllocator::new(AllocationOptions {
            num_iterations: 1,
            ..Default::default()
        })
        .unwrap();
        let recommendations = allocator.allocate(dec!(50), &pools).unwrap();
        assert_eq!(recommendations[0].pool_id, "quiet");
    }

    #[test]
    fn test_input_pools_are_not_modified() {
        let pools = sample_pools();
        let before = pools.clone();
        get_recommended_staking_pools(dec!(5_000_000), &pools, None).unwrap();
        assert_eq!(pools, before);
    }

    #[test]
    fn test_full_operator_share_is_rejected() {
        let mut pools = sample_pools();
        pools.push(PoolStat::new("owner-takes-all", dec!(1), dec!(100), dec!(1)));
        let err = get_recommended_staking_pools(dec!(470), &pools, None).unwrap_err();
        assert!(matches!(
            err,
            StakingError::InvalidPoolConfiguration { ref pool_id, .. } if pool_id == "owner-takes-all"
        ));
    }

    #[test]
    fn test_negative_values_are_rejected() {
        let negative_stake = vec![PoolStat::new("x", dec!(0.1), dec!(-1), dec!(1))];
        assert!(get_recommended_staking_pools(dec!(10), &negative_stake, None).is_err());

        let negative_fees = vec![PoolStat::new("x", dec!(0.1), dec!(1), dec!(-0.5))];
        assert!(get_recommended_staking_pools(dec!(10), &negative_fees, None).is_err());

        assert_eq!(
            get_recommended_staking_pools(dec!(-5), &sample_pools(), None).unwrap_err(),
            StakingError::InvalidAmount(dec!(-5))
        );
    }

    #[test]
    fn test_duplicate_pool_ids_are_rejected() {
        let pools = vec![
            PoolStat::new("dup", dec!(0.1), dec!(1), dec!(1)),
            PoolStat::new("dup", dec!(0.2), dec!(2), dec!(2)),
        ];
        assert!(matches!(
            get_recommended_staking_pools(dec!(10), &pools, None),
            Err(StakingError::InvalidPoolConfiguration { .. })
        ));
    }

    #[test]
    fn test_default_allocator_uses_protocol_options() {
        let pools = sample_pools();
        assert_eq!(
            StakingAllocator::default().allocate(dec!(470), &pools).unwrap(),
            get_recommended_staking_pools(dec!(470), &pools, None).unwrap()
        );
    }

    #[test]
    fn test_stake_overflow_is_an_error() {
        let pools = vec![
            PoolStat::new("a", dec!(0.1), Decimal::MAX - dec!(1), dec!(1)),
            PoolStat::new("b", dec!(0.1), Decimal::MAX - dec!(1), dec!(1)),
        ];
        assert!(matches!(
            get_recommended_staking_pools(dec!(10), &pools, None),
            Err(StakingError::ArithmeticOverflow(_))
        ));

        // the total fits, but adding a slice to the pool does not
        let full = vec![PoolStat::new("full", dec!(0.1), Decimal::MAX - dec!(1), dec!(1))];
        assert_eq!(
            get_recommended_staking_pools(dec!(10), &full, None).unwrap_err(),
            StakingError::ArithmeticOverflow("working stake")
        );
    }

    #[test]
    fn test_fee_overflow_is_an_error() {
        let pools = vec![
            PoolStat::new("a", dec!(0.1), dec!(100), Decimal::MAX),
            PoolStat::new("b", dec!(0.1), dec!(100), Decimal::MAX),
        ];
        assert_eq!(
            get_recommended_staking_pools(dec!(10), &pools, None).unwrap_err(),
            StakingError::ArithmeticOverflow("total fees")
        );
    }

    #[test]
    fn test_reconcile_adds_difference_to_top() {
        let mut recommendations = vec![
            StakingRecommendation { pool_id: "a".to_string(), zrx_amount: dec!(156.66) },
            StakingRecommendation { pool_id: "b".to_string(), zrx_amount: dec!(156.66) },
            StakingRecommendation { pool_id: "c".to_string(), zrx_amount: dec!(156.66) },
        ];
        reconcile(&mut recommendations, dec!(470)).unwrap();
        assert_eq!(recommendations[0].zrx_amount, dec!(156.68));
        assert_eq!(total(&recommendations), dec!(470));
    }
}
