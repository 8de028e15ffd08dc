use super::engine::monthly_payment;
use super::types::{DebtFreedom, Inputs, ProjectionSummary, YearSnapshot};

/// Final-year net worth of the strategy over the baseline.
pub fn additional_wealth(snapshots: &[YearSnapshot]) -> Option<f64> {
    snapshots
        .last()
        .map(|last| last.net_assets_with_strategy - last.net_assets_without_strategy)
}

/// First year whose strategy mortgage balance has reached zero.
pub fn years_to_debt_freedom(snapshots: &[YearSnapshot]) -> DebtFreedom {
    first_debt_free_year(snapshots, |s| s.non_deductible_debt_with_strategy)
}

pub fn years_to_debt_freedom_without_strategy(snapshots: &[YearSnapshot]) -> DebtFreedom {
    first_debt_free_year(snapshots, |s| s.non_deductible_debt_without_strategy)
}

fn first_debt_free_year(
    snapshots: &[YearSnapshot],
    debt: impl Fn(&YearSnapshot) -> f64,
) -> DebtFreedom {
    snapshots
        .iter()
        .position(|s| debt(s) <= 0.0)
        .map(|idx| DebtFreedom::Reached { year: idx as u32 })
        .unwrap_or(DebtFreedom::NotReached)
}

pub fn summarize(inputs: &Inputs, snapshots: &[YearSnapshot]) -> Option<ProjectionSummary> {
    let final_year = *snapshots.last()?;
    let additional_wealth = additional_wealth(snapshots)?;
    Some(ProjectionSummary {
        monthly_payment: monthly_payment(
            inputs.mortgage_balance,
            inputs.mortgage_rate / 100.0,
            inputs.loan_term,
        ),
        investment_loan_principal: inputs.investment_loan_principal(),
        additional_wealth,
        debt_freedom: years_to_debt_freedom(snapshots),
        debt_freedom_without_strategy: years_to_debt_freedom_without_strategy(snapshots),
        final_year,
    })
}
