use super::types::{Inputs, YearSnapshot, YearTrace};

/// Flat marginal rate applied to both dividend income and the investment-loan
/// interest deduction.
pub const MARGINAL_TAX_RATE: f64 = 0.37;

const MONTHS_PER_YEAR: u32 = 12;

/// Balances of both scenarios at a year boundary. Each simulated year
/// consumes one of these and produces the next.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ScenarioState {
    mortgage_without: f64,
    mortgage_with: f64,
    investment_without: f64,
    investment_with: f64,
}

impl ScenarioState {
    fn opening(inputs: &Inputs) -> Self {
        Self {
            mortgage_without: inputs.mortgage_balance,
            mortgage_with: inputs.mortgage_balance,
            investment_without: inputs.existing_investment,
            investment_with: inputs.new_investment_amount,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct StrategyCashflow {
    gross_dividends: f64,
    dividend_tax: f64,
    net_dividends: f64,
    tax_savings: f64,
    extra_repayment: f64,
}

#[derive(Debug, Clone, Copy)]
struct LoanTerms {
    monthly_rate: f64,
    payment: f64,
    investment_loan_principal: f64,
}

impl LoanTerms {
    fn from_inputs(inputs: &Inputs) -> Self {
        Self {
            monthly_rate: inputs.mortgage_rate / 100.0 / 12.0,
            payment: monthly_payment(
                inputs.mortgage_balance,
                inputs.mortgage_rate / 100.0,
                inputs.loan_term,
            ),
            investment_loan_principal: inputs.investment_loan_principal(),
        }
    }
}

/// Level monthly payment that clears `principal` over `years` at
/// `annual_rate` (a fraction, not a percentage).
///
/// No guard for a zero rate or zero term: the result is NaN or infinite and
/// the caller sees it propagate.
pub fn monthly_payment(principal: f64, annual_rate: f64, years: i32) -> f64 {
    let monthly_rate = annual_rate / 12.0;
    let payments = f64::from(years) * f64::from(MONTHS_PER_YEAR);
    let compounded = (1.0 + monthly_rate).powf(payments);
    principal * monthly_rate * compounded / (compounded - 1.0)
}

/// Runs twelve monthly repayments against `balance`, each paying `payment`
/// plus `extra_monthly` on top of the interest-adjusted principal.
pub fn amortize_year(balance: f64, monthly_rate: f64, payment: f64, extra_monthly: f64) -> f64 {
    (0..MONTHS_PER_YEAR).fold(balance, |balance, _| {
        let interest = balance * monthly_rate;
        let principal_portion = payment - interest;
        floor_at_zero(balance - (principal_portion + extra_monthly))
    })
}

// NaN must survive the floor, so no f64::max here.
fn floor_at_zero(value: f64) -> f64 {
    if value < 0.0 { 0.0 } else { value }
}

fn grow_investment(inputs: &Inputs, value: f64) -> f64 {
    value * (1.0 + inputs.growth_rate / 100.0) + inputs.monthly_contribution * 12.0
}

fn strategy_cashflow(
    inputs: &Inputs,
    terms: &LoanTerms,
    investment_with: f64,
) -> StrategyCashflow {
    let gross_dividends = investment_with * (inputs.dividend_rate / 100.0);
    let dividend_tax = gross_dividends * MARGINAL_TAX_RATE;
    let net_dividends = gross_dividends - dividend_tax;
    let tax_savings = (inputs.investment_loan_rate / 100.0)
        * terms.investment_loan_principal
        * MARGINAL_TAX_RATE;

    StrategyCashflow {
        gross_dividends,
        dividend_tax,
        net_dividends,
        tax_savings,
        extra_repayment: tax_savings + net_dividends,
    }
}

fn advance_year(
    inputs: &Inputs,
    terms: &LoanTerms,
    state: ScenarioState,
) -> (ScenarioState, StrategyCashflow) {
    let mortgage_without = amortize_year(
        state.mortgage_without,
        terms.monthly_rate,
        terms.payment,
        0.0,
    );
    let investment_without = grow_investment(inputs, state.investment_without);

    // Dividends are earned on the balance before this year's growth.
    let cashflow = strategy_cashflow(inputs, terms, state.investment_with);
    let investment_with = grow_investment(inputs, state.investment_with) + cashflow.net_dividends;
    let mortgage_with = amortize_year(
        state.mortgage_with,
        terms.monthly_rate,
        terms.payment,
        cashflow.extra_repayment / 12.0,
    );

    let next = ScenarioState {
        mortgage_without,
        mortgage_with,
        investment_without,
        investment_with,
    };
    (next, cashflow)
}

/// Year-by-year state of both scenarios for years `0..=loan_term`.
///
/// The first row already includes one year of amortization and growth: the
/// update for a year runs before that year is recorded. A negative term
/// yields no rows.
pub fn run_yearly_trace(inputs: &Inputs) -> Vec<YearTrace> {
    let terms = LoanTerms::from_inputs(inputs);
    let capacity = usize::try_from(inputs.loan_term)
        .map(|term| term + 1)
        .unwrap_or(0);

    let (_, rows) = (0..=inputs.loan_term).fold(
        (ScenarioState::opening(inputs), Vec::with_capacity(capacity)),
        |(state, mut rows), year| {
            let (next, cashflow) = advance_year(inputs, &terms, state);
            rows.push(YearTrace {
                year: year as u32,
                investment_without_strategy: next.investment_without,
                investment_with_strategy: next.investment_with,
                mortgage_without_strategy: next.mortgage_without,
                mortgage_with_strategy: next.mortgage_with,
                gross_dividends: cashflow.gross_dividends,
                dividend_tax: cashflow.dividend_tax,
                net_dividends: cashflow.net_dividends,
                tax_savings: cashflow.tax_savings,
                extra_repayment: cashflow.extra_repayment,
            });
            (next, rows)
        },
    );
    rows
}

pub fn project(inputs: &Inputs) -> Vec<YearSnapshot> {
    let principal = inputs.investment_loan_principal();
    run_yearly_trace(inputs)
        .iter()
        .map(|row| snapshot_from_trace(row, principal))
        .collect()
}

fn snapshot_from_trace(row: &YearTrace, investment_loan_principal: f64) -> YearSnapshot {
    YearSnapshot {
        year: row.year,
        net_assets_without_strategy: row.investment_without_strategy
            - row.mortgage_without_strategy,
        net_assets_with_strategy: row.investment_with_strategy
            - row.mortgage_with_strategy
            - investment_loan_principal,
        non_deductible_debt_without_strategy: row.mortgage_without_strategy,
        non_deductible_debt_with_strategy: row.mortgage_with_strategy,
    }
}
