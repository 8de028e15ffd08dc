use std::fmt;

use serde::Serialize;

/// Assumptions for one projection. Rates are annual percentages (4.5 means 4.5%).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Inputs {
    /// Carried for interface compatibility; the projection never reads it.
    pub annual_salary: f64,
    pub existing_investment: f64,
    pub new_investment_amount: f64,
    pub monthly_contribution: f64,
    pub mortgage_balance: f64,
    pub existing_investment_loan_balance: f64,
    pub new_investment_loan_balance: f64,
    pub mortgage_rate: f64,
    pub investment_loan_rate: f64,
    pub loan_term: i32,
    pub growth_rate: f64,
    pub dividend_rate: f64,
}

impl Inputs {
    pub fn investment_loan_principal(&self) -> f64 {
        self.existing_investment_loan_balance + self.new_investment_loan_balance
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearSnapshot {
    pub year: u32,
    pub net_assets_without_strategy: f64,
    pub net_assets_with_strategy: f64,
    pub non_deductible_debt_without_strategy: f64,
    pub non_deductible_debt_with_strategy: f64,
}

/// End-of-year state of both scenarios plus the strategy cashflows that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearTrace {
    pub year: u32,
    pub investment_without_strategy: f64,
    pub investment_with_strategy: f64,
    pub mortgage_without_strategy: f64,
    pub mortgage_with_strategy: f64,
    pub gross_dividends: f64,
    pub dividend_tax: f64,
    pub net_dividends: f64,
    pub tax_savings: f64,
    pub extra_repayment: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum DebtFreedom {
    Reached { year: u32 },
    NotReached,
}

impl DebtFreedom {
    pub fn year(self) -> Option<u32> {
        match self {
            DebtFreedom::Reached { year } => Some(year),
            DebtFreedom::NotReached => None,
        }
    }
}

impl fmt::Display for DebtFreedom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DebtFreedom::Reached { year: 1 } => write!(f, "1 year"),
            DebtFreedom::Reached { year } => write!(f, "{year} years"),
            DebtFreedom::NotReached => write!(f, "not within the loan term"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionSummary {
    pub monthly_payment: f64,
    pub investment_loan_principal: f64,
    pub additional_wealth: f64,
    pub debt_freedom: DebtFreedom,
    pub debt_freedom_without_strategy: DebtFreedom,
    pub final_year: YearSnapshot,
}
