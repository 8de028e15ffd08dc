mod engine;
mod format;
mod summary;
mod types;

pub use engine::{MARGINAL_TAX_RATE, amortize_year, monthly_payment, project, run_yearly_trace};
pub use format::format_currency;
pub use summary::{
    additional_wealth, summarize, years_to_debt_freedom, years_to_debt_freedom_without_strategy,
};
pub use types::{DebtFreedom, Inputs, ProjectionSummary, YearSnapshot, YearTrace};
