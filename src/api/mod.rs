use axum::{
    Router,
    extract::{
        Json, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::Parser;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{
    Inputs, ProjectionSummary, YearSnapshot, format_currency, project, summarize,
};

const DEFAULT_ANNUAL_SALARY: f64 = 100_000.0;
const DEFAULT_EXISTING_INVESTMENT: f64 = 50_000.0;
const DEFAULT_NEW_INVESTMENT_AMOUNT: f64 = 200_000.0;
const DEFAULT_MONTHLY_CONTRIBUTION: f64 = 1_000.0;
const DEFAULT_MORTGAGE_BALANCE: f64 = 500_000.0;
const DEFAULT_EXISTING_INVESTMENT_LOAN: f64 = 100_000.0;
const DEFAULT_NEW_INVESTMENT_LOAN: f64 = 200_000.0;
const DEFAULT_MORTGAGE_RATE: f64 = 4.5;
const DEFAULT_INVESTMENT_LOAN_RATE: f64 = 5.5;
const DEFAULT_LOAN_TERM: i64 = 30;
const DEFAULT_GROWTH_RATE: f64 = 7.0;
const DEFAULT_DIVIDEND_RATE: f64 = 4.0;

const MAX_LOAN_TERM: i64 = 100;

/// Rejected input, tagged with the camelCase name of the offending field.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputError {
    #[error("{field} is not a number: {value:?}")]
    Unparseable { field: &'static str, value: String },
    #[error("{field} must be a finite number")]
    NonFinite { field: &'static str },
    #[error("{field} must be >= 0")]
    Negative { field: &'static str },
    #[error("{field} must be > 0")]
    NotPositive { field: &'static str },
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
    },
}

impl InputError {
    pub fn field(&self) -> &'static str {
        match self {
            InputError::Unparseable { field, .. }
            | InputError::NonFinite { field }
            | InputError::Negative { field }
            | InputError::NotPositive { field }
            | InputError::OutOfRange { field, .. } => field,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("failed to encode projection: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Parses raw form text. Blank or malformed text is an error, never zero.
pub fn parse_field(field: &'static str, text: &str) -> Result<f64, InputError> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| InputError::Unparseable {
            field,
            value: text.to_string(),
        })
}

fn parse_term_field(field: &'static str, text: &str) -> Result<i64, InputError> {
    text.trim()
        .parse::<i64>()
        .map_err(|_| InputError::Unparseable {
            field,
            value: text.to_string(),
        })
}

#[derive(Parser, Debug)]
#[command(
    name = "debt-recycler",
    about = "Compare a debt recycling strategy against paying down the home loan alone"
)]
pub struct Cli {
    #[arg(long, default_value_t = DEFAULT_ANNUAL_SALARY, help = "Annual salary (informational)")]
    annual_salary: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_EXISTING_INVESTMENT,
        help = "Starting portfolio without the strategy"
    )]
    existing_investment: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_NEW_INVESTMENT_AMOUNT,
        help = "Starting portfolio with the strategy"
    )]
    new_investment_amount: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_MONTHLY_CONTRIBUTION,
        help = "Monthly contribution to both portfolios"
    )]
    monthly_contribution: f64,
    #[arg(long, default_value_t = DEFAULT_MORTGAGE_BALANCE, help = "Home loan balance")]
    mortgage_balance: f64,
    #[arg(long, default_value_t = DEFAULT_EXISTING_INVESTMENT_LOAN)]
    existing_investment_loan_balance: f64,
    #[arg(long, default_value_t = DEFAULT_NEW_INVESTMENT_LOAN)]
    new_investment_loan_balance: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_MORTGAGE_RATE,
        help = "Home loan interest rate in percent, e.g. 4.5"
    )]
    mortgage_rate: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_INVESTMENT_LOAN_RATE,
        help = "Investment loan interest rate in percent"
    )]
    investment_loan_rate: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_LOAN_TERM,
        help = "Loan term and projection horizon in years"
    )]
    loan_term: i64,
    #[arg(
        long,
        default_value_t = DEFAULT_GROWTH_RATE,
        allow_negative_numbers = true,
        help = "Expected annual investment growth in percent"
    )]
    growth_rate: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_DIVIDEND_RATE,
        help = "Expected annual dividend yield in percent"
    )]
    dividend_rate: f64,
    #[arg(long, help = "Print the projection as JSON instead of a table")]
    json: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectPayload {
    annual_salary: Option<f64>,
    existing_investment: Option<f64>,
    new_investment_amount: Option<f64>,
    monthly_contribution: Option<f64>,
    mortgage_balance: Option<f64>,
    existing_investment_loan_balance: Option<f64>,
    new_investment_loan_balance: Option<f64>,
    mortgage_rate: Option<f64>,
    investment_loan_rate: Option<f64>,
    loan_term: Option<i64>,
    growth_rate: Option<f64>,
    dividend_rate: Option<f64>,
}

/// Query-string form: every value arrives as text and is parsed explicitly.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct FormPayload {
    annual_salary: Option<String>,
    existing_investment: Option<String>,
    new_investment_amount: Option<String>,
    monthly_contribution: Option<String>,
    mortgage_balance: Option<String>,
    existing_investment_loan_balance: Option<String>,
    new_investment_loan_balance: Option<String>,
    mortgage_rate: Option<String>,
    investment_loan_rate: Option<String>,
    loan_term: Option<String>,
    growth_rate: Option<String>,
    dividend_rate: Option<String>,
}

impl FormPayload {
    fn parse(self) -> Result<ProjectPayload, InputError> {
        let number = |field: &'static str, text: Option<String>| {
            text.map(|t| parse_field(field, &t)).transpose()
        };

        Ok(ProjectPayload {
            annual_salary: number("annualSalary", self.annual_salary)?,
            existing_investment: number("existingInvestment", self.existing_investment)?,
            new_investment_amount: number("newInvestmentAmount", self.new_investment_amount)?,
            monthly_contribution: number("monthlyContribution", self.monthly_contribution)?,
            mortgage_balance: number("mortgageBalance", self.mortgage_balance)?,
            existing_investment_loan_balance: number(
                "existingInvestmentLoanBalance",
                self.existing_investment_loan_balance,
            )?,
            new_investment_loan_balance: number(
                "newInvestmentLoanBalance",
                self.new_investment_loan_balance,
            )?,
            mortgage_rate: number("mortgageRate", self.mortgage_rate)?,
            investment_loan_rate: number("investmentLoanRate", self.investment_loan_rate)?,
            loan_term: self
                .loan_term
                .map(|t| parse_term_field("loanTerm", &t))
                .transpose()?,
            growth_rate: number("growthRate", self.growth_rate)?,
            dividend_rate: number("dividendRate", self.dividend_rate)?,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectResponse {
    inputs: Inputs,
    summary: Option<ProjectionSummary>,
    snapshots: Vec<YearSnapshot>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'static str>,
}

fn require_finite(field: &'static str, value: f64) -> Result<f64, InputError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(InputError::NonFinite { field })
    }
}

fn require_non_negative(field: &'static str, value: f64) -> Result<f64, InputError> {
    let value = require_finite(field, value)?;
    if value < 0.0 {
        return Err(InputError::Negative { field });
    }
    Ok(value)
}

fn require_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<f64, InputError> {
    let value = require_finite(field, value)?;
    if !(min..=max).contains(&value) {
        return Err(InputError::OutOfRange { field, min, max });
    }
    Ok(value)
}

pub fn build_inputs(cli: Cli) -> Result<Inputs, InputError> {
    let mortgage_rate = require_finite("mortgageRate", cli.mortgage_rate)?;
    // The level-payment formula divides by zero at a 0% rate.
    if mortgage_rate <= 0.0 {
        return Err(InputError::NotPositive {
            field: "mortgageRate",
        });
    }
    let mortgage_rate = require_range("mortgageRate", mortgage_rate, 0.0, 100.0)?;

    if !(1..=MAX_LOAN_TERM).contains(&cli.loan_term) {
        return Err(InputError::OutOfRange {
            field: "loanTerm",
            min: 1.0,
            max: MAX_LOAN_TERM as f64,
        });
    }

    Ok(Inputs {
        annual_salary: require_non_negative("annualSalary", cli.annual_salary)?,
        existing_investment: require_non_negative("existingInvestment", cli.existing_investment)?,
        new_investment_amount: require_non_negative(
            "newInvestmentAmount",
            cli.new_investment_amount,
        )?,
        monthly_contribution: require_non_negative(
            "monthlyContribution",
            cli.monthly_contribution,
        )?,
        mortgage_balance: require_non_negative("mortgageBalance", cli.mortgage_balance)?,
        existing_investment_loan_balance: require_non_negative(
            "existingInvestmentLoanBalance",
            cli.existing_investment_loan_balance,
        )?,
        new_investment_loan_balance: require_non_negative(
            "newInvestmentLoanBalance",
            cli.new_investment_loan_balance,
        )?,
        mortgage_rate,
        investment_loan_rate: require_range(
            "investmentLoanRate",
            cli.investment_loan_rate,
            0.0,
            100.0,
        )?,
        loan_term: cli.loan_term as i32,
        growth_rate: require_range("growthRate", cli.growth_rate, -100.0, 100.0)?,
        dividend_rate: require_range("dividendRate", cli.dividend_rate, 0.0, 100.0)?,
    })
}

/// Runs a projection for parsed command-line arguments and renders it as a
/// table, or as the API's JSON document when `--json` is set.
pub fn run_cli(cli: Cli) -> Result<String, CliError> {
    let json = cli.json;
    let inputs = build_inputs(cli)?;
    let snapshots = project(&inputs);

    if json {
        let response = build_project_response(inputs, snapshots);
        return Ok(format!("{}\n", serde_json::to_string_pretty(&response)?));
    }
    Ok(render_report(&inputs, &snapshots))
}

fn render_report(inputs: &Inputs, snapshots: &[YearSnapshot]) -> String {
    let Some(summary) = summarize(inputs, snapshots) else {
        return "No projection years.\n".to_string();
    };

    let mut out = String::new();
    out.push_str(&format!(
        "Debt recycling projection over {} years\n\n",
        inputs.loan_term
    ));
    out.push_str(&format!(
        "Monthly mortgage payment:      {}\n",
        format_currency(summary.monthly_payment)
    ));
    out.push_str(&format!(
        "Investment loan principal:     {}\n",
        format_currency(summary.investment_loan_principal)
    ));
    out.push_str(&format!(
        "Additional wealth created:     {}\n",
        format_currency(summary.additional_wealth)
    ));
    out.push_str(&format!(
        "Home loan cleared (strategy):  {}\n",
        summary.debt_freedom
    ));
    out.push_str(&format!(
        "Home loan cleared (baseline):  {}\n\n",
        summary.debt_freedom_without_strategy
    ));

    out.push_str(&format!(
        "{:>4}  {:>16}  {:>16}  {:>14}  {:>14}\n",
        "Year", "Net (baseline)", "Net (strategy)", "Debt (base)", "Debt (strat)"
    ));
    for s in snapshots {
        out.push_str(&format!(
            "{:>4}  {:>16}  {:>16}  {:>14}  {:>14}\n",
            s.year,
            format_currency(s.net_assets_without_strategy),
            format_currency(s.net_assets_with_strategy),
            format_currency(s.non_deductible_debt_without_strategy),
            format_currency(s.non_deductible_debt_with_strategy),
        ));
    }
    out
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route(
            "/api/project",
            get(project_get_handler).post(project_post_handler),
        )
        .route("/api/defaults", get(defaults_handler))
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    println!("Debt recycling API listening on http://{addr}");
    println!("Local access: http://127.0.0.1:{port}/api/project");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found", None)
}

async fn defaults_handler() -> Response {
    match build_inputs(default_cli_for_api()) {
        Ok(inputs) => json_response(StatusCode::OK, inputs),
        Err(err) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            &err.to_string(),
            Some(err.field()),
        ),
    }
}

async fn project_get_handler(query: Result<Query<FormPayload>, QueryRejection>) -> Response {
    let Query(form) = match query {
        Ok(query) => query,
        Err(rejection) => return rejected(&rejection.body_text()),
    };
    match form.parse() {
        Ok(payload) => project_handler_impl(payload).await,
        Err(err) => input_error_response(&err),
    }
}

async fn project_post_handler(body: Result<Json<ProjectPayload>, JsonRejection>) -> Response {
    match body {
        Ok(Json(payload)) => project_handler_impl(payload).await,
        Err(rejection) => rejected(&rejection.body_text()),
    }
}

async fn project_handler_impl(payload: ProjectPayload) -> Response {
    let inputs = match api_request_from_payload(payload) {
        Ok(inputs) => inputs,
        Err(err) => return input_error_response(&err),
    };

    debug!(
        "projecting {} years for mortgage {} at {}%",
        inputs.loan_term, inputs.mortgage_balance, inputs.mortgage_rate
    );
    let snapshots = project(&inputs);
    json_response(StatusCode::OK, build_project_response(inputs, snapshots))
}

fn build_project_response(inputs: Inputs, snapshots: Vec<YearSnapshot>) -> ProjectResponse {
    ProjectResponse {
        summary: summarize(&inputs, &snapshots),
        inputs,
        snapshots,
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str, field: Option<&'static str>) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
            field,
        },
    )
}

fn rejected(msg: &str) -> Response {
    warn!("rejected malformed request: {msg}");
    error_response(StatusCode::BAD_REQUEST, msg, None)
}

fn input_error_response(err: &InputError) -> Response {
    warn!("rejected projection request: {err}");
    error_response(StatusCode::BAD_REQUEST, &err.to_string(), Some(err.field()))
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<Inputs, String> {
    let payload = serde_json::from_str::<ProjectPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    api_request_from_payload(payload).map_err(|e| e.to_string())
}

fn api_request_from_payload(payload: ProjectPayload) -> Result<Inputs, InputError> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.annual_salary {
        cli.annual_salary = v;
    }
    if let Some(v) = payload.existing_investment {
        cli.existing_investment = v;
    }
    if let Some(v) = payload.new_investment_amount {
        cli.new_investment_amount = v;
    }
    if let Some(v) = payload.monthly_contribution {
        cli.monthly_contribution = v;
    }
    if let Some(v) = payload.mortgage_balance {
        cli.mortgage_balance = v;
    }
    if let Some(v) = payload.existing_investment_loan_balance {
        cli.existing_investment_loan_balance = v;
    }
    if let Some(v) = payload.new_investment_loan_balance {
        cli.new_investment_loan_balance = v;
    }
    if let Some(v) = payload.mortgage_rate {
        cli.mortgage_rate = v;
    }
    if let Some(v) = payload.investment_loan_rate {
        cli.investment_loan_rate = v;
    }
    if let Some(v) = payload.loan_term {
        cli.loan_term = v;
    }
    if let Some(v) = payload.growth_rate {
        cli.growth_rate = v;
    }
    if let Some(v) = payload.dividend_rate {
        cli.dividend_rate = v;
    }

    build_inputs(cli)
}

fn default_cli_for_api() -> Cli {
    Cli {
        annual_salary: DEFAULT_ANNUAL_SALARY,
        existing_investment: DEFAULT_EXISTING_INVESTMENT,
        new_investment_amount: DEFAULT_NEW_INVESTMENT_AMOUNT,
        monthly_contribution: DEFAULT_MONTHLY_CONTRIBUTION,
        mortgage_balance: DEFAULT_MORTGAGE_BALANCE,
        existing_investment_loan_balance: DEFAULT_EXISTING_INVESTMENT_LOAN,
        new_investment_loan_balance: DEFAULT_NEW_INVESTMENT_LOAN,
        mortgage_rate: DEFAULT_MORTGAGE_RATE,
        investment_loan_rate: DEFAULT_INVESTMENT_LOAN_RATE,
        loan_term: DEFAULT_LOAN_TERM,
        growth_rate: DEFAULT_GROWTH_RATE,
        dividend_rate: DEFAULT_DIVIDEND_RATE,
        json: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DebtFreedom;
    use axum::body::to_bytes;
    use serde_json::Value;

    fn sample_cli() -> Cli {
        default_cli_for_api()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        serde_json::from_slice(&bytes).expect("body should be JSON")
    }

    #[test]
    fn cli_defaults_match_api_defaults() {
        let parsed = Cli::try_parse_from(["debt-recycler"]).expect("defaults parse");
        let from_args = build_inputs(parsed).expect("valid inputs");
        let from_api = build_inputs(sample_cli()).expect("valid inputs");
        assert_eq!(from_args, from_api);
        assert_eq!(from_api.loan_term, 30);
        assert_eq!(from_api.mortgage_balance, 500_000.0);
        assert_eq!(from_api.investment_loan_principal(), 300_000.0);
    }

    #[test]
    fn cli_parses_kebab_case_flags() {
        let cli = Cli::try_parse_from([
            "debt-recycler",
            "--mortgage-rate",
            "6.1",
            "--loan-term",
            "25",
            "--growth-rate",
            "-2.5",
            "--json",
        ])
        .expect("flags parse");
        assert!(cli.json);

        let inputs = build_inputs(cli).expect("valid inputs");
        assert_eq!(inputs.mortgage_rate, 6.1);
        assert_eq!(inputs.loan_term, 25);
        assert_eq!(inputs.growth_rate, -2.5);
    }

    #[test]
    fn parse_field_rejects_blank_and_garbage() {
        assert_eq!(parse_field("growthRate", " 7.5 "), Ok(7.5));
        assert_eq!(
            parse_field("growthRate", ""),
            Err(InputError::Unparseable {
                field: "growthRate",
                value: String::new(),
            })
        );
        let err = parse_field("mortgageRate", "4.5%").expect_err("must reject");
        assert_eq!(err.field(), "mortgageRate");
        assert!(err.to_string().contains("\"4.5%\""));
    }

    #[test]
    fn form_payload_rejects_fractional_term() {
        let form = FormPayload {
            loan_term: Some("12.5".to_string()),
            ..FormPayload::default()
        };
        let err = form.parse().expect_err("must reject fractional term");
        assert_eq!(err.field(), "loanTerm");
    }

    #[test]
    fn form_payload_keeps_missing_fields_unset() {
        let form = FormPayload {
            mortgage_rate: Some("5".to_string()),
            ..FormPayload::default()
        };
        let payload = form.parse().expect("valid form");
        assert_eq!(payload.mortgage_rate, Some(5.0));
        assert_eq!(payload.loan_term, None);
        assert_eq!(payload.growth_rate, None);
    }

    #[test]
    fn build_inputs_rejects_zero_mortgage_rate() {
        let mut cli = sample_cli();
        cli.mortgage_rate = 0.0;
        let err = build_inputs(cli).expect_err("must reject 0% mortgage");
        assert_eq!(
            err,
            InputError::NotPositive {
                field: "mortgageRate"
            }
        );
    }

    #[test]
    fn build_inputs_rejects_non_finite_values() {
        let mut cli = sample_cli();
        cli.growth_rate = f64::NAN;
        let err = build_inputs(cli).expect_err("must reject NaN");
        assert_eq!(err, InputError::NonFinite { field: "growthRate" });

        let mut cli = sample_cli();
        cli.mortgage_balance = f64::INFINITY;
        let err = build_inputs(cli).expect_err("must reject infinity");
        assert_eq!(err.field(), "mortgageBalance");
    }

    #[test]
    fn build_inputs_rejects_negative_balances() {
        let mut cli = sample_cli();
        cli.new_investment_loan_balance = -1.0;
        let err = build_inputs(cli).expect_err("must reject negative loan");
        assert_eq!(
            err,
            InputError::Negative {
                field: "newInvestmentLoanBalance"
            }
        );
    }

    #[test]
    fn build_inputs_rejects_out_of_range_term() {
        for term in [0, -5, MAX_LOAN_TERM + 1] {
            let mut cli = sample_cli();
            cli.loan_term = term;
            let err = build_inputs(cli).expect_err("must reject term");
            assert_eq!(err.field(), "loanTerm");
            assert!(err.to_string().contains("between 1 and 100"));
        }
    }

    #[test]
    fn build_inputs_rejects_out_of_range_rates() {
        let mut cli = sample_cli();
        cli.dividend_rate = -0.5;
        assert_eq!(
            build_inputs(cli).expect_err("must reject").field(),
            "dividendRate"
        );

        let mut cli = sample_cli();
        cli.investment_loan_rate = 150.0;
        assert_eq!(
            build_inputs(cli).expect_err("must reject").field(),
            "investmentLoanRate"
        );

        let mut cli = sample_cli();
        cli.growth_rate = -100.5;
        assert_eq!(
            build_inputs(cli).expect_err("must reject").field(),
            "growthRate"
        );
    }

    #[test]
    fn api_request_from_json_parses_camel_case_keys() {
        let inputs = api_request_from_json(
            r#"{
                "annualSalary": 120000,
                "mortgageBalance": 650000,
                "mortgageRate": 6.2,
                "loanTerm": 25,
                "existingInvestmentLoanBalance": 0,
                "newInvestmentLoanBalance": 150000,
                "dividendRate": 3.5
            }"#,
        )
        .expect("valid payload");

        assert_eq!(inputs.annual_salary, 120_000.0);
        assert_eq!(inputs.mortgage_balance, 650_000.0);
        assert_eq!(inputs.mortgage_rate, 6.2);
        assert_eq!(inputs.loan_term, 25);
        assert_eq!(inputs.investment_loan_principal(), 150_000.0);
        assert_eq!(inputs.dividend_rate, 3.5);
        assert_eq!(inputs.growth_rate, DEFAULT_GROWTH_RATE);
    }

    #[test]
    fn api_request_from_json_rejects_wrong_types() {
        let err = api_request_from_json(r#"{"mortgageRate": "lots"}"#).expect_err("must reject");
        assert!(err.contains("Invalid API JSON payload"));
    }

    #[test]
    fn project_response_serializes_camel_case_and_debt_freedom() {
        let inputs = build_inputs(sample_cli()).expect("valid inputs");
        let snapshots = project(&inputs);
        let response = build_project_response(inputs, snapshots);
        let json = serde_json::to_value(&response).expect("response should serialize");

        assert_eq!(json["snapshots"].as_array().map(Vec::len), Some(31));
        assert_eq!(json["snapshots"][0]["year"], 0);
        assert!(json["snapshots"][0]["nonDeductibleDebtWithStrategy"].is_number());
        assert!(json["snapshots"][0]["netAssetsWithoutStrategy"].is_number());
        assert_eq!(json["inputs"]["loanTerm"], 30);
        assert_eq!(json["summary"]["debtFreedom"]["status"], "reached");
        assert_eq!(json["summary"]["debtFreedom"]["year"], 14);
        assert!(json["summary"]["additionalWealth"].is_number());
        assert_eq!(json["summary"]["finalYear"]["year"], 30);
    }

    #[test]
    fn not_reached_serializes_without_a_year() {
        let json = serde_json::to_value(DebtFreedom::NotReached).expect("serializes");
        assert_eq!(json, serde_json::json!({ "status": "notReached" }));
    }

    #[test]
    fn run_cli_renders_table() {
        let report = run_cli(sample_cli()).expect("report renders");
        assert!(report.contains("Debt recycling projection over 30 years"));
        assert!(report.contains("Monthly mortgage payment:      $2,533"));
        assert!(report.contains("Investment loan principal:     $300,000"));
        assert!(report.contains("Home loan cleared (strategy):  14 years"));
        assert!(report.contains("-$426,434"));
        // Header plus one row per year 0..=30.
        let table_rows = report
            .lines()
            .skip_while(|line| !line.trim_start().starts_with("Year"))
            .count();
        assert_eq!(table_rows, 32);
    }

    #[test]
    fn run_cli_json_matches_api_shape() {
        let mut cli = sample_cli();
        cli.json = true;
        let out = run_cli(cli).expect("json renders");
        let json: Value = serde_json::from_str(&out).expect("valid JSON");
        assert_eq!(json["summary"]["debtFreedom"]["year"], 14);
        assert_eq!(json["snapshots"].as_array().map(Vec::len), Some(31));
    }

    #[test]
    fn run_cli_surfaces_validation_errors() {
        let mut cli = sample_cli();
        cli.loan_term = 0;
        let err = run_cli(cli).expect_err("must reject");
        assert!(matches!(err, CliError::Input(InputError::OutOfRange { field: "loanTerm", .. })));
    }

    #[tokio::test]
    async fn get_handler_parses_query_text() {
        let form = FormPayload {
            loan_term: Some("10".to_string()),
            mortgage_rate: Some("5".to_string()),
            ..FormPayload::default()
        };
        let response = project_get_handler(Ok(Query(form))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).map(|v| v.as_bytes()),
            Some(&b"no-store"[..])
        );

        let json = body_json(response).await;
        assert_eq!(json["snapshots"].as_array().map(Vec::len), Some(11));
        assert_eq!(json["inputs"]["mortgageRate"], 5.0);
    }

    #[tokio::test]
    async fn get_handler_rejects_unparseable_text_with_field() {
        let form = FormPayload {
            growth_rate: Some("seven".to_string()),
            ..FormPayload::default()
        };
        let response = project_get_handler(Ok(Query(form))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert_eq!(json["field"], "growthRate");
        assert!(json["error"].as_str().unwrap_or_default().contains("seven"));
    }

    #[tokio::test]
    async fn post_handler_rejects_invalid_inputs() {
        let payload = ProjectPayload {
            mortgage_rate: Some(-1.0),
            ..ProjectPayload::default()
        };
        let response = project_post_handler(Ok(Json(payload))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert_eq!(json["field"], "mortgageRate");
    }

    #[tokio::test]
    async fn defaults_handler_returns_default_inputs() {
        let response = defaults_handler().await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["annualSalary"], 100_000.0);
        assert_eq!(json["newInvestmentLoanBalance"], 200_000.0);
        assert_eq!(json["loanTerm"], 30);
    }

    #[tokio::test]
    async fn unknown_routes_return_json_404() {
        let response = not_found_handler().await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Not found");
        assert!(json.get("field").is_none());
    }
}
