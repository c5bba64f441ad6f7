use crate::container::Container;
use crate::error::{Result, SchemaError};
use crate::schema::{self, contingency_path, join};
use crate::table::{min_max, Table};

use derive_builder::Builder;
use serde::Serialize;
use std::fmt;

/// Knobs of the summary. The defaults compare the first contingency with
/// the base case and flag redispatch above 0.01.
#[derive(Debug, Clone, PartialEq, Builder, Serialize)]
#[builder(default, build_fn(validate = "Self::validate"))]
pub struct SummaryOptions {
    /// 1-based sequence index of the contingency compared against the
    /// base case in the redispatch diff.
    pub reference: usize,

    /// Absolute active power change above which a generator counts as
    /// redispatched. Same units as the generator table.
    pub threshold: f64,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            reference: 1,
            threshold: 0.01,
        }
    }
}

impl SummaryOptionsBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        if let Some(reference) = self.reference {
            if reference == 0 {
                return Err("reference contingency is 1-based".to_string());
            }
        }
        if let Some(threshold) = self.threshold {
            if !threshold.is_finite() || threshold < 0.0 {
                return Err(format!(
                    "threshold must be finite and non-negative, got {}",
                    threshold
                ));
            }
        }
        Ok(())
    }
}

/// Input demand totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadSummary {
    pub rows: usize,
    pub cols: usize,
    /// Total active power demand (MW).
    pub total_p: f64,
    /// Total reactive power demand (MVAr).
    pub total_q: f64,
}

/// Base case OPF solution figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaseCase {
    pub total_generation: f64,
    pub vm_min: f64,
    pub vm_max: f64,
    /// Active load shed (MW).
    pub p_shed: f64,
    /// Reactive load shed (MVAr).
    pub q_shed: f64,
}

#[derive(Debug, PartialEq, Eq, Copy, Clone, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ContingencyKind {
    Line,
    Gen,
}

impl ContingencyKind {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            schema::LINE => Some(ContingencyKind::Line),
            schema::GEN => Some(ContingencyKind::Gen),
            _ => None,
        }
    }
}

impl fmt::Display for ContingencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContingencyKind::Line => write!(f, "LINE"),
            ContingencyKind::Gen => write!(f, "GEN"),
        }
    }
}

/// One enumerated outage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contingency {
    /// 1-based sequence index.
    pub index: usize,
    pub name: String,
    pub kind: ContingencyKind,
    pub id: String,
}

/// Combined convergence outcome of a contingency.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Serialize)]
pub enum Status {
    #[serde(rename = "PF+OPF OK")]
    PfOpfOk,
    #[serde(rename = "OPF OK")]
    OpfOk,
    #[serde(rename = "PF OK, OPF FAIL")]
    PfOkOpfFail,
    #[serde(rename = "BOTH FAIL")]
    BothFail,
}

impl Status {
    pub fn from_flags(pf_converged: bool, opf_converged: bool) -> Self {
        match (pf_converged, opf_converged) {
            (true, true) => Status::PfOpfOk,
            (false, true) => Status::OpfOk,
            (true, false) => Status::PfOkOpfFail,
            (false, false) => Status::BothFail,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::PfOpfOk => "PF+OPF OK",
            Status::OpfOk => "OPF OK",
            Status::PfOkOpfFail => "PF OK, OPF FAIL",
            Status::BothFail => "BOTH FAIL",
        };
        f.write_str(s)
    }
}

/// Figures of a converged post-contingency OPF.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Solution {
    pub objective: f64,
    pub p_shed: f64,
    pub q_shed: f64,
}

/// Result row of one contingency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContingencyResult {
    pub index: usize,
    pub name: String,
    pub pf_converged: bool,
    pub opf_converged: bool,
    pub status: Status,
    /// Present only when the OPF converged.
    pub solution: Option<Solution>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RedispatchRow {
    /// 0-based generator index.
    pub gen: usize,
    pub base_pg: f64,
    pub contingency_pg: f64,
    pub delta: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Redispatch {
    /// Generators whose output moved by more than the threshold. Empty
    /// when nothing moved significantly.
    Diff {
        reference: usize,
        threshold: f64,
        rows: Vec<RedispatchRow>,
    },
    /// No reference solution to compare against.
    Skipped { reference: usize, reason: String },
}

/// Everything read and derived from one result file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub source: String,
    pub loads: LoadSummary,
    pub base: BaseCase,
    pub contingencies: Vec<Contingency>,
    pub results: Vec<ContingencyResult>,
    pub redispatch: Redispatch,
}

impl Summary {
    /// Number of contingencies whose OPF converged.
    pub fn opf_converged(&self) -> usize {
        self.results.iter().filter(|r| r.opf_converged).count()
    }

    /// Number of contingencies whose power flow converged.
    pub fn pf_converged(&self) -> usize {
        self.results.iter().filter(|r| r.pf_converged).count()
    }
}

/// Reads the scenario and derives the summary. Any missing or malformed
/// path aborts the whole summary.
pub fn summarize(container: &Container, options: &SummaryOptions) -> Result<Summary> {
    let load_input = container.table(schema::LOAD_INPUT, schema::LOAD_INPUT_COLS)?;
    let loads = LoadSummary {
        rows: load_input.rows(),
        cols: load_input.cols(),
        total_p: load_input.col_sum(schema::PD),
        total_q: load_input.col_sum(schema::QD),
    };

    let base_gen = container.table(schema::BASE_GEN, schema::GEN_COLS)?;
    let base = read_base_case(container, &loads, &base_gen)?;

    let contingencies = read_contingencies(container)?;

    let mut results = Vec::with_capacity(contingencies.len());
    for contingency in &contingencies {
        results.push(read_result(container, contingency, &loads)?);
    }

    let redispatch = redispatch(container, &base_gen, &results, options)?;

    Ok(Summary {
        source: container.source().display().to_string(),
        loads,
        base,
        contingencies,
        results,
        redispatch,
    })
}

fn read_base_case(container: &Container, loads: &LoadSummary, base_gen: &Table) -> Result<BaseCase> {
    let bus = container.table(schema::BASE_BUS, schema::BUS_COLS)?;
    let (vm_min, vm_max) = min_max(&bus.column(schema::VM)).ok_or_else(|| SchemaError::BadShape {
        path: schema::BASE_BUS.to_string(),
        message: "has no buses".to_string(),
    })?;

    let (p_shed, q_shed) = load_shed(container, schema::BASE_LOAD, loads)?;

    Ok(BaseCase {
        total_generation: base_gen.col_sum(schema::PG),
        vm_min,
        vm_max,
        p_shed,
        q_shed,
    })
}

/// Input demand minus demand served by the solution at `path`, for
/// active and reactive power.
fn load_shed(container: &Container, path: &str, loads: &LoadSummary) -> Result<(f64, f64)> {
    let served = container.table(path, schema::LOAD_SERVED_COLS)?;
    if served.rows() != loads.rows {
        return Err(SchemaError::RowMismatch {
            path: path.to_string(),
            reference: schema::LOAD_INPUT.to_string(),
            expected: loads.rows,
            found: served.rows(),
        }
        .into());
    }
    Ok((
        loads.total_p - served.col_sum(schema::P_SERVED),
        loads.total_q - served.col_sum(schema::Q_SERVED),
    ))
}

fn read_contingencies(container: &Container) -> Result<Vec<Contingency>> {
    let count = container.attr(schema::CONTINGENCIES, schema::COUNT)?;
    let n = count
        .as_i64()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| SchemaError::BadAttr {
            path: schema::CONTINGENCIES.to_string(),
            name: schema::COUNT.to_string(),
            expected: "a non-negative integer",
        })?;

    let check_len = |path: &str, len: usize| -> std::result::Result<(), SchemaError> {
        if len != n {
            return Err(SchemaError::LengthMismatch {
                path: path.to_string(),
                expected: n,
                found: len,
            });
        }
        Ok(())
    };

    let types = container.dataset(schema::CONTINGENCY_TYPES)?;
    check_len(schema::CONTINGENCY_TYPES, types.len())?;
    let codes = types.codes().ok_or_else(|| SchemaError::BadShape {
        path: schema::CONTINGENCY_TYPES.to_string(),
        message: "must hold integer type codes".to_string(),
    })?;

    let names = container.dataset(schema::CONTINGENCY_NAMES)?;
    check_len(schema::CONTINGENCY_NAMES, names.len())?;
    let ids = container.dataset(schema::CONTINGENCY_IDS)?;
    check_len(schema::CONTINGENCY_IDS, ids.len())?;

    codes
        .into_iter()
        .zip(names.labels())
        .zip(ids.labels())
        .enumerate()
        .map(|(i, ((code, name), id))| -> Result<Contingency> {
            let kind = ContingencyKind::from_code(code)
                .ok_or(SchemaError::UnknownContingencyType { index: i + 1, code })?;
            Ok(Contingency {
                index: i + 1,
                name,
                kind,
                id,
            })
        })
        .collect()
}

fn read_flag(container: &Container, path: &str, name: &str) -> Result<bool> {
    match container.attr(path, name)?.as_i64() {
        Some(0) => Ok(false),
        Some(1) => Ok(true),
        _ => Err(SchemaError::BadAttr {
            path: path.to_string(),
            name: name.to_string(),
            expected: "0 or 1",
        }
        .into()),
    }
}

fn read_result(
    container: &Container,
    contingency: &Contingency,
    loads: &LoadSummary,
) -> Result<ContingencyResult> {
    let path = contingency_path(contingency.index);
    let pf_converged = read_flag(container, &path, schema::PF_CONVERGED)?;
    let opf_converged = read_flag(container, &path, schema::OPF_CONVERGED)?;
    let status = Status::from_flags(pf_converged, opf_converged);
    log::debug!("contingency {} ({}): {}", contingency.index, contingency.name, status);

    // The solution sub-tree is only guaranteed when the OPF converged.
    let solution = if opf_converged {
        let (p_shed, q_shed) = load_shed(container, &join(&path, schema::OPF_LOAD), loads)?;
        let opf = join(&path, schema::OPF);
        let objective = container
            .attr(&opf, schema::OBJECTIVE)?
            .as_f64()
            .ok_or_else(|| SchemaError::BadAttr {
                path: opf.clone(),
                name: schema::OBJECTIVE.to_string(),
                expected: "a number",
            })?;
        Some(Solution {
            objective,
            p_shed,
            q_shed,
        })
    } else {
        None
    };

    Ok(ContingencyResult {
        index: contingency.index,
        name: contingency.name.clone(),
        pf_converged,
        opf_converged,
        status,
        solution,
    })
}

fn redispatch(
    container: &Container,
    base_gen: &Table,
    results: &[ContingencyResult],
    options: &SummaryOptions,
) -> Result<Redispatch> {
    let reference = options.reference;
    if results.is_empty() {
        return Ok(Redispatch::Skipped {
            reference,
            reason: "no contingencies".to_string(),
        });
    }
    let result = reference
        .checked_sub(1)
        .and_then(|i| results.get(i))
        .ok_or(SchemaError::NoSuchContingency {
            index: reference,
            count: results.len(),
        })?;
    if !result.opf_converged {
        return Ok(Redispatch::Skipped {
            reference,
            reason: format!("contingency {} OPF did not converge", reference),
        });
    }

    let path = join(&contingency_path(reference), schema::OPF_GEN);
    let gen = container.table(&path, schema::GEN_COLS)?;
    if gen.rows() != base_gen.rows() {
        return Err(SchemaError::RowMismatch {
            path,
            reference: schema::BASE_GEN.to_string(),
            expected: base_gen.rows(),
            found: gen.rows(),
        }
        .into());
    }

    let rows: Vec<RedispatchRow> = base_gen
        .col(schema::PG)
        .zip(gen.col(schema::PG))
        .enumerate()
        .filter_map(|(i, (base_pg, contingency_pg))| {
            let delta = contingency_pg - base_pg;
            (delta.abs() > options.threshold).then_some(RedispatchRow {
                gen: i,
                base_pg,
                contingency_pg,
                delta,
            })
        })
        .collect();
    log::debug!(
        "{} of {} generators redispatched in contingency {}",
        rows.len(),
        gen.rows(),
        reference
    );

    Ok(Redispatch::Diff {
        reference,
        threshold: options.threshold,
        rows,
    })
}
