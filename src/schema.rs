//! Fixed layout of a contingency analysis result file.

// Anchors //

pub const LOAD_INPUT: &str = "grid/nodes/load"; // [n_load, 4] input demand and shed weights
pub const BASE_BUS: &str = "base_solution/opf/nodes/bus"; // [n_bus, >=2] base case bus solution
pub const BASE_GEN: &str = "base_solution/opf/nodes/generator"; // [n_gen, >=1] base case dispatch
pub const BASE_LOAD: &str = "base_solution/opf/nodes/load"; // [n_load, 2] base case load served

pub const CONTINGENCIES: &str = "contingencies"; // contingency catalogue group
pub const CONTINGENCY_TYPES: &str = "contingencies/types"; // [N] 0 = line, 1 = generator
pub const CONTINGENCY_NAMES: &str = "contingencies/names"; // [N] display names
pub const CONTINGENCY_IDS: &str = "contingencies/ids"; // [N] external element ids

pub const POST_CONTINGENCY: &str = "post_contingency"; // one group per contingency

// Attributes //

pub const COUNT: &str = "count"; // number of contingencies, on CONTINGENCIES
pub const PF_CONVERGED: &str = "pf_converged"; // 0 or 1, on each contingency group
pub const OPF_CONVERGED: &str = "opf_converged"; // 0 or 1, on each contingency group
pub const OBJECTIVE: &str = "objective"; // OPF cost, on the "opf" sub-group

// Paths relative to a contingency group, present only if OPF converged //

pub const OPF: &str = "opf";
pub const OPF_BUS: &str = "opf/nodes/bus";
pub const OPF_GEN: &str = "opf/nodes/generator";
pub const OPF_LOAD: &str = "opf/nodes/load";

// Columns //

pub const PD: usize = 0; // Pd, active power demand (MW)
pub const QD: usize = 1; // Qd, reactive power demand (MVAr)
pub const WEIGHT_P: usize = 2; // active shed priority weight
pub const WEIGHT_Q: usize = 3; // reactive shed priority weight
pub const LOAD_INPUT_COLS: usize = 4;

pub const VM: usize = 1; // Vm, voltage magnitude (p.u.)
pub const BUS_COLS: usize = 2;

pub const PG: usize = 0; // Pg, active power output
pub const GEN_COLS: usize = 1;

pub const P_SERVED: usize = 0; // active power served (MW)
pub const Q_SERVED: usize = 1; // reactive power served (MVAr)
pub const LOAD_SERVED_COLS: usize = 2;

// Contingency type codes //

pub const LINE: i64 = 0;
pub const GEN: i64 = 1;

/// Digits in the zero-padded index of a contingency group name.
pub const CONTINGENCY_INDEX_WIDTH: usize = 6;

/// Path of the result group of the contingency with 1-based sequence
/// index `i`, e.g. `post_contingency/contingency_000012`.
pub fn contingency_path(i: usize) -> String {
    format!(
        "{}/contingency_{:0width$}",
        POST_CONTINGENCY,
        i,
        width = CONTINGENCY_INDEX_WIDTH
    )
}

/// Joins a path relative to `base`.
pub fn join(base: &str, rel: &str) -> String {
    format!("{}/{}", base, rel)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contingency_path() {
        assert_eq!(contingency_path(1), "post_contingency/contingency_000001");
        assert_eq!(contingency_path(42), "post_contingency/contingency_000042");
        assert_eq!(
            join(&contingency_path(3), OPF_LOAD),
            "post_contingency/contingency_000003/opf/nodes/load"
        );
    }
}
