//! Plain text rendering of a [`Summary`].

use crate::summary::{Redispatch, Summary};
use std::fmt;

const WIDTH: usize = 60;

fn banner(f: &mut fmt::Formatter<'_>, c: char) -> fmt::Result {
    writeln!(f, "{}", c.to_string().repeat(WIDTH))
}

fn section(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    writeln!(f)?;
    banner(f, '-')?;
    writeln!(f, "{}", title)?;
    banner(f, '-')
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        banner(f, '=')?;
        writeln!(f, "Reading: {}", self.source)?;
        banner(f, '=')?;

        writeln!(f)?;
        writeln!(f, "Input loads: ({}, {})", self.loads.rows, self.loads.cols)?;
        writeln!(f, "  Columns: [pd, qd, weight_p, weight_q]")?;
        writeln!(f, "  Total P demand: {:.2} MW", self.loads.total_p)?;
        writeln!(f, "  Total Q demand: {:.2} MVAr", self.loads.total_q)?;

        writeln!(f)?;
        writeln!(f, "Base case OPF:")?;
        writeln!(f, "  Total generation: {:.2} MW", self.base.total_generation)?;
        writeln!(
            f,
            "  Voltage range: {:.4} - {:.4} p.u.",
            self.base.vm_min, self.base.vm_max
        )?;
        writeln!(
            f,
            "  Load shed: P={:.2} MW, Q={:.2} MVAr",
            self.base.p_shed, self.base.q_shed
        )?;

        section(f, &format!("Contingencies: {}", self.contingencies.len()))?;
        for c in &self.contingencies {
            writeln!(f, "  {}: {} ({} outage, id={})", c.index, c.name, c.kind, c.id)?;
        }

        section(f, "Post-contingency OPF results:")?;
        writeln!(f, "  Name                  | Cost ($)    | P Shed (MW) | Status")?;
        writeln!(f, "  {}", "-".repeat(56))?;
        for r in &self.results {
            match &r.solution {
                Some(s) => writeln!(
                    f,
                    "  {:<21} | {:>11.2} | {:>11.2} | {}",
                    r.name, s.objective, s.p_shed, r.status
                )?,
                None => writeln!(f, "  {:<21} | {:>11} | {:>11} | {}", r.name, "-", "-", r.status)?,
            }
        }
        let n = self.results.len();
        writeln!(
            f,
            "  Converged: {}/{} OPF, {}/{} PF",
            self.opf_converged(),
            n,
            self.pf_converged(),
            n
        )?;

        let (Redispatch::Diff { reference, .. } | Redispatch::Skipped { reference, .. }) =
            &self.redispatch;
        section(
            f,
            &format!("Generator Redispatch (Base -> Contingency {}):", reference),
        )?;
        match &self.redispatch {
            Redispatch::Diff {
                threshold, rows, ..
            } => {
                if rows.is_empty() {
                    writeln!(
                        f,
                        "  No significant redispatch (all |delta| <= {} p.u.)",
                        threshold
                    )?;
                } else {
                    writeln!(f, "  Gen#     Base Pg     Cont Pg      Delta")?;
                    for row in rows {
                        writeln!(
                            f,
                            "  {:>4}     {:>7.3}     {:>7.3}     {:>+7.3}",
                            row.gen + 1,
                            row.base_pg,
                            row.contingency_pg,
                            row.delta
                        )?;
                    }
                }
            }
            Redispatch::Skipped { reason, .. } => writeln!(f, "  Skipped: {}", reason)?,
        }

        writeln!(f)?;
        banner(f, '=')
    }
}
