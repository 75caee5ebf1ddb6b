//! The consolidated manual-conversion report.

use std::fmt::Write as _;

use cfm_graph::ResourceGraph;
use cfm_model::Finding;
use cfm_modules::ModuleSet;
use cfm_plan::ImportPlan;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One report line: a finding tied to the place it was raised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    /// Display name of the resource, `(stack outputs)` for output
    /// resolution, or `(import plan)` for planning.
    pub subject: String,
    /// Stable category label, see [`Finding::kind`].
    pub kind: String,
    /// Human-readable explanation.
    pub reason: String,
}

/// Summary counts over one conversion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReportCounts {
    /// Resources discovered across stacks and independents.
    pub resources: usize,
    /// Resource definitions emitted into modules.
    pub converted: usize,
    /// Resources whose source type has no mapping.
    pub unsupported: usize,
    /// Modules produced.
    pub modules: usize,
    /// Import entries planned.
    pub import_entries: usize,
    /// Resources left out of the plan.
    pub skipped_imports: usize,
}

/// Everything a human needs to finish the conversion by hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionReport {
    /// When the conversion ran.
    pub generated_at: DateTime<Utc>,
    /// Every finding raised during the run, in discovery order.
    pub entries: Vec<ReportEntry>,
    /// Summary counts.
    pub counts: ReportCounts,
}

impl ConversionReport {
    /// Renders the report as plain text.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "conversion report (generated {})",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        let _ = writeln!(out);
        let c = &self.counts;
        let _ = writeln!(out, "  resources discovered:  {}", c.resources);
        let _ = writeln!(out, "  resources converted:   {}", c.converted);
        let _ = writeln!(out, "  unsupported types:     {}", c.unsupported);
        let _ = writeln!(out, "  modules produced:      {}", c.modules);
        let _ = writeln!(out, "  imports planned:       {}", c.import_entries);
        let _ = writeln!(out, "  imports skipped:       {}", c.skipped_imports);
        let _ = writeln!(out);
        if self.entries.is_empty() {
            let _ = writeln!(out, "no findings; nothing needs manual attention");
            return out;
        }
        let _ = writeln!(out, "findings ({}):", self.entries.len());
        for entry in &self.entries {
            let _ = writeln!(out, "  [{}] {}: {}", entry.kind, entry.subject, entry.reason);
        }
        out
    }
}

/// Collects node findings, output-resolution findings, and plan skips into
/// one report.
pub(crate) fn build_report(
    graph: &ResourceGraph,
    modules: &ModuleSet,
    plan: &ImportPlan,
    output_findings: &[Finding],
) -> ConversionReport {
    let mut entries = Vec::new();
    for node in graph.nodes() {
        for finding in &node.findings {
            entries.push(ReportEntry {
                subject: node.display_name(),
                kind: finding.kind().to_string(),
                reason: finding.reason(),
            });
        }
    }
    for finding in output_findings {
        entries.push(ReportEntry {
            subject: "(stack outputs)".to_string(),
            kind: finding.kind().to_string(),
            reason: finding.reason(),
        });
    }
    for finding in plan.skipped() {
        entries.push(ReportEntry {
            subject: "(import plan)".to_string(),
            kind: finding.kind().to_string(),
            reason: finding.reason(),
        });
    }

    ConversionReport {
        generated_at: Utc::now(),
        entries,
        counts: ReportCounts {
            resources: graph.node_count(),
            converted: modules.resource_count(),
            unsupported: graph.nodes().filter(|n| n.unsupported).count(),
            modules: modules.len(),
            import_entries: plan.len(),
            skipped_imports: plan.skipped().len(),
        },
    }
}
