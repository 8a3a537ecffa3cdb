//! Layer 12 — `SufficiencySummary`: evaluate six fixed domains against
//! per-profile thresholds and aggregate to `PASS/WARN/FAIL/SKIP`.

use serde::{Deserialize, Serialize};

use crate::model::layer::{LayerEnvelope, LayerStatus, VerdictStatus};
use crate::model::CommanderDependent;
use crate::packs::profile_thresholds::{DomainThresholds, ProfileThresholdsPack, DOMAIN_ORDER};
use crate::packs::PackLoadOutcome;
use crate::pipeline::{coherence, commander_reliability, requirement_detection, resilience_math};

/// Compiled version pin for this layer's payload shape.
pub const VERSION: &str = "sufficiency_summary_v1";

/// One domain's verdict (spec §3 `DomainVerdict`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainVerdict {
    pub status: VerdictStatus,
    pub codes: Vec<String>,
}

fn verdict(status: VerdictStatus, mut codes: Vec<String>) -> DomainVerdict {
    codes.sort();
    codes.dedup();
    DomainVerdict { status, codes }
}

/// One domain entry in the fixed-order domain list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEntry {
    pub domain: String,
    pub status: VerdictStatus,
    pub codes: Vec<String>,
}

/// This layer's body. `domains` is a fixed-order array (not an object) so
/// that canonical-JSON key sorting never disturbs the spec-mandated
/// `required_effects, baseline_prob, stress_prob, coherence, resilience,
/// commander` order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub profile_thresholds_version: String,
    pub calibration_snapshot_version: String,
    pub selected_profile_id: String,
    pub selection_source: String,
    pub aggregate_status: VerdictStatus,
    pub domains: Vec<DomainEntry>,
}

fn skip(reason: &str) -> LayerEnvelope<Body> {
    LayerEnvelope::new(
        VERSION,
        LayerStatus::Skip,
        Some(reason.to_string()),
        vec![reason.to_string()],
        Body {
            profile_thresholds_version: String::new(),
            calibration_snapshot_version: String::new(),
            selected_profile_id: String::new(),
            selection_source: String::new(),
            aggregate_status: VerdictStatus::Skip,
            domains: vec![],
        },
    )
}

/// `#missing`/`#unknowns` proxies read off `RequirementDetection`'s own code
/// set: an unimplemented flag is a missing-coverage signal, one per distinct
/// flag name; an unresolved primitive reference is an unknown-coverage
/// signal, counted once per `RequirementDetection` run regardless of how
/// many individual patterns reference unknown primitives (the layer dedupes
/// its own codes and does not expose a per-pattern breakdown).
fn required_effects_counts(requirement_detection: &LayerEnvelope<requirement_detection::Body>) -> (u32, u32) {
    let missing = requirement_detection
        .codes
        .iter()
        .filter(|c| c.starts_with("REQUIREMENT_FLAG_UNIMPLEMENTED__"))
        .count() as u32;
    let unknowns = u32::from(
        requirement_detection
            .codes
            .iter()
            .any(|c| c == "UNKNOWN_PRIMITIVE_ID_IN_SIGNATURES"),
    );
    (missing, unknowns)
}

fn evaluate_required_effects(
    thresholds: &DomainThresholds,
    requirement_detection: &LayerEnvelope<requirement_detection::Body>,
) -> DomainVerdict {
    let (missing, unknowns) = required_effects_counts(requirement_detection);
    let mut codes = Vec::new();
    let mut status = VerdictStatus::Pass;
    if missing > thresholds.required_effects.max_missing {
        status = VerdictStatus::Fail;
        codes.push("REQUIRED_EFFECTS_MISSING_EXCEEDED".to_string());
    }
    if unknowns > thresholds.required_effects.max_unknowns && status != VerdictStatus::Fail {
        status = VerdictStatus::Warn;
        codes.push("REQUIRED_EFFECTS_UNKNOWNS_EXCEEDED".to_string());
    }
    verdict(status, codes)
}

fn evaluate_baseline_prob(
    thresholds: &DomainThresholds,
    reliability: &LayerEnvelope<commander_reliability::Body>,
) -> DomainVerdict {
    let min = thresholds.baseline_prob.min_cast_reliability;
    let values = [
        reliability.body.cast_reliability_t3,
        reliability.body.cast_reliability_t4,
        reliability.body.cast_reliability_t6,
    ];
    if values.iter().any(|v| *v < min) {
        verdict(VerdictStatus::Fail, vec!["BASELINE_PROB_CAST_RELIABILITY_BELOW_MIN".to_string()])
    } else {
        verdict(VerdictStatus::Pass, vec![])
    }
}

fn evaluate_stress_prob(thresholds: &DomainThresholds, resilience: &LayerEnvelope<resilience_math::Body>) -> DomainVerdict {
    let t = &thresholds.stress_prob;
    let mut codes = Vec::new();
    let mut status = VerdictStatus::Pass;
    if resilience.body.engine_continuity_after_removal < t.min_continuity {
        status = VerdictStatus::Fail;
        codes.push("STRESS_PROB_CONTINUITY_BELOW_MIN".to_string());
    }
    if resilience.body.rebuild_after_wipe < t.min_rebuild {
        status = VerdictStatus::Fail;
        codes.push("STRESS_PROB_REBUILD_BELOW_MIN".to_string());
    }
    if resilience.body.graveyard_fragility_delta > t.max_graveyard_fragility {
        status = VerdictStatus::Fail;
        codes.push("STRESS_PROB_GRAVEYARD_FRAGILITY_ABOVE_MAX".to_string());
    }
    verdict(status, codes)
}

fn evaluate_coherence(thresholds: &DomainThresholds, coherence: &LayerEnvelope<coherence::Body>) -> DomainVerdict {
    let t = &thresholds.coherence;
    let mut codes = Vec::new();
    let mut status = VerdictStatus::Pass;
    if coherence.body.dead_slot_ratio > t.max_dead_slot_ratio {
        status = VerdictStatus::Fail;
        codes.push("COHERENCE_DEAD_SLOT_RATIO_ABOVE_MAX".to_string());
    }
    if coherence.body.overlap_score < t.min_overlap_score {
        status = VerdictStatus::Fail;
        codes.push("COHERENCE_OVERLAP_SCORE_BELOW_MIN".to_string());
    }
    verdict(status, codes)
}

fn evaluate_resilience(thresholds: &DomainThresholds, resilience: &LayerEnvelope<resilience_math::Body>) -> DomainVerdict {
    match resilience.body.commander_fragility_delta {
        None => verdict(VerdictStatus::Warn, vec!["RESILIENCE_COMMANDER_FRAGILITY_UNAVAILABLE".to_string()]),
        Some(delta) if delta > thresholds.resilience.max_commander_fragility => {
            verdict(VerdictStatus::Fail, vec!["RESILIENCE_COMMANDER_FRAGILITY_ABOVE_MAX".to_string()])
        }
        Some(_) => verdict(VerdictStatus::Pass, vec![]),
    }
}

fn evaluate_commander(
    thresholds: &DomainThresholds,
    reliability: &LayerEnvelope<commander_reliability::Body>,
    commander_dependent: CommanderDependent,
) -> DomainVerdict {
    let t = &thresholds.commander;
    let mut codes = Vec::new();
    let mut status = VerdictStatus::Pass;

    if commander_dependent != CommanderDependent::Low {
        match reliability.body.protection_coverage_proxy {
            None => {
                status = VerdictStatus::Warn;
                codes.push("COMMANDER_PROTECTION_COVERAGE_UNAVAILABLE".to_string());
            }
            Some(coverage) if coverage < t.min_protection_coverage => {
                status = VerdictStatus::Fail;
                codes.push("COMMANDER_PROTECTION_COVERAGE_BELOW_MIN".to_string());
            }
            Some(_) => {}
        }
    }

    match reliability.body.commander_fragility_delta {
        None => {
            if status != VerdictStatus::Fail {
                status = VerdictStatus::Warn;
            }
            codes.push("RESILIENCE_COMMANDER_FRAGILITY_UNAVAILABLE".to_string());
        }
        Some(delta) if delta > t.max_commander_fragility => {
            status = VerdictStatus::Fail;
            codes.push("COMMANDER_FRAGILITY_ABOVE_MAX".to_string());
        }
        Some(_) => {}
    }

    verdict(status, codes)
}

fn aggregate(domains: &[DomainEntry]) -> VerdictStatus {
    domains.iter().map(|d| d.status).max().unwrap_or(VerdictStatus::Pass)
}

/// Run `SufficiencySummary`. All Phase-3 layer envelopes must be ready
/// (`OK`/`WARN`) or this SKIPs per spec §4.12's upstream readiness gate.
#[allow(clippy::too_many_arguments)]
#[must_use]
pub fn run(
    requirement_detection: &LayerEnvelope<requirement_detection::Body>,
    coherence: &LayerEnvelope<coherence::Body>,
    resilience: &LayerEnvelope<resilience_math::Body>,
    reliability: &LayerEnvelope<commander_reliability::Body>,
    commander_dependent: CommanderDependent,
    profile_id: &str,
    thresholds_pack: &PackLoadOutcome<ProfileThresholdsPack>,
    calibration_version: Option<&str>,
) -> LayerEnvelope<Body> {
    if !requirement_detection.is_ready()
        || !coherence.is_ready()
        || !resilience.is_ready()
        || !reliability.is_ready()
    {
        return skip("UPSTREAM_PHASE3_UNAVAILABLE");
    }

    let PackLoadOutcome::Loaded(pack) = thresholds_pack else {
        return skip("PROFILE_THRESHOLDS_UNAVAILABLE");
    };
    let Some(calibration_version) = calibration_version else {
        return skip("CALIBRATION_SNAPSHOT_UNAVAILABLE");
    };
    let Some(thresholds) = pack.profiles.get(profile_id) else {
        return skip("PROFILE_THRESHOLDS_UNAVAILABLE");
    };

    let domains: Vec<DomainEntry> = DOMAIN_ORDER
        .iter()
        .map(|name| {
            let verdict = match *name {
                "required_effects" => evaluate_required_effects(&thresholds.domains, requirement_detection),
                "baseline_prob" => evaluate_baseline_prob(&thresholds.domains, reliability),
                "stress_prob" => evaluate_stress_prob(&thresholds.domains, resilience),
                "coherence" => evaluate_coherence(&thresholds.domains, coherence),
                "resilience" => evaluate_resilience(&thresholds.domains, resilience),
                "commander" => evaluate_commander(&thresholds.domains, reliability, commander_dependent),
                other => unreachable!("unknown domain {other}"),
            };
            DomainEntry {
                domain: (*name).to_string(),
                status: verdict.status,
                codes: verdict.codes,
            }
        })
        .collect();

    let aggregate_status = aggregate(&domains);

    LayerEnvelope::new(
        VERSION,
        LayerStatus::Ok,
        None,
        vec![],
        Body {
            profile_thresholds_version: pack.version.clone(),
            calibration_snapshot_version: calibration_version.to_string(),
            selected_profile_id: profile_id.to_string(),
            selection_source: "profile_id".to_string(),
            aggregate_status,
            domains,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::{aggregate, DomainEntry};
    use crate::model::layer::VerdictStatus;

    fn entry(domain: &str, status: VerdictStatus) -> DomainEntry {
        DomainEntry {
            domain: domain.to_string(),
            status,
            codes: vec![],
        }
    }

    #[test]
    fn aggregate_prefers_fail_over_warn() {
        let domains = vec![entry("a", VerdictStatus::Warn), entry("b", VerdictStatus::Fail)];
        assert_eq!(aggregate(&domains), VerdictStatus::Fail);
    }

    #[test]
    fn aggregate_prefers_skip_over_all() {
        let domains = vec![entry("a", VerdictStatus::Fail), entry("b", VerdictStatus::Skip)];
        assert_eq!(aggregate(&domains), VerdictStatus::Skip);
    }

    #[test]
    fn aggregate_of_all_pass_is_pass() {
        let domains = vec![entry("a", VerdictStatus::Pass)];
        assert_eq!(aggregate(&domains), VerdictStatus::Pass);
    }
}
