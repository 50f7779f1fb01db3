//! End-to-end classification run.
//!
//! events -> failing cells -> device profiles -> (per permanency population)
//! classifier -> optional multi-socket refinement -> category rows.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use dt_common::{Category, LogicalClass, Mechanism, Permanency, Result};
use dt_config::{ClassifierOptions, Geometry};
use serde::Serialize;

use crate::aggregate::aggregate_events;
use crate::classify::Classifier;
use crate::ingest::{Dataset, FailureType};
use crate::log_event;
use crate::logging::{event_names, LogContext, Stage};
use crate::profile::{build_profiles, DeviceFailureProfile};

/// One classified device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRow {
    pub sid: String,
    pub memory_id: u32,
    pub dram_model: String,
    pub server_manufacturer: String,
    pub category: Category,
    pub logical_class: LogicalClass,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mechanism: Option<Mechanism>,
    pub permanency: Permanency,
    pub cells: usize,
    pub first_seen: NaiveDateTime,
    pub last_seen: NaiveDateTime,
    pub error_kinds: String,
    pub failure_type: FailureType,
}

impl CategoryRow {
    fn new(profile: &DeviceFailureProfile, category: Category, failure_type: FailureType) -> Self {
        CategoryRow {
            sid: profile.device().sid.to_string(),
            memory_id: profile.device().memory_id,
            dram_model: profile.dram_model().to_string(),
            server_manufacturer: profile.server_manufacturer().to_string(),
            category,
            logical_class: category.logical_class(),
            mechanism: category.mechanism(),
            permanency: profile.permanency(),
            cells: profile.cell_count(),
            first_seen: profile.first_seen(),
            last_seen: profile.last_seen(),
            error_kinds: profile.kinds().label(),
            failure_type,
        }
    }

    /// `category-p` / `category-t`.
    pub fn label(&self) -> String {
        format!("{}-{}", self.category.name(), self.permanency.initial())
    }
}

/// Counters reported alongside the category table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub events: usize,
    pub rejected_rows: usize,
    pub failing_cells: usize,
    pub devices: usize,
    pub missing_inventory: usize,
    pub excluded_devices: usize,
    pub transient: usize,
    pub permanent: usize,
    pub refined_devices: usize,
    pub categories: BTreeMap<Category, usize>,
}

/// Rows in device order plus run statistics.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub rows: Vec<CategoryRow>,
    pub stats: RunStats,
}

/// Run the full pipeline over an ingested dataset.
pub fn run_pipeline(
    dataset: &Dataset,
    options: &ClassifierOptions,
    ctx: &LogContext,
) -> Result<PipelineOutput> {
    let mut stats = RunStats {
        events: dataset.events.len(),
        rejected_rows: dataset.rejected.len(),
        ..RunStats::default()
    };

    let cells = aggregate_events(&dataset.events);
    stats.failing_cells = cells.len();
    log_event!(
        ctx,
        INFO,
        event_names::AGGREGATE_FINISHED,
        Stage::Aggregate,
        "events aggregated",
        events = stats.events as u64,
        cells = stats.failing_cells as u64
    );

    let set = build_profiles(cells, &dataset.inventory, options, ctx);
    stats.devices = set.profiles.len();
    stats.missing_inventory = set.missing_inventory.len();
    stats.excluded_devices = set.excluded.len();

    log_event!(
        ctx,
        INFO,
        event_names::CLASSIFY_STARTED,
        Stage::Classify,
        "classification started",
        devices = stats.devices as u64,
        split_by_permanency = options.split_by_permanency,
        workers = options.workers as u64
    );

    let profiles = set.profiles;
    let labels = classify_fleet(&profiles, options, ctx, &mut stats)?;

    let mut rows = Vec::with_capacity(profiles.len());
    for (profile, category) in profiles.iter().zip(labels) {
        *stats.categories.entry(category).or_default() += 1;
        rows.push(CategoryRow::new(
            profile,
            category,
            dataset.tickets.failure_type(&profile.device().sid),
        ));
    }

    log_event!(
        ctx,
        INFO,
        event_names::CLASSIFY_FINISHED,
        Stage::Classify,
        "classification finished",
        devices = rows.len() as u64,
        categories = stats.categories.len() as u64
    );

    Ok(PipelineOutput { rows, stats })
}

/// Classify every profile, one run per permanency population when split,
/// then apply the multi-socket refinement across the whole fleet.
///
/// Fills the permanency and refinement counters of `stats`.
pub fn classify_fleet(
    profiles: &[DeviceFailureProfile],
    options: &ClassifierOptions,
    ctx: &LogContext,
    stats: &mut RunStats,
) -> Result<Vec<Category>> {
    let permanency: Vec<Permanency> = profiles.iter().map(|p| p.permanency()).collect();
    stats.transient = permanency
        .iter()
        .filter(|p| **p == Permanency::Transient)
        .count();
    stats.permanent = profiles.len() - stats.transient;

    let populations: Vec<(&str, Vec<usize>)> = if options.split_by_permanency {
        [Permanency::Transient, Permanency::Permanent]
            .into_iter()
            .map(|which| {
                let members = (0..profiles.len()).filter(|&i| permanency[i] == which).collect();
                (which.name(), members)
            })
            .collect()
    } else {
        vec![("all", (0..profiles.len()).collect())]
    };

    let classifier = Classifier::new(options.clone());
    let mut labels: Vec<Option<Category>> = vec![None; profiles.len()];
    for (name, members) in populations {
        if members.is_empty() {
            continue;
        }
        let subset: Vec<DeviceFailureProfile> =
            members.iter().map(|&i| profiles[i].clone()).collect();
        let result = classifier.classify(&subset)?;
        log_event!(
            ctx,
            DEBUG,
            event_names::CLASSIFY_POPULATION,
            Stage::Classify,
            "population classified",
            population = name,
            devices = subset.len() as u64
        );
        for (&i, label) in members.iter().zip(result) {
            labels[i] = Some(label);
        }
    }

    let mut labels: Vec<Category> = profiles
        .iter()
        .zip(labels)
        .map(|(profile, label)| {
            label.ok_or_else(|| {
                dt_common::Error::Classification(format!("{} was not classified", profile.device()))
            })
        })
        .collect::<Result<_>>()?;

    // Refinement targets from both populations are re-run together.
    if options.refine_multi_socket {
        stats.refined_devices = refine_multi_socket(profiles, &mut labels, options, ctx)?;
    }
    Ok(labels)
}

/// Re-run `multi_socket` and `bank_control` devices with multi-socket
/// detection off and multi-rank on. Returns the number of devices re-run.
pub fn refine_multi_socket(
    profiles: &[DeviceFailureProfile],
    labels: &mut [Category],
    options: &ClassifierOptions,
    ctx: &LogContext,
) -> Result<usize> {
    let targets: Vec<usize> = labels
        .iter()
        .enumerate()
        .filter(|(_, l)| matches!(l, Category::MultiSocket | Category::BankControl))
        .map(|(i, _)| i)
        .collect();
    if targets.is_empty() {
        return Ok(0);
    }

    let refiner = Classifier::with_geometry(
        Geometry::STANDARD,
        ClassifierOptions {
            msocket: false,
            mrank: true,
            ..options.clone()
        },
    );
    let subset: Vec<DeviceFailureProfile> = targets.iter().map(|&i| profiles[i].clone()).collect();
    let relabeled = refiner.classify(&subset)?;
    for (&i, label) in targets.iter().zip(relabeled) {
        labels[i] = label;
    }

    log_event!(
        ctx,
        DEBUG,
        event_names::CLASSIFY_REFINED,
        Stage::Classify,
        "multi-socket devices re-classified",
        devices = targets.len() as u64
    );
    Ok(targets.len())
}
