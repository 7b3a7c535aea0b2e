//! Library conflict scan.
//!
//! ## Usage
//!
//! ```bash
//! cc-conflicts zlib fmt abseil-cpp            # groups of 3 targets (k = module count)
//! cc-conflicts zlib fmt abseil-cpp -k 2       # every pair
//! cc-conflicts zlib@1.3.1 fmt --anchor zlib   # only combinations with zlib
//! ```
//!
//! ## Steps
//!
//! 1. Resolve module versions against the registry
//! 2. Materialize a scratch Bazel workspace depending on those versions
//! 3. Enumerate public `cc_library` targets
//! 4. Probe each target's headers down to a compiling subset
//! 5. Plan k-combinations and build them all in one Bazel invocation
//! 6. Correlate completion events into a [`ScanReport`]

mod errors;
mod options;
mod resolve;

use anyhow::Result;

use crate::build::{Bazel, BuildSystem, TargetQuery};
use crate::core::LibraryTarget;
use crate::plan::{plan, plan_anchored, synthetic_unit};
use crate::probe::{HeaderProbe, ProbedTarget};
use crate::registry::LocalRegistry;
use crate::report::{ResultAggregator, ScanReport};
use crate::util::diagnostic::{Diagnostic, Diagnostics};
use crate::util::shell::{Shell, Status};
use crate::workspace::{ModuleDep, ScratchWorkspace};

pub use self::errors::ScanError;
pub use self::options::{ModuleSpec, ModuleSpecParseError, ScanOptions, ScanSettings};
pub use self::resolve::{check_anchor, effective_combination_size, resolve_bazel, resolve_modules};

/// Run a full scan.
///
/// Inputs are validated before Bazel is first invoked. The scratch
/// workspace is removed after a completed scan unless
/// [`ScanOptions::keep_workspace`] is set; a failed scan leaves it behind.
pub fn scan(options: &ScanOptions, shell: &Shell) -> Result<ScanReport> {
    let registry = LocalRegistry::open(&options.registry).map_err(ScanError::from)?;

    shell.status(Status::Resolving, "module versions");
    let deps = resolve_modules(&registry, registry.root(), &options.modules)?;
    let names = options.module_names();

    let settings = ScanSettings {
        combination_size: effective_combination_size(options.combination_size, names.len())?,
        anchor: options.anchor.clone(),
        max_exhaustive_headers: options.config.probe.max_exhaustive_headers,
        exclude_targets: options.config.scan.exclude_targets.clone(),
    };
    check_anchor(settings.anchor.as_deref(), &names)?;

    let program = resolve_bazel(
        options
            .bazel
            .as_deref()
            .or(options.config.bazel.program.as_deref()),
    )?;
    tracing::debug!("Using bazel at {}", program.display());

    let workspace = ScratchWorkspace::create()?;
    let local_registry = options
        .config
        .bazel
        .use_local_registry
        .then(|| registry.root());
    workspace.initialize(&deps, local_registry)?;
    shell.status(
        Status::Created,
        format!("scratch workspace {}", workspace.root().display()),
    );

    let mut bazel = Bazel::new(program, &workspace)
        .startup_args(options.config.bazel.startup_args.clone())
        .build_args(options.config.bazel.build_args.clone());

    let report = match run(&mut bazel, &workspace, &deps, &settings, shell) {
        Ok(report) => report,
        Err(e) => {
            tracing::info!("Scratch workspace left at {}", workspace.root().display());
            return Err(e);
        }
    };

    if options.keep_workspace {
        shell.note(format!("kept scratch workspace {}", workspace.root().display()));
    } else {
        workspace.cleanup()?;
    }

    Ok(report)
}

fn run(
    bazel: &mut Bazel,
    workspace: &ScratchWorkspace,
    deps: &[ModuleDep],
    settings: &ScanSettings,
    shell: &Shell,
) -> Result<ScanReport> {
    let names: Vec<String> = deps.iter().map(|d| d.name.clone()).collect();
    let mut diagnostics = Diagnostics::new();

    shell.status(Status::Querying, format!("cc_library targets of {}", names.join(", ")));
    let targets = enumerate_targets(bazel, &names, &settings.exclude_targets, &mut diagnostics)?;

    // Modules without libraries only slow Bazel down, and some fail to load.
    let with_targets: Vec<ModuleDep> = deps
        .iter()
        .filter(|d| targets.iter().any(|t| t.belongs_to(&d.name)))
        .cloned()
        .collect();
    if with_targets.len() != deps.len() {
        workspace.write_module_file(&with_targets)?;
    }

    check_conflicts(bazel, &targets, settings, diagnostics, shell)
}

/// Public library targets of `modules`, minus excluded label prefixes.
///
/// Modules without any target get a note in `diagnostics`.
pub fn enumerate_targets<Q: TargetQuery + ?Sized>(
    query: &mut Q,
    modules: &[String],
    exclude: &[String],
    diagnostics: &mut Diagnostics,
) -> Result<Vec<LibraryTarget>> {
    let targets: Vec<LibraryTarget> = query
        .library_targets(modules)?
        .into_iter()
        .filter(|t| {
            let excluded = exclude.iter().any(|prefix| t.label().starts_with(prefix.as_str()));
            if excluded {
                tracing::debug!("Excluding {}", t);
            }
            !excluded
        })
        .collect();

    for module in modules {
        if !targets.iter().any(|t| t.belongs_to(module)) {
            diagnostics.push(Diagnostic::note(format!(
                "module `{}` has no public cc_library targets",
                module
            )));
        }
    }

    tracing::info!("Found {} library targets", targets.len());
    Ok(targets)
}

/// Probe, plan, build and aggregate.
pub fn check_conflicts<B: BuildSystem + ?Sized>(
    build: &mut B,
    targets: &[LibraryTarget],
    settings: &ScanSettings,
    mut diagnostics: Diagnostics,
    shell: &Shell,
) -> Result<ScanReport> {
    if settings.combination_size < 2 {
        return Err(ScanError::InvalidCombinationSize {
            size: settings.combination_size,
        }
        .into());
    }

    let (probed, probe_diagnostics) = probe_targets(build, targets, settings, shell)?;
    diagnostics.merge(probe_diagnostics);

    let combinations = match &settings.anchor {
        Some(anchor) => plan_anchored(&probed, settings.combination_size, anchor),
        None => plan(&probed, settings.combination_size),
    };

    let mut aggregator = ResultAggregator::new(&combinations);
    if combinations.is_empty() {
        shell.status(Status::Skipped, "fewer than two library targets, nothing to combine");
    } else {
        shell.status(Status::Building, format!("{} combinations", combinations.len()));
        let units: Vec<_> = combinations.iter().map(synthetic_unit).collect();
        let events = build.run_build(&units)?;
        aggregator.record_all(&events);
    }

    let report = aggregator.finish(diagnostics);
    if !report.faults.is_empty() {
        shell.warn(format!(
            "{} inconsistencies between planned units and build events",
            report.faults.len()
        ));
    }
    shell.status(Status::Finished, &report.summary);
    Ok(report)
}

fn probe_targets<B: BuildSystem + ?Sized>(
    build: &mut B,
    targets: &[LibraryTarget],
    settings: &ScanSettings,
    shell: &Shell,
) -> Result<(Vec<ProbedTarget>, Diagnostics)> {
    shell.status(Status::Probing, format!("headers of {} targets", targets.len()));

    let mut diagnostics = Diagnostics::new();
    let mut probe = HeaderProbe::new(build, settings.max_exhaustive_headers);
    let mut progress = shell.progress(targets.len() as u64, "Probing");
    let mut probed = Vec::with_capacity(targets.len());

    for target in targets {
        probed.push(probe.probe(target, &mut diagnostics)?);
        progress.step(target);
    }
    progress.finish();

    Ok((probed, diagnostics))
}
