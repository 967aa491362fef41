use crate::core::models::identifiers::{LabelSelection, StructureIdentifier};
use crate::engine::alignment::align_and_score;
use crate::engine::assembler::assemble;
use crate::engine::cancel::CancellationToken;
use crate::engine::config::SearchConfig;
use crate::engine::context::SearchContext;
use crate::engine::error::SearchError;
use crate::engine::extractor::{QueryMotif, extract};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::state::SearchResult;
use tracing::{info, instrument};

/// A user-specified query motif: a set of residues from one reference
/// structure.
#[derive(Debug, Clone, PartialEq)]
pub struct MotifDefinition {
    pub structure_id: StructureIdentifier,
    pub selections: Vec<LabelSelection>,
}

impl MotifDefinition {
    pub fn new(structure_id: StructureIdentifier, selections: Vec<LabelSelection>) -> Self {
        Self {
            structure_id,
            selections,
        }
    }
}

/// Resolves a motif definition into its geometric fingerprint without running
/// a search.
pub fn extract_motif(
    context: &SearchContext<'_>,
    definition: &MotifDefinition,
) -> Result<QueryMotif, SearchError> {
    let structure = context
        .structures
        .get(&definition.structure_id)
        .ok_or_else(|| SearchError::StructureNotFound(definition.structure_id.clone()))?;
    extract(structure, &definition.selections)
}

/// Runs a complete motif search: extraction, tolerance/exchange-aware
/// candidate assembly against the inverted index, and rigid-body alignment
/// scoring, returning hits ranked by RMSD.
#[instrument(skip_all, name = "motif_search_workflow", fields(query = %definition.structure_id))]
pub fn run(
    context: &SearchContext<'_>,
    definition: &MotifDefinition,
    config: &SearchConfig,
    reporter: &ProgressReporter,
) -> Result<SearchResult, SearchError> {
    let token = CancellationToken::with_timeout(config.timeout);
    run_cancellable(context, definition, config, reporter, &token)
}

/// Like [`run`], but checks the supplied token between work units so callers
/// can cancel an in-flight query; partial results are discarded.
pub fn run_cancellable(
    context: &SearchContext<'_>,
    definition: &MotifDefinition,
    config: &SearchConfig,
    reporter: &ProgressReporter,
    token: &CancellationToken,
) -> Result<SearchResult, SearchError> {
    // === Phase 1: Resolve the query and extract its fingerprint ===
    reporter.report(Progress::PhaseStart { name: "Extraction" });
    let structure = context
        .structures
        .get(&definition.structure_id)
        .ok_or_else(|| SearchError::StructureNotFound(definition.structure_id.clone()))?;
    let motif = extract(structure, &definition.selections)?;
    info!(
        size = motif.size(),
        pairs = motif.pairs.len(),
        "extracted query fingerprint"
    );
    reporter.report(Progress::PhaseFinish);

    // === Phase 2: Indexed multi-way join over descriptor bins ===
    reporter.report(Progress::PhaseStart { name: "Assembly" });
    token.checkpoint()?;
    let candidates = assemble(context.index, &motif, config, token)?;
    info!(candidates = candidates.len(), "assembled candidate correspondences");
    reporter.report(Progress::PhaseFinish);

    // === Phase 3: Superposition and RMSD scoring ===
    reporter.report(Progress::PhaseStart { name: "Alignment" });
    reporter.report(Progress::TaskStart {
        total_steps: candidates.len() as u64,
    });
    let transformed = align_and_score(
        context.structures,
        structure,
        &motif,
        candidates,
        config,
        token,
    )?;
    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);

    info!(hits = transformed.len(), "search finished");
    Ok(SearchResult::new(transformed).truncated(config.limit))
}
