//! The standards engine: one facade over the resolver, the scoring engines
//! and their caches.
//!
//! RULES:
//!   - Every read builds one `ConfigurationContext` per call and hands the
//!     same resolver to every engine it touches.
//!   - Result caches are keyed by the configuration fingerprint; tolerance is
//!     applied after the lookup.
//!   - Custom-standard writes invalidate the template's cached results.

use crate::{
    catalog::{CatalogCache, TemplateCatalog},
    config::EngineConfig,
    context::ConfigurationContext,
    custom_standard::{self, CustomStandard, CustomStandardDraft, SaveOutcome, ValidationResult},
    error::{ScoringError, ScoringResult},
    fingerprint::{fingerprint, Fingerprint},
    individual::{AspectResult, CategoryResult, FinalAssessment, IndividualScoringEngine},
    layer::OverrideSet,
    ranking::{
        self, CombinedParticipantBase, CombinedRanking, CombinedRankingQuery, ConclusionSummary,
        Page, ParticipantBase, ParticipantRanking, RankingEngine, RankingPage, RankingQuery,
    },
    resolver::{EffectiveStandard, StandardResolver},
    result_cache::{CacheKey, CacheStats, InMemoryResultCache, ResultCache, ResultKind},
    scoring::clamp_tolerance,
    session::InMemorySessionCarrier,
    source::{SessionCarrier, StandardsSource},
    statistics::{DistributionData, StatisticsEngine},
    store::AssessmentStore,
    types::{
        AspectId, CategoryId, Code, CustomStandardId, EventId, InstitutionId, ParticipantId,
        PositionId, TemplateId,
    },
};
use serde::Serialize;
use std::sync::Arc;

type CategoryBases = Arc<Vec<ParticipantBase>>;
type CombinedBases = Arc<Vec<CombinedParticipantBase>>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngineCacheStats {
    pub catalog_loads: u64,
    pub category_rankings: CacheStats,
    pub combined_rankings: CacheStats,
    pub distributions: CacheStats,
}

pub struct StandardsEngine<S: StandardsSource> {
    store:              S,
    config:             EngineConfig,
    catalogs:           CatalogCache,
    session:            Box<dyn SessionCarrier>,
    category_cache:     Box<dyn ResultCache<CategoryBases>>,
    combined_cache:     Box<dyn ResultCache<CombinedBases>>,
    distribution_cache: Box<dyn ResultCache<DistributionData>>,
}

impl StandardsEngine<AssessmentStore> {
    /// In-memory, migrated store with the test configuration.
    pub fn build_test() -> ScoringResult<Self> {
        let store = AssessmentStore::in_memory()?;
        store.migrate()?;
        Ok(Self::new(
            store,
            EngineConfig::default_test(),
            Box::new(InMemorySessionCarrier::new()),
        ))
    }
}

impl<S: StandardsSource> StandardsEngine<S> {
    pub fn new(store: S, config: EngineConfig, session: Box<dyn SessionCarrier>) -> Self {
        Self {
            store,
            config,
            catalogs:           CatalogCache::new(),
            session,
            category_cache:     Box::new(InMemoryResultCache::new()),
            combined_cache:     Box::new(InMemoryResultCache::new()),
            distribution_cache: Box::new(InMemoryResultCache::new()),
        }
    }

    /// Replace the in-memory result caches.
    pub fn with_result_caches(
        mut self,
        category: Box<dyn ResultCache<CategoryBases>>,
        combined: Box<dyn ResultCache<CombinedBases>>,
        distribution: Box<dyn ResultCache<DistributionData>>,
    ) -> Self {
        self.category_cache = category;
        self.combined_cache = combined;
        self.distribution_cache = distribution;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ── Catalog and context ───────────────────────────────────────

    pub fn catalog(&mut self, template_id: TemplateId) -> ScoringResult<Option<Arc<TemplateCatalog>>> {
        self.catalogs.preload_by_template(&self.store, template_id)
    }

    pub fn context(&self, template_id: TemplateId) -> ScoringResult<ConfigurationContext> {
        ConfigurationContext::load(template_id, self.session.as_ref(), &self.store)
    }

    fn catalog_and_context(
        &mut self,
        template_id: TemplateId,
    ) -> ScoringResult<Option<(Arc<TemplateCatalog>, ConfigurationContext)>> {
        let Some(catalog) = self.catalog(template_id)? else {
            return Ok(None);
        };
        let context = self.context(template_id)?;
        Ok(Some((catalog, context)))
    }

    pub fn fingerprint(&mut self, template_id: TemplateId) -> ScoringResult<Option<Fingerprint>> {
        Ok(self
            .catalog_and_context(template_id)?
            .map(|(catalog, context)| fingerprint(&catalog, &context)))
    }

    pub fn effective_standard(
        &mut self,
        template_id: TemplateId,
    ) -> ScoringResult<Option<EffectiveStandard>> {
        Ok(self
            .catalog_and_context(template_id)?
            .map(|(catalog, context)| StandardResolver::new(&catalog, &context).effective_standard()))
    }

    fn participant_template(
        &self,
        participant_id: ParticipantId,
    ) -> ScoringResult<Option<TemplateId>> {
        let Some(participant) = self.store.participant(participant_id)? else {
            log::warn!("engine: participant {participant_id} not found");
            return Ok(None);
        };
        let Some(position) = self.store.position(participant.position_id)? else {
            log::warn!(
                "engine: position {} of participant {participant_id} not found",
                participant.position_id
            );
            return Ok(None);
        };
        Ok(Some(position.template_id))
    }

    pub fn clear_catalog_cache(&mut self) {
        self.catalogs.clear_cache();
    }

    pub fn cache_stats(&self) -> EngineCacheStats {
        EngineCacheStats {
            catalog_loads: self.catalogs.load_count(),
            category_rankings: self.category_cache.stats(),
            combined_rankings: self.combined_cache.stats(),
            distributions: self.distribution_cache.stats(),
        }
    }

    fn invalidate_results(&mut self, template_id: TemplateId) {
        self.category_cache.invalidate_template(template_id);
        self.combined_cache.invalidate_template(template_id);
        self.distribution_cache.invalidate_template(template_id);
        log::debug!("engine: cached results dropped for template {template_id}");
    }

    // ── Session layer ─────────────────────────────────────────────

    pub fn session_adjustments(&self, template_id: TemplateId) -> OverrideSet {
        self.session.adjustments(template_id)
    }

    fn adjust_session(&mut self, template_id: TemplateId, edit: impl FnOnce(&mut OverrideSet)) {
        let mut adjustments = self.session.adjustments(template_id);
        edit(&mut adjustments);
        self.session.store_adjustments(template_id, adjustments);
    }

    pub fn set_session_category_weight(
        &mut self,
        template_id: TemplateId,
        code: &str,
        weight: Option<f64>,
    ) {
        self.adjust_session(template_id, |s| s.set_category_weight(Code::from(code), weight));
    }

    pub fn set_session_aspect_weight(
        &mut self,
        template_id: TemplateId,
        code: &str,
        weight: Option<f64>,
    ) {
        self.adjust_session(template_id, |s| s.set_aspect_weight(Code::from(code), weight));
    }

    pub fn set_session_aspect_active(
        &mut self,
        template_id: TemplateId,
        code: &str,
        active: Option<bool>,
    ) {
        self.adjust_session(template_id, |s| s.set_aspect_active(Code::from(code), active));
    }

    pub fn set_session_aspect_rating(
        &mut self,
        template_id: TemplateId,
        code: &str,
        rating: Option<f64>,
    ) {
        self.adjust_session(template_id, |s| s.set_aspect_rating(Code::from(code), rating));
    }

    pub fn set_session_sub_aspect_active(
        &mut self,
        template_id: TemplateId,
        code: &str,
        active: Option<bool>,
    ) {
        self.adjust_session(template_id, |s| s.set_sub_aspect_active(Code::from(code), active));
    }

    pub fn set_session_sub_aspect_rating(
        &mut self,
        template_id: TemplateId,
        code: &str,
        rating: Option<i64>,
    ) {
        self.adjust_session(template_id, |s| s.set_sub_aspect_rating(Code::from(code), rating));
    }

    pub fn reset_session(&mut self, template_id: TemplateId) {
        self.session.clear(template_id);
    }

    // ── Custom standards ──────────────────────────────────────────

    pub fn custom_standard_from_baseline(
        &mut self,
        template_id: TemplateId,
        institution_id: InstitutionId,
        code: &str,
        name: &str,
    ) -> ScoringResult<CustomStandardDraft> {
        let catalog = self
            .catalog(template_id)?
            .ok_or(ScoringError::TemplateNotFound { template_id })?;
        Ok(CustomStandardDraft::from_baseline(&catalog, institution_id, code, name))
    }

    pub fn custom_standards(&self, template_id: TemplateId) -> ScoringResult<Vec<CustomStandard>> {
        self.store.custom_standards_for_template(template_id)
    }

    pub fn custom_standard(&self, id: CustomStandardId) -> ScoringResult<Option<CustomStandard>> {
        self.store.custom_standard(id)
    }

    pub fn validate_custom_standard(
        &mut self,
        draft: &CustomStandardDraft,
    ) -> ScoringResult<ValidationResult> {
        let Some(catalog) = self.catalog(draft.template_id)? else {
            return Ok(ValidationResult {
                valid: false,
                errors: vec![format!("Template {} not found", draft.template_id)],
                warnings: Vec::new(),
            });
        };
        Ok(custom_standard::validate(&catalog, draft, &self.config))
    }

    /// Validate, then persist. An invalid draft is returned, never stored.
    pub fn save_custom_standard(
        &mut self,
        draft: &CustomStandardDraft,
    ) -> ScoringResult<SaveOutcome> {
        let validation = self.validate_custom_standard(draft)?;
        if !validation.valid {
            log::warn!(
                "engine: custom standard '{}' rejected: {}",
                draft.code,
                validation.errors.join("; ")
            );
            return Ok(SaveOutcome { custom_standard_id: None, validation });
        }
        let id = self.store.insert_custom_standard(draft)?;
        self.invalidate_results(draft.template_id);
        Ok(SaveOutcome { custom_standard_id: Some(id), validation })
    }

    pub fn update_custom_standard(
        &mut self,
        standard: &CustomStandard,
    ) -> ScoringResult<SaveOutcome> {
        let id = standard.custom_standard_id;
        let existing = self
            .store
            .custom_standard(id)?
            .ok_or(ScoringError::CustomStandardNotFound { id })?;

        let draft = CustomStandardDraft::from(standard);
        let validation = self.validate_custom_standard(&draft)?;
        if !validation.valid {
            log::warn!(
                "engine: update of custom standard {id} rejected: {}",
                validation.errors.join("; ")
            );
            return Ok(SaveOutcome { custom_standard_id: None, validation });
        }
        if !self.store.update_custom_standard(id, &draft)? {
            return Err(ScoringError::CustomStandardNotFound { id });
        }
        log::info!("custom standard {id} updated");
        self.invalidate_results(existing.template_id);
        self.invalidate_results(draft.template_id);
        Ok(SaveOutcome { custom_standard_id: Some(id), validation })
    }

    pub fn delete_custom_standard(&mut self, id: CustomStandardId) -> ScoringResult<bool> {
        let Some(existing) = self.store.custom_standard(id)? else {
            log::warn!("engine: custom standard {id} not found, nothing to delete");
            return Ok(false);
        };
        let deleted = self.store.delete_custom_standard(id)?;
        if deleted {
            log::info!("custom standard {id} deleted");
            self.invalidate_results(existing.template_id);
        }
        Ok(deleted)
    }

    /// Make `id` the custom standard of `template_id`; `None` restores the baseline.
    pub fn select_custom_standard(
        &mut self,
        template_id: TemplateId,
        id: Option<CustomStandardId>,
    ) -> ScoringResult<()> {
        if let Some(id) = id {
            let standard = self
                .store
                .custom_standard(id)?
                .ok_or(ScoringError::CustomStandardNotFound { id })?;
            if standard.template_id != template_id {
                return Err(ScoringError::TemplateMismatch {
                    id,
                    expected: template_id,
                    actual: standard.template_id,
                });
            }
        }
        self.store.select_custom_standard(template_id, id)?;
        match id {
            Some(id) => log::info!("custom standard {id} selected for template {template_id}"),
            None => log::info!("template {template_id} reset to baseline standard"),
        }
        self.invalidate_results(template_id);
        Ok(())
    }

    // ── Individual scoring ────────────────────────────────────────

    pub fn get_aspect_assessments(
        &mut self,
        participant_id: ParticipantId,
        category_id: CategoryId,
        tolerance_percent: f64,
    ) -> ScoringResult<Vec<AspectResult>> {
        let Some(template_id) = self.participant_template(participant_id)? else {
            return Ok(Vec::new());
        };
        let Some((catalog, context)) = self.catalog_and_context(template_id)? else {
            return Ok(Vec::new());
        };
        let resolver = StandardResolver::new(&catalog, &context);
        IndividualScoringEngine::new(&self.store).get_aspect_assessments(
            &resolver,
            participant_id,
            category_id,
            tolerance_percent,
        )
    }

    pub fn get_category_assessment(
        &mut self,
        participant_id: ParticipantId,
        category_code: &str,
        tolerance_percent: f64,
    ) -> ScoringResult<Option<CategoryResult>> {
        let Some(template_id) = self.participant_template(participant_id)? else {
            return Ok(None);
        };
        let Some((catalog, context)) = self.catalog_and_context(template_id)? else {
            return Ok(None);
        };
        let resolver = StandardResolver::new(&catalog, &context);
        IndividualScoringEngine::new(&self.store).get_category_assessment(
            &resolver,
            participant_id,
            category_code,
            tolerance_percent,
        )
    }

    pub fn get_final_assessment(
        &mut self,
        participant_id: ParticipantId,
        tolerance_percent: f64,
    ) -> ScoringResult<Option<FinalAssessment>> {
        let Some(template_id) = self.participant_template(participant_id)? else {
            return Ok(None);
        };
        let Some((catalog, context)) = self.catalog_and_context(template_id)? else {
            return Ok(None);
        };
        let resolver = StandardResolver::new(&catalog, &context);
        IndividualScoringEngine::new(&self.store).get_final_assessment(
            &resolver,
            participant_id,
            tolerance_percent,
        )
    }

    // ── Rankings ──────────────────────────────────────────────────

    fn page_or_default(&self, page: Option<Page>) -> Page {
        page.unwrap_or(Page {
            offset: 0,
            limit: self.config.ranking.page_size,
        })
    }

    fn category_bases(
        &mut self,
        catalog: &TemplateCatalog,
        context: &ConfigurationContext,
        category_code: &str,
        event_id: EventId,
        position_id: PositionId,
    ) -> ScoringResult<(CategoryBases, Fingerprint)> {
        let fingerprint = fingerprint(catalog, context);
        let key = CacheKey {
            kind: ResultKind::CategoryRanking,
            template_id: catalog.template_id(),
            scope: vec![event_id, position_id],
            subject: category_code.to_string(),
            fingerprint: fingerprint.clone(),
        };
        if let Some(bases) = self.category_cache.get(&key) {
            log::debug!("engine: category ranking cache hit for '{category_code}' ({fingerprint})");
            return Ok((bases, fingerprint));
        }
        log::debug!("engine: category ranking cache miss for '{category_code}' ({fingerprint})");

        let resolver = StandardResolver::new(catalog, context);
        let bases = Arc::new(RankingEngine::new(&self.store).category_bases(
            &resolver,
            category_code,
            event_id,
            position_id,
        )?);
        self.category_cache.put(key, Arc::clone(&bases));
        Ok((bases, fingerprint))
    }

    /// Full ranking of one category, before paging.
    fn ranked_category(
        &mut self,
        query: &RankingQuery,
    ) -> ScoringResult<Option<(Vec<ParticipantRanking>, Fingerprint)>> {
        let Some((catalog, context)) = self.catalog_and_context(query.template_id)? else {
            return Ok(None);
        };
        let (bases, fingerprint) = self.category_bases(
            &catalog,
            &context,
            query.category_code.as_str(),
            query.event_id,
            query.position_id,
        )?;
        Ok(Some((
            ranking::rank_category(&bases, query.tolerance_percent),
            fingerprint,
        )))
    }

    pub fn get_rankings(
        &mut self,
        query: &RankingQuery,
    ) -> ScoringResult<RankingPage<ParticipantRanking>> {
        let page = self.page_or_default(query.page);
        let tolerance = clamp_tolerance(query.tolerance_percent);
        let Some((ranked, fingerprint)) = self.ranked_category(query)? else {
            return Ok(RankingPage::empty(page, tolerance));
        };

        Ok(RankingPage {
            total: ranked.len(),
            offset: page.offset,
            limit: page.limit,
            tolerance_percent: tolerance,
            summary: ConclusionSummary::from_conclusions(
                ranked.iter().map(|r| r.figures.conclusion),
            ),
            fingerprint: Some(fingerprint),
            items: ranking::paginate(ranked, page),
        })
    }

    /// One participant's row from the full category ranking.
    pub fn get_participant_ranking(
        &mut self,
        query: &RankingQuery,
        participant_id: ParticipantId,
    ) -> ScoringResult<Option<ParticipantRanking>> {
        Ok(self.ranked_category(query)?.and_then(|(ranked, _)| {
            ranked
                .into_iter()
                .find(|r| r.participant_id == participant_id)
        }))
    }

    pub fn get_combined_rankings(
        &mut self,
        query: &CombinedRankingQuery,
    ) -> ScoringResult<RankingPage<CombinedRanking>> {
        let page = self.page_or_default(query.page);
        let tolerance = clamp_tolerance(query.tolerance_percent);
        let Some((catalog, context)) = self.catalog_and_context(query.template_id)? else {
            return Ok(RankingPage::empty(page, tolerance));
        };

        let fingerprint = fingerprint(&catalog, &context);
        let key = CacheKey {
            kind: ResultKind::CombinedRanking,
            template_id: query.template_id,
            scope: vec![query.event_id, query.position_id],
            subject: String::new(),
            fingerprint: fingerprint.clone(),
        };
        let bases = match self.combined_cache.get(&key) {
            Some(bases) => {
                log::debug!("engine: combined ranking cache hit ({fingerprint})");
                bases
            }
            None => {
                log::debug!("engine: combined ranking cache miss ({fingerprint})");
                let resolver = StandardResolver::new(&catalog, &context);
                let bases = Arc::new(RankingEngine::new(&self.store).combined_bases(
                    &resolver,
                    query.event_id,
                    query.position_id,
                )?);
                self.combined_cache.put(key, Arc::clone(&bases));
                bases
            }
        };

        let ranked = ranking::rank_combined(&bases, query.tolerance_percent);
        Ok(RankingPage {
            total: ranked.len(),
            offset: page.offset,
            limit: page.limit,
            tolerance_percent: tolerance,
            summary: ConclusionSummary::from_conclusions(
                ranked.iter().map(|r| r.figures.conclusion),
            ),
            fingerprint: Some(fingerprint),
            items: ranking::paginate(ranked, page),
        })
    }

    // ── Statistics ────────────────────────────────────────────────

    pub fn get_distribution_data(
        &mut self,
        event_id: EventId,
        position_id: PositionId,
        aspect_id: AspectId,
        template_id: TemplateId,
    ) -> ScoringResult<DistributionData> {
        let scale = self.config.rating_scale;
        let Some((catalog, context)) = self.catalog_and_context(template_id)? else {
            return Ok(DistributionData::empty(aspect_id, template_id, scale));
        };
        let Some(aspect) = catalog.aspect_by_id(aspect_id) else {
            log::warn!("engine: aspect {aspect_id} not in template {template_id}");
            return Ok(DistributionData::empty(aspect_id, template_id, scale));
        };

        let fingerprint = fingerprint(&catalog, &context);
        let key = CacheKey {
            kind: ResultKind::Distribution,
            template_id,
            scope: vec![event_id, position_id, aspect_id],
            subject: String::new(),
            fingerprint,
        };
        if let Some(data) = self.distribution_cache.get(&key) {
            log::debug!("engine: distribution cache hit for aspect {aspect_id}");
            return Ok(data);
        }
        log::debug!("engine: distribution cache miss for aspect {aspect_id}");

        let resolver = StandardResolver::new(&catalog, &context);
        let data = StatisticsEngine::new(&self.store).get_distribution_data(
            &resolver,
            aspect,
            event_id,
            position_id,
            scale,
        )?;
        self.distribution_cache.put(key, data.clone());
        Ok(data)
    }
}
