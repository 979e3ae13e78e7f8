//! A preview session: the stateful front of the engine.
//!
//! The session owns the fetch collaborators, the paginator, and the current
//! [`PreviewTable`] snapshot. Every load is split into `begin` (issue a
//! ticket for a slot) and `complete_*` (apply a result). A result is applied
//! only while its ticket is still the newest for its slot, so a slow response
//! to an older request can never overwrite the table produced by a newer one.
//!
//! The synchronous triggers ([`PreviewSession::load`], [`refresh`],
//! [`change_page`], [`set_page_size`]) simply begin and complete in one step;
//! callers driving fetches concurrently use the ticket API directly.
//!
//! The two slots complete in any order. The last explicit-schema payload for
//! the current dataset is kept and re-applied whenever a new preview is
//! published, so a schema that arrives first is not lost. Switching datasets
//! invalidates every outstanding ticket.
//!
//! [`refresh`]: PreviewSession::refresh
//! [`change_page`]: PreviewSession::change_page
//! [`set_page_size`]: PreviewSession::set_page_size

use std::sync::Arc;

use log::{debug, info, warn};
use serde_json::Value as JsonValue;

use crate::{
    annotate::{AnnotationKind, annotate},
    config::PreviewConfig,
    error::FetchError,
    normalize::{CanonicalTable, ResponseNormalizer},
    paginate::{PaginationMode, Paginator},
    payload::{PagedPreview, Payload, RowsEnvelope},
    preview::{FallbackReason, PreviewTable, TableStatus},
    schema::{InferenceOptions, Schema, SchemaOrigin, infer_schema, resolve_schema},
    source::{DatasetId, NoSchema, PagedPreviewSource, PreviewSource, SchemaSource},
    value::Row,
};

/// Independent request streams; a newer request supersedes older ones only
/// within its own slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Preview,
    Schema,
}

impl Slot {
    fn index(self) -> usize {
        match self {
            Slot::Preview => 0,
            Slot::Schema => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct Ticket {
    slot: Slot,
    seq: u64,
}

impl Ticket {
    pub fn slot(&self) -> Slot {
        self.slot
    }
}

pub struct PreviewSession {
    preview_source: Box<dyn PreviewSource>,
    paged_source: Option<Box<dyn PagedPreviewSource>>,
    schema_source: Box<dyn SchemaSource>,
    config: PreviewConfig,
    normalizer: ResponseNormalizer,
    options: InferenceOptions,
    paginator: Paginator,
    dataset: Option<DatasetId>,
    table: Arc<PreviewTable>,
    explicit_schema: Option<JsonValue>,
    issued: [u64; 2],
}

impl PreviewSession {
    pub fn new(config: PreviewConfig, preview_source: impl PreviewSource + 'static) -> Self {
        Self {
            preview_source: Box::new(preview_source),
            paged_source: None,
            schema_source: Box::new(NoSchema),
            normalizer: config.normalizer(),
            options: config.inference_options(),
            paginator: Paginator::new(config.page_size),
            config,
            dataset: None,
            table: Arc::new(PreviewTable::loading()),
            explicit_schema: None,
            issued: [0; 2],
        }
    }

    pub fn with_schema_source(mut self, source: impl SchemaSource + 'static) -> Self {
        self.schema_source = Box::new(source);
        self
    }

    /// Switches the session to server-driven pagination.
    pub fn with_paged_source(mut self, source: impl PagedPreviewSource + 'static) -> Self {
        self.paged_source = Some(Box::new(source));
        self.paginator = Paginator::server(self.config.page_size);
        self
    }

    pub fn config(&self) -> &PreviewConfig {
        &self.config
    }

    pub fn paginator(&self) -> &Paginator {
        &self.paginator
    }

    pub fn dataset(&self) -> Option<&DatasetId> {
        self.dataset.as_ref()
    }

    /// The current snapshot. Holders keep a consistent table even after the
    /// session publishes a newer one.
    pub fn table(&self) -> Arc<PreviewTable> {
        Arc::clone(&self.table)
    }

    /// Rows of the current page.
    pub fn visible_rows(&self) -> &[Row] {
        self.paginator.window(self.table.rows())
    }

    pub fn begin(&mut self, slot: Slot) -> Ticket {
        let seq = &mut self.issued[slot.index()];
        *seq += 1;
        Ticket { slot, seq: *seq }
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.issued[ticket.slot.index()] == ticket.seq
    }

    fn accept(&self, ticket: Ticket, expected: Slot) -> bool {
        if ticket.slot != expected {
            warn!("Ticket for {:?} applied to {expected:?} result", ticket.slot);
            return false;
        }
        if !self.is_current(ticket) {
            debug!(
                "Discarding stale {:?} result #{} (newest #{})",
                ticket.slot,
                ticket.seq,
                self.issued[ticket.slot.index()]
            );
            return false;
        }
        true
    }

    fn publish(&mut self, table: PreviewTable) {
        if self.paginator.mode() == PaginationMode::Client {
            self.paginator.set_total_rows(table.row_count());
        }
        info!(
            "Published {} table: {} row(s), {} total, {} column(s)",
            table.status().label(),
            table.row_count(),
            table.total_rows(),
            table.headers().len()
        );
        self.table = Arc::new(table);
    }

    /// Explicit schema when one is held for this dataset, inference otherwise.
    fn schema_for(&self, canonical: &CanonicalTable) -> Schema {
        match &self.explicit_schema {
            Some(payload) => {
                resolve_schema(
                    Ok(payload.clone()),
                    &canonical.rows,
                    &canonical.headers,
                    &self.options,
                )
                .0
            }
            None => infer_schema(&canonical.rows, &canonical.headers, &self.options),
        }
    }

    /// Points the session at `id`. A different dataset resets the page, drops
    /// the held schema, and supersedes every outstanding ticket.
    fn switch_dataset(&mut self, id: &DatasetId) {
        if self.dataset.as_ref() == Some(id) {
            return;
        }
        self.paginator.reset();
        self.explicit_schema = None;
        for seq in &mut self.issued {
            *seq += 1;
        }
        self.dataset = Some(id.clone());
    }

    fn fallback(&self, reason: FallbackReason) -> PreviewTable {
        warn!("Using {} fallback table: {reason}", self.config.fallback);
        PreviewTable::fallback(self.config.fallback, reason, &self.options)
    }

    /// Applies a preview payload. Returns `false` when the ticket is stale
    /// and the result was dropped.
    pub fn complete_preview(
        &mut self,
        ticket: Ticket,
        result: Result<JsonValue, FetchError>,
    ) -> bool {
        if !self.accept(ticket, Slot::Preview) {
            return false;
        }
        let table = match result {
            Ok(payload) => {
                let normalized = self.normalizer.normalize_value(payload);
                if normalized.is_recognized() {
                    let canonical = normalized.table;
                    let schema = self.schema_for(&canonical);
                    PreviewTable::from_canonical(canonical, schema)
                } else {
                    self.fallback(FallbackReason::Unrecognized)
                }
            }
            Err(err) => self.fallback(FallbackReason::Fetch(err.to_string())),
        };
        self.publish(table);
        true
    }

    /// Applies one server page after checking its counts.
    pub fn complete_page(
        &mut self,
        ticket: Ticket,
        result: Result<PagedPreview, FetchError>,
    ) -> bool {
        if !self.accept(ticket, Slot::Preview) {
            return false;
        }
        let page = match result {
            Ok(page) => page,
            Err(err) => {
                let table = self.fallback(FallbackReason::Fetch(err.to_string()));
                self.publish(table);
                return true;
            }
        };
        if let Err(err) = self.paginator.apply_server(&page.pagination, page.rows.len()) {
            let table = self.fallback(FallbackReason::InvalidPagination(err.to_string()));
            self.publish(table);
            return true;
        }
        let envelope = RowsEnvelope {
            data: page.rows,
            headers: Some(page.headers),
            total_rows: Some(page.pagination.total_rows),
        };
        let canonical = self.normalizer.normalize(Payload::Data(envelope)).table;
        let schema = self.schema_for(&canonical);
        self.publish(PreviewTable::from_canonical(canonical, schema));
        true
    }

    /// Applies an explicit-schema result to the current table, falling back
    /// to self-inference when the source failed. A successful payload is held
    /// for later previews of the same dataset.
    pub fn complete_schema(
        &mut self,
        ticket: Ticket,
        result: Result<JsonValue, FetchError>,
    ) -> bool {
        if !self.accept(ticket, Slot::Schema) {
            return false;
        }
        self.explicit_schema = match &result {
            Ok(payload) => Some(payload.clone()),
            Err(err) => {
                debug!("Schema source failed: {err}");
                None
            }
        };
        if *self.table.status() == TableStatus::Loading {
            debug!("Holding explicit schema until the preview is published");
            return true;
        }
        if self.table.is_fallback() {
            debug!("Keeping inferred schema of fallback table");
            return true;
        }
        let (schema, origin) = resolve_schema(
            result,
            self.table.rows(),
            self.table.headers(),
            &self.options,
        );
        if origin == SchemaOrigin::Explicit {
            debug!("Applied explicit schema with {} column(s)", schema.len());
        }
        let table = PreviewTable::clone(&self.table).with_schema(schema);
        self.table = Arc::new(table);
        true
    }

    fn fetch_page(&mut self, id: &DatasetId, page: usize) -> bool {
        let ticket = self.begin(Slot::Preview);
        let result = match &self.paged_source {
            Some(source) => source.fetch_page(id, page, self.paginator.page_size()),
            None => Err(FetchError::Transport("no paged preview source".into())),
        };
        self.complete_page(ticket, result)
    }

    fn fetch(&mut self, id: &DatasetId) {
        if self.paginator.mode() == PaginationMode::Server {
            self.fetch_page(id, self.paginator.current_page());
        } else {
            let ticket = self.begin(Slot::Preview);
            let result = self.preview_source.fetch_preview(id, self.config.row_hint);
            self.complete_preview(ticket, result);
        }
        let ticket = self.begin(Slot::Schema);
        let result = self.schema_source.fetch_schema(id);
        self.complete_schema(ticket, result);
    }

    /// Loads `id` from the first page.
    pub fn load(&mut self, id: impl Into<DatasetId>) {
        let id = id.into();
        info!("Loading preview for dataset '{id}'");
        self.switch_dataset(&id);
        self.paginator.reset();
        self.fetch(&id);
    }

    /// Reloads `id`, keeping the current page where it still exists.
    pub fn refresh(&mut self, id: impl Into<DatasetId>) {
        let id = id.into();
        info!("Refreshing preview for dataset '{id}'");
        self.switch_dataset(&id);
        self.fetch(&id);
    }

    /// Moves to page `page`. Pages outside `1..=total_pages` are ignored.
    pub fn change_page(&mut self, page: usize) -> bool {
        if !self.paginator.contains_page(page) {
            debug!("Page {page} is out of range");
            return false;
        }
        if self.paginator.mode() == PaginationMode::Server
            && let Some(id) = self.dataset.clone()
        {
            return self.fetch_page(&id, page);
        }
        self.paginator.change_page(page)
    }

    /// Changes the page size; zero is ignored. Server mode refetches the
    /// clamped current page.
    pub fn set_page_size(&mut self, page_size: usize) -> bool {
        if !self.paginator.set_page_size(page_size) {
            debug!("Ignoring page size {page_size}");
            return false;
        }
        self.config.page_size = page_size;
        if self.paginator.mode() == PaginationMode::Server
            && let Some(id) = self.dataset.clone()
        {
            self.fetch_page(&id, self.paginator.current_page());
        }
        true
    }

    /// Merges an operation summary into the current table.
    pub fn annotate(&mut self, kind: AnnotationKind, message: &str) {
        let table = annotate(&self.table, kind, message);
        self.publish(table);
    }
}
