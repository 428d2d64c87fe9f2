//! Controller for one listing page: facet selection in, sorted records out.
//!
//! Filter changes are translated on every update and fetched through a
//! debouncer. Each fetch carries a generation number taken when it is
//! scheduled; a newer fetch cancels the one in flight and an older result is
//! never applied over a newer one.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use common::{
    facet::FacetSelection,
    filter_translator::{FilterTranslator, ListingPageKind, QueryParams},
    listing::{ListingRecord, ListingRequest},
    listing_sorter::{self, SortKey},
    listing_view_state::ListingViewState,
};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{cars_api::ListingSource, config::ListingConfig, debounce::Debouncer};


#[derive(Default)]
struct InFlight {
    generation: u64,
    token: Option<CancellationToken>,
}

#[derive(Default)]
struct ResultSet {
    applied_generation: u64,
    records: Vec<ListingRecord>,
    total_pages: u64,
    last_error: Option<String>,
}

#[derive(Default)]
struct Shared {
    issued: AtomicU64,
    in_flight: Mutex<InFlight>,
    results: Mutex<ResultSet>,
}


pub struct ListingView<S: ListingSource> {
    source: Arc<S>,
    kind: ListingPageKind,
    translator: FilterTranslator,
    config: ListingConfig,
    debouncer: Debouncer,
    selection: FacetSelection,
    sort_key: SortKey,
    page: u64,
    shared: Arc<Shared>,
}

impl<S: ListingSource> ListingView<S> {
    pub fn new(source: Arc<S>, kind: ListingPageKind, config: ListingConfig) -> Self {
        Self {
            source,
            kind,
            translator: FilterTranslator::for_page(kind),
            debouncer: Debouncer::new(config.debounce),
            config,
            selection: FacetSelection::new(),
            sort_key: SortKey::Default,
            page: 1,
            shared: Arc::new(Shared::default()),
        }
    }

    pub fn kind(&self) -> ListingPageKind {
        self.kind
    }

    pub fn selection(&self) -> &FacetSelection {
        &self.selection
    }

    pub fn query_params(&self) -> QueryParams {
        self.translator.translate(&self.selection)
    }

    pub fn sort_key(&self) -> SortKey {
        self.sort_key
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    /// Applies `update` to the selection and goes back to the first page.
    ///
    /// The fetch waits out the debounce window unless `immediate` is set, in
    /// which case its handle is returned.
    pub fn update_selection(&mut self, immediate: bool, update: impl FnOnce(&mut FacetSelection)) -> Option<JoinHandle<()>> {
        update(&mut self.selection);
        self.page = 1;
        self.schedule_fetch(immediate)
    }

    /// Re-sorts the cached records, never fetches.
    pub fn set_sort_key(&mut self, key: SortKey) {
        self.sort_key = key;
    }

    pub fn set_page(&mut self, page: u64) -> JoinHandle<()> {
        self.page = page.max(1);
        self.fetch_now()
    }

    /// Refetches the current query right away, skipping any response cache.
    pub fn refresh(&mut self) -> JoinHandle<()> {
        let task = self.fetch_task(true);
        self.debouncer.call_immediate(task)
    }

    /// Sends the debounced fetch now, if one is waiting.
    pub fn flush(&mut self) -> Option<JoinHandle<()>> {
        self.debouncer.flush()
    }

    pub fn is_fetch_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Cached records in the current sort order.
    pub fn records(&self) -> Vec<ListingRecord> {
        let results = self.shared.results.lock();
        listing_sorter::sort(Some(&results.records), self.sort_key)
    }

    pub fn total_pages(&self) -> u64 {
        self.shared.results.lock().total_pages
    }

    pub fn last_error(&self) -> Option<String> {
        self.shared.results.lock().last_error.clone()
    }

    pub fn view_state(&self) -> ListingViewState {
        ListingViewState {
            selection: self.selection.clone(),
            sort_key: self.sort_key,
            page: self.page,
        }
    }

    /// Takes over a state decoded from the URL and fetches it right away.
    pub fn restore(&mut self, state: ListingViewState) -> JoinHandle<()> {
        self.selection = state.selection;
        self.sort_key = state.sort_key;
        self.page = state.page.max(1);
        self.fetch_now()
    }

    fn fetch_now(&mut self) -> JoinHandle<()> {
        let task = self.fetch_task(false);
        self.debouncer.call_immediate(task)
    }

    fn schedule_fetch(&mut self, immediate: bool) -> Option<JoinHandle<()>> {
        if immediate {
            return Some(self.fetch_now());
        }
        let task = self.fetch_task(false);
        self.debouncer.call(task);
        None
    }

    fn fetch_task(&self, fresh: bool) -> impl Future<Output = ()> + Send + 'static {
        let request = ListingRequest::new(self.query_params())
            .with_page(self.page)
            .with_limit(self.config.page_size);
        let generation = self.shared.issued.fetch_add(1, Ordering::SeqCst) + 1;
        run_fetch(self.source.clone(), self.shared.clone(), request, generation, fresh)
    }
}


async fn run_fetch<S: ListingSource>(source: Arc<S>, shared: Arc<Shared>, request: ListingRequest, generation: u64, fresh: bool) {
    let token = CancellationToken::new();
    {
        let mut in_flight = shared.in_flight.lock();
        if generation < in_flight.generation {
            debug!(generation, newer = in_flight.generation, "listing fetch already superseded");
            return;
        }
        if let Some(previous) = in_flight.token.replace(token.clone()) {
            previous.cancel();
        }
        in_flight.generation = generation;
    }

    debug!(generation, fresh, page = request.page, params = ?request.params, "fetching listings");
    let result = tokio::select! {
        _ = token.cancelled() => {
            debug!(generation, "listing fetch cancelled by a newer one");
            return;
        }
        result = async {
            if fresh {
                source.fetch_listings_fresh(&request).await
            } else {
                source.fetch_listings(&request).await
            }
        } => result,
    };

    let mut results = shared.results.lock();
    if generation < results.applied_generation {
        debug!(generation, applied = results.applied_generation, "dropping stale listing result");
        return;
    }
    results.applied_generation = generation;
    match result {
        Ok(page) => {
            info!(generation, records = page.data.len(), total_pages = page.pagination.total_pages, "listings updated");
            results.records = page.data;
            results.total_pages = page.pagination.total_pages;
            results.last_error = None;
        }
        Err(e) => {
            warn!(generation, "listing fetch failed: {e:#}");
            results.records.clear();
            results.total_pages = 0;
            results.last_error = Some(e.to_string());
        }
    }
}
