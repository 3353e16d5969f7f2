//! One user's viewer: state, background search and rendered-page feed.

use baa_models::{DocumentHandle, DocumentInfo, HighlightSet, MatchRecord, RenderedPage, SearchTerms};
use baa_utils::BaaResult;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, error, info};

use crate::highlight::locate_when_ready;
use crate::pipeline::SearchPipeline;
use crate::viewer::{PageAction, ViewerState};

#[derive(Clone)]
pub struct ViewerSession {
    state: Arc<RwLock<ViewerState>>,
    rendered: Arc<watch::Sender<Option<RenderedPage>>>,
    search: Arc<Mutex<Option<(u64, AbortHandle)>>>,
    pipeline: SearchPipeline,
    highlight_deferral: Duration,
}

impl ViewerSession {
    pub fn new(pipeline: SearchPipeline, highlight_deferral: Duration) -> Self {
        let (rendered, _) = watch::channel(None);
        Self {
            state: Arc::new(RwLock::new(ViewerState::new())),
            rendered: Arc::new(rendered),
            search: Arc::new(Mutex::new(None)),
            pipeline,
            highlight_deferral,
        }
    }

    /// Resets the viewer for `document` and searches it in the background.
    ///
    /// A search still running for an earlier document is aborted. The returned
    /// handle resolves once this search has finished and its outcome was
    /// applied, or dropped because a newer document was loaded.
    pub async fn load_document(&self, document: DocumentHandle, terms: SearchTerms) -> (u64, JoinHandle<()>) {
        let generation = {
            let mut state = self.state.write().await;
            state.load_document(DocumentInfo::from(&document), terms.clone())
        };
        self.rendered.send_replace(None);

        info!(document = %document.id, file = %document.file_name, generation, "Loading document");

        let state = Arc::clone(&self.state);
        let pipeline = self.pipeline.clone();
        let task = tokio::spawn(async move {
            let outcome = pipeline.run(&document, &terms).await;

            let mut state = state.write().await;
            match outcome {
                Ok(outcome) => {
                    state.complete(generation, outcome);
                }
                Err(e) => {
                    error!(document = %document.id, error = %e, "Search failed");
                    state.fail(generation, &e);
                }
            }
        });

        self.track_search(generation, task.abort_handle());
        (generation, task)
    }

    /// Stops the background search, if any. Called when the session goes away.
    pub fn close(&self) {
        let running = self.search.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some((_, search)) = running {
            search.abort();
        }
    }

    /// Keeps only the search of the newest generation alive.
    fn track_search(&self, generation: u64, search: AbortHandle) {
        let mut running = self.search.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(running.as_ref(), Some((newest, _)) if *newest > generation) {
            search.abort();
            return;
        }
        if let Some((superseded, previous)) = running.replace((generation, search)) {
            debug!(generation = superseded, "Aborting superseded search");
            previous.abort();
        }
    }

    pub async fn snapshot(&self) -> ViewerState {
        self.state.read().await.clone()
    }

    pub async fn select(&self, index: usize) -> BaaResult<MatchRecord> {
        let mut state = self.state.write().await;
        state.select(index).cloned()
    }

    pub async fn navigate(&self, action: PageAction) -> BaaResult<u32> {
        self.state.write().await.navigate(action)
    }

    pub async fn set_page_count(&self, page_count: u32) {
        self.state.write().await.set_page_count(page_count);
    }

    /// Renderer notification: `page` is now on screen with these fragments.
    pub fn report_rendered(&self, page: RenderedPage) {
        self.rendered.send_replace(Some(page));
    }

    /// Highlights for the selected term on the page currently shown.
    ///
    /// Without a selection there is nothing to mark and the sets are empty.
    pub async fn highlights(&self) -> BaaResult<HighlightSet> {
        let (page, term) = {
            let state = self.state.read().await;
            match state.selected() {
                Some(record) => (state.current_page(), record.term().clone()),
                None => return Ok(HighlightSet::default()),
            }
        };

        let mut rendered = self.rendered.subscribe();
        locate_when_ready(&mut rendered, page, &term, self.highlight_deferral).await
    }
}
