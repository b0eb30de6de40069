//! Bounded render dispatch
//!
//! Flagged URLs are handed to a [`Renderer`], at most `concurrency` at a
//! time. Every URL gets its own outcome.

use crate::config::RenderConfig;
use crate::crawler::{visible_text, FetchClient};
use crate::render::RenderError;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Output of a renderer for one URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub html: String,
    pub visible_text: String,
}

/// Renders pages that need client-side script execution
///
/// Implementations usually drive a headless browser; none is bundled.
pub trait Renderer: Send + Sync + 'static {
    fn render(
        &self,
        url: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<RenderedPage, RenderError>> + Send;
}

/// Renderer that re-fetches the page without executing scripts
///
/// Useful as a fallback and for dry runs of the dispatch path.
#[derive(Debug, Clone)]
pub struct FetchRenderer<F> {
    fetcher: F,
    headers: BTreeMap<String, String>,
}

impl<F: FetchClient> FetchRenderer<F> {
    pub fn new(fetcher: F, headers: BTreeMap<String, String>) -> Self {
        Self { fetcher, headers }
    }
}

impl<F: FetchClient + 'static> Renderer for FetchRenderer<F> {
    async fn render(&self, url: &str, timeout: Duration) -> Result<RenderedPage, RenderError> {
        let response = self
            .fetcher
            .fetch(url, &self.headers, timeout)
            .await
            .map_err(|e| RenderError::Failed {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        Ok(RenderedPage {
            visible_text: visible_text(&response.body),
            html: response.body,
        })
    }
}

/// Result of one dispatched render
#[derive(Debug, Clone)]
pub struct RenderOutcome {
    pub url: String,
    pub result: Result<RenderedPage, RenderError>,
}

/// Runs renderer calls with a bound on how many are in flight
#[derive(Debug, Clone, Copy)]
pub struct RenderDispatcher {
    concurrency: usize,
    timeout: Duration,
}

impl Default for RenderDispatcher {
    fn default() -> Self {
        Self::from_config(&RenderConfig::default())
    }
}

impl RenderDispatcher {
    /// Creates a dispatcher; a concurrency of 0 is treated as 1
    pub fn new(concurrency: usize, timeout: Duration) -> Self {
        Self {
            concurrency: concurrency.max(1),
            timeout,
        }
    }

    pub fn from_config(config: &RenderConfig) -> Self {
        Self::new(config.concurrency, Duration::from_millis(config.timeout_ms))
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Renders every URL, at most `concurrency` at a time
    ///
    /// Outcomes come back in input order. A failing or panicking render only
    /// affects its own outcome. An empty list returns immediately without
    /// spawning anything.
    pub async fn dispatch<R: Renderer>(
        &self,
        renderer: Arc<R>,
        urls: Vec<String>,
    ) -> Vec<RenderOutcome> {
        if urls.is_empty() {
            tracing::info!("No URLs required rendering");
            return Vec::new();
        }

        tracing::info!(
            "Dispatching {} URLs to renderer (concurrency {})",
            urls.len(),
            self.concurrency
        );

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for (index, url) in urls.into_iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let renderer = Arc::clone(&renderer);
            let timeout = self.timeout;

            tasks.spawn(async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => render_isolated(renderer, url.clone(), timeout).await,
                    Err(_) => Err(RenderError::Failed {
                        url: url.clone(),
                        message: "dispatcher shut down".to_string(),
                    }),
                };
                (index, RenderOutcome { url, result })
            });
        }

        let mut outcomes = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => tracing::error!("Render task failed to join: {}", e),
            }
        }

        outcomes.sort_by_key(|(index, _)| *index);
        outcomes.into_iter().map(|(_, outcome)| outcome).collect()
    }
}

/// Runs one render in its own task so a panic is reported as an error
async fn render_isolated<R: Renderer>(
    renderer: Arc<R>,
    url: String,
    timeout: Duration,
) -> Result<RenderedPage, RenderError> {
    let task_url = url.clone();
    let handle = tokio::spawn(async move {
        match tokio::time::timeout(timeout, renderer.render(&task_url, timeout)).await {
            Ok(result) => result,
            Err(_) => Err(RenderError::Timeout {
                url: task_url.clone(),
                millis: timeout.as_millis() as u64,
            }),
        }
    });

    match handle.await {
        Ok(result) => {
            match &result {
                Ok(_) => tracing::debug!("Rendered {}", url),
                Err(e) => tracing::warn!("{}", e),
            }
            result
        }
        Err(e) => {
            tracing::warn!("Render task for {} panicked: {}", url, e);
            Err(RenderError::Panicked { url })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::{FetchError, FetchResponse};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Tracks how many renders overlap
    #[derive(Default)]
    struct CountingRenderer {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        calls: AtomicUsize,
    }

    impl Renderer for CountingRenderer {
        async fn render(&self, url: &str, _timeout: Duration) -> Result<RenderedPage, RenderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if url.ends_with("/panic") {
                panic!("renderer crashed");
            }
            if url.ends_with("/fail") {
                return Err(RenderError::Failed {
                    url: url.to_string(),
                    message: "navigation failed".to_string(),
                });
            }
            Ok(RenderedPage {
                html: format!("<p>{}</p>", url),
                visible_text: url.to_string(),
            })
        }
    }

    fn urls(paths: &[&str]) -> Vec<String> {
        paths.iter().map(|p| format!("https://a.test{}", p)).collect()
    }

    #[tokio::test]
    async fn test_empty_input_dispatches_nothing() {
        let renderer = Arc::new(CountingRenderer::default());
        let outcomes = RenderDispatcher::default()
            .dispatch(Arc::clone(&renderer), Vec::new())
            .await;

        assert!(outcomes.is_empty());
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_concurrency_bound() {
        let renderer = Arc::new(CountingRenderer::default());
        let dispatcher = RenderDispatcher::new(2, Duration::from_secs(5));

        let outcomes = dispatcher
            .dispatch(Arc::clone(&renderer), urls(&["/1", "/2", "/3", "/4", "/5", "/6"]))
            .await;

        assert_eq!(outcomes.len(), 6);
        assert!(outcomes.iter().all(|o| o.result.is_ok()));
        assert!(renderer.max_in_flight.load(Ordering::SeqCst) <= 2);
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn test_failures_isolated_and_ordered() {
        let renderer = Arc::new(CountingRenderer::default());
        let dispatcher = RenderDispatcher::new(3, Duration::from_secs(5));

        let outcomes = dispatcher
            .dispatch(renderer, urls(&["/ok", "/fail", "/panic", "/also-ok"]))
            .await;

        let got: Vec<&str> = outcomes.iter().map(|o| o.url.as_str()).collect();
        assert_eq!(got, urls(&["/ok", "/fail", "/panic", "/also-ok"]));
        assert!(outcomes[0].result.is_ok());
        assert!(matches!(outcomes[1].result, Err(RenderError::Failed { .. })));
        assert!(matches!(outcomes[2].result, Err(RenderError::Panicked { .. })));
        assert!(outcomes[3].result.is_ok());
    }

    #[tokio::test]
    async fn test_timeout() {
        struct Slow;
        impl Renderer for Slow {
            async fn render(&self, _url: &str, _t: Duration) -> Result<RenderedPage, RenderError> {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Err(RenderError::Failed {
                    url: String::new(),
                    message: "unreachable".to_string(),
                })
            }
        }

        let outcomes = RenderDispatcher::new(1, Duration::from_millis(20))
            .dispatch(Arc::new(Slow), urls(&["/slow"]))
            .await;
        assert!(matches!(
            outcomes[0].result,
            Err(RenderError::Timeout { millis: 20, .. })
        ));
    }

    struct OneFetcher;

    impl FetchClient for OneFetcher {
        async fn fetch(
            &self,
            url: &str,
            _headers: &BTreeMap<String, String>,
            _timeout: Duration,
        ) -> Result<FetchResponse, FetchError> {
            Ok(FetchResponse {
                status_code: 200,
                final_url: url.to_string(),
                body: "<body><h1>Hi</h1><script>x()</script></body>".to_string(),
                headers: BTreeMap::new(),
            })
        }
    }

    #[tokio::test]
    async fn test_fetch_renderer() {
        let renderer = FetchRenderer::new(OneFetcher, BTreeMap::new());
        let page = renderer
            .render("https://a.test/", Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(page.visible_text, "Hi");
        assert!(page.html.contains("<script>"));
    }
}
