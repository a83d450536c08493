use std::sync::Arc;

use chrono::NaiveDate;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::PipelineClients;
use crate::llm::{GenerationOutcome, ModelNames};
use crate::models::{
    Article, ArticleBatch, DateWindow, Feature, RagFlag, RunStatistics, SyntheticDocument,
};
use crate::stages::{
    generate_no_context, generate_with_context, publish_document, sanitize, ContextRetriever,
};

/// Where a generation task currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Idle,
    FetchingDay(NaiveDate),
    ContextLookup,
    GenerateNoRag,
    GenerateRag,
    Publish,
    DayAdvance,
    Done,
}

/// What one task did over its window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReport {
    pub source: String,
    pub feature: Feature,
    pub days_fetched: usize,
    /// Days whose fetch failed and were treated as empty
    pub days_failed: usize,
    pub articles_seen: usize,
    /// Articles skipped for lacking a description
    pub articles_skipped: usize,
    pub articles_processed: usize,
    pub cancelled: bool,
}

/// Per-article results, in the order the documents were attempted
#[derive(Debug, Default)]
pub struct ArticleResult {
    pub no_rag: Option<SyntheticDocument>,
    pub rag: Option<SyntheticDocument>,
}

/// One (source, feature, window) unit of concurrent work
pub struct GenerationTask {
    source: String,
    feature: Feature,
    window: DateWindow,
    models: ModelNames,
    llm_id: u32,
    clients: PipelineClients,
    retriever: Arc<ContextRetriever>,
    stats: RunStatistics,
    cancel: CancellationToken,
    state: TaskState,
}

impl GenerationTask {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source: impl Into<String>,
        feature: Feature,
        window: DateWindow,
        models: ModelNames,
        llm_id: u32,
        clients: PipelineClients,
        retriever: Arc<ContextRetriever>,
        stats: RunStatistics,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            source: source.into(),
            feature,
            window,
            models,
            llm_id,
            clients,
            retriever,
            stats,
            cancel,
            state: TaskState::Idle,
        }
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    fn transition(&mut self, next: TaskState) {
        debug!(
            source = %self.source,
            feature = %self.feature,
            from = ?self.state,
            to = ?next,
            "task state"
        );
        self.state = next;
    }

    /// Walk every day of the window, generating for every article with a body
    pub async fn run(mut self) -> TaskReport {
        let mut report = TaskReport {
            source: self.source.clone(),
            feature: self.feature,
            days_fetched: 0,
            days_failed: 0,
            articles_seen: 0,
            articles_skipped: 0,
            articles_processed: 0,
            cancelled: false,
        };

        info!(
            source = %self.source,
            feature = %self.feature,
            days = self.window.day_count(),
            "generation task started"
        );

        'days: for day in self.window.days() {
            if self.cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            self.transition(TaskState::FetchingDay(day));
            let batch = match self.fetch_day(day).await {
                Some(batch) => batch,
                None => {
                    report.days_failed += 1;
                    ArticleBatch::default()
                }
            };
            report.days_fetched += 1;

            for article in &batch.items {
                if self.cancel.is_cancelled() {
                    report.cancelled = true;
                    break 'days;
                }
                report.articles_seen += 1;
                if article.body().is_none() {
                    report.articles_skipped += 1;
                    continue;
                }
                self.process_article(article).await;
                report.articles_processed += 1;
            }

            self.transition(TaskState::DayAdvance);
        }

        self.transition(TaskState::Done);
        info!(
            source = %self.source,
            feature = %self.feature,
            processed = report.articles_processed,
            skipped = report.articles_skipped,
            "generation task finished"
        );
        report
    }

    /// The generation pipeline always asks for the whole day span
    async fn fetch_day(&self, day: NaiveDate) -> Option<ArticleBatch> {
        match self
            .clients
            .articles
            .fetch_articles(
                &self.source,
                day,
                self.window.start_hour,
                0,
                self.window.end_hour,
                0,
            )
            .await
        {
            Ok(batch) => Some(batch),
            Err(e) => {
                warn!(source = %self.source, %day, "article fetch failed, skipping day: {}", e);
                None
            }
        }
    }

    /// Generate and publish both variants for one article.
    ///
    /// Returns `None` for articles without a description. A failure in one
    /// variant leaves the other untouched.
    pub async fn process_article(&mut self, article: &Article) -> Option<ArticleResult> {
        let body = sanitize(article.body()?);
        let mut result = ArticleResult::default();

        self.transition(TaskState::ContextLookup);
        let context = self.retriever.query_context(&article.headline).await;

        self.transition(TaskState::GenerateNoRag);
        let no_rag = generate_no_context(
            &self.clients.generator,
            &article.headline,
            &body,
            &self.models.no_rag,
        )
        .await;
        if let Some(description) = self.accept(article, RagFlag::NoRag, no_rag) {
            result.no_rag = Some(SyntheticDocument::no_rag(
                &article.id,
                self.feature,
                self.llm_id,
                description,
            ));
        }

        self.transition(TaskState::GenerateRag);
        let rag = generate_with_context(
            &self.clients.generator,
            &article.headline,
            &body,
            &context,
            &self.models.rag,
        )
        .await;
        if let Some(description) = self.accept(article, RagFlag::Rag, rag) {
            result.rag = Some(SyntheticDocument::rag(
                &article.id,
                self.feature,
                self.llm_id,
                description,
                context,
            ));
        }

        self.transition(TaskState::Publish);
        for document in [&result.rag, &result.no_rag].into_iter().flatten() {
            publish_document(&self.clients.storage, &self.stats, &self.source, document).await;
        }

        Some(result)
    }

    /// Keep the description of a successful generation, count anything else as an error
    fn accept(
        &self,
        article: &Article,
        rag: RagFlag,
        outcome: GenerationOutcome,
    ) -> Option<String> {
        match outcome {
            GenerationOutcome::Ok(output) => {
                debug!(
                    source = %self.source,
                    feature = %self.feature,
                    article_id = %article.id,
                    rag = rag.label(),
                    "document generated"
                );
                Some(output.synthetic_description())
            }
            _ => {
                warn!(
                    source = %self.source,
                    feature = %self.feature,
                    article_id = %article.id,
                    rag = rag.label(),
                    "generation failed, no document for this variant"
                );
                self.stats.record_error();
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EndpointConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn article(description: Option<&str>) -> Article {
        Article {
            id: "n1".to_string(),
            headline: "Headline".to_string(),
            description: description.map(str::to_string),
            date_stored: None,
        }
    }

    async fn task_for(server: &MockServer, stats: RunStatistics) -> GenerationTask {
        let config = EndpointConfig {
            news_api_url: server.uri(),
            chroma_url: server.uri(),
            ollama_url: server.uri(),
            storage_api_url: server.uri(),
            ..Default::default()
        };
        let clients = PipelineClients::from_config(&config).unwrap();
        let retriever = ContextRetriever::for_source(
            clients.chroma.clone(),
            clients.generator.clone(),
            "embed",
            "ABC",
            10,
        )
        .await;
        let window = DateWindow::parse("01-01-2026", "01-01-2026").unwrap();
        GenerationTask::new(
            "ABC",
            Feature(2),
            window,
            ModelNames::for_feature("P_", Feature(2)),
            5,
            clients,
            Arc::new(retriever),
            stats,
            CancellationToken::new(),
        )
    }

    #[tokio::test]
    async fn test_article_without_body_is_ignored() {
        let server = MockServer::start().await;
        let stats = RunStatistics::new();
        let mut task = task_for(&server, stats.clone()).await;

        assert!(task.process_article(&article(None)).await.is_none());
        assert!(task.process_article(&article(Some(""))).await.is_none());
        assert_eq!(task.state(), TaskState::Idle);
        assert_eq!(stats.snapshot(), Default::default());
    }

    #[tokio::test]
    async fn test_process_article_builds_both_documents() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/collections"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "c-1",
                "name": "real_news_data_ABC"
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"embeddings": [[1.0]]})),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/collections/c-1/query"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"documents": [["ctx"]]})),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "{\"response\":\"{\\\"synthetic_description\\\":\\\"gen\\\"}\",\"done\":true}\n",
            ))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/newsLLM/ABC"))
            .respond_with(ResponseTemplate::new(201))
            .expect(2)
            .mount(&server)
            .await;

        let stats = RunStatistics::new();
        let mut task = task_for(&server, stats.clone()).await;
        let result = task
            .process_article(&article(Some("<i>Body</i> text")))
            .await
            .unwrap();

        let no_rag = result.no_rag.unwrap();
        let rag = result.rag.unwrap();
        assert_eq!(no_rag.rag, RagFlag::NoRag);
        assert_eq!(no_rag.feature_id, 2);
        assert_eq!(no_rag.model_id, 5);
        assert_eq!(no_rag.synthetic_description, "gen");
        assert_eq!(rag.context, Some(vec!["ctx".to_string()]));
        assert_eq!(task.state(), TaskState::Publish);

        let snap = stats.snapshot();
        assert_eq!(snap.rag_persisted, 1);
        assert_eq!(snap.no_rag_persisted, 1);
    }

    #[tokio::test]
    async fn test_run_with_no_articles() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/news/ABC"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"items": []})),
            )
            .mount(&server)
            .await;

        let task = task_for(&server, RunStatistics::new()).await;
        assert!(task.retriever.collection().is_none());
        let report = task.run().await;

        assert_eq!(report.days_fetched, 1);
        assert_eq!(report.articles_seen, 0);
        assert!(!report.cancelled);
    }
}
