//! Documentation service: generate a document for a message and store it,
//! then read, revise and list what was stored.

use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::domain::{Category, Message};
use crate::error::{PipelineError, StoreError};
use crate::pipeline::cancellable;
use crate::pipeline::types::{DocMetadata, DocumentStore, DocumentationGenerator};

/// Default directory prefix for stored documents.
pub const DEFAULT_BASE_PATH: &str = "docs";

/// Timestamp layout used in document file names.
const PATH_TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

pub struct DocumentationService {
    generator: Arc<dyn DocumentationGenerator>,
    store: Arc<dyn DocumentStore>,
    base_path: String,
}

impl DocumentationService {
    pub fn new(
        generator: Arc<dyn DocumentationGenerator>,
        store: Arc<dyn DocumentStore>,
        base_path: impl Into<String>,
    ) -> Self {
        Self {
            generator,
            store,
            base_path: base_path.into(),
        }
    }

    /// Storage path for a message's document:
    /// `{base}/{category}/{type}-{YYYYMMDD-HHMMSS}-{message_id}.md`.
    ///
    /// Derived only from the message, so routing the same message twice
    /// targets the same document.
    pub fn document_path(&self, message: &Message) -> String {
        let timestamp = message.created_at().format(PATH_TIMESTAMP_FORMAT);
        format!(
            "{}/{}-{}-{}.md",
            self.category_path(message.category()),
            message.message_type(),
            timestamp,
            message.id()
        )
    }

    /// Directory holding one category's documents.
    pub fn category_path(&self, category: Category) -> String {
        format!("{}/{}", self.base_path.trim_end_matches('/'), category)
    }

    /// Generate and store documentation for `message`. Returns the path.
    pub async fn create_documentation(
        &self,
        message: &Message,
        cancel: &CancellationToken,
    ) -> Result<String, PipelineError> {
        let metadata = DocMetadata::from_message(message);

        let rendered = cancellable(
            cancel,
            self.generator.generate(message.content().text(), &metadata),
        )
        .await?
        .map_err(PipelineError::Generation)?;

        let path = self.document_path(message);
        cancellable(cancel, self.store.store(&path, &rendered, &metadata)).await??;

        info!(
            id = %message.id(),
            thread_id = %message.thread_id(),
            path = %path,
            "Stored documentation"
        );
        Ok(path)
    }

    pub async fn get_documentation(&self, path: &str) -> Result<String, StoreError> {
        self.store.get(path).await
    }

    /// Replace an existing document, stamping `updated_at` on its metadata.
    pub async fn update_documentation(
        &self,
        path: &str,
        content: &str,
        mut metadata: DocMetadata,
    ) -> Result<(), StoreError> {
        metadata.updated_at = Some(Utc::now());
        self.store.update(path, content, &metadata).await?;
        info!(path, "Updated documentation");
        Ok(())
    }

    /// Stored document paths for `category`.
    pub async fn list_documentation(&self, category: Category) -> Result<Vec<String>, StoreError> {
        self.store.list(&self.category_path(category)).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::domain::{MessageContent, MessageType, ThreadId};
    use crate::error::OracleError;

    struct EchoGenerator;

    #[async_trait]
    impl DocumentationGenerator for EchoGenerator {
        async fn generate(
            &self,
            text: &str,
            metadata: &DocMetadata,
        ) -> Result<String, OracleError> {
            Ok(format!("# {}\n\n{}", metadata.message_type, text))
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl DocumentationGenerator for FailingGenerator {
        async fn generate(&self, _: &str, _: &DocMetadata) -> Result<String, OracleError> {
            Err(OracleError::Unavailable("generator down".into()))
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        writes: Mutex<Vec<(String, String, DocMetadata)>>,
    }

    #[async_trait]
    impl DocumentStore for MemoryStore {
        async fn store(
            &self,
            path: &str,
            content: &str,
            meta: &DocMetadata,
        ) -> Result<(), StoreError> {
            self.writes
                .lock()
                .unwrap()
                .push((path.to_string(), content.to_string(), meta.clone()));
            Ok(())
        }

        async fn get(&self, path: &str) -> Result<String, StoreError> {
            let writes = self.writes.lock().unwrap();
            writes
                .iter()
                .rfind(|(p, _, _)| p == path)
                .map(|(_, content, _)| content.clone())
                .ok_or_else(|| StoreError::NotFound(path.to_string()))
        }

        async fn update(
            &self,
            path: &str,
            content: &str,
            meta: &DocMetadata,
        ) -> Result<(), StoreError> {
            self.get(path).await?;
            self.store(path, content, meta).await
        }

        async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
            let writes = self.writes.lock().unwrap();
            let mut paths: Vec<String> = writes
                .iter()
                .map(|(p, _, _)| p.clone())
                .filter(|p| p.starts_with(prefix))
                .collect();
            paths.sort();
            paths.dedup();
            Ok(paths)
        }
    }

    fn decision() -> Message {
        let mut msg = Message::new(
            ThreadId::new(),
            "alice",
            MessageContent::new("Let's switch to blue-green deploys").unwrap(),
            "1700.1",
        )
        .unwrap();
        msg.set_message_type(MessageType::Decision);
        msg.set_category(Category::Operations);
        msg
    }

    #[test]
    fn path_is_keyed_by_category_type_time_and_id() {
        let store = Arc::new(MemoryStore::default());
        let service = DocumentationService::new(Arc::new(EchoGenerator), store, "docs/");
        let msg = decision();

        let path = service.document_path(&msg);
        let stamp = msg.created_at().format(PATH_TIMESTAMP_FORMAT).to_string();
        assert_eq!(
            path,
            format!("docs/operations/decision-{stamp}-{}.md", msg.id())
        );
        assert_eq!(path, service.document_path(&msg));
    }

    #[tokio::test]
    async fn create_generates_then_stores() {
        let store = Arc::new(MemoryStore::default());
        let service = DocumentationService::new(
            Arc::new(EchoGenerator),
            Arc::clone(&store) as Arc<dyn DocumentStore>,
            DEFAULT_BASE_PATH,
        );
        let msg = decision();

        let path = service
            .create_documentation(&msg, &CancellationToken::new())
            .await
            .unwrap();

        let writes = store.writes.lock().unwrap();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].0, path);
        assert!(writes[0].1.starts_with("# decision"));
    }

    #[tokio::test]
    async fn generator_failure_skips_store() {
        let store = Arc::new(MemoryStore::default());
        let service = DocumentationService::new(
            Arc::new(FailingGenerator),
            Arc::clone(&store) as Arc<dyn DocumentStore>,
            DEFAULT_BASE_PATH,
        );

        let err = service
            .create_documentation(&decision(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Generation(_)));
        assert!(store.writes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn cancelled_before_generation() {
        let store = Arc::new(MemoryStore::default());
        let service = DocumentationService::new(
            Arc::new(EchoGenerator),
            Arc::clone(&store) as Arc<dyn DocumentStore>,
            DEFAULT_BASE_PATH,
        );
        let token = CancellationToken::new();
        token.cancel();

        let err = service.create_documentation(&decision(), &token).await.unwrap_err();
        assert!(matches!(err, PipelineError::Cancelled));
        assert!(store.writes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn stored_documents_can_be_read_revised_and_listed() {
        let store = Arc::new(MemoryStore::default());
        let service = DocumentationService::new(
            Arc::new(EchoGenerator),
            Arc::clone(&store) as Arc<dyn DocumentStore>,
            DEFAULT_BASE_PATH,
        );
        let msg = decision();
        let path = service
            .create_documentation(&msg, &CancellationToken::new())
            .await
            .unwrap();

        let doc = service.get_documentation(&path).await.unwrap();
        assert!(doc.starts_with("# decision"));

        service
            .update_documentation(&path, "# Revised", DocMetadata::from_message(&msg))
            .await
            .unwrap();
        assert_eq!(service.get_documentation(&path).await.unwrap(), "# Revised");
        {
            let writes = store.writes.lock().unwrap();
            assert!(writes[0].2.updated_at.is_none());
            assert!(writes[1].2.updated_at.is_some());
        }

        assert_eq!(
            service.list_documentation(Category::Operations).await.unwrap(),
            vec![path]
        );
        let empty = service.list_documentation(Category::Product).await.unwrap();
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn updating_a_missing_document_fails() {
        let service = DocumentationService::new(
            Arc::new(EchoGenerator),
            Arc::new(MemoryStore::default()),
            DEFAULT_BASE_PATH,
        );
        let err = service
            .update_documentation(
                "docs/other/nope.md",
                "x",
                DocMetadata::from_message(&decision()),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
