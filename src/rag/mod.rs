//! Question answering over the indexed CVs: embed the question, retrieve
//! chunks (narrowed to one person or spread across many profiles), and ask
//! the LLM to answer from them while keeping per-session history.

pub mod intent;
pub mod sessions;

use chrono::Utc;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::chunking::title_case;
use crate::config::RagConfig;
use crate::error::{AdapterError, Result};
use crate::models::{
    CvDetail, CvDetailSource, QueryRequest, QueryResponse, SearchFilters, Source, VectorDocument,
};
use crate::ports::{LlmPort, VectorStorePort};
use intent::SearchMode;
use sessions::SessionStore;

/// Characters of the question shown in logs.
const LOG_PREVIEW_CHARS: usize = 50;

pub struct RagAgent {
    llm: Arc<dyn LlmPort>,
    vectors: Arc<dyn VectorStorePort>,
    sessions: SessionStore,
    config: RagConfig,
}

/// Chunks chosen for the prompt plus the counts reported in metadata.
struct Retrieval {
    docs: Vec<VectorDocument>,
    initial: usize,
    filtered: usize,
}

impl RagAgent {
    pub fn new(
        llm: Arc<dyn LlmPort>,
        vectors: Arc<dyn VectorStorePort>,
        config: RagConfig,
    ) -> Self {
        Self {
            llm,
            vectors,
            sessions: SessionStore::new(config.max_history_turns),
            config,
        }
    }

    pub async fn query(&self, request: QueryRequest) -> Result<QueryResponse> {
        let question = request.query.trim();
        if question.is_empty() {
            return Err(AdapterError::InvalidInput(
                "La consulta no puede estar vacía".to_string(),
            ));
        }
        let mode = intent::classify(question);
        self.answer(question, request.session_id, request.filters, mode)
            .await
    }

    pub fn clear_history(&self, session_id: &str) -> bool {
        let cleared = self.sessions.clear(session_id);
        if cleared {
            tracing::info!("History cleared for session {session_id}");
        }
        cleared
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Structured summary of one candidate's CV.
    pub async fn cv_detail(&self, name: &str) -> Result<CvDetail> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AdapterError::InvalidInput("name is required".to_string()));
        }

        let question = format!(
            "Analiza la información del CV de {} y proporciona:\n\n\
             1. Nombre completo\n\
             2. Experiencia laboral (últimas 3 posiciones con empresa y cargo)\n\
             3. Habilidades técnicas principales (top 5)\n\
             4. Educación (último título)\n\
             5. Años totales de experiencia\n\
             6. Nivel de seniority (Junior/Semi-Senior/Senior)\n\n\
             Formatea tu respuesta de manera estructurada y concisa.",
            title_case(name)
        );
        let mode = SearchMode::Specific {
            person: name.to_lowercase(),
        };
        let response = self
            .answer(&question, Some(format!("cv_detail_{name}")), None, mode)
            .await?;

        let sources: Vec<CvDetailSource> = response
            .sources
            .iter()
            .map(|s| CvDetailSource {
                document: s.filename.clone(),
                page: s.chunk_id.clone(),
                relevance: s.score,
            })
            .collect();
        Ok(CvDetail {
            name: name.to_string(),
            content: response.answer,
            chunk_count: sources.len(),
            sources,
        })
    }

    async fn answer(
        &self,
        question: &str,
        session_id: Option<String>,
        filters: Option<SearchFilters>,
        mode: SearchMode,
    ) -> Result<QueryResponse> {
        let session_id = session_id
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        tracing::info!(
            mode = mode.as_str(),
            "Processing query: {}",
            truncate_to_char_boundary(question, LOG_PREVIEW_CHARS)
        );

        let embedding = self
            .llm
            .generate_embeddings(&[question.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AdapterError::Decode("no embedding for the query".to_string()))?;

        let filters = filters.filter(|f| !f.is_empty());
        let retrieval = match &mode {
            SearchMode::Specific { person } => {
                self.retrieve_specific(&embedding, question, person, filters.as_ref())
                    .await?
            }
            SearchMode::General => {
                self.retrieve_general(&embedding, question, filters.as_ref())
                    .await?
            }
        };

        let context: Vec<String> = retrieval.docs.iter().map(|d| d.content.clone()).collect();
        let history = self.sessions.history(&session_id);
        let answer = self
            .llm
            .generate_response(question, &context, &history)
            .await?;
        self.sessions.append(&session_id, question, &answer);

        let mut metadata = BTreeMap::new();
        metadata.insert("timestamp".to_string(), Value::from(Utc::now().to_rfc3339()));
        metadata.insert("documents_found".to_string(), Value::from(retrieval.docs.len()));
        metadata.insert("initial_documents".to_string(), Value::from(retrieval.initial));
        metadata.insert("filtered_documents".to_string(), Value::from(retrieval.filtered));
        metadata.insert("search_mode".to_string(), Value::from(mode.as_str()));
        metadata.insert(
            "listing".to_string(),
            Value::from(intent::asks_for_many(question)),
        );
        metadata.insert(
            "person_name".to_string(),
            mode.person().map_or(Value::Null, Value::from),
        );

        tracing::info!(
            "Query answered from {} chunks, session {session_id}",
            retrieval.docs.len()
        );
        Ok(QueryResponse {
            answer,
            sources: retrieval.docs.iter().map(Source::from).collect(),
            session_id,
            metadata,
        })
    }

    async fn retrieve_specific(
        &self,
        embedding: &[f32],
        question: &str,
        person: &str,
        filters: Option<&SearchFilters>,
    ) -> Result<Retrieval> {
        let k = self.config.top_k * 4;
        let initial = self
            .vectors
            .similarity_search(embedding, k, filters, Some(question))
            .await?;
        let mut matched = intent::filter_by_person(&initial, person);

        if matched.is_empty() {
            let narrowed = filters
                .cloned()
                .unwrap_or_default()
                .with_person(&title_case(person));
            matched = self
                .vectors
                .similarity_search(embedding, k, Some(&narrowed), Some(question))
                .await?;
        }

        let filtered = matched.len();
        let pool = if matched.is_empty() {
            tracing::warn!("No chunks found for {person}, answering from unfiltered results");
            initial.clone()
        } else {
            matched
        };

        Ok(Retrieval {
            docs: intent::keep_best_person(pool, self.config.top_k),
            initial: initial.len(),
            filtered,
        })
    }

    async fn retrieve_general(
        &self,
        embedding: &[f32],
        question: &str,
        filters: Option<&SearchFilters>,
    ) -> Result<Retrieval> {
        let initial = self
            .vectors
            .similarity_search(embedding, self.config.general_top_k, filters, Some(question))
            .await?;
        let initial_count = initial.len();
        let docs = intent::group_profiles(initial, self.config.max_profiles);
        Ok(Retrieval {
            filtered: docs.len(),
            docs,
            initial: initial_count,
        })
    }
}

/// Truncate a string to at most `max_len` bytes on a char boundary.
fn truncate_to_char_boundary(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    s.char_indices()
        .take_while(|(i, c)| i + c.len_utf8() <= max_len)
        .map(|(_, c)| c)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_string() {
        assert_eq!(truncate_to_char_boundary("hola", 100), "hola");
    }

    #[test]
    fn test_truncate_unicode_safe() {
        let s = "¿Quién sabe Python?";
        let result = truncate_to_char_boundary(s, 2);
        assert_eq!(result, "¿");
        assert!(result.len() <= 2);
    }
}
