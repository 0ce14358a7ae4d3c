//! # cv-rag
//!
//! A question-answering service over a collection of CVs. PDFs are uploaded,
//! split by CV section, embedded with Azure OpenAI and indexed in Azure AI
//! Search; questions are answered by the chat model from the retrieved
//! chunks.
//!
//! ## Architecture
//!
//! Hexagonal: the services only see the traits in [`ports`].
//!
//! ```text
//!              ┌──────────────────────────────┐
//!   HTTP ────► │ api (axum)                   │
//!              └──────┬───────────────┬───────┘
//!                     ▼               ▼
//!             ┌──────────────┐ ┌─────────────────┐
//!             │ rag::RagAgent│ │ documents::     │
//!             │ intent,      │ │ DocumentManager │
//!             │ sessions     │ │ chunking, pdf   │
//!             └──────┬───────┘ └───────┬─────────┘
//!                    └────────┬────────┘
//!                             ▼ ports
//!        ┌──────────────┬─────────────────┬───────────────┐
//!        │ LlmPort      │ VectorStorePort │ BlobStorePort │
//!        │ llm (Azure   │ search (Azure   │ storage (Azure│
//!        │ OpenAI)      │ AI Search/local)│ Blob/local)   │
//!        └──────────────┴─────────────────┴───────────────┘
//! ```
//!
//! ## Query flow
//!
//! A question naming a person ("experiencia de Ana Silva") is answered from
//! that person's chunks only. Any other question is answered from the best
//! chunk of each of several candidates.
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration for server, Azure services and RAG parameters
//! - [`error`] - `AdapterError`, shared by the ports and services
//! - [`models`] - Chunks, search hits, snapshots and HTTP request/response types
//! - [`ports`] - `LlmPort`, `VectorStorePort`, `BlobStorePort`
//! - [`llm`] - Azure OpenAI chat completions and embeddings
//! - [`search`] - Azure AI Search adapter and local JSON vector store
//! - [`storage`] - Azure Blob Storage adapter (Shared Key / SAS) and local filesystem store
//! - [`chunking`] - Section detection, overlapping windows and CV owner name extraction
//! - [`documents`] - Upload, ingestion, listing and deletion of CVs
//! - [`rag`] - Query classification, retrieval and answer generation with session history
//! - [`api`] - Axum HTTP handlers
//! - [`state`] - Shared application state and backend selection

pub mod api;
pub mod chunking;
pub mod config;
pub mod documents;
pub mod error;
pub mod llm;
pub mod models;
pub mod ports;
pub mod rag;
pub mod search;
pub mod state;
pub mod storage;
