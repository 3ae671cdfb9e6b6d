//! Article and query embeddings through the OpenAI embeddings endpoint.

use super::{truncate_input, Embedder};
use crate::config::EmbeddingSettings;
use crate::error::{DeskbotError, Result};
use crate::openai::create_client;
use async_openai::types::{CreateEmbeddingRequestArgs, EmbeddingInput};
use async_trait::async_trait;
use tracing::{debug, instrument, warn};

/// Inputs per embeddings request.
const BATCH_SIZE: usize = 100;

pub struct OpenAIEmbedder {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    dimensions: u32,
}

impl OpenAIEmbedder {
    pub fn from_settings(settings: &EmbeddingSettings) -> Result<Self> {
        Ok(Self {
            client: create_client()?,
            model: settings.model.clone(),
            dimensions: settings.dimensions,
        })
    }

    /// Request one batch and place each vector at its input position.
    async fn embed_chunk(&self, inputs: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let expected = inputs.len();
        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(EmbeddingInput::StringArray(inputs))
            .dimensions(self.dimensions)
            .build()
            .map_err(|e| DeskbotError::Embedding(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| DeskbotError::OpenAI(format!("Embedding API error: {}", e)))?;

        let mut slots: Vec<Option<Vec<f32>>> = vec![None; expected];
        for item in response.data {
            match slots.get_mut(item.index as usize) {
                Some(slot) => *slot = Some(item.embedding),
                None => warn!("Ignoring embedding with out-of-range index {}", item.index),
            }
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(i, slot)| {
                slot.ok_or_else(|| DeskbotError::Embedding(format!("No embedding returned for input {}", i)))
            })
            .collect()
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    #[instrument(skip(self, text))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| DeskbotError::Embedding("Empty embedding response".to_string()))
    }

    #[instrument(skip(self, texts), fields(count = texts.len(), model = %self.model))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(BATCH_SIZE) {
            let inputs = chunk.iter().map(|t| truncate_input(t).to_string()).collect();
            embeddings.extend(self.embed_chunk(inputs).await?);
            debug!("Embedded {}/{} texts", embeddings.len(), texts.len());
        }

        Ok(embeddings)
    }
}
