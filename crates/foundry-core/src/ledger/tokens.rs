use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tiktoken_rs::CoreBPE;

use crate::error::CoreError;

/// Counts tokens with the tokenizer of the model being billed.
///
/// Models tiktoken does not know fall back to `cl100k_base`. Encoders are
/// loaded once per model and shared afterwards.
#[derive(Default)]
pub struct TokenCounter {
    encoders: Mutex<HashMap<String, Arc<CoreBPE>>>,
}

impl TokenCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, model: &str, text: &str) -> Result<u64, CoreError> {
        if text.is_empty() {
            return Ok(0);
        }
        let bpe = self.encoder(model)?;
        Ok(bpe.encode_ordinary(text).len() as u64)
    }

    fn encoder(&self, model: &str) -> Result<Arc<CoreBPE>, CoreError> {
        let mut cache = self
            .encoders
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(bpe) = cache.get(model) {
            return Ok(Arc::clone(bpe));
        }

        let bpe = match tiktoken_rs::get_bpe_from_model(model) {
            Ok(bpe) => bpe,
            Err(_) => {
                tracing::debug!(model, "No dedicated tokenizer, using cl100k_base");
                tiktoken_rs::cl100k_base().map_err(|e| CoreError::Tokenizer(e.to_string()))?
            }
        };
        let bpe = Arc::new(bpe);
        cache.insert(model.to_string(), Arc::clone(&bpe));
        Ok(bpe)
    }
}
