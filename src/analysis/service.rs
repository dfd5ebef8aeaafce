use tracing::{info, warn};

use super::{
    dto::{NutritionEstimate, UserNutritionContext},
    error::AnalysisError,
    extract::extract_estimate,
    gemini::TextGenerator,
    prompt::render_prompt,
};

/// Prompt, one model round trip, extraction. No retries, no caching.
pub async fn analyze_meal(
    generator: &dyn TextGenerator,
    text: &str,
    context: Option<&UserNutritionContext>,
) -> Result<NutritionEstimate, AnalysisError> {
    if text.trim().is_empty() {
        return Err(AnalysisError::MissingText);
    }

    let prompt = render_prompt(text, context);
    let raw = generator.generate(&prompt).await?;

    let estimate = extract_estimate(&raw).map_err(|e| {
        warn!(kind = "extraction", error = %e, raw = %raw, "model output rejected");
        AnalysisError::from(e)
    })?;

    info!(
        food_name = %estimate.food_name,
        calories = estimate.calories,
        personalised = context.is_some(),
        "meal analysed"
    );
    Ok(estimate)
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::analysis::{error::LlmError, gemini::TextGenerator};

    /// Replays canned answers and records every prompt it receives.
    #[derive(Default)]
    pub struct ScriptedGenerator {
        answers: Mutex<VecDeque<Result<String, LlmError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedGenerator {
        pub fn answering(answers: impl IntoIterator<Item = &'static str>) -> Self {
            Self {
                answers: Mutex::new(answers.into_iter().map(|a| Ok(a.to_string())).collect()),
                prompts: Mutex::default(),
            }
        }

        pub fn failing(status: u16) -> Self {
            Self {
                answers: Mutex::new(VecDeque::from([Err(LlmError::Status {
                    status,
                    message: "upstream exploded with secret detail".into(),
                })])),
                prompts: Mutex::default(),
            }
        }

        pub fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }

        pub fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.answers
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(LlmError::EmptyResponse))
        }
    }
}
