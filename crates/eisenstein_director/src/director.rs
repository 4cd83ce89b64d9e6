//! The bounded tool-calling orchestration loop.

use crate::{
    Conversation, DirectorConfig, PipelineOutcome, StoryboardPipeline, ToolRegistry,
    parse_quality_score,
};
use eisenstein_core::{StoryboardDocument, ToolCall, WirePrompt, WireStoryboard};
use eisenstein_error::{DirectorError, DirectorErrorKind, EisensteinResult};
use eisenstein_interface::{DirectorDriver, ToolDefinition};
use serde::Serialize;

/// States of a director run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, derive_more::Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DirectorState {
    /// Conversation not yet assembled
    #[display("START")]
    Start,
    /// Waiting on the model
    #[display("AWAIT_MODEL")]
    AwaitModel,
    /// Running the tool calls of the last model turn
    #[display("RUN_TOOLS")]
    RunTools,
    /// Deciding whether the current storyboard is good enough
    #[display("EVALUATE")]
    Evaluate,
    /// Finished with a storyboard
    #[display("DONE")]
    Done,
    /// Iteration budget exhausted without an accepted storyboard
    #[display("ABORTED")]
    Aborted,
}

/// Result of [`Director::run`].
///
/// An aborted run carries no prompts. That is an expected outcome, not an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectorReport {
    /// Terminal state, [`DirectorState::Done`] or [`DirectorState::Aborted`]
    pub state: DirectorState,
    /// The accepted storyboard in wire form; empty when aborted
    pub prompts: Vec<WirePrompt>,
    /// Iterations consumed
    pub iterations: u32,
    /// Last critique score of the best storyboard
    pub quality_score: Option<f64>,
    /// Tool calls executed
    pub tool_calls: usize,
    /// True when the best storyboard came from fallback mining
    pub used_fallback: bool,
}

impl DirectorReport {
    /// True when no storyboard was produced.
    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    /// `{ "prompts": [...] }` for downstream generators.
    pub fn to_wire(&self) -> WireStoryboard {
        WireStoryboard {
            prompts: self.prompts.clone(),
        }
    }
}

#[derive(Debug, Default)]
struct RunState {
    conversation: Conversation,
    iterations: u32,
    best: Option<StoryboardDocument>,
    best_is_fallback: bool,
    score: Option<f64>,
    pending: Vec<ToolCall>,
    tool_calls: usize,
}

/// Drives model rounds and tool calls until a storyboard is accepted or the budget runs out.
///
/// Tool calls run one at a time, each result entering the history before
/// the next call starts.
#[derive(Debug)]
pub struct Director<D: DirectorDriver> {
    driver: D,
    tools: ToolRegistry,
    pipeline: StoryboardPipeline,
    config: DirectorConfig,
}

impl<D: DirectorDriver> Director<D> {
    /// Create a director.
    ///
    /// # Errors
    ///
    /// Returns an error if the budget is zero or the threshold lies outside `[0, 1]`.
    pub fn new(
        driver: D,
        tools: ToolRegistry,
        pipeline: StoryboardPipeline,
        config: DirectorConfig,
    ) -> EisensteinResult<Self> {
        config.validate()?;
        Ok(Self {
            driver,
            tools,
            pipeline,
            config,
        })
    }

    /// The loop settings.
    pub fn config(&self) -> &DirectorConfig {
        &self.config
    }

    /// The storyboard pipeline, for metrics and notification callbacks.
    pub fn pipeline(&self) -> &StoryboardPipeline {
        &self.pipeline
    }

    /// The model driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Run the loop for one task.
    ///
    /// # Errors
    ///
    /// Only a failing model driver ends the run with an error. Bad JSON,
    /// failing tools and unknown tools are absorbed.
    #[tracing::instrument(
        skip(self, task),
        fields(provider = self.driver.provider_name(), model = self.driver.model_name())
    )]
    pub async fn run(&self, task: &str) -> EisensteinResult<DirectorReport> {
        let definitions = self.tools.definitions();
        let mut run = RunState::default();
        let mut state = DirectorState::Start;

        loop {
            let next = match state {
                DirectorState::Start => {
                    run.conversation = Conversation::with_system_prompt(&self.config.persona);
                    run.conversation.add_user_message(task);
                    DirectorState::AwaitModel
                }
                DirectorState::AwaitModel => self.await_model(&mut run, &definitions).await?,
                DirectorState::RunTools => self.run_tools(&mut run).await,
                DirectorState::Evaluate => self.evaluate(&mut run),
                DirectorState::Done | DirectorState::Aborted => break,
            };
            tracing::debug!(from = %state, to = %next, iterations = run.iterations, "Transition");
            state = next;
        }

        let prompts = match (state, &run.best) {
            (DirectorState::Done, Some(best)) => best.to_wire().prompts,
            _ => Vec::new(),
        };
        tracing::info!(
            %state,
            iterations = run.iterations,
            prompts = prompts.len(),
            quality_score = ?run.score,
            "Director run finished"
        );

        Ok(DirectorReport {
            state,
            prompts,
            iterations: run.iterations,
            quality_score: run.score,
            tool_calls: run.tool_calls,
            used_fallback: run.best.is_some() && run.best_is_fallback,
        })
    }

    async fn await_model(
        &self,
        run: &mut RunState,
        definitions: &[ToolDefinition],
    ) -> EisensteinResult<DirectorState> {
        // EVALUATE still decides whether the last storyboard is accepted.
        if run.iterations >= self.config.max_iterations {
            tracing::warn!(budget = self.config.max_iterations, "Iteration budget exhausted");
            return Ok(DirectorState::Evaluate);
        }
        run.iterations += 1;

        let round = run.iterations;
        let response = self
            .driver
            .invoke(run.conversation.messages(), definitions)
            .await
            .map_err(|e| {
                DirectorError::new(DirectorErrorKind::ModelInvocation {
                    round,
                    message: e.to_string(),
                })
            })?;
        run.conversation.add_model_turn(&response);

        if response.has_tool_calls() {
            tracing::debug!(round, calls = response.tool_calls.len(), "Model requested tools");
            run.pending = response.tool_calls;
            Ok(DirectorState::RunTools)
        } else {
            Ok(DirectorState::Evaluate)
        }
    }

    async fn run_tools(&self, run: &mut RunState) -> DirectorState {
        let calls = std::mem::take(&mut run.pending);
        for call in &calls {
            run.tool_calls += 1;
            let output = match self.tools.invoke(&call.name, &call.arguments).await {
                Ok(output) => {
                    self.absorb_output(run, call, &output);
                    output
                }
                Err(e) => {
                    tracing::warn!(tool = %call.name, error = %e, "Tool failed; continuing");
                    format!("Tool {} failed: {}", call.name, e)
                }
            };
            run.conversation.add_tool_result(call, output);
        }
        DirectorState::AwaitModel
    }

    // Storyboard output replaces the best storyboard; critique output scores it.
    fn absorb_output(&self, run: &mut RunState, call: &ToolCall, output: &str) {
        if !self.tools.contains(&call.name) {
            return;
        }

        if self.config.is_storyboard_tool(&call.name) {
            let outcome = self.pipeline.process(output);
            let is_fallback = outcome.is_fallback();
            match outcome.into_document() {
                Some(document) => {
                    tracing::debug!(
                        tool = %call.name,
                        prompts = document.len(),
                        fallback = is_fallback,
                        "Storyboard retained"
                    );
                    run.best = Some(document);
                    run.best_is_fallback = is_fallback;
                    run.score = None;
                }
                None => tracing::debug!(tool = %call.name, "Tool output held no storyboard"),
            }
        }

        if self.config.is_critique_tool(&call.name) {
            match parse_quality_score(output) {
                Some(score) => {
                    tracing::debug!(score, "Critique scored storyboard");
                    run.score = Some(score);
                }
                None => tracing::debug!(tool = %call.name, "Critique held no score"),
            }
        }
    }

    fn evaluate(&self, run: &mut RunState) -> DirectorState {
        let threshold = self.config.quality_threshold;
        match (&run.best, run.score) {
            (Some(_), None) => DirectorState::Done,
            (Some(_), Some(score)) if score >= threshold => DirectorState::Done,
            _ if run.iterations >= self.config.max_iterations => DirectorState::Aborted,
            (Some(_), Some(score)) => {
                run.iterations += 1;
                run.conversation
                    .add_user_message(self.config.refinement_message(score));
                DirectorState::AwaitModel
            }
            (None, _) => {
                run.iterations += 1;
                run.conversation
                    .add_user_message(self.config.missing_storyboard_prompt.clone());
                DirectorState::AwaitModel
            }
        }
    }
}
