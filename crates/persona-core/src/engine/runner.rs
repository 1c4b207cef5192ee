use crate::engine::ConversationState;
use crate::errors::is_retryable;
use crate::input_systems::{self, InputSystem};
use crate::instruments::{self, Instrument, InstrumentScores};
use crate::model::{OceanProfile, Response, ResultRecord, TestCase, TestStatus};
use crate::providers::{create_client, CompletionOptions, ProviderClient, ProviderKind};
use crate::storage::Store;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// provider name -> API key, usually harvested from the environment.
    pub api_keys: HashMap<String, String>,
    /// Accumulate conversation history within each test case.
    pub longitudinal: bool,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            api_keys: HashMap::new(),
            longitudinal: false,
            max_tokens: 10,
            temperature: 0.3,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DrainOptions {
    pub experiment: Option<i64>,
    pub limit: Option<usize>,
    pub workers: usize,
}

/// Test cases that reached a terminal state during this run. Retryable
/// failures that were re-queued are not counted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: u64,
    pub complete: u64,
    pub failed: u64,
}

/// Orchestrates JobStore, provider clients, and catalogs to execute claimed
/// test cases end to end.
#[derive(Clone)]
pub struct ExperimentRunner {
    store: Store,
    config: RunnerConfig,
    clients: Arc<Mutex<HashMap<String, Arc<dyn ProviderClient>>>>,
}

impl ExperimentRunner {
    pub fn new(store: Store, config: RunnerConfig) -> Self {
        Self {
            store,
            config,
            clients: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Pre-seed the client cache. Lets tests (and replay tooling) supply a
    /// scripted client instead of a live one.
    pub fn with_client(self, provider: &str, client: Arc<dyn ProviderClient>) -> Self {
        self.clients
            .lock()
            .unwrap()
            .insert(provider.to_string(), client);
        self
    }

    fn client_for(&self, provider: &str) -> anyhow::Result<Arc<dyn ProviderClient>> {
        let mut clients = self.clients.lock().unwrap();
        if let Some(client) = clients.get(provider) {
            return Ok(client.clone());
        }
        let kind: ProviderKind = provider.parse()?;
        let client = create_client(kind, self.config.api_keys.get(provider).map(String::as_str))?;
        clients.insert(provider.to_string(), client.clone());
        Ok(client)
    }

    /// Execute one claimed test case and route the outcome through the
    /// store's state machine. Returns true on completion.
    pub async fn run_test_case(&self, test_case: &TestCase) -> bool {
        match self.execute(test_case).await {
            Ok(scores) => {
                tracing::info!(
                    test_case_id = test_case.id,
                    total_score = scores.total_score,
                    "test case complete"
                );
                true
            }
            Err(e) => {
                let retryable = is_retryable(&e);
                if let Err(db_err) = self.store.fail(test_case.id, &format!("{e:#}"), retryable) {
                    tracing::error!(test_case_id = test_case.id, error = %db_err, "failed to record failure");
                }
                false
            }
        }
    }

    async fn execute(&self, test_case: &TestCase) -> anyhow::Result<InstrumentScores> {
        // Unknown keys are configuration errors and must not be retried.
        let client = self.client_for(&test_case.provider)?;
        let instrument = instruments::get_instrument(&test_case.instrument)?;
        let input_system = input_systems::get_input_system(&test_case.input_system)?;

        let system_prompt = build_system_prompt(
            input_system.as_ref(),
            instrument.as_ref(),
            &test_case.profile,
        );

        self.store.start(test_case.id, &system_prompt)?;
        let started = Instant::now();

        tracing::info!(
            test_case_id = test_case.id,
            provider = %test_case.provider,
            instrument = %test_case.instrument,
            input_system = %test_case.input_system,
            profile = %test_case.profile,
            longitudinal = self.config.longitudinal,
            "running test case"
        );

        let opts = CompletionOptions {
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let mut conversation = ConversationState::new();
        let mut ratings: BTreeMap<u32, u8> = BTreeMap::new();

        for (index, question) in instrument.questions().into_iter().enumerate() {
            let sequence_position = (index + 1) as u32;
            let user_msg = render_question(&question.text);

            let completion = if self.config.longitudinal {
                conversation.push_user(&user_msg);
                let result = client
                    .complete_with_history(conversation.messages(), Some(&system_prompt), opts)
                    .await?;
                conversation.push_assistant(&result.text);
                result
            } else {
                client
                    .complete(&format!("{system_prompt}\n\n{user_msg}"), opts)
                    .await?
            };

            let score = client.parse_rating(&completion.text);
            ratings.insert(question.number, score);

            self.store.insert_response(&Response {
                test_case_id: test_case.id,
                question_number: question.number,
                question_text: question.text.clone(),
                factor: question.factor.clone(),
                is_reversed: question.is_reversed,
                raw_response: completion.text.clone(),
                parsed_score: score,
                score_after_reverse: instrument.apply_reverse(score, question.is_reversed),
                response_time_ms: completion.latency_ms,
                sequence_position: self.config.longitudinal.then_some(sequence_position),
                context_tokens: if self.config.longitudinal {
                    completion.prompt_tokens
                } else {
                    None
                },
            })?;

            tracing::debug!(
                question = question.number,
                factor = %question.factor,
                score,
                "recorded response"
            );
        }

        let scores = instrument.score(&ratings);
        if let Some(band) = instrument.interpretation(scores.total_score) {
            tracing::info!(test_case_id = test_case.id, band, "severity banding");
        }
        self.store.complete_with_result(
            test_case.id,
            &ResultRecord {
                test_case_id: test_case.id,
                total_score: scores.total_score,
                factor_scores: scores.factor_scores.clone(),
                questions_answered: scores.questions_answered,
                questions_total: scores.questions_total,
                duration_ms: started.elapsed().as_millis() as u64,
            },
        )?;

        Ok(scores)
    }

    /// Drain pending/retry jobs with a pool of worker tasks. Each worker
    /// runs one test case at a time, strictly sequentially; the claim
    /// transaction completes before any network call begins, so no database
    /// lock is held across a suspension point.
    pub async fn drain(&self, opts: DrainOptions) -> anyhow::Result<RunSummary> {
        let workers = opts.workers.max(1);
        let budget = Arc::new(AtomicI64::new(
            opts.limit.map(|l| l as i64).unwrap_or(i64::MAX),
        ));

        let mut handles = Vec::with_capacity(workers);
        for worker_index in 0..workers {
            let this = self.clone();
            let budget = budget.clone();
            let experiment = opts.experiment;
            handles.push(tokio::spawn(async move {
                let worker_id = format!("worker-{}-{}", std::process::id(), worker_index);
                let mut complete = 0u64;
                let mut failed = 0u64;

                loop {
                    if budget.fetch_sub(1, Ordering::SeqCst) <= 0 {
                        break;
                    }
                    let Some(test_case) = this.claim_any(experiment, &worker_id)? else {
                        break;
                    };
                    if this.run_test_case(&test_case).await {
                        complete += 1;
                    } else {
                        // A retryable failure re-queues the row; only a
                        // terminal failure counts as an outcome.
                        let status = this
                            .store
                            .test_case(test_case.id)?
                            .map(|tc| tc.status);
                        if status == Some(TestStatus::Failed) {
                            failed += 1;
                        }
                    }
                }

                Ok::<_, anyhow::Error>((complete, failed))
            }));
        }

        let mut summary = RunSummary::default();
        let mut first_err = None;
        for handle in handles {
            match handle.await {
                Ok(Ok((complete, failed))) => {
                    summary.complete += complete;
                    summary.failed += failed;
                }
                Ok(Err(e)) => {
                    first_err.get_or_insert(e);
                }
                Err(e) => {
                    first_err.get_or_insert(anyhow::Error::new(e));
                }
            }
        }
        if let Some(e) = first_err {
            return Err(e);
        }
        summary.total = summary.complete + summary.failed;
        Ok(summary)
    }

    /// Run all pending test cases for one experiment, bracketing with the
    /// experiment lifecycle timestamps.
    pub async fn run_experiment(
        &self,
        experiment_id: i64,
        limit: Option<usize>,
        workers: usize,
    ) -> anyhow::Result<RunSummary> {
        self.store.start_experiment(experiment_id)?;
        let summary = self
            .drain(DrainOptions {
                experiment: Some(experiment_id),
                limit,
                workers,
            })
            .await?;
        let counts = self.store.status_counts(Some(experiment_id))?;
        if counts.pending == 0 && counts.running == 0 {
            self.store.complete_experiment(experiment_id)?;
        }
        Ok(summary)
    }

    /// One claim attempt across all providers that still have work.
    fn claim_any(
        &self,
        experiment: Option<i64>,
        worker_id: &str,
    ) -> anyhow::Result<Option<TestCase>> {
        for provider in self.store.providers_with_pending(experiment)? {
            if let Some(test_case) = self.store.claim(&provider, experiment, worker_id)? {
                return Ok(Some(test_case));
            }
        }
        Ok(None)
    }

    pub fn store(&self) -> &Store {
        &self.store
    }
}

fn build_system_prompt(
    input_system: &dyn InputSystem,
    instrument: &dyn Instrument,
    profile: &OceanProfile,
) -> String {
    format!(
        "{}\n\nBased on these personality traits, {}",
        input_system.preamble(profile),
        instrument.scale_instructions()
    )
}

fn render_question(text: &str) -> String {
    format!("Statement: \"{text}\"\n\nRespond with ONLY a single number (1, 2, 3, 4, or 5).")
}

/// Quick integration test: single profile, single instrument, no database.
pub async fn quick_test(
    config: &RunnerConfig,
    provider: &str,
) -> anyhow::Result<InstrumentScores> {
    let kind: ProviderKind = provider.parse()?;
    let client = create_client(kind, config.api_keys.get(provider).map(String::as_str))?;

    let instrument = instruments::get_instrument("levenson")?;
    let input_system = input_systems::get_input_system("ocean_direct")?;
    let profile = OceanProfile::new(50, 25, 50, 0, 50);

    let mode = if config.longitudinal {
        "LONGITUDINAL"
    } else {
        "INDEPENDENT"
    };
    println!("Quick test: {provider} + Levenson + OCEAN Direct [{mode}]");
    println!("Profile: {profile}");
    println!();

    let system_prompt = build_system_prompt(input_system.as_ref(), instrument.as_ref(), &profile);
    let opts = CompletionOptions {
        max_tokens: config.max_tokens,
        temperature: config.temperature,
    };

    let mut conversation = ConversationState::new();
    let mut ratings: BTreeMap<u32, u8> = BTreeMap::new();

    for question in instrument.questions() {
        let user_msg = render_question(&question.text);
        let result = if config.longitudinal {
            conversation.push_user(&user_msg);
            let r = client
                .complete_with_history(conversation.messages(), Some(&system_prompt), opts)
                .await?;
            conversation.push_assistant(&r.text);
            r
        } else {
            client
                .complete(&format!("{system_prompt}\n\n{user_msg}"), opts)
                .await?
        };

        let score = client.parse_rating(&result.text);
        ratings.insert(question.number, score);

        let factor_short = question
            .factor
            .chars()
            .next()
            .unwrap_or('?')
            .to_ascii_uppercase();
        let rev = if question.is_reversed { "R" } else { "" };
        println!(
            "Q{}({}{}): {} [{}]",
            question.number,
            factor_short,
            rev,
            score,
            result.text.trim()
        );
    }

    let scores = instrument.score(&ratings);
    println!();
    println!("Total: {:.1}", scores.total_score);
    for (factor, score) in &scores.factor_scores {
        println!("{factor}: {score:.1}");
    }
    if let Some(band) = instrument.interpretation(scores.total_score) {
        println!("Severity: {band}");
    }
    Ok(scores)
}
