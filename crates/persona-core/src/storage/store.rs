use crate::model::{
    ExperimentSpec, ExperimentStatus, OceanProfile, Response, ResultRecord, StatusCounts, TestCase,
    TestStatus,
};
use anyhow::Context;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Durable job store. The test case table is the single shared mutable
/// resource across workers; all cross-worker coordination goes through the
/// claim/status-transition protocol here.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let conn = Connection::open(path).context("failed to open sqlite db")?;
        configure(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory sqlite db")?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn init_schema(&self) -> anyhow::Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(crate::storage::schema::DDL)?;
        Ok(())
    }

    /// Insert the experiment row and its full Cartesian-product job set in
    /// one transaction. Returns the experiment id.
    pub fn create_experiment(
        &self,
        spec: &ExperimentSpec,
        profiles: &[OceanProfile],
    ) -> anyhow::Result<i64> {
        if spec.description.is_empty() {
            anyhow::bail!("description is required");
        }

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let experiment_number: i64 = tx.query_row(
            "SELECT COALESCE(MAX(experiment_number), 0) + 1 FROM experiments",
            [],
            |r| r.get(0),
        )?;

        tx.execute(
            "INSERT INTO experiments
                 (name, description, profile_set, experiment_number, is_longitudinal, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 'pending', ?6)",
            params![
                spec.name,
                spec.description,
                spec.profile_set,
                experiment_number,
                spec.is_longitudinal,
                now_rfc3339(),
            ],
        )?;
        let experiment_id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare(
                "INSERT INTO test_cases
                     (experiment_id, provider, instrument, input_system,
                      o, c, e, a, n, profile_label, status)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 'pending')",
            )?;
            for input_system in &spec.input_systems {
                for instrument in &spec.instruments {
                    for provider in &spec.providers {
                        for profile in profiles {
                            stmt.execute(params![
                                experiment_id,
                                provider,
                                instrument,
                                input_system,
                                profile.openness,
                                profile.conscientiousness,
                                profile.extraversion,
                                profile.agreeableness,
                                profile.neuroticism,
                                profile.label,
                            ])?;
                        }
                    }
                }
            }
        }

        tx.commit()?;
        tracing::info!(experiment_id, experiment_number, "created experiment");
        Ok(experiment_id)
    }

    /// Atomically claim one pending/retry test case for a provider.
    ///
    /// A single UPDATE..RETURNING both selects and flips the row, so
    /// competing claimants are serialized by the database and a row already
    /// flipped to `locked` is no longer eligible for anyone else. Returns
    /// `None` when no eligible row exists.
    pub fn claim(
        &self,
        provider: &str,
        experiment_id: Option<i64>,
        worker_id: &str,
    ) -> anyhow::Result<Option<TestCase>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                "UPDATE test_cases
                 SET status = 'locked', locked_at = ?1, worker_id = ?2
                 WHERE id = (
                     SELECT id FROM test_cases
                     WHERE status IN ('pending', 'retry')
                       AND provider = ?3
                       AND (?4 IS NULL OR experiment_id = ?4)
                     ORDER BY id
                     LIMIT 1
                 )
                 AND status IN ('pending', 'retry')
                 RETURNING id, experiment_id, provider, instrument, input_system,
                           o, c, e, a, n, profile_label, status, attempts,
                           worker_id, locked_at",
                params![now_rfc3339(), worker_id, provider, experiment_id],
                map_test_case,
            )
            .optional()
            .context("claim test case")?;
        Ok(row)
    }

    /// locked -> running; bumps the attempt counter and records the rendered
    /// prompt for audit.
    pub fn start(&self, test_case_id: i64, prompt_sent: &str) -> anyhow::Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE test_cases
             SET status = 'running', started_at = ?1, attempts = attempts + 1, prompt_sent = ?2
             WHERE id = ?3",
            params![now_rfc3339(), prompt_sent, test_case_id],
        )?;
        Ok(())
    }

    /// Flip to `complete` and insert the result row in one transaction;
    /// either both effects happen or neither.
    pub fn complete_with_result(
        &self,
        test_case_id: i64,
        result: &ResultRecord,
    ) -> anyhow::Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute(
            "UPDATE test_cases SET status = 'complete', completed_at = ?1 WHERE id = ?2",
            params![now_rfc3339(), test_case_id],
        )?;
        tx.execute(
            "INSERT INTO results
                 (test_case_id, total_score, factor_scores,
                  questions_answered, questions_total, duration_ms)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                test_case_id,
                result.total_score,
                serde_json::to_string(&result.factor_scores)?,
                result.questions_answered,
                result.questions_total,
                result.duration_ms as i64,
            ],
        )?;
        tx.commit().context("commit completion")?;
        Ok(())
    }

    /// Route a failed execution: retryable failures go back to `retry`
    /// until the third attempt, everything else is terminal `failed`. Lock
    /// fields are cleared so the row can be re-claimed by any worker.
    pub fn fail(
        &self,
        test_case_id: i64,
        error_message: &str,
        retryable: bool,
    ) -> anyhow::Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let status = if retryable {
            let attempts: u32 = tx.query_row(
                "SELECT attempts FROM test_cases WHERE id = ?1",
                params![test_case_id],
                |r| r.get(0),
            )?;
            if attempts < 3 {
                TestStatus::Retry
            } else {
                TestStatus::Failed
            }
        } else {
            TestStatus::Failed
        };

        tx.execute(
            "UPDATE test_cases
             SET status = ?1, error_message = ?2, locked_at = NULL, worker_id = NULL
             WHERE id = ?3",
            params![status.as_str(), error_message, test_case_id],
        )?;
        tx.commit()?;
        tracing::warn!(test_case_id, status = status.as_str(), error_message, "test case failed");
        Ok(())
    }

    /// Append-only; no status side effect.
    pub fn insert_response(&self, response: &Response) -> anyhow::Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO responses
                 (test_case_id, question_number, question_text, factor, is_reversed,
                  raw_response, parsed_score, score_after_reverse, response_time_ms,
                  sequence_position, context_tokens)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                response.test_case_id,
                response.question_number,
                response.question_text,
                response.factor,
                response.is_reversed,
                response.raw_response,
                response.parsed_score,
                response.score_after_reverse,
                response.response_time_ms.map(|v| v as i64),
                response.sequence_position,
                response.context_tokens.map(|v| v as i64),
            ],
        )?;
        Ok(())
    }

    pub fn start_experiment(&self, experiment_id: i64) -> anyhow::Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE experiments
             SET status = 'running', started_at = ?1
             WHERE id = ?2 AND started_at IS NULL",
            params![now_rfc3339(), experiment_id],
        )?;
        Ok(())
    }

    pub fn complete_experiment(&self, experiment_id: i64) -> anyhow::Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE experiments SET status = 'complete', completed_at = ?1 WHERE id = ?2",
            params![now_rfc3339(), experiment_id],
        )?;
        Ok(())
    }

    pub fn experiment_status(&self, experiment_id: i64) -> anyhow::Result<Option<ExperimentStatus>> {
        let conn = self.conn.lock().unwrap();
        let head = conn
            .query_row(
                "SELECT id, name, status, experiment_number, is_longitudinal,
                        started_at, completed_at
                 FROM experiments WHERE id = ?1",
                params![experiment_id],
                |r| {
                    Ok((
                        r.get::<_, i64>(0)?,
                        r.get::<_, String>(1)?,
                        r.get::<_, String>(2)?,
                        r.get::<_, i64>(3)?,
                        r.get::<_, bool>(4)?,
                        r.get::<_, Option<String>>(5)?,
                        r.get::<_, Option<String>>(6)?,
                    ))
                },
            )
            .optional()?;

        let Some((id, name, status, experiment_number, is_longitudinal, started_at, completed_at)) =
            head
        else {
            return Ok(None);
        };

        let counts = query_counts(&conn, Some(id))?;
        Ok(Some(ExperimentStatus {
            id,
            name,
            status,
            experiment_number,
            is_longitudinal,
            started_at,
            completed_at,
            counts,
        }))
    }

    /// Aggregate per-status counts, optionally scoped to one experiment.
    pub fn status_counts(&self, experiment_id: Option<i64>) -> anyhow::Result<StatusCounts> {
        let conn = self.conn.lock().unwrap();
        query_counts(&conn, experiment_id)
    }

    pub fn pending_count(&self, provider: &str) -> anyhow::Result<u64> {
        let conn = self.conn.lock().unwrap();
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM test_cases
             WHERE provider = ?1 AND status IN ('pending', 'retry')",
            params![provider],
            |r| r.get(0),
        )?;
        Ok(n as u64)
    }

    /// Providers that still have claimable work; drives the worker loop.
    pub fn providers_with_pending(
        &self,
        experiment_id: Option<i64>,
    ) -> anyhow::Result<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT DISTINCT provider FROM test_cases
             WHERE status IN ('pending', 'retry')
               AND (?1 IS NULL OR experiment_id = ?1)
             ORDER BY provider",
        )?;
        let rows = stmt.query_map(params![experiment_id], |r| r.get::<_, String>(0))?;
        let mut providers = Vec::new();
        for p in rows {
            providers.push(p?);
        }
        Ok(providers)
    }

    pub fn responses(&self, test_case_id: i64) -> anyhow::Result<Vec<Response>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT test_case_id, question_number, question_text, factor, is_reversed,
                    raw_response, parsed_score, score_after_reverse, response_time_ms,
                    sequence_position, context_tokens
             FROM responses WHERE test_case_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![test_case_id], |r| {
            Ok(Response {
                test_case_id: r.get(0)?,
                question_number: r.get(1)?,
                question_text: r.get(2)?,
                factor: r.get(3)?,
                is_reversed: r.get(4)?,
                raw_response: r.get(5)?,
                parsed_score: r.get(6)?,
                score_after_reverse: r.get(7)?,
                response_time_ms: r.get::<_, Option<i64>>(8)?.map(|v| v as u64),
                sequence_position: r.get(9)?,
                context_tokens: r.get::<_, Option<i64>>(10)?.map(|v| v as u64),
            })
        })?;
        let mut responses = Vec::new();
        for r in rows {
            responses.push(r?);
        }
        Ok(responses)
    }

    pub fn result_for(&self, test_case_id: i64) -> anyhow::Result<Option<ResultRecord>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                "SELECT test_case_id, total_score, factor_scores,
                        questions_answered, questions_total, duration_ms
                 FROM results WHERE test_case_id = ?1",
                params![test_case_id],
                |r| {
                    Ok((
                        r.get::<_, i64>(0)?,
                        r.get::<_, f64>(1)?,
                        r.get::<_, String>(2)?,
                        r.get::<_, u32>(3)?,
                        r.get::<_, u32>(4)?,
                        r.get::<_, i64>(5)?,
                    ))
                },
            )
            .optional()?;
        let Some((test_case_id, total_score, factors_json, answered, total, duration_ms)) = row
        else {
            return Ok(None);
        };
        Ok(Some(ResultRecord {
            test_case_id,
            total_score,
            factor_scores: serde_json::from_str(&factors_json).context("decode factor scores")?,
            questions_answered: answered,
            questions_total: total,
            duration_ms: duration_ms as u64,
        }))
    }

    pub fn test_case(&self, test_case_id: i64) -> anyhow::Result<Option<TestCase>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                "SELECT id, experiment_id, provider, instrument, input_system,
                        o, c, e, a, n, profile_label, status, attempts,
                        worker_id, locked_at
                 FROM test_cases WHERE id = ?1",
                params![test_case_id],
                map_test_case,
            )
            .optional()?;
        Ok(row)
    }
}

fn configure(conn: &Connection) -> anyhow::Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])?;
    // WAL + busy timeout so claimants from other processes retry on the
    // write lock instead of erroring out.
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.busy_timeout(Duration::from_secs(5))?;
    Ok(())
}

fn query_counts(conn: &Connection, experiment_id: Option<i64>) -> anyhow::Result<StatusCounts> {
    conn.query_row(
        "SELECT
             COUNT(*),
             SUM(CASE WHEN status = 'complete' THEN 1 ELSE 0 END),
             SUM(CASE WHEN status IN ('failed', 'error') THEN 1 ELSE 0 END),
             SUM(CASE WHEN status IN ('pending', 'retry') THEN 1 ELSE 0 END),
             SUM(CASE WHEN status IN ('locked', 'running') THEN 1 ELSE 0 END)
         FROM test_cases
         WHERE ?1 IS NULL OR experiment_id = ?1",
        params![experiment_id],
        |r| {
            Ok(StatusCounts {
                total: r.get::<_, Option<i64>>(0)?.unwrap_or(0) as u64,
                complete: r.get::<_, Option<i64>>(1)?.unwrap_or(0) as u64,
                failed: r.get::<_, Option<i64>>(2)?.unwrap_or(0) as u64,
                pending: r.get::<_, Option<i64>>(3)?.unwrap_or(0) as u64,
                running: r.get::<_, Option<i64>>(4)?.unwrap_or(0) as u64,
            })
        },
    )
    .context("status counts")
}

fn map_test_case(row: &Row<'_>) -> rusqlite::Result<TestCase> {
    let profile = OceanProfile {
        openness: row.get(5)?,
        conscientiousness: row.get(6)?,
        extraversion: row.get(7)?,
        agreeableness: row.get(8)?,
        neuroticism: row.get(9)?,
        label: row.get(10)?,
    };
    Ok(TestCase {
        id: row.get(0)?,
        experiment_id: row.get(1)?,
        provider: row.get(2)?,
        instrument: row.get(3)?,
        input_system: row.get(4)?,
        profile,
        status: TestStatus::parse(&row.get::<_, String>(11)?),
        attempts: row.get(12)?,
        worker_id: row.get(13)?,
        locked_at: row.get(14)?,
    })
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}
