pub const DDL: &str = r#"
CREATE TABLE IF NOT EXISTS experiments (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    name              TEXT NOT NULL,
    description       TEXT NOT NULL,
    profile_set       TEXT NOT NULL,
    experiment_number INTEGER NOT NULL,
    is_longitudinal   INTEGER NOT NULL DEFAULT 0,
    status            TEXT NOT NULL DEFAULT 'pending',
    created_at        TEXT NOT NULL,
    started_at        TEXT,
    completed_at      TEXT
);

CREATE TABLE IF NOT EXISTS test_cases (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    experiment_id INTEGER NOT NULL REFERENCES experiments(id),
    provider      TEXT NOT NULL,
    instrument    TEXT NOT NULL,
    input_system  TEXT NOT NULL,
    o             INTEGER NOT NULL,
    c             INTEGER NOT NULL,
    e             INTEGER NOT NULL,
    a             INTEGER NOT NULL,
    n             INTEGER NOT NULL,
    profile_label TEXT,
    status        TEXT NOT NULL DEFAULT 'pending',
    attempts      INTEGER NOT NULL DEFAULT 0,
    worker_id     TEXT,
    locked_at     TEXT,
    started_at    TEXT,
    completed_at  TEXT,
    error_message TEXT,
    prompt_sent   TEXT
);

CREATE INDEX IF NOT EXISTS idx_test_cases_claim
    ON test_cases(provider, status);

CREATE TABLE IF NOT EXISTS responses (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    test_case_id        INTEGER NOT NULL REFERENCES test_cases(id),
    question_number     INTEGER NOT NULL,
    question_text       TEXT NOT NULL,
    factor              TEXT NOT NULL,
    is_reversed         INTEGER NOT NULL DEFAULT 0,
    raw_response        TEXT NOT NULL,
    parsed_score        INTEGER NOT NULL,
    score_after_reverse INTEGER NOT NULL,
    response_time_ms    INTEGER,
    sequence_position   INTEGER,
    context_tokens      INTEGER
);

CREATE INDEX IF NOT EXISTS idx_responses_test_case
    ON responses(test_case_id, question_number);

CREATE TABLE IF NOT EXISTS results (
    id                 INTEGER PRIMARY KEY AUTOINCREMENT,
    test_case_id       INTEGER NOT NULL UNIQUE REFERENCES test_cases(id),
    total_score        REAL NOT NULL,
    factor_scores      TEXT NOT NULL,
    questions_answered INTEGER NOT NULL,
    questions_total    INTEGER NOT NULL,
    duration_ms        INTEGER NOT NULL
);
"#;
