/// Statements creating the relational schema, applied in order at connection time.
pub(super) const SCHEMA: &[(&str, &str)] = &[
    (
        "users",
        "CREATE TABLE IF NOT EXISTS users (
            user_id BIGSERIAL PRIMARY KEY,
            google_id TEXT NOT NULL UNIQUE,
            email TEXT,
            nickname TEXT,
            picture_url TEXT,
            points BIGINT NOT NULL DEFAULT 0,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    ),
    (
        "point_history",
        "CREATE TABLE IF NOT EXISTS point_history (
            id BIGSERIAL PRIMARY KEY,
            user_id BIGINT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
            points_change BIGINT NOT NULL,
            reason TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    ),
    (
        "point_history_user_idx",
        "CREATE INDEX IF NOT EXISTS point_history_user_idx
            ON point_history (user_id, created_at DESC)",
    ),
    (
        "quiz_scores",
        "CREATE TABLE IF NOT EXISTS quiz_scores (
            id BIGSERIAL PRIMARY KEY,
            user_id BIGINT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
            quiz_id TEXT NOT NULL,
            score INTEGER NOT NULL,
            submitted_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    ),
    (
        "quiz_scores_quiz_idx",
        "CREATE INDEX IF NOT EXISTS quiz_scores_quiz_idx
            ON quiz_scores (quiz_id, score DESC, submitted_at ASC)",
    ),
    (
        "quiz_scores_submitted_idx",
        "CREATE INDEX IF NOT EXISTS quiz_scores_submitted_idx ON quiz_scores (submitted_at)",
    ),
    (
        "worldcup_votes",
        "CREATE TABLE IF NOT EXISTS worldcup_votes (
            user_id BIGINT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
            cup_id TEXT NOT NULL,
            winner_name TEXT NOT NULL,
            voted_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            PRIMARY KEY (user_id, cup_id)
        )",
    ),
    (
        "worldcup_results",
        "CREATE TABLE IF NOT EXISTS worldcup_results (
            cup_id TEXT NOT NULL,
            participant_name TEXT NOT NULL,
            votes BIGINT NOT NULL DEFAULT 0,
            PRIMARY KEY (cup_id, participant_name)
        )",
    ),
];
