use chrono::{DateTime, Utc};
use roost_core::{SagaJournal, SagaJournalError, SagaRecord, SagaState, UserId, Username};
use sqlx::{PgPool, Row, postgres::PgRow};

pub struct PostgresSagaJournal {
    pool: PgPool,
}

impl PostgresSagaJournal {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl SagaJournal for PostgresSagaJournal {
    #[tracing::instrument(name = "Recording saga transition", skip_all, fields(state = %record.state))]
    async fn record(&self, record: &SagaRecord) -> Result<(), SagaJournalError> {
        sqlx::query(
            r#"
                INSERT INTO registration_sagas (saga_id, username, state, updated_at)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (saga_id)
                DO UPDATE SET state = EXCLUDED.state, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(record.saga_id.to_string())
        .bind(record.username.as_str())
        .bind(record.state.as_str())
        .bind(record.updated_at.timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(())
    }

    #[tracing::instrument(name = "Listing incomplete sagas", skip_all)]
    async fn incomplete(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<SagaRecord>, SagaJournalError> {
        let rows = sqlx::query(
            r#"
                SELECT saga_id, username, state, updated_at
                FROM registration_sagas
                WHERE state NOT IN ($1, $2) AND updated_at <= $3
                ORDER BY updated_at
            "#,
        )
        .bind(SagaState::Committed.as_str())
        .bind(SagaState::Failed.as_str())
        .bind(cutoff.timestamp_millis())
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        rows.iter().map(record_from_row).collect()
    }
}

fn unexpected(e: impl ToString) -> SagaJournalError {
    SagaJournalError::UnexpectedError(e.to_string())
}

fn record_from_row(row: &PgRow) -> Result<SagaRecord, SagaJournalError> {
    let saga_id: String = row.try_get("saga_id").map_err(unexpected)?;
    let username: String = row.try_get("username").map_err(unexpected)?;
    let state: String = row.try_get("state").map_err(unexpected)?;
    let updated_at: i64 = row.try_get("updated_at").map_err(unexpected)?;

    Ok(SagaRecord {
        saga_id: UserId::parse_str(&saga_id).map_err(unexpected)?,
        username: Username::parse(&username).map_err(unexpected)?,
        state: state.parse().map_err(unexpected)?,
        updated_at: DateTime::from_timestamp_millis(updated_at)
            .ok_or_else(|| unexpected("saga timestamp out of range"))?,
    })
}
