use roost_core::{
    Credential, CredentialStore, CredentialStoreError, Email, HashedPassword, Salt, UserId,
    Username, VerificationCode,
};
use secrecy::{ExposeSecret, Secret};
use sqlx::{PgPool, Row, postgres::PgRow};

const USERNAME_CONSTRAINT: &str = "credentials_username_key";
const EMAIL_CONSTRAINT: &str = "credentials_email_key";

pub struct PostgresCredentialStore {
    pool: PgPool,
}

impl PostgresCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        PostgresCredentialStore { pool }
    }

    async fn fetch_one_where(
        &self,
        column: &'static str,
        value: &str,
    ) -> Result<Credential, CredentialStoreError> {
        let query = format!(
            r#"
                SELECT user_id, username, email, password_hash, salt, role, status, verification_code
                FROM credentials
                WHERE {column} = $1
            "#
        );

        let row = sqlx::query(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?;

        let Some(row) = row else {
            return Err(CredentialStoreError::NotFound);
        };
        credential_from_row(&row)
    }
}

#[async_trait::async_trait]
impl CredentialStore for PostgresCredentialStore {
    #[tracing::instrument(name = "Adding credential to PostgreSQL", skip_all)]
    async fn add_credential(&self, credential: Credential) -> Result<(), CredentialStoreError> {
        let query = sqlx::query(
            r#"
                INSERT INTO credentials
                    (user_id, username, email, password_hash, salt, role, status, verification_code)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(credential.user_id().to_string())
        .bind(credential.username().as_str())
        .bind(credential.email().as_ref().expose_secret())
        .bind(credential.password_hash().as_ref().expose_secret())
        .bind(credential.salt().as_str())
        .bind(credential.role().as_str())
        .bind(credential.status().as_str())
        .bind(credential.verification_code().as_str());

        query.execute(&self.pool).await.map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                match db_err.constraint() {
                    Some(USERNAME_CONSTRAINT) => return CredentialStoreError::UsernameTaken,
                    Some(EMAIL_CONSTRAINT) => return CredentialStoreError::EmailTaken,
                    _ => {}
                }
            }
            unexpected(e)
        })?;

        Ok(())
    }

    #[tracing::instrument(name = "Checking username in PostgreSQL", skip_all)]
    async fn username_exists(&self, username: &Username) -> Result<bool, CredentialStoreError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM credentials WHERE username = $1)",
        )
        .bind(username.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)
    }

    #[tracing::instrument(name = "Checking email in PostgreSQL", skip_all)]
    async fn email_exists(&self, email: &Email) -> Result<bool, CredentialStoreError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM credentials WHERE email = $1)")
            .bind(email.as_ref().expose_secret())
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)
    }

    #[tracing::instrument(name = "Retrieving credential by username", skip_all)]
    async fn get_by_username(
        &self,
        username: &Username,
    ) -> Result<Credential, CredentialStoreError> {
        self.fetch_one_where("username", username.as_str()).await
    }

    #[tracing::instrument(name = "Retrieving credential by email", skip_all)]
    async fn get_by_email(&self, email: &Email) -> Result<Credential, CredentialStoreError> {
        self.fetch_one_where("email", email.as_ref().expose_secret())
            .await
    }

    #[tracing::instrument(name = "Marking credential verified", skip_all)]
    async fn mark_verified(&self, username: &Username) -> Result<(), CredentialStoreError> {
        let result = sqlx::query(
            r#"
                UPDATE credentials
                SET status = 'verified'
                WHERE username = $1 AND status = 'pending'
            "#,
        )
        .bind(username.as_str())
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            return if self.username_exists(username).await? {
                Err(CredentialStoreError::NotPending)
            } else {
                Err(CredentialStoreError::NotFound)
            };
        }
        Ok(())
    }

    #[tracing::instrument(name = "Set new password hash", skip_all)]
    async fn set_password_hash(
        &self,
        username: &Username,
        password_hash: HashedPassword,
    ) -> Result<(), CredentialStoreError> {
        let result = sqlx::query(
            r#"
                UPDATE credentials
                SET password_hash = $1
                WHERE username = $2
            "#,
        )
        .bind(password_hash.as_ref().expose_secret())
        .bind(username.as_str())
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            return Err(CredentialStoreError::NotFound);
        }
        Ok(())
    }

    #[tracing::instrument(name = "Delete credential from PostgreSQL", skip_all)]
    async fn delete_credential(&self, user_id: &UserId) -> Result<(), CredentialStoreError> {
        sqlx::query("DELETE FROM credentials WHERE user_id = $1")
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;

        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> CredentialStoreError {
    CredentialStoreError::UnexpectedError(e.to_string())
}

fn credential_from_row(row: &PgRow) -> Result<Credential, CredentialStoreError> {
    let column = |name: &str| -> Result<String, CredentialStoreError> {
        row.try_get::<String, _>(name).map_err(unexpected)
    };
    let corrupt = |e: String| CredentialStoreError::UnexpectedError(e);

    let user_id = UserId::parse_str(&column("user_id")?).map_err(|e| corrupt(e.to_string()))?;
    let username = Username::parse(&column("username")?).map_err(|e| corrupt(e.to_string()))?;
    let email = Email::try_from(Secret::from(column("email")?)).map_err(|e| corrupt(e.to_string()))?;
    let password_hash = HashedPassword::new(Secret::from(column("password_hash")?));
    let salt = Salt::from_stored(column("salt")?);
    let role = column("role")?.parse().map_err(corrupt)?;
    let status = column("status")?.parse().map_err(corrupt)?;
    let verification_code =
        VerificationCode::parse(&column("verification_code")?).map_err(|e| corrupt(e.to_string()))?;

    Ok(Credential::restore(
        user_id,
        username,
        email,
        password_hash,
        salt,
        role,
        status,
        verification_code,
    ))
}
