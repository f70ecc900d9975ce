//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use kernel::id::{EmailAddressId, UserId};
use kernel::validation::{ErrorDetail, ValidationErrors};
use sqlx::PgPool;
use uuid::Uuid;

use crate::application::registration::{EMAIL_TAKEN_MESSAGE, PHONE_TAKEN_MESSAGE};
use crate::domain::entity::{AuthSession, Credentials, EmailAddress, User};
use crate::domain::repository::{
    AuthSessionRepository, CredentialsRepository, EmailAddressRepository, UserRepository,
};
use crate::domain::value_object::{Email, PhoneNumber, UserPassword, UserType, VerificationId};
use crate::error::{UsersError, UsersResult};

const USER_SELECT: &str = r#"
    SELECT
        user_id,
        email,
        name,
        first_name,
        last_name,
        address,
        phone_number,
        business_name,
        user_type,
        verification_id,
        is_active,
        is_staff,
        last_login_at,
        created_at,
        updated_at
    FROM users
"#;

/// PostgreSQL-backed users repository
#[derive(Clone)]
pub struct PgUsersRepository {
    pool: PgPool,
}

impl PgUsersRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Clean up expired sessions
    pub async fn cleanup_expired(&self) -> UsersResult<u64> {
        let now_ms = Utc::now().timestamp_millis();

        let deleted = sqlx::query("DELETE FROM auth_sessions WHERE expires_at_ms < $1")
            .bind(now_ms)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(sessions_deleted = deleted, "Cleaned up expired auth sessions");

        Ok(deleted)
    }

    async fn fetch_user(&self, filter: &str, bind: BindValue<'_>) -> UsersResult<Option<User>> {
        let sql = format!("{USER_SELECT} WHERE {filter}");
        let query = sqlx::query_as::<_, UserRow>(&sql);
        let query = match bind {
            BindValue::Uuid(v) => query.bind(v),
            BindValue::Text(v) => query.bind(v),
        };

        let row = query.fetch_optional(&self.pool).await?;
        row.map(UserRow::into_user).transpose()
    }
}

enum BindValue<'a> {
    Uuid(Uuid),
    Text(&'a str),
}

/// Map unique-constraint violations to the field they protect
fn map_unique_violation(err: sqlx::Error) -> UsersError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23505") {
            match db_err.constraint() {
                Some("users_email_key") => {
                    return ValidationErrors::single(
                        "email",
                        ErrorDetail::unique(EMAIL_TAKEN_MESSAGE),
                    )
                    .into();
                }
                Some("users_phone_number_key") => {
                    return ValidationErrors::single(
                        "phone_number",
                        ErrorDetail::unique(PHONE_TAKEN_MESSAGE),
                    )
                    .into();
                }
                _ => {}
            }
        }
    }
    UsersError::Database(err)
}

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for PgUsersRepository {
    async fn register(
        &self,
        user: &User,
        credentials: &Credentials,
        email_address: &EmailAddress,
    ) -> UsersResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO users (
                user_id,
                email,
                name,
                first_name,
                last_name,
                address,
                phone_number,
                business_name,
                user_type,
                verification_id,
                is_active,
                is_staff,
                last_login_at,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(user.email.as_str())
        .bind(&user.name)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.address)
        .bind(user.phone_number.as_ref().map(PhoneNumber::as_str))
        .bind(&user.business_name)
        .bind(user.user_type.as_str())
        .bind(user.verification_id.as_ref().map(VerificationId::as_str))
        .bind(user.is_active)
        .bind(user.is_staff)
        .bind(user.last_login_at)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(map_unique_violation)?;

        sqlx::query(
            r#"
            INSERT INTO user_credentials (
                user_id,
                password_hash,
                login_failed_count,
                last_failed_at,
                locked_until,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(credentials.user_id.as_uuid())
        .bind(credentials.password_hash.as_phc_string())
        .bind(credentials.login_failed_count as i16)
        .bind(credentials.last_failed_at)
        .bind(credentials.locked_until)
        .bind(credentials.created_at)
        .bind(credentials.updated_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO email_addresses (
                email_address_id,
                user_id,
                email,
                verified,
                is_primary,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(email_address.id.as_uuid())
        .bind(email_address.user_id.as_uuid())
        .bind(email_address.email.as_str())
        .bind(email_address.verified)
        .bind(email_address.primary)
        .bind(email_address.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn find_by_id(&self, user_id: &UserId) -> UsersResult<Option<User>> {
        self.fetch_user("user_id = $1", BindValue::Uuid(user_id.into_uuid()))
            .await
    }

    async fn find_by_email(&self, email: &Email) -> UsersResult<Option<User>> {
        self.fetch_user("email = $1", BindValue::Text(email.as_str()))
            .await
    }

    async fn find_by_phone_number(&self, phone: &PhoneNumber) -> UsersResult<Option<User>> {
        self.fetch_user("phone_number = $1", BindValue::Text(phone.as_str()))
            .await
    }

    async fn exists_by_email(&self, email: &Email) -> UsersResult<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email.as_str())
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn exists_by_phone_number(&self, phone: &PhoneNumber) -> UsersResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE phone_number = $1)",
        )
        .bind(phone.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn update(&self, user: &User) -> UsersResult<()> {
        sqlx::query(
            r#"
            UPDATE users SET
                email = $2,
                name = $3,
                first_name = $4,
                last_name = $5,
                address = $6,
                phone_number = $7,
                business_name = $8,
                user_type = $9,
                verification_id = $10,
                is_active = $11,
                is_staff = $12,
                last_login_at = $13,
                updated_at = $14
            WHERE user_id = $1
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(user.email.as_str())
        .bind(&user.name)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.address)
        .bind(user.phone_number.as_ref().map(PhoneNumber::as_str))
        .bind(&user.business_name)
        .bind(user.user_type.as_str())
        .bind(user.verification_id.as_ref().map(VerificationId::as_str))
        .bind(user.is_active)
        .bind(user.is_staff)
        .bind(user.last_login_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_unique_violation)?;

        Ok(())
    }

    async fn list(&self) -> UsersResult<Vec<User>> {
        let sql = format!("{USER_SELECT} ORDER BY created_at ASC");
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(UserRow::into_user).collect()
    }
}

// ============================================================================
// Credentials Repository Implementation
// ============================================================================

impl CredentialsRepository for PgUsersRepository {
    async fn find_by_user_id(&self, user_id: &UserId) -> UsersResult<Option<Credentials>> {
        let row = sqlx::query_as::<_, CredentialsRow>(
            r#"
            SELECT
                user_id,
                password_hash,
                login_failed_count,
                last_failed_at,
                locked_until,
                created_at,
                updated_at
            FROM user_credentials
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(CredentialsRow::into_credentials).transpose()
    }

    async fn update(&self, credentials: &Credentials) -> UsersResult<()> {
        sqlx::query(
            r#"
            UPDATE user_credentials SET
                password_hash = $2,
                login_failed_count = $3,
                last_failed_at = $4,
                locked_until = $5,
                updated_at = $6
            WHERE user_id = $1
            "#,
        )
        .bind(credentials.user_id.as_uuid())
        .bind(credentials.password_hash.as_phc_string())
        .bind(credentials.login_failed_count as i16)
        .bind(credentials.last_failed_at)
        .bind(credentials.locked_until)
        .bind(credentials.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// ============================================================================
// Email Address Repository Implementation
// ============================================================================

impl EmailAddressRepository for PgUsersRepository {
    async fn find_primary(&self, user_id: &UserId) -> UsersResult<Option<EmailAddress>> {
        let row = sqlx::query_as::<_, EmailAddressRow>(
            r#"
            SELECT
                email_address_id,
                user_id,
                email,
                verified,
                is_primary,
                created_at
            FROM email_addresses
            WHERE user_id = $1 AND is_primary
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(EmailAddressRow::into_email_address))
    }

    async fn update(&self, email_address: &EmailAddress) -> UsersResult<()> {
        sqlx::query(
            r#"
            UPDATE email_addresses SET
                email = $2,
                verified = $3,
                is_primary = $4
            WHERE email_address_id = $1
            "#,
        )
        .bind(email_address.id.as_uuid())
        .bind(email_address.email.as_str())
        .bind(email_address.verified)
        .bind(email_address.primary)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// ============================================================================
// Auth Session Repository Implementation
// ============================================================================

impl AuthSessionRepository for PgUsersRepository {
    async fn create(&self, session: &AuthSession) -> UsersResult<()> {
        sqlx::query(
            r#"
            INSERT INTO auth_sessions (
                session_id,
                user_id,
                expires_at_ms,
                remember_me,
                client_fingerprint_hash,
                client_ip,
                user_agent,
                created_at,
                last_activity_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(session.session_id)
        .bind(session.user_id.as_uuid())
        .bind(session.expires_at_ms)
        .bind(session.remember_me)
        .bind(&session.client_fingerprint_hash)
        .bind(&session.client_ip)
        .bind(&session.user_agent)
        .bind(session.created_at)
        .bind(session.last_activity_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(
        &self,
        session_id: Uuid,
        fingerprint_hash: &[u8],
    ) -> UsersResult<Option<AuthSession>> {
        let now_ms = Utc::now().timestamp_millis();

        let row = sqlx::query_as::<_, AuthSessionRow>(
            r#"
            SELECT
                session_id,
                user_id,
                expires_at_ms,
                remember_me,
                client_fingerprint_hash,
                client_ip,
                user_agent,
                created_at,
                last_activity_at
            FROM auth_sessions
            WHERE session_id = $1 AND expires_at_ms > $2
            "#,
        )
        .bind(session_id)
        .bind(now_ms)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => {
                if r.client_fingerprint_hash != fingerprint_hash {
                    tracing::warn!(
                        session_id = %session_id,
                        "Auth session fingerprint mismatch"
                    );
                    return Err(UsersError::SessionFingerprintMismatch);
                }
                Ok(Some(r.into_session()))
            }
            None => Ok(None),
        }
    }

    async fn update(&self, session: &AuthSession) -> UsersResult<()> {
        sqlx::query(
            r#"
            UPDATE auth_sessions SET
                expires_at_ms = $2,
                last_activity_at = $3
            WHERE session_id = $1
            "#,
        )
        .bind(session.session_id)
        .bind(session.expires_at_ms)
        .bind(session.last_activity_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, session_id: Uuid) -> UsersResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE session_id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn cleanup_expired(&self) -> UsersResult<u64> {
        PgUsersRepository::cleanup_expired(self).await
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    email: String,
    name: String,
    first_name: String,
    last_name: String,
    address: String,
    phone_number: Option<String>,
    business_name: String,
    user_type: String,
    verification_id: Option<String>,
    is_active: bool,
    is_staff: bool,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> UsersResult<User> {
        let phone_number = self
            .phone_number
            .as_deref()
            .map(PhoneNumber::from_db)
            .transpose()
            .map_err(|e| UsersError::Internal(format!("Invalid phone_number: {e}")))?;

        Ok(User {
            user_id: UserId::from_uuid(self.user_id),
            email: Email::from_db(self.email),
            name: self.name,
            first_name: self.first_name,
            last_name: self.last_name,
            address: self.address,
            phone_number,
            business_name: self.business_name,
            user_type: UserType::from_db(&self.user_type),
            verification_id: self.verification_id.map(VerificationId::from_db),
            is_active: self.is_active,
            is_staff: self.is_staff,
            last_login_at: self.last_login_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CredentialsRow {
    user_id: Uuid,
    password_hash: String,
    login_failed_count: i16,
    last_failed_at: Option<DateTime<Utc>>,
    locked_until: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CredentialsRow {
    fn into_credentials(self) -> UsersResult<Credentials> {
        Ok(Credentials {
            user_id: UserId::from_uuid(self.user_id),
            password_hash: UserPassword::from_phc_string(self.password_hash)?,
            login_failed_count: self.login_failed_count.max(0) as u16,
            last_failed_at: self.last_failed_at,
            locked_until: self.locked_until,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct EmailAddressRow {
    email_address_id: Uuid,
    user_id: Uuid,
    email: String,
    verified: bool,
    is_primary: bool,
    created_at: DateTime<Utc>,
}

impl EmailAddressRow {
    fn into_email_address(self) -> EmailAddress {
        EmailAddress {
            id: EmailAddressId::from_uuid(self.email_address_id),
            user_id: UserId::from_uuid(self.user_id),
            email: Email::from_db(self.email),
            verified: self.verified,
            primary: self.is_primary,
            created_at: self.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AuthSessionRow {
    session_id: Uuid,
    user_id: Uuid,
    expires_at_ms: i64,
    remember_me: bool,
    client_fingerprint_hash: Vec<u8>,
    client_ip: Option<String>,
    user_agent: Option<String>,
    created_at: DateTime<Utc>,
    last_activity_at: DateTime<Utc>,
}

impl AuthSessionRow {
    fn into_session(self) -> AuthSession {
        AuthSession {
            session_id: self.session_id,
            user_id: UserId::from_uuid(self.user_id),
            expires_at_ms: self.expires_at_ms,
            remember_me: self.remember_me,
            client_fingerprint_hash: self.client_fingerprint_hash,
            client_ip: self.client_ip,
            user_agent: self.user_agent,
            created_at: self.created_at,
            last_activity_at: self.last_activity_at,
        }
    }
}
