//! PostgreSQL implementation of the relationship store.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use super::models::{InviteRow, PlayerRow, RelationshipRow};
use super::{NetworkStore, NewRelationship};
use crate::config::NetworkConfig;
use crate::domain::relationship::INVITE_ACCEPTED_KIND;
use crate::domain::{
    AuthUserId, Invite, InviteId, InviteStatus, NewInvite, NewPlayer, Player, PlayerId,
    PlayerRole, Relationship, RelationshipId, RelationshipStatus,
};
use crate::error::NetworkError;

const PLAYER_COLUMNS: &str = "id, auth_user_id, alias, role, created_at";
const RELATIONSHIP_COLUMNS: &str =
    "id, upline_id, downline_id, status, kind, created_at, updated_at";
const INVITE_COLUMNS: &str =
    "id, inviter_id, email, first_name, last_name, status, created_at, updated_at";

/// PostgreSQL-backed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool sized by the database settings in `config`.
    ///
    /// # Errors
    ///
    /// Returns a [`NetworkError::PersistenceError`] if the database is
    /// unreachable.
    pub async fn connect(config: &NetworkConfig) -> Result<Self, NetworkError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await
            .map_err(|e| NetworkError::PersistenceError(e.to_string()))?;
        Ok(Self::new(pool))
    }

    /// Applies the embedded schema migrations.
    ///
    /// # Errors
    ///
    /// Returns a [`NetworkError::PersistenceError`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), NetworkError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| NetworkError::PersistenceError(e.to_string()))
    }

    /// Closes every pooled connection. Called once on shutdown.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn relationship_exists(&self, id: RelationshipId) -> Result<bool, NetworkError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM relationships WHERE id = $1)")
            .bind(*id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)
    }
}

/// Maps constraint violations to domain errors; everything else is a
/// persistence failure.
fn db_error(e: sqlx::Error) -> NetworkError {
    if let Some(db) = e.as_database_error() {
        if db.is_unique_violation() {
            return NetworkError::Conflict(db.message().to_string());
        }
        if db.is_foreign_key_violation() {
            return NetworkError::InvalidRequest(format!("unknown player: {}", db.message()));
        }
        if db.is_check_violation() {
            return NetworkError::InvalidRequest(db.message().to_string());
        }
    }
    NetworkError::PersistenceError(e.to_string())
}

async fn insert_relationship_in<'e, E>(
    executor: E,
    new: NewRelationship,
) -> Result<Relationship, NetworkError>
where
    E: sqlx::PgExecutor<'e>,
{
    if new.upline_id == new.downline_id {
        return Err(NetworkError::InvalidRequest(
            "a player cannot sponsor themself".to_string(),
        ));
    }
    let row = sqlx::query_as::<_, RelationshipRow>(&format!(
        "INSERT INTO relationships (id, upline_id, downline_id, status, kind) \
         VALUES ($1, $2, $3, $4, $5) RETURNING {RELATIONSHIP_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(*new.upline_id.as_uuid())
    .bind(*new.downline_id.as_uuid())
    .bind(new.status.as_str())
    .bind(&new.kind)
    .fetch_one(executor)
    .await
    .map_err(db_error)?;
    Relationship::try_from(row)
}

#[async_trait]
impl NetworkStore for PostgresStore {
    async fn insert_player(&self, new: NewPlayer) -> Result<Player, NetworkError> {
        let row = sqlx::query_as::<_, PlayerRow>(&format!(
            "INSERT INTO players (id, auth_user_id, alias, role) VALUES ($1, $2, $3, $4) \
             RETURNING {PLAYER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(*new.auth_user_id.as_uuid())
        .bind(&new.alias)
        .bind(new.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        Player::try_from(row)
    }

    async fn find_player_by_auth(&self, auth: AuthUserId) -> Result<Option<Player>, NetworkError> {
        sqlx::query_as::<_, PlayerRow>(&format!(
            "SELECT {PLAYER_COLUMNS} FROM players WHERE auth_user_id = $1"
        ))
        .bind(*auth.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .map(Player::try_from)
        .transpose()
    }

    async fn find_player(&self, id: PlayerId) -> Result<Option<Player>, NetworkError> {
        sqlx::query_as::<_, PlayerRow>(&format!(
            "SELECT {PLAYER_COLUMNS} FROM players WHERE id = $1"
        ))
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .map(Player::try_from)
        .transpose()
    }

    async fn find_players(&self, ids: &[PlayerId]) -> Result<Vec<Player>, NetworkError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let uuids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let rows = sqlx::query_as::<_, PlayerRow>(&format!(
            "SELECT {PLAYER_COLUMNS} FROM players WHERE id = ANY($1)"
        ))
        .bind(uuids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        let mut players = rows
            .into_iter()
            .map(Player::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        players.sort_by_key(|p| ids.iter().position(|id| *id == p.id));
        Ok(players)
    }

    async fn list_admin_profiles(&self) -> Result<Vec<Player>, NetworkError> {
        sqlx::query_as::<_, PlayerRow>(&format!(
            "SELECT {PLAYER_COLUMNS} FROM players WHERE role = $1 ORDER BY alias"
        ))
        .bind(PlayerRole::Admin.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?
        .into_iter()
        .map(Player::try_from)
        .collect()
    }

    async fn find_upline_relationship(
        &self,
        downline: PlayerId,
        status: RelationshipStatus,
    ) -> Result<Option<Relationship>, NetworkError> {
        sqlx::query_as::<_, RelationshipRow>(&format!(
            "SELECT {RELATIONSHIP_COLUMNS} FROM relationships \
             WHERE downline_id = $1 AND status = $2"
        ))
        .bind(*downline.as_uuid())
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .map(Relationship::try_from)
        .transpose()
    }

    async fn list_downline_relationships(
        &self,
        upline: PlayerId,
        status: RelationshipStatus,
    ) -> Result<Vec<Relationship>, NetworkError> {
        sqlx::query_as::<_, RelationshipRow>(&format!(
            "SELECT {RELATIONSHIP_COLUMNS} FROM relationships \
             WHERE upline_id = $1 AND status = $2 ORDER BY created_at ASC"
        ))
        .bind(*upline.as_uuid())
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?
        .into_iter()
        .map(Relationship::try_from)
        .collect()
    }

    async fn get_relationship(
        &self,
        id: RelationshipId,
    ) -> Result<Option<Relationship>, NetworkError> {
        sqlx::query_as::<_, RelationshipRow>(&format!(
            "SELECT {RELATIONSHIP_COLUMNS} FROM relationships WHERE id = $1"
        ))
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .map(Relationship::try_from)
        .transpose()
    }

    async fn insert_relationship(
        &self,
        new: NewRelationship,
    ) -> Result<Relationship, NetworkError> {
        insert_relationship_in(&self.pool, new).await
    }

    async fn activate_relationship(
        &self,
        id: RelationshipId,
    ) -> Result<Relationship, NetworkError> {
        let row = sqlx::query_as::<_, RelationshipRow>(&format!(
            "UPDATE relationships SET status = 'active', updated_at = now() \
             WHERE id = $1 AND status = 'pending' RETURNING {RELATIONSHIP_COLUMNS}"
        ))
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        match row {
            Some(row) => Relationship::try_from(row),
            None if self.relationship_exists(id).await? => Err(NetworkError::Conflict(format!(
                "relationship {id} is already active"
            ))),
            None => Err(NetworkError::RelationshipNotFound(*id.as_uuid())),
        }
    }

    async fn delete_pending_relationship(
        &self,
        id: RelationshipId,
    ) -> Result<Relationship, NetworkError> {
        let row = sqlx::query_as::<_, RelationshipRow>(&format!(
            "DELETE FROM relationships WHERE id = $1 AND status = 'pending' \
             RETURNING {RELATIONSHIP_COLUMNS}"
        ))
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        match row {
            Some(row) => Relationship::try_from(row),
            None if self.relationship_exists(id).await? => Err(NetworkError::Conflict(format!(
                "relationship {id} is already active"
            ))),
            None => Err(NetworkError::RelationshipNotFound(*id.as_uuid())),
        }
    }

    async fn insert_invite(&self, new: NewInvite) -> Result<Invite, NetworkError> {
        let row = sqlx::query_as::<_, InviteRow>(&format!(
            "INSERT INTO invites (id, inviter_id, email, first_name, last_name, status) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {INVITE_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(*new.inviter_id.as_uuid())
        .bind(&new.email)
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(InviteStatus::Unsent.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        Invite::try_from(row)
    }

    async fn get_invite(&self, id: InviteId) -> Result<Option<Invite>, NetworkError> {
        sqlx::query_as::<_, InviteRow>(&format!(
            "SELECT {INVITE_COLUMNS} FROM invites WHERE id = $1"
        ))
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .map(Invite::try_from)
        .transpose()
    }

    async fn update_invite_status(
        &self,
        id: InviteId,
        from: InviteStatus,
        to: InviteStatus,
    ) -> Result<Invite, NetworkError> {
        let row = sqlx::query_as::<_, InviteRow>(&format!(
            "UPDATE invites SET status = $3, updated_at = now() \
             WHERE id = $1 AND status = $2 RETURNING {INVITE_COLUMNS}"
        ))
        .bind(*id.as_uuid())
        .bind(from.as_str())
        .bind(to.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        match row {
            Some(row) => Invite::try_from(row),
            None => match self.get_invite(id).await? {
                Some(current) => Err(NetworkError::Conflict(format!(
                    "invite {id} is {} not {from}",
                    current.status
                ))),
                None => Err(NetworkError::InviteNotFound(*id.as_uuid())),
            },
        }
    }

    async fn accept_invite(
        &self,
        id: InviteId,
        downline: PlayerId,
    ) -> Result<(Invite, Relationship), NetworkError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let invite = sqlx::query_as::<_, InviteRow>(&format!(
            "SELECT {INVITE_COLUMNS} FROM invites WHERE id = $1 FOR UPDATE"
        ))
        .bind(*id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error)?
        .map(Invite::try_from)
        .transpose()?
        .ok_or(NetworkError::InviteNotFound(*id.as_uuid()))?;

        if !invite.status.can_transition_to(InviteStatus::Accepted) {
            return Err(NetworkError::InvalidTransition {
                from: invite.status,
                to: InviteStatus::Accepted,
            });
        }

        let rel = insert_relationship_in(
            &mut *tx,
            NewRelationship {
                upline_id: invite.inviter_id,
                downline_id: downline,
                status: RelationshipStatus::Active,
                kind: INVITE_ACCEPTED_KIND.to_string(),
            },
        )
        .await?;

        let accepted = sqlx::query_as::<_, InviteRow>(&format!(
            "UPDATE invites SET status = $2, updated_at = now() WHERE id = $1 \
             RETURNING {INVITE_COLUMNS}"
        ))
        .bind(*id.as_uuid())
        .bind(InviteStatus::Accepted.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        Ok((Invite::try_from(accepted)?, rel))
    }
}
