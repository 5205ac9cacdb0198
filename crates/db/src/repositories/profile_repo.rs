//! Read access to client and designer profiles.

use sqlx::PgExecutor;
use surgiguide_core::types::DbId;

use crate::models::profile::{ClientProfile, DesignerProfile, Recipient};

const CLIENT_COLUMNS: &str =
    "id, user_id, display_name, email, preferred_language, created_at, updated_at";
const DESIGNER_COLUMNS: &str =
    "id, user_id, display_name, email, is_admin, preferred_language, created_at, updated_at";

/// Profile lookups used for authorization and notification fan-out.
pub struct ProfileRepo;

impl ProfileRepo {
    pub async fn find_client(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<ClientProfile>, sqlx::Error> {
        let query = format!("SELECT {CLIENT_COLUMNS} FROM client_profiles WHERE id = $1");
        sqlx::query_as::<_, ClientProfile>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn find_designer(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<DesignerProfile>, sqlx::Error> {
        let query = format!("SELECT {DESIGNER_COLUMNS} FROM designer_profiles WHERE id = $1");
        sqlx::query_as::<_, DesignerProfile>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// The owner of a client profile as a notification recipient.
    pub async fn client_recipient(
        executor: impl PgExecutor<'_>,
        client_profile_id: DbId,
    ) -> Result<Option<Recipient>, sqlx::Error> {
        sqlx::query_as::<_, Recipient>(
            "SELECT user_id, email, preferred_language FROM client_profiles WHERE id = $1",
        )
        .bind(client_profile_id)
        .fetch_optional(executor)
        .await
    }

    /// Staff to notify about client activity. With `admins_only`, designers
    /// without the admin flag are skipped.
    pub async fn staff_recipients(
        executor: impl PgExecutor<'_>,
        admins_only: bool,
    ) -> Result<Vec<Recipient>, sqlx::Error> {
        sqlx::query_as::<_, Recipient>(
            "SELECT user_id, email, preferred_language FROM designer_profiles \
             WHERE (NOT $1 OR is_admin = true) \
             ORDER BY id",
        )
        .bind(admins_only)
        .fetch_all(executor)
        .await
    }
}
