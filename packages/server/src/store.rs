use common::IdentityHash;
use sea_orm::prelude::Expr;
use sea_orm::*;

use crate::entity::link;
use crate::error::AppError;
use crate::models::link::{LinkDraft, LinkId, LinkResponse};

/// Owner-scoped access to the `link` table.
///
/// Every operation is a single statement (or a single transaction for
/// `update_one`). Nothing here retries, and nothing spans calls: a count
/// followed by an insert is two independent round trips.
#[derive(Clone, Debug)]
pub struct LinkStore {
    db: DatabaseConnection,
}

impl LinkStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Projections of every link owned by `identity`, in id order.
    pub async fn list_by_identity(
        &self,
        identity: &IdentityHash,
    ) -> Result<Vec<LinkResponse>, AppError> {
        let links = link::Entity::find()
            .select_only()
            .column(link::Column::Id)
            .column(link::Column::Content)
            .column(link::Column::IsLink)
            .column(link::Column::Description)
            .filter(link::Column::IdentityHash.eq(identity.to_hex()))
            .order_by_asc(link::Column::Id)
            .into_model::<LinkResponse>()
            .all(&self.db)
            .await?;
        Ok(links)
    }

    pub async fn count_by_identity(&self, identity: &IdentityHash) -> Result<u64, AppError> {
        let count = link::Entity::find()
            .filter(link::Column::IdentityHash.eq(identity.to_hex()))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    /// Persist `draft` under a freshly generated id.
    pub async fn insert(&self, draft: LinkDraft) -> Result<LinkResponse, AppError> {
        let model = link::ActiveModel {
            id: Set(LinkId::generate().to_string()),
            identity_hash: Set(draft.identity_hash),
            content: Set(draft.content),
            is_link: Set(draft.is_link),
            description: Set(draft.description),
            created_at: Set(draft.created_at),
        }
        .insert(&self.db)
        .await?;

        Ok(model.into())
    }

    /// Overwrite the link `id` if, and only if, it is owned by `identity`.
    ///
    /// Every mutable column is replaced, including the owner hash and the
    /// creation time, and the stored row is returned as it reads afterwards.
    pub async fn update_one(
        &self,
        id: &LinkId,
        identity: &IdentityHash,
        draft: LinkDraft,
    ) -> Result<LinkResponse, AppError> {
        let txn = self.db.begin().await?;

        let result = link::Entity::update_many()
            .col_expr(link::Column::IdentityHash, Expr::value(draft.identity_hash))
            .col_expr(link::Column::Content, Expr::value(draft.content))
            .col_expr(link::Column::IsLink, Expr::value(draft.is_link))
            .col_expr(link::Column::Description, Expr::value(draft.description))
            .col_expr(link::Column::CreatedAt, Expr::value(draft.created_at))
            .filter(link::Column::Id.eq(id.as_str()))
            .filter(link::Column::IdentityHash.eq(identity.to_hex()))
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            return Err(not_found(id));
        }

        let model = link::Entity::find_by_id(id.as_str())
            .one(&txn)
            .await?
            .ok_or_else(|| not_found(id))?;
        txn.commit().await?;

        Ok(model.into())
    }

    pub async fn delete_one(&self, id: &LinkId, identity: &IdentityHash) -> Result<(), AppError> {
        let result = link::Entity::delete_many()
            .filter(link::Column::Id.eq(id.as_str()))
            .filter(link::Column::IdentityHash.eq(identity.to_hex()))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    /// Remove every link owned by `identity`, returning how many went.
    pub async fn delete_all_by_identity(&self, identity: &IdentityHash) -> Result<u64, AppError> {
        let result = link::Entity::delete_many()
            .filter(link::Column::IdentityHash.eq(identity.to_hex()))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }
}

fn not_found(id: &LinkId) -> AppError {
    AppError::NotFound(format!("Link {id} not found for caller"))
}
