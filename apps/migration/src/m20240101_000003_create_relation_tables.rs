use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_identity_tables::Users;
use super::m20240101_000002_create_content_tables::Articles;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// (table, actor column, target column)
const EDGE_TABLES: [(&str, &str, &str); 3] = [
    ("article_likes", "user_id", "article_id"),
    ("article_bookmarks", "user_id", "article_id"),
    ("follows", "follower_id", "followee_id"),
];

/// An (actor, target) edge table. The composite primary key makes each edge
/// unique, which the toggle relies on.
fn edge_table(
    table: &str,
    actor: &str,
    target: &str,
    target_table: impl IntoIden + 'static,
    target_id: impl IntoIden + 'static,
) -> TableCreateStatement {
    Table::create()
        .table(Alias::new(table))
        .if_not_exists()
        .col(ColumnDef::new(Alias::new(actor)).uuid().not_null())
        .col(ColumnDef::new(Alias::new(target)).uuid().not_null())
        .col(
            ColumnDef::new(Alias::new("created_at"))
                .timestamp_with_time_zone()
                .not_null()
                .default(Expr::current_timestamp()),
        )
        .primary_key(
            Index::create()
                .col(Alias::new(actor))
                .col(Alias::new(target)),
        )
        .foreign_key(
            ForeignKey::create()
                .name(format!("fk_{table}_{actor}"))
                .from(Alias::new(table), Alias::new(actor))
                .to(Users::Table, Users::Id)
                .on_delete(ForeignKeyAction::Cascade),
        )
        .foreign_key(
            ForeignKey::create()
                .name(format!("fk_{table}_{target}"))
                .from(Alias::new(table), Alias::new(target))
                .to(target_table, target_id)
                .on_delete(ForeignKeyAction::Cascade),
        )
        .to_owned()
}

fn reverse_index(table: &str, target: &str) -> IndexCreateStatement {
    Index::create()
        .name(format!("idx_{table}_{target}"))
        .table(Alias::new(table))
        .col(Alias::new(target))
        .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (table, actor, target) in EDGE_TABLES {
            let statement = if table == "follows" {
                edge_table(table, actor, target, Users::Table, Users::Id)
            } else {
                edge_table(table, actor, target, Articles::Table, Articles::Id)
            };
            manager.create_table(statement).await?;
            manager.create_index(reverse_index(table, target)).await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (table, _, _) in EDGE_TABLES.iter().rev() {
            manager
                .drop_table(Table::drop().table(Alias::new(*table)).to_owned())
                .await?;
        }
        Ok(())
    }
}
