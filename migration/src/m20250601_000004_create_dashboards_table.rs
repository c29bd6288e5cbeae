use sea_orm_migration::prelude::*;

use crate::m20250601_000002_create_companies_table::Companies;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Dashboards::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Dashboards::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Dashboards::CompanyId).integer().not_null())
                    .col(ColumnDef::new(Dashboards::TotalScore).double().null())
                    .col(ColumnDef::new(Dashboards::DecisionThreshold).double().null())
                    .col(ColumnDef::new(Dashboards::Features).json().null())
                    .col(
                        ColumnDef::new(Dashboards::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_dashboards_company")
                            .from(Dashboards::Table, Dashboards::CompanyId)
                            .to(Companies::Table, Companies::Id),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Dashboards::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Dashboards {
    Table,
    Id,
    CompanyId,
    TotalScore,
    DecisionThreshold,
    Features,
    CreatedAt,
}
