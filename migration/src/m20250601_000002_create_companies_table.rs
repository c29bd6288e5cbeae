use sea_orm_migration::prelude::*;

use crate::m20250601_000001_create_reference_tables::{Lookup, Users};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Companies::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Companies::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Companies::Uuid).uuid().null())
                    .col(ColumnDef::new(Companies::Status).string_len(20).not_null())
                    .col(ColumnDef::new(Companies::ProgressBar).double().null())
                    .col(ColumnDef::new(Companies::Name).string_len(100).not_null())
                    .col(ColumnDef::new(Companies::FormerName).string_len(100).null())
                    .col(ColumnDef::new(Companies::YearFounded).integer().null())
                    .col(ColumnDef::new(Companies::Bio).string_len(1000).null())
                    .col(ColumnDef::new(Companies::WebsiteUrl).string().null())
                    .col(ColumnDef::new(Companies::PitchbookUrl).string().null())
                    .col(ColumnDef::new(Companies::FirstFinancingDate).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(Companies::FirstFinancingDealType).integer().null())
                    .col(
                        ColumnDef::new(Companies::NumberCompetitors)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Companies::Comment).string_len(500).null())
                    .col(ColumnDef::new(Companies::DecisionThreshold).double().null())
                    .col(ColumnDef::new(Companies::TotalScore).double().null())
                    .col(ColumnDef::new(Companies::PbId).string_len(100).null())
                    .col(ColumnDef::new(Companies::IsActive).boolean().not_null().default(true))
                    .col(ColumnDef::new(Companies::UserId).integer().null())
                    // Points at dashboards.id; no constraint because dashboards reference companies too
                    .col(ColumnDef::new(Companies::DashboardId).integer().null())
                    .col(
                        ColumnDef::new(Companies::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Companies::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_companies_deal_type")
                            .from(Companies::Table, Companies::FirstFinancingDealType)
                            .to(Lookup::DealTypes, Lookup::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_companies_user")
                            .from(Companies::Table, Companies::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CompanyStatusHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CompanyStatusHistory::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CompanyStatusHistory::CompanyId).integer().not_null())
                    .col(ColumnDef::new(CompanyStatusHistory::Status).string_len(20).not_null())
                    .col(
                        ColumnDef::new(CompanyStatusHistory::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_status_history_company")
                            .from(CompanyStatusHistory::Table, CompanyStatusHistory::CompanyId)
                            .to(Companies::Table, Companies::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_status_history_company")
                    .table(CompanyStatusHistory::Table)
                    .col(CompanyStatusHistory::CompanyId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CompanyIndustry::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CompanyIndustry::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CompanyIndustry::CompanyId).integer().not_null())
                    .col(ColumnDef::new(CompanyIndustry::IndustryId).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_company_industry_company")
                            .from(CompanyIndustry::Table, CompanyIndustry::CompanyId)
                            .to(Companies::Table, Companies::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_company_industry_industry")
                            .from(CompanyIndustry::Table, CompanyIndustry::IndustryId)
                            .to(Lookup::Industries, Lookup::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CompanyCompetitor::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CompanyCompetitor::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CompanyCompetitor::CompanyId).integer().not_null())
                    .col(ColumnDef::new(CompanyCompetitor::CompetitorId).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_company_competitor_company")
                            .from(CompanyCompetitor::Table, CompanyCompetitor::CompanyId)
                            .to(Companies::Table, Companies::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_company_competitor_competitor")
                            .from(CompanyCompetitor::Table, CompanyCompetitor::CompetitorId)
                            .to(Lookup::Competitors, Lookup::Id),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CompanyCompetitor::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CompanyIndustry::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CompanyStatusHistory::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Companies::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Companies {
    Table,
    Id,
    Uuid,
    Status,
    ProgressBar,
    Name,
    FormerName,
    YearFounded,
    Bio,
    WebsiteUrl,
    PitchbookUrl,
    FirstFinancingDate,
    FirstFinancingDealType,
    NumberCompetitors,
    Comment,
    DecisionThreshold,
    TotalScore,
    PbId,
    IsActive,
    UserId,
    DashboardId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum CompanyStatusHistory {
    Table,
    Id,
    CompanyId,
    Status,
    CreatedAt,
}

#[derive(DeriveIden)]
enum CompanyIndustry {
    Table,
    Id,
    CompanyId,
    IndustryId,
}

#[derive(DeriveIden)]
enum CompanyCompetitor {
    Table,
    Id,
    CompanyId,
    CompetitorId,
}
