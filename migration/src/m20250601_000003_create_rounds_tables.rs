use sea_orm_migration::prelude::*;

use crate::m20250601_000001_create_reference_tables::Lookup;
use crate::m20250601_000002_create_companies_table::Companies;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Rounds::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Rounds::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Rounds::CompanyId).integer().not_null())
                    .col(ColumnDef::new(Rounds::Name).string_len(100).null())
                    .col(ColumnDef::new(Rounds::DealTypeId).integer().null())
                    .col(ColumnDef::new(Rounds::Date).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(Rounds::Amount).double().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rounds_company")
                            .from(Rounds::Table, Rounds::CompanyId)
                            .to(Companies::Table, Companies::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rounds_deal_type")
                            .from(Rounds::Table, Rounds::DealTypeId)
                            .to(Lookup::DealTypes, Lookup::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SubRounds::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SubRounds::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SubRounds::RoundId).integer().not_null())
                    .col(ColumnDef::new(SubRounds::Name).string_len(100).null())
                    .col(ColumnDef::new(SubRounds::Date).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(SubRounds::Amount).double().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sub_rounds_round")
                            .from(SubRounds::Table, SubRounds::RoundId)
                            .to(Rounds::Table, Rounds::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RoundInvestors::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RoundInvestors::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(RoundInvestors::SubRoundId).integer().not_null())
                    .col(ColumnDef::new(RoundInvestors::InvestorId).integer().not_null())
                    .col(ColumnDef::new(RoundInvestors::Lead).boolean().not_null().default(false))
                    .col(ColumnDef::new(RoundInvestors::New).boolean().not_null().default(false))
                    .col(ColumnDef::new(RoundInvestors::Corporate).boolean().not_null().default(false))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_round_investors_sub_round")
                            .from(RoundInvestors::Table, RoundInvestors::SubRoundId)
                            .to(SubRounds::Table, SubRounds::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_round_investors_investor")
                            .from(RoundInvestors::Table, RoundInvestors::InvestorId)
                            .to(Lookup::Investors, Lookup::Id),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RoundInvestors::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SubRounds::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Rounds::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Rounds {
    Table,
    Id,
    CompanyId,
    Name,
    DealTypeId,
    Date,
    Amount,
}

#[derive(DeriveIden)]
enum SubRounds {
    Table,
    Id,
    RoundId,
    Name,
    Date,
    Amount,
}

#[derive(DeriveIden)]
enum RoundInvestors {
    Table,
    Id,
    SubRoundId,
    InvestorId,
    Lead,
    New,
    Corporate,
}
