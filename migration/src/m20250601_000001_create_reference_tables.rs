use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Email).string().not_null().unique_key())
                    .col(ColumnDef::new(Users::Name).string_len(100).null())
                    .to_owned(),
            )
            .await?;

        // Every lookup table shares the same (id, name) shape
        for table in [
            Lookup::Industries,
            Lookup::Competitors,
            Lookup::DealTypes,
            Lookup::CeoEducations,
            Lookup::Investors,
        ] {
            manager
                .create_table(
                    Table::create()
                        .table(table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Lookup::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Lookup::Name).string().not_null())
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            Lookup::Investors,
            Lookup::CeoEducations,
            Lookup::DealTypes,
            Lookup::Competitors,
            Lookup::Industries,
        ] {
            manager
                .drop_table(Table::drop().table(table).to_owned())
                .await?;
        }
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Users {
    Table,
    Id,
    Email,
    Name,
}

#[derive(DeriveIden, Clone, Copy)]
pub enum Lookup {
    Industries,
    Competitors,
    DealTypes,
    CeoEducations,
    Investors,
    Id,
    Name,
}
