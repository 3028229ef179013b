use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Categories::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Categories::Name).string_len(150).not_null())
                    .col(ColumnDef::new(Categories::NameSearch).text().not_null().default(""))
                    .col(ColumnDef::new(Categories::Description).text().not_null())
                    .col(ColumnDef::new(Categories::Url).string_len(160).not_null().unique_key())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Genres::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Genres::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Genres::Name).string_len(100).not_null().unique_key())
                    .col(ColumnDef::new(Genres::Description).text().not_null())
                    .col(ColumnDef::new(Genres::Url).string_len(160).not_null().unique_key())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Actors::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Actors::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Actors::Name).string_len(100).not_null())
                    .col(ColumnDef::new(Actors::Age).integer().not_null().default(0))
                    .col(ColumnDef::new(Actors::Description).text().not_null())
                    .col(ColumnDef::new(Actors::Image).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Movies::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Movies::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Movies::Title).string_len(100).not_null())
                    .col(ColumnDef::new(Movies::TitleSearch).text().not_null().default(""))
                    .col(ColumnDef::new(Movies::Tagline).string_len(100).not_null().default(""))
                    .col(ColumnDef::new(Movies::Description).text().not_null())
                    .col(ColumnDef::new(Movies::Poster).string().not_null())
                    .col(ColumnDef::new(Movies::Year).integer().not_null())
                    .col(ColumnDef::new(Movies::Country).string_len(30).not_null())
                    .col(ColumnDef::new(Movies::WorldPremiere).date().not_null())
                    .col(ColumnDef::new(Movies::Budget).big_integer().not_null().default(0))
                    .col(ColumnDef::new(Movies::FeesInUsa).big_integer().not_null().default(0))
                    .col(ColumnDef::new(Movies::FeesInWorld).big_integer().not_null().default(0))
                    .col(ColumnDef::new(Movies::CategoryId).integer())
                    .col(ColumnDef::new(Movies::Url).string_len(130).not_null().unique_key())
                    .col(ColumnDef::new(Movies::Draft).boolean().not_null().default(false))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movies_category")
                            .from(Movies::Table, Movies::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MovieGenres::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(MovieGenres::MovieId).integer().not_null())
                    .col(ColumnDef::new(MovieGenres::GenreId).integer().not_null())
                    .primary_key(
                        Index::create()
                            .col(MovieGenres::MovieId)
                            .col(MovieGenres::GenreId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_genres_movie")
                            .from(MovieGenres::Table, MovieGenres::MovieId)
                            .to(Movies::Table, Movies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_genres_genre")
                            .from(MovieGenres::Table, MovieGenres::GenreId)
                            .to(Genres::Table, Genres::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MovieCredits::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(MovieCredits::MovieId).integer().not_null())
                    .col(ColumnDef::new(MovieCredits::ActorId).integer().not_null())
                    .col(ColumnDef::new(MovieCredits::Role).string_len(16).not_null()) // 'actor', 'director'
                    .primary_key(
                        Index::create()
                            .col(MovieCredits::MovieId)
                            .col(MovieCredits::ActorId)
                            .col(MovieCredits::Role),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_credits_movie")
                            .from(MovieCredits::Table, MovieCredits::MovieId)
                            .to(Movies::Table, Movies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_credits_actor")
                            .from(MovieCredits::Table, MovieCredits::ActorId)
                            .to(Actors::Table, Actors::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MovieShots::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MovieShots::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MovieShots::Title).string_len(100).not_null())
                    .col(ColumnDef::new(MovieShots::Description).text().not_null())
                    .col(ColumnDef::new(MovieShots::Image).string().not_null())
                    .col(ColumnDef::new(MovieShots::MovieId).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_shots_movie")
                            .from(MovieShots::Table, MovieShots::MovieId)
                            .to(Movies::Table, Movies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Indexes for the public filter
        manager
            .create_index(
                Index::create()
                    .name("idx_movies_draft_year")
                    .table(Movies::Table)
                    .col(Movies::Draft)
                    .col(Movies::Year)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movie_genres_genre")
                    .table(MovieGenres::Table)
                    .col(MovieGenres::GenreId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movie_credits_actor")
                    .table(MovieCredits::Table)
                    .col(MovieCredits::ActorId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MovieShots::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(MovieCredits::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(MovieGenres::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Movies::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Actors::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Genres::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Categories {
    Table,
    Id,
    Name,
    NameSearch,
    Description,
    Url,
}

#[derive(DeriveIden)]
enum Genres {
    Table,
    Id,
    Name,
    Description,
    Url,
}

#[derive(DeriveIden)]
enum Actors {
    Table,
    Id,
    Name,
    Age,
    Description,
    Image,
}

#[derive(DeriveIden)]
pub(super) enum Movies {
    Table,
    Id,
    Title,
    TitleSearch,
    Tagline,
    Description,
    Poster,
    Year,
    Country,
    WorldPremiere,
    Budget,
    FeesInUsa,
    FeesInWorld,
    CategoryId,
    Url,
    Draft,
}

#[derive(DeriveIden)]
enum MovieGenres {
    Table,
    MovieId,
    GenreId,
}

#[derive(DeriveIden)]
enum MovieCredits {
    Table,
    MovieId,
    ActorId,
    Role,
}

#[derive(DeriveIden)]
enum MovieShots {
    Table,
    Id,
    Title,
    Description,
    Image,
    MovieId,
}
