use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250201_000001_create_crm_tables::Migration),
            Box::new(m20250201_000002_create_catalog_tables::Migration),
            Box::new(m20250201_000003_create_order_tables::Migration),
            Box::new(m20250201_000004_create_prediction_tables::Migration),
        ]
    }
}

mod m20250201_000001_create_crm_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250201_000001_create_crm_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(CustomerSegments::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CustomerSegments::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(CustomerSegments::Name).string_len(50).not_null())
                        .col(ColumnDef::new(CustomerSegments::Description).text().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Customers::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Customers::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Customers::FirstName).string_len(50).not_null())
                        .col(ColumnDef::new(Customers::LastName).string_len(50).not_null())
                        .col(
                            ColumnDef::new(Customers::Email)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Customers::Phone).string_len(20).null())
                        .col(ColumnDef::new(Customers::RegistrationDate).date().not_null())
                        .col(ColumnDef::new(Customers::LastPurchaseDate).date().null())
                        .col(ColumnDef::new(Customers::ChurnScore).decimal_len(4, 2).null())
                        .col(ColumnDef::new(Customers::SegmentId).uuid().null())
                        .col(
                            ColumnDef::new(Customers::SpendingFactor)
                                .decimal_len(4, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Customers::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Customers::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_customers_segment_id")
                                .from(Customers::Table, Customers::SegmentId)
                                .to(CustomerSegments::Table, CustomerSegments::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_customers_last_purchase_date")
                        .table(Customers::Table)
                        .col(Customers::LastPurchaseDate)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Customers::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(CustomerSegments::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum CustomerSegments {
        Table,
        Id,
        Name,
        Description,
    }

    #[derive(DeriveIden)]
    pub(super) enum Customers {
        Table,
        Id,
        FirstName,
        LastName,
        Email,
        Phone,
        RegistrationDate,
        LastPurchaseDate,
        ChurnScore,
        SegmentId,
        SpendingFactor,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250201_000002_create_catalog_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250201_000002_create_catalog_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Products::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Products::Name).text().not_null())
                        .col(ColumnDef::new(Products::Asin).string_len(20).null().unique_key())
                        .col(ColumnDef::new(Products::Category).string_len(100).null())
                        .col(ColumnDef::new(Products::Price).decimal_len(10, 2).null())
                        .col(ColumnDef::new(Products::OriginalPrice).string_len(50).null())
                        .col(ColumnDef::new(Products::Currency).string_len(10).null())
                        .col(ColumnDef::new(Products::Country).string_len(50).null())
                        .col(ColumnDef::new(Products::Description).text().null())
                        .col(ColumnDef::new(Products::ProductByline).text().null())
                        .col(ColumnDef::new(Products::ProductBylineLink).text().null())
                        .col(ColumnDef::new(Products::Rating).double().null())
                        .col(ColumnDef::new(Products::ProductNumRatings).integer().null())
                        .col(ColumnDef::new(Products::ProductUrl).text().null())
                        .col(ColumnDef::new(Products::ProductPhoto).text().null())
                        .col(ColumnDef::new(Products::ProductNumOffers).integer().null())
                        .col(ColumnDef::new(Products::ProductAvailability).text().null())
                        .col(flag(Products::IsBestSeller))
                        .col(flag(Products::IsAmazonChoice))
                        .col(flag(Products::IsPrime))
                        .col(flag(Products::ClimatePledgeFriendly))
                        .col(ColumnDef::new(Products::SalesVolume).string_len(50).null())
                        .col(ColumnDef::new(Products::CustomersSay).text().null())
                        .col(ColumnDef::new(Products::ProductInformation).json().null())
                        .col(ColumnDef::new(Products::ProductDetails).json().null())
                        .col(ColumnDef::new(Products::ProductPhotos).json().null())
                        .col(ColumnDef::new(Products::ProductVideos).json().null())
                        .col(ColumnDef::new(Products::VideoThumbnail).text().null())
                        .col(flag(Products::HasVideo))
                        .col(ColumnDef::new(Products::Delivery).text().null())
                        .col(ColumnDef::new(Products::PrimaryDeliveryTime).text().null())
                        .col(ColumnDef::new(Products::CategoryPath).json().null())
                        .col(ColumnDef::new(Products::ProductVariations).json().null())
                        .col(ColumnDef::new(Products::DealBadge).string_len(100).null())
                        .col(flag(Products::HasAplus))
                        .col(flag(Products::HasBrandstory))
                        .col(ColumnDef::new(Products::MoreInfo).json().null())
                        .col(
                            ColumnDef::new(Products::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Products::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PriceHistory::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(PriceHistory::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(PriceHistory::ProductId).uuid().not_null())
                        .col(ColumnDef::new(PriceHistory::Platform).string_len(20).not_null())
                        .col(ColumnDef::new(PriceHistory::Price).decimal_len(10, 2).not_null())
                        .col(
                            ColumnDef::new(PriceHistory::ScrapedDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_price_history_product_id")
                                .from(PriceHistory::Table, PriceHistory::ProductId)
                                .to(Products::Table, Products::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_price_history_product_scraped")
                        .table(PriceHistory::Table)
                        .col(PriceHistory::ProductId)
                        .col(PriceHistory::ScrapedDate)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PriceHistory::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await
        }
    }

    fn flag(column: Products) -> ColumnDef {
        ColumnDef::new(column)
            .boolean()
            .not_null()
            .default(false)
            .to_owned()
    }

    #[derive(DeriveIden)]
    pub(super) enum Products {
        Table,
        Id,
        Name,
        Asin,
        Category,
        Price,
        OriginalPrice,
        Currency,
        Country,
        Description,
        ProductByline,
        ProductBylineLink,
        Rating,
        ProductNumRatings,
        ProductUrl,
        ProductPhoto,
        ProductNumOffers,
        ProductAvailability,
        IsBestSeller,
        IsAmazonChoice,
        IsPrime,
        ClimatePledgeFriendly,
        SalesVolume,
        CustomersSay,
        ProductInformation,
        ProductDetails,
        ProductPhotos,
        ProductVideos,
        VideoThumbnail,
        HasVideo,
        Delivery,
        PrimaryDeliveryTime,
        CategoryPath,
        ProductVariations,
        DealBadge,
        HasAplus,
        HasBrandstory,
        MoreInfo,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum PriceHistory {
        Table,
        Id,
        ProductId,
        Platform,
        Price,
        ScrapedDate,
    }
}

mod m20250201_000003_create_order_tables {
    use sea_orm_migration::prelude::*;

    use super::m20250201_000001_create_crm_tables::Customers;
    use super::m20250201_000002_create_catalog_tables::Products;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250201_000003_create_order_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Orders::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Orders::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Orders::OrderNumber)
                                .string_len(20)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Orders::CustomerId).uuid().not_null())
                        .col(
                            ColumnDef::new(Orders::OrderDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Orders::TotalAmount)
                                .decimal_len(10, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Orders::Status)
                                .string_len(20)
                                .not_null()
                                .default("Pending"),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_orders_customer_id")
                                .from(Orders::Table, Orders::CustomerId)
                                .to(Customers::Table, Customers::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(OrderItems::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(OrderItems::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(OrderItems::OrderId).uuid().not_null())
                        .col(ColumnDef::new(OrderItems::ProductId).uuid().not_null())
                        .col(
                            ColumnDef::new(OrderItems::Quantity)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .col(
                            ColumnDef::new(OrderItems::PriceAtPurchase)
                                .decimal_len(10, 2)
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_items_order_id")
                                .from(OrderItems::Table, OrderItems::OrderId)
                                .to(Orders::Table, Orders::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_items_product_id")
                                .from(OrderItems::Table, OrderItems::ProductId)
                                .to(Products::Table, Products::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Reviews::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Reviews::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Reviews::CustomerId).uuid().not_null())
                        .col(ColumnDef::new(Reviews::ProductId).uuid().not_null())
                        .col(ColumnDef::new(Reviews::Rating).small_integer().not_null())
                        .col(ColumnDef::new(Reviews::Comment).text().null())
                        .col(
                            ColumnDef::new(Reviews::ReviewDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Reviews::SentimentScore).decimal_len(4, 2).null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_reviews_customer_id")
                                .from(Reviews::Table, Reviews::CustomerId)
                                .to(Customers::Table, Customers::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_reviews_product_id")
                                .from(Reviews::Table, Reviews::ProductId)
                                .to(Products::Table, Products::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_customer_id")
                        .table(Orders::Table)
                        .col(Orders::CustomerId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Reviews::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(OrderItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Orders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Orders {
        Table,
        Id,
        OrderNumber,
        CustomerId,
        OrderDate,
        TotalAmount,
        Status,
    }

    #[derive(DeriveIden)]
    enum OrderItems {
        Table,
        Id,
        OrderId,
        ProductId,
        Quantity,
        PriceAtPurchase,
    }

    #[derive(DeriveIden)]
    enum Reviews {
        Table,
        Id,
        CustomerId,
        ProductId,
        Rating,
        Comment,
        ReviewDate,
        SentimentScore,
    }
}

mod m20250201_000004_create_prediction_tables {
    use sea_orm_migration::prelude::*;

    use super::m20250201_000001_create_crm_tables::Customers;
    use super::m20250201_000002_create_catalog_tables::Products;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250201_000004_create_prediction_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ChurnPredictions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ChurnPredictions::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ChurnPredictions::CustomerId).uuid().not_null())
                        .col(
                            ColumnDef::new(ChurnPredictions::ChurnProbability)
                                .double()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ChurnPredictions::PredictionDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_churn_predictions_customer_id")
                                .from(ChurnPredictions::Table, ChurnPredictions::CustomerId)
                                .to(Customers::Table, Customers::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(SalesForecasts::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SalesForecasts::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(SalesForecasts::ProductId).uuid().not_null())
                        .col(ColumnDef::new(SalesForecasts::ForecastDate).date().not_null())
                        .col(
                            ColumnDef::new(SalesForecasts::PredictedSales)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(ColumnDef::new(SalesForecasts::Period).string_len(20).not_null())
                        .col(
                            ColumnDef::new(SalesForecasts::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_sales_forecasts_product_id")
                                .from(SalesForecasts::Table, SalesForecasts::ProductId)
                                .to(Products::Table, Products::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            // One forecast per product, date and period
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_sales_forecasts_product_date_period")
                        .table(SalesForecasts::Table)
                        .col(SalesForecasts::ProductId)
                        .col(SalesForecasts::ForecastDate)
                        .col(SalesForecasts::Period)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(SalesForecasts::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ChurnPredictions::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum ChurnPredictions {
        Table,
        Id,
        CustomerId,
        ChurnProbability,
        PredictionDate,
    }

    #[derive(DeriveIden)]
    enum SalesForecasts {
        Table,
        Id,
        ProductId,
        ForecastDate,
        PredictedSales,
        Period,
        CreatedAt,
    }
}
